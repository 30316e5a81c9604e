//! Integration tests for the tamper engine
//!
//! Exercises the public API end to end: mutation, feedback, replay,
//! dedup, context wrapping and pacing.

use abacus::cache::CacheConfig;
use abacus::codec::{base64_encode, compress, quote};
use abacus::engine::{
    EngineConfig, Feedback, ManualClock, SharedTamperEngine, TamperEngine,
};
use abacus::feedback::{Outcome, PacingConfig};
use abacus::{MutationOperator, PayloadContext};
use chrono::{TimeZone, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SQLI: &str = "SELECT * FROM users WHERE id=1";

fn quiet_config(seed: u64) -> EngineConfig {
    EngineConfig::default().with_seed(seed).without_pacing()
}

fn fixed_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

mod feedback_tests {
    use super::*;

    #[tokio::test]
    async fn three_failures_raise_backoff() {
        let mut engine = TamperEngine::new(quiet_config(100));
        let cancel = CancellationToken::new();
        let mut outputs = Vec::new();
        let mut backoffs = vec![engine.backoff()];

        for _ in 0..3 {
            let mutation = engine.mutate(SQLI, &cancel).await;
            let (encoded, chain) = mutation.into_parts();
            assert_ne!(encoded, SQLI);
            outputs.push(encoded);

            assert!(!chain.is_empty());
            engine.report(&chain, false);
            backoffs.push(engine.backoff());
        }

        assert_eq!(backoffs[..3], [1.0, 1.5, 2.25]);
        assert!(backoffs.windows(2).all(|w| w[1] > w[0]));
        assert_ne!(outputs[0], outputs[1]);
        assert_ne!(outputs[1], outputs[2]);
        assert_ne!(outputs[0], outputs[2]);
    }

    #[tokio::test]
    async fn success_is_remembered_verbatim() {
        let mut engine = TamperEngine::new(quiet_config(101));
        let cancel = CancellationToken::new();

        let mutation = engine.mutate(SQLI, &cancel).await;
        let before = engine.success_chains().len();
        engine.report_chain(&mutation.chain, Outcome::Success);

        if mutation.chain.is_empty() {
            assert_eq!(engine.success_chains().len(), before);
        } else {
            assert_eq!(engine.success_chains().len(), before + 1);
            assert_eq!(engine.success_chains().last(), Some(&mutation.chain));
        }
    }

    #[test]
    fn reported_names_round_trip_through_memory() {
        let mut engine = TamperEngine::new(quiet_config(102));
        let names = ["zero_width", "keyword_split", "logic_wrap"];
        engine.report(&names, true);

        let remembered = engine.success_chains().last().unwrap();
        assert_eq!(remembered.names(), names);
    }

    #[test]
    fn backoff_stays_within_bounds() {
        let mut engine = TamperEngine::new(quiet_config(103));
        for i in 0..200 {
            engine.report(&["reverse"], i % 7 == 0);
            let b = engine.backoff();
            assert!((1.0..=5.0).contains(&b), "backoff {} out of range", b);
        }
        for _ in 0..20 {
            engine.report(&["reverse"], true);
        }
        assert_eq!(engine.backoff(), 1.0);
    }

    #[test]
    fn malformed_reports_change_nothing() {
        let mut engine = TamperEngine::new(quiet_config(104));
        engine.report::<&str>(&[], false);
        engine.report(&["definitely_not_registered"], false);

        assert_eq!(engine.backoff(), 1.0);
        assert!(engine.success_chains().is_empty());
        assert!(engine
            .snapshot()
            .operators
            .iter()
            .all(|op| op.stats.total() == 0));
    }

    #[tokio::test]
    async fn successful_operators_are_preferred() {
        let mut engine = TamperEngine::with_clock(
            quiet_config(105).with_replay_probability(0.0),
            fixed_clock(),
        );
        let cancel = CancellationToken::new();

        for _ in 0..5 {
            engine.report(&["random_case"], true);
        }
        for op in MutationOperator::all() {
            if op != MutationOperator::RandomCase {
                engine.report_chain(&vec![op; 5].into(), Outcome::Fail);
            }
        }

        let mut random_case = 0;
        let mut total = 0;
        for i in 0..20 {
            let mutation = engine.mutate(&format!("SELECT {}", i), &cancel).await;
            total += mutation.chain.len();
            random_case += mutation
                .chain
                .iter()
                .filter(|op| *op == MutationOperator::RandomCase)
                .count();
        }
        assert!(random_case * 10 > total * 9);
    }
}

mod chain_tests {
    use super::*;

    #[tokio::test]
    async fn chain_length_is_bounded() {
        let mut engine = TamperEngine::new(quiet_config(200));
        let cancel = CancellationToken::new();

        for i in 0..40 {
            let mutation = engine.mutate(SQLI, &cancel).await;
            assert!(mutation.chain.len() <= 7);
            assert!(mutation.chain.len() <= engine.config().max_depth);
            if i % 3 == 0 {
                engine.report_chain(&mutation.chain, Outcome::Success);
            }
        }
    }

    #[tokio::test]
    async fn empty_payload_produces_output() {
        let mut engine = TamperEngine::new(quiet_config(201));
        let mutation = engine.mutate("", &CancellationToken::new()).await;

        assert!(!mutation.encoded.is_empty());
        assert_eq!(mutation.context, PayloadContext::Generic);
    }

    #[tokio::test]
    async fn zero_depth_encodes_wrapped_payload() {
        let config = quiet_config(202).with_max_depth(0);
        let mut engine = TamperEngine::new(config);
        let mutation = engine.mutate("abc", &CancellationToken::new()).await;

        assert!(mutation.chain.is_empty());
        assert!(!mutation.replayed);

        let candidates = [
            "IF(1=1,(abc),NULL)",
            "CASE WHEN 1=1 THEN (abc) ELSE NULL END",
            "IFNULL(NULL,(abc))",
            "COALESCE(NULL,(abc))",
            "CONCAT(CHAR(115,101,108),(abc))",
        ];
        let expected: Vec<String> = candidates
            .iter()
            .map(|raw| quote(&base64_encode(&compress(raw.as_bytes()).unwrap())))
            .collect();
        assert!(expected.contains(&mutation.encoded));
    }
}

mod dedup_tests {
    use super::*;

    #[test]
    fn second_identical_input_differs_by_one_char() {
        let mut engine = TamperEngine::new(quiet_config(300));
        let first = engine.prepare(SQLI);
        let second = engine.prepare(SQLI);

        assert_eq!(first.input, SQLI);
        assert_ne!(second.input, first.input);
        assert_eq!(&second.input[..SQLI.len()], SQLI);
        assert_eq!(second.input.len(), SQLI.len() + 1);
    }

    #[test]
    fn evicted_fingerprints_are_forgotten() {
        let config = quiet_config(301).with_cache(CacheConfig {
            fingerprint_capacity: 1,
            encoding_capacity: 1,
        });
        let mut engine = TamperEngine::new(config);

        engine.prepare("first");
        engine.prepare("second");
        let again = engine.prepare("first");
        assert_eq!(again.input, "first");
    }
}

mod context_tests {
    use super::*;

    #[test]
    fn detects_documented_contexts() {
        assert_eq!(PayloadContext::detect("id=5&name=bob"), PayloadContext::Param);
        assert_eq!(PayloadContext::detect("{user(id:5)}"), PayloadContext::Graphql);
        assert_eq!(PayloadContext::detect("42"), PayloadContext::Int);
        assert_eq!(PayloadContext::detect("' OR 1=1"), PayloadContext::String);
        assert_eq!(PayloadContext::detect(SQLI), PayloadContext::Generic);
    }

    #[tokio::test]
    async fn graphql_payload_is_wrapped_in_query() {
        let mut engine = TamperEngine::new(quiet_config(400));
        let mutation = engine.mutate("{user(id:5)}", &CancellationToken::new()).await;

        let value: serde_json::Value = serde_json::from_str(&mutation.encoded).unwrap();
        let query = value["query"].as_str().unwrap();
        assert!(query.starts_with("{user(input:\""));
        assert!(query.ends_with("\"){id}}"));
    }

    #[tokio::test]
    async fn param_payload_is_form_encoded() {
        let mut engine = TamperEngine::new(quiet_config(401));
        let mutation = engine.mutate("id=5&name=bob", &CancellationToken::new()).await;

        assert_eq!(mutation.context, PayloadContext::Param);
        assert!(!mutation.encoded.contains('/'));
        assert!(mutation
            .encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.-~%".contains(c)));
    }
}

mod determinism_tests {
    use super::*;

    #[tokio::test]
    async fn same_seed_same_stream() {
        let cancel = CancellationToken::new();
        let mut a = TamperEngine::with_clock(quiet_config(500), fixed_clock());
        let mut b = TamperEngine::with_clock(quiet_config(500), fixed_clock());

        for payload in [SQLI, SQLI, "42", "id=1&x=2", SQLI] {
            let ma = a.mutate(payload, &cancel).await;
            let mb = b.mutate(payload, &cancel).await;
            assert_eq!(ma.encoded, mb.encoded);
            assert_eq!(ma.chain, mb.chain);
            assert_eq!(ma.replayed, mb.replayed);

            a.report_chain(&ma.chain, Outcome::Success);
            b.report_chain(&mb.chain, Outcome::Success);
        }
    }

    #[tokio::test]
    async fn different_seeds_diverge() {
        let cancel = CancellationToken::new();
        let mut a = TamperEngine::new(quiet_config(501));
        let mut b = TamperEngine::new(quiet_config(502));

        let mut same = 0;
        for _ in 0..5 {
            if a.mutate(SQLI, &cancel).await.encoded == b.mutate(SQLI, &cancel).await.encoded {
                same += 1;
            }
        }
        assert!(same < 5);
    }
}

mod pacing_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delay_scales_with_backoff() {
        let config = EngineConfig::default().with_seed(600).with_pacing(PacingConfig {
            enabled: true,
            base_secs: 1.5,
            jitter_secs: 0.0,
        });
        let mut engine = TamperEngine::new(config);
        let cancel = CancellationToken::new();

        let first = engine.mutate(SQLI, &cancel).await;
        assert_eq!(first.delay, Duration::from_secs_f64(1.5));
        assert!(!first.cancelled);

        engine.report(&["reverse"], false);
        let second = engine.mutate(SQLI, &cancel).await;
        assert_eq!(second.delay, Duration::from_secs_f64(2.25));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_returns_computed_payload() {
        let mut engine = TamperEngine::new(EngineConfig::default().with_seed(601));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let mutation = engine.mutate(SQLI, &cancel).await;
        assert!(mutation.cancelled);
        assert!(!mutation.encoded.is_empty());
    }

    #[tokio::test]
    async fn tamper_combines_feedback_and_mutation() {
        let mut engine = TamperEngine::new(quiet_config(602));
        let cancel = CancellationToken::new();

        let first = engine.tamper(SQLI, None, &cancel).await;
        let feedback = Feedback::new()
            .with_response("You have an error in your SQL syntax")
            .with_outcome(Outcome::Success);
        let second = engine.tamper(SQLI, Some(feedback), &cancel).await;

        assert_ne!(first.encoded, second.encoded);
        assert_eq!(
            engine.last_signals().map(|s| s.dbms),
            Some(abacus::detection::Dbms::Mysql)
        );
        if !first.chain.is_empty() {
            assert_eq!(engine.success_chains().len(), 1);
        }
    }
}

mod shared_engine_tests {
    use super::*;

    #[tokio::test]
    async fn parallel_round_trips_count_every_report() {
        let engine = SharedTamperEngine::new(TamperEngine::new(quiet_config(700)));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let engine = engine.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let (mutation, _) = engine
                    .round_trip(&format!("SELECT {}", i), &cancel, |_| async { Some(true) })
                    .await;
                mutation.chain.len() as u64
            }));
        }

        let mut expected = 0;
        for handle in handles {
            expected += handle.await.unwrap();
        }

        let snapshot = engine.snapshot().await;
        let recorded: u64 = snapshot.operators.iter().map(|op| op.stats.total()).sum();
        assert_eq!(recorded, expected);
        assert_eq!(snapshot.emitted, 8);
    }
}
