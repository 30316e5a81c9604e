//! Tamper Engine - Adaptive payload mutation with outcome feedback
//!
//! Owns every piece of learned state: operator statistics, the success-chain
//! memory, the backoff controller and both caches. Callers drive it in a
//! ping-pong: `mutate` a payload, send it, then `report` how the chain fared.

pub mod chain;
pub mod clock;
pub mod config;
pub mod shared;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use self::chain::{BuiltChain, ChainBuilder};
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::config::{ConfigLoadError, EngineConfig, EngineProfile};
pub use self::shared::SharedTamperEngine;

use crate::cache::{CacheStats, EncodingCache, FingerprintCache};
use crate::codec::quote;
use crate::context::PayloadContext;
use crate::detection::{ResponseClassifier, ResponseSignals};
use crate::feedback::{
    pace, Backoff, FeedbackStore, OperatorStats, Outcome, SuccessChainMemory,
};
use crate::mutation::{shannon_entropy, Chain, MutationOperator, MutationRegistry, SqlMutator};

const DEDUP_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One emitted payload and how it was made
#[derive(Debug, Clone, Serialize)]
pub struct Mutation {
    /// Final wire form: compressed, base64, percent-encoded, context-wrapped
    pub encoded: String,
    /// Operators to report the outcome against
    pub chain: Chain,
    /// Context detected on the caller's payload
    pub context: PayloadContext,
    /// Whether the chain was replayed from the success memory
    pub replayed: bool,
    /// Pacing delay applied (or skipped on cancellation) before returning
    pub delay: Duration,
    /// Shannon entropy of `encoded`, in bits per character
    pub entropy: f64,
    /// Payload fed to the chain, after the dedup suffix
    pub input: String,
    /// The pacing delay was cut short
    pub cancelled: bool,
}

impl Mutation {
    /// Operator names in application order
    pub fn chain_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// `(encoded, chain names)`
    pub fn into_parts(self) -> (String, Vec<String>) {
        let names = self.chain.names().into_iter().map(String::from).collect();
        (self.encoded, names)
    }
}

/// Effect of a `report` call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Operator entries whose counters were updated
    pub recorded: usize,
    /// Names that did not resolve to a registered operator
    pub skipped: usize,
    /// Backoff factor after the report
    pub backoff: f64,
}

/// Outcome information for the previously emitted payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Raw response text, classified and kept for inspection
    pub response: Option<String>,
    /// Whether the previous payload got through
    pub outcome: Option<Outcome>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Per-operator view in a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct OperatorSnapshot {
    pub name: &'static str,
    pub stats: OperatorStats,
    pub weight: f64,
}

/// Serializable view of the engine's learned state
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub backoff: f64,
    pub emitted: u64,
    /// Registry order
    pub operators: Vec<OperatorSnapshot>,
    pub success_chains: usize,
    pub success_chains_evicted: u64,
    pub fingerprint_cache: CacheStats,
    pub encoding_cache: CacheStats,
    pub last_signals: Option<ResponseSignals>,
}

/// Adaptive mutation engine
pub struct TamperEngine {
    config: EngineConfig,
    registry: MutationRegistry,
    feedback: FeedbackStore,
    memory: SuccessChainMemory,
    backoff: Backoff,
    fingerprints: FingerprintCache,
    encodings: EncodingCache,
    rng: SmallRng,
    clock: Box<dyn Clock>,
    last_chain: Option<Chain>,
    last_signals: Option<ResponseSignals>,
    emitted: u64,
}

impl Default for TamperEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TamperEngine {
    /// Create an engine on the wall clock
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create an engine with an explicit time source
    pub fn with_clock(config: EngineConfig, clock: impl Clock + 'static) -> Self {
        let config = config.validated();
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Self {
            registry: MutationRegistry::with_operators(
                config.operators.clone(),
                SqlMutator::default(),
            ),
            feedback: FeedbackStore::new(config.weighting),
            memory: SuccessChainMemory::new(config.success_chain_capacity),
            backoff: Backoff::new(config.backoff),
            fingerprints: FingerprintCache::new(config.cache.fingerprint_capacity),
            encodings: EncodingCache::new(config.cache.encoding_capacity),
            rng,
            clock: Box::new(clock),
            last_chain: None,
            last_signals: None,
            emitted: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutate `payload` and wait out the pacing delay. The delay is dropped,
    /// not the payload, when `cancel` fires.
    pub async fn mutate(&mut self, payload: &str, cancel: &CancellationToken) -> Mutation {
        let mut mutation = self.prepare(payload);
        mutation.cancelled = !pace(mutation.delay, cancel).await;
        mutation
    }

    /// Everything `mutate` does except waiting
    pub fn prepare(&mut self, payload: &str) -> Mutation {
        let now = self.clock.now();
        let context = PayloadContext::detect(payload);
        let input = self.dedup(payload);

        let remembered =
            if !self.memory.is_empty() && self.rng.gen_bool(self.config.replay_probability) {
                self.memory.pick(&mut self.rng).cloned()
            } else {
                None
            };

        let builder = ChainBuilder::new(&self.registry, &self.feedback, &self.config, now);
        let (raw, mut chain, replayed) = match remembered {
            Some(chain) => {
                let raw = builder.replay(&chain, &input, &mut self.rng);
                (raw, chain, true)
            }
            None => {
                let built = builder.build(&input, &mut self.rng);
                (built.payload, built.chain, false)
            }
        };
        chain.retain_last(self.config.chain_retain);

        let encoded = context.wrap(&quote(&self.encodings.encode(&raw)));
        let delay = self.backoff.delay(&self.config.pacing, &mut self.rng);
        let entropy = shannon_entropy(&encoded);

        self.last_chain = Some(chain.clone());
        self.emitted += 1;

        tracing::debug!(
            "Emitted {} payload #{} via {} (entropy {:.3}, delay {:?})",
            context,
            self.emitted,
            chain,
            entropy,
            delay
        );

        Mutation {
            encoded,
            chain,
            context,
            replayed,
            delay,
            entropy,
            input,
            cancelled: false,
        }
    }

    /// Report the outcome of a chain given by operator names
    pub fn report<S: AsRef<str>>(&mut self, chain: &[S], succeeded: bool) -> ReportSummary {
        let (resolved, unknown) = self.registry.resolve(chain);
        for name in &unknown {
            tracing::warn!("Ignoring unknown operator in report: {}", name);
        }

        let mut summary = self.report_chain(&resolved, Outcome::from(succeeded));
        summary.skipped += unknown.len();
        summary
    }

    /// Report the outcome of an already-resolved chain. Operators outside
    /// the configured registry are dropped before recording.
    pub fn report_chain(&mut self, chain: &Chain, outcome: Outcome) -> ReportSummary {
        let registered: Vec<MutationOperator> =
            chain.iter().filter(|&op| self.registry.contains(op)).collect();
        let skipped = chain.len() - registered.len();
        if skipped > 0 {
            tracing::warn!("Ignoring {} disabled operator(s) in report", skipped);
        }
        let chain = Chain::from(registered);

        if chain.is_empty() {
            tracing::debug!("Nothing to record for an empty chain");
            return ReportSummary {
                recorded: 0,
                skipped,
                backoff: self.backoff.factor(),
            };
        }

        self.feedback.record_chain(&chain, outcome, self.clock.now());

        let before = self.backoff.factor();
        let after = match outcome {
            Outcome::Success => {
                self.memory.remember(chain.clone());
                self.backoff.relax()
            }
            Outcome::Fail => self.backoff.tighten(),
        };
        if (after - before).abs() > f64::EPSILON {
            tracing::info!("Backoff {:.2} -> {:.2} after {}", before, after, outcome);
        }
        tracing::debug!("Recorded {} for {}", outcome, chain);

        ReportSummary {
            recorded: chain.len(),
            skipped,
            backoff: after,
        }
    }

    /// Classify a response and keep the signals. They do not steer selection.
    pub fn observe_response(&mut self, response: &str) -> ResponseSignals {
        let signals = ResponseClassifier::classify(response);
        tracing::debug!(
            "Response signals: waf={}, dbms={}",
            signals.waf_detected,
            signals.dbms
        );
        self.last_signals = Some(signals);
        signals
    }

    /// Apply feedback about the previous payload, then mutate `payload`
    pub async fn tamper(
        &mut self,
        payload: &str,
        feedback: Option<Feedback>,
        cancel: &CancellationToken,
    ) -> Mutation {
        if let Some(feedback) = feedback {
            self.apply_feedback(feedback);
        }
        self.mutate(payload, cancel).await
    }

    fn apply_feedback(&mut self, feedback: Feedback) {
        if let Some(response) = feedback.response.as_deref() {
            self.observe_response(response);
        }

        let Some(outcome) = feedback.outcome else {
            return;
        };
        match self.last_chain.take() {
            Some(chain) => {
                self.report_chain(&chain, outcome);
                self.last_chain = Some(chain);
            }
            None => tracing::debug!("Outcome {} received before any payload", outcome),
        }
    }

    /// Append a random letter when this exact payload was seen before
    fn dedup(&mut self, payload: &str) -> String {
        let digest = self.fingerprints.digest(payload);
        if !self.fingerprints.seen(&digest) {
            self.fingerprints.record(digest);
            return payload.to_string();
        }

        let letter = DEDUP_ALPHABET[self.rng.gen_range(0..DEDUP_ALPHABET.len())] as char;
        let mut effective = String::with_capacity(payload.len() + 1);
        effective.push_str(payload);
        effective.push(letter);
        tracing::debug!("Repeated payload, appended '{}'", letter);

        let effective_digest = self.fingerprints.digest(&effective);
        self.fingerprints.record(digest);
        self.fingerprints.record(effective_digest);
        effective
    }

    pub fn backoff(&self) -> f64 {
        self.backoff.factor()
    }

    pub fn success_chains(&self) -> &SuccessChainMemory {
        &self.memory
    }

    /// Chain attached to the most recent payload
    pub fn last_chain(&self) -> Option<&Chain> {
        self.last_chain.as_ref()
    }

    pub fn last_signals(&self) -> Option<ResponseSignals> {
        self.last_signals
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let now = self.clock.now();
        let operators = self
            .registry
            .operators()
            .iter()
            .map(|&op| OperatorSnapshot {
                name: op.as_str(),
                stats: self.feedback.stats(op).cloned().unwrap_or_default(),
                weight: self.feedback.weight(op, now),
            })
            .collect();

        EngineSnapshot {
            backoff: self.backoff.factor(),
            emitted: self.emitted,
            operators,
            success_chains: self.memory.len(),
            success_chains_evicted: self.memory.evicted(),
            fingerprint_cache: self.fingerprints.stats(),
            encoding_cache: self.encodings.stats(),
            last_signals: self.last_signals,
        }
    }
}
