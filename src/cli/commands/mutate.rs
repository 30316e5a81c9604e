//! Mutate command - Run the engine over one payload for several rounds
//!
//! Optionally reports a fixed outcome after every round so the effect of
//! feedback on backoff and chain choice can be watched from the shell.

use std::path::PathBuf;

use abacus::engine::{EngineConfig, EngineProfile, Mutation, TamperEngine};
use abacus::feedback::Outcome;
use anyhow::{Context, Result};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::{CliOutcome, OutputFormat};

/// Arguments for `abacus mutate`
#[derive(Debug, Clone)]
pub struct MutateArgs {
    pub payload: String,
    pub rounds: u32,
    pub seed: Option<u64>,
    pub profile: Option<EngineProfile>,
    pub config: Option<PathBuf>,
    pub outcome: Option<CliOutcome>,
    pub no_delay: bool,
}

/// Resolve the engine config: explicit file, then profile, then default locations
fn resolve_config(args: &MutateArgs) -> Result<EngineConfig> {
    let mut config = match (&args.config, args.profile) {
        (Some(path), _) => EngineConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, Some(profile)) => EngineConfig::with_profile(profile),
        (None, None) => EngineConfig::load_or_default(None),
    };

    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.no_delay {
        config = config.without_pacing();
    }
    Ok(config)
}

pub async fn run(args: MutateArgs, format: OutputFormat) -> Result<()> {
    let config = resolve_config(&args)?;
    let outcome = args.outcome.map(Outcome::from);
    let mut engine = TamperEngine::new(config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing current round");
            on_signal.cancel();
        }
    });

    debug!("Running {} rounds over {:?}", args.rounds, args.payload);

    let mut rounds = Vec::new();
    for round in 1..=args.rounds {
        let mutation = engine.mutate(&args.payload, &cancel).await;
        let report = outcome.map(|o| engine.report_chain(&mutation.chain, o));

        if format == OutputFormat::Text {
            print_round_text(round, &mutation, report.map(|r| r.backoff));
        }
        rounds.push(serde_json::json!({
            "round": round,
            "mutation": mutation,
            "report": report,
        }));

        if cancel.is_cancelled() {
            break;
        }
    }

    match format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "rounds": rounds,
                "state": engine.snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => print_summary_text(&engine),
    }

    Ok(())
}

fn print_round_text(round: u32, mutation: &Mutation, backoff: Option<f64>) {
    println!("{}", "━".repeat(60).dimmed());
    let origin = if mutation.replayed {
        "replayed".magenta()
    } else {
        "fresh".green()
    };
    println!(
        "{} {} [{}] context={}",
        "Round".cyan(),
        round.to_string().yellow().bold(),
        origin,
        mutation.context
    );
    println!("  Chain:   {}", mutation.chain);
    println!(
        "  Entropy: {:.3} bits/char, delay {:.2}s{}",
        mutation.entropy,
        mutation.delay.as_secs_f64(),
        if mutation.cancelled {
            " (cancelled)".red().to_string()
        } else {
            String::new()
        }
    );
    if let Some(backoff) = backoff {
        println!("  Backoff: {:.2}", backoff);
    }
    println!("  {}", mutation.encoded);
}

fn print_summary_text(engine: &TamperEngine) {
    let snapshot = engine.snapshot();
    println!("{}", "━".repeat(60).dimmed());
    println!(
        "{} {} payloads, backoff {:.2}, {} remembered chains",
        "Done:".green().bold(),
        snapshot.emitted,
        snapshot.backoff,
        snapshot.success_chains
    );
    for op in snapshot.operators.iter().filter(|op| op.stats.total() > 0) {
        println!(
            "  {:<16} {:>4} ok {:>4} fail  weight {:.3}",
            op.name, op.stats.success_count, op.stats.fail_count, op.weight
        );
    }
}
