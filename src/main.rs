//! Abacus - Adaptive SQL payload mutation engine
//!
//! Command-line driver for the library: mutate payloads with feedback,
//! classify responses and generate request headers.

use std::path::PathBuf;

use abacus::engine::EngineProfile;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::commands;
use cli::commands::mutate::MutateArgs;
use cli::{CliOutcome, OutputFormat};

/// Abacus - Adaptive payload mutation for authorized WAF testing
#[derive(Parser)]
#[command(
    name = "abacus",
    version,
    about = "Adaptive SQL payload mutation engine",
    long_about = "Abacus mutates SQL payloads through chains of string transforms and learns \
                  which chains get through from the outcomes you report.\n\n\
                  Use only against systems you are authorized to test."
)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mutate a payload, optionally reporting a fixed outcome after each round
    Mutate {
        /// Payload to mutate
        payload: String,

        /// Number of payloads to emit
        #[arg(short, long, default_value = "1")]
        rounds: u32,

        /// Random seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// Engine profile (ignored when --config is given)
        #[arg(short, long)]
        profile: Option<EngineProfile>,

        /// Path to a TOML file with an [engine] table
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Outcome to report after every round
        #[arg(short, long)]
        outcome: Option<CliOutcome>,

        /// Skip the pacing delay
        #[arg(long)]
        no_delay: bool,
    },

    /// Classify a response body for WAF and DBMS markers
    Classify {
        /// Response text
        response: String,
    },

    /// Generate randomised request headers
    Headers {
        /// Number of header sets
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Random seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Show the injection context detected for a payload
    Context {
        /// Payload to inspect
        payload: String,
    },
}

fn init_logging(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbosity {
            0 => EnvFilter::new("abacus=warn"),
            1 => EnvFilter::new("abacus=info"),
            2 => EnvFilter::new("abacus=debug"),
            _ => EnvFilter::new("abacus=trace"),
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Mutate {
            payload,
            rounds,
            seed,
            profile,
            config,
            outcome,
            no_delay,
        } => {
            let args = MutateArgs {
                payload,
                rounds,
                seed,
                profile,
                config,
                outcome,
                no_delay,
            };
            commands::mutate::run(args, cli.format).await?;
        }
        Commands::Classify { response } => {
            commands::classify::run(&response, cli.format)?;
        }
        Commands::Headers { count, seed } => {
            commands::headers::run(count, seed, cli.format)?;
        }
        Commands::Context { payload } => {
            commands::context::run(&payload, cli.format)?;
        }
    }

    Ok(())
}
