//! CLI module - Command implementations

pub mod commands;

use abacus::feedback::Outcome;

/// Output format for CLI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Outcome to report after every round (wrapper around feedback::Outcome)
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CliOutcome {
    Success,
    Fail,
}

impl From<CliOutcome> for Outcome {
    fn from(outcome: CliOutcome) -> Self {
        match outcome {
            CliOutcome::Success => Outcome::Success,
            CliOutcome::Fail => Outcome::Fail,
        }
    }
}
