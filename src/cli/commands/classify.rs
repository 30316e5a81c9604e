//! Classify command - Inspect a response body for WAF and DBMS markers

use abacus::detection::{Dbms, ResponseClassifier};
use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;

pub fn run(response: &str, format: OutputFormat) -> Result<()> {
    let signals = ResponseClassifier::classify(response);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&signals)?);
        }
        OutputFormat::Text => {
            let waf = if signals.waf_detected {
                "detected".red().bold()
            } else {
                "not detected".green()
            };
            let dbms = match signals.dbms {
                Dbms::Unknown => signals.dbms.to_string().dimmed(),
                other => other.to_string().yellow().bold(),
            };
            println!("{} {}", "WAF: ".cyan(), waf);
            println!("{} {}", "DBMS:".cyan(), dbms);
        }
    }

    Ok(())
}
