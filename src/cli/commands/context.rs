//! Context command - Show which envelope a payload would be wrapped in

use abacus::context::PayloadContext;
use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;

pub fn run(payload: &str, format: OutputFormat) -> Result<()> {
    let context = PayloadContext::detect(payload);

    match format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "payload": payload,
                "context": context,
                "example": context.wrap("PAYLOAD"),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            println!("{} {}", "Context:".cyan(), context.to_string().yellow().bold());
            println!("{} {}", "Envelope:".cyan(), context.wrap("PAYLOAD").dimmed());
        }
    }

    Ok(())
}
