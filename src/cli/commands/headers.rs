//! Headers command - Print randomised request header sets

use abacus::headers::HeaderGenerator;
use anyhow::Result;
use colored::Colorize;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::cli::OutputFormat;

pub fn run(count: usize, seed: Option<u64>, format: OutputFormat) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let sets: Vec<_> = (0..count)
        .map(|_| HeaderGenerator::generate(&mut rng))
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sets)?);
        }
        OutputFormat::Text => {
            for (i, headers) in sets.iter().enumerate() {
                if i > 0 {
                    println!("{}", "━".repeat(60).dimmed());
                }
                for (name, value) in headers {
                    println!("{}: {}", name.cyan(), value);
                }
            }
        }
    }

    Ok(())
}
