// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classify individual headlines with the few-shot prompt
//!
//! Uses the built-in demo headlines when none are given.

use anyhow::{Context, Result};
use clap::Parser;
use clickbait_eval::classifier::FewShotClassifier;
use clickbait_eval::client::{ClientConfig, OpenAiClient};
use clickbait_eval::pipeline::{classify_titles, DEMO_HEADLINES};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "classify-demo")]
#[command(about = "Classify headlines as clickbait (1) or not (0)")]
#[command(version)]
struct Args {
    /// Headlines to classify
    titles: Vec<String>,

    /// Model to use (overrides OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Milliseconds to wait between model calls
    #[arg(long, default_value_t = 500)]
    pause_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("Failed to set Ctrl+C handler")?;

    let mut config = ClientConfig::from_env().context("OpenAI client configuration error")?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    let classifier = FewShotClassifier::new(OpenAiClient::new(config)?);

    let titles = if args.titles.is_empty() {
        DEMO_HEADLINES.iter().map(|s| s.to_string()).collect()
    } else {
        args.titles
    };

    println!("FEW-SHOT PROMPTING DEMO");
    println!("{}", "=".repeat(50));

    let results = classify_titles(&classifier, &titles, Duration::from_millis(args.pause_ms), &stop);
    let errors = results.iter().filter(|(_, p)| p.is_unknown()).count();

    println!("\n{}", "=".repeat(50));
    println!("Classified {} headlines ({} errors)", results.len(), errors);

    Ok(())
}
