// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation pipeline CLI for few-shot clickbait classification
//!
//! Usage:
//!   eval-pipeline --limit 25 --delay 1.0
//!   eval-pipeline --data ./data/test/data.jsonl --demo --json

use anyhow::{Context, Result};
use clap::Parser;
use clickbait_eval::classifier::FewShotClassifier;
use clickbait_eval::client::{ClientConfig, OpenAiClient};
use clickbait_eval::pipeline::{classify_titles, EvaluationConfig, EvaluationPipeline, DEMO_HEADLINES};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eval-pipeline")]
#[command(about = "Evaluate few-shot clickbait classification against a labeled dataset")]
#[command(version)]
struct Args {
    /// Path to the JSONL test dataset (default locations are searched otherwise)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Maximum number of samples to evaluate
    #[arg(short, long, default_value_t = 25)]
    limit: usize,

    /// Seconds to wait between model calls
    #[arg(long, default_value_t = 1.0)]
    delay: f64,

    /// Method name used in the report
    #[arg(long, default_value = "few_shot")]
    method: String,

    /// Model to use (overrides OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Classify the built-in demo headlines before evaluating
    #[arg(long)]
    demo: bool,

    /// Also print the metrics summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let delay = Duration::try_from_secs_f64(args.delay)
        .with_context(|| format!("Invalid --delay value: {}", args.delay))?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    tracing::info!("Few-shot clickbait evaluation");
    tracing::info!("=============================");

    let mut client_config = ClientConfig::from_env().context("OpenAI client configuration error")?;
    if let Some(model) = args.model {
        client_config = client_config.with_model(model);
    }
    tracing::info!("Model: {}", client_config.model);

    let client = OpenAiClient::new(client_config).context("OpenAI client initialization error")?;
    let classifier = FewShotClassifier::new(client);

    if args.demo {
        println!("\nFEW-SHOT PROMPTING DEMO");
        println!("{}", "=".repeat(50));
        let titles: Vec<String> = DEMO_HEADLINES.iter().map(|s| s.to_string()).collect();
        classify_titles(&classifier, &titles, Duration::from_millis(500), &stop);
    }

    if stop.load(Ordering::SeqCst) {
        println!("\nStopped by user");
        return Ok(());
    }

    let config = EvaluationConfig {
        method_name: args.method,
        dataset_path: args.data,
        data_limit: Some(args.limit),
        delay,
    };

    println!("\n{}", "=".repeat(60));
    println!("EVALUATING: FEW-SHOT PROMPTING");
    println!("{}", "=".repeat(60));

    let pipeline = EvaluationPipeline::new(config);
    let outcome = pipeline.run(&classifier, &stop)?;

    if outcome.run.interrupted {
        println!("\nStopped by user, reporting on {} collected samples", outcome.run.len());
    }

    println!("\n{}", outcome.format());

    let Some(summary) = outcome.summary() else {
        anyhow::bail!("Evaluation failed to generate valid metrics");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    println!("Evaluation completed successfully!");

    Ok(())
}
