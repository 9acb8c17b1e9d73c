// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation pipeline for few-shot clickbait classification
//!
//! Orchestrates:
//! - Dataset discovery and loading
//! - The paced, sequential classification loop
//! - Metrics aggregation over the valid predictions
//! - Console reporting

use crate::classifier::Classifier;
use crate::datasets::{Dataset, Label, Sample};
use crate::metrics::{aggregate, MetricsError, MetricsReport, MetricsSummary};
use crate::parser::Prediction;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Characters of a title shown on a progress line
const TITLE_PREVIEW_CHARS: usize = 60;

/// Headlines classified by the demo mode
pub const DEMO_HEADLINES: &[&str] = &[
    "Federal Reserve announces new monetary policy changes",
    "This SHOCKING discovery will blow your mind!",
    "Microsoft reports record quarterly profits",
    "Doctors hate him for this ONE weird trick",
    "Breaking: Major trade agreement signed between countries",
];

/// Configuration for one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Name reported alongside the metrics
    pub method_name: String,
    /// Dataset file; the default locations are searched when absent or missing
    pub dataset_path: Option<PathBuf>,
    /// Maximum number of samples to evaluate
    pub data_limit: Option<usize>,
    /// Fixed pause after each model call
    pub delay: Duration,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            method_name: "few_shot".to_string(),
            dataset_path: None,
            data_limit: Some(25),
            delay: Duration::from_secs(1),
        }
    }
}

/// Predictions and ground truth, index-aligned with the evaluated samples
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationRun {
    pub predictions: Vec<Prediction>,
    pub true_labels: Vec<Label>,
    /// Stopped early on request
    pub interrupted: bool,
}

impl EvaluationRun {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn unknown_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_unknown()).count()
    }
}

fn title_preview(title: &str) -> String {
    title.chars().take(TITLE_PREVIEW_CHARS).collect()
}

fn describe_prediction(prediction: Prediction) -> String {
    match prediction.label() {
        Some(label) => format!("{} - {}", label.to_binary(), label.name()),
        None => "Response parsing error".to_string(),
    }
}

/// Classify every sample in order, pausing `delay` after each call.
///
/// `stop` is checked before each sample; once set, the loop ends and the
/// run collected so far is returned with `interrupted` set.
pub fn evaluate(classifier: &dyn Classifier, samples: &[Sample], delay: Duration, stop: &AtomicBool) -> EvaluationRun {
    let mut run = EvaluationRun {
        predictions: Vec::with_capacity(samples.len()),
        true_labels: Vec::with_capacity(samples.len()),
        interrupted: false,
    };
    let total = samples.len();

    for (i, sample) in samples.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            tracing::warn!("Stopped by user after {}/{} samples", i, total);
            run.interrupted = true;
            break;
        }

        println!("[{}/{}] {}...", i + 1, total, title_preview(&sample.title));

        let prediction = classifier.classify(&sample.title);
        run.predictions.push(prediction);
        run.true_labels.push(sample.label);

        println!("  → {}", describe_prediction(prediction));
        tracing::debug!(id = %sample.id, prediction = prediction.to_code(), truth = sample.label.to_binary());

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    run
}

/// Classify ad-hoc headlines and print each result
pub fn classify_titles(
    classifier: &dyn Classifier,
    titles: &[String],
    pause: Duration,
    stop: &AtomicBool,
) -> Vec<(String, Prediction)> {
    let mut results = Vec::with_capacity(titles.len());

    for (i, title) in titles.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        println!("\n--- Example {} ---", i + 1);
        println!("Headline: {}", title);

        let prediction = classifier.classify(title);
        let name = match prediction.label() {
            Some(Label::Clickbait) => "Clickbait",
            Some(Label::NoClickbait) => "Not Clickbait",
            None => "Error",
        };
        println!("Result: {} ({})", prediction.to_code(), name);
        results.push((title.clone(), prediction));

        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    results
}

/// Everything one run produced
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub method_name: String,
    pub dataset_source: Option<PathBuf>,
    pub run: EvaluationRun,
    /// `Err(NoValidPredictions)` when no reply could be parsed
    pub metrics: Result<MetricsReport, MetricsError>,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationOutcome {
    pub fn summary(&self) -> Option<&MetricsSummary> {
        self.metrics.as_ref().ok().map(|m| &m.summary)
    }

    /// Human-readable report for the console
    pub fn format(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("Generated: {}\n", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        if let Some(ref source) = self.dataset_source {
            report.push_str(&format!("Dataset: {}\n", source.display()));
        }
        report.push_str(&format!(
            "Evaluated: {} samples ({} unparseable){}\n\n",
            self.run.len(),
            self.run.unknown_count(),
            if self.run.interrupted { ", stopped early" } else { "" }
        ));

        match &self.metrics {
            Ok(metrics) => report.push_str(&metrics.format()),
            Err(e) => report.push_str(&format!("Metrics unavailable: {}\n", e)),
        }

        report
    }
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: EvaluationConfig,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Locate and load the dataset; failure is fatal for the run
    pub fn load_dataset(&self) -> Result<Dataset> {
        let dataset = Dataset::locate_and_load(self.config.dataset_path.as_deref(), self.config.data_limit)
            .context("Unable to load test data")?;

        let dist = Dataset::label_distribution(&dataset.samples);
        tracing::info!(
            "Dataset loaded: {} samples (clickbait={}, no-clickbait={})",
            dataset.len(),
            dist.get(&Label::Clickbait).copied().unwrap_or(0),
            dist.get(&Label::NoClickbait).copied().unwrap_or(0)
        );

        Ok(dataset)
    }

    /// Evaluate a classifier over already-loaded samples
    pub fn evaluate_samples(&self, classifier: &dyn Classifier, samples: &[Sample], stop: &AtomicBool) -> EvaluationOutcome {
        tracing::info!("Evaluating {} on {} samples", self.config.method_name, samples.len());

        let run = evaluate(classifier, samples, self.config.delay, stop);
        let metrics = aggregate(&run.predictions, &run.true_labels, &self.config.method_name);

        match &metrics {
            Ok(m) => tracing::info!(
                "{} - Accuracy: {:.4}, F1 (macro): {:.4}, valid {}/{}",
                self.config.method_name,
                m.summary.accuracy,
                m.summary.f1_macro,
                m.summary.valid_samples,
                m.summary.total_samples
            ),
            Err(e) => tracing::warn!("{}", e),
        }

        EvaluationOutcome {
            method_name: self.config.method_name.clone(),
            dataset_source: None,
            run,
            metrics,
            timestamp: Utc::now(),
        }
    }

    /// Run the full evaluation pipeline
    pub fn run(&self, classifier: &dyn Classifier, stop: &AtomicBool) -> Result<EvaluationOutcome> {
        let dataset = self.load_dataset()?;
        let mut outcome = self.evaluate_samples(classifier, &dataset.samples, stop);
        outcome.dataset_source = Some(dataset.source);
        Ok(outcome)
    }
}
