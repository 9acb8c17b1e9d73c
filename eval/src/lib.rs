// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Few-shot LLM clickbait classification and evaluation
//!
//! This crate provides:
//! - Dataset loading from JSON-lines files
//! - A heuristic parser turning free-text model replies into labels
//! - An OpenAI-compatible model client behind the [`ModelClient`] trait
//! - A few-shot headline classifier
//! - A paced, interruptible evaluation loop
//! - Accuracy, per-class, macro and weighted Precision/Recall/F1

pub mod classifier;
pub mod client;
pub mod datasets;
pub mod metrics;
pub mod parser;
pub mod pipeline;

pub use classifier::{Classifier, ClassifyError, FewShotClassifier};
pub use client::{ClientConfig, ClientError, GenerationRequest, ModelClient, OpenAiClient};
pub use datasets::{Dataset, DatasetError, Label, Sample};
pub use metrics::{aggregate, ClassMetrics, ConfusionMatrix, MetricsError, MetricsReport, MetricsSummary};
pub use parser::{parse_response, parse_with_answer_fast_path, Prediction, Rule};
pub use pipeline::{evaluate, EvaluationConfig, EvaluationOutcome, EvaluationPipeline, EvaluationRun};
