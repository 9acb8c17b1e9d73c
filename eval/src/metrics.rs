// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for binary clickbait classification
//!
//! Unknown predictions are filtered out before anything is computed. The
//! remaining pairs give:
//! - Confusion Matrix
//! - Accuracy
//! - Per-class Precision, Recall, F1 and support
//! - Macro and support-weighted averages
//!
//! Division by zero yields 0 rather than an error.

use crate::datasets::Label;
use crate::parser::Prediction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    /// Every prediction was unknown; metrics are unavailable, not zero
    #[error("no valid predictions for method {method} ({total} samples)")]
    NoValidPredictions { method: String, total: usize },

    #[error("{predictions} predictions but {labels} true labels")]
    LengthMismatch { predictions: usize, labels: usize },
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        return 0.0;
    }
    num as f64 / denom as f64
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    let denom = precision + recall;
    if denom == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / denom
}

/// Confusion matrix with clickbait as the positive class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Clickbait predicted as clickbait
    pub tp: usize,
    /// Non-clickbait predicted as non-clickbait
    pub tn: usize,
    /// Non-clickbait predicted as clickbait
    pub fp: usize,
    /// Clickbait predicted as non-clickbait
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(predictions: &[Label], ground_truth: &[Label]) -> Self {
        let mut matrix = Self::default();

        for (pred, truth) in predictions.iter().zip(ground_truth.iter()) {
            match (pred, truth) {
                (Label::Clickbait, Label::Clickbait) => matrix.tp += 1,
                (Label::NoClickbait, Label::NoClickbait) => matrix.tn += 1,
                (Label::Clickbait, Label::NoClickbait) => matrix.fp += 1,
                (Label::NoClickbait, Label::Clickbait) => matrix.fn_ += 1,
            }
        }

        matrix
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Metrics for one class, treating it as the positive class
    pub fn class_metrics(&self, label: Label) -> ClassMetrics {
        let (hits, false_alarms, misses) = match label {
            Label::Clickbait => (self.tp, self.fp, self.fn_),
            Label::NoClickbait => (self.tn, self.fn_, self.fp),
        };

        let precision = ratio(hits, hits + false_alarms);
        let recall = ratio(hits, hits + misses);

        ClassMetrics {
            label,
            precision,
            recall,
            f1_score: harmonic_mean(precision, recall),
            support: hits + misses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Headline numbers for one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub method_name: String,
    pub accuracy: f64,
    pub precision_macro: f64,
    pub recall_macro: f64,
    pub f1_macro: f64,
    pub precision_weighted: f64,
    pub recall_weighted: f64,
    pub f1_weighted: f64,
    /// Predictions that were not unknown
    pub valid_samples: usize,
    pub total_samples: usize,
}

impl MetricsSummary {
    /// Share of samples excluded because the reply could not be parsed
    pub fn excluded_samples(&self) -> usize {
        self.total_samples - self.valid_samples
    }
}

/// Summary plus the per-class breakdown behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub summary: MetricsSummary,
    pub per_class: Vec<ClassMetrics>,
    pub confusion_matrix: ConfusionMatrix,
}

/// Keep only the index-aligned pairs whose prediction is a definite label
pub fn filter_valid(predictions: &[Prediction], true_labels: &[Label]) -> (Vec<Label>, Vec<Label>) {
    predictions
        .iter()
        .zip(true_labels.iter())
        .filter_map(|(pred, truth)| pred.label().map(|label| (label, *truth)))
        .unzip()
}

/// Filter unknown predictions and compute the metrics for one run
pub fn aggregate(
    predictions: &[Prediction],
    true_labels: &[Label],
    method_name: &str,
) -> Result<MetricsReport, MetricsError> {
    if predictions.len() != true_labels.len() {
        return Err(MetricsError::LengthMismatch {
            predictions: predictions.len(),
            labels: true_labels.len(),
        });
    }

    let (valid_predictions, valid_labels) = filter_valid(predictions, true_labels);
    if valid_predictions.is_empty() {
        return Err(MetricsError::NoValidPredictions {
            method: method_name.to_string(),
            total: predictions.len(),
        });
    }

    let cm = ConfusionMatrix::from_labels(&valid_predictions, &valid_labels);
    let per_class: Vec<ClassMetrics> = Label::ALL.iter().map(|l| cm.class_metrics(*l)).collect();

    let classes = per_class.len() as f64;
    let macro_avg = |f: fn(&ClassMetrics) -> f64| per_class.iter().map(f).sum::<f64>() / classes;

    let total_support: usize = per_class.iter().map(|c| c.support).sum();
    let weighted_avg = |f: fn(&ClassMetrics) -> f64| {
        if total_support == 0 {
            return 0.0;
        }
        per_class.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total_support as f64
    };

    let summary = MetricsSummary {
        method_name: method_name.to_string(),
        accuracy: cm.accuracy(),
        precision_macro: macro_avg(|c| c.precision),
        recall_macro: macro_avg(|c| c.recall),
        f1_macro: macro_avg(|c| c.f1_score),
        precision_weighted: weighted_avg(|c| c.precision),
        recall_weighted: weighted_avg(|c| c.recall),
        f1_weighted: weighted_avg(|c| c.f1_score),
        valid_samples: valid_predictions.len(),
        total_samples: predictions.len(),
    };

    Ok(MetricsReport {
        summary,
        per_class,
        confusion_matrix: cm,
    })
}

impl MetricsReport {
    /// Per-class table in the familiar precision/recall/f1/support layout
    pub fn classification_table(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();

        out.push_str(&format!(
            "{:>14} {:>10} {:>10} {:>10} {:>10}\n\n",
            "", "precision", "recall", "f1-score", "support"
        ));
        for class in &self.per_class {
            out.push_str(&format!(
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}\n",
                class.label.name(),
                class.precision,
                class.recall,
                class.f1_score,
                class.support
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}\n",
            "accuracy", "", "", s.accuracy, s.valid_samples
        ));
        out.push_str(&format!(
            "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}\n",
            "macro avg", s.precision_macro, s.recall_macro, s.f1_macro, s.valid_samples
        ));
        out.push_str(&format!(
            "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}\n",
            "weighted avg", s.precision_weighted, s.recall_weighted, s.f1_weighted, s.valid_samples
        ));

        out
    }

    /// Format as a human-readable report
    pub fn format(&self) -> String {
        let s = &self.summary;
        let cm = &self.confusion_matrix;

        format!(
            r#"RESULTS FOR METHOD: {}
============================================================
Valid samples: {}/{} ({} excluded)
Accuracy: {:.4}

Macro Averages:
  Precision (macro): {:.4}
  Recall (macro): {:.4}
  F1-Score (macro): {:.4}

Weighted Averages:
  Precision (weighted): {:.4}
  Recall (weighted): {:.4}
  F1-Score (weighted): {:.4}

Detailed Classification Report:
{}
Confusion Matrix:
                   Predicted
                   Clickbait  No-clickbait
Actual Clickbait    {:>6}     {:>6}
       No-clickbait {:>6}     {:>6}
"#,
            s.method_name.to_uppercase(),
            s.valid_samples,
            s.total_samples,
            s.excluded_samples(),
            s.accuracy,
            s.precision_macro,
            s.recall_macro,
            s.f1_macro,
            s.precision_weighted,
            s.recall_weighted,
            s.f1_weighted,
            self.classification_table(),
            cm.tp,
            cm.fn_,
            cm.fp,
            cm.tn,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const U: Prediction = Prediction::Unknown;
    const P1: Prediction = Prediction::Label(Label::Clickbait);
    const P0: Prediction = Prediction::Label(Label::NoClickbait);

    fn labels(bits: &[u8]) -> Vec<Label> {
        bits.iter().map(|b| Label::from_binary(*b).unwrap()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_filter_drops_unknown_pairs() {
        let (preds, truth) = filter_valid(&[P1, P0, P1, U, P0], &labels(&[1, 0, 0, 1, 0]));
        assert_eq!(preds, labels(&[1, 0, 1, 0]));
        assert_eq!(truth, labels(&[1, 0, 0, 0]));
    }

    #[test]
    fn test_aggregate_mixed_run() {
        let report = aggregate(&[P1, P0, P1, U, P0], &labels(&[1, 0, 0, 1, 0]), "few_shot").unwrap();
        let s = &report.summary;

        assert_eq!(s.valid_samples, 4);
        assert_eq!(s.total_samples, 5);
        assert_eq!(s.excluded_samples(), 1);
        assert!(close(s.accuracy, 0.75));

        // Clickbait: P=0.5 R=1.0 F1=0.6667 n=1; No-clickbait: P=1.0 R=0.6667 F1=0.8 n=3
        assert!(close(s.precision_macro, 0.75));
        assert!(close(s.recall_macro, 0.8333));
        assert!(close(s.f1_macro, 0.7333));
        assert!(close(s.precision_weighted, 0.875));
        assert!(close(s.recall_weighted, 0.75));
        assert!(close(s.f1_weighted, 0.7667));

        assert_eq!(report.confusion_matrix, ConfusionMatrix { tp: 1, tn: 2, fp: 1, fn_: 0 });
        assert_eq!(report.per_class[0].label, Label::NoClickbait);
        assert_eq!(report.per_class[0].support, 3);
        assert_eq!(report.per_class[1].support, 1);
    }

    #[test]
    fn test_all_unknown_is_unavailable() {
        let err = aggregate(&[U, U, U], &labels(&[1, 0, 1]), "few_shot").unwrap_err();
        assert_eq!(
            err,
            MetricsError::NoValidPredictions {
                method: "few_shot".to_string(),
                total: 3
            }
        );
        assert!(matches!(aggregate(&[], &[], "few_shot"), Err(MetricsError::NoValidPredictions { .. })));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert_eq!(
            aggregate(&[P1], &labels(&[1, 0]), "few_shot").unwrap_err(),
            MetricsError::LengthMismatch { predictions: 1, labels: 2 }
        );
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // Never predicts clickbait, and no clickbait in the truth either
        let report = aggregate(&[P0, P0], &labels(&[0, 0]), "few_shot").unwrap();
        let clickbait = &report.per_class[1];

        assert_eq!(clickbait.precision, 0.0);
        assert_eq!(clickbait.recall, 0.0);
        assert_eq!(clickbait.f1_score, 0.0);
        assert!(close(report.summary.accuracy, 1.0));
        assert!(close(report.summary.f1_macro, 0.5));
        assert!(close(report.summary.f1_weighted, 1.0));
    }

    #[test]
    fn test_perfect_predictions() {
        let report = aggregate(&[P1, P0, P1, P0], &labels(&[1, 0, 1, 0]), "few_shot").unwrap();
        let s = &report.summary;
        for value in [s.accuracy, s.precision_macro, s.recall_macro, s.f1_macro, s.f1_weighted] {
            assert!(close(value, 1.0));
        }
    }

    #[test]
    fn test_report_format() {
        let report = aggregate(&[P1, P0, U], &labels(&[1, 1, 0]), "few_shot").unwrap();
        let formatted = report.format();

        assert!(formatted.contains("RESULTS FOR METHOD: FEW_SHOT"));
        assert!(formatted.contains("Valid samples: 2/3 (1 excluded)"));
        assert!(formatted.contains("Accuracy: 0.5000"));
        assert!(formatted.contains("No-clickbait"));
        assert!(formatted.contains("weighted avg"));
        assert!(formatted.contains("Confusion Matrix"));
    }

    #[test]
    fn test_classification_table_layout() {
        let report = aggregate(&[P1, P0, U], &labels(&[1, 1, 0]), "few_shot").unwrap();
        let table = report.classification_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0].split_whitespace().collect::<Vec<_>>(),
            ["precision", "recall", "f1-score", "support"]
        );
        assert_eq!(lines[1], "");
        assert!(lines[2].trim_start().starts_with("No-clickbait"));
        assert_eq!(
            lines[3].split_whitespace().collect::<Vec<_>>(),
            ["Clickbait", "1.0000", "0.5000", "0.6667", "2"]
        );
        assert_eq!(lines[4], "");
        assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), ["accuracy", "0.5000", "2"]);
        assert!(lines[7].trim_start().starts_with("weighted avg"));
        assert!(table.ends_with('\n'));
    }

    #[test]
    fn test_summary_serializes_with_field_names() {
        let report = aggregate(&[P1], &labels(&[1]), "few_shot").unwrap();
        let json = serde_json::to_value(&report.summary).unwrap();

        assert_eq!(json["method_name"], "few_shot");
        assert_eq!(json["valid_samples"], 1);
        assert_eq!(json["total_samples"], 1);
        assert!(json.get("f1_weighted").is_some());
    }
}
