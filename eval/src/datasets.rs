// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset loading for clickbait classification evaluation
//!
//! Records come from JSON-lines files. Each line carries an `id`, a `label`
//! (0 or 1) and either a `title` or a combined `text` field where the
//! headline precedes a `[SEP]` token.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between headline and body in combined `text` records
pub const TEXT_SEPARATOR: &str = "[SEP]";

/// Locations tried, in order, when no explicit dataset path exists
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "../../shared/data/test/data.jsonl",
    "../../shared/data/test/data_demo.jsonl",
    "../shared/data/test/data.jsonl",
    "shared/data/test/data.jsonl",
    "data/test/data.jsonl",
];

/// Binary label for clickbait detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Neutral, informative headline
    NoClickbait,
    /// Headline written to bait the click
    Clickbait,
}

impl Label {
    /// Both classes in report order
    pub const ALL: [Label; 2] = [Label::NoClickbait, Label::Clickbait];

    /// Numeric value used in datasets and model replies
    pub fn to_binary(self) -> u8 {
        match self {
            Label::NoClickbait => 0,
            Label::Clickbait => 1,
        }
    }

    /// Create from binary value (1 = clickbait, 0 = not); anything else is rejected
    pub fn from_binary(value: u8) -> Option<Self> {
        match value {
            0 => Some(Label::NoClickbait),
            1 => Some(Label::Clickbait),
            _ => None,
        }
    }

    /// Display name used in progress lines and reports
    pub fn name(self) -> &'static str {
        match self {
            Label::NoClickbait => "No-clickbait",
            Label::Clickbait => "Clickbait",
        }
    }
}

/// A single headline from a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier
    pub id: String,
    /// Headline to classify
    pub title: String,
    /// Ground truth label
    pub label: Label,
    /// Fine-grained class from the source corpus, if present
    pub truth_class: Option<String>,
}

impl Sample {
    pub fn new(id: impl Into<String>, title: impl Into<String>, label: Label) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            label,
            truth_class: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file not found (searched: {})", format_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record on line {line} of {}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("dataset {} contains no samples", .path.display())]
    Empty { path: PathBuf },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line of a JSONL dataset as stored on disk
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    label: u8,
    #[serde(default)]
    truth_class: Option<String>,
}

impl RawRecord {
    fn into_sample(self, index: usize) -> Result<Sample, String> {
        let label = Label::from_binary(self.label)
            .ok_or_else(|| format!("label must be 0 or 1, got {}", self.label))?;

        let id = match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => return Err(format!("unsupported id value: {other}")),
            None => index.to_string(),
        };

        let title = match (self.text, self.title) {
            (Some(text), _) if text.contains(TEXT_SEPARATOR) => split_title(&text),
            (_, Some(title)) => title,
            (Some(text), None) => text.trim().to_string(),
            (None, None) => return Err("record has neither `title` nor `text`".to_string()),
        };

        Ok(Sample {
            id,
            title,
            label,
            truth_class: self.truth_class,
        })
    }
}

/// Headline portion of a combined `text` field
pub fn split_title(text: &str) -> String {
    text.split(TEXT_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"')
        .to_string()
}

/// A loaded dataset ready for evaluation
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub samples: Vec<Sample>,
}

impl Dataset {
    /// Resolve the dataset path: the explicit one when it exists, otherwise
    /// the first existing candidate.
    pub fn discover(explicit: Option<&Path>, candidates: &[&str]) -> Result<PathBuf, DatasetError> {
        let mut searched = Vec::new();

        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            searched.push(path.to_path_buf());
        }

        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.is_file() {
                tracing::debug!("Using dataset candidate {}", path.display());
                return Ok(path);
            }
            searched.push(path);
        }

        Err(DatasetError::NotFound { searched })
    }

    /// Load at most `limit` samples from a JSONL file
    pub fn load_jsonl(path: &Path, limit: Option<usize>) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut samples = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            if limit.is_some_and(|max| samples.len() >= max) {
                break;
            }

            let line = line.map_err(|source| DatasetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let malformed = |reason: String| DatasetError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };

            let record: RawRecord = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
            samples.push(record.into_sample(idx).map_err(malformed)?);
        }

        if samples.is_empty() {
            return Err(DatasetError::Empty {
                path: path.to_path_buf(),
            });
        }

        tracing::info!("Loaded {} samples from {}", samples.len(), path.display());

        Ok(Self {
            source: path.to_path_buf(),
            samples,
        })
    }

    /// Discover then load; the combination the pipeline uses
    pub fn locate_and_load(explicit: Option<&Path>, limit: Option<usize>) -> Result<Self, DatasetError> {
        let path = Self::discover(explicit, DEFAULT_CANDIDATES)?;
        Self::load_jsonl(&path, limit)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get label distribution for a set of samples
    pub fn label_distribution(samples: &[Sample]) -> HashMap<Label, usize> {
        let mut dist = HashMap::new();
        for sample in samples {
            *dist.entry(sample.label).or_insert(0) += 1;
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_jsonl(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_label_binary_mapping() {
        assert_eq!(Label::from_binary(0), Some(Label::NoClickbait));
        assert_eq!(Label::from_binary(1), Some(Label::Clickbait));
        assert_eq!(Label::from_binary(2), None);
        assert_eq!(Label::Clickbait.to_binary(), 1);
        assert_eq!(Label::NoClickbait.name(), "No-clickbait");
    }

    #[test]
    fn test_split_title_strips_quotes() {
        let text = "\"You won't believe this\" [SEP] body of the article";
        assert_eq!(split_title(text), "You won't believe this");
    }

    #[test]
    fn test_load_title_and_text_records() {
        let file = write_jsonl(&[
            r#"{"id": "a1", "title": "Apple reports Q3 earnings", "label": 0}"#,
            "",
            r#"{"id": 7, "text": "\"SHOCKING trick\" [SEP] more text", "label": 1, "truth_class": "clickbait"}"#,
            r#"{"title": "No id here", "label": 0}"#,
        ]);

        let dataset = Dataset::load_jsonl(file.path(), None).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.samples[0].id, "a1");
        assert_eq!(dataset.samples[1].id, "7");
        assert_eq!(dataset.samples[1].title, "SHOCKING trick");
        assert_eq!(dataset.samples[1].label, Label::Clickbait);
        assert_eq!(dataset.samples[1].truth_class.as_deref(), Some("clickbait"));
        assert_eq!(dataset.samples[2].id, "3");
    }

    #[test]
    fn test_load_respects_limit() {
        let file = write_jsonl(&[
            r#"{"id": 1, "title": "one", "label": 0}"#,
            r#"{"id": 2, "title": "two", "label": 1}"#,
            r#"{"id": 3, "title": "three", "label": 0}"#,
        ]);

        let dataset = Dataset::load_jsonl(file.path(), Some(2)).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.samples[1].title, "two");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let file = write_jsonl(&[
            r#"{"id": 1, "title": "ok", "label": 0}"#,
            r#"{"id": 2, "title": "bad label", "label": 5}"#,
        ]);

        match Dataset::load_jsonl(file.path(), None) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let file = write_jsonl(&["", "   "]);
        assert!(matches!(
            Dataset::load_jsonl(file.path(), None),
            Err(DatasetError::Empty { .. })
        ));
    }

    #[test]
    fn test_discover_prefers_explicit_then_candidates() {
        let dir = TempDir::new().unwrap();
        let candidate = dir.path().join("data.jsonl");
        std::fs::write(&candidate, "{}\n").unwrap();
        let candidate_str = candidate.to_string_lossy().to_string();

        let missing = dir.path().join("missing.jsonl");
        let found = Dataset::discover(Some(missing.as_path()), &[candidate_str.as_str()]).unwrap();
        assert_eq!(found, candidate);

        let err = Dataset::discover(Some(missing.as_path()), &[]).unwrap_err();
        match err {
            DatasetError::NotFound { searched } => assert_eq!(searched, vec![missing]),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_label_distribution() {
        let samples = vec![
            Sample::new("1", "a", Label::Clickbait),
            Sample::new("2", "b", Label::NoClickbait),
            Sample::new("3", "c", Label::Clickbait),
        ];
        let dist = Dataset::label_distribution(&samples);
        assert_eq!(dist.get(&Label::Clickbait), Some(&2));
        assert_eq!(dist.get(&Label::NoClickbait), Some(&1));
    }
}
