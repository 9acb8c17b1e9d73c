// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Heuristic interpretation of free-text model replies
//!
//! A reply is matched against an ordered list of [`Rule`]s, strongest
//! structural markers first and lexical cues last. The first rule that
//! produces a label wins; if none does, the reply is [`Prediction::Unknown`].
//! Parsing is total and deterministic.

use crate::datasets::Label;
use serde::{Deserialize, Serialize};

/// Markers that indicate a clickbait verdict
pub const POSITIVE_MARKERS: &[&str] = &[
    "[1]",
    "label: 1",
    "classification: 1",
    "answer: 1",
    "1 (clickbait)",
    "1(clickbait)",
    "result: 1",
    "output: 1",
    "prediction: 1",
    "final: 1",
];

/// Markers that indicate a non-clickbait verdict
pub const NEGATIVE_MARKERS: &[&str] = &[
    "[0]",
    "label: 0",
    "classification: 0",
    "answer: 0",
    "0 (no-clickbait)",
    "0(no-clickbait)",
    "result: 0",
    "output: 0",
    "prediction: 0",
    "final: 0",
];

/// Marker inspected by the fast path ahead of the rule cascade
pub const ANSWER_MARKER: &str = "answer:";

/// Characters after the last [`ANSWER_MARKER`] searched by the fast path
pub const ANSWER_WINDOW: usize = 5;

/// Outcome of interpreting one reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
    Label(Label),
    /// No definite label could be extracted; never counted as 0 or 1
    Unknown,
}

impl Prediction {
    pub fn label(self) -> Option<Label> {
        match self {
            Prediction::Label(label) => Some(label),
            Prediction::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Prediction::Unknown)
    }

    /// Numeric form: 0, 1, or -1 for unknown
    pub fn to_code(self) -> i8 {
        match self {
            Prediction::Label(label) => label.to_binary() as i8,
            Prediction::Unknown => -1,
        }
    }
}

impl From<Label> for Prediction {
    fn from(label: Label) -> Self {
        Prediction::Label(label)
    }
}

impl From<Option<Label>> for Prediction {
    fn from(label: Option<Label>) -> Self {
        label.map_or(Prediction::Unknown, Prediction::Label)
    }
}

/// A reply prepared for matching. The original text is kept alongside the
/// lower-cased form.
#[derive(Debug, Clone)]
pub struct NormalizedReply<'a> {
    original: &'a str,
    lowered: String,
}

impl<'a> NormalizedReply<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            lowered: original.to_lowercase(),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    pub fn lowered(&self) -> &str {
        &self.lowered
    }
}

/// One step of the interpretation cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Any of the fixed substrings maps to the given label
    Markers(Label, &'static [&'static str]),
    /// Scanning lines from the end, a line that is a bare digit, ends with
    /// ` <digit>` or starts with `<digit> `
    StandaloneDigit,
    /// Mentions of "clickbait" with or without negation
    Keyword,
}

/// Rules in evaluation order. Positive markers precede negative markers so
/// that a reply carrying both resolves to clickbait.
pub const RULES: &[Rule] = &[
    Rule::Markers(Label::Clickbait, POSITIVE_MARKERS),
    Rule::Markers(Label::NoClickbait, NEGATIVE_MARKERS),
    Rule::StandaloneDigit,
    Rule::Keyword,
];

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Markers(Label::Clickbait, _) => "positive-marker",
            Rule::Markers(Label::NoClickbait, _) => "negative-marker",
            Rule::StandaloneDigit => "standalone-digit",
            Rule::Keyword => "keyword",
        }
    }

    /// Apply this rule alone to a lower-cased reply
    pub fn apply(&self, lowered: &str) -> Option<Label> {
        match self {
            Rule::Markers(label, markers) => markers
                .iter()
                .any(|marker| lowered.contains(marker))
                .then_some(*label),
            Rule::StandaloneDigit => standalone_digit(lowered),
            Rule::Keyword => keyword(lowered),
        }
    }
}

fn standalone_digit(lowered: &str) -> Option<Label> {
    let line_matches = |line: &str, digit: &str| {
        line == digit
            || line.strip_suffix(digit).is_some_and(|rest| rest.ends_with(' '))
            || line.strip_prefix(digit).is_some_and(|rest| rest.starts_with(' '))
    };

    lowered.trim().lines().rev().map(str::trim).find_map(|line| {
        if line_matches(line, "1") {
            Some(Label::Clickbait)
        } else if line_matches(line, "0") {
            Some(Label::NoClickbait)
        } else {
            None
        }
    })
}

fn keyword(lowered: &str) -> Option<Label> {
    let negated = lowered.contains("no-clickbait") || lowered.contains("not clickbait");
    if lowered.contains("clickbait") && !negated {
        Some(Label::Clickbait)
    } else if negated {
        Some(Label::NoClickbait)
    } else {
        None
    }
}

/// Run the full rule cascade over a reply
pub fn parse_response(raw: &str) -> Prediction {
    let reply = NormalizedReply::new(raw);

    for rule in RULES {
        if let Some(label) = rule.apply(reply.lowered()) {
            tracing::trace!(rule = rule.name(), label = label.to_binary(), "reply matched");
            return label.into();
        }
    }

    tracing::debug!(reply = reply.original(), "no rule matched reply");
    Prediction::Unknown
}

/// Quick check on the text following the last `answer:` marker. A `1` in
/// the first [`ANSWER_WINDOW`] characters wins over a `0`.
///
/// This can disagree with [`parse_response`] on contrived replies, e.g. one
/// that states `label: 0` but ends with `answer: (1)`. The fast path result
/// stands in that case.
pub fn answer_fast_path(raw: &str) -> Option<Label> {
    let lowered = raw.to_lowercase();
    let (_, tail) = lowered.rsplit_once(ANSWER_MARKER)?;
    let window: String = tail.chars().take(ANSWER_WINDOW).collect();

    if window.contains('1') {
        Some(Label::Clickbait)
    } else if window.contains('0') {
        Some(Label::NoClickbait)
    } else {
        None
    }
}

/// Two-stage interpretation used by the classifier: the `answer:` fast
/// path, then the rule cascade.
pub fn parse_with_answer_fast_path(raw: &str) -> Prediction {
    match answer_fast_path(raw) {
        Some(label) => label.into(),
        None => parse_response(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICKBAIT: Prediction = Prediction::Label(Label::Clickbait);
    const NOT_CLICKBAIT: Prediction = Prediction::Label(Label::NoClickbait);

    #[test]
    fn test_label_marker_anywhere() {
        for text in [
            "label: 1",
            "After some thought.\nLabel: 1\nThat is all.",
            "The headline uses hype (LABEL: 1).",
        ] {
            assert_eq!(parse_response(text), CLICKBAIT, "{text}");
        }
        for text in ["label: 0", "Reasoning first... label: 0 because it is factual"] {
            assert_eq!(parse_response(text), NOT_CLICKBAIT, "{text}");
        }
    }

    #[test]
    fn test_every_marker_maps_to_its_label() {
        for marker in POSITIVE_MARKERS {
            assert_eq!(parse_response(&format!("verdict {marker} done")), CLICKBAIT, "{marker}");
        }
        for marker in NEGATIVE_MARKERS {
            assert_eq!(parse_response(&format!("verdict {marker} done")), NOT_CLICKBAIT, "{marker}");
        }
    }

    #[test]
    fn test_positive_markers_win_ties() {
        assert_eq!(parse_response("answer: 1 ... label: 0"), CLICKBAIT);
        assert_eq!(parse_response("label: 0\nanswer: 1"), CLICKBAIT);
    }

    #[test]
    fn test_marker_rules_in_isolation() {
        let positive = RULES[0];
        let negative = RULES[1];
        assert_eq!(positive.apply("[1]"), Some(Label::Clickbait));
        assert_eq!(positive.apply("[0]"), None);
        assert_eq!(negative.apply("0(no-clickbait)"), Some(Label::NoClickbait));
        assert_eq!(negative.name(), "negative-marker");
    }

    #[test]
    fn test_standalone_digit_scans_from_last_line() {
        assert_eq!(Rule::StandaloneDigit.apply("reasoning\n1"), Some(Label::Clickbait));
        assert_eq!(Rule::StandaloneDigit.apply("i pick 0"), Some(Label::NoClickbait));
        assert_eq!(Rule::StandaloneDigit.apply("0 since it is plain news"), Some(Label::NoClickbait));
        // Last matching line wins
        assert_eq!(Rule::StandaloneDigit.apply("1\nsome text\n  0  \n"), Some(Label::NoClickbait));
        assert_eq!(Rule::StandaloneDigit.apply("score 10\n01"), None);
    }

    #[test]
    fn test_keyword_rule() {
        assert_eq!(Rule::Keyword.apply("this is clickbait"), Some(Label::Clickbait));
        assert_eq!(Rule::Keyword.apply("this is not clickbait"), Some(Label::NoClickbait));
        assert_eq!(Rule::Keyword.apply("verdict: no-clickbait"), Some(Label::NoClickbait));
        assert_eq!(Rule::Keyword.apply("a neutral headline"), None);
    }

    #[test]
    fn test_unknown_when_nothing_matches() {
        for text in ["", "I think this could go either way", "Hard to say.\nMaybe?"] {
            assert_eq!(parse_response(text), Prediction::Unknown, "{text:?}");
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "The headline teases.\nClassification: 1";
        assert_eq!(parse_response(text), parse_response(text));
        assert_eq!(parse_with_answer_fast_path(text), parse_with_answer_fast_path(text));
    }

    #[test]
    fn test_fast_path_uses_last_answer_marker() {
        assert_eq!(answer_fast_path("Answer: 0"), Some(Label::NoClickbait));
        assert_eq!(answer_fast_path("answer: 0 ... final answer: 1"), Some(Label::Clickbait));
        assert_eq!(answer_fast_path("answer: it depends"), None);
        assert_eq!(answer_fast_path("no marker 1"), None);
    }

    #[test]
    fn test_fast_path_window_is_five_chars() {
        // The digit sits beyond the window
        assert_eq!(answer_fast_path("answer: maybe 1"), None);
        assert_eq!(answer_fast_path("answer:    1"), Some(Label::Clickbait));
    }

    #[test]
    fn test_fast_path_window_counts_characters() {
        // Multi-byte characters take one slot each
        assert_eq!(answer_fast_path("answer: é 1"), Some(Label::Clickbait));
        assert_eq!(answer_fast_path("answer: 日本 0"), Some(Label::NoClickbait));
        assert_eq!(answer_fast_path("Answer: éééé 1"), None);
    }

    #[test]
    fn test_fast_path_precedes_cascade() {
        let text = "Label: 0. Answer: (1)";
        assert_eq!(parse_response(text), NOT_CLICKBAIT);
        assert_eq!(parse_with_answer_fast_path(text), CLICKBAIT);
    }

    #[test]
    fn test_inconclusive_fast_path_falls_through() {
        let text = "answer: see label 0 above, actually 1";
        assert_eq!(answer_fast_path(text), None);
        assert_eq!(parse_with_answer_fast_path(text), CLICKBAIT);
    }

    #[test]
    fn test_prediction_codes() {
        assert_eq!(CLICKBAIT.to_code(), 1);
        assert_eq!(NOT_CLICKBAIT.to_code(), 0);
        assert_eq!(Prediction::Unknown.to_code(), -1);
        assert_eq!(Prediction::from(None), Prediction::Unknown);
        assert!(Prediction::Unknown.label().is_none());
    }
}
