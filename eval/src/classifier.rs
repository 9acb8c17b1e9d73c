// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Few-shot headline classifier
//!
//! Wraps a [`ModelClient`] with a fixed six-example prompt and interprets
//! the reply with [`parse_with_answer_fast_path`].

use crate::client::{ClientError, GenerationRequest, ModelClient};
use crate::datasets::Label;
use crate::parser::{parse_with_answer_fast_path, Prediction};
use thiserror::Error;

pub const SYSTEM_PROMPT: &str = "You are an expert clickbait detection specialist.";
pub const MAX_OUTPUT_TOKENS: u32 = 50;
pub const TEMPERATURE: f32 = 0.0;

/// A curated headline shown to the model as a worked example
#[derive(Debug, Clone, Copy)]
pub struct FewShotExample {
    pub title: &'static str,
    pub label: Label,
    pub rationale: &'static str,
}

pub const FEW_SHOT_EXAMPLES: [FewShotExample; 6] = [
    FewShotExample {
        title: "Federal Reserve raises interest rates by 0.5%",
        label: Label::NoClickbait,
        rationale: "specific data, neutral",
    },
    FewShotExample {
        title: "You'll NEVER believe what this dog did!",
        label: Label::Clickbait,
        rationale: "emotional \"NEVER\", withholding info",
    },
    FewShotExample {
        title: "Apple reports Q3 earnings: Revenue up 8%",
        label: Label::NoClickbait,
        rationale: "factual business news",
    },
    FewShotExample {
        title: "This ONE trick doctors don't want you to know",
        label: Label::Clickbait,
        rationale: "\"ONE trick\", conspiracy",
    },
    FewShotExample {
        title: "Study: Mediterranean diet reduces heart disease 30%",
        label: Label::NoClickbait,
        rationale: "research findings",
    },
    FewShotExample {
        title: "What happens next will SHOCK you completely",
        label: Label::Clickbait,
        rationale: "emotional \"SHOCK\", vague",
    },
];

/// User prompt for one headline
pub fn build_prompt(title: &str) -> String {
    let mut prompt = String::from("Classify headlines as clickbait based on these examples:\n\n");

    for (i, example) in FEW_SHOT_EXAMPLES.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. \"{}\" → {} ({})\n",
            i + 1,
            example.title,
            example.label.to_binary(),
            example.rationale
        ));
    }

    prompt.push_str(&format!("\nNow classify: \"{title}\"\n\nAnswer: 0 or 1"));
    prompt
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model call failed: {0}")]
    Client(#[from] ClientError),
}

/// Something that labels a headline
pub trait Classifier {
    /// Label a headline; failures surface as [`Prediction::Unknown`]
    fn classify(&self, title: &str) -> Prediction;

    fn name(&self) -> &str;
}

/// Few-shot prompting over a model client
pub struct FewShotClassifier<C> {
    client: C,
}

impl<C: ModelClient> FewShotClassifier<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn request_for(&self, title: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_prompt(title),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    /// Classify, keeping the failure reason
    pub fn try_classify(&self, title: &str) -> Result<Prediction, ClassifyError> {
        let reply = self.client.generate(&self.request_for(title))?;
        tracing::debug!(model = self.client.model_name(), reply = %reply, "model reply");
        Ok(parse_with_answer_fast_path(&reply))
    }
}

impl<C: ModelClient> Classifier for FewShotClassifier<C> {
    fn classify(&self, title: &str) -> Prediction {
        match self.try_classify(title) {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::warn!(model = self.client.model_name(), error = %e, "Error in few-shot prompting");
                Prediction::Unknown
            }
        }
    }

    fn name(&self) -> &str {
        "few_shot"
    }
}
