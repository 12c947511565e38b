//! Batch sentiment classification with the neutral-override heuristic.
//!
//! The model picks a top class; the classifier then decides whether that
//! call is trustworthy. Low confidence, a thin margin over the runner-up, or
//! hedging vocabulary in the text ("okay", "nothing special", ...) all turn
//! the prediction into "neutral".

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{InputError, ModelError};
use crate::model::{ClassProbabilities, Sentiment, SentimentModel};

/// Phrases that mark a review as lukewarm no matter what the model says.
pub static NEUTRAL_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec!["okay", "fine", "average", "not bad", "nothing special", "decent", "so-so"]
});

/// Decision thresholds for the neutral override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum gap between the top two probabilities.
    pub margin: f64,
    /// Minimum probability of the top class.
    pub confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            margin: 0.45,
            confidence: 0.75,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), InputError> {
        for (name, value) in [("margin_threshold", self.margin), ("confidence_threshold", self.confidence)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(InputError::ThresholdOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Scores behind a prediction. Only returned on verbose requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionDetails {
    /// The model's own top class before any override.
    #[schema(example = "positive")]
    pub model_label: String,
    pub confidence: f64,
    pub top_prob: f64,
    pub second_prob: f64,
    pub margin: f64,
    pub entropy: f64,
    pub probs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResult {
    #[schema(example = "Amazing battery life and great design!")]
    pub text: String,
    pub predicted_label: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<PredictionDetails>,
}

pub fn contains_neutral_keyword(text: &str) -> bool {
    let text_lower = text.to_lowercase();
    NEUTRAL_KEYWORDS.iter().any(|k| text_lower.contains(k))
}

/// Applies the neutral override to one model decision.
///
/// The keyword check also runs when both thresholds pass, so hedging words
/// force "neutral" even on a confident prediction.
pub fn adjust_neutral(text: &str, top_class: Sentiment, top_prob: f64, margin: f64, thresholds: &Thresholds) -> Sentiment {
    if top_prob < thresholds.confidence || margin < thresholds.margin {
        return Sentiment::Neutral;
    }
    if contains_neutral_keyword(text) {
        return Sentiment::Neutral;
    }
    top_class
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Confidence reported for the final label.
pub fn confidence_for(label: Sentiment, top_prob: f64, margin: f64) -> f64 {
    let raw = match label {
        Sentiment::Neutral if top_prob > 0.5 => 1.0 - top_prob,
        Sentiment::Neutral => margin,
        _ => top_prob,
    };
    round4(raw)
}

/// Full decision for one text, before deciding how much of it to expose.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: Sentiment,
    pub details: PredictionDetails,
}

pub fn predict_one(text: &str, probs: &ClassProbabilities, thresholds: &Thresholds) -> Result<Prediction, ModelError> {
    if probs.is_empty() {
        return Err(ModelError::EmptyDistribution);
    }
    if let Some((label, value)) = probs.0.iter().find(|(_, p)| !p.is_finite() || !(0.0..=1.0).contains(*p)) {
        return Err(ModelError::InvalidProbability {
            label: label.clone(),
            value: *value,
        });
    }
    let ranked = probs.ranked();
    let (top_label, top_prob) = ranked[0];
    let second_prob = ranked.get(1).map(|(_, p)| *p).unwrap_or(0.0);
    let margin = top_prob - second_prob;
    let entropy = probs.entropy();

    let top_class = Sentiment::from_model_label(top_label)?;
    let label = adjust_neutral(text, top_class, top_prob, margin, thresholds);

    if label != top_class {
        tracing::debug!(%top_class, top_prob, margin, entropy, "prediction overridden to neutral");
    } else {
        tracing::trace!(%label, top_prob, margin, entropy, "prediction kept");
    }

    Ok(Prediction {
        label,
        details: PredictionDetails {
            model_label: top_class.to_string(),
            confidence: confidence_for(label, top_prob, margin),
            top_prob: round4(top_prob),
            second_prob: round4(second_prob),
            margin: round4(margin),
            entropy: round4(entropy),
            probs: probs.0.clone(),
        },
    })
}

/// Wraps a model backend and turns its distributions into final labels.
#[derive(Clone)]
pub struct SentimentClassifier {
    model: Arc<dyn SentimentModel>,
}

impl SentimentClassifier {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Classifies a whole batch. Output order and length match `texts`.
    ///
    /// An empty batch returns immediately without touching the model. Any
    /// model failure fails the whole batch.
    pub async fn classify_batch(
        &self,
        texts: &[String],
        thresholds: &Thresholds,
        verbose: bool,
    ) -> Result<Vec<ClassificationResult>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let distributions = self.model.infer(texts).await?;
        if distributions.len() != texts.len() {
            return Err(ModelError::LengthMismatch {
                expected: texts.len(),
                got: distributions.len(),
            });
        }

        texts
            .iter()
            .zip(distributions.iter())
            .map(|(text, probs)| {
                predict_one(text, probs, thresholds).map(|prediction| ClassificationResult {
                    text: text.clone(),
                    predicted_label: prediction.label,
                    details: verbose.then_some(prediction.details),
                })
            })
            .collect()
    }
}
