//! Sentiment model backends.
//!
//! The classifier only sees the [`SentimentModel`] trait. Two backends exist:
//! - [`RemoteModel`] calls the inference sidecar that serves the pretrained
//!   transformer checkpoint over HTTP.
//! - [`LexiconModel`] is an offline word-list model. It needs no artifacts,
//!   so it is what runs when no sidecar is configured.

use axum::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::ModelError;

/// Final sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Maps a model's label name onto a sentiment.
    ///
    /// Accepts plain names in any case and the `LABEL_n` ids of the
    /// three-class Twitter-RoBERTa checkpoint (0 = negative, 1 = neutral,
    /// 2 = positive).
    pub fn from_model_label(label: &str) -> Result<Self, ModelError> {
        match label.trim().to_lowercase().as_str() {
            "positive" | "label_2" => Ok(Sentiment::Positive),
            "negative" | "label_0" => Ok(Sentiment::Negative),
            "neutral" | "label_1" => Ok(Sentiment::Neutral),
            _ => Err(ModelError::UnknownLabel(label.to_string())),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-text probability distribution, keyed by the model's label names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassProbabilities(pub BTreeMap<String, f64>);

impl ClassProbabilities {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(label, p)| (label.into(), p)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels and probabilities sorted by probability, highest first.
    /// Equal probabilities keep label-name order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.0.iter().map(|(l, p)| (l.as_str(), *p)).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Shannon entropy in nats, with a small epsilon so zero probabilities don't blow up.
    pub fn entropy(&self) -> f64 {
        -self.0.values().map(|p| p * (p + 1e-10).ln()).sum::<f64>()
    }
}

#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Short backend name for logs and `/health`.
    fn name(&self) -> &str;

    /// One distribution per input text, same order. All-or-nothing.
    async fn infer(&self, texts: &[String]) -> Result<Vec<ClassProbabilities>, ModelError>;

    /// Startup check. A failure here means no inference is possible.
    async fn warm_up(&self) -> Result<(), ModelError> {
        self.infer(&["warm-up".to_string()]).await.map(|_| ())
    }
}

// ============================================================================
// Remote inference sidecar
// ============================================================================

#[derive(Debug, Serialize)]
struct InferRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    probabilities: Vec<ClassProbabilities>,
}

/// Client for the transformer sidecar.
///
/// Wire format: `POST {url}` with `{"texts": [...]}`, answered by
/// `{"probabilities": [{"negative": 0.01, "neutral": 0.04, "positive": 0.95}, ...]}`.
pub struct RemoteModel {
    client: reqwest::Client,
    url: String,
}

impl RemoteModel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SentimentModel for RemoteModel {
    fn name(&self) -> &str {
        "remote"
    }

    async fn infer(&self, texts: &[String]) -> Result<Vec<ClassProbabilities>, ModelError> {
        let response = self
            .client
            .post(&self.url)
            .json(&InferRequest { texts })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let body: InferResponse = serde_json::from_slice(&bytes).map_err(ModelError::Decode)?;
        if body.probabilities.len() != texts.len() {
            return Err(ModelError::LengthMismatch {
                expected: texts.len(),
                got: body.probabilities.len(),
            });
        }
        Ok(body.probabilities)
    }
}

// ============================================================================
// Offline lexicon model
// ============================================================================

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "good", "great", "excellent", "amazing", "wonderful", "fantastic", "superb",
        "outstanding", "brilliant", "love", "loved", "loving", "best", "better",
        "happy", "beautiful", "perfect", "awesome", "incredible", "delightful",
        "pleasant", "satisfied", "recommend", "recommended", "impressive", "exceptional",
        "helpful", "reliable", "premium", "durable", "fast", "crisp", "clear", "bright",
        "sharp", "vibrant", "comfortable", "sturdy", "worth",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse", "hate",
        "hated", "dislike", "disappointing", "disappointed", "failure", "failed",
        "fail", "unhappy", "angry", "annoyed", "frustrated", "frustrating", "problem",
        "problems", "issue", "issues", "broke", "broken", "crash", "defective", "useless",
        "waste", "scam", "fake", "unreliable", "slow", "expensive", "overpriced",
        "worthless", "garbage", "trash", "rude", "unresponsive", "delayed", "drains",
        "scratches", "uncomfortable", "cheap", "flimsy",
    ]
    .into_iter()
    .collect()
});

/// Word-list model that turns lexicon hits into a three-way distribution.
///
/// Logits are `[negative_hits * w, neutral_prior, positive_hits * w]`, fed
/// through a softmax. A text with no hits lands on "neutral".
pub struct LexiconModel {
    hit_weight: f64,
    neutral_prior: f64,
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self {
            hit_weight: 2.0,
            neutral_prior: 1.0,
        }
    }
}

impl LexiconModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(&self, text: &str) -> ClassProbabilities {
        let lowercase_text = text.to_lowercase();
        let words: Vec<&str> = lowercase_text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| w.len() > 2)
            .collect();

        let positive_count = words.iter().filter(|w| POSITIVE_WORDS.contains(*w)).count();
        let negative_count = words.iter().filter(|w| NEGATIVE_WORDS.contains(*w)).count();

        let logits = [
            negative_count as f64 * self.hit_weight,
            self.neutral_prior,
            positive_count as f64 * self.hit_weight,
        ];
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        tracing::trace!(positive_count, negative_count, "lexicon hits");

        ClassProbabilities::from_pairs([
            ("negative", exps[0] / total),
            ("neutral", exps[1] / total),
            ("positive", exps[2] / total),
        ])
    }
}

#[async_trait]
impl SentimentModel for LexiconModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn infer(&self, texts: &[String]) -> Result<Vec<ClassProbabilities>, ModelError> {
        Ok(texts.iter().map(|t| self.score(t)).collect())
    }
}
