//! HTTP handlers for the sentiment API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::aggregate::{aggregate, KeywordSet, SentimentCounts};
use crate::classifier::{ClassificationResult, SentimentClassifier, Thresholds};
use crate::error::{AppResult, ErrorResponse, InputError, ModelError};
use crate::keywords::KeywordExtractor;

pub struct AppState {
    pub classifier: SentimentClassifier,
    pub extractor: Arc<dyn KeywordExtractor>,
    pub thresholds: Thresholds,
    pub top_k: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TextItem {
    #[schema(value_type = String, example = "Average product, not bad but not great either.")]
    pub text: Value,
    /// Include scores and probabilities in the result.
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TextBatch {
    #[schema(value_type = Vec<String>, example = json!([
        "Amazing battery life and great design!",
        "It's okay, nothing special but does the job.",
        "Terrible product, broke after 2 days."
    ]))]
    pub texts: Vec<Value>,
    /// Max phrases per polarity; server default when omitted.
    pub top_k: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
    pub margin_threshold: Option<f64>,
    pub confidence_threshold: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub results: Vec<ClassificationResult>,
    pub sentiment_counts: SentimentCounts,
    pub pros_cons: KeywordSet,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[schema(example = "remote")]
    pub model: String,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accepts only string entries; the first null or non-string rejects the batch.
pub fn validate_texts(values: Vec<Value>) -> Result<Vec<String>, InputError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(text) => Ok(text),
            Value::Null => Err(InputError::NullEntry { index }),
            other => Err(InputError::NotAString {
                index,
                found: json_type_name(&other),
            }),
        })
        .collect()
}

impl AppState {
    fn thresholds_for(&self, batch: &TextBatch) -> Result<Thresholds, InputError> {
        let thresholds = Thresholds {
            margin: batch.margin_threshold.unwrap_or(self.thresholds.margin),
            confidence: batch.confidence_threshold.unwrap_or(self.thresholds.confidence),
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = RootResponse)),
    tag = "sentiment"
)]
pub async fn read_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Sentiment Analysis API is running!".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "sentiment"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.classifier.model_name().to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body = TextItem,
    responses(
        (status = 200, description = "Label for one review", body = ClassificationResult),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 503, description = "Model unavailable", body = ErrorResponse)
    ),
    tag = "sentiment"
)]
pub async fn predict_single(
    State(state): State<Arc<AppState>>,
    Json(item): Json<TextItem>,
) -> AppResult<Json<ClassificationResult>> {
    let texts = validate_texts(vec![item.text])?;
    let mut results = state
        .classifier
        .classify_batch(&texts, &state.thresholds, item.verbose)
        .await?;
    let result = results
        .pop()
        .ok_or(ModelError::LengthMismatch { expected: 1, got: 0 })?;
    tracing::info!(label = %result.predicted_label, "single prediction");
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/predict_batch",
    request_body = TextBatch,
    responses(
        (status = 200, description = "Labels, counts and pros/cons for a batch", body = BatchResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 503, description = "Model unavailable", body = ErrorResponse)
    ),
    tag = "sentiment"
)]
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<TextBatch>,
) -> AppResult<Json<BatchResponse>> {
    let span = tracing::info_span!(
        "predict_batch",
        request_id = %Uuid::new_v4(),
        batch = batch.texts.len()
    );
    run_batch(&state, batch).instrument(span).await.map(Json)
}

async fn run_batch(state: &AppState, batch: TextBatch) -> AppResult<BatchResponse> {
    let thresholds = state.thresholds_for(&batch)?;
    let top_k = batch.top_k.unwrap_or(state.top_k);
    if top_k == 0 {
        return Err(InputError::ZeroTopK.into());
    }
    let texts = validate_texts(batch.texts)?;

    let results = state
        .classifier
        .classify_batch(&texts, &thresholds, batch.verbose)
        .await?;
    let summary = aggregate(&results, top_k, state.extractor.as_ref());

    tracing::info!(
        positive = summary.counts.positive,
        negative = summary.counts.negative,
        neutral = summary.counts.neutral,
        "batch classified"
    );

    Ok(BatchResponse {
        results,
        sentiment_counts: summary.counts,
        pros_cons: summary.keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{BrokenModel, FixedModel};
    use crate::error::AppError;
    use crate::keywords::RakeExtractor;
    use crate::model::{LexiconModel, Sentiment, SentimentModel};
    use crate::stopwords::StopwordChain;
    use serde_json::json;

    fn state_with(model: Arc<dyn SentimentModel>) -> Arc<AppState> {
        Arc::new(AppState {
            classifier: SentimentClassifier::new(model),
            extractor: Arc::new(RakeExtractor::new(&StopwordChain::standard(None)).unwrap()),
            thresholds: Thresholds::default(),
            top_k: 5,
        })
    }

    fn batch(body: Value) -> Json<TextBatch> {
        Json(serde_json::from_value(body).unwrap())
    }

    fn reviews() -> Value {
        json!([
            "Amazing battery life and great design!",
            "It's okay, nothing special but does the job.",
            "Terrible product, broke after 2 days."
        ])
    }

    #[tokio::test]
    async fn test_root_banner() {
        let Json(body) = read_root().await;
        assert_eq!(body.message, "Sentiment Analysis API is running!");
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let Json(body) = health(State(state_with(Arc::new(LexiconModel::new())))).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.model, "lexicon");
    }

    #[tokio::test]
    async fn test_batch_end_to_end() {
        let state = state_with(Arc::new(FixedModel::reviews()));
        let Json(response) = predict_batch(State(state), batch(json!({ "texts": reviews() })))
            .await
            .unwrap();

        let labels: Vec<Sentiment> = response.results.iter().map(|r| r.predicted_label).collect();
        assert_eq!(labels, vec![Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative]);
        assert_eq!(
            response.sentiment_counts,
            SentimentCounts { positive: 1, negative: 1, neutral: 1, total: 3 }
        );
        assert_eq!(response.pros_cons.pros, vec!["amazing battery life", "great design"]);
        assert_eq!(response.pros_cons.cons, vec!["terrible product", "2 days"]);
    }

    #[tokio::test]
    async fn test_batch_end_to_end_with_lexicon_model() {
        let state = state_with(Arc::new(LexiconModel::new()));
        let Json(response) = predict_batch(State(state), batch(json!({ "texts": reviews() })))
            .await
            .unwrap();
        let labels: Vec<Sentiment> = response.results.iter().map(|r| r.predicted_label).collect();
        assert_eq!(labels, vec![Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative]);
    }

    #[tokio::test]
    async fn test_batch_response_shape() {
        let state = state_with(Arc::new(FixedModel::reviews()));
        let Json(response) = predict_batch(State(state), batch(json!({ "texts": reviews(), "top_k": 1 })))
            .await
            .unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["results"][0]["predicted_label"], "positive");
        assert!(value["results"][0].get("details").is_none());
        assert_eq!(value["sentiment_counts"]["total"], 3);
        assert_eq!(value["pros_cons"]["pros"], json!(["amazing battery life"]));
    }

    #[tokio::test]
    async fn test_null_entry_is_input_error() {
        let state = state_with(Arc::new(FixedModel::reviews()));
        let err = predict_batch(State(state), batch(json!({ "texts": ["fine", null] })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(InputError::NullEntry { index: 1 })));
    }

    #[tokio::test]
    async fn test_non_string_entry_and_bad_parameters() {
        let state = state_with(Arc::new(FixedModel::reviews()));

        let err = predict_batch(State(state.clone()), batch(json!({ "texts": [42] })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Input(InputError::NotAString { index: 0, found: "number" })
        ));

        let err = predict_batch(State(state.clone()), batch(json!({ "texts": ["a"], "top_k": 0 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(InputError::ZeroTopK)));

        let err = predict_batch(
            State(state),
            batch(json!({ "texts": ["a"], "confidence_threshold": 2.0 })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Input(InputError::ThresholdOutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let state = state_with(Arc::new(FixedModel::reviews()));
        let Json(response) = predict_batch(State(state), batch(json!({ "texts": [] })))
            .await
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.sentiment_counts, SentimentCounts::default());
        assert_eq!(response.pros_cons, KeywordSet::default());
    }

    #[tokio::test]
    async fn test_request_thresholds_override_defaults() {
        let state = state_with(Arc::new(FixedModel::new(vec![("Solid build", [0.1, 0.2, 0.7])])));
        let Json(response) = predict_batch(
            State(state),
            batch(json!({ "texts": ["Solid build"], "confidence_threshold": 0.6, "verbose": true })),
        )
        .await
        .unwrap();
        assert_eq!(response.results[0].predicted_label, Sentiment::Positive);
        let details = response.results[0].details.as_ref().unwrap();
        assert_eq!(details.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_single_prediction() {
        let state = state_with(Arc::new(FixedModel::reviews()));
        let item: TextItem = serde_json::from_value(json!({
            "text": "It's okay, nothing special but does the job.",
            "verbose": true
        }))
        .unwrap();
        let Json(result) = predict_single(State(state), Json(item)).await.unwrap();
        assert_eq!(result.predicted_label, Sentiment::Neutral);
        let details = result.details.unwrap();
        assert_eq!(details.model_label, "positive");
        assert_eq!(details.confidence, 0.15);
    }

    #[tokio::test]
    async fn test_single_prediction_model_failure() {
        let state = state_with(Arc::new(BrokenModel));
        let item: TextItem = serde_json::from_value(json!({ "text": "Great phone" })).unwrap();
        let err = predict_single(State(state), Json(item)).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(ModelError::LengthMismatch { expected: 1, got: 2 })));
    }

    #[test]
    fn test_validate_texts_keeps_empty_strings() {
        let texts = validate_texts(vec![json!(""), json!("ok")]).unwrap();
        assert_eq!(texts, vec!["".to_string(), "ok".to_string()]);
    }
}
