//! Error types shared by the classifier, the keyword extractor and the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Malformed request input. Surfaced to the caller as-is, never retried.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("texts[{index}] is null")]
    NullEntry { index: usize },

    #[error("texts[{index}] must be a string, got {found}")]
    NotAString { index: usize, found: &'static str },

    #[error("top_k must be at least 1")]
    ZeroTopK,

    #[error("{name} must be a number in [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
}

/// The sentiment model could not be reached or returned something unusable.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference backend answered {0}")]
    Status(reqwest::StatusCode),

    #[error("model returned {got} distributions for {expected} texts")]
    LengthMismatch { expected: usize, got: usize },

    #[error("model returned an empty distribution")]
    EmptyDistribution,

    #[error("model returned probability {value} for '{label}', expected a number in [0, 1]")]
    InvalidProbability { label: String, value: f64 },

    #[error("undecodable inference response: {0}")]
    Decode(serde_json::Error),

    #[error("model returned unknown label '{0}'")]
    UnknownLabel(String),
}

/// Keyword extraction failures. The aggregator recovers from all of them.
#[derive(Debug, Error, PartialEq)]
pub enum KeywordError {
    #[error("no non-empty texts to extract from")]
    NoInput,

    #[error("no phrases found")]
    NoPhrases,

    #[error("stopword source '{source_name}' unavailable: {reason}")]
    Stopwords { source_name: String, reason: String },
}

/// Request-level error returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "input_error")]
    pub error: String,
    #[schema(example = "texts[1] is null")]
    pub detail: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Input(_) => "input_error",
            AppError::ModelUnavailable(_) => "model_unavailable",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::ModelUnavailable(e) = &self {
            tracing::error!(error = %e, "inference failed");
        }
        let body = ErrorResponse {
            error: self.kind().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
