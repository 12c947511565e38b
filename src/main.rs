mod aggregate;
mod api;
mod classifier;
mod config;
mod error;
mod keywords;
mod model;
mod stopwords;

use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::classifier::SentimentClassifier;
use crate::config::Config;
use crate::keywords::RakeExtractor;
use crate::model::{LexiconModel, RemoteModel, SentimentModel};
use crate::stopwords::StopwordChain;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::read_root,
        api::health,
        api::predict_single,
        api::predict_batch
    ),
    components(
        schemas(
            api::TextItem,
            api::TextBatch,
            api::BatchResponse,
            api::RootResponse,
            api::HealthResponse,
            crate::classifier::ClassificationResult,
            crate::classifier::PredictionDetails,
            crate::model::Sentiment,
            crate::aggregate::SentimentCounts,
            crate::aggregate::KeywordSet,
            crate::error::ErrorResponse
        )
    ),
    tags(
        (name = "sentiment", description = "Review sentiment and pros/cons API")
    )
)]
struct ApiDoc;

fn build_model(config: &Config) -> anyhow::Result<Arc<dyn SentimentModel>> {
    match &config.model_url {
        Some(url) => {
            tracing::info!(%url, timeout = ?config.model_timeout, "using remote sentiment model");
            Ok(Arc::new(RemoteModel::new(url.clone(), config.model_timeout)?))
        }
        None => {
            tracing::warn!("SENTIMENT_MODEL_URL not set, falling back to the offline lexicon model");
            Ok(Arc::new(LexiconModel::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let model = build_model(&config)?;
    // No inference is possible without a model; refuse to start.
    if let Err(e) = model.warm_up().await {
        tracing::error!(model = model.name(), error = %e, "sentiment model failed to initialize");
        return Err(e.into());
    }

    let extractor = RakeExtractor::new(&StopwordChain::standard(config.stopwords_path.clone()))?;
    tracing::info!(stopwords = extractor.stopword_source(), top_k = config.top_k, "keyword extractor ready");

    let state = Arc::new(api::AppState {
        classifier: SentimentClassifier::new(model),
        extractor: Arc::new(extractor),
        thresholds: config.thresholds,
        top_k: config.top_k,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::read_root))
        .route("/health", get(api::health))
        .route("/predict", post(api::predict_single))
        .route("/predict_batch", post(api::predict_batch))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
