//! Posts a sample batch to a running server and prints what comes back.
//!
//! Usage: `cargo run --bin review_client [URL]`
//! (default `http://127.0.0.1:8000/predict_batch`, or `REVIEW_API_URL`).

use anyhow::{Context, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
struct ReviewResult {
    text: String,
    predicted_label: String,
}

#[derive(Debug, Deserialize)]
struct Counts {
    positive: usize,
    negative: usize,
    neutral: usize,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ProsCons {
    pros: Vec<String>,
    cons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    results: Vec<ReviewResult>,
    sentiment_counts: Counts,
    pros_cons: ProsCons,
}

const SAMPLE_REVIEWS: [&str; 5] = [
    "Amazing battery life and great design!",
    "It's okay, nothing special but does the job.",
    "Terrible product, broke after 2 days.",
    "Love the colors and the feel of this product, very premium!",
    "Average product, not bad but not great either.",
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let url = env::args()
        .nth(1)
        .or_else(|| env::var("REVIEW_API_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8000/predict_batch".to_string());

    tracing::info!(%url, reviews = SAMPLE_REVIEWS.len(), "sending sample batch");

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "texts": SAMPLE_REVIEWS }))
        .send()
        .await
        .with_context(|| format!("could not reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("server answered {}: {}", status, body);
    }

    let data: ReviewResponse = response.json().await.context("unexpected response body")?;

    for r in &data.results {
        println!("{:>8}  {}", r.predicted_label, r.text);
    }
    let c = &data.sentiment_counts;
    println!(
        "\npositive {} / negative {} / neutral {} (total {})",
        c.positive, c.negative, c.neutral, c.total
    );
    println!("pros: {:?}", data.pros_cons.pros);
    println!("cons: {:?}", data.pros_cons.cons);

    Ok(())
}
