//! Batch aggregation: sentiment counts plus pros/cons phrases.

use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use utoipa::ToSchema;

use crate::classifier::ClassificationResult;
use crate::keywords::KeywordExtractor;
use crate::model::Sentiment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct KeywordSet {
    /// Phrases drawn from positive reviews only.
    #[schema(example = json!(["amazing battery life", "great design"]))]
    pub pros: Vec<String>,
    /// Phrases drawn from negative reviews only.
    #[schema(example = json!(["terrible product"]))]
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub counts: SentimentCounts,
    pub keywords: KeywordSet,
}

/// Texts split by final label, original order kept within each group.
#[derive(Debug, Default)]
struct Partition {
    positive: Vec<String>,
    negative: Vec<String>,
    neutral: Vec<String>,
}

fn partition(results: &[ClassificationResult]) -> Partition {
    let mut groups = Partition::default();
    for result in results {
        let bucket = match result.predicted_label {
            Sentiment::Positive => &mut groups.positive,
            Sentiment::Negative => &mut groups.negative,
            Sentiment::Neutral => &mut groups.neutral,
        };
        bucket.push(result.text.clone());
    }
    groups
}

/// Runs the extractor on one polarity group. Errors and panics both degrade
/// to an empty list.
fn extract_group(extractor: &dyn KeywordExtractor, texts: &[String], top_k: usize, polarity: Sentiment) -> Vec<String> {
    if texts.is_empty() {
        return Vec::new();
    }
    match catch_unwind(AssertUnwindSafe(|| extractor.extract(texts, top_k))) {
        Ok(Ok(mut phrases)) => {
            phrases.truncate(top_k);
            phrases
        }
        Ok(Err(e)) => {
            tracing::warn!(%polarity, documents = texts.len(), error = %e, "keyword extraction failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(%polarity, documents = texts.len(), "keyword extractor panicked");
            Vec::new()
        }
    }
}

/// Counts labels and extracts pros from positive texts and cons from negative texts.
/// Neutral texts are counted but never sent to the extractor.
pub fn aggregate(results: &[ClassificationResult], top_k: usize, extractor: &dyn KeywordExtractor) -> Aggregate {
    let groups = partition(results);

    let counts = SentimentCounts {
        positive: groups.positive.len(),
        negative: groups.negative.len(),
        neutral: groups.neutral.len(),
        total: results.len(),
    };

    let keywords = KeywordSet {
        pros: extract_group(extractor, &groups.positive, top_k, Sentiment::Positive),
        cons: extract_group(extractor, &groups.negative, top_k, Sentiment::Negative),
    };

    tracing::debug!(?counts, pros = keywords.pros.len(), cons = keywords.cons.len(), "batch aggregated");

    Aggregate { counts, keywords }
}
