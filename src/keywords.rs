//! Keyword phrase extraction with RAKE (Rapid Automatic Keyword Extraction).
//!
//! Candidate phrases are runs of words between stopwords and punctuation.
//! Each word scores `degree / frequency` over all candidates, and a phrase
//! scores the sum of its words. Multi-word phrases about the same aspect
//! ("battery life", "customer service") float to the top.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::error::KeywordError;
use crate::stopwords::StopwordChain;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]+").unwrap());
static DOUBLE_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\.\.\s*").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub trait KeywordExtractor: Send + Sync {
    /// Ranked phrases for a group of documents, at most `top_k`.
    fn extract(&self, texts: &[String], top_k: usize) -> Result<Vec<String>, KeywordError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f64,
}

pub struct RakeExtractor {
    stopwords: HashSet<String>,
    stopword_source: String,
    min_words: usize,
    max_words: usize,
}

impl RakeExtractor {
    pub fn new(chain: &StopwordChain) -> Result<Self, KeywordError> {
        let resolved = chain.resolve()?;
        Ok(Self::with_stopwords(resolved.words, resolved.source))
    }

    pub fn with_stopwords(stopwords: HashSet<String>, source: impl Into<String>) -> Self {
        Self {
            stopwords,
            stopword_source: source.into(),
            min_words: 2,
            max_words: 4,
        }
    }

    pub fn stopword_source(&self) -> &str {
        &self.stopword_source
    }

    fn is_delimiter(&self, token: &str) -> bool {
        let is_punctuation = !token.chars().any(|c| c.is_alphanumeric() || c == '_');
        is_punctuation || self.stopwords.contains(token)
    }

    /// Splits a document into candidate phrases, keeping repeats.
    fn candidates(&self, text: &str) -> Vec<Vec<String>> {
        let lowered = text.to_lowercase();
        let mut phrases = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for token in TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()) {
            if self.is_delimiter(token) {
                if !current.is_empty() {
                    phrases.push(std::mem::take(&mut current));
                }
            } else {
                current.push(token.to_string());
            }
        }
        if !current.is_empty() {
            phrases.push(current);
        }

        phrases
            .into_iter()
            .filter(|p| (self.min_words..=self.max_words).contains(&p.len()))
            .collect()
    }

    /// All candidates with scores, best first. Ties go to the
    /// lexicographically greater phrase.
    pub fn rank(&self, text: &str) -> Vec<ScoredPhrase> {
        let phrases = self.candidates(text);

        let mut frequency: HashMap<&str, f64> = HashMap::new();
        let mut degree: HashMap<&str, f64> = HashMap::new();
        for phrase in &phrases {
            for word in phrase {
                *frequency.entry(word.as_str()).or_default() += 1.0;
                *degree.entry(word.as_str()).or_default() += phrase.len() as f64;
            }
        }

        let mut ranked: Vec<ScoredPhrase> = phrases
            .iter()
            .map(|phrase| ScoredPhrase {
                phrase: phrase.join(" "),
                score: phrase.iter().map(|w| degree[w.as_str()] / frequency[w.as_str()]).sum(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.phrase.cmp(&a.phrase))
        });
        ranked
    }
}

impl KeywordExtractor for RakeExtractor {
    fn extract(&self, texts: &[String], top_k: usize) -> Result<Vec<String>, KeywordError> {
        let texts: Vec<&str> = texts.iter().map(|t| t.as_str()).filter(|t| !t.trim().is_empty()).collect();
        if texts.is_empty() {
            return Err(KeywordError::NoInput);
        }

        let combined = format!("{}.", texts.join(". "));
        let ranked = self.rank(&combined);
        tracing::debug!(documents = texts.len(), candidates = ranked.len(), "rake ranked phrases");
        if ranked.is_empty() {
            return Err(KeywordError::NoPhrases);
        }

        let mut keywords: Vec<String> = Vec::new();
        for candidate in ranked.iter().take(top_k.saturating_mul(3)) {
            let cleaned = DOUBLE_DOT_RE.replace_all(candidate.phrase.trim(), " ");
            let cleaned = WHITESPACE_RE.replace_all(&cleaned, " ").trim().to_string();

            let word_count = cleaned.split_whitespace().count();
            if (self.min_words..=self.max_words).contains(&word_count)
                && !cleaned.contains("..")
                && !keywords.contains(&cleaned)
            {
                keywords.push(cleaned);
            }
            if keywords.len() >= top_k {
                break;
            }
        }

        if keywords.is_empty() {
            return Err(KeywordError::NoPhrases);
        }
        Ok(keywords)
    }
}
