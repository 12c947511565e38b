//! Environment-driven configuration (`.env` supported via dotenv).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::Thresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Inference sidecar endpoint. `None` selects the offline lexicon model.
    pub model_url: Option<String>,
    pub model_timeout: Duration,
    pub thresholds: Thresholds,
    pub top_k: usize,
    /// Primary stopword corpus, one word per line.
    pub stopwords_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            model_url: None,
            model_timeout: Duration::from_secs(30),
            thresholds: Thresholds::default(),
            top_k: 5,
            stopwords_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let thresholds = Thresholds {
            margin: parse_or(&lookup, "MARGIN_THRESHOLD", defaults.thresholds.margin),
            confidence: parse_or(&lookup, "CONFIDENCE_THRESHOLD", defaults.thresholds.confidence),
        };
        thresholds.validate()?;

        let top_k = parse_or(&lookup, "KEYWORD_TOP_K", defaults.top_k);
        if top_k == 0 {
            anyhow::bail!("KEYWORD_TOP_K must be at least 1");
        }

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_url: non_empty("SENTIMENT_MODEL_URL"),
            model_timeout: Duration::from_secs(parse_or(
                &lookup,
                "MODEL_TIMEOUT_SECS",
                defaults.model_timeout.as_secs(),
            )),
            thresholds,
            top_k,
            stopwords_path: non_empty("STOPWORDS_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, ?default, "unparseable config value, using default");
            default
        }),
        None => default,
    }
}
