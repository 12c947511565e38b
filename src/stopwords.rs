//! Stopword providers for keyword extraction.
//!
//! Sources are tried in priority order and the first one that loads wins:
//! an on-disk corpus file, then the built-in English list, then a minimal
//! hardcoded list that cannot fail.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::error::KeywordError;

/// English stopword corpus (NLTK `stopwords/english`).
static ENGLISH_STOPWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
        "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
        "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
        "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
        "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
        "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as",
        "until", "while", "of", "at", "by", "for", "with", "about", "against", "between",
        "into", "through", "during", "before", "after", "above", "below", "to", "from",
        "up", "down", "in", "out", "on", "off", "over", "under", "again", "further",
        "then", "once", "here", "there", "when", "where", "why", "how", "all", "any",
        "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
        "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
        "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
        "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
        "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't",
        "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't",
        "won", "won't", "wouldn", "wouldn't",
    ]
});

static MINIMAL_STOPWORDS: [&str; 18] = [
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "a", "an",
];

pub trait StopwordSource: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> Result<HashSet<String>, KeywordError>;
}

/// Newline-separated corpus file. Blank lines and `#` comments are skipped.
pub struct FileStopwords {
    path: PathBuf,
}

impl FileStopwords {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StopwordSource for FileStopwords {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<HashSet<String>, KeywordError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| KeywordError::Stopwords {
            source_name: format!("file:{}", self.path.display()),
            reason: e.to_string(),
        })?;

        let words: HashSet<String> = raw
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| l.to_lowercase())
            .collect();

        if words.is_empty() {
            return Err(KeywordError::Stopwords {
                source_name: format!("file:{}", self.path.display()),
                reason: "corpus is empty".to_string(),
            });
        }
        Ok(words)
    }
}

pub struct EmbeddedStopwords;

impl StopwordSource for EmbeddedStopwords {
    fn name(&self) -> &str {
        "english"
    }

    fn load(&self) -> Result<HashSet<String>, KeywordError> {
        Ok(ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect())
    }
}

pub struct MinimalStopwords;

impl StopwordSource for MinimalStopwords {
    fn name(&self) -> &str {
        "minimal"
    }

    fn load(&self) -> Result<HashSet<String>, KeywordError> {
        Ok(MINIMAL_STOPWORDS.iter().map(|w| w.to_string()).collect())
    }
}

/// Resolved stopword list and the source it came from.
#[derive(Debug, Clone)]
pub struct Stopwords {
    pub source: String,
    pub words: HashSet<String>,
}

pub struct StopwordChain {
    sources: Vec<Box<dyn StopwordSource>>,
}

impl StopwordChain {
    pub fn new(sources: Vec<Box<dyn StopwordSource>>) -> Self {
        Self { sources }
    }

    /// Corpus file (if configured), then the built-in English list, then the minimal list.
    pub fn standard(corpus_path: Option<PathBuf>) -> Self {
        let mut sources: Vec<Box<dyn StopwordSource>> = Vec::new();
        if let Some(path) = corpus_path {
            sources.push(Box::new(FileStopwords::new(path)));
        }
        sources.push(Box::new(EmbeddedStopwords));
        sources.push(Box::new(MinimalStopwords));
        Self::new(sources)
    }

    pub fn resolve(&self) -> Result<Stopwords, KeywordError> {
        let mut last_error = KeywordError::Stopwords {
            source_name: "chain".to_string(),
            reason: "no stopword sources configured".to_string(),
        };

        for source in &self.sources {
            match source.load() {
                Ok(words) => {
                    tracing::info!(source = source.name(), count = words.len(), "stopwords loaded");
                    return Ok(Stopwords {
                        source: source.name().to_string(),
                        words,
                    });
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "stopword source failed, trying next");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    impl StopwordSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn load(&self) -> Result<HashSet<String>, KeywordError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(HashSet::from(["zzz".to_string()]))
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_english() {
        let chain = StopwordChain::standard(Some(PathBuf::from("/nonexistent/stopwords.txt")));
        let resolved = chain.resolve().unwrap();
        assert_eq!(resolved.source, "english");
        assert!(resolved.words.contains("because"));
    }

    #[test]
    fn test_file_source_wins_when_readable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# product noise words").unwrap();
        writeln!(file, "Product").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "item").unwrap();

        let chain = StopwordChain::standard(Some(file.path().to_path_buf()));
        let resolved = chain.resolve().unwrap();
        assert_eq!(resolved.source, "file");
        assert_eq!(resolved.words.len(), 2);
        assert!(resolved.words.contains("product"));
    }

    #[test]
    fn test_empty_file_is_a_failure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FileStopwords::new(file.path()).load().unwrap_err();
        assert!(matches!(err, KeywordError::Stopwords { .. }));
    }

    #[test]
    fn test_first_success_short_circuits() {
        let loads = Arc::new(AtomicUsize::new(0));
        let chain = StopwordChain::new(vec![
            Box::new(MinimalStopwords),
            Box::new(CountingSource { loads: loads.clone() }),
        ]);
        let resolved = chain.resolve().unwrap();
        assert_eq!(resolved.source, "minimal");
        assert_eq!(resolved.words.len(), 18);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_chain_errors() {
        assert!(StopwordChain::new(Vec::new()).resolve().is_err());
    }
}
