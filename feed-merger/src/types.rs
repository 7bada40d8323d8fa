use serde::{Deserialize, Serialize};
// Use the interfaces crate for core types
pub use interfaces::defs::{AggregateDocument, ChannelMetadata, DocumentMode, FeedEntry, FeedItem, LedgerRecord, RunSummary};
pub use interfaces::defs::{DocumentStore, LedgerStore, Summarizer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "feed-merger/0.1".to_string(),
            timeout_seconds: 10,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Bounds for item descriptions. A plain text longer than `check_len`
/// characters is cut to its first `slice_len` characters and marked with an
/// ellipsis. The two bounds are independent on purpose, see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLimits {
    pub check_len: usize,
    pub slice_len: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            check_len: 350,
            slice_len: 600,
        }
    }
}

/// What one source contributed to a run.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    Fetched {
        source: String,
        entries: Vec<FeedEntry>,
    },
    Failed {
        source: String,
        reason: String,
    },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            SourceOutcome::Fetched { source, .. } | SourceOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }

    pub fn into_entries(self) -> Vec<FeedEntry> {
        match self {
            SourceOutcome::Fetched { entries, .. } => entries,
            SourceOutcome::Failed { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Ledger error: {0:#}")]
    Ledger(anyhow::Error),

    #[error("Document error: {0:#}")]
    Document(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
