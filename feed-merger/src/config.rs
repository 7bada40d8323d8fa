use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::types::{AggregatorError, ChannelMetadata, DocumentMode, FetchConfig, Result, SummaryLimits};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "RSS Aggregator Feed".to_string(),
            link: "https://wpatrick.github.io/rss-aggregator/aggregated_feed.xml".to_string(),
            description: "An aggregated feed of Microsoft blogs".to_string(),
        }
    }
}

impl ChannelConfig {
    /// Metadata for a document created from scratch.
    pub fn to_metadata(&self) -> ChannelMetadata {
        ChannelMetadata {
            title: self.title.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
            last_build_date: None,
        }
    }
}

/// Everything one run needs. Built once by the caller and handed to the
/// coordinator; nothing reads configuration from globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub feeds: Vec<String>,
    pub output_path: PathBuf,
    pub ledger_path: PathBuf,
    pub mode: DocumentMode,
    /// Ledger records older than this are pruned at the start of an append run.
    pub max_age_days: Option<u32>,
    pub channel: ChannelConfig,
    pub fetch: FetchConfig,
    pub summary: SummaryLimits,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            output_path: PathBuf::from("aggregated_feed.xml"),
            ledger_path: PathBuf::from("processed_links.txt"),
            mode: DocumentMode::AppendOrCreate,
            max_age_days: None,
            channel: ChannelConfig::default(),
            fetch: FetchConfig::default(),
            summary: SummaryLimits::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AggregatorError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .map_err(|e| AggregatorError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            return Err(AggregatorError::Config("no feeds configured".to_string()));
        }
        for feed in &self.feeds {
            let url = Url::parse(feed.trim())?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(AggregatorError::Config(format!("unsupported feed scheme: {}", feed)));
            }
        }
        if self.fetch.timeout_seconds == 0 {
            return Err(AggregatorError::Config("fetch timeout must be positive".to_string()));
        }
        Ok(())
    }
}
