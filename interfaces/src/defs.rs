use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One syndication item as delivered by a source, normalised once at the
/// fetch boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub source: String,
    pub link: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub published_raw: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub id: Option<String>,
}

impl FeedEntry {
    pub fn new(source: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            link: link.into(),
            title: None,
            summary: None,
            published_raw: None,
            published: None,
            updated: None,
            published_at: None,
            id: None,
        }
    }

    /// The guid written to the aggregate document.
    pub fn guid(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.link)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub normalized_link: String,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub title: String,
    pub link: String,
    pub description: String,
    pub last_build_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub pub_date: Option<String>,
    pub guid: String,
    pub description: String,
}

/// The persisted output feed: channel metadata followed by items in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDocument {
    pub metadata: ChannelMetadata,
    pub items: Vec<FeedItem>,
}

impl AggregateDocument {
    pub fn new(metadata: ChannelMetadata) -> Self {
        Self {
            metadata,
            items: Vec::new(),
        }
    }

    pub fn set_last_build_date(&mut self, last_build_date: String) {
        self.metadata.last_build_date = Some(last_build_date);
    }

    /// New items always land after everything already in the document, as one block.
    pub fn append_items(&mut self, items: impl IntoIterator<Item = FeedItem>) -> usize {
        let before = self.items.len();
        self.items.extend(items);
        self.items.len() - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentMode {
    Create,
    #[default]
    #[serde(rename = "append", alias = "append_or_create")]
    AppendOrCreate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub sources_total: usize,
    pub sources_failed: usize,
    pub entries_fetched: usize,
    pub new_entries: usize,
    pub pruned_records: usize,
}

// Object style note:
// The stores below are owned by exactly one run at a time. Implementations
// do not need internal locking, and callers never share them across tasks.

/// Persisted set of dedup keys that were already emitted.
pub trait LedgerStore {
    /// Read the persisted records. A ledger that does not exist yet is empty.
    fn load(&mut self) -> Result<HashSet<String>>;
    fn contains(&self, key: &str) -> bool;
    /// Durably record one key. Called once per accepted entry, in merge order.
    fn append(&mut self, record: &LedgerRecord) -> Result<()>;
    /// Drop records first seen more than `max_age_days` before `now`.
    fn prune(&mut self, max_age_days: u32, now: DateTime<Utc>) -> Result<usize>;
}

pub trait DocumentStore {
    /// `fresh` is used whenever no existing document is loaded.
    fn open(&mut self, mode: DocumentMode, fresh: &ChannelMetadata) -> Result<AggregateDocument>;
    fn save(&mut self, document: &AggregateDocument) -> Result<()>;
}

/// Turns a raw HTML or text summary into plain text. `None` means the input
/// could not be used and the caller falls back to a placeholder.
pub trait Summarizer {
    fn plain_text(&self, raw: &str) -> Option<String>;
}
