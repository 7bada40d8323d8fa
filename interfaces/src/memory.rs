use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::defs::AggregateDocument;
use crate::defs::ChannelMetadata;
use crate::defs::DocumentMode;
use crate::defs::DocumentStore;
use crate::defs::LedgerRecord;
use crate::defs::LedgerStore;
use crate::defs::Summarizer;

/// Ledger kept entirely in memory. Useful for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    pub records: Vec<LedgerRecord>,
    keys: HashSet<String>,
}

impl MemoryLedger {
    pub fn with_records(records: Vec<LedgerRecord>) -> Self {
        let keys = records.iter().map(|r| r.normalized_link.clone()).collect();
        Self { records, keys }
    }
}

impl LedgerStore for MemoryLedger {
    fn load(&mut self) -> Result<HashSet<String>> {
        self.keys = self.records.iter().map(|r| r.normalized_link.clone()).collect();
        Ok(self.keys.clone())
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &LedgerRecord) -> Result<()> {
        self.keys.insert(record.normalized_link.clone());
        self.records.push(record.clone());
        Ok(())
    }

    fn prune(&mut self, max_age_days: u32, now: DateTime<Utc>) -> Result<usize> {
        let horizon = now - Duration::days(i64::from(max_age_days));
        let before = self.records.len();
        self.records.retain(|r| r.first_seen_at >= horizon);
        self.keys = self.records.iter().map(|r| r.normalized_link.clone()).collect();
        Ok(before - self.records.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    pub document: Option<AggregateDocument>,
    pub saves: usize,
}

impl DocumentStore for MemoryDocumentStore {
    fn open(&mut self, mode: DocumentMode, fresh: &ChannelMetadata) -> Result<AggregateDocument> {
        match (mode, &self.document) {
            (DocumentMode::AppendOrCreate, Some(existing)) => Ok(existing.clone()),
            _ => Ok(AggregateDocument::new(fresh.clone())),
        }
    }

    fn save(&mut self, document: &AggregateDocument) -> Result<()> {
        self.document = Some(document.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Returns the raw summary unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSummarizer;

impl Summarizer for PassthroughSummarizer {
    fn plain_text(&self, raw: &str) -> Option<String> {
        Some(raw.to_owned())
    }
}
