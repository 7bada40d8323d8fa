use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::timestamp::first_seen_at;
use crate::types::{FeedEntry, LedgerRecord, LedgerStore};

/// Dedup key for a link: surrounding whitespace and one trailing slash removed.
pub fn normalize_link(link: &str) -> String {
    let trimmed = link.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Result of merging one run's entries. Nothing here has been persisted yet.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// New entries, newest first.
    pub entries: Vec<FeedEntry>,
    /// One record per entry in `entries`, same order.
    pub ledger_additions: Vec<LedgerRecord>,
    pub skipped_without_link: usize,
    pub already_seen: usize,
    pub duplicates: usize,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Combine entries from every source into the batch of genuinely new ones.
///
/// `entries` must be in arrival order (sources in configured order, entries in
/// document order). When two entries share a key, the later one's content wins
/// but it keeps the position where the key first appeared. Keys already in the
/// ledger are dropped. The rest is stably sorted newest first, entries without
/// a date last; equal dates keep arrival order.
pub fn merge_entries<L>(entries: Vec<FeedEntry>, ledger: &L, now: DateTime<Utc>) -> MergeOutcome
where
    L: LedgerStore + ?Sized,
{
    let mut outcome = MergeOutcome::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut keyed: Vec<(String, FeedEntry)> = Vec::new();

    for entry in entries {
        let key = normalize_link(&entry.link);
        if key.is_empty() {
            outcome.skipped_without_link += 1;
            continue;
        }
        if ledger.contains(&key) {
            debug!("Skipping already emitted entry: {}", key);
            outcome.already_seen += 1;
            continue;
        }
        match positions.get(&key) {
            Some(&index) => {
                debug!("Duplicate entry {} from {} replaces earlier copy", key, entry.source);
                outcome.duplicates += 1;
                keyed[index].1 = entry;
            }
            None => {
                positions.insert(key.clone(), keyed.len());
                keyed.push((key, entry));
            }
        }
    }

    // Vec::sort_by is stable, and None orders before Some, so reversing the
    // comparison puts unknown dates last.
    keyed.sort_by(|(_, a), (_, b)| b.published_at.cmp(&a.published_at));

    for (key, entry) in keyed {
        outcome.ledger_additions.push(LedgerRecord {
            normalized_link: key,
            first_seen_at: first_seen_at(entry.published_at, now),
        });
        outcome.entries.push(entry);
    }

    info!(
        "Merged {} new entries ({} already seen, {} duplicates, {} without link)",
        outcome.entries.len(),
        outcome.already_seen,
        outcome.duplicates,
        outcome.skipped_without_link
    );

    outcome
}
