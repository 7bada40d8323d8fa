use crate::config::AggregatorConfig;
use crate::document::build_item;
use crate::fetcher::Fetcher;
use crate::merge::{merge_entries, MergeOutcome};
use crate::timestamp::format_build_date;
use crate::types::{AggregatorError, DocumentMode, DocumentStore, FeedEntry, LedgerStore, Result, RunSummary, Summarizer};
use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Drives one fetch, merge and persist pass over the configured sources.
///
/// The coordinator owns the ledger and the document store for as long as it
/// lives. Runs against the same files must not overlap.
pub struct RunCoordinator<L, D, S> {
    config: AggregatorConfig,
    fetcher: Fetcher,
    ledger: L,
    documents: D,
    summarizer: S,
}

impl<L, D, S> RunCoordinator<L, D, S>
where
    L: LedgerStore,
    D: DocumentStore,
    S: Summarizer,
{
    pub fn new(config: AggregatorConfig, ledger: L, documents: D, summarizer: S) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        Ok(Self::with_fetcher(config, fetcher, ledger, documents, summarizer))
    }

    pub fn with_fetcher(config: AggregatorConfig, fetcher: Fetcher, ledger: L, documents: D, summarizer: S) -> Self {
        Self {
            config,
            fetcher,
            ledger,
            documents,
            summarizer,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn into_parts(self) -> (L, D) {
        (self.ledger, self.documents)
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id);
        self.run_at(run_id, Utc::now()).instrument(span).await
    }

    async fn run_at(&mut self, run_id: Uuid, now: DateTime<Utc>) -> Result<RunSummary> {
        info!("Starting feed aggregation over {} sources", self.config.feeds.len());

        let pruned_records = self.prune(now)?;

        self.ledger.load().map_err(AggregatorError::Ledger)?;

        let outcomes = self.fetcher.fetch_all(&self.config.feeds).await;
        let sources_total = outcomes.len();
        let failed: Vec<&str> = outcomes.iter().filter(|o| o.is_failure()).map(|o| o.source()).collect();
        let sources_failed = failed.len();
        if sources_failed > 0 {
            warn!("{} of {} sources failed this run: {}", sources_failed, sources_total, failed.join(", "));
        }

        let entries: Vec<FeedEntry> = outcomes.into_iter().flat_map(|o| o.into_entries()).collect();
        let entries_fetched = entries.len();

        let merged = merge_entries(entries, &self.ledger, now);
        if merged.is_empty() {
            info!("No new entries this run");
        }
        self.record(&merged)?;
        let new_entries = self.publish(&merged, now)?;

        let summary = RunSummary {
            run_id,
            sources_total,
            sources_failed,
            entries_fetched,
            new_entries,
            pruned_records,
        };
        info!("Run finished: {} new entries from {} fetched", new_entries, entries_fetched);
        Ok(summary)
    }

    fn prune(&mut self, now: DateTime<Utc>) -> Result<usize> {
        match (self.config.mode, self.config.max_age_days) {
            (DocumentMode::AppendOrCreate, Some(days)) => self.ledger.prune(days, now).map_err(AggregatorError::Ledger),
            _ => Ok(0),
        }
    }

    /// Ledger first, one record at a time in merge order, so an interrupted
    /// run never re-emits what it already recorded.
    fn record(&mut self, merged: &MergeOutcome) -> Result<()> {
        for record in &merged.ledger_additions {
            self.ledger.append(record).map_err(AggregatorError::Ledger)?;
        }
        Ok(())
    }

    fn publish(&mut self, merged: &MergeOutcome, now: DateTime<Utc>) -> Result<usize> {
        let fresh = self.config.channel.to_metadata();
        let mut document = self
            .documents
            .open(self.config.mode, &fresh)
            .map_err(AggregatorError::Document)?;

        document.set_last_build_date(format_build_date(now));

        let limits = self.config.summary;
        let items = merged
            .entries
            .iter()
            .map(|entry| build_item(entry, &self.summarizer, limits));
        let added = document.append_items(items);

        self.documents.save(&document).map_err(AggregatorError::Document)?;
        info!("Added {} items to feed ({} total)", added, document.items.len());
        Ok(added)
    }
}
