pub mod types;
pub mod timestamp;
pub mod parser;
pub mod fetcher;
pub mod merge;
pub mod storage;
pub mod ledger;
pub mod summary;
pub mod document;
pub mod config;
pub mod aggregator;
pub mod report;

pub use types::*;
pub use aggregator::RunCoordinator;
pub use config::{AggregatorConfig, ChannelConfig};
pub use document::FileDocumentStore;
pub use fetcher::Fetcher;
pub use ledger::FileLedger;
pub use merge::{merge_entries, normalize_link, MergeOutcome};
pub use parser::FeedParser;
pub use summary::HtmlSummarizer;
