use clap::{Parser, ValueEnum};
use feed_merger::report::{append_env_file, summary_json, summary_line};
use feed_merger::{AggregatorConfig, DocumentMode, FileDocumentStore, FileLedger, HtmlSummarizer, RunCoordinator};
use std::env;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Create,
    Append,
}

impl From<ModeArg> for DocumentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Create => DocumentMode::Create,
            ModeArg::Append => DocumentMode::AppendOrCreate,
        }
    }
}

/// Merge a set of RSS/Atom feeds into one deduplicated feed file.
#[derive(Debug, Parser)]
#[command(name = "feed-merger", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "feeds.toml")]
    config: PathBuf,

    /// Aggregated feed to write
    #[arg(long)]
    output: Option<PathBuf>,

    /// Ledger of already emitted links
    #[arg(long)]
    ledger: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Prune ledger records older than this many days (0 disables pruning)
    #[arg(long)]
    max_age_days: Option<u32>,

    /// Per-source fetch timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the full run summary as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut AggregatorConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(ledger) = &self.ledger {
            config.ledger_path = ledger.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(days) = self.max_age_days {
            config.max_age_days = (days > 0).then_some(days);
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_seconds = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("Starting feed aggregation");

    let mut config = AggregatorConfig::load(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    let ledger = FileLedger::new(config.ledger_path.clone());
    let documents = FileDocumentStore::new(config.output_path.clone());
    info!("Ledger {}, output {}", ledger.path().display(), documents.path().display());
    let mut coordinator = RunCoordinator::new(config, ledger, documents, HtmlSummarizer)?;

    let summary = coordinator.run().await.map_err(|e| {
        error!("Run aborted: {}", e);
        e
    })?;

    println!("\n[RESULT] {}", summary_line(&summary));
    if cli.json {
        println!("{}", summary_json(&summary)?);
    }

    if let Some(env_file) = env::var_os("GITHUB_ENV") {
        append_env_file(&PathBuf::from(env_file), &summary)?;
    }

    Ok(())
}
