use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::merge::normalize_link;
use crate::storage::write_atomically;
use crate::timestamp::{format_ledger_timestamp, parse_timestamp};
use crate::types::{LedgerRecord, LedgerStore};

/// One parsed ledger line. The timestamp is optional because lines written by
/// other tools may carry a first column this crate cannot read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLine {
    pub text: String,
    pub first_seen_at: Option<DateTime<Utc>>,
    pub normalized_link: String,
}

/// Parse `<timestamp> <link>`. Lines with fewer than two tokens yield `None`.
pub fn parse_ledger_line(line: &str) -> Option<LedgerLine> {
    let mut tokens = line.split_whitespace();
    let stamp = tokens.next()?;
    let link = tokens.next()?;
    Some(LedgerLine {
        text: line.trim().to_string(),
        first_seen_at: parse_timestamp(stamp),
        normalized_link: normalize_link(link),
    })
}

pub fn format_ledger_line(record: &LedgerRecord) -> String {
    format!("{} {}\n", format_ledger_timestamp(record.first_seen_at), record.normalized_link)
}

/// Line-oriented ledger file, appended to one record at a time.
pub struct FileLedger {
    path: PathBuf,
    keys: HashSet<String>,
    writer: Option<File>,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keys: HashSet::new(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable line in file order. A missing file reads as empty.
    fn read_lines(&self) -> Result<Vec<LedgerLine>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No ledger at {}, starting fresh", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading ledger {}", self.path.display()));
            }
        };

        let mut lines = Vec::new();
        for (number, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let Ok(text) = std::str::from_utf8(raw) else {
                warn!("Skipping unreadable ledger line {} in {}", number + 1, self.path.display());
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            match parse_ledger_line(text) {
                Some(line) => lines.push(line),
                None => warn!("Skipping malformed ledger line {}: {:?}", number + 1, text.trim()),
            }
        }
        Ok(lines)
    }

    fn writer(&mut self) -> Result<&mut File> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating ledger directory {}", parent.display()))?;
            }
            let mut file = OpenOptions::new()
                .read(true)
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("opening ledger {} for append", self.path.display()))?;
            terminate_last_line(&mut file)
                .with_context(|| format!("repairing last line of ledger {}", self.path.display()))?;
            self.writer = Some(file);
        }
        self.writer
            .as_mut()
            .context("ledger writer unavailable")
    }
}

/// A partial last line, left by an interrupted write or a hand edit, is closed
/// off so the next record starts on a line of its own.
fn terminate_last_line(file: &mut File) -> io::Result<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        warn!("Ledger does not end with a newline, closing the partial line");
        file.write_all(b"\n")?;
    }
    Ok(())
}

impl LedgerStore for FileLedger {
    fn load(&mut self) -> Result<HashSet<String>> {
        let lines = self.read_lines()?;
        self.keys = lines.into_iter().map(|l| l.normalized_link).collect();
        info!("Loaded {} previously processed links from {}", self.keys.len(), self.path.display());
        Ok(self.keys.clone())
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &LedgerRecord) -> Result<()> {
        let line = format_ledger_line(record);
        let path = self.path.display().to_string();
        let file = self.writer()?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .with_context(|| format!("appending to ledger {}", path))?;
        self.keys.insert(record.normalized_link.clone());
        debug!("Recorded {} in ledger", record.normalized_link);
        Ok(())
    }

    fn prune(&mut self, max_age_days: u32, now: DateTime<Utc>) -> Result<usize> {
        let lines = self.read_lines()?;
        if lines.is_empty() {
            return Ok(0);
        }

        let horizon = now - Duration::days(i64::from(max_age_days));
        let total = lines.len();
        // Lines whose age cannot be judged are kept.
        let kept: Vec<LedgerLine> = lines
            .into_iter()
            .filter(|l| l.first_seen_at.map_or(true, |seen| seen >= horizon))
            .collect();
        let removed = total - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let mut contents = String::new();
        for line in &kept {
            contents.push_str(&line.text);
            contents.push('\n');
        }

        // The append handle points at the old inode once the file is replaced.
        self.writer = None;
        write_atomically(&self.path, contents.as_bytes())
            .with_context(|| format!("rewriting pruned ledger {}", self.path.display()))?;

        self.keys = kept.into_iter().map(|l| l.normalized_link).collect();
        info!("Pruned {} ledger records older than {} days", removed, max_age_days);
        Ok(removed)
    }
}
