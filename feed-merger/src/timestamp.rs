//! Timestamp handling for feed entries and the files this crate persists.
//!
//! Feeds disagree about how to spell a date. Everything downstream works on a
//! single UTC instant, or on `None` when the source gave nothing usable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::FeedEntry;

/// Format of the first column of a ledger line.
pub const LEDGER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Published time if present, otherwise updated time, otherwise unknown.
pub fn normalize(entry: &FeedEntry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

/// Instant recorded in the ledger for an accepted entry. Unknown dates are
/// stamped with `now` so age based pruning still applies to them.
pub fn first_seen_at(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    published_at.unwrap_or(now)
}

/// Best-effort parse of a feed or ledger date string. Never fails, returns
/// `None` for anything it does not understand.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // RFC 822 feeds in the wild often spell the zone as a name chrono rejects.
    let without_zone = raw
        .rsplit_once(' ')
        .filter(|(_, zone)| zone.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|(head, _)| head)
        .unwrap_or(raw);

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_ledger_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(LEDGER_FORMAT).to_string()
}

/// `lastBuildDate` value, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_build_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Used for `pubDate` only when a source gave no raw date string.
pub fn format_pub_date(instant: DateTime<Utc>) -> String {
    instant.to_rfc2822()
}
