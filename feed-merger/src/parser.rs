use crate::timestamp::{format_pub_date, normalize, parse_timestamp};
use crate::types::{AggregatorError, FeedEntry, Result};
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

/// Source-native values that `feed-rs` normalises away while parsing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawItemFields {
    pub published: Option<String>,
    pub updated: Option<String>,
    pub id: Option<String>,
}

impl RawItemFields {
    /// Native date string for the item, published first.
    pub fn date(&self) -> Option<&str> {
        self.published.as_deref().or(self.updated.as_deref())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one fetched document into entries. Entries without a link are
    /// dropped here so nothing downstream has to check for them.
    pub fn parse_feed(&self, source: &str, content: &[u8]) -> Result<Vec<FeedEntry>> {
        debug!("Parsing feed content from {} ({} bytes)", source, content.len());

        // An empty generated id leaves entries without a source id unset, so
        // the guid falls back to the link instead of a synthetic hash.
        let feed = parser::Builder::new()
            .id_generator(|_links, _title, _uri| String::new())
            .build()
            .parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let raw_fields = scan_raw_item_fields(content);
        let raw_aligned = raw_fields.len() == feed.entries.len();
        if !raw_aligned && !raw_fields.is_empty() {
            debug!(
                "Raw field scan of {} found {} items, parser found {}; using parsed values",
                source,
                raw_fields.len(),
                feed.entries.len()
            );
        }

        let total = feed.entries.len();
        let mut entries = Vec::with_capacity(total);

        for (index, entry) in feed.entries.into_iter().enumerate() {
            let raw = if raw_aligned { raw_fields.get(index) } else { None };
            if let Some(parsed) = self.parse_entry(source, entry, raw) {
                entries.push(parsed);
            }
        }

        info!("Parsed {} with {} entries ({} without link)", source, entries.len(), total - entries.len());
        Ok(entries)
    }

    fn parse_entry(&self, source: &str, entry: feed_rs::model::Entry, raw: Option<&RawItemFields>) -> Option<FeedEntry> {
        let link = primary_link(&entry.links)?;

        let title = entry.title.map(|t| t.content);

        // Prefer the summary, fall back to full content
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        let id = match raw {
            Some(raw) => raw.id.clone(),
            None => Some(entry.id).filter(|id| !id.trim().is_empty()),
        };

        let raw_published = raw.and_then(|r| r.published.as_deref());
        let raw_updated = raw.and_then(|r| r.updated.as_deref());
        let published = entry.published.or_else(|| raw_published.and_then(parse_timestamp));
        let updated = entry.updated.or_else(|| raw_updated.and_then(parse_timestamp));

        let published_raw = raw
            .and_then(|r| r.date().map(str::to_owned))
            .or_else(|| published.or(updated).map(format_pub_date));

        let mut parsed = FeedEntry::new(source, link);
        parsed.title = title;
        parsed.summary = summary;
        parsed.id = id;
        parsed.published = published;
        parsed.updated = updated;
        parsed.published_raw = published_raw;
        parsed.published_at = normalize(&parsed);

        if parsed.published_at.is_none() {
            debug!("Entry {} from {} has no usable date", parsed.link, source);
        }

        Some(parsed)
    }
}

fn primary_link(links: &[feed_rs::model::Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Walk an RSS or Atom document and collect, per `item`/`entry` in document
/// order, the date and id strings exactly as the source wrote them. Returns an
/// empty list for anything that is not well-formed XML.
pub fn scan_raw_item_fields(content: &[u8]) -> Vec<RawItemFields> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<RawItemFields> = None;
    // Depth below the open item element; only direct children are read.
    let mut depth = 0usize;
    let mut field: Option<Vec<u8>> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if current.is_some() {
                    depth += 1;
                    if depth == 1 && is_tracked_field(&name) {
                        field = Some(name);
                        text.clear();
                    }
                } else if is_item_element(&name) {
                    current = Some(RawItemFields::default());
                    depth = 0;
                }
            }
            Ok(Event::Text(t)) if field.is_some() => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(_)) if current.is_some() => {
                if depth == 0 {
                    items.extend(current.take());
                } else {
                    if depth == 1 {
                        if let (Some(name), Some(fields)) = (field.take(), current.as_mut()) {
                            record_field(fields, &name, text.trim());
                        }
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Vec::new(),
            _ => {}
        }
        buf.clear();
    }

    items
}

fn is_item_element(name: &[u8]) -> bool {
    name == b"item" || name == b"entry"
}

fn is_tracked_field(name: &[u8]) -> bool {
    matches!(
        name,
        b"pubDate" | b"published" | b"date" | b"issued" | b"updated" | b"modified" | b"guid" | b"id"
    )
}

fn record_field(fields: &mut RawItemFields, name: &[u8], value: &str) {
    if value.is_empty() {
        return;
    }
    let slot = match name {
        b"pubDate" | b"published" | b"date" | b"issued" => &mut fields.published,
        b"updated" | b"modified" => &mut fields.updated,
        b"guid" | b"id" => &mut fields.id,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}
