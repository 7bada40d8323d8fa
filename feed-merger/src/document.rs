use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::write_atomically;
use crate::summary::describe;
use crate::types::{AggregateDocument, ChannelMetadata, DocumentMode, DocumentStore, FeedEntry, FeedItem, SummaryLimits, Summarizer};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "rss")]
struct RssElement {
    #[serde(rename = "@version", default = "rss_version")]
    version: String,
    channel: ChannelElement,
}

fn rss_version() -> String {
    "2.0".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct ChannelElement {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "lastBuildDate", default, skip_serializing_if = "Option::is_none")]
    last_build_date: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<ItemElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemElement {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub_date: Option<String>,
    #[serde(default)]
    guid: GuidElement,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuidElement {
    #[serde(rename = "@isPermaLink", default, skip_serializing_if = "Option::is_none")]
    is_perma_link: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

impl From<&AggregateDocument> for RssElement {
    fn from(document: &AggregateDocument) -> Self {
        let metadata = &document.metadata;
        Self {
            version: rss_version(),
            channel: ChannelElement {
                title: metadata.title.clone(),
                link: metadata.link.clone(),
                description: metadata.description.clone(),
                last_build_date: metadata.last_build_date.clone(),
                items: document
                    .items
                    .iter()
                    .map(|item| ItemElement {
                        title: item.title.clone(),
                        link: item.link.clone(),
                        pub_date: item.pub_date.clone(),
                        guid: GuidElement {
                            is_perma_link: Some("false".to_string()),
                            value: item.guid.clone(),
                        },
                        description: item.description.clone(),
                    })
                    .collect(),
            },
        }
    }
}

impl From<RssElement> for AggregateDocument {
    fn from(rss: RssElement) -> Self {
        let channel = rss.channel;
        Self {
            metadata: ChannelMetadata {
                title: channel.title,
                link: channel.link,
                description: channel.description,
                last_build_date: channel.last_build_date,
            },
            items: channel
                .items
                .into_iter()
                .map(|item| FeedItem {
                    title: item.title,
                    link: item.link,
                    pub_date: item.pub_date,
                    guid: item.guid.value,
                    description: item.description,
                })
                .collect(),
        }
    }
}

/// Render a document as an RSS 2.0 file body.
pub fn serialize_document(document: &AggregateDocument) -> Result<String> {
    let mut body = String::from(XML_DECLARATION);
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    RssElement::from(document)
        .serialize(serializer)
        .context("serializing aggregate document")?;
    body.push('\n');
    Ok(body)
}

pub fn parse_document(xml: &str) -> Result<AggregateDocument> {
    let rss: RssElement = quick_xml::de::from_str(xml).context("parsing aggregate document")?;
    Ok(rss.into())
}

/// Item record for one new entry.
pub fn build_item<S>(entry: &FeedEntry, summarizer: &S, limits: SummaryLimits) -> FeedItem
where
    S: Summarizer + ?Sized,
{
    FeedItem {
        title: entry.title.clone().unwrap_or_default(),
        link: entry.link.clone(),
        pub_date: entry.published_raw.clone(),
        guid: entry.guid().to_string(),
        description: describe(entry.summary.as_deref(), summarizer, limits),
    }
}

/// RSS document on disk, replaced atomically on every save.
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileDocumentStore {
    fn open(&mut self, mode: DocumentMode, fresh: &ChannelMetadata) -> Result<AggregateDocument> {
        if mode == DocumentMode::Create {
            info!("Creating new feed document {}", self.path.display());
            return Ok(AggregateDocument::new(fresh.clone()));
        }

        match fs::read_to_string(&self.path) {
            Ok(xml) => {
                let document = parse_document(&xml)
                    .with_context(|| format!("loading existing feed {}", self.path.display()))?;
                info!(
                    "Appending to existing feed {} ({} items)",
                    self.path.display(),
                    document.items.len()
                );
                Ok(document)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No feed at {}, creating new document", self.path.display());
                Ok(AggregateDocument::new(fresh.clone()))
            }
            Err(e) => Err(e).with_context(|| format!("reading feed {}", self.path.display())),
        }
    }

    fn save(&mut self, document: &AggregateDocument) -> Result<()> {
        let body = serialize_document(document)?;
        write_atomically(&self.path, body.as_bytes())
            .with_context(|| format!("writing feed {}", self.path.display()))?;
        debug!("Feed written to {} ({} bytes)", self.path.display(), body.len());
        Ok(())
    }
}
