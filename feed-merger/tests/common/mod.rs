#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use feed_merger::FeedEntry;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn entry(source: &str, link: &str, published_at: Option<DateTime<Utc>>) -> FeedEntry {
    let mut entry = FeedEntry::new(source, link);
    entry.title = Some(format!("Title of {}", link.trim()));
    entry.published = published_at;
    entry.published_at = published_at;
    entry.published_raw = published_at.map(|t| t.to_rfc2822());
    entry
}

/// One `<item>` for `rss_document`.
pub struct TestItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub pub_date: Option<&'a str>,
    pub guid: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> TestItem<'a> {
    pub fn new(title: &'a str, link: &'a str) -> Self {
        Self {
            title,
            link,
            pub_date: None,
            guid: None,
            description: None,
        }
    }

    pub fn published(mut self, pub_date: &'a str) -> Self {
        self.pub_date = Some(pub_date);
        self
    }

    pub fn guid(mut self, guid: &'a str) -> Self {
        self.guid = Some(guid);
        self
    }

    pub fn description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }
}

pub fn rss_document(title: &str, items: &[TestItem<'_>]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
    xml.push_str(&format!("<title>{}</title>\n<link>https://source.example.com/</link>\n<description>Test source</description>\n", title));
    for item in items {
        xml.push_str("<item>\n");
        xml.push_str(&format!("<title>{}</title>\n", item.title));
        xml.push_str(&format!("<link>{}</link>\n", item.link));
        if let Some(pub_date) = item.pub_date {
            xml.push_str(&format!("<pubDate>{}</pubDate>\n", pub_date));
        }
        if let Some(guid) = item.guid {
            xml.push_str(&format!("<guid isPermaLink=\"false\">{}</guid>\n", guid));
        }
        if let Some(description) = item.description {
            xml.push_str(&format!("<description><![CDATA[{}]]></description>\n", description));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}
