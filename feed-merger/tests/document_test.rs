mod common;

use common::{at, entry, init_tracing};
use feed_merger::document::{build_item, parse_document, serialize_document};
use feed_merger::summary::{describe, limit_summary, NO_SUMMARY};
use feed_merger::{
    AggregateDocument, ChannelConfig, DocumentMode, DocumentStore, FeedItem, FileDocumentStore, HtmlSummarizer,
    SummaryLimits, Summarizer,
};
use interfaces::memory::PassthroughSummarizer;
use std::fs;
use tempfile::tempdir;

struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    fn plain_text(&self, _raw: &str) -> Option<String> {
        None
    }
}

fn item(n: usize) -> FeedItem {
    FeedItem {
        title: format!("Item {} & friends", n),
        link: format!("https://e.com/{}", n),
        pub_date: Some("Tue, 05 Mar 2024 14:00:00 GMT".to_string()),
        guid: format!("guid-{}", n),
        description: "Plain <text> with \"quotes\"".to_string(),
    }
}

#[test]
fn test_truncation_boundary_is_literal() {
    let limits = SummaryLimits::default();

    let exactly_350 = "a".repeat(350);
    assert_eq!(limit_summary(&exactly_350, limits), exactly_350);

    let just_over = "b".repeat(351);
    assert_eq!(limit_summary(&just_over, limits), format!("{}...", just_over));

    let long = "c".repeat(700);
    assert_eq!(limit_summary(&long, limits), format!("{}...", "c".repeat(600)));
}

#[test]
fn test_truncation_counts_characters() {
    let limits = SummaryLimits {
        check_len: 3,
        slice_len: 3,
    };
    assert_eq!(limit_summary("äöü", limits), "äöü");
    assert_eq!(limit_summary("äöüß", limits), "äöü...");
}

#[test]
fn test_describe_falls_back_to_placeholder() {
    let limits = SummaryLimits::default();
    assert_eq!(describe(None, &HtmlSummarizer, limits), NO_SUMMARY);
    assert_eq!(describe(Some("<p>x</p>"), &FailingSummarizer, limits), NO_SUMMARY);
    assert_eq!(describe(Some("<p>Hello <b>world</b></p>"), &HtmlSummarizer, limits), "Hello world");
    assert_eq!(describe(Some("Fish &amp; chips"), &HtmlSummarizer, limits), "Fish & chips");
}

#[test]
fn test_build_item_uses_native_date_and_guid_fallback() {
    let mut with_id = entry("a", "https://e.com/1", Some(at(2024, 3, 5, 14)));
    with_id.id = Some("urn:1".to_string());
    with_id.published_raw = Some("5 Mar 2024 14:00 GMT".to_string());
    with_id.summary = Some("short".to_string());

    let built = build_item(&with_id, &PassthroughSummarizer, SummaryLimits::default());
    assert_eq!(built.title, "Title of https://e.com/1");
    assert_eq!(built.link, "https://e.com/1");
    assert_eq!(built.pub_date.as_deref(), Some("5 Mar 2024 14:00 GMT"));
    assert_eq!(built.guid, "urn:1");
    assert_eq!(built.description, "short");

    let bare = entry("a", "https://e.com/2", None);
    let built = build_item(&bare, &PassthroughSummarizer, SummaryLimits::default());
    assert_eq!(built.pub_date, None);
    assert_eq!(built.guid, "https://e.com/2");
    assert_eq!(built.description, NO_SUMMARY);
}

#[test]
fn test_document_round_trips_through_xml() {
    let mut document = AggregateDocument::new(ChannelConfig::default().to_metadata());
    document.set_last_build_date("Tue, 05 Mar 2024 14:00:00 GMT".to_string());
    document.append_items(vec![item(1), item(2)]);
    let mut undated = item(3);
    undated.pub_date = None;
    document.append_items(vec![undated]);

    let xml = serialize_document(&document).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<rss version=\"2.0\">"));
    assert!(xml.contains("<guid isPermaLink=\"false\">guid-1</guid>"));
    assert!(xml.contains("<lastBuildDate>Tue, 05 Mar 2024 14:00:00 GMT</lastBuildDate>"));
    assert!(xml.contains("Item 1 &amp; friends"));

    let parsed = parse_document(&xml).unwrap();
    assert_eq!(parsed, document);
}

#[test]
fn test_append_mode_preserves_existing_items_and_metadata() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("aggregated_feed.xml");
    let mut store = FileDocumentStore::new(&path);

    let first_meta = ChannelConfig {
        title: "First title".to_string(),
        link: "https://first.example.com/feed.xml".to_string(),
        description: "Kept across runs".to_string(),
    };
    let mut first = store.open(DocumentMode::AppendOrCreate, &first_meta.to_metadata()).unwrap();
    assert!(first.items.is_empty());
    first.append_items(vec![item(1)]);
    store.save(&first).unwrap();

    let other_meta = ChannelConfig::default().to_metadata();
    let mut second = store.open(DocumentMode::AppendOrCreate, &other_meta).unwrap();
    assert_eq!(second.metadata.title, "First title");
    assert_eq!(second.items, vec![item(1)]);
    second.append_items(vec![item(2), item(3)]);
    store.save(&second).unwrap();

    let reloaded = parse_document(&fs::read_to_string(&path).unwrap()).unwrap();
    let links: Vec<_> = reloaded.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["https://e.com/1", "https://e.com/2", "https://e.com/3"]);

    let recreated = store.open(DocumentMode::Create, &other_meta).unwrap();
    assert!(recreated.items.is_empty());
    assert_eq!(recreated.metadata, other_meta);
}

#[test]
fn test_save_leaves_no_temporary_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("aggregated_feed.xml");
    let mut store = FileDocumentStore::new(&path);

    let document = AggregateDocument::new(ChannelConfig::default().to_metadata());
    store.save(&document).unwrap();
    store.save(&document).unwrap();

    let names: Vec<String> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["aggregated_feed.xml".to_string()]);
}

#[test]
fn test_truncated_document_is_an_error_not_a_fresh_start() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("aggregated_feed.xml");
    fs::write(&path, "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Half").unwrap();

    let mut store = FileDocumentStore::new(&path);
    let result = store.open(DocumentMode::AppendOrCreate, &ChannelConfig::default().to_metadata());

    assert!(result.is_err());
}
