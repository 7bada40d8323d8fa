mod common;

use chrono::Utc;
use common::{at, entry, init_tracing};
use feed_merger::{merge_entries, normalize_link, LedgerRecord, LedgerStore};
use interfaces::memory::MemoryLedger;

fn links(outcome: &feed_merger::MergeOutcome) -> Vec<&str> {
    outcome.entries.iter().map(|e| e.link.as_str()).collect()
}

#[test]
fn test_normalize_link_variants_share_a_key() {
    assert_eq!(normalize_link("http://x/y/"), "http://x/y");
    assert_eq!(normalize_link("http://x/y"), "http://x/y");
    assert_eq!(normalize_link(" http://x/y "), "http://x/y");
    assert_eq!(normalize_link("\thttp://x/y/ \n"), "http://x/y");
    // Only one trailing slash is removed.
    assert_eq!(normalize_link("http://x/y//"), "http://x/y/");
}

#[test]
fn test_orders_newest_first_with_unknown_dates_last() {
    init_tracing();

    let entries = vec![
        entry("a", "https://e.com/undated-1", None),
        entry("a", "https://e.com/old", Some(at(2024, 1, 1, 0))),
        entry("b", "https://e.com/new", Some(at(2024, 3, 1, 0))),
        entry("b", "https://e.com/undated-2", None),
        entry("c", "https://e.com/mid", Some(at(2024, 2, 1, 0))),
    ];

    let outcome = merge_entries(entries, &MemoryLedger::default(), Utc::now());

    assert_eq!(
        links(&outcome),
        vec![
            "https://e.com/new",
            "https://e.com/mid",
            "https://e.com/old",
            "https://e.com/undated-1",
            "https://e.com/undated-2",
        ]
    );
}

#[test]
fn test_equal_timestamps_keep_arrival_order() {
    let same = Some(at(2024, 5, 5, 12));
    let entries = vec![
        entry("a", "https://e.com/first", same),
        entry("b", "https://e.com/second", same),
        entry("c", "https://e.com/third", same),
    ];

    let outcome = merge_entries(entries, &MemoryLedger::default(), Utc::now());

    assert_eq!(
        links(&outcome),
        vec!["https://e.com/first", "https://e.com/second", "https://e.com/third"]
    );
}

#[test]
fn test_cross_source_duplicate_keeps_later_arrival() {
    init_tracing();

    let mut earlier = entry("board-a", "https://e.com/post/", Some(at(2024, 1, 1, 0)));
    earlier.title = Some("From board A".to_string());
    let mut later = entry("board-b", " https://e.com/post", Some(at(2024, 1, 1, 0)));
    later.title = Some("From board B".to_string());

    let entries = vec![
        earlier,
        entry("board-a", "https://e.com/other", Some(at(2023, 1, 1, 0))),
        later,
    ];

    let outcome = merge_entries(entries, &MemoryLedger::default(), Utc::now());

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.duplicates, 1);
    let survivor = &outcome.entries[0];
    assert_eq!(survivor.source, "board-b");
    assert_eq!(survivor.title.as_deref(), Some("From board B"));
    assert_eq!(outcome.ledger_additions[0].normalized_link, "https://e.com/post");
}

#[test]
fn test_duplicate_keeps_position_of_first_occurrence() {
    let entries = vec![
        entry("a", "https://e.com/x", None),
        entry("a", "https://e.com/y", None),
        entry("b", "https://e.com/x/", None),
    ];

    let outcome = merge_entries(entries, &MemoryLedger::default(), Utc::now());

    assert_eq!(links(&outcome), vec!["https://e.com/x/", "https://e.com/y"]);
}

#[test]
fn test_ledger_hits_are_never_re_emitted() {
    let mut ledger = MemoryLedger::with_records(vec![LedgerRecord {
        normalized_link: "https://e.com/seen".to_string(),
        first_seen_at: at(2024, 1, 1, 0),
    }]);
    ledger.load().unwrap();

    let entries = vec![
        entry("a", "https://e.com/seen/", Some(at(2024, 6, 1, 0))),
        entry("b", " https://e.com/seen ", Some(at(2024, 6, 1, 0))),
        entry("b", "https://e.com/fresh", Some(at(2024, 6, 1, 0))),
    ];

    let outcome = merge_entries(entries, &ledger, Utc::now());

    assert_eq!(links(&outcome), vec!["https://e.com/fresh"]);
    assert_eq!(outcome.already_seen, 2);
}

#[test]
fn test_blank_links_are_discarded() {
    let entries = vec![entry("a", "   ", None), entry("a", "https://e.com/ok", None)];

    let outcome = merge_entries(entries, &MemoryLedger::default(), Utc::now());

    assert_eq!(links(&outcome), vec!["https://e.com/ok"]);
    assert_eq!(outcome.skipped_without_link, 1);
}

#[test]
fn test_ledger_additions_use_publication_or_now() {
    let now = at(2025, 1, 1, 9);
    let published = at(2024, 12, 24, 18);
    let entries = vec![
        entry("a", "https://e.com/dated/", Some(published)),
        entry("a", "https://e.com/undated", None),
    ];

    let outcome = merge_entries(entries, &MemoryLedger::default(), now);

    assert_eq!(outcome.ledger_additions.len(), outcome.entries.len());
    assert_eq!(outcome.ledger_additions[0].normalized_link, "https://e.com/dated");
    assert_eq!(outcome.ledger_additions[0].first_seen_at, published);
    assert_eq!(outcome.ledger_additions[1].normalized_link, "https://e.com/undated");
    assert_eq!(outcome.ledger_additions[1].first_seen_at, now);
}

#[test]
fn test_empty_input_produces_empty_outcome() {
    let outcome = merge_entries(Vec::new(), &MemoryLedger::default(), Utc::now());
    assert!(outcome.is_empty());
    assert!(outcome.ledger_additions.is_empty());
}
