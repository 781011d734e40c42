//! Property-based tests for query building and entry normalization.

use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;
use scholarly_feed::client::atom::{RawEntry, normalize_entries};
use scholarly_feed::config::MissingDatePolicy;
use scholarly_feed::query::{self, CATEGORIES};

/// Subset of the known category ids, plus an occasional unknown one.
fn arb_categories() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        prop_oneof![
            4 => proptest::sample::select(CATEGORIES).prop_map(|c| c.id.to_string()),
            1 => "[a-z]{2}\\.[A-Z]{2}",
        ],
        0..5,
    )
}

/// Entries drawn from a small id pool so collisions are common.
fn arb_entry() -> impl Strategy<Value = RawEntry> {
    (
        proptest::option::of(0u8..4),    // id from pool, or none
        "[A-Za-z ]{1,30}",                // title
        proptest::option::of(1990i32..2030), // published year
        0usize..3,                        // author elements
    )
        .prop_map(|(id, title, year, authors)| RawEntry {
            id: id.map(|n| format!("http://arxiv.org/abs/2401.0000{n}v1")),
            title: Some(title),
            summary: Some("Summary".to_string()),
            author_elements: authors,
            author_names: vec!["Author".to_string(); authors],
            published: year.map(|y| format!("{y}-03-01T00:00:00Z")),
            ..Default::default()
        })
}

proptest! {
    /// The same inputs always yield the same query.
    #[test]
    fn query_build_is_deterministic(
        text in "[A-Za-z0-9 ]{0,40}",
        categories in arb_categories(),
    ) {
        prop_assert_eq!(query::build(&text, &categories), query::build(&text, &categories));
    }

    /// A non-empty query is produced for every input.
    #[test]
    fn query_build_never_empty(
        text in ".{0,40}",
        categories in arb_categories(),
    ) {
        prop_assert!(!query::build(&text, &categories).is_empty());
    }

    /// Text without known categories passes through untouched.
    #[test]
    fn query_build_text_only_is_verbatim(
        text in " {0,4}[a-z]{1,20} {0,4}",
        unknown in proptest::collection::vec("[a-z]{3}\\.[A-Z]{2}", 0..3),
    ) {
        prop_assert_eq!(query::build(&text, &unknown), text);
    }

    /// Whitespace-only text behaves like no text.
    #[test]
    fn query_build_blank_text_is_empty(
        pad in " {0,6}",
        categories in arb_categories(),
    ) {
        prop_assert_eq!(query::build(&pad, &categories), query::build("", &categories));
    }

    /// Known categories always show up as their topic phrase.
    #[test]
    fn query_build_contains_selected_phrases(
        text in "[a-z]{0,20}",
        categories in arb_categories(),
    ) {
        let built = query::build(&text, &categories);
        for id in &categories {
            if let Some(phrase) = query::category_phrase(id) {
                prop_assert!(built.contains(phrase), "{} missing from {}", phrase, built);
            }
        }
    }

    /// Ids stay unique within a page however often the feed repeats itself.
    #[test]
    fn normalized_ids_are_unique(entries in proptest::collection::vec(arb_entry(), 0..30)) {
        let papers = normalize_entries(entries, MissingDatePolicy::CurrentTime, Utc::now());
        let ids: HashSet<&str> = papers.iter().map(|p| p.id.as_str()).collect();
        prop_assert_eq!(ids.len(), papers.len());
    }

    /// Normalization never yields more papers than entries, and rejecting
    /// undated entries never yields more than stamping them.
    #[test]
    fn normalization_only_drops(entries in proptest::collection::vec(arb_entry(), 0..30)) {
        let now = Utc::now();
        let lenient = normalize_entries(entries.clone(), MissingDatePolicy::CurrentTime, now);
        let strict = normalize_entries(entries.clone(), MissingDatePolicy::Reject, now);

        prop_assert!(lenient.len() <= entries.len());
        prop_assert!(strict.len() <= lenient.len());
        for paper in &strict {
            prop_assert!(paper.published.is_some());
            prop_assert!(!paper.authors.is_empty());
        }
    }
}
