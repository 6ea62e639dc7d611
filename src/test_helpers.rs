//! Shared test utilities for the postindex test suite.
//!
//! Provides content-tree builders, compact `Post` constructors, and chain
//! assertions used across the scan, order, store, update, and validate
//! tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_post(tmp.path(), "2020", "01", "hello", "title: Hello\n", "Body.\n");
//!
//! let store = store_from(&[post("hello", "2020", "01", "2020-01-01", "Hello")]);
//! assert_chain(&store, &["hello"]);
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::Path;

use crate::scan::{Extension, Post};
use crate::store::MetadataStore;

// =========================================================================
// Fixture builders
// =========================================================================

/// Write a post file at `root/year/month/slug.md` with the given
/// frontmatter block (pass `""` for none) and body.
pub fn write_post(root: &Path, year: &str, month: &str, slug: &str, frontmatter: &str, body: &str) {
    let dir = root.join(year).join(month);
    std::fs::create_dir_all(&dir).unwrap();

    let content = if frontmatter.is_empty() {
        body.to_string()
    } else {
        format!("---\n{frontmatter}---\n{body}")
    };
    std::fs::write(dir.join(format!("{slug}.md")), content).unwrap();
}

/// Midnight UTC of a `YYYY-MM-DD` day.
pub fn day(date: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap_or_else(|_| panic!("bad test date {date:?}"))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Construct a markdown `Post` directly, bypassing the filesystem.
pub fn post(slug: &str, year: &str, month: &str, date: &str, title: &str) -> Post {
    Post {
        slug: slug.to_string(),
        year: year.to_string(),
        month: month.to_string(),
        extension: Extension::Md,
        title: title.to_string(),
        date: day(date),
    }
}

/// Timestamp used for every record built by [`store_from`]. Distinct from
/// the `now` values tests pass to the updater, so preserved-vs-bumped
/// assertions can tell them apart.
pub fn fixture_modified() -> DateTime<Utc> {
    day("2020-10-10")
}

/// Build a store from posts with a fixed last-modified timestamp.
pub fn store_from(posts: &[Post]) -> MetadataStore {
    let pairs = posts
        .iter()
        .cloned()
        .map(|p| (p, fixture_modified()))
        .collect();
    MetadataStore::build(pairs)
}

// =========================================================================
// Chain assertions
// =========================================================================

/// Slugs in chain order, walking `next` from the head.
///
/// Panics if the walk cycles; an incomplete walk shows up as a shorter
/// result than expected.
pub fn chain_slugs(store: &MetadataStore) -> Vec<String> {
    let mut slugs = Vec::new();
    let mut current = store.head();

    while let Some(record) = current {
        assert!(
            !slugs.contains(&record.slug),
            "chain cycles back to {}",
            record.slug
        );
        slugs.push(record.slug.clone());
        current = record.next.as_ref().and_then(|n| store.posts.get(&n.slug));
    }

    slugs
}

/// Assert the store's chain visits exactly `expected`, in order, in both
/// directions.
pub fn assert_chain(store: &MetadataStore, expected: &[&str]) {
    assert_eq!(chain_slugs(store), expected, "forward chain mismatch");
    assert_eq!(
        store.posts.len(),
        expected.len(),
        "store has records outside the chain"
    );

    // Walk backwards from the tail too; prev pointers can disagree with
    // next pointers even when the forward walk looks right.
    let mut reversed = Vec::new();
    let mut current = store.tail();
    while let Some(record) = current {
        assert!(
            !reversed.contains(&record.slug),
            "reverse chain cycles back to {}",
            record.slug
        );
        reversed.push(record.slug.clone());
        current = record
            .previous
            .as_ref()
            .and_then(|n| store.posts.get(&n.slug));
    }
    reversed.reverse();
    assert_eq!(reversed, expected, "reverse chain mismatch");
}
