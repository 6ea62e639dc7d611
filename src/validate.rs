//! Read-side validation of the persisted index against ground truth.
//!
//! Recomputes everything directly from the content files — the stored index
//! is never trusted as an input to its own check — and diffs field by field,
//! then checks the global chain invariants. Every discrepancy is collected;
//! the run never stops at the first problem, because a corrupted index
//! usually has several related symptoms and reporting one at a time makes a
//! miserable fix loop.
//!
//! Checks, in order:
//!
//! 1. every content file has a record, every record has a file;
//! 2. per-record fields (date, title, path, extension) match the file;
//! 3. `previous`/`next` match the recomputed ground-truth ordering;
//! 4. neighbor references resolve, and their title snapshots are current;
//! 5. chain shape: one head, one tail, and the head-to-tail walk visits
//!    every record exactly once (no cycles, no orphaned islands).
//!
//! Purely read-side: validation never mutates the store.

use crate::order;
use crate::scan::Post;
use crate::store::MetadataStore;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Which neighbor field a discrepancy concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Previous => f.write_str("previous"),
            Direction::Next => f.write_str("next"),
        }
    }
}

/// A single disagreement between the index and ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// Content file with no index record.
    MissingRecord { slug: String },
    /// Index record with no content file.
    OrphanRecord { slug: String },
    /// A stored field differs from the value derived from the file.
    FieldMismatch {
        slug: String,
        field: &'static str,
        file: String,
        store: String,
    },
    /// A neighbor reference disagrees with the recomputed ordering.
    WrongNeighbor {
        slug: String,
        direction: Direction,
        expected: Option<String>,
        actual: Option<String>,
    },
    /// A neighbor reference points at a slug with no record.
    DanglingNeighbor {
        slug: String,
        direction: Direction,
        target: String,
    },
    /// A neighbor snapshot's title is stale.
    StaleNeighborTitle {
        slug: String,
        direction: Direction,
        snapshot: String,
        actual: String,
    },
    /// Not exactly one record without `previous`.
    HeadCount { found: Vec<String> },
    /// Not exactly one record without `next`.
    TailCount { found: Vec<String> },
    /// The `next` walk revisited a record.
    ChainCycle { slug: String },
    /// The `next` walk terminated before covering the store.
    ChainBreak { visited: usize, total: usize },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::MissingRecord { slug } => {
                write!(f, "post missing from index: {slug}")
            }
            Discrepancy::OrphanRecord { slug } => {
                write!(f, "index record has no content file: {slug}")
            }
            Discrepancy::FieldMismatch {
                slug,
                field,
                file,
                store,
            } => {
                write!(f, "{slug}: {field} mismatch (file: {file}, index: {store})")
            }
            Discrepancy::WrongNeighbor {
                slug,
                direction,
                expected,
                actual,
            } => {
                let expected = expected.as_deref().unwrap_or("none");
                let actual = actual.as_deref().unwrap_or("none");
                write!(
                    f,
                    "{slug}: {direction} should be {expected}, index has {actual}"
                )
            }
            Discrepancy::DanglingNeighbor {
                slug,
                direction,
                target,
            } => {
                write!(f, "{slug}: {direction} points at unknown slug {target}")
            }
            Discrepancy::StaleNeighborTitle {
                slug,
                direction,
                snapshot,
                actual,
            } => {
                write!(
                    f,
                    "{slug}: {direction} snapshot title {snapshot:?} != current title {actual:?}"
                )
            }
            Discrepancy::HeadCount { found } => {
                write!(
                    f,
                    "expected exactly one head (no previous), found {}: [{}]",
                    found.len(),
                    found.join(", ")
                )
            }
            Discrepancy::TailCount { found } => {
                write!(
                    f,
                    "expected exactly one tail (no next), found {}: [{}]",
                    found.len(),
                    found.join(", ")
                )
            }
            Discrepancy::ChainCycle { slug } => {
                write!(f, "chain cycles back to {slug}")
            }
            Discrepancy::ChainBreak { visited, total } => {
                write!(
                    f,
                    "chain covers {visited} of {total} records (disconnected)"
                )
            }
        }
    }
}

/// Compare the index against freshly loaded posts. Returns every
/// discrepancy found, in check order; empty means the index is consistent.
pub fn validate(store: &MetadataStore, posts: &[Post]) -> Vec<Discrepancy> {
    let mut out = Vec::new();

    check_membership(store, posts, &mut out);
    check_fields(store, posts, &mut out);
    check_ordering(store, posts, &mut out);
    check_references(store, &mut out);
    check_chain_shape(store, &mut out);

    out
}

fn check_membership(store: &MetadataStore, posts: &[Post], out: &mut Vec<Discrepancy>) {
    let file_slugs: BTreeSet<&str> = posts.iter().map(|p| p.slug.as_str()).collect();

    for post in posts {
        if !store.posts.contains_key(&post.slug) {
            out.push(Discrepancy::MissingRecord {
                slug: post.slug.clone(),
            });
        }
    }
    for slug in store.posts.keys() {
        if !file_slugs.contains(slug.as_str()) {
            out.push(Discrepancy::OrphanRecord { slug: slug.clone() });
        }
    }
}

fn check_fields(store: &MetadataStore, posts: &[Post], out: &mut Vec<Discrepancy>) {
    for post in posts {
        let Some(record) = store.posts.get(&post.slug) else {
            continue;
        };

        let mut mismatch = |field: &'static str, file: String, stored: String| {
            if file != stored {
                out.push(Discrepancy::FieldMismatch {
                    slug: post.slug.clone(),
                    field,
                    file,
                    store: stored,
                });
            }
        };

        mismatch("date", post.date.to_rfc3339(), record.date.to_rfc3339());
        mismatch("title", post.title.clone(), record.title.clone());
        mismatch(
            "path",
            format!("{}/{}", post.year, post.month),
            format!("{}/{}", record.year, record.month),
        );
        mismatch(
            "extension",
            post.extension.to_string(),
            record.extension.to_string(),
        );
    }
}

fn check_ordering(store: &MetadataStore, posts: &[Post], out: &mut Vec<Discrepancy>) {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| order::sort_key(a).cmp(&order::sort_key(b)));

    for (i, post) in sorted.iter().enumerate() {
        let Some(record) = store.posts.get(&post.slug) else {
            continue;
        };

        let expected_prev = i.checked_sub(1).map(|p| sorted[p].slug.clone());
        let actual_prev = record.previous.as_ref().map(|n| n.slug.clone());
        if expected_prev != actual_prev {
            out.push(Discrepancy::WrongNeighbor {
                slug: post.slug.clone(),
                direction: Direction::Previous,
                expected: expected_prev,
                actual: actual_prev,
            });
        }

        let expected_next = sorted.get(i + 1).map(|p| p.slug.clone());
        let actual_next = record.next.as_ref().map(|n| n.slug.clone());
        if expected_next != actual_next {
            out.push(Discrepancy::WrongNeighbor {
                slug: post.slug.clone(),
                direction: Direction::Next,
                expected: expected_next,
                actual: actual_next,
            });
        }
    }
}

fn check_references(store: &MetadataStore, out: &mut Vec<Discrepancy>) {
    for (slug, record) in &store.posts {
        let neighbors = [
            (Direction::Previous, &record.previous),
            (Direction::Next, &record.next),
        ];
        for (direction, neighbor) in neighbors {
            let Some(snapshot) = neighbor else { continue };
            match store.posts.get(&snapshot.slug) {
                None => out.push(Discrepancy::DanglingNeighbor {
                    slug: slug.clone(),
                    direction,
                    target: snapshot.slug.clone(),
                }),
                Some(target) if target.title != snapshot.title => {
                    out.push(Discrepancy::StaleNeighborTitle {
                        slug: slug.clone(),
                        direction,
                        snapshot: snapshot.title.clone(),
                        actual: target.title.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }
}

fn check_chain_shape(store: &MetadataStore, out: &mut Vec<Discrepancy>) {
    if store.posts.is_empty() {
        return;
    }

    let heads: Vec<String> = store
        .posts
        .values()
        .filter(|r| r.previous.is_none())
        .map(|r| r.slug.clone())
        .collect();
    let tails: Vec<String> = store
        .posts
        .values()
        .filter(|r| r.next.is_none())
        .map(|r| r.slug.clone())
        .collect();

    if heads.len() != 1 {
        out.push(Discrepancy::HeadCount {
            found: heads.clone(),
        });
    }
    if tails.len() != 1 {
        out.push(Discrepancy::TailCount { found: tails });
    }

    // Walk from a head (if any) and make sure the whole store is covered.
    let Some(start) = heads.first() else { return };
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = store.posts.get(start.as_str());

    while let Some(record) = current {
        if !visited.insert(record.slug.as_str()) {
            out.push(Discrepancy::ChainCycle {
                slug: record.slug.clone(),
            });
            return;
        }
        current = record
            .next
            .as_ref()
            .and_then(|n| store.posts.get(&n.slug));
    }

    if visited.len() != store.posts.len() {
        out.push(Discrepancy::ChainBreak {
            visited: visited.len(),
            total: store.posts.len(),
        });
    }
}
