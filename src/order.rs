//! Chronological ordering and prev/next chain derivation.
//!
//! The central algorithm of the pipeline: given every post, produce a total
//! order by effective date and derive each post's immediate predecessor and
//! successor. Pure functions, no I/O — the full-rebuild path runs this once
//! over everything, the incremental updater runs it implicitly (fast paths
//! reproduce what a full run would compute), and the validator runs it to
//! recompute ground truth.
//!
//! ## Ordering key
//!
//! Posts sort by `(date, slug)`. Effective dates have day precision and are
//! not unique, so the slug — globally unique, enforced at scan time — acts
//! as the tiebreak. This makes the order a strict total order that depends
//! only on content, never on directory enumeration order.
//!
//! ## Neighbor snapshots
//!
//! A [`NeighborRef`] is a denormalized copy of the neighbor's identifying
//! fields, not a live pointer. Readers get prev/next navigation without a
//! second lookup; the cost is that a title edit must be propagated into both
//! neighbors' snapshots (the updater's fast-patch rule).

use crate::scan::Post;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized reference to an adjacent post in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRef {
    pub slug: String,
    pub year: String,
    pub month: String,
    pub title: String,
}

impl NeighborRef {
    pub fn of(post: &Post) -> Self {
        NeighborRef {
            slug: post.slug.clone(),
            year: post.year.clone(),
            month: post.month.clone(),
            title: post.title.clone(),
        }
    }
}

/// The total-order key: effective date, slug tiebreak.
pub fn sort_key(post: &Post) -> (DateTime<Utc>, &str) {
    (post.date, post.slug.as_str())
}

/// Sort posts into chain order (ascending date, slug tiebreak).
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

/// Derive `(previous, next)` references for an already-sorted slice.
pub fn link(sorted: &[Post]) -> Vec<(Option<NeighborRef>, Option<NeighborRef>)> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let previous = i.checked_sub(1).map(|p| NeighborRef::of(&sorted[p]));
            let next = sorted.get(i + 1).map(NeighborRef::of);
            (previous, next)
        })
        .collect()
}
