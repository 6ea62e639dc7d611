//! The persisted metadata index.
//!
//! A single JSON document mapping each post's slug to its computed metadata:
//! identity fields, effective date, last-modified timestamp, and denormalized
//! prev/next neighbor snapshots. Downstream page rendering reads it to build
//! sequential navigation and "last edited" links; nothing but the updater and
//! the full-rebuild tool ever writes it.
//!
//! ## Invariants
//!
//! After every successful mutation (full rebuild or incremental update):
//!
//! - exactly one record has `previous = null` and exactly one has
//!   `next = null`, unless the store is empty;
//! - following `next` from the head visits every record exactly once;
//! - every neighbor snapshot's title equals the referenced record's current
//!   title;
//! - every record's fields equal the values derived from its content file.
//!
//! The validator checks all of these against ground truth; the updater's job
//! is to never break them in the first place.
//!
//! ## Storage
//!
//! Pretty-printed JSON with a trailing newline — the file is committed
//! alongside the content, so its diffs are reviewed by humans. Records are
//! kept in a `BTreeMap` so serialization order is stable and a rebuild that
//! changes nothing produces a byte-identical file.
//!
//! Saves are atomic: the document is written to a temporary file in the same
//! directory and renamed over the target, so a crash mid-write can never
//! leave a half-written index.

use crate::order::{self, NeighborRef};
use crate::scan::{Extension, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("metadata index not found at {0} (run `postindex generate` first)")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed metadata index: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted metadata for a single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub slug: String,
    pub year: String,
    pub month: String,
    pub extension: Extension,
    pub title: String,
    pub date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub previous: Option<NeighborRef>,
    pub next: Option<NeighborRef>,
}

impl PostRecord {
    /// Snapshot of this record for a neighbor's `previous`/`next` field.
    pub fn neighbor_ref(&self) -> NeighborRef {
        NeighborRef {
            slug: self.slug.clone(),
            year: self.year.clone(),
            month: self.month.clone(),
            title: self.title.clone(),
        }
    }

    /// The total-order key, matching [`order::sort_key`] for posts.
    pub fn sort_key(&self) -> (DateTime<Utc>, &str) {
        (self.date, self.slug.as_str())
    }
}

/// The full index: slug → record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataStore {
    pub posts: BTreeMap<String, PostRecord>,
}

impl MetadataStore {
    /// Build a store from posts paired with their last-modified timestamps.
    ///
    /// Sorts, links the chain, and assembles records. Callers decide where
    /// `last_modified` comes from: git history on full rebuild, the prior
    /// store (or "now") on incremental recompute.
    pub fn build(posts: Vec<(Post, DateTime<Utc>)>) -> Self {
        let mut pairs = posts;
        pairs.sort_by(|(a, _), (b, _)| order::sort_key(a).cmp(&order::sort_key(b)));

        let (sorted, timestamps): (Vec<Post>, Vec<DateTime<Utc>>) = pairs.into_iter().unzip();
        let links = order::link(&sorted);

        let records = sorted
            .into_iter()
            .zip(timestamps)
            .zip(links)
            .map(|((post, last_modified), (previous, next))| {
                (
                    post.slug.clone(),
                    PostRecord {
                        slug: post.slug,
                        year: post.year,
                        month: post.month,
                        extension: post.extension,
                        title: post.title,
                        date: post.date,
                        last_modified,
                        previous,
                        next,
                    },
                )
            })
            .collect();

        MetadataStore { posts: records }
    }

    /// Read the persisted index. A missing file is an error — incremental
    /// operations require a prior full rebuild.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically write the index: temp file in the target directory, then
    /// rename over the destination.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, format!("{json}\n"))?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// The earliest post (no `previous`), if the store is non-empty and
    /// well-formed.
    pub fn head(&self) -> Option<&PostRecord> {
        self.posts.values().find(|r| r.previous.is_none())
    }

    /// The latest post (no `next`), if the store is non-empty and
    /// well-formed.
    pub fn tail(&self) -> Option<&PostRecord> {
        self.posts.values().find(|r| r.next.is_none())
    }
}
