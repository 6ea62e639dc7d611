//! Incremental index updates driven by a staged change-set.
//!
//! Rebuilding the whole index on every edit is always correct but wasteful
//! in a pre-commit hook: most commits touch one post. This module classifies
//! the staged change-set and picks the cheapest strategy that provably
//! preserves the chain invariants:
//!
//! | Change-set                                  | Strategy       |
//! |---------------------------------------------|----------------|
//! | any deletion                                | full recompute |
//! | any edited post's date changed              | full recompute |
//! | additions, all sorting after the tail       | fast append    |
//! | additions, any sorting before the tail      | full recompute |
//! | edits only (no date changes)                | fast patch     |
//!
//! Rules are evaluated top to bottom; the first match wins. Deletions and
//! date changes can relocate posts anywhere in the chain and are not worth
//! optimizing. The fast paths never touch more than the affected records:
//! append links onto the tail, patch rewrites a title and its two neighbor
//! snapshots.
//!
//! Every strategy yields a store a full rebuild over the same content would
//! also yield (last-modified timestamps aside) — the validator can't tell
//! them apart. The updater is the only authorized mutator of the persisted
//! index.

use crate::git::StagedChanges;
use crate::order::{self, NeighborRef};
use crate::scan::{self, Post, ScanError};
use crate::store::{MetadataStore, PostRecord};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    // A fast path asked to touch a record that isn't there. That's a logic
    // bug in classification, not bad input.
    #[error("internal error: slug {0:?} not present in the index")]
    MissingRecord(String),
}

/// The staged change-set, classified against the current store.
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Staged posts whose slug is not in the store.
    pub added: Vec<Post>,
    /// Staged posts whose slug is already in the store.
    pub edited: Vec<Post>,
    /// Slugs of deleted post files.
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// Build a change-set from staged git paths.
    ///
    /// Paths outside the content root (or not matching the post layout) are
    /// ignored; added/modified post files are parsed from the working tree.
    pub fn from_staged(
        staged: &StagedChanges,
        content_root: &Path,
        store: &MetadataStore,
    ) -> Result<Self, ScanError> {
        let mut changes = ChangeSet::default();

        for path in &staged.changed {
            let Some(source) = scan::post_source_from_path(path, content_root) else {
                continue;
            };
            let post = scan::load_post(&source)?;
            if store.posts.contains_key(&post.slug) {
                changes.edited.push(post);
            } else {
                changes.added.push(post);
            }
        }

        changes.deleted = staged
            .deleted
            .iter()
            .filter_map(|p| scan::post_source_from_path(p, content_root))
            .map(|s| s.slug)
            .collect();

        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.edited.is_empty() && self.deleted.is_empty()
    }

    /// Slugs of staged posts that still exist on disk (added + edited).
    fn staged_slugs(&self) -> impl Iterator<Item = &str> {
        self.added
            .iter()
            .chain(&self.edited)
            .map(|p| p.slug.as_str())
    }
}

/// Why a full recompute was chosen over a fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    Deletion,
    DateChanged,
    Backdated,
}

/// The update strategy selected for a change-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FullRecompute(RecomputeReason),
    FastAppend,
    FastPatch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FullRecompute(RecomputeReason::Deletion) => {
                write!(f, "full recompute (deleted posts)")
            }
            Strategy::FullRecompute(RecomputeReason::DateChanged) => {
                write!(f, "full recompute (date changed)")
            }
            Strategy::FullRecompute(RecomputeReason::Backdated) => {
                write!(f, "full recompute (backdated post)")
            }
            Strategy::FastAppend => write!(f, "fast append (new posts at the end)"),
            Strategy::FastPatch => write!(f, "fast patch (title/content edits only)"),
        }
    }
}

/// Pick the cheapest strategy that preserves the chain invariants.
///
/// Precedence is fixed: deletions, then date changes, then additions, then
/// plain edits. Callers should check [`ChangeSet::is_empty`] first; an empty
/// change-set classifies as a no-op fast patch.
pub fn classify(changes: &ChangeSet, store: &MetadataStore) -> Strategy {
    if !changes.deleted.is_empty() {
        return Strategy::FullRecompute(RecomputeReason::Deletion);
    }

    let date_changed = changes.edited.iter().any(|post| {
        store
            .posts
            .get(&post.slug)
            .is_some_and(|record| record.date != post.date)
    });
    if date_changed {
        return Strategy::FullRecompute(RecomputeReason::DateChanged);
    }

    if !changes.added.is_empty() {
        let appendable = match store.tail() {
            Some(tail) => changes
                .added
                .iter()
                .all(|post| order::sort_key(post) > tail.sort_key()),
            None => true,
        };
        return if appendable {
            Strategy::FastAppend
        } else {
            Strategy::FullRecompute(RecomputeReason::Backdated)
        };
    }

    Strategy::FastPatch
}

/// Apply a strategy, producing the next store. Never mutates the input.
pub fn apply(
    strategy: Strategy,
    changes: &ChangeSet,
    store: &MetadataStore,
    content_root: &Path,
    now: DateTime<Utc>,
) -> Result<MetadataStore, UpdateError> {
    match strategy {
        Strategy::FullRecompute(_) => full_recompute(changes, store, content_root, now),
        Strategy::FastAppend => {
            let mut next = store.clone();
            fast_append(&mut next, changes.added.clone(), now)?;
            fast_patch(&mut next, &changes.edited, now)?;
            Ok(next)
        }
        Strategy::FastPatch => {
            let mut next = store.clone();
            fast_patch(&mut next, &changes.edited, now)?;
            Ok(next)
        }
    }
}

/// Rebuild the whole index from disk.
///
/// Last-modified timestamps carry over from the prior store where the slug
/// existed; every staged post then gets stamped with `now`.
fn full_recompute(
    changes: &ChangeSet,
    store: &MetadataStore,
    content_root: &Path,
    now: DateTime<Utc>,
) -> Result<MetadataStore, UpdateError> {
    let posts = scan::load_posts(content_root)?;

    let pairs = posts
        .into_iter()
        .map(|post| {
            let last_modified = store
                .posts
                .get(&post.slug)
                .map(|r| r.last_modified)
                .unwrap_or(now);
            (post, last_modified)
        })
        .collect();

    let mut next = MetadataStore::build(pairs);
    for slug in changes.staged_slugs() {
        if let Some(record) = next.posts.get_mut(slug) {
            record.last_modified = now;
        }
    }

    Ok(next)
}

/// Link new posts onto the current tail, in chain order among themselves.
fn fast_append(
    store: &mut MetadataStore,
    mut added: Vec<Post>,
    now: DateTime<Utc>,
) -> Result<(), UpdateError> {
    order::sort_posts(&mut added);

    let mut previous = store.tail().map(PostRecord::neighbor_ref);

    for post in added {
        let new_ref = NeighborRef::of(&post);

        if let Some(prev) = &previous {
            let tail = store
                .posts
                .get_mut(&prev.slug)
                .ok_or_else(|| UpdateError::MissingRecord(prev.slug.clone()))?;
            tail.next = Some(new_ref.clone());
        }

        store.posts.insert(
            post.slug.clone(),
            PostRecord {
                slug: post.slug,
                year: post.year,
                month: post.month,
                extension: post.extension,
                title: post.title,
                date: post.date,
                last_modified: now,
                previous: previous.clone(),
                next: None,
            },
        );

        previous = Some(new_ref);
    }

    Ok(())
}

/// Refresh edited posts in place without touching chain topology.
///
/// Bumps `last_modified`; a title change is propagated into the snapshots
/// held by both immediate neighbors and nowhere else.
fn fast_patch(
    store: &mut MetadataStore,
    edited: &[Post],
    now: DateTime<Utc>,
) -> Result<(), UpdateError> {
    for post in edited {
        let record = store
            .posts
            .get_mut(&post.slug)
            .ok_or_else(|| UpdateError::MissingRecord(post.slug.clone()))?;

        record.last_modified = now;

        if record.title == post.title {
            continue;
        }
        record.title = post.title.clone();

        let prev_slug = record.previous.as_ref().map(|n| n.slug.clone());
        let next_slug = record.next.as_ref().map(|n| n.slug.clone());

        if let Some(slug) = prev_slug {
            let neighbor = store
                .posts
                .get_mut(&slug)
                .ok_or_else(|| UpdateError::MissingRecord(slug.clone()))?;
            if let Some(snapshot) = &mut neighbor.next {
                snapshot.title = post.title.clone();
            }
        }
        if let Some(slug) = next_slug {
            let neighbor = store
                .posts
                .get_mut(&slug)
                .ok_or_else(|| UpdateError::MissingRecord(slug.clone()))?;
            if let Some(snapshot) = &mut neighbor.previous {
                snapshot.title = post.title.clone();
            }
        }
    }

    Ok(())
}
