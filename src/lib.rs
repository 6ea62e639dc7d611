//! # postindex
//!
//! Chronological metadata index for a markdown weblog. Your filesystem is
//! the data source: posts live under `YEAR/MONTH` directories, their
//! frontmatter supplies titles and dates, and the index links every post to
//! its predecessor and successor so the rendered site can offer sequential
//! navigation and "last edited" timestamps without touching git at request
//! time.
//!
//! # Architecture: One Index, Three Tools
//!
//! Everything revolves around a single committed JSON document mapping each
//! post's slug to its computed metadata. Three batch tools maintain it:
//!
//! ```text
//! 1. generate   content/ + git history  →  post-index.json   (full rebuild)
//! 2. update     staged changes + index  →  post-index.json   (incremental)
//! 3. validate   content/ vs index       →  pass / fail       (read-only)
//! ```
//!
//! The split exists because the three tools run in three different places:
//! `generate` is a one-off (first setup, disaster recovery), `update` runs
//! on every commit as a pre-commit hook and must be fast, and `validate`
//! runs in CI where correctness matters and cost doesn't.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | walks the content tree, parses posts, enforces slug uniqueness |
//! | [`frontmatter`] | YAML metadata block parsing and effective-date resolution |
//! | [`order`] | the ordering engine: date sort + prev/next chain derivation |
//! | [`store`] | the persisted index: atomic save, load, full build |
//! | [`update`] | staged-change classification and the three update strategies |
//! | [`validate`] | ground-truth recompute and exhaustive discrepancy reporting |
//! | [`git`] | subprocess wrappers: history timestamps, staged files, re-staging |
//!
//! # Design Decisions
//!
//! ## Denormalized Neighbor Snapshots
//!
//! Each record stores a copy of its neighbors' identifying fields (slug,
//! year, month, title) rather than just a slug. The rendered site reads one
//! record and has everything it needs for both navigation links. The price
//! is an invalidation rule: editing a title must patch the snapshots held
//! by both neighbors, which the updater's fast-patch path owns.
//!
//! ## Deterministic Ordering
//!
//! Posts order by `(date, slug)`. Dates have day precision and collide;
//! relying on directory enumeration order to break ties would make the
//! index depend on which filesystem built it. The slug tiebreak (unique,
//! enforced at scan time) makes every rebuild reproducible anywhere.
//!
//! ## Fast Paths Over Clever Paths
//!
//! The updater optimizes exactly two shapes — appending posts dated after
//! the tail, and title/content edits — because those are what real commits
//! look like. Everything else (deletions, date changes, backdated inserts)
//! takes the always-correct full recompute. An interior insertion splice
//! would save milliseconds on a path taken a few times a year and carry its
//! own invariant-breaking bugs forever.
//!
//! ## Git as the Timestamp Authority
//!
//! "Last edited" timestamps come from commit history, not filesystem
//! mtimes — mtimes are destroyed by every fresh clone. The consequence is
//! that full rebuilds refuse to run on shallow clones, where history is
//! truncated and timestamps would be silently wrong.

pub mod frontmatter;
pub mod git;
pub mod order;
pub mod scan;
pub mod store;
pub mod update;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
