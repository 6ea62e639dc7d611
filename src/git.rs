//! Git integration for the metadata pipeline.
//!
//! Three concerns, all via the `git` binary (no libgit2 — the tools run in
//! hook/CI contexts where git is present by definition):
//!
//! - last-modified timestamps for the full rebuild (`git log -1`), with a
//!   shallow-clone guard up front since a truncated history would silently
//!   produce wrong timestamps;
//! - the staged change-set that drives the incremental updater
//!   (`git diff --cached`);
//! - re-staging the index file after an update so a pre-commit hook's
//!   changes land in the same commit.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },
    #[error("no git history for {0} (is it committed?)")]
    NoHistory(PathBuf),
    #[error("unparseable commit timestamp {raw:?} for {path}")]
    Timestamp { path: PathBuf, raw: String },
}

/// Staged (pending-commit) paths, split by change kind.
#[derive(Debug, Default)]
pub struct StagedChanges {
    /// Added or modified paths (`--diff-filter=AM`).
    pub changed: Vec<PathBuf>,
    /// Deleted paths (`--diff-filter=D`).
    pub deleted: Vec<PathBuf>,
}

/// Run a git subcommand in `repo`, returning trimmed stdout.
fn run(repo: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").arg("-C").arg(repo).args(args).output()?;

    if !output.status.success() {
        return Err(GitError::Command {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether the repository is a shallow clone.
///
/// Last-modified timestamps come from commit history; a shallow clone would
/// attribute every old post to the clone boundary, so the full-rebuild tool
/// refuses to run on one.
pub fn is_shallow_repository(repo: &Path) -> Result<bool, GitError> {
    Ok(run(repo, &["rev-parse", "--is-shallow-repository"])? == "true")
}

/// Timestamp of the last commit touching `file`.
///
/// Fails for files with no history — an uncommitted post has no
/// authoritative last-modified time, and guessing one would poison the
/// index.
pub fn last_modified(repo: &Path, file: &Path) -> Result<DateTime<Utc>, GitError> {
    let pathspec = file.to_string_lossy();
    let raw = run(repo, &["log", "-1", "--format=%cI", "--", &pathspec])?;

    if raw.is_empty() {
        return Err(GitError::NoHistory(file.to_path_buf()));
    }

    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| GitError::Timestamp {
            path: file.to_path_buf(),
            raw,
        })
}

/// List staged changes, split into added/modified and deleted paths.
pub fn staged_changes(repo: &Path) -> Result<StagedChanges, GitError> {
    let list = |filter: &str| -> Result<Vec<PathBuf>, GitError> {
        let filter_arg = format!("--diff-filter={filter}");
        let out = run(
            repo,
            &["diff", "--cached", "--name-only", &filter_arg],
        )?;
        Ok(out.lines().map(PathBuf::from).collect())
    };

    Ok(StagedChanges {
        changed: list("AM")?,
        deleted: list("D")?,
    })
}

/// Stage a file for commit.
pub fn stage(repo: &Path, file: &Path) -> Result<(), GitError> {
    let pathspec = file.to_string_lossy();
    run(repo, &["add", "--", &pathspec]).map(|_| ())
}
