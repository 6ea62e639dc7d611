//! Content scanning: discover post files and load them as posts.
//!
//! Posts live in a fixed two-level directory layout:
//!
//! ```text
//! posts/                      # Content root
//! ├── 2020/
//! │   ├── 01/
//! │   │   ├── first-post.md
//! │   │   └── second-post.mdx
//! │   └── 03/
//! │       └── spring-notes.md
//! └── 2021/
//!     └── 11/
//!         └── a-year-later.md
//! ```
//!
//! The `YEAR/MONTH` segments double as the fallback publication date for
//! posts whose frontmatter carries none. Only regular `.md`/`.mdx` files at
//! exactly that depth are posts; anything else (stray files, hidden files,
//! directories that aren't zero-padded numbers) is ignored.
//!
//! ## Determinism
//!
//! Traversal visits entries in lexical filename order, so the scanner always
//! yields posts in `(year, month, slug)` order regardless of filesystem
//! enumeration order. The ordering engine depends on this: a rebuild on two
//! machines must produce identical output for identical content.
//!
//! ## Slug uniqueness
//!
//! The index is keyed by slug alone, while content paths are keyed by
//! `(year, month, slug)`. Two posts sharing a slug in different months would
//! silently overwrite each other in the index, so the scanner rejects
//! duplicates up front, naming both files.

use crate::frontmatter::{self, FrontmatterError};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("content root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("duplicate slug {slug:?}: {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("{path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
}

/// Content file extension, which selects the downstream rendering pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Md,
    Mdx,
}

impl Extension {
    fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext {
            "md" => Some(Extension::Md),
            "mdx" => Some(Extension::Mdx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Md => "md",
            Extension::Mdx => "mdx",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered post file, before its content is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSource {
    pub slug: String,
    pub year: String,
    pub month: String,
    pub extension: Extension,
    /// Path as given, content root included. Relative when the root is,
    /// which keeps it usable as a git pathspec from the repository root.
    pub path: PathBuf,
}

/// A fully loaded post: identity plus frontmatter-derived fields.
///
/// This is the ground-truth value the ordering engine, updater, and
/// validator all consume. Body content is not carried; the index never
/// needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub slug: String,
    pub year: String,
    pub month: String,
    pub extension: Extension,
    pub title: String,
    pub date: DateTime<Utc>,
}

impl Post {
    /// Path of this post's content file under `root`.
    pub fn rel_path(&self, root: &Path) -> PathBuf {
        root.join(&self.year)
            .join(&self.month)
            .join(format!("{}.{}", self.slug, self.extension))
    }
}

/// Discover all post files under `root` in deterministic order.
///
/// Fails if the root doesn't exist or two files share a slug.
pub fn scan_sources(root: &Path) -> Result<Vec<PostSource>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut sources = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(source) = post_source_from_path(entry.path(), root) else {
            continue;
        };
        if let Some(first) = seen.get(&source.slug) {
            return Err(ScanError::DuplicateSlug {
                slug: source.slug,
                first: first.clone(),
                second: source.path,
            });
        }
        seen.insert(source.slug.clone(), source.path.clone());
        sources.push(source);
    }

    Ok(sources)
}

/// Interpret a path as a post file under `content_root`.
///
/// Returns `None` unless the path is exactly `root/YEAR/MONTH/SLUG.{md,mdx}`
/// with a four-digit year and two-digit month. This is the single place the
/// path convention is encoded; the incremental updater uses it to filter
/// staged paths the same way the scanner filters walked ones.
pub fn post_source_from_path(path: &Path, content_root: &Path) -> Option<PostSource> {
    let rel = path.strip_prefix(content_root).ok()?;
    let mut components = rel.components().map(|c| c.as_os_str().to_str());
    let (year, month, file) = (components.next()??, components.next()??, components.next()??);
    if components.next().is_some() {
        return None;
    }
    if !is_digits(year, 4) || !is_digits(month, 2) {
        return None;
    }
    if file.starts_with('.') {
        return None;
    }
    let extension = Extension::from_file_name(file)?;
    let slug = Path::new(file).file_stem()?.to_str()?.to_string();

    Some(PostSource {
        slug,
        year: year.to_string(),
        month: month.to_string(),
        extension,
        path: path.to_path_buf(),
    })
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Read and parse a single post file.
pub fn load_post(source: &PostSource) -> Result<Post, ScanError> {
    let content = std::fs::read_to_string(&source.path)?;

    let (fm, _body) = frontmatter::parse(&content).map_err(|e| ScanError::Frontmatter {
        path: source.path.clone(),
        source: e,
    })?;

    let date = frontmatter::effective_date(fm.date.as_deref(), &source.year, &source.month)
        .map_err(|e| ScanError::Frontmatter {
            path: source.path.clone(),
            source: e,
        })?;

    let title = fm
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| source.slug.clone());

    Ok(Post {
        slug: source.slug.clone(),
        year: source.year.clone(),
        month: source.month.clone(),
        extension: source.extension,
        title,
        date,
    })
}

/// Scan the content root and load every post.
///
/// File reads and frontmatter parses run in parallel; results come back in
/// scan order, so the ordering engine sees a deterministic input sequence.
pub fn load_posts(root: &Path) -> Result<Vec<Post>, ScanError> {
    let sources = scan_sources(root)?;
    sources.par_iter().map(load_post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_post;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // scan_sources() tests
    // =========================================================================

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan_sources(&tmp.path().join("nonexistent"));
        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[test]
    fn finds_md_and_mdx_files() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "alpha", "title: Alpha\n", "");
        fs::create_dir_all(tmp.path().join("2020/02")).unwrap();
        fs::write(tmp.path().join("2020/02/beta.mdx"), "# Beta\n").unwrap();

        let sources = scan_sources(tmp.path()).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].slug, "alpha");
        assert_eq!(sources[0].extension, Extension::Md);
        assert_eq!(sources[1].slug, "beta");
        assert_eq!(sources[1].extension, Extension::Mdx);
    }

    #[test]
    fn skips_files_with_other_extensions() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "post", "", "");
        fs::write(tmp.path().join("2020/01/draft.txt"), "notes").unwrap();
        fs::write(tmp.path().join("2020/01/photo.png"), "bytes").unwrap();

        let sources = scan_sources(tmp.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].slug, "post");
    }

    #[test]
    fn skips_files_at_wrong_depth() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "real", "", "");
        fs::write(tmp.path().join("README.md"), "# readme").unwrap();
        fs::write(tmp.path().join("2020/stray.md"), "stray").unwrap();
        fs::create_dir_all(tmp.path().join("2020/01/deep")).unwrap();
        fs::write(tmp.path().join("2020/01/deep/nested.md"), "nested").unwrap();

        let sources = scan_sources(tmp.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].slug, "real");
    }

    #[test]
    fn skips_non_numeric_year_and_month_directories() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "real", "", "");
        fs::create_dir_all(tmp.path().join("drafts/01")).unwrap();
        fs::write(tmp.path().join("drafts/01/wip.md"), "wip").unwrap();
        fs::create_dir_all(tmp.path().join("2021/spring")).unwrap();
        fs::write(tmp.path().join("2021/spring/odd.md"), "odd").unwrap();

        let sources = scan_sources(tmp.path()).unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn skips_hidden_files() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "real", "", "");
        fs::write(tmp.path().join("2020/01/.swap.md"), "swap").unwrap();

        let sources = scan_sources(tmp.path()).unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn traversal_order_is_lexical() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2021", "11", "zulu", "", "");
        write_post(tmp.path(), "2020", "03", "mike", "", "");
        write_post(tmp.path(), "2020", "01", "bravo", "", "");
        write_post(tmp.path(), "2020", "01", "alpha", "", "");

        let slugs: Vec<String> = scan_sources(tmp.path())
            .unwrap()
            .into_iter()
            .map(|s| s.slug)
            .collect();
        assert_eq!(slugs, vec!["alpha", "bravo", "mike", "zulu"]);
    }

    #[test]
    fn duplicate_slug_across_months_is_error() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "hello", "", "");
        write_post(tmp.path(), "2020", "02", "hello", "", "");

        let result = scan_sources(tmp.path());
        assert!(matches!(
            result,
            Err(ScanError::DuplicateSlug { slug, .. }) if slug == "hello"
        ));
    }

    // =========================================================================
    // post_source_from_path() tests
    // =========================================================================

    #[test]
    fn path_classification_accepts_post_paths() {
        let src =
            post_source_from_path(Path::new("posts/2020/01/hello.md"), Path::new("posts")).unwrap();
        assert_eq!(src.slug, "hello");
        assert_eq!(src.year, "2020");
        assert_eq!(src.month, "01");
        assert_eq!(src.extension, Extension::Md);
        assert_eq!(src.path, Path::new("posts/2020/01/hello.md"));
    }

    #[test]
    fn path_classification_rejects_foreign_paths() {
        let root = Path::new("posts");
        assert!(post_source_from_path(Path::new("src/main.rs"), root).is_none());
        assert!(post_source_from_path(Path::new("posts/2020/01/img.png"), root).is_none());
        assert!(post_source_from_path(Path::new("posts/2020/hello.md"), root).is_none());
        assert!(post_source_from_path(Path::new("posts/2020/01/a/hello.md"), root).is_none());
        assert!(post_source_from_path(Path::new("posts/20/01/hello.md"), root).is_none());
        assert!(post_source_from_path(Path::new("posts/2020/jan/hello.md"), root).is_none());
    }

    // =========================================================================
    // load_posts() tests
    // =========================================================================

    #[test]
    fn load_posts_parses_title_and_date() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "2020",
            "01",
            "hello",
            "title: Hello World\ndate: 2020-01-15\n",
            "Body.\n",
        );

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hello World");
        assert_eq!(posts[0].date.to_rfc3339(), "2020-01-15T00:00:00+00:00");
    }

    #[test]
    fn load_posts_title_falls_back_to_slug() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "untitled-draft", "", "Body.\n");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts[0].title, "untitled-draft");
    }

    #[test]
    fn load_posts_date_falls_back_to_year_month() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2021", "09", "no-date", "title: T\n", "");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts[0].date.to_rfc3339(), "2021-09-01T00:00:00+00:00");
    }

    #[test]
    fn load_posts_invalid_date_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "bad", "date: yesterday\n", "");

        let result = load_posts(tmp.path());
        assert!(matches!(result, Err(ScanError::Frontmatter { .. })));
    }

    #[test]
    fn rel_path_round_trips_through_classification() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2020", "01", "hello", "", "");

        let posts = load_posts(tmp.path()).unwrap();
        let path = posts[0].rel_path(tmp.path());
        let src = post_source_from_path(&path, tmp.path()).unwrap();
        assert_eq!(src.slug, "hello");
        assert!(path.exists());
    }
}
