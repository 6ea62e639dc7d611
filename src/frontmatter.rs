//! Frontmatter parsing and effective-date resolution.
//!
//! Every post file may begin with a YAML metadata block delimited by `---`
//! lines:
//!
//! ```text
//! ---
//! title: A Week in Kyoto
//! date: 2023-04-17
//! shortname: kyoto
//! ---
//!
//! Body text...
//! ```
//!
//! The block is optional; a file without one has empty frontmatter and the
//! entire content is body. Unknown keys are ignored so posts can carry
//! renderer-specific metadata without breaking the index.
//!
//! ## Effective dates
//!
//! The date used for chronological ordering is resolved in two steps:
//!
//! 1. If the frontmatter supplies `date`, it is parsed as `YYYY-MM-DD` and
//!    interpreted as midnight UTC of that calendar day.
//! 2. Otherwise the post falls back to midnight UTC of the first day of its
//!    `year/month` directory.
//!
//! An invalid calendar date from either source is an error, not a warning —
//! a post that cannot be ordered breaks the whole build.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("unterminated frontmatter block (missing closing ---)")]
    Unterminated,
    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },
}

/// Parsed metadata block. Only the keys the index cares about; everything
/// else in the block is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    /// Post title. Callers fall back to the slug when absent or empty.
    #[serde(default)]
    pub title: Option<String>,
    /// Publication date as `YYYY-MM-DD`. Quoted or plain YAML scalar.
    #[serde(default)]
    pub date: Option<String>,
    /// Short identifier for the short-URL redirect page. Parsed so the key
    /// is recognized, but not persisted in the index.
    #[serde(default)]
    pub shortname: Option<String>,
}

const DELIMITER: &str = "---";

/// Split file content into its frontmatter block and body.
///
/// The block must start on the very first line. A file that doesn't open
/// with `---` has no frontmatter; a file that opens one and never closes it
/// is malformed.
pub fn parse(content: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let Some(rest) = strip_delimiter_line(content) else {
        return Ok((Frontmatter::default(), content));
    };

    // Find the closing delimiter on its own line.
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let frontmatter = if block.trim().is_empty() {
                Frontmatter::default()
            } else {
                serde_yaml::from_str(block)?
            };
            return Ok((frontmatter, body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated)
}

/// If `content` starts with a `---` line, return everything after it.
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let first_line_end = content.find('\n')?;
    if content[..first_line_end].trim_end() == DELIMITER {
        Some(&content[first_line_end + 1..])
    } else {
        None
    }
}

/// Resolve the date used for chronological ordering.
///
/// `date` is the frontmatter value if present; `year`/`month` are the
/// zero-padded path segments used as the fallback (`YEAR-MONTH-01`).
pub fn effective_date(
    date: Option<&str>,
    year: &str,
    month: &str,
) -> Result<DateTime<Utc>, FrontmatterError> {
    let raw = match date {
        Some(d) => d.trim().to_string(),
        None => format!("{year}-{month}-01"),
    };

    let day = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| FrontmatterError::InvalidDate { value: raw })?;

    Ok(day.and_time(NaiveTime::MIN).and_utc())
}
