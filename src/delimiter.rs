//! Page delimiter constants and the content splitter
//!
//! Lesson content is stored and edited as a single HTML blob in which page
//! boundaries are marked with a literal comment token. This module owns that
//! token as a shared protocol constant and provides the pure splitting
//! function that turns a blob into an ordered page sequence.
//!
//! ## Trimming boundary
//!
//! The splitter returns raw segments exactly as they appear between
//! delimiters. Trimming of leading/trailing whitespace is the reconciler's
//! responsibility, not the splitter's; keeping the boundary here avoids
//! double-trimming bugs.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// The literal page delimiter token
///
/// Must be identical across splitting, reconciliation and storage; any
/// mismatch silently breaks page-count alignment.
pub const PAGE_DELIMITER: &str = "<!-- delimiter -->";

/// HTML-escaped form of [`PAGE_DELIMITER`]
///
/// Historical snapshots were captured from already-delimited HTML, so the
/// marker can appear entity-encoded inside stored content. Revert-mode
/// splitting treats this form identically to the live marker so that
/// splitting a snapshot reproduces the same page count as splitting live
/// content would.
pub const ESCAPED_PAGE_DELIMITER: &str = "&lt;!-- delimiter --&gt;";

/// Result of splitting a content blob into pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitContent {
    /// The input text, unchanged
    pub original: String,
    /// Ordered raw page segments (untrimmed)
    pub pages: Vec<String>,
}

impl SplitContent {
    /// Number of pages produced by the split
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Split a content blob into an ordered page sequence
///
/// Delimiter occurrences are pure separators: `n` markers yield exactly
/// `n + 1` segments, and consecutive markers yield empty-string pages. With
/// zero markers the whole text is returned as a single page.
///
/// In revert mode the escaped form of the marker is recognized as a
/// separator too (see [`ESCAPED_PAGE_DELIMITER`]).
///
/// Deterministic and side-effect free; safe to call any number of times on
/// the same input.
pub fn split_pages(text: &str, revert_mode: bool) -> SplitContent {
    let normalized;
    let source = if revert_mode && text.contains(ESCAPED_PAGE_DELIMITER) {
        normalized = text.replace(ESCAPED_PAGE_DELIMITER, PAGE_DELIMITER);
        normalized.as_str()
    } else {
        text
    };

    let pages: Vec<String> = source.split(PAGE_DELIMITER).map(str::to_string).collect();

    trace!(
        page_count = pages.len(),
        revert_mode,
        "split content into pages"
    );

    SplitContent {
        original: text.to_string(),
        pages,
    }
}

/// Join a page sequence back into a single blob
///
/// Inverse of [`split_pages`] up to trimming; used when capturing the full
/// content form of a paginated lesson.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(PAGE_DELIMITER)
}
