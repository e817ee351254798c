//! Version tree management for lesson content history
//!
//! This module maintains the forest of content revisions per lesson.
//! Root revisions carry integer labels and branch children carry
//! `parent.minor` decimal labels, so the label of a revision is fully
//! derived from its position in the tree:
//!
//! ```text
//! lesson
//! ├── 1
//! ├── 2
//! │   ├── 2.1
//! │   └── 2.2
//! └── 3
//! ```
//!
//! ## Ordering caveat
//!
//! Labels are compared by parsing them as floats, so `"3"` orders as 3.0
//! and `"3.2"` as 3.2. Minor versions beyond a single digit order wrongly
//! (`.10` < `.2`). Stored labels may depend on this behavior, so it is kept
//! as-is rather than silently corrected.
//!
//! ## Concurrency
//!
//! Label computation is a read-then-write against the version store with no
//! lock around it; two concurrent creations for the same lesson or parent
//! can observe the same latest label and produce duplicates. This matches
//! the persisted data's historical behavior and is deliberately not
//! serialized here.

use crate::error::{QuireError, Result};
use crate::store::VersionStore;
use crate::types::{LessonId, Revision};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A revision paired with its direct children, for display
#[derive(Debug, Clone)]
pub struct RevisionNode {
    /// The revision at this node
    pub revision: Revision,
    /// Direct children, ascending by float-parsed version label
    pub children: Vec<Revision>,
}

/// Manager for the branching revision history of lessons
///
/// Thin coordination layer over a [`VersionStore`]; owns the version
/// numbering rules and the parent/child lookups.
pub struct VersionTree {
    store: Arc<dyn VersionStore>,
}

impl std::fmt::Debug for VersionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionTree").finish_non_exhaustive()
    }
}

impl VersionTree {
    /// Create a manager over the given store
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Compute the next version label for a lesson
    ///
    /// With no parent: one past the highest integer-parsed root label, or
    /// `"1"` for a lesson without history. With a parent: the parent's
    /// label plus an incrementing minor suffix (`"3"` → `"3.1"` → `"3.2"`).
    ///
    /// Fails with [`QuireError::ParentRevisionNotFound`] if `parent_id`
    /// names no revision of this lesson.
    pub fn next_version(&self, lesson: LessonId, parent_id: Option<&str>) -> Result<String> {
        match parent_id {
            None => {
                let roots = self.store.list_roots(lesson)?;
                let max_root = roots
                    .iter()
                    .filter_map(|r| r.version.parse::<f64>().ok())
                    .fold(None::<f64>, |max, v| {
                        Some(max.map_or(v, |m| m.max(v)))
                    });
                Ok(match max_root {
                    None => "1".to_string(),
                    Some(max) => (max as i64 + 1).to_string(),
                })
            }
            Some(parent_id) => {
                let parent = self.require_parent(lesson, parent_id)?;
                let children = self.store.list_children(parent_id)?;
                match children.last() {
                    None => Ok(format!("{}.1", parent.version)),
                    Some(latest) => match latest.version.rsplit_once('.') {
                        Some((_, minor)) => {
                            let minor: i64 = minor.parse().map_err(|_| {
                                QuireError::internal(format!(
                                    "malformed version label {:?} on revision {}",
                                    latest.version,
                                    latest.short_id()
                                ))
                            })?;
                            Ok(format!("{}.{}", parent.version, minor + 1))
                        }
                        // A dotless child label should not occur; branch
                        // below it rather than guessing a minor.
                        None => Ok(format!("{}.1", latest.version)),
                    },
                }
            }
        }
    }

    /// Create and persist a new revision of a lesson's content
    ///
    /// The version label is computed from tree position at call time; see
    /// the module docs for the race window on concurrent creation.
    #[instrument(skip(self, content), fields(lesson = %lesson))]
    pub fn create_revision(
        &self,
        lesson: LessonId,
        content: String,
        parent_id: Option<&str>,
    ) -> Result<Revision> {
        let version = self.next_version(lesson, parent_id)?;
        let revision = Revision::new(
            lesson,
            content,
            version,
            parent_id.map(str::to_string),
        );
        debug!(
            revision = revision.short_id(),
            version = %revision.version,
            "created revision"
        );
        self.store.insert(revision.clone())?;
        Ok(revision)
    }

    /// Fetch a revision together with its direct children
    pub fn get_with_children(&self, history_id: &str) -> Result<RevisionNode> {
        let revision = self
            .store
            .get(history_id)?
            .ok_or_else(|| QuireError::RevisionNotFound(history_id.to_string()))?;
        let children = self.store.list_children(history_id)?;
        Ok(RevisionNode { revision, children })
    }

    /// Fetch a revision belonging to a specific lesson
    ///
    /// Fails with [`QuireError::RevisionNotFound`] when the id is unknown
    /// or names a revision of another lesson.
    pub fn get_for_lesson(&self, lesson: LessonId, history_id: &str) -> Result<Revision> {
        match self.store.get(history_id)? {
            Some(revision) if revision.lesson_id == lesson => Ok(revision),
            _ => Err(QuireError::RevisionNotFound(history_id.to_string())),
        }
    }

    /// Overwrite the content blob of a stored revision
    pub fn update_revision_content(
        &self,
        lesson: LessonId,
        history_id: &str,
        content: String,
    ) -> Result<Revision> {
        // Scope the lookup to the lesson before touching anything.
        self.get_for_lesson(lesson, history_id)?;
        self.store.update_content(history_id, content)?;
        self.get_for_lesson(lesson, history_id)
    }

    /// Delete a revision; the store cascades to all descendants
    ///
    /// Returns the number of revisions removed.
    pub fn delete_revision(&self, history_id: &str) -> Result<usize> {
        let removed = self.store.delete(history_id)?;
        debug!(
            revision = &history_id[..8.min(history_id.len())],
            removed, "deleted revision"
        );
        Ok(removed)
    }

    /// List a lesson's root revisions, each paired with its direct children
    ///
    /// Roots are ordered ascending by float-parsed version label.
    pub fn list_roots(&self, lesson: LessonId) -> Result<Vec<RevisionNode>> {
        self.store
            .list_roots(lesson)?
            .into_iter()
            .map(|revision| {
                let children = self.store.list_children(&revision.history_id)?;
                Ok(RevisionNode { revision, children })
            })
            .collect()
    }

    fn require_parent(&self, lesson: LessonId, parent_id: &str) -> Result<Revision> {
        match self.store.get(parent_id)? {
            Some(parent) if parent.lesson_id == lesson => Ok(parent),
            _ => Err(QuireError::ParentRevisionNotFound(parent_id.to_string())),
        }
    }
}
