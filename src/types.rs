//! Core data types used throughout the quire library
//!
//! This module contains the fundamental data structures that are shared across
//! modules: identifier newtypes, the paginated [`Page`] unit, the [`Revision`]
//! history snapshot, the AI [`Suggestion`] record, reconciliation policy and
//! reporting types, and the runtime configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Identifier of a lesson
///
/// Lessons themselves live outside this crate; the id is the key every
/// store call is scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonId(pub u64);

/// Identifier of a notification in the external notification subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

/// Identifier of a persisted page
///
/// Assigned by the page store at creation time and strictly increasing per
/// store. Ascending `PageId` order is the authoritative page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One paginated unit of a lesson's content
///
/// Pages are created and mutated only by the reconciler. A lesson's pages
/// are always read back in ascending id order; the reconciler never
/// re-sorts them by content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Stable identity and ordering key
    pub id: PageId,
    /// Lesson this page belongs to
    pub lesson_id: LessonId,
    /// Page text; may equal the bare placeholder marker
    pub text: String,
}

/// One snapshot in a lesson's branching edit history
///
/// A revision stores the full unsplit content blob together with its
/// position in the version tree. Root revisions carry integer labels
/// (`"1"`, `"2"`, ...); branch children carry `parent.minor` labels
/// (`"3.1"`, `"3.2"`, ...).
///
/// # Integrity
///
/// Each revision carries a SHA-256 state hash over its identifying fields
/// and content; [`Revision::verify_integrity`] recomputes it to detect
/// tampering after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Unique identifier for this revision (UUID v4)
    pub history_id: String,
    /// Lesson this revision belongs to
    pub lesson_id: LessonId,
    /// Full unsplit content blob; may embed placeholder markers
    pub content: String,
    /// Version label derived from tree position (`"N"` or `"N.M"`)
    pub version: String,
    /// Parent revision id (None for a root revision)
    pub parent_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// SHA-256 hash of the revision state
    pub state_hash: String,
}

impl Revision {
    /// Create a new revision with a fresh id and computed state hash
    pub fn new(
        lesson_id: LessonId,
        content: String,
        version: String,
        parent_id: Option<String>,
    ) -> Self {
        let mut revision = Self {
            history_id: uuid::Uuid::new_v4().to_string(),
            lesson_id,
            content,
            version,
            parent_id,
            created_at: Utc::now(),
            state_hash: String::new(),
        };
        revision.state_hash = revision.compute_state_hash();
        revision
    }

    /// Compute the state hash from all revision components
    ///
    /// The hash covers the id, parent reference, lesson, version label,
    /// timestamp (RFC3339) and content.
    pub fn compute_state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.history_id);
        hasher.update(self.parent_id.as_deref().unwrap_or(""));
        hasher.update(self.lesson_id.0.to_be_bytes());
        hasher.update(&self.version);
        hasher.update(self.created_at.to_rfc3339());
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }

    /// Verify that the stored state hash matches the recomputed one
    pub fn verify_integrity(&self) -> bool {
        self.compute_state_hash() == self.state_hash
    }

    /// Whether this revision is a root of the version forest
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Version label parsed as a float for ordering
    ///
    /// Root `"3"` parses as 3.0 and child `"3.2"` as 3.2. Minor versions
    /// beyond single digits sort incorrectly (`.10` < `.2`); this is a
    /// known limitation carried over deliberately, since stored labels may
    /// depend on it.
    pub fn version_ordinal(&self) -> f64 {
        self.version.parse::<f64>().unwrap_or(0.0)
    }

    /// Get a short id for display (first 8 characters)
    pub fn short_id(&self) -> &str {
        &self.history_id[..8.min(self.history_id.len())]
    }

    /// Format revision for display
    pub fn display_format(&self) -> String {
        format!(
            "[{}] v{} - {} - {} bytes",
            self.short_id(),
            self.version,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.content.len(),
        )
    }
}

/// A pending or accepted AI-proposed revision for one lesson/notification pair
///
/// There is logically one suggestion per `(lesson, notification)` pair; the
/// orchestrator always looks up-or-creates against that compound key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Lesson the suggestion targets
    pub lesson_id: LessonId,
    /// Notification that prompted the suggestion
    pub notification_id: NotificationId,
    /// AI-proposed replacement content (None until generation completes)
    pub proposed_content: Option<String>,
    /// Page-collection text captured once at first generation; never
    /// overwritten afterwards, so the true "before AI" baseline survives
    /// repeated edits
    pub prior_content_snapshot: Option<String>,
    /// AI-generated insight text, independent of the proposed content
    pub insights_text: Option<String>,
    /// Cached result of delimiter re-insertion into edited content
    pub delimited_content: Option<String>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Suggestion {
    /// Create an empty suggestion for a lesson/notification pair
    pub fn new(lesson_id: LessonId, notification_id: NotificationId) -> Self {
        Self {
            lesson_id,
            notification_id,
            proposed_content: None,
            prior_content_snapshot: None,
            insights_text: None,
            delimited_content: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether generated content has been persisted for this suggestion
    pub fn is_ready(&self) -> bool {
        self.proposed_content.is_some()
    }
}

/// Reference to a notification as seen through the [`NotificationFeed`]
///
/// [`NotificationFeed`]: crate::store::NotificationFeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationRef {
    /// Lesson the notification is attached to
    pub lesson_id: LessonId,
    /// Notification identity
    pub notification_id: NotificationId,
}

/// Deletion policy applied by the page reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPolicy {
    /// Skip creating empty trailing pages and delete any page whose trimmed
    /// text equals the bare placeholder marker (lesson-wide)
    DestructiveCleanup,
    /// Create every new page, even empty ones, and never delete; used
    /// where structural fidelity with a historical snapshot matters
    NoDelete,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Pages overwritten in place
    pub pages_updated: usize,
    /// Pages created for excess new content
    pub pages_created: usize,
    /// Placeholder-only pages deleted by the cleanup scan
    pub pages_deleted: usize,
}

/// Runtime configuration for a [`Quire`] instance
///
/// [`Quire`]: crate::quire::Quire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuireConfig {
    /// Sleep between sweep cycles while a backlog remains
    pub sweep_busy_delay: Duration,
    /// Sleep between sweep cycles when no work was found
    pub sweep_idle_delay: Duration,
    /// Library version that created this configuration
    pub version: String,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            sweep_busy_delay: Duration::from_secs(1),
            sweep_idle_delay: Duration::from_secs(15),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
