//! # Quire - Versioned, paginated lesson content
//!
//! A lesson-content engine for educational platforms: AI-suggested content
//! with a safe revert path, positional page reconciliation, and a branching
//! version history over each lesson's text.
//!
//! ## Overview
//!
//! Quire manages the text of a lesson as an ordered set of pages and lets a
//! host application:
//! - Generate AI content suggestions per notification, cached so repeated
//!   requests never trigger duplicate generation
//! - Accept edited content back onto the lesson's pages, updating them in
//!   place instead of recreating them
//! - Revert to the exact pre-AI content captured in a one-time snapshot
//! - Save and restore named versions in a branching tree (`1`, `2`, `1.1`,
//!   `1.2`, ...)
//! - Pre-generate pending suggestions from a background sweep thread
//!
//! ## Architecture
//!
//! The engine is built from a few cooperating pieces:
//!
//! - **Delimiter Splitter**: lesson text travels as a single blob with
//!   `<!-- delimiter -->` page markers; the splitter turns it back into
//!   page segments, with a revert mode that also recognizes the
//!   HTML-escaped marker form found in stored snapshots
//! - **Page Reconciler**: converges persisted pages onto a new sequence
//!   positionally, updating in place and never deleting on shrink, so page
//!   identities (and anything hanging off them) survive edits
//! - **Version Tree**: revisions are identified by UUID, labeled `N` or
//!   `N.M`, hashed with SHA-256 for integrity checking, and ordered by
//!   float-parsing their labels
//! - **Suggestion Lifecycle**: per `(lesson, notification)` pair, one
//!   suggestion record caches generated insights, content and delimiter
//!   placement, plus the prior-content snapshot revert lands on
//! - **Background Sweep**: a single daemon thread polls the notification
//!   feed and pre-generates content, guarded by an atomic flag so it can
//!   never double-start
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quire::{Quire, QuireBuilder};
//! use quire::generator::ContentGenerator;
//! use quire::types::{LessonId, NotificationId};
//! use std::sync::Arc;
//! # use quire::error::Result;
//! # struct MyModel;
//! # impl ContentGenerator for MyModel {
//! #     fn generate(&self, _s: &str, _u: &str) -> Result<String> { Ok(String::new()) }
//! # }
//!
//! # fn main() -> Result<()> {
//! let quire = QuireBuilder::new()
//!     .generator(Arc::new(MyModel))
//!     .build()?;
//!
//! // Generate a suggestion for a notification (cached on repeat calls)
//! let suggestion = quire.generate_content(LessonId(1), NotificationId(1))?;
//!
//! // Accept the (possibly further edited) content onto the lesson's pages
//! if let Some(content) = &suggestion.proposed_content {
//!     quire.accept_content(LessonId(1), content)?;
//! }
//!
//! // Changed your mind: land back on the pre-AI snapshot
//! quire.revert_to_original(LessonId(1))?;
//!
//! // Keep a named version around and restore it later
//! let revision = quire.save_revision(LessonId(1), None)?;
//! quire.restore_from_version(LessonId(1), &revision.history_id)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Pages and the delimiter
//!
//! Persisted page order is ascending page id and is authoritative; content
//! never implies order. When pages travel as one blob they are joined with
//! the literal marker `<!-- delimiter -->`. Snapshots stored through rich
//! text pipelines may carry the HTML-escaped form instead, which is why
//! revert-mode splitting recognizes both.
//!
//! ### Reconciliation
//!
//! Accepting content reconciles destructively: positions present on both
//! sides are overwritten in place, excess new positions become new pages,
//! empty trailing segments are skipped, and placeholder-only pages are
//! swept lesson-wide. Reverting reconciles non-destructively: every
//! snapshot segment is recreated, empty ones included, and nothing is
//! deleted.
//!
//! ### Version labels
//!
//! Roots are numbered `1`, `2`, `3`, ...; branch children of a root take
//! `N.1`, `N.2`, .... Ordering parses labels as floats, which means `N.10`
//! sorts like `N.1` — a deliberate fidelity to the label scheme, documented
//! on [`types::Revision::version_ordinal`].
//!
//! ## Error Handling
//!
//! All operations return `Result<T, QuireError>`. Not-found conditions,
//! invalid input, generation transport failures and persistence failures
//! are separate variants; [`error::QuireError::is_retryable`] marks the
//! generation failures a caller may simply re-invoke.
//!
//! ## Module Organization
//!
//! - [`quire`]: The main [`Quire`] facade and its builder
//! - [`suggestion`]: Suggestion lifecycle orchestration
//! - [`history`]: Version tree management
//! - [`reconcile`]: Positional page reconciliation
//! - [`delimiter`]: Page marker splitting and joining
//! - [`sweeper`]: Background notification sweep
//! - [`store`]: Persistence traits and in-memory implementations
//! - [`generator`]: The content-generation collaborator trait
//! - [`prompts`]: Prompt templates for the collaborator
//! - [`types`]: Common types and data structures
//! - [`error`]: Error types and handling

// Public API modules
pub mod delimiter;
pub mod error;
pub mod generator;
pub mod history;
pub mod prompts;
pub mod quire;
pub mod reconcile;
pub mod store;
pub mod suggestion;
pub mod sweeper;
pub mod types;

// Internal modules (not part of public API)
mod locks;

// Re-export main types for convenience
pub use delimiter::{join_pages, split_pages, SplitContent, ESCAPED_PAGE_DELIMITER, PAGE_DELIMITER};
pub use error::{QuireError, Result};
pub use generator::ContentGenerator;
pub use history::{RevisionNode, VersionTree};
pub use quire::{Quire, QuireBuilder};
pub use reconcile::{purge_placeholder_pages, reconcile};
pub use store::{NotificationFeed, PageStore, SuggestionStore, VersionStore};
pub use suggestion::{SuggestionService, SuggestionState};
pub use sweeper::Sweeper;
pub use types::*;
