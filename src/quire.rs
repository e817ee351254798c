//! Main Quire implementation
//!
//! This module contains the [`Quire`] facade, the single entry point for
//! hosts embedding the lesson-content engine: suggestion lifecycle, page
//! reconciliation, version history and the background notification sweep
//! behind one handle. Construction goes through [`QuireBuilder`], which
//! defaults every store to its in-memory implementation and only insists
//! on one thing: a [`ContentGenerator`] must be supplied, because the crate
//! cannot invent one.

use crate::error::{QuireError, Result};
use crate::generator::ContentGenerator;
use crate::history::{RevisionNode, VersionTree};
use crate::locks::LessonLocks;
use crate::store::{
    MemoryNotificationFeed, MemoryPageStore, MemorySuggestionStore, MemoryVersionStore,
    NotificationFeed, PageStore, SuggestionStore, VersionStore,
};
use crate::suggestion::{SuggestionService, SuggestionState};
use crate::sweeper::Sweeper;
use crate::types::{
    LessonId, NotificationId, Page, QuireConfig, ReconcileReport, Revision, Suggestion,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Lesson-content engine handle
///
/// Cheap to share behind an `Arc`; all mutable state lives in the stores.
/// Dropping the last handle stops the background sweep.
///
/// # Examples
///
/// ```rust,no_run
/// use quire::{Quire, QuireBuilder};
/// use quire::generator::ContentGenerator;
/// use quire::types::{LessonId, NotificationId};
/// # use quire::error::Result;
/// # struct MyModel;
/// # impl ContentGenerator for MyModel {
/// #     fn generate(&self, _s: &str, _u: &str) -> Result<String> { Ok(String::new()) }
/// # }
///
/// # fn main() -> Result<()> {
/// let quire = QuireBuilder::new()
///     .generator(std::sync::Arc::new(MyModel))
///     .build()?;
///
/// let suggestion = quire.generate_content(LessonId(1), NotificationId(1))?;
/// quire.accept_content(LessonId(1), suggestion.proposed_content.as_deref().unwrap_or(""))?;
/// # Ok(())
/// # }
/// ```
pub struct Quire {
    pages: Arc<dyn PageStore>,
    service: Arc<SuggestionService>,
    tree: VersionTree,
    sweeper: Sweeper,
}

impl std::fmt::Debug for Quire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quire")
            .field("sweep_running", &self.sweeper.is_running())
            .finish_non_exhaustive()
    }
}

impl Quire {
    /// Start building a `Quire` instance
    pub fn builder() -> QuireBuilder {
        QuireBuilder::new()
    }

    // ---- suggestion lifecycle ----

    /// Generate (or return cached) insight text for a notification
    pub fn generate_insights(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Suggestion> {
        self.service.generate_insights(lesson, notification)
    }

    /// Generate (or return cached) proposed lesson content
    pub fn generate_content(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Suggestion> {
        self.service.generate_content(lesson, notification)
    }

    /// Re-insert page delimiters into manually edited content
    pub fn insert_delimiters(
        &self,
        lesson: LessonId,
        notification: NotificationId,
        original_content: &str,
        edited_content: &str,
    ) -> Result<String> {
        self.service
            .insert_delimiters(lesson, notification, original_content, edited_content)
    }

    /// Cached delimiter-insertion result, if any
    pub fn delimited_content(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Option<String>> {
        self.service.delimited_content(lesson, notification)
    }

    /// Lifecycle state of a suggestion
    pub fn content_state(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<SuggestionState> {
        self.service.content_state(lesson, notification)
    }

    /// Accept edited content onto a lesson's pages (destructive reconcile)
    pub fn accept_content(&self, lesson: LessonId, new_content: &str) -> Result<ReconcileReport> {
        self.service.accept_content(lesson, new_content)
    }

    /// Revert a lesson's pages to the prior-content snapshot
    pub fn revert_to_original(&self, lesson: LessonId) -> Result<ReconcileReport> {
        self.service.revert_to_original(lesson)
    }

    /// Remove a lesson's suggestion record(s)
    pub fn delete_suggestion(&self, lesson: LessonId) -> Result<bool> {
        self.service.delete_suggestion(lesson)
    }

    /// The lesson's current page text, joined with newlines
    pub fn current_content(&self, lesson: LessonId) -> Result<String> {
        self.service.current_content(lesson)
    }

    /// The lesson's pages in ascending id order
    pub fn pages(&self, lesson: LessonId) -> Result<Vec<Page>> {
        self.pages.list_pages(lesson)
    }

    // ---- version history ----

    /// Snapshot the lesson's current content as a new revision
    ///
    /// With `parent_id` the revision becomes a branch child (`N.M`);
    /// without, a new root (`N`).
    #[instrument(skip(self), fields(lesson = %lesson))]
    pub fn save_revision(&self, lesson: LessonId, parent_id: Option<&str>) -> Result<Revision> {
        let content = self.service.current_content(lesson)?;
        let revision = self.tree.create_revision(lesson, content, parent_id)?;
        info!(version = %revision.version, "saved revision");
        Ok(revision)
    }

    /// Store an arbitrary content blob as a new revision
    pub fn save_revision_content(
        &self,
        lesson: LessonId,
        content: String,
        parent_id: Option<&str>,
    ) -> Result<Revision> {
        self.tree.create_revision(lesson, content, parent_id)
    }

    /// List a lesson's root revisions with their direct children
    pub fn history(&self, lesson: LessonId) -> Result<Vec<RevisionNode>> {
        self.tree.list_roots(lesson)
    }

    /// Fetch one revision together with its direct children
    pub fn revision(&self, history_id: &str) -> Result<RevisionNode> {
        self.tree.get_with_children(history_id)
    }

    /// Overwrite the stored content of a revision
    pub fn update_revision(
        &self,
        lesson: LessonId,
        history_id: &str,
        content: String,
    ) -> Result<Revision> {
        self.tree.update_revision_content(lesson, history_id, content)
    }

    /// Delete a revision and all its descendants; returns how many
    pub fn delete_revision(&self, history_id: &str) -> Result<usize> {
        self.tree.delete_revision(history_id)
    }

    /// Resynchronize a lesson's pages with a stored revision
    ///
    /// Splits the revision content in revert mode, reconciles without
    /// deleting, then purges placeholder-only pages lesson-wide.
    #[instrument(skip(self), fields(lesson = %lesson))]
    pub fn restore_from_version(
        &self,
        lesson: LessonId,
        history_id: &str,
    ) -> Result<ReconcileReport> {
        let revision = self.tree.get_for_lesson(lesson, history_id)?;
        info!(version = %revision.version, "restoring lesson from revision");
        self.service.restore_snapshot(lesson, &revision.content)
    }

    // ---- background sweep ----

    /// Start the background notification sweep
    ///
    /// Returns `false` if the sweep was already running.
    pub fn start_sweep(&self) -> bool {
        self.sweeper.start()
    }

    /// Stop the background sweep and wait for its thread
    pub fn stop_sweep(&self) -> bool {
        self.sweeper.stop()
    }

    /// Whether the sweep is currently running
    pub fn sweep_running(&self) -> bool {
        self.sweeper.is_running()
    }
}

/// Builder for [`Quire`] instances
///
/// Every store defaults to the in-memory implementation; the generator has
/// no default and [`build`](QuireBuilder::build) fails without one.
pub struct QuireBuilder {
    config: QuireConfig,
    pages: Option<Arc<dyn PageStore>>,
    versions: Option<Arc<dyn VersionStore>>,
    suggestions: Option<Arc<dyn SuggestionStore>>,
    feed: Option<Arc<dyn NotificationFeed>>,
    generator: Option<Arc<dyn ContentGenerator>>,
}

impl QuireBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: QuireConfig::default(),
            pages: None,
            versions: None,
            suggestions: None,
            feed: None,
            generator: None,
        }
    }

    /// Set the engine configuration (sweep delays)
    pub fn config(mut self, config: QuireConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom page store
    pub fn page_store(mut self, store: Arc<dyn PageStore>) -> Self {
        self.pages = Some(store);
        self
    }

    /// Use a custom version store
    pub fn version_store(mut self, store: Arc<dyn VersionStore>) -> Self {
        self.versions = Some(store);
        self
    }

    /// Use a custom suggestion store
    pub fn suggestion_store(mut self, store: Arc<dyn SuggestionStore>) -> Self {
        self.suggestions = Some(store);
        self
    }

    /// Use a custom notification feed
    pub fn notification_feed(mut self, feed: Arc<dyn NotificationFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Set the content-generation collaborator (required)
    pub fn generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Assemble the engine
    ///
    /// Fails with [`QuireError::InvalidConfiguration`] if no generator was
    /// supplied or a sweep delay is zero.
    pub fn build(self) -> Result<Quire> {
        let generator = self.generator.ok_or_else(|| {
            QuireError::InvalidConfiguration("a content generator is required".to_string())
        })?;
        if self.config.sweep_busy_delay.is_zero() || self.config.sweep_idle_delay.is_zero() {
            return Err(QuireError::InvalidConfiguration(
                "sweep delays must be non-zero".to_string(),
            ));
        }

        let pages = self
            .pages
            .unwrap_or_else(|| Arc::new(MemoryPageStore::new()));
        let versions = self
            .versions
            .unwrap_or_else(|| Arc::new(MemoryVersionStore::new()));
        let suggestions = self
            .suggestions
            .unwrap_or_else(|| Arc::new(MemorySuggestionStore::new()));
        let feed = self
            .feed
            .unwrap_or_else(|| Arc::new(MemoryNotificationFeed::new()));

        let service = Arc::new(SuggestionService::new(
            pages.clone(),
            suggestions.clone(),
            feed.clone(),
            generator,
            Arc::new(LessonLocks::new()),
        ));
        let sweeper = Sweeper::new(service.clone(), feed, suggestions, &self.config);

        info!(version = %self.config.version, "initialized quire engine");
        Ok(Quire {
            pages,
            service,
            tree: VersionTree::new(versions),
            sweeper,
        })
    }
}

impl Default for QuireBuilder {
    fn default() -> Self {
        Self::new()
    }
}
