//! Suggestion lifecycle orchestration
//!
//! Coordinates the generate / accept / revert / restore flows: look up or
//! create the suggestion for a `(lesson, notification)` pair, invoke the
//! generation collaborator when (and only when) no cached result exists,
//! and drive the splitter and reconciler with the right deletion policy for
//! each entry point.
//!
//! ## State machine
//!
//! Per pair, a suggestion moves `Absent → Generating → Ready`. Re-entering
//! a generate operation on a `Ready` suggestion returns the cached result
//! without touching the collaborator, so repeated requests cannot trigger
//! duplicate external calls or duplicate spend.
//!
//! ## Snapshot capture
//!
//! The first generation for a pair captures the lesson's current page text
//! (pages joined with `\n`) as the prior-content snapshot. It is never
//! overwritten afterwards; however many edits follow, revert always lands
//! on the true "before AI" baseline.

use crate::delimiter::split_pages;
use crate::error::{QuireError, Result};
use crate::generator::ContentGenerator;
use crate::locks::LessonLocks;
use crate::prompts;
use crate::reconcile::{purge_placeholder_pages, reconcile};
use crate::store::{NotificationFeed, PageStore, SuggestionStore};
use crate::types::{DeletionPolicy, LessonId, NotificationId, ReconcileReport, Suggestion};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Lifecycle state of a suggestion for one lesson/notification pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionState {
    /// No suggestion record exists yet
    Absent,
    /// A record exists but generated content has not been persisted
    Generating,
    /// Generated content is persisted and cached
    Ready,
}

/// Orchestrator for the suggestion lifecycle
///
/// Owns no state of its own; everything lives in the shared stores so
/// request threads and the background sweep see the same records.
pub struct SuggestionService {
    pages: Arc<dyn PageStore>,
    suggestions: Arc<dyn SuggestionStore>,
    feed: Arc<dyn NotificationFeed>,
    generator: Arc<dyn ContentGenerator>,
    locks: Arc<LessonLocks>,
}

impl std::fmt::Debug for SuggestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionService").finish_non_exhaustive()
    }
}

impl SuggestionService {
    /// Create a service over the shared stores and collaborator
    pub(crate) fn new(
        pages: Arc<dyn PageStore>,
        suggestions: Arc<dyn SuggestionStore>,
        feed: Arc<dyn NotificationFeed>,
        generator: Arc<dyn ContentGenerator>,
        locks: Arc<LessonLocks>,
    ) -> Self {
        Self {
            pages,
            suggestions,
            feed,
            generator,
            locks,
        }
    }

    /// The lesson's current page text, pages joined with newlines
    ///
    /// This is the snapshot format, and also what history listings show
    /// next to the version tree.
    pub fn current_content(&self, lesson: LessonId) -> Result<String> {
        let pages = self.pages.list_pages(lesson)?;
        Ok(pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Lifecycle state for a lesson/notification pair
    pub fn content_state(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<SuggestionState> {
        Ok(match self.suggestions.get(lesson, notification)? {
            None => SuggestionState::Absent,
            Some(s) if s.is_ready() => SuggestionState::Ready,
            Some(_) => SuggestionState::Generating,
        })
    }

    /// Generate (or return cached) insight text for a pair
    ///
    /// Idempotent: a populated `insights_text` short-circuits before the
    /// collaborator is touched. The prior-content snapshot is captured on
    /// first population and backfilled if somehow absent on the cached
    /// path.
    #[instrument(skip(self), fields(lesson = %lesson, notification = %notification))]
    pub fn generate_insights(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Suggestion> {
        require_ids(lesson, Some(notification))?;
        let existing = self.suggestions.get(lesson, notification)?;
        if let Some(suggestion) = &existing {
            if suggestion.insights_text.is_some() {
                trace!("insights already generated, returning cached");
                return self.backfill_snapshot(suggestion.clone());
            }
        }

        // Validate the lesson before any record is persisted; a failure
        // here must leave no trace.
        let lesson_content = self.require_content(lesson)?;
        let mut suggestion = self.persist_if_new(lesson, notification, existing)?;
        let questions = self.feed.faq_questions(lesson, notification)?;
        let response = self.generator.generate(
            prompts::INSIGHTS_SYSTEM_PROMPT,
            &prompts::insights_prompt(&questions, &lesson_content),
        )?;

        suggestion.insights_text = Some(response.trim().to_string());
        if suggestion.prior_content_snapshot.is_none() {
            suggestion.prior_content_snapshot = Some(lesson_content);
        }
        suggestion.updated_at = Utc::now();
        self.suggestions.save(suggestion.clone())?;
        info!("generated insights");
        Ok(suggestion)
    }

    /// Generate (or return cached) proposed content for a pair
    ///
    /// Same caching and snapshot semantics as [`generate_insights`]; the
    /// sweep drives this operation for every pending notification.
    ///
    /// [`generate_insights`]: SuggestionService::generate_insights
    #[instrument(skip(self), fields(lesson = %lesson, notification = %notification))]
    pub fn generate_content(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Suggestion> {
        require_ids(lesson, Some(notification))?;
        let existing = self.suggestions.get(lesson, notification)?;
        if let Some(suggestion) = &existing {
            if suggestion.proposed_content.is_some() {
                trace!("content already generated, returning cached");
                return self.backfill_snapshot(suggestion.clone());
            }
        }

        let lesson_content = self.require_content(lesson)?;
        let mut suggestion = self.persist_if_new(lesson, notification, existing)?;
        let questions = self.feed.faq_questions(lesson, notification)?;
        let response = self.generator.generate(
            prompts::CONTENT_SYSTEM_PROMPT,
            &prompts::content_prompt(&questions, &lesson_content),
        )?;

        suggestion.proposed_content = Some(response.trim().to_string());
        if suggestion.prior_content_snapshot.is_none() {
            suggestion.prior_content_snapshot = Some(lesson_content);
        }
        suggestion.updated_at = Utc::now();
        self.suggestions.save(suggestion.clone())?;
        info!("generated proposed content");
        Ok(suggestion)
    }

    /// Re-insert page delimiters into edited content, caching the result
    ///
    /// The collaborator aligns delimiter placement in `edited_content` with
    /// `original_content`. A cached result on the suggestion is returned
    /// without a new call.
    pub fn insert_delimiters(
        &self,
        lesson: LessonId,
        notification: NotificationId,
        original_content: &str,
        edited_content: &str,
    ) -> Result<String> {
        require_ids(lesson, Some(notification))?;
        if original_content.is_empty() || edited_content.is_empty() {
            return Err(QuireError::invalid_input(
                "original and edited content are required",
            ));
        }

        let mut suggestion = self.lookup_or_create(lesson, notification)?;
        if let Some(cached) = suggestion.delimited_content {
            trace!("delimited content already generated, returning cached");
            return Ok(cached);
        }

        let response = self.generator.generate(
            prompts::DELIMITER_SYSTEM_PROMPT,
            &prompts::delimiter_prompt(original_content, edited_content),
        )?;
        let delimited = response.trim().to_string();

        suggestion.delimited_content = Some(delimited.clone());
        suggestion.updated_at = Utc::now();
        self.suggestions.save(suggestion)?;
        info!(lesson = %lesson, "inserted delimiters into edited content");
        Ok(delimited)
    }

    /// Cached delimiter-insertion result for a pair, if any
    pub fn delimited_content(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Option<String>> {
        Ok(self
            .suggestions
            .get(lesson, notification)?
            .and_then(|s| s.delimited_content))
    }

    /// Accept edited content for a lesson and resynchronize its pages
    ///
    /// Persists the content onto the lesson's suggestion, then splits it
    /// (normal mode) and reconciles destructively: empty trailing pages are
    /// skipped and placeholder-only pages are swept lesson-wide.
    #[instrument(skip(self, new_content), fields(lesson = %lesson))]
    pub fn accept_content(&self, lesson: LessonId, new_content: &str) -> Result<ReconcileReport> {
        require_ids(lesson, None)?;
        let mut suggestion = self
            .suggestions
            .find_for_lesson(lesson)?
            .ok_or(QuireError::SuggestionNotFound(lesson))?;
        suggestion.proposed_content = Some(new_content.to_string());
        suggestion.updated_at = Utc::now();
        self.suggestions.save(suggestion)?;

        let lock = self.locks.for_lesson(lesson);
        let _guard = lock.lock();

        let split = split_pages(new_content, false);
        let report = reconcile(
            self.pages.as_ref(),
            lesson,
            &split.pages,
            DeletionPolicy::DestructiveCleanup,
        )?;
        info!(
            updated = report.pages_updated,
            created = report.pages_created,
            deleted = report.pages_deleted,
            "accepted content"
        );
        Ok(report)
    }

    /// Revert a lesson's pages to the prior-content snapshot
    ///
    /// Splits the snapshot in revert mode (escaped delimiters count) and
    /// reconciles non-destructively: every snapshot page is recreated,
    /// empty ones included, and nothing is deleted.
    #[instrument(skip(self), fields(lesson = %lesson))]
    pub fn revert_to_original(&self, lesson: LessonId) -> Result<ReconcileReport> {
        require_ids(lesson, None)?;
        let suggestion = self
            .suggestions
            .find_for_lesson(lesson)?
            .ok_or(QuireError::SuggestionNotFound(lesson))?;
        let snapshot = suggestion
            .prior_content_snapshot
            .ok_or(QuireError::SnapshotUnavailable(lesson))?;

        let lock = self.locks.for_lesson(lesson);
        let _guard = lock.lock();

        let split = split_pages(&snapshot, true);
        let report = reconcile(
            self.pages.as_ref(),
            lesson,
            &split.pages,
            DeletionPolicy::NoDelete,
        )?;
        info!(
            updated = report.pages_updated,
            created = report.pages_created,
            "reverted to original content"
        );
        Ok(report)
    }

    /// Resynchronize a lesson's pages with a historical content blob
    ///
    /// Restore differs from plain revert in one way: after the
    /// non-destructive reconcile, placeholder-only pages are purged
    /// lesson-wide as a trailing cleanup.
    #[instrument(skip(self, content), fields(lesson = %lesson))]
    pub fn restore_snapshot(&self, lesson: LessonId, content: &str) -> Result<ReconcileReport> {
        require_ids(lesson, None)?;

        let lock = self.locks.for_lesson(lesson);
        let _guard = lock.lock();

        let split = split_pages(content, true);
        let mut report = reconcile(
            self.pages.as_ref(),
            lesson,
            &split.pages,
            DeletionPolicy::NoDelete,
        )?;
        report.pages_deleted = purge_placeholder_pages(self.pages.as_ref(), lesson)?;
        info!(
            updated = report.pages_updated,
            created = report.pages_created,
            deleted = report.pages_deleted,
            "restored content from history"
        );
        Ok(report)
    }

    /// Remove a lesson's suggestion record(s)
    pub fn delete_suggestion(&self, lesson: LessonId) -> Result<bool> {
        require_ids(lesson, None)?;
        let removed = self.suggestions.delete_for_lesson(lesson)?;
        if removed {
            debug!(lesson = %lesson, "deleted suggestion");
        }
        Ok(removed)
    }

    fn lookup_or_create(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Suggestion> {
        // Lookups always go through the compound key; there may be several
        // suggestions per lesson across different notifications.
        let existing = self.suggestions.get(lesson, notification)?;
        self.persist_if_new(lesson, notification, existing)
    }

    fn persist_if_new(
        &self,
        lesson: LessonId,
        notification: NotificationId,
        existing: Option<Suggestion>,
    ) -> Result<Suggestion> {
        match existing {
            Some(suggestion) => Ok(suggestion),
            None => {
                let fresh = Suggestion::new(lesson, notification);
                self.suggestions.save(fresh.clone())?;
                debug!(lesson = %lesson, notification = %notification, "created suggestion");
                Ok(fresh)
            }
        }
    }

    fn backfill_snapshot(&self, mut suggestion: Suggestion) -> Result<Suggestion> {
        if suggestion.prior_content_snapshot.is_none() {
            suggestion.prior_content_snapshot = Some(self.current_content(suggestion.lesson_id)?);
            suggestion.updated_at = Utc::now();
            self.suggestions.save(suggestion.clone())?;
        }
        Ok(suggestion)
    }

    fn require_content(&self, lesson: LessonId) -> Result<String> {
        let content = self.current_content(lesson)?;
        if content.is_empty() {
            return Err(QuireError::LessonNotFound(lesson));
        }
        Ok(content)
    }
}

fn require_ids(lesson: LessonId, notification: Option<NotificationId>) -> Result<()> {
    if lesson.0 == 0 {
        return Err(QuireError::invalid_input("lesson id is required"));
    }
    if let Some(notification) = notification {
        if notification.0 == 0 {
            return Err(QuireError::invalid_input("notification id is required"));
        }
    }
    Ok(())
}
