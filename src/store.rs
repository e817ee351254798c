//! Store traits for persisted pages, revisions and suggestions
//!
//! The actual persistence engine is an external collaborator; this module
//! defines the narrow interfaces the core needs and ships thread-safe
//! in-memory implementations used by tests and as the default wiring of
//! [`QuireBuilder`](crate::quire::QuireBuilder).
//!
//! ## Contracts
//!
//! - [`PageStore::list_pages`] always returns pages in ascending id order;
//!   that order is authoritative and never derived from content.
//! - [`VersionStore::delete`] cascades to all descendant revisions. The
//!   cascade is performed explicitly by the store (breadth-first over the
//!   parent edges), never via destructor chains.
//! - Every write is an independent persistence call. Callers that need
//!   atomicity across several writes must bring their own transaction
//!   boundary; the core does not.
//!
//! ## Thread safety
//!
//! The in-memory stores guard their interiors with `parking_lot` locks and
//! are safe to share across request threads and the background sweep.

use crate::error::{QuireError, Result};
use crate::types::{
    LessonId, NotificationId, NotificationRef, Page, PageId, Revision, Suggestion,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, trace};

/// Ordered page persistence for lessons
pub trait PageStore: Send + Sync {
    /// List a lesson's pages in ascending id order
    fn list_pages(&self, lesson: LessonId) -> Result<Vec<Page>>;

    /// Create a new page appended after the lesson's current maximum id
    fn create_page(&self, lesson: LessonId, text: String) -> Result<Page>;

    /// Overwrite the text of an existing page
    fn update_page(&self, id: PageId, text: String) -> Result<()>;

    /// Delete a page
    fn delete_page(&self, id: PageId) -> Result<()>;
}

/// Revision persistence with explicit cascade deletion
pub trait VersionStore: Send + Sync {
    /// List a lesson's root revisions (no parent), ascending by
    /// float-parsed version label
    fn list_roots(&self, lesson: LessonId) -> Result<Vec<Revision>>;

    /// List the direct children of a revision, ascending by float-parsed
    /// version label
    fn list_children(&self, parent_id: &str) -> Result<Vec<Revision>>;

    /// Fetch a revision by its history id
    fn get(&self, history_id: &str) -> Result<Option<Revision>>;

    /// Persist a new revision
    fn insert(&self, revision: Revision) -> Result<()>;

    /// Overwrite the content blob of a stored revision
    fn update_content(&self, history_id: &str, content: String) -> Result<()>;

    /// Delete a revision and, cascading, all of its descendants
    ///
    /// Returns the total number of revisions removed.
    fn delete(&self, history_id: &str) -> Result<usize>;
}

/// Suggestion persistence keyed by the (lesson, notification) compound key
pub trait SuggestionStore: Send + Sync {
    /// Fetch the suggestion for a lesson/notification pair
    fn get(&self, lesson: LessonId, notification: NotificationId) -> Result<Option<Suggestion>>;

    /// Fetch the first suggestion recorded for a lesson, if any
    fn find_for_lesson(&self, lesson: LessonId) -> Result<Option<Suggestion>>;

    /// Insert or update a suggestion (upsert on the compound key)
    fn save(&self, suggestion: Suggestion) -> Result<()>;

    /// Remove every suggestion recorded for a lesson
    ///
    /// Returns whether anything was removed.
    fn delete_for_lesson(&self, lesson: LessonId) -> Result<bool>;
}

/// Read-only view of the external notification/FAQ subsystem
pub trait NotificationFeed: Send + Sync {
    /// All notifications currently visible to the sweep
    fn list_notifications(&self) -> Result<Vec<NotificationRef>>;

    /// FAQ questions related to a lesson/notification pair, used for
    /// prompt assembly
    fn faq_questions(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PageStoreInner {
    /// BTreeMap keeps iteration in ascending id order
    pages: BTreeMap<PageId, Page>,
    next_id: u64,
}

/// Thread-safe in-memory [`PageStore`]
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    inner: RwLock<PageStoreInner>,
}

impl MemoryPageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a lesson with pages, in order; test/bootstrap convenience
    pub fn seed(&self, lesson: LessonId, texts: &[&str]) -> Result<Vec<Page>> {
        texts
            .iter()
            .map(|text| self.create_page(lesson, text.to_string()))
            .collect()
    }
}

impl PageStore for MemoryPageStore {
    fn list_pages(&self, lesson: LessonId) -> Result<Vec<Page>> {
        let inner = self.inner.read();
        Ok(inner
            .pages
            .values()
            .filter(|p| p.lesson_id == lesson)
            .cloned()
            .collect())
    }

    fn create_page(&self, lesson: LessonId, text: String) -> Result<Page> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let page = Page {
            id: PageId(inner.next_id),
            lesson_id: lesson,
            text,
        };
        inner.pages.insert(page.id, page.clone());
        trace!(page = %page.id, lesson = %lesson, "created page");
        Ok(page)
    }

    fn update_page(&self, id: PageId, text: String) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.pages.get_mut(&id) {
            Some(page) => {
                page.text = text;
                Ok(())
            }
            None => Err(QuireError::persistence(format!("page {} not found", id))),
        }
    }

    fn delete_page(&self, id: PageId) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.pages.remove(&id) {
            Some(page) => {
                debug!(page = %id, lesson = %page.lesson_id, "deleted page");
                Ok(())
            }
            None => Err(QuireError::persistence(format!("page {} not found", id))),
        }
    }
}

/// Thread-safe in-memory [`VersionStore`]
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    revisions: RwLock<HashMap<String, Revision>>,
}

impl MemoryVersionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_version(revisions: &mut [Revision]) {
    revisions.sort_by(|a, b| a.version_ordinal().total_cmp(&b.version_ordinal()));
}

impl VersionStore for MemoryVersionStore {
    fn list_roots(&self, lesson: LessonId) -> Result<Vec<Revision>> {
        let revisions = self.revisions.read();
        let mut roots: Vec<Revision> = revisions
            .values()
            .filter(|r| r.lesson_id == lesson && r.is_root())
            .cloned()
            .collect();
        sort_by_version(&mut roots);
        Ok(roots)
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Revision>> {
        let revisions = self.revisions.read();
        let mut children: Vec<Revision> = revisions
            .values()
            .filter(|r| r.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        sort_by_version(&mut children);
        Ok(children)
    }

    fn get(&self, history_id: &str) -> Result<Option<Revision>> {
        Ok(self.revisions.read().get(history_id).cloned())
    }

    fn insert(&self, revision: Revision) -> Result<()> {
        trace!(revision = revision.short_id(), version = %revision.version, "stored revision");
        self.revisions
            .write()
            .insert(revision.history_id.clone(), revision);
        Ok(())
    }

    fn update_content(&self, history_id: &str, content: String) -> Result<()> {
        let mut revisions = self.revisions.write();
        match revisions.get_mut(history_id) {
            Some(revision) => {
                revision.content = content;
                revision.state_hash = revision.compute_state_hash();
                Ok(())
            }
            None => Err(QuireError::RevisionNotFound(history_id.to_string())),
        }
    }

    fn delete(&self, history_id: &str) -> Result<usize> {
        let mut revisions = self.revisions.write();
        if !revisions.contains_key(history_id) {
            return Err(QuireError::RevisionNotFound(history_id.to_string()));
        }

        // Explicit breadth-first cascade over the ownership edges.
        let mut doomed = vec![history_id.to_string()];
        let mut queue = VecDeque::from([history_id.to_string()]);
        while let Some(parent) = queue.pop_front() {
            let children: Vec<String> = revisions
                .values()
                .filter(|r| r.parent_id.as_deref() == Some(parent.as_str()))
                .map(|r| r.history_id.clone())
                .collect();
            for child in children {
                queue.push_back(child.clone());
                doomed.push(child);
            }
        }

        for id in &doomed {
            revisions.remove(id);
        }
        debug!(
            revision = &history_id[..8.min(history_id.len())],
            removed = doomed.len(),
            "deleted revision subtree"
        );
        Ok(doomed.len())
    }
}

/// Thread-safe in-memory [`SuggestionStore`]
#[derive(Debug, Default)]
pub struct MemorySuggestionStore {
    /// BTreeMap keeps `find_for_lesson` deterministic (lowest notification
    /// id wins)
    suggestions: RwLock<BTreeMap<(LessonId, NotificationId), Suggestion>>,
}

impl MemorySuggestionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuggestionStore for MemorySuggestionStore {
    fn get(&self, lesson: LessonId, notification: NotificationId) -> Result<Option<Suggestion>> {
        Ok(self
            .suggestions
            .read()
            .get(&(lesson, notification))
            .cloned())
    }

    fn find_for_lesson(&self, lesson: LessonId) -> Result<Option<Suggestion>> {
        Ok(self
            .suggestions
            .read()
            .range((lesson, NotificationId(0))..=(lesson, NotificationId(u64::MAX)))
            .map(|(_, s)| s.clone())
            .next())
    }

    fn save(&self, suggestion: Suggestion) -> Result<()> {
        let key = (suggestion.lesson_id, suggestion.notification_id);
        self.suggestions.write().insert(key, suggestion);
        Ok(())
    }

    fn delete_for_lesson(&self, lesson: LessonId) -> Result<bool> {
        let mut suggestions = self.suggestions.write();
        let keys: Vec<_> = suggestions
            .range((lesson, NotificationId(0))..=(lesson, NotificationId(u64::MAX)))
            .map(|(k, _)| *k)
            .collect();
        for key in &keys {
            suggestions.remove(key);
        }
        Ok(!keys.is_empty())
    }
}

#[derive(Debug, Default)]
struct FeedInner {
    notifications: Vec<NotificationRef>,
    faqs: HashMap<(LessonId, NotificationId), Vec<String>>,
}

/// In-memory [`NotificationFeed`] for tests and local wiring
#[derive(Debug, Default)]
pub struct MemoryNotificationFeed {
    inner: RwLock<FeedInner>,
}

impl MemoryNotificationFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notification for a lesson
    pub fn add_notification(&self, lesson: LessonId, notification: NotificationId) {
        self.inner.write().notifications.push(NotificationRef {
            lesson_id: lesson,
            notification_id: notification,
        });
    }

    /// Attach FAQ questions to a lesson/notification pair
    pub fn set_faq_questions(
        &self,
        lesson: LessonId,
        notification: NotificationId,
        questions: Vec<String>,
    ) {
        self.inner
            .write()
            .faqs
            .insert((lesson, notification), questions);
    }
}

impl NotificationFeed for MemoryNotificationFeed {
    fn list_notifications(&self) -> Result<Vec<NotificationRef>> {
        Ok(self.inner.read().notifications.clone())
    }

    fn faq_questions(
        &self,
        lesson: LessonId,
        notification: NotificationId,
    ) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .faqs
            .get(&(lesson, notification))
            .cloned()
            .unwrap_or_default())
    }
}
