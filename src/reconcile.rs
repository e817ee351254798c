//! Positional page reconciliation
//!
//! Converges a lesson's persisted pages onto a freshly split page sequence.
//! Positions present in both sequences are overwritten in place, excess new
//! positions become new pages, and the destructive policy finishes with a
//! lesson-wide sweep of placeholder-only pages.
//!
//! ## Atomicity
//!
//! Reconciliation is not atomic: every page write is its own persistence
//! call, so a failure mid-pass leaves a partially updated lesson. Callers
//! needing stronger guarantees must wrap the call in an external transaction
//! boundary. Concurrent reconciliations of the same lesson race on page id
//! allocation; [`Quire`](crate::quire::Quire) serializes them with a
//! per-lesson lock.

use crate::delimiter::PAGE_DELIMITER;
use crate::error::Result;
use crate::store::PageStore;
use crate::types::{DeletionPolicy, LessonId, ReconcileReport};
use tracing::{debug, instrument, trace};

/// Reconcile a new page sequence onto a lesson's persisted pages
///
/// `new_pages` holds raw splitter segments; trimming happens here, exactly
/// once, before any write.
///
/// 1. Positions `0..min(new, old)` overwrite existing pages in ascending id
///    order.
/// 2. Excess new positions are created after the current maximum id, with
///    trimmed text. Under [`DeletionPolicy::DestructiveCleanup`] segments
///    whose trimmed text is empty are skipped; under
///    [`DeletionPolicy::NoDelete`] they are created anyway (as empty pages)
///    to preserve structural fidelity with snapshots.
/// 3. Excess *old* pages are never deleted by position-shrink alone.
/// 4. Under `DestructiveCleanup` only, a final lesson-wide scan removes
///    every page whose trimmed text equals the bare placeholder marker.
#[instrument(skip(store, new_pages), fields(lesson = %lesson, new_pages = new_pages.len()))]
pub fn reconcile(
    store: &dyn PageStore,
    lesson: LessonId,
    new_pages: &[String],
    policy: DeletionPolicy,
) -> Result<ReconcileReport> {
    let old_pages = store.list_pages(lesson)?;
    let mut report = ReconcileReport::default();

    debug!(
        old_pages = old_pages.len(),
        ?policy,
        "reconciling page sequence"
    );

    // Update positions present in both sequences, ascending id order.
    let overlap = new_pages.len().min(old_pages.len());
    for (page, text) in old_pages.iter().zip(new_pages.iter().take(overlap)) {
        store.update_page(page.id, text.trim().to_string())?;
        report.pages_updated += 1;
        trace!(page = %page.id, "updated page in place");
    }

    // Create pages for excess new positions. Text is always trimmed; only
    // the skip-if-empty rule depends on the policy.
    for text in new_pages.iter().skip(old_pages.len()) {
        let trimmed = text.trim();
        if trimmed.is_empty() && policy == DeletionPolicy::DestructiveCleanup {
            trace!("skipped creating empty trailing page");
            continue;
        }
        let page = store.create_page(lesson, trimmed.to_string())?;
        report.pages_created += 1;
        trace!(page = %page.id, "created page");
    }

    // Excess old pages are left in place in both policies; only the
    // placeholder sweep below ever deletes.
    if policy == DeletionPolicy::DestructiveCleanup {
        report.pages_deleted = purge_placeholder_pages(store, lesson)?;
    }

    debug!(
        updated = report.pages_updated,
        created = report.pages_created,
        deleted = report.pages_deleted,
        "reconciliation complete"
    );
    Ok(report)
}

/// Delete every page of a lesson whose trimmed text is exactly the
/// placeholder marker
///
/// This is a lesson-wide cleanup, not limited to pages a reconciliation
/// just touched. Restore runs it as a trailing pass after a non-destructive
/// reconcile; plain revert never does.
pub fn purge_placeholder_pages(store: &dyn PageStore, lesson: LessonId) -> Result<usize> {
    let mut deleted = 0;
    for page in store.list_pages(lesson)? {
        if page.text.trim() == PAGE_DELIMITER {
            debug!(page = %page.id, "removing placeholder-only page");
            store.delete_page(page.id)?;
            deleted += 1;
        }
    }
    Ok(deleted)
}
