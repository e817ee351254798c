//! Per-lesson mutual exclusion for reconciliation
//!
//! Two reconciliations of the same lesson are a read-modify-write race on
//! page id allocation and content. The facade serializes them with a keyed
//! mutex: one mutex per lesson, created lazily and held for the duration of
//! a reconcile entry point. Different lessons proceed in parallel.

use crate::types::LessonId;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Lazily populated table of per-lesson mutexes
#[derive(Debug, Default)]
pub(crate) struct LessonLocks {
    locks: DashMap<LessonId, Arc<Mutex<()>>>,
}

impl LessonLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the mutex guarding a lesson
    ///
    /// The returned Arc keeps the mutex alive across the table entry; lock
    /// it for the whole reconcile pass.
    pub(crate) fn for_lesson(&self, lesson: LessonId) -> Arc<Mutex<()>> {
        self.locks
            .entry(lesson)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
