//! Integration tests for Quire
//!
//! Exercises full lifecycles through the public facade: generate, accept,
//! revert, version save/restore, and the background sweep, with a counting
//! fake standing in for the generation collaborator.

use ::quire::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counting fake for the generation collaborator
pub struct ScriptedGenerator {
    pub calls: AtomicUsize,
    pub responses: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Returns each response in order, repeating the last one forever
    pub fn new(responses: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentGenerator for ScriptedGenerator {
    fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock();
        let idx = n.min(responses.len().saturating_sub(1));
        responses
            .get(idx)
            .cloned()
            .ok_or_else(|| QuireError::generation("no scripted response"))
    }
}

/// Test harness wiring the facade over shared in-memory stores
pub struct QuireTestHarness {
    pub quire: Quire,
    pub pages: Arc<store::MemoryPageStore>,
    pub suggestions: Arc<store::MemorySuggestionStore>,
    pub feed: Arc<store::MemoryNotificationFeed>,
    pub generator: Arc<ScriptedGenerator>,
}

/// Initialize test logging; safe to call from every test
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl QuireTestHarness {
    pub fn new(responses: &[&str]) -> Self {
        init_tracing();
        let pages = Arc::new(store::MemoryPageStore::new());
        let suggestions = Arc::new(store::MemorySuggestionStore::new());
        let feed = Arc::new(store::MemoryNotificationFeed::new());
        let generator = Arc::new(ScriptedGenerator::new(responses));
        let quire = QuireBuilder::new()
            .page_store(pages.clone())
            .suggestion_store(suggestions.clone())
            .notification_feed(feed.clone())
            .generator(generator.clone())
            .config(QuireConfig {
                sweep_busy_delay: Duration::from_millis(5),
                sweep_idle_delay: Duration::from_millis(5),
                ..QuireConfig::default()
            })
            .build()
            .unwrap();
        Self {
            quire,
            pages,
            suggestions,
            feed,
            generator,
        }
    }

    pub fn seed_lesson(&self, lesson: LessonId, texts: &[&str]) {
        self.pages.seed(lesson, texts).unwrap();
    }

    pub fn page_texts(&self, lesson: LessonId) -> Vec<String> {
        self.quire
            .pages(lesson)
            .unwrap()
            .into_iter()
            .map(|p| p.text)
            .collect()
    }
}

#[test]
fn test_full_suggestion_lifecycle() {
    let harness = QuireTestHarness::new(&[
        "these students are confused about ownership",
        &format!("intro page{}ownership deep dive", PAGE_DELIMITER),
    ]);
    let lesson = LessonId(1);
    let notification = NotificationId(1);
    harness.seed_lesson(lesson, &["original intro"]);

    // Insights first, then content; two collaborator calls total.
    let s = harness.quire.generate_insights(lesson, notification).unwrap();
    assert!(s.insights_text.is_some());
    assert_eq!(
        harness.quire.content_state(lesson, notification).unwrap(),
        SuggestionState::Generating
    );

    let s = harness.quire.generate_content(lesson, notification).unwrap();
    let proposed = s.proposed_content.clone().unwrap();
    assert_eq!(
        harness.quire.content_state(lesson, notification).unwrap(),
        SuggestionState::Ready
    );
    assert_eq!(harness.generator.call_count(), 2);

    // Repeat calls hit the cache only.
    harness.quire.generate_insights(lesson, notification).unwrap();
    harness.quire.generate_content(lesson, notification).unwrap();
    assert_eq!(harness.generator.call_count(), 2);

    // Accept: page 1 updated in place, page 2 created.
    let report = harness.quire.accept_content(lesson, &proposed).unwrap();
    assert_eq!(report.pages_updated, 1);
    assert_eq!(report.pages_created, 1);
    assert_eq!(
        harness.page_texts(lesson),
        vec!["intro page", "ownership deep dive"]
    );

    // Revert: back to the snapshot captured before generation. The page
    // created by accept survives; reverting never deletes.
    harness.quire.revert_to_original(lesson).unwrap();
    assert_eq!(
        harness.page_texts(lesson),
        vec!["original intro", "ownership deep dive"]
    );

    // The snapshot itself never moved.
    let stored = harness.suggestions.get(lesson, notification).unwrap().unwrap();
    assert_eq!(
        stored.prior_content_snapshot.as_deref(),
        Some("original intro")
    );
}

#[test]
fn test_page_identity_survives_accept() {
    let harness = QuireTestHarness::new(&["unused"]);
    let lesson = LessonId(3);
    harness.seed_lesson(lesson, &["a", "b", "c"]);
    let ids_before: Vec<_> = harness
        .quire
        .pages(lesson)
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    harness
        .quire
        .save_revision(lesson, None)
        .unwrap();
    harness
        .suggestions
        .save(types::Suggestion::new(lesson, NotificationId(1)))
        .unwrap();
    let edited = format!("A{}B{}C", PAGE_DELIMITER, PAGE_DELIMITER);
    harness.quire.accept_content(lesson, &edited).unwrap();

    let ids_after: Vec<_> = harness
        .quire
        .pages(lesson)
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    // Same page rows, new text.
    assert_eq!(ids_before, ids_after);
    assert_eq!(harness.page_texts(lesson), vec!["A", "B", "C"]);
}

#[test]
fn test_version_tree_branching() {
    let harness = QuireTestHarness::new(&["unused"]);
    let lesson = LessonId(1);
    harness.seed_lesson(lesson, &["content v1"]);

    let r1 = harness.quire.save_revision(lesson, None).unwrap();
    let r2 = harness.quire.save_revision(lesson, None).unwrap();
    assert_eq!(r1.version, "1");
    assert_eq!(r2.version, "2");

    let b1 = harness
        .quire
        .save_revision(lesson, Some(&r1.history_id))
        .unwrap();
    let b2 = harness
        .quire
        .save_revision(lesson, Some(&r1.history_id))
        .unwrap();
    assert_eq!(b1.version, "1.1");
    assert_eq!(b2.version, "1.2");

    let roots = harness.quire.history(lesson).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].revision.version, "1");
    assert_eq!(roots[0].children.len(), 2);
    assert_eq!(roots[1].revision.version, "2");
    assert!(roots.iter().all(|n| n.revision.verify_integrity()));

    // Deleting the first root takes its branch children with it.
    let removed = harness.quire.delete_revision(&r1.history_id).unwrap();
    assert_eq!(removed, 3);
    let roots = harness.quire.history(lesson).unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].revision.version, "2");
}

#[test]
fn test_restore_after_destructive_edits() {
    let harness = QuireTestHarness::new(&["unused"]);
    let lesson = LessonId(1);
    harness.seed_lesson(lesson, &["chapter one", "chapter two"]);

    let saved = harness.quire.save_revision(lesson, None).unwrap();

    // Wreck the lesson.
    harness
        .suggestions
        .save(types::Suggestion::new(lesson, NotificationId(1)))
        .unwrap();
    harness.quire.accept_content(lesson, "totally different").unwrap();
    assert_eq!(
        harness.page_texts(lesson),
        vec!["totally different", "chapter two"]
    );

    // Restore lands on the saved blob (joined form, one segment).
    harness
        .quire
        .restore_from_version(lesson, &saved.history_id)
        .unwrap();
    assert_eq!(
        harness.page_texts(lesson)[0],
        "chapter one\nchapter two"
    );
}

#[test]
fn test_sweep_pre_generates_pending_notifications() {
    let harness = QuireTestHarness::new(&["swept body"]);
    let lesson_a = LessonId(1);
    let lesson_b = LessonId(2);
    harness.seed_lesson(lesson_a, &["a"]);
    harness.seed_lesson(lesson_b, &["b"]);
    harness.feed.add_notification(lesson_a, NotificationId(1));
    harness.feed.add_notification(lesson_b, NotificationId(2));

    assert!(harness.quire.start_sweep());
    assert!(!harness.quire.start_sweep());

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    loop {
        let a = harness.suggestions.get(lesson_a, NotificationId(1)).unwrap();
        let b = harness.suggestions.get(lesson_b, NotificationId(2)).unwrap();
        if a.is_some_and(|s| s.is_ready()) && b.is_some_and(|s| s.is_ready()) {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "sweep never generated both suggestions"
        );
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(harness.quire.stop_sweep());
    assert!(!harness.quire.sweep_running());

    // The sweep only generated each pair once.
    let calls = harness.generator.call_count();
    assert_eq!(calls, 2);
}

#[test]
fn test_concurrent_accepts_serialize_per_lesson() {
    let harness = QuireTestHarness::new(&["unused"]);
    let lesson = LessonId(9);
    harness.seed_lesson(lesson, &["seed"]);
    harness
        .suggestions
        .save(types::Suggestion::new(lesson, NotificationId(1)))
        .unwrap();

    let quire = Arc::new(harness.quire);
    let mut handles = Vec::new();
    for i in 0..8 {
        let quire = quire.clone();
        handles.push(std::thread::spawn(move || {
            let content = format!("edit {i}{}tail {i}", PAGE_DELIMITER);
            quire.accept_content(lesson, &content).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every accept after the first grows the lesson by zero pages: the
    // two-segment splits always reconcile onto pages 1 and 2.
    let texts = quire.pages(lesson).unwrap();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].text.starts_with("edit "));
    assert!(texts[1].text.starts_with("tail "));
}

#[test]
fn test_delete_suggestion_clears_lesson() {
    let harness = QuireTestHarness::new(&["body"]);
    let lesson = LessonId(1);
    harness.seed_lesson(lesson, &["page"]);
    harness.quire.generate_content(lesson, NotificationId(1)).unwrap();
    harness.quire.generate_content(lesson, NotificationId(2)).unwrap();

    assert!(harness.quire.delete_suggestion(lesson).unwrap());
    assert!(!harness.quire.delete_suggestion(lesson).unwrap());
    assert_eq!(
        harness.quire.content_state(lesson, NotificationId(1)).unwrap(),
        SuggestionState::Absent
    );
}

#[test]
fn test_generation_error_leaves_no_cache() {
    let harness = QuireTestHarness::new(&[]);
    let lesson = LessonId(1);
    harness.seed_lesson(lesson, &["page"]);

    let err = harness
        .quire
        .generate_content(lesson, NotificationId(1))
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        harness.quire.content_state(lesson, NotificationId(1)).unwrap(),
        SuggestionState::Generating
    );
}
