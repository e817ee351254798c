//! Main test module for Quire
//!
//! This module includes all test suites:
//! - Integration tests for full lifecycles through the facade
//! - Property-based tests for splitter and reconciler invariants
//! - Edge case tests for unusual content shapes

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::quire::*;
    use std::sync::Arc;

    struct EchoGenerator(String);

    impl ContentGenerator for EchoGenerator {
        fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn engine(response: &str) -> (Quire, Arc<store::MemoryPageStore>) {
        let pages = Arc::new(store::MemoryPageStore::new());
        let quire = QuireBuilder::new()
            .page_store(pages.clone())
            .generator(Arc::new(EchoGenerator(response.to_string())))
            .build()
            .unwrap();
        (quire, pages)
    }

    #[test]
    fn test_generate_for_empty_lesson_fails() {
        let (quire, _pages) = engine("anything");
        let err = quire
            .generate_content(LessonId(1), NotificationId(1))
            .unwrap_err();
        assert!(matches!(err, QuireError::LessonNotFound(_)));
        // The failure happened before anything was persisted.
        assert_eq!(
            quire.content_state(LessonId(1), NotificationId(1)).unwrap(),
            SuggestionState::Absent
        );
    }

    #[test]
    fn test_accept_content_without_markers() {
        let (quire, pages) = engine("unused");
        let lesson = LessonId(1);
        pages.seed(lesson, &["one", "two", "three"]).unwrap();
        // Accept needs an existing suggestion record for the lesson.
        quire.generate_insights(lesson, NotificationId(1)).unwrap();

        // A markerless blob reconciles onto page 1 only; pages 2 and 3
        // keep their stale text.
        let report = quire.accept_content(lesson, "single blob").unwrap();
        assert_eq!(report.pages_updated, 1);
        assert_eq!(report.pages_created, 0);
        assert_eq!(quire.pages(lesson).unwrap()[0].text, "single blob");
        assert_eq!(quire.pages(lesson).unwrap()[2].text, "three");
    }

    #[test]
    fn test_content_that_is_only_delimiters() {
        let (quire, pages) = engine("unused");
        let lesson = LessonId(1);
        pages.seed(lesson, &["keep me"]).unwrap();
        quire.generate_insights(lesson, NotificationId(1)).unwrap();

        let blob = format!("{}{}", PAGE_DELIMITER, PAGE_DELIMITER);
        let report = quire.accept_content(lesson, &blob).unwrap();
        // Three empty segments: page 1 blanked, trailing empties skipped.
        assert_eq!(report.pages_updated, 1);
        assert_eq!(report.pages_created, 0);
        assert_eq!(quire.pages(lesson).unwrap()[0].text, "");
    }

    #[test]
    fn test_unicode_content_roundtrip() {
        let (quire, pages) = engine("unused");
        let lesson = LessonId(1);
        pages.seed(lesson, &["héllo wörld", "日本語のページ"]).unwrap();

        let revision = quire.save_revision(lesson, None).unwrap();
        assert!(revision.verify_integrity());
        assert_eq!(revision.content, "héllo wörld\n日本語のページ");
    }

    #[test]
    fn test_version_labels_beyond_nine_children() {
        let (quire, pages) = engine("unused");
        let lesson = LessonId(1);
        pages.seed(lesson, &["x"]).unwrap();

        let root = quire.save_revision(lesson, None).unwrap();
        let mut last = String::new();
        for _ in 0..10 {
            last = quire
                .save_revision(lesson, Some(&root.history_id))
                .unwrap()
                .version;
        }
        // Float-parsed ordering caps the observable maximum at ".9", so
        // the tenth child repeats the ".10" label.
        assert_eq!(last, "1.10");
        let eleventh = quire
            .save_revision(lesson, Some(&root.history_id))
            .unwrap();
        assert_eq!(eleventh.version, "1.10");
    }
}
