//! Property-based testing for Quire
//!
//! Uses proptest to verify splitter and reconciler invariants across
//! randomly generated page content and sequences.

use ::quire::*;
use proptest::prelude::*;
use store::MemoryPageStore;

/// Page bodies that never contain a delimiter (or a fragment of one)
fn page_body_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \n.,]{0,200}"
}

/// A lesson's worth of page bodies
fn pages_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(page_body_strategy(), 1..8)
}

proptest! {
    /// Joining pages and splitting again returns the original sequence.
    #[test]
    fn prop_join_then_split_roundtrips(pages in pages_strategy()) {
        let joined = join_pages(&pages);
        let split = split_pages(&joined, false);
        prop_assert_eq!(split.pages, pages);
    }

    /// Splitting yields exactly one more segment than delimiter count.
    #[test]
    fn prop_segment_count_matches_markers(pages in pages_strategy()) {
        let joined = join_pages(&pages);
        let markers = joined.matches(PAGE_DELIMITER).count();
        let split = split_pages(&joined, false);
        prop_assert_eq!(split.page_count(), markers + 1);
    }

    /// Revert mode treats escaped markers exactly like literal ones.
    #[test]
    fn prop_revert_mode_equates_marker_forms(pages in pages_strategy()) {
        let literal = join_pages(&pages);
        let escaped = literal.replace(PAGE_DELIMITER, ESCAPED_PAGE_DELIMITER);
        let from_literal = split_pages(&literal, true);
        let from_escaped = split_pages(&escaped, true);
        prop_assert_eq!(from_literal.pages, from_escaped.pages);
    }

    /// Reconciling never shrinks the page count, under either policy.
    #[test]
    fn prop_reconcile_never_shrinks(
        seed in prop::collection::vec("[a-z]{1,20}", 1..6),
        new_pages in pages_strategy(),
        destructive in any::<bool>(),
    ) {
        let store = MemoryPageStore::new();
        let lesson = LessonId(1);
        let seed_refs: Vec<&str> = seed.iter().map(|s| s.as_str()).collect();
        store.seed(lesson, &seed_refs).unwrap();

        let policy = if destructive {
            DeletionPolicy::DestructiveCleanup
        } else {
            DeletionPolicy::NoDelete
        };
        reconcile(&store, lesson, &new_pages, policy).unwrap();

        // Seed pages never contain placeholder text, so nothing the
        // cleanup pass could remove existed before the call; the count
        // can only stay or grow.
        let after = store.list_pages(lesson).unwrap().len();
        prop_assert!(after >= seed.len());
    }

    /// After a destructive reconcile no placeholder-only page remains.
    #[test]
    fn prop_destructive_leaves_no_placeholders(
        seed in prop::collection::vec("[a-z]{1,20}", 1..6),
        new_pages in pages_strategy(),
    ) {
        let store = MemoryPageStore::new();
        let lesson = LessonId(1);
        let seed_refs: Vec<&str> = seed.iter().map(|s| s.as_str()).collect();
        store.seed(lesson, &seed_refs).unwrap();

        reconcile(&store, lesson, &new_pages, DeletionPolicy::DestructiveCleanup).unwrap();

        for page in store.list_pages(lesson).unwrap() {
            prop_assert_ne!(page.text.trim(), PAGE_DELIMITER);
        }
    }

    /// Page ids stay strictly ascending through any reconcile.
    #[test]
    fn prop_page_ids_stay_ascending(
        seed in prop::collection::vec("[a-z]{1,20}", 1..6),
        new_pages in pages_strategy(),
    ) {
        let store = MemoryPageStore::new();
        let lesson = LessonId(1);
        let seed_refs: Vec<&str> = seed.iter().map(|s| s.as_str()).collect();
        store.seed(lesson, &seed_refs).unwrap();

        reconcile(&store, lesson, &new_pages, DeletionPolicy::NoDelete).unwrap();

        let ids: Vec<_> = store
            .list_pages(lesson)
            .unwrap()
            .iter()
            .map(|p| p.id.0)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(ids, sorted);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Root version labels stay dense and ordered however many roots are
    /// created, and integrity hashes verify for every stored revision.
    #[test]
    fn prop_root_versions_are_dense(count in 1usize..12) {
        let store = std::sync::Arc::new(store::MemoryVersionStore::new());
        let tree = VersionTree::new(store);
        let lesson = LessonId(1);

        for _ in 0..count {
            tree.create_revision(lesson, "content".to_string(), None).unwrap();
        }

        let roots = tree.list_roots(lesson).unwrap();
        prop_assert_eq!(roots.len(), count);
        for (i, node) in roots.iter().enumerate() {
            prop_assert_eq!(&node.revision.version, &(i + 1).to_string());
            prop_assert!(node.revision.verify_integrity());
        }
    }
}
