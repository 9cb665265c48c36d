//! Property tests for the set-name allocator
//!
//! The invariants under test: no two simultaneously-live names are ever
//! equal, and `allocate` never returns a name that was in use at call time.

use osmql_builder::NameAllocator;
use proptest::prelude::*;

proptest! {
    #[test]
    fn allocated_names_are_pairwise_distinct(count in 1usize..300) {
        let mut names = NameAllocator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..count {
            prop_assert!(seen.insert(names.allocate()));
        }
    }

    #[test]
    fn allocate_skips_reserved_names(
        reserved in proptest::collection::btree_set("[a-e]{1,2}", 0..20),
        count in 1usize..60,
    ) {
        let mut names = NameAllocator::new();
        for name in &reserved {
            names.reserve(name.clone());
        }
        for _ in 0..count {
            let name = names.allocate();
            prop_assert!(!reserved.contains(&name));
        }
    }

    #[test]
    fn live_names_never_collide_under_churn(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
        let mut names = NameAllocator::new();
        let mut live: Vec<String> = Vec::new();
        for allocate in ops {
            if allocate || live.is_empty() {
                let name = names.allocate();
                prop_assert!(!live.contains(&name));
                live.push(name);
            } else {
                let name = live.remove(live.len() / 2);
                names.release(&name);
            }
        }
    }

    #[test]
    fn released_names_become_available(count in 1usize..50) {
        let mut names = NameAllocator::new();
        let mut allocated = Vec::new();
        for _ in 0..count {
            allocated.push(names.allocate());
        }
        for name in &allocated {
            names.release(name);
            prop_assert!(names.is_available(name));
        }
        prop_assert_eq!(names.live_count(), 0);
    }
}
