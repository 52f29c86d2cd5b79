//! Allocation of helper-chain offsets.
//!
//! Offsets are not stored anywhere but in the graph itself: the set in use
//! is recovered by scanning for marker-labelled constant nodes, and new ones
//! are handed out as the smallest non-negative integers not yet taken.

use std::collections::BTreeSet;

/// Returns the smallest non-negative integer not in `existing`.
pub fn next_free(existing: &BTreeSet<u32>) -> u32 {
    let mut candidate = 0;
    for &used in existing {
        if used > candidate {
            break;
        }
        candidate = used + 1;
    }
    candidate
}

/// Hands out distinct offsets for one rewrite pass.
///
/// Every allocated offset is added to the used set, so successive results
/// are strictly increasing and never collide with each other or with the
/// offsets the allocator was seeded with.
#[derive(Debug, Clone, Default)]
pub struct OffsetAllocator {
    used: BTreeSet<u32>,
}

impl OffsetAllocator {
    /// Seeds the allocator with the offsets already present in a graph.
    pub fn new(existing: impl IntoIterator<Item = u32>) -> Self {
        OffsetAllocator {
            used: existing.into_iter().collect(),
        }
    }

    /// Reserves and returns the next free offset.
    pub fn allocate(&mut self) -> u32 {
        let offset = next_free(&self.used);
        self.used.insert(offset);
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn next_free_fills_the_first_gap() {
        assert_eq!(next_free(&set(&[0, 1, 2, 4])), 3);
        assert_eq!(next_free(&set(&[])), 0);
        assert_eq!(next_free(&set(&[0, 2, 3])), 1);
        assert_eq!(next_free(&set(&[1, 2])), 0);
        assert_eq!(next_free(&set(&[0, 1, 2])), 3);
    }

    #[test]
    fn allocation_skips_existing_offsets() {
        let mut alloc = OffsetAllocator::new([0, 2, 3, 7]);
        let got: Vec<u32> = (0..4).map(|_| alloc.allocate()).collect();
        assert_eq!(got, vec![1, 4, 5, 6]);
        assert_eq!(alloc.allocate(), 8);
    }

    proptest! {
        #[test]
        fn allocations_are_distinct_minimal_and_increasing(
            existing in proptest::collection::btree_set(0u32..64, 0..32),
            count in 1usize..24,
        ) {
            let mut alloc = OffsetAllocator::new(existing.iter().copied());
            let mut taken = existing.clone();
            let mut previous: Option<u32> = None;

            for _ in 0..count {
                let offset = alloc.allocate();
                prop_assert!(!taken.contains(&offset));
                prop_assert!((0..offset).all(|v| taken.contains(&v)));
                if let Some(prev) = previous {
                    prop_assert!(offset > prev);
                }
                taken.insert(offset);
                previous = Some(offset);
            }
        }
    }
}
