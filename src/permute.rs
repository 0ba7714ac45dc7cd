//! Password-keyed pseudo-random permutation of carrier slots.
//!
//! [`permute`] selects `take` distinct indices from `0..total` as a
//! deterministic function of an arbitrary-length seed. Both the embedder and
//! the extractor call it with the same seed and the same `total`/`take`, so
//! the selection must be reproducible across processes and platforms: the
//! seed is first collapsed to a fixed-size digest with SHA-256, then fed to
//! [`rand::rngs::StdRng`], whose output is a documented, semver-stable
//! function of its seed bytes. Everything downstream (rejection sampling
//! order, Fisher-Yates) is plain, portable arithmetic.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Selects `take` distinct indices from `0..total`, deterministic in `seed`.
///
/// - If `take * 10 < total`, uses rejection sampling into a set, preserving
///   the insertion order of first occurrences (the order a Python `set`-based
///   reference implementation would produce is not portable, so this crate
///   tracks insertion order explicitly with a side `Vec`).
/// - Otherwise materializes `0..total`, Fisher-Yates shuffles it, and takes
///   the first `take` elements.
///
/// # Panics
///
/// Panics if `take > total` (the caller invariant from the specification;
/// every call site in this crate checks capacity first, so this should never
/// trigger in practice).
pub fn permute(total: usize, seed: &[u8], take: usize) -> Vec<usize> {
    assert!(take <= total, "permute: take ({take}) > total ({total})");

    let mut rng = seeded_rng(seed);

    if take == 0 {
        return Vec::new();
    }

    if take.saturating_mul(10) < total {
        let mut seen = HashSet::with_capacity(take);
        let mut order = Vec::with_capacity(take);
        while order.len() < take {
            let candidate = rng.gen_range(0..total);
            if seen.insert(candidate) {
                order.push(candidate);
            }
        }
        order
    } else {
        let mut all: Vec<usize> = (0..total).collect();
        all.shuffle(&mut rng);
        all.truncate(take);
        all
    }
}

/// Derives the per-chunk seed used by the video carrier: `SHA256(base_seed
/// || chunk_index_be8)`. `chunk_index` starts at 0 on the first body chunk,
/// independent of however many frames the prelude batch consumed.
pub fn chunk_seed(base_seed: &[u8], chunk_index: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(base_seed);
    hasher.update(chunk_index.to_be_bytes());
    hasher.finalize().into()
}

fn seeded_rng(seed: &[u8]) -> StdRng {
    let digest: [u8; 32] = Sha256::digest(seed).into();
    StdRng::from_seed(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet as Set;

    #[test]
    fn deterministic_for_fixed_seed() {
        let a = permute(10_000, b"seed-1", 50);
        let b = permute(10_000, b"seed-1", 50);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = permute(10_000, b"seed-1", 50);
        let b = permute(10_000, b"seed-2", 50);
        assert_ne!(a, b);
    }

    #[test]
    fn selects_distinct_indices_in_bounds() {
        for &(total, take) in &[(100usize, 5usize), (100, 50), (1000, 999)] {
            let idxs = permute(total, b"pw", take);
            assert_eq!(idxs.len(), take);
            let set: Set<usize> = idxs.iter().copied().collect();
            assert_eq!(set.len(), take, "indices must be distinct");
            assert!(idxs.iter().all(|&i| i < total));
        }
    }

    #[test]
    fn take_equal_total_is_a_full_permutation() {
        let idxs = permute(64, b"x", 64);
        let set: Set<usize> = idxs.into_iter().collect();
        assert_eq!(set, (0..64).collect());
    }

    #[test]
    fn take_zero_returns_empty() {
        assert!(permute(100, b"x", 0).is_empty());
    }

    #[test]
    fn chunk_seed_resets_at_zero_regardless_of_prelude() {
        // The chunk seed is purely a function of (base_seed, chunk_index);
        // nothing about how many frames the prelude consumed leaks in.
        let base = b"base-seed-bytes";
        assert_eq!(chunk_seed(base, 0), chunk_seed(base, 0));
        assert_ne!(chunk_seed(base, 0), chunk_seed(base, 1));
    }

    proptest! {
        #[test]
        fn prop_dense_and_sparse_paths_both_distinct(total in 20usize..500, frac in 1usize..20) {
            let take = (total / frac).min(total);
            let idxs = permute(total, b"prop-seed", take);
            let set: Set<usize> = idxs.iter().copied().collect();
            prop_assert_eq!(set.len(), take);
            prop_assert!(idxs.iter().all(|&i| i < total));
        }
    }
}
