//! Seeded BKDR string hashes

/// First seed of the recurrence
pub const BASE_SEED: u64 = 131;

/// Upper bound on hash functions per sketch
///
/// Under 64-bit wrapping the seed recurrence stops producing distinct values
/// after 63 terms; 32 keeps well clear of that and covers every error rate
/// down to 1e-9.
pub const MAX_HASH_FUNCS: usize = 32;

/// Derive `count` seeds: `s0 = 131`, `s(i+1) = s(i) * 10 + p(i)` with `p`
/// alternating 3, 1, 3, ...
#[must_use]
pub fn derive_seeds(count: usize) -> Vec<u64> {
    let mut seeds = Vec::with_capacity(count);
    let mut seed = BASE_SEED;
    let mut p = 3u64;
    for _ in 0..count {
        seeds.push(seed);
        seed = seed.wrapping_mul(10).wrapping_add(p);
        p = 4 - p;
    }
    seeds
}

/// Polynomial rolling hash over the key's code points: `h = h * seed + c`
#[inline]
#[must_use]
pub fn bkdr_hash(key: &str, seed: u64) -> u64 {
    key.chars()
        .fold(0u64, |h, c| h.wrapping_mul(seed).wrapping_add(u64::from(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_recurrence() {
        assert_eq!(derive_seeds(4), vec![131, 1313, 13131, 131313]);
    }

    #[test]
    fn seeds_are_distinct_up_to_cap() {
        let seeds = derive_seeds(MAX_HASH_FUNCS);
        let unique: HashSet<_> = seeds.iter().collect();
        assert_eq!(unique.len(), MAX_HASH_FUNCS);
    }

    #[test]
    fn hash_matches_hand_computation() {
        // ((0*131 + 'a') * 131) + 'b'
        assert_eq!(bkdr_hash("ab", 131), 97 * 131 + 98);
        assert_eq!(bkdr_hash("", 131), 0);
    }
}
