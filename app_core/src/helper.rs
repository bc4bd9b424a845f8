//! pure, stateless helpers shared by both format services and the scheduler.

use crate::errors::{CoreError, CoreResult};
use rand::{rngs::StdRng, SeedableRng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// seeds a deterministic RNG from sha256("{tournament_id}:{format}")[..8], big-endian.
/// two builds of the same tournament/format pair always draw the same shuffle.
pub fn deterministic_rng(tournament_id: Uuid, format_tag: &str) -> StdRng {
    let input = format!("{tournament_id}:{format_tag}");
    let digest = Sha256::digest(input.as_bytes());
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    StdRng::seed_from_u64(u64::from_be_bytes(seed_bytes))
}

/// number of match wins required to take a best-of-`best_of` series.
pub fn wins_needed(best_of: i32) -> CoreResult<i32> {
    if best_of <= 0 || best_of % 2 == 0 {
        return Err(CoreError::Validation(format!(
            "best_of must be a positive odd number, got {best_of}"
        )));
    }
    Ok(best_of / 2 + 1)
}

/// smallest power of two >= n, or 1 if n <= 1.
pub fn next_power_of_two(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut size = 1usize;
    while size < n {
        size <<= 1;
    }
    size
}

/// classic circle-method round-robin pairing.
///
/// entrant 0 is fixed at position 0; the remaining entries rotate by one per round.
/// an odd-sized field gets a `None` sentinel bye slot; pairings touching it are dropped.
/// odd-indexed rounds (0-based) have their pair order swapped to balance home/away.
pub fn round_robin_rounds(entrants: &[Uuid]) -> Vec<Vec<(Uuid, Uuid)>> {
    let mut arr: Vec<Option<Uuid>> = entrants.iter().copied().map(Some).collect();
    if arr.len() % 2 == 1 {
        arr.push(None);
    }
    let n = arr.len();
    if n < 2 {
        return Vec::new();
    }
    let mut rounds = Vec::with_capacity(n - 1);
    for r in 0..(n - 1) {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (arr[i], arr[n - 1 - i]) {
                pairs.push(if r % 2 == 1 { (b, a) } else { (a, b) });
            }
        }
        rounds.push(pairs);
        // rotate positions [1, n) by one: move the last entry to position 1
        let last = arr.pop().expect("n >= 2");
        arr.insert(1, last);
    }
    rounds
}

/// standard single-elimination seed order: 1 vs N, 2 vs N-1, ... via recursive interleaving.
pub fn bracket_seed_positions(size: u32) -> Vec<u32> {
    if size <= 1 {
        return vec![1];
    }
    let half = bracket_seed_positions(size / 2);
    let mut out = Vec::with_capacity(size as usize);
    for seed in half {
        out.push(seed);
        out.push(size + 1 - seed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wins_needed_rejects_even_and_nonpositive() {
        assert!(wins_needed(0).is_err());
        assert!(wins_needed(4).is_err());
        assert!(wins_needed(-3).is_err());
    }

    #[test]
    fn wins_needed_matches_formula() {
        for bo in [1, 3, 5, 7] {
            let w = wins_needed(bo).unwrap();
            assert_eq!(2 * w - 1, bo);
        }
    }

    #[test]
    fn next_power_of_two_basic() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(8), 8);
    }

    #[test]
    fn bracket_seed_positions_is_permutation_and_pairs_mirror_seeds() {
        for k in [1u32, 2, 4, 8, 16] {
            let positions = bracket_seed_positions(k);
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (1..=k).collect::<Vec<_>>());
            for chunk in positions.chunks(2) {
                if let [a, b] = chunk {
                    assert_eq!(a + b, k + 1);
                }
            }
        }
    }

    #[test]
    fn round_robin_four_entrants_circle_method() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        let d = Uuid::from_u128(4);
        let rounds = round_robin_rounds(&[a, b, c, d]);
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0], vec![(a, d), (b, c)]);
        assert_eq!(rounds[1], vec![(c, a), (b, d)]);
        assert_eq!(rounds[2], vec![(a, b), (c, d)]);
    }

    #[test]
    fn round_robin_every_pair_appears_exactly_once() {
        let entrants: Vec<Uuid> = (1..=5u128).map(Uuid::from_u128).collect();
        let rounds = round_robin_rounds(&entrants);
        let mut seen = std::collections::HashSet::new();
        for round in &rounds {
            let mut in_round = std::collections::HashSet::new();
            for &(x, y) in round {
                assert!(in_round.insert(x));
                assert!(in_round.insert(y));
                let key = if x < y { (x, y) } else { (y, x) };
                assert!(seen.insert(key), "pair scheduled twice: {key:?}");
            }
        }
        assert_eq!(seen.len(), entrants.len() * (entrants.len() - 1) / 2);
    }

    #[test]
    fn deterministic_rng_is_stable_across_calls() {
        let id = Uuid::from_u128(7);
        let mut rng1 = deterministic_rng(id, "SINGLE_ELIM");
        let mut rng2 = deterministic_rng(id, "SINGLE_ELIM");
        use rand::Rng;
        let draws1: Vec<u32> = (0..5).map(|_| rng1.r#gen()).collect();
        let draws2: Vec<u32> = (0..5).map(|_| rng2.r#gen()).collect();
        assert_eq!(draws1, draws2);
    }
}
