//! per-user busy-interval bookkeeping in slot-index space.

use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct ReservationTracker {
    reservations: HashMap<Uuid, Vec<(usize, usize)>>,
}

impl ReservationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_pos(list: &[(usize, usize)], start: usize) -> usize {
        list.partition_point(|&(s, _)| s < start)
    }

    /// true if `[start, end)` does not overlap any reservation already held by `user`.
    pub fn fits(&self, user: Uuid, start: usize, end: usize) -> bool {
        let Some(list) = self.reservations.get(&user) else {
            return true;
        };
        let pos = Self::insert_pos(list, start);
        if pos > 0 && list[pos - 1].1 > start {
            return false;
        }
        if pos < list.len() && list[pos].0 < end {
            return false;
        }
        true
    }

    /// reserves `[start, end)` for `user`. caller must have checked `fits` first.
    pub fn reserve(&mut self, user: Uuid, start: usize, end: usize) {
        let list = self.reservations.entry(user).or_default();
        let pos = Self::insert_pos(list, start);
        list.insert(pos, (start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_overlapping_reservations_all_fit() {
        let mut t = ReservationTracker::new();
        let u = Uuid::from_u128(1);
        assert!(t.fits(u, 0, 4));
        t.reserve(u, 0, 4);
        assert!(t.fits(u, 4, 8));
        t.reserve(u, 4, 8);
        assert!(!t.fits(u, 3, 5));
        assert!(!t.fits(u, 6, 10));
        assert!(t.fits(u, 8, 12));
    }

    #[test]
    fn different_users_are_independent() {
        let mut t = ReservationTracker::new();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        t.reserve(a, 0, 4);
        assert!(t.fits(b, 0, 4));
    }
}
