//! Experience curve and level-up events.
//!
//! Level is never stored; it is derived from xp with
//! `level(xp) = floor((xp / 100) ^ (1 / 1.5)) + 1`, so a character at 0 xp is
//! level 1 and the curve flattens as xp grows.

use crate::game::types::CharacterRecord;

/// Level for a given experience total. Always >= 1.
pub fn level_for_xp(xp: u64) -> u32 {
    let scaled = (xp as f64 / 100.0).powf(1.0 / 1.5);
    scaled.floor() as u32 + 1
}

/// One level gained. A multi-level jump yields one event per level, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    /// Experience total after the award that caused this level.
    pub xp: u64,
}

impl CharacterRecord {
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    /// Add experience and report every level crossed, in increasing order.
    pub fn add_xp(&mut self, amount: u64) -> Vec<LevelUp> {
        let before = self.level();
        self.xp = self.xp.saturating_add(amount);
        let after = self.level();
        (before + 1..=after)
            .map(|level| LevelUp { level, xp: self.xp })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_xp_is_level_one() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
    }

    #[test]
    fn curve_points() {
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(1000), 5);
        assert_eq!(level_for_xp(10_000), 22);
    }

    #[test]
    fn level_never_decreases() {
        let mut last = level_for_xp(0);
        for xp in (0..200_000u64).step_by(37) {
            let level = level_for_xp(xp);
            assert!(level >= 1);
            assert!(level >= last, "level dropped at xp {}", xp);
            last = level;
        }
    }

    #[test]
    fn jump_fires_one_event_per_level() {
        let mut c = CharacterRecord::new("p1", "Zed", 0);
        let events = c.add_xp(1000);
        let levels: Vec<u32> = events.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![2, 3, 4, 5]);
        assert!(events.iter().all(|e| e.xp == 1000));
    }

    #[test]
    fn small_award_fires_nothing() {
        let mut c = CharacterRecord::new("p1", "Zed", 0);
        assert!(c.add_xp(50).is_empty());
        assert_eq!(c.xp, 50);
        assert_eq!(c.add_xp(50).len(), 1);
    }
}
