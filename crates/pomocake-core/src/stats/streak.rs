//! Consecutive-day streak counter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub last_session_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register activity on `today`.
    ///
    /// The streak moves at most once per calendar day: a second call on the
    /// same day changes nothing. Returns `true` if the state changed.
    pub fn update(&mut self, today: NaiveDate) -> bool {
        match self.last_session_date {
            Some(last) if last == today => return false,
            Some(last) if last.succ_opt() == Some(today) => {
                self.current_streak = self.current_streak.saturating_add(1);
            }
            // First session ever, or a gap of two days or more.
            _ => self.current_streak = 1,
        }
        self.last_session_date = Some(today);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn first_update_starts_streak() {
        let mut s = StreakState::new();
        assert!(s.update(day(0)));
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 1);
        assert_eq!(s.last_session_date, Some(day(0)));
    }

    #[test]
    fn same_day_is_idempotent() {
        let mut s = StreakState::new();
        s.update(day(0));
        s.update(day(1));
        let before = s.clone();
        assert!(!s.update(day(1)));
        assert_eq!(s, before);
    }

    #[test]
    fn consecutive_days_increment() {
        let mut s = StreakState::new();
        for n in 0..5 {
            s.update(day(n));
        }
        assert_eq!(s.current_streak, 5);
        assert_eq!(s.longest_streak, 5);
    }

    #[test]
    fn gap_resets_but_keeps_longest() {
        let mut s = StreakState::new();
        s.update(day(0));
        s.update(day(1));
        s.update(day(2));
        s.update(day(4));
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 3);
        assert_eq!(s.last_session_date, Some(day(4)));
    }

    proptest! {
        #[test]
        fn longest_never_below_current_and_never_decreases(
            steps in prop::collection::vec(0i64..4, 1..60)
        ) {
            let mut s = StreakState::new();
            let mut offset = 0;
            let mut prev_longest = 0;
            for step in steps {
                offset += step;
                s.update(day(offset));
                prop_assert!(s.current_streak <= s.longest_streak);
                prop_assert!(s.longest_streak >= prev_longest);
                prev_longest = s.longest_streak;
            }
        }
    }
}
