//! Daily usage totals and streak bookkeeping.
//!
//! The tracker keeps one live bucket for the current day. When the date moves
//! on, the live bucket is archived into `history` and a zeroed one takes its
//! place. Weekly and monthly figures are folded from the archive plus the
//! live bucket.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::streak::StreakState;
use crate::format::duration_secs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub date: NaiveDate,
    #[serde(with = "duration_secs")]
    pub total_work_time: Duration,
    #[serde(with = "duration_secs")]
    pub total_break_time: Duration,
    pub completed_pomodoros: u32,
}

impl DailyStatistics {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total_work_time: Duration::ZERO,
            total_break_time: Duration::ZERO,
            completed_pomodoros: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.total_work_time.is_zero()
            && self.total_break_time.is_zero()
            && self.completed_pomodoros == 0
    }

    fn merge(&mut self, other: &DailyStatistics) {
        self.total_work_time += other.total_work_time;
        self.total_break_time += other.total_break_time;
        self.completed_pomodoros += other.completed_pomodoros;
    }
}

/// Totals over a range of days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    #[serde(with = "duration_secs")]
    pub work_time: Duration,
    #[serde(with = "duration_secs")]
    pub break_time: Duration,
    pub completed_pomodoros: u32,
}

impl PeriodTotals {
    fn add(&mut self, day: &DailyStatistics) {
        self.work_time += day.total_work_time;
        self.break_time += day.total_break_time;
        self.completed_pomodoros += day.completed_pomodoros;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsTracker {
    today: DailyStatistics,
    #[serde(default)]
    history: BTreeMap<NaiveDate, DailyStatistics>,
    #[serde(default)]
    streak: StreakState,
    /// Completed pomodoros per day, the heatmap's input.
    #[serde(default)]
    daily_counts: BTreeMap<NaiveDate, u32>,
    #[serde(default)]
    lifetime_pomodoros: u32,
}

impl StatisticsTracker {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: DailyStatistics::new(today),
            history: BTreeMap::new(),
            streak: StreakState::new(),
            daily_counts: BTreeMap::new(),
            lifetime_pomodoros: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The live bucket. Its date is the day of the last start or credit, which
    /// may lag behind the calendar while the timer sits idle.
    pub fn today(&self) -> &DailyStatistics {
        &self.today
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn daily_counts(&self) -> &BTreeMap<NaiveDate, u32> {
        &self.daily_counts
    }

    pub fn lifetime_pomodoros(&self) -> u32 {
        self.lifetime_pomodoros
    }

    /// Statistics for an arbitrary day, from the live bucket or the archive.
    pub fn day(&self, date: NaiveDate) -> DailyStatistics {
        if self.today.date == date {
            return self.today.clone();
        }
        self.history
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyStatistics::new(date))
    }

    /// Totals for the Sunday-started week containing `today`.
    pub fn week_totals(&self, today: NaiveDate) -> PeriodTotals {
        let offset = i64::from(today.weekday().num_days_from_sunday());
        let start = today - chrono::Duration::days(offset);
        self.totals_between(start, today)
    }

    /// Totals for the calendar month containing `today`.
    pub fn month_totals(&self, today: NaiveDate) -> PeriodTotals {
        let start = today.with_day(1).unwrap_or(today);
        self.totals_between(start, today)
    }

    fn totals_between(&self, start: NaiveDate, end: NaiveDate) -> PeriodTotals {
        let mut totals = PeriodTotals::default();
        for day in self.history.range(start..=end).map(|(_, d)| d) {
            totals.add(day);
        }
        if (start..=end).contains(&self.today.date) {
            totals.add(&self.today);
        }
        totals
    }

    // ── Updates ──────────────────────────────────────────────────────

    /// Credit a running segment to today's work or break total and register
    /// activity for the streak. A segment that ran past midnight lands on the
    /// day it ended.
    pub fn record_elapsed(&mut self, duration: Duration, is_work: bool, today: NaiveDate) {
        self.check_daily_rollover(today);
        if is_work {
            self.today.total_work_time += duration;
        } else {
            self.today.total_break_time += duration;
        }
        self.update_streak(today);
    }

    pub fn update_streak(&mut self, today: NaiveDate) -> bool {
        self.streak.update(today)
    }

    /// Count one completed pomodoro for `today`.
    pub fn record_pomodoro(&mut self, today: NaiveDate) {
        self.check_daily_rollover(today);
        self.today.completed_pomodoros += 1;
        *self.daily_counts.entry(today).or_insert(0) += 1;
        self.lifetime_pomodoros += 1;
    }

    /// Swap in a fresh bucket if the calendar has moved past the live one.
    /// Returns `true` if a rollover happened.
    pub fn check_daily_rollover(&mut self, today: NaiveDate) -> bool {
        if self.today.date == today {
            return false;
        }
        let fresh = self
            .history
            .remove(&today)
            .unwrap_or_else(|| DailyStatistics::new(today));
        let previous = std::mem::replace(&mut self.today, fresh);
        if !previous.is_empty() {
            self.history
                .entry(previous.date)
                .and_modify(|d| d.merge(&previous))
                .or_insert(previous);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mins(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn elapsed_goes_to_matching_bucket() {
        let today = date(2024, 5, 6);
        let mut t = StatisticsTracker::new(today);
        t.record_elapsed(mins(25), true, today);
        t.record_elapsed(mins(5), false, today);
        t.record_elapsed(mins(10), true, today);

        assert_eq!(t.today().total_work_time, mins(35));
        assert_eq!(t.today().total_break_time, mins(5));
        assert_eq!(t.streak().current_streak, 1);
    }

    #[test]
    fn rollover_zeroes_live_bucket_and_archives() {
        let monday = date(2024, 5, 6);
        let tuesday = date(2024, 5, 7);
        let mut t = StatisticsTracker::new(monday);
        t.record_elapsed(mins(25), true, monday);
        t.record_pomodoro(monday);

        assert!(!t.check_daily_rollover(monday));
        assert!(t.check_daily_rollover(tuesday));
        assert_eq!(t.today().date, tuesday);
        assert_eq!(t.today().total_work_time, Duration::ZERO);
        assert_eq!(t.today().completed_pomodoros, 0);
        assert_eq!(t.day(monday).total_work_time, mins(25));
        assert_eq!(t.day(monday).completed_pomodoros, 1);
    }

    #[test]
    fn empty_days_are_not_archived() {
        let mut t = StatisticsTracker::new(date(2024, 5, 6));
        t.check_daily_rollover(date(2024, 5, 7));
        t.check_daily_rollover(date(2024, 5, 8));
        assert!(t.history.is_empty());
    }

    #[test]
    fn week_and_month_totals_span_rollovers() {
        // 2024-05-05 is a Sunday.
        let sunday = date(2024, 5, 5);
        let mut t = StatisticsTracker::new(date(2024, 4, 30));
        t.record_elapsed(mins(50), true, date(2024, 4, 30));
        t.record_pomodoro(date(2024, 4, 30));

        t.check_daily_rollover(sunday);
        t.record_elapsed(mins(25), true, sunday);
        t.record_pomodoro(sunday);

        let wednesday = date(2024, 5, 8);
        t.check_daily_rollover(wednesday);
        t.record_elapsed(mins(25), true, wednesday);
        t.record_elapsed(mins(5), false, wednesday);
        t.record_pomodoro(wednesday);

        let week = t.week_totals(wednesday);
        assert_eq!(week.work_time, mins(50));
        assert_eq!(week.break_time, mins(5));
        assert_eq!(week.completed_pomodoros, 2);

        let month = t.month_totals(wednesday);
        assert_eq!(month.work_time, mins(50));
        assert_eq!(month.completed_pomodoros, 2);

        let april = t.month_totals(date(2024, 4, 30));
        assert_eq!(april.work_time, mins(50));
        assert_eq!(april.completed_pomodoros, 1);
    }

    #[test]
    fn credits_after_midnight_roll_the_bucket_first() {
        let monday = date(2024, 5, 6);
        let tuesday = date(2024, 5, 7);
        let mut t = StatisticsTracker::new(monday);
        t.record_elapsed(mins(10), true, monday);

        t.record_elapsed(mins(25), true, tuesday);
        t.record_pomodoro(tuesday);

        assert_eq!(t.today().date, tuesday);
        assert_eq!(t.today().completed_pomodoros, 1);
        assert_eq!(t.day(monday).total_work_time, mins(10));
        assert_eq!(t.day(monday).completed_pomodoros, 0);
        assert_eq!(t.daily_counts().get(&tuesday), Some(&1));
        assert_eq!(t.daily_counts().get(&monday), None);
    }

    #[test]
    fn pomodoros_feed_daily_counts() {
        let today = date(2024, 5, 6);
        let mut t = StatisticsTracker::new(today);
        t.record_pomodoro(today);
        t.record_pomodoro(today);
        assert_eq!(t.daily_counts().get(&today), Some(&2));
        assert_eq!(t.lifetime_pomodoros(), 2);
    }

    #[test]
    fn tracker_serde_roundtrip_keeps_history() {
        let monday = date(2024, 5, 6);
        let mut t = StatisticsTracker::new(monday);
        t.record_elapsed(mins(25), true, monday);
        t.record_pomodoro(monday);
        t.check_daily_rollover(date(2024, 5, 7));

        let json = serde_json::to_string(&t).unwrap();
        let back: StatisticsTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
