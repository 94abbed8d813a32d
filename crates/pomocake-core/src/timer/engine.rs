//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not own a
//! thread: something (usually [`TimerService`](super::TimerService)) calls
//! `tick()` once a second while the timer runs, and remaining time is always
//! recomputed from the end timestamp rather than counted down.
//!
//! ## Cycle
//!
//! ```text
//! Work -(expire)-> ShortBreak (auto-start) -(expire)-> Work (paused)
//!  every Nth pomodoro:
//! Work -(expire)-> LongBreak  (auto-start) -(expire)-> Work (paused)
//! LongWork -(expire)-> ShortBreak (auto-start)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default(), clock, sink);
//! engine.start();
//! // Once a second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted) when a phase runs out
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::phase::{SessionPhase, TimerConfig, ADJUST_STEP, MIN_REMAINING};
use crate::clock::Clock;
use crate::events::Event;
use crate::format::{duration_secs, format_clock};
use crate::notify::NotificationSink;
use crate::stats::{DailyStatistics, Heatmap, StatisticsTracker, StreakState};

const NOTIFICATION_TITLE: &str = "Pomodoro Timer";

/// Plain view of the timer's position.
///
/// `is_running` implies `end_at` is set and `remaining == max(0, end_at - now)`
/// as of the last refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: SessionPhase,
    #[serde(with = "duration_secs")]
    pub remaining: Duration,
    pub is_running: bool,
    pub end_at: Option<DateTime<Utc>>,
}

/// A phase that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub phase: SessionPhase,
    #[serde(with = "duration_secs")]
    pub actual_duration: Duration,
    pub completed_at: DateTime<Utc>,
}

/// Everything a UI needs to draw the timer screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: SessionPhase,
    pub display_name: String,
    pub remaining_secs: u64,
    pub remaining_display: String,
    pub nominal_secs: u64,
    /// 0.0 .. 1.0 progress within the current phase.
    pub progress: f64,
    pub is_running: bool,
    pub ends_at: Option<DateTime<Utc>>,
    pub completed_pomodoros: u32,
    /// e.g. "2/4 Sessions".
    pub cycle_position: String,
    pub today: DailyStatistics,
    pub streak: StreakState,
    pub at: DateTime<Utc>,
}

/// Core timer engine.
pub struct TimerEngine {
    config: TimerConfig,
    phase: SessionPhase,
    remaining: Duration,
    /// Set exactly while running.
    end_at: Option<DateTime<Utc>>,
    segment_started_at: Option<DateTime<Utc>>,
    /// Remaining time when the current segment started. Caps the credit so a
    /// late tick never counts more than the segment could have lasted.
    segment_planned: Duration,
    /// Bumped on every start; identifies one continuous running segment.
    run_id: u64,
    completed_pomodoros: u32,
    stats: StatisticsTracker,
    heatmap: Heatmap,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("phase", &self.phase)
            .field("remaining", &self.remaining)
            .field("end_at", &self.end_at)
            .field("run_id", &self.run_id)
            .field("completed_pomodoros", &self.completed_pomodoros)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an engine sitting paused at the start of a work phase, with
    /// empty statistics.
    pub fn new(
        config: TimerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let today = clock.today();
        let stats = StatisticsTracker::new(today);
        let heatmap = Heatmap::build(stats.daily_counts(), today);
        let remaining = config.nominal(SessionPhase::Work);
        Self {
            config,
            phase: SessionPhase::Work,
            remaining,
            end_at: None,
            segment_started_at: None,
            segment_planned: Duration::ZERO,
            run_id: 0,
            completed_pomodoros: 0,
            stats,
            heatmap,
            clock,
            sink,
        }
    }

    /// Replace the statistics, e.g. with ones loaded from a store.
    pub fn with_stats(mut self, stats: StatisticsTracker) -> Self {
        self.stats = stats;
        self.heatmap = Heatmap::build(self.stats.daily_counts(), self.clock.today());
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.end_at.is_some()
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.end_at
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatisticsTracker {
        &self.stats
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn nominal(&self) -> Duration {
        self.config.nominal(self.phase)
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            remaining: self.remaining,
            is_running: self.is_running(),
            end_at: self.end_at,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.nominal().as_secs_f64();
        if total == 0.0 {
            return 0.0;
        }
        (1.0 - self.remaining.as_secs_f64() / total).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let every = self.config.long_break_every();
        TimerSnapshot {
            phase: self.phase,
            display_name: self.phase.display_name().to_string(),
            remaining_secs: self.remaining.as_secs(),
            remaining_display: format_clock(self.remaining),
            nominal_secs: self.nominal().as_secs(),
            progress: self.progress(),
            is_running: self.is_running(),
            ends_at: self.end_at,
            completed_pomodoros: self.completed_pomodoros,
            cycle_position: format!(
                "{}/{} Sessions",
                self.completed_pomodoros % every + 1,
                every
            ),
            today: self.stats.today().clone(),
            streak: self.stats.streak().clone(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn switch_to_phase(&mut self, phase: SessionPhase) -> Option<Event> {
        let now = self.clock.now();
        let from = self.phase;
        let elapsed = self.stop_segment(now);
        self.set_phase(phase);
        debug!(%from, to = %phase, "phase switched");
        Some(Event::PhaseSwitched {
            from,
            to: phase,
            remaining_secs: self.remaining.as_secs(),
            elapsed_secs: elapsed.as_secs(),
            at: now,
        })
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        let now = self.clock.now();
        self.check_daily_rollover();
        let ends_at = self.begin_segment(now);
        debug!(phase = %self.phase, remaining = self.remaining.as_secs(), "timer started");
        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            ends_at,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        let now = self.clock.now();
        let elapsed = self.stop_segment(now);
        debug!(phase = %self.phase, elapsed = elapsed.as_secs(), "timer paused");
        Some(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            elapsed_secs: elapsed.as_secs(),
            at: now,
        })
    }

    /// Pause, then rewind to the full nominal duration of the current phase.
    pub fn reset(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let elapsed = self.stop_segment(now);
        self.remaining = self.nominal();
        Some(Event::TimerReset {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            elapsed_secs: elapsed.as_secs(),
            at: now,
        })
    }

    pub fn add_time(&mut self) -> Option<Event> {
        self.adjust(|remaining| remaining + ADJUST_STEP, ADJUST_STEP.as_secs() as i64)
    }

    /// Take a step off the clock. Never leaves less than a minute, so an
    /// adjustment cannot make the phase expire on the spot.
    pub fn subtract_time(&mut self) -> Option<Event> {
        self.adjust(
            |remaining| remaining.saturating_sub(ADJUST_STEP).max(MIN_REMAINING),
            -(ADJUST_STEP.as_secs() as i64),
        )
    }

    /// Abandon the current phase and move to the one that would follow it.
    /// Skipping is not a completion: no pomodoro is counted, nothing is
    /// notified, and the next phase waits for `start()`.
    pub fn skip(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let from = self.phase;
        let elapsed = self.stop_segment(now);
        let to = self.next_phase_after(from);
        self.set_phase(to);
        debug!(%from, %to, "phase skipped");
        Some(Event::TimerSkipped {
            from,
            to,
            elapsed_secs: elapsed.as_secs(),
            at: now,
        })
    }

    /// Refresh remaining time. Returns `Some(Event::PhaseCompleted)` when the
    /// running phase hits zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        let now = self.clock.now();
        self.refresh_remaining(now);
        if !self.remaining.is_zero() {
            return None;
        }
        Some(self.complete_phase(now))
    }

    /// Apply new settings. A paused timer whose phase length changed is
    /// rewound to the new length; a running one keeps its deadline.
    pub fn update_config(&mut self, config: TimerConfig) -> Option<Event> {
        let old_nominal = self.nominal();
        self.config = config;
        if !self.is_running() && self.nominal() != old_nominal {
            self.remaining = self.nominal();
        }
        Some(Event::ConfigUpdated {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self, now: DateTime<Utc>) -> Event {
        let completed = self.phase;
        let actual_duration = self.stop_segment(now);
        let today = self.clock.today();

        if completed == SessionPhase::Work {
            self.completed_pomodoros += 1;
            self.stats.record_pomodoro(today);
            self.heatmap = Heatmap::build(self.stats.daily_counts(), today);
        }

        let next = self.next_phase_after(completed);
        self.set_phase(next);

        let auto_started = completed.is_work();
        if auto_started {
            self.begin_segment(now);
        }

        self.send_notification(completed);
        info!(
            phase = %completed,
            %next,
            pomodoros = self.completed_pomodoros,
            "phase completed"
        );

        Event::PhaseCompleted {
            record: SessionRecord {
                phase: completed,
                actual_duration,
                completed_at: now,
            },
            next,
            auto_started,
            completed_pomodoros: self.completed_pomodoros,
            at: now,
        }
    }

    fn next_phase_after(&self, phase: SessionPhase) -> SessionPhase {
        let every = self.config.long_break_every();
        if phase == SessionPhase::Work
            && self.completed_pomodoros > 0
            && self.completed_pomodoros % every == 0
        {
            SessionPhase::LongBreak
        } else if phase.is_work() {
            SessionPhase::ShortBreak
        } else {
            SessionPhase::Work
        }
    }

    fn adjust(
        &mut self,
        apply: impl FnOnce(Duration) -> Duration,
        delta_secs: i64,
    ) -> Option<Event> {
        let now = self.clock.now();
        let was_running = self.is_running();
        if was_running {
            self.stop_segment(now);
        }
        self.remaining = apply(self.remaining);
        if was_running {
            self.check_daily_rollover();
            self.begin_segment(now);
        }
        Some(Event::TimeAdjusted {
            phase: self.phase,
            remaining_secs: self.remaining.as_secs(),
            delta_secs,
            at: now,
        })
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.remaining = self.config.nominal(phase);
    }

    fn begin_segment(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let span = chrono::Duration::from_std(self.remaining)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let ends_at = now + span;
        self.segment_started_at = Some(now);
        self.segment_planned = self.remaining;
        self.end_at = Some(ends_at);
        self.run_id += 1;
        ends_at
    }

    /// End the running segment, if any, and credit it to statistics.
    /// Returns the credited duration.
    fn stop_segment(&mut self, now: DateTime<Utc>) -> Duration {
        if !self.is_running() {
            return Duration::ZERO;
        }
        self.refresh_remaining(now);
        let elapsed = self
            .segment_started_at
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or(Duration::ZERO)
            .min(self.segment_planned);
        self.end_at = None;
        self.segment_started_at = None;
        self.check_daily_rollover();
        self.stats
            .record_elapsed(elapsed, self.phase.is_work(), self.clock.today());
        elapsed
    }

    fn refresh_remaining(&mut self, now: DateTime<Utc>) {
        if let Some(end) = self.end_at {
            self.remaining = (end - now).to_std().unwrap_or(Duration::ZERO);
        }
    }

    fn check_daily_rollover(&mut self) {
        let today = self.clock.today();
        if self.stats.check_daily_rollover(today) {
            info!(%today, "daily statistics rolled over");
        }
        if self.heatmap.today != today {
            self.heatmap = Heatmap::build(self.stats.daily_counts(), today);
        }
    }

    fn send_notification(&self, completed: SessionPhase) {
        if !self.config.notifications_enabled {
            return;
        }
        if let Err(e) = self
            .sink
            .notify(NOTIFICATION_TITLE, completed.completion_message())
        {
            warn!(error = %e, "failed to send notification");
        }
    }
}
