use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionPhase, SessionRecord};

/// Every state change in the timer produces an Event.
/// Hosts render from these (or from snapshots); nothing is pushed into a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: SessionPhase,
        remaining_secs: u64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: SessionPhase,
        remaining_secs: u64,
        /// Time credited to statistics for the segment that just ended.
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: SessionPhase,
        remaining_secs: u64,
        /// Credited time of the segment this stopped, 0 if it was paused.
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        from: SessionPhase,
        to: SessionPhase,
        remaining_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimeAdjusted {
        phase: SessionPhase,
        remaining_secs: u64,
        delta_secs: i64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: SessionPhase,
        to: SessionPhase,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero and the engine moved on.
    PhaseCompleted {
        record: SessionRecord,
        next: SessionPhase,
        /// `true` when the next phase (a break) started on its own.
        auto_started: bool,
        completed_pomodoros: u32,
        at: DateTime<Utc>,
    },
    ConfigUpdated {
        phase: SessionPhase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PhaseSwitched { at, .. }
            | Event::TimeAdjusted { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::ConfigUpdated { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let event = Event::TimerSkipped {
            from: SessionPhase::Work,
            to: SessionPhase::ShortBreak,
            elapsed_secs: 90,
            at,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerSkipped");
        assert_eq!(json["from"], "work");
        assert_eq!(json["to"], "short_break");
        assert_eq!(json["elapsed_secs"], 90);
        assert_eq!(event.at(), at);
    }
}
