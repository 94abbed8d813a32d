use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed step used by add/subtract time.
pub const ADJUST_STEP: Duration = Duration::from_secs(5 * 60);

/// Lowest remaining time that subtracting can leave behind.
pub const MIN_REMAINING: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Work,
    LongWork,
    ShortBreak,
    LongBreak,
}

impl SessionPhase {
    pub const ALL: [SessionPhase; 4] = [
        SessionPhase::Work,
        SessionPhase::LongWork,
        SessionPhase::ShortBreak,
        SessionPhase::LongBreak,
    ];

    pub fn is_work(self) -> bool {
        matches!(self, SessionPhase::Work | SessionPhase::LongWork)
    }

    pub fn is_break(self) -> bool {
        !self.is_work()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SessionPhase::Work | SessionPhase::LongWork => "Work Session",
            SessionPhase::ShortBreak => "Short Break",
            SessionPhase::LongBreak => "Long Break",
        }
    }

    /// Message sent to the notification sink when this phase completes.
    pub fn completion_message(self) -> &'static str {
        match self {
            SessionPhase::Work => "Work session completed! Time for a break.",
            SessionPhase::LongWork => "Long work session completed! Time for a break.",
            SessionPhase::ShortBreak => "Short break completed! Ready to work?",
            SessionPhase::LongBreak => "Long break completed! Ready to work?",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Work => "work",
            SessionPhase::LongWork => "long_work",
            SessionPhase::ShortBreak => "short_break",
            SessionPhase::LongBreak => "long_break",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "w" => Ok(SessionPhase::Work),
            "long_work" | "lw" => Ok(SessionPhase::LongWork),
            "short_break" | "sb" => Ok(SessionPhase::ShortBreak),
            "long_break" | "lb" => Ok(SessionPhase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Engine-facing timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work_minutes: u32,
    pub long_work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub pomodoros_before_long_break: u32,
    pub notifications_enabled: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            long_work_minutes: 50,
            short_break_minutes: 5,
            long_break_minutes: 15,
            pomodoros_before_long_break: 4,
            notifications_enabled: true,
        }
    }
}

impl TimerConfig {
    /// Nominal length of a phase. Minutes are floored at 1 so a phase can
    /// never be configured to expire immediately.
    pub fn nominal(&self, phase: SessionPhase) -> Duration {
        let minutes = match phase {
            SessionPhase::Work => self.work_minutes,
            SessionPhase::LongWork => self.long_work_minutes,
            SessionPhase::ShortBreak => self.short_break_minutes,
            SessionPhase::LongBreak => self.long_break_minutes,
        };
        Duration::from_secs(u64::from(minutes.max(1)) * 60)
    }

    pub fn long_break_every(&self) -> u32 {
        self.pomodoros_before_long_break.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_nominal_durations() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.nominal(SessionPhase::Work), Duration::from_secs(25 * 60));
        assert_eq!(cfg.nominal(SessionPhase::LongWork), Duration::from_secs(50 * 60));
        assert_eq!(cfg.nominal(SessionPhase::ShortBreak), Duration::from_secs(5 * 60));
        assert_eq!(cfg.nominal(SessionPhase::LongBreak), Duration::from_secs(15 * 60));
    }

    #[test]
    fn zero_minutes_floor_to_one() {
        let cfg = TimerConfig {
            short_break_minutes: 0,
            pomodoros_before_long_break: 0,
            ..TimerConfig::default()
        };
        assert_eq!(cfg.nominal(SessionPhase::ShortBreak), MIN_REMAINING);
        assert_eq!(cfg.long_break_every(), 1);
    }

    #[test]
    fn phase_parses_short_and_long_names() {
        assert_eq!("lw".parse::<SessionPhase>(), Ok(SessionPhase::LongWork));
        assert_eq!("short-break".parse::<SessionPhase>(), Ok(SessionPhase::ShortBreak));
        assert!("nap".parse::<SessionPhase>().is_err());
        for phase in SessionPhase::ALL {
            assert_eq!(phase.to_string().parse::<SessionPhase>(), Ok(phase));
        }
    }

    #[test]
    fn work_like_classification() {
        assert!(SessionPhase::Work.is_work());
        assert!(SessionPhase::LongWork.is_work());
        assert!(SessionPhase::ShortBreak.is_break());
        assert!(SessionPhase::LongBreak.is_break());
    }
}
