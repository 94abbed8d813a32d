//! # Pomocake Core Library
//!
//! This library provides the core logic for the Pomocake Pomodoro timer:
//! the phase state machine, daily statistics, streaks and the activity
//! heatmap. The CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Timer Service**: Owns an engine and drives it from a 1-second tokio tick
//! - **Statistics**: Daily buckets, streak tracking and a 52-week heatmap
//! - **Storage**: TOML-based configuration and an optional JSON statistics store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`]: Background ticking and event fan-out
//! - [`StatisticsTracker`]: Work/break totals and pomodoro counts
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, NotifyError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{LogSink, NotificationSink, NullSink, RecordingSink};
pub use stats::{DailyStatistics, Heatmap, HeatmapCell, StatisticsTracker, StreakState};
pub use storage::{Config, JsonStatsStore, MemoryStore, StatsStore};
pub use timer::{
    SessionPhase, SessionRecord, TimerConfig, TimerEngine, TimerService, TimerSnapshot, TimerState,
};
