mod engine;
mod phase;
mod service;

pub use engine::{SessionRecord, TimerEngine, TimerSnapshot, TimerState};
pub use phase::{SessionPhase, TimerConfig, ADJUST_STEP, MIN_REMAINING};
pub use service::TimerService;
