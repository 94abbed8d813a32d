//! Long-lived timer owner with a background 1-second tick.
//!
//! The engine and the handle of the tick task live behind one mutex. Every
//! command and every tick runs inside that critical section.
//!
//! Each tick task is bound to the engine's `run_id`. When a command stops or
//! restarts the timer, the old task is aborted, and any tick already in flight
//! finds a run id that no longer matches and leaves the engine alone. That
//! makes `pause()` final the moment it returns.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use super::engine::{TimerEngine, TimerSnapshot, TimerState};
use super::phase::{SessionPhase, TimerConfig};
use crate::error::CoreError;
use crate::events::Event;
use crate::stats::{Heatmap, StatisticsTracker};
use crate::storage::StatsStore;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 64;

struct Ticker {
    run_id: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    engine: TimerEngine,
    ticker: Option<Ticker>,
    stats_version: u64,
}

impl Inner {
    fn owned_by(&self, run_id: u64) -> bool {
        self.engine.is_running()
            && self.engine.run_id() == run_id
            && self.ticker.as_ref().map(|t| t.run_id) == Some(run_id)
    }

    fn stats_to_save(&mut self) -> (u64, StatisticsTracker) {
        self.stats_version += 1;
        (self.stats_version, self.engine.stats().clone())
    }
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<Event>,
    store: Arc<dyn StatsStore>,
    saved_version: Mutex<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every engine operation leaves it consistent, so a poisoned lock is
        // still safe to use.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn persist(&self, version: u64, stats: &StatisticsTracker) {
        let mut saved = self.saved_version.lock().unwrap_or_else(|e| e.into_inner());
        if version <= *saved {
            return;
        }
        match self.store.save(stats) {
            Ok(()) => *saved = version,
            Err(e) => warn!(error = %e, "failed to save statistics"),
        }
    }
}

/// Owns one [`TimerEngine`] and drives it from a tokio interval.
pub struct TimerService {
    shared: Arc<Shared>,
    runtime: Handle,
    tick_interval: Duration,
}

impl TimerService {
    /// Wrap `engine`, seeding it with whatever `store` has saved. A store that
    /// cannot be read is logged and ignored.
    pub fn new(engine: TimerEngine, store: Arc<dyn StatsStore>, runtime: Handle) -> Self {
        let engine = match store.load() {
            Ok(Some(stats)) => engine.with_stats(stats),
            Ok(None) => engine,
            Err(e) => {
                warn!(error = %e, "failed to load statistics, starting fresh");
                engine
            }
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    engine,
                    ticker: None,
                    stats_version: 0,
                }),
                events,
                store,
                saved_version: Mutex::new(0),
            }),
            runtime,
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Like [`TimerService::new`] on the ambient tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn on_current_runtime(
        engine: TimerEngine,
        store: Arc<dyn StatsStore>,
    ) -> Result<Self, CoreError> {
        let runtime = Handle::try_current()
            .map_err(|e| CoreError::Custom(format!("timer service needs a tokio runtime: {e}")))?;
        Ok(Self::new(engine, store, runtime))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock().engine.snapshot()
    }

    pub fn state(&self) -> TimerState {
        self.shared.lock().engine.state()
    }

    pub fn stats(&self) -> StatisticsTracker {
        self.shared.lock().engine.stats().clone()
    }

    pub fn heatmap(&self) -> Heatmap {
        self.shared.lock().engine.heatmap().clone()
    }

    pub fn config(&self) -> TimerConfig {
        self.shared.lock().engine.config().clone()
    }

    /// Whether a tick task currently owns the running segment.
    pub fn is_ticking(&self) -> bool {
        self.shared.lock().ticker.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self) -> Option<Event> {
        self.command(TimerEngine::start)
    }

    pub fn pause(&self) -> Option<Event> {
        self.command(TimerEngine::pause)
    }

    /// Start when paused, pause when running.
    pub fn toggle(&self) -> Option<Event> {
        self.command(|engine| {
            if engine.is_running() {
                engine.pause()
            } else {
                engine.start()
            }
        })
    }

    pub fn reset(&self) -> Option<Event> {
        self.command(TimerEngine::reset)
    }

    pub fn skip(&self) -> Option<Event> {
        self.command(TimerEngine::skip)
    }

    pub fn add_time(&self) -> Option<Event> {
        self.command(TimerEngine::add_time)
    }

    pub fn subtract_time(&self) -> Option<Event> {
        self.command(TimerEngine::subtract_time)
    }

    pub fn switch_to_phase(&self, phase: SessionPhase) -> Option<Event> {
        self.command(|engine| engine.switch_to_phase(phase))
    }

    pub fn update_config(&self, config: TimerConfig) -> Option<Event> {
        self.command(|engine| engine.update_config(config))
    }

    /// Tick right now instead of waiting for the interval.
    pub fn tick_now(&self) -> Option<Event> {
        self.command(TimerEngine::tick)
    }

    /// Pause and stop the tick task.
    pub fn shutdown(&self) -> Option<Event> {
        let event = self.pause();
        if let Some(ticker) = self.shared.lock().ticker.take() {
            ticker.handle.abort();
        }
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn command(&self, op: impl FnOnce(&mut TimerEngine) -> Option<Event>) -> Option<Event> {
        let (event, save) = {
            let mut inner = self.shared.lock();
            let event = op(&mut inner.engine);
            self.reconcile_ticker(&mut inner);
            let save = event.as_ref().map(|_| inner.stats_to_save());
            (event, save)
        };
        if let Some((version, stats)) = save {
            self.shared.persist(version, &stats);
        }
        if let Some(ref event) = event {
            self.shared.publish(event.clone());
        }
        event
    }

    /// Make the tick task match the engine: one task for the current run id
    /// while running, none otherwise.
    fn reconcile_ticker(&self, inner: &mut Inner) {
        if inner.engine.is_running() {
            let run_id = inner.engine.run_id();
            if inner.ticker.as_ref().map(|t| t.run_id) == Some(run_id) {
                return;
            }
            if let Some(old) = inner.ticker.take() {
                old.handle.abort();
            }
            let handle = self.runtime.spawn(run_ticker(
                Arc::clone(&self.shared),
                run_id,
                self.tick_interval,
            ));
            debug!(run_id, "tick task spawned");
            inner.ticker = Some(Ticker { run_id, handle });
        } else if let Some(old) = inner.ticker.take() {
            old.handle.abort();
            debug!(run_id = old.run_id, "tick task cancelled");
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        if let Some(ticker) = self.shared.lock().ticker.take() {
            ticker.handle.abort();
        }
    }
}

async fn run_ticker(shared: Arc<Shared>, mut run_id: u64, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        let (event, save, still_running) = {
            let mut inner = shared.lock();
            if !inner.owned_by(run_id) {
                return;
            }
            let event = inner.engine.tick();
            let still_running = inner.engine.is_running();
            if still_running {
                // A completed work phase auto-starts its break under a new
                // run id; this task carries on for it.
                run_id = inner.engine.run_id();
                if let Some(ticker) = inner.ticker.as_mut() {
                    ticker.run_id = run_id;
                }
            } else {
                inner.ticker = None;
            }
            let save = event.as_ref().map(|_| inner.stats_to_save());
            (event, save, still_running)
        };

        if let Some((version, stats)) = save {
            shared.persist(version, &stats);
        }
        if let Some(event) = event {
            shared.publish(event);
        }
        if !still_running {
            return;
        }
    }
}
