use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use pomocake_core::error::NotifyError;
use pomocake_core::format::format_clock;
use pomocake_core::{
    Config, Event, JsonStatsStore, MemoryStore, NotificationSink, SessionPhase, StatsStore,
    SystemClock, TimerEngine, TimerService, TimerSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Phase to begin in (work, long_work, short_break, long_break)
    #[arg(long)]
    phase: Option<SessionPhase>,
    /// Start the timer immediately
    #[arg(long)]
    start: bool,
    /// Print events as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

/// A line typed while the timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Reset,
    AddTime,
    SubtractTime,
    Skip,
    Switch(SessionPhase),
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim() {
        "s" | "start" | "pause" => Input::Toggle,
        "r" | "reset" => Input::Reset,
        "+" => Input::AddTime,
        "-" => Input::SubtractTime,
        "n" | "skip" => Input::Skip,
        "?" | "status" => Input::Status,
        "h" | "help" => Input::Help,
        "q" | "quit" => Input::Quit,
        other => Input::Switch(other.parse().ok()?),
    };
    Some(input)
}

const HELP: &str = "\
commands:
  s        start / pause
  r        reset the current phase
  + / -    add / subtract 5 minutes
  n        skip to the next phase
  w lw sb lb  switch to work, long work, short break, long break
  ?        show status
  q        quit";

/// Prints to the terminal and, when enabled, raises a desktop notification
/// through `notify-send`.
struct TerminalSink {
    desktop: bool,
}

impl NotificationSink for TerminalSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        println!("\r\x07[{title}] {message}");
        if !self.desktop {
            return Ok(());
        }
        let mut child = std::process::Command::new("notify-send")
            .arg(title)
            .arg(message)
            .spawn()
            .map_err(|e| NotifyError::Unavailable(format!("notify-send: {e}")))?;
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                debug!(error = %e, "notify-send did not exit cleanly");
            }
        });
        Ok(())
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::TimerStarted {
            phase,
            remaining_secs,
            ..
        } => format!(
            "{} started, {} left",
            phase.display_name(),
            format_clock(Duration::from_secs(*remaining_secs))
        ),
        Event::TimerPaused {
            phase,
            remaining_secs,
            ..
        } => format!(
            "{} paused at {}",
            phase.display_name(),
            format_clock(Duration::from_secs(*remaining_secs))
        ),
        Event::TimerReset {
            phase,
            remaining_secs,
            ..
        } => format!(
            "{} reset to {}",
            phase.display_name(),
            format_clock(Duration::from_secs(*remaining_secs))
        ),
        Event::PhaseSwitched {
            to, remaining_secs, ..
        } => format!(
            "switched to {} ({})",
            to.display_name(),
            format_clock(Duration::from_secs(*remaining_secs))
        ),
        Event::TimeAdjusted {
            remaining_secs,
            delta_secs,
            ..
        } => format!(
            "{}{} min, {} left",
            if *delta_secs >= 0 { "+" } else { "-" },
            delta_secs.unsigned_abs() / 60,
            format_clock(Duration::from_secs(*remaining_secs))
        ),
        Event::TimerSkipped { from, to, .. } => {
            format!("skipped {}, next up: {}", from.display_name(), to.display_name())
        }
        Event::PhaseCompleted {
            record,
            next,
            auto_started,
            completed_pomodoros,
            ..
        } => format!(
            "{} done ({} pomodoros), {} {}",
            record.phase.display_name(),
            completed_pomodoros,
            next.display_name(),
            if *auto_started { "started" } else { "is ready" }
        ),
        Event::ConfigUpdated { .. } => "configuration updated".to_string(),
    }
}

fn status_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "{} {} [{}] {}",
        snapshot.display_name,
        snapshot.remaining_display,
        snapshot.cycle_position,
        if snapshot.is_running { "running" } else { "paused" }
    )
}

fn apply(service: &TimerService, input: Input) -> Option<Event> {
    match input {
        Input::Toggle => service.toggle(),
        Input::Reset => service.reset(),
        Input::AddTime => service.add_time(),
        Input::SubtractTime => service.subtract_time(),
        Input::Skip => service.skip(),
        Input::Switch(phase) => service.switch_to_phase(phase),
        Input::Status | Input::Help | Input::Quit => None,
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(args))
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store: Arc<dyn StatsStore> = if config.stats.persist {
        Arc::new(JsonStatsStore::open_default()?)
    } else {
        Arc::new(MemoryStore::default())
    };
    let sink = Arc::new(TerminalSink {
        desktop: config.notifications.desktop,
    });
    let engine = TimerEngine::new(config.timer_config(), Arc::new(SystemClock), sink);
    let service = TimerService::on_current_runtime(engine, store)?;
    let mut events = service.subscribe();

    if !args.json {
        println!("{HELP}");
    }
    if let Some(phase) = args.phase {
        service.switch_to_phase(phase);
    }
    if args.start {
        service.start();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Some(Input::Quit) => break,
                    Some(Input::Help) => println!("{HELP}"),
                    Some(Input::Status) => println!("{}", status_line(&service.snapshot())),
                    Some(input) => {
                        if apply(&service, input).is_none() {
                            debug!(?input, "command had no effect");
                        }
                    }
                    None => eprintln!("unknown command: {}", line.trim()),
                }
            }
            event = events.recv() => match event {
                Ok(event) if args.json => println!("{}", serde_json::to_string(&event)?),
                Ok(event) => println!("\r{:<48}", describe(&event)),
                Err(RecvError::Lagged(missed)) => warn!(missed, "event output fell behind"),
                Err(RecvError::Closed) => break,
            },
            _ = status.tick(), if !args.json => {
                let snapshot = service.snapshot();
                if snapshot.is_running {
                    print!("\r{:<48}", status_line(&snapshot));
                    std::io::stdout().flush()?;
                }
            }
        }
    }

    if let Some(event) = service.shutdown() {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("\r{:<48}", describe(&event));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_key_commands() {
        assert_eq!(parse_input("s"), Some(Input::Toggle));
        assert_eq!(parse_input(" r "), Some(Input::Reset));
        assert_eq!(parse_input("+"), Some(Input::AddTime));
        assert_eq!(parse_input("-"), Some(Input::SubtractTime));
        assert_eq!(parse_input("n"), Some(Input::Skip));
        assert_eq!(parse_input("q"), Some(Input::Quit));
    }

    #[test]
    fn parses_phase_switches() {
        assert_eq!(parse_input("w"), Some(Input::Switch(SessionPhase::Work)));
        assert_eq!(parse_input("lw"), Some(Input::Switch(SessionPhase::LongWork)));
        assert_eq!(parse_input("sb"), Some(Input::Switch(SessionPhase::ShortBreak)));
        assert_eq!(
            parse_input("long-break"),
            Some(Input::Switch(SessionPhase::LongBreak))
        );
        assert_eq!(parse_input("coffee"), None);
    }

    #[test]
    fn describes_adjustments_with_sign() {
        let at = chrono::Utc::now();
        let event = Event::TimeAdjusted {
            phase: SessionPhase::Work,
            remaining_secs: 20 * 60,
            delta_secs: -300,
            at,
        };
        assert_eq!(describe(&event), "-5 min, 20:00 left");
    }
}
