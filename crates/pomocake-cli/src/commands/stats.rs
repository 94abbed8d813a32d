use chrono::Local;
use clap::Subcommand;
use pomocake_core::format::format_total;
use pomocake_core::{Config, Heatmap, JsonStatsStore, StatisticsTracker, StatsStore};
use serde::Serialize;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Totals for the current week (Sunday to today)
    Week,
    /// Totals for the current month
    Month,
    /// Current and longest streak
    Streak,
    /// Activity over the last year
    Heatmap {
        /// Print the cell data as JSON instead of a grid
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Totals {
    work: String,
    #[serde(rename = "break")]
    break_: String,
    completed_pomodoros: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    if !config.stats.persist {
        eprintln!(
            "note: statistics are not persisted; enable with `config set stats.persist true`"
        );
    }

    let today = Local::now().date_naive();
    let store = JsonStatsStore::open_default()?;
    let mut stats = store.load()?.unwrap_or_else(|| StatisticsTracker::new(today));
    stats.check_daily_rollover(today);

    match action {
        StatsAction::Today => {
            let day = stats.today();
            let totals = Totals {
                work: format_total(day.total_work_time),
                break_: format_total(day.total_break_time),
                completed_pomodoros: day.completed_pomodoros,
            };
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        StatsAction::Week | StatsAction::Month => {
            let period = if matches!(action, StatsAction::Week) {
                stats.week_totals(today)
            } else {
                stats.month_totals(today)
            };
            let totals = Totals {
                work: format_total(period.work_time),
                break_: format_total(period.break_time),
                completed_pomodoros: period.completed_pomodoros,
            };
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        StatsAction::Streak => {
            println!("{}", serde_json::to_string_pretty(stats.streak())?);
        }
        StatsAction::Heatmap { json } => {
            let heatmap = Heatmap::build(stats.daily_counts(), today);
            if json {
                println!("{}", serde_json::to_string_pretty(&heatmap)?);
            } else {
                print!("{}", heatmap.render_text());
                println!("{} sessions in the last year", heatmap.total_sessions());
            }
        }
    }
    Ok(())
}
