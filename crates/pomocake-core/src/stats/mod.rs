//! Usage statistics for Pomocake sessions: daily totals, streaks and the
//! year-long heatmap.

mod heatmap;
mod streak;
mod tracker;

pub use heatmap::{
    color_bucket, Heatmap, HeatmapCell, HeatmapMonth, HeatmapWeek, BUCKET_COLORS, WEEK_PITCH,
};
pub use streak::StreakState;
pub use tracker::{DailyStatistics, PeriodTotals, StatisticsTracker};
