//! Year-long session heatmap.
//!
//! Lays out the trailing 365 days as Sunday-started week columns, colors each
//! day by how many pomodoros were completed, and derives the month labels
//! drawn above the grid.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Horizontal space taken by one week column: a 12px square plus 3px gap.
pub const WEEK_PITCH: f64 = 15.0;

const LOOKBACK_DAYS: i64 = 364;

/// Hex color per bucket, from empty to busiest.
pub const BUCKET_COLORS: [&str; 5] = ["#374151", "#0E4429", "#006D32", "#26A641", "#39D353"];

const BUCKET_GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];

/// Bucket a session count: 0, 1, 2-3, 4-5, 6+.
pub fn color_bucket(session_count: u32) -> u8 {
    match session_count {
        0 => 0,
        1 => 1,
        2 | 3 => 2,
        4 | 5 => 3,
        _ => 4,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub session_count: u32,
    pub color_bucket: u8,
    /// `None` for filler days after today.
    pub tooltip: Option<String>,
    pub is_filler: bool,
}

impl HeatmapCell {
    fn real(date: NaiveDate, session_count: u32) -> Self {
        let plural = if session_count == 1 { "" } else { "s" };
        Self {
            date,
            session_count,
            color_bucket: color_bucket(session_count),
            tooltip: Some(format!(
                "{}: {} session{}",
                date.format("%b %d, %Y"),
                session_count,
                plural
            )),
            is_filler: false,
        }
    }

    fn filler(date: NaiveDate) -> Self {
        Self {
            date,
            session_count: 0,
            color_bucket: 0,
            tooltip: None,
            is_filler: true,
        }
    }

    pub fn color(&self) -> &'static str {
        BUCKET_COLORS[usize::from(self.color_bucket.min(4))]
    }

    pub fn glyph(&self) -> char {
        if self.is_filler {
            ' '
        } else {
            BUCKET_GLYPHS[usize::from(self.color_bucket.min(4))]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapWeek {
    pub days: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMonth {
    pub label: String,
    /// Number of week columns under this label.
    pub weeks: usize,
    pub width: f64,
}

impl HeatmapMonth {
    fn new(label: String, weeks: usize) -> Self {
        Self {
            label,
            weeks,
            width: weeks as f64 * WEEK_PITCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub today: NaiveDate,
    pub weeks: Vec<HeatmapWeek>,
    pub months: Vec<HeatmapMonth>,
}

impl Heatmap {
    pub fn build(daily_counts: &BTreeMap<NaiveDate, u32>, today: NaiveDate) -> Self {
        let mut start = today - Duration::days(LOOKBACK_DAYS);
        start -= Duration::days(i64::from(start.weekday().num_days_from_sunday()));

        let mut weeks = Vec::new();
        let mut current = start;
        while current <= today {
            let mut days = Vec::with_capacity(7);
            for _ in 0..7 {
                if current > today {
                    days.push(HeatmapCell::filler(current));
                } else {
                    let count = daily_counts.get(&current).copied().unwrap_or(0);
                    days.push(HeatmapCell::real(current, count));
                }
                current += Duration::days(1);
            }
            weeks.push(HeatmapWeek { days });
        }

        let months = month_labels(&weeks, today);
        Self {
            today,
            weeks,
            months,
        }
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&HeatmapCell> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .find(|c| c.date == date && !c.is_filler)
    }

    pub fn total_sessions(&self) -> u32 {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .map(|c| c.session_count)
            .sum()
    }

    /// Plain-text rendering: a month label row, then one row per weekday.
    pub fn render_text(&self) -> String {
        const GUTTER: usize = 4;
        let columns = self.weeks.len() * 2;

        let mut header: Vec<char> = vec![' '; GUTTER + columns];
        let mut col = GUTTER;
        for month in &self.months {
            let span = month.weeks * 2;
            if month.label.chars().count() <= span {
                for (i, ch) in month.label.chars().enumerate() {
                    header[col + i] = ch;
                }
            }
            col += span;
        }

        let mut out = String::new();
        out.push_str(header.iter().collect::<String>().trim_end());
        out.push('\n');

        const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        for (row, name) in DAY_NAMES.iter().enumerate() {
            let mut line = format!("{:<width$}", name, width = GUTTER);
            for week in &self.weeks {
                if let Some(cell) = week.days.get(row) {
                    line.push(cell.glyph());
                    line.push(' ');
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Month of each week is taken from its first day on or before `today`.
/// Labels are closed when a later week starts a new month; the open segment
/// is flushed at the end.
fn month_labels(weeks: &[HeatmapWeek], today: NaiveDate) -> Vec<HeatmapMonth> {
    let mut months = Vec::new();
    let mut previous: Option<(i32, u32)> = None;
    let mut previous_label = String::new();
    let mut month_start = 0;

    for (i, week) in weeks.iter().enumerate() {
        let Some(first) = week.days.iter().find(|d| d.date <= today) else {
            continue;
        };
        let key = (first.date.year(), first.date.month());
        if previous != Some(key) && i > 0 {
            let span = i - month_start;
            if span > 0 && previous.is_some() {
                months.push(HeatmapMonth::new(previous_label.clone(), span));
            }
            month_start = i;
        }
        previous = Some(key);
        previous_label = first.date.format("%b").to_string();
    }

    if previous.is_some() {
        months.push(HeatmapMonth::new(previous_label, weeks.len() - month_start));
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn buckets_follow_thresholds() {
        let expected = [(0, 0), (1, 1), (2, 2), (3, 2), (4, 3), (5, 3), (6, 4), (40, 4)];
        for (count, bucket) in expected {
            assert_eq!(color_bucket(count), bucket, "count {count}");
        }
    }

    #[test]
    fn grid_starts_on_sunday_and_ends_with_today() {
        for today in [date(2024, 6, 15), date(2024, 6, 16), date(2025, 1, 1)] {
            let map = Heatmap::build(&BTreeMap::new(), today);

            let first = map.weeks[0].days[0].date;
            assert_eq!(first.weekday(), Weekday::Sun);
            assert!(first <= today - Duration::days(LOOKBACK_DAYS));
            assert!(first > today - Duration::days(LOOKBACK_DAYS + 7));
            assert!(map.weeks.iter().all(|w| w.days.len() == 7));

            let last_week = map.weeks.last().unwrap();
            assert!(last_week.days.iter().any(|c| c.date == today && !c.is_filler));
            let fillers = last_week.days.iter().filter(|c| c.is_filler).count();
            assert_eq!(fillers, 6 - today.weekday().num_days_from_sunday() as usize);
            assert!(last_week
                .days
                .iter()
                .filter(|c| c.is_filler)
                .all(|c| c.date > today && c.tooltip.is_none() && c.session_count == 0));
        }
    }

    #[test]
    fn single_busy_day_is_top_bucket() {
        let today = date(2024, 6, 12);
        let counts = BTreeMap::from([(today, 6)]);
        let map = Heatmap::build(&counts, today);

        for cell in map.weeks.iter().flat_map(|w| w.days.iter()) {
            if cell.date == today {
                assert_eq!(cell.color_bucket, 4);
                assert_eq!(cell.color(), "#39D353");
            } else {
                assert_eq!(cell.color_bucket, 0);
            }
        }
        assert_eq!(map.total_sessions(), 6);
    }

    #[test]
    fn tooltip_pluralizes() {
        let today = date(2024, 6, 12);
        let yesterday = date(2024, 6, 11);
        let counts = BTreeMap::from([(today, 1), (yesterday, 3)]);
        let map = Heatmap::build(&counts, today);
        assert_eq!(
            map.cell(today).unwrap().tooltip.as_deref(),
            Some("Jun 12, 2024: 1 session")
        );
        assert_eq!(
            map.cell(yesterday).unwrap().tooltip.as_deref(),
            Some("Jun 11, 2024: 3 sessions")
        );
    }

    #[test]
    fn month_labels_cover_every_week_in_order() {
        let today = date(2024, 6, 15);
        let map = Heatmap::build(&BTreeMap::new(), today);

        let covered: usize = map.months.iter().map(|m| m.weeks).sum();
        assert_eq!(covered, map.weeks.len());
        for m in &map.months {
            assert_eq!(m.width, m.weeks as f64 * WEEK_PITCH);
            assert!(m.weeks > 0);
        }
        assert_eq!(map.months.last().unwrap().label, "Jun");
        for pair in map.months.windows(2) {
            assert_ne!(pair[0].label, pair[1].label);
        }
    }

    #[test]
    fn month_label_switches_on_first_week_of_new_month() {
        let today = date(2024, 6, 15);
        let map = Heatmap::build(&BTreeMap::new(), today);

        let mut week_index = 0;
        for month in &map.months {
            let first = map.weeks[week_index].days[0].date;
            assert_eq!(first.format("%b").to_string(), month.label);
            week_index += month.weeks;
        }
    }

    #[test]
    fn text_render_has_header_and_seven_rows() {
        let today = date(2024, 6, 12);
        let counts = BTreeMap::from([(today, 2)]);
        let text = Heatmap::build(&counts, today).render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("Sun"));
        assert!(lines[7].starts_with("Sat"));
        assert!(text.contains('▒'));
    }
}
