//! Pure derivations over a snapshot of mood records. Nothing here touches the
//! store or storage; callers pass `today` explicitly.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::mood::{MoodCategory, MoodRecord};

pub const TREND_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Column (0..=6) of `date` in a grid whose first column is `self`.
    pub fn column_of(self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }

    pub fn header(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(format!("unknown week start: {other}")),
        }
    }
}

// ============================================================================
// Calendar grid
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    pub week_start: WeekStart,
    pub leading_blanks: u32,
    pub trailing_blanks: u32,
    pub dates: Vec<NaiveDate>,
}

impl CalendarGrid {
    /// Always a multiple of 7.
    pub fn cell_count(&self) -> usize {
        self.leading_blanks as usize + self.dates.len() + self.trailing_blanks as usize
    }
}

/// Layout of a month for a 7-column grid. `None` for an invalid year/month.
pub fn calendar_grid(year: i32, month: u32, week_start: WeekStart) -> Option<CalendarGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = shift_month(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;

    let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
    let leading_blanks = week_start.column_of(first);
    let trailing_blanks = (6 - week_start.column_of(last)) % 7;

    Some(CalendarGrid {
        year,
        month,
        week_start,
        leading_blanks,
        trailing_blanks,
        dates,
    })
}

/// Moves `delta` months from (year, month), crossing year boundaries.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let index = year
        .checked_mul(12)?
        .checked_add(month as i32 - 1)?
        .checked_add(delta)?;
    Some((index.div_euclid(12), index.rem_euclid(12) as u32 + 1))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub day: u32,
    pub mood: Option<MoodRecord>,
    /// False when the day has a mood but the active filter hides its icon.
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub header: [&'static str; 7],
    pub leading_blanks: u32,
    pub trailing_blanks: u32,
    pub filter: Option<MoodCategory>,
    pub cells: Vec<CalendarCell>,
}

/// Annotates every day of `grid` with its record, applying the category filter.
pub fn month_view(
    grid: &CalendarGrid,
    records: &[MoodRecord],
    filter: Option<MoodCategory>,
) -> MonthView {
    let by_date = index_by_date(records);
    let cells = grid
        .dates
        .iter()
        .map(|date| {
            let mood = by_date.get(date).map(|m| (*m).clone());
            let visible = match (&mood, filter) {
                (Some(m), Some(f)) => m.category == f,
                (Some(_), None) => true,
                (None, _) => false,
            };
            CalendarCell {
                date: *date,
                day: date.day(),
                mood,
                visible,
            }
        })
        .collect();

    MonthView {
        year: grid.year,
        month: grid.month,
        header: grid.week_start.header(),
        leading_blanks: grid.leading_blanks,
        trailing_blanks: grid.trailing_blanks,
        filter,
        cells,
    }
}

pub fn index_by_date(records: &[MoodRecord]) -> HashMap<NaiveDate, &MoodRecord> {
    records.iter().map(|m| (m.date, m)).collect()
}

// ============================================================================
// Frequency
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MoodCount {
    pub emoji: MoodCategory,
    pub count: usize,
}

/// Per-category counts, in the order each category is first seen.
pub fn mood_frequency(records: &[MoodRecord]) -> Vec<MoodCount> {
    let mut counts: Vec<MoodCount> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|c| c.emoji == record.category) {
            Some(c) => c.count += 1,
            None => counts.push(MoodCount {
                emoji: record.category,
                count: 1,
            }),
        }
    }
    counts
}

/// Highest count wins; on a tie, the category seen first in `records`.
pub fn most_frequent(records: &[MoodRecord]) -> Option<MoodCount> {
    mood_frequency(records)
        .into_iter()
        .fold(None, |best: Option<MoodCount>, c| match best {
            Some(b) if b.count >= c.count => Some(b),
            _ => Some(c),
        })
}

// ============================================================================
// Trend
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Axis label, e.g. "Mar 15".
    pub label: String,
    /// `None` is a gap in the line, not a zero.
    pub value: Option<u8>,
    pub emoji: Option<MoodCategory>,
}

/// The `days` dates ending at `today`, oldest first.
pub fn trailing_window(today: NaiveDate, days: u64) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .collect()
}

pub fn trend_series(records: &[MoodRecord], today: NaiveDate) -> Vec<TrendPoint> {
    let by_date = index_by_date(records);
    trailing_window(today, TREND_DAYS)
        .into_iter()
        .map(|date| {
            let emoji = by_date.get(&date).map(|m| m.category);
            TrendPoint {
                date,
                label: date.format("%b %-d").to_string(),
                value: emoji.map(MoodCategory::intensity),
                emoji,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Short weekday, e.g. "Fri".
    pub weekday: String,
    pub mood: Option<MoodRecord>,
}

/// The "last N days" strip: one entry per day ending today, oldest first.
pub fn recent_days(records: &[MoodRecord], today: NaiveDate, days: u64) -> Vec<DaySummary> {
    let by_date = index_by_date(records);
    trailing_window(today, days)
        .into_iter()
        .map(|date| DaySummary {
            date,
            weekday: date.format("%a").to_string(),
            mood: by_date.get(&date).map(|m| (*m).clone()),
        })
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoodSummary {
    pub total_entries: usize,
    pub most_frequent: Option<MoodCount>,
    pub counts: Vec<MoodCount>,
    pub last_7_days: Vec<DaySummary>,
}

pub fn summarize(records: &[MoodRecord], today: NaiveDate) -> MoodSummary {
    MoodSummary {
        total_entries: records.len(),
        most_frequent: most_frequent(records),
        counts: mood_frequency(records),
        last_7_days: recent_days(records, today, TREND_DAYS),
    }
}
