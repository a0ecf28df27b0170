use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Count for a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
  pub date: NaiveDate,
  pub count: i64,
}

/// Words added and exercises completed over a window of days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
  pub words: Vec<DailyCount>,
  pub exercises: Vec<DailyCount>,
  pub total_entries: i64,
  pub total_exercises: i64,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub window_days: u32,
}

/// First day of a window ending (inclusively) on `end`
pub fn window_start(end: NaiveDate, days: u32) -> NaiveDate {
  end - Duration::days(i64::from(days.max(1)) - 1)
}

/// One entry per day in the window, oldest first, zero where nothing happened
pub fn pad_daily_counts(counts: &HashMap<NaiveDate, i64>, end: NaiveDate, days: u32) -> Vec<DailyCount> {
  let start = window_start(end, days);
  (0..i64::from(days.max(1)))
    .map(|offset| {
      let date = start + Duration::days(offset);
      DailyCount {
        date,
        count: counts.get(&date).copied().unwrap_or(0),
      }
    })
    .collect()
}
