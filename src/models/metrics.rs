use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::Activity;

/// Weekly training summary for the ISO week containing the anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct WeeklyMetrics {
  pub km_this_week: f64,
  /// Mean of per-run average heart rates, 0 when no run carried HR
  pub avg_hr_this_week: f64,
  /// Distance change vs the previous week in percent, 0 when last week was empty
  pub load_pct: f64,
  pub activity_count: u32,
  pub activity_count_all_time: u32,
}

/// A fixed personal-record milestone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetDistance {
  pub label: &'static str,
  pub meters: f64,
}

pub const TARGET_DISTANCES: [TargetDistance; 6] = [
  TargetDistance { label: "1 km", meters: 1000.0 },
  TargetDistance { label: "5 km", meters: 5000.0 },
  TargetDistance { label: "10 km", meters: 10000.0 },
  TargetDistance { label: "Half marathon", meters: 21097.0 },
  TargetDistance { label: "30 km", meters: 30000.0 },
  TargetDistance { label: "Marathon", meters: 42195.0 },
];

/// Best normalized time for a target distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
  /// Moving time scaled down to exactly the target distance
  pub time_sec: f64,
  /// Average pace of the whole activity, not of the projection
  pub pace_sec_per_km: f64,
  pub activity_name: Option<String>,
  pub activity_id: Option<i64>,
  pub start_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecordSlot {
  pub target: TargetDistance,
  /// `None` renders as "no data", never as zero
  pub record: Option<PersonalRecord>,
}

/// Fastest qualifying run by average pace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestRun<'a> {
  pub activity: &'a Activity,
  pub pace_sec_per_km: f64,
  pub distance_km: f64,
  pub moving_time_sec: f64,
  pub when: Option<NaiveDateTime>,
}

/// Display-ready facts about the most recent run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastRunSummary {
  pub name: Option<String>,
  pub start: Option<NaiveDateTime>,
  pub distance_km: f64,
  pub moving_time_sec: f64,
  pub pace_sec_per_km: Option<f64>,
  pub avg_hr: Option<i64>,
  pub max_hr: Option<i64>,
  pub elevation_gain_m: Option<f64>,
  pub kilojoules: Option<f64>,
  pub max_speed_kmh: Option<f64>,
}

/// Running volume of one ISO week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekVolume {
  pub week_start: NaiveDate,
  pub distance_km: f64,
  pub moving_time_h: f64,
  pub elevation_m: f64,
  pub runs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceBin {
  pub distance_km: f64,
  pub count: u32,
}

/// Everything the dashboard shows, computed in one pass over a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard<'a> {
  pub anchor: NaiveDateTime,
  pub weekly: WeeklyMetrics,
  pub last_run: Option<LastRunSummary>,
  pub fastest_run: Option<FastestRun<'a>>,
  pub personal_records: Vec<PersonalRecordSlot>,
}

/// Totals for every activity matching a period filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct PeriodSummary {
  pub activities: u32,
  pub distance_km: f64,
  pub moving_time_h: f64,
  pub elevation_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDistance {
  pub date: NaiveDate,
  pub distance_km: f64,
}

/// One line of the activity table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
  pub start: Option<NaiveDateTime>,
  pub name: Option<String>,
  pub sport: Option<String>,
  pub distance_km: f64,
  pub moving_time_h: f64,
  pub elevation_m: Option<f64>,
  pub avg_hr: Option<i64>,
}
