//! Text rendering for the dashboard panels
//!
//! Each renderer takes the same value the `--json` output serializes, so
//! both modes always show the same numbers.

use std::fmt::Write;

use crate::format::{
  format_date, format_distance_km, format_duration, format_pace, format_record_time, PLACEHOLDER,
};
use crate::models::{
  ActivityRow, DailyDistance, Dashboard, DistanceBin, FastestRun, LastRunSummary, PeriodSummary,
  PersonalRecordSlot, WeekVolume, WeeklyMetrics,
};

/// Width of the label column
const LABEL_WIDTH: usize = 14;

/// Longest bar in the distance histogram
const MAX_BAR: usize = 40;

fn row(out: &mut String, label: &str, value: impl AsRef<str>) {
  let _ = writeln!(out, "  {:<width$}{}", label, value.as_ref(), width = LABEL_WIDTH);
}

pub fn render_weekly(weekly: &WeeklyMetrics) -> String {
  let mut out = String::from("This week\n");
  row(&mut out, "Distance", format_distance_km(weekly.km_this_week));
  row(&mut out, "Runs", weekly.activity_count.to_string());

  // 0 means no run carried heart rate
  let hr = if weekly.avg_hr_this_week > 0.0 {
    format!("{:.0} bpm", weekly.avg_hr_this_week)
  } else {
    PLACEHOLDER.to_string()
  };
  row(&mut out, "Avg HR", hr);
  row(&mut out, "Load", format!("{:+.1}% vs last week", weekly.load_pct));
  row(&mut out, "All time", format!("{} activities", weekly.activity_count_all_time));
  out
}

pub fn render_last_run(last_run: &Option<LastRunSummary>) -> String {
  let mut out = String::from("Last run\n");
  let Some(summary) = last_run else {
    out.push_str("  No runs yet\n");
    return out;
  };

  row(&mut out, "Name", summary.name.as_deref().unwrap_or(PLACEHOLDER));
  row(&mut out, "When", format_date(summary.start));
  row(&mut out, "Distance", format_distance_km(summary.distance_km));
  row(&mut out, "Time", format_duration(summary.moving_time_sec));
  row(
    &mut out,
    "Pace",
    summary.pace_sec_per_km.map(format_pace).unwrap_or_else(|| PLACEHOLDER.to_string()),
  );
  row(&mut out, "Avg HR", optional(summary.avg_hr, |hr| format!("{} bpm", hr)));
  row(&mut out, "Max HR", optional(summary.max_hr, |hr| format!("{} bpm", hr)));
  row(&mut out, "Elevation", optional(summary.elevation_gain_m, |m| format!("{:.0} m", m)));
  row(&mut out, "Energy", optional(summary.kilojoules, |kj| format!("{:.0} kJ", kj)));
  row(&mut out, "Max speed", optional(summary.max_speed_kmh, |kmh| format!("{:.1} km/h", kmh)));
  out
}

pub fn render_fastest(fastest: &Option<FastestRun<'_>>, min_km: f64) -> String {
  let mut out = format!("Fastest run (>= {} km)\n", min_km);
  let Some(fastest) = fastest else {
    out.push_str("  No qualifying runs\n");
    return out;
  };

  row(&mut out, "Name", fastest.activity.name.as_deref().unwrap_or(PLACEHOLDER));
  row(&mut out, "When", format_date(fastest.when));
  row(&mut out, "Pace", format_pace(fastest.pace_sec_per_km));
  row(&mut out, "Distance", format_distance_km(fastest.distance_km));
  row(&mut out, "Time", format_duration(fastest.moving_time_sec));
  out
}

pub fn render_records(records: &[PersonalRecordSlot]) -> String {
  let mut out = String::from("Personal records\n");
  for slot in records {
    let detail = match &slot.record {
      Some(record) => format!(
        "{}  ({}, {})",
        format_record_time(Some(record.time_sec)),
        format_pace(record.pace_sec_per_km),
        record.activity_name.as_deref().unwrap_or(PLACEHOLDER),
      ),
      None => format_record_time(None),
    };
    row(&mut out, slot.target.label, detail);
  }
  out
}

pub fn render_volume(weeks: &[WeekVolume]) -> String {
  let mut out = String::from("Weekly volume\n");
  if weeks.is_empty() {
    out.push_str("  No runs yet\n");
    return out;
  }

  for week in weeks {
    let _ = writeln!(
      out,
      "  {}  {:>10}  {:>5.1} h  {:>5.0} m  {} runs",
      week.week_start,
      format_distance_km(week.distance_km),
      week.moving_time_h,
      week.elevation_m,
      week.runs,
    );
  }
  out
}

pub fn render_distribution(bins: &[DistanceBin]) -> String {
  let mut out = String::from("Distance distribution\n");
  let Some(max_count) = bins.iter().map(|bin| bin.count).max().filter(|count| *count > 0) else {
    out.push_str("  No runs yet\n");
    return out;
  };

  for bin in bins {
    let width = (bin.count as usize * MAX_BAR).div_ceil(max_count as usize);
    let _ = writeln!(
      out,
      "  {:>10}  {:<bar$}  {}",
      format_distance_km(bin.distance_km),
      "#".repeat(width),
      bin.count,
      bar = MAX_BAR,
    );
  }
  out
}

pub fn render_period(summary: &PeriodSummary, label: &str) -> String {
  let mut out = format!("Period {}\n", label);
  row(&mut out, "Activities", summary.activities.to_string());
  row(&mut out, "Distance", format!("{:.1} km", summary.distance_km));
  row(&mut out, "Time", format!("{:.1} h", summary.moving_time_h));
  row(&mut out, "Elevation", format!("{:.0} m", summary.elevation_m));
  out
}

pub fn render_daily(days: &[DailyDistance]) -> String {
  let mut out = String::from("Daily distance\n");
  if days.is_empty() {
    out.push_str("  No activities match\n");
    return out;
  }

  for day in days {
    let _ = writeln!(out, "  {}  {:>10}", day.date, format_distance_km(day.distance_km));
  }
  out
}

pub fn render_activities(rows: &[ActivityRow]) -> String {
  let mut out = String::from("Activities\n");
  if rows.is_empty() {
    out.push_str("  No activities match\n");
    return out;
  }

  for activity in rows {
    let _ = writeln!(
      out,
      "  {:<16}  {:<12}  {:>10}  {:>6.2} h  {:>6}  {:>7}  {}",
      format_date(activity.start),
      activity.sport.as_deref().unwrap_or(PLACEHOLDER),
      format_distance_km(activity.distance_km),
      activity.moving_time_h,
      optional(activity.elevation_m, |m| format!("{:.0} m", m)),
      optional(activity.avg_hr, |hr| format!("{} bpm", hr)),
      activity.name.as_deref().unwrap_or(PLACEHOLDER),
    );
  }
  out
}

pub fn render_dashboard(dashboard: &Dashboard<'_>, min_fastest_km: f64) -> String {
  [
    format!("Runboard as of {}\n", format_date(Some(dashboard.anchor))),
    render_weekly(&dashboard.weekly),
    render_last_run(&dashboard.last_run),
    render_fastest(&dashboard.fastest_run, min_fastest_km),
    render_records(&dashboard.personal_records),
  ]
  .join("\n")
}

fn optional<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> String {
  value.map(render).unwrap_or_else(|| PLACEHOLDER.to_string())
}
