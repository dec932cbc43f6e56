//! Deterministic analysis layer for running metrics
//!
//! This module derives everything the dashboard shows from a flat activity
//! list: weekly load, the last run, the fastest run and personal records.
//! All functions are pure. The caller supplies the anchor date and zone,
//! nothing here reads the clock or touches I/O.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::{
  Activity, ActivityRow, DailyDistance, Dashboard, DistanceBin, FastestRun, LastRunSummary,
  PeriodSummary, PersonalRecord, PersonalRecordSlot, TargetDistance, WeekVolume, WeeklyMetrics,
  TARGET_DISTANCES,
};
use crate::normalize::{self, is_run, local_date};
use crate::time_window::{add_days, in_range, start_of_iso_week, Zone};

/// Minimum distance for the fastest-run highlight
pub const DEFAULT_FASTEST_MIN_KM: f64 = 5.0;

/// Histogram bin width for the distance distribution
pub const DEFAULT_DISTANCE_BIN_KM: f64 = 0.2;

/// ---------------------------------------------------------------------------
/// Weekly Metrics
/// ---------------------------------------------------------------------------

/// Compute this week's metrics relative to the ISO week containing `anchor`.
///
/// Runs in `[this_week_start, next_week_start)` count toward this week,
/// runs in `[prev_week_start, this_week_start)` only toward the previous
/// week's distance used by `load_pct`.
pub fn compute_weekly_metrics(
  activities: &[Activity],
  anchor: NaiveDateTime,
  zone: Zone,
) -> WeeklyMetrics {
  let this_week_start = start_of_iso_week(anchor);
  let next_week_start = add_days(this_week_start, 7);
  let prev_week_start = add_days(this_week_start, -7);

  log::trace!(
    "Weekly window: prev {} / this {} / next {}",
    prev_week_start,
    this_week_start,
    next_week_start
  );

  let mut dist_this = 0.0;
  let mut dist_prev = 0.0;
  let mut hr_sum = 0.0;
  let mut hr_count = 0u32;
  let mut activity_count = 0u32;
  let mut activity_count_all_time = 0u32;

  for activity in activities.iter().filter(|a| is_run(a)) {
    activity_count_all_time += 1;

    let Some(when) = local_date(activity, zone) else {
      log::debug!("Skipping run without a usable start date: {:?}", activity.id);
      continue;
    };
    let distance_km = normalize::distance_km(activity);

    if in_range(when, this_week_start, next_week_start) {
      dist_this += distance_km;
      activity_count += 1;

      if activity.has_heartrate == Some(true) {
        if let Some(hr) = activity.average_heartrate.filter(|hr| hr.is_finite()) {
          hr_sum += hr;
          hr_count += 1;
        }
      }
    } else if in_range(when, prev_week_start, this_week_start) {
      dist_prev += distance_km;
    }
  }

  let avg_hr_this_week = if hr_count > 0 {
    hr_sum / f64::from(hr_count)
  } else {
    0.0
  };

  let load_pct = if dist_prev > 0.0 {
    ((dist_this - dist_prev) / dist_prev) * 100.0
  } else {
    0.0
  };

  WeeklyMetrics {
    km_this_week: dist_this,
    avg_hr_this_week,
    load_pct,
    activity_count,
    activity_count_all_time,
  }
}

/// ---------------------------------------------------------------------------
/// Notable Runs
/// ---------------------------------------------------------------------------

/// Most recent dated run. Equal start dates resolve to the earliest record
/// in input order.
pub fn get_last_run(activities: &[Activity], zone: Zone) -> Option<&Activity> {
  let mut runs: Vec<(NaiveDateTime, &Activity)> = activities
    .iter()
    .filter(|a| is_run(a))
    .filter_map(|a| local_date(a, zone).map(|when| (when, a)))
    .collect();

  // sort_by is stable
  runs.sort_by(|a, b| b.0.cmp(&a.0));
  runs.first().map(|(_, activity)| *activity)
}

/// Fastest run by average pace among runs of at least `min_distance_km`.
///
/// A later run only replaces the current best when strictly faster, so the
/// first of several equally fast runs wins.
pub fn get_fastest_run_by_pace(
  activities: &[Activity],
  min_distance_km: f64,
  zone: Zone,
) -> Option<FastestRun<'_>> {
  let mut best: Option<FastestRun<'_>> = None;

  for activity in activities.iter().filter(|a| is_run(a)) {
    let distance_km = normalize::distance_km(activity);
    let moving_time_sec = normalize::moving_time_sec(activity);
    if !(distance_km >= min_distance_km && moving_time_sec > 0.0) {
      continue;
    }

    let pace_sec_per_km = moving_time_sec / distance_km;
    if best
      .as_ref()
      .map_or(true, |current| pace_sec_per_km < current.pace_sec_per_km)
    {
      best = Some(FastestRun {
        activity,
        pace_sec_per_km,
        distance_km,
        moving_time_sec,
        when: local_date(activity, zone),
      });
    }
  }

  best
}

impl LastRunSummary {
  pub fn from_activity(activity: &Activity, zone: Zone) -> Self {
    let distance_km = normalize::distance_km(activity);
    let moving_time_sec = normalize::moving_time_sec(activity);

    let pace_sec_per_km = if distance_km > 0.0 && moving_time_sec > 0.0 {
      Some(moving_time_sec / distance_km)
    } else {
      None
    };

    Self {
      name: activity.name.clone(),
      start: local_date(activity, zone),
      distance_km,
      moving_time_sec,
      pace_sec_per_km,
      avg_hr: rounded_hr(activity.average_heartrate),
      max_hr: rounded_hr(activity.max_heartrate),
      elevation_gain_m: elevation_m(activity),
      kilojoules: activity.kilojoules.filter(|kj| kj.is_finite()),
      max_speed_kmh: activity
        .max_speed
        .filter(|speed| speed.is_finite())
        .map(|mps| mps * 3.6),
    }
  }
}

/// Zero heart rate means the sensor was absent
fn rounded_hr(hr: Option<f64>) -> Option<i64> {
  hr.filter(|hr| hr.is_finite() && *hr > 0.0)
    .map(|hr| hr.round() as i64)
}

fn elevation_m(activity: &Activity) -> Option<f64> {
  activity
    .total_elevation_gain
    .or(activity.elevation_gain)
    .filter(|m| m.is_finite())
}

/// ---------------------------------------------------------------------------
/// Personal Records
/// ---------------------------------------------------------------------------

/// Best projected time for each of the six target distances.
///
/// A run whose raw `distance` (meters) reaches the target is projected down
/// to exactly the target assuming even pacing: `moving_time * target / actual`. One long
/// run can hold records for every shorter target at once.
pub fn compute_personal_records(activities: &[Activity], zone: Zone) -> Vec<PersonalRecordSlot> {
  TARGET_DISTANCES
    .iter()
    .map(|target| PersonalRecordSlot {
      target: *target,
      record: best_for_target(activities, target, zone),
    })
    .collect()
}

fn best_for_target(
  activities: &[Activity],
  target: &TargetDistance,
  zone: Zone,
) -> Option<PersonalRecord> {
  let mut best: Option<PersonalRecord> = None;

  for activity in activities.iter().filter(|a| is_run(a)) {
    let actual_m = normalize::raw_distance_meters(activity);
    let moving_time_sec = normalize::moving_time_sec(activity);
    if !(actual_m >= target.meters && moving_time_sec > 0.0) {
      continue;
    }

    let time_sec = moving_time_sec * target.meters / actual_m;
    if best.as_ref().map_or(true, |current| time_sec < current.time_sec) {
      best = Some(PersonalRecord {
        time_sec,
        pace_sec_per_km: moving_time_sec / (actual_m / 1000.0),
        activity_name: activity.name.clone(),
        activity_id: activity.id,
        start_date: local_date(activity, zone),
      });
    }
  }

  if best.is_none() {
    log::debug!("No run reaches {} yet", target.label);
  }
  best
}

/// ---------------------------------------------------------------------------
/// Volume Charts
/// ---------------------------------------------------------------------------

/// Running volume per ISO week, oldest week first. Undated runs are skipped.
pub fn weekly_volume(activities: &[Activity], zone: Zone) -> Vec<WeekVolume> {
  let mut weeks: BTreeMap<NaiveDate, WeekVolume> = BTreeMap::new();

  for activity in activities.iter().filter(|a| is_run(a)) {
    let Some(when) = local_date(activity, zone) else {
      continue;
    };
    let week_start = start_of_iso_week(when).date();

    let week = weeks.entry(week_start).or_insert_with(|| WeekVolume {
      week_start,
      distance_km: 0.0,
      moving_time_h: 0.0,
      elevation_m: 0.0,
      runs: 0,
    });
    week.distance_km += normalize::distance_km(activity);
    week.moving_time_h += normalize::moving_time_sec(activity) / 3600.0;
    week.elevation_m += elevation_m(activity).unwrap_or(0.0);
    week.runs += 1;
  }

  weeks.into_values().collect()
}

/// Run counts by distance, rounded to the nearest multiple of `bin_km`.
pub fn distance_distribution(activities: &[Activity], bin_km: f64) -> Vec<DistanceBin> {
  if !(bin_km.is_finite() && bin_km > 0.0) {
    return Vec::new();
  }

  let mut bins: BTreeMap<i64, u32> = BTreeMap::new();
  for activity in activities.iter().filter(|a| is_run(a)) {
    let index = (normalize::distance_km(activity) / bin_km).round() as i64;
    *bins.entry(index).or_insert(0) += 1;
  }

  bins
    .into_iter()
    .map(|(index, count)| DistanceBin {
      // trim float noise such as 0.6000000000000001
      distance_km: (index as f64 * bin_km * 1e6).round() / 1e6,
      count,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Period Views
/// ---------------------------------------------------------------------------

/// Calendar and sport filter for the period views. Unset fields match all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodFilter {
  pub year: Option<i32>,
  pub month: Option<u32>,
  /// Activity kinds to keep (case-insensitive), empty keeps every kind
  pub sports: Vec<String>,
}

impl PeriodFilter {
  /// Calendar month of the most recent dated activity, every sport
  pub fn latest_month(activities: &[Activity], zone: Zone) -> Self {
    let latest = activities.iter().filter_map(|a| local_date(a, zone)).max();
    Self {
      year: latest.map(|when| when.year()),
      month: latest.map(|when| when.month()),
      sports: Vec::new(),
    }
  }

  pub fn matches(&self, activity: &Activity, zone: Zone) -> bool {
    if !self.sports.is_empty() {
      let Some(kind) = activity.kind() else {
        return false;
      };
      if !self.sports.iter().any(|sport| sport.eq_ignore_ascii_case(kind)) {
        return false;
      }
    }

    if self.year.is_none() && self.month.is_none() {
      return true;
    }

    // A calendar constraint needs a date
    let Some(when) = local_date(activity, zone) else {
      return false;
    };
    self.year.map_or(true, |year| when.year() == year)
      && self.month.map_or(true, |month| when.month() == month)
  }
}

/// Count, distance, time and climb over every matching activity
pub fn period_summary(
  activities: &[Activity],
  filter: &PeriodFilter,
  zone: Zone,
) -> PeriodSummary {
  activities
    .iter()
    .filter(|a| filter.matches(a, zone))
    .fold(PeriodSummary::default(), |mut summary, activity| {
      summary.activities += 1;
      summary.distance_km += normalize::distance_km(activity);
      summary.moving_time_h += normalize::moving_time_sec(activity) / 3600.0;
      summary.elevation_m += elevation_m(activity).unwrap_or(0.0);
      summary
    })
}

/// Distance per calendar day, oldest first. Days without activity are absent.
pub fn daily_distance(
  activities: &[Activity],
  filter: &PeriodFilter,
  zone: Zone,
) -> Vec<DailyDistance> {
  let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();

  for activity in activities.iter().filter(|a| filter.matches(a, zone)) {
    let Some(when) = local_date(activity, zone) else {
      continue;
    };
    *days.entry(when.date()).or_insert(0.0) += normalize::distance_km(activity);
  }

  days
    .into_iter()
    .map(|(date, distance_km)| DailyDistance { date, distance_km })
    .collect()
}

/// Matching activities, newest first. Undated ones keep input order at the end.
pub fn list_activities(
  activities: &[Activity],
  filter: &PeriodFilter,
  zone: Zone,
) -> Vec<ActivityRow> {
  let mut rows: Vec<ActivityRow> = activities
    .iter()
    .filter(|a| filter.matches(a, zone))
    .map(|activity| ActivityRow {
      start: local_date(activity, zone),
      name: activity.name.clone(),
      sport: activity.kind().map(String::from),
      distance_km: normalize::distance_km(activity),
      moving_time_h: normalize::moving_time_sec(activity) / 3600.0,
      elevation_m: elevation_m(activity),
      avg_hr: rounded_hr(activity.average_heartrate),
    })
    .collect();

  // None sorts below Some, so undated rows land last
  rows.sort_by(|a, b| b.start.cmp(&a.start));
  rows
}

/// ---------------------------------------------------------------------------
/// Dashboard
/// ---------------------------------------------------------------------------

impl<'a> Dashboard<'a> {
  /// Compute every dashboard panel from one snapshot
  pub fn compute(
    activities: &'a [Activity],
    anchor: NaiveDateTime,
    zone: Zone,
    min_fastest_km: f64,
  ) -> Self {
    Self {
      anchor,
      weekly: compute_weekly_metrics(activities, anchor, zone),
      last_run: get_last_run(activities, zone).map(|run| LastRunSummary::from_activity(run, zone)),
      fastest_run: get_fastest_run_by_pace(activities, min_fastest_km, zone),
      personal_records: compute_personal_records(activities, zone),
    }
  }
}
