//! Field normalization for exported activities
//!
//! Export files disagree on units and timestamps. These helpers turn an
//! `Activity` into the handful of numbers the engine needs and never fail:
//! missing or non-finite values come back as 0 or `None`.

use chrono::NaiveDateTime;

use crate::models::{Activity, RawTimestamp};
use crate::time_window::{self, Zone};

/// Raw `distance` values at or above this are meters, below it kilometers.
pub const METERS_THRESHOLD: f64 = 500.0;

pub fn is_run(activity: &Activity) -> bool {
  activity.kind() == Some("Run")
}

/// Distance in kilometers.
///
/// An explicit finite `distance_km` is used verbatim. Otherwise the raw
/// `distance` is meters when >= 500 and already kilometers below that.
pub fn distance_km(activity: &Activity) -> f64 {
  if let Some(km) = activity.distance_km.filter(|km| km.is_finite()) {
    return km;
  }

  match activity.distance {
    Some(raw) if raw.is_finite() => {
      if raw >= METERS_THRESHOLD {
        raw / 1000.0
      } else {
        raw
      }
    }
    _ => 0.0,
  }
}

/// The raw `distance` field read as meters, 0 when missing or non-finite.
///
/// Record projection qualifies on this value directly. The km heuristic
/// would turn a 400 m stride into 400 km.
pub fn raw_distance_meters(activity: &Activity) -> f64 {
  activity.distance.filter(|m| m.is_finite()).unwrap_or(0.0)
}

/// Moving time in seconds, falling back to elapsed time
pub fn moving_time_sec(activity: &Activity) -> f64 {
  activity
    .moving_time
    .filter(|t| t.is_finite())
    .or(activity.elapsed_time.filter(|t| t.is_finite()))
    .unwrap_or(0.0)
}

/// Wall-clock start of the activity.
///
/// `start_date_local` wins when present. Exports mark it with a trailing
/// `Z` although it is already local time, so the marker is dropped and the
/// rest parsed as naive wall clock. Returns `None` when nothing parses.
pub fn local_date(activity: &Activity, zone: Zone) -> Option<NaiveDateTime> {
  let local = activity
    .start_date_local
    .as_ref()
    .filter(|raw| !is_blank(raw));

  match local {
    Some(RawTimestamp::Text(text)) => match text.trim().strip_suffix('Z') {
      Some(wall_clock) => time_window::parse_timestamp(wall_clock, zone),
      None => time_window::parse_timestamp(text, zone),
    },
    Some(RawTimestamp::EpochMillis(millis)) => time_window::from_epoch_millis(*millis, zone),
    None => match activity.start_date.as_ref()? {
      RawTimestamp::Text(text) => time_window::parse_timestamp(text, zone),
      RawTimestamp::EpochMillis(millis) => time_window::from_epoch_millis(*millis, zone),
    },
  }
}

fn is_blank(raw: &RawTimestamp) -> bool {
  matches!(raw, RawTimestamp::Text(text) if text.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{at, run};

  #[test]
  fn test_distance_heuristic_boundary() {
    let below = Activity { distance: Some(499.0), ..run() };
    let at_threshold = Activity { distance: Some(500.0), ..run() };
    assert_eq!(distance_km(&below), 499.0);
    assert_eq!(distance_km(&at_threshold), 0.5);
  }

  #[test]
  fn test_explicit_distance_km_wins() {
    let activity = Activity {
      distance: Some(10000.0),
      distance_km: Some(9.87),
      ..run()
    };
    assert_eq!(distance_km(&activity), 9.87);

    let non_finite = Activity {
      distance: Some(10000.0),
      distance_km: Some(f64::NAN),
      ..run()
    };
    assert_eq!(distance_km(&non_finite), 10.0);
  }

  #[test]
  fn test_raw_distance_meters_ignores_unit_heuristic() {
    let half = Activity { distance: Some(21097.0), ..run() };
    assert_eq!(raw_distance_meters(&half), 21097.0);
    let strides = Activity { distance: Some(400.0), ..run() };
    assert_eq!(raw_distance_meters(&strides), 400.0);
    let explicit_only = Activity { distance_km: Some(3.0), ..run() };
    assert_eq!(raw_distance_meters(&explicit_only), 0.0);
    let infinite = Activity { distance: Some(f64::INFINITY), ..run() };
    assert_eq!(raw_distance_meters(&infinite), 0.0);
  }

  #[test]
  fn test_distance_fails_closed() {
    assert_eq!(distance_km(&run()), 0.0);
    let infinite = Activity { distance: Some(f64::INFINITY), ..run() };
    assert_eq!(distance_km(&infinite), 0.0);
  }

  #[test]
  fn test_moving_time_falls_back_to_elapsed() {
    let activity = Activity { elapsed_time: Some(1800.0), ..run() };
    assert_eq!(moving_time_sec(&activity), 1800.0);

    let both = Activity {
      moving_time: Some(1700.0),
      elapsed_time: Some(1800.0),
      ..run()
    };
    assert_eq!(moving_time_sec(&both), 1700.0);
    assert_eq!(moving_time_sec(&run()), 0.0);
  }

  #[test]
  fn test_is_run() {
    assert!(is_run(&run()));
    let ride = Activity { sport_type: Some("Ride".to_string()), ..Default::default() };
    assert!(!is_run(&ride));
    assert!(!is_run(&Activity::default()));
  }

  #[test]
  fn test_local_date_strips_utc_marker() {
    // Far-east zone: the instant would land on Monday, the wall clock stays Sunday
    let zone = Zone::parse_offset("+10:00").unwrap();
    let activity = Activity {
      start_date: Some("2024-06-09T13:30:00Z".into()),
      start_date_local: Some("2024-06-09T23:30:00Z".into()),
      ..run()
    };
    assert_eq!(local_date(&activity, zone), Some(at("2024-06-09T23:30:00")));
  }

  #[test]
  fn test_local_date_falls_back_to_start_date() {
    let activity = Activity {
      start_date: Some("2024-06-03T08:00:00Z".into()),
      ..run()
    };
    assert_eq!(
      local_date(&activity, Zone::parse_offset("+02:00").unwrap()),
      Some(at("2024-06-03T10:00:00"))
    );

    let blank_local = Activity {
      start_date: Some("2024-06-03T08:00:00Z".into()),
      start_date_local: Some("".into()),
      ..run()
    };
    assert_eq!(local_date(&blank_local, Zone::utc()), Some(at("2024-06-03T08:00:00")));
  }

  #[test]
  fn test_local_date_invalid_is_none() {
    assert_eq!(local_date(&run(), Zone::utc()), None);
    let garbage = Activity { start_date: Some("yesterday".into()), ..run() };
    assert_eq!(local_date(&garbage, Zone::utc()), None);
  }
}
