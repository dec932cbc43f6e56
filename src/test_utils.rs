//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Mock activity factories
//! - Snapshot fixtures
//! - Helper assertions

use chrono::NaiveDateTime;

use crate::models::Activity;

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// A bare `Run` with nothing else set
pub fn run() -> Activity {
  Activity {
    sport_type: Some("Run".to_string()),
    ..Default::default()
  }
}

/// A run with distance (meters), moving time and a UTC start instant
pub fn mock_run(distance_m: f64, moving_time_sec: f64, start_date: &str) -> Activity {
  Activity {
    name: Some(format!("Run {:.1} km", distance_m / 1000.0)),
    distance: Some(distance_m),
    moving_time: Some(moving_time_sec),
    start_date: Some(start_date.into()),
    ..run()
  }
}

/// A named run, for assertions on which activity won
pub fn mock_named_run(
  name: &str,
  distance_m: f64,
  moving_time_sec: f64,
  start_date: &str,
) -> Activity {
  Activity {
    name: Some(name.to_string()),
    ..mock_run(distance_m, moving_time_sec, start_date)
  }
}

/// A run that carries heart rate
pub fn mock_hr_run(distance_m: f64, start_date: &str, average_hr: f64) -> Activity {
  Activity {
    has_heartrate: Some(true),
    average_heartrate: Some(average_hr),
    ..mock_run(distance_m, distance_m * 0.3, start_date)
  }
}

/// A non-run activity of the given kind
pub fn mock_other(kind: &str, distance_m: f64, start_date: &str) -> Activity {
  Activity {
    sport_type: Some(kind.to_string()),
    distance: Some(distance_m),
    moving_time: Some(3600.0),
    start_date: Some(start_date.into()),
    ..Default::default()
  }
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// A wrapped export as written by the export script
pub const WRAPPED_SNAPSHOT: &str = r#"{
  "exported_at": "2024-06-05T18:00:00+00:00",
  "count": 3,
  "activities": [
    {"name": "Tempo", "type": "Run", "distance": 5000, "moving_time": 1500, "start_date": "2024-06-03T08:00:00Z"},
    {"name": "Long run", "type": "Run", "distance": 10000, "moving_time": 3600, "start_date": "2024-05-27T08:00:00Z"},
    {"name": "Commute", "sport_type": "Ride", "distance": 12000, "moving_time": 2400, "start_date": "2024-06-04T08:00:00Z"}
  ]
}"#;

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Parse `YYYY-MM-DDTHH:MM:SS` as wall-clock time
pub fn at(raw: &str) -> NaiveDateTime {
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("valid test timestamp")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mock_factories_create_valid_data() {
    let activity = mock_run(10000.0, 3600.0, "2024-06-03T08:00:00Z");
    assert_eq!(activity.kind(), Some("Run"));
    assert_eq!(activity.distance, Some(10000.0));

    let hr = mock_hr_run(5000.0, "2024-06-03T08:00:00Z", 150.0);
    assert_eq!(hr.has_heartrate, Some(true));
    assert_eq!(hr.moving_time, Some(1500.0));

    let ride = mock_other("Ride", 30000.0, "2024-06-03T08:00:00Z");
    assert_eq!(ride.kind(), Some("Ride"));
  }

  #[test]
  fn test_wrapped_fixture_is_valid_json() {
    let value: serde_json::Value = serde_json::from_str(WRAPPED_SNAPSHOT).unwrap();
    assert_eq!(value["activities"].as_array().map(Vec::len), Some(3));
  }
}
