use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A timestamp as it appears in an export: ISO text or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
  Text(String),
  EpochMillis(f64),
}

impl From<&str> for RawTimestamp {
  fn from(raw: &str) -> Self {
    RawTimestamp::Text(raw.to_string())
  }
}

/// One exported activity (Strava `SummaryActivity` shape).
///
/// Every field is optional and malformed values deserialize as `None`, so a
/// single bad field never drops the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  #[serde(default, deserialize_with = "integer")]
  pub id: Option<i64>,
  #[serde(default, deserialize_with = "text")]
  pub name: Option<String>,
  /// Newer exports use `sport_type`, legacy ones only `type`
  #[serde(default, deserialize_with = "text")]
  pub sport_type: Option<String>,
  #[serde(rename = "type", default, deserialize_with = "text")]
  pub activity_type: Option<String>,
  #[serde(default, deserialize_with = "timestamp")]
  pub start_date: Option<RawTimestamp>,
  #[serde(default, deserialize_with = "timestamp")]
  pub start_date_local: Option<RawTimestamp>,
  /// Meters in Strava exports, kilometers in some hand-edited files
  #[serde(default, deserialize_with = "numeric")]
  pub distance: Option<f64>,
  #[serde(default, deserialize_with = "number_only")]
  pub distance_km: Option<f64>,
  #[serde(default, deserialize_with = "numeric")]
  pub moving_time: Option<f64>,
  #[serde(default, deserialize_with = "numeric")]
  pub elapsed_time: Option<f64>,
  #[serde(default, deserialize_with = "truthy")]
  pub has_heartrate: Option<bool>,
  #[serde(default, deserialize_with = "number_only")]
  pub average_heartrate: Option<f64>,
  #[serde(default, deserialize_with = "number_only")]
  pub max_heartrate: Option<f64>,
  #[serde(default, deserialize_with = "number_only")]
  pub total_elevation_gain: Option<f64>,
  #[serde(default, deserialize_with = "number_only")]
  pub elevation_gain: Option<f64>,
  #[serde(default, deserialize_with = "number_only")]
  pub kilojoules: Option<f64>,
  /// m/s
  #[serde(default, deserialize_with = "number_only")]
  pub max_speed: Option<f64>,
}

impl Activity {
  /// Activity kind: `sport_type`, falling back to `type` when absent or empty
  pub fn kind(&self) -> Option<&str> {
    self
      .sport_type
      .as_deref()
      .filter(|kind| !kind.is_empty())
      .or(self.activity_type.as_deref())
  }
}

/// ---------------------------------------------------------------------------
/// Lenient field deserializers
/// ---------------------------------------------------------------------------

/// Numbers and numeric strings
fn numeric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  })
}

/// JSON numbers only; numeric strings are rejected
fn number_only<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.and_then(|v| v.as_f64()))
}

fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Number(n)) => n.as_i64(),
    Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
    _ => None,
  })
}

fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::String(s)) => Some(s),
    _ => None,
  })
}

fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Bool(b)) => Some(b),
    Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
    Some(Value::String(s)) => Some(!s.is_empty()),
    _ => None,
  })
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<RawTimestamp>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::String(s)) => Some(RawTimestamp::Text(s)),
    Some(Value::Number(n)) => n.as_f64().map(RawTimestamp::EpochMillis),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_strava_export_record() {
    let json = r#"{
      "id": 11223344,
      "name": "Morning Run",
      "type": "Run",
      "sport_type": "Run",
      "start_date": "2024-06-03T06:00:00Z",
      "start_date_local": "2024-06-03T08:00:00Z",
      "distance": 10012.4,
      "moving_time": 3120,
      "elapsed_time": 3300,
      "has_heartrate": true,
      "average_heartrate": 151.2,
      "max_heartrate": 178.0,
      "total_elevation_gain": 42.0,
      "map": {"summary_polyline": "abc"}
    }"#;

    let activity: Activity = serde_json::from_str(json).unwrap();
    assert_eq!(activity.id, Some(11223344));
    assert_eq!(activity.kind(), Some("Run"));
    assert_eq!(activity.distance, Some(10012.4));
    assert_eq!(activity.moving_time, Some(3120.0));
    assert_eq!(activity.has_heartrate, Some(true));
    assert_eq!(
      activity.start_date_local,
      Some(RawTimestamp::Text("2024-06-03T08:00:00Z".to_string()))
    );
  }

  #[test]
  fn test_malformed_fields_become_none() {
    let json = r#"{
      "type": 7,
      "distance": "5000",
      "distance_km": "5",
      "average_heartrate": "150",
      "moving_time": null,
      "start_date": {"nested": true},
      "has_heartrate": 1
    }"#;

    let activity: Activity = serde_json::from_str(json).unwrap();
    assert_eq!(activity.kind(), None);
    // numeric strings are accepted for distance but not for distance_km / heart rate
    assert_eq!(activity.distance, Some(5000.0));
    assert_eq!(activity.distance_km, None);
    assert_eq!(activity.average_heartrate, None);
    assert_eq!(activity.moving_time, None);
    assert_eq!(activity.start_date, None);
    assert_eq!(activity.has_heartrate, Some(true));
  }

  #[test]
  fn test_kind_falls_back_to_legacy_type() {
    let activity = Activity {
      sport_type: Some(String::new()),
      activity_type: Some("Run".to_string()),
      ..Default::default()
    };
    assert_eq!(activity.kind(), Some("Run"));

    let trail = Activity {
      sport_type: Some("TrailRun".to_string()),
      activity_type: Some("Run".to_string()),
      ..Default::default()
    };
    assert_eq!(trail.kind(), Some("TrailRun"));
  }

  #[test]
  fn test_epoch_timestamp() {
    let activity: Activity = serde_json::from_str(r#"{"start_date": 1717401600000}"#).unwrap();
    assert_eq!(
      activity.start_date,
      Some(RawTimestamp::EpochMillis(1_717_401_600_000.0))
    );
  }
}
