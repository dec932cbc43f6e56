use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::models::Activity;
use crate::time_window::{parse_timestamp, Zone};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

/// Where the export script writes by default
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/activities.json";
const FETCH_TIMEOUT_SECONDS: u64 = 30;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
  #[error("Failed to read snapshot {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Snapshot fetch returned HTTP {0}")]
  Status(u16),

  #[error("Invalid snapshot JSON: {0}")]
  Parse(#[from] serde_json::Error),
}

impl SnapshotError {
  /// Whether fetching again (usually after a refresh) can succeed
  pub fn is_retryable(&self) -> bool {
    match self {
      SnapshotError::Io { .. } | SnapshotError::Request(_) => true,
      SnapshotError::Status(code) => *code >= 500 || matches!(code, 404 | 408 | 429),
      SnapshotError::Parse(_) => false,
    }
  }
}

impl Serialize for SnapshotError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Snapshot
/// ---------------------------------------------------------------------------

/// An activity export: a bare array, or `{"exported_at", "count", "activities"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
  pub exported_at: Option<String>,
  pub activities: Vec<Activity>,
}

impl Snapshot {
  /// Only malformed JSON is an error; any other shape yields what it can.
  pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(Self::from_value(value))
  }

  pub fn from_value(value: Value) -> Self {
    match value {
      Value::Array(items) => Self {
        exported_at: None,
        activities: parse_activities(items),
      },
      Value::Object(mut fields) => {
        let exported_at = fields
          .get("exported_at")
          .or_else(|| fields.get("exportedAt"))
          .and_then(Value::as_str)
          .map(String::from);

        let activities = match fields.remove("activities") {
          Some(Value::Array(items)) => parse_activities(items),
          _ => {
            log::warn!("Snapshot object has no activities array");
            Vec::new()
          }
        };

        Self {
          exported_at,
          activities,
        }
      }
      _ => {
        log::warn!("Snapshot is neither an array nor an object");
        Self::default()
      }
    }
  }

  /// Export time as wall clock, used as the weekly anchor when present
  pub fn anchor(&self, zone: Zone) -> Option<NaiveDateTime> {
    self
      .exported_at
      .as_deref()
      .and_then(|raw| parse_timestamp(raw, zone))
  }
}

fn parse_activities(items: Vec<Value>) -> Vec<Activity> {
  items
    .into_iter()
    .enumerate()
    .filter_map(|(index, item)| {
      if !item.is_object() {
        log::debug!("Skipping snapshot entry {}: not an object", index);
        return None;
      }
      match serde_json::from_value::<Activity>(item) {
        Ok(activity) => Some(activity),
        Err(e) => {
          log::debug!("Skipping snapshot entry {}: {}", index, e);
          None
        }
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Loading
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
  File(PathBuf),
  Http(Url),
}

impl SnapshotSource {
  /// http(s) URLs are fetched, anything else is a file path
  pub fn parse(raw: &str) -> Self {
    match Url::parse(raw) {
      Ok(url) if matches!(url.scheme(), "http" | "https") => SnapshotSource::Http(url),
      _ => SnapshotSource::File(PathBuf::from(raw)),
    }
  }
}

impl Default for SnapshotSource {
  fn default() -> Self {
    SnapshotSource::File(PathBuf::from(DEFAULT_SNAPSHOT_PATH))
  }
}

impl fmt::Display for SnapshotSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SnapshotSource::File(path) => write!(f, "{}", path.display()),
      SnapshotSource::Http(url) => write!(f, "{}", url),
    }
  }
}

pub async fn load_snapshot(source: &SnapshotSource) -> Result<Snapshot, SnapshotError> {
  log::info!("Loading snapshot from {}", source);

  let raw = match source {
    SnapshotSource::File(path) => {
      tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Io {
          path: path.display().to_string(),
          source,
        })?
    }
    SnapshotSource::Http(url) => fetch_snapshot_text(url).await?,
  };

  let snapshot = Snapshot::from_json(&raw)?;
  log::info!("Loaded {} activities", snapshot.activities.len());
  Ok(snapshot)
}

async fn fetch_snapshot_text(url: &Url) -> Result<String, SnapshotError> {
  let client = Client::builder()
    .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
    .build()?;

  // The export is rewritten in place, never serve a cached copy
  let response = client
    .get(url.clone())
    .header(CACHE_CONTROL, "no-store")
    .send()
    .await?;

  if !response.status().is_success() {
    log::warn!("Snapshot fetch from {} failed: {}", url, response.status());
    return Err(SnapshotError::Status(response.status().as_u16()));
  }

  Ok(response.text().await?)
}
