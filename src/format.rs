//! Display formatting for durations, paces and dates.
//!
//! Every formatter is total: out-of-domain input renders as `PLACEHOLDER`.

use chrono::NaiveDateTime;

pub const PLACEHOLDER: &str = "–";

pub const NO_DATA: &str = "no data";

/// `H:MM:SS` with hours, `M:SS` without.
pub fn format_duration(seconds: f64) -> String {
  if !seconds.is_finite() || seconds <= 0.0 {
    return PLACEHOLDER.to_string();
  }

  let total = seconds.floor() as u64;
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let secs = total % 60;

  if hours > 0 {
    format!("{}:{:02}:{:02}", hours, minutes, secs)
  } else {
    format!("{}:{:02}", minutes, secs)
  }
}

/// `M:SS /km`. Rounds to whole seconds before splitting, so 299.6 s is `5:00`.
pub fn format_pace(sec_per_km: f64) -> String {
  if !sec_per_km.is_finite() || sec_per_km <= 0.0 {
    return PLACEHOLDER.to_string();
  }

  let total = sec_per_km.round() as u64;
  format!("{}:{:02} /km", total / 60, total % 60)
}

pub fn format_distance_km(km: f64) -> String {
  if !km.is_finite() {
    return PLACEHOLDER.to_string();
  }
  format!("{:.2} km", km)
}

/// Record time, or "no data" for a target nobody has reached yet
pub fn format_record_time(seconds: Option<f64>) -> String {
  match seconds {
    Some(seconds) => format_duration(seconds),
    None => NO_DATA.to_string(),
  }
}

pub fn format_date(date: Option<NaiveDateTime>) -> String {
  date
    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| PLACEHOLDER.to_string())
}
