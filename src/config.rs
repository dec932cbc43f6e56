use std::env;

use crate::analysis::DEFAULT_FASTEST_MIN_KM;
use crate::snapshot::SnapshotSource;
use crate::time_window::Zone;

/// ---------------------------------------------------------------------------
/// Environment Keys
/// ---------------------------------------------------------------------------

pub const SNAPSHOT_VAR: &str = "RUNBOARD_SNAPSHOT";
pub const MIN_FASTEST_KM_VAR: &str = "RUNBOARD_MIN_FASTEST_KM";
pub const UTC_OFFSET_VAR: &str = "RUNBOARD_UTC_OFFSET";
pub const EXPORT_CMD_VAR: &str = "RUNBOARD_EXPORT_CMD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?}")]
  Invalid { key: String, value: String },
}

impl ConfigError {
  pub fn invalid(key: &str, value: &str) -> Self {
    ConfigError::Invalid {
      key: key.to_string(),
      value: value.to_string(),
    }
  }
}

/// Dashboard configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
  pub snapshot: SnapshotSource,
  pub min_fastest_km: f64,
  pub zone: Zone,
  /// Shell command that rewrites the snapshot, run by `runboard refresh`
  pub export_command: Option<String>,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      snapshot: SnapshotSource::default(),
      min_fastest_km: DEFAULT_FASTEST_MIN_KM,
      zone: Zone::System,
      export_command: None,
    }
  }
}

impl DashboardConfig {
  /// Unset or blank variables keep their defaults; set but malformed ones are errors.
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let snapshot = optional_var(SNAPSHOT_VAR)
      .map(|raw| SnapshotSource::parse(&raw))
      .unwrap_or(defaults.snapshot);

    let min_fastest_km = match optional_var(MIN_FASTEST_KM_VAR) {
      Some(raw) => {
        parse_distance_km(&raw).ok_or_else(|| ConfigError::invalid(MIN_FASTEST_KM_VAR, &raw))?
      }
      None => defaults.min_fastest_km,
    };

    let zone = match optional_var(UTC_OFFSET_VAR) {
      Some(raw) => {
        Zone::parse_offset(&raw).ok_or_else(|| ConfigError::invalid(UTC_OFFSET_VAR, &raw))?
      }
      None => defaults.zone,
    };

    let config = Self {
      snapshot,
      min_fastest_km,
      zone,
      export_command: optional_var(EXPORT_CMD_VAR),
    };
    log::debug!("Loaded config: {:?}", config);
    Ok(config)
  }
}

/// Finite, non-negative kilometers
pub fn parse_distance_km(raw: &str) -> Option<f64> {
  raw
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|km| km.is_finite() && *km >= 0.0)
}

fn optional_var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::path::PathBuf;

  const ALL_VARS: [&str; 4] = [SNAPSHOT_VAR, MIN_FASTEST_KM_VAR, UTC_OFFSET_VAR, EXPORT_CMD_VAR];

  fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
    ALL_VARS.iter().map(|key| (*key, None)).collect()
  }

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    temp_env::with_vars(cleared(), || {
      let config = DashboardConfig::from_env().unwrap();
      assert_eq!(config, DashboardConfig::default());
      assert_eq!(config.min_fastest_km, 5.0);
      assert_eq!(config.zone, Zone::System);
    });
  }

  #[test]
  #[serial]
  fn test_reads_all_variables() {
    temp_env::with_vars(
      [
        (SNAPSHOT_VAR, Some("https://example.com/activities.json")),
        (MIN_FASTEST_KM_VAR, Some("10")),
        (UTC_OFFSET_VAR, Some("+02:00")),
        (EXPORT_CMD_VAR, Some("python scripts/export.py")),
      ],
      || {
        let config = DashboardConfig::from_env().unwrap();
        assert!(matches!(config.snapshot, SnapshotSource::Http(_)));
        assert_eq!(config.min_fastest_km, 10.0);
        assert_eq!(config.zone, Zone::parse_offset("+0200").unwrap());
        assert_eq!(config.export_command.as_deref(), Some("python scripts/export.py"));
      },
    );
  }

  #[test]
  #[serial]
  fn test_blank_values_keep_defaults() {
    temp_env::with_vars(
      [
        (SNAPSHOT_VAR, Some("  ")),
        (MIN_FASTEST_KM_VAR, Some("")),
        (UTC_OFFSET_VAR, None),
        (EXPORT_CMD_VAR, Some("")),
      ],
      || {
        let config = DashboardConfig::from_env().unwrap();
        assert_eq!(config.snapshot, SnapshotSource::File(PathBuf::from("data/activities.json")));
        assert_eq!(config.export_command, None);
      },
    );
  }

  #[test]
  #[serial]
  fn test_rejects_malformed_min_km() {
    temp_env::with_vars([(MIN_FASTEST_KM_VAR, Some("abc"))], || {
      let err = DashboardConfig::from_env().unwrap_err();
      assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == MIN_FASTEST_KM_VAR));
      assert!(err.to_string().contains("abc"));
    });

    temp_env::with_vars([(MIN_FASTEST_KM_VAR, Some("-3"))], || {
      assert!(DashboardConfig::from_env().is_err());
    });
  }

  #[test]
  #[serial]
  fn test_rejects_malformed_offset() {
    temp_env::with_vars([(UTC_OFFSET_VAR, Some("Europe/Paris"))], || {
      assert!(DashboardConfig::from_env().is_err());
    });
  }

  #[test]
  fn test_parse_distance_km() {
    assert_eq!(parse_distance_km(" 7.5 "), Some(7.5));
    assert_eq!(parse_distance_km("0"), Some(0.0));
    assert_eq!(parse_distance_km("NaN"), None);
    assert_eq!(parse_distance_km("inf"), None);
  }
}
