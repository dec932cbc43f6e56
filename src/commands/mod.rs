pub mod analysis;
pub mod export;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::analysis::{
  compute_personal_records, compute_weekly_metrics, daily_distance, distance_distribution,
  get_fastest_run_by_pace, get_last_run, list_activities, period_summary, weekly_volume,
  PeriodFilter, DEFAULT_DISTANCE_BIN_KM,
};
use crate::config::{parse_distance_km, ConfigError, DashboardConfig, UTC_OFFSET_VAR};
use crate::models::{Activity, Dashboard, LastRunSummary, PeriodSummary};
use crate::snapshot::{load_snapshot, Snapshot, SnapshotError, SnapshotSource};
use crate::time_window::{parse_timestamp, Zone};

/// ---------------------------------------------------------------------------
/// Command Line
/// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
  name = "runboard",
  version,
  about = "Running dashboard from an activity export",
  long_about = "Weekly load, last and fastest runs, personal records and period totals \
                computed from an exported activity snapshot."
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Snapshot file path or http(s) URL (overrides RUNBOARD_SNAPSHOT)
  #[arg(long, global = true)]
  pub snapshot: Option<String>,

  /// Reference time for the weekly panel (defaults to the export time, then now)
  #[arg(long, global = true)]
  pub anchor: Option<String>,

  /// Fixed UTC offset such as +02:00 (overrides RUNBOARD_UTC_OFFSET)
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub utc_offset: Option<String>,

  /// Print JSON instead of text
  #[arg(long, global = true)]
  pub json: bool,

  /// Enable debug logging
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
  /// Every dashboard panel (default)
  Summary,

  /// Distance, heart rate and load for the current ISO week
  Weekly,

  /// The most recent run
  LastRun,

  /// Fastest run by average pace
  Fastest {
    /// Minimum distance in km (overrides RUNBOARD_MIN_FASTEST_KM)
    #[arg(long, value_parser = parse_min_km_arg)]
    min_km: Option<f64>,
  },

  /// Best projected times over the standard distances
  Records,

  /// Running volume per ISO week
  Volume,

  /// Histogram of run distances
  Distribution {
    /// Bin width in km
    #[arg(long, default_value_t = DEFAULT_DISTANCE_BIN_KM)]
    bin_km: f64,
  },

  /// Activity count, distance, time and climb for a month or year
  Period {
    #[command(flatten)]
    period: PeriodArgs,
  },

  /// Distance per day
  Daily {
    #[command(flatten)]
    period: PeriodArgs,
  },

  /// Table of activities, newest first
  Activities {
    #[command(flatten)]
    period: PeriodArgs,

    /// Rows to show, 0 for all
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_LIMIT)]
    limit: usize,
  },

  /// Run the export command to rewrite the snapshot
  Refresh,
}

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Calendar and sport selection shared by the period views
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct PeriodArgs {
  /// Calendar year
  #[arg(long)]
  pub year: Option<i32>,

  /// Month, 1-12
  #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
  pub month: Option<u32>,

  /// Keep only this activity kind, repeatable
  #[arg(long = "sport")]
  pub sports: Vec<String>,
}

impl PeriodArgs {
  /// Flags as given; no calendar flag means all of history
  pub fn filter(&self) -> PeriodFilter {
    PeriodFilter {
      year: self.year,
      month: self.month,
      sports: self.sports.clone(),
    }
  }

  /// Like `filter`, but no calendar flag means the latest month with data
  pub fn filter_or_latest(&self, activities: &[Activity], zone: Zone) -> PeriodFilter {
    if self.year.is_some() || self.month.is_some() {
      return self.filter();
    }
    PeriodFilter {
      sports: self.sports.clone(),
      ..PeriodFilter::latest_month(activities, zone)
    }
  }
}

/// Period totals together with the filter that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
  pub year: Option<i32>,
  pub month: Option<u32>,
  pub sports: Vec<String>,
  #[serde(flatten)]
  pub summary: PeriodSummary,
}

impl PeriodReport {
  pub fn label(&self) -> String {
    let calendar = match (self.year, self.month) {
      (Some(year), Some(month)) => format!("{}-{:02}", year, month),
      (Some(year), None) => year.to_string(),
      (None, Some(month)) => format!("month {:02}", month),
      (None, None) => "all time".to_string(),
    };
    if self.sports.is_empty() {
      calendar
    } else {
      format!("{} ({})", calendar, self.sports.join(", "))
    }
  }
}

fn parse_min_km_arg(raw: &str) -> Result<f64, String> {
  parse_distance_km(raw)
    .ok_or_else(|| format!("expected a non-negative distance in km, got {:?}", raw))
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Snapshot(#[from] SnapshotError),

  #[error("Invalid anchor: {0:?}")]
  InvalidAnchor(String),

  #[error("No export command configured, set RUNBOARD_EXPORT_CMD")]
  ExportNotConfigured,

  #[error("Export command could not start: {0}")]
  ExportSpawn(#[source] std::io::Error),

  #[error("Export command failed: {0}")]
  ExportFailed(String),

  #[error("Failed to encode output: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("Failed to start runtime: {0}")]
  Runtime(#[source] std::io::Error),
}

impl CommandError {
  /// Whether the same command may succeed on a later attempt
  pub fn is_retryable(&self) -> bool {
    match self {
      CommandError::Snapshot(e) => e.is_retryable(),
      CommandError::ExportFailed(_) => true,
      _ => false,
    }
  }
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Body printed for `--json` failures
#[derive(Debug, Serialize)]
pub struct ErrorReport<'a> {
  pub error: &'a CommandError,
  pub retryable: bool,
}

impl<'a> From<&'a CommandError> for ErrorReport<'a> {
  fn from(error: &'a CommandError) -> Self {
    Self {
      error,
      retryable: error.is_retryable(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Dispatch
/// ---------------------------------------------------------------------------

impl Cli {
  /// Flags win over the environment
  pub fn apply_overrides(&self, config: &mut DashboardConfig) -> Result<(), ConfigError> {
    if let Some(raw) = &self.snapshot {
      config.snapshot = SnapshotSource::parse(raw);
    }
    if let Some(raw) = &self.utc_offset {
      config.zone =
        Zone::parse_offset(raw).ok_or_else(|| ConfigError::invalid(UTC_OFFSET_VAR, raw))?;
    }
    if let Some(Commands::Fastest { min_km: Some(km) }) = &self.command {
      config.min_fastest_km = *km;
    }
    Ok(())
  }
}

/// `--anchor`, then the snapshot export time, then the current time
pub fn resolve_anchor(
  explicit: Option<&str>,
  snapshot: &Snapshot,
  zone: Zone,
) -> Result<NaiveDateTime, CommandError> {
  if let Some(raw) = explicit {
    return parse_timestamp(raw, zone).ok_or_else(|| CommandError::InvalidAnchor(raw.to_string()));
  }

  Ok(snapshot.anchor(zone).unwrap_or_else(|| {
    log::debug!("Snapshot has no export time, anchoring at now");
    zone.now()
  }))
}

/// Run one command and return what should be printed
pub async fn execute(cli: Cli, mut config: DashboardConfig) -> Result<String, CommandError> {
  cli.apply_overrides(&mut config)?;
  let command = cli.command.clone().unwrap_or(Commands::Summary);

  if command == Commands::Refresh {
    let outcome = export::refresh(&config).await?;
    return render(&outcome, cli.json, export::render_refresh);
  }

  let snapshot = load_snapshot(&config.snapshot).await?;
  let anchor = resolve_anchor(cli.anchor.as_deref(), &snapshot, config.zone)?;
  render_command(&command, &snapshot, anchor, &config, cli.json)
}

/// Compute and render one panel for an already loaded snapshot
pub fn render_command(
  command: &Commands,
  snapshot: &Snapshot,
  anchor: NaiveDateTime,
  config: &DashboardConfig,
  json: bool,
) -> Result<String, CommandError> {
  let activities = &snapshot.activities;
  let zone = config.zone;
  let min_km = config.min_fastest_km;

  match command {
    Commands::Summary => {
      let dashboard = Dashboard::compute(activities, anchor, zone, min_km);
      render(&dashboard, json, |d| analysis::render_dashboard(d, min_km))
    }
    Commands::Weekly => render(
      &compute_weekly_metrics(activities, anchor, zone),
      json,
      analysis::render_weekly,
    ),
    Commands::LastRun => {
      let last_run =
        get_last_run(activities, zone).map(|run| LastRunSummary::from_activity(run, zone));
      render(&last_run, json, analysis::render_last_run)
    }
    Commands::Fastest { .. } => {
      let fastest = get_fastest_run_by_pace(activities, min_km, zone);
      render(&fastest, json, |f| analysis::render_fastest(f, min_km))
    }
    Commands::Records => render(
      &compute_personal_records(activities, zone),
      json,
      |records| analysis::render_records(records),
    ),
    Commands::Volume => render(&weekly_volume(activities, zone), json, |weeks| {
      analysis::render_volume(weeks)
    }),
    Commands::Distribution { bin_km } => render(
      &distance_distribution(activities, *bin_km),
      json,
      |bins| analysis::render_distribution(bins),
    ),
    Commands::Period { period } => {
      let filter = period.filter_or_latest(activities, zone);
      let report = PeriodReport {
        summary: period_summary(activities, &filter, zone),
        year: filter.year,
        month: filter.month,
        sports: filter.sports,
      };
      render(&report, json, |r| analysis::render_period(&r.summary, &r.label()))
    }
    Commands::Daily { period } => {
      let filter = period.filter_or_latest(activities, zone);
      render(&daily_distance(activities, &filter, zone), json, |days| {
        analysis::render_daily(days)
      })
    }
    Commands::Activities { period, limit } => {
      let mut rows = list_activities(activities, &period.filter(), zone);
      if *limit > 0 {
        rows.truncate(*limit);
      }
      render(&rows, json, |rows| analysis::render_activities(rows))
    }
    // Handled before the snapshot is loaded
    Commands::Refresh => Ok(String::new()),
  }
}

fn render<T: Serialize>(
  value: &T,
  json: bool,
  text: impl FnOnce(&T) -> String,
) -> Result<String, CommandError> {
  if json {
    Ok(serde_json::to_string_pretty(value)?)
  } else {
    Ok(text(value))
  }
}
