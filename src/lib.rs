pub mod analysis;
pub mod commands;
pub mod config;
pub mod format;
pub mod models;
pub mod normalize;
pub mod snapshot;
pub mod time_window;

#[cfg(test)]
pub(crate) mod test_utils;

use clap::Parser;

use commands::{Cli, CommandError, ErrorReport};
use config::DashboardConfig;

pub use analysis::{
  compute_personal_records, compute_weekly_metrics, daily_distance, get_fastest_run_by_pace,
  get_last_run, list_activities, period_summary, PeriodFilter,
};
pub use models::{Activity, Dashboard, PersonalRecordSlot, WeeklyMetrics};
pub use snapshot::{load_snapshot, Snapshot, SnapshotError, SnapshotSource};
pub use time_window::Zone;

pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  init_logging(cli.verbose);
  let json = cli.json;

  let result = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .map_err(CommandError::Runtime)
    .and_then(|runtime| {
      runtime.block_on(async move {
        let config = DashboardConfig::from_env()?;
        commands::execute(cli, config).await
      })
    });

  match result {
    Ok(output) => println!("{}", output.trim_end()),
    Err(e) => {
      log::error!("{}", e);
      report_error(&e, json);
      std::process::exit(1);
    }
  }
}

/// Reads RUST_LOG, quiet by default
fn init_logging(verbose: bool) {
  let mut builder =
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
  if verbose {
    builder.filter_module("runboard_lib", log::LevelFilter::Debug);
  }
  // Only fails when a logger is already installed
  let _ = builder.try_init();
}

fn report_error(error: &CommandError, json: bool) {
  if json {
    match serde_json::to_string(&ErrorReport::from(error)) {
      Ok(body) => println!("{}", body),
      Err(_) => eprintln!("Error: {}", error),
    }
    return;
  }

  eprintln!("Error: {}", error);
  if error.is_retryable() {
    eprintln!("The snapshot may be missing or stale; run `runboard refresh` and try again.");
  }
}
