use serde::Serialize;
use tokio::process::Command;

use super::CommandError;
use crate::config::DashboardConfig;

/// Lines of exporter stdout kept for the log and the summary
const OUTPUT_TAIL_LINES: usize = 5;

/// Result of a successful export run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
  pub command: String,
  pub exit_code: Option<i32>,
  pub output_tail: Vec<String>,
}

/// Re-run the configured exporter so the next load sees fresh data
pub async fn refresh(config: &DashboardConfig) -> Result<RefreshOutcome, CommandError> {
  let command = config
    .export_command
    .as_deref()
    .ok_or(CommandError::ExportNotConfigured)?;
  run_export(command).await
}

pub async fn run_export(command: &str) -> Result<RefreshOutcome, CommandError> {
  log::info!("Running export command: {}", command);

  let output = shell(command)
    .output()
    .await
    .map_err(CommandError::ExportSpawn)?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let output_tail = tail_lines(&stdout, OUTPUT_TAIL_LINES);
  for line in &output_tail {
    log::info!("export: {}", line);
  }

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    log::warn!("Export command failed ({}): {}", output.status, stderr.trim());
    return Err(CommandError::ExportFailed(output.status.to_string()));
  }

  Ok(RefreshOutcome {
    command: command.to_string(),
    exit_code: output.status.code(),
    output_tail,
  })
}

pub fn render_refresh(outcome: &RefreshOutcome) -> String {
  let mut out = format!("Export finished: {}\n", outcome.command);
  for line in &outcome.output_tail {
    out.push_str("  ");
    out.push_str(line);
    out.push('\n');
  }
  out
}

fn shell(command: &str) -> Command {
  let mut cmd = if cfg!(windows) {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C");
    cmd
  } else {
    let mut cmd = Command::new("sh");
    cmd.arg("-c");
    cmd
  };
  cmd.arg(command).kill_on_drop(true);
  cmd
}

fn tail_lines(text: &str, count: usize) -> Vec<String> {
  let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
  lines[lines.len().saturating_sub(count)..]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tail_lines() {
    let text = "1\n2\n\n3\n4\n5\n6\n7\n";
    assert_eq!(tail_lines(text, 5), vec!["3", "4", "5", "6", "7"]);
    assert_eq!(tail_lines("only\n", 5), vec!["only"]);
    assert!(tail_lines("", 5).is_empty());
  }

  #[tokio::test]
  async fn test_refresh_requires_command() {
    let err = refresh(&DashboardConfig::default()).await.unwrap_err();
    assert!(matches!(err, CommandError::ExportNotConfigured));
    assert!(!err.is_retryable());
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_run_export_success() {
    let outcome = run_export("echo fetched; echo wrote 3 activities").await.unwrap();
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.output_tail, vec!["fetched", "wrote 3 activities"]);
    assert!(render_refresh(&outcome).contains("  wrote 3 activities"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_run_export_failure() {
    let err = run_export("echo partial; exit 3").await.unwrap_err();
    assert!(matches!(err, CommandError::ExportFailed(_)));
    assert!(err.is_retryable());
  }
}
