pub mod activity;
pub mod metrics;

pub use activity::{Activity, RawTimestamp};
pub use metrics::{
  ActivityRow, DailyDistance, Dashboard, DistanceBin, FastestRun, LastRunSummary, PeriodSummary,
  PersonalRecord, PersonalRecordSlot, TargetDistance, WeekVolume, WeeklyMetrics, TARGET_DISTANCES,
};
