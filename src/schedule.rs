//! Recurring batch runs.

use anyhow::Result;
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::{parse_schedule_time, Recurrence, ScheduleConfig};
use crate::conversion::BatchRunner;

/// First occurrence of `at` (today or later) strictly after `now`, stepping by
/// the recurrence interval.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime, recurrence: Recurrence) -> NaiveDateTime {
    let interval = recurrence.interval();
    let mut next = now.date().and_time(at);
    while next <= now {
        next += interval;
    }
    next
}

/// Run `runner` on `schedule` until Ctrl-C.
///
/// Each batch runs on the blocking pool and is awaited before the next wait
/// starts, so runs never overlap.
pub async fn run_daemon(runner: Arc<BatchRunner>, schedule: &ScheduleConfig) -> Result<()> {
    let at = parse_schedule_time(&schedule.time)?;
    let mut now = Local::now().naive_local();
    let mut next = next_occurrence(now, at, schedule.recurrence);

    loop {
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!("Next conversion run at {}", next.format("%Y-%m-%d %H:%M"));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }

        let job = runner.clone();
        match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(summary) => info!(
                "Run finished: {} converted, {} fresh, {} failed, {} errors",
                summary.converted, summary.fresh, summary.failed, summary.errored
            ),
            Err(e) => error!("Conversion run aborted: {}", e),
        }

        now = Local::now().naive_local();
        next = next_occurrence(now, at, schedule.recurrence);
    }
}
