// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives the sweep jobs on their schedules until cancelled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use depot_config::model::SweepConfig;
use depot_core::{Clock, CronLog, CronLogSink, CronStatus, DepotError};
use depot_lifecycle::{SweepJob, SweepRunner, office_offset};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::schedule::JobSchedule;

pub struct SweepScheduler {
    runner: Arc<SweepRunner>,
    sink: Arc<dyn CronLogSink>,
    clock: Arc<dyn Clock>,
    schedules: Vec<JobSchedule>,
    offset: FixedOffset,
    timeout: Duration,
    running: HashMap<SweepJob, Arc<Mutex<()>>>,
}

impl SweepScheduler {
    pub fn new(
        runner: Arc<SweepRunner>,
        sink: Arc<dyn CronLogSink>,
        clock: Arc<dyn Clock>,
        config: &SweepConfig,
        utc_offset_hours: i32,
    ) -> Result<Self, DepotError> {
        let schedules = JobSchedule::from_config(config)?;
        let running = [SweepJob::Expire, SweepJob::Purge]
            .into_iter()
            .map(|job| (job, Arc::new(Mutex::new(()))))
            .collect();
        Ok(Self {
            runner,
            sink,
            clock,
            schedules,
            offset: office_offset(utc_offset_hours),
            timeout: Duration::from_secs(config.timeout_secs),
            running,
        })
    }

    /// Override the overall per-run deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn schedules(&self) -> &[JobSchedule] {
        &self.schedules
    }

    /// Run `job` now and record the outcome.
    ///
    /// A run of the same job already in flight turns this one into a
    /// `skipped` record. The returned log has already been handed to the sink.
    pub async fn run_once(&self, job: SweepJob) -> CronLog {
        let (status, message) = match self.running.get(&job).map(|m| m.clone().try_lock_owned()) {
            Some(Ok(_guard)) => self.execute(job).await,
            Some(Err(_)) => {
                warn!(%job, "previous run still in progress, skipping");
                (
                    CronStatus::Skipped,
                    "previous run still in progress".to_string(),
                )
            }
            None => (CronStatus::Failure, format!("no lock registered for {job}")),
        };

        let log = CronLog {
            id: uuid::Uuid::new_v4().to_string(),
            job_name: job.to_string(),
            status,
            message,
            executed_at: self.clock.now(),
        };
        if let Err(e) = self.sink.record(&log).await {
            warn!(%job, error = %e, "failed to write cron log");
        }
        log
    }

    async fn execute(&self, job: SweepJob) -> (CronStatus, String) {
        debug!(%job, timeout = ?self.timeout, "sweep starting");
        match tokio::time::timeout(self.timeout, self.runner.run(job)).await {
            Ok(Ok(report)) => (CronStatus::Success, report.to_string()),
            Ok(Err(e)) => {
                error!(%job, error = %e, "sweep failed");
                (CronStatus::Failure, e.to_string())
            }
            Err(_) => {
                let err = DepotError::Timeout {
                    duration: self.timeout,
                };
                error!(%job, error = %err, "sweep timed out");
                (CronStatus::Timeout, err.to_string())
            }
        }
    }

    /// Fire every job on its schedule until `cancel` fires.
    ///
    /// A sweep already running when cancellation arrives finishes (or hits
    /// its timeout) before this returns.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();
        for schedule in self.schedules.clone() {
            let scheduler = Arc::clone(&self);
            let cancel = cancel.clone();
            tasks.spawn(async move { scheduler.job_loop(schedule, cancel).await });
        }
        info!(jobs = self.schedules.len(), "sweep scheduler started");

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "sweep loop panicked");
            }
        }
        info!("sweep scheduler stopped");
    }

    async fn job_loop(&self, schedule: JobSchedule, cancel: CancellationToken) {
        loop {
            let now = self.clock.now();
            let Some(next) = schedule.next_after(now, self.offset) else {
                warn!(job = %schedule.job, expression = %schedule.expression, "schedule has no future firing");
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(job = %schedule.job, next = %next, "next sweep scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(job = %schedule.job, "sweep loop cancelled");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    let log = self.run_once(schedule.job).await;
                    info!(job = %schedule.job, status = %log.status, message = %log.message, "scheduled sweep finished");
                }
            }
        }
    }
}
