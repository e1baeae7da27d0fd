// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsed cron cadence for one sweep job.

use chrono::{DateTime, FixedOffset, Utc};
use croner::Cron;
use depot_config::model::SweepConfig;
use depot_core::DepotError;
use depot_lifecycle::SweepJob;

#[derive(Debug, Clone)]
pub struct JobSchedule {
    pub job: SweepJob,
    pub expression: String,
    cron: Cron,
}

impl JobSchedule {
    pub fn parse(job: SweepJob, expression: &str) -> Result<Self, DepotError> {
        let cron = expression.parse::<Cron>().map_err(|e| {
            DepotError::Config(format!(
                "{job} schedule `{expression}` is not a valid cron expression: {e}"
            ))
        })?;
        Ok(Self {
            job,
            expression: expression.to_string(),
            cron,
        })
    }

    /// Both sweep schedules from config, expire first.
    pub fn from_config(config: &SweepConfig) -> Result<Vec<Self>, DepotError> {
        Ok(vec![
            Self::parse(SweepJob::Expire, &config.expire_schedule)?,
            Self::parse(SweepJob::Purge, &config.purge_schedule)?,
        ])
    }

    /// First firing strictly after `now`, evaluated in `offset` local time.
    pub fn next_after(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&offset);
        self.cron
            .find_next_occurrence(&local, false)
            .ok()
            .map(|next| next.with_timezone(&Utc))
    }
}
