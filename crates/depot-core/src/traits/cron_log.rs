// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink for per-run sweep records.

use async_trait::async_trait;

use crate::error::DepotError;
use crate::types::CronLog;

/// Receives one [`CronLog`] per sweep execution.
#[async_trait]
pub trait CronLogSink: Send + Sync + 'static {
    async fn record(&self, log: &CronLog) -> Result<(), DepotError>;

    /// Most recent records first, optionally filtered by job name.
    async fn recent(
        &self,
        job_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CronLog>, DepotError>;
}
