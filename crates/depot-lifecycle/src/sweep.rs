// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two time-driven batch jobs.
//!
//! Each run selects candidates, applies the system transition through the
//! same version-guarded write as caller updates, and moves on past any
//! per-parcel failure. Selection predicates exclude parcels that already
//! moved, so running a job twice is harmless.

use std::fmt;
use std::sync::Arc;

use depot_core::{Clock, DepotError, Package, PackageStatus, PackageStore, StatusChange};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::compose::NotificationEvent;
use crate::history::HistoryRecorder;
use crate::notify::PackageNotifier;
use crate::policy::{Transition, TransitionGraph};

/// Which sweep to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SweepJob {
    /// Move overdue parcels to `expired` and notify the owner.
    Expire,
    /// Soft-delete parcels that stayed `expired` past the grace period.
    Purge,
}

/// Counts from one sweep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub job: SweepJob,
    pub candidates: usize,
    pub transitioned: usize,
    /// Lost a race with another writer, or no longer eligible.
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    fn new(job: SweepJob, candidates: usize) -> Self {
        Self {
            job,
            candidates,
            transitioned: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} candidates, {} transitioned, {} skipped, {} failed",
            self.job, self.candidates, self.transitioned, self.skipped, self.failed
        )
    }
}

pub struct SweepRunner {
    store: Arc<dyn PackageStore>,
    notifier: Arc<PackageNotifier>,
    clock: Arc<dyn Clock>,
    graph: TransitionGraph,
    grace: chrono::Duration,
}

impl SweepRunner {
    pub fn new(
        store: Arc<dyn PackageStore>,
        notifier: Arc<PackageNotifier>,
        clock: Arc<dyn Clock>,
        grace_days: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            graph: TransitionGraph::default(),
            grace: chrono::Duration::days(i64::from(grace_days)),
        }
    }

    pub async fn run(&self, job: SweepJob) -> Result<SweepReport, DepotError> {
        match job {
            SweepJob::Expire => self.expire_stale().await,
            SweepJob::Purge => self.purge_expired().await,
        }
    }

    /// Expire every live, non-terminal parcel whose retention deadline passed.
    ///
    /// Fails only when candidates cannot be selected.
    pub async fn expire_stale(&self) -> Result<SweepReport, DepotError> {
        let now = self.clock.now();
        let candidates = self.store.find_expirable(now).await?;
        let mut report = SweepReport::new(SweepJob::Expire, candidates.len());

        for pkg in &candidates {
            match self.apply(pkg, PackageStatus::Expired).await {
                Ok(Some(updated)) => {
                    report.transitioned += 1;
                    self.notifier.notify(NotificationEvent::Expired, &updated).await;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => self.record_failure(&mut report, pkg, e),
            }
        }

        info!(%report, "expire sweep finished");
        Ok(report)
    }

    /// Soft-delete parcels expired for longer than the grace period. No notification.
    pub async fn purge_expired(&self) -> Result<SweepReport, DepotError> {
        let cutoff = self.clock.now() - self.grace;
        let candidates = self.store.find_purgeable(cutoff).await?;
        let mut report = SweepReport::new(SweepJob::Purge, candidates.len());

        for pkg in &candidates {
            match self.apply(pkg, PackageStatus::Deleted).await {
                Ok(Some(_)) => report.transitioned += 1,
                Ok(None) => report.skipped += 1,
                Err(e) => self.record_failure(&mut report, pkg, e),
            }
        }

        info!(%report, "purge sweep finished");
        Ok(report)
    }

    /// `Ok(None)` when there was nothing to write.
    async fn apply(
        &self,
        pkg: &Package,
        target: PackageStatus,
    ) -> Result<Option<Package>, DepotError> {
        if self.graph.validate_system_transition(pkg.status, target)? == Transition::NoOp {
            return Ok(None);
        }

        let now = self.clock.now();
        let mut change = StatusChange::from_package(pkg, target, now);
        let entry = match target {
            PackageStatus::Deleted => {
                change.deleted_at = Some(now);
                HistoryRecorder::purged(&pkg.id, now)
            }
            _ => HistoryRecorder::expired(&pkg.id, now),
        };

        let updated = self.store.update_package_status(&change, &entry).await?;
        debug!(package_id = %pkg.id, status = %updated.status, "sweep transitioned package");
        Ok(Some(updated))
    }

    fn record_failure(&self, report: &mut SweepReport, pkg: &Package, err: DepotError) {
        if err.is_retryable() {
            debug!(package_id = %pkg.id, job = %report.job, "package changed during sweep, skipped");
            report.skipped += 1;
        } else {
            warn!(package_id = %pkg.id, job = %report.job, error = %err, "sweep failed for package");
            report.failed += 1;
        }
    }
}
