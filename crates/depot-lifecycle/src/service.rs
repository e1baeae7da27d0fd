// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The package lifecycle service.
//!
//! Every caller-driven write goes through here: validate against the
//! [`TransitionGraph`], persist the status together with its history row,
//! then notify. Notification never fails an operation; by the time it runs
//! the new state has committed.

use std::str::FromStr;
use std::sync::Arc;

use chrono::FixedOffset;
use depot_config::model::LifecycleConfig;
use depot_core::{
    Clock, DepotError, DirectoryStore, HistoryEntry, NewPackage, Package, PackageStatus,
    PackageStore, PackageType, StatusChange, StatusUpdate,
};
use tracing::{debug, info, warn};

use crate::compose::{NotificationEvent, office_offset};
use crate::history::HistoryRecorder;
use crate::notify::PackageNotifier;
use crate::policy::{Transition, TransitionGraph};
use crate::tracking::{clean_tracking_code, generate_tracking_code};

/// Attempts made when a generated tracking code collides.
const GENERATED_CODE_ATTEMPTS: usize = 3;

/// Per-parcel outcome of [`LifecycleService::bulk_mark_collected`].
#[derive(Debug, Default)]
pub struct BulkReport {
    pub collected: Vec<String>,
    pub failed: Vec<(String, DepotError)>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct LifecycleService {
    store: Arc<dyn PackageStore>,
    directory: Arc<dyn DirectoryStore>,
    notifier: Arc<PackageNotifier>,
    clock: Arc<dyn Clock>,
    graph: TransitionGraph,
    retention: chrono::Duration,
    tracking_prefix: String,
    offset: FixedOffset,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn PackageStore>,
        directory: Arc<dyn DirectoryStore>,
        notifier: Arc<PackageNotifier>,
        clock: Arc<dyn Clock>,
        config: &LifecycleConfig,
    ) -> Result<Self, DepotError> {
        Ok(Self {
            store,
            directory,
            notifier,
            clock,
            graph: TransitionGraph::from_table(&config.transition_table())?,
            retention: chrono::Duration::days(i64::from(config.retention_days)),
            tracking_prefix: config.tracking_prefix.clone(),
            offset: office_offset(config.utc_offset_hours),
        })
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    /// Record a parcel that just arrived, in `received` status.
    pub async fn receive_package(
        &self,
        details: NewPackage,
        actor_id: &str,
    ) -> Result<Package, DepotError> {
        let package_type = validate_details(&details)?;
        self.ensure_references(&details).await?;

        let supplied = clean_tracking_code(details.tracking_code.as_deref());
        let attempts = if supplied.is_some() {
            1
        } else {
            GENERATED_CODE_ATTEMPTS
        };

        let mut attempt = 0;
        let pkg = loop {
            attempt += 1;
            let now = self.clock.now();
            let tracking_code = supplied.clone().unwrap_or_else(|| {
                generate_tracking_code(&self.tracking_prefix, now.with_timezone(&self.offset))
            });
            let pkg = Package {
                id: uuid::Uuid::new_v4().to_string(),
                tracking_code,
                description: details.description.trim().to_string(),
                package_type,
                quantity: details.quantity,
                photo: details.photo.clone(),
                status: PackageStatus::Received,
                owner_id: details.owner_id.clone(),
                sender_id: details.sender_id.clone(),
                locker_id: details.locker_id.clone(),
                picked_up_by: None,
                proof_image: None,
                completed_at: None,
                expired_at: now + self.retention,
                deleted_at: None,
                created_at: now,
                updated_at: now,
                version: 0,
            };
            let entry = HistoryRecorder::received(&pkg.id, actor_id, now);
            match self.store.create_package(&pkg, &entry).await {
                Ok(()) => break pkg,
                Err(DepotError::Validation(msg)) if attempt < attempts => {
                    debug!(attempt, %msg, "generated tracking code collided, retrying");
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            package_id = %pkg.id,
            tracking_code = %pkg.tracking_code,
            actor = actor_id,
            "package received"
        );
        self.notifier.notify(NotificationEvent::Received, &pkg).await;
        Ok(pkg)
    }

    /// Move a parcel to `requested`, which is validated against the graph.
    ///
    /// Requesting the current status is a no-op that returns the parcel
    /// unchanged without writing history or notifying.
    pub async fn update_status(
        &self,
        package_id: &str,
        requested: &str,
        actor_id: &str,
        extra: StatusUpdate,
    ) -> Result<Package, DepotError> {
        let pkg = self.load(package_id).await?;
        self.apply_status(pkg, requested, actor_id, extra).await
    }

    /// Validate and write a move from the already loaded `pkg`. The write is
    /// guarded by the version `pkg` was read at.
    async fn apply_status(
        &self,
        pkg: Package,
        requested: &str,
        actor_id: &str,
        extra: StatusUpdate,
    ) -> Result<Package, DepotError> {
        let package_id = pkg.id.as_str();
        let (to, set_completed_at) = match self.graph.validate_transition(pkg.status, requested)? {
            Transition::NoOp => {
                debug!(package_id, status = %pkg.status, "status unchanged");
                return Ok(pkg);
            }
            Transition::Apply {
                to,
                set_completed_at,
            } => (to, set_completed_at),
        };

        if (extra.picked_up_by.is_some() || extra.proof_image.is_some())
            && to != PackageStatus::Completed
        {
            return Err(DepotError::Validation(
                "pickup details can only be recorded when completing a package".into(),
            ));
        }
        if let Some(recipient_id) = &extra.picked_up_by
            && self.directory.get_recipient(recipient_id).await?.is_none()
        {
            return Err(DepotError::not_found("recipient", recipient_id.as_str()));
        }

        let now = self.clock.now();
        let mut change = StatusChange::from_package(&pkg, to, now);
        if set_completed_at && change.completed_at.is_none() {
            change.completed_at = Some(now);
        }
        if extra.picked_up_by.is_some() {
            change.picked_up_by = extra.picked_up_by;
        }
        if extra.proof_image.is_some() {
            change.proof_image = extra.proof_image;
        }
        let entry = HistoryRecorder::transition(&pkg.id, pkg.status, to, actor_id, now);

        let updated = self.store.update_package_status(&change, &entry).await?;
        info!(
            package_id,
            from = %pkg.status,
            to = %updated.status,
            actor = actor_id,
            "package status changed"
        );

        if updated.status == PackageStatus::Completed {
            self.notifier.notify(NotificationEvent::Completed, &updated).await;
        }
        Ok(updated)
    }

    /// Complete each parcel independently, attributing pickup to `recipient_id`.
    ///
    /// Fails up front only when the recipient does not exist; per-parcel
    /// errors are collected in the report.
    pub async fn bulk_mark_collected(
        &self,
        package_ids: &[String],
        recipient_id: &str,
        proof_image: Option<String>,
        actor_id: &str,
    ) -> Result<BulkReport, DepotError> {
        if self.directory.get_recipient(recipient_id).await?.is_none() {
            return Err(DepotError::not_found("recipient", recipient_id));
        }

        let mut report = BulkReport::default();
        for id in package_ids {
            let extra = StatusUpdate {
                picked_up_by: Some(recipient_id.to_string()),
                proof_image: proof_image.clone(),
            };
            match self.collect_one(id, actor_id, extra).await {
                Ok(_) => report.collected.push(id.clone()),
                Err(e) => {
                    warn!(package_id = %id, error = %e, "bulk collection skipped package");
                    report.failed.push((id.clone(), e));
                }
            }
        }
        info!(
            recipient_id,
            collected = report.collected.len(),
            failed = report.failed.len(),
            "bulk collection finished"
        );
        Ok(report)
    }

    /// A parcel that was already handed over is reported as a failure, so
    /// its original pickup record is never mistaken for this one.
    async fn collect_one(
        &self,
        package_id: &str,
        actor_id: &str,
        extra: StatusUpdate,
    ) -> Result<Package, DepotError> {
        let pkg = self.load(package_id).await?;
        if pkg.status == PackageStatus::Completed {
            return Err(DepotError::Validation(format!(
                "package {package_id} was already collected"
            )));
        }
        self.apply_status(pkg, &PackageStatus::Completed.to_string(), actor_id, extra)
            .await
    }

    async fn load(&self, package_id: &str) -> Result<Package, DepotError> {
        self.store
            .get_package(package_id)
            .await?
            .ok_or_else(|| DepotError::not_found("package", package_id))
    }

    /// Audit trail of a parcel, oldest first.
    pub async fn history(&self, package_id: &str) -> Result<Vec<HistoryEntry>, DepotError> {
        if self.store.get_package(package_id).await?.is_none() {
            return Err(DepotError::not_found("package", package_id));
        }
        self.store.list_history(package_id).await
    }

    async fn ensure_references(&self, details: &NewPackage) -> Result<(), DepotError> {
        if self.directory.get_owner(&details.owner_id).await?.is_none() {
            return Err(DepotError::not_found("owner", details.owner_id.as_str()));
        }
        if self.directory.get_sender(&details.sender_id).await?.is_none() {
            return Err(DepotError::not_found("sender", details.sender_id.as_str()));
        }
        if self.directory.get_locker(&details.locker_id).await?.is_none() {
            return Err(DepotError::not_found("locker", details.locker_id.as_str()));
        }
        Ok(())
    }
}

fn validate_details(details: &NewPackage) -> Result<PackageType, DepotError> {
    if details.description.trim().is_empty() {
        return Err(DepotError::Validation("description is required".into()));
    }
    if details.quantity <= 0 {
        return Err(DepotError::Validation("quantity must be greater than zero".into()));
    }
    for (field, value) in [
        ("owner", &details.owner_id),
        ("sender", &details.sender_id),
        ("locker", &details.locker_id),
    ] {
        if value.trim().is_empty() {
            return Err(DepotError::Validation(format!("{field} is required")));
        }
    }
    PackageType::from_str(details.package_type.trim()).map_err(|_| {
        DepotError::Validation(format!(
            "unknown package type `{}` (expected document, item, or other)",
            details.package_type
        ))
    })
}
