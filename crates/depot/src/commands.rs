// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands. Each returns the text to print so the output can
//! be asserted on in tests.

use std::fmt::Write as _;
use std::sync::Arc;

use depot_config::model::DepotConfig;
use depot_core::{CronLogSink, DepotError, NewPackage, Package, PluginAdapter, StatusUpdate};
use depot_cron::SweepScheduler;
use depot_lifecycle::SweepJob;

use crate::app::App;

fn fmt_err(e: std::fmt::Error) -> DepotError {
    DepotError::Internal(format!("failed to format output: {e}"))
}

fn describe(pkg: &Package) -> String {
    format!(
        "{} {} [{}] v{} expires {}",
        pkg.id,
        pkg.tracking_code,
        pkg.status,
        pkg.version,
        pkg.expired_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub async fn receive(app: &App, details: NewPackage, actor: &str) -> Result<String, DepotError> {
    let pkg = app.service.receive_package(details, actor).await?;
    Ok(format!("received {}", describe(&pkg)))
}

pub async fn status(
    app: &App,
    package_id: &str,
    status: &str,
    actor: &str,
    extra: StatusUpdate,
) -> Result<String, DepotError> {
    let pkg = app
        .service
        .update_status(package_id, status, actor, extra)
        .await?;
    Ok(format!("updated {}", describe(&pkg)))
}

/// Mark several parcels collected. Fails when any parcel could not be
/// collected, after reporting every outcome.
pub async fn collect(
    app: &App,
    package_ids: &[String],
    recipient: &str,
    proof: Option<String>,
    actor: &str,
) -> Result<String, DepotError> {
    let report = app
        .service
        .bulk_mark_collected(package_ids, recipient, proof, actor)
        .await?;

    let mut out = String::new();
    for id in &report.collected {
        writeln!(out, "collected {id}").map_err(fmt_err)?;
    }
    for (id, e) in &report.failed {
        writeln!(out, "failed {id}: {e}").map_err(fmt_err)?;
    }
    if !report.is_complete() {
        return Err(DepotError::Validation(format!(
            "{}{} of {} parcels could not be collected",
            out,
            report.failed.len(),
            package_ids.len()
        )));
    }
    Ok(out.trim_end().to_string())
}

pub async fn history(app: &App, package_id: &str, json: bool) -> Result<String, DepotError> {
    let entries = app.service.history(package_id).await?;
    if json {
        return serde_json::to_string_pretty(&entries)
            .map_err(|e| DepotError::Internal(format!("failed to serialize history: {e}")));
    }

    let mut out = String::new();
    for entry in &entries {
        writeln!(
            out,
            "{}  {:<10}  {:<10}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.status,
            entry.changed_by.as_deref().unwrap_or("system"),
            entry.description,
        )
        .map_err(fmt_err)?;
    }
    Ok(out.trim_end().to_string())
}

/// Run one sweep now, through the scheduler so the run is logged.
pub async fn sweep(app: &App, job: SweepJob) -> Result<String, DepotError> {
    let scheduler = scheduler(app)?;
    let log = scheduler.run_once(job).await;
    Ok(format!("{} {}: {}", log.job_name, log.status, log.message))
}

/// Recent sweep runs, newest first.
pub async fn sweep_history(
    app: &App,
    job: Option<SweepJob>,
    limit: usize,
) -> Result<String, DepotError> {
    let job_name = job.map(|j| j.to_string());
    let logs = app.store.recent(job_name.as_deref(), limit).await?;
    if logs.is_empty() {
        return Ok("no sweep runs recorded".to_string());
    }

    let mut out = String::new();
    for log in &logs {
        writeln!(
            out,
            "{}  {:<6}  {:<8}  {}",
            log.executed_at.format("%Y-%m-%d %H:%M:%S"),
            log.job_name,
            log.status,
            log.message,
        )
        .map_err(fmt_err)?;
    }
    Ok(out.trim_end().to_string())
}

fn scheduler(app: &App) -> Result<SweepScheduler, DepotError> {
    let sink: Arc<dyn CronLogSink> = app.store.clone();
    SweepScheduler::new(
        app.sweeps.clone(),
        sink,
        app.clock.clone(),
        &app.config.sweep,
        app.config.lifecycle.utc_offset_hours,
    )
}

pub async fn ask(app: &App, phone: &str, text: &str) -> Result<String, DepotError> {
    Ok(app
        .chatbot
        .respond(phone, text)
        .await?
        .unwrap_or_else(|| format!("(no reply: {phone} is not a registered owner)")))
}

/// Print the effective configuration.
pub fn show_config(config: &DepotConfig) -> Result<String, DepotError> {
    toml::to_string_pretty(config)
        .map_err(|e| DepotError::Internal(format!("failed to render configuration: {e}")))
}

/// Report adapter health. Configuration was already validated on load.
pub async fn check(app: &App) -> Result<String, DepotError> {
    let mut out = String::from("configuration OK\n");
    let store = app.store.health_check().await?;
    writeln!(out, "{}: {store:?}", app.store.name()).map_err(fmt_err)?;

    match &app.channel {
        Some(channel) => {
            app.connect_channel().await;
            let health = channel.health_check().await?;
            writeln!(out, "{}: {health:?}", channel.name()).map_err(fmt_err)?;
        }
        None => writeln!(out, "channel: not configured").map_err(fmt_err)?,
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{Locker, Owner, PackageStatus, Recipient, Sender};

    async fn app(dir: &tempfile::TempDir) -> App {
        let mut config = DepotConfig::default();
        config.storage.database_path = dir.path().join("cli.db").to_string_lossy().into_owned();
        let app = App::build(config).await.unwrap();
        app.store
            .insert_owner(&Owner {
                id: "owner-1".into(),
                name: "Sari".into(),
                phone_number: "6281234567890".into(),
            })
            .await
            .unwrap();
        app.store
            .insert_sender(&Sender {
                id: "sender-1".into(),
                name: "JNE Express".into(),
                phone_number: None,
            })
            .await
            .unwrap();
        app.store
            .insert_locker(&Locker {
                id: "locker-1".into(),
                code: "A-01".into(),
            })
            .await
            .unwrap();
        app.store
            .insert_recipient(&Recipient {
                id: "recipient-1".into(),
                name: "Rina".into(),
                phone_number: None,
            })
            .await
            .unwrap();
        app
    }

    fn details(code: &str) -> NewPackage {
        NewPackage {
            tracking_code: Some(code.into()),
            description: "Shoes".into(),
            package_type: "item".into(),
            quantity: 1,
            owner_id: "owner-1".into(),
            sender_id: "sender-1".into(),
            locker_id: "locker-1".into(),
            ..Default::default()
        }
    }

    async fn package_id(app: &App, code: &str) -> String {
        use depot_core::PackageStore;
        app.store
            .get_package_by_tracking_code(code)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn receive_then_walk_the_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let out = receive(&app, details("PACK-1"), "clerk").await.unwrap();
        assert!(out.contains("PACK-1 [received] v0"), "{out}");
        let id = package_id(&app, "PACK-1").await;

        let out = status(&app, &id, "Delivered", "clerk", StatusUpdate::default())
            .await
            .unwrap();
        assert!(out.contains("[delivered] v1"), "{out}");

        let err = status(&app, &id, "expired", "clerk", StatusUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::ForbiddenManualTransition(_)));

        let out = history(&app, &id, false).await.unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("received") && lines[0].contains("clerk"));

        let json: serde_json::Value =
            serde_json::from_str(&history(&app, &id, true).await.unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn collect_reports_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        receive(&app, details("PACK-1"), "clerk").await.unwrap();
        let id = package_id(&app, "PACK-1").await;

        let ids = vec![id.clone(), "missing".to_string()];
        let err = collect(&app, &ids, "recipient-1", None, "clerk")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&format!("collected {id}")), "{msg}");
        assert!(msg.contains("failed missing"), "{msg}");

        use depot_core::PackageStore;
        let pkg = app.store.get_package(&id).await.unwrap().unwrap();
        assert_eq!(pkg.status, PackageStatus::Completed);
        assert_eq!(pkg.picked_up_by.as_deref(), Some("recipient-1"));
    }

    #[tokio::test]
    async fn manual_sweep_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        assert_eq!(
            sweep_history(&app, None, 20).await.unwrap(),
            "no sweep runs recorded"
        );
        let out = sweep(&app, SweepJob::Expire).await.unwrap();
        assert!(out.starts_with("expire success: "), "{out}");
        sweep(&app, SweepJob::Purge).await.unwrap();

        let all = sweep_history(&app, None, 20).await.unwrap();
        assert_eq!(all.lines().count(), 2);
        let purge_only = sweep_history(&app, Some(SweepJob::Purge), 20).await.unwrap();
        assert_eq!(purge_only.lines().count(), 1);
        assert!(purge_only.contains("purge"));
    }

    #[tokio::test]
    async fn ask_answers_registered_owners_only() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        receive(&app, details("PACK-1"), "clerk").await.unwrap();

        let reply = ask(&app, "081234567890", "check PACK-1").await.unwrap();
        assert!(reply.contains("PACK-1"), "{reply}");

        let reply = ask(&app, "6280000000000", "hi").await.unwrap();
        assert!(reply.starts_with("(no reply"), "{reply}");
    }

    #[tokio::test]
    async fn check_reports_adapter_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        let out = check(&app).await.unwrap();
        assert!(out.contains("configuration OK"));
        assert!(out.contains("Healthy"), "{out}");
        assert!(out.contains("channel: not configured"));

        let rendered = show_config(&app.config).unwrap();
        assert!(rendered.contains("[lifecycle]"), "{rendered}");
    }
}
