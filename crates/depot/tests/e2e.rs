// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full wiring against SQLite and a mocked WhatsApp Cloud API.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use depot_config::model::{DepotConfig, StorageConfig};
use depot_core::{
    Clock, CronLogSink, CronStatus, DirectoryStore, Locker, NewPackage, NotificationChannel,
    Owner, PackageStatus, PackageStore, Sender, StorageAdapter,
};
use depot_cron::SweepScheduler;
use depot_lifecycle::{
    Composer, LifecycleService, Notifier, PackageNotifier, SweepJob, SweepRunner,
};
use depot_storage::SqliteStore;
use depot_test_utils::ManualClock;
use depot_whatsapp::WhatsAppChannel;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    store: Arc<SqliteStore>,
    clock: Arc<ManualClock>,
    service: LifecycleService,
    scheduler: SweepScheduler,
    _dir: tempfile::TempDir,
}

async fn stack(server: &MockServer) -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DepotConfig::default();
    config.storage = StorageConfig {
        database_path: dir.path().join("e2e.db").to_string_lossy().into_owned(),
        ..StorageConfig::default()
    };
    config.notification.retry_backoff_ms = 10;
    config.whatsapp.api_base = server.uri();
    config.whatsapp.phone_number_id = Some("1055".into());
    config.whatsapp.access_token = Some("token".into());

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await.unwrap();
    store
        .insert_owner(&Owner {
            id: "owner-1".into(),
            name: "Sari".into(),
            phone_number: "0812-3456-7890".into(),
        })
        .await
        .unwrap();
    store
        .insert_sender(&Sender {
            id: "sender-1".into(),
            name: "JNE Express".into(),
            phone_number: None,
        })
        .await
        .unwrap();
    store
        .insert_locker(&Locker {
            id: "locker-1".into(),
            code: "A-01".into(),
        })
        .await
        .unwrap();

    let channel = Arc::new(WhatsAppChannel::new(&config.whatsapp).unwrap());
    channel.connect().await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 10, 2, 0, 0).unwrap(),
    ));
    let packages: Arc<dyn PackageStore> = store.clone();
    let directory: Arc<dyn DirectoryStore> = store.clone();
    let notifier = Arc::new(PackageNotifier::new(
        directory.clone(),
        Composer::new(
            config.lifecycle.office_name.clone(),
            config.lifecycle.utc_offset_hours,
        ),
        Notifier::from_config(
            Some(channel as Arc<dyn NotificationChannel>),
            &config.notification,
        ),
    ));

    let service = LifecycleService::new(
        packages.clone(),
        directory,
        notifier.clone(),
        clock.clone(),
        &config.lifecycle,
    )
    .unwrap();
    let runner = Arc::new(SweepRunner::new(
        packages,
        notifier,
        clock.clone(),
        config.lifecycle.grace_days,
    ));
    let sink: Arc<dyn CronLogSink> = store.clone();
    let scheduler = SweepScheduler::new(
        runner,
        sink,
        clock.clone(),
        &config.sweep,
        config.lifecycle.utc_offset_hours,
    )
    .unwrap();

    Stack {
        store,
        clock,
        service,
        scheduler,
        _dir: dir,
    }
}

async fn mount_connect(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1055"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1055"})))
        .mount(server)
        .await;
}

fn details() -> NewPackage {
    NewPackage {
        tracking_code: Some("PACK-E2E-1".into()),
        description: "Running shoes".into(),
        package_type: "item".into(),
        quantity: 1,
        owner_id: "owner-1".into(),
        sender_id: "sender-1".into(),
        locker_id: "locker-1".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn receive_posts_whatsapp_message_to_normalized_number() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    Mock::given(method("POST"))
        .and(path("/1055/messages"))
        .and(body_partial_json(serde_json::json!({"to": "6281234567890"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"id": "wamid.1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let s = stack(&server).await;
    let pkg = s.service.receive_package(details(), "clerk-1").await.unwrap();
    assert_eq!(pkg.status, PackageStatus::Received);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
    let text = body["text"]["body"].as_str().unwrap();
    assert!(text.contains("PACK-E2E-1"), "{text}");
    assert!(text.contains("JNE Express"), "{text}");
}

#[tokio::test]
async fn channel_outage_does_not_block_the_write() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    Mock::given(method("POST"))
        .and(path("/1055/messages"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let s = stack(&server).await;
    let pkg = s.service.receive_package(details(), "clerk-1").await.unwrap();
    let stored = s.store.get_package(&pkg.id).await.unwrap().unwrap();
    assert_eq!(stored, pkg);

    // One attempt plus one retry after reconnecting.
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 2);
}

#[tokio::test]
async fn scheduled_sweeps_expire_then_purge_and_log_each_run() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    Mock::given(method("POST"))
        .and(path("/1055/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let s = stack(&server).await;
    let pkg = s.service.receive_package(details(), "clerk-1").await.unwrap();

    s.clock.advance(chrono::Duration::days(91));
    let log = s.scheduler.run_once(SweepJob::Expire).await;
    assert_eq!(log.status, CronStatus::Success);
    let expired = s.store.get_package(&pkg.id).await.unwrap().unwrap();
    assert_eq!(expired.status, PackageStatus::Expired);

    s.clock.advance(chrono::Duration::days(15));
    let log = s.scheduler.run_once(SweepJob::Purge).await;
    assert_eq!(log.status, CronStatus::Success);
    let purged = s.store.get_package(&pkg.id).await.unwrap().unwrap();
    assert_eq!(purged.status, PackageStatus::Deleted);
    assert_eq!(purged.deleted_at, Some(s.clock.now()));

    let logs = s.store.recent(None, 10).await.unwrap();
    let jobs: Vec<_> = logs.iter().map(|l| l.job_name.as_str()).collect();
    assert_eq!(jobs, vec!["purge", "expire"]);

    // received + expired; the purge sends nothing.
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 2);

    let history = s.service.history(&pkg.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            PackageStatus::Received,
            PackageStatus::Expired,
            PackageStatus::Deleted
        ]
    );
}
