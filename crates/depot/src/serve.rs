// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `depot serve` command implementation.
//!
//! Opens the notification channel, starts the sweep scheduler and a
//! channel watchdog, then waits for a shutdown signal. On shutdown the
//! scheduler drains before the store is closed.

use std::sync::Arc;
use std::time::Duration;

use depot_core::{ConnectionState, CronLogSink, DepotError, NotificationChannel};
use depot_cron::SweepScheduler;
use depot_whatsapp::WhatsAppChannel;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::shutdown;

const WATCHDOG_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the `depot serve` command until SIGINT or SIGTERM.
pub async fn run_serve(app: App) -> Result<(), DepotError> {
    let cancel = shutdown::install_signal_handler();
    serve_until(app, cancel, WATCHDOG_INTERVAL).await
}

pub(crate) async fn serve_until(
    app: App,
    cancel: CancellationToken,
    watchdog_interval: Duration,
) -> Result<(), DepotError> {
    info!(agent = %app.config.agent.name, "depot starting");
    app.connect_channel().await;

    let scheduler = if app.config.sweep.enabled {
        let sink: Arc<dyn CronLogSink> = app.store.clone();
        let scheduler = Arc::new(SweepScheduler::new(
            app.sweeps.clone(),
            sink,
            app.clock.clone(),
            &app.config.sweep,
            app.config.lifecycle.utc_offset_hours,
        )?);
        for schedule in scheduler.schedules() {
            info!(job = %schedule.job, expression = %schedule.expression, "sweep scheduled");
        }
        Some(tokio::spawn(scheduler.run(cancel.clone())))
    } else {
        info!("sweeps disabled by configuration");
        None
    };

    let watchdog = app.channel.clone().map(|channel| {
        tokio::spawn(watch_channel(channel, cancel.clone(), watchdog_interval))
    });

    cancel.cancelled().await;
    info!("shutting down, waiting for in-flight sweeps");

    if let Some(handle) = scheduler
        && let Err(e) = handle.await
    {
        warn!(error = %e, "sweep scheduler task failed");
    }
    if let Some(handle) = watchdog
        && let Err(e) = handle.await
    {
        warn!(error = %e, "channel watchdog task failed");
    }

    app.close().await?;
    info!("depot stopped");
    Ok(())
}

/// Reconnect the channel whenever a failed send has left it disconnected.
async fn watch_channel(
    channel: Arc<WhatsAppChannel>,
    cancel: CancellationToken,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the session was just opened.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("channel watchdog stopped");
                return;
            }
            _ = ticker.tick() => {
                if channel.connection_state() == ConnectionState::Disconnected
                    && let Err(e) = channel.handle_disconnect().await
                {
                    warn!(error = %e, "channel reconnect failed");
                }
            }
        }
    }
}
