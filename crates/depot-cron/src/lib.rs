// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron scheduler for the Depot sweeps.
//!
//! [`SweepScheduler`] fires the expire and purge jobs on their configured
//! cron cadence in office local time. Each run is bounded by an overall
//! timeout, guarded against overlapping with itself, and leaves exactly one
//! [`CronLog`](depot_core::CronLog) row behind.

pub mod schedule;
pub mod scheduler;

pub use schedule::JobSchedule;
pub use scheduler::SweepScheduler;
