// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package lifecycle engine for the Depot parcel engine.
//!
//! - [`LifecycleService`] receives parcels and applies caller-driven status changes
//! - [`SweepRunner`] runs the expire and purge batch jobs
//! - [`PackageNotifier`] renders and delivers owner messages with one retry
//! - [`PackageLookup`] and [`ChatbotResponder`] answer owner questions read-only
//!
//! All status writes go through the [`TransitionGraph`] and land together
//! with their history row.

pub mod chatbot;
pub mod compose;
pub mod history;
pub mod lookup;
pub mod notify;
pub mod policy;
pub mod service;
pub mod sweep;
pub mod tracking;

pub use chatbot::{ChatbotResponder, KeywordIntentExtractor};
pub use compose::{Composer, NotificationEvent, Parties, office_offset};
pub use history::HistoryRecorder;
pub use lookup::PackageLookup;
pub use notify::{DispatchOutcome, Notifier, PackageNotifier};
pub use depot_core::normalize_phone;
pub use policy::{Transition, TransitionGraph};
pub use service::{BulkReport, LifecycleService};
pub use sweep::{SweepJob, SweepReport, SweepRunner};
pub use tracking::generate_tracking_code;
