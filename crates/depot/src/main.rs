// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Depot - parcel lifecycle engine for a building mailroom.
//!
//! This is the binary entry point: the long-running `serve` process and
//! the one-shot operator commands.

mod app;
mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use depot_config::model::DepotConfig;
use depot_core::{DepotError, NewPackage, StatusUpdate};
use depot_lifecycle::SweepJob;

use crate::app::App;

/// Depot - parcel lifecycle engine for a building mailroom.
#[derive(Parser, Debug)]
#[command(name = "depot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sweep scheduler and notification channel until stopped.
    Serve,
    /// Run a sweep now, or list recent sweep runs.
    Sweep {
        /// `expire` or `purge`. Filters the listing with --history.
        job: Option<SweepJob>,
        /// List recent runs instead of sweeping.
        #[arg(long)]
        history: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Record a parcel that just arrived.
    Receive {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        locker: String,
        #[arg(long)]
        description: String,
        /// item, document, or other.
        #[arg(long = "type", default_value = "item")]
        package_type: String,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
        /// Generated when omitted.
        #[arg(long)]
        tracking_code: Option<String>,
        #[arg(long)]
        photo: Option<String>,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Move a parcel to a new status.
    Status {
        package_id: String,
        status: String,
        #[arg(long, default_value = "cli")]
        actor: String,
        /// Recipient who collected the parcel (completed only).
        #[arg(long)]
        picked_up_by: Option<String>,
        /// Proof-of-pickup image reference (completed only).
        #[arg(long)]
        proof: Option<String>,
    },
    /// Mark several parcels collected by one recipient.
    Collect {
        #[arg(required = true)]
        package_ids: Vec<String>,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        proof: Option<String>,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Show the audit trail of a parcel.
    History {
        package_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Answer a chat message as the mailroom bot would.
    Ask {
        /// Sender phone number.
        phone: String,
        text: String,
    },
    /// Print the effective configuration, or check it and adapter health.
    Config {
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => depot_config::load_and_validate_path(path),
        None => depot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            depot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let Some(command) = cli.command else {
        println!("depot: use --help for available commands");
        return;
    };
    if let Err(e) = run(command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: DepotConfig) -> Result<(), DepotError> {
    if let Commands::Config { check: false } = command {
        println!("{}", commands::show_config(&config)?);
        return Ok(());
    }

    let app = App::build(config).await?;
    if let Commands::Serve = command {
        return serve::run_serve(app).await;
    }

    let result = dispatch(&app, command).await;
    app.close().await?;
    println!("{}", result?);
    Ok(())
}

async fn dispatch(app: &App, command: Commands) -> Result<String, DepotError> {
    match command {
        Commands::Sweep {
            job,
            history: true,
            limit,
        } => commands::sweep_history(app, job, limit).await,
        Commands::Sweep { job, .. } => {
            let Some(job) = job else {
                return Err(DepotError::Validation(
                    "choose a sweep to run: expire or purge".into(),
                ));
            };
            commands::sweep(app, job).await
        }
        Commands::Receive {
            owner,
            sender,
            locker,
            description,
            package_type,
            quantity,
            tracking_code,
            photo,
            actor,
        } => {
            let details = NewPackage {
                tracking_code,
                description,
                package_type,
                quantity,
                photo,
                owner_id: owner,
                sender_id: sender,
                locker_id: locker,
            };
            commands::receive(app, details, &actor).await
        }
        Commands::Status {
            package_id,
            status,
            actor,
            picked_up_by,
            proof,
        } => {
            let extra = StatusUpdate {
                picked_up_by,
                proof_image: proof,
            };
            commands::status(app, &package_id, &status, &actor, extra).await
        }
        Commands::Collect {
            package_ids,
            recipient,
            proof,
            actor,
        } => commands::collect(app, &package_ids, &recipient, proof, &actor).await,
        Commands::History { package_id, json } => {
            commands::history(app, &package_id, json).await
        }
        Commands::Ask { phone, text } => commands::ask(app, &phone, &text).await,
        Commands::Config { .. } => commands::check(app).await,
        Commands::Serve => Err(DepotError::Internal(
            "serve is not a one-shot command".into(),
        )),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("depot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
