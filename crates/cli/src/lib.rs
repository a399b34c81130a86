// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! origin - scheduler runner
//!
//! System cron invokes the runner once a minute:
//!
//! ```text
//! * * * * * /usr/local/bin/origin schedule:run --directory=/srv/app/tasks
//! ```
//!
//! An application that declares tasks, jobs or callables in Rust embeds the
//! runner in its own binary so that background callables, which re-invoke
//! the current executable, find the same registrations:
//!
//! ```no_run
//! use origin_core::{callable, Registry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Registry::new().with_callable("prune-cache", callable(|_| Ok(())));
//!     origin::run_cli(registry).await
//! }
//! ```

pub mod commands;
pub mod logging;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{list, run};
use origin_core::Registry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "origin", version, about = "Origin - cron-driven task scheduler")]
pub struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch due events, or run a single event by id
    #[command(name = "schedule:run")]
    Run(run::RunArgs),
    /// List every event declared in a task directory
    #[command(name = "schedule:list")]
    List(list::ListArgs),
}

/// Parse the process arguments and run them against `registry`
pub async fn run_cli(registry: Registry) -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::setup(cli.log_file.as_deref())?;
    execute(cli, &registry).await
}

pub async fn execute(cli: Cli, registry: &Registry) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::run(args, registry).await,
        Commands::List(args) => list::list(args, registry),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
