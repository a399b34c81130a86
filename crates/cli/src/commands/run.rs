// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `origin schedule:run --directory <dir> [--id <event>]` - Run the scheduler tick

use super::{context, resolve_directory, ConfigArgs};
use anyhow::Result;
use clap::Args;
use origin_core::{Registry, Schedule};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory containing task files
    #[arg(long)]
    pub directory: PathBuf,

    /// Execute only the event with this id, ignoring its schedule
    #[arg(long)]
    pub id: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub async fn run(args: RunArgs, registry: &Registry) -> Result<()> {
    let directory = resolve_directory(&args.directory);
    let ctx = context(args.config.config());

    let report = Schedule::run(&directory, args.id.as_deref(), registry, ctx).await?;

    tracing::info!(
        directory = %directory.display(),
        dispatched = report.dispatched.len(),
        skipped_maintenance = report.skipped_maintenance.len(),
        launches = report.launches,
        "tick complete"
    );
    Ok(())
}
