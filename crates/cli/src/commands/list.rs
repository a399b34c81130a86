// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `origin schedule:list --directory <dir>` - Show declared events

use super::{context, resolve_directory, ConfigArgs};
use crate::output::{print_list, OutputFormat};
use anyhow::Result;
use clap::Args;
use origin_core::{Event, Registry, Schedule};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory containing task files
    #[arg(long)]
    pub directory: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// One listed event
#[derive(Debug, Serialize)]
pub struct EventRow {
    pub task: String,
    pub id: String,
    pub expression: String,
    pub kind: &'static str,
    pub description: String,
    pub background: bool,
}

impl EventRow {
    fn new(task: &str, event: &Event) -> Self {
        Self {
            task: task.to_string(),
            id: event.id().to_string(),
            expression: event.expression(),
            kind: event.kind().type_name(),
            description: event.summary(),
            background: event.runs_in_background(),
        }
    }
}

impl fmt::Display for EventRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12}  {:<15}  {:<8}  {:<20}  {}",
            self.id, self.expression, self.kind, self.task, self.description
        )
    }
}

pub fn list(args: ListArgs, registry: &Registry) -> Result<()> {
    let directory = resolve_directory(&args.directory);
    let ctx = context(args.config.config());

    let rows: Vec<EventRow> = Schedule::load(&directory, registry, &ctx)?
        .iter()
        .flat_map(|schedule| {
            schedule
                .events()
                .iter()
                .map(move |event| EventRow::new(schedule.task_name(), event))
        })
        .collect();

    if rows.is_empty() && matches!(args.output, OutputFormat::Text) {
        println!("No events");
        return Ok(());
    }
    print_list(&rows, args.output);
    Ok(())
}
