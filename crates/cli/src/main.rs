// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! origin - scheduler runner for task directories declared in TOML

use anyhow::Result;
use origin_core::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    origin::run_cli(Registry::new()).await
}
