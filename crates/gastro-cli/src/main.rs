//! Gastro CLI
//!
//! Runs the back-office API and prints occupancy reports.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use gastro_cli::cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    gastro_cli::run(args).await?;
    Ok(())
}
