#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod demo;
pub mod error;
pub mod logging;

pub use config::GastroConfig;
pub use error::{Error, Result};

use cli::{Args, Command};
use commands::{Runtime, report};

/// Runs the parsed command line.
pub async fn run(args: Args) -> Result<()> {
    let command = match args.command {
        Command::Config { action } => {
            return config_handlers::handle_config_command(args.config.as_deref(), action);
        }
        command => command,
    };

    let mut config = GastroConfig::load(args.config.as_deref())?;
    logging::init(&config.logging)?;

    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve::run(&config).await
        }
        Command::Occupancy {
            restaurant,
            date,
            json,
        } => {
            let runtime = Runtime::open(&config).await?;
            let tenant = runtime.report_tenant(restaurant)?;
            println!(
                "{}",
                report::occupancy(&runtime.office, &tenant, date, json).await?
            );
            Ok(())
        }
        Command::SlackDay { restaurant } => {
            let runtime = Runtime::open(&config).await?;
            let tenant = runtime.report_tenant(restaurant)?;
            println!("{}", report::slack_day(&runtime.office, &tenant).await?);
            Ok(())
        }
        // Handled before the config is loaded
        Command::Config { .. } => Ok(()),
    }
}
