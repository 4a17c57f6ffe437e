//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gastro_core::RestaurantId;

/// Gastro - restaurant back-office server and reports
#[derive(Parser, Debug)]
#[command(name = "gastro", version)]
#[command(about = "Restaurant back-office server and reports", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GASTRO_CONFIG", global = true)]
    pub config: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the hourly occupancy of a day
    Occupancy {
        /// Restaurant to report on (defaults to the demo restaurant in memory mode)
        #[arg(short, long)]
        restaurant: Option<RestaurantId>,
        /// Local date, today when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the emptiest remaining day of the week
    SlackDay {
        /// Restaurant to report on (defaults to the demo restaurant in memory mode)
        #[arg(short, long)]
        restaurant: Option<RestaurantId>,
    },
    /// Inspect or edit the configuration file
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `gastro config` actions.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key, e.g. `server.port`
    Get {
        /// Dotted key
        key: String,
    },
    /// Write a value by dotted key
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a config file with every default
    Init {
        /// Where to write it (defaults to the config directory)
        #[arg(short, long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings as `GASTRO_*` variables
    Export {
        /// Format as `--env KEY=VALUE` for `docker run`
        #[arg(long)]
        docker_env: bool,
    },
}
