//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Out-of-band management of the rally database.
#[derive(Parser)]
#[command(name = "rally-manage")]
#[command(about = "Manage the rally database schema")]
#[command(version)]
pub struct Cli {
    /// Database URL, e.g. sqlite:///var/lib/rally/rally.sqlite
    #[arg(long = "database-url", env = "RALLY_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
