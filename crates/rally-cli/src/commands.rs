//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Database schema management
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DbCommand {
    /// Create the head schema on an empty database
    Create,

    /// Upgrade the schema (default: to head)
    Upgrade {
        /// Target revision id or `head`
        #[arg(long)]
        revision: Option<String>,
    },

    /// Downgrade the schema to an older revision
    Downgrade {
        /// Target revision id or `base`
        #[arg(long)]
        revision: String,
    },

    /// Print the current revision
    Revision,

    /// Record a revision without running any migration
    Stamp {
        /// Revision id, `head` or `base`
        #[arg(long)]
        revision: String,
    },

    /// Drop every table and create the head schema again
    Recreate,

    /// List the revision chain, marking the current revision
    Show,
}
