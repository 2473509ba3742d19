//! `db` command handlers.

use rally_db::migrations::RevisionChain;
use rally_db::{Migrator, reset_engine};
use tracing::info;

use crate::commands::DbCommand;
use crate::error::CliError;

/// Execute one `db` subcommand.
///
/// Returns the text to print on stdout, if any.
pub async fn execute(migrator: &Migrator, command: &DbCommand) -> Result<Option<String>, CliError> {
    match command {
        DbCommand::Create => {
            migrator.create_from_models().await?;
            Ok(None)
        }
        DbCommand::Upgrade { revision } => {
            migrator.upgrade(revision.as_deref()).await?;
            Ok(None)
        }
        DbCommand::Downgrade { revision } => {
            migrator.downgrade(revision).await?;
            Ok(None)
        }
        DbCommand::Revision => {
            let current = migrator.current_revision().await?;
            Ok(Some(current.unwrap_or_else(|| "None".to_string())))
        }
        DbCommand::Stamp { revision } => {
            migrator.stamp(revision).await?;
            Ok(None)
        }
        DbCommand::Recreate => {
            migrator.drop_schema().await?;
            migrator.create_from_models().await?;
            info!("Database recreated");
            Ok(None)
        }
        DbCommand::Show => {
            let current = migrator.current_revision().await?;
            Ok(Some(format_chain(migrator.chain(), current.as_deref())))
        }
    }
}

/// Execute a command and release the engine afterwards.
pub async fn run(migrator: &Migrator, command: &DbCommand) -> Result<Option<String>, CliError> {
    let result = execute(migrator, command).await;
    reset_engine().await;
    result
}

/// One line per revision, newest first, with the current one marked.
pub fn format_chain(chain: &RevisionChain, current: Option<&str>) -> String {
    let lines: Vec<String> = chain
        .iter()
        .rev()
        .map(|revision| {
            let parent = revision.down_revision().unwrap_or("<base>");
            let marker = if Some(revision.id()) == current {
                " (current)"
            } else {
                ""
            };
            format!(
                "{parent} -> {}{marker}, {}",
                revision.id(),
                revision.message()
            )
        })
        .collect();
    lines.join("\n")
}
