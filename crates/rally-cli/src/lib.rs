//! `rally-manage`: out-of-band schema management for the rally database.
//!
//! ```text
//! rally-manage [--database-url URL] [--verbose] db <command>
//! ```

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only.
use anyhow as _;
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::bootstrap;
pub use commands::{Commands, DbCommand};
pub use error::CliError;
pub use parser::Cli;
