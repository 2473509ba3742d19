//! Command handlers.
//!
//! Each handler receives the composed dependencies and returns its output
//! instead of printing, so `main` owns stdout and stderr.

pub mod db;
