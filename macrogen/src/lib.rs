//! Command-line front end over `macrogen_core`.

pub mod cli;
pub mod commands;

pub use macrogen_core::{config, error, registry};
