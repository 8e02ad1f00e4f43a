//! `bulkflow` command-line front end.
//!
//! - `config`: Layered application configuration
//! - `logger`: fern dispatcher setup
//! - `ids`: Location id files and syntax validation
//! - `commands`: The `enhance` and `validate` subcommands

pub mod commands;
pub mod config;
pub mod ids;
pub mod logger;
