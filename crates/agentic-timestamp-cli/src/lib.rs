//! AgenticTimestamp CLI — harvest, parse and resolve page timestamps from the command line.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{load_config, resolve_config_path};
