//! Command-line interface for serviceloop
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and output rendering

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, build_cli};

pub use run::run;
