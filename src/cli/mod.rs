//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! There are no subcommands: one invocation is one run. Flags override the
//! values of the YAML config file.

mod commands;
mod runner;

pub use commands::{Cli, OutputFormat};
pub use runner::Runner;
