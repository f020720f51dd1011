//! Command-line interface

pub mod commands;
pub mod output;
pub mod scenarios;
pub mod terminal_output;

use clap::{Parser, Subcommand};
use commands::{BasicCommand, ChainCommand, ParallelCommand};
use std::ffi::OsString;

/// Demonstrations of composable runnable components
#[derive(Debug, Parser, Clone)]
#[command(name = "runnable")]
#[command(author = "Runnable Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Demonstrates chaining, fan-out and tracing of runnable components", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a run configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Print the collected span tree after each demo
    #[arg(short, long, global = true)]
    pub trace: bool,

    /// Print span events live while the demo runs
    #[arg(long, global = true)]
    pub live: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Invoke, chain, batch and await single components
    Basic(BasicCommand),

    /// Fan one input out to several components
    Parallel(ParallelCommand),

    /// Mock prompt, model and parser chains
    Chain(ChainCommand),

    /// Run every demo in order
    All,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
