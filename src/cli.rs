//! Command-line interface.
//!
//! - pool: list, add, rename, remove or import people
//! - params: show or change the saved courts, games and title
//! - generate: build a schedule and repair it until no pair repeats
//! - web: serve the JSON API

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Court rota - doubles schedules with fair benching
#[derive(Parser, Debug)]
#[command(name = "court-rota")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute; lists the pool when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the pool of people
    Pool {
        #[command(subcommand)]
        command: PoolCommands,
    },

    /// Show or change the saved schedule parameters
    Params {
        /// Number of courts in use
        #[arg(long)]
        courts: Option<usize>,

        /// Number of games (slots)
        #[arg(long)]
        slots: Option<usize>,

        /// Title printed above the schedule
        #[arg(long)]
        title: Option<String>,
    },

    /// Generate a schedule
    Generate {
        /// Ids of the people playing (defaults to the whole pool)
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        squad: Vec<u32>,

        /// Give up after this many retries (defaults to the config value)
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Write the print layout to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export the schedule as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Serve the JSON API
    Web {
        /// Port to listen on (defaults to the config value)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PoolCommands {
    /// List everyone in the pool
    List,

    /// Add a person
    Add {
        name: String,
    },

    /// Rename a person
    Rename {
        id: u32,
        name: String,
    },

    /// Remove a person
    Remove {
        id: u32,
    },

    /// Import people from a roster CSV
    Import {
        csv: PathBuf,
    },
}
