//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// WikiNote cache maintenance tool
#[derive(Parser)]
#[command(name = "wncache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache root directory (defaults to the platform cache directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clear caches
    Clear {
        /// Cache name to clear
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Clear every cache under the cache root
        #[arg(long)]
        all: bool,
    },

    /// List cache files under the cache root
    List,

    /// Print the contents of a cache
    Show {
        /// Cache name
        name: String,
    },
}
