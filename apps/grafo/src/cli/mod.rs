//! # Grafo CLI Module
//!
//! This module implements the CLI interface for Grafo.
//!
//! ## Available Commands
//!
//! - `shell` - Interactive command shell over a loaded graph
//! - `run` - Execute a command script file
//! - `inspect` - Load a graph and print a summary
//! - `render` - Render a graph through a visualizer plugin
//! - `plugins` - List registered plugins

mod commands;

use clap::{Parser, Subcommand};
use grafo_core::GraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Grafo - Typed Attribute-Graph Workbench
///
/// Load a graph through a data-source plugin, then manipulate it with
/// typed filters, searches and undoable editing commands.
#[derive(Parser, Debug)]
#[command(name = "grafo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a grafo.toml configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive command shell
    Shell {
        /// Graph file to load (omit for an empty scratch graph)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Data-source plugin to load the file through
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Execute a command script file line by line
    Run {
        /// Path to the script (one command per line, '#' comments)
        #[arg(short = 'S', long)]
        script: PathBuf,

        /// Graph file to load before running (omit for a scratch graph)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Data-source plugin to load the file through
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Load a graph and print a summary
    Inspect {
        /// Graph file to load
        #[arg(short, long)]
        file: PathBuf,

        /// Data-source plugin to load the file through
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Render a graph through a visualizer plugin
    Render {
        /// Graph file to load
        #[arg(short, long)]
        file: PathBuf,

        /// Data-source plugin to load the file through
        #[arg(short, long)]
        source: Option<String>,

        /// Visualizer plugin name (defaults to the configured one)
        #[arg(short = 'V', long)]
        visualizer: Option<String>,

        /// Write markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered plugins
    Plugins,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphError> {
    let config = load_config(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Shell { file, source }) => {
            cmd_shell(&config, file.as_deref(), source.as_deref(), cli.quiet)
        }
        Some(Commands::Run { script, file, source }) => {
            cmd_run(&config, &script, file.as_deref(), source.as_deref())
        }
        Some(Commands::Inspect { file, source }) => {
            cmd_inspect(&config, &file, source.as_deref(), json_mode)
        }
        Some(Commands::Render {
            file,
            source,
            visualizer,
            output,
        }) => cmd_render(
            &config,
            &file,
            source.as_deref(),
            visualizer.as_deref(),
            output.as_deref(),
        ),
        Some(Commands::Plugins) => cmd_plugins(&config, json_mode),
        // No subcommand - list plugins as a gentle starting point.
        None => cmd_plugins(&config, json_mode),
    }
}
