//! # Grafo - Typed Attribute-Graph Workbench
//!
//! The main binary for the Grafo graph manipulation engine.
//!
//! This application provides:
//! - Interactive shell (command processor REPL)
//! - Script runner for batch command files
//! - Graph inspection and HTML rendering via built-in plugins
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    apps/grafo (THE BINARY)                 │
//! │                                                            │
//! │  ┌───────────┐   ┌─────────────┐   ┌──────────────────┐   │
//! │  │   CLI     │   │   Shell     │   │  Plugins         │   │
//! │  │  (clap)   │   │   (REPL)    │   │  (json, outline) │   │
//! │  └─────┬─────┘   └──────┬──────┘   └────────┬─────────┘   │
//! │        │                │                   │              │
//! │        └────────────────┼───────────────────┘              │
//! │                         ▼                                  │
//! │                 ┌───────────────┐                          │
//! │                 │  grafo-core   │                          │
//! │                 │  (THE LOGIC)  │                          │
//! │                 └───────────────┘                          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Interactive shell over a loaded graph
//! grafo shell --file people.json
//!
//! # Run a command script
//! grafo run --script cleanup.gfo --file people.json
//!
//! # One-shot inspection
//! grafo inspect --file people.json
//! ```

use clap::Parser;
use grafo::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — GRAFO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GRAFO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "grafo=info,grafo_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Grafo startup banner.
fn print_banner() {
    println!(
        r"
   ██████╗ ██████╗  █████╗ ███████╗ ██████╗
  ██╔════╝ ██╔══██╗██╔══██╗██╔════╝██╔═══██╗
  ██║  ███╗██████╔╝███████║█████╗  ██║   ██║
  ██║   ██║██╔══██╗██╔══██║██╔══╝  ██║   ██║
  ╚██████╔╝██║  ██║██║  ██║██║     ╚██████╔╝
   ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝      ╚═════╝

  Typed Attribute-Graph Workbench v{}
",
        env!("CARGO_PKG_VERSION")
    );
}
