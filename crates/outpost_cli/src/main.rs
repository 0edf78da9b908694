//! Outpost CLI
//!
//! Command-line tools for a gatehouse station's local store.
//!
//! # Commands
//!
//! - `inspect` - Display per-collection counts and sync state
//! - `pending` - List records waiting to be pushed
//! - `tombstones` - List deletions waiting to be confirmed
//! - `export` - Write a full JSON backup
//! - `import` - Restore a JSON backup

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Outpost command-line store tools.
#[derive(Parser)]
#[command(name = "outpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Storage key namespace
    #[arg(global = true, short, long, default_value = "outpost")]
    namespace: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display per-collection counts and sync state
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List records waiting to be pushed
    Pending {
        /// Only this collection (slot, table or backup name)
        #[arg(short, long)]
        collection: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List deletions waiting to be confirmed
    Tombstones {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a full JSON backup
    Export {
        /// Backup file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Restore a JSON backup
    Import {
        /// Backup file to read
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ns = cli.namespace.as_str();
    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, ns, &format)?;
        }
        Commands::Pending { collection, format } => {
            let path = cli.path.ok_or("Store path required for pending")?;
            commands::pending::run(&path, ns, collection.as_deref(), &format)?;
        }
        Commands::Tombstones { format } => {
            let path = cli.path.ok_or("Store path required for tombstones")?;
            commands::pending::tombstones(&path, ns, &format)?;
        }
        Commands::Export { output } => {
            let path = cli.path.ok_or("Store path required for export")?;
            commands::backup::export(&path, ns, &output)?;
        }
        Commands::Import { input } => {
            let path = cli.path.ok_or("Store path required for import")?;
            commands::backup::import(&path, ns, &input)?;
        }
        Commands::Version => {
            println!("Outpost CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
