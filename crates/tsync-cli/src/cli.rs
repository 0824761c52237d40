use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tsync")]
#[command(about = "Sync helpdesk tickets into a work tracker with PII redaction", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "TSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reconciliation pass
    Sync {
        /// Look up and decide, but never create or update work items
        #[arg(long)]
        dry_run: bool,

        /// Tickets processed at once (default from config: 4)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the full run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan text for sensitive data and print the redacted result
    Scan {
        /// Text to scan; `-` or nothing reads stdin
        text: Option<String>,

        /// Also print matched values
        #[arg(long)]
        show_values: bool,
    },

    /// List active redaction categories
    Rules,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
