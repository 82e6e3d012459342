use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ledgerline - bank statement transaction extraction with learned descriptions
#[derive(Parser)]
#[command(name = "ledgerline")]
#[command(about = "Extract transactions from bank statements and suggest descriptions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pattern store file (JSON); defaults to the platform data directory
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract transactions from a statement and print them as JSON
    Parse {
        /// Text layer of the statement, one file per document
        text_file: Option<PathBuf>,

        /// Rasterized page image used when OCR is needed (repeat per page)
        #[arg(long = "page")]
        pages: Vec<PathBuf>,

        /// Skip the text layer and always OCR the page images
        #[arg(long)]
        force_ocr: bool,

        /// Trust the text layer without the garbled-text check
        #[arg(long)]
        no_auto_detect: bool,

        /// Attach pattern suggestions to each transaction
        #[arg(long)]
        suggest: bool,
    },

    /// Suggest a description for transaction text
    Suggest {
        description: String,

        #[arg(short, long)]
        reference: Option<String>,
    },

    /// Learn from a user correction
    Learn {
        /// Description as extracted
        original: String,

        /// Description the user chose
        corrected: String,

        #[arg(short, long)]
        reference: Option<String>,

        #[arg(short, long)]
        category: Option<i64>,
    },

    /// Record that a suggestion was accepted as offered
    Accept { pattern_id: u64 },

    /// Record that a suggestion was rejected
    Reject { pattern_id: u64 },

    /// List stored patterns
    Patterns,
}
