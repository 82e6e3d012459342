//! Ledgerline CLI
//!
//! Usage:
//!   ledgerline parse statement.txt --page p1.png   Extract transactions as JSON
//!   ledgerline suggest "Outward EFT MTN"           Look up a learned description
//!   ledgerline learn ORIGINAL CORRECTED            Learn from a correction
//!   ledgerline reject 3                            Decay a pattern

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > info. Logs go to stderr; stdout carries JSON.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let settings = commands::load_settings(cli.config.as_deref())?;
    let store_path = commands::resolve_store_path(cli.store.as_deref(), &settings)?;

    match cli.command {
        Commands::Parse {
            text_file,
            pages,
            force_ocr,
            no_auto_detect,
            suggest,
        } => {
            let args = commands::ParseArgs {
                text_file,
                pages,
                force_ocr,
                no_auto_detect,
                suggest,
            };
            commands::cmd_parse(settings, &store_path, args).await
        }
        Commands::Suggest {
            description,
            reference,
        } => commands::cmd_suggest(&settings, &store_path, &description, reference.as_deref()),
        Commands::Learn {
            original,
            corrected,
            reference,
            category,
        } => commands::cmd_learn(
            &settings,
            &store_path,
            &original,
            &corrected,
            reference.as_deref(),
            category,
        ),
        Commands::Accept { pattern_id } => commands::cmd_feedback(&settings, &store_path, pattern_id, true),
        Commands::Reject { pattern_id } => commands::cmd_feedback(&settings, &store_path, pattern_id, false),
        Commands::Patterns => commands::cmd_patterns(&store_path),
    }
}
