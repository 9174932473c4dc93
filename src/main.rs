//! nandio - raw NAND flash reader
//!
//! Talks to a microcontroller reader over a serial port. The reader drives
//! the NAND bus; the host identifies the chip from its ID bytes and pulls
//! pages (data + OOB) one at a time, retrying pages that arrive corrupted.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use log::LevelFilter;
use nandio_core::catalog::ChipDatabase;

use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    // Load chip database
    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} chip definitions", db.len());

    match cli.command {
        Commands::Ping { conn } => commands::cmd_ping(&conn),
        Commands::Info { conn } => commands::cmd_info(&conn, &db),
        Commands::Read {
            conn,
            output,
            start_page,
            pages,
            retries,
        } => commands::cmd_read(&conn, &db, &output, start_page, pages, retries),
        Commands::Bootloader { conn } => commands::cmd_bootloader(&conn),
        Commands::Restart { conn } => commands::cmd_restart(&conn),
        Commands::ListChips { vendor } => {
            commands::list_chips(&db, vendor.as_deref());
            Ok(())
        }
    }
}

/// Log level for a `-v` count: info by default, then debug, then trace
fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install env_logger; `RUST_LOG` still overrides the verbosity flag
fn init_logging(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = log_level(verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .try_init()
}

/// Load the built-in chip database plus any extra definitions
///
/// Entries loaded later replace built-in entries with the same IDs.
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::with_builtin()?;

    if let Some(path) = path {
        // User specified a path
        let count = if path.is_dir() {
            db.load_dir(path)?
        } else if path.is_file() {
            db.load_file(path)?
        } else {
            return Err(format!("Chip database path not found: {}", path.display()).into());
        };
        log::debug!("Loaded {} chips from {}", count, path.display());
    } else {
        // Try default locations
        let default_paths = [
            PathBuf::from("chips"),
            PathBuf::from("/usr/share/nandio/chips"),
            PathBuf::from("/usr/local/share/nandio/chips"),
        ];

        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => {
                        log::debug!("Loaded {} chips from {}", count, dir.display());
                    }
                    Err(e) => {
                        log::warn!("Failed to load chips from {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }

    Ok(db)
}
