//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "nandio")]
#[command(author, version, about = "Raw NAND flash reader over a serial link", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra chip database file or directory (contains .ron files)
    /// Defaults to looking in ./chips/ and /usr/share/nandio/chips/
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Serial connection options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Serial device (path, or dev=<path>[:<baud>])
    #[arg(short, long)]
    pub device: String,

    /// Baud rate [default: 9600]
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Enable the reader's pull-ups on the NAND bus
    #[arg(long)]
    pub pull_up: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a reader answers and show its details
    Ping {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// Identify the NAND chip and show its geometry
    Info {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// Read raw pages (data + OOB) to a file
    Read {
        #[command(flatten)]
        conn: ConnectionArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// First page to read (hex with 0x prefix or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start_page: u32,

        /// Number of pages to read (default: up to the end of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        pages: Option<u32>,

        /// Attempts per page before giving up
        #[arg(long, default_value_t = 3)]
        retries: u32,
    },

    /// Reboot the reader into its bootloader
    Bootloader {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// Restart the reader firmware
    Restart {
        #[command(flatten)]
        conn: ConnectionArgs,
    },

    /// List chips in the database
    ListChips {
        /// Filter by vendor name
        #[arg(long)]
        vendor: Option<String>,
    },
}
