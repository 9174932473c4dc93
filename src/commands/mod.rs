//! CLI command implementations
//!
//! Every device command opens a session, pings the reader to check the
//! protocol version, then does its work.

mod device;
mod list;
mod read;

pub use device::{cmd_bootloader, cmd_info, cmd_ping, cmd_restart};
pub use list::list_chips;
pub use read::cmd_read;

use crate::cli::ConnectionArgs;
use nandio_serial::{
    open_serial_with_timeout, NandIo, SerialConnection, SerialTransport, SessionOptions,
};
use std::time::Duration;

/// Open a session from the command line options
fn open(conn: &ConnectionArgs, retries: u32) -> Result<NandIo<SerialTransport>, Box<dyn std::error::Error>> {
    let target = SerialConnection::parse(&conn.device)?;
    let options = SessionOptions {
        pull_up: conn.pull_up,
        retries,
    };
    let nio = open_serial_with_timeout(
        &target.device,
        target.baud.or(conn.baud),
        Duration::from_millis(conn.timeout_ms),
        options,
    )?;
    Ok(nio)
}

/// Human readable size with binary suffixes (`528`, `16K`, `2.06M`)
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];

    if bytes == 0 {
        return "0".to_string();
    }

    let mut unit = 0;
    let mut div = 1u64;
    while unit + 1 < UNITS.len() && bytes >= div * 1024 {
        div *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / div as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", value, UNITS[unit])
}
