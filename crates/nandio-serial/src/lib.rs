//! nandio-serial - host side of the nandio NAND reader protocol
//!
//! This crate talks to microcontroller firmware that drives a raw NAND
//! flash chip, over a serial port.
//!
//! # Layers
//!
//! - [`Transport`] - timeout-bound byte channel (serial port, or an
//!   in-memory fake in tests)
//! - [`PacketLink`] - framing, CRC-16/CRC-32 checks and command matching,
//!   with a write-coalescing [`OutputBuffer`]
//! - [`NandIo`] - session: ping, reboot requests, chip identification
//!   and page reads with a per-page retry budget
//!
//! # Example
//!
//! ```no_run
//! use nandio_core::catalog::ChipDatabase;
//! use nandio_serial::{open_serial, NoProgress, SessionOptions};
//!
//! let db = ChipDatabase::with_builtin()?;
//! let mut nio = open_serial("/dev/ttyACM0", None, SessionOptions::default())?;
//! nio.ping()?;
//! nio.identify(&db)?;
//!
//! let mut image = Vec::new();
//! let stats = nio.read_all(&mut image, &mut NoProgress)?;
//! println!("read {} pages, {} retries", stats.pages, stats.retries);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod device;
pub mod error;
pub mod link;
pub mod read;
pub mod transport;

#[cfg(test)]
mod testing;

use std::time::Duration;

// Re-exports
pub use buffer::{OutputBuffer, SERIAL_BUFFER_SIZE};
pub use device::{DeviceInfo, Identity, NandIo, SessionOptions};
pub use error::{NandIoError, Result};
pub use link::PacketLink;
pub use read::{NoProgress, ReadProgress, ReadStats, PAGE_READ_RETRIES};
pub use transport::serial::{SerialTransport, DEFAULT_BAUD, DEFAULT_TIMEOUT};
pub use transport::Transport;

/// Serial connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConnection {
    /// Device path (e.g., "/dev/ttyACM0" or "COM1")
    pub device: String,
    /// Baud rate (None for the default)
    pub baud: Option<u32>,
}

impl SerialConnection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `/dev/ttyACM0` - plain device path
    /// - `dev=/dev/ttyACM0` - serial with default baud
    /// - `dev=/dev/ttyACM0:115200` - serial with specified baud
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let Some(dev) = s.strip_prefix("dev=") else {
            if s.is_empty() {
                return Err("Empty serial device".to_string());
            }
            return Ok(SerialConnection {
                device: s.to_string(),
                baud: None,
            });
        };

        if let Some((device, baud_str)) = dev.rsplit_once(':') {
            let baud = baud_str
                .parse()
                .map_err(|_| format!("Invalid baud rate: {}", baud_str))?;
            Ok(SerialConnection {
                device: device.to_string(),
                baud: Some(baud),
            })
        } else if dev.is_empty() {
            Err(format!("Invalid serial connection string: {}", s))
        } else {
            Ok(SerialConnection {
                device: dev.to_string(),
                baud: None,
            })
        }
    }
}

/// Open a nandio session on a serial port
pub fn open_serial(
    device: &str,
    baud: Option<u32>,
    options: SessionOptions,
) -> Result<NandIo<SerialTransport>> {
    open_serial_with_timeout(device, baud, DEFAULT_TIMEOUT, options)
}

/// Open a nandio session on a serial port with a specific read timeout
pub fn open_serial_with_timeout(
    device: &str,
    baud: Option<u32>,
    timeout: Duration,
    options: SessionOptions,
) -> Result<NandIo<SerialTransport>> {
    let transport = SerialTransport::open(device, baud, timeout)?;
    NandIo::new(transport, options)
}
