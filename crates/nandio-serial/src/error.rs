//! Error types for nandio serial operations

use nandio_core::nand::NandId;
use nandio_core::protocol::{Command, CommandResult};
use thiserror::Error;

/// Errors raised by the serial link, the session and the page reader
#[derive(Debug, Error)]
pub enum NandIoError {
    /// Failed to connect to device
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Read or write on the channel failed
    #[error("Channel error: {0}")]
    Channel(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    /// Response does not start with the magic or echoes another command
    #[error("Protocol desync: expected {expected}, got magic 0x{magic:08X} command 0x{cmd:04X}")]
    ProtocolDesync {
        /// Command the host was waiting for
        expected: Command,
        /// Magic field as received
        magic: u32,
        /// Command field as received
        cmd: u16,
    },

    /// Header checksum mismatch
    #[error("Header CRC error: received 0x{received:04X}, computed 0x{computed:04X}")]
    HeaderCrc {
        /// CRC-16 sent by the device
        received: u16,
        /// CRC-16 computed over the received header
        computed: u16,
    },

    /// Payload checksum mismatch
    #[error("Payload CRC error: received 0x{received:08X}, computed 0x{computed:08X}")]
    PayloadCrc {
        /// CRC-32 sent by the device
        received: u32,
        /// CRC-32 computed over the received payload
        computed: u32,
    },

    /// The channel timed out before a full frame arrived
    #[error("Short read: expected {expected} bytes, received {received}")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes received before the timeout
        received: usize,
    },

    /// The frame announces a different payload size than the response needs
    #[error("Length mismatch: expected {expected} payload bytes, frame declares {declared}")]
    LengthMismatch {
        /// Payload size of the expected response
        expected: usize,
        /// `data_len` of the received header
        declared: u32,
    },

    /// The device answered with an error report
    #[error("Device reported {result} for {command}")]
    DeviceError {
        /// Command that failed
        command: Command,
        /// Result code from the error report
        result: CommandResult,
    },

    /// Unsupported protocol version
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// Identification bytes are not in the chip database
    #[error("Unknown NAND chip, ID bytes {0}")]
    GeometryNotFound(NandId),

    /// A page kept failing after every retry
    #[error("Page {page} failed after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        /// Page that could not be read
        page: u32,
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        #[source]
        last: Box<NandIoError>,
    },

    /// A read was requested before the chip was identified
    #[error("NAND chip has not been identified")]
    NotIdentified,

    /// A previous channel failure closed the session
    #[error("Session closed after a channel failure")]
    SessionClosed,

    /// Writing page data to the output failed
    #[error("Output error: {0}")]
    Output(#[source] std::io::Error),

    /// Error from the core library
    #[error(transparent)]
    Core(#[from] nandio_core::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl NandIoError {
    /// Whether re-requesting the same data may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProtocolDesync { .. }
                | Self::HeaderCrc { .. }
                | Self::PayloadCrc { .. }
                | Self::ShortRead { .. }
                | Self::LengthMismatch { .. }
                | Self::DeviceError { .. }
        )
    }

    /// Whether the channel itself failed and the session must be re-opened
    pub fn is_channel_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Channel(_) | Self::SerialError(_)
        )
    }
}

/// Result type for nandio serial operations
pub type Result<T> = core::result::Result<T, NandIoError>;

impl From<std::io::Error> for NandIoError {
    fn from(e: std::io::Error) -> Self {
        NandIoError::Channel(e.to_string())
    }
}
