//! Error types for nandio-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Reason a decoded geometry was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFault {
    /// An attribute decoded to zero
    ZeroField(&'static str),
    /// A shift in an encoded attribute ran past the width of the value
    ShiftOverflow(&'static str),
    /// Block size is not a multiple of the page size
    PageNotDivisor,
    /// Plane size is not a multiple of the block size
    BlockNotDivisor,
    /// A derived size does not fit its integer type
    Overflow,
    /// The chip has more pages than its address width can select
    AddressWidth {
        /// Total number of pages
        pages: u32,
        /// Number of page address bytes available
        addr_bytes: u8,
    },
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Identification errors
    /// Identification bytes do not match any catalog entry
    GeometryNotFound {
        /// Manufacturer ID reported by the chip
        manufacturer: u8,
        /// Device ID reported by the chip
        device: u8,
    },
    /// The catalog entry produced an unusable geometry for these ID bytes
    InvalidGeometry(GeometryFault),

    // Wire format errors
    /// Buffer is shorter than the structure being decoded
    BufferTooSmall {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },
    /// Opcode is not part of the command set
    UnknownCommand(u16),
    /// Page index lies outside the chip
    PageOutOfRange {
        /// Requested page
        page: u32,
        /// Pages on the chip
        pages: u32,
    },
}

impl fmt::Display for GeometryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroField(name) => write!(f, "{} decoded to zero", name),
            Self::ShiftOverflow(name) => write!(f, "{} shift exceeds 31 bits", name),
            Self::PageNotDivisor => write!(f, "block size is not a multiple of page size"),
            Self::BlockNotDivisor => write!(f, "plane size is not a multiple of block size"),
            Self::Overflow => write!(f, "derived size overflows"),
            Self::AddressWidth { pages, addr_bytes } => write!(
                f,
                "{} pages cannot be addressed with {}-byte page addresses",
                pages, addr_bytes
            ),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeometryNotFound {
                manufacturer,
                device,
            } => write!(
                f,
                "unknown NAND chip (manufacturer 0x{:02X}, device 0x{:02X})",
                manufacturer, device
            ),
            Self::InvalidGeometry(fault) => write!(f, "invalid NAND geometry: {}", fault),
            Self::BufferTooSmall { expected, actual } => write!(
                f,
                "buffer too small: need {} bytes, have {}",
                expected, actual
            ),
            Self::UnknownCommand(cmd) => write!(f, "unknown command 0x{:04X}", cmd),
            Self::PageOutOfRange { page, pages } => {
                write!(f, "page {} out of range (chip has {} pages)", page, pages)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
