//! Fixed-layout structures exchanged with the firmware

use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::{Command, FRAME_HEADER_LEN, HEADER_LEN, PKT_MAGIC};
use crate::crc::{crc16, crc32, CRC16_START, CRC32_START};

/// Packet header (without its trailing CRC-16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PacketHeader {
    /// Always [`PKT_MAGIC`]
    pub magic: U32,
    /// Command opcode
    pub cmd: U16,
    /// Number of payload bytes that follow the header
    pub data_len: U32,
}

const _: () = assert!(core::mem::size_of::<PacketHeader>() == HEADER_LEN);

impl PacketHeader {
    /// Create a header for `cmd` announcing `data_len` payload bytes
    pub fn new(cmd: Command, data_len: u32) -> Self {
        Self {
            magic: U32::new(PKT_MAGIC),
            cmd: U16::new(cmd.opcode()),
            data_len: U32::new(data_len),
        }
    }

    /// Decode a header from the first [`HEADER_LEN`] bytes of `buf`
    pub fn parse(buf: &[u8]) -> crate::Result<Self> {
        let bytes = buf.get(..HEADER_LEN).ok_or(crate::Error::BufferTooSmall {
            expected: HEADER_LEN,
            actual: buf.len(),
        })?;
        Self::read_from_bytes(bytes).map_err(|_| crate::Error::BufferTooSmall {
            expected: HEADER_LEN,
            actual: buf.len(),
        })
    }

    /// Whether the magic field matches
    pub fn has_valid_magic(&self) -> bool {
        self.magic.get() == PKT_MAGIC
    }

    /// CRC-16 of the encoded header
    pub fn checksum(&self) -> u16 {
        crc16(CRC16_START, self.as_bytes())
    }

    /// Encode the header followed by its CRC-16
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut out = [0u8; FRAME_HEADER_LEN];
        out[..HEADER_LEN].copy_from_slice(self.as_bytes());
        out[HEADER_LEN..].copy_from_slice(&self.checksum().to_le_bytes());
        out
    }
}

/// CRC-32 trailer for a payload
pub fn payload_checksum(payload: &[u8]) -> u32 {
    crc32(CRC32_START, payload)
}

/// Ping response
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PingResponse {
    /// Device kind, see [`super::DeviceKind`]
    pub device: u8,
    /// Protocol version
    pub version: U16,
    /// Serial speed configured on the device
    pub serial_speed: U32,
    /// Free RAM on the device in bytes
    pub memory_free: U32,
}

/// Bootloader and restart response
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct SupportResponse {
    /// Non-zero when the device will perform the request
    pub supported: u8,
}

/// Error report sent with [`Command::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ErrorReport {
    /// Raw result code, see [`super::CommandResult`]
    pub result: u8,
}

/// Set-config payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct NandConfig {
    /// Bytes per page including OOB
    pub raw_page_size: U32,
    /// Delay between the read command and data transfer
    pub read_delay_us: U32,
    /// Enable the device's pull-ups on the NAND bus
    pub pull_up: u8,
}

impl NandConfig {
    /// Build a config payload
    pub fn new(raw_page_size: u32, read_delay_us: u32, pull_up: bool) -> Self {
        Self {
            raw_page_size: U32::new(raw_page_size),
            read_delay_us: U32::new(read_delay_us),
            pull_up: pull_up as u8,
        }
    }
}
