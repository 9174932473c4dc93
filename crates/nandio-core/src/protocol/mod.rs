//! nandio protocol constants and types
//!
//! Every frame, in either direction, is laid out as:
//!
//! ```text
//! +-------------+----------+--------------+---------+-----------------+--------------+
//! | magic (u32) | cmd (u16)| data_len(u32)| crc16   | payload         | crc32        |
//! | 0xDEADC0DE  |          |              | of hdr  | data_len bytes  | of payload   |
//! +-------------+----------+--------------+---------+-----------------+--------------+
//! ```
//!
//! All integers are little-endian and packed. The payload and its CRC-32 are
//! only present when `data_len` is non-zero.

mod wire;

pub use wire::*;

use core::fmt;

/// Protocol version reported by compatible firmware
pub const PROTOCOL_VERSION: u16 = 1;

/// Magic value that starts every frame
pub const PKT_MAGIC: u32 = 0xDEAD_C0DE;

/// Size of the packet header without its checksum
pub const HEADER_LEN: usize = 10;

/// Size of the header checksum
pub const HEADER_CRC_LEN: usize = 2;

/// Size of the header including its checksum
pub const FRAME_HEADER_LEN: usize = HEADER_LEN + HEADER_CRC_LEN;

/// Size of the payload checksum
pub const DATA_CRC_LEN: usize = 4;

/// Capacity of the page address array
pub const PAGE_ADDR_SIZE: usize = 5;

/// Command opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Command {
    /// Query device kind, protocol version and link parameters
    Ping = 0x10,
    /// Reboot into the device bootloader
    Bootloader = 0x11,
    /// Restart the device firmware
    Restart = 0x12,
    /// Read the NAND identification bytes
    ReadId = 0x30,
    /// Push the NAND configuration (sent right after `ReadId`)
    SetConfig = 0x31,
    /// Read one raw page (data + OOB)
    ReadPage = 0x32,
    /// Program one raw page
    WritePage = 0x33,
    /// Erase one block
    EraseBlock = 0x34,
    /// Error report sent by the firmware
    Error = 0xF0,
}

impl Command {
    /// Wire opcode
    pub const fn opcode(self) -> u16 {
        self as u16
    }

    /// Look up a command by opcode
    pub const fn from_opcode(opcode: u16) -> Option<Self> {
        match opcode {
            0x10 => Some(Self::Ping),
            0x11 => Some(Self::Bootloader),
            0x12 => Some(Self::Restart),
            0x30 => Some(Self::ReadId),
            0x31 => Some(Self::SetConfig),
            0x32 => Some(Self::ReadPage),
            0x33 => Some(Self::WritePage),
            0x34 => Some(Self::EraseBlock),
            0xF0 => Some(Self::Error),
            _ => None,
        }
    }

    /// Short human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Bootloader => "bootloader",
            Self::Restart => "restart",
            Self::ReadId => "read-id",
            Self::SetConfig => "set-config",
            Self::ReadPage => "read-page",
            Self::WritePage => "write-page",
            Self::EraseBlock => "erase-block",
            Self::Error => "error",
        }
    }
}

impl TryFrom<u16> for Command {
    type Error = crate::Error;

    fn try_from(opcode: u16) -> crate::Result<Self> {
        Self::from_opcode(opcode).ok_or(crate::Error::UnknownCommand(opcode))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.opcode())
    }
}

/// Result code carried by a firmware error report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Command completed
    Ok,
    /// Opcode not recognised by the firmware
    Unknown,
    /// Firmware could not receive the request frame
    TransferError,
    /// Request frame failed its checksum on the device
    CrcError,
    /// Command recognised but not supported by this device
    NotSupported,
    /// Code not known to this host
    Other(u8),
}

impl CommandResult {
    /// Decode a result code
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Unknown,
            2 => Self::TransferError,
            3 => Self::CrcError,
            4 => Self::NotSupported,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Unknown => write!(f, "unknown command"),
            Self::TransferError => write!(f, "transfer error"),
            Self::CrcError => write!(f, "CRC error"),
            Self::NotSupported => write!(f, "not supported"),
            Self::Other(code) => write!(f, "result code {}", code),
        }
    }
}

/// Programmer hardware reported by ping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// PJRC Teensy++ 2.0
    TeensyPlusPlus2,
    /// Raspberry Pi Pico
    RpiPico,
    /// Unrecognised device ID
    Unknown(u8),
}

impl DeviceKind {
    /// Decode the device byte of a ping response
    pub const fn from_id(id: u8) -> Self {
        match id {
            1 => Self::TeensyPlusPlus2,
            2 => Self::RpiPico,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeensyPlusPlus2 => write!(f, "Teensy++ 2.0"),
            Self::RpiPico => write!(f, "Raspberry Pi Pico"),
            Self::Unknown(id) => write!(f, "unknown (0x{:02X})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcodes() {
        assert_eq!(Command::Ping.opcode(), 0x10);
        assert_eq!(Command::Bootloader.opcode(), 0x11);
        assert_eq!(Command::Restart.opcode(), 0x12);
        assert_eq!(Command::ReadId.opcode(), 0x30);
        assert_eq!(Command::SetConfig.opcode(), 0x31);
        assert_eq!(Command::ReadPage.opcode(), 0x32);
        assert_eq!(Command::WritePage.opcode(), 0x33);
        assert_eq!(Command::EraseBlock.opcode(), 0x34);
        assert_eq!(Command::Error.opcode(), 0xF0);
    }

    #[test]
    fn test_opcode_lookup() {
        for cmd in [
            Command::Ping,
            Command::Bootloader,
            Command::Restart,
            Command::ReadId,
            Command::SetConfig,
            Command::ReadPage,
            Command::WritePage,
            Command::EraseBlock,
            Command::Error,
        ] {
            assert_eq!(Command::try_from(cmd.opcode()), Ok(cmd));
        }
        assert_eq!(
            Command::try_from(0x20),
            Err(crate::Error::UnknownCommand(0x20))
        );
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(CommandResult::from_code(4), CommandResult::NotSupported);
        assert_eq!(CommandResult::from_code(9), CommandResult::Other(9));
        assert_eq!(DeviceKind::from_id(1), DeviceKind::TeensyPlusPlus2);
        assert_eq!(DeviceKind::from_id(7), DeviceKind::Unknown(7));
    }
}
