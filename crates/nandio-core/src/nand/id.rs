//! NAND identification bytes

use core::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Identification bytes as returned by the read-id command
///
/// The layout of `size_data` and `plane_data` is vendor specific; the
/// catalog describes how to pull sizes out of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(C)]
pub struct NandId {
    /// Manufacturer ID
    pub mf_id: u8,
    /// Device ID
    pub dev_id: u8,
    /// Third ID byte (cell type, interleave, ...)
    pub chip_data: u8,
    /// Fourth ID byte (page, block, OOB size and bus width)
    pub size_data: u8,
    /// Fifth ID byte (plane count and plane size)
    pub plane_data: u8,
}

impl NandId {
    /// Create an ID from its five bytes
    pub const fn new(mf_id: u8, dev_id: u8, chip_data: u8, size_data: u8, plane_data: u8) -> Self {
        Self {
            mf_id,
            dev_id,
            chip_data,
            size_data,
            plane_data,
        }
    }
}

impl fmt::Display for NandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X} {:02X} {:02X}",
            self.mf_id, self.dev_id, self.chip_data, self.size_data, self.plane_data
        )
    }
}
