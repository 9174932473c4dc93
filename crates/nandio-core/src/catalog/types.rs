//! Catalog entry types

use alloc::string::String;
use core::fmt;

use crate::error::{Error, GeometryFault, Result};
use crate::nand::{Dimensions, Geometry, NandId, PageAddrType};

/// Identification byte an encoded attribute is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Fourth ID byte: bus width, page size, block size and OOB size
    SizeData,
    /// Fifth ID byte: plane count and plane size
    PlaneData,
}

impl IdSource {
    /// Pick the source byte out of an ID
    pub const fn select(self, id: &NandId) -> u8 {
        match self {
            Self::SizeData => id.size_data,
            Self::PlaneData => id.plane_data,
        }
    }
}

/// A single geometry attribute of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Fixed value
    Literal(u32),
    /// `base << ((source >> shift) & mask)`
    Encoded {
        /// Value for an all-zero bit field
        base: u32,
        /// Bit field mask, applied after shifting
        mask: u8,
        /// Bit position of the field in the source byte
        shift: u8,
    },
}

impl FieldValue {
    /// Resolve the attribute against its source byte
    ///
    /// Returns `None` if the shift would push set bits out of a `u32`.
    pub fn resolve(&self, source: u8) -> Option<u32> {
        match *self {
            Self::Literal(v) => Some(v),
            Self::Encoded { base, mask, shift } => {
                let bits = (source.checked_shr(shift as u32).unwrap_or(0) & mask) as u32;
                let value = base.checked_shl(bits)?;
                (value >> bits == base).then_some(value)
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{}", v),
            Self::Encoded { .. } => write!(f, "id-coded"),
        }
    }
}

/// Catalog entry for one NAND device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NandChip {
    /// Vendor name
    pub vendor: String,
    /// Device name
    pub name: String,
    /// Manufacturer ID (first ID byte)
    pub manufacturer_id: u8,
    /// Device ID (second ID byte)
    pub device_id: u8,
    /// Bus width in bits, read from `size_data`
    pub bus_width: FieldValue,
    /// Page size, read from `size_data`
    pub page_size: FieldValue,
    /// Block size, read from `size_data`
    pub block_size: FieldValue,
    /// OOB bytes, read from `size_data`
    pub oob_size: FieldValue,
    /// Page size the encoded OOB value refers to
    ///
    /// When set, an encoded OOB size is multiplied by
    /// `page_size / oob_sub_page`.
    pub oob_sub_page: Option<u32>,
    /// Plane count, read from `plane_data`
    pub planes: FieldValue,
    /// Plane size, read from `plane_data`
    pub plane_size: FieldValue,
    /// Page address width
    pub page_addr_type: PageAddrType,
    /// Delay between the read command and data transfer
    pub read_delay_us: u32,
}

impl NandChip {
    /// Check if this entry describes the given IDs
    pub fn matches(&self, manufacturer: u8, device: u8) -> bool {
        self.manufacturer_id == manufacturer && self.device_id == device
    }

    /// Decode the geometry of a chip that returned `id`
    pub fn decode(&self, id: &NandId) -> Result<Geometry> {
        if !self.matches(id.mf_id, id.dev_id) {
            return Err(Error::GeometryNotFound {
                manufacturer: id.mf_id,
                device: id.dev_id,
            });
        }

        let field = |name: &'static str, value: FieldValue, source: IdSource| {
            value
                .resolve(source.select(id))
                .ok_or(Error::InvalidGeometry(GeometryFault::ShiftOverflow(name)))
        };

        let bus_width = field("bus width", self.bus_width, IdSource::SizeData)?;
        let page_size = field("page size", self.page_size, IdSource::SizeData)?;
        let block_size = field("block size", self.block_size, IdSource::SizeData)?;
        let mut oob_size = field("OOB size", self.oob_size, IdSource::SizeData)?;
        let planes = field("planes", self.planes, IdSource::PlaneData)?;
        let plane_size = field("plane size", self.plane_size, IdSource::PlaneData)?;

        if let (FieldValue::Encoded { .. }, Some(sub_page)) = (self.oob_size, self.oob_sub_page) {
            if sub_page == 0 {
                return Err(Error::InvalidGeometry(GeometryFault::ZeroField("OOB sub-page")));
            }
            oob_size = oob_size
                .checked_mul(page_size / sub_page)
                .ok_or(Error::InvalidGeometry(GeometryFault::Overflow))?;
        }

        let dims = Dimensions {
            bus_width,
            page_size,
            block_size,
            planes,
            plane_size,
            oob_size,
        };
        log::debug!("{} {}: decoded {:?}", self.vendor, self.name, dims);

        Geometry::new(dims, self.page_addr_type, self.read_delay_us)
    }
}
