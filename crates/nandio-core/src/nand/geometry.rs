//! NAND geometry

use crate::error::{Error, GeometryFault, Result};
use crate::protocol::NandConfig;

use super::{PageAddrType, PageAddress};

/// Decoded chip attributes, before any derived value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    /// Data bus width in bits
    pub bus_width: u32,
    /// Data bytes per page
    pub page_size: u32,
    /// Data bytes per erase block
    pub block_size: u32,
    /// Number of planes
    pub planes: u32,
    /// Data bytes per plane
    pub plane_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u32,
}

/// Complete layout of an identified chip
///
/// Built once by the identify step and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Data bus width in bits
    pub bus_width: u32,
    /// Data bytes per page
    pub page_size: u32,
    /// Data bytes per erase block
    pub block_size: u32,
    /// Number of planes
    pub planes: u32,
    /// Data bytes per plane
    pub plane_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u32,
    /// Page address width
    pub page_addr_type: PageAddrType,
    /// Delay the firmware waits after issuing a page read
    pub read_delay_us: u32,
    /// Pages per block
    pub block_pages: u32,
    /// Blocks on the chip
    pub blocks: u32,
    /// Pages on the chip
    pub pages: u32,
    /// Bytes per page including OOB
    pub raw_page_size: u32,
    /// Bytes per block including OOB
    pub raw_block_size: u32,
    /// Chip size including OOB
    pub raw_size: u64,
    /// Chip data size
    pub size: u64,
}

impl Geometry {
    /// Derive the full geometry from decoded attributes
    ///
    /// Rejects attribute sets that would yield a zero or inconsistent
    /// layout, so a `Geometry` never carries garbage derived fields.
    pub fn new(dims: Dimensions, page_addr_type: PageAddrType, read_delay_us: u32) -> Result<Self> {
        let invalid = |fault| Error::InvalidGeometry(fault);

        for (name, value) in [
            ("bus width", dims.bus_width),
            ("page size", dims.page_size),
            ("block size", dims.block_size),
            ("planes", dims.planes),
            ("plane size", dims.plane_size),
        ] {
            if value == 0 {
                return Err(invalid(GeometryFault::ZeroField(name)));
            }
        }

        if dims.block_size % dims.page_size != 0 {
            return Err(invalid(GeometryFault::PageNotDivisor));
        }
        if dims.plane_size % dims.block_size != 0 {
            return Err(invalid(GeometryFault::BlockNotDivisor));
        }

        let block_pages = dims.block_size / dims.page_size;
        let blocks = dims
            .planes
            .checked_mul(dims.plane_size / dims.block_size)
            .ok_or(invalid(GeometryFault::Overflow))?;
        let pages = block_pages
            .checked_mul(blocks)
            .ok_or(invalid(GeometryFault::Overflow))?;
        let raw_page_size = dims
            .page_size
            .checked_add(dims.oob_size)
            .ok_or(invalid(GeometryFault::Overflow))?;
        let raw_block_size = block_pages
            .checked_mul(raw_page_size)
            .ok_or(invalid(GeometryFault::Overflow))?;

        if pages > page_addr_type.max_pages() {
            return Err(invalid(GeometryFault::AddressWidth {
                pages,
                addr_bytes: page_addr_type.bytes(),
            }));
        }

        Ok(Self {
            bus_width: dims.bus_width,
            page_size: dims.page_size,
            block_size: dims.block_size,
            planes: dims.planes,
            plane_size: dims.plane_size,
            oob_size: dims.oob_size,
            page_addr_type,
            read_delay_us,
            block_pages,
            blocks,
            pages,
            raw_page_size,
            raw_block_size,
            raw_size: blocks as u64 * raw_block_size as u64,
            size: blocks as u64 * dims.block_size as u64,
        })
    }

    /// Encode the read-page address for `page`
    pub fn page_address(&self, page: u32) -> Result<PageAddress> {
        if page >= self.pages {
            return Err(Error::PageOutOfRange {
                page,
                pages: self.pages,
            });
        }
        Ok(PageAddress::encode(page, self.page_addr_type))
    }

    /// Set-config payload describing this chip
    pub fn config(&self, pull_up: bool) -> NandConfig {
        NandConfig::new(self.raw_page_size, self.read_delay_us, pull_up)
    }
}
