//! Page address encoding
//!
//! Only whole pages are read, so the column bytes of the address cycle are
//! always zero. Small-page chips take one column byte followed by two or
//! three row bytes; large-page chips take two column bytes and three row
//! bytes.

use core::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::protocol::PAGE_ADDR_SIZE;

/// Number of address cycles used to select a page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PageAddrType {
    /// 1 column byte + 2 row bytes
    ThreeByte,
    /// 1 column byte + 3 row bytes
    FourByte,
    /// 2 column bytes + 3 row bytes
    #[default]
    FiveByte,
}

impl PageAddrType {
    /// Number of meaningful address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
            Self::FiveByte => 5,
        }
    }

    /// Number of row (page index) bytes
    pub const fn row_bytes(&self) -> u8 {
        match self {
            Self::ThreeByte => 2,
            Self::FourByte | Self::FiveByte => 3,
        }
    }

    /// Number of pages this address width can select
    pub const fn max_pages(&self) -> u32 {
        1 << (8 * self.row_bytes() as u32)
    }
}

impl fmt::Display for PageAddrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-byte", self.bytes())
    }
}

/// Read-page payload: the address bytes and how many of them are used
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PageAddress {
    /// Address cycle bytes, unused trailing bytes are zero
    pub addr: [u8; PAGE_ADDR_SIZE],
    /// Number of meaningful bytes in `addr`
    pub addr_len: u8,
}

impl PageAddress {
    /// Encode `page` for a chip using `addr_type` address cycles
    pub fn encode(page: u32, addr_type: PageAddrType) -> Self {
        let mut addr = [0u8; PAGE_ADDR_SIZE];
        match addr_type {
            PageAddrType::ThreeByte => {
                addr[1] = page as u8;
                addr[2] = (page >> 8) as u8;
            }
            PageAddrType::FourByte => {
                addr[1] = page as u8;
                addr[2] = (page >> 8) as u8;
                addr[3] = (page >> 16) as u8;
            }
            PageAddrType::FiveByte => {
                addr[2] = page as u8;
                addr[3] = (page >> 8) as u8;
                addr[4] = (page >> 16) as u8;
            }
        }
        Self {
            addr,
            addr_len: addr_type.bytes(),
        }
    }

    /// The meaningful address bytes
    pub fn as_slice(&self) -> &[u8] {
        let len = (self.addr_len as usize).min(PAGE_ADDR_SIZE);
        &self.addr[..len]
    }

    /// Recover the page index from the row bytes
    ///
    /// Returns `None` when `addr_len` is not a supported width.
    pub fn page_index(&self) -> Option<u32> {
        let a = &self.addr;
        match self.addr_len {
            3 => Some(a[1] as u32 | (a[2] as u32) << 8),
            4 => Some(a[1] as u32 | (a[2] as u32) << 8 | (a[3] as u32) << 16),
            5 => Some(a[2] as u32 | (a[3] as u32) << 8 | (a[4] as u32) << 16),
            _ => None,
        }
    }
}
