//! Raw NAND chip model
//!
//! - [`NandId`] - the five identification bytes returned by a read-id
//! - [`Geometry`] - page/block/plane layout derived from a catalog entry
//! - [`PageAddress`] - wire encoding of a page index for the chip's address width

mod address;
mod geometry;
mod id;

pub use address::{PageAddrType, PageAddress};
pub use geometry::{Dimensions, Geometry};
pub use id::NandId;
