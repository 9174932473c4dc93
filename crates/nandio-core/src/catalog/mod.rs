//! NAND chip catalog
//!
//! Catalog entries describe how to turn the five identification bytes into
//! a [`crate::nand::Geometry`]. The RON-backed database is only available
//! with the `std` feature.

mod types;

#[cfg(feature = "std")]
mod database;

pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
