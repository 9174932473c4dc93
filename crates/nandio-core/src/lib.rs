//! nandio-core - Core library for the nandio serial NAND protocol
//!
//! This crate contains everything that does not need a serial port: the
//! frame checksums, the wire structures exchanged with the firmware, the
//! NAND geometry decoder and the page address encoder. It is `no_std`
//! compatible so the same definitions can be shared with firmware.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the
//!   RON-backed chip database
//! - `alloc` - Enable heap allocation for owned catalog entries
//!
//! # Example
//!
//! ```ignore
//! use nandio_core::catalog::ChipDatabase;
//! use nandio_core::nand::NandId;
//!
//! let db = ChipDatabase::with_builtin()?;
//! let id = NandId::new(0xAD, 0x73, 0x00, 0x00, 0x00);
//! let chip = db.find(id.mf_id, id.dev_id).unwrap();
//! let geometry = chip.decode(&id)?;
//! println!("{} pages of {} bytes", geometry.pages, geometry.raw_page_size);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
pub mod catalog;
pub mod crc;
pub mod error;
pub mod nand;
pub mod protocol;

pub use error::{Error, Result};
