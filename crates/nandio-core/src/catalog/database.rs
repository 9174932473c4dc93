//! Chip database for runtime loading and lookup
//!
//! This module provides the `ChipDatabase` type for loading NAND catalog
//! entries from RON files. The vendor files shipped with the crate are
//! compiled in and available through [`ChipDatabase::with_builtin`].

use alloc::{format, string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::types::{FieldValue, NandChip};
use crate::nand::{Geometry, NandId, PageAddrType};

/// Vendor files compiled into the crate
const BUILTIN: &[(&str, &str)] = &[
    ("hynix.ron", include_str!("../../chips/hynix.ron")),
    ("esmt.ron", include_str!("../../chips/esmt.ron")),
    ("samsung.ron", include_str!("../../chips/samsung.ron")),
];

/// Error type for chip database operations
#[derive(Debug, thiserror::Error)]
pub enum ChipDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
    /// Size in mebibytes (1024 * 1024 bytes)
    MiB(u32),
}

impl Size {
    /// Convert to bytes, `None` if the value does not fit a `u32`
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
            Size::MiB(n) => n.checked_mul(1024 * 1024),
        }
    }
}

trait Quantity: Copy {
    fn value(self) -> Option<u32>;
}

impl Quantity for u32 {
    fn value(self) -> Option<u32> {
        Some(self)
    }
}

impl Quantity for Size {
    fn value(self) -> Option<u32> {
        self.to_bytes()
    }
}

/// Attribute definition (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
enum FieldDef<T> {
    Literal(T),
    Encoded { base: T, mask: u8, shift: u8 },
}

impl<T: Quantity> FieldDef<T> {
    fn into_field(self, chip: &str, attr: &str) -> Result<FieldValue, ChipDbError> {
        let too_large = || ChipDbError::Validation(format!("{}: {} is too large", chip, attr));
        Ok(match self {
            FieldDef::Literal(v) => FieldValue::Literal(v.value().ok_or_else(too_large)?),
            FieldDef::Encoded { base, mask, shift } => {
                if shift > 7 {
                    return Err(ChipDbError::Validation(format!(
                        "{}: {} shift {} is outside the ID byte",
                        chip, attr, shift
                    )));
                }
                FieldValue::Encoded {
                    base: base.value().ok_or_else(too_large)?,
                    mask,
                    shift,
                }
            }
        })
    }
}

/// Page address width (RON format)
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
enum PageAddrDef {
    ThreeByte,
    FourByte,
    #[default]
    FiveByte,
}

impl From<PageAddrDef> for PageAddrType {
    fn from(def: PageAddrDef) -> Self {
        match def {
            PageAddrDef::ThreeByte => PageAddrType::ThreeByte,
            PageAddrDef::FourByte => PageAddrType::FourByte,
            PageAddrDef::FiveByte => PageAddrType::FiveByte,
        }
    }
}

/// Single chip definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    device_id: u8,
    bus_width: FieldDef<u32>,
    page_size: FieldDef<Size>,
    block_size: FieldDef<Size>,
    oob_size: FieldDef<Size>,
    #[serde(default)]
    oob_sub_page: Option<Size>,
    planes: FieldDef<u32>,
    plane_size: FieldDef<Size>,
    #[serde(default)]
    page_address: PageAddrDef,
    #[serde(default)]
    read_delay_us: u32,
}

/// Vendor definition containing multiple chips
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    chips: Vec<ChipDef>,
}

fn convert_chip(vendor: &VendorDef, def: ChipDef) -> Result<NandChip, ChipDbError> {
    let name = def.name.as_str();
    let oob_size = def.oob_size.into_field(name, "oob_size")?;

    let oob_sub_page = match def.oob_sub_page {
        None => None,
        Some(_) if matches!(oob_size, FieldValue::Literal(_)) => {
            return Err(ChipDbError::Validation(format!(
                "{}: oob_sub_page needs an encoded oob_size",
                name
            )));
        }
        Some(size) => match size.to_bytes() {
            Some(0) | None => {
                return Err(ChipDbError::Validation(format!(
                    "{}: invalid oob_sub_page",
                    name
                )));
            }
            bytes => bytes,
        },
    };

    Ok(NandChip {
        vendor: vendor.vendor.clone(),
        name: def.name.clone(),
        manufacturer_id: vendor.manufacturer_id,
        device_id: def.device_id,
        bus_width: def.bus_width.into_field(name, "bus_width")?,
        page_size: def.page_size.into_field(name, "page_size")?,
        block_size: def.block_size.into_field(name, "block_size")?,
        oob_size,
        oob_sub_page,
        planes: def.planes.into_field(name, "planes")?,
        plane_size: def.plane_size.into_field(name, "plane_size")?,
        page_addr_type: def.page_address.into(),
        read_delay_us: def.read_delay_us,
    })
}

// ============================================================================
// Chip database
// ============================================================================

/// Runtime chip database
///
/// Holds the NAND catalog. Loading an entry whose manufacturer and device
/// IDs are already present replaces the older entry.
#[derive(Debug, Clone, Default)]
pub struct ChipDatabase {
    chips: Vec<NandChip>,
}

impl ChipDatabase {
    /// Create an empty chip database
    pub fn new() -> Self {
        Self { chips: Vec::new() }
    }

    /// Create a database holding the built-in vendor files
    pub fn with_builtin() -> Result<Self, ChipDbError> {
        let mut db = Self::new();
        for (file, content) in BUILTIN {
            let count = db.load_ron(content)?;
            log::trace!("Loaded {} built-in chips from {}", count, file);
        }
        Ok(db)
    }

    /// Load chip definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;

        let chips = vendor_def
            .chips
            .iter()
            .cloned()
            .map(|def| convert_chip(&vendor_def, def))
            .collect::<Result<Vec<_>, _>>()?;

        let count = chips.len();
        for chip in chips {
            self.insert(chip);
        }
        Ok(count)
    }

    /// Load all RON files from a directory
    ///
    /// Files are loaded in name order so overrides are deterministic.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ChipDbError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut total = 0;
        for path in paths {
            total += self.load_file(&path)?;
        }
        Ok(total)
    }

    /// Add an entry, replacing any entry with the same IDs
    pub fn insert(&mut self, chip: NandChip) {
        match self
            .chips
            .iter_mut()
            .find(|c| c.matches(chip.manufacturer_id, chip.device_id))
        {
            Some(existing) => {
                log::debug!(
                    "{} {} replaces {} {} (0x{:02X}/0x{:02X})",
                    chip.vendor,
                    chip.name,
                    existing.vendor,
                    existing.name,
                    chip.manufacturer_id,
                    chip.device_id
                );
                *existing = chip;
            }
            None => self.chips.push(chip),
        }
    }

    /// Get all chips in the database
    pub fn chips(&self) -> &[NandChip] {
        &self.chips
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Find a chip by manufacturer and device ID
    pub fn find(&self, manufacturer: u8, device: u8) -> Option<&NandChip> {
        self.chips.iter().find(|c| c.matches(manufacturer, device))
    }

    /// Vendor name for a manufacturer ID
    pub fn vendor_name(&self, manufacturer: u8) -> Option<&str> {
        self.chips
            .iter()
            .find(|c| c.manufacturer_id == manufacturer)
            .map(|c| c.vendor.as_str())
    }

    /// Find chips by vendor (case-insensitive partial match)
    pub fn find_by_vendor(&self, vendor: &str) -> Vec<&NandChip> {
        let vendor_lower = vendor.to_lowercase();
        self.chips
            .iter()
            .filter(|c| c.vendor.to_lowercase().contains(&vendor_lower))
            .collect()
    }

    /// Look up and decode the geometry for a set of ID bytes
    pub fn identify(&self, id: &NandId) -> crate::Result<Geometry> {
        self.find(id.mf_id, id.dev_id)
            .ok_or(crate::Error::GeometryNotFound {
                manufacturer: id.mf_id,
                device: id.dev_id,
            })?
            .decode(id)
    }

    /// Iterate over all chips
    pub fn iter(&self) -> impl Iterator<Item = &NandChip> {
        self.chips.iter()
    }
}
