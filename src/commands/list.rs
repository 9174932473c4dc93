//! List commands implementation

use nandio_core::catalog::ChipDatabase;

/// List all chips in the database
pub fn list_chips(db: &ChipDatabase, vendor_filter: Option<&str>) {
    println!("Supported NAND chips:");
    println!();
    println!(
        "{:<10} {:<14} {:>6} {:>6} {:>9} {:>9} {:>8} {:>7} {:>9}",
        "Vendor", "Name", "ID", "Page", "OOB", "Block", "Planes", "Addr", "Plane"
    );
    println!("{}", "-".repeat(86));

    let chips = match vendor_filter {
        Some(vendor) => db.find_by_vendor(vendor),
        None => db.iter().collect(),
    };

    for chip in chips {
        let id_str = format!("{:02X} {:02X}", chip.manufacturer_id, chip.device_id);

        println!(
            "{:<10} {:<14} {:>6} {:>6} {:>9} {:>9} {:>8} {:>7} {:>9}",
            chip.vendor,
            chip.name,
            id_str,
            chip.page_size.to_string(),
            chip.oob_size.to_string(),
            chip.block_size.to_string(),
            chip.planes.to_string(),
            chip.page_addr_type.to_string(),
            chip.plane_size.to_string()
        );
    }
}
