//! Reader commands: ping, info, bootloader, restart

use super::{format_size, open};
use crate::cli::ConnectionArgs;
use nandio_core::catalog::ChipDatabase;
use nandio_serial::{DeviceInfo, Identity, NandIoError, PAGE_READ_RETRIES};

/// Run the ping command
pub fn cmd_ping(conn: &ConnectionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut nio = open(conn, PAGE_READ_RETRIES)?;
    let info = nio.ping()?;
    print_device_info(&info);
    Ok(())
}

/// Run the info command
pub fn cmd_info(conn: &ConnectionArgs, db: &ChipDatabase) -> Result<(), Box<dyn std::error::Error>> {
    let mut nio = open(conn, PAGE_READ_RETRIES)?;
    let info = nio.ping()?;
    print_device_info(&info);
    println!();

    match nio.identify(db) {
        Ok(identity) => {
            print_identity(identity);
            Ok(())
        }
        Err(NandIoError::GeometryNotFound(id)) => {
            println!("NAND Information");
            println!("================");
            println!();
            println!("Manufacturer:    {}", vendor_or_unknown(db, id.mf_id));
            println!("Device:          Unknown (0x{:02X})", id.dev_id);
            println!("ID bytes:        {}", id);
            Err(NandIoError::GeometryNotFound(id).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the bootloader command
pub fn cmd_bootloader(conn: &ConnectionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut nio = open(conn, PAGE_READ_RETRIES)?;
    nio.ping()?;
    if nio.enter_bootloader()? {
        println!("Reader is rebooting into its bootloader");
    } else {
        println!("Reader does not support entering the bootloader");
    }
    Ok(())
}

/// Run the restart command
pub fn cmd_restart(conn: &ConnectionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut nio = open(conn, PAGE_READ_RETRIES)?;
    nio.ping()?;
    if nio.restart()? {
        println!("Reader is restarting");
    } else {
        println!("Reader does not support restarting");
    }
    Ok(())
}

fn vendor_or_unknown(db: &ChipDatabase, mf_id: u8) -> String {
    match db.vendor_name(mf_id) {
        Some(name) => name.to_string(),
        None => format!("Unknown (0x{:02X})", mf_id),
    }
}

fn print_device_info(info: &DeviceInfo) {
    println!("Reader Information");
    println!("==================");
    println!();
    println!("Device:          {}", info.kind);
    println!("Protocol:        {}", info.version);
    println!("Serial speed:    {}", info.serial_speed);
    println!("Free memory:     {}", format_size(info.memory_free as u64));
}

pub(super) fn print_identity(identity: &Identity) {
    let g = &identity.geometry;

    println!("NAND Information");
    println!("================");
    println!();
    println!("Manufacturer:    {}", identity.vendor);
    println!("Device:          {}", identity.name);
    println!("ID bytes:        {}", identity.id);
    println!("Chip data:       0x{:02X}", identity.id.chip_data);
    println!("Size data:       0x{:02X}", identity.id.size_data);
    println!("Plane data:      0x{:02X}", identity.id.plane_data);
    println!();
    println!("Bus width:       {}", g.bus_width);
    println!("Size:            {}", format_size(g.size));
    println!("Raw size:        {}", format_size(g.raw_size));
    println!("OOB size:        {}", g.oob_size);
    println!("Page size:       {}", g.page_size);
    println!("Raw page size:   {}", g.raw_page_size);
    println!("Block size:      {}", format_size(g.block_size as u64));
    println!("Raw block size:  {}", format_size(g.raw_block_size as u64));
    println!("Plane size:      {}", format_size(g.plane_size as u64));
    println!("Planes:          {}", g.planes);
    println!("Blocks:          {}", g.blocks);
    println!("Pages:           {}", g.pages);
    println!("Pages per block: {}", g.block_pages);
    println!("Page address:    {}", g.page_addr_type);
    println!("Read delay:      {} us", g.read_delay_us);
}
