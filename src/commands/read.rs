//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nandio_core::catalog::ChipDatabase;
use nandio_serial::{NandIoError, ReadProgress, ReadStats};
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::Path;

use super::device::print_identity;
use super::{format_size, open};
use crate::cli::ConnectionArgs;

/// Progress bar over pages
struct PageProgress {
    pb: ProgressBar,
}

impl PageProgress {
    fn new() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }
}

impl ReadProgress for PageProgress {
    fn reading(&mut self, total_pages: u32, _raw_page_size: u32) {
        self.pb = ProgressBar::new(total_pages as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({per_sec}, {eta})",
        ) {
            self.pb.set_style(style.progress_chars("#>-"));
        }
    }

    fn page_read(&mut self, pages_done: u32, _total_pages: u32) {
        self.pb.set_position(pages_done as u64);
    }

    fn retrying(&mut self, page: u32, attempt: u32, error: &NandIoError) {
        self.pb
            .println(format!("Page {}: {} (retry {})", page, error, attempt));
    }

    fn complete(&mut self, _stats: &ReadStats) {
        self.pb.finish_with_message("Read complete");
    }
}

/// Pages to read, checked against the chip before the output file is touched
fn page_range(start_page: u32, pages: Option<u32>, chip_pages: u32) -> Result<Range<u32>, String> {
    let end = match pages {
        Some(count) => start_page
            .checked_add(count)
            .ok_or_else(|| format!("Page range {}+{} overflows", start_page, count))?,
        None => chip_pages,
    };

    if start_page >= chip_pages || end > chip_pages {
        return Err(format!(
            "Pages {}..{} out of range (chip has {} pages)",
            start_page, end, chip_pages
        ));
    }

    Ok(start_page..end)
}

/// Run the read command
pub fn cmd_read(
    conn: &ConnectionArgs,
    db: &ChipDatabase,
    output: &Path,
    start_page: u32,
    pages: Option<u32>,
    retries: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut nio = open(conn, retries)?;
    nio.ping()?;

    let identity = nio.identify(db)?;
    print_identity(identity);
    println!();

    let range = page_range(start_page, pages, identity.geometry.pages)?;

    let mut file = BufWriter::new(File::create(output)?);
    let mut progress = PageProgress::new();

    let result = nio.read_pages(range, &mut file, &mut progress);
    if result.is_err() {
        progress.pb.abandon();
    }
    let stats = result?;

    println!(
        "Wrote {} pages ({}) to {:?}",
        stats.pages,
        format_size(stats.bytes),
        output
    );
    if stats.retries > 0 {
        println!(
            "{} retries over {} pages",
            stats.retries, stats.retried_pages
        );
    }

    Ok(())
}
