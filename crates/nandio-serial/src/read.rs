//! Page reader
//!
//! Reads a range of pages one at a time. Every page gets a fixed number of
//! attempts; a page that still fails aborts the whole read. Pages already
//! written to the sink stay there.

use std::io::Write;
use std::ops::Range;

use nandio_core::nand::Geometry;
use nandio_core::protocol::Command;

use crate::device::NandIo;
use crate::error::{NandIoError, Result};
use crate::transport::Transport;

/// Attempts per page before a read is aborted
pub const PAGE_READ_RETRIES: u32 = 3;

/// Statistics from a read operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Pages delivered to the sink
    pub pages: u32,
    /// Bytes delivered to the sink
    pub bytes: u64,
    /// Re-requests across all pages
    pub retries: u32,
    /// Pages that needed at least one re-request
    pub retried_pages: u32,
}

/// Progress callback trait for page reads
pub trait ReadProgress {
    /// Called once before the first page is requested
    fn reading(&mut self, total_pages: u32, raw_page_size: u32);

    /// Called after each page is delivered
    fn page_read(&mut self, pages_done: u32, total_pages: u32);

    /// Called when a page is about to be requested again
    fn retrying(&mut self, page: u32, attempt: u32, error: &NandIoError);

    /// Called when the read is complete
    fn complete(&mut self, stats: &ReadStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ReadProgress for NoProgress {
    fn reading(&mut self, _total_pages: u32, _raw_page_size: u32) {}
    fn page_read(&mut self, _pages_done: u32, _total_pages: u32) {}
    fn retrying(&mut self, _page: u32, _attempt: u32, _error: &NandIoError) {}
    fn complete(&mut self, _stats: &ReadStats) {}
}

/// Completion percentage, rounded to the nearest integer
pub fn percent(done: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done as u64 * 100 + total as u64 / 2) / total as u64) as u32
}

impl<T: Transport> NandIo<T> {
    /// Read every page of the identified chip into `sink`
    pub fn read_all<W, P>(&mut self, sink: &mut W, progress: &mut P) -> Result<ReadStats>
    where
        W: Write + ?Sized,
        P: ReadProgress + ?Sized,
    {
        let pages = self.geometry().ok_or(NandIoError::NotIdentified)?.pages;
        self.read_pages(0..pages, sink, progress)
    }

    /// Read `pages` of the identified chip into `sink`
    ///
    /// Each page is written as `raw_page_size` bytes (data followed by
    /// OOB). Retryable failures re-request the same page after discarding
    /// stale input; once the attempts are used up the read fails with
    /// [`NandIoError::RetryBudgetExhausted`] and no later page is requested.
    pub fn read_pages<W, P>(
        &mut self,
        pages: Range<u32>,
        sink: &mut W,
        progress: &mut P,
    ) -> Result<ReadStats>
    where
        W: Write + ?Sized,
        P: ReadProgress + ?Sized,
    {
        let geometry = *self.geometry().ok_or(NandIoError::NotIdentified)?;
        if pages.start > pages.end || pages.end > geometry.pages {
            return Err(nandio_core::Error::PageOutOfRange {
                page: pages.start.max(pages.end),
                pages: geometry.pages,
            }
            .into());
        }

        let total = pages.end - pages.start;
        let attempts = self.options().retries.max(1);
        let mut stats = ReadStats::default();
        let mut buf = vec![0u8; geometry.raw_page_size as usize];

        log::info!(
            "Reading {} pages from page {} ({} bytes each)",
            total,
            pages.start,
            geometry.raw_page_size
        );
        progress.reading(total, geometry.raw_page_size);

        for (done, page) in (1..).zip(pages) {
            let mut attempt = 1;
            loop {
                match self.read_page(&geometry, page, &mut buf) {
                    Ok(()) => break,
                    Err(e) if e.is_retryable() && attempt < attempts => {
                        log::warn!("Page {}: {} (attempt {}/{})", page, e, attempt, attempts);
                        progress.retrying(page, attempt, &e);
                        if attempt == 1 {
                            stats.retried_pages += 1;
                        }
                        stats.retries += 1;
                        attempt += 1;
                        self.guard(|s| s.link().drain())?;
                    }
                    Err(e) if e.is_retryable() => {
                        log::error!("Page {}: {}, giving up", page, e);
                        return Err(NandIoError::RetryBudgetExhausted {
                            page,
                            attempts,
                            last: Box::new(e),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            sink.write_all(&buf).map_err(NandIoError::Output)?;
            stats.pages += 1;
            stats.bytes += buf.len() as u64;
            log::trace!("Page {} done ({}%)", page, percent(done, total));
            progress.page_read(done, total);
        }

        sink.flush().map_err(NandIoError::Output)?;
        progress.complete(&stats);
        Ok(stats)
    }

    fn read_page(&mut self, geometry: &Geometry, page: u32, buf: &mut [u8]) -> Result<()> {
        let addr = geometry.page_address(page)?;
        self.guard(|s| {
            s.link().send_struct(Command::ReadPage, &addr)?;
            s.link().receive_raw(Command::ReadPage, buf)
        })
    }
}
