//! Write-coalescing output buffer
//!
//! Frames are assembled here and handed to the transport in as few writes
//! as possible. The buffer is flushed when a write would overflow it and
//! whenever the owner asks.

use crate::error::Result;
use crate::transport::Transport;

/// Default output buffer capacity
pub const SERIAL_BUFFER_SIZE: usize = 32768;

/// Bounded output buffer in front of a [`Transport`]
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Create a buffer with [`SERIAL_BUFFER_SIZE`] capacity
    pub fn new() -> Self {
        Self::with_capacity(SERIAL_BUFFER_SIZE)
    }

    /// Create a buffer holding at most `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of bytes waiting to be flushed
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Queue `data`, flushing first if it would not fit
    ///
    /// Data larger than the whole buffer bypasses it.
    pub fn write<T: Transport + ?Sized>(&mut self, transport: &mut T, data: &[u8]) -> Result<()> {
        if self.buf.len() + data.len() > self.capacity {
            self.flush(transport)?;
        }
        if data.len() > self.capacity {
            transport.write(data)?;
            return transport.flush();
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Hand all queued bytes to the transport
    ///
    /// Queued bytes are dropped even if the write fails.
    pub fn flush<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = transport.write(&self.buf);
        self.buf.clear();
        result?;
        transport.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NandIoError;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        flushes: usize,
        fail: bool,
    }

    impl Transport for Recorder {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            if self.fail {
                return Err(NandIoError::Channel("write failed".into()));
            }
            self.writes.push(data.to_vec());
            Ok(())
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }

        fn read_nonblock(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_coalesces_until_flush() {
        let mut t = Recorder::default();
        let mut out = OutputBuffer::with_capacity(16);

        out.write(&mut t, &[1, 2, 3]).unwrap();
        out.write(&mut t, &[4, 5]).unwrap();
        assert!(t.writes.is_empty());
        assert_eq!(out.pending(), 5);

        out.flush(&mut t).unwrap();
        assert_eq!(t.writes, vec![vec![1, 2, 3, 4, 5]]);
        assert_eq!(t.flushes, 1);
        assert_eq!(out.pending(), 0);

        // Nothing queued, nothing written
        out.flush(&mut t).unwrap();
        assert_eq!(t.writes.len(), 1);
    }

    #[test]
    fn test_flushes_on_overflow() {
        let mut t = Recorder::default();
        let mut out = OutputBuffer::with_capacity(8);

        out.write(&mut t, &[0xAA; 6]).unwrap();
        out.write(&mut t, &[0xBB; 4]).unwrap();
        assert_eq!(t.writes, vec![vec![0xAA; 6]]);
        assert_eq!(out.pending(), 4);
    }

    #[test]
    fn test_oversized_bypasses_buffer() {
        let mut t = Recorder::default();
        let mut out = OutputBuffer::with_capacity(4);

        out.write(&mut t, &[1]).unwrap();
        out.write(&mut t, &[2; 10]).unwrap();
        assert_eq!(t.writes, vec![vec![1], vec![2; 10]]);
        assert_eq!(out.pending(), 0);
    }

    #[test]
    fn test_failed_flush_drops_data() {
        let mut t = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut out = OutputBuffer::with_capacity(16);

        out.write(&mut t, &[1, 2, 3]).unwrap();
        assert!(out.flush(&mut t).is_err());
        assert_eq!(out.pending(), 0);
    }
}
