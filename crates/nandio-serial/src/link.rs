//! Framed packet link
//!
//! Builds and checks frames on top of a [`Transport`]. The link never
//! retries on its own: every failure is returned to the caller, which
//! decides whether to re-request.

use nandio_core::protocol::{
    payload_checksum, Command, CommandResult, ErrorReport, PacketHeader, DATA_CRC_LEN,
    FRAME_HEADER_LEN, HEADER_LEN,
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::buffer::OutputBuffer;
use crate::error::{NandIoError, Result};
use crate::transport::Transport;

/// Packet link over a transport
pub struct PacketLink<T: Transport> {
    transport: T,
    out: OutputBuffer,
}

impl<T: Transport> PacketLink<T> {
    /// Wrap a transport with the default output buffer
    pub fn new(transport: T) -> Self {
        Self::with_buffer(transport, OutputBuffer::new())
    }

    /// Wrap a transport with a specific output buffer
    pub fn with_buffer(transport: T, out: OutputBuffer) -> Self {
        Self { transport, out }
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the link and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send a frame carrying `payload`
    ///
    /// An empty payload produces a header-only frame.
    pub fn send(&mut self, cmd: Command, payload: &[u8]) -> Result<()> {
        let data_len = u32::try_from(payload.len()).map_err(|_| {
            NandIoError::InvalidParameter(format!("payload of {} bytes", payload.len()))
        })?;

        let header = PacketHeader::new(cmd, data_len);
        self.out.write(&mut self.transport, &header.encode())?;
        if !payload.is_empty() {
            self.out.write(&mut self.transport, payload)?;
            self.out
                .write(&mut self.transport, &payload_checksum(payload).to_le_bytes())?;
        }
        self.out.flush(&mut self.transport)?;

        log::trace!("nandio: sent {} with {} payload bytes", cmd, data_len);
        Ok(())
    }

    /// Send a frame carrying a wire structure
    pub fn send_struct<S: IntoBytes + Immutable>(&mut self, cmd: Command, payload: &S) -> Result<()> {
        self.send(cmd, payload.as_bytes())
    }

    /// Receive a response carrying a wire structure
    pub fn receive<R: FromBytes + KnownLayout + Immutable>(&mut self, cmd: Command) -> Result<R> {
        let mut buf = vec![0u8; core::mem::size_of::<R>()];
        self.receive_raw(cmd, &mut buf)?;
        R::read_from_bytes(&buf).map_err(|_| {
            NandIoError::Core(nandio_core::Error::BufferTooSmall {
                expected: core::mem::size_of::<R>(),
                actual: buf.len(),
            })
        })
    }

    /// Receive a response for `cmd` whose payload fills `buf` exactly
    ///
    /// Pending output is flushed first. An error report from the device
    /// is returned as [`NandIoError::DeviceError`].
    pub fn receive_raw(&mut self, cmd: Command, buf: &mut [u8]) -> Result<()> {
        self.out.flush(&mut self.transport)?;

        let mut frame = [0u8; FRAME_HEADER_LEN];
        self.read_exact(&mut frame)?;
        let header = PacketHeader::parse(&frame)?;

        let opcode = header.cmd.get();
        let error_report = opcode == Command::Error.opcode() && cmd != Command::Error;
        if !header.has_valid_magic() || (opcode != cmd.opcode() && !error_report) {
            return Err(NandIoError::ProtocolDesync {
                expected: cmd,
                magic: header.magic.get(),
                cmd: opcode,
            });
        }

        let received = u16::from_le_bytes([frame[HEADER_LEN], frame[HEADER_LEN + 1]]);
        let computed = header.checksum();
        if received != computed {
            return Err(NandIoError::HeaderCrc { received, computed });
        }

        let declared = header.data_len.get();
        if error_report {
            let mut report = ErrorReport { result: 0 };
            self.check_len(report.as_bytes().len(), declared)?;
            self.read_payload(report.as_mut_bytes())?;
            let result = CommandResult::from_code(report.result);
            log::debug!("nandio: device reported {} for {}", result, cmd);
            return Err(NandIoError::DeviceError {
                command: cmd,
                result,
            });
        }

        self.check_len(buf.len(), declared)?;
        if !buf.is_empty() {
            self.read_payload(buf)?;
        }

        log::trace!("nandio: received {} with {} payload bytes", cmd, declared);
        Ok(())
    }

    /// Discard any input waiting on the channel
    ///
    /// Returns the number of bytes dropped.
    pub fn drain(&mut self) -> Result<usize> {
        let mut buf = [0u8; 512];
        let mut total = 0;
        for _ in 0..1024 {
            let n = self.transport.read_nonblock(&mut buf, 10)?;
            if n == 0 {
                break;
            }
            total += n;
        }
        if total > 0 {
            log::debug!("nandio: drained {} stale bytes", total);
        }
        Ok(total)
    }

    /// Flush queued output
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush(&mut self.transport)
    }

    fn check_len(&self, expected: usize, declared: u32) -> Result<()> {
        if declared as usize != expected {
            return Err(NandIoError::LengthMismatch { expected, declared });
        }
        Ok(())
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_exact(buf)?;

        let mut crc = [0u8; DATA_CRC_LEN];
        self.read_exact(&mut crc)?;
        let received = u32::from_le_bytes(crc);
        let computed = payload_checksum(buf);
        if received != computed {
            return Err(NandIoError::PayloadCrc { received, computed });
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let received = self.transport.read(buf)?;
        if received < buf.len() {
            return Err(NandIoError::ShortRead {
                expected: buf.len(),
                received,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Loopback;
    use nandio_core::nand::NandId;
    use nandio_core::protocol::NandConfig;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
    }

    #[test]
    fn test_round_trip_lengths() {
        let mut link = PacketLink::new(Loopback::default());
        let lengths = (0..=4320).step_by(97).chain([1, 2, 512, 528, 2048, 2112, 4096, 4320]);
        for len in lengths {
            let data = pattern(len);
            link.send(Command::ReadPage, &data).unwrap();

            let mut out = vec![0u8; len];
            link.receive_raw(Command::ReadPage, &mut out).unwrap();
            assert_eq!(out, data, "length {}", len);
            assert!(link.transport().is_empty());
        }
    }

    #[test]
    fn test_header_only_frame() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::Ping, &[]).unwrap();
        assert_eq!(link.transport().len(), FRAME_HEADER_LEN);
        link.receive_raw(Command::Ping, &mut []).unwrap();
    }

    #[test]
    fn test_struct_round_trip() {
        let mut link = PacketLink::new(Loopback::default());
        let cfg = NandConfig::new(2112, 25, true);
        link.send_struct(Command::SetConfig, &cfg).unwrap();
        let back: NandConfig = link.receive(Command::SetConfig).unwrap();
        assert_eq!(back, cfg);

        let id = NandId::new(0xC8, 0xDA, 0x90, 0x95, 0x44);
        link.send_struct(Command::ReadId, &id).unwrap();
        assert_eq!(link.receive::<NandId>(Command::ReadId).unwrap(), id);
    }

    #[test]
    fn test_header_bit_flip() {
        // data_len byte and both header CRC bytes
        for (offset, bit) in [(6, 0x01), (8, 0x80), (10, 0x04), (11, 0x40)] {
            let mut link = PacketLink::new(Loopback::default());
            link.send(Command::ReadPage, &pattern(16)).unwrap();
            link.transport_mut().flip(offset, bit);

            let mut out = [0u8; 16];
            let err = link.receive_raw(Command::ReadPage, &mut out).unwrap_err();
            assert!(
                matches!(err, NandIoError::HeaderCrc { .. }),
                "offset {}: {:?}",
                offset,
                err
            );
        }
    }

    #[test]
    fn test_payload_bit_flip() {
        // First payload byte, last payload byte, payload CRC
        for offset in [12, 12 + 527, 12 + 528 + 2] {
            let mut link = PacketLink::new(Loopback::default());
            link.send(Command::ReadPage, &pattern(528)).unwrap();
            link.transport_mut().flip(offset, 0x10);

            let mut out = vec![0u8; 528];
            let err = link.receive_raw(Command::ReadPage, &mut out).unwrap_err();
            match err {
                NandIoError::PayloadCrc { received, computed } => assert_ne!(received, computed),
                other => panic!("offset {}: {:?}", offset, other),
            }
        }
    }

    #[test]
    fn test_desync() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::ReadId, &[0; 5]).unwrap();
        let err = link.receive_raw(Command::ReadPage, &mut [0; 5]).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::ProtocolDesync {
                expected: Command::ReadPage,
                cmd: 0x30,
                ..
            }
        ));

        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::Ping, &[]).unwrap();
        link.transport_mut().flip(0, 0x01);
        let err = link.receive_raw(Command::Ping, &mut []).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::ProtocolDesync {
                magic: 0xDEAD_C0DF,
                ..
            }
        ));
    }

    #[test]
    fn test_short_read() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::ReadPage, &pattern(64)).unwrap();
        link.transport_mut().truncate(FRAME_HEADER_LEN + 10);

        let mut out = [0u8; 64];
        let err = link.receive_raw(Command::ReadPage, &mut out).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::ShortRead {
                expected: 64,
                received: 10
            }
        ));

        // Nothing at all
        let err = link.receive_raw(Command::Ping, &mut []).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::ShortRead {
                expected: FRAME_HEADER_LEN,
                received: 0
            }
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::ReadPage, &pattern(512)).unwrap();
        let mut out = vec![0u8; 528];
        let err = link.receive_raw(Command::ReadPage, &mut out).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::LengthMismatch {
                expected: 528,
                declared: 512
            }
        ));
    }

    #[test]
    fn test_error_report() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::Error, &[4]).unwrap();
        let err = link.receive_raw(Command::Bootloader, &mut [0]).unwrap_err();
        assert!(matches!(
            err,
            NandIoError::DeviceError {
                command: Command::Bootloader,
                result: CommandResult::NotSupported
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_drain() {
        let mut link = PacketLink::new(Loopback::default());
        link.send(Command::ReadPage, &pattern(1000)).unwrap();
        assert_eq!(link.drain().unwrap(), FRAME_HEADER_LEN + 1000 + DATA_CRC_LEN);
        assert!(link.transport().is_empty());
        assert_eq!(link.drain().unwrap(), 0);
    }
}
