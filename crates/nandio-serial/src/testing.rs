//! In-memory transports for tests

use std::collections::{HashMap, VecDeque};

use nandio_core::nand::{NandId, PageAddress};
use nandio_core::protocol::{
    payload_checksum, Command, NandConfig, PacketHeader, PingResponse, DATA_CRC_LEN,
    FRAME_HEADER_LEN, PROTOCOL_VERSION,
};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, IntoBytes};

use crate::error::{NandIoError, Result};
use crate::transport::Transport;

/// Everything written comes back on read
#[derive(Debug, Default)]
pub struct Loopback {
    data: VecDeque<u8>,
}

impl Loopback {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// XOR `mask` into the byte at `offset` of the unread data
    pub fn flip(&mut self, offset: usize, mask: u8) {
        self.data[offset] ^= mask;
    }

    /// Keep only the first `len` unread bytes
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }
}

fn pop_into(queue: &mut VecDeque<u8>, buf: &mut [u8]) -> usize {
    let n = buf.len().min(queue.len());
    for (dst, src) in buf.iter_mut().zip(queue.drain(..n)) {
        *dst = src;
    }
    n
}

impl Transport for Loopback {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data.extend(data);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(pop_into(&mut self.data, buf))
    }

    fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
        Ok(pop_into(&mut self.data, buf))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Corruption applied to one page response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip a payload bit after the CRC-32 was computed
    PayloadCrc,
    /// Corrupt the header CRC-16
    HeaderCrc,
    /// Stop sending halfway through the frame
    Truncate,
    /// Answer with the read-id opcode
    WrongCommand,
    /// Answer with an error report carrying this result code
    ErrorReport(u8),
}

/// Deterministic page contents served by [`FakeFirmware`]
pub fn page_data(page: u32, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (page as u8).wrapping_mul(31) ^ (i as u8) ^ ((page >> 8) as u8))
        .collect()
}

fn frame(cmd: Command, payload: &[u8]) -> Vec<u8> {
    let mut out = PacketHeader::new(cmd, payload.len() as u32).encode().to_vec();
    if !payload.is_empty() {
        out.extend_from_slice(payload);
        out.extend_from_slice(&payload_checksum(payload).to_le_bytes());
    }
    out
}

/// Emulates the reader firmware behind a serial link
#[derive(Debug)]
pub struct FakeFirmware {
    /// ID bytes returned by read-id
    pub id: NandId,
    /// Protocol version reported by ping
    pub version: u16,
    /// Whether bootloader and restart requests are honoured
    pub reboot_supported: bool,
    /// Fail every write with a channel error
    pub fail_writes: bool,
    /// Last configuration received
    pub config: Option<NandConfig>,
    /// Pages requested, in order
    pub requests: Vec<u32>,
    /// Commands received, in order
    pub commands: Vec<Command>,
    /// Faults to inject, consumed one per request of that page
    pub faults: HashMap<u32, VecDeque<Fault>>,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
}

impl FakeFirmware {
    pub fn new(id: NandId) -> Self {
        Self {
            id,
            version: PROTOCOL_VERSION,
            reboot_supported: false,
            fail_writes: false,
            config: None,
            requests: Vec::new(),
            commands: Vec::new(),
            faults: HashMap::new(),
            rx: Vec::new(),
            tx: VecDeque::new(),
        }
    }

    /// Queue faults for successive requests of `page`
    pub fn inject(&mut self, page: u32, faults: &[Fault]) {
        self.faults.entry(page).or_default().extend(faults);
    }

    fn respond(&mut self, cmd: Command, payload: &[u8]) {
        self.tx.extend(frame(cmd, payload));
    }

    fn process(&mut self) {
        loop {
            let Ok(header) = PacketHeader::parse(&self.rx) else {
                return;
            };
            let len = header.data_len.get() as usize;
            let total = FRAME_HEADER_LEN + if len > 0 { len + DATA_CRC_LEN } else { 0 };
            if self.rx.len() < total {
                return;
            }
            let request: Vec<u8> = self.rx.drain(..total).collect();
            let payload = &request[FRAME_HEADER_LEN..FRAME_HEADER_LEN + len];

            match Command::from_opcode(header.cmd.get()) {
                Some(cmd) => self.handle(cmd, payload),
                None => self.respond(Command::Error, &[1]),
            }
        }
    }

    fn handle(&mut self, cmd: Command, payload: &[u8]) {
        self.commands.push(cmd);
        match cmd {
            Command::Ping => {
                let ping = PingResponse {
                    device: 1,
                    version: U16::new(self.version),
                    serial_speed: U32::new(9600),
                    memory_free: U32::new(4096),
                };
                self.respond(cmd, ping.as_bytes());
            }
            Command::Bootloader | Command::Restart => {
                self.respond(cmd, &[self.reboot_supported as u8]);
                if !self.reboot_supported {
                    self.respond(Command::Error, &[4]);
                }
            }
            Command::ReadId => {
                let id = self.id;
                self.respond(cmd, id.as_bytes());
            }
            Command::SetConfig => {
                self.config = NandConfig::read_from_bytes(payload).ok();
            }
            Command::ReadPage => {
                let Some(page) = PageAddress::read_from_bytes(payload)
                    .ok()
                    .and_then(|addr| addr.page_index())
                else {
                    self.respond(Command::Error, &[2]);
                    return;
                };
                self.requests.push(page);

                let len = self.config.map_or(0, |c| c.raw_page_size.get() as usize);
                let data = page_data(page, len);
                let fault = self.faults.get_mut(&page).and_then(|q| q.pop_front());
                let mut out = frame(cmd, &data);
                match fault {
                    None => {}
                    Some(Fault::PayloadCrc) => out[FRAME_HEADER_LEN] ^= 0x01,
                    Some(Fault::HeaderCrc) => out[FRAME_HEADER_LEN - 1] ^= 0x80,
                    Some(Fault::Truncate) => out.truncate(out.len() / 2),
                    Some(Fault::WrongCommand) => out = frame(Command::ReadId, &data),
                    Some(Fault::ErrorReport(code)) => out = frame(Command::Error, &[code]),
                }
                self.tx.extend(out);
            }
            Command::WritePage | Command::EraseBlock | Command::Error => {
                self.respond(Command::Error, &[4]);
            }
        }
    }
}

impl Transport for FakeFirmware {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(NandIoError::Channel("device disconnected".into()));
        }
        self.rx.extend_from_slice(data);
        self.process();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(pop_into(&mut self.tx, buf))
    }

    fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
        Ok(pop_into(&mut self.tx, buf))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
