//! nandio session
//!
//! This module provides the `NandIo` struct that drives a reader over a
//! [`PacketLink`]: ping, reboot requests and chip identification. Page
//! reads live in [`crate::read`].

use nandio_core::catalog::ChipDatabase;
use nandio_core::nand::{Geometry, NandId};
use nandio_core::protocol::{
    Command, DeviceKind, NandConfig, PingResponse, SupportResponse, PROTOCOL_VERSION,
};

use crate::error::{NandIoError, Result};
use crate::link::PacketLink;
use crate::read::PAGE_READ_RETRIES;
use crate::transport::Transport;

/// Session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Enable the reader's pull-ups on the NAND bus
    pub pull_up: bool,
    /// Attempts per page before a read is aborted
    pub retries: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            pull_up: false,
            retries: PAGE_READ_RETRIES,
        }
    }
}

/// Information reported by ping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Reader hardware
    pub kind: DeviceKind,
    /// Protocol version
    pub version: u16,
    /// Serial speed configured on the device
    pub serial_speed: u32,
    /// Free RAM on the device in bytes
    pub memory_free: u32,
}

impl From<PingResponse> for DeviceInfo {
    fn from(ping: PingResponse) -> Self {
        Self {
            kind: DeviceKind::from_id(ping.device),
            version: ping.version.get(),
            serial_speed: ping.serial_speed.get(),
            memory_free: ping.memory_free.get(),
        }
    }
}

/// An identified chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Raw ID bytes
    pub id: NandId,
    /// Vendor name from the catalog
    pub vendor: String,
    /// Device name from the catalog
    pub name: String,
    /// Decoded geometry
    pub geometry: Geometry,
}

/// nandio reader session
pub struct NandIo<T: Transport> {
    link: PacketLink<T>,
    options: SessionOptions,
    identity: Option<Identity>,
    closed: bool,
}

impl<T: Transport> NandIo<T> {
    /// Create a session over `transport`
    ///
    /// Stale input left by an earlier session is discarded.
    pub fn new(transport: T, options: SessionOptions) -> Result<Self> {
        let mut session = Self {
            link: PacketLink::new(transport),
            options,
            identity: None,
            closed: false,
        };
        session.guard(|s| s.link.drain().map(|_| ()))?;
        Ok(session)
    }

    /// Session settings
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The identified chip, if any
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Geometry of the identified chip
    pub fn geometry(&self) -> Option<&Geometry> {
        self.identity.as_ref().map(|i| &i.geometry)
    }

    /// Whether a channel failure closed the session
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consume the session and return the transport
    pub fn into_inner(self) -> T {
        self.link.into_inner()
    }

    /// Query the reader and check its protocol version
    pub fn ping(&mut self) -> Result<DeviceInfo> {
        let info: DeviceInfo = self.guard(|s| {
            s.link.send(Command::Ping, &[])?;
            s.link.receive::<PingResponse>(Command::Ping)
        })?
        .into();

        if info.version != PROTOCOL_VERSION {
            return Err(NandIoError::UnsupportedVersion(info.version));
        }
        log::debug!("nandio: {} protocol version {}", info.kind, info.version);
        Ok(info)
    }

    /// Ask the reader to reboot into its bootloader
    ///
    /// Returns whether the reader supports it. A reader that complies
    /// drops off the bus, so the session is closed afterwards.
    pub fn enter_bootloader(&mut self) -> Result<bool> {
        self.reboot(Command::Bootloader)
    }

    /// Ask the reader to restart its firmware
    ///
    /// Returns whether the reader supports it. A reader that complies
    /// drops off the bus, so the session is closed afterwards.
    pub fn restart(&mut self) -> Result<bool> {
        self.reboot(Command::Restart)
    }

    /// Read the chip ID and push the matching configuration
    ///
    /// The reader waits for a configuration after every read-id, so one is
    /// always sent: all zero when the chip is not in `db` or its geometry
    /// does not decode.
    pub fn identify(&mut self, db: &ChipDatabase) -> Result<&Identity> {
        self.identity = None;

        let id = self.guard(|s| {
            s.link.send(Command::ReadId, &[])?;
            s.link.receive::<NandId>(Command::ReadId)
        })?;
        log::info!("NAND ID: {}", id);

        let decoded = match db.find(id.mf_id, id.dev_id) {
            Some(chip) => chip.decode(&id).map(|g| (chip.vendor.clone(), chip.name.clone(), g)),
            None => Err(nandio_core::Error::GeometryNotFound {
                manufacturer: id.mf_id,
                device: id.dev_id,
            }),
        };

        let (vendor, name, geometry) = match decoded {
            Ok(found) => found,
            Err(e) => {
                match db.vendor_name(id.mf_id) {
                    Some(vendor) => log::warn!("{} device 0x{:02X}: {}", vendor, id.dev_id, e),
                    None => log::warn!("{}", e),
                }
                let zero = NandConfig::new(0, 0, false);
                self.guard(|s| s.link.send_struct(Command::SetConfig, &zero))?;
                return Err(match e {
                    nandio_core::Error::GeometryNotFound { .. } => NandIoError::GeometryNotFound(id),
                    other => other.into(),
                });
            }
        };

        let config = geometry.config(self.options.pull_up);
        self.guard(|s| s.link.send_struct(Command::SetConfig, &config))?;
        log::info!(
            "Found {} {} ({} pages of {} bytes)",
            vendor,
            name,
            geometry.pages,
            geometry.raw_page_size
        );

        Ok(self.identity.insert(Identity {
            id,
            vendor,
            name,
            geometry,
        }))
    }

    pub(crate) fn link(&mut self) -> &mut PacketLink<T> {
        &mut self.link
    }

    /// Run `op` unless the session is closed, closing it on channel failure
    pub(crate) fn guard<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.closed {
            return Err(NandIoError::SessionClosed);
        }
        let result = op(self);
        if let Err(e) = &result {
            if e.is_channel_failure() {
                log::error!("nandio: {}, closing session", e);
                self.closed = true;
            }
        }
        result
    }

    fn reboot(&mut self, cmd: Command) -> Result<bool> {
        let supported = self.guard(|s| {
            s.link.send(cmd, &[])?;
            let resp: SupportResponse = s.link.receive(cmd)?;
            // An unsupported request is followed by an error report
            s.link.drain()?;
            Ok(resp.supported != 0)
        })?;

        if supported {
            log::info!("nandio: device accepted {}", cmd.name());
            self.closed = true;
        } else {
            log::warn!("nandio: device does not support {}", cmd.name());
        }
        Ok(supported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFirmware;
    use nandio_core::nand::PageAddrType;

    fn session(id: NandId) -> NandIo<FakeFirmware> {
        NandIo::new(FakeFirmware::new(id), SessionOptions::default()).unwrap()
    }

    #[test]
    fn test_ping() {
        let mut nio = session(NandId::default());
        let info = nio.ping().unwrap();
        assert_eq!(info.kind, DeviceKind::TeensyPlusPlus2);
        assert_eq!(info.version, 1);
        assert_eq!(info.serial_speed, 9600);
        assert_eq!(info.memory_free, 4096);
    }

    #[test]
    fn test_ping_version_mismatch() {
        let mut fw = FakeFirmware::new(NandId::default());
        fw.version = 2;
        let mut nio = NandIo::new(fw, SessionOptions::default()).unwrap();
        assert!(matches!(
            nio.ping(),
            Err(NandIoError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_identify_known() {
        let db = ChipDatabase::with_builtin().unwrap();
        let options = SessionOptions {
            pull_up: true,
            ..Default::default()
        };
        let fw = FakeFirmware::new(NandId::new(0xAD, 0x73, 0, 0, 0));
        let mut nio = NandIo::new(fw, options).unwrap();

        let identity = nio.identify(&db).unwrap();
        assert_eq!(identity.name, "HY27US08281A");
        assert_eq!(identity.geometry.raw_page_size, 528);
        assert_eq!(identity.geometry.page_addr_type, PageAddrType::ThreeByte);

        let fw = nio.into_inner();
        let config = fw.config.unwrap();
        assert_eq!(config.raw_page_size.get(), 528);
        assert_eq!(config.read_delay_us.get(), 1);
        assert_eq!(config.pull_up, 1);
        assert_eq!(fw.commands, vec![Command::ReadId, Command::SetConfig]);
    }

    #[test]
    fn test_identify_unknown() {
        let db = ChipDatabase::with_builtin().unwrap();
        let id = NandId::new(0x2C, 0xF1, 0x80, 0x95, 0x02);
        let mut nio = session(id);

        match nio.identify(&db) {
            Err(NandIoError::GeometryNotFound(raw)) => assert_eq!(raw, id),
            other => panic!("unexpected {:?}", other),
        }
        assert!(nio.geometry().is_none());

        // The reader still gets released with an empty configuration
        let fw = nio.into_inner();
        assert_eq!(fw.config, Some(NandConfig::new(0, 0, false)));
    }

    #[test]
    fn test_identify_known_vendor_unknown_device() {
        let db = ChipDatabase::with_builtin().unwrap();
        let mut nio = session(NandId::new(0xEC, 0xF1, 0, 0, 0));
        assert!(matches!(
            nio.identify(&db),
            Err(NandIoError::GeometryNotFound(_))
        ));
    }

    #[test]
    fn test_reboot_unsupported() {
        let mut nio = session(NandId::default());
        assert!(!nio.enter_bootloader().unwrap());
        assert!(!nio.is_closed());

        // The trailing error report must not leak into the next exchange
        assert!(nio.ping().is_ok());
    }

    #[test]
    fn test_restart_supported() {
        let mut fw = FakeFirmware::new(NandId::default());
        fw.reboot_supported = true;
        let mut nio = NandIo::new(fw, SessionOptions::default()).unwrap();
        assert!(nio.restart().unwrap());
        assert!(nio.is_closed());
        assert!(matches!(nio.ping(), Err(NandIoError::SessionClosed)));
    }

    #[test]
    fn test_channel_failure_closes_session() {
        let mut nio = session(NandId::default());
        nio.link().transport_mut().fail_writes = true;
        assert!(matches!(nio.ping(), Err(NandIoError::Channel(_))));
        assert!(nio.is_closed());

        nio.link().transport_mut().fail_writes = false;
        assert!(matches!(nio.ping(), Err(NandIoError::SessionClosed)));
    }
}
