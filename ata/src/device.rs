//! Device addressing: which device on the cable, and where on it.

use core::fmt;

use crate::regs::{DEVICE_DEV, DEVICE_LBA};

/// Sectors per READ/WRITE SECTOR(S) command; a count of 0 on the wire means this.
pub const MAX_SECTORS_PER_COMMAND: u16 = 256;

/// Bytes per ATA sector.
pub const SECTOR_SIZE: usize = 512;

/// 16-bit words per ATA sector.
pub const SECTOR_WORDS: usize = SECTOR_SIZE / 2;

/// One of the two devices sharing a cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Device {
    /// Device 0 ("master")
    Device0 = 0,
    /// Device 1 ("slave")
    Device1 = 1,
}

impl Device {
    /// Both devices, in select order.
    pub const ALL: [Device; 2] = [Device::Device0, Device::Device1];

    /// Device for a numeric index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Device0),
            1 => Some(Self::Device1),
            _ => None,
        }
    }

    /// Numeric index, 0 or 1.
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {}", self.index())
    }
}

/// Device class, as told by the signature a reset leaves in LBA Mid/High.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// ATA device (signature 00h/00h, or DEVICE RESET aborted)
    Ata,
    /// ATAPI packet device (signature 14h/EBh)
    Atapi,
}

impl DeviceKind {
    /// LBA Mid and LBA High after a reset of a packet device.
    pub const ATAPI_SIGNATURE: (u8, u8) = (0x14, 0xEB);

    /// Classify a reset signature.
    pub const fn from_signature(lba_mid: u8, lba_high: u8) -> Self {
        if lba_mid == Self::ATAPI_SIGNATURE.0 && lba_high == Self::ATAPI_SIGNATURE.1 {
            Self::Atapi
        } else {
            Self::Ata
        }
    }
}

/// A 28-bit logical block address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lba28(u32);

impl Lba28 {
    /// Highest addressable block.
    pub const MAX: u32 = 0x0FFF_FFFF;

    /// Wrap `lba`, or `None` if it needs LBA48.
    pub const fn new(lba: u32) -> Option<Self> {
        if lba <= Self::MAX {
            Some(Self(lba))
        } else {
            None
        }
    }

    /// Raw value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// LBA Low register value (bits 0..7).
    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    /// LBA Mid register value (bits 8..15).
    pub const fn mid(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// LBA High register value (bits 16..23).
    pub const fn high(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Bits 24..27, carried in the Device register.
    pub const fn top_nibble(self) -> u8 {
        ((self.0 >> 24) & 0xF) as u8
    }

    /// Block `count` blocks further on, if still addressable.
    pub const fn offset(self, count: u32) -> Option<Self> {
        match self.0.checked_add(count) {
            Some(lba) => Self::new(lba),
            None => None,
        }
    }
}

impl TryFrom<u64> for Lba28 {
    type Error = crate::error::AtaError;

    fn try_from(lba: u64) -> Result<Self, Self::Error> {
        u32::try_from(lba)
            .ok()
            .and_then(Lba28::new)
            .ok_or(crate::error::AtaError::LbaOutOfRange)
    }
}

/// Addressing carried in the Device register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// CHS addressing (or no address at all); the low nibble is the head.
    Chs {
        /// Head number, 0..15
        head: u8,
    },
    /// LBA28 addressing; the low nibble is LBA bits 24..27.
    Lba(Lba28),
}

/// Value for the Device register, built per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSelector {
    /// Target device
    pub device: Device,
    /// Addressing mode
    pub mode: AddressMode,
}

impl DeviceSelector {
    /// Select a device for a command that carries no address.
    pub const fn device_only(device: Device) -> Self {
        Self {
            device,
            mode: AddressMode::Chs { head: 0 },
        }
    }

    /// Select a device for an LBA28 command.
    pub const fn lba(device: Device, lba: Lba28) -> Self {
        Self {
            device,
            mode: AddressMode::Lba(lba),
        }
    }

    /// Encoded register byte.
    pub const fn to_register(self) -> u8 {
        let dev = if matches!(self.device, Device::Device1) {
            DEVICE_DEV
        } else {
            0
        };

        match self.mode {
            AddressMode::Chs { head } => dev | (head & 0xF),
            AddressMode::Lba(lba) => DEVICE_LBA | dev | lba.top_nibble(),
        }
    }
}

/// Sector Count register value for `count` sectors (256 encodes as 0).
pub const fn sector_count_register(count: u16) -> u8 {
    (count & 0xFF) as u8
}

/// Sector count described by a Sector Count register value.
pub const fn sector_count_from_register(raw: u8) -> u16 {
    if raw == 0 {
        MAX_SECTORS_PER_COMMAND
    } else {
        raw as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lba_range() {
        assert!(Lba28::new(0).is_some());
        assert!(Lba28::new(Lba28::MAX).is_some());
        assert!(Lba28::new(Lba28::MAX + 1).is_none());
        assert!(Lba28::try_from(1u64 << 32).is_err());
        assert_eq!(Lba28::new(Lba28::MAX).unwrap().offset(1), None);
    }

    #[test]
    fn test_lba_split() {
        let lba = Lba28::new(0x0ABC_DEF1).unwrap();
        assert_eq!(lba.low(), 0xF1);
        assert_eq!(lba.mid(), 0xDE);
        assert_eq!(lba.high(), 0xBC);
        assert_eq!(lba.top_nibble(), 0xA);
    }

    #[test]
    fn test_lba_device_byte() {
        for device in Device::ALL {
            for raw in [0u32, 0x0100_0000, 0x0567_89AB, Lba28::MAX] {
                let lba = Lba28::new(raw).unwrap();
                let value = DeviceSelector::lba(device, lba).to_register();

                assert_ne!(value & (1 << 6), 0, "LBA bit must be set");
                assert_eq!(value & (1 << 4) != 0, device == Device::Device1);
                assert_eq!(value & 0xF, ((raw >> 24) & 0xF) as u8);
            }
        }
    }

    #[test]
    fn test_device_only_byte() {
        assert_eq!(DeviceSelector::device_only(Device::Device0).to_register(), 0x00);
        assert_eq!(DeviceSelector::device_only(Device::Device1).to_register(), 0x10);
    }

    #[test]
    fn test_sector_count_encoding() {
        assert_eq!(sector_count_register(256), 0);
        assert_eq!(sector_count_register(1), 1);
        assert_eq!(sector_count_register(255), 255);
        assert_eq!(sector_count_from_register(0), 256);
        assert_eq!(sector_count_from_register(7), 7);
    }

    #[test]
    fn test_device_index() {
        assert_eq!(Device::from_index(1), Some(Device::Device1));
        assert_eq!(Device::from_index(2), None);
        assert_eq!(Device::Device1.index(), 1);
    }

    #[test]
    fn test_reset_signature() {
        assert_eq!(DeviceKind::from_signature(0x14, 0xEB), DeviceKind::Atapi);
        assert_eq!(DeviceKind::from_signature(0x00, 0x00), DeviceKind::Ata);
        assert_eq!(DeviceKind::from_signature(0x14, 0x00), DeviceKind::Ata);
        assert_eq!(DeviceKind::from_signature(0x3C, 0xC3), DeviceKind::Ata);
    }
}
