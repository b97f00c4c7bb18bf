//! Task-file register map, status bits and command opcodes.
//!
//! Register addresses carry both the chip-select group and the 3-bit
//! DA2..DA0 offset, packed as `group << 3 | offset`. Group 1 is the control
//! block (CS1- asserted), group 2 the command block (CS0- asserted); the two
//! bits are driven onto the CS pins as-is, so a set bit releases that
//! active-low line.

use bitflags::bitflags;

/// Chip-select group of the control block registers.
pub const CS_CONTROL: u8 = 1;
/// Chip-select group of the command block registers.
pub const CS_COMMAND: u8 = 2;

/// Task-file register, as seen from the host.
///
/// Several registers share an address and differ only in direction
/// (Error/Features, Status/Command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Alternate Status (read-only, does not acknowledge interrupts)
    AltStatus,
    /// 16-bit data port
    Data,
    /// Error (read-only)
    Error,
    /// Features (write-only)
    Features,
    /// Sector Count
    SectorCount,
    /// LBA bits 0..7
    LbaLow,
    /// LBA bits 8..15, ATAPI byte count low
    LbaMid,
    /// LBA bits 16..23, ATAPI byte count high
    LbaHigh,
    /// Device select / LBA bits 24..27
    Device,
    /// Status (read-only)
    Status,
    /// Command (write-only)
    Command,
}

impl Register {
    /// Combined chip-select group and offset.
    pub const fn address(self) -> u8 {
        match self {
            Self::AltStatus => CS_CONTROL << 3 | 6,
            Self::Data => CS_COMMAND << 3,
            Self::Error | Self::Features => CS_COMMAND << 3 | 1,
            Self::SectorCount => CS_COMMAND << 3 | 2,
            Self::LbaLow => CS_COMMAND << 3 | 3,
            Self::LbaMid => CS_COMMAND << 3 | 4,
            Self::LbaHigh => CS_COMMAND << 3 | 5,
            Self::Device => CS_COMMAND << 3 | 6,
            Self::Status | Self::Command => CS_COMMAND << 3 | 7,
        }
    }

    /// Value for the two CS pins.
    pub const fn chip_select(self) -> u8 {
        self.address() >> 3
    }

    /// Value for the DA2..DA0 pins.
    pub const fn offset(self) -> u8 {
        self.address() & 7
    }
}

bitflags! {
    /// ATA Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Error (check condition for ATAPI)
        const ERR = 1 << 0;
        /// Data request
        const DRQ = 1 << 3;
        /// Device fault
        const DF = 1 << 5;
        /// Device ready
        const DRDY = 1 << 6;
        /// Busy
        const BSY = 1 << 7;
    }
}

impl Status {
    /// Decode a register read; the upper byte of the bus is ignored.
    pub const fn from_register(raw: u16) -> Self {
        Self::from_bits_retain(raw as u8)
    }

    /// `!BSY && DRDY`
    pub const fn is_ready(self) -> bool {
        !self.contains(Self::BSY) && self.contains(Self::DRDY)
    }
}

/// ATA command opcodes used by the driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// DEVICE RESET (ATAPI soft reset)
    DeviceReset = 0x08,
    /// READ SECTOR(S), PIO, LBA28
    ReadSectors = 0x20,
    /// WRITE SECTOR(S), PIO, LBA28
    WriteSectors = 0x30,
    /// PACKET
    Packet = 0xA0,
    /// IDENTIFY PACKET DEVICE
    IdentifyPacketDevice = 0xA1,
    /// FLUSH CACHE
    FlushCache = 0xE7,
    /// IDENTIFY DEVICE
    IdentifyDevice = 0xEC,
    /// SET FEATURES
    SetFeatures = 0xEF,
}

/// SET FEATURES subcommands (written to the Features register).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Set transfer mode, mode value in Sector Count
    SetTransferMode = 0x03,
}

/// Transfer mode value for "PIO flow control transfer mode x".
pub const fn pio_flow_control_mode(mode: u8) -> u8 {
    0x08 | (mode & 0x07)
}

/// Device register bit selecting LBA addressing.
pub const DEVICE_LBA: u8 = 1 << 6;

/// Device register bit selecting device 1.
pub const DEVICE_DEV: u8 = 1 << 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_address_decode() {
        assert_eq!(Register::AltStatus.chip_select(), 1);
        assert_eq!(Register::AltStatus.offset(), 6);
        assert_eq!(Register::Data.address(), 0x10);
        assert_eq!(Register::Status.address(), Register::Command.address());
        assert_eq!(Register::Error.address(), Register::Features.address());
        assert_eq!(Register::Device.chip_select(), 2);
        assert_eq!(Register::Device.offset(), 6);
        assert_eq!(Register::LbaHigh.offset(), 5);
    }

    #[test]
    fn test_status_ready() {
        assert!(Status::DRDY.is_ready());
        assert!(!(Status::DRDY | Status::BSY).is_ready());
        assert!(!Status::empty().is_ready());
        assert_eq!(Status::from_register(0xFF58), Status::DRDY | Status::DRQ | Status::from_bits_retain(0x10));
    }

    #[test]
    fn test_transfer_mode_value() {
        assert_eq!(pio_flow_control_mode(4), 0x0C);
        assert_eq!(pio_flow_control_mode(3), 0x0B);
    }
}
