//! ATAPI packet commands.
//!
//! A packet command is an ATA PACKET (A0h) whose first data phase carries a
//! 12-byte SCSI CDB from host to device. Any response follows as one or
//! more DRQ data phases; in each, the device puts the number of bytes it is
//! about to transfer in the LBA Mid/High (byte count) registers. The host
//! announces the largest phase it accepts through the same registers when
//! issuing PACKET.
//!
//! When a command completes with ERR set ("check condition") the upper
//! nibble of the Error register is the SCSI sense key.

pub mod cdb;

pub use cdb::{Cdb, ScsiOpcode, SenseKey, CDB_LEN, CDB_WORDS};

use crate::device::{Device, DeviceSelector};
use crate::error::{AtaError, Result};
use crate::lanes::Lanes;
use crate::protocol::AtaController;
use crate::regs::{Command, Register, Status};

/// Standard INQUIRY data length.
pub const INQUIRY_LEN: usize = 36;

/// Default logical block size of optical media.
pub const CD_BLOCK_SIZE: usize = 2048;

/// Largest even byte count the byte count registers can announce.
pub const MAX_BYTE_COUNT: u16 = 0xFFFE;

const BOUNCE_WORDS: usize = 256;

/// Standard INQUIRY response.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InquiryData {
    bytes: [u8; INQUIRY_LEN],
}

impl InquiryData {
    pub const fn from_bytes(bytes: [u8; INQUIRY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; INQUIRY_LEN] {
        &self.bytes
    }

    /// Peripheral device type (05h = CD/DVD).
    pub fn peripheral_device_type(&self) -> u8 {
        self.bytes[0] & 0x1F
    }

    /// RMB bit.
    pub fn is_removable(&self) -> bool {
        self.bytes[1] & 0x80 != 0
    }

    pub fn version(&self) -> u8 {
        self.bytes[2]
    }

    pub fn vendor_id(&self) -> &[u8] {
        trim(&self.bytes[8..16])
    }

    pub fn product_id(&self) -> &[u8] {
        trim(&self.bytes[16..32])
    }

    pub fn product_revision(&self) -> &[u8] {
        trim(&self.bytes[32..36])
    }
}

impl core::fmt::Debug for InquiryData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn text(b: &[u8]) -> &str {
            core::str::from_utf8(b).unwrap_or("?")
        }

        f.debug_struct("InquiryData")
            .field("type", &self.peripheral_device_type())
            .field("removable", &self.is_removable())
            .field("vendor", &text(self.vendor_id()))
            .field("product", &text(self.product_id()))
            .field("revision", &text(self.product_revision()))
            .finish()
    }
}

fn trim(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    &field[..end]
}

impl<L: Lanes> AtaController<L> {
    /// Issue PACKET and send `cdb`.
    ///
    /// `byte_limit` is the largest data phase the host accepts; it is
    /// rounded down to an even count.
    pub fn send_packet(&mut self, device: Device, byte_limit: u16, cdb: &Cdb) -> Result<()> {
        let limit = byte_limit & !1;

        self.write_register(Register::Features, 0);
        self.write_register(Register::LbaMid, limit & 0xFF);
        self.write_register(Register::LbaHigh, limit >> 8);
        self.select(DeviceSelector::device_only(device));
        self.write_command(Command::Packet);

        log::debug!("atapi: {} packet {:#04x}", device, cdb.opcode());
        self.pio_write(&cdb.to_words())?;

        // settle before the first status sample
        self.alt_status();
        Ok(())
    }

    /// Byte count announced for the current data phase.
    pub fn byte_count(&mut self) -> u16 {
        let low = self.read_register(Register::LbaMid) & 0xFF;
        let high = self.read_register(Register::LbaHigh) & 0xFF;
        high << 8 | low
    }

    /// Run a packet command with a device-to-host data phase.
    ///
    /// Data beyond `out.len()` is read and discarded. Returns the number of
    /// bytes stored in `out`.
    pub fn packet_read(&mut self, device: Device, cdb: &Cdb, out: &mut [u8]) -> Result<usize> {
        let limit = out.len().min(MAX_BYTE_COUNT as usize) as u16;
        self.send_packet(device, limit, cdb)?;

        let mut filled = 0;
        let mut bounce = [0u16; BOUNCE_WORDS];

        loop {
            let status = self.wait_not_busy()?;

            if !status.contains(Status::DRQ) {
                if status.contains(Status::ERR) {
                    return Err(self.device_error(status));
                }
                return Ok(filled);
            }

            let bytes = self.byte_count() as usize;
            if bytes == 0 {
                // DRQ without a byte count never drains
                return Err(self.device_error(status));
            }

            let mut remaining = bytes.div_ceil(2);
            while remaining > 0 {
                let chunk = &mut bounce[..remaining.min(BOUNCE_WORDS)];
                self.engine_mut().read_burst(chunk);
                remaining -= chunk.len();

                for &word in chunk.iter() {
                    for byte in word.to_le_bytes() {
                        if filled < out.len() {
                            out[filled] = byte;
                            filled += 1;
                        }
                    }
                }
            }

            self.alt_status();
        }
    }

    /// Run a packet command with no data phase.
    pub fn packet_command(&mut self, device: Device, cdb: &Cdb) -> Result<Status> {
        self.send_packet(device, 0, cdb)?;
        self.wait_not_busy()
    }

    /// Sense key of the last failed command.
    pub fn sense_key(&mut self) -> Option<SenseKey> {
        SenseKey::from_error_register(self.error_register())
    }

    /// TEST UNIT READY; `false` on check condition (see [`Self::sense_key`]).
    ///
    /// A device that rejects the packet before taking the CDB is reported
    /// the same way.
    pub fn test_unit_ready(&mut self, device: Device) -> Result<bool> {
        match self.packet_command(device, &Cdb::test_unit_ready()) {
            Ok(status) => Ok(!status.contains(Status::ERR)),
            Err(AtaError::Device { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Standard INQUIRY.
    pub fn inquiry(&mut self, device: Device) -> Result<InquiryData> {
        let mut bytes = [0u8; INQUIRY_LEN];
        let cdb = Cdb::inquiry(INQUIRY_LEN as u16);
        self.packet_read(device, &cdb, &mut bytes)?;
        Ok(InquiryData::from_bytes(bytes))
    }

    /// READ(10) of `blocks` blocks of `block_size` bytes into `out`.
    ///
    /// Returns the number of bytes received.
    ///
    /// # Panics
    /// If `out` is shorter than `blocks * block_size`.
    pub fn read_10(
        &mut self,
        device: Device,
        lba: u32,
        blocks: u16,
        out: &mut [u8],
        block_size: usize,
    ) -> Result<usize> {
        let len = blocks as usize * block_size;
        assert!(out.len() >= len, "buffer of {} bytes for {} byte read", out.len(), len);

        self.packet_read(device, &Cdb::read10(lba, blocks), &mut out[..len])
    }
}
