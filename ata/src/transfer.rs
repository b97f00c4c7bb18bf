//! Sector transfers, IDENTIFY and timing negotiation.

use crate::device::{
    sector_count_register, Device, DeviceKind, DeviceSelector, Lba28, MAX_SECTORS_PER_COMMAND,
    SECTOR_SIZE, SECTOR_WORDS,
};
use crate::error::Result;
use crate::identify::{ChecksumStatus, IdentifyData, IDENTIFY_WORDS};
use crate::lanes::Lanes;
use crate::protocol::AtaController;
use crate::regs::{pio_flow_control_mode, Command, Feature, Register};
use crate::timing::PioTiming;

/// Which IDENTIFY variant to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyCommand {
    /// IDENTIFY DEVICE (ECh), for ATA devices
    Device,
    /// IDENTIFY PACKET DEVICE (A1h), for ATAPI devices
    PacketDevice,
}

impl IdentifyCommand {
    /// Opcode written to the Command register.
    pub const fn command(self) -> Command {
        match self {
            Self::Device => Command::IdentifyDevice,
            Self::PacketDevice => Command::IdentifyPacketDevice,
        }
    }

    /// The variant a device of `kind` answers.
    pub const fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Ata => Self::Device,
            DeviceKind::Atapi => Self::PacketDevice,
        }
    }
}

impl From<DeviceKind> for IdentifyCommand {
    fn from(kind: DeviceKind) -> Self {
        Self::for_kind(kind)
    }
}

/// Addressable size of an ATA device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// Number of LBA28-addressable sectors
    pub sectors: u32,
    /// Bytes per sector (always 512)
    pub sector_size: usize,
}

impl Capacity {
    /// Total size in bytes.
    pub const fn bytes(&self) -> u64 {
        self.sectors as u64 * self.sector_size as u64
    }
}

fn check_transfer(count: u16, words: usize) {
    assert!(
        (1..=MAX_SECTORS_PER_COMMAND).contains(&count),
        "sector count {} out of range",
        count
    );
    assert!(
        words >= count as usize * SECTOR_WORDS,
        "buffer of {} words for {} sectors",
        words,
        count
    );
}

impl<L: Lanes> AtaController<L> {
    fn write_lba_task_file(&mut self, device: Device, lba: Lba28, count: u16) {
        self.write_register(Register::SectorCount, sector_count_register(count) as u16);
        self.write_register(Register::LbaLow, lba.low() as u16);
        self.write_register(Register::LbaMid, lba.mid() as u16);
        self.write_register(Register::LbaHigh, lba.high() as u16);
        self.select(DeviceSelector::lba(device, lba));
    }

    /// READ SECTOR(S): `count` sectors from `lba` into `out`, 256 words each.
    ///
    /// Each sector is its own DRQ data block. On error the sectors that
    /// follow are not transferred.
    ///
    /// # Panics
    /// If `count` is outside `1..=256` or `out` is shorter than
    /// `count * 256` words.
    pub fn read_sectors(
        &mut self,
        device: Device,
        lba: Lba28,
        count: u16,
        out: &mut [u16],
    ) -> Result<()> {
        check_transfer(count, out.len());

        self.wait_ready()?;
        self.write_lba_task_file(device, lba, count);
        self.write_command(Command::ReadSectors);

        for sector in out[..count as usize * SECTOR_WORDS].chunks_exact_mut(SECTOR_WORDS) {
            self.pio_read(sector)?;
        }
        Ok(())
    }

    /// WRITE SECTOR(S): `count` sectors from `data` to `lba`.
    ///
    /// Succeeds once the device has accepted the last sector and reports no
    /// error.
    ///
    /// # Panics
    /// If `count` is outside `1..=256` or `data` is shorter than
    /// `count * 256` words.
    pub fn write_sectors(
        &mut self,
        device: Device,
        lba: Lba28,
        count: u16,
        data: &[u16],
    ) -> Result<()> {
        check_transfer(count, data.len());

        self.wait_ready()?;
        self.write_lba_task_file(device, lba, count);
        self.write_command(Command::WriteSectors);

        for sector in data[..count as usize * SECTOR_WORDS].chunks_exact(SECTOR_WORDS) {
            self.pio_write(sector)?;
        }

        let status = self.wait_not_busy()?;
        self.check_error(status)?;
        Ok(())
    }

    /// FLUSH CACHE.
    pub fn flush_cache(&mut self, device: Device) -> Result<()> {
        self.wait_ready()?;
        self.select(DeviceSelector::device_only(device));
        self.write_command(Command::FlushCache);

        let status = self.wait_not_busy()?;
        self.check_error(status)?;
        Ok(())
    }

    /// IDENTIFY DEVICE or IDENTIFY PACKET DEVICE.
    ///
    /// Does not wait for DRDY first: ATAPI devices do not set it until
    /// they have been identified. A checksum mismatch is logged and the
    /// data returned anyway.
    pub fn identify_device(
        &mut self,
        device: Device,
        command: IdentifyCommand,
    ) -> Result<IdentifyData> {
        self.select(DeviceSelector::device_only(device));
        self.write_command(command.command());

        let mut words = [0u16; IDENTIFY_WORDS];
        self.pio_read(&mut words)?;

        let data = IdentifyData::from_words(words);
        let id = data.parser();
        if id.verify_checksum() == ChecksumStatus::Mismatch {
            log::warn!(
                "ata: {} identify checksum mismatch (sum {:#04x})",
                device,
                id.checksum_sum()
            );
        }

        Ok(data)
    }

    /// Detect the device class, then issue the matching IDENTIFY.
    pub fn identify_detected(&mut self, device: Device) -> Result<(DeviceKind, IdentifyData)> {
        let kind = self.detect_device(device)?;
        let data = self.identify_device(device, IdentifyCommand::for_kind(kind))?;
        Ok((kind, data))
    }

    /// Sector count and size from IDENTIFY DEVICE.
    pub fn capacity(&mut self, device: Device) -> Result<Capacity> {
        let data = self.identify_device(device, IdentifyCommand::Device)?;
        Ok(Capacity {
            sectors: data.parser().total_user_addressable_sectors(),
            sector_size: SECTOR_SIZE,
        })
    }

    /// Program the device's transfer mode, then retime the lanes.
    ///
    /// Returns the installed clock divisor.
    pub fn apply_pio_timing(&mut self, device: Device, timing: &PioTiming) -> Result<u16> {
        if let Some(mode) = timing.mode {
            log::debug!("ata: {} switching to {:?}", device, mode);
            self.set_features(
                device,
                Feature::SetTransferMode,
                pio_flow_control_mode(mode as u8),
            )?;
        }

        Ok(self.adjust_for_min_cycle_time(timing.min_cycle_time_ns))
    }

    /// Identify the device and run it at the fastest PIO timing it advertises.
    pub fn negotiate_pio_timing(
        &mut self,
        device: Device,
        command: IdentifyCommand,
    ) -> Result<PioTiming> {
        let data = self.identify_device(device, command)?;
        let timing = PioTiming::from_identify(&data.parser());
        self.apply_pio_timing(device, &timing)?;
        Ok(timing)
    }
}
