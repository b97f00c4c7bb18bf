//! ATA device to `gpt_disk_io::BlockIo` adapter.
//!
//! Lets the GPT and ISO9660 readers sit directly on top of one device of a
//! channel. Block size is fixed at 512 bytes; requests are split into
//! READ/WRITE SECTOR(S) commands of at most 256 sectors.

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

use crate::device::{Device, Lba28, MAX_SECTORS_PER_COMMAND, SECTOR_SIZE, SECTOR_WORDS};
use crate::error::{AtaError, Result};
use crate::lanes::Lanes;
use crate::protocol::AtaController;

/// View a byte buffer as bus words, when its layout already matches.
fn as_words_mut(bytes: &mut [u8]) -> Option<&mut [u16]> {
    if cfg!(target_endian = "big") {
        return None;
    }
    // SAFETY: every bit pattern is a valid u16
    let (head, words, tail) = unsafe { bytes.align_to_mut::<u16>() };
    if head.is_empty() && tail.is_empty() {
        Some(words)
    } else {
        None
    }
}

fn as_words(bytes: &[u8]) -> Option<&[u16]> {
    if cfg!(target_endian = "big") {
        return None;
    }
    // SAFETY: every bit pattern is a valid u16
    let (head, words, tail) = unsafe { bytes.align_to::<u16>() };
    if head.is_empty() && tail.is_empty() {
        Some(words)
    } else {
        None
    }
}

/// Validate a request and return its first address and sector count.
fn request(start_lba: Lba, len: usize) -> Result<(Lba28, u64)> {
    if len % SECTOR_SIZE != 0 {
        return Err(AtaError::BufferMisaligned);
    }

    let sectors = (len / SECTOR_SIZE) as u64;
    let start = Lba28::try_from(start_lba.0)?;
    if sectors > 0 {
        let last = start_lba
            .0
            .checked_add(sectors - 1)
            .ok_or(AtaError::LbaOutOfRange)?;
        Lba28::try_from(last)?;
    }

    Ok((start, sectors))
}

/// One device on a channel as a 512-byte block device.
pub struct AtaBlockDevice<'a, L: Lanes> {
    controller: &'a mut AtaController<L>,
    device: Device,
    num_blocks: Option<u64>,
}

impl<'a, L: Lanes> AtaBlockDevice<'a, L> {
    pub fn new(controller: &'a mut AtaController<L>, device: Device) -> Self {
        Self {
            controller,
            device,
            num_blocks: None,
        }
    }

    /// Use a known capacity instead of issuing IDENTIFY DEVICE.
    pub fn with_num_blocks(mut self, num_blocks: u64) -> Self {
        self.num_blocks = Some(num_blocks);
        self
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn controller(&mut self) -> &mut AtaController<L> {
        self.controller
    }

    fn read_run(&mut self, start: Lba28, dst: &mut [u8]) -> Result<()> {
        let count = (dst.len() / SECTOR_SIZE) as u16;

        if let Some(words) = as_words_mut(dst) {
            self.controller
                .read_sectors(self.device, start, count, words)?;
            return Ok(());
        }

        let mut bounce = [0u16; SECTOR_WORDS];
        for (i, sector) in dst.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            let lba = start.offset(i as u32).ok_or(AtaError::LbaOutOfRange)?;
            self.controller
                .read_sectors(self.device, lba, 1, &mut bounce)?;
            for (pair, word) in sector.chunks_exact_mut(2).zip(bounce.iter()) {
                pair.copy_from_slice(&word.to_le_bytes());
            }
        }
        Ok(())
    }

    fn write_run(&mut self, start: Lba28, src: &[u8]) -> Result<()> {
        let count = (src.len() / SECTOR_SIZE) as u16;

        if let Some(words) = as_words(src) {
            return self
                .controller
                .write_sectors(self.device, start, count, words);
        }

        let mut bounce = [0u16; SECTOR_WORDS];
        for (i, sector) in src.chunks_exact(SECTOR_SIZE).enumerate() {
            for (word, pair) in bounce.iter_mut().zip(sector.chunks_exact(2)) {
                *word = u16::from_le_bytes([pair[0], pair[1]]);
            }
            let lba = start.offset(i as u32).ok_or(AtaError::LbaOutOfRange)?;
            self.controller
                .write_sectors(self.device, lba, 1, &bounce)?;
        }
        Ok(())
    }
}

const RUN_BYTES: usize = MAX_SECTORS_PER_COMMAND as usize * SECTOR_SIZE;

impl<L: Lanes> BlockIo for AtaBlockDevice<'_, L> {
    type Error = AtaError;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64> {
        if let Some(n) = self.num_blocks {
            return Ok(n);
        }
        let n = self.controller.capacity(self.device)?.sectors as u64;
        self.num_blocks = Some(n);
        Ok(n)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<()> {
        let (start, _) = request(start_lba, dst.len())?;

        for (i, run) in dst.chunks_mut(RUN_BYTES).enumerate() {
            let lba = start
                .offset((i * MAX_SECTORS_PER_COMMAND as usize) as u32)
                .ok_or(AtaError::LbaOutOfRange)?;
            self.read_run(lba, run)?;
        }
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<()> {
        let (start, _) = request(start_lba, src.len())?;

        for (i, run) in src.chunks(RUN_BYTES).enumerate() {
            let lba = start
                .offset((i * MAX_SECTORS_PER_COMMAND as usize) as u32)
                .ok_or(AtaError::LbaOutOfRange)?;
            self.write_run(lba, run)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.controller.flush_cache(self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert_eq!(request(Lba(0), 511), Err(AtaError::BufferMisaligned));
        assert_eq!(request(Lba(0), 0).map(|(_, n)| n), Ok(0));
        assert_eq!(request(Lba(7), 1024).map(|(l, n)| (l.get(), n)), Ok((7, 2)));
        assert_eq!(
            request(Lba(Lba28::MAX as u64), 1024),
            Err(AtaError::LbaOutOfRange)
        );
        assert_eq!(
            request(Lba(Lba28::MAX as u64 + 1), 512),
            Err(AtaError::LbaOutOfRange)
        );
    }
}
