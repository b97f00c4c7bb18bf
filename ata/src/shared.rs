//! One lock per physical bus.
//!
//! Two devices share a channel, and a command sequence (task file, command,
//! data phases) must not interleave with another. [`SharedBus`] holds the
//! controller behind a spin lock; every command runs with the lock held.

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

use crate::block_io::AtaBlockDevice;
use crate::device::Device;
use crate::error::{AtaError, Result};
use crate::lanes::Lanes;
use crate::protocol::AtaController;

/// A controller that can be reached from several owners.
pub struct SharedBus<L: Lanes> {
    inner: spin::Mutex<AtaController<L>>,
}

impl<L: Lanes> SharedBus<L> {
    pub const fn new(controller: AtaController<L>) -> Self {
        Self {
            inner: spin::Mutex::new(controller),
        }
    }

    /// Hold the bus for a sequence of commands.
    pub fn lock(&self) -> spin::MutexGuard<'_, AtaController<L>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the bus.
    pub fn with<R>(&self, f: impl FnOnce(&mut AtaController<L>) -> R) -> R {
        let mut controller = self.inner.lock();
        f(&mut controller)
    }

    pub fn into_inner(self) -> AtaController<L> {
        self.inner.into_inner()
    }

    /// Block device for one device on the bus, locking per request.
    pub fn block_device(&self, device: Device) -> SharedBlockDevice<'_, L> {
        SharedBlockDevice {
            bus: self,
            device,
            num_blocks: None,
        }
    }
}

/// [`AtaBlockDevice`] that takes the bus lock for each request.
pub struct SharedBlockDevice<'a, L: Lanes> {
    bus: &'a SharedBus<L>,
    device: Device,
    num_blocks: Option<u64>,
}

impl<L: Lanes> SharedBlockDevice<'_, L> {
    pub fn device(&self) -> Device {
        self.device
    }

    fn run<R>(&mut self, f: impl FnOnce(&mut AtaBlockDevice<'_, L>) -> Result<R>) -> Result<R> {
        let mut controller = self.bus.lock();
        let mut dev = AtaBlockDevice::new(&mut controller, self.device);
        if let Some(n) = self.num_blocks {
            dev = dev.with_num_blocks(n);
        }
        f(&mut dev)
    }
}

impl<L: Lanes> BlockIo for SharedBlockDevice<'_, L> {
    type Error = AtaError;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64> {
        if let Some(n) = self.num_blocks {
            return Ok(n);
        }
        let n = self.run(|dev| dev.num_blocks())?;
        self.num_blocks = Some(n);
        Ok(n)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<()> {
        self.run(|dev| dev.read_blocks(start_lba, dst))
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<()> {
        self.run(|dev| dev.write_blocks(start_lba, src))
    }

    fn flush(&mut self) -> Result<()> {
        self.run(|dev| dev.flush())
    }
}
