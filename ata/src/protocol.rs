//! ATA command/status protocol.
//!
//! Everything above the register engine is a polling loop over the Status
//! register. The loops here are the only places that decide whether a
//! sample is terminal, and each of them is bounded by the controller's
//! [`PollPolicy`].
//!
//! # Data-transfer readiness
//!
//! [`AtaController::wait_data_request`] classifies each sample in a fixed
//! order:
//!
//! 1. BSY set: the rest of the byte is meaningless, keep polling
//! 2. DRQ set: the device has data (or wants data), success
//! 3. ERR set: the command failed, read the Error register and fail
//! 4. otherwise keep polling
//!
//! Checking ERR before DRQ, or honouring ERR while BSY is still set, turns
//! error sectors into data.

use crate::device::{Device, DeviceKind, DeviceSelector};
use crate::engine::BusEngine;
use crate::error::{AtaError, Result};
use crate::lanes::Lanes;
use crate::poll::{PollPolicy, Poller};
use crate::regs::{Command, Feature, Register, Status};

/// Settle time between DEVICE RESET and the first status sample.
pub const DEVICE_RESET_DELAY_US: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════

/// One parallel ATA channel (up to two devices) driven through a pair of lanes.
///
/// Constructed once per physical bus. Every operation takes `&mut self`;
/// wrap the controller in [`crate::shared::SharedBus`] to share it.
pub struct AtaController<L: Lanes> {
    engine: BusEngine<L>,
    poll: PollPolicy,
}

impl<L: Lanes> AtaController<L> {
    /// Take ownership of the lanes, with unbounded status polling.
    pub fn new(lanes: L) -> Self {
        Self::with_poll_policy(lanes, PollPolicy::Unbounded)
    }

    /// Take ownership of the lanes, bounding every status loop by `poll`.
    pub fn with_poll_policy(lanes: L, poll: PollPolicy) -> Self {
        Self {
            engine: BusEngine::new(lanes),
            poll,
        }
    }

    /// Current polling bound.
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    /// Replace the polling bound for subsequent commands.
    pub fn set_poll_policy(&mut self, poll: PollPolicy) {
        self.poll = poll;
    }

    /// Register access engine.
    pub fn engine(&self) -> &BusEngine<L> {
        &self.engine
    }

    /// Mutable register access engine.
    pub fn engine_mut(&mut self) -> &mut BusEngine<L> {
        &mut self.engine
    }

    /// Tear down the controller and give the lanes back.
    pub fn into_lanes(self) -> L {
        self.engine.into_lanes()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // REGISTER ACCESS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read a task-file register.
    pub fn read_register(&mut self, reg: Register) -> u16 {
        self.engine.read_register(reg)
    }

    /// Write a task-file register.
    pub fn write_register(&mut self, reg: Register, value: u16) {
        self.engine.write_register(reg, value)
    }

    /// Issue a command opcode.
    pub fn write_command(&mut self, command: Command) {
        log::debug!("ata: command {:?} ({:#04x})", command, command as u8);
        self.engine.write_register(Register::Command, command as u16);
    }

    /// Write the Device register.
    pub fn select(&mut self, selector: DeviceSelector) {
        self.engine
            .write_register(Register::Device, selector.to_register() as u16);
    }

    /// Sample the Status register.
    pub fn status(&mut self) -> Status {
        Status::from_register(self.engine.read_register(Register::Status))
    }

    /// Sample the Alternate Status register.
    pub fn alt_status(&mut self) -> Status {
        Status::from_register(self.engine.read_register(Register::AltStatus))
    }

    /// Read the Error register.
    pub fn error_register(&mut self) -> u8 {
        self.engine.read_register(Register::Error) as u8
    }

    // ═══════════════════════════════════════════════════════════════════════
    // STATUS POLLING
    // ═══════════════════════════════════════════════════════════════════════

    /// `!BSY && DRDY`, from a fresh sample.
    pub fn is_ready(&mut self) -> bool {
        self.status().is_ready()
    }

    /// Poll until the device is ready to accept a command.
    pub fn wait_ready(&mut self) -> Result<Status> {
        let mut poller = Poller::new(self.poll);
        loop {
            let status = self.status();
            if status.is_ready() {
                return Ok(status);
            }
            poller.tick()?;
        }
    }

    /// Poll until BSY clears, returning the first non-busy sample.
    pub fn wait_not_busy(&mut self) -> Result<Status> {
        let mut poller = Poller::new(self.poll);
        loop {
            let status = self.status();
            if !status.contains(Status::BSY) {
                return Ok(status);
            }
            poller.tick()?;
        }
    }

    /// Poll until the device asserts DRQ or reports an error.
    pub fn wait_data_request(&mut self) -> Result<Status> {
        let mut poller = Poller::new(self.poll);
        loop {
            let status = self.status();

            if status.contains(Status::BSY) {
                poller.tick()?;
                continue;
            }
            if status.contains(Status::DRQ) {
                return Ok(status);
            }
            if status.contains(Status::ERR) {
                return Err(self.device_error(status));
            }

            poller.tick()?;
        }
    }

    /// Build a device error from a failing status sample.
    pub(crate) fn device_error(&mut self, status: Status) -> AtaError {
        let error = self.error_register();
        log::warn!(
            "ata: device error, status {:#04x} error {:#04x}",
            status.bits(),
            error
        );
        AtaError::Device { status, error }
    }

    /// Fail with a device error if `status` has ERR set.
    pub(crate) fn check_error(&mut self, status: Status) -> Result<Status> {
        if status.contains(Status::ERR) {
            Err(self.device_error(status))
        } else {
            Ok(status)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PIO DATA PHASES
    // ═══════════════════════════════════════════════════════════════════════

    /// Wait for DRQ, then read one data block in a single burst.
    ///
    /// # Panics
    /// If `words` is empty or exceeds the engine's burst limit.
    pub fn pio_read(&mut self, words: &mut [u16]) -> Result<()> {
        self.wait_data_request()?;
        self.engine.read_burst(words);
        Ok(())
    }

    /// Wait for DRQ, then write one data block in a single burst.
    ///
    /// # Panics
    /// If `words` is empty or exceeds the engine's burst limit.
    pub fn pio_write(&mut self, words: &[u16]) -> Result<()> {
        self.wait_data_request()?;
        self.engine.write_burst(words);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RESET & CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════

    /// Hardware reset of both devices on the channel.
    ///
    /// Pulses RESET-, then waits for BSY to clear. Returns the first
    /// non-busy status.
    pub fn reset(&mut self) -> Result<Status> {
        log::debug!("ata: hardware reset");
        self.engine.pulse_reset();
        self.wait_not_busy()
    }

    /// DEVICE RESET, the ATAPI soft reset.
    ///
    /// Succeeds iff ERR is clear once the device drops BSY.
    pub fn device_reset(&mut self, device: Device) -> Result<()> {
        self.select(DeviceSelector::device_only(device));
        self.write_command(Command::DeviceReset);
        self.engine.delay_us(DEVICE_RESET_DELAY_US);

        let status = self.wait_not_busy()?;
        self.check_error(status)?;
        Ok(())
    }

    /// Tell an ATA device from an ATAPI one.
    ///
    /// Issues DEVICE RESET and reads the signature it leaves behind. ATA
    /// devices abort the command, which classifies them as [`DeviceKind::Ata`].
    /// Timeouts are returned as errors.
    pub fn detect_device(&mut self, device: Device) -> Result<DeviceKind> {
        match self.device_reset(device) {
            Ok(()) => {}
            Err(AtaError::Device { .. }) => {
                log::debug!("ata: {} aborted DEVICE RESET, assuming ATA", device);
                return Ok(DeviceKind::Ata);
            }
            Err(err) => return Err(err),
        }

        let lba_mid = self.read_register(Register::LbaMid) as u8;
        let lba_high = self.read_register(Register::LbaHigh) as u8;
        let kind = DeviceKind::from_signature(lba_mid, lba_high);
        log::debug!(
            "ata: {} signature {:02x}/{:02x} ({:?})",
            device,
            lba_mid,
            lba_high,
            kind
        );
        Ok(kind)
    }

    /// SET FEATURES with `value` in the Sector Count register.
    pub fn set_features(&mut self, device: Device, feature: Feature, value: u8) -> Result<()> {
        self.wait_ready()?;

        self.write_register(Register::Features, feature as u16);
        self.write_register(Register::SectorCount, value as u16);
        self.select(DeviceSelector::device_only(device));
        self.write_command(Command::SetFeatures);

        let status = self.wait_not_busy()?;
        self.check_error(status)?;
        Ok(())
    }

    /// Retime both lanes for a minimum cycle time, returning the divisor.
    ///
    /// Only call while the bus is idle.
    pub fn adjust_for_min_cycle_time(&mut self, cycle_time_ns: u32) -> u16 {
        self.engine.configure(cycle_time_ns)
    }
}
