//! Register access engine.
//!
//! Every bus access has the same shape: drive the address lines, hand the
//! lane its payload, then block until the lane reports a stall on its empty
//! transmit FIFO. There is no timeout at this level; an access to a device
//! that never completes blocks forever.

use crate::lanes::{Lane, Lanes};
use crate::regs::Register;
use crate::timing::{self, DEFAULT_CYCLE_TIME_NS};

/// RESET- low time.
pub const RESET_ASSERT_US: u32 = 25;

/// Delay between releasing RESET- and the first status poll.
pub const RESET_SETTLE_US: u32 = 2_000;

/// Largest burst the read lane's 16-bit counter can express.
pub const MAX_BURST_WORDS: usize = 0x1_0000;

/// Owns the lanes and the current bus timing.
pub struct BusEngine<L: Lanes> {
    lanes: L,
    divisor: u16,
}

impl<L: Lanes> BusEngine<L> {
    /// Take ownership of the lanes and start them at PIO mode 0 timing.
    pub fn new(lanes: L) -> Self {
        let mut engine = Self { lanes, divisor: 0 };
        engine.configure(DEFAULT_CYCLE_TIME_NS);
        engine
    }

    /// Retime both lanes for `cycle_time_ns`, returning the divisor used.
    ///
    /// Both lanes are stopped around the change, so this must only be called
    /// while the bus is idle.
    pub fn configure(&mut self, cycle_time_ns: u32) -> u16 {
        let hz = self.lanes.system_clock_hz();
        let divisor = timing::clock_divisor(cycle_time_ns, hz);

        self.lanes.set_enabled(false);
        self.lanes.set_clock_divisor(Lane::Read, divisor);
        self.lanes.set_clock_divisor(Lane::Write, divisor);
        self.lanes.set_enabled(true);

        self.divisor = divisor;
        log::debug!(
            "ata: bus timing {}ns requested, divisor {} ({}ns actual)",
            cycle_time_ns,
            divisor,
            timing::cycle_time_ns(divisor, hz)
        );
        divisor
    }

    /// Divisor currently installed on both lanes.
    pub fn divisor(&self) -> u16 {
        self.divisor
    }

    /// Read a single task-file register.
    pub fn read_register(&mut self, reg: Register) -> u16 {
        self.lanes.select(reg);

        // word count - 1 = 0
        self.lanes.push(Lane::Read, 0);
        self.lanes.clear_stall(Lane::Read);

        let value = self.lanes.pull() as u16;
        self.wait_for_stall(Lane::Read);

        #[cfg(feature = "trace-registers")]
        log::trace!("ata: read {:?} = {:#06x}", reg, value);

        value
    }

    /// Write a single task-file register.
    pub fn write_register(&mut self, reg: Register, value: u16) {
        #[cfg(feature = "trace-registers")]
        log::trace!("ata: write {:?} = {:#06x}", reg, value);

        self.lanes.select(reg);
        self.lanes.push(Lane::Write, (value as u32) << 16);

        self.lanes.clear_stall(Lane::Write);
        self.wait_for_stall(Lane::Write);
    }

    /// Read `words.len()` words from the Data register in one lane hand-off.
    ///
    /// # Panics
    /// If `words` is empty or longer than [`MAX_BURST_WORDS`].
    pub fn read_burst(&mut self, words: &mut [u16]) {
        assert!(
            !words.is_empty() && words.len() <= MAX_BURST_WORDS,
            "burst of {} words",
            words.len()
        );

        self.lanes.select(Register::Data);
        self.lanes.push(Lane::Read, ((words.len() - 1) as u32) << 16);
        self.lanes.clear_stall(Lane::Read);

        for word in words.iter_mut() {
            *word = self.lanes.pull() as u16;
        }

        self.wait_for_stall(Lane::Read);
    }

    /// Write `words` to the Data register.
    ///
    /// # Panics
    /// If `words` is empty or longer than [`MAX_BURST_WORDS`].
    pub fn write_burst(&mut self, words: &[u16]) {
        assert!(
            !words.is_empty() && words.len() <= MAX_BURST_WORDS,
            "burst of {} words",
            words.len()
        );

        self.lanes.select(Register::Data);
        for &word in words {
            self.lanes.push(Lane::Write, (word as u32) << 16);
        }

        self.lanes.clear_stall(Lane::Write);
        self.wait_for_stall(Lane::Write);
    }

    /// Pulse RESET- and wait for the device to start its reset sequence.
    pub fn pulse_reset(&mut self) {
        self.lanes.set_reset(true);
        self.lanes.delay_us(RESET_ASSERT_US);
        self.lanes.set_reset(false);
        self.lanes.delay_us(RESET_SETTLE_US);
    }

    /// Busy-wait on the lanes' delay source.
    pub fn delay_us(&mut self, us: u32) {
        self.lanes.delay_us(us);
    }

    /// Borrow the lanes.
    pub fn lanes(&self) -> &L {
        &self.lanes
    }

    /// Mutably borrow the lanes.
    pub fn lanes_mut(&mut self) -> &mut L {
        &mut self.lanes
    }

    /// Give the lanes back.
    pub fn into_lanes(self) -> L {
        self.lanes
    }

    fn wait_for_stall(&mut self, lane: Lane) {
        while !self.lanes.is_stalled(lane) {
            core::hint::spin_loop();
        }
    }
}
