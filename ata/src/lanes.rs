//! Hardware seam for the two transfer lanes.
//!
//! A lane is one state machine running a fixed micro-program that strobes
//! DIOR- or DIOW- and samples or drives the 16-bit data bus. The read lane
//! takes a word count from its transmit FIFO and returns that many samples;
//! the write lane takes one data word per transfer. Both stall on an empty
//! transmit FIFO when they are done, and that stall is the only completion
//! signal.
//!
//! Address and chip-select lines, the RESET- line and the microsecond delay
//! source live here too, since they are the same global pins the lanes run
//! against. [`crate::rp2040::Rp2040Lanes`] drives real hardware; tests use a
//! simulated device.

use crate::regs::Register;

/// One of the two directional state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Strobes DIOR- and samples the data bus
    Read,
    /// Drives the data bus and strobes DIOW-
    Write,
}

/// Low-level access to the lanes and the shared control pins.
///
/// Implementations must not reorder pin and FIFO operations: the engine
/// relies on the address lines being stable before the next word reaches
/// a lane.
pub trait Lanes {
    /// Drive the chip-select and address lines for `reg`.
    fn select(&mut self, reg: Register);

    /// Push one word into the lane's transmit FIFO, blocking while it is full.
    ///
    /// The payload sits in the upper half-word: a word count minus one for
    /// the read lane, a data word for the write lane.
    fn push(&mut self, lane: Lane, word: u32);

    /// Pop one sampled word from the read lane, blocking while none is ready.
    fn pull(&mut self) -> u32;

    /// Clear the lane's sticky stall flag.
    fn clear_stall(&mut self, lane: Lane);

    /// Whether the lane has stalled on an empty transmit FIFO since the flag
    /// was last cleared.
    fn is_stalled(&mut self, lane: Lane) -> bool;

    /// Start or stop both lanes together.
    fn set_enabled(&mut self, enabled: bool);

    /// Install an integer clock divisor on one lane.
    fn set_clock_divisor(&mut self, lane: Lane, divisor: u16);

    /// System clock feeding the lanes.
    fn system_clock_hz(&self) -> u32;

    /// Drive RESET- (`true` asserts it, pulling the line low).
    fn set_reset(&mut self, asserted: bool);

    /// Busy-wait for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

impl<L: Lanes + ?Sized> Lanes for &mut L {
    fn select(&mut self, reg: Register) {
        (**self).select(reg)
    }

    fn push(&mut self, lane: Lane, word: u32) {
        (**self).push(lane, word)
    }

    fn pull(&mut self) -> u32 {
        (**self).pull()
    }

    fn clear_stall(&mut self, lane: Lane) {
        (**self).clear_stall(lane)
    }

    fn is_stalled(&mut self, lane: Lane) -> bool {
        (**self).is_stalled(lane)
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled)
    }

    fn set_clock_divisor(&mut self, lane: Lane, divisor: u16) {
        (**self).set_clock_divisor(lane, divisor)
    }

    fn system_clock_hz(&self) -> u32 {
        (**self).system_clock_hz()
    }

    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
