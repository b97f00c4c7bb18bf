//! Bus cycle timing.
//!
//! Both lanes run a loop of [`INSTRUCTIONS_PER_LOOP`] state-machine
//! instructions per transferred word, so a requested cycle time maps to one
//! integer clock divisor shared by the read and write lanes.
//!
//! # Known limitation
//!
//! Register (8-bit) accesses in PIO modes 1 and 2 have a longer minimum cycle
//! (330-383 ns) and a different active pulse width than data transfers in
//! the same mode. The divisor is derived from the data transfer cycle time
//! only, so register timing is not corrected for those two modes. Modes 0, 3
//! and 4 are unaffected.

use crate::identify::IdentityParser;

/// State-machine instructions executed per bus cycle.
pub const INSTRUCTIONS_PER_LOOP: u32 = 6;

/// PIO mode 0 cycle time, safe for any device.
pub const DEFAULT_CYCLE_TIME_NS: u32 = 600;

const NS_PER_SEC: u64 = 1_000_000_000;

/// Integer clock divisor for `cycle_time_ns` at `sys_clock_hz`.
///
/// Equals `ceil((cycle_time_ns / INSTRUCTIONS_PER_LOOP) / clock_period_ns)`,
/// computed without floating point. Always at least 1; saturates at the
/// 16-bit integer divisor the hardware accepts.
pub fn clock_divisor(cycle_time_ns: u32, sys_clock_hz: u32) -> u16 {
    let scaled = cycle_time_ns as u64 * sys_clock_hz as u64;
    let divisor = scaled.div_ceil(INSTRUCTIONS_PER_LOOP as u64 * NS_PER_SEC);
    divisor.clamp(1, u16::MAX as u64) as u16
}

/// Actual cycle time produced by `divisor`, rounded up to whole nanoseconds.
pub fn cycle_time_ns(divisor: u16, sys_clock_hz: u32) -> u32 {
    let scaled = divisor as u64 * INSTRUCTIONS_PER_LOOP as u64 * NS_PER_SEC;
    scaled.div_ceil(sys_clock_hz.max(1) as u64) as u32
}

/// PIO transfer modes with their standard minimum cycle times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PioMode {
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
    Mode3 = 3,
    Mode4 = 4,
}

impl PioMode {
    /// Minimum data transfer cycle time (t0).
    pub const fn cycle_time_ns(self) -> u32 {
        match self {
            Self::Mode0 => 600,
            Self::Mode1 => 383,
            Self::Mode2 => 240,
            Self::Mode3 => 180,
            Self::Mode4 => 120,
        }
    }

    /// Whether the mode requires IORDY flow control.
    pub const fn uses_iordy(self) -> bool {
        matches!(self, Self::Mode3 | Self::Mode4)
    }

    /// Highest advanced mode from the word 64 bitmask (bit 0 = mode 3,
    /// bit 1 = mode 4).
    pub const fn from_advanced_mask(mask: u8) -> Option<Self> {
        if mask & (1 << 1) != 0 {
            Some(Self::Mode4)
        } else if mask & (1 << 0) != 0 {
            Some(Self::Mode3)
        } else {
            None
        }
    }
}

/// Timing negotiated from an IDENTIFY response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PioTiming {
    /// Advanced mode to program with SET FEATURES, if the device has one
    pub mode: Option<PioMode>,
    /// Cycle time handed to the timing engine
    pub min_cycle_time_ns: u32,
}

impl PioTiming {
    /// Mode 0 timing, used until the device has been identified.
    pub const DEFAULT: Self = Self {
        mode: None,
        min_cycle_time_ns: DEFAULT_CYCLE_TIME_NS,
    };

    /// Derive timing from the words 64-70 block.
    ///
    /// Only the advanced modes are considered; modes 0-2 are described by
    /// the obsolete word 51 and fall back to the mode 0 cycle time. When the
    /// block is valid the IORDY cycle time (word 68) is used unmodified,
    /// unless it is shorter than any PIO mode allows (0 = not reported), in
    /// which case the mode 0 cycle time is used.
    pub fn from_identify(id: &IdentityParser<'_>) -> Self {
        if !id.timing_params_valid() {
            return Self::DEFAULT;
        }

        let reported = id.min_pio_cycle_time_iordy() as u32;
        let min_cycle_time_ns = if reported < PioMode::Mode4.cycle_time_ns() {
            log::warn!(
                "ata: implausible PIO cycle time {}ns, using {}ns",
                reported,
                DEFAULT_CYCLE_TIME_NS
            );
            DEFAULT_CYCLE_TIME_NS
        } else {
            reported
        };

        Self {
            mode: PioMode::from_advanced_mask(id.advanced_pio_modes_supported()),
            min_cycle_time_ns,
        }
    }
}

impl Default for PioTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCKS: [u32; 5] = [12_000_000, 48_000_000, 125_000_000, 133_000_000, 200_000_000];

    #[test]
    fn test_divisor_at_125mhz() {
        // 8ns period, 600/6 = 100ns per instruction
        assert_eq!(clock_divisor(600, 125_000_000), 13);
        assert_eq!(clock_divisor(120, 125_000_000), 3);
        assert_eq!(clock_divisor(96, 125_000_000), 2);
    }

    #[test]
    fn test_divisor_never_below_cycle_time() {
        for &hz in CLOCKS.iter() {
            for cycle in (0..2000u32).chain([u16::MAX as u32]) {
                let divisor = clock_divisor(cycle, hz);
                assert!(divisor >= 1);

                // divisor * period * 6 >= cycle, in integer form
                let produced = divisor as u64 * INSTRUCTIONS_PER_LOOP as u64 * NS_PER_SEC;
                assert!(
                    produced >= cycle as u64 * hz as u64,
                    "cycle {} at {} Hz gave divisor {}",
                    cycle,
                    hz,
                    divisor
                );
            }
        }
    }

    #[test]
    fn test_divisor_is_minimal() {
        for &hz in CLOCKS.iter() {
            for cycle in 100..1000u32 {
                let divisor = clock_divisor(cycle, hz);
                if divisor > 1 {
                    let shorter = (divisor - 1) as u64 * INSTRUCTIONS_PER_LOOP as u64 * NS_PER_SEC;
                    assert!(shorter < cycle as u64 * hz as u64);
                }
            }
        }
    }

    #[test]
    fn test_zero_cycle_time_clamps_to_one() {
        assert_eq!(clock_divisor(0, 125_000_000), 1);
    }

    #[test]
    fn test_divisor_saturates() {
        assert_eq!(clock_divisor(u32::MAX, 200_000_000), u16::MAX);
    }

    #[test]
    fn test_cycle_time_round_trip() {
        let divisor = clock_divisor(600, 125_000_000);
        assert_eq!(cycle_time_ns(divisor, 125_000_000), 624);
    }

    #[test]
    fn test_advanced_mode_mask() {
        assert_eq!(PioMode::from_advanced_mask(0b00), None);
        assert_eq!(PioMode::from_advanced_mask(0b01), Some(PioMode::Mode3));
        assert_eq!(PioMode::from_advanced_mask(0b10), Some(PioMode::Mode4));
        assert_eq!(PioMode::from_advanced_mask(0b11), Some(PioMode::Mode4));
        assert!(PioMode::Mode4.uses_iordy());
        assert!(!PioMode::Mode2.uses_iordy());
    }
}
