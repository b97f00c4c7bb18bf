//! RP2040 backend: PIO0 state machines 0 and 1 as the read and write lanes.
//!
//! # Register Map
//!
//! | Block    | Base          | Used for                                  |
//! |----------|---------------|-------------------------------------------|
//! | PIO0     | `0x5020_0000` | lanes, instruction memory, stall flags    |
//! | SIO      | `0xd000_0000` | CS, DA2..0 and RESET- outputs             |
//! | IO_BANK0 | `0x4001_4000` | pin function select                       |
//! | TIMER    | `0x4005_4000` | microsecond delays                        |
//!
//! The chip-select and address lines are plain SIO outputs written with one
//! masked XOR, so both change in the same cycle before the lane is handed
//! its word.

use core::ptr;

use crate::lanes::{Lane, Lanes};
use crate::pio::{
    Instruction, JmpCondition, MovDestination, MovOp, MovSource, OutDestination, Program,
    SetDestination, INSTRUCTION_MEMORY, READ_PROGRAM, WRITE_PROGRAM,
};
use crate::regs::Register;
use crate::timing::{self, DEFAULT_CYCLE_TIME_NS};

// ═══════════════════════════════════════════════════════════════════════════
// REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

pub mod mmio {
    pub const PIO0_BASE: usize = 0x5020_0000;
    pub const SIO_BASE: usize = 0xd000_0000;
    pub const IO_BANK0_BASE: usize = 0x4001_4000;
    pub const TIMER_BASE: usize = 0x4005_4000;

    // PIO
    pub const PIO_CTRL: usize = 0x000;
    pub const PIO_FSTAT: usize = 0x004;
    pub const PIO_FDEBUG: usize = 0x008;
    pub const PIO_TXF0: usize = 0x010;
    pub const PIO_RXF0: usize = 0x020;
    pub const PIO_INSTR_MEM0: usize = 0x048;
    pub const PIO_SM0_CLKDIV: usize = 0x0c8;
    pub const PIO_SM0_EXECCTRL: usize = 0x0cc;
    pub const PIO_SM0_SHIFTCTRL: usize = 0x0d0;
    pub const PIO_SM0_INSTR: usize = 0x0d8;
    pub const PIO_SM0_PINCTRL: usize = 0x0dc;
    /// Distance between consecutive state machines' register blocks
    pub const PIO_SM_STRIDE: usize = 0x18;

    pub const CTRL_SM_ENABLE_LSB: u32 = 0;
    pub const CTRL_SM_RESTART_LSB: u32 = 4;
    pub const CTRL_CLKDIV_RESTART_LSB: u32 = 8;
    pub const FSTAT_RXEMPTY_LSB: u32 = 8;
    pub const FSTAT_TXFULL_LSB: u32 = 16;
    pub const FDEBUG_TXSTALL_LSB: u32 = 24;
    pub const CLKDIV_INT_LSB: u32 = 16;

    // SIO
    pub const SIO_GPIO_OUT: usize = 0x010;
    pub const SIO_GPIO_OUT_SET: usize = 0x014;
    pub const SIO_GPIO_OUT_CLR: usize = 0x018;
    pub const SIO_GPIO_OUT_XOR: usize = 0x01c;
    pub const SIO_GPIO_OE_SET: usize = 0x024;
    pub const SIO_GPIO_OE_CLR: usize = 0x028;

    // IO_BANK0
    pub const GPIO_CTRL_OFFSET: usize = 0x004;
    pub const GPIO_STRIDE: usize = 0x008;
    pub const FUNCSEL_SIO: u32 = 5;
    pub const FUNCSEL_PIO0: u32 = 6;

    // TIMER
    pub const TIMER_TIMERAWL: usize = 0x028;
}

use mmio::*;

#[inline(always)]
unsafe fn read(addr: usize) -> u32 {
    ptr::read_volatile(addr as *const u32)
}

#[inline(always)]
unsafe fn write(addr: usize, value: u32) {
    ptr::write_volatile(addr as *mut u32, value)
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// GPIO assignment of the ATA cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// DD0; DD1..DD15 follow contiguously
    pub data_base: u8,
    /// DA0; DA1, DA2 follow contiguously
    pub addr_base: u8,
    /// CS0-; CS1- is the next pin
    pub cs_base: u8,
    /// DIOR-
    pub dior: u8,
    /// DIOW-
    pub diow: u8,
    /// IORDY
    pub iordy: u8,
    /// RESET-
    pub reset: u8,
}

impl PinConfig {
    /// Layout on a Pico header: data on GPIO 0-15, the rest above it.
    pub const DEFAULT: Self = Self {
        data_base: 0,
        addr_base: 16,
        cs_base: 19,
        dior: 21,
        diow: 22,
        iordy: 26,
        reset: 27,
    };

    pub const fn data_mask(&self) -> u32 {
        0xFFFF << self.data_base
    }

    pub const fn addr_mask(&self) -> u32 {
        0b111 << self.addr_base
    }

    pub const fn cs_mask(&self) -> u32 {
        0b11 << self.cs_base
    }

    pub const fn reset_mask(&self) -> u32 {
        1 << self.reset
    }

    /// Output value selecting `reg` on the CS and DA lines.
    pub const fn select_bits(&self, reg: Register) -> u32 {
        (reg.chip_select() as u32) << self.cs_base | (reg.offset() as u32) << self.addr_base
    }

    /// Whether every group fits in bank 0 and no two groups overlap.
    pub const fn is_valid(&self) -> bool {
        if self.data_base > 14
            || self.addr_base > 27
            || self.cs_base > 28
            || self.dior > 29
            || self.diow > 29
            || self.iordy > 29
            || self.reset > 29
        {
            return false;
        }

        let groups = [
            self.data_mask(),
            self.addr_mask(),
            self.cs_mask(),
            1 << self.dior,
            1 << self.diow,
            1 << self.iordy,
            self.reset_mask(),
        ];

        let mut seen = 0u32;
        let mut i = 0;
        while i < groups.len() {
            if seen & groups[i] != 0 {
                return false;
            }
            seen |= groups[i];
            i += 1;
        }
        true
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// State machine running the read lane.
pub const READ_SM: u8 = 0;
/// State machine running the write lane.
pub const WRITE_SM: u8 = 1;

/// Load offset of the read program.
pub const READ_PROGRAM_OFFSET: u8 = 0;
/// Load offset of the write program, right after the read program.
pub const WRITE_PROGRAM_OFFSET: u8 = READ_PROGRAM.instructions.len() as u8;

const SIDESET_COUNT_OPT_1: u32 = 2;

/// EXECCTRL: optional side-set, IORDY as JMP pin, wrap window.
pub const fn execctrl(jmp_pin: u8, wrap_bottom: u8, wrap_top: u8) -> u32 {
    1 << 30 | (jmp_pin as u32) << 24 | (wrap_top as u32) << 12 | (wrap_bottom as u32) << 7
}

/// SHIFTCTRL for the read lane: 16-bit left shifts, autopull count, autopush data.
pub const fn shiftctrl_read() -> u32 {
    16 << 25 | 16 << 20 | 1 << 17 | 1 << 16
}

/// SHIFTCTRL for the write lane: 16-bit left shift out, explicit pull.
pub const fn shiftctrl_write() -> u32 {
    16 << 25
}

/// PINCTRL for the read lane: sample the data pins, side-set DIOR-.
pub const fn pinctrl_read(pins: &PinConfig) -> u32 {
    SIDESET_COUNT_OPT_1 << 29 | (pins.data_base as u32) << 15 | (pins.dior as u32) << 10
}

/// PINCTRL for the write lane: drive the data pins, side-set DIOW-.
pub const fn pinctrl_write(pins: &PinConfig) -> u32 {
    SIDESET_COUNT_OPT_1 << 29
        | 16 << 20
        | (pins.diow as u32) << 10
        | pins.data_base as u32
}

/// PINCTRL addressing a single pin with SET.
const fn pinctrl_set_one(pin: u8) -> u32 {
    1 << 26 | (pin as u32) << 5
}

const fn sm_reg(sm: u8, sm0_offset: usize) -> usize {
    PIO0_BASE + sm0_offset + sm as usize * PIO_SM_STRIDE
}

// ═══════════════════════════════════════════════════════════════════════════
// LANES
// ═══════════════════════════════════════════════════════════════════════════

/// The two lanes on real hardware.
pub struct Rp2040Lanes {
    pins: PinConfig,
    sys_clock_hz: u32,
}

impl Rp2040Lanes {
    /// Claim the pins and PIO0 state machines 0 and 1, load both programs
    /// and leave the lanes stopped at PIO mode 0 timing.
    ///
    /// # Safety
    /// PIO0, IO_BANK0, SIO and TIMER must be out of reset. The caller must
    /// own PIO0 state machines 0 and 1, the first
    /// `READ_PROGRAM + WRITE_PROGRAM` instruction slots and every pin in
    /// `pins`, and nothing else may touch them while the lanes exist.
    ///
    /// # Panics
    /// If `pins` is not a valid layout.
    pub unsafe fn new(pins: PinConfig, sys_clock_hz: u32) -> Self {
        assert!(pins.is_valid(), "invalid ATA pin layout: {:?}", pins);

        let lanes = Self { pins, sys_clock_hz };
        lanes.init_gpio();
        lanes.init_state_machines();

        log::debug!(
            "ata: rp2040 lanes on PIO0 SM{}/SM{}, {} Hz",
            READ_SM,
            WRITE_SM,
            sys_clock_hz
        );
        lanes
    }

    pub fn pins(&self) -> &PinConfig {
        &self.pins
    }

    const fn sm(lane: Lane) -> u8 {
        match lane {
            Lane::Read => READ_SM,
            Lane::Write => WRITE_SM,
        }
    }

    const fn sm_mask() -> u32 {
        1 << READ_SM | 1 << WRITE_SM
    }

    unsafe fn init_gpio(&self) {
        let p = &self.pins;
        let outputs = p.reset_mask() | p.cs_mask() | p.addr_mask();

        // active-low controls idle high, address lines low
        write(SIO_BASE + SIO_GPIO_OUT_SET, p.reset_mask() | p.cs_mask());
        write(SIO_BASE + SIO_GPIO_OUT_CLR, p.addr_mask());
        write(SIO_BASE + SIO_GPIO_OE_SET, outputs);
        write(SIO_BASE + SIO_GPIO_OE_CLR, 1 << p.iordy);

        for pin in 0..30u8 {
            let bit = 1u32 << pin;
            let funcsel = if bit & (outputs | 1 << p.iordy) != 0 {
                FUNCSEL_SIO
            } else if bit & (p.data_mask() | 1 << p.dior | 1 << p.diow) != 0 {
                FUNCSEL_PIO0
            } else {
                continue;
            };
            write(
                IO_BANK0_BASE + GPIO_CTRL_OFFSET + pin as usize * GPIO_STRIDE,
                funcsel,
            );
        }
    }

    unsafe fn load<const N: usize>(program: &Program<N>, offset: u8) {
        assert!(offset as usize + N <= INSTRUCTION_MEMORY);
        for (i, word) in program.relocated(offset).iter().enumerate() {
            write(
                PIO0_BASE + PIO_INSTR_MEM0 + (offset as usize + i) * 4,
                *word as u32,
            );
        }
    }

    unsafe fn exec(sm: u8, instruction: Instruction) {
        write(sm_reg(sm, PIO_SM0_INSTR), instruction.bits() as u32);
    }

    unsafe fn init_state_machines(&self) {
        let p = &self.pins;
        let ctrl = PIO0_BASE + PIO_CTRL;
        let mask = Self::sm_mask();

        write(ctrl, read(ctrl) & !(mask << CTRL_SM_ENABLE_LSB));
        Self::load(&READ_PROGRAM, READ_PROGRAM_OFFSET);
        Self::load(&WRITE_PROGRAM, WRITE_PROGRAM_OFFSET);

        let divisor = timing::clock_divisor(DEFAULT_CYCLE_TIME_NS, self.sys_clock_hz);
        let lanes = [
            (
                READ_SM,
                p.dior,
                execctrl(
                    p.iordy,
                    READ_PROGRAM_OFFSET + READ_PROGRAM.wrap_target,
                    READ_PROGRAM_OFFSET + READ_PROGRAM.wrap,
                ),
                shiftctrl_read(),
                pinctrl_read(p),
            ),
            (
                WRITE_SM,
                p.diow,
                execctrl(
                    p.iordy,
                    WRITE_PROGRAM_OFFSET + WRITE_PROGRAM.wrap_target,
                    WRITE_PROGRAM_OFFSET + WRITE_PROGRAM.wrap,
                ),
                shiftctrl_write(),
                pinctrl_write(p),
            ),
        ];

        for (sm, strobe, exec_ctrl, shift_ctrl, pin_ctrl) in lanes {
            write(sm_reg(sm, PIO_SM0_CLKDIV), (divisor as u32) << CLKDIV_INT_LSB);
            write(sm_reg(sm, PIO_SM0_EXECCTRL), exec_ctrl);
            write(sm_reg(sm, PIO_SM0_SHIFTCTRL), shift_ctrl);

            // strobe released and driven
            write(sm_reg(sm, PIO_SM0_PINCTRL), pinctrl_set_one(strobe));
            Self::exec(sm, Instruction::set(SetDestination::Pins, 1));
            Self::exec(sm, Instruction::set(SetDestination::PinDirs, 1));

            write(sm_reg(sm, PIO_SM0_PINCTRL), pin_ctrl);
        }

        // data bus released
        Self::exec(
            WRITE_SM,
            Instruction::mov(MovDestination::Osr, MovOp::None, MovSource::Null),
        );
        Self::exec(WRITE_SM, Instruction::out(OutDestination::PinDirs, 16));

        write(
            ctrl,
            read(ctrl) | mask << CTRL_SM_RESTART_LSB | mask << CTRL_CLKDIV_RESTART_LSB,
        );
        for (sm, offset) in [(READ_SM, READ_PROGRAM_OFFSET), (WRITE_SM, WRITE_PROGRAM_OFFSET)] {
            Self::exec(sm, Instruction::jmp(JmpCondition::Always, offset));
        }
    }
}

impl Lanes for Rp2040Lanes {
    fn select(&mut self, reg: Register) {
        let mask = self.pins.cs_mask() | self.pins.addr_mask();
        let bits = self.pins.select_bits(reg);
        unsafe {
            let out = read(SIO_BASE + SIO_GPIO_OUT);
            write(SIO_BASE + SIO_GPIO_OUT_XOR, (out ^ bits) & mask);
        }
    }

    fn push(&mut self, lane: Lane, word: u32) {
        let sm = Self::sm(lane);
        let full = 1 << (FSTAT_TXFULL_LSB + sm as u32);
        unsafe {
            while read(PIO0_BASE + PIO_FSTAT) & full != 0 {
                core::hint::spin_loop();
            }
            write(PIO0_BASE + PIO_TXF0 + sm as usize * 4, word);
        }
    }

    fn pull(&mut self) -> u32 {
        let empty = 1 << (FSTAT_RXEMPTY_LSB + READ_SM as u32);
        unsafe {
            while read(PIO0_BASE + PIO_FSTAT) & empty != 0 {
                core::hint::spin_loop();
            }
            read(PIO0_BASE + PIO_RXF0 + READ_SM as usize * 4)
        }
    }

    fn clear_stall(&mut self, lane: Lane) {
        let stall = 1 << (FDEBUG_TXSTALL_LSB + Self::sm(lane) as u32);
        // write-one-to-clear
        unsafe { write(PIO0_BASE + PIO_FDEBUG, stall) }
    }

    fn is_stalled(&mut self, lane: Lane) -> bool {
        let stall = 1 << (FDEBUG_TXSTALL_LSB + Self::sm(lane) as u32);
        unsafe { read(PIO0_BASE + PIO_FDEBUG) & stall != 0 }
    }

    fn set_enabled(&mut self, enabled: bool) {
        let ctrl = PIO0_BASE + PIO_CTRL;
        let mask = Self::sm_mask() << CTRL_SM_ENABLE_LSB;
        unsafe {
            let value = read(ctrl);
            write(ctrl, if enabled { value | mask } else { value & !mask });
        }
    }

    fn set_clock_divisor(&mut self, lane: Lane, divisor: u16) {
        unsafe {
            write(
                sm_reg(Self::sm(lane), PIO_SM0_CLKDIV),
                (divisor as u32) << CLKDIV_INT_LSB,
            )
        }
    }

    fn system_clock_hz(&self) -> u32 {
        self.sys_clock_hz
    }

    fn set_reset(&mut self, asserted: bool) {
        let reg = if asserted {
            SIO_GPIO_OUT_CLR
        } else {
            SIO_GPIO_OUT_SET
        };
        unsafe { write(SIO_BASE + reg, self.pins.reset_mask()) }
    }

    fn delay_us(&mut self, us: u32) {
        unsafe {
            let start = read(TIMER_BASE + TIMER_TIMERAWL);
            while read(TIMER_BASE + TIMER_TIMERAWL).wrapping_sub(start) < us {
                core::hint::spin_loop();
            }
        }
    }
}
