//! RP2040 PIO instruction encoding and the lane micro-programs.
//!
//! Both lane programs declare one optional side-set pin (the strobe), so
//! the delay/side-set field of every instruction is laid out as
//!
//! ```text
//!   12   11   10..8
//!  [EN][SIDE][DELAY]
//! ```
//!
//! and at most 7 delay cycles are available.

pub mod programs;

pub use programs::{Program, READ_PROGRAM, WRITE_PROGRAM};

/// Instruction memory slots per PIO block.
pub const INSTRUCTION_MEMORY: usize = 32;

/// Largest delay expressible next to an optional side-set bit.
pub const MAX_DELAY: u8 = 7;

const OP_JMP: u16 = 0b000 << 13;
const OP_IN: u16 = 0b010 << 13;
const OP_OUT: u16 = 0b011 << 13;
const OP_PUSH_PULL: u16 = 0b100 << 13;
const OP_MOV: u16 = 0b101 << 13;
const OP_SET: u16 = 0b111 << 13;

const OPCODE_MASK: u16 = 0b111 << 13;
const SIDE_ENABLE: u16 = 1 << 12;
const SIDE_VALUE: u16 = 1 << 11;
const DELAY_SHIFT: u16 = 8;
const ADDRESS_MASK: u16 = 0x1F;

/// JMP conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JmpCondition {
    Always = 0,
    XZero = 1,
    XPostDecrement = 2,
    YZero = 3,
    YPostDecrement = 4,
    XNotEqualY = 5,
    Pin = 6,
    OsrNotEmpty = 7,
}

/// IN sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSource {
    Pins = 0,
    X = 1,
    Y = 2,
    Null = 3,
    Isr = 6,
    Osr = 7,
}

/// OUT destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutDestination {
    Pins = 0,
    X = 1,
    Y = 2,
    Null = 3,
    PinDirs = 4,
    Pc = 5,
    Isr = 6,
    Exec = 7,
}

/// MOV destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovDestination {
    Pins = 0,
    X = 1,
    Y = 2,
    Exec = 4,
    Pc = 5,
    Isr = 6,
    Osr = 7,
}

/// MOV operations applied to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovOp {
    None = 0,
    Invert = 1,
    BitReverse = 2,
}

/// MOV sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovSource {
    Pins = 0,
    X = 1,
    Y = 2,
    Null = 3,
    Status = 5,
    Isr = 6,
    Osr = 7,
}

/// SET destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetDestination {
    Pins = 0,
    X = 1,
    Y = 2,
    PinDirs = 4,
}

/// One encoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    pub const fn jmp(condition: JmpCondition, address: u8) -> Self {
        Self(OP_JMP | (condition as u16) << 5 | (address as u16 & ADDRESS_MASK))
    }

    /// `bit_count` of 32 encodes as 0.
    pub const fn in_(source: InSource, bit_count: u8) -> Self {
        Self(OP_IN | (source as u16) << 5 | (bit_count as u16 & 0x1F))
    }

    /// `bit_count` of 32 encodes as 0.
    pub const fn out(destination: OutDestination, bit_count: u8) -> Self {
        Self(OP_OUT | (destination as u16) << 5 | (bit_count as u16 & 0x1F))
    }

    pub const fn push(if_full: bool, block: bool) -> Self {
        Self(OP_PUSH_PULL | (if_full as u16) << 6 | (block as u16) << 5)
    }

    pub const fn pull(if_empty: bool, block: bool) -> Self {
        Self(OP_PUSH_PULL | 1 << 7 | (if_empty as u16) << 6 | (block as u16) << 5)
    }

    pub const fn mov(destination: MovDestination, op: MovOp, source: MovSource) -> Self {
        Self(OP_MOV | (destination as u16) << 5 | (op as u16) << 3 | source as u16)
    }

    pub const fn set(destination: SetDestination, data: u8) -> Self {
        Self(OP_SET | (destination as u16) << 5 | (data as u16 & 0x1F))
    }

    /// `mov y, y`
    pub const fn nop() -> Self {
        Self::mov(MovDestination::Y, MovOp::None, MovSource::Y)
    }

    /// Drive the side-set pin alongside this instruction.
    pub const fn side(self, high: bool) -> Self {
        Self(self.0 | SIDE_ENABLE | if high { SIDE_VALUE } else { 0 })
    }

    /// Stall for `cycles` extra cycles after this instruction.
    ///
    /// # Panics
    /// If `cycles` exceeds [`MAX_DELAY`] (at compile time for const uses).
    pub const fn delay(self, cycles: u8) -> Self {
        assert!(cycles <= MAX_DELAY, "delay does not fit next to side-set");
        Self(self.0 | (cycles as u16) << DELAY_SHIFT)
    }

    pub const fn is_jmp(self) -> bool {
        self.0 & OPCODE_MASK == OP_JMP
    }

    /// Shift a JMP target by the program's load offset.
    pub const fn relocate(self, offset: u8) -> Self {
        if !self.is_jmp() {
            return self;
        }
        let target = (self.0 & ADDRESS_MASK) + offset as u16;
        Self(self.0 & !ADDRESS_MASK | (target & ADDRESS_MASK))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(Instruction::nop().bits(), 0xA042);
        assert_eq!(Instruction::out(OutDestination::X, 16).bits(), 0x6030);
        assert_eq!(Instruction::out(OutDestination::Pins, 16).bits(), 0x6010);
        assert_eq!(Instruction::out(OutDestination::PinDirs, 16).bits(), 0x6090);
        assert_eq!(Instruction::in_(InSource::Pins, 16).bits(), 0x4010);
        assert_eq!(Instruction::pull(false, true).bits(), 0x80A0);
        assert_eq!(Instruction::push(false, true).bits(), 0x8020);
        assert_eq!(
            Instruction::mov(MovDestination::Osr, MovOp::Invert, MovSource::Null).bits(),
            0xA0EB
        );
        assert_eq!(
            Instruction::mov(MovDestination::Osr, MovOp::None, MovSource::Null).bits(),
            0xA0E3
        );
        assert_eq!(Instruction::set(SetDestination::PinDirs, 1).bits(), 0xE081);
        assert_eq!(Instruction::set(SetDestination::Pins, 1).bits(), 0xE001);
        assert_eq!(Instruction::jmp(JmpCondition::Pin, 4).bits(), 0x00C4);
        assert_eq!(Instruction::jmp(JmpCondition::XPostDecrement, 1).bits(), 0x0041);
    }

    #[test]
    fn test_side_set_and_delay() {
        // nop side 0 / nop side 1 [1]
        assert_eq!(Instruction::nop().side(false).bits(), 0xB042);
        assert_eq!(Instruction::nop().side(true).delay(1).bits(), 0xB942);
        assert_eq!(Instruction::in_(InSource::Pins, 16).delay(1).bits(), 0x4110);
    }

    #[test]
    #[should_panic]
    fn test_delay_overflow() {
        let _ = Instruction::nop().delay(MAX_DELAY + 1);
    }

    #[test]
    fn test_relocation() {
        let jmp = Instruction::jmp(JmpCondition::Pin, 4).side(true);
        assert_eq!(jmp.relocate(6).bits(), 0x18CA);

        let wrapped = Instruction::jmp(JmpCondition::Always, 30).relocate(4);
        assert_eq!(wrapped.bits() & 0x1F, 2);

        let out = Instruction::out(OutDestination::X, 16);
        assert_eq!(out.relocate(6), out);
    }
}
