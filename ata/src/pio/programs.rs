//! Read and write lane programs.
//!
//! Both are written against program-relative addresses and relocated when
//! loaded. IORDY is the JMP pin of both state machines; the strobe is the
//! side-set pin.

use super::{
    InSource, Instruction, JmpCondition, MovDestination, MovOp, MovSource, OutDestination,
};

/// A PIO program with its wrap window.
#[derive(Debug, Clone, Copy)]
pub struct Program<const N: usize> {
    pub instructions: [Instruction; N],
    /// First instruction after wrapping (program-relative)
    pub wrap_target: u8,
    /// Last instruction before wrapping (program-relative)
    pub wrap: u8,
}

impl<const N: usize> Program<N> {
    pub const LEN: usize = N;

    /// Encoded instructions for a program loaded at `offset`.
    pub const fn relocated(&self, offset: u8) -> [u16; N] {
        let mut words = [0u16; N];
        let mut i = 0;
        while i < N {
            words[i] = self.instructions[i].relocate(offset).bits();
            i += 1;
        }
        words
    }
}

/// Read lane.
///
/// Takes `count - 1` from the upper half of each autopulled word, then for
/// each word asserts DIOR-, waits for IORDY, samples the 16 data pins and
/// releases DIOR-. Six cycles per word. With the transmit FIFO empty the
/// autopull of the next count stalls, which is the completion signal.
///
/// ```text
/// 0:  out x, 16          side 1
/// 1:  nop                side 0
/// 2:  jmp pin 4
/// 3:  jmp 2
/// 4:  in pins, 16            [1]
/// 5:  jmp x-- 1          side 1 [1]
/// ```
pub const READ_PROGRAM: Program<6> = Program {
    instructions: [
        Instruction::out(OutDestination::X, 16).side(true),
        Instruction::nop().side(false),
        Instruction::jmp(JmpCondition::Pin, 4),
        Instruction::jmp(JmpCondition::Always, 2),
        Instruction::in_(InSource::Pins, 16).delay(1),
        Instruction::jmp(JmpCondition::XPostDecrement, 1)
            .side(true)
            .delay(1),
    ],
    wrap_target: 0,
    wrap: 5,
};

/// Write lane.
///
/// Pulls one data word, puts it on the (still released) data pins, drives
/// the bus while asserting DIOW-, waits for IORDY, then releases DIOW- and
/// the bus. The blocking pull on an empty transmit FIFO is the completion
/// signal. Eight cycles per word, never shorter than the read lane.
///
/// ```text
/// 0:  pull block         side 1
/// 1:  out pins, 16
/// 2:  mov osr, ~null
/// 3:  out pindirs, 16    side 0 [1]
/// 4:  jmp pin 6
/// 5:  jmp 4
/// 6:  mov osr, null      side 1
/// 7:  out pindirs, 16
/// ```
pub const WRITE_PROGRAM: Program<8> = Program {
    instructions: [
        Instruction::pull(false, true).side(true),
        Instruction::out(OutDestination::Pins, 16),
        Instruction::mov(MovDestination::Osr, MovOp::Invert, MovSource::Null),
        Instruction::out(OutDestination::PinDirs, 16)
            .side(false)
            .delay(1),
        Instruction::jmp(JmpCondition::Pin, 6),
        Instruction::jmp(JmpCondition::Always, 4),
        Instruction::mov(MovDestination::Osr, MovOp::None, MovSource::Null).side(true),
        Instruction::out(OutDestination::PinDirs, 16),
    ],
    wrap_target: 0,
    wrap: 7,
};
