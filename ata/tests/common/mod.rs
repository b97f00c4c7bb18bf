//! Common test utilities and a simulated ATA device

#![allow(dead_code)]

use std::collections::VecDeque;

use pio_ata::regs::Command;
use pio_ata::{AtaController, Lane, Lanes, PollPolicy, Register, Status};

/// System clock the simulated lanes report
pub const SIM_CLOCK_HZ: u32 = 125_000_000;

/// Something the controller did to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Enabled(bool),
    Divisor(Lane, u16),
    Reset(bool),
    Delay(u32),
    /// Single register write (Data writes included, one per word)
    Write(Register, u16),
    /// Single register read
    Read(Register),
    /// Multi-word read of the Data register
    Burst(usize),
}

/// Simulated device behind a pair of lanes.
///
/// Status reads pop `statuses` and then keep returning the last value
/// popped (`idle` before the first pop). Alternate Status never pops.
/// With a `disk` attached, READ/WRITE SECTOR(S) are executed against it.
pub struct SimDevice {
    pub statuses: VecDeque<u8>,
    pub idle: u8,
    pub error: u8,
    /// Byte counts for successive ATAPI data phases
    pub byte_counts: VecDeque<u16>,
    byte_count: u16,
    /// Words returned by Data reads, zero once drained
    pub data: VecDeque<u16>,
    /// Words written to the Data register
    pub written: Vec<u16>,
    pub events: Vec<Event>,
    pub disk: Option<Vec<u8>>,
    write_cursor: Option<usize>,
    shadow: [u16; 32],
    selected: Register,
    rx: VecDeque<u32>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self {
            statuses: VecDeque::new(),
            idle: (Status::DRDY | Status::DRQ).bits(),
            error: 0,
            byte_counts: VecDeque::new(),
            byte_count: 0,
            data: VecDeque::new(),
            written: Vec::new(),
            events: Vec::new(),
            disk: None,
            write_cursor: None,
            shadow: [0; 32],
            selected: Register::Status,
            rx: VecDeque::new(),
        }
    }

    /// Device with `sectors` zeroed 512-byte sectors.
    pub fn with_disk(sectors: usize) -> Self {
        let mut sim = Self::new();
        sim.disk = Some(vec![0u8; sectors * 512]);
        sim
    }

    pub fn script(mut self, statuses: &[u8]) -> Self {
        self.statuses.extend(statuses.iter().copied());
        self
    }

    pub fn with_data(mut self, words: &[u16]) -> Self {
        self.data.extend(words.iter().copied());
        self
    }

    /// Events after the controller's initial timing setup.
    pub fn bus_events(&self) -> &[Event] {
        let setup = self
            .events
            .iter()
            .position(|e| *e == Event::Enabled(true))
            .map_or(0, |i| i + 1);
        &self.events[setup..]
    }

    pub fn status_reads(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::Read(Register::Status))
            .count()
    }

    pub fn bursts(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Burst(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Register writes other than Data, in order.
    pub fn register_writes(&self) -> Vec<(Register, u16)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(reg, v) if *reg != Register::Data => Some((*reg, *v)),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<u8> {
        self.register_writes()
            .into_iter()
            .filter(|(reg, _)| *reg == Register::Command)
            .map(|(_, v)| v as u8)
            .collect()
    }

    pub fn last_write(&self, reg: Register) -> Option<u16> {
        self.register_writes()
            .into_iter()
            .rev()
            .find(|(r, _)| *r == reg)
            .map(|(_, v)| v)
    }

    fn task_file_lba(&self) -> usize {
        let reg = |r: Register| (self.shadow[r.address() as usize] & 0xFF) as usize;
        (reg(Register::Device) & 0x0F) << 24
            | reg(Register::LbaHigh) << 16
            | reg(Register::LbaMid) << 8
            | reg(Register::LbaLow)
    }

    fn task_file_count(&self) -> usize {
        match self.shadow[Register::SectorCount.address() as usize] & 0xFF {
            0 => 256,
            n => n as usize,
        }
    }

    fn execute(&mut self, opcode: u8) {
        let Some(disk) = self.disk.as_ref() else {
            return;
        };

        let start = self.task_file_lba() * 512;
        let len = self.task_file_count() * 512;

        if opcode == Command::ReadSectors as u8 {
            let bytes = &disk[start..start + len];
            self.data.extend(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
            );
        } else if opcode == Command::WriteSectors as u8 {
            self.write_cursor = Some(start);
        }
    }

    fn read(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Status => {
                if let Some(s) = self.statuses.pop_front() {
                    self.idle = s;
                }
                self.idle as u16
            }
            Register::AltStatus => self.idle as u16,
            Register::Error => self.error as u16,
            Register::LbaMid => {
                if let Some(n) = self.byte_counts.pop_front() {
                    self.byte_count = n;
                }
                self.byte_count & 0xFF
            }
            Register::LbaHigh => self.byte_count >> 8,
            Register::Data => self.data.pop_front().unwrap_or(0),
            other => self.shadow[other.address() as usize],
        }
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Lanes for SimDevice {
    fn select(&mut self, reg: Register) {
        self.selected = reg;
    }

    fn push(&mut self, lane: Lane, word: u32) {
        let reg = self.selected;
        match lane {
            Lane::Read => {
                let count = (word >> 16) as usize + 1;
                if reg == Register::Data {
                    self.events.push(Event::Burst(count));
                    for _ in 0..count {
                        let w = self.read(Register::Data);
                        self.rx.push_back(w as u32);
                    }
                } else {
                    self.events.push(Event::Read(reg));
                    let v = self.read(reg);
                    self.rx.push_back(v as u32);
                }
            }
            Lane::Write => {
                let value = (word >> 16) as u16;
                self.events.push(Event::Write(reg, value));
                if reg == Register::Data {
                    self.written.push(value);
                    if let (Some(cursor), Some(disk)) = (self.write_cursor, self.disk.as_mut()) {
                        disk[cursor..cursor + 2].copy_from_slice(&value.to_le_bytes());
                        self.write_cursor = Some(cursor + 2);
                    }
                } else {
                    self.shadow[reg.address() as usize] = value;
                    if reg == Register::Command {
                        self.execute(value as u8);
                    }
                }
            }
        }
    }

    fn pull(&mut self) -> u32 {
        self.rx.pop_front().expect("read lane underrun")
    }

    fn clear_stall(&mut self, _lane: Lane) {}

    fn is_stalled(&mut self, _lane: Lane) -> bool {
        true
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.events.push(Event::Enabled(enabled));
    }

    fn set_clock_divisor(&mut self, lane: Lane, divisor: u16) {
        self.events.push(Event::Divisor(lane, divisor));
    }

    fn system_clock_hz(&self) -> u32 {
        SIM_CLOCK_HZ
    }

    fn set_reset(&mut self, asserted: bool) {
        self.events.push(Event::Reset(asserted));
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(Event::Delay(us));
    }
}

/// Controller over `sim`, giving up after 1000 polls per loop.
pub fn controller(sim: SimDevice) -> AtaController<SimDevice> {
    AtaController::with_poll_policy(sim, PollPolicy::Attempts(1_000))
}

/// Status byte helper
pub fn st(flags: Status) -> u8 {
    flags.bits()
}

/// Build an IDENTIFY response from (word, value) pairs.
pub fn identify_words(entries: &[(usize, u16)]) -> [u16; 256] {
    let mut words = [0u16; 256];
    for &(i, v) in entries {
        words[i] = v;
    }
    words
}

/// Set word 255 so the response carries a valid checksum.
pub fn seal_checksum(words: &mut [u16; 256]) {
    words[255] = 0x00A5;
    let sum = words
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .fold(0u8, |acc, b| acc.wrapping_add(b));
    words[255] |= (0u8.wrapping_sub(sum) as u16) << 8;
}

/// Pack an ATA string into words, two characters per word, first in the high byte.
pub fn ata_string(s: &[u8]) -> Vec<u16> {
    s.chunks(2)
        .map(|c| (c[0] as u16) << 8 | *c.get(1).unwrap_or(&b' ') as u16)
        .collect()
}
