//! Parallel ATA/ATAPI Host Controller
//!
//! A `no_std` driver for a 16-bit parallel ATA channel whose bus cycles are
//! generated by two RP2040 PIO state machines instead of a host adapter.
//!
//! # Overview
//!
//! The crate provides:
//! - Task-file register access over programmable I/O lanes
//! - Status polling with optional bounds (attempt count or deadline)
//! - LBA28 sector reads and writes, FLUSH CACHE, SET FEATURES
//! - IDENTIFY (PACKET) DEVICE decoding, including strings and checksum
//! - PIO mode negotiation and bus retiming from the IDENTIFY timing words
//! - ATAPI packet commands (TEST UNIT READY, INQUIRY, READ(10))
//! - A `gpt_disk_io::BlockIo` adapter for partition and filesystem readers
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Lanes** - the hardware seam ([`Lanes`], [`rp2040::Rp2040Lanes`])
//! 2. **Engine** - single register accesses and Data bursts ([`BusEngine`])
//! 3. **Protocol** - status polling, resets, data phases ([`AtaController`])
//! 4. **Commands** - sector transfers, IDENTIFY and ATAPI packets
//! 5. **Block I/O** - 512-byte block devices on top of the commands
//!
//! # Usage
//!
//! ```ignore
//! use pio_ata::{AtaController, Device, IdentifyCommand, PollPolicy};
//! use pio_ata::rp2040::{PinConfig, Rp2040Lanes};
//!
//! let lanes = unsafe { Rp2040Lanes::new(PinConfig::DEFAULT, 125_000_000) };
//! let mut ata = AtaController::with_poll_policy(lanes, PollPolicy::Attempts(1_000_000));
//!
//! ata.reset()?;
//! let timing = ata.negotiate_pio_timing(Device::Device0, IdentifyCommand::Device)?;
//!
//! let mut disk = pio_ata::AtaBlockDevice::new(&mut ata, Device::Device0);
//! let gpt = gpt_disk_io::Disk::new(&mut disk)?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod atapi;
pub mod block_io;
pub mod device;
pub mod engine;
pub mod error;
pub mod identify;
pub mod lanes;
pub mod pio;
pub mod poll;
pub mod protocol;
pub mod regs;
pub mod shared;
pub mod timing;
pub mod transfer;

#[cfg(feature = "rp2040")]
pub mod rp2040;

pub use atapi::{Cdb, InquiryData, SenseKey};
pub use block_io::AtaBlockDevice;
pub use device::{Device, DeviceKind, DeviceSelector, Lba28};
pub use engine::BusEngine;
pub use error::{AtaError, Result};
pub use identify::{IdentifyData, IdentityParser};
pub use lanes::{Lane, Lanes};
pub use poll::PollPolicy;
pub use protocol::AtaController;
pub use regs::{Command, Register, Status};
pub use shared::{SharedBlockDevice, SharedBus};
pub use timing::{PioMode, PioTiming};
pub use transfer::{Capacity, IdentifyCommand};
