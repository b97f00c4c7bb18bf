//! Error types for ATA bus operations

use core::fmt;

use crate::regs::Status;

/// Result type for ATA bus operations
pub type Result<T> = core::result::Result<T, AtaError>;

/// Errors that can occur while driving the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaError {
    /// Device reported ERR in the Status register.
    ///
    /// `error` is the Error register sampled right after the failing status.
    /// For ATAPI devices its upper nibble is the SCSI sense key.
    Device {
        /// Status register at the time of failure
        status: Status,
        /// Error register contents
        error: u8,
    },

    /// The injected poll policy gave up before the device made progress
    Timeout {
        /// Number of status samples taken before giving up
        polls: u32,
    },

    /// LBA does not fit in 28 bits
    LbaOutOfRange,

    /// Buffer length is not a whole number of sectors
    BufferMisaligned,

    /// Operation not supported by this device or driver
    Unsupported,
}

impl AtaError {
    /// SCSI sense key carried by an ATAPI device error, if any.
    pub fn sense_key(&self) -> Option<crate::atapi::SenseKey> {
        match self {
            Self::Device { error, .. } => crate::atapi::SenseKey::from_error_register(*error),
            _ => None,
        }
    }

    /// Whether this is a liveness failure rather than a device-reported one.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for AtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { status, error } => write!(
                f,
                "Device error (status {:#04x}, error {:#04x})",
                status.bits(),
                error
            ),
            Self::Timeout { polls } => write!(f, "Device timed out after {} polls", polls),
            Self::LbaOutOfRange => write!(f, "LBA exceeds 28-bit addressing"),
            Self::BufferMisaligned => write!(f, "Buffer is not a whole number of sectors"),
            Self::Unsupported => write!(f, "Operation not supported"),
        }
    }
}
