//! SCSI command descriptor blocks and sense keys.

/// Length of an ATAPI command packet.
pub const CDB_LEN: usize = 12;

/// Words pushed through the write lane per command packet.
pub const CDB_WORDS: usize = CDB_LEN / 2;

/// SCSI operation codes issued by the driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScsiOpcode {
    /// TEST UNIT READY, no data
    TestUnitReady = 0x00,
    /// INQUIRY, standard data in
    Inquiry = 0x12,
    /// READ(10), 32-bit LBA and 16-bit block count
    Read10 = 0x28,
}

/// SCSI sense key, reported in the upper nibble of the ATAPI Error register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseKey {
    /// No error to report
    NoSense = 0x0,
    /// Completed after device recovery
    RecoveredError = 0x1,
    /// No medium, or the unit is spinning up
    NotReady = 0x2,
    /// Unrecoverable flaw on the medium
    MediumError = 0x3,
    /// Device hardware failure
    HardwareError = 0x4,
    /// Bad CDB or parameter
    IllegalRequest = 0x5,
    /// Medium changed or device reset since the last command
    UnitAttention = 0x6,
    /// Write-protected block
    DataProtect = 0x7,
    /// Blank or end-of-data area reached
    BlankCheck = 0x8,
    /// Vendor-defined condition
    VendorSpecific = 0x9,
    /// COPY command aborted
    CopyAborted = 0xA,
    /// Command aborted by the device
    AbortedCommand = 0xB,
    /// End of partition reached with data left
    VolumeOverflow = 0xD,
    /// Source and medium data differ
    Miscompare = 0xE,
}

impl SenseKey {
    /// Decode a 4-bit sense key. 0xC and 0xF are reserved.
    pub const fn from_nibble(key: u8) -> Option<Self> {
        Some(match key & 0xF {
            0x0 => Self::NoSense,
            0x1 => Self::RecoveredError,
            0x2 => Self::NotReady,
            0x3 => Self::MediumError,
            0x4 => Self::HardwareError,
            0x5 => Self::IllegalRequest,
            0x6 => Self::UnitAttention,
            0x7 => Self::DataProtect,
            0x8 => Self::BlankCheck,
            0x9 => Self::VendorSpecific,
            0xA => Self::CopyAborted,
            0xB => Self::AbortedCommand,
            0xD => Self::VolumeOverflow,
            0xE => Self::Miscompare,
            _ => return None,
        })
    }

    /// Sense key carried by an ATAPI Error register value.
    pub const fn from_error_register(error: u8) -> Option<Self> {
        Self::from_nibble(error >> 4)
    }
}

/// A 12-byte command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cdb([u8; CDB_LEN]);

impl Cdb {
    /// Wrap raw packet bytes.
    pub const fn from_bytes(bytes: [u8; CDB_LEN]) -> Self {
        Self(bytes)
    }

    /// TEST UNIT READY.
    pub const fn test_unit_ready() -> Self {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = ScsiOpcode::TestUnitReady as u8;
        Self(cdb)
    }

    /// INQUIRY, standard data, `allocation_length` bytes.
    pub const fn inquiry(allocation_length: u16) -> Self {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = ScsiOpcode::Inquiry as u8;
        cdb[3] = (allocation_length >> 8) as u8;
        cdb[4] = allocation_length as u8;
        Self(cdb)
    }

    /// READ(10) of `blocks` blocks from `lba`.
    pub const fn read10(lba: u32, blocks: u16) -> Self {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = ScsiOpcode::Read10 as u8;
        cdb[2] = (lba >> 24) as u8;
        cdb[3] = (lba >> 16) as u8;
        cdb[4] = (lba >> 8) as u8;
        cdb[5] = lba as u8;
        cdb[7] = (blocks >> 8) as u8;
        cdb[8] = blocks as u8;
        Self(cdb)
    }

    pub const fn opcode(&self) -> u8 {
        self.0[0]
    }

    pub const fn as_bytes(&self) -> &[u8; CDB_LEN] {
        &self.0
    }

    /// Data register words: byte `2i` goes out on DD7..0 of word `i`.
    pub const fn to_words(&self) -> [u16; CDB_WORDS] {
        let mut words = [0u16; CDB_WORDS];
        let mut i = 0;
        while i < CDB_WORDS {
            words[i] = u16::from_le_bytes([self.0[2 * i], self.0[2 * i + 1]]);
            i += 1;
        }
        words
    }
}
