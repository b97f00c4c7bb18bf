//! Command set and feature support words (82, 83, 84, 119).

use bitflags::bitflags;

/// Signature in bits 15:14 marking words 83, 84, 93, 106 and 119 as valid.
pub(crate) const WORD_VALID_SIGNATURE: u16 = 0b01;

/// Whether a signature-carrying word is valid.
pub(crate) const fn signature_valid(word: u16) -> bool {
    word >> 14 == WORD_VALID_SIGNATURE
}

bitflags! {
    /// Word 82: command sets supported (ATA-3 onward).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandSet82: u16 {
        const SMART = 1 << 0;
        const SECURITY = 1 << 1;
        const REMOVABLE = 1 << 2;
        const POWER_MANAGEMENT = 1 << 3;
        const PACKET = 1 << 4;
        const WRITE_CACHE = 1 << 5;
        const LOOK_AHEAD = 1 << 6;
        const RELEASE_INTERRUPT = 1 << 7;
        const SERVICE_INTERRUPT = 1 << 8;
        const DEVICE_RESET = 1 << 9;
        const HOST_PROTECTED_AREA = 1 << 10;
        const WRITE_BUFFER = 1 << 12;
        const READ_BUFFER = 1 << 13;
        const NOP = 1 << 14;
    }
}

bitflags! {
    /// Word 83: command sets supported (ATA-4 onward).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandSet83: u16 {
        const DOWNLOAD_MICROCODE = 1 << 0;
        const RW_DMA_QUEUED = 1 << 1;
        const CFA = 1 << 2;
        const APM = 1 << 3;
        const REMOVABLE_MEDIA_STATUS = 1 << 4;
        const POWER_UP_IN_STANDBY = 1 << 5;
        const SET_FEATURES_SPIN_UP = 1 << 6;
        const SET_MAX_SECURITY = 1 << 8;
        const AUTO_ACOUSTIC_MANAGEMENT = 1 << 9;
        const ADDRESS_48BIT = 1 << 10;
        const DEVICE_CONFIG_OVERLAY = 1 << 11;
        const FLUSH_CACHE = 1 << 12;
        const FLUSH_CACHE_EXT = 1 << 13;
    }
}

bitflags! {
    /// Word 84: command set/feature supported extension.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandSet84: u16 {
        const SMART_ERROR_LOGGING = 1 << 0;
        const SMART_SELF_TEST = 1 << 1;
        const MEDIA_SERIAL_NUMBER = 1 << 2;
        const MEDIA_CARD_PASS_THROUGH = 1 << 3;
        const GENERAL_PURPOSE_LOGGING = 1 << 5;
        const WRITE_FUA_EXT = 1 << 6;
        const WRITE_QUEUED_FUA_EXT = 1 << 7;
        const WORLD_WIDE_NAME = 1 << 8;
        const IDLE_IMMEDIATE_UNLOAD = 1 << 13;
    }
}

bitflags! {
    /// Word 119: command set/feature supported (ATA8-ACS).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandSet119: u16 {
        const WRITE_READ_VERIFY = 1 << 1;
        const WRITE_UNCORRECTABLE_EXT = 1 << 2;
        const RW_LOG_DMA_EXT = 1 << 3;
        const DOWNLOAD_MICROCODE_OFFSET = 1 << 4;
        const FREE_FALL_CONTROL = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        assert!(signature_valid(0x4000));
        assert!(signature_valid(0x7FFF));
        assert!(!signature_valid(0xC000));
        assert!(!signature_valid(0x0000));
        assert!(!signature_valid(0xFFFF));
    }

    #[test]
    fn test_signature_bits_are_not_flags() {
        assert!(!CommandSet83::from_bits_truncate(0x4000).contains(CommandSet83::FLUSH_CACHE));
        assert_eq!(CommandSet84::from_bits_truncate(0x4000), CommandSet84::empty());
    }
}
