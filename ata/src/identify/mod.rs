//! IDENTIFY DEVICE / IDENTIFY PACKET DEVICE response decoding.
//!
//! The response is 256 little-endian words. Most words changed meaning at
//! least once between ATA-1 and ATA-7, and several differ between ATA and
//! ATAPI devices, so every accessor on [`IdentityParser`] is a plain bit
//! view of one word (or word pair). Nothing cross-checks fields; callers
//! consult the relevant validity accessor first:
//!
//! | Word 53 bit | Accessor                   | Words gated |
//! |-------------|----------------------------|-------------|
//! | 0           | `current_params_valid`     | 54-58       |
//! | 1           | `timing_params_valid`      | 64-70       |
//! | 2           | `ultra_dma_modes_valid`    | 88          |
//!
//! Words 83, 84, 93, 106 and 119 carry their own `01b` signature in bits
//! 15:14 and read as empty when it is absent.

pub mod features;
pub mod strings;

pub use features::{CommandSet119, CommandSet82, CommandSet83, CommandSet84};
pub use strings::{FirmwareRevision, IdString, ModelNumber, SerialNumber};

use features::signature_valid;

/// Words in an IDENTIFY response.
pub const IDENTIFY_WORDS: usize = 256;

/// Low byte of word 255 when the checksum is present.
pub const CHECKSUM_SIGNATURE: u8 = 0xA5;

// ═══════════════════════════════════════════════════════════════════════════
// OWNED RESPONSE
// ═══════════════════════════════════════════════════════════════════════════

/// A captured IDENTIFY response.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentifyData {
    words: [u16; IDENTIFY_WORDS],
}

impl IdentifyData {
    /// Wrap words as read from the Data register.
    pub const fn from_words(words: [u16; IDENTIFY_WORDS]) -> Self {
        Self { words }
    }

    /// Decode a 512-byte little-endian image (as handed to a block consumer).
    pub fn from_bytes(bytes: &[u8; IDENTIFY_WORDS * 2]) -> Self {
        let mut words = [0u16; IDENTIFY_WORDS];
        for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Self { words }
    }

    /// Raw words.
    pub fn words(&self) -> &[u16; IDENTIFY_WORDS] {
        &self.words
    }

    /// Accessor view.
    pub fn parser(&self) -> IdentityParser<'_> {
        IdentityParser::new(&self.words)
    }
}

impl core::fmt::Debug for IdentifyData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let id = self.parser();
        f.debug_struct("IdentifyData")
            .field("atapi", &id.is_atapi())
            .field("model", &id.model_number())
            .field("serial", &id.serial_number())
            .field("firmware", &id.firmware_revision())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DECODED FIELDS
// ═══════════════════════════════════════════════════════════════════════════

/// Checksum state of word 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// No 0xA5 signature; the device does not provide a checksum
    Absent,
    /// Signature present and the byte sum is zero
    Valid,
    /// Signature present but the byte sum is not zero
    Mismatch,
}

/// Word 2, specific configuration (ATA-5 onward).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificConfiguration {
    /// 37C8h: SET FEATURES spin-up required, response incomplete
    SpinUpRequiredIncomplete,
    /// 738Ch: SET FEATURES spin-up required, response complete
    SpinUpRequiredComplete,
    /// 8C73h: no spin-up required, response incomplete
    IncompleteResponse,
    /// C837h: no spin-up required, response complete
    CompleteResponse,
}

impl SpecificConfiguration {
    /// Decode word 2; other values carry no meaning.
    pub const fn from_word(word: u16) -> Option<Self> {
        match word {
            0x37C8 => Some(Self::SpinUpRequiredIncomplete),
            0x738C => Some(Self::SpinUpRequiredComplete),
            0x8C73 => Some(Self::IncompleteResponse),
            0xC837 => Some(Self::CompleteResponse),
            _ => None,
        }
    }

    /// Whether the device waits for SET FEATURES before spinning up.
    pub const fn requires_spin_up(self) -> bool {
        matches!(
            self,
            Self::SpinUpRequiredIncomplete | Self::SpinUpRequiredComplete
        )
    }
}

/// Security erase time (words 89 and 90).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseTime {
    /// Value 0
    NotSpecified,
    /// Value 255
    MoreThan508Minutes,
    /// Any other value, in units of two minutes
    Minutes(u32),
}

impl EraseTime {
    /// Decode an erase time word.
    pub const fn from_word(word: u16) -> Self {
        match word {
            0 => Self::NotSpecified,
            255 => Self::MoreThan508Minutes,
            n => Self::Minutes(n as u32 * 2),
        }
    }
}

/// Word 106, physical/logical sector size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    /// Logical sectors per physical sector
    pub logical_per_physical: u16,
    /// Logical sector is longer than 256 words (size in words 117-118)
    pub long_logical_sectors: bool,
}

// ═══════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════

/// Read-only bit-level view over an IDENTIFY response.
#[derive(Clone, Copy)]
pub struct IdentityParser<'a> {
    data: &'a [u16; IDENTIFY_WORDS],
}

impl<'a> IdentityParser<'a> {
    /// View `data` as an IDENTIFY response.
    pub const fn new(data: &'a [u16; IDENTIFY_WORDS]) -> Self {
        Self { data }
    }

    /// Raw word access for fields without an accessor.
    pub const fn word(&self, index: usize) -> u16 {
        self.data[index]
    }

    const fn bit(&self, index: usize, bit: u32) -> bool {
        self.data[index] & (1 << bit) != 0
    }

    const fn dword(&self, index: usize) -> u32 {
        self.data[index] as u32 | (self.data[index + 1] as u32) << 16
    }

    // ─── word 0: general configuration ───────────────────────────────────

    /// Bits 15:14 are `10b` for ATAPI devices.
    pub const fn is_atapi(&self) -> bool {
        self.data[0] >> 14 == 0b10
    }

    /// Bit 2 (ATA-5; "soft sectored" in ATA-1).
    pub const fn is_response_incomplete(&self) -> bool {
        self.bit(0, 2)
    }

    /// Bit 7.
    pub const fn is_removable(&self) -> bool {
        self.bit(0, 7)
    }

    /// ATAPI command packet length in bytes (bits 1:0).
    pub const fn command_packet_size(&self) -> Option<u8> {
        match self.data[0] & 3 {
            0 => Some(12),
            1 => Some(16),
            _ => None,
        }
    }

    /// ATAPI DRQ response time code (bits 6:5).
    pub const fn drq_response_time(&self) -> u8 {
        ((self.data[0] >> 5) & 3) as u8
    }

    /// ATAPI peripheral device type (bits 12:8).
    pub const fn packet_command_set(&self) -> u8 {
        ((self.data[0] >> 8) & 0x1F) as u8
    }

    // ─── words 1-9: geometry and configuration ───────────────────────────

    /// Word 1 (obsolete from ATA-6).
    pub const fn num_cylinders(&self) -> u16 {
        self.data[1]
    }

    /// Word 2 raw.
    pub const fn specific_configuration(&self) -> u16 {
        self.data[2]
    }

    /// Word 2 decoded.
    pub const fn specific_configuration_kind(&self) -> Option<SpecificConfiguration> {
        SpecificConfiguration::from_word(self.data[2])
    }

    /// Word 3 (obsolete from ATA-6).
    pub const fn num_heads(&self) -> u16 {
        self.data[3]
    }

    /// Word 4 (obsolete from ATA-2).
    pub const fn num_bytes_per_track(&self) -> u16 {
        self.data[4]
    }

    /// Word 5 (obsolete from ATA-2).
    pub const fn num_bytes_per_sector(&self) -> u16 {
        self.data[5]
    }

    /// Word 6 (obsolete from ATA-6).
    pub const fn num_sectors_per_track(&self) -> u16 {
        self.data[6]
    }

    // ─── strings ─────────────────────────────────────────────────────────

    /// Words 10-19.
    pub fn serial_number(&self) -> SerialNumber {
        SerialNumber::from_words(&self.data[10..20])
    }

    /// Words 23-26.
    pub fn firmware_revision(&self) -> FirmwareRevision {
        FirmwareRevision::from_words(&self.data[23..27])
    }

    /// Words 27-46.
    pub fn model_number(&self) -> ModelNumber {
        ModelNumber::from_words(&self.data[27..47])
    }

    // ─── words 47-63 ─────────────────────────────────────────────────────

    /// Word 47 low byte.
    pub const fn max_read_write_multiple(&self) -> u8 {
        self.data[47] as u8
    }

    pub const fn dma_supported(&self) -> bool {
        self.bit(49, 8)
    }

    pub const fn lba_supported(&self) -> bool {
        self.bit(49, 9)
    }

    pub const fn can_disable_iordy(&self) -> bool {
        self.bit(49, 10)
    }

    pub const fn iordy_supported(&self) -> bool {
        self.bit(49, 11)
    }

    /// Word 49 bit 13 on ATA devices.
    pub const fn standard_standby_timer_values_supported(&self) -> bool {
        self.bit(49, 13)
    }

    /// Word 49 bit 13 on ATAPI devices.
    pub const fn overlapped_operation_supported(&self) -> bool {
        self.bit(49, 13)
    }

    pub const fn command_queueing_supported(&self) -> bool {
        self.bit(49, 14)
    }

    pub const fn interleaved_dma_supported(&self) -> bool {
        self.bit(49, 15)
    }

    /// Word 53 bit 0: words 54-58 are valid.
    pub const fn current_params_valid(&self) -> bool {
        self.bit(53, 0)
    }

    pub const fn num_current_cylinders(&self) -> u16 {
        self.data[54]
    }

    pub const fn num_current_heads(&self) -> u16 {
        self.data[55]
    }

    pub const fn num_current_sectors_per_track(&self) -> u16 {
        self.data[56]
    }

    /// Words 57-58.
    pub const fn current_capacity_sectors(&self) -> u32 {
        self.dword(57)
    }

    /// Word 59 bit 8.
    pub const fn rw_multiple_sector_setting_valid(&self) -> bool {
        self.bit(59, 8)
    }

    pub const fn current_read_write_multiple(&self) -> u8 {
        self.data[59] as u8
    }

    /// Words 60-61, the LBA28 capacity.
    pub const fn total_user_addressable_sectors(&self) -> u32 {
        self.dword(60)
    }

    /// Word 63 low byte.
    pub const fn multiword_dma_modes_supported(&self) -> u8 {
        self.data[63] as u8
    }

    // ─── words 64-70: timing (word 53 bit 1) ─────────────────────────────

    /// Word 53 bit 1: words 64-70 are valid.
    pub const fn timing_params_valid(&self) -> bool {
        self.bit(53, 1)
    }

    /// Word 64 low byte: bit 0 = PIO mode 3, bit 1 = PIO mode 4.
    pub const fn advanced_pio_modes_supported(&self) -> u8 {
        self.data[64] as u8
    }

    pub const fn min_mw_dma_cycle_time(&self) -> u16 {
        self.data[65]
    }

    pub const fn rec_mw_dma_cycle_time(&self) -> u16 {
        self.data[66]
    }

    /// Word 67, without IORDY flow control.
    pub const fn min_pio_cycle_time(&self) -> u16 {
        self.data[67]
    }

    /// Word 68, with IORDY flow control.
    pub const fn min_pio_cycle_time_iordy(&self) -> u16 {
        self.data[68]
    }

    // ─── words 75-81 ─────────────────────────────────────────────────────

    /// `(word 75 & 0x1F) + 1`
    pub const fn queue_depth(&self) -> u8 {
        (self.data[75] & 0x1F) as u8 + 1
    }

    /// Index of the highest bit set in word 80.
    ///
    /// `None` when the word is 0000h or FFFFh (not reported).
    pub const fn major_version(&self) -> Option<u8> {
        match self.data[80] {
            0 | 0xFFFF => None,
            w => Some((15 - w.leading_zeros()) as u8),
        }
    }

    pub const fn minor_version(&self) -> u16 {
        self.data[81]
    }

    // ─── words 82-84, 119: command sets ──────────────────────────────────

    /// Word 82 or 83 reports command sets (neither is 0000h or FFFFh).
    pub const fn command_set_notification_supported(&self) -> bool {
        let w82 = self.data[82];
        let w83 = self.data[83];
        (w82 != 0 && w82 != 0xFFFF) || (w83 != 0 && w83 != 0xFFFF)
    }

    /// Word 82, empty when it reads FFFFh.
    pub const fn command_set_82(&self) -> CommandSet82 {
        match self.data[82] {
            0xFFFF => CommandSet82::empty(),
            w => CommandSet82::from_bits_truncate(w),
        }
    }

    /// Word 83, empty without its signature.
    pub const fn command_set_83(&self) -> CommandSet83 {
        if signature_valid(self.data[83]) {
            CommandSet83::from_bits_truncate(self.data[83])
        } else {
            CommandSet83::empty()
        }
    }

    /// Word 84, empty without its signature.
    pub const fn command_set_84(&self) -> CommandSet84 {
        if signature_valid(self.data[84]) {
            CommandSet84::from_bits_truncate(self.data[84])
        } else {
            CommandSet84::empty()
        }
    }

    /// Word 119, empty without its signature.
    pub const fn command_set_119(&self) -> CommandSet119 {
        if signature_valid(self.data[119]) {
            CommandSet119::from_bits_truncate(self.data[119])
        } else {
            CommandSet119::empty()
        }
    }

    pub fn smart_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::SMART)
    }

    pub fn security_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::SECURITY)
    }

    pub fn removable_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::REMOVABLE)
    }

    pub fn power_management_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::POWER_MANAGEMENT)
    }

    pub fn packet_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::PACKET)
    }

    pub fn write_cache_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::WRITE_CACHE)
    }

    pub fn look_ahead_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::LOOK_AHEAD)
    }

    pub fn release_interrupt_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::RELEASE_INTERRUPT)
    }

    pub fn service_interrupt_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::SERVICE_INTERRUPT)
    }

    pub fn device_reset_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::DEVICE_RESET)
    }

    pub fn host_protected_area_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::HOST_PROTECTED_AREA)
    }

    pub fn write_buffer_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::WRITE_BUFFER)
    }

    pub fn read_buffer_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::READ_BUFFER)
    }

    pub fn nop_supported(&self) -> bool {
        self.command_set_82().contains(CommandSet82::NOP)
    }

    pub fn download_microcode_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::DOWNLOAD_MICROCODE)
    }

    pub fn rw_dma_queued_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::RW_DMA_QUEUED)
    }

    pub fn cfa_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::CFA)
    }

    pub fn apm_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::APM)
    }

    pub fn removable_media_status_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::REMOVABLE_MEDIA_STATUS)
    }

    pub fn power_up_in_standby_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::POWER_UP_IN_STANDBY)
    }

    pub fn set_features_required_to_spin_up(&self) -> bool {
        self.command_set_83().contains(CommandSet83::SET_FEATURES_SPIN_UP)
    }

    pub fn set_max_security_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::SET_MAX_SECURITY)
    }

    pub fn auto_acoustic_management_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::AUTO_ACOUSTIC_MANAGEMENT)
    }

    pub fn address_48bit_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::ADDRESS_48BIT)
    }

    pub fn device_config_overlay_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::DEVICE_CONFIG_OVERLAY)
    }

    pub fn flush_cache_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::FLUSH_CACHE)
    }

    pub fn flush_cache_ext_supported(&self) -> bool {
        self.command_set_83().contains(CommandSet83::FLUSH_CACHE_EXT)
    }

    pub fn smart_error_logging_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::SMART_ERROR_LOGGING)
    }

    pub fn smart_self_test_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::SMART_SELF_TEST)
    }

    pub fn media_serial_number_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::MEDIA_SERIAL_NUMBER)
    }

    pub fn media_card_pass_through_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::MEDIA_CARD_PASS_THROUGH)
    }

    pub fn general_purpose_logging_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::GENERAL_PURPOSE_LOGGING)
    }

    pub fn write_fua_ext_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::WRITE_FUA_EXT)
    }

    pub fn world_wide_name_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::WORLD_WIDE_NAME)
    }

    pub fn idle_immediate_unload_supported(&self) -> bool {
        self.command_set_84().contains(CommandSet84::IDLE_IMMEDIATE_UNLOAD)
    }

    pub fn write_read_verify_supported(&self) -> bool {
        self.command_set_119().contains(CommandSet119::WRITE_READ_VERIFY)
    }

    pub fn free_fall_control_supported(&self) -> bool {
        self.command_set_119().contains(CommandSet119::FREE_FALL_CONTROL)
    }

    // ─── words 88-93 ─────────────────────────────────────────────────────

    /// Word 53 bit 2: word 88 is valid.
    pub const fn ultra_dma_modes_valid(&self) -> bool {
        self.bit(53, 2)
    }

    /// Word 88 low byte.
    pub const fn ultra_dma_modes_supported(&self) -> u8 {
        self.data[88] as u8
    }

    /// Highest Ultra DMA mode (0-6) supported, if word 88 is valid.
    pub const fn highest_ultra_dma_mode(&self) -> Option<u8> {
        let modes = self.ultra_dma_modes_supported() & 0x7F;
        if !self.ultra_dma_modes_valid() || modes == 0 {
            return None;
        }
        Some(7 - modes.leading_zeros() as u8)
    }

    /// Word 89 raw.
    pub const fn security_erase_time(&self) -> u16 {
        self.data[89]
    }

    /// Word 90 raw.
    pub const fn enhanced_security_erase_time(&self) -> u16 {
        self.data[90]
    }

    pub const fn security_erase_duration(&self) -> EraseTime {
        EraseTime::from_word(self.data[89])
    }

    pub const fn enhanced_security_erase_duration(&self) -> EraseTime {
        EraseTime::from_word(self.data[90])
    }

    /// Word 93, if its signature is present.
    pub const fn hardware_reset_result(&self) -> Option<u16> {
        if signature_valid(self.data[93]) {
            Some(self.data[93])
        } else {
            None
        }
    }

    /// Word 93 bit 13: an 80-conductor cable was detected (device 0 only).
    pub const fn cable_80_conductor_detected(&self) -> bool {
        match self.hardware_reset_result() {
            Some(w) => w & (1 << 13) != 0,
            None => false,
        }
    }

    // ─── words 106, 117-118: sector size ─────────────────────────────────

    /// Word 106, if its signature is present.
    pub const fn sector_layout(&self) -> Option<SectorLayout> {
        let w = self.data[106];
        if !signature_valid(w) {
            return None;
        }

        let logical_per_physical = if w & (1 << 13) != 0 {
            1 << (w & 0xF)
        } else {
            1
        };

        Some(SectorLayout {
            logical_per_physical,
            long_logical_sectors: w & (1 << 12) != 0,
        })
    }

    /// Logical sector size in bytes: words 117-118 (in words) when word 106
    /// says so, otherwise 512.
    pub const fn logical_sector_size(&self) -> u32 {
        match self.sector_layout() {
            Some(SectorLayout {
                long_logical_sectors: true,
                ..
            }) => self.dword(117).saturating_mul(2),
            _ => 512,
        }
    }

    // ─── word 255: integrity ─────────────────────────────────────────────

    /// Word 255 low byte is the 0xA5 signature, i.e. a checksum is present.
    pub const fn checksum_valid(&self) -> bool {
        self.data[255] as u8 == CHECKSUM_SIGNATURE
    }

    /// Word 255 high byte.
    pub const fn checksum(&self) -> u8 {
        (self.data[255] >> 8) as u8
    }

    /// Sum of all 512 bytes modulo 256; zero for an intact response.
    pub fn checksum_sum(&self) -> u8 {
        self.data.iter().fold(0u8, |sum, &w| {
            sum.wrapping_add(w as u8).wrapping_add((w >> 8) as u8)
        })
    }

    /// Combined signature and sum check.
    pub fn verify_checksum(&self) -> ChecksumStatus {
        if !self.checksum_valid() {
            ChecksumStatus::Absent
        } else if self.checksum_sum() == 0 {
            ChecksumStatus::Valid
        } else {
            ChecksumStatus::Mismatch
        }
    }
}
