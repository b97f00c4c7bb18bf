//! ASCII string fields of the IDENTIFY response.
//!
//! Each word carries two characters with the first one in the high byte.
//! Fields are space-padded on the right and have no terminator of their
//! own; [`IdString`] adds one.

use core::fmt;

/// Serial number, words 10-19.
pub type SerialNumber = IdString<21>;

/// Firmware revision, words 23-26.
pub type FirmwareRevision = IdString<9>;

/// Model number, words 27-46.
pub type ModelNumber = IdString<41>;

/// A fixed-size identify string: `N - 1` characters and a trailing NUL.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> IdString<N> {
    /// Number of characters carried (excluding the NUL).
    pub const LEN: usize = N - 1;

    /// Unpack byte-swapped pairs starting at `words[0]`.
    ///
    /// # Panics
    /// If `words` holds fewer than `LEN / 2` words.
    pub fn from_words(words: &[u16]) -> Self {
        let mut bytes = [0u8; N];

        for (pair, &word) in bytes[..Self::LEN]
            .chunks_exact_mut(2)
            .zip(words[..Self::LEN / 2].iter())
        {
            pair[0] = (word >> 8) as u8;
            pair[1] = word as u8;
        }

        Self { bytes }
    }

    /// Raw characters including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw characters, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..Self::LEN]
    }

    /// Characters with trailing padding removed.
    pub fn trimmed(&self) -> &[u8] {
        let bytes = self.as_bytes();
        let end = bytes
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |i| i + 1);
        &bytes[..end]
    }

    /// Trimmed field as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.trimmed()).ok()
    }
}

impl<const N: usize> fmt::Display for IdString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.trimmed() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for IdString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(text: &[u8]) -> [u16; 20] {
        let mut words = [0x2020u16; 20];
        for (word, pair) in words.iter_mut().zip(text.chunks(2)) {
            let hi = pair[0] as u16;
            let lo = pair.get(1).copied().unwrap_or(b' ') as u16;
            *word = hi << 8 | lo;
        }
        words
    }

    #[test]
    fn test_byte_order() {
        let s = FirmwareRevision::from_words(&[0x3132, 0x3334, 0x2020, 0x2020]);
        assert_eq!(s.as_bytes_with_nul(), b"1234    \0");
        assert_eq!(s.as_str(), Some("1234"));
    }

    #[test]
    fn test_model_padding() {
        let words = pack(b"QEMU HARDDISK");
        let s = ModelNumber::from_words(&words);
        assert_eq!(s.as_bytes().len(), 40);
        assert_eq!(s.as_str(), Some("QEMU HARDDISK"));
        assert_eq!(s.as_bytes_with_nul()[40], 0);
    }

    #[test]
    fn test_display_masks_control_bytes() {
        let s = FirmwareRevision::from_words(&[0x4101, 0x4220, 0x2020, 0x2020]);
        assert_eq!(format!("{}", s), "A?B");
        assert_eq!(format!("{:?}", s), "\"A?B\"");
    }
}
