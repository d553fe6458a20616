//! CRC-32 checksum engine
//!
//! Standard reflected CRC-32 (polynomial 0xEDB88320, init 0xFFFFFFFF, final
//! complement). The lookup table is built at compile time and shared read-only.

use crc::{Crc, CRC_32_ISO_HDLC};

use super::CHECKSUM_SIZE;

static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Compute the CRC-32 of `data`
#[inline]
pub fn compute(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Encode a checksum as the big-endian packet prefix
#[inline]
pub fn to_prefix(crc: u32) -> [u8; CHECKSUM_SIZE] {
    crc.to_be_bytes()
}

/// Read a big-endian checksum prefix, if at least 4 bytes are available
#[inline]
pub fn from_prefix(data: &[u8]) -> Option<u32> {
    let prefix: [u8; CHECKSUM_SIZE] = data.get(..CHECKSUM_SIZE)?.try_into().ok()?;
    Some(u32::from_be_bytes(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(compute(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute(&[]), 0);
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            compute(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn test_prefix_is_big_endian() {
        assert_eq!(to_prefix(0xCBF4_3926), [0xCB, 0xF4, 0x39, 0x26]);
        assert_eq!(from_prefix(&[0xCB, 0xF4, 0x39, 0x26, 0xFF]), Some(0xCBF4_3926));
        assert_eq!(from_prefix(&[0xCB, 0xF4, 0x39]), None);
    }
}
