//! Conversions between 64-bit values and the 48-bit keys stored in the tree.

mod codec;

pub(crate) use codec::*;

/// The number of bytes in every key stored in the tree.
pub const KEY_LEN: usize = 6;

/// A 48-bit tree key, stored as the big-endian high bytes of a `u64`.
///
/// Comparing two keys as unsigned byte arrays gives the same ordering as
/// comparing the 48-bit values they represent.
pub type Key = [u8; KEY_LEN];

/// Return the high 48 bits of `value` as key bytes.
///
/// ```
/// use roaring_art::high_bytes;
///
/// assert_eq!(
///     high_bytes(0x0102_0304_0506_0708),
///     [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]
/// );
/// ```
pub fn high_bytes(value: u64) -> Key {
    let bytes = value.to_be_bytes();
    let mut key = [0; KEY_LEN];
    key.copy_from_slice(&bytes[..KEY_LEN]);
    key
}

/// Return the high 48 bits of `value`, shifted down into the low bits.
pub fn high_part(value: u64) -> u64 {
    value >> 16
}

/// Return the low 16 bits of `value`.
pub fn low_part(value: u64) -> u16 {
    value as u16
}

/// Reassemble a 64-bit value from its key bytes and low 16 bits.
pub fn from_parts(high: Key, low: u16) -> u64 {
    (key_to_u64(high) << 16) | u64::from(low)
}

/// Return the 48-bit value of the key, in the low bits of a `u64`.
pub fn key_to_u64(key: Key) -> u64 {
    let mut bytes = [0; 8];
    bytes[2..].copy_from_slice(&key);
    u64::from_be_bytes(bytes)
}

/// Return the key bytes of a 48-bit value held in the low bits of `value`.
///
/// Bits above the 48th are ignored.
pub fn u64_to_key(value: u64) -> Key {
    high_bytes(value << 16)
}

/// Return the length of the common prefix of both byte strings.
///
/// The comparison stops at the shorter of the two inputs, so when no byte
/// differs the result is the length of the shorter input.
pub fn common_prefix_len(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right)
        .take_while(|(left, right)| left == right)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_value() {
        let value = 0xDEAD_BEEF_CAFE_F00D_u64;

        let high = high_bytes(value);
        assert_eq!(high, [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]);
        assert_eq!(low_part(value), 0xF00D);
        assert_eq!(high_part(value), 0xDEAD_BEEF_CAFE);
        assert_eq!(key_to_u64(high), 0xDEAD_BEEF_CAFE);
        assert_eq!(u64_to_key(0xDEAD_BEEF_CAFE), high);
        assert_eq!(from_parts(high, low_part(value)), value);
    }

    #[test]
    fn key_order_matches_value_order() {
        let values = [0u64, 1, 255, 256, 0xFFFF, 0x1_0000, 0xFFFF_FFFF_FFFF];
        for window in values.windows(2) {
            assert!(u64_to_key(window[0]) < u64_to_key(window[1]));
        }
    }

    #[test]
    fn common_prefix_bounds() {
        assert_eq!(common_prefix_len(&[1, 2, 3], &[1, 2, 3]), 3);
        assert_eq!(common_prefix_len(&[1, 2, 3], &[1, 2, 4]), 2);
        assert_eq!(common_prefix_len(&[1, 2], &[1, 2, 3, 4]), 2);
        assert_eq!(common_prefix_len(&[1, 2, 3, 4], &[1]), 1);
        assert_eq!(common_prefix_len(&[], &[1]), 0);
        assert_eq!(common_prefix_len(&[9], &[1]), 0);
    }
}
