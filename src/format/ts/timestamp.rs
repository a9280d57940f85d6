//! 33-bit PTS/DTS fields of the PES optional header.

use std::time::Duration;

/// Encoder/decoder for the 5-byte timestamp fields of a PES header.
///
/// Layout: `iiii vvv1 vvvvvvvv vvvvvvv1 vvvvvvvv vvvvvvv1`, the indicator
/// nibble `i` followed by the 33-bit value split 3/15/15 with marker bits.
pub struct TSTimestamp;

impl TSTimestamp {
    pub const RESOLUTION: i64 = 90_000;
    pub const DATA_SIZE: usize = 5;
    pub const MASK: i64 = 0x1_FFFF_FFFF;

    /// Indicator nibble for a lone PTS.
    pub const PTS_ONLY: u8 = 0b0010;
    /// Indicator nibble for the PTS of a PTS+DTS pair.
    pub const PTS_WITH_DTS: u8 = 0b0011;
    /// Indicator nibble for a DTS.
    pub const DTS: u8 = 0b0001;

    pub fn encode(value: i64, indicator: u8) -> [u8; Self::DATA_SIZE] {
        let v = value & Self::MASK;
        [
            (indicator & 0x0F) << 4 | ((v >> 29) & 0x0E) as u8 | 0x01,
            (v >> 22) as u8,
            ((v >> 14) & 0xFE) as u8 | 0x01,
            (v >> 7) as u8,
            ((v << 1) & 0xFE) as u8 | 0x01,
        ]
    }

    /// Decodes the field starting at `offset`; missing bytes read as zero.
    pub fn decode(bytes: &[u8], offset: usize) -> i64 {
        let b = |i: usize| bytes.get(offset + i).copied().unwrap_or(0) as i64;
        ((b(0) & 0x0E) << 29) | (b(1) << 22) | ((b(2) & 0xFE) << 14) | (b(3) << 7) | (b(4) >> 1)
    }

    pub fn from_duration(time: Duration) -> i64 {
        (time.as_nanos() * Self::RESOLUTION as u128 / 1_000_000_000) as i64
    }

    /// Ticks from `earlier` to `later`, negative when `later` is before `earlier`.
    pub fn ticks_between(later: Duration, earlier: Duration) -> i64 {
        let nanos = later.as_nanos() as i128 - earlier.as_nanos() as i128;
        (nanos * Self::RESOLUTION as i128 / 1_000_000_000) as i64
    }

    /// Negative tick counts map to zero.
    pub fn to_duration(ticks: i64) -> Duration {
        if ticks <= 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((ticks as u128 * 1_000_000_000 / Self::RESOLUTION as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_encode_layout() {
        // 1 second at 90 kHz, PTS only
        let bytes = TSTimestamp::encode(90_000, TSTimestamp::PTS_ONLY);
        assert_eq!(bytes, [0x21, 0x00, 0x05, 0xBF, 0x21]);
        assert_eq!(TSTimestamp::decode(&bytes, 0), 90_000);
    }

    #[test]
    fn test_max_value_and_markers() {
        let bytes = TSTimestamp::encode(TSTimestamp::MASK, TSTimestamp::DTS);
        assert_eq!(bytes, [0x1F, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(TSTimestamp::decode(&bytes, 0), TSTimestamp::MASK);
    }

    #[test]
    fn test_decode_short_input_is_defined() {
        assert_eq!(TSTimestamp::decode(&[0x21, 0x00], 0), 0);
        assert_eq!(TSTimestamp::decode(&[], 7), 0);
    }

    #[test]
    fn test_negative_values_wrap() {
        let bytes = TSTimestamp::encode(-1, TSTimestamp::PTS_ONLY);
        assert_eq!(TSTimestamp::decode(&bytes, 0), TSTimestamp::MASK);
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(TSTimestamp::from_duration(Duration::from_millis(100)), 9_000);
        assert_eq!(TSTimestamp::to_duration(9_000), Duration::from_millis(100));
        assert_eq!(TSTimestamp::to_duration(-5), Duration::ZERO);
        assert_eq!(
            TSTimestamp::ticks_between(Duration::from_secs(1), Duration::from_secs(2)),
            -90_000
        );
    }

    #[quickcheck]
    fn prop_decode_inverts_encode(value: u64, indicator: u8) -> bool {
        let value = (value as i64) & TSTimestamp::MASK;
        let bytes = TSTimestamp::encode(value, indicator);
        TSTimestamp::decode(&bytes, 0) == value && bytes[0] >> 4 == indicator & 0x0F
    }
}
