//! Program clock reference carried in adaptation fields.

use std::time::Duration;

/// 42-bit clock reference: a 33-bit base at 90 kHz plus a 9-bit extension
/// counting 27 MHz cycles (0..300) within one base tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TSProgramClockReference {
    pub base: u64,
    pub extension: u16,
}

impl TSProgramClockReference {
    pub const RESOLUTION_FOR_BASE: u64 = 90_000;
    pub const RESOLUTION_FOR_EXTENSION: u64 = 27_000_000;
    pub const DATA_SIZE: usize = 6;
    const BASE_MASK: u64 = 0x1_FFFF_FFFF;

    pub fn new(base: u64, extension: u16) -> Self {
        Self {
            base: base & Self::BASE_MASK,
            extension: extension & 0x1FF,
        }
    }

    pub fn from_duration(time: Duration) -> Self {
        let cycles = time.as_nanos() * Self::RESOLUTION_FOR_EXTENSION as u128 / 1_000_000_000;
        Self::new((cycles / 300) as u64, (cycles % 300) as u16)
    }

    /// Full clock value in 27 MHz cycles.
    pub fn to_27mhz(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }

    pub fn to_duration(&self) -> Duration {
        Duration::from_nanos(
            (self.to_27mhz() as u128 * 1_000_000_000 / Self::RESOLUTION_FOR_EXTENSION as u128)
                as u64,
        )
    }

    /// Encodes base, six reserved `1` bits and extension.
    pub fn encode(&self) -> [u8; Self::DATA_SIZE] {
        let b = self.base & Self::BASE_MASK;
        let e = self.extension & 0x1FF;
        [
            (b >> 25) as u8,
            (b >> 17) as u8,
            (b >> 9) as u8,
            (b >> 1) as u8,
            ((b & 0x01) as u8) << 7 | 0x7E | (e >> 8) as u8,
            e as u8,
        ]
    }

    /// Decodes six bytes; shorter input reads the missing bytes as zero.
    pub fn decode(data: &[u8]) -> Self {
        let d = |i: usize| data.get(i).copied().unwrap_or(0) as u64;
        let base = (d(0) << 25) | (d(1) << 17) | (d(2) << 9) | (d(3) << 1) | (d(4) >> 7);
        let extension = ((d(4) & 0x01) << 8) | d(5);
        Self {
            base,
            extension: extension as u16,
        }
    }
}
