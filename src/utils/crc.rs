//! MPEG-2 CRC32 (ISO/IEC 13818-1 Annex A) for PSI sections.
//!
//! Polynomial 0x04C11DB7, initial value 0xFFFFFFFF, no reflection, no final XOR.

const CRC32_MPEG2: u32 = 0x04C11DB7;

/// Table-driven CRC32 calculator for PAT/PMT sections.
///
/// ```
/// use lstk::utils::Crc32Mpeg2;
///
/// let crc = Crc32Mpeg2::new();
/// assert_eq!(crc.calculate(&[0x01, 0x01]), 0xD66FB816);
/// ```
pub struct Crc32Mpeg2 {
    table: [u32; 256],
}

impl Crc32Mpeg2 {
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u32) << 24;
            for _ in 0..8 {
                crc = if (crc & 0x80000000) != 0 {
                    (crc << 1) ^ CRC32_MPEG2
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        Self { table }
    }

    /// Checksum over `data`; a section followed by its own CRC yields zero.
    pub fn calculate(&self, data: &[u8]) -> u32 {
        data.iter().fold(0xFFFFFFFF, |crc, &byte| {
            let index = ((crc >> 24) ^ byte as u32) & 0xFF;
            (crc << 8) ^ self.table[index as usize]
        })
    }
}

impl Default for Crc32Mpeg2 {
    fn default() -> Self {
        Self::new()
    }
}
