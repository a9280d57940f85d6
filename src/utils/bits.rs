use crate::error::{LstkError, Result};

/// MSB-first bit reader over packed header fields (ADTS, section syntax).
///
/// ```
/// use lstk::utils::BitReader;
///
/// // ADTS sync word followed by id=0, layer=0, protection_absent=1
/// let data = [0xFF, 0xF1];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bits(12).unwrap(), 0xFFF);
/// assert_eq!(reader.read_bits(1).unwrap(), 0);
/// reader.skip_bits(2).unwrap();
/// assert!(reader.read_bit().unwrap());
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, position: 0 }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads up to 32 bits as a big-endian number.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(LstkError::Codec(format!("cannot read {} bits at once", n)));
        }
        if n as usize > self.available_bits() {
            return Err(LstkError::Codec(format!(
                "need {} bits, {} left",
                n,
                self.available_bits()
            )));
        }

        let mut value = 0u32;
        for _ in 0..n {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.position += 1;
        }
        Ok(value)
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        if n as usize > self.available_bits() {
            return Err(LstkError::Codec(format!("cannot skip {} bits", n)));
        }
        self.position += n as usize;
        Ok(())
    }

    /// Moves to the next byte boundary.
    pub fn align_byte(&mut self) {
        self.position = self.position.div_ceil(8) * 8;
    }

    pub fn available_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.position)
    }
}

/// MSB-first bit writer, the counterpart of [`BitReader`].
///
/// Values wider than the requested width are masked.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    position: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            position: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Writes the low `n` bits of `value`, at most 32.
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32);
        for i in (0..n.min(32)).rev() {
            if self.position % 8 == 0 {
                self.data.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.data.len() - 1;
                self.data[last] |= 1 << (7 - self.position % 8);
            }
            self.position += 1;
        }
    }

    pub fn bit_len(&self) -> usize {
        self.position
    }

    /// Returns the written bytes, zero-padding the last partial byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
#[path = "bits_test.rs"]
mod bits_test;
