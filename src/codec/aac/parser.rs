use super::types::{ADTSHeader, ProfileType, ADTS_HEADER_SIZE};
use crate::utils::BitReader;
use crate::{LstkError, Result};

/// Parses the fixed ADTS header at the start of `data`.
pub fn parse_adts_header(data: &[u8]) -> Result<ADTSHeader> {
    if data.len() < ADTS_HEADER_SIZE {
        return Err(LstkError::Parser("ADTS header too short".into()));
    }

    let mut reader = BitReader::new(data);

    let sync_word = reader.read_bits(12)?;
    if sync_word != 0xFFF {
        return Err(LstkError::Parser("Invalid ADTS sync word".into()));
    }

    let id = reader.read_bits(1)? as u8;
    let layer = reader.read_bits(2)? as u8;
    let protection_absent = reader.read_bits(1)? == 1;

    let profile = ProfileType::from(reader.read_bits(2)? as u8);

    let sample_rate_index = reader.read_bits(4)? as u8;
    let private_bit = reader.read_bits(1)? == 1;
    let channel_configuration = reader.read_bits(3)? as u8;
    let original_copy = reader.read_bits(1)? == 1;
    let home = reader.read_bits(1)? == 1;

    let copyright_id_bit = reader.read_bits(1)? == 1;
    let copyright_id_start = reader.read_bits(1)? == 1;
    let frame_length = reader.read_bits(13)? as u16;
    let buffer_fullness = reader.read_bits(11)? as u16;
    let number_of_raw_blocks = reader.read_bits(2)? as u8;

    Ok(ADTSHeader {
        sync_word,
        id,
        layer,
        protection_absent,
        profile,
        sample_rate_index,
        private_bit,
        channel_configuration,
        original_copy,
        home,
        copyright_id_bit,
        copyright_id_start,
        frame_length,
        buffer_fullness,
        number_of_raw_blocks,
    })
}

/// Returns `true` when `data` begins with an ADTS sync word (layer bits zero).
pub fn starts_with_adts(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] & 0xF6 == 0xF0
}

fn frame_length(data: &[u8]) -> usize {
    ((data[3] as usize & 0x03) << 11) | ((data[4] as usize) << 3) | ((data[5] as usize) >> 5)
}

/// Iterator over the ADTS frames packed in a buffer.
///
/// Bytes that do not start a frame are skipped until the next sync word. A
/// frame whose declared length runs past the buffer ends the iteration.
pub struct AdtsFrames<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> AdtsFrames<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }
}

impl<'a> Iterator for AdtsFrames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while self.position + ADTS_HEADER_SIZE <= self.data.len() {
            let rest = &self.data[self.position..];
            if !starts_with_adts(rest) {
                self.position += 1;
                continue;
            }
            let length = frame_length(rest);
            if length < ADTS_HEADER_SIZE {
                self.position += 1;
                continue;
            }
            if length > rest.len() {
                log::warn!(
                    "truncated ADTS frame: declared {} bytes, {} available",
                    length,
                    rest.len()
                );
                self.position = self.data.len();
                return None;
            }
            self.position += length;
            return Some(&rest[..length]);
        }
        None
    }
}
