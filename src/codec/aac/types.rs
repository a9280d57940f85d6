use crate::utils::BitWriter;
use std::time::Duration;

/// Size of an ADTS header without CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// Largest value of the 13-bit ADTS `frame_length` field, header included.
pub const MAX_FRAME_LENGTH: usize = 0x1FFF;

/// PCM samples decoded from one AAC frame.
pub const SAMPLES_PER_FRAME: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Main = 0,
    LC = 1,
    SSR = 2,
    LTP = 3,
}

impl From<u8> for ProfileType {
    fn from(value: u8) -> Self {
        match value {
            0 => ProfileType::Main,
            1 => ProfileType::LC,
            2 => ProfileType::SSR,
            3 => ProfileType::LTP,
            _ => ProfileType::LC, // Default to LC for unknown profiles
        }
    }
}

fn sample_rate_for_index(index: u8) -> Option<u32> {
    match index {
        0 => Some(96000),
        1 => Some(88200),
        2 => Some(64000),
        3 => Some(48000),
        4 => Some(44100),
        5 => Some(32000),
        6 => Some(24000),
        7 => Some(22050),
        8 => Some(16000),
        9 => Some(12000),
        10 => Some(11025),
        11 => Some(8000),
        12 => Some(7350),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AACConfig {
    pub profile: ProfileType,
    pub sample_rate_index: u8,
    pub channel_configuration: u8,
    pub frame_length: u16,
}

impl Default for AACConfig {
    fn default() -> Self {
        Self {
            profile: ProfileType::LC,
            sample_rate_index: 4,     // 44100 Hz
            channel_configuration: 2, // Stereo
            frame_length: 1024,
        }
    }
}

impl AACConfig {
    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_for_index(self.sample_rate_index)
    }

    /// ADTS header announcing a frame of `payload_len` raw bytes.
    pub fn adts_header(&self, payload_len: usize) -> ADTSHeader {
        ADTSHeader {
            sync_word: 0xFFF,
            id: 0, // MPEG-4
            layer: 0,
            protection_absent: true,
            profile: self.profile,
            sample_rate_index: self.sample_rate_index,
            private_bit: false,
            channel_configuration: self.channel_configuration,
            original_copy: false,
            home: false,
            copyright_id_bit: false,
            copyright_id_start: false,
            frame_length: (payload_len + ADTS_HEADER_SIZE) as u16,
            buffer_fullness: 0x7FF, // Variable bit rate
            number_of_raw_blocks: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ADTSHeader {
    pub sync_word: u32,            // 12 bits
    pub id: u8,                    // 1 bit, 0=MPEG-4, 1=MPEG-2
    pub layer: u8,                 // 2 bits
    pub protection_absent: bool,   // 1 bit
    pub profile: ProfileType,      // 2 bits
    pub sample_rate_index: u8,     // 4 bits
    pub private_bit: bool,         // 1 bit
    pub channel_configuration: u8, // 3 bits
    pub original_copy: bool,       // 1 bit
    pub home: bool,                // 1 bit
    pub copyright_id_bit: bool,    // 1 bit
    pub copyright_id_start: bool,  // 1 bit
    pub frame_length: u16,         // 13 bits
    pub buffer_fullness: u16,      // 11 bits
    pub number_of_raw_blocks: u8,  // 2 bits
}

impl ADTSHeader {
    pub fn sync_word_valid(&self) -> bool {
        self.sync_word == 0xFFF
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_for_index(self.sample_rate_index)
    }

    /// Playback duration of the frame this header announces.
    pub fn frame_duration(&self) -> Option<Duration> {
        let rate = self.sample_rate()?;
        Some(Duration::from_nanos(
            SAMPLES_PER_FRAME as u64 * 1_000_000_000 / rate as u64,
        ))
    }

    pub fn config(&self) -> AACConfig {
        AACConfig {
            profile: self.profile,
            sample_rate_index: self.sample_rate_index,
            channel_configuration: self.channel_configuration,
            frame_length: SAMPLES_PER_FRAME as u16,
        }
    }

    pub fn to_bytes(&self) -> [u8; ADTS_HEADER_SIZE] {
        let mut writer = BitWriter::with_capacity(ADTS_HEADER_SIZE);
        writer.write_bits(self.sync_word, 12);
        writer.write_bits(self.id as u32, 1);
        writer.write_bits(self.layer as u32, 2);
        writer.write_bit(self.protection_absent);
        writer.write_bits(self.profile as u32, 2);
        writer.write_bits(self.sample_rate_index as u32, 4);
        writer.write_bit(self.private_bit);
        writer.write_bits(self.channel_configuration as u32, 3);
        writer.write_bit(self.original_copy);
        writer.write_bit(self.home);
        writer.write_bit(self.copyright_id_bit);
        writer.write_bit(self.copyright_id_start);
        writer.write_bits(self.frame_length as u32, 13);
        writer.write_bits(self.buffer_fullness as u32, 11);
        writer.write_bits(self.number_of_raw_blocks as u32, 2);

        let mut bytes = [0u8; ADTS_HEADER_SIZE];
        bytes.copy_from_slice(&writer.into_bytes());
        bytes
    }
}
