//! # AAC in ADTS framing
//!
//! ADTS frames are self-delimiting: every frame starts with a 12-bit sync word
//! and carries its own 13-bit length, so several frames can be packed into one
//! PES payload and recovered by scanning.

pub mod parser;
pub mod types;

pub use parser::{parse_adts_header, starts_with_adts, AdtsFrames};
pub use types::{
    AACConfig, ADTSHeader, ProfileType, ADTS_HEADER_SIZE, MAX_FRAME_LENGTH, SAMPLES_PER_FRAME,
};
