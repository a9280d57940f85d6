//! # Utility Functions and Types
//!
//! Bit-level reading and writing for packed header fields and the MPEG-2 CRC32 used by
//! PSI sections.
//!
//! ```rust
//! use lstk::utils::{BitReader, BitWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0x1FFF, 13);
//! let data = writer.into_bytes();
//!
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(3)?, 0b101);
//! assert_eq!(reader.read_bits(13)?, 0x1FFF);
//! # Ok(())
//! # }
//! ```

/// Bitstream reading and writing
pub mod bits;

/// CRC calculation implementations
pub mod crc;

pub use bits::{BitReader, BitWriter};
pub use crc::Crc32Mpeg2;
