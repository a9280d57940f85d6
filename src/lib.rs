#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # lstk - live streaming toolkit, transport stream layer
//!
//! `lstk` multiplexes timestamped H.264, H.265 and ADTS-AAC access units into
//! 188-byte MPEG transport stream packets and demultiplexes a transport
//! stream back into access units.
//!
//! ## Features
//!
//! - PES framing with PTS/DTS and the presentation offset applied on mux
//! - Segmentation into TS packets with PCR and adaptation field stuffing
//! - PAT/PMT generation and parsing with MPEG-2 CRC32
//! - Reassembly from arbitrarily chunked input, resyncing on the sync byte
//! - Async muxer/demuxer over `tokio` byte streams
//!
//! ## Example
//!
//! ```rust
//! use lstk::av::{AccessUnit, StreamType};
//! use lstk::config::TSConfig;
//! use lstk::format::ts::{TSReader, TSWriter};
//! use std::time::Duration;
//!
//! # fn main() -> lstk::Result<()> {
//! let mut writer = TSWriter::with_config(TSConfig::default());
//! writer.set_base_timestamp(Duration::ZERO);
//! writer.add_stream_type(StreamType::AdtsAac, None)?;
//!
//! let unit = AccessUnit::new(StreamType::AdtsAac, vec![0x21; 64])
//!     .with_pts(Duration::from_millis(20));
//! let bytes = writer.write_bytes(&unit)?;
//!
//! let mut reader = TSReader::new();
//! let units = reader.read(&bytes);
//! assert_eq!(units.len(), 1);
//! assert_eq!(units[0].pts, Duration::from_millis(20));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: access units, stream descriptions and the muxer/demuxer traits
//! - `codec`: NAL unit and ADTS handling for the supported codecs
//! - `format`: the transport stream implementation
//! - `config`: PID layout and PCR interval, from environment or config file
//! - `error`: error type and result alias
//! - `utils`: bit reader and writer, CRC32

/// Access units, stream descriptions and muxer/demuxer traits
pub mod av;

/// Elementary stream handling for H.264, H.265 and AAC
pub mod codec;

/// Error types and utilities
pub mod error;

/// Container formats
pub mod format;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{LstkError, Result};
