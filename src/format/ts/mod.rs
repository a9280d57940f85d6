//! # MPEG Transport Stream (TS) Implementation
//!
//! - Timestamp and clock reference codecs
//! - PES framing of access units
//! - TS packets with adaptation fields and stuffing
//! - PAT/PMT tables
//! - Synchronous [`TSWriter`]/[`TSReader`] and async [`TSMuxer`]/[`TSDemuxer`]
//!
//! ## Example Usage
//!
//! ```rust
//! use lstk::av::{AccessUnit, Demuxer, Muxer, StreamInfo, StreamType};
//! use lstk::config::TSConfig;
//! use lstk::format::ts::{TSDemuxer, TSMuxer, TS_PACKET_SIZE};
//! use std::io::Cursor;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! tokio_test::block_on(async {
//!     let mut muxer = TSMuxer::with_config(Cursor::new(Vec::new()), TSConfig::default());
//!     muxer.write_header(&[StreamInfo::new(256, StreamType::H264)]).await?;
//!
//!     // Length-prefixed IDR slice
//!     let unit = AccessUnit::new(StreamType::H264, vec![0, 0, 0, 3, 0x65, 0x88, 0x84])
//!         .with_pts(Duration::from_millis(40))
//!         .with_sync_flag(true);
//!     muxer.write_packet(unit).await?;
//!     muxer.write_trailer().await?;
//!
//!     let output = muxer.into_inner().into_inner();
//!     assert_eq!(output.len() % TS_PACKET_SIZE, 0);
//!
//!     let mut demuxer = TSDemuxer::new(Cursor::new(output));
//!     let unit = demuxer.read_packet().await?.expect("one access unit");
//!     assert!(unit.is_sync);
//!     Ok::<(), Box<dyn std::error::Error>>(())
//! })
//! # }
//! ```

/// TS demuxer over an async byte source
pub mod demuxer;

/// TS muxer over an async byte sink
pub mod muxer;

/// TS packets and adaptation fields
pub mod packet;

/// Program clock reference codec
pub mod pcr;

/// PES framing and access unit reconstruction
pub mod pes;

/// PAT/PMT sections
pub mod psi;

/// TS packet reassembly
pub mod reader;

/// PES timestamp codec
pub mod timestamp;

/// Core TS types and constants
pub mod types;

/// TS packetization of access units
pub mod writer;

pub use demuxer::TSDemuxer;
pub use muxer::TSMuxer;
pub use packet::{TSAdaptationField, TSPacket};
pub use pcr::TSProgramClockReference;
pub use pes::{PESOptionalHeader, PESTiming, PacketizedElementaryStream};
pub use psi::{PAT, PMT};
pub use reader::TSReader;
pub use timestamp::TSTimestamp;
pub use types::{
    TSHeader, PID_PAT, STREAM_TYPE_AAC, STREAM_TYPE_H264, STREAM_TYPE_H265, TS_PACKET_SIZE,
    TS_PAYLOAD_SIZE,
};
pub use writer::TSWriter;
