use crate::codec::aac::AACConfig;
use crate::format::ts::types::{
    STREAM_ID_AAC, STREAM_ID_H264, STREAM_ID_H265, STREAM_TYPE_AAC, STREAM_TYPE_H264,
    STREAM_TYPE_H265,
};
use async_trait::async_trait;
use bytes::Bytes;

/// Elementary stream types this crate can carry.
///
/// The closed set selects the ES adapter used on both the mux and demux paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    H264,
    H265,
    AdtsAac,
    Unsupported,
}

impl StreamType {
    /// Maps a PMT `stream_type` byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            STREAM_TYPE_H264 => StreamType::H264,
            STREAM_TYPE_H265 => StreamType::H265,
            STREAM_TYPE_AAC => StreamType::AdtsAac,
            _ => StreamType::Unsupported,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            StreamType::H264 => Some(STREAM_TYPE_H264),
            StreamType::H265 => Some(STREAM_TYPE_H265),
            StreamType::AdtsAac => Some(STREAM_TYPE_AAC),
            StreamType::Unsupported => None,
        }
    }

    /// PES stream id used when muxing this stream type.
    pub fn stream_id(&self) -> Option<u8> {
        match self {
            StreamType::H264 => Some(STREAM_ID_H264),
            StreamType::H265 => Some(STREAM_ID_H265),
            StreamType::AdtsAac => Some(STREAM_ID_AAC),
            StreamType::Unsupported => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, StreamType::H264 | StreamType::H265)
    }
}

/// Out-of-band stream description needed to frame access units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatDescription {
    /// Parameter sets prepended to every sync frame
    Video { parameter_sets: Vec<Bytes> },
    /// Configuration used to build ADTS headers for raw AAC frames
    Audio(AACConfig),
}

/// A stream as seen by a muxer or demuxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub pid: u16,
    pub stream_type: StreamType,
    pub format: Option<FormatDescription>,
}

impl StreamInfo {
    pub fn new(pid: u16, stream_type: StreamType) -> Self {
        Self {
            pid,
            stream_type,
            format: None,
        }
    }

    pub fn with_format(mut self, format: FormatDescription) -> Self {
        self.format = Some(format);
        self
    }
}

#[async_trait]
pub trait Demuxer: Send {
    /// Returns the next access unit, or `None` once the input is exhausted.
    async fn read_packet(&mut self) -> crate::Result<Option<AccessUnit>>;
    async fn streams(&mut self) -> crate::Result<Vec<StreamInfo>>;
}

#[async_trait]
pub trait Muxer: Send {
    async fn write_header(&mut self, streams: &[StreamInfo]) -> crate::Result<()>;
    async fn write_packet(&mut self, unit: AccessUnit) -> crate::Result<()>;
    async fn write_trailer(&mut self) -> crate::Result<()>;
}

mod packet;
pub use packet::*;
