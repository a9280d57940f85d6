use super::StreamType;
use bytes::Bytes;
use std::time::Duration;

/// One compressed frame travelling into the muxer or out of the demuxer.
///
/// Video payloads are length-prefixed NAL units (4-byte big-endian sizes).
/// Audio payloads are AAC frames, with or without an ADTS header on the way in
/// and always ADTS-framed on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    pub stream_type: StreamType,
    pub data: Bytes,
    pub pts: Duration,
    pub dts: Option<Duration>,
    pub is_sync: bool,
    pub duration: Option<Duration>,
    /// Parameter set NAL units (VPS/SPS/PPS) carried alongside a sync frame
    pub parameter_sets: Vec<Bytes>,
}

impl AccessUnit {
    pub fn new(stream_type: StreamType, data: impl Into<Bytes>) -> Self {
        Self {
            stream_type,
            data: data.into(),
            pts: Duration::ZERO,
            dts: None,
            is_sync: false,
            duration: None,
            parameter_sets: Vec::new(),
        }
    }

    pub fn with_pts(mut self, pts: Duration) -> Self {
        self.pts = pts;
        self
    }

    pub fn with_dts(mut self, dts: Duration) -> Self {
        self.dts = Some(dts);
        self
    }

    pub fn with_sync_flag(mut self, is_sync: bool) -> Self {
        self.is_sync = is_sync;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_parameter_sets(mut self, parameter_sets: Vec<Bytes>) -> Self {
        self.parameter_sets = parameter_sets;
        self
    }

    /// Earliest of the two timestamps, the clock a decoder needs first.
    pub fn decode_time(&self) -> Duration {
        match self.dts {
            Some(dts) if dts < self.pts => dts,
            _ => self.pts,
        }
    }
}
