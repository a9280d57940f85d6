//! Packetized elementary stream framing.
//!
//! A PES wraps one access unit (or, for audio, a run of ADTS frames) with an
//! optional header carrying PTS/DTS. The framer converts between
//! [`AccessUnit`]s and PES packets in both directions and splits a PES into
//! transport stream packets.

use super::packet::{TSAdaptationField, TSPacket};
use super::pcr::TSProgramClockReference;
use super::timestamp::TSTimestamp;
use super::types::TS_PAYLOAD_SIZE;
use crate::av::{AccessUnit, FormatDescription, StreamType};
use crate::codec::aac::parser::starts_with_adts;
use crate::codec::aac::{parse_adts_header, AACConfig, AdtsFrames, ADTS_HEADER_SIZE, MAX_FRAME_LENGTH};
use crate::codec::nalu::{iso_to_annexb, put_iso_unit, split_annexb, START_CODE};
use crate::codec::{h264, h265, NalRole};
use crate::error::{LstkError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;

/// Timing recovered from a PES optional header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PESTiming {
    pub pts: Option<Duration>,
    pub dts: Option<Duration>,
    /// Distance from the previous presentation timestamp on the same PID
    pub duration: Option<Duration>,
}

/// Optional PES header: flags, header length and timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PESOptionalHeader {
    pub marker_bits: u8,
    pub scrambling_control: u8,
    pub priority: bool,
    pub data_alignment_indicator: bool,
    pub copyright: bool,
    pub original_or_copy: bool,
    /// `0b10` PTS only, `0b11` PTS and DTS
    pub pts_dts_indicator: u8,
    pub escr_flag: bool,
    pub es_rate_flag: bool,
    pub dsm_trick_mode_flag: bool,
    pub additional_copy_info_flag: bool,
    pub crc_flag: bool,
    pub extension_flag: bool,
    pub optional_fields: Vec<u8>,
    pub stuffing_bytes: Vec<u8>,
}

impl Default for PESOptionalHeader {
    fn default() -> Self {
        Self {
            marker_bits: Self::DEFAULT_MARKER_BITS,
            scrambling_control: 0,
            priority: false,
            data_alignment_indicator: false,
            copyright: false,
            original_or_copy: false,
            pts_dts_indicator: 0,
            escr_flag: false,
            es_rate_flag: false,
            dsm_trick_mode_flag: false,
            additional_copy_info_flag: false,
            crc_flag: false,
            extension_flag: false,
            optional_fields: Vec::new(),
            stuffing_bytes: Vec::new(),
        }
    }
}

impl PESOptionalHeader {
    pub const FIXED_SECTION_SIZE: usize = 3;
    pub const DEFAULT_MARKER_BITS: u8 = 2;
    /// Added to every encoded PTS so that B-frames never precede the reference clock.
    pub const OFFSET: Duration = Duration::from_millis(100);

    /// Value of the `PES_header_data_length` byte.
    pub fn header_length(&self) -> usize {
        self.optional_fields.len() + self.stuffing_bytes.len()
    }

    pub fn encoded_len(&self) -> usize {
        Self::FIXED_SECTION_SIZE + self.header_length()
    }

    fn has_extra_fields(&self) -> bool {
        self.escr_flag
            || self.es_rate_flag
            || self.dsm_trick_mode_flag
            || self.additional_copy_info_flag
            || self.crc_flag
            || self.extension_flag
    }

    /// Replaces the timestamp fields.
    ///
    /// The PTS is written as `pts + OFFSET - reference`, the DTS as
    /// `dts - reference`. Either clamps to zero when it would go negative.
    pub fn set_timestamp(&mut self, reference: Duration, pts: Duration, dts: Option<Duration>) {
        self.optional_fields.clear();
        self.pts_dts_indicator = 0x02;
        if dts.is_some() {
            self.pts_dts_indicator |= 0x01;
        }

        let pts_ticks = TSTimestamp::ticks_between(pts + Self::OFFSET, reference).max(0);
        let nibble = if dts.is_some() {
            TSTimestamp::PTS_WITH_DTS
        } else {
            TSTimestamp::PTS_ONLY
        };
        self.optional_fields
            .extend_from_slice(&TSTimestamp::encode(pts_ticks, nibble));

        if let Some(dts) = dts {
            let dts_ticks = TSTimestamp::ticks_between(dts, reference).max(0);
            self.optional_fields
                .extend_from_slice(&TSTimestamp::encode(dts_ticks, TSTimestamp::DTS));
        }
    }

    /// Raw timestamps as carried in the header, offset included.
    pub fn make_timing(&self, previous_pts: Option<Duration>) -> PESTiming {
        let mut timing = PESTiming::default();
        let mut offset = 0;
        if self.pts_dts_indicator & 0x02 == 0x02 {
            let pts = TSTimestamp::decode(&self.optional_fields, 0);
            timing.pts = Some(TSTimestamp::to_duration(pts));
            offset = TSTimestamp::DATA_SIZE;
        }
        if self.pts_dts_indicator & 0x01 == 0x01 {
            let dts = TSTimestamp::decode(&self.optional_fields, offset);
            timing.dts = Some(TSTimestamp::to_duration(dts));
        }
        timing.duration = match (timing.pts, previous_pts) {
            (Some(pts), Some(previous)) => pts.checked_sub(previous),
            _ => None,
        };
        timing
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        let b0 = (self.marker_bits & 0x03) << 6
            | (self.scrambling_control & 0x03) << 4
            | (self.priority as u8) << 3
            | (self.data_alignment_indicator as u8) << 2
            | (self.copyright as u8) << 1
            | self.original_or_copy as u8;
        let b1 = (self.pts_dts_indicator & 0x03) << 6
            | (self.escr_flag as u8) << 5
            | (self.es_rate_flag as u8) << 4
            | (self.dsm_trick_mode_flag as u8) << 3
            | (self.additional_copy_info_flag as u8) << 2
            | (self.crc_flag as u8) << 1
            | self.extension_flag as u8;
        buf.put_u8(b0);
        buf.put_u8(b1);
        buf.put_u8(self.header_length() as u8);
        buf.put_slice(&self.optional_fields);
        buf.put_slice(&self.stuffing_bytes);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    /// Parses a header from the start of `data`; trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<PESOptionalHeader> {
        if data.len() < Self::FIXED_SECTION_SIZE {
            return Err(LstkError::InvalidData(format!(
                "PES optional header too short: {} bytes",
                data.len()
            )));
        }
        let header_length = data[2] as usize;
        let end = Self::FIXED_SECTION_SIZE + header_length;
        if data.len() < end {
            return Err(LstkError::InvalidData(format!(
                "PES header declares {} bytes, {} available",
                header_length,
                data.len() - Self::FIXED_SECTION_SIZE
            )));
        }

        let mut header = PESOptionalHeader {
            marker_bits: (data[0] >> 6) & 0x03,
            scrambling_control: (data[0] >> 4) & 0x03,
            priority: (data[0] & 0x08) != 0,
            data_alignment_indicator: (data[0] & 0x04) != 0,
            copyright: (data[0] & 0x02) != 0,
            original_or_copy: (data[0] & 0x01) != 0,
            pts_dts_indicator: (data[1] >> 6) & 0x03,
            escr_flag: (data[1] & 0x20) != 0,
            es_rate_flag: (data[1] & 0x10) != 0,
            dsm_trick_mode_flag: (data[1] & 0x08) != 0,
            additional_copy_info_flag: (data[1] & 0x04) != 0,
            crc_flag: (data[1] & 0x02) != 0,
            extension_flag: (data[1] & 0x01) != 0,
            optional_fields: Vec::new(),
            stuffing_bytes: Vec::new(),
        };

        let fields = &data[Self::FIXED_SECTION_SIZE..end];
        if header.has_extra_fields() {
            header.optional_fields = fields.to_vec();
        } else {
            // Only timestamps are present, anything after them is stuffing
            let timestamps = header.pts_dts_indicator.count_ones() as usize * TSTimestamp::DATA_SIZE;
            let split = timestamps.min(fields.len());
            header.optional_fields = fields[..split].to_vec();
            header.stuffing_bytes = fields[split..].to_vec();
        }
        Ok(header)
    }
}

/// A PES packet: start code, stream id, length, optional header and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketizedElementaryStream {
    pub stream_id: u8,
    /// Bytes following the length field, `0` when unbounded
    pub packet_length: u16,
    pub optional_header: Option<PESOptionalHeader>,
    pub data: BytesMut,
}

impl PacketizedElementaryStream {
    pub const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
    /// Start code, stream id and length field.
    pub const UNTIL_PACKET_LENGTH_SIZE: usize = 6;

    /// Builds a video PES: delimiter, parameter sets on sync frames, then the
    /// access unit converted to Annex-B.
    ///
    /// Parameter sets come from the access unit, falling back to `format`. A
    /// payload too large for the 16-bit length field is sent unbounded.
    pub fn from_video(
        unit: &AccessUnit,
        format: Option<&FormatDescription>,
        reference: Duration,
    ) -> Result<Self> {
        let mut data = BytesMut::with_capacity(unit.data.len() + 64);
        data.put_slice(&START_CODE);
        match unit.stream_type {
            StreamType::H264 => data.put_slice(&h264::access_unit_delimiter(unit.is_sync)),
            StreamType::H265 => data.put_slice(&h265::access_unit_delimiter(unit.is_sync)),
            other => {
                return Err(LstkError::Codec(format!(
                    "{:?} is not a video stream type",
                    other
                )))
            }
        }

        if unit.is_sync {
            let parameter_sets: &[Bytes] = if unit.parameter_sets.is_empty() {
                match format {
                    Some(FormatDescription::Video { parameter_sets }) => parameter_sets.as_slice(),
                    _ => &[],
                }
            } else {
                unit.parameter_sets.as_slice()
            };
            if parameter_sets.is_empty() {
                log::warn!("sync frame at {:?} has no parameter sets", unit.pts);
            }
            for parameter_set in parameter_sets {
                data.put_slice(&START_CODE);
                data.put_slice(parameter_set);
            }
        }
        data.put_slice(&iso_to_annexb(&unit.data));

        let mut header = PESOptionalHeader {
            data_alignment_indicator: true,
            ..Default::default()
        };
        header.set_timestamp(reference, unit.pts, unit.dts);

        let length = data.len() + header.encoded_len();
        let packet_length = u16::try_from(length).unwrap_or_else(|_| {
            log::debug!("video PES of {} bytes sent unbounded", length);
            0
        });

        Ok(Self {
            stream_id: unit
                .stream_type
                .stream_id()
                .unwrap_or(super::types::STREAM_ID_H264),
            packet_length,
            optional_header: Some(header),
            data,
        })
    }

    /// Builds an audio PES carrying ADTS frames.
    ///
    /// Raw AAC frames get a header built from `config` (the default AAC-LC
    /// 44.1 kHz stereo configuration when none is known).
    pub fn from_audio(
        unit: &AccessUnit,
        config: Option<&AACConfig>,
        reference: Duration,
    ) -> Result<Self> {
        if unit.stream_type != StreamType::AdtsAac {
            return Err(LstkError::Codec(format!(
                "{:?} is not an audio stream type",
                unit.stream_type
            )));
        }

        let mut data = BytesMut::with_capacity(unit.data.len() + ADTS_HEADER_SIZE);
        if !starts_with_adts(&unit.data) {
            let frame_length = unit.data.len() + ADTS_HEADER_SIZE;
            if frame_length > MAX_FRAME_LENGTH {
                return Err(LstkError::Codec(format!(
                    "raw AAC frame of {} bytes exceeds the ADTS frame length limit",
                    unit.data.len()
                )));
            }
            let header = match config {
                Some(config) => config.adts_header(unit.data.len()),
                None => {
                    log::warn!("no AAC configuration, assuming AAC-LC 44.1 kHz stereo");
                    AACConfig::default().adts_header(unit.data.len())
                }
            };
            data.put_slice(&header.to_bytes());
        }
        data.put_slice(&unit.data);

        let mut header = PESOptionalHeader {
            data_alignment_indicator: true,
            ..Default::default()
        };
        header.set_timestamp(reference, unit.pts, None);

        let length = data.len() + header.encoded_len();
        let packet_length =
            u16::try_from(length).map_err(|_| LstkError::PacketLengthOverflow(length))?;

        Ok(Self {
            stream_id: super::types::STREAM_ID_AAC,
            packet_length,
            optional_header: Some(header),
            data,
        })
    }

    fn has_optional_header(stream_id: u8) -> bool {
        !matches!(
            stream_id,
            0xBC | 0xBE | 0xBF | 0xF0 | 0xF1 | 0xF2 | 0xF8 | 0xFF
        )
    }

    fn header_size(&self) -> usize {
        self.optional_header
            .as_ref()
            .map_or(0, |header| header.encoded_len())
    }

    /// Payload bytes a bounded packet carries, `None` when unbounded.
    fn expected_data_len(&self) -> Option<usize> {
        if self.packet_length == 0 {
            return None;
        }
        Some((self.packet_length as usize).saturating_sub(self.header_size()))
    }

    /// Parses a PES from the start of a reassembled payload.
    ///
    /// Bytes beyond a bounded packet length are dropped; a bounded packet may
    /// still be short and is then completed with [`append`](Self::append).
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::UNTIL_PACKET_LENGTH_SIZE {
            return Err(LstkError::InvalidData(format!(
                "PES too short: {} bytes",
                data.len()
            )));
        }
        let start_code = [data[0], data[1], data[2]];
        if start_code != Self::START_CODE {
            return Err(LstkError::InvalidStartCode(start_code));
        }
        let stream_id = data[3];
        let packet_length = u16::from_be_bytes([data[4], data[5]]);

        let mut position = Self::UNTIL_PACKET_LENGTH_SIZE;
        let optional_header = if Self::has_optional_header(stream_id) {
            let header = PESOptionalHeader::decode(&data[position..])?;
            position += header.encoded_len();
            Some(header)
        } else {
            None
        };

        let mut pes = Self {
            stream_id,
            packet_length,
            optional_header,
            data: BytesMut::new(),
        };
        pes.append(&data[position..]);
        Ok(pes)
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_slice(&Self::START_CODE);
        buf.put_u8(self.stream_id);
        buf.put_u16(self.packet_length);
        if let Some(header) = &self.optional_header {
            header.write_to(buf);
        }
        buf.put_slice(&self.data);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            Self::UNTIL_PACKET_LENGTH_SIZE + self.header_size() + self.data.len(),
        );
        self.write_to(&mut buf);
        buf.freeze()
    }

    /// `true` once a bounded packet holds all its payload. Unbounded packets
    /// are never complete on their own and must be flushed.
    pub fn is_complete(&self) -> bool {
        self.expected_data_len()
            .is_some_and(|expected| self.data.len() >= expected)
    }

    /// Appends payload bytes, returning how many were taken.
    pub fn append(&mut self, data: &[u8]) -> usize {
        let take = match self.expected_data_len() {
            Some(expected) => data.len().min(expected.saturating_sub(self.data.len())),
            None => data.len(),
        };
        self.data.extend_from_slice(&data[..take]);
        take
    }

    /// Splits the encoded packet into transport stream packets on `pid`.
    ///
    /// The first packet starts the payload unit and carries `pcr` when given;
    /// full 184-byte packets follow, and the remainder is padded with
    /// adaptation field stuffing. Continuity counters are left at zero.
    pub fn to_packets(&self, pid: u16, pcr: Option<TSProgramClockReference>) -> Vec<TSPacket> {
        self.to_packets_with_field(pid, pcr.map(TSAdaptationField::with_pcr))
    }

    /// Like [`to_packets`](Self::to_packets) with a caller-built adaptation
    /// field (PCR, random access, discontinuity) on the first packet.
    pub fn to_packets_with_field(
        &self,
        pid: u16,
        first_field: Option<TSAdaptationField>,
    ) -> Vec<TSPacket> {
        let payload = self.to_bytes();
        let mut packets = Vec::with_capacity(payload.len() / TS_PAYLOAD_SIZE + 2);

        let mut first = TSPacket::new(pid);
        first.header.payload_unit_start = true;
        first.adaptation_field = first_field;
        let mut position = first.fill(&payload, true);
        packets.push(first);

        let remainder = (payload.len() - position) % TS_PAYLOAD_SIZE;
        while payload.len() - position > remainder {
            let mut packet = TSPacket::new(pid);
            position += packet.fill(&payload[position..position + TS_PAYLOAD_SIZE], true);
            packets.push(packet);
        }

        if remainder > 0 {
            let mut packet = TSPacket::new(pid);
            packet.fill(&payload[position..], true);
            packets.push(packet);
        }

        packets
    }

    /// Rebuilds the access units carried by this packet.
    ///
    /// The presentation offset added on the mux side is removed from the PTS.
    /// `previous_pts` is the last presentation time seen on the same PID and
    /// yields the duration of a video unit.
    pub fn make_access_units(
        &self,
        stream_type: StreamType,
        previous_pts: Option<Duration>,
    ) -> Result<Vec<AccessUnit>> {
        let mut timing = self
            .optional_header
            .as_ref()
            .map(|header| header.make_timing(None))
            .unwrap_or_default();
        timing.pts = timing
            .pts
            .map(|pts| pts.saturating_sub(PESOptionalHeader::OFFSET));
        timing.duration = match (timing.pts, previous_pts) {
            (Some(pts), Some(previous)) => pts.checked_sub(previous),
            _ => None,
        };

        match stream_type {
            StreamType::H264 | StreamType::H265 => {
                Ok(vec![self.video_access_unit(stream_type, &timing)])
            }
            StreamType::AdtsAac => Ok(self.audio_access_units(&timing)),
            StreamType::Unsupported => Err(LstkError::UnsupportedStreamType(self.stream_id)),
        }
    }

    fn video_access_unit(&self, stream_type: StreamType, timing: &PESTiming) -> AccessUnit {
        let role_of: fn(&[u8]) -> NalRole = match stream_type {
            StreamType::H265 => h265::nal_role,
            _ => h264::nal_role,
        };

        let mut body = BytesMut::with_capacity(self.data.len());
        let mut parameter_sets = Vec::new();
        let mut delimited_sync = None;
        let mut has_sync_sample = false;

        for nal in split_annexb(&self.data) {
            match role_of(nal) {
                NalRole::AccessUnitDelimiter(sync) => delimited_sync = Some(sync),
                NalRole::ParameterSet => parameter_sets.push(Bytes::copy_from_slice(nal)),
                NalRole::SyncSample => {
                    has_sync_sample = true;
                    put_iso_unit(&mut body, nal);
                }
                NalRole::Other => put_iso_unit(&mut body, nal),
            }
        }

        AccessUnit {
            stream_type,
            data: body.freeze(),
            pts: timing.pts.unwrap_or_default(),
            dts: timing.dts,
            is_sync: delimited_sync.unwrap_or(has_sync_sample),
            duration: timing.duration,
            parameter_sets,
        }
    }

    fn audio_access_units(&self, timing: &PESTiming) -> Vec<AccessUnit> {
        let base = timing.pts.unwrap_or_default();
        let mut offset = Duration::ZERO;
        let mut units = Vec::new();

        for frame in AdtsFrames::new(&self.data) {
            let frame_duration = parse_adts_header(frame)
                .ok()
                .and_then(|header| header.frame_duration());
            units.push(AccessUnit {
                stream_type: StreamType::AdtsAac,
                data: Bytes::copy_from_slice(frame),
                pts: base + offset,
                dts: None,
                is_sync: true,
                duration: frame_duration.or(timing.duration),
                parameter_sets: Vec::new(),
            });
            offset += frame_duration.unwrap_or_default();
        }

        if units.is_empty() {
            log::warn!("PES at {:?} carries no ADTS frame", base);
        }
        units
    }
}
