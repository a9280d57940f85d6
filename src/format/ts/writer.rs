use super::packet::{TSAdaptationField, TSPacket};
use super::pcr::TSProgramClockReference;
use super::timestamp::TSTimestamp;
use super::pes::{PESOptionalHeader, PacketizedElementaryStream};
use super::psi::{self, ElementaryStreamInfo, PAT, PMT};
use super::types::*;
use crate::av::{AccessUnit, FormatDescription, StreamInfo, StreamType};
use crate::config::{ts_config, TSConfig};
use crate::error::{LstkError, Result};
use crate::utils::Crc32Mpeg2;
use bytes::{Bytes, BytesMut};
use std::time::Duration;

#[derive(Debug)]
struct StreamState {
    info: StreamInfo,
    continuity_counter: u8,
}

/// Synchronous transport stream multiplexer.
///
/// Turns access units into TS packets for a single program. PAT and PMT are
/// sent before the first access unit and again before every video sync frame,
/// or every `psi_interval` when the program has no video. The PCR rides on the first video stream (or the first stream when there is
/// no video) at most once per configured interval.
pub struct TSWriter {
    config: TSConfig,
    streams: Vec<StreamState>,
    pat_counter: u8,
    pmt_counter: u8,
    base_timestamp: Option<Duration>,
    last_pcr: Option<Duration>,
    last_psi: Option<Duration>,
    psi_written: bool,
    discontinuity: bool,
    crc: Crc32Mpeg2,
}

impl Default for TSWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TSWriter {
    pub fn new() -> Self {
        Self::with_config(ts_config())
    }

    pub fn with_config(config: TSConfig) -> Self {
        Self {
            config,
            streams: Vec::new(),
            pat_counter: 0,
            pmt_counter: 0,
            base_timestamp: None,
            last_pcr: None,
            last_psi: None,
            psi_written: false,
            discontinuity: false,
            crc: Crc32Mpeg2::new(),
        }
    }

    pub fn config(&self) -> &TSConfig {
        &self.config
    }

    pub fn add_stream(&mut self, info: StreamInfo) -> Result<()> {
        if info.stream_type == StreamType::Unsupported {
            return Err(LstkError::Codec(format!(
                "cannot mux unsupported stream on PID 0x{:04x}",
                info.pid
            )));
        }
        if info.pid == PID_PAT || info.pid == PID_NULL || info.pid == self.config.pmt_pid {
            return Err(LstkError::InvalidData(format!(
                "PID 0x{:04x} is reserved",
                info.pid
            )));
        }
        if self.streams.iter().any(|s| s.info.pid == info.pid) {
            return Err(LstkError::InvalidData(format!(
                "PID 0x{:04x} already in use",
                info.pid
            )));
        }
        log::debug!("adding {:?} stream on PID 0x{:04x}", info.stream_type, info.pid);
        self.streams.push(StreamState {
            info,
            continuity_counter: 0,
        });
        Ok(())
    }

    /// Adds a stream on the configured video or audio PID, moving to the next
    /// free PID when that one is taken. Returns the PID used.
    pub fn add_stream_type(
        &mut self,
        stream_type: StreamType,
        format: Option<FormatDescription>,
    ) -> Result<u16> {
        let mut pid = if stream_type.is_video() {
            self.config.video_pid
        } else {
            self.config.audio_pid
        };
        while self.streams.iter().any(|s| s.info.pid == pid) || pid == self.config.pmt_pid {
            pid += 1;
            if pid >= PID_NULL {
                return Err(LstkError::InvalidData("no free PID left".into()));
            }
        }
        let mut info = StreamInfo::new(pid, stream_type);
        info.format = format;
        self.add_stream(info)?;
        Ok(pid)
    }

    pub fn set_format_description(&mut self, pid: u16, format: FormatDescription) -> Result<()> {
        let stream = self
            .streams
            .iter_mut()
            .find(|s| s.info.pid == pid)
            .ok_or_else(|| LstkError::InvalidData(format!("no stream on PID 0x{:04x}", pid)))?;
        stream.info.format = Some(format);
        Ok(())
    }

    /// Fixes the reference clock subtracted from every timestamp. Without it,
    /// the earliest timestamp of the first access unit minus the presentation
    /// offset is used. The clock is shared by all streams of the program.
    pub fn set_base_timestamp(&mut self, base: Duration) {
        self.base_timestamp = Some(base);
    }

    /// Flags a timeline break on the next PES of every stream.
    pub fn mark_discontinuity(&mut self) {
        self.discontinuity = true;
        self.last_pcr = None;
        self.last_psi = None;
    }

    pub fn streams(&self) -> Vec<StreamInfo> {
        self.streams.iter().map(|s| s.info.clone()).collect()
    }

    pub fn pcr_pid(&self) -> u16 {
        self.streams
            .iter()
            .find(|s| s.info.stream_type.is_video())
            .or_else(|| self.streams.first())
            .map_or(PID_NULL, |s| s.info.pid)
    }

    fn program_map(&self) -> PMT {
        PMT {
            program_number: 1,
            pcr_pid: self.pcr_pid(),
            program_descriptors: Vec::new(),
            elementary_stream_infos: self
                .streams
                .iter()
                .filter_map(|s| {
                    Some(ElementaryStreamInfo {
                        stream_type: s.info.stream_type.as_u8()?,
                        elementary_pid: s.info.pid,
                        descriptors: Vec::new(),
                    })
                })
                .collect(),
        }
    }

    /// PAT and PMT packets with their own continuity counters.
    pub fn write_psi(&mut self) -> Result<Vec<TSPacket>> {
        let pat = PAT::single_program(self.config.pmt_pid).encode(&self.crc)?;
        let pmt = self.program_map().encode(&self.crc)?;

        let mut pat_packet = psi::packetize(PID_PAT, &pat)?;
        pat_packet.header.continuity_counter = self.pat_counter;
        self.pat_counter = (self.pat_counter + 1) & 0x0F;

        let mut pmt_packet = psi::packetize(self.config.pmt_pid, &pmt)?;
        pmt_packet.header.continuity_counter = self.pmt_counter;
        self.pmt_counter = (self.pmt_counter + 1) & 0x0F;

        self.psi_written = true;
        Ok(vec![pat_packet, pmt_packet])
    }

    fn next_pcr(&mut self, elapsed: Duration) -> Option<TSProgramClockReference> {
        if let Some(last) = self.last_pcr {
            if elapsed >= last && elapsed - last < self.config.pcr_interval {
                return None;
            }
        }
        self.last_pcr = Some(elapsed);
        let base = TSTimestamp::from_duration(elapsed) as u64;
        Some(TSProgramClockReference::new(base, 0))
    }

    fn psi_due(&self, unit: &AccessUnit, elapsed: Duration) -> bool {
        if !self.psi_written {
            return true;
        }
        if self.streams.iter().any(|s| s.info.stream_type.is_video()) {
            return unit.is_sync && unit.stream_type.is_video();
        }
        match self.last_psi {
            Some(last) if elapsed >= last => elapsed - last >= self.config.psi_interval,
            _ => true,
        }
    }

    /// Multiplexes one access unit onto the first stream of its type.
    pub fn write(&mut self, unit: &AccessUnit) -> Result<Vec<TSPacket>> {
        let index = self
            .streams
            .iter()
            .position(|s| s.info.stream_type == unit.stream_type)
            .ok_or_else(|| {
                LstkError::Codec(format!("no {:?} stream registered", unit.stream_type))
            })?;
        // One presentation offset before the first unit's decode time
        let base = *self
            .base_timestamp
            .get_or_insert_with(|| unit.decode_time().saturating_sub(PESOptionalHeader::OFFSET));
        if unit.decode_time() < base {
            log::warn!(
                "{:?} unit at {:?} precedes base timestamp {:?}, clamping",
                unit.stream_type,
                unit.decode_time(),
                base
            );
        }

        let elapsed = unit.decode_time().saturating_sub(base);

        let mut packets = Vec::new();
        if self.psi_due(unit, elapsed) {
            packets.extend(self.write_psi()?);
            self.last_psi = Some(elapsed);
        }

        let info = &self.streams[index].info;
        let pes = match info.stream_type {
            StreamType::H264 | StreamType::H265 => {
                PacketizedElementaryStream::from_video(unit, info.format.as_ref(), base)?
            }
            StreamType::AdtsAac => {
                let config = match &info.format {
                    Some(FormatDescription::Audio(config)) => Some(config),
                    _ => None,
                };
                PacketizedElementaryStream::from_audio(unit, config, base)?
            }
            StreamType::Unsupported => {
                return Err(LstkError::Codec("cannot mux unsupported stream".into()))
            }
        };
        let pid = info.pid;

        let mut field = TSAdaptationField::default();
        if pid == self.pcr_pid() {
            field.pcr = self.next_pcr(elapsed);
        }
        field.random_access_indicator = unit.is_sync && unit.stream_type.is_video();
        field.discontinuity_indicator = self.discontinuity;
        self.discontinuity = false;
        let first_field = (field != TSAdaptationField::default()).then_some(field);

        let stream = &mut self.streams[index];
        for mut packet in pes.to_packets_with_field(pid, first_field) {
            packet.header.continuity_counter = stream.continuity_counter;
            if packet.header.contains_payload {
                stream.continuity_counter = (stream.continuity_counter + 1) & 0x0F;
            }
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Multiplexes one access unit straight into TS bytes.
    pub fn write_bytes(&mut self, unit: &AccessUnit) -> Result<Bytes> {
        let packets = self.write(unit)?;
        let mut buf = BytesMut::with_capacity(packets.len() * TS_PACKET_SIZE);
        for packet in &packets {
            packet.write_to(&mut buf)?;
        }
        Ok(buf.freeze())
    }
}
