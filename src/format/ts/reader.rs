use super::packet::TSPacket;
use super::pes::PacketizedElementaryStream;
use super::psi::{self, PAT, PMT};
use super::types::*;
use crate::av::{AccessUnit, StreamInfo, StreamType};
use crate::utils::Crc32Mpeg2;
use bytes::{Buf, BytesMut};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Transport stream demultiplexer.
///
/// Accepts the stream in arbitrary chunks and returns access units as their
/// PES packets complete. A bounded PES completes when its declared length
/// has arrived. An unbounded one (`packet_length == 0`) completes when the
/// next payload unit starts on its PID, or on [`flush`](Self::flush) at end of
/// stream. A new payload unit start discards an incomplete bounded PES.
#[derive(Default)]
pub struct TSReader {
    buffer: BytesMut,
    pmt_pids: HashSet<u16>,
    pmt: Option<PMT>,
    streams: BTreeMap<u16, StreamType>,
    pending: BTreeMap<u16, PacketizedElementaryStream>,
    previous_pts: HashMap<u16, Duration>,
    continuity: HashMap<u16, u8>,
    crc: Crc32Mpeg2,
}

impl TSReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demuxes `pid` as `stream_type` without waiting for a PMT.
    pub fn register_stream(&mut self, pid: u16, stream_type: StreamType) {
        self.streams.insert(pid, stream_type);
    }

    /// `true` once a PMT has been parsed.
    pub fn has_program(&self) -> bool {
        self.pmt.is_some()
    }

    pub fn program(&self) -> Option<&PMT> {
        self.pmt.as_ref()
    }

    pub fn streams(&self) -> Vec<StreamInfo> {
        self.streams
            .iter()
            .map(|(&pid, &stream_type)| StreamInfo::new(pid, stream_type))
            .collect()
    }

    /// Feeds bytes and returns the access units completed by them.
    pub fn read(&mut self, data: &[u8]) -> Vec<AccessUnit> {
        self.buffer.extend_from_slice(data);
        let mut units = Vec::new();

        loop {
            match self.buffer.iter().position(|&b| b == SYNC_BYTE) {
                Some(0) => {}
                Some(skip) => {
                    log::debug!("skipping {} bytes to resync", skip);
                    self.buffer.advance(skip);
                }
                None => {
                    if !self.buffer.is_empty() {
                        log::debug!("discarding {} bytes without sync byte", self.buffer.len());
                    }
                    self.buffer.clear();
                    break;
                }
            }
            if self.buffer.len() < TS_PACKET_SIZE {
                break;
            }
            // A sync byte must follow when the next packet is already here
            if self.buffer.len() > TS_PACKET_SIZE && self.buffer[TS_PACKET_SIZE] != SYNC_BYTE {
                self.buffer.advance(1);
                continue;
            }

            let chunk = self.buffer.split_to(TS_PACKET_SIZE);
            match TSPacket::parse(&chunk) {
                Ok(packet) => self.handle_packet(packet, &mut units),
                Err(e) => log::warn!("dropping malformed TS packet: {}", e),
            }
        }

        units
    }

    /// Ends the stream: emits unbounded PES packets still accumulating and
    /// drops incomplete bounded ones.
    pub fn flush(&mut self) -> Vec<AccessUnit> {
        let mut units = Vec::new();
        let pending = std::mem::take(&mut self.pending);
        for (pid, pes) in pending {
            if pes.packet_length == 0 {
                self.emit(pid, pes, &mut units);
            } else {
                log::debug!(
                    "dropping incomplete PES on PID 0x{:04x}: {} of {} bytes",
                    pid,
                    pes.data.len(),
                    pes.packet_length
                );
            }
        }
        if !self.buffer.is_empty() {
            log::debug!("discarding {} trailing bytes", self.buffer.len());
            self.buffer.clear();
        }
        units
    }

    fn check_continuity(&mut self, packet: &TSPacket) {
        if !packet.header.contains_payload {
            return;
        }
        let pid = packet.pid();
        let counter = packet.header.continuity_counter;
        if let Some(last) = self.continuity.insert(pid, counter) {
            if counter != (last + 1) & 0x0F && counter != last {
                log::debug!(
                    "continuity gap on PID 0x{:04x}: {} after {}",
                    pid,
                    counter,
                    last
                );
            }
        }
    }

    fn handle_packet(&mut self, packet: TSPacket, units: &mut Vec<AccessUnit>) {
        if packet.header.transport_error {
            log::debug!("skipping packet with transport error on PID 0x{:04x}", packet.pid());
            return;
        }
        let pid = packet.pid();
        if pid == PID_NULL {
            return;
        }
        self.check_continuity(&packet);

        if pid == PID_PAT {
            if packet.header.payload_unit_start {
                self.handle_pat(&packet.payload);
            }
            return;
        }
        if self.pmt_pids.contains(&pid) {
            if packet.header.payload_unit_start {
                self.handle_pmt(&packet.payload);
            }
            return;
        }
        if !self.streams.contains_key(&pid) || packet.payload.is_empty() {
            return;
        }

        if packet.header.payload_unit_start {
            if let Some(previous) = self.pending.remove(&pid) {
                if previous.packet_length == 0 {
                    self.emit(pid, previous, units);
                } else {
                    log::debug!(
                        "dropping incomplete PES on PID 0x{:04x}: {} of {} bytes",
                        pid,
                        previous.data.len(),
                        previous.packet_length
                    );
                }
            }
            match PacketizedElementaryStream::decode(&packet.payload) {
                Ok(pes) if pes.is_complete() => self.emit(pid, pes, units),
                Ok(pes) => {
                    self.pending.insert(pid, pes);
                }
                Err(e) => log::error!("dropping PES on PID 0x{:04x}: {}", pid, e),
            }
        } else if let Some(pes) = self.pending.get_mut(&pid) {
            pes.append(&packet.payload);
            if pes.is_complete() {
                if let Some(pes) = self.pending.remove(&pid) {
                    self.emit(pid, pes, units);
                }
            }
        } else {
            log::debug!("continuation without payload start on PID 0x{:04x}", pid);
        }
    }

    fn handle_pat(&mut self, payload: &[u8]) {
        let pat = psi::parse_section(payload, &self.crc).and_then(|s| PAT::decode(&s));
        match pat {
            Ok(pat) => {
                self.pmt_pids = pat.entries.iter().map(|e| e.program_map_pid).collect();
            }
            Err(e) => log::warn!("invalid PAT: {}", e),
        }
    }

    fn handle_pmt(&mut self, payload: &[u8]) {
        let pmt = psi::parse_section(payload, &self.crc).and_then(|s| PMT::decode(&s));
        match pmt {
            Ok(pmt) => {
                for info in &pmt.elementary_stream_infos {
                    let stream_type = StreamType::from_u8(info.stream_type);
                    if stream_type == StreamType::Unsupported {
                        log::debug!(
                            "ignoring stream type 0x{:02x} on PID 0x{:04x}",
                            info.stream_type,
                            info.elementary_pid
                        );
                        continue;
                    }
                    self.streams.insert(info.elementary_pid, stream_type);
                }
                self.pmt = Some(pmt);
            }
            Err(e) => log::warn!("invalid PMT: {}", e),
        }
    }

    fn emit(&mut self, pid: u16, pes: PacketizedElementaryStream, units: &mut Vec<AccessUnit>) {
        let Some(&stream_type) = self.streams.get(&pid) else {
            return;
        };
        let previous = self.previous_pts.get(&pid).copied();
        match pes.make_access_units(stream_type, previous) {
            Ok(decoded) => {
                if let Some(first) = decoded.first() {
                    self.previous_pts.insert(pid, first.pts);
                }
                units.extend(decoded);
            }
            Err(e) => log::error!("dropping PES on PID 0x{:04x}: {}", pid, e),
        }
    }
}
