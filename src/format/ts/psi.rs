//! Program specific information: PAT and PMT sections.
//!
//! Every table is sent as a single section in a single TS packet, pointer
//! field zero, padded with `0xFF`.

use super::packet::TSPacket;
use super::types::*;
use crate::error::{LstkError, Result};
use crate::utils::Crc32Mpeg2;
use bytes::{BufMut, BytesMut};

/// Bytes between the section length field and the table body.
const SECTION_HEADER_SIZE: usize = 5;
const CRC_SIZE: usize = 4;
/// Largest section that fits behind the pointer field of one packet.
const MAX_SECTION_SIZE: usize = TS_PAYLOAD_SIZE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PATEntry {
    pub program_number: u16,
    pub program_map_pid: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PAT {
    pub transport_stream_id: u16,
    pub entries: Vec<PATEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub tag: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryStreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub descriptors: Vec<Descriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PMT {
    pub program_number: u16,
    pub pcr_pid: u16,
    pub program_descriptors: Vec<Descriptor>,
    pub elementary_stream_infos: Vec<ElementaryStreamInfo>,
}

/// A parsed section with its CRC already verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub table_id: u8,
    /// Transport stream id (PAT) or program number (PMT)
    pub extension: u16,
    pub body: &'a [u8],
}

impl PAT {
    /// Single-program table pointing at `pmt_pid`.
    pub fn single_program(pmt_pid: u16) -> Self {
        Self {
            transport_stream_id: 1,
            entries: vec![PATEntry {
                program_number: 1,
                program_map_pid: pmt_pid,
            }],
        }
    }

    pub fn encode(&self, crc: &Crc32Mpeg2) -> Result<Vec<u8>> {
        let mut body = BytesMut::with_capacity(self.entries.len() * 4);
        for entry in &self.entries {
            body.put_u16(entry.program_number);
            body.put_u16(0xE000 | (entry.program_map_pid & 0x1FFF));
        }
        encode_section(TABLE_ID_PAT, self.transport_stream_id, &body, crc)
    }

    pub fn decode(section: &Section<'_>) -> Result<PAT> {
        if section.table_id != TABLE_ID_PAT {
            return Err(LstkError::InvalidData(format!(
                "Expected PAT, found table 0x{:02x}",
                section.table_id
            )));
        }
        let mut pat = PAT {
            transport_stream_id: section.extension,
            entries: Vec::new(),
        };
        for chunk in section.body.chunks_exact(4) {
            let program_number = u16::from_be_bytes([chunk[0], chunk[1]]);
            let pid = u16::from_be_bytes([chunk[2], chunk[3]]) & 0x1FFF;
            if program_number == 0 {
                log::debug!("ignoring network PID 0x{:04x}", pid);
                continue;
            }
            pat.entries.push(PATEntry {
                program_number,
                program_map_pid: pid,
            });
        }
        Ok(pat)
    }
}

fn put_descriptors(buf: &mut BytesMut, descriptors: &[Descriptor]) {
    for descriptor in descriptors {
        buf.put_u8(descriptor.tag);
        buf.put_u8(descriptor.data.len() as u8);
        buf.put_slice(&descriptor.data);
    }
}

fn descriptors_len(descriptors: &[Descriptor]) -> usize {
    descriptors.iter().map(|d| 2 + d.data.len()).sum()
}

fn parse_descriptors(data: &[u8]) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::new();
    let mut pos = 0;

    while pos + 2 <= data.len() {
        let tag = data[pos];
        let length = data[pos + 1] as usize;
        pos += 2;

        if pos + length > data.len() {
            return Err(LstkError::InvalidData("Descriptor data too short".into()));
        }

        descriptors.push(Descriptor {
            tag,
            data: data[pos..pos + length].to_vec(),
        });
        pos += length;
    }

    Ok(descriptors)
}

impl PMT {
    pub fn encode(&self, crc: &Crc32Mpeg2) -> Result<Vec<u8>> {
        let mut body = BytesMut::new();
        body.put_u16(0xE000 | (self.pcr_pid & 0x1FFF));
        body.put_u16(0xF000 | descriptors_len(&self.program_descriptors) as u16);
        put_descriptors(&mut body, &self.program_descriptors);
        for info in &self.elementary_stream_infos {
            body.put_u8(info.stream_type);
            body.put_u16(0xE000 | (info.elementary_pid & 0x1FFF));
            body.put_u16(0xF000 | descriptors_len(&info.descriptors) as u16);
            put_descriptors(&mut body, &info.descriptors);
        }
        encode_section(TABLE_ID_PMT, self.program_number, &body, crc)
    }

    pub fn decode(section: &Section<'_>) -> Result<PMT> {
        if section.table_id != TABLE_ID_PMT {
            return Err(LstkError::InvalidData(format!(
                "Expected PMT, found table 0x{:02x}",
                section.table_id
            )));
        }
        let data = section.body;
        let mut pmt = PMT {
            program_number: section.extension,
            ..Default::default()
        };

        if data.len() < 4 {
            return Err(LstkError::InvalidData("PMT too short for PCR PID".into()));
        }
        pmt.pcr_pid = ((data[0] as u16 & 0x1F) << 8) | data[1] as u16;
        let program_info_length = ((data[2] as usize & 0x0F) << 8) | data[3] as usize;
        let mut pos = 4;

        if pos + program_info_length > data.len() {
            return Err(LstkError::InvalidData("Program info data too short".into()));
        }
        pmt.program_descriptors = parse_descriptors(&data[pos..pos + program_info_length])?;
        pos += program_info_length;

        while pos + 5 <= data.len() {
            let stream_type = data[pos];
            let elementary_pid = ((data[pos + 1] as u16 & 0x1F) << 8) | data[pos + 2] as u16;
            let es_info_length = ((data[pos + 3] as usize & 0x0F) << 8) | data[pos + 4] as usize;
            pos += 5;

            if pos + es_info_length > data.len() {
                return Err(LstkError::InvalidData("ES info data too short".into()));
            }

            let descriptors = parse_descriptors(&data[pos..pos + es_info_length])?;
            pos += es_info_length;

            pmt.elementary_stream_infos.push(ElementaryStreamInfo {
                stream_type,
                elementary_pid,
                descriptors,
            });
        }

        Ok(pmt)
    }
}

/// Wraps a table body in a version-0, current, single-section header and CRC.
pub fn encode_section(
    table_id: u8,
    extension: u16,
    body: &[u8],
    crc: &Crc32Mpeg2,
) -> Result<Vec<u8>> {
    let section_length = SECTION_HEADER_SIZE + body.len() + CRC_SIZE;
    if 3 + section_length > MAX_SECTION_SIZE {
        return Err(LstkError::InvalidData(format!(
            "PSI section of {} bytes does not fit in one packet",
            3 + section_length
        )));
    }

    let mut buf = BytesMut::with_capacity(3 + section_length);
    buf.put_u8(table_id);
    buf.put_u16(0xB000 | section_length as u16);
    buf.put_u16(extension);
    buf.put_u8(0xC1);
    buf.put_u8(0);
    buf.put_u8(0);
    buf.put_slice(body);
    let checksum = crc.calculate(&buf);
    buf.put_u32(checksum);
    Ok(buf.to_vec())
}

/// Places a section into a PUSI packet on `pid`.
pub fn packetize(pid: u16, section: &[u8]) -> Result<TSPacket> {
    if section.len() > MAX_SECTION_SIZE {
        return Err(LstkError::InvalidData(format!(
            "PSI section of {} bytes does not fit in one packet",
            section.len()
        )));
    }
    let mut packet = TSPacket::new(pid);
    packet.header.payload_unit_start = true;
    let mut payload = Vec::with_capacity(1 + section.len());
    payload.push(0x00);
    payload.extend_from_slice(section);
    packet.fill(&payload, false);
    Ok(packet)
}

/// Parses the section starting a PUSI packet payload.
pub fn parse_section<'a>(payload: &'a [u8], crc: &Crc32Mpeg2) -> Result<Section<'a>> {
    let Some(&pointer) = payload.first() else {
        return Err(LstkError::InvalidData("Empty PSI payload".into()));
    };
    let start = 1 + pointer as usize;
    if payload.len() < start + 3 {
        return Err(LstkError::InvalidData("PSI section header truncated".into()));
    }
    let data = &payload[start..];
    let table_id = data[0];
    let section_length = ((data[1] as usize & 0x0F) << 8) | data[2] as usize;
    if section_length < SECTION_HEADER_SIZE + CRC_SIZE || data.len() < 3 + section_length {
        return Err(LstkError::InvalidData(format!(
            "Invalid PSI section length {}",
            section_length
        )));
    }

    let section = &data[..3 + section_length];
    if crc.calculate(section) != 0 {
        return Err(LstkError::InvalidData(format!(
            "CRC mismatch in table 0x{:02x}",
            table_id
        )));
    }

    Ok(Section {
        table_id,
        extension: u16::from_be_bytes([data[3], data[4]]),
        body: &section[3 + SECTION_HEADER_SIZE..section.len() - CRC_SIZE],
    })
}
