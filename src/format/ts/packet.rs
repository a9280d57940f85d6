use super::pcr::TSProgramClockReference;
use super::types::*;
use crate::error::{LstkError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Adaptation field of a TS packet.
///
/// The encoded size is always `1 + length()`. A field with no flags and no
/// stuffing encodes as the single length byte `0x00`; stuffing on an otherwise
/// empty field starts with an all-zero flags byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TSAdaptationField {
    pub discontinuity_indicator: bool,
    pub random_access_indicator: bool,
    pub es_priority_indicator: bool,
    pub pcr: Option<TSProgramClockReference>,
    pub opcr: Option<TSProgramClockReference>,
    pub splice_countdown: Option<i8>,
    pub private_data: Option<Vec<u8>>,
    pub stuffing_bytes: usize,
}

impl TSAdaptationField {
    pub fn with_pcr(pcr: TSProgramClockReference) -> Self {
        Self {
            pcr: Some(pcr),
            ..Default::default()
        }
    }

    fn has_flags(&self) -> bool {
        self.discontinuity_indicator
            || self.random_access_indicator
            || self.es_priority_indicator
            || self.pcr.is_some()
            || self.opcr.is_some()
            || self.splice_countdown.is_some()
            || self.private_data.is_some()
    }

    fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.discontinuity_indicator {
            flags |= 0x80;
        }
        if self.random_access_indicator {
            flags |= 0x40;
        }
        if self.es_priority_indicator {
            flags |= 0x20;
        }
        if self.pcr.is_some() {
            flags |= 0x10;
        }
        if self.opcr.is_some() {
            flags |= 0x08;
        }
        if self.splice_countdown.is_some() {
            flags |= 0x04;
        }
        if self.private_data.is_some() {
            flags |= 0x02;
        }
        flags
    }

    /// Value of the `adaptation_field_length` byte.
    pub fn length(&self) -> usize {
        if !self.has_flags() {
            return self.stuffing_bytes;
        }
        let mut n = 1;
        if self.pcr.is_some() {
            n += TSProgramClockReference::DATA_SIZE;
        }
        if self.opcr.is_some() {
            n += TSProgramClockReference::DATA_SIZE;
        }
        if self.splice_countdown.is_some() {
            n += 1;
        }
        if let Some(data) = &self.private_data {
            n += 1 + data.len();
        }
        n + self.stuffing_bytes
    }

    /// Bytes the field occupies in the packet, length byte included.
    pub fn encoded_len(&self) -> usize {
        1 + self.length()
    }

    /// Grows the encoded size by exactly `n` bytes.
    pub fn stuff(&mut self, n: usize) {
        self.stuffing_bytes += n;
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.length() as u8);
        if !self.has_flags() {
            if self.stuffing_bytes > 0 {
                buf.put_u8(0x00);
                buf.put_bytes(0xFF, self.stuffing_bytes - 1);
            }
            return;
        }

        buf.put_u8(self.flags());
        if let Some(pcr) = &self.pcr {
            buf.put_slice(&pcr.encode());
        }
        if let Some(opcr) = &self.opcr {
            buf.put_slice(&opcr.encode());
        }
        if let Some(countdown) = self.splice_countdown {
            buf.put_i8(countdown);
        }
        if let Some(data) = &self.private_data {
            buf.put_u8(data.len() as u8);
            buf.put_slice(data);
        }
        buf.put_bytes(0xFF, self.stuffing_bytes);
    }

    /// Parses the `length` bytes following the adaptation field length byte.
    pub fn parse(data: &[u8]) -> Result<TSAdaptationField> {
        let mut field = TSAdaptationField::default();
        let Some(&flags) = data.first() else {
            return Ok(field);
        };
        if flags & 0xFE == 0 {
            // Bare flags byte: the whole body is stuffing
            field.stuffing_bytes = data.len();
            return Ok(field);
        }

        field.discontinuity_indicator = (flags & 0x80) != 0;
        field.random_access_indicator = (flags & 0x40) != 0;
        field.es_priority_indicator = (flags & 0x20) != 0;

        let mut pos = 1;

        if (flags & 0x10) != 0 {
            if data.len() < pos + TSProgramClockReference::DATA_SIZE {
                return Err(LstkError::InvalidData("PCR data too short".into()));
            }
            field.pcr = Some(TSProgramClockReference::decode(&data[pos..]));
            pos += TSProgramClockReference::DATA_SIZE;
        }

        if (flags & 0x08) != 0 {
            if data.len() < pos + TSProgramClockReference::DATA_SIZE {
                return Err(LstkError::InvalidData("OPCR data too short".into()));
            }
            field.opcr = Some(TSProgramClockReference::decode(&data[pos..]));
            pos += TSProgramClockReference::DATA_SIZE;
        }

        if (flags & 0x04) != 0 {
            if data.len() < pos + 1 {
                return Err(LstkError::InvalidData("Splice countdown too short".into()));
            }
            field.splice_countdown = Some(data[pos] as i8);
            pos += 1;
        }

        if (flags & 0x02) != 0 {
            if data.len() < pos + 1 {
                return Err(LstkError::InvalidData(
                    "Private data length byte missing".into(),
                ));
            }
            let private_data_length = data[pos] as usize;
            pos += 1;
            if data.len() < pos + private_data_length {
                return Err(LstkError::InvalidData("Private data too short".into()));
            }
            field.private_data = Some(data[pos..pos + private_data_length].to_vec());
            pos += private_data_length;
        }

        // Extension fields are not interpreted and count as stuffing
        field.stuffing_bytes = data.len() - pos;
        Ok(field)
    }
}

/// A single 188-byte transport stream packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSPacket {
    pub header: TSHeader,
    pub adaptation_field: Option<TSAdaptationField>,
    pub payload: Bytes,
}

impl TSPacket {
    pub fn new(pid: u16) -> Self {
        Self {
            header: TSHeader {
                pid: pid & 0x1FFF,
                contains_payload: false,
                ..Default::default()
            },
            adaptation_field: None,
            payload: Bytes::new(),
        }
    }

    pub fn pid(&self) -> u16 {
        self.header.pid
    }

    /// Bytes still free for payload or stuffing.
    pub fn remaining(&self) -> usize {
        let used = self
            .adaptation_field
            .as_ref()
            .map_or(0, |field| field.encoded_len())
            + self.payload.len();
        TS_PAYLOAD_SIZE.saturating_sub(used)
    }

    /// Appends as much of `data` as fits and pads the rest of the packet.
    ///
    /// Padding goes into adaptation field stuffing when `use_adaptation_field`
    /// is set (creating the field if needed), otherwise into `0xFF` payload
    /// bytes as PSI sections require. Returns the number of bytes consumed.
    pub fn fill(&mut self, data: &[u8], use_adaptation_field: bool) -> usize {
        let capacity = self.remaining();
        let length = data.len().min(capacity);

        let mut payload = BytesMut::with_capacity(self.payload.len() + capacity);
        payload.put_slice(&self.payload);
        payload.put_slice(&data[..length]);

        let remain = capacity - length;
        if remain > 0 {
            if use_adaptation_field {
                match &mut self.adaptation_field {
                    Some(field) => field.stuff(remain),
                    None => {
                        // A lone length byte already takes one
                        let mut field = TSAdaptationField::default();
                        field.stuff(remain - 1);
                        self.adaptation_field = Some(field);
                    }
                }
            } else {
                payload.put_bytes(0xFF, remain);
            }
        }

        self.payload = payload.freeze();
        self.header.adaptation_field_exists = self.adaptation_field.is_some();
        self.header.contains_payload = !self.payload.is_empty();
        length
    }

    pub fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        let field_len = self
            .adaptation_field
            .as_ref()
            .map_or(0, |field| field.encoded_len());
        let total = TS_HEADER_SIZE + field_len + self.payload.len();
        if total != TS_PACKET_SIZE {
            return Err(LstkError::InvalidData(format!(
                "TS packet for PID {} is {} bytes, expected {}",
                self.header.pid, total, TS_PACKET_SIZE
            )));
        }

        let mut header = self.header;
        header.adaptation_field_exists = self.adaptation_field.is_some();
        header.contains_payload = !self.payload.is_empty();
        header.write_to(buf);

        if let Some(field) = &self.adaptation_field {
            field.write_to(buf);
        }
        buf.put_slice(&self.payload);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
        self.write_to(&mut buf)?;
        Ok(buf.freeze())
    }

    pub fn parse(data: &[u8]) -> Result<TSPacket> {
        if data.len() < TS_PACKET_SIZE {
            return Err(LstkError::InvalidData(format!(
                "TS packet too short: {} bytes",
                data.len()
            )));
        }
        let data = &data[..TS_PACKET_SIZE];
        let header = TSHeader::parse(data)?;

        let mut offset = TS_HEADER_SIZE;
        let mut adaptation_field = None;
        if header.adaptation_field_exists {
            let length = data[offset] as usize;
            offset += 1;
            if offset + length > TS_PACKET_SIZE {
                return Err(LstkError::InvalidData(format!(
                    "Adaptation field length {} overruns packet",
                    length
                )));
            }
            adaptation_field = Some(TSAdaptationField::parse(&data[offset..offset + length])?);
            offset += length;
        }

        let payload = if header.contains_payload {
            Bytes::copy_from_slice(&data[offset..])
        } else {
            Bytes::new()
        };

        Ok(TSPacket {
            header,
            adaptation_field,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fill_full_payload() {
        let data = vec![0xAB; 200];
        let mut packet = TSPacket::new(0x100);
        assert_eq!(packet.fill(&data, true), TS_PAYLOAD_SIZE);
        assert!(packet.adaptation_field.is_none());
        assert_eq!(packet.to_bytes().unwrap().len(), TS_PACKET_SIZE);
    }

    #[test]
    fn test_fill_183_uses_length_only_field() {
        let mut packet = TSPacket::new(0x100);
        assert_eq!(packet.fill(&[0x11; 183], true), 183);

        let field = packet.adaptation_field.as_ref().unwrap();
        assert_eq!(field.length(), 0);

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes.len(), TS_PACKET_SIZE);
        assert_eq!(bytes[3] & 0x30, 0x30);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(&bytes[5..], &[0x11; 183][..]);
    }

    #[test]
    fn test_fill_short_payload_stuffs() {
        let mut packet = TSPacket::new(0x101);
        assert_eq!(packet.fill(&[0x22; 10], true), 10);

        let bytes = packet.to_bytes().unwrap();
        // 4 header + 1 length + 1 flags + 172 stuffing + 10 payload
        assert_eq!(bytes[4] as usize, 173);
        assert_eq!(bytes[5], 0x00);
        assert!(bytes[6..178].iter().all(|&b| b == 0xFF));
        assert_eq!(&bytes[178..], &[0x22; 10][..]);
    }

    #[test]
    fn test_fill_with_pcr() {
        let pcr = TSProgramClockReference::new(1_000_000, 0);
        let mut packet = TSPacket::new(0x100);
        packet.adaptation_field = Some(TSAdaptationField::with_pcr(pcr));
        assert_eq!(packet.fill(&[0x33; 500], true), TS_PAYLOAD_SIZE - 8);

        let parsed = TSPacket::parse(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.adaptation_field.unwrap().pcr, Some(pcr));
        assert_eq!(parsed.payload.len(), TS_PAYLOAD_SIZE - 8);
    }

    #[test]
    fn test_fill_without_adaptation_field_pads_payload() {
        let mut packet = TSPacket::new(PID_PAT);
        packet.fill(&[0x00, 0x00, 0xB0], false);
        assert!(packet.adaptation_field.is_none());
        assert_eq!(packet.payload.len(), TS_PAYLOAD_SIZE);
        assert_eq!(packet.payload[3], 0xFF);
    }

    #[test]
    fn test_parse_round_trip() {
        let mut packet = TSPacket::new(0x1ABC);
        packet.header.payload_unit_start = true;
        packet.header.continuity_counter = 7;
        packet.adaptation_field = Some(TSAdaptationField {
            random_access_indicator: true,
            splice_countdown: Some(-3),
            private_data: Some(vec![1, 2, 3]),
            ..Default::default()
        });
        packet.fill(&[0x44; 50], true);

        let parsed = TSPacket::parse(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_write_rejects_underfilled_packet() {
        let mut packet = TSPacket::new(0x100);
        packet.payload = Bytes::from_static(&[0x00; 10]);
        assert!(packet.to_bytes().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(TSPacket::parse(&[0x47; 100]).is_err());

        let mut data = vec![0xFF; TS_PACKET_SIZE];
        data[0] = 0x47;
        data[3] = 0x30;
        data[4] = 200;
        assert!(TSPacket::parse(&data).is_err());
    }
}
