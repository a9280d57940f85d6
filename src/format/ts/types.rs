use crate::error::{LstkError, Result};
use bytes::{BufMut, BytesMut};

// Stream IDs
pub const STREAM_ID_H264: u8 = 0xe0;
pub const STREAM_ID_H265: u8 = 0xe1;
pub const STREAM_ID_AAC: u8 = 0xc0;

// PIDs
pub const PID_PAT: u16 = 0x0000;
pub const PID_NULL: u16 = 0x1fff;

// Table IDs
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;

// Elementary Stream Types
pub const STREAM_TYPE_H264: u8 = 0x1b;
pub const STREAM_TYPE_H265: u8 = 0x24;
pub const STREAM_TYPE_AAC: u8 = 0x0f;

// Constants
pub const SYNC_BYTE: u8 = 0x47;
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TSHeader {
    pub sync_byte: u8, // Always 0x47
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub scrambling_control: u8,
    pub adaptation_field_exists: bool,
    pub contains_payload: bool,
    pub continuity_counter: u8,
}

impl Default for TSHeader {
    fn default() -> Self {
        Self {
            sync_byte: SYNC_BYTE,
            transport_error: false,
            payload_unit_start: false,
            transport_priority: false,
            pid: 0,
            scrambling_control: 0,
            adaptation_field_exists: false,
            contains_payload: true,
            continuity_counter: 0,
        }
    }
}

impl TSHeader {
    pub fn parse(data: &[u8]) -> Result<TSHeader> {
        if data.len() < TS_HEADER_SIZE {
            return Err(LstkError::InvalidData("TS packet too short".into()));
        }

        if data[0] != SYNC_BYTE {
            return Err(LstkError::InvalidData(format!(
                "Invalid sync byte 0x{:02x}",
                data[0]
            )));
        }

        Ok(TSHeader {
            sync_byte: data[0],
            transport_error: (data[1] & 0x80) != 0,
            payload_unit_start: (data[1] & 0x40) != 0,
            transport_priority: (data[1] & 0x20) != 0,
            pid: (((data[1] & 0x1F) as u16) << 8) | data[2] as u16,
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_exists: (data[3] & 0x20) != 0,
            contains_payload: (data[3] & 0x10) != 0,
            continuity_counter: data[3] & 0x0F,
        })
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.sync_byte);

        let mut b1 = 0u8;
        if self.transport_error {
            b1 |= 0x80;
        }
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        if self.transport_priority {
            b1 |= 0x20;
        }
        b1 |= ((self.pid >> 8) & 0x1f) as u8;
        buf.put_u8(b1);

        buf.put_u8((self.pid & 0xff) as u8);

        let mut b3 = (self.scrambling_control & 0x03) << 6;
        if self.adaptation_field_exists {
            b3 |= 0x20;
        }
        if self.contains_payload {
            b3 |= 0x10;
        }
        b3 |= self.continuity_counter & 0x0f;
        buf.put_u8(b3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ts_header() {
        let data = [
            0x47, // Sync byte
            0x41, // Payload unit start indicator set, PID high bits
            0x00, // PID low bits
            0x3A, // Adaptation + payload, continuity counter 10
        ];

        let header = TSHeader::parse(&data).unwrap();
        assert!(header.payload_unit_start);
        assert!(header.adaptation_field_exists);
        assert!(header.contains_payload);
        assert_eq!(header.pid, 0x100);
        assert_eq!(header.continuity_counter, 10);

        let mut buf = BytesMut::new();
        header.write_to(&mut buf);
        assert_eq!(&buf[..], &data);
    }

    #[test]
    fn test_bad_sync_byte() {
        assert!(TSHeader::parse(&[0x48, 0x00, 0x00, 0x10]).is_err());
        assert!(TSHeader::parse(&[0x47, 0x00]).is_err());
    }
}
