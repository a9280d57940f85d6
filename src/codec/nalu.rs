use bytes::{BufMut, BytesMut};

/// Four-byte Annex-B start code written in front of every NAL unit.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Size of the big-endian length prefix in the length-prefixed ("ISO") layout.
pub const NAL_LENGTH_SIZE: usize = 4;

/// What a NAL unit means to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalRole {
    /// Access unit delimiter, `true` when it announces a sync frame
    AccessUnitDelimiter(bool),
    ParameterSet,
    SyncSample,
    Other,
}

/// Iterates the NAL units of a length-prefixed buffer.
///
/// A length running past the end of the buffer yields the remaining bytes as
/// the final unit.
pub fn iso_nal_units(data: &[u8]) -> Vec<&[u8]> {
    let mut units = Vec::new();
    let mut pos = 0;
    while pos + NAL_LENGTH_SIZE <= data.len() {
        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        pos += NAL_LENGTH_SIZE;
        let end = pos.saturating_add(length);
        if end > data.len() {
            log::warn!(
                "NAL length {} exceeds remaining {} bytes",
                length,
                data.len() - pos
            );
            units.push(&data[pos..]);
            return units;
        }
        units.push(&data[pos..end]);
        pos = end;
    }
    if pos < data.len() {
        log::warn!("dropping {} trailing bytes after last NAL unit", data.len() - pos);
    }
    units
}

/// Converts length-prefixed NAL units to an Annex-B byte stream.
pub fn iso_to_annexb(data: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(data.len());
    for nal in iso_nal_units(data) {
        buf.put_slice(&START_CODE);
        buf.put_slice(nal);
    }
    buf.to_vec()
}

/// Splits an Annex-B byte stream on 3- and 4-byte start codes.
///
/// Trailing zero bytes in front of the next start code are not part of the
/// preceding unit. Bytes before the first start code are discarded.
pub fn split_annexb(data: &[u8]) -> Vec<&[u8]> {
    let mut units = Vec::new();
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            if let Some(s) = start {
                push_unit(&mut units, &data[s..i]);
            }
            i += 3;
            start = Some(i);
            continue;
        }
        i += 1;
    }

    if let Some(s) = start {
        push_unit(&mut units, &data[s..]);
    }
    units
}

fn push_unit<'a>(units: &mut Vec<&'a [u8]>, unit: &'a [u8]) {
    let end = unit.iter().rposition(|&b| b != 0x00).map_or(0, |p| p + 1);
    if end > 0 {
        units.push(&unit[..end]);
    }
}

/// Writes one NAL unit with its 4-byte length prefix.
pub fn put_iso_unit(buf: &mut BytesMut, nal: &[u8]) {
    buf.put_u32(nal.len() as u32);
    buf.put_slice(nal);
}

/// Converts an Annex-B byte stream to length-prefixed NAL units.
pub fn annexb_to_iso(data: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(data.len());
    for nal in split_annexb(data) {
        put_iso_unit(&mut buf, nal);
    }
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_iso_to_annexb() {
        let iso = [0, 0, 0, 2, 0x65, 0x88, 0, 0, 0, 1, 0x41];
        assert_eq!(
            iso_to_annexb(&iso),
            vec![0, 0, 0, 1, 0x65, 0x88, 0, 0, 0, 1, 0x41]
        );
    }

    #[test]
    fn test_split_mixed_start_codes() {
        let stream = [0, 0, 0, 1, 0x09, 0x10, 0, 0, 1, 0x67, 0x42, 0, 0, 0, 1, 0x65, 0xAA];
        let units = split_annexb(&stream);
        assert_eq!(units, vec![&[0x09, 0x10][..], &[0x67, 0x42][..], &[0x65, 0xAA][..]]);
    }

    #[test]
    fn test_annexb_to_iso() {
        let stream = [0, 0, 1, 0x41, 0x9A, 0, 0, 0, 1, 0x01];
        assert_eq!(annexb_to_iso(&stream), vec![0, 0, 0, 2, 0x41, 0x9A, 0, 0, 0, 1, 0x01]);
    }

    #[test]
    fn test_truncated_length_prefix() {
        let iso = [0, 0, 0, 9, 0x65, 0x88];
        assert_eq!(iso_nal_units(&iso), vec![&[0x65, 0x88][..]]);
    }

    #[test]
    fn test_no_start_code() {
        assert!(split_annexb(&[0x65, 0x88, 0x99]).is_empty());
    }
}
