//! # H.264/AVC NAL unit handling
//!
//! Classifies NAL units for the transport layer and builds the access unit
//! delimiter written in front of every muxed frame.
//!
//! ```rust
//! use lstk::codec::h264::{self, NALUnitType, PrimaryPicType};
//! use lstk::codec::NalRole;
//!
//! assert_eq!(h264::access_unit_delimiter(true), [0x09, 0x10]);
//! assert_eq!(h264::nal_role(&[0x67, 0x42]), NalRole::ParameterSet);
//! assert_eq!(NALUnitType::from_header(0x65), NALUnitType::CodedSliceIDR);
//! assert_eq!(PrimaryPicType::from_payload(0x30), PrimaryPicType::IP);
//! ```

/// NAL unit types and header helpers
pub mod types;

#[doc(inline)]
pub use types::*;

use crate::codec::NalRole;

/// Access unit delimiter tag announcing a sync (I) frame.
pub const AUD_SYNC_TAG: u8 = 0x10;
/// Access unit delimiter tag announcing a non-sync frame.
pub const AUD_NON_SYNC_TAG: u8 = 0x30;

/// Builds the two-byte access unit delimiter NAL unit.
pub fn access_unit_delimiter(is_sync: bool) -> [u8; 2] {
    let pic_type = if is_sync {
        PrimaryPicType::I
    } else {
        PrimaryPicType::IP
    };
    [NALUnitType::AccessUnitDelimiter as u8, pic_type.to_payload()]
}

pub fn nal_role(nal: &[u8]) -> NalRole {
    let Some(&header) = nal.first() else {
        return NalRole::Other;
    };
    match NALUnitType::from_header(header) {
        NALUnitType::AccessUnitDelimiter => {
            let sync = nal
                .get(1)
                .is_some_and(|&b| PrimaryPicType::from_payload(b) == PrimaryPicType::I);
            NalRole::AccessUnitDelimiter(sync)
        }
        t if t.is_parameter_set() => NalRole::ParameterSet,
        NALUnitType::CodedSliceIDR => NalRole::SyncSample,
        _ => NalRole::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nal_roles() {
        assert_eq!(nal_role(&[0x09, 0x10]), NalRole::AccessUnitDelimiter(true));
        assert_eq!(nal_role(&[0x09, 0x30]), NalRole::AccessUnitDelimiter(false));
        assert_eq!(nal_role(&[0x68, 0xCE]), NalRole::ParameterSet);
        assert_eq!(nal_role(&[0x65, 0x88]), NalRole::SyncSample);
        assert_eq!(nal_role(&[0x41, 0x9A]), NalRole::Other);
        assert_eq!(nal_role(&[]), NalRole::Other);
    }

    #[test]
    fn test_delimiter_tags() {
        assert_eq!(access_unit_delimiter(true)[1], AUD_SYNC_TAG);
        assert_eq!(access_unit_delimiter(false)[1], AUD_NON_SYNC_TAG);
        assert_eq!(PrimaryPicType::from_payload(0xF0), PrimaryPicType::Other(7));
        assert_eq!(PrimaryPicType::Other(7).to_payload(), 0xF0);
    }
}
