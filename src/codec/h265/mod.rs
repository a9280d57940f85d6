//! # H.265/HEVC NAL unit handling
//!
//! H.265 NAL units carry a two-byte header; the type lives in bits 1..7 of the
//! first byte. This module mirrors [`crate::codec::h264`] for the transport
//! layer: delimiter construction and NAL classification.

/// Type definitions for H.265/HEVC NAL units
pub mod types;

pub use types::NALUnitType;

use crate::codec::NalRole;

/// Builds the three-byte access unit delimiter NAL unit.
///
/// `pic_type` 0 (I slices only) for sync frames, 1 (P and I) otherwise; the
/// resulting tag byte matches the H.264 delimiter tags.
pub fn access_unit_delimiter(is_sync: bool) -> [u8; 3] {
    let tag = if is_sync {
        crate::codec::h264::AUD_SYNC_TAG
    } else {
        crate::codec::h264::AUD_NON_SYNC_TAG
    };
    [(NALUnitType::Aud.as_u8()) << 1, 0x01, tag]
}

pub fn nal_role(nal: &[u8]) -> NalRole {
    let Some(&header) = nal.first() else {
        return NalRole::Other;
    };
    let nal_type = NALUnitType::from_u8((header >> 1) & 0x3F);
    match nal_type {
        NALUnitType::Aud => NalRole::AccessUnitDelimiter(nal.get(2).is_some_and(|b| b >> 5 == 0)),
        NALUnitType::Vps | NALUnitType::Sps | NALUnitType::Pps => NalRole::ParameterSet,
        t if t.is_irap() => NalRole::SyncSample,
        _ => NalRole::Other,
    }
}
