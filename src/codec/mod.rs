//! Elementary stream adapters.
//!
//! Each submodule knows how one codec's access units are laid out inside a PES
//! payload: Annex-B framing for H.264/H.265, ADTS framing for AAC.

pub mod aac;
pub mod h264;
pub mod h265;
pub mod nalu;

pub use nalu::{annexb_to_iso, iso_to_annexb, split_annexb, NalRole};
