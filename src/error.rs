use thiserror::Error;

/// Errors produced while muxing or demuxing a transport stream.
#[derive(Error, Debug)]
pub enum LstkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("parser error: {0}")]
    Parser(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid PES start code: {0:02x?}")]
    InvalidStartCode([u8; 3]),

    #[error("PES packet length {0} does not fit in 16 bits")]
    PacketLengthOverflow(usize),

    #[error("unsupported stream type: 0x{0:02x}")]
    UnsupportedStreamType(u8),
}

pub type Result<T> = std::result::Result<T, LstkError>;
