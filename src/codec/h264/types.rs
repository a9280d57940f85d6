/// `nal_unit_type` values the transport layer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    Unspecified = 0,
    CodedSliceNonIDR = 1,
    CodedSliceDataPartitionA = 2,
    CodedSliceIDR = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
    SPSExtension = 13,
}

impl NALUnitType {
    /// Type of the NAL unit whose first byte is `header`.
    pub fn from_header(header: u8) -> Self {
        NALUnitType::from(header & 0x1F)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(
            self,
            NALUnitType::SPS | NALUnitType::PPS | NALUnitType::SPSExtension
        )
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => NALUnitType::CodedSliceNonIDR,
            2 => NALUnitType::CodedSliceDataPartitionA,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSequence,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            13 => NALUnitType::SPSExtension,
            _ => NALUnitType::Unspecified,
        }
    }
}

/// `primary_pic_type` of an access unit delimiter (top three bits of its
/// payload byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryPicType {
    I,
    IP,
    IPB,
    Other(u8),
}

impl PrimaryPicType {
    pub fn from_payload(byte: u8) -> Self {
        match byte >> 5 {
            0 => PrimaryPicType::I,
            1 => PrimaryPicType::IP,
            2 => PrimaryPicType::IPB,
            other => PrimaryPicType::Other(other),
        }
    }

    /// Payload byte with `rbsp_stop_one_bit` set.
    pub fn to_payload(self) -> u8 {
        let value = match self {
            PrimaryPicType::I => 0,
            PrimaryPicType::IP => 1,
            PrimaryPicType::IPB => 2,
            PrimaryPicType::Other(v) => v & 0x07,
        };
        value << 5 | 0x10
    }
}
