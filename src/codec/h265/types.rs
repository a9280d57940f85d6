#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    TrailN,
    TrailR,
    TsaN,
    TsaR,
    StsaN,
    StsaR,
    RadlN,
    RadlR,
    RaslN,
    RaslR,
    BlaWLp,
    BlaWRadl,
    BlaNLp,
    IdrWRadl,
    IdrNLp,
    CraNut,
    Vps,
    Sps,
    Pps,
    Aud,
    Eos,
    Eob,
    Fd,
    PrefixSei,
    SuffixSei,
    Unspecified(u8),
}

impl NALUnitType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => NALUnitType::TrailN,
            1 => NALUnitType::TrailR,
            2 => NALUnitType::TsaN,
            3 => NALUnitType::TsaR,
            4 => NALUnitType::StsaN,
            5 => NALUnitType::StsaR,
            6 => NALUnitType::RadlN,
            7 => NALUnitType::RadlR,
            8 => NALUnitType::RaslN,
            9 => NALUnitType::RaslR,
            16 => NALUnitType::BlaWLp,
            17 => NALUnitType::BlaWRadl,
            18 => NALUnitType::BlaNLp,
            19 => NALUnitType::IdrWRadl,
            20 => NALUnitType::IdrNLp,
            21 => NALUnitType::CraNut,
            32 => NALUnitType::Vps,
            33 => NALUnitType::Sps,
            34 => NALUnitType::Pps,
            35 => NALUnitType::Aud,
            36 => NALUnitType::Eos,
            37 => NALUnitType::Eob,
            38 => NALUnitType::Fd,
            39 => NALUnitType::PrefixSei,
            40 => NALUnitType::SuffixSei,
            _ => NALUnitType::Unspecified(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            NALUnitType::TrailN => 0,
            NALUnitType::TrailR => 1,
            NALUnitType::TsaN => 2,
            NALUnitType::TsaR => 3,
            NALUnitType::StsaN => 4,
            NALUnitType::StsaR => 5,
            NALUnitType::RadlN => 6,
            NALUnitType::RadlR => 7,
            NALUnitType::RaslN => 8,
            NALUnitType::RaslR => 9,
            NALUnitType::BlaWLp => 16,
            NALUnitType::BlaWRadl => 17,
            NALUnitType::BlaNLp => 18,
            NALUnitType::IdrWRadl => 19,
            NALUnitType::IdrNLp => 20,
            NALUnitType::CraNut => 21,
            NALUnitType::Vps => 32,
            NALUnitType::Sps => 33,
            NALUnitType::Pps => 34,
            NALUnitType::Aud => 35,
            NALUnitType::Eos => 36,
            NALUnitType::Eob => 37,
            NALUnitType::Fd => 38,
            NALUnitType::PrefixSei => 39,
            NALUnitType::SuffixSei => 40,
            NALUnitType::Unspecified(value) => *value,
        }
    }

    /// Intra random access point pictures (BLA, IDR, CRA).
    pub fn is_irap(&self) -> bool {
        (16..=23).contains(&self.as_u8())
    }
}
