//! Validated embedding parameters.
//!
//! Values are checked once, when constructed, so codecs never re-validate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::header::{STANDARD_HEADER_LEN, VIDEO_HEADER_LEN};
use crate::{Result, StegoError};

/// Number of low-order bits per sample or channel used for embedding (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BitDepth(u8);

impl BitDepth {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(StegoError::invalid(
                "bit_depth",
                format!("must be between {} and {}, got {}", Self::MIN, Self::MAX, value),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Mask selecting the embedded low bits.
    pub fn mask(self) -> u32 {
        (1 << self.0) - 1
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = StegoError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> u8 {
        depth.0
    }
}

/// Only every k-th video frame carries bits (1-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FrameStride(u8);

impl FrameStride {
    pub fn new(value: u8) -> Result<Self> {
        if value == 0 {
            return Err(StegoError::invalid("stride", "must be at least 1, got 0"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for FrameStride {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for FrameStride {
    type Error = StegoError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FrameStride> for u8 {
    fn from(stride: FrameStride) -> u8 {
        stride.0
    }
}

/// Embedding magnitude for the transform domains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Strength(f64);

impl Strength {
    pub const DCT_DEFAULT: Strength = Strength(10.0);
    pub const DWT_DEFAULT: Strength = Strength(0.1);

    /// Strength for the DCT codec, written directly as the coefficient magnitude.
    pub fn dct(value: f64) -> Result<Self> {
        Self::checked(value, 1.0, 100.0)
    }

    /// Strength for the DWT codec; the written coefficient magnitude is `100 * strength`.
    pub fn dwt(value: f64) -> Result<Self> {
        Self::checked(value, 0.01, 10.0)
    }

    fn checked(value: f64, min: f64, max: f64) -> Result<Self> {
        if !value.is_finite() || value < min || value > max {
            return Err(StegoError::invalid(
                "strength",
                format!("must be between {} and {}, got {}", min, max, value),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Wavelet family for the DWT codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wavelet {
    #[default]
    Haar,
    Db1,
    Db2,
    Db3,
    Sym2,
}

impl Wavelet {
    pub const ALL: [Wavelet; 5] = [
        Wavelet::Haar,
        Wavelet::Db1,
        Wavelet::Db2,
        Wavelet::Db3,
        Wavelet::Sym2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Wavelet::Haar => "haar",
            Wavelet::Db1 => "db1",
            Wavelet::Db2 => "db2",
            Wavelet::Db3 => "db3",
            Wavelet::Sym2 => "sym2",
        }
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Wavelet {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Wavelet::ALL
            .into_iter()
            .find(|w| w.name() == lower)
            .ok_or_else(|| {
                let names: Vec<_> = Wavelet::ALL.iter().map(|w| w.name()).collect();
                StegoError::invalid(
                    "wavelet",
                    format!("unknown wavelet `{}`, use one of: {}", s, names.join(", ")),
                )
            })
    }
}

/// The five embedding domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Lsb,
    Dct,
    Dwt,
    Audio,
    Video,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Lsb,
        Domain::Dct,
        Domain::Dwt,
        Domain::Audio,
        Domain::Video,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Lsb => "lsb",
            Domain::Dct => "dct",
            Domain::Dwt => "dwt",
            Domain::Audio => "audio",
            Domain::Video => "video",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| StegoError::invalid("domain", format!("unknown domain `{}`", s)))
    }
}

/// Which header a video carrier is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoHeaderFormat {
    /// `VSTG` magic, bit depth, stride and length (10 bytes).
    #[default]
    SelfDescribing,
    /// Bare 4-byte length; the decoder must be told the parameters.
    Legacy,
}

impl VideoHeaderFormat {
    pub fn header_len(self) -> usize {
        match self {
            VideoHeaderFormat::SelfDescribing => VIDEO_HEADER_LEN,
            VideoHeaderFormat::Legacy => STANDARD_HEADER_LEN,
        }
    }
}

/// Per-domain embedding parameters, one case per domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum DomainParams {
    Lsb {
        bit_depth: BitDepth,
    },
    Dct {
        strength: Strength,
    },
    Dwt {
        wavelet: Wavelet,
        strength: Strength,
    },
    Audio {
        bit_depth: BitDepth,
    },
    Video {
        bit_depth: BitDepth,
        stride: FrameStride,
        header: VideoHeaderFormat,
    },
}

impl DomainParams {
    pub fn lsb(bit_depth: u8) -> Result<Self> {
        Ok(DomainParams::Lsb {
            bit_depth: BitDepth::new(bit_depth)?,
        })
    }

    pub fn dct(strength: f64) -> Result<Self> {
        Ok(DomainParams::Dct {
            strength: Strength::dct(strength)?,
        })
    }

    pub fn dwt(wavelet: &str, strength: f64) -> Result<Self> {
        Ok(DomainParams::Dwt {
            wavelet: wavelet.parse()?,
            strength: Strength::dwt(strength)?,
        })
    }

    pub fn audio(bit_depth: u8) -> Result<Self> {
        Ok(DomainParams::Audio {
            bit_depth: BitDepth::new(bit_depth)?,
        })
    }

    pub fn video(bit_depth: u8, stride: u8) -> Result<Self> {
        Ok(DomainParams::Video {
            bit_depth: BitDepth::new(bit_depth)?,
            stride: FrameStride::new(stride)?,
            header: VideoHeaderFormat::SelfDescribing,
        })
    }

    /// Video parameters written with the bare 4-byte length header.
    pub fn video_legacy(bit_depth: u8, stride: u8) -> Result<Self> {
        Ok(DomainParams::Video {
            bit_depth: BitDepth::new(bit_depth)?,
            stride: FrameStride::new(stride)?,
            header: VideoHeaderFormat::Legacy,
        })
    }

    pub fn default_for(domain: Domain) -> Self {
        match domain {
            Domain::Lsb => DomainParams::Lsb {
                bit_depth: BitDepth::default(),
            },
            Domain::Dct => DomainParams::Dct {
                strength: Strength::DCT_DEFAULT,
            },
            Domain::Dwt => DomainParams::Dwt {
                wavelet: Wavelet::default(),
                strength: Strength::DWT_DEFAULT,
            },
            Domain::Audio => DomainParams::Audio {
                bit_depth: BitDepth::default(),
            },
            Domain::Video => DomainParams::Video {
                bit_depth: BitDepth::default(),
                stride: FrameStride::default(),
                header: VideoHeaderFormat::default(),
            },
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            DomainParams::Lsb { .. } => Domain::Lsb,
            DomainParams::Dct { .. } => Domain::Dct,
            DomainParams::Dwt { .. } => Domain::Dwt,
            DomainParams::Audio { .. } => Domain::Audio,
            DomainParams::Video { .. } => Domain::Video,
        }
    }

    /// Size of the domain header that precedes the payload.
    pub fn header_len(&self) -> usize {
        match self {
            DomainParams::Video { header, .. } => header.header_len(),
            _ => STANDARD_HEADER_LEN,
        }
    }
}

/// Decoder-side knowledge about a video carrier's parameters.
///
/// Missing values are resolved through header auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoHint {
    pub bit_depth: Option<BitDepth>,
    pub stride: Option<FrameStride>,
    pub auto_detect: bool,
}

impl Default for VideoHint {
    fn default() -> Self {
        Self {
            bit_depth: None,
            stride: None,
            auto_detect: true,
        }
    }
}

impl VideoHint {
    /// Use exactly these parameters; auto-detection is skipped.
    pub fn explicit(bit_depth: BitDepth, stride: FrameStride) -> Self {
        Self {
            bit_depth: Some(bit_depth),
            stride: Some(stride),
            auto_detect: false,
        }
    }
}
