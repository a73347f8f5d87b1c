/*!
 * Chromacloak Steganography Library
 *
 * This library hides an arbitrary byte payload inside a carrier medium (still image,
 * PCM audio or an animated frame sequence) so that it can later be recovered bit-exactly.
 * Every embedding domain shares one length-prefixed framing protocol.
 *
 * Main components:
 * - bits: MSB-first byte/bit conversion used by every codec
 * - header: the 4-byte standard header and the 10-byte self-describing video header
 * - capacity: per-domain capacity model
 * - stego: the codecs (spatial LSB, DCT, DWT, PCM samples, video frames)
 * - media: container adapters that turn file bytes into carriers and back
 * - framer / crypto: the application-level payload tag and optional encryption
 * - engine: [`Steganographer`], the encode / decode / capacity entry points
 */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub mod bits;
pub mod capacity;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod framer;
pub mod header;
pub mod media;
pub mod params;
pub mod stego;

pub use capacity::{CapacityInfo, CarrierDescriptor};
pub use config::{Profile, StegoConfig};
pub use engine::{CarrierSummary, EncodeReport, Encoded, Steganographer};
pub use params::{BitDepth, Domain, DomainParams, FrameStride, Strength, VideoHeaderFormat, VideoHint, Wavelet};

/// Error type for the library
#[derive(Error, Debug)]
pub enum StegoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    #[error("Payload too large: need {required} bytes, carrier holds {available} bytes")]
    CapacityExceeded { required: usize, available: usize },

    #[error("Corrupt or mismatched header: {0}")]
    CorruptOrMismatchedHeader(HeaderFault),

    #[error("Crypto failure: {0}")]
    CryptoFailure(CryptoFault),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StegoError>;

impl StegoError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        StegoError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Why a decoded header was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFault {
    BadMagic { found: [u8; 4] },
    ZeroLength,
    ExceedsCapacity { length: usize, max: usize },
    ExceedsCeiling { length: usize, ceiling: usize },
    Truncated { needed: usize, available: usize },
    BadParameters { bit_depth: u8, stride: u8 },
}

impl fmt::Display for HeaderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic { found } => write!(f, "magic tag mismatch (found {:02x?})", found),
            Self::ZeroLength => write!(f, "payload length is zero, carrier may hold no data"),
            Self::ExceedsCapacity { length, max } => write!(
                f,
                "payload length {} exceeds extractable maximum {}, parameters may be wrong",
                length, max
            ),
            Self::ExceedsCeiling { length, ceiling } => write!(
                f,
                "payload length {} is above the sanity ceiling {}",
                length, ceiling
            ),
            Self::Truncated { needed, available } => {
                write!(f, "need {} bits, carrier yields {}", needed, available)
            }
            Self::BadParameters { bit_depth, stride } => write!(
                f,
                "header carries unusable parameters (bit depth {}, stride {})",
                bit_depth, stride
            ),
        }
    }
}

/// Why payload decryption or tag parsing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoFault {
    MissingKey,
    BadPadding,
    MalformedTag(String),
    EmptyInput,
}

impl fmt::Display for CryptoFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey => write!(f, "payload is encrypted but no passphrase was supplied"),
            Self::BadPadding => write!(f, "invalid padding, wrong passphrase or corrupted data"),
            Self::MalformedTag(reason) => write!(f, "malformed payload tag: {}", reason),
            Self::EmptyInput => write!(f, "nothing to encrypt or decrypt"),
        }
    }
}

impl From<HeaderFault> for StegoError {
    fn from(fault: HeaderFault) -> Self {
        StegoError::CorruptOrMismatchedHeader(fault)
    }
}

impl From<CryptoFault> for StegoError {
    fn from(fault: CryptoFault) -> Self {
        StegoError::CryptoFailure(fault)
    }
}

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
