//! Domain headers that precede the payload inside the embedded bit stream.
//!
//! Standard header (images, audio): 4-byte big-endian payload length.
//!
//! Video header, 10 bytes:
//!
//! ```text
//! +--------+-----------+--------+------------------+
//! | "VSTG" | bit depth | stride | length (u32, BE) |
//! | 4      | 1         | 1      | 4                |
//! +--------+-----------+--------+------------------+
//! ```

use crate::bits;
use crate::params::{BitDepth, FrameStride};
use crate::{HeaderFault, Result};

pub const STANDARD_HEADER_LEN: usize = 4;
pub const VIDEO_HEADER_LEN: usize = 10;
pub const STANDARD_HEADER_BITS: usize = STANDARD_HEADER_LEN * 8;
pub const VIDEO_HEADER_BITS: usize = VIDEO_HEADER_LEN * 8;

/// Marker identifying the self-describing video header.
pub const VIDEO_MAGIC: [u8; 4] = *b"VSTG";

/// Lengths above this are treated as a wrong parameter guess.
pub const SANITY_CEILING: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardHeader {
    pub length: u32,
}

impl StandardHeader {
    pub fn new(length: u32) -> Self {
        Self { length }
    }

    pub fn to_bytes(self) -> [u8; STANDARD_HEADER_LEN] {
        self.length.to_be_bytes()
    }

    pub fn to_bits(self) -> Vec<bool> {
        bits::pack(&self.to_bytes())
    }

    pub fn from_bits(stream: &[bool]) -> Result<Self> {
        let bytes = leading_bytes(stream, STANDARD_HEADER_BITS)?;
        let length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Self { length })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoHeader {
    pub bit_depth: BitDepth,
    pub stride: FrameStride,
    pub length: u32,
}

impl VideoHeader {
    pub fn new(bit_depth: BitDepth, stride: FrameStride, length: u32) -> Self {
        Self {
            bit_depth,
            stride,
            length,
        }
    }

    pub fn to_bytes(self) -> [u8; VIDEO_HEADER_LEN] {
        let mut buffer = [0u8; VIDEO_HEADER_LEN];
        buffer[0..4].copy_from_slice(&VIDEO_MAGIC);
        buffer[4] = self.bit_depth.get();
        buffer[5] = self.stride.get();
        buffer[6..10].copy_from_slice(&self.length.to_be_bytes());
        buffer
    }

    pub fn to_bits(self) -> Vec<bool> {
        bits::pack(&self.to_bytes())
    }

    /// Parse the first 80 bits; fails unless the magic tag matches and the
    /// carried parameters are in range.
    pub fn from_bits(stream: &[bool]) -> Result<Self> {
        let bytes = leading_bytes(stream, VIDEO_HEADER_BITS)?;
        if bytes[0..4] != VIDEO_MAGIC {
            let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
            return Err(HeaderFault::BadMagic { found }.into());
        }

        let (bit_depth, stride) = match (BitDepth::new(bytes[4]), FrameStride::new(bytes[5])) {
            (Ok(bit_depth), Ok(stride)) => (bit_depth, stride),
            _ => {
                return Err(HeaderFault::BadParameters {
                    bit_depth: bytes[4],
                    stride: bytes[5],
                }
                .into())
            }
        };
        let length = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);

        Ok(Self {
            bit_depth,
            stride,
            length,
        })
    }
}

fn leading_bytes(stream: &[bool], count: usize) -> Result<Vec<u8>> {
    if stream.len() < count {
        return Err(HeaderFault::Truncated {
            needed: count,
            available: stream.len(),
        }
        .into());
    }
    bits::unpack(&stream[..count])
}

/// Check a decoded length against the carrier it came from.
///
/// `capacity` is the domain capacity in bytes for the parameters in effect;
/// the payload may use at most `capacity - header_len` of it.
pub fn validate_length(
    length: u32,
    capacity: usize,
    header_len: usize,
    ceiling: usize,
) -> Result<usize> {
    let length = length as usize;
    if length == 0 {
        return Err(HeaderFault::ZeroLength.into());
    }

    let max = capacity.saturating_sub(header_len);
    if length > max {
        return Err(HeaderFault::ExceedsCapacity { length, max }.into());
    }
    if length > ceiling {
        return Err(HeaderFault::ExceedsCeiling { length, ceiling }.into());
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StegoError;

    #[test]
    fn test_standard_header_layout() {
        let header = StandardHeader::new(0x0102_0304);
        assert_eq!(header.to_bytes(), [1, 2, 3, 4]);
        assert_eq!(header.to_bits().len(), 32);
        assert_eq!(StandardHeader::from_bits(&header.to_bits()).unwrap(), header);
    }

    #[test]
    fn test_video_header_layout() {
        let header = VideoHeader::new(
            BitDepth::new(3).unwrap(),
            FrameStride::new(2).unwrap(),
            1234,
        );
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"VSTG");
        assert_eq!(bytes[4], 3);
        assert_eq!(bytes[5], 2);
        assert_eq!(&bytes[6..10], &1234u32.to_be_bytes());

        let bits = header.to_bits();
        assert_eq!(bits.len(), 80);
        assert_eq!(VideoHeader::from_bits(&bits).unwrap(), header);
    }

    #[test]
    fn test_video_header_bad_magic() {
        let bits = bits::pack(b"NOPE\x01\x01\x00\x00\x00\x05");
        match VideoHeader::from_bits(&bits) {
            Err(StegoError::CorruptOrMismatchedHeader(HeaderFault::BadMagic { found })) => {
                assert_eq!(&found, b"NOPE")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_video_header_bad_parameters() {
        let bits = bits::pack(b"VSTG\x07\x00\x00\x00\x00\x05");
        assert!(matches!(
            VideoHeader::from_bits(&bits),
            Err(StegoError::CorruptOrMismatchedHeader(
                HeaderFault::BadParameters { bit_depth: 7, stride: 0 }
            ))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        assert!(matches!(
            StandardHeader::from_bits(&[true; 20]),
            Err(StegoError::CorruptOrMismatchedHeader(HeaderFault::Truncated {
                needed: 32,
                available: 20
            }))
        ));
    }

    #[test]
    fn test_validate_length() {
        assert_eq!(validate_length(10, 100, 4, SANITY_CEILING).unwrap(), 10);
        assert_eq!(validate_length(96, 100, 4, SANITY_CEILING).unwrap(), 96);
        assert!(matches!(
            validate_length(0, 100, 4, SANITY_CEILING),
            Err(StegoError::CorruptOrMismatchedHeader(HeaderFault::ZeroLength))
        ));
        assert!(matches!(
            validate_length(97, 100, 4, SANITY_CEILING),
            Err(StegoError::CorruptOrMismatchedHeader(
                HeaderFault::ExceedsCapacity { length: 97, max: 96 }
            ))
        ));
        assert!(matches!(
            validate_length(50, 1000, 4, 20),
            Err(StegoError::CorruptOrMismatchedHeader(
                HeaderFault::ExceedsCeiling { .. }
            ))
        ));
    }
}
