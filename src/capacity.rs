//! Capacity model: how many bytes (header included) a carrier can hold.
//!
//! The same functions back the encoder's pre-check and the decoder's bounds check,
//! so both sides always agree on the limit.

use serde::Serialize;

use crate::params::{BitDepth, DomainParams, FrameStride};
use crate::{Result, StegoError};

/// Side of a DCT block.
pub const DCT_BLOCK: u32 = 8;
/// Smallest plane side accepted by the DWT codec.
pub const DWT_MIN_SIDE: u32 = 32;

const CHANNELS: usize = 3;

/// Carrier dimensions, enough to answer a capacity query without the carrier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CarrierDescriptor {
    Image { width: u32, height: u32 },
    Pcm { samples: usize },
    Video { width: u32, height: u32, frames: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityInfo {
    pub capacity_bytes: usize,
    pub header_len: usize,
    pub max_payload_bytes: usize,
}

impl CapacityInfo {
    pub fn new(capacity_bytes: usize, header_len: usize) -> Self {
        Self {
            capacity_bytes,
            header_len,
            max_payload_bytes: capacity_bytes.saturating_sub(header_len),
        }
    }
}

pub fn spatial_lsb(width: u32, height: u32, bit_depth: BitDepth) -> usize {
    width as usize * height as usize * CHANNELS * bit_depth.get() as usize / 8
}

/// One bit per whole 8x8 block per channel.
pub fn dct(width: u32, height: u32) -> usize {
    let blocks = (width / DCT_BLOCK) as usize * (height / DCT_BLOCK) as usize * CHANNELS;
    blocks / 8
}

/// One bit per horizontal-detail coefficient per channel.
///
/// The transform covers the even-sized part of each plane, so the sub-band is
/// `floor(h/2) x floor(w/2)`.
pub fn dwt(width: u32, height: u32) -> usize {
    let coefficients = (width / 2) as usize * (height / 2) as usize * CHANNELS;
    coefficients / 8
}

pub fn pcm(samples: usize, bit_depth: BitDepth) -> usize {
    samples * bit_depth.get() as usize / 8
}

/// Per-frame spatial capacity times the number of frames a stride guarantees.
pub fn video(width: u32, height: u32, frames: usize, bit_depth: BitDepth, stride: FrameStride) -> usize {
    spatial_lsb(width, height, bit_depth) * (frames / stride.get() as usize)
}

/// Reject planes below a transform's minimum size.
pub fn require_min_size(width: u32, height: u32, min: u32, what: &str) -> Result<()> {
    if width < min || height < min {
        return Err(StegoError::UnsupportedContainer(format!(
            "{} needs at least {}x{} pixels, carrier is {}x{}",
            what, min, min, width, height
        )));
    }
    Ok(())
}

/// Capacity query for a described carrier under the given parameters.
pub fn capacity_for(descriptor: &CarrierDescriptor, params: &DomainParams) -> Result<CapacityInfo> {
    let capacity = match (*descriptor, *params) {
        (CarrierDescriptor::Image { width, height }, DomainParams::Lsb { bit_depth }) => {
            spatial_lsb(width, height, bit_depth)
        }
        (CarrierDescriptor::Image { width, height }, DomainParams::Dct { .. }) => {
            require_min_size(width, height, DCT_BLOCK, "DCT embedding")?;
            dct(width, height)
        }
        (CarrierDescriptor::Image { width, height }, DomainParams::Dwt { .. }) => {
            require_min_size(width, height, DWT_MIN_SIDE, "DWT embedding")?;
            dwt(width, height)
        }
        (CarrierDescriptor::Pcm { samples }, DomainParams::Audio { bit_depth }) => {
            pcm(samples, bit_depth)
        }
        (
            CarrierDescriptor::Video {
                width,
                height,
                frames,
            },
            DomainParams::Video {
                bit_depth, stride, ..
            },
        ) => video(width, height, frames, bit_depth, stride),
        (descriptor, params) => {
            return Err(StegoError::UnsupportedContainer(format!(
                "{:?} carrier cannot be used with the {} domain",
                descriptor,
                params.domain()
            )))
        }
    };
    Ok(CapacityInfo::new(capacity, params.header_len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(v: u8) -> BitDepth {
        BitDepth::new(v).unwrap()
    }

    #[test]
    fn test_spatial_capacity() {
        assert_eq!(spatial_lsb(100, 100, depth(1)), 3750);
        assert_eq!(spatial_lsb(100, 100, depth(4)), 15000);
        assert_eq!(spatial_lsb(3, 1, depth(1)), 1);
    }

    #[test]
    fn test_transform_capacity() {
        // 12x12 blocks x 3 channels = 432 bits
        assert_eq!(dct(100, 100), 54);
        // partial blocks are discarded
        assert_eq!(dct(103, 100), 54);
        assert_eq!(dwt(64, 64), 32 * 32 * 3 / 8);
        assert_eq!(dwt(65, 64), dwt(64, 64));
    }

    #[test]
    fn test_pcm_and_video_capacity() {
        assert_eq!(pcm(1000, depth(2)), 250);
        let stride = FrameStride::new(2).unwrap();
        // 5 frames at stride 2 guarantee 2 used frames
        assert_eq!(video(10, 10, 5, depth(1), stride), 37 * 2);
    }

    #[test]
    fn test_capacity_for_descriptor() {
        let info = capacity_for(
            &CarrierDescriptor::Image {
                width: 100,
                height: 100,
            },
            &DomainParams::lsb(1).unwrap(),
        )
        .unwrap();
        assert_eq!(info.capacity_bytes, 3750);
        assert_eq!(info.max_payload_bytes, 3746);

        let info = capacity_for(
            &CarrierDescriptor::Video {
                width: 8,
                height: 8,
                frames: 4,
            },
            &DomainParams::video(1, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(info.header_len, 10);
        assert_eq!(info.capacity_bytes, 24 * 4);
    }

    #[test]
    fn test_capacity_rejects_mismatch_and_undersized() {
        assert!(matches!(
            capacity_for(
                &CarrierDescriptor::Pcm { samples: 10 },
                &DomainParams::lsb(1).unwrap()
            ),
            Err(StegoError::UnsupportedContainer(_))
        ));
        assert!(matches!(
            capacity_for(
                &CarrierDescriptor::Image {
                    width: 16,
                    height: 40
                },
                &DomainParams::dwt("haar", 0.1).unwrap()
            ),
            Err(StegoError::UnsupportedContainer(_))
        ));
    }
}
