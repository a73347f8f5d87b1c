use image::RgbImage;

use super::Codec;
use crate::bits;
use crate::capacity;
use crate::params::BitDepth;
use crate::{Result, StegoError};

/// Spatial LSB substitution over every channel byte of an RGB image, raster order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialLsbCodec {
    // Low bits used per channel (1-4)
    bit_depth: BitDepth,
}

impl SpatialLsbCodec {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }
}

impl Codec for SpatialLsbCodec {
    type Carrier = RgbImage;

    fn name(&self) -> &'static str {
        "lsb"
    }

    fn capacity(&self, carrier: &RgbImage) -> Result<usize> {
        Ok(capacity::spatial_lsb(
            carrier.width(),
            carrier.height(),
            self.bit_depth,
        ))
    }

    fn embed_bits(&self, carrier: &mut RgbImage, bits: &[bool]) -> Result<()> {
        let samples: &mut [u8] = carrier;
        let available = samples.len() * self.bit_depth.get() as usize;
        if bits.len() > available {
            return Err(StegoError::CapacityExceeded {
                required: bits.len().div_ceil(8),
                available: available / 8,
            });
        }
        embed_samples(samples, bits, self.bit_depth);
        Ok(())
    }

    fn extract_bits(&self, carrier: &RgbImage, count: usize) -> Result<Vec<bool>> {
        let mut out = Vec::with_capacity(count);
        extract_samples(carrier, self.bit_depth, count, &mut out);
        out.truncate(count);
        Ok(out)
    }
}

/// Replace the low `bit_depth` bits of successive samples with successive bit groups.
///
/// Returns the number of bits consumed; samples past the end of `bits` are untouched.
pub(crate) fn embed_samples(samples: &mut [u8], bits: &[bool], bit_depth: BitDepth) -> usize {
    let clear_mask = !(bit_depth.mask() as u8);
    let mut consumed = 0;

    for (sample, group) in samples
        .iter_mut()
        .zip(bits.chunks(bit_depth.get() as usize))
    {
        let value = bits::group_value(group, bit_depth.get()) as u8;
        *sample = (*sample & clear_mask) | value;
        consumed += group.len();
    }

    consumed
}

/// Append the low bits of `samples` to `out` until it holds at least `count` bits.
pub(crate) fn extract_samples(samples: &[u8], bit_depth: BitDepth, count: usize, out: &mut Vec<bool>) {
    let mask = bit_depth.mask();
    for &sample in samples {
        if out.len() >= count {
            break;
        }
        bits::push_group(sample as u32 & mask, bit_depth.get(), out);
    }
}
