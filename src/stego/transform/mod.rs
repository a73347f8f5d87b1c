//! Transform-domain codecs: one bit per coefficient, carried by its sign.
//!
//! Both strategies visit channels in order (R, G, B) and stop consuming bits as
//! soon as the stream ends. Reconstructed pixels are rounded and clipped to
//! 0..=255, so a strength too small for the carrier's natural coefficients, or
//! any lossy re-save, can flip signs and corrupt the payload.

pub mod dct;
pub mod dwt;

pub use dct::DctCodec;
pub use dwt::DwtCodec;

use image::RgbImage;

pub(crate) const CHANNELS: usize = 3;

/// One colour channel as floating point samples, row-major.
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Plane {
    pub fn from_channel(img: &RgbImage, channel: usize) -> Self {
        let data = img
            .as_raw()
            .chunks_exact(CHANNELS)
            .map(|pixel| pixel[channel] as f64)
            .collect();
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data,
        }
    }

    /// Round, clip to the 8-bit range and store back into `img`.
    pub fn write_channel(&self, img: &mut RgbImage, channel: usize) {
        let samples: &mut [u8] = img;
        for (pixel, &value) in samples.chunks_exact_mut(CHANNELS).zip(&self.data) {
            pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }
}

/// Decoded bit for a coefficient: strictly positive means 1.
pub(crate) fn bit_from_sign(coefficient: f64) -> bool {
    coefficient > 0.0
}

pub(crate) fn signed_magnitude(bit: bool, magnitude: f64) -> f64 {
    if bit {
        magnitude
    } else {
        -magnitude
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_roundtrip_is_exact() {
        let img = test_support::gradient_image(17, 9);
        let mut copy = RgbImage::new(17, 9);
        for c in 0..CHANNELS {
            Plane::from_channel(&img, c).write_channel(&mut copy, c);
        }
        assert_eq!(copy, img);
    }

    #[test]
    fn test_write_channel_clips() {
        let mut img = RgbImage::new(2, 1);
        let plane = Plane {
            width: 2,
            height: 1,
            data: vec![-12.0, 300.4],
        };
        plane.write_channel(&mut img, 1);
        assert_eq!(img.as_raw(), &vec![0, 0, 0, 0, 255, 0]);
    }
}
