//! Single-level 2-D DWT codec.
//!
//! Each channel plane is decomposed with an orthonormal periodic filter bank.
//! The horizontal-detail sub-band (high-pass down the columns, low-pass along
//! the rows) is flattened row-major and each coefficient carries one bit as
//! `+100 * strength` or `-100 * strength`.
//!
//! The transform runs over the even-sized part of the plane; a trailing odd row
//! or column is left as-is so the reconstruction always matches the original shape.

use image::RgbImage;

use super::{bit_from_sign, signed_magnitude, Plane, CHANNELS};
use crate::capacity::{self, DWT_MIN_SIDE};
use crate::params::{Strength, Wavelet};
use crate::stego::Codec;
use crate::{Result, StegoError};

/// Ratio between the caller's strength and the written coefficient magnitude.
pub const STRENGTH_SCALE: f64 = 100.0;

const HAAR: [f64; 2] = [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    0.482_962_913_144_690_25,
    0.836_516_303_737_469,
    0.224_143_868_041_857_35,
    -0.129_409_522_550_921_45,
];

const DB3: [f64; 6] = [
    0.332_670_552_950_956_9,
    0.806_891_509_313_338_8,
    0.459_877_502_119_331_3,
    -0.135_011_020_010_390_84,
    -0.085_441_273_882_241_49,
    0.035_226_291_882_100_656,
];

/// Orthonormal two-channel filter bank with periodic extension.
#[derive(Debug, Clone)]
pub struct FilterBank {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl FilterBank {
    pub fn new(wavelet: Wavelet) -> Self {
        let low: Vec<f64> = match wavelet {
            Wavelet::Haar | Wavelet::Db1 => HAAR.to_vec(),
            Wavelet::Db2 | Wavelet::Sym2 => DB2.to_vec(),
            Wavelet::Db3 => DB3.to_vec(),
        };
        // quadrature mirror of the scaling filter
        let len = low.len();
        let high = (0..len)
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign * low[len - 1 - k]
            })
            .collect();
        Self { low, high }
    }

    /// Split an even-length signal into (approximation, detail) halves.
    pub fn analyze(&self, signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = signal.len();
        let half = n / 2;
        let mut approx = vec![0.0; half];
        let mut detail = vec![0.0; half];
        for i in 0..half {
            for (k, (&lo, &hi)) in self.low.iter().zip(&self.high).enumerate() {
                let x = signal[(2 * i + k) % n];
                approx[i] += lo * x;
                detail[i] += hi * x;
            }
        }
        (approx, detail)
    }

    /// Inverse of [`FilterBank::analyze`].
    pub fn synthesize(&self, approx: &[f64], detail: &[f64]) -> Vec<f64> {
        let n = approx.len() * 2;
        let mut signal = vec![0.0; n];
        for (i, (&a, &d)) in approx.iter().zip(detail).enumerate() {
            for (k, (&lo, &hi)) in self.low.iter().zip(&self.high).enumerate() {
                signal[(2 * i + k) % n] += lo * a + hi * d;
            }
        }
        signal
    }
}

/// Intermediate state of one plane's decomposition.
struct Decomposition {
    /// Row low-pass output, `rows x half_cols`.
    row_low: Vec<Vec<f64>>,
    /// Row high-pass output, kept for reconstruction.
    row_high: Vec<Vec<f64>>,
    /// Approximation sub-band, column-major: `half_cols x half_rows`.
    approx: Vec<Vec<f64>>,
    /// Horizontal-detail sub-band, column-major: `half_cols x half_rows`.
    horizontal: Vec<Vec<f64>>,
}

impl Decomposition {
    fn half_rows(&self) -> usize {
        self.horizontal.first().map_or(0, Vec::len)
    }

    fn half_cols(&self) -> usize {
        self.horizontal.len()
    }

    /// Row-major index into the horizontal-detail sub-band.
    fn horizontal_mut(&mut self, index: usize) -> &mut f64 {
        let cols = self.half_cols();
        &mut self.horizontal[index % cols][index / cols]
    }

    fn horizontal_at(&self, index: usize) -> f64 {
        let cols = self.half_cols();
        self.horizontal[index % cols][index / cols]
    }
}

/// DWT-domain codec over the horizontal-detail sub-band.
#[derive(Debug, Clone)]
pub struct DwtCodec {
    wavelet: Wavelet,
    strength: Strength,
    bank: FilterBank,
}

impl DwtCodec {
    pub fn new(wavelet: Wavelet, strength: Strength) -> Self {
        Self {
            wavelet,
            strength,
            bank: FilterBank::new(wavelet),
        }
    }

    pub fn wavelet(&self) -> Wavelet {
        self.wavelet
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    fn decompose(&self, plane: &Plane) -> Decomposition {
        let rows = plane.height & !1;
        let cols = plane.width & !1;

        let mut row_low = Vec::with_capacity(rows);
        let mut row_high = Vec::with_capacity(rows);
        for y in 0..rows {
            let row: Vec<f64> = (0..cols).map(|x| plane.get(x, y)).collect();
            let (low, high) = self.bank.analyze(&row);
            row_low.push(low);
            row_high.push(high);
        }

        let mut approx = Vec::with_capacity(cols / 2);
        let mut horizontal = Vec::with_capacity(cols / 2);
        for x in 0..cols / 2 {
            let column: Vec<f64> = row_low.iter().map(|row| row[x]).collect();
            let (a, h) = self.bank.analyze(&column);
            approx.push(a);
            horizontal.push(h);
        }

        Decomposition {
            row_low,
            row_high,
            approx,
            horizontal,
        }
    }

    fn reconstruct(&self, plane: &mut Plane, mut parts: Decomposition) {
        for (x, (a, h)) in parts.approx.iter().zip(&parts.horizontal).enumerate() {
            let column = self.bank.synthesize(a, h);
            for (row, value) in parts.row_low.iter_mut().zip(column) {
                row[x] = value;
            }
        }
        for (y, (low, high)) in parts.row_low.iter().zip(&parts.row_high).enumerate() {
            for (x, value) in self.bank.synthesize(low, high).into_iter().enumerate() {
                plane.set(x, y, value);
            }
        }
    }

    fn coefficients_per_channel(carrier: &RgbImage) -> usize {
        (carrier.width() / 2) as usize * (carrier.height() / 2) as usize
    }
}

impl Codec for DwtCodec {
    type Carrier = RgbImage;

    fn name(&self) -> &'static str {
        "dwt"
    }

    fn capacity(&self, carrier: &RgbImage) -> Result<usize> {
        capacity::require_min_size(carrier.width(), carrier.height(), DWT_MIN_SIDE, "DWT embedding")?;
        Ok(capacity::dwt(carrier.width(), carrier.height()))
    }

    fn embed_bits(&self, carrier: &mut RgbImage, bits: &[bool]) -> Result<()> {
        let per_channel = Self::coefficients_per_channel(carrier);
        let available = per_channel * CHANNELS;
        if bits.len() > available {
            return Err(StegoError::CapacityExceeded {
                required: bits.len().div_ceil(8),
                available: available / 8,
            });
        }

        let magnitude = self.strength.get() * STRENGTH_SCALE;
        for (c, chunk) in bits.chunks(per_channel).enumerate() {
            let mut plane = Plane::from_channel(carrier, c);
            let mut parts = self.decompose(&plane);
            for (index, &bit) in chunk.iter().enumerate() {
                *parts.horizontal_mut(index) = signed_magnitude(bit, magnitude);
            }
            self.reconstruct(&mut plane, parts);
            plane.write_channel(carrier, c);
        }
        Ok(())
    }

    fn extract_bits(&self, carrier: &RgbImage, count: usize) -> Result<Vec<bool>> {
        let mut out = Vec::with_capacity(count);
        for c in 0..CHANNELS {
            if out.len() >= count {
                break;
            }
            let parts = self.decompose(&Plane::from_channel(carrier, c));
            let coefficients = parts.half_rows() * parts.half_cols();
            let wanted = coefficients.min(count - out.len());
            out.extend((0..wanted).map(|index| bit_from_sign(parts.horizontal_at(index))));
        }
        Ok(out)
    }
}
