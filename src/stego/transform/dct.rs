//! 8x8 block DCT codec.
//!
//! Each whole block of each channel carries one bit in the sign of its (4, 4)
//! mid-frequency coefficient. Partial blocks at the right and bottom edges are
//! never touched.

use std::f64::consts::PI;

use image::RgbImage;

use super::{bit_from_sign, signed_magnitude, Plane, CHANNELS};
use crate::capacity::{self, DCT_BLOCK};
use crate::params::Strength;
use crate::stego::Codec;
use crate::{Result, StegoError};

const N: usize = DCT_BLOCK as usize;

/// Coefficient (row, column) that carries the bit.
pub const EMBED_COEFFICIENT: (usize, usize) = (4, 4);

type Block = [[f64; N]; N];

/// Orthonormal 8-point DCT-II basis, `basis[u][x]`.
#[derive(Debug, Clone)]
pub struct Dct8 {
    basis: Block,
}

impl Default for Dct8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Dct8 {
    pub fn new() -> Self {
        let mut basis = [[0.0; N]; N];
        for (u, row) in basis.iter_mut().enumerate() {
            let scale = if u == 0 {
                (1.0 / N as f64).sqrt()
            } else {
                (2.0 / N as f64).sqrt()
            };
            for (x, value) in row.iter_mut().enumerate() {
                *value = scale * ((2 * x + 1) as f64 * u as f64 * PI / (2 * N) as f64).cos();
            }
        }
        Self { basis }
    }

    pub fn forward(&self, block: &Block) -> Block {
        let mut out = [[0.0; N]; N];
        for (u, out_row) in out.iter_mut().enumerate() {
            for (v, coefficient) in out_row.iter_mut().enumerate() {
                *coefficient = self.coefficient(block, u, v);
            }
        }
        out
    }

    pub fn inverse(&self, coefficients: &Block) -> Block {
        let mut out = [[0.0; N]; N];
        for (y, out_row) in out.iter_mut().enumerate() {
            for (x, value) in out_row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for (u, coefficient_row) in coefficients.iter().enumerate() {
                    for (v, &coefficient) in coefficient_row.iter().enumerate() {
                        sum += self.basis[u][y] * self.basis[v][x] * coefficient;
                    }
                }
                *value = sum;
            }
        }
        out
    }

    /// A single forward coefficient, without computing the whole block.
    pub fn coefficient(&self, block: &Block, u: usize, v: usize) -> f64 {
        let mut sum = 0.0;
        for (y, row) in block.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                sum += self.basis[u][y] * self.basis[v][x] * value;
            }
        }
        sum
    }
}

/// DCT-domain codec; `strength` is the magnitude written into the carrier coefficient.
#[derive(Debug, Clone)]
pub struct DctCodec {
    strength: Strength,
    dct: Dct8,
}

impl DctCodec {
    pub fn new(strength: Strength) -> Self {
        Self {
            strength,
            dct: Dct8::new(),
        }
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Whole blocks per channel, as (columns, rows).
    pub fn block_grid(img: &RgbImage) -> (usize, usize) {
        (
            img.width() as usize / N,
            img.height() as usize / N,
        )
    }

    /// Visit every block in embedding order: channel, block row, block column.
    fn blocks(img: &RgbImage) -> impl Iterator<Item = (usize, usize, usize)> {
        let (cols, rows) = Self::block_grid(img);
        (0..CHANNELS).flat_map(move |c| {
            (0..rows).flat_map(move |by| (0..cols).map(move |bx| (c, by, bx)))
        })
    }
}

fn load_block(plane: &Plane, bx: usize, by: usize) -> Block {
    let mut block = [[0.0; N]; N];
    for (y, row) in block.iter_mut().enumerate() {
        for (x, value) in row.iter_mut().enumerate() {
            *value = plane.get(bx * N + x, by * N + y);
        }
    }
    block
}

fn store_block(plane: &mut Plane, bx: usize, by: usize, block: &Block) {
    for (y, row) in block.iter().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            plane.set(bx * N + x, by * N + y, value);
        }
    }
}

impl Codec for DctCodec {
    type Carrier = RgbImage;

    fn name(&self) -> &'static str {
        "dct"
    }

    fn capacity(&self, carrier: &RgbImage) -> Result<usize> {
        capacity::require_min_size(carrier.width(), carrier.height(), DCT_BLOCK, "DCT embedding")?;
        Ok(capacity::dct(carrier.width(), carrier.height()))
    }

    fn embed_bits(&self, carrier: &mut RgbImage, bits: &[bool]) -> Result<()> {
        let (cols, rows) = Self::block_grid(carrier);
        let available = cols * rows * CHANNELS;
        if bits.len() > available {
            return Err(StegoError::CapacityExceeded {
                required: bits.len().div_ceil(8),
                available: available / 8,
            });
        }

        let (u, v) = EMBED_COEFFICIENT;
        let magnitude = self.strength.get();
        let mut remaining = bits.iter();

        for c in 0..CHANNELS {
            if remaining.len() == 0 {
                break;
            }
            let mut plane = Plane::from_channel(carrier, c);
            'blocks: for by in 0..rows {
                for bx in 0..cols {
                    let Some(&bit) = remaining.next() else {
                        break 'blocks;
                    };
                    let mut coefficients = self.dct.forward(&load_block(&plane, bx, by));
                    coefficients[u][v] = signed_magnitude(bit, magnitude);
                    store_block(&mut plane, bx, by, &self.dct.inverse(&coefficients));
                }
            }
            plane.write_channel(carrier, c);
        }
        Ok(())
    }

    fn extract_bits(&self, carrier: &RgbImage, count: usize) -> Result<Vec<bool>> {
        let (u, v) = EMBED_COEFFICIENT;
        let mut planes: Vec<Option<Plane>> = vec![None; CHANNELS];
        let mut out = Vec::with_capacity(count);

        for (c, by, bx) in Self::blocks(carrier).take(count) {
            let plane = planes[c].get_or_insert_with(|| Plane::from_channel(carrier, c));
            let block = load_block(plane, bx, by);
            out.push(bit_from_sign(self.dct.coefficient(&block, u, v)));
        }
        Ok(out)
    }
}
