//! MSB-first conversion between bytes and flat bit sequences.
//!
//! Every codec linearises `header ‖ payload` through [`pack`] and rebuilds bytes
//! with [`unpack`], so bit order is fixed in exactly one place.

use crate::{Result, StegoError};

/// Iterate over the bits of `bytes`, most significant bit of each byte first.
pub fn iter_bits(bytes: &[u8]) -> impl Iterator<Item = bool> + '_ {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
}

pub fn pack(bytes: &[u8]) -> Vec<bool> {
    iter_bits(bytes).collect()
}

/// Inverse of [`pack`]. The bit count must be a whole number of bytes.
pub fn unpack(bits: &[bool]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(StegoError::invalid(
            "bits",
            format!("{} bits is not a whole number of bytes", bits.len()),
        ));
    }
    Ok(bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
        .collect())
}

/// Fold up to `width` bits into an integer, first bit most significant.
///
/// A short final group is left-aligned (missing low bits are zero), matching how
/// the last sample of a carrier is filled when the stream ends mid-group.
pub fn group_value(bits: &[bool], width: u8) -> u32 {
    let mut value = 0u32;
    for i in 0..width as usize {
        value = (value << 1) | bits.get(i).copied().unwrap_or(false) as u32;
    }
    value
}

/// Append the low `width` bits of `value` to `out`, most significant first.
pub fn push_group(value: u32, width: u8, out: &mut Vec<bool>) {
    for shift in (0..width).rev() {
        out.push((value >> shift) & 1 == 1);
    }
}
