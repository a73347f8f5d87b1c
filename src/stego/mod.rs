/*!
 * Embedding engines for every carrier domain
 *
 * Each codec knows how to write and read a flat bit stream in its domain. The
 * length-prefixed framing that sits on top of that stream is shared:
 *
 * - Spatial LSB substitution over RGB images
 * - DCT coefficient signing over 8x8 blocks
 * - DWT horizontal-detail coefficient signing
 * - PCM sample LSB substitution (8/16/24-bit)
 * - Video frame LSB substitution with a self-describing header
 */

pub mod audio;
pub mod lsb;
pub mod transform;
pub mod video;

use tracing::debug;

use crate::bits;
use crate::header::{self, StandardHeader, STANDARD_HEADER_BITS, STANDARD_HEADER_LEN};
use crate::{HeaderFault, Result, StegoError};

/// A domain-specific way of hiding bits in a carrier.
///
/// `capacity` must be the same number on the encode and decode side, since the
/// decoder uses it to bound the header's length field.
pub trait Codec {
    type Carrier;

    fn name(&self) -> &'static str;

    /// Capacity in bytes, header included.
    fn capacity(&self, carrier: &Self::Carrier) -> Result<usize>;

    /// Write `bits` from the start of the carrier, leaving the rest untouched.
    fn embed_bits(&self, carrier: &mut Self::Carrier, bits: &[bool]) -> Result<()>;

    /// Read the first `count` bits, or fewer if the carrier runs out.
    fn extract_bits(&self, carrier: &Self::Carrier, count: usize) -> Result<Vec<bool>>;
}

/// What an embed consumed, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embedding {
    pub payload_size: usize,
    pub header_len: usize,
    pub capacity_bytes: usize,
}

impl Embedding {
    /// Percentage of capacity taken by header and payload.
    pub fn capacity_used(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        (self.payload_size + self.header_len) as f64 / self.capacity_bytes as f64 * 100.0
    }
}

/// Non-empty and representable in the 32-bit length field.
pub fn check_payload(payload: &[u8]) -> Result<u32> {
    if payload.is_empty() {
        return Err(StegoError::invalid("payload", "cannot be empty"));
    }
    u32::try_from(payload.len()).map_err(|_| {
        StegoError::invalid(
            "payload",
            format!("{} bytes exceeds the 32-bit length field", payload.len()),
        )
    })
}

pub fn ensure_fits(payload_len: usize, header_len: usize, capacity: usize) -> Result<()> {
    let required = payload_len + header_len;
    if required > capacity {
        return Err(StegoError::CapacityExceeded {
            required,
            available: capacity,
        });
    }
    Ok(())
}

/// Embed `payload` behind a 4-byte length header.
pub fn embed_standard<C: Codec>(
    codec: &C,
    carrier: &mut C::Carrier,
    payload: &[u8],
) -> Result<Embedding> {
    let length = check_payload(payload)?;
    let capacity = codec.capacity(carrier)?;
    ensure_fits(payload.len(), STANDARD_HEADER_LEN, capacity)?;

    let mut stream = StandardHeader::new(length).to_bits();
    stream.extend(bits::iter_bits(payload));
    codec.embed_bits(carrier, &stream)?;

    debug!(
        "{}: embedded {} payload bytes, capacity {} bytes",
        codec.name(),
        payload.len(),
        capacity
    );

    Ok(Embedding {
        payload_size: payload.len(),
        header_len: STANDARD_HEADER_LEN,
        capacity_bytes: capacity,
    })
}

/// Read a 4-byte length header and exactly that many payload bytes.
pub fn extract_standard<C: Codec>(codec: &C, carrier: &C::Carrier, ceiling: usize) -> Result<Vec<u8>> {
    let capacity = codec.capacity(carrier)?;
    if capacity < STANDARD_HEADER_LEN {
        return Err(StegoError::UnsupportedContainer(format!(
            "carrier too small to contain hidden data: {} bytes, need at least {} for the header",
            capacity, STANDARD_HEADER_LEN
        )));
    }

    let header_bits = codec.extract_bits(carrier, STANDARD_HEADER_BITS)?;
    let header = StandardHeader::from_bits(&header_bits)?;
    let length = header::validate_length(header.length, capacity, STANDARD_HEADER_LEN, ceiling)?;
    debug!("{}: header announces {} payload bytes", codec.name(), length);

    let total = STANDARD_HEADER_BITS + length * 8;
    let stream = codec.extract_bits(carrier, total)?;
    if stream.len() < total {
        return Err(HeaderFault::Truncated {
            needed: total,
            available: stream.len(),
        }
        .into());
    }
    bits::unpack(&stream[STANDARD_HEADER_BITS..total])
}
