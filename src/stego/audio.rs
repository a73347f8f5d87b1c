/*! PCM audio sample codec

Bits go into the low `bit_depth` bits of every sample, in interleaved sample
order, exactly like the spatial codec does for channel bytes.

Samples are held as signed integers whatever their width on disk (8-bit WAV
data is unsigned on disk and shifted into the signed range when read). Every
edit goes through the unsigned view `sample + 2^(bits - 1)`, so the bits being
replaced are the bits of the stored pattern and never sign-extension bits of a
negative native integer.
*/

use super::Codec;
use crate::bits;
use crate::capacity;
use crate::params::BitDepth;
use crate::{Result, StegoError};

/// Bytes per stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleWidth {
    One,
    Two,
    Three,
}

impl SampleWidth {
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(SampleWidth::One),
            16 => Ok(SampleWidth::Two),
            24 => Ok(SampleWidth::Three),
            other => Err(StegoError::UnsupportedContainer(format!(
                "unsupported sample width: {} bits, expected 8, 16 or 24",
                other
            ))),
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            SampleWidth::One => 1,
            SampleWidth::Two => 2,
            SampleWidth::Three => 3,
        }
    }

    pub fn bits(self) -> u16 {
        self.bytes() as u16 * 8
    }

    /// Distance between the signed range and its unsigned counterpart.
    pub fn offset(self) -> i64 {
        1 << (self.bits() - 1)
    }

    pub fn to_unsigned(self, sample: i32) -> u32 {
        (sample as i64 + self.offset()) as u32
    }

    pub fn from_unsigned(self, value: u32) -> i32 {
        (value as i64 - self.offset()) as i32
    }

    /// Assemble one little-endian sample.
    ///
    /// 8-bit data is unsigned on disk; wider data is two's complement.
    pub fn read_le(self, bytes: &[u8]) -> i32 {
        match self {
            SampleWidth::One => self.from_unsigned(bytes[0] as u32),
            SampleWidth::Two => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            SampleWidth::Three => {
                let raw = bytes[0] as i32 | (bytes[1] as i32) << 8 | (bytes[2] as i32) << 16;
                // bit 23 is the sign bit
                if raw & 0x80_0000 != 0 {
                    raw - (1 << 24)
                } else {
                    raw
                }
            }
        }
    }

    pub fn write_le(self, sample: i32, out: &mut Vec<u8>) {
        match self {
            SampleWidth::One => out.push(self.to_unsigned(sample) as u8),
            SampleWidth::Two => out.extend_from_slice(&(sample as i16).to_le_bytes()),
            SampleWidth::Three => {
                let raw = self.to_unsigned(sample) ^ 0x80_0000;
                out.extend_from_slice(&raw.to_le_bytes()[..3]);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub width: SampleWidth,
}

/// Interleaved PCM samples, signed, in the range of `format.width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub format: PcmFormat,
    pub samples: Vec<i32>,
}

impl PcmBuffer {
    pub fn new(format: PcmFormat, samples: Vec<i32>) -> Self {
        Self { format, samples }
    }

    /// Parse headerless little-endian PCM; a trailing partial sample is an error.
    pub fn from_le_bytes(format: PcmFormat, data: &[u8]) -> Result<Self> {
        let width = format.width.bytes();
        if data.len() % width != 0 {
            return Err(StegoError::UnsupportedContainer(format!(
                "{} bytes of PCM data is not a whole number of {}-byte samples",
                data.len(),
                width
            )));
        }
        let samples = data
            .chunks_exact(width)
            .map(|chunk| format.width.read_le(chunk))
            .collect();
        Ok(Self { format, samples })
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * self.format.width.bytes());
        for &sample in &self.samples {
            self.format.width.write_le(sample, &mut out);
        }
        out
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.format.sample_rate as f64
    }
}

/// LSB substitution over PCM samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmSampleCodec {
    bit_depth: BitDepth,
}

impl PcmSampleCodec {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }
}

impl Codec for PcmSampleCodec {
    type Carrier = PcmBuffer;

    fn name(&self) -> &'static str {
        "audio"
    }

    fn capacity(&self, carrier: &PcmBuffer) -> Result<usize> {
        Ok(capacity::pcm(carrier.samples.len(), self.bit_depth))
    }

    fn embed_bits(&self, carrier: &mut PcmBuffer, stream: &[bool]) -> Result<()> {
        let depth = self.bit_depth.get();
        let available = carrier.samples.len() * depth as usize;
        if stream.len() > available {
            return Err(StegoError::CapacityExceeded {
                required: stream.len().div_ceil(8),
                available: available / 8,
            });
        }

        let width = carrier.format.width;
        let clear_mask = !self.bit_depth.mask();
        for (sample, group) in carrier
            .samples
            .iter_mut()
            .zip(stream.chunks(depth as usize))
        {
            let unsigned = width.to_unsigned(*sample);
            let edited = (unsigned & clear_mask) | bits::group_value(group, depth);
            *sample = width.from_unsigned(edited);
        }
        Ok(())
    }

    fn extract_bits(&self, carrier: &PcmBuffer, count: usize) -> Result<Vec<bool>> {
        let width = carrier.format.width;
        let mask = self.bit_depth.mask();
        let mut out = Vec::with_capacity(count);
        for &sample in &carrier.samples {
            if out.len() >= count {
                break;
            }
            bits::push_group(width.to_unsigned(sample) & mask, self.bit_depth.get(), &mut out);
        }
        out.truncate(count);
        Ok(out)
    }
}
