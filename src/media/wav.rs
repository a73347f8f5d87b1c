//! Integer PCM WAV files through `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use super::{unreadable, unwritable};
use crate::stego::audio::{PcmBuffer, PcmFormat, SampleWidth};
use crate::{Result, StegoError};

pub fn read_wav(bytes: &[u8]) -> Result<PcmBuffer> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(|e| unreadable("WAV", e))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int {
        return Err(StegoError::UnsupportedContainer(
            "floating point WAV is not supported, use integer PCM".to_string(),
        ));
    }
    let width = SampleWidth::from_bits(spec.bits_per_sample)?;

    let samples = reader
        .samples::<i32>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| unreadable("WAV samples", e))?;
    debug!(
        "read WAV: {} channels, {} Hz, {} bits, {} samples",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        samples.len()
    );

    Ok(PcmBuffer::new(
        PcmFormat {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            width,
        },
        samples,
    ))
}

pub fn write_wav(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: buffer.format.channels,
        sample_rate: buffer.format.sample_rate,
        bits_per_sample: buffer.format.width.bits(),
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(unwritable)?;
        for &sample in &buffer.samples {
            writer.write_sample(sample).map_err(unwritable)?;
        }
        writer.finalize().map_err(unwritable)?;
    }
    Ok(cursor.into_inner())
}
