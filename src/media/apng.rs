//! Frame sequences stored as animated PNG.
//!
//! APNG is lossless, so every embedded bit survives the round trip. A plain PNG
//! reads as a one-frame sequence. Output is always animated so the frame delay
//! is carried along.

use std::io::Cursor;

use image::RgbImage;
use png::{ColorType, Decoder, Encoder, Transformations};
use tracing::debug;

use super::{unreadable, unwritable};
use crate::stego::video::{FrameDelay, FrameSequence};
use crate::{Result, StegoError};

/// acTL's frame count is untrusted, so only this many slots are reserved up front.
const PREALLOCATED_FRAMES: usize = 64;

pub fn read_frames(bytes: &[u8]) -> Result<FrameSequence> {
    let mut decoder = Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| unreadable("APNG", e))?;

    let (width, height, declared, delay, hidden_default) = {
        let info = reader.info();
        let delay = info
            .frame_control
            .map(|fc| FrameDelay {
                num: fc.delay_num,
                den: fc.delay_den,
            })
            .unwrap_or_default();
        // without an fcTL before IDAT the default image is not an animation frame
        let hidden_default = info.animation_control.is_some() && info.frame_control.is_none();
        let declared = info.animation_control.map_or(1, |ac| ac.num_frames as usize);
        (info.width, info.height, declared, delay, hidden_default)
    };

    let mut buffer = vec![0; reader.output_buffer_size()];
    if hidden_default {
        reader
            .next_frame(&mut buffer)
            .map_err(|e| unreadable("APNG default image", e))?;
    }

    // a count larger than the frames actually present fails in next_frame
    let mut frames = Vec::with_capacity(declared.min(PREALLOCATED_FRAMES));
    for index in 0..declared {
        let output = reader
            .next_frame(&mut buffer)
            .map_err(|e| unreadable("APNG frame", e))?;
        if output.width != width || output.height != height {
            return Err(StegoError::UnsupportedContainer(format!(
                "frame {} is a {}x{} region of a {}x{} canvas, only full frames are supported",
                index, output.width, output.height, width, height
            )));
        }
        let raw = to_rgb(&buffer[..output.buffer_size()], output.color_type)?;
        let frame = RgbImage::from_raw(width, height, raw).ok_or_else(|| {
            StegoError::UnsupportedContainer(format!("frame {} has a short pixel buffer", index))
        })?;
        frames.push(frame);
    }

    debug!(
        "read {} frames of {}x{}, delay {}/{}",
        frames.len(),
        width,
        height,
        delay.num,
        delay.den
    );
    FrameSequence::new(frames, delay)
}

fn to_rgb(data: &[u8], color: ColorType) -> Result<Vec<u8>> {
    let rgb = match color {
        ColorType::Rgb => data.to_vec(),
        ColorType::Rgba => data.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect(),
        ColorType::Grayscale => data.iter().flat_map(|&v| [v, v, v]).collect(),
        ColorType::GrayscaleAlpha => data.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0]]).collect(),
        ColorType::Indexed => {
            return Err(StegoError::UnsupportedContainer(
                "indexed frame was not expanded".to_string(),
            ))
        }
    };
    Ok(rgb)
}

pub fn write_frames(sequence: &FrameSequence) -> Result<Vec<u8>> {
    if sequence.is_empty() {
        return Err(StegoError::UnsupportedContainer(
            "cannot write an empty frame sequence".to_string(),
        ));
    }
    let (width, height) = sequence.dimensions();

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .set_animated(sequence.len() as u32, 0)
            .map_err(unwritable)?;
        encoder
            .set_frame_delay(sequence.delay.num, sequence.delay.den)
            .map_err(unwritable)?;

        let mut writer = encoder.write_header().map_err(unwritable)?;
        for frame in sequence.frames() {
            writer.write_image_data(frame.as_raw()).map_err(unwritable)?;
        }
        writer.finish().map_err(unwritable)?;
    }
    Ok(out)
}
