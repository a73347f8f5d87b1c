#![allow(dead_code)]

use chromacloak::media::{apng, still, wav};
use chromacloak::stego::audio::{PcmBuffer, PcmFormat, SampleWidth};
use chromacloak::stego::video::{FrameDelay, FrameSequence};
use chromacloak::{StegoConfig, Steganographer};
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Engine with a cheap KDF so encryption tests stay fast.
pub fn engine() -> Steganographer {
    Steganographer::new(StegoConfig {
        kdf_rounds: 1_000,
        ..StegoConfig::default()
    })
}

pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

/// Smooth mid-tone image; transform-domain edits stay clear of clipping.
pub fn smooth_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (80 + (x + y) / 4).min(190) as u8,
            (100 + x / 3).min(190) as u8,
            (70 + y / 3).min(190) as u8,
        ])
    })
}

pub fn png(img: &RgbImage) -> Vec<u8> {
    still::encode_png(img).unwrap()
}

pub fn wav_24_bit(samples: usize) -> Vec<u8> {
    // near full scale so plenty of samples are negative
    let data = (0..samples)
        .map(|i| ((i as f64 * 0.013).sin() * 8_300_000.0) as i32)
        .collect();
    let buffer = PcmBuffer::new(
        PcmFormat {
            channels: 2,
            sample_rate: 44_100,
            width: SampleWidth::Three,
        },
        data,
    );
    wav::write_wav(&buffer).unwrap()
}

pub fn wav_16_bit(samples: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let data = (0..samples).map(|_| rng.gen_range(-32_768..32_768)).collect();
    let buffer = PcmBuffer::new(
        PcmFormat {
            channels: 1,
            sample_rate: 16_000,
            width: SampleWidth::Two,
        },
        data,
    );
    wav::write_wav(&buffer).unwrap()
}

pub fn apng_noise(width: u32, height: u32, frames: u64) -> Vec<u8> {
    let sequence = FrameSequence::new(
        (0..frames).map(|i| noise_image(width, height, 100 + i)).collect(),
        FrameDelay { num: 1, den: 30 },
    )
    .unwrap();
    apng::write_frames(&sequence).unwrap()
}
