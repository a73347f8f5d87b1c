use chromacloak::media::{apng, still, wav};
use chromacloak::stego::audio::{PcmBuffer, PcmFormat, SampleWidth};
use chromacloak::stego::video::{FrameDelay, FrameSequence};
use chromacloak::{DomainParams, StegoConfig, Steganographer, VideoHint};
use image::{Rgb, RgbImage};

fn gradient(width: u32, height: u32, shift: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (70 + (x + shift) / 3).min(200) as u8,
            (90 + y / 2).min(200) as u8,
            (60 + (x + y) / 4).min(200) as u8,
        ])
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let engine = Steganographer::new(StegoConfig::default());
    let message = b"meet at the old mill";

    // still image, every image domain
    let png = still::encode_png(&gradient(128, 96, 0))?;
    for params in [
        DomainParams::lsb(1)?,
        DomainParams::dct(10.0)?,
        DomainParams::dwt("db2", 0.1)?,
    ] {
        let encoded = engine.encode(&png, message, &params)?;
        let decoded = engine.decode(&encoded.stego, &params)?;
        println!(
            "{:>5}: {} bytes, {:.2}% of {} bytes, recovered {:?}",
            encoded.report.domain.name(),
            encoded.report.payload_size,
            encoded.report.capacity_used,
            encoded.report.max_capacity_bytes,
            String::from_utf8_lossy(&decoded)
        );
    }

    // 24-bit PCM with a passphrase
    let samples = (0..48_000)
        .map(|i| ((i as f64 * 0.05).sin() * 4_000_000.0) as i32)
        .collect();
    let pcm = PcmBuffer::new(
        PcmFormat {
            channels: 1,
            sample_rate: 48_000,
            width: SampleWidth::Three,
        },
        samples,
    );
    let params = DomainParams::audio(2)?;
    let sealed = engine.seal(message, Some("correct horse battery"))?;
    let encoded = engine.encode(&wav::write_wav(&pcm)?, &sealed, &params)?;
    let opened = engine.open(&engine.decode(&encoded.stego, &params)?, Some("correct horse battery"))?;
    println!(
        "audio: encrypted {}, recovered {:?}",
        opened.encrypted,
        String::from_utf8_lossy(&opened.payload)
    );

    // frame sequence, decoded without being told the parameters
    let frames = FrameSequence::new(
        (0..6).map(|i| gradient(64, 48, i * 4)).collect(),
        FrameDelay { num: 1, den: 24 },
    )?;
    let encoded = engine.encode(&apng::write_frames(&frames)?, message, &DomainParams::video(3, 2)?)?;
    let decoded = engine.decode_video(&encoded.stego, VideoHint::default())?;
    println!(
        "video: {}, recovered {:?}",
        serde_json::to_string(&encoded.report.carrier)?,
        String::from_utf8_lossy(&decoded)
    );

    Ok(())
}
