mod common;

use chromacloak::media::{apng, wav};
use chromacloak::stego::video::{self, FrameDelay, FrameSequence};
use chromacloak::{BitDepth, DomainParams, FrameStride, StegoError, VideoHint};
use common::{apng_noise, engine, init_tracing, noise_image, wav_16_bit, wav_24_bit};
use image::{Rgb, RgbImage};

#[test]
fn test_24_bit_wav_roundtrip() {
    init_tracing();
    let carrier = wav_24_bit(20_000);
    let samples = wav::read_wav(&carrier).unwrap().samples;
    assert!(samples.iter().any(|&s| s < -4_000_000));

    let payload: Vec<u8> = (0..700).map(|i| (i * 31 % 256) as u8).collect();
    for depth in [1, 2, 4] {
        let params = DomainParams::audio(depth).unwrap();
        let encoded = engine().encode(&carrier, &payload, &params).unwrap();

        let stego = wav::read_wav(&encoded.stego).unwrap();
        assert_eq!(stego.samples.len(), samples.len());
        for (before, after) in samples.iter().zip(&stego.samples) {
            // only the low bits of the stored pattern may move
            assert!((before - after).abs() < 16);
            assert!((-8_388_608..8_388_608).contains(after));
        }
        assert_eq!(
            engine().decode(&encoded.stego, &params).unwrap(),
            payload,
            "bit depth {}",
            depth
        );
    }
}

#[test]
fn test_16_bit_capacity_boundary() {
    let carrier = wav_16_bit(1_000, 8);
    let params = DomainParams::audio(1).unwrap();
    // 1000 samples * 1 bit / 8
    assert_eq!(engine().capacity(&carrier, &params).unwrap().capacity_bytes, 125);
    assert!(engine().encode(&carrier, &[5; 121], &params).is_ok());
    assert!(matches!(
        engine().encode(&carrier, &[5; 122], &params),
        Err(StegoError::CapacityExceeded { .. })
    ));
}

#[test]
fn test_audio_report() {
    let encoded = engine()
        .encode(&wav_16_bit(32_000, 9), b"report", &DomainParams::audio(2).unwrap())
        .unwrap();
    let json = serde_json::to_value(&encoded.report).unwrap();
    assert_eq!(json["carrier"]["kind"], "audio");
    assert_eq!(json["carrier"]["sample_width_bits"], 16);
    assert_eq!(json["carrier"]["duration_secs"], 2.0);
}

#[test]
fn test_silent_audio_is_rejected() {
    let silent = wav::write_wav(&chromacloak::stego::audio::PcmBuffer::new(
        chromacloak::stego::audio::PcmFormat {
            channels: 1,
            sample_rate: 8_000,
            width: chromacloak::stego::audio::SampleWidth::Two,
        },
        vec![0; 4_000],
    ))
    .unwrap();
    assert!(matches!(
        engine().decode(&silent, &DomainParams::audio(1).unwrap()),
        Err(StegoError::CorruptOrMismatchedHeader(_))
    ));
}

#[test]
fn test_video_auto_detect_without_parameters() {
    init_tracing();
    let carrier = apng_noise(24, 16, 6);
    let payload: Vec<u8> = (0..500).map(|i| (i % 199) as u8).collect();

    let encoded = engine()
        .encode(&carrier, &payload, &DomainParams::video(3, 2).unwrap())
        .unwrap();
    let json = serde_json::to_value(&encoded.report).unwrap();
    assert_eq!(json["carrier"]["total_frames"], 6);
    assert_eq!(json["carrier"]["frames_modified"], 2);

    assert_eq!(
        engine().decode_video(&encoded.stego, VideoHint::default()).unwrap(),
        payload
    );
}

#[test]
fn test_legacy_video_with_explicit_parameters() {
    let carrier = apng_noise(16, 16, 3);
    let encoded = engine()
        .encode(&carrier, b"old style", &DomainParams::video_legacy(1, 1).unwrap())
        .unwrap();
    assert_eq!(encoded.report.header_size, 4);

    let hint = VideoHint::explicit(BitDepth::new(1).unwrap(), FrameStride::new(1).unwrap());
    assert_eq!(engine().decode_video(&encoded.stego, hint).unwrap(), b"old style");
}

#[test]
fn test_video_decode_through_params() {
    let carrier = apng_noise(16, 12, 4);
    let params = DomainParams::video(2, 1).unwrap();
    let encoded = engine().encode(&carrier, b"via decode", &params).unwrap();
    assert_eq!(engine().decode(&encoded.stego, &params).unwrap(), b"via decode");
}

#[test]
fn test_frame_rate_and_untouched_frames_preserved() {
    let carrier = apng_noise(16, 16, 4);
    let encoded = engine()
        .encode(&carrier, b"tiny", &DomainParams::video(1, 1).unwrap())
        .unwrap();
    let before = apng::read_frames(&carrier).unwrap();
    let after = apng::read_frames(&encoded.stego).unwrap();
    assert_eq!(after.delay, FrameDelay { num: 1, den: 30 });
    assert_eq!(after.len(), 4);
    for index in 1..4 {
        assert_eq!(after.frames()[index], before.frames()[index]);
    }
}

#[test]
fn test_video_capacity_boundary() {
    // 8 * 8 * 3 / 8 = 24 bytes per frame, 2 used frames at stride 2
    let carrier = apng_noise(8, 8, 5);
    let params = DomainParams::video(1, 2).unwrap();
    assert_eq!(engine().capacity(&carrier, &params).unwrap().max_payload_bytes, 38);
    assert!(engine().encode(&carrier, &[9; 38], &params).is_ok());
    assert!(matches!(
        engine().encode(&carrier, &[9; 39], &params),
        Err(StegoError::CapacityExceeded { .. })
    ));
}

#[test]
fn test_unencoded_video_is_rejected() {
    let sequence = FrameSequence::new(
        vec![RgbImage::from_pixel(16, 16, Rgb([2, 4, 6])); 2],
        FrameDelay::default(),
    )
    .unwrap();
    let bytes = apng::write_frames(&sequence).unwrap();
    assert!(matches!(
        engine().decode_video(&bytes, VideoHint::default()),
        Err(StegoError::CorruptOrMismatchedHeader(_))
    ));
    assert_eq!(video::detect(&sequence).unwrap(), None);
}

#[test]
fn test_inflated_frame_count_is_rejected() {
    let mut bytes = apng_noise(4, 4, 1);
    let at = bytes.windows(4).position(|w| w == b"acTL").unwrap();
    bytes[at + 4..at + 8].copy_from_slice(&0x4000_0000u32.to_be_bytes());
    let crc = crc32fast::hash(&bytes[at..at + 12]);
    bytes[at + 12..at + 16].copy_from_slice(&crc.to_be_bytes());

    assert!(matches!(
        engine().decode_video(&bytes, VideoHint::default()),
        Err(StegoError::UnsupportedContainer(_))
    ));
    assert!(matches!(
        engine().capacity(&bytes, &DomainParams::video(1, 1).unwrap()),
        Err(StegoError::UnsupportedContainer(_))
    ));
}

#[test]
fn test_static_png_as_video() {
    let png = common::png(&noise_image(32, 32, 12));
    let params = DomainParams::video(1, 1).unwrap();
    let encoded = engine().encode(&png, b"one frame", &params).unwrap();
    assert_eq!(
        engine().decode_video(&encoded.stego, VideoHint::default()).unwrap(),
        b"one frame"
    );
}
