//! Encode, decode and capacity entry points over container bytes.
//!
//! Every call decodes its own carrier, works on that private copy and only
//! serialises it once the whole payload has been written, so a failed encode
//! never produces output.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::capacity::{self, CapacityInfo, CarrierDescriptor};
use crate::config::StegoConfig;
use crate::framer::{Opened, PayloadFramer};
use crate::media::{apng, still, wav};
use crate::params::{Domain, DomainParams, VideoHint};
use crate::stego::audio::PcmSampleCodec;
use crate::stego::lsb::SpatialLsbCodec;
use crate::stego::transform::{DctCodec, DwtCodec};
use crate::stego::video::{self, FrameDelay, VideoFrameCodec};
use crate::stego::{embed_standard, extract_standard, Codec, Embedding};
use crate::{Result, StegoError};

/// What the carrier looked like.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CarrierSummary {
    Image {
        width: u32,
        height: u32,
    },
    Audio {
        channels: u16,
        sample_rate: u32,
        sample_width_bits: u16,
        duration_secs: f64,
    },
    Video {
        width: u32,
        height: u32,
        total_frames: usize,
        frames_modified: usize,
        frame_delay: FrameDelay,
        fps: f64,
    },
}

/// Whole 8x8 blocks per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockGrid {
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeReport {
    pub domain: Domain,
    pub payload_size: usize,
    pub header_size: usize,
    pub max_capacity_bytes: usize,
    /// Percent of capacity taken by header and payload.
    pub capacity_used: f64,
    pub params: DomainParams,
    pub carrier: CarrierSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_grid: Option<BlockGrid>,
}

impl EncodeReport {
    fn new(params: &DomainParams, embedding: Embedding, carrier: CarrierSummary) -> Self {
        Self {
            domain: params.domain(),
            payload_size: embedding.payload_size,
            header_size: embedding.header_len,
            max_capacity_bytes: embedding.capacity_bytes,
            capacity_used: embedding.capacity_used(),
            params: *params,
            carrier,
            block_grid: None,
        }
    }
}

/// Serialised stego carrier plus the report describing it.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub stego: Vec<u8>,
    pub report: EncodeReport,
}

#[derive(Debug, Clone, Default)]
pub struct Steganographer {
    config: StegoConfig,
}

impl Steganographer {
    pub fn new(config: StegoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StegoConfig {
        &self.config
    }

    /// Hide `payload` in `carrier` (container bytes) and return the new container.
    pub fn encode(&self, carrier: &[u8], payload: &[u8], params: &DomainParams) -> Result<Encoded> {
        if payload.len() > self.config.max_payload_bytes {
            return Err(StegoError::CapacityExceeded {
                required: payload.len(),
                available: self.config.max_payload_bytes,
            });
        }

        let encoded = match *params {
            DomainParams::Lsb { bit_depth } => {
                self.encode_image(&SpatialLsbCodec::new(bit_depth), carrier, payload, params)?
            }
            DomainParams::Dct { strength } => {
                let mut encoded = self.encode_image(&DctCodec::new(strength), carrier, payload, params)?;
                if let CarrierSummary::Image { width, height } = encoded.report.carrier {
                    encoded.report.block_grid = Some(BlockGrid {
                        columns: (width / capacity::DCT_BLOCK) as usize,
                        rows: (height / capacity::DCT_BLOCK) as usize,
                    });
                }
                encoded
            }
            DomainParams::Dwt { wavelet, strength } => {
                self.encode_image(&DwtCodec::new(wavelet, strength), carrier, payload, params)?
            }
            DomainParams::Audio { bit_depth } => {
                let mut buffer = wav::read_wav(carrier)?;
                let embedding = embed_standard(&PcmSampleCodec::new(bit_depth), &mut buffer, payload)?;
                let summary = CarrierSummary::Audio {
                    channels: buffer.format.channels,
                    sample_rate: buffer.format.sample_rate,
                    sample_width_bits: buffer.format.width.bits(),
                    duration_secs: buffer.duration_secs(),
                };
                Encoded {
                    stego: wav::write_wav(&buffer)?,
                    report: EncodeReport::new(params, embedding, summary),
                }
            }
            DomainParams::Video {
                bit_depth,
                stride,
                header,
            } => {
                let mut sequence = apng::read_frames(carrier)?;
                let result = VideoFrameCodec::new(bit_depth, stride, header).embed(&mut sequence, payload)?;
                let (width, height) = sequence.dimensions();
                let summary = CarrierSummary::Video {
                    width,
                    height,
                    total_frames: sequence.len(),
                    frames_modified: result.frames_modified,
                    frame_delay: sequence.delay,
                    fps: sequence.delay.fps(),
                };
                Encoded {
                    stego: apng::write_frames(&sequence)?,
                    report: EncodeReport::new(params, result.embedding, summary),
                }
            }
        };

        info!(
            "encoded {} bytes with {} ({:.2}% of {} bytes)",
            encoded.report.payload_size,
            encoded.report.domain,
            encoded.report.capacity_used,
            encoded.report.max_capacity_bytes
        );
        Ok(encoded)
    }

    fn encode_image<C>(&self, codec: &C, carrier: &[u8], payload: &[u8], params: &DomainParams) -> Result<Encoded>
    where
        C: Codec<Carrier = image::RgbImage>,
    {
        let mut img = still::decode_rgb(carrier)?;
        let embedding = embed_standard(codec, &mut img, payload)?;
        let summary = CarrierSummary::Image {
            width: img.width(),
            height: img.height(),
        };
        Ok(Encoded {
            stego: still::encode_png(&img)?,
            report: EncodeReport::new(params, embedding, summary),
        })
    }

    /// Recover the payload. For video the parameters are a hint and the
    /// self-describing header is searched for first.
    pub fn decode(&self, stego: &[u8], params: &DomainParams) -> Result<Vec<u8>> {
        let ceiling = self.config.sanity_ceiling_bytes;
        let payload = match *params {
            DomainParams::Lsb { bit_depth } => {
                still::require_lossless(stego)?;
                let img = still::decode_rgb(stego)?;
                extract_standard(&SpatialLsbCodec::new(bit_depth), &img, ceiling)?
            }
            DomainParams::Dct { strength } => {
                extract_standard(&DctCodec::new(strength), &still::decode_rgb(stego)?, ceiling)?
            }
            DomainParams::Dwt { wavelet, strength } => extract_standard(
                &DwtCodec::new(wavelet, strength),
                &still::decode_rgb(stego)?,
                ceiling,
            )?,
            DomainParams::Audio { bit_depth } => {
                extract_standard(&PcmSampleCodec::new(bit_depth), &wav::read_wav(stego)?, ceiling)?
            }
            DomainParams::Video {
                bit_depth, stride, ..
            } => {
                let hint = VideoHint {
                    bit_depth: Some(bit_depth),
                    stride: Some(stride),
                    auto_detect: true,
                };
                return self.decode_video(stego, hint);
            }
        };
        info!("decoded {} bytes with {}", payload.len(), params.domain());
        Ok(payload)
    }

    /// Video decode with partial or no knowledge of the parameters.
    pub fn decode_video(&self, stego: &[u8], hint: VideoHint) -> Result<Vec<u8>> {
        let sequence = apng::read_frames(stego)?;
        let payload = video::extract(&sequence, &hint, self.config.sanity_ceiling_bytes)?;
        info!("decoded {} bytes from {} frames", payload.len(), sequence.len());
        Ok(payload)
    }

    /// Dimensions of a carrier as the given domain sees it.
    pub fn describe(&self, carrier: &[u8], domain: Domain) -> Result<CarrierDescriptor> {
        Ok(match domain {
            Domain::Lsb | Domain::Dct | Domain::Dwt => {
                let img = still::decode_rgb(carrier)?;
                CarrierDescriptor::Image {
                    width: img.width(),
                    height: img.height(),
                }
            }
            Domain::Audio => CarrierDescriptor::Pcm {
                samples: wav::read_wav(carrier)?.samples.len(),
            },
            Domain::Video => {
                let sequence = apng::read_frames(carrier)?;
                let (width, height) = sequence.dimensions();
                CarrierDescriptor::Video {
                    width,
                    height,
                    frames: sequence.len(),
                }
            }
        })
    }

    pub fn capacity(&self, carrier: &[u8], params: &DomainParams) -> Result<CapacityInfo> {
        let descriptor = self.describe(carrier, params.domain())?;
        capacity::capacity_for(&descriptor, params)
    }

    pub fn encode_file(
        &self,
        carrier: impl AsRef<Path>,
        payload: &[u8],
        params: &DomainParams,
        output: impl AsRef<Path>,
    ) -> Result<EncodeReport> {
        let carrier = read_input(carrier.as_ref())?;
        let Encoded { stego, report } = self.encode(&carrier, payload, params)?;
        fs::write(output.as_ref(), stego)?;
        info!("wrote stego output to {}", output.as_ref().display());
        Ok(report)
    }

    pub fn decode_file(&self, stego: impl AsRef<Path>, params: &DomainParams) -> Result<Vec<u8>> {
        self.decode(&read_input(stego.as_ref())?, params)
    }

    /// Tag, and with a passphrase encrypt, a payload before encoding.
    pub fn seal(&self, payload: &[u8], passphrase: Option<&str>) -> Result<Vec<u8>> {
        PayloadFramer::new(self.config.kdf_rounds).seal(payload, passphrase)
    }

    /// Undo [`Steganographer::seal`] on extracted bytes.
    pub fn open(&self, extracted: &[u8], passphrase: Option<&str>) -> Result<Opened> {
        PayloadFramer::new(self.config.kdf_rounds).open(extracted, passphrase)
    }
}

/// Read an input file, reporting a missing one as [`StegoError::NotFound`].
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(StegoError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::audio::{PcmBuffer, PcmFormat, SampleWidth};
    use crate::stego::video::FrameSequence;
    use image::{Rgb, RgbImage};

    fn engine() -> Steganographer {
        Steganographer::new(StegoConfig {
            kdf_rounds: 1_000,
            ..StegoConfig::default()
        })
    }

    fn png_carrier(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(90 + x / 2) as u8, (110 + y / 2) as u8, (70 + (x + y) / 4) as u8])
        });
        still::encode_png(&img).unwrap()
    }

    #[test]
    fn test_dct_report_has_block_grid() {
        crate::init_test_tracing();
        let encoded = engine()
            .encode(&png_carrier(64, 40), b"grid", &DomainParams::dct(10.0).unwrap())
            .unwrap();
        assert_eq!(encoded.report.block_grid, Some(BlockGrid { columns: 8, rows: 5 }));
        assert_eq!(encoded.report.max_capacity_bytes, 15);
        assert_eq!(encoded.report.header_size, 4);

        let json = serde_json::to_value(&encoded.report).unwrap();
        assert_eq!(json["domain"], "dct");
        assert_eq!(json["params"]["domain"], "dct");
        assert_eq!(json["carrier"]["kind"], "image");
    }

    #[test]
    fn test_config_payload_limit() {
        let engine = Steganographer::new(StegoConfig {
            max_payload_bytes: 8,
            ..StegoConfig::default()
        });
        assert!(matches!(
            engine.encode(&png_carrier(32, 32), &[0; 9], &DomainParams::lsb(1).unwrap()),
            Err(StegoError::CapacityExceeded { required: 9, available: 8 })
        ));
    }

    #[test]
    fn test_wrong_container_for_domain() {
        let png = png_carrier(32, 32);
        assert!(matches!(
            engine().encode(&png, b"x", &DomainParams::audio(1).unwrap()),
            Err(StegoError::UnsupportedContainer(_))
        ));
    }

    #[test]
    fn test_capacity_query() {
        let engine = engine();
        let info = engine
            .capacity(&png_carrier(100, 100), &DomainParams::lsb(1).unwrap())
            .unwrap();
        assert_eq!(info.capacity_bytes, 3750);
        assert_eq!(info.max_payload_bytes, 3746);

        let pcm = PcmBuffer::new(
            PcmFormat {
                channels: 1,
                sample_rate: 8_000,
                width: SampleWidth::Two,
            },
            vec![0; 800],
        );
        let info = engine
            .capacity(&wav::write_wav(&pcm).unwrap(), &DomainParams::audio(2).unwrap())
            .unwrap();
        assert_eq!(info.capacity_bytes, 200);

        let frames = FrameSequence::new(vec![RgbImage::new(8, 8); 4], FrameDelay::default()).unwrap();
        let info = engine
            .capacity(&apng::write_frames(&frames).unwrap(), &DomainParams::video(1, 2).unwrap())
            .unwrap();
        assert_eq!(info.capacity_bytes, 48);
        assert_eq!(info.header_len, 10);
    }

    #[test]
    fn test_missing_file() {
        let missing = std::env::temp_dir().join("chromacloak-does-not-exist.png");
        assert!(matches!(
            engine().decode_file(&missing, &DomainParams::lsb(1).unwrap()),
            Err(StegoError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_encode_writes_nothing() {
        let dir = std::env::temp_dir();
        let carrier = dir.join(format!("chromacloak-small-{}.png", std::process::id()));
        let output = dir.join(format!("chromacloak-out-{}.png", std::process::id()));
        fs::write(&carrier, png_carrier(8, 8)).unwrap();

        let result = engine().encode_file(&carrier, &[1; 100], &DomainParams::lsb(1).unwrap(), &output);
        fs::remove_file(&carrier).unwrap();
        assert!(matches!(result, Err(StegoError::CapacityExceeded { .. })));
        assert!(!output.exists());
    }
}
