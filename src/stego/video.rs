/*! Video frame codec

Every `stride`-th frame, starting with frame 0, is treated as one more stretch
of channel bytes for the spatial LSB algorithm; the bit stream simply continues
across frame boundaries. Only `floor(frames / stride)` frames are ever used, so
the codec and the capacity model agree on the limit.

The stream starts with the 10-byte `VSTG` header carrying the bit depth and
stride, which lets a decoder that knows nothing about the carrier find its own
parameters:

1. Try each of [`CANDIDATES`] in order, reading just the first 80 bits, and
   take the first one whose magic tag matches. The header then supplies the
   real bit depth, stride and length.
2. Otherwise, if the caller named both parameters, check for the tag once more
   with exactly those.
3. Otherwise read the carrier as legacy framing: a bare 4-byte length, with the
   caller's parameters or (1, 1).
*/

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, warn};

use super::lsb::{embed_samples, extract_samples};
use super::{check_payload, ensure_fits, Codec, Embedding};
use crate::bits;
use crate::capacity;
use crate::header::{
    self, StandardHeader, VideoHeader, STANDARD_HEADER_BITS, STANDARD_HEADER_LEN,
    VIDEO_HEADER_BITS, VIDEO_HEADER_LEN,
};
use crate::params::{BitDepth, FrameStride, VideoHeaderFormat, VideoHint};
use crate::{HeaderFault, Result, StegoError};

/// (bit depth, stride) pairs tried by auto-detection, first match wins.
pub const CANDIDATES: [(u8, u8); 6] = [(1, 1), (2, 1), (3, 1), (4, 1), (1, 2), (2, 2)];

/// Display time of one frame, `num / den` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameDelay {
    pub num: u16,
    pub den: u16,
}

impl FrameDelay {
    pub fn fps(self) -> f64 {
        if self.num == 0 {
            return 0.0;
        }
        self.den.max(1) as f64 / self.num as f64
    }
}

impl Default for FrameDelay {
    fn default() -> Self {
        // 25 fps
        Self { num: 1, den: 25 }
    }
}

/// Decoded frames sharing one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<RgbImage>,
    pub delay: FrameDelay,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbImage>, delay: FrameDelay) -> Result<Self> {
        if let Some(first) = frames.first() {
            let dimensions = first.dimensions();
            if let Some(odd) = frames.iter().find(|f| f.dimensions() != dimensions) {
                return Err(StegoError::UnsupportedContainer(format!(
                    "frames must share one resolution: {:?} vs {:?}",
                    dimensions,
                    odd.dimensions()
                )));
            }
        }
        Ok(Self { frames, delay })
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames.first().map_or((0, 0), RgbImage::dimensions)
    }
}

/// Result of a video embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoEmbedding {
    pub embedding: Embedding,
    pub frames_modified: usize,
}

/// LSB substitution over a strided subsequence of frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoFrameCodec {
    bit_depth: BitDepth,
    stride: FrameStride,
    header: VideoHeaderFormat,
}

impl VideoFrameCodec {
    pub fn new(bit_depth: BitDepth, stride: FrameStride, header: VideoHeaderFormat) -> Self {
        Self {
            bit_depth,
            stride,
            header,
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn stride(&self) -> FrameStride {
        self.stride
    }

    /// Frames the codec may touch, in order.
    fn used_frames(&self, count: usize) -> impl Iterator<Item = usize> {
        let stride = self.stride.get() as usize;
        (0..count).step_by(stride).take(count / stride)
    }

    /// Write `stream` across the used frames; returns how many frames changed.
    fn write_stream(&self, carrier: &mut FrameSequence, stream: &[bool]) -> usize {
        let mut written = 0;
        let mut modified = 0;
        for index in self.used_frames(carrier.len()) {
            if written >= stream.len() {
                break;
            }
            let samples: &mut [u8] = &mut carrier.frames[index];
            written += embed_samples(samples, &stream[written..], self.bit_depth);
            modified += 1;
        }
        modified
    }

    /// Embed `payload` behind the header format this codec was built with.
    pub fn embed(&self, carrier: &mut FrameSequence, payload: &[u8]) -> Result<VideoEmbedding> {
        let length = check_payload(payload)?;
        let capacity = self.capacity(carrier)?;
        let header_len = self.header.header_len();
        ensure_fits(payload.len(), header_len, capacity)?;

        let mut stream = match self.header {
            VideoHeaderFormat::SelfDescribing => {
                VideoHeader::new(self.bit_depth, self.stride, length).to_bits()
            }
            VideoHeaderFormat::Legacy => StandardHeader::new(length).to_bits(),
        };
        stream.extend(bits::iter_bits(payload));

        let frames_modified = self.write_stream(carrier, &stream);
        debug!(
            "video: embedded {} bytes over {} frames (bit depth {}, stride {})",
            payload.len(),
            frames_modified,
            self.bit_depth.get(),
            self.stride.get()
        );

        Ok(VideoEmbedding {
            embedding: Embedding {
                payload_size: payload.len(),
                header_len,
                capacity_bytes: capacity,
            },
            frames_modified,
        })
    }
}

impl Codec for VideoFrameCodec {
    type Carrier = FrameSequence;

    fn name(&self) -> &'static str {
        "video"
    }

    fn capacity(&self, carrier: &FrameSequence) -> Result<usize> {
        let (width, height) = carrier.dimensions();
        Ok(capacity::video(
            width,
            height,
            carrier.len(),
            self.bit_depth,
            self.stride,
        ))
    }

    fn embed_bits(&self, carrier: &mut FrameSequence, stream: &[bool]) -> Result<()> {
        let available = self.capacity(carrier)? * 8;
        if stream.len() > available {
            return Err(StegoError::CapacityExceeded {
                required: stream.len().div_ceil(8),
                available: available / 8,
            });
        }
        self.write_stream(carrier, stream);
        Ok(())
    }

    fn extract_bits(&self, carrier: &FrameSequence, count: usize) -> Result<Vec<bool>> {
        let mut out = Vec::with_capacity(count);
        for index in self.used_frames(carrier.len()) {
            if out.len() >= count {
                break;
            }
            extract_samples(&carrier.frames[index], self.bit_depth, count, &mut out);
        }
        out.truncate(count);
        Ok(out)
    }
}

/// Parameters a decode settled on, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A `VSTG` header was found.
    Header(VideoHeader),
    /// No header; bare length framing with these parameters.
    Legacy { bit_depth: BitDepth, stride: FrameStride },
}

/// Read the self-describing header under the given parameters, if there is one.
fn probe(carrier: &FrameSequence, bit_depth: BitDepth, stride: FrameStride) -> Option<VideoHeader> {
    let codec = VideoFrameCodec::new(bit_depth, stride, VideoHeaderFormat::SelfDescribing);
    let stream = codec.extract_bits(carrier, VIDEO_HEADER_BITS).ok()?;
    match VideoHeader::from_bits(&stream) {
        Ok(header) => Some(header),
        Err(err) => {
            debug!(
                "video: no header at bit depth {}, stride {}: {}",
                bit_depth.get(),
                stride.get(),
                err
            );
            None
        }
    }
}

/// Walk the candidate list and return the first header whose magic matches.
pub fn detect(carrier: &FrameSequence) -> Result<Option<VideoHeader>> {
    for (bit_depth, stride) in CANDIDATES {
        let found = probe(carrier, BitDepth::new(bit_depth)?, FrameStride::new(stride)?);
        if let Some(header) = found {
            debug!(
                "video: detected header with candidate ({}, {}): bit depth {}, stride {}",
                bit_depth,
                stride,
                header.bit_depth.get(),
                header.stride.get()
            );
            return Ok(Some(header));
        }
    }
    Ok(None)
}

/// Decide which parameters and framing a decode should use.
pub fn resolve(carrier: &FrameSequence, hint: &VideoHint) -> Result<Resolution> {
    if hint.auto_detect {
        if let Some(header) = detect(carrier)? {
            return Ok(Resolution::Header(header));
        }
        debug!("video: auto-detection found no header");
    }

    if let (Some(bit_depth), Some(stride)) = (hint.bit_depth, hint.stride) {
        if let Some(header) = probe(carrier, bit_depth, stride) {
            return Ok(Resolution::Header(header));
        }
    }

    let bit_depth = hint.bit_depth.unwrap_or_default();
    let stride = hint.stride.unwrap_or_default();
    warn!(
        "video: no parameter header, reading legacy framing with bit depth {}, stride {}",
        bit_depth.get(),
        stride.get()
    );
    Ok(Resolution::Legacy { bit_depth, stride })
}

/// Recover the payload from a frame sequence.
pub fn extract(carrier: &FrameSequence, hint: &VideoHint, ceiling: usize) -> Result<Vec<u8>> {
    let (codec, header_len, announced) = match resolve(carrier, hint)? {
        Resolution::Header(header) => (
            VideoFrameCodec::new(header.bit_depth, header.stride, VideoHeaderFormat::SelfDescribing),
            VIDEO_HEADER_LEN,
            Some(header.length),
        ),
        Resolution::Legacy { bit_depth, stride } => (
            VideoFrameCodec::new(bit_depth, stride, VideoHeaderFormat::Legacy),
            STANDARD_HEADER_LEN,
            None,
        ),
    };

    let capacity = codec.capacity(carrier)?;
    if capacity < header_len {
        return Err(StegoError::UnsupportedContainer(format!(
            "video too small to contain hidden data: {} bytes extractable, need at least {} for the header",
            capacity, header_len
        )));
    }

    let length = match announced {
        Some(length) => length,
        None => StandardHeader::from_bits(&codec.extract_bits(carrier, STANDARD_HEADER_BITS)?)?.length,
    };
    let length = header::validate_length(length, capacity, header_len, ceiling)?;

    let header_bits = header_len * 8;
    let total = header_bits + length * 8;
    let stream = codec.extract_bits(carrier, total)?;
    if stream.len() < total {
        return Err(HeaderFault::Truncated {
            needed: total,
            available: stream.len(),
        }
        .into());
    }
    bits::unpack(&stream[header_bits..total])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::SANITY_CEILING;
    use image::Rgb;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn noise_frames(width: u32, height: u32, count: usize, seed: u64) -> FrameSequence {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let frames = (0..count)
            .map(|_| RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()])))
            .collect();
        FrameSequence::new(frames, FrameDelay::default()).unwrap()
    }

    fn codec(bit_depth: u8, stride: u8, header: VideoHeaderFormat) -> VideoFrameCodec {
        VideoFrameCodec::new(
            BitDepth::new(bit_depth).unwrap(),
            FrameStride::new(stride).unwrap(),
            header,
        )
    }

    #[test]
    fn test_capacity_uses_whole_strides() {
        let frames = noise_frames(10, 10, 5, 1);
        // 37 bytes per frame at depth 1, floor(5 / 2) frames
        let c = codec(1, 2, VideoHeaderFormat::SelfDescribing);
        assert_eq!(c.capacity(&frames).unwrap(), 74);
        assert_eq!(c.used_frames(5).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_auto_detect_depth_three_stride_two() {
        crate::init_test_tracing();
        let mut frames = noise_frames(16, 16, 6, 2);
        let payload: Vec<u8> = (0..200).map(|i| (i * 7) as u8).collect();
        let embedding = codec(3, 2, VideoHeaderFormat::SelfDescribing)
            .embed(&mut frames, &payload)
            .unwrap();
        // 288 bytes per frame, 210 bytes of stream
        assert_eq!(embedding.frames_modified, 1);

        let header = detect(&frames).unwrap().unwrap();
        assert_eq!(header.bit_depth.get(), 3);
        assert_eq!(header.stride.get(), 2);
        assert_eq!(
            extract(&frames, &VideoHint::default(), SANITY_CEILING).unwrap(),
            payload
        );
    }

    #[test]
    fn test_stream_spans_frames_and_skips_unused() {
        let original = noise_frames(8, 8, 4, 3);
        let mut frames = original.clone();
        // 24 bytes per frame at depth 1; 40 bytes of stream needs two used frames
        let embedding = codec(1, 2, VideoHeaderFormat::SelfDescribing)
            .embed(&mut frames, &[0x42; 30])
            .unwrap();
        assert_eq!(embedding.frames_modified, 2);
        assert_eq!(frames.frames()[1], original.frames()[1]);
        assert_eq!(frames.frames()[3], original.frames()[3]);
        assert_ne!(frames.frames()[2], original.frames()[2]);

        assert_eq!(
            extract(&frames, &VideoHint::default(), SANITY_CEILING).unwrap(),
            vec![0x42; 30]
        );
    }

    #[test]
    fn test_legacy_with_explicit_parameters() {
        let mut frames = noise_frames(12, 12, 2, 4);
        codec(1, 1, VideoHeaderFormat::Legacy)
            .embed(&mut frames, b"legacy framing")
            .unwrap();

        let hint = VideoHint::explicit(BitDepth::new(1).unwrap(), FrameStride::new(1).unwrap());
        assert!(matches!(
            resolve(&frames, &hint).unwrap(),
            Resolution::Legacy { .. }
        ));
        assert_eq!(extract(&frames, &hint, SANITY_CEILING).unwrap(), b"legacy framing");
    }

    #[test]
    fn test_explicit_parameters_still_find_header() {
        let mut frames = noise_frames(12, 12, 6, 5);
        codec(4, 3, VideoHeaderFormat::SelfDescribing)
            .embed(&mut frames, b"not a candidate pair")
            .unwrap();

        let hint = VideoHint::explicit(BitDepth::new(4).unwrap(), FrameStride::new(3).unwrap());
        assert!(matches!(
            resolve(&frames, &hint).unwrap(),
            Resolution::Header(_)
        ));
        assert_eq!(
            extract(&frames, &hint, SANITY_CEILING).unwrap(),
            b"not a candidate pair"
        );
    }

    #[test]
    fn test_unencoded_video_is_rejected() {
        let frames = FrameSequence::new(
            vec![RgbImage::from_pixel(16, 16, Rgb([10, 20, 30])); 3],
            FrameDelay::default(),
        )
        .unwrap();
        assert!(matches!(
            extract(&frames, &VideoHint::default(), SANITY_CEILING),
            Err(StegoError::CorruptOrMismatchedHeader(_))
        ));
    }

    #[test]
    fn test_capacity_boundary() {
        let frames = noise_frames(4, 4, 2, 6);
        let c = codec(2, 1, VideoHeaderFormat::SelfDescribing);
        // 12 bytes per frame
        assert_eq!(c.capacity(&frames).unwrap(), 24);
        assert!(c.embed(&mut frames.clone(), &[1; 14]).is_ok());
        assert!(matches!(
            c.embed(&mut frames.clone(), &[1; 15]),
            Err(StegoError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_mixed_resolutions_are_rejected() {
        let frames = vec![RgbImage::new(4, 4), RgbImage::new(4, 5)];
        assert!(matches!(
            FrameSequence::new(frames, FrameDelay::default()),
            Err(StegoError::UnsupportedContainer(_))
        ));
    }
}
