use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chromacloak::engine::read_input;
use chromacloak::{
    BitDepth, Domain, DomainParams, FrameStride, Profile, StegoConfig, Steganographer, Strength,
    VideoHeaderFormat, VideoHint, Wavelet,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ParamArgs {
    /// Embedding domain: lsb, dct, dwt, audio or video
    #[arg(short, long)]
    domain: Domain,

    /// Preset for any parameter not given explicitly: stealth, balanced or capacity
    #[arg(short, long)]
    profile: Option<Profile>,

    /// Low bits per channel or sample (1-4)
    #[arg(short, long)]
    bits: Option<u8>,

    /// Embedding strength (dct 1-100, dwt 0.01-10)
    #[arg(short, long)]
    strength: Option<f64>,

    /// Wavelet family for dwt: haar, db1, db2, db3, sym2
    #[arg(short, long)]
    wavelet: Option<String>,

    /// Use every k-th video frame
    #[arg(long)]
    stride: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a payload in a carrier
    Encode {
        /// Carrier file (image, WAV or APNG)
        #[arg(short, long)]
        carrier: PathBuf,

        /// File holding the payload
        #[arg(long, conflicts_with = "message")]
        payload: Option<PathBuf>,

        /// Inline text payload
        #[arg(short, long)]
        message: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Passphrase to encrypt the payload with
        #[arg(short, long)]
        key: Option<String>,

        /// Write the video header without parameters (4-byte length only)
        #[arg(long)]
        legacy_header: bool,

        /// Print the encode report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Recover a payload from a stego file
    Decode {
        /// Stego file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Passphrase if the payload was encrypted
        #[arg(short, long)]
        key: Option<String>,

        /// Video only: trust the given parameters instead of searching for the header
        #[arg(long)]
        no_auto_detect: bool,
    },

    /// Show how many bytes a carrier can hold
    Capacity {
        /// Carrier file
        #[arg(short, long)]
        carrier: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },
}

impl ParamArgs {
    fn resolve(&self, legacy_header: bool) -> anyhow::Result<DomainParams> {
        let base = match self.profile {
            Some(profile) => profile.params(self.domain)?,
            None => DomainParams::default_for(self.domain),
        };
        let bits = self.bits.map(BitDepth::new).transpose()?;

        let params = match base {
            DomainParams::Lsb { bit_depth } => DomainParams::Lsb {
                bit_depth: bits.unwrap_or(bit_depth),
            },
            DomainParams::Audio { bit_depth } => DomainParams::Audio {
                bit_depth: bits.unwrap_or(bit_depth),
            },
            DomainParams::Dct { strength } => DomainParams::Dct {
                strength: self.strength.map(Strength::dct).transpose()?.unwrap_or(strength),
            },
            DomainParams::Dwt { wavelet, strength } => DomainParams::Dwt {
                wavelet: self.wavelet.as_deref().map(str::parse::<Wavelet>).transpose()?.unwrap_or(wavelet),
                strength: self.strength.map(Strength::dwt).transpose()?.unwrap_or(strength),
            },
            DomainParams::Video {
                bit_depth, stride, ..
            } => DomainParams::Video {
                bit_depth: bits.unwrap_or(bit_depth),
                stride: self.stride.map(FrameStride::new).transpose()?.unwrap_or(stride),
                header: if legacy_header {
                    VideoHeaderFormat::Legacy
                } else {
                    VideoHeaderFormat::SelfDescribing
                },
            },
        };
        Ok(params)
    }

    /// Decoder-side video hint: only what the user actually typed.
    fn video_hint(&self, auto_detect: bool) -> anyhow::Result<VideoHint> {
        Ok(VideoHint {
            bit_depth: self.bits.map(BitDepth::new).transpose()?,
            stride: self.stride.map(FrameStride::new).transpose()?,
            auto_detect,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = match &cli.config {
        Some(path) => StegoConfig::from_json_file(path)?,
        None => StegoConfig::default(),
    }
    .with_env_overrides()?;
    let engine = Steganographer::new(config);

    match cli.command {
        Commands::Encode {
            carrier,
            payload,
            message,
            output,
            params,
            key,
            legacy_header,
            report,
        } => {
            let raw = match (payload, message) {
                (Some(path), _) => read_input(&path)?,
                (None, Some(text)) => text.into_bytes(),
                (None, None) => bail!("either --payload or --message is required"),
            };
            let params = params.resolve(legacy_header)?;
            let framed = engine.seal(&raw, key.as_deref())?;

            let result = engine
                .encode_file(&carrier, &framed, &params, &output)
                .with_context(|| format!("encoding into {}", carrier.display()))?;
            info!(
                "Hid {} bytes in {:?} using {} ({:.2}% of capacity)",
                raw.len(),
                output,
                result.domain,
                result.capacity_used
            );
            if report {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }

        Commands::Decode {
            input,
            output,
            params,
            key,
            no_auto_detect,
        } => {
            let extracted = if params.domain == Domain::Video {
                let stego = read_input(&input)?;
                engine.decode_video(&stego, params.video_hint(!no_auto_detect)?)?
            } else {
                engine.decode_file(&input, &params.resolve(false)?)?
            };
            let opened = engine.open(&extracted, key.as_deref())?;

            fs::write(&output, &opened.payload)?;
            info!(
                "Recovered {} bytes to {:?} (encrypted: {})",
                opened.payload.len(),
                output,
                opened.encrypted
            );
        }

        Commands::Capacity { carrier, params } => {
            let params = params.resolve(false)?;
            let info = engine.capacity(&read_input(&carrier)?, &params)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
