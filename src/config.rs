//! Engine configuration and parameter presets.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::DEFAULT_KDF_ROUNDS;
use crate::header::SANITY_CEILING;
use crate::params::{BitDepth, Domain, DomainParams, FrameStride, Strength, VideoHeaderFormat, Wavelet};
use crate::{Result, StegoError};

pub const ENV_MAX_PAYLOAD_MB: &str = "CHROMACLOAK_MAX_PAYLOAD_MB";
pub const ENV_KDF_ROUNDS: &str = "CHROMACLOAK_KDF_ROUNDS";

const MIB: usize = 1024 * 1024;

/// Limits and tuning shared by every operation of a [`crate::Steganographer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoConfig {
    /// Largest payload (after framing) an encode accepts.
    pub max_payload_bytes: usize,
    pub kdf_rounds: u32,
    /// Decoded lengths above this are rejected without reading further.
    pub sanity_ceiling_bytes: usize,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 10 * MIB,
            kdf_rounds: DEFAULT_KDF_ROUNDS,
            sanity_ceiling_bytes: SANITY_CEILING,
        }
    }
}

impl StegoConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StegoError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StegoError::invalid("config", format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `CHROMACLOAK_MAX_PAYLOAD_MB` and `CHROMACLOAK_KDF_ROUNDS` when set.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(ENV_MAX_PAYLOAD_MB) {
            let mb: usize = value.trim().parse().map_err(|_| {
                StegoError::invalid("max_payload_bytes", format!("{} is not a number: {}", ENV_MAX_PAYLOAD_MB, value))
            })?;
            self.max_payload_bytes = mb * MIB;
        }
        if let Some(value) = lookup(ENV_KDF_ROUNDS) {
            self.kdf_rounds = value.trim().parse().map_err(|_| {
                StegoError::invalid("kdf_rounds", format!("{} is not a number: {}", ENV_KDF_ROUNDS, value))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_payload_bytes == 0 {
            return Err(StegoError::invalid("max_payload_bytes", "must be greater than 0"));
        }
        if self.kdf_rounds == 0 {
            return Err(StegoError::invalid("kdf_rounds", "must be at least 1"));
        }
        if self.sanity_ceiling_bytes == 0 {
            return Err(StegoError::invalid("sanity_ceiling_bytes", "must be greater than 0"));
        }
        Ok(())
    }
}

/// Named parameter presets trading capacity for imperceptibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Stealth,
    #[default]
    Balanced,
    Capacity,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Stealth, Profile::Balanced, Profile::Capacity];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Stealth => "stealth",
            Profile::Balanced => "balanced",
            Profile::Capacity => "capacity",
        }
    }

    /// Concrete parameters this preset uses for `domain`.
    pub fn params(self, domain: Domain) -> Result<DomainParams> {
        let (bit_depth, dct, dwt, wavelet, stride) = match self {
            Profile::Stealth => (1, 5.0, 0.05, Wavelet::Haar, 2),
            Profile::Balanced => (2, 10.0, 0.1, Wavelet::Haar, 1),
            Profile::Capacity => (4, 20.0, 0.2, Wavelet::Db1, 1),
        };
        let bit_depth = BitDepth::new(bit_depth)?;
        Ok(match domain {
            Domain::Lsb => DomainParams::Lsb { bit_depth },
            Domain::Dct => DomainParams::Dct {
                strength: Strength::dct(dct)?,
            },
            Domain::Dwt => DomainParams::Dwt {
                wavelet,
                strength: Strength::dwt(dwt)?,
            },
            Domain::Audio => DomainParams::Audio { bit_depth },
            Domain::Video => DomainParams::Video {
                bit_depth,
                stride: FrameStride::new(stride)?,
                header: VideoHeaderFormat::SelfDescribing,
            },
        })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Profile::ALL
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| StegoError::invalid("profile", format!("unknown profile `{}`", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StegoConfig::default();
        assert_eq!(config.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.kdf_rounds, 100_000);
        assert_eq!(config.sanity_ceiling_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: StegoConfig = serde_json::from_str(r#"{"kdf_rounds": 2000}"#).unwrap();
        assert_eq!(config.kdf_rounds, 2000);
        assert_eq!(config.max_payload_bytes, StegoConfig::default().max_payload_bytes);
    }

    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir().join(format!("chromacloak-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_payload_bytes": 4096}"#).unwrap();
        let config = StegoConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.max_payload_bytes, 4096);

        assert!(matches!(
            StegoConfig::from_json_file(&path),
            Err(StegoError::NotFound(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ENV_MAX_PAYLOAD_MB, "2"), (ENV_KDF_ROUNDS, " 500 ")].into();
        let config = StegoConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_payload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.kdf_rounds, 500);

        let bad = StegoConfig::default().with_overrides(|name| {
            (name == ENV_KDF_ROUNDS).then(|| "lots".to_string())
        });
        assert!(matches!(bad, Err(StegoError::InvalidParameter { name: "kdf_rounds", .. })));
    }

    #[test]
    fn test_profiles() {
        assert_eq!(
            Profile::Stealth.params(Domain::Video).unwrap(),
            DomainParams::video(1, 2).unwrap()
        );
        assert_eq!(
            Profile::Capacity.params(Domain::Dwt).unwrap(),
            DomainParams::dwt("db1", 0.2).unwrap()
        );
        assert_eq!(
            Profile::Balanced.params(Domain::Lsb).unwrap(),
            DomainParams::lsb(2).unwrap()
        );
        assert_eq!("STEALTH".parse::<Profile>().unwrap(), Profile::Stealth);
        assert!("loud".parse::<Profile>().is_err());
    }
}
