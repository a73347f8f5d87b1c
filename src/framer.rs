//! Application-level payload tag.
//!
//! Before a payload reaches a codec it is prefixed with an ASCII record:
//!
//! ```text
//! STEGANO|True|<iv as 32 hex digits>|<ciphertext>
//! STEGANO|False||<plaintext>
//! ```
//!
//! Data extracted without a leading `STEGANO` record is returned as-is.

use tracing::debug;

use crate::crypto::PayloadCipher;
use crate::{CryptoFault, Result};

pub const TAG_MARKER: &[u8] = b"STEGANO";
const SEPARATOR: u8 = b'|';

/// A payload after unwrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub payload: Vec<u8>,
    pub encrypted: bool,
    /// False when the extracted bytes carried no tag at all.
    pub tagged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PayloadFramer {
    kdf_rounds: u32,
}

impl PayloadFramer {
    pub fn new(kdf_rounds: u32) -> Self {
        Self { kdf_rounds }
    }

    /// Tag `payload`, encrypting it first when a passphrase is given.
    pub fn seal(&self, payload: &[u8], passphrase: Option<&str>) -> Result<Vec<u8>> {
        let mut framed = TAG_MARKER.to_vec();
        framed.push(SEPARATOR);
        match passphrase {
            Some(passphrase) => {
                let sealed = PayloadCipher::new(passphrase, self.kdf_rounds)?.encrypt(payload)?;
                framed.extend_from_slice(b"True|");
                framed.extend_from_slice(hex::encode(&sealed.iv).as_bytes());
                framed.push(SEPARATOR);
                framed.extend_from_slice(&sealed.ciphertext);
            }
            None => {
                framed.extend_from_slice(b"False||");
                framed.extend_from_slice(payload);
            }
        }
        debug!(
            "framed {} payload bytes into {} bytes (encrypted: {})",
            payload.len(),
            framed.len(),
            passphrase.is_some()
        );
        Ok(framed)
    }

    pub fn open(&self, framed: &[u8], passphrase: Option<&str>) -> Result<Opened> {
        let mut parts = framed.splitn(4, |&b| b == SEPARATOR);
        let (Some(TAG_MARKER), Some(flag), Some(iv_hex), Some(body)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            debug!("extracted data carries no tag, returning it unchanged");
            return Ok(Opened {
                payload: framed.to_vec(),
                encrypted: false,
                tagged: false,
            });
        };

        let encrypted = match flag {
            b"True" => true,
            b"False" => false,
            other => {
                return Err(CryptoFault::MalformedTag(format!(
                    "unknown encryption flag `{}`",
                    String::from_utf8_lossy(other)
                ))
                .into())
            }
        };

        let payload = if encrypted {
            let passphrase = passphrase.ok_or(CryptoFault::MissingKey)?;
            let iv = hex::decode(iv_hex)
                .map_err(|e| CryptoFault::MalformedTag(format!("IV is not valid hex: {}", e)))?;
            PayloadCipher::new(passphrase, self.kdf_rounds)?.decrypt(&iv, body)?
        } else {
            body.to_vec()
        };

        Ok(Opened {
            payload,
            encrypted,
            tagged: true,
        })
    }
}
