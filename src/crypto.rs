//! Passphrase encryption for payloads: AES-256-CBC with PKCS#7 padding, key from
//! PBKDF2-HMAC-SHA256.
//!
//! The KDF salt is a fixed constant shared by every call, so two payloads sealed
//! with the same passphrase use the same key. Only the IV is fresh per call.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

use crate::{CryptoFault, Result, StegoError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;

pub const MIN_PASSPHRASE_CHARS: usize = 8;
pub const MAX_PASSPHRASE_CHARS: usize = 1000;

/// Static KDF salt.
pub const KDF_SALT: &[u8] = b"SteganoGen2024";
pub const DEFAULT_KDF_ROUNDS: u32 = 100_000;

/// Output of one encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// A validated passphrase and the key derived from it.
pub struct PayloadCipher {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}

pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    let chars = passphrase.chars().count();
    if chars == 0 {
        return Err(StegoError::invalid("passphrase", "cannot be empty"));
    }
    if chars < MIN_PASSPHRASE_CHARS {
        return Err(StegoError::invalid(
            "passphrase",
            format!(
                "too weak: need at least {} characters, got {}",
                MIN_PASSPHRASE_CHARS, chars
            ),
        ));
    }
    if chars > MAX_PASSPHRASE_CHARS {
        return Err(StegoError::invalid(
            "passphrase",
            format!("at most {} characters, got {}", MAX_PASSPHRASE_CHARS, chars),
        ));
    }
    Ok(())
}

impl PayloadCipher {
    pub fn new(passphrase: &str, rounds: u32) -> Result<Self> {
        validate_passphrase(passphrase)?;
        if rounds == 0 {
            return Err(StegoError::invalid("kdf_rounds", "must be at least 1"));
        }
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), KDF_SALT, rounds, &mut key);
        debug!("derived payload key with {} PBKDF2 rounds", rounds);
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Sealed> {
        if plaintext.is_empty() {
            return Err(CryptoFault::EmptyInput.into());
        }
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let ciphertext =
            Aes256CbcEnc::new(&self.key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(Sealed { iv, ciphertext })
    }

    /// Padding failure means a wrong passphrase or damaged ciphertext.
    pub fn decrypt(&self, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(CryptoFault::EmptyInput.into());
        }
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| {
            CryptoFault::MalformedTag(format!("IV must be {} bytes, got {}", IV_LEN, iv.len()))
        })?;
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoFault::MalformedTag(format!(
                "ciphertext length {} is not a multiple of {}",
                ciphertext.len(),
                BLOCK_LEN
            ))
            .into());
        }
        Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoFault::BadPadding.into())
    }
}
