//! Mnemonic encryption at rest
//!
//! A software signer built with a password keeps only this form of its
//! phrase. The key is stretched from the password with Argon2id and the
//! phrase is sealed with AES-256-GCM, so a wrong password surfaces as an
//! authentication failure rather than a garbled phrase.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Argon2id cost: 64 MiB, 3 passes, 4 lanes.
const KDF_MEMORY_KIB: u32 = 64 * 1024;
const KDF_PASSES: u32 = 3;
const KDF_LANES: u32 = 4;
const KEY_LEN: usize = 32;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: invalid password or corrupted data")]
    DecryptionFailed,
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
    #[error("Invalid ciphertext format")]
    InvalidFormat,
}

/// A sealed mnemonic phrase.
///
/// Serialized as `salt || nonce || ciphertext`, where the ciphertext carries
/// the 16-byte GCM tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedMnemonic {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedMnemonic {
    pub fn to_bytes(&self) -> Vec<u8> {
        [&self.salt[..], &self.nonce[..], &self.ciphertext[..]].concat()
    }

    /// Split a serialized blob. Anything too short to hold a header, a tag
    /// and one byte of phrase is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() <= HEADER_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }
        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        Ok(Self {
            salt: salt.try_into().map_err(|_| CryptoError::InvalidFormat)?,
            nonce: nonce.try_into().map_err(|_| CryptoError::InvalidFormat)?,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Build the AES-256-GCM cipher keyed by `password` stretched over `salt`.
/// The stretched key is scrubbed once the cipher holds it.
fn phrase_cipher(password: &str, salt: &[u8; SALT_LEN]) -> Result<Aes256Gcm, CryptoError> {
    let params = Params::new(KDF_MEMORY_KIB, KDF_PASSES, KDF_LANES, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))
}

/// Seal `mnemonic` under `password`.
///
/// Salt and nonce are drawn fresh on every call, so sealing the same phrase
/// twice yields different blobs.
pub fn encrypt_mnemonic(mnemonic: &str, password: &str) -> Result<EncryptedMnemonic, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = phrase_cipher(password, &salt)?
        .encrypt(Nonce::from_slice(&nonce), mnemonic.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    Ok(EncryptedMnemonic {
        salt,
        nonce,
        ciphertext,
    })
}

/// Open a sealed phrase.
///
/// # Errors
/// [`CryptoError::DecryptionFailed`] when the password is wrong or any byte
/// of the blob was altered.
pub fn decrypt_mnemonic(
    encrypted: &EncryptedMnemonic,
    password: &str,
) -> Result<Zeroizing<String>, CryptoError> {
    let plaintext = phrase_cipher(password, &encrypted.salt)?
        .decrypt(Nonce::from_slice(&encrypted.nonce), &encrypted.ciphertext[..])
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let phrase = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidFormat)?;
    Ok(Zeroizing::new(phrase.to_owned()))
}
