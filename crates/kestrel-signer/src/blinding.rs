//! SLIP-0077 blinding key derivation for Liquid confidential outputs.
//!
//! ```text
//! root   = HMAC-SHA512(key = "Symmetric key seed", msg = seed)
//! node   = HMAC-SHA512(key = root[0..32], msg = 0x00 || "SLIP-0077")
//! master = node[32..64]
//! key(script) = HMAC-SHA256(key = master, msg = script_pubkey)
//! ```
//!
//! Blinding keys are independent of spending keys, so any signer holding the
//! master blinding key can scan confidential outputs.

use std::fmt;

use bitcoin::hashes::{sha256, sha512, Hash, HashEngine, Hmac, HmacEngine};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SignerError;

const SLIP21_DOMAIN: &[u8] = b"Symmetric key seed";
const SLIP77_LABEL: &[u8] = b"SLIP-0077";

pub const MASTER_BLINDING_KEY_LEN: usize = 32;

/// 32-byte master blinding key. Zeroized on drop; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterBlindingKey([u8; MASTER_BLINDING_KEY_LEN]);

impl MasterBlindingKey {
    pub fn from_bytes(bytes: [u8; MASTER_BLINDING_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a hex encoded key. Must decode to exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, SignerError> {
        let mut decoded = hex::decode(s.trim()).map_err(|e| SignerError::InvalidHex(e.to_string()))?;
        if decoded.len() != MASTER_BLINDING_KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(SignerError::InvalidBlindingKeyLength(len));
        }
        let mut bytes = [0u8; MASTER_BLINDING_KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    /// Derive the master blinding key from a BIP-39 seed.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut engine = HmacEngine::<sha512::Hash>::new(SLIP21_DOMAIN);
        engine.input(seed);
        let root = Hmac::from_engine(engine);

        let mut engine = HmacEngine::<sha512::Hash>::new(&root[..32]);
        engine.input(&[0u8]);
        engine.input(SLIP77_LABEL);
        let node = Hmac::<sha512::Hash>::from_engine(engine);

        let mut bytes = [0u8; MASTER_BLINDING_KEY_LEN];
        bytes.copy_from_slice(&node[32..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_BLINDING_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Private blinding key for an output script.
    pub fn blinding_key_for_script(&self, script: &[u8]) -> Result<SecretKey, SignerError> {
        let mut engine = HmacEngine::<sha256::Hash>::new(&self.0);
        engine.input(script);
        let tweak = Hmac::<sha256::Hash>::from_engine(engine);
        // Out of range only with negligible probability.
        SecretKey::from_slice(&tweak[..32]).map_err(|_| SignerError::KeyOutOfRange)
    }

    /// Compressed public blinding key for an output script.
    pub fn blinding_pubkey_for_script(&self, script: &[u8]) -> Result<PublicKey, SignerError> {
        let mut secret = self.blinding_key_for_script(script)?;
        let public = secret.public_key(&Secp256k1::signing_only());
        secret.non_secure_erase();
        Ok(public)
    }
}

impl fmt::Debug for MasterBlindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterBlindingKey(<redacted>)")
    }
}
