//! Host side of the Anti-Exfil (sign-to-contract) ECDSA protocol.
//!
//! ```text
//! Host                                             Device
//!   │  ── AeCommit { hash, H_data(entropy) } ────►  │  picks nonce k0
//!   │  ◄─ SignerCommitment { R0 = k0·G } ────────── │
//!   │  ── AeSign { hash, entropy } ──────────────►  │  k = k0 + H_point(R0 || entropy)
//!   │  ◄─ Signature { r, s } ─────────────────────  │
//! ```
//!
//! The device commits to its nonce before it learns the host entropy, so it
//! cannot bias the final nonce to leak key bits. The host accepts the
//! signature only if `r` is the x-coordinate of `R0 + H_point(R0 || entropy)·G`.

use bitcoin::hashes::{sha256, Hash, HashEngine};
use rand::RngCore;
use secp256k1::{ecdsa::Signature, PublicKey, Scalar, Secp256k1};

use crate::error::SignerError;

const DATA_TAG: &str = "s2c/ecdsa/data";
const POINT_TAG: &str = "s2c/ecdsa/point";

/// BIP-340 style tagged SHA-256.
pub(crate) fn tagged_hash(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let tag_hash = sha256::Hash::hash(tag.as_bytes());
    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_byte_array());
    engine.input(tag_hash.as_byte_array());
    for part in parts {
        engine.input(part);
    }
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// Fresh 32 bytes of host entropy from the OS RNG.
pub fn generate_host_entropy() -> [u8; 32] {
    let mut entropy = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    entropy
}

/// Commitment to the host entropy sent in round 1.
pub fn host_commitment(host_entropy: &[u8; 32]) -> [u8; 32] {
    tagged_hash(DATA_TAG, &[&host_entropy[..]])
}

/// Tweak the device must add to its committed nonce.
pub fn nonce_tweak(
    signer_commitment: &PublicKey,
    host_entropy: &[u8; 32],
) -> Result<Scalar, SignerError> {
    let tweak = tagged_hash(
        POINT_TAG,
        &[&signer_commitment.serialize()[..], &host_entropy[..]],
    );
    Scalar::from_be_bytes(tweak).map_err(|_| SignerError::KeyOutOfRange)
}

/// Parse the 33-byte signer commitment returned in round 1.
pub fn parse_signer_commitment(bytes: &[u8]) -> Result<PublicKey, SignerError> {
    if bytes.len() != 33 {
        return Err(SignerError::DeviceProtocol(format!(
            "signer commitment must be 33 bytes, got {}",
            bytes.len()
        )));
    }
    PublicKey::from_slice(bytes)
        .map_err(|e| SignerError::DeviceProtocol(format!("invalid signer commitment: {}", e)))
}

/// Check that `signature` was produced with the nonce bound to `host_entropy`.
pub fn verify_nonce_binding(
    signer_commitment: &PublicKey,
    host_entropy: &[u8; 32],
    signature: &Signature,
) -> Result<(), SignerError> {
    let secp = Secp256k1::verification_only();
    let tweak = nonce_tweak(signer_commitment, host_entropy)?;
    let expected_r = signer_commitment
        .add_exp_tweak(&secp, &tweak)
        .map_err(|_| SignerError::KeyOutOfRange)?;

    let compact = signature.serialize_compact();
    if expected_r.serialize()[1..] != compact[..32] {
        return Err(SignerError::DeviceProtocol(
            "signature nonce does not match the Anti-Exfil commitment".into(),
        ));
    }
    Ok(())
}
