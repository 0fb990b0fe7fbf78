//! Signer error taxonomy.
//!
//! Every error is reported once, at the call that caused it. [`ErrorKind`]
//! groups variants so callers can decide between fixing input, switching
//! strategy, or surfacing a device problem to the user.

use bitcoin::bip32;
use kestrel_core::{CryptoError, KeyError, SeedError};
use thiserror::Error;

use crate::device::DeviceError;

/// Broad classification of a [`SignerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or an operation invoked in the wrong mode.
    Precondition,
    /// No private key is available to this signer.
    Authorization,
    /// The signer does not offer the requested capability.
    Capability,
    /// BIP-32 derivation failed.
    Derivation,
    /// The external device failed or answered out of protocol.
    Device,
    /// The call conflicts with the signer's current state.
    State,
}

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("hash must be 32 bytes, got {0}")]
    InvalidHashLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("master blinding key must be 32 bytes, got {0}")]
    InvalidBlindingKeyLength(usize),
    #[error("invalid mnemonic or extended key: {0}")]
    InvalidSecret(String),
    #[error("extended key belongs to a different network")]
    NetworkMismatch,
    #[error("operation requires a Liquid network")]
    NotLiquid,
    #[error("invalid device descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("signer holds no private key")]
    NoPrivateKey,
    #[error("watch-only signer holds no master public key")]
    NoMasterKey,

    #[error("unsupported by this signer: {0}")]
    Unsupported(String),

    #[error("key derivation failed: {0}")]
    Derivation(#[from] bip32::Error),
    #[error("derived key is out of range")]
    KeyOutOfRange,

    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("device protocol violation: {0}")]
    DeviceProtocol(String),

    #[error("master blinding key already set")]
    BlindingKeyAlreadySet,
    #[error("master blinding key not available")]
    MissingBlindingKey,
    #[error("invalid password for encrypted mnemonic")]
    InvalidPassword,
    #[error("mnemonic encryption failed: {0}")]
    Crypto(CryptoError),
}

impl SignerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHashLength(_)
            | Self::InvalidHex(_)
            | Self::InvalidBlindingKeyLength(_)
            | Self::InvalidSecret(_)
            | Self::NetworkMismatch
            | Self::NotLiquid
            | Self::InvalidDescriptor(_) => ErrorKind::Precondition,
            Self::NoPrivateKey | Self::NoMasterKey => ErrorKind::Authorization,
            Self::Unsupported(_) => ErrorKind::Capability,
            Self::Derivation(_) | Self::KeyOutOfRange => ErrorKind::Derivation,
            Self::Device(_) | Self::DeviceProtocol(_) => ErrorKind::Device,
            Self::BlindingKeyAlreadySet
            | Self::MissingBlindingKey
            | Self::InvalidPassword
            | Self::Crypto(_) => ErrorKind::State,
        }
    }
}

impl From<CryptoError> for SignerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::DecryptionFailed => Self::InvalidPassword,
            other => Self::Crypto(other),
        }
    }
}

impl From<KeyError> for SignerError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::DerivationFailed(inner) => Self::Derivation(inner),
        }
    }
}

impl From<SeedError> for SignerError {
    fn from(e: SeedError) -> Self {
        Self::InvalidSecret(e.to_string())
    }
}
