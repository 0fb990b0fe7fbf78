//! Channel to an external signing device.
//!
//! The signer formats a [`DeviceRequest`], hands it to an injected [`Device`]
//! and checks the shape of the [`DeviceResponse`]. How the request reaches
//! the physical device (USB, BLE, QR, a UI prompt) is the implementor's
//! concern. Requests serialize to JSON with a `kind` tag so a transport can
//! ship them as-is.
//!
//! # Example
//! ```ignore
//! struct UsbDevice { /* ... */ }
//!
//! impl Device for UsbDevice {
//!     fn request(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
//!         let json = serde_json::to_string(request).map_err(|e| DeviceError::Transport(e.to_string()))?;
//!         let reply = self.roundtrip(&json)?;
//!         serde_json::from_str(&reply).map_err(|e| DeviceError::Protocol(e.to_string()))
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation requested from the device.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Derive the extended public key at `path`
    GetXpub,
    /// Vanilla ECDSA over a 32-byte hash; payload = hash
    SignHash,
    /// Anti-Exfil round 1; payload = hash || host commitment
    AeCommit,
    /// Anti-Exfil round 2; payload = hash || host entropy
    AeSign,
}

/// A single request to the device. The signer issues at most one at a time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeviceRequest {
    pub kind: RequestKind,
    pub path: Vec<u32>,
    #[serde(default, with = "hex_payload")]
    pub payload: Option<Vec<u8>>,
}

impl DeviceRequest {
    pub fn get_xpub(path: &[u32]) -> Self {
        Self {
            kind: RequestKind::GetXpub,
            path: path.to_vec(),
            payload: None,
        }
    }

    pub fn sign_hash(path: &[u32], hash: &[u8; 32]) -> Self {
        Self {
            kind: RequestKind::SignHash,
            path: path.to_vec(),
            payload: Some(hash.to_vec()),
        }
    }

    pub fn ae_commit(path: &[u32], hash: &[u8; 32], host_commitment: &[u8; 32]) -> Self {
        Self {
            kind: RequestKind::AeCommit,
            path: path.to_vec(),
            payload: Some([&hash[..], &host_commitment[..]].concat()),
        }
    }

    pub fn ae_sign(path: &[u32], hash: &[u8; 32], host_entropy: &[u8; 32]) -> Self {
        Self {
            kind: RequestKind::AeSign,
            path: path.to_vec(),
            payload: Some([&hash[..], &host_entropy[..]].concat()),
        }
    }
}

/// What the device sent back.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DeviceResponse {
    /// Base58check serialized extended public key
    Xpub(String),
    /// ECDSA signature, 64-byte compact or DER
    Signature(#[serde(with = "hex::serde")] Vec<u8>),
    /// Anti-Exfil signer commitment, a 33-byte compressed point
    SignerCommitment(#[serde(with = "hex::serde")] Vec<u8>),
}

impl DeviceResponse {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Xpub(_) => "xpub",
            Self::Signature(_) => "signature",
            Self::SignerCommitment(_) => "signer_commitment",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("device timed out")]
    Timeout,
    #[error("request rejected on device: {0}")]
    Rejected(String),
    #[error("malformed device reply: {0}")]
    Protocol(String),
}

/// Synchronous request/response channel to a signing device.
///
/// Calls may block for as long as the user takes to confirm on the device.
/// Implementations serialize their own requests; the signer neither retries
/// nor cancels.
pub trait Device: Send + Sync {
    fn request(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError>;
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(payload: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match payload {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
