//! Hardware-proxy signer.
//!
//! Forwards derivation and signing to an injected [`Device`] and validates
//! everything that comes back. The proxy never holds key material.

use std::str::FromStr;
use std::sync::Arc;

use bitcoin::bip32::Xpub;
use bitcoin::NetworkKind;
use kestrel_core::display_path;
use log::{debug, warn};
use secp256k1::ecdsa::Signature;

use crate::anti_exfil::{host_commitment, parse_signer_commitment, verify_nonce_binding};
use crate::device::{Device, DeviceRequest, DeviceResponse};
use crate::error::SignerError;

pub(crate) struct HardwareSigner {
    device: Arc<dyn Device>,
    network: NetworkKind,
}

impl HardwareSigner {
    pub(crate) fn new(device: Arc<dyn Device>, network: NetworkKind) -> Self {
        Self { device, network }
    }

    fn call(&self, request: DeviceRequest) -> Result<DeviceResponse, SignerError> {
        debug!(
            "device request {:?} at {}",
            request.kind,
            display_path(&request.path)
        );
        self.device.request(&request).map_err(|e| {
            warn!("device request {:?} failed: {}", request.kind, e);
            SignerError::Device(e)
        })
    }

    pub(crate) fn get_xpub(&self, path: &[u32]) -> Result<Xpub, SignerError> {
        let encoded = match self.call(DeviceRequest::get_xpub(path))? {
            DeviceResponse::Xpub(encoded) => encoded,
            other => return Err(unexpected("xpub", &other)),
        };
        let xpub = Xpub::from_str(encoded.trim())
            .map_err(|e| protocol_violation(format!("unparseable xpub: {}", e)))?;
        if xpub.network != self.network {
            return Err(protocol_violation(
                "device returned an xpub for a different network".into(),
            ));
        }
        Ok(xpub)
    }

    /// Plain ECDSA request. `require_low_r` is set when the device
    /// advertises low-R grinding.
    pub(crate) fn sign_vanilla(
        &self,
        path: &[u32],
        hash: &[u8; 32],
        require_low_r: bool,
    ) -> Result<Signature, SignerError> {
        let signature = match self.call(DeviceRequest::sign_hash(path, hash))? {
            DeviceResponse::Signature(bytes) => parse_signature(&bytes)?,
            other => return Err(unexpected("signature", &other)),
        };
        if require_low_r && signature.serialize_compact()[0] >= 0x80 {
            return Err(protocol_violation(
                "high-R signature from a low-R device".into(),
            ));
        }
        Ok(signature)
    }

    /// Two-round Anti-Exfil exchange; see [`crate::anti_exfil`].
    pub(crate) fn sign_anti_exfil(
        &self,
        path: &[u32],
        hash: &[u8; 32],
        host_entropy: &[u8; 32],
    ) -> Result<Signature, SignerError> {
        let commitment = host_commitment(host_entropy);
        let signer_commitment = match self.call(DeviceRequest::ae_commit(path, hash, &commitment))? {
            DeviceResponse::SignerCommitment(bytes) => parse_signer_commitment(&bytes)?,
            other => return Err(unexpected("signer_commitment", &other)),
        };

        let signature = match self.call(DeviceRequest::ae_sign(path, hash, host_entropy))? {
            DeviceResponse::Signature(bytes) => parse_signature(&bytes)?,
            other => return Err(unexpected("signature", &other)),
        };

        verify_nonce_binding(&signer_commitment, host_entropy, &signature).inspect_err(|_| {
            warn!("Anti-Exfil nonce check failed at {}", display_path(path));
        })?;
        Ok(signature)
    }
}

/// Accept 64-byte compact or DER, and normalize to low-S.
fn parse_signature(bytes: &[u8]) -> Result<Signature, SignerError> {
    let parsed = if bytes.len() == 64 {
        Signature::from_compact(bytes)
    } else {
        Signature::from_der(bytes)
    };
    let mut signature =
        parsed.map_err(|e| protocol_violation(format!("malformed signature: {}", e)))?;
    signature.normalize_s();
    Ok(signature)
}

fn unexpected(expected: &str, got: &DeviceResponse) -> SignerError {
    protocol_violation(format!(
        "expected {} response, got {}",
        expected,
        got.kind_name()
    ))
}

fn protocol_violation(msg: String) -> SignerError {
    warn!("rejecting device response: {}", msg);
    SignerError::DeviceProtocol(msg)
}
