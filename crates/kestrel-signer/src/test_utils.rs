//! Shared test utilities for kestrel-signer tests.
//!
//! [`FakeDevice`] stands in for a hardware wallet. It either replays a
//! script of canned responses or answers from a real BIP-32 key, including
//! the device side of the Anti-Exfil exchange. Every request is logged.

use std::collections::VecDeque;
use std::sync::Mutex;

use bitcoin::bip32::{Xpriv, Xpub};
use bitcoin::NetworkKind;
use kestrel_core::{derive_master_key, derive_seed, parse_mnemonic, to_derivation_path};
use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Scalar, Secp256k1, SecretKey};

use crate::anti_exfil::{host_commitment, nonce_tweak, tagged_hash};
use crate::capability::{AeProtocolSupport, DeviceDescriptor, LiquidSupport, HARDWARE_DEVICE_TYPE};
use crate::device::{Device, DeviceError, DeviceRequest, DeviceResponse, RequestKind};

/// Standard test mnemonic (BIP-39 "abandon ... about").
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Order of the secp256k1 group minus two, big endian.
const ORDER_MINUS_TWO: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x3f,
];

/// A hardware descriptor with the given Anti-Exfil level.
pub fn hardware_descriptor(ae: AeProtocolSupport) -> DeviceDescriptor {
    DeviceDescriptor {
        name: "FakeDevice".to_string(),
        device_type: HARDWARE_DEVICE_TYPE.to_string(),
        supports_low_r: true,
        supports_arbitrary_scripts: true,
        supports_liquid: LiquidSupport::Lite,
        supports_host_unblinding: true,
        supports_ae_protocol: ae,
    }
}

/// Nonce committed in round 1 of an Anti-Exfil exchange.
struct PendingCommit {
    nonce: SecretKey,
    hash: [u8; 32],
    host_commitment: [u8; 32],
}

#[derive(Default)]
struct State {
    script: VecDeque<Result<DeviceResponse, DeviceError>>,
    log: Vec<DeviceRequest>,
    pending: Option<PendingCommit>,
}

pub struct FakeDevice {
    master: Option<Xpriv>,
    secp: Secp256k1<All>,
    state: Mutex<State>,
    ignore_host_entropy: bool,
    high_r: bool,
}

impl FakeDevice {
    /// Replays `responses` in order; fails with `Transport` once exhausted.
    pub fn scripted(responses: Vec<Result<DeviceResponse, DeviceError>>) -> Self {
        let device = Self::new(None);
        device.lock().script = responses.into();
        device
    }

    /// Answers from the master key of `mnemonic`.
    pub fn from_mnemonic(network: NetworkKind, mnemonic: &str) -> Self {
        let mnemonic = parse_mnemonic(mnemonic).unwrap();
        let seed = derive_seed(&mnemonic, "");
        Self::new(Some(derive_master_key(network, &seed[..]).unwrap()))
    }

    fn new(master: Option<Xpriv>) -> Self {
        Self {
            master,
            secp: Secp256k1::new(),
            state: Mutex::new(State::default()),
            ignore_host_entropy: false,
            high_r: false,
        }
    }

    /// Sign Anti-Exfil requests with the committed nonce, skipping the host
    /// tweak. Models a device trying to choose its own nonce.
    pub fn ignoring_host_entropy(mut self) -> Self {
        self.ignore_host_entropy = true;
        self
    }

    /// Produce high-R vanilla signatures.
    pub fn with_high_r(mut self) -> Self {
        self.high_r = true;
        self
    }

    /// Queue a canned response ahead of key-backed answers.
    pub fn push_response(&self, response: Result<DeviceResponse, DeviceError>) {
        self.lock().script.push_back(response);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.lock().log.clone()
    }

    /// Public key the device signs with at `path`.
    pub fn public_key(&self, path: &[u32]) -> PublicKey {
        self.child_key(path).public_key(&self.secp)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn child_key(&self, path: &[u32]) -> SecretKey {
        let master = self.master.as_ref().expect("scripted device has no key");
        master
            .derive_priv(&self.secp, &to_derivation_path(path))
            .unwrap()
            .private_key
    }

    fn answer(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let payload = request.payload.clone().unwrap_or_default();
        match request.kind {
            RequestKind::GetXpub => {
                let master = self.master.as_ref().expect("scripted device has no key");
                let child = master
                    .derive_priv(&self.secp, &to_derivation_path(&request.path))
                    .unwrap();
                Ok(DeviceResponse::Xpub(
                    Xpub::from_priv(&self.secp, &child).to_string(),
                ))
            }
            RequestKind::SignHash => {
                let hash = split_hash(&payload)?.0;
                let sig = self.sign_plain(&request.path, hash);
                Ok(DeviceResponse::Signature(sig.serialize_der().to_vec()))
            }
            RequestKind::AeCommit => {
                let (hash, commitment) = split_hash(&payload)?;
                let key = self.child_key(&request.path);
                let seed = tagged_hash("fake/nonce", &[&key.secret_bytes()[..], &hash[..], &commitment[..]]);
                let nonce = SecretKey::from_slice(&seed).unwrap();
                let point = nonce.public_key(&self.secp);
                self.lock().pending = Some(PendingCommit {
                    nonce,
                    hash,
                    host_commitment: commitment,
                });
                Ok(DeviceResponse::SignerCommitment(point.serialize().to_vec()))
            }
            RequestKind::AeSign => {
                let (hash, entropy) = split_hash(&payload)?;
                let pending = self
                    .lock()
                    .pending
                    .take()
                    .ok_or_else(|| DeviceError::Rejected("no pending commitment".into()))?;
                if pending.hash != hash || pending.host_commitment != host_commitment(&entropy) {
                    return Err(DeviceError::Rejected("host entropy does not match commitment".into()));
                }
                let nonce = if self.ignore_host_entropy {
                    pending.nonce
                } else {
                    let tweak = nonce_tweak(&pending.nonce.public_key(&self.secp), &entropy).unwrap();
                    pending.nonce.add_tweak(&tweak).unwrap()
                };
                let sig = self.sign_with_nonce(&self.child_key(&request.path), &hash, &nonce);
                Ok(DeviceResponse::Signature(sig.serialize_compact().to_vec()))
            }
        }
    }

    fn sign_plain(&self, path: &[u32], hash: [u8; 32]) -> Signature {
        let key = self.child_key(path);
        let msg = Message::from_digest(hash);
        if !self.high_r {
            return self.secp.sign_ecdsa_low_r(&msg, &key);
        }
        let mut counter = 0u32;
        loop {
            let mut noncedata = [0u8; 32];
            noncedata[..4].copy_from_slice(&counter.to_le_bytes());
            let sig = self.secp.sign_ecdsa_with_noncedata(&msg, &key, &noncedata);
            if sig.serialize_compact()[0] >= 0x80 {
                return sig;
            }
            counter += 1;
        }
    }

    /// Textbook ECDSA with an explicit nonce: s = k^-1 (z + r·d).
    /// `hash` must be below the group order.
    fn sign_with_nonce(&self, key: &SecretKey, hash: &[u8; 32], nonce: &SecretKey) -> Signature {
        let point = nonce.public_key(&self.secp).serialize();
        let mut r = [0u8; 32];
        r.copy_from_slice(&point[1..]);
        let r_scalar = Scalar::from(SecretKey::from_slice(&r).unwrap());

        let z = Scalar::from_be_bytes(*hash).unwrap();
        let sum = key.mul_tweak(&r_scalar).unwrap().add_tweak(&z).unwrap();
        let s = sum.mul_tweak(&Scalar::from(invert(nonce))).unwrap();

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&r);
        compact[32..].copy_from_slice(&s.secret_bytes());
        let mut sig = Signature::from_compact(&compact).unwrap();
        sig.normalize_s();
        sig
    }
}

impl Device for FakeDevice {
    fn request(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let scripted = {
            let mut state = self.lock();
            state.log.push(request.clone());
            state.script.pop_front()
        };
        match scripted {
            Some(response) => response,
            None if self.master.is_some() => self.answer(request),
            None => Err(DeviceError::Transport("script exhausted".into())),
        }
    }
}

fn split_hash(payload: &[u8]) -> Result<([u8; 32], [u8; 32]), DeviceError> {
    if payload.len() < 32 {
        return Err(DeviceError::Rejected("payload too short".into()));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&payload[..32]);
    let mut rest = [0u8; 32];
    if payload.len() == 64 {
        rest.copy_from_slice(&payload[32..]);
    }
    Ok((hash, rest))
}

/// Modular inverse by Fermat: k^(n-2) mod n.
fn invert(k: &SecretKey) -> SecretKey {
    let mut one = [0u8; 32];
    one[31] = 1;
    let mut acc = SecretKey::from_slice(&one).unwrap();
    let base = Scalar::from(*k);
    for byte in ORDER_MINUS_TWO {
        for bit in (0..8).rev() {
            acc = acc.mul_tweak(&Scalar::from(acc)).unwrap();
            if (byte >> bit) & 1 == 1 {
                acc = acc.mul_tweak(&base).unwrap();
            }
        }
    }
    acc
}
