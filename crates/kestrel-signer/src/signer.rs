//! The [`Signer`] contract and its dispatch over the three custody models.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use bitcoin::bip32::{Fingerprint, Xpub};
use kestrel_core::{EncryptedMnemonic, NetworkParameters};
use log::debug;
use secp256k1::{ecdsa::Signature, SecretKey};
use zeroize::Zeroizing;

use crate::anti_exfil::generate_host_entropy;
use crate::blinding::MasterBlindingKey;
use crate::capability::{AeProtocolSupport, DeviceDescriptor, LiquidSupport, SignerKind};
use crate::device::Device;
use crate::error::SignerError;
use crate::hardware::HardwareSigner;
use crate::software::{Built, SoftwareSigner};
use crate::watch_only::WatchOnlySigner;

/// How a signature should be produced.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SigningProtocol {
    /// Plain ECDSA.
    Vanilla,
    /// Anti-Exfil with caller supplied host entropy.
    AntiExfil { host_entropy: [u8; 32] },
}

impl fmt::Debug for SigningProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vanilla => f.write_str("Vanilla"),
            Self::AntiExfil { .. } => f.write_str("AntiExfil"),
        }
    }
}

enum Variant {
    WatchOnly(WatchOnlySigner),
    Software(SoftwareSigner),
    Hardware(HardwareSigner),
}

/// A wallet signer: software, watch-only, or a proxy to a hardware device.
///
/// The variant is fixed at construction. All methods take `&self`; the
/// signer is `Send + Sync` and meant to be shared behind an `Arc` for the
/// lifetime of a session.
pub struct Signer {
    network: NetworkParameters,
    device: DeviceDescriptor,
    variant: Variant,
    master_blinding_key: OnceLock<MasterBlindingKey>,
}

impl Signer {
    // -- construction --------------------------------------------------------

    /// Watch-only signer without a master public key.
    pub fn watch_only(
        network: NetworkParameters,
        device: DeviceDescriptor,
    ) -> Result<Self, SignerError> {
        Self::new_watch_only(network, device, None)
    }

    /// Watch-only signer deriving from `xpub`.
    pub fn watch_only_with_xpub(
        network: NetworkParameters,
        device: DeviceDescriptor,
        xpub: &str,
    ) -> Result<Self, SignerError> {
        let xpub = Xpub::from_str(xpub.trim())
            .map_err(|e| SignerError::InvalidSecret(e.to_string()))?;
        if xpub.network != network.network_kind() {
            return Err(SignerError::NetworkMismatch);
        }
        Self::new_watch_only(network, device, Some(xpub))
    }

    fn new_watch_only(
        network: NetworkParameters,
        device: DeviceDescriptor,
        xpub: Option<Xpub>,
    ) -> Result<Self, SignerError> {
        if !device.is_watch_only() {
            return Err(SignerError::InvalidDescriptor(format!(
                "expected a watch-only device, got {:?}",
                device.device_type
            )));
        }
        Ok(Self::assemble(
            network,
            device,
            Variant::WatchOnly(WatchOnlySigner::new(xpub)),
            None,
        ))
    }

    /// Proxy to an external device.
    pub fn hardware(
        network: NetworkParameters,
        device: DeviceDescriptor,
        channel: Arc<dyn Device>,
    ) -> Result<Self, SignerError> {
        if device.is_watch_only() {
            return Err(SignerError::InvalidDescriptor(
                "watch-only descriptor given for a hardware signer".into(),
            ));
        }
        let proxy = HardwareSigner::new(channel, network.network_kind());
        Ok(Self::assemble(network, device, Variant::Hardware(proxy), None))
    }

    /// Pick watch-only or hardware from `device.device_type`.
    pub fn from_device(
        network: NetworkParameters,
        device: DeviceDescriptor,
        channel: Option<Arc<dyn Device>>,
    ) -> Result<Self, SignerError> {
        if device.is_watch_only() {
            return Self::watch_only(network, device);
        }
        match channel {
            Some(channel) => Self::hardware(network, device, channel),
            None => Err(SignerError::InvalidDescriptor(
                "hardware device given without a device channel".into(),
            )),
        }
    }

    /// Software signer from a mnemonic or a base58 extended key.
    pub fn software(
        network: NetworkParameters,
        mnemonic_or_xpub: &str,
    ) -> Result<Self, SignerError> {
        let built = SoftwareSigner::from_secret(&network, mnemonic_or_xpub)?;
        Ok(Self::from_built(network, built))
    }

    /// Software signer that keeps its mnemonic encrypted under `password`.
    pub fn software_with_password(
        network: NetworkParameters,
        mnemonic: &str,
        password: &str,
    ) -> Result<Self, SignerError> {
        let built = SoftwareSigner::from_mnemonic_with_password(&network, mnemonic, password)?;
        Ok(Self::from_built(network, built))
    }

    /// Software signer restored from an encrypted mnemonic.
    pub fn software_from_encrypted(
        network: NetworkParameters,
        encrypted: &EncryptedMnemonic,
        password: &str,
    ) -> Result<Self, SignerError> {
        let built = SoftwareSigner::from_encrypted(&network, encrypted, password)?;
        Ok(Self::from_built(network, built))
    }

    fn from_built(network: NetworkParameters, (software, blinding): Built) -> Self {
        Self::assemble(
            network,
            DeviceDescriptor::default(),
            Variant::Software(software),
            blinding,
        )
    }

    fn assemble(
        network: NetworkParameters,
        device: DeviceDescriptor,
        variant: Variant,
        blinding: Option<MasterBlindingKey>,
    ) -> Self {
        let signer = Self {
            network,
            device,
            variant,
            master_blinding_key: blinding.map(OnceLock::from).unwrap_or_default(),
        };
        debug!(
            "created {:?} signer on {} (device {:?}, blinding key {})",
            signer.variant(),
            signer.network.name,
            signer.device.name,
            if signer.has_master_blinding_key() { "derived" } else { "absent" }
        );
        signer
    }

    // -- identity and capabilities -------------------------------------------

    pub fn variant(&self) -> SignerKind {
        match self.variant {
            Variant::WatchOnly(_) => SignerKind::WatchOnly,
            Variant::Software(_) => SignerKind::Software,
            Variant::Hardware(_) => SignerKind::Hardware,
        }
    }

    pub fn network(&self) -> &NetworkParameters {
        &self.network
    }

    pub fn is_liquid(&self) -> bool {
        self.network.is_liquid()
    }

    pub fn is_watch_only(&self) -> bool {
        matches!(self.variant, Variant::WatchOnly(_))
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self.variant, Variant::Hardware(_))
    }

    /// The descriptor supplied at construction; empty for software signers.
    pub fn get_device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn supports_low_r(&self) -> bool {
        match self.variant {
            Variant::Software(_) => true,
            Variant::WatchOnly(_) | Variant::Hardware(_) => self.device.supports_low_r,
        }
    }

    pub fn supports_arbitrary_scripts(&self) -> bool {
        match self.variant {
            Variant::Software(_) => true,
            Variant::WatchOnly(_) | Variant::Hardware(_) => {
                self.device.supports_arbitrary_scripts
            }
        }
    }

    pub fn get_liquid_support(&self) -> LiquidSupport {
        match self.variant {
            Variant::Software(_) => LiquidSupport::Lite,
            Variant::WatchOnly(_) | Variant::Hardware(_) => self.device.supports_liquid,
        }
    }

    pub fn supports_host_unblinding(&self) -> bool {
        match self.variant {
            Variant::Software(_) => true,
            Variant::WatchOnly(_) | Variant::Hardware(_) => self.device.supports_host_unblinding,
        }
    }

    pub fn get_ae_protocol_support(&self) -> AeProtocolSupport {
        match self.variant {
            Variant::Software(_) => AeProtocolSupport::None,
            Variant::WatchOnly(_) | Variant::Hardware(_) => self.device.supports_ae_protocol,
        }
    }

    // -- derivation ----------------------------------------------------------

    /// Extended public key at `path`.
    pub fn get_xpub(&self, path: &[u32]) -> Result<Xpub, SignerError> {
        match &self.variant {
            Variant::WatchOnly(inner) => inner.get_xpub(path),
            Variant::Software(inner) => inner.get_xpub(path),
            Variant::Hardware(inner) => inner.get_xpub(path),
        }
    }

    /// Base58check form of [`Signer::get_xpub`].
    pub fn get_bip32_xpub(&self, path: &[u32]) -> Result<String, SignerError> {
        Ok(self.get_xpub(path)?.to_string())
    }

    pub fn get_master_fingerprint(&self) -> Result<Fingerprint, SignerError> {
        Ok(self.get_xpub(&[])?.fingerprint())
    }

    // -- signing -------------------------------------------------------------

    /// Sign a 32-byte hash with the key at `path`.
    ///
    /// Hardware signers that require Anti-Exfil run the exchange with fresh
    /// host entropy; everything else signs plain ECDSA.
    pub fn sign_hash(&self, path: &[u32], hash: &[u8]) -> Result<Signature, SignerError> {
        let protocol = match self.get_ae_protocol_support() {
            AeProtocolSupport::Mandatory if self.is_hardware() => SigningProtocol::AntiExfil {
                host_entropy: generate_host_entropy(),
            },
            _ => SigningProtocol::Vanilla,
        };
        self.sign_hash_with(path, hash, protocol)
    }

    /// Sign with an explicitly chosen protocol.
    pub fn sign_hash_with(
        &self,
        path: &[u32],
        hash: &[u8],
        protocol: SigningProtocol,
    ) -> Result<Signature, SignerError> {
        let hash: &[u8; 32] = hash
            .try_into()
            .map_err(|_| SignerError::InvalidHashLength(hash.len()))?;

        match &self.variant {
            Variant::WatchOnly(_) => Err(SignerError::NoPrivateKey),
            Variant::Software(inner) => {
                if !inner.has_private_key() {
                    return Err(SignerError::NoPrivateKey);
                }
                self.check_protocol(protocol)?;
                inner.sign_hash(path, hash)
            }
            Variant::Hardware(inner) => {
                self.check_protocol(protocol)?;
                match protocol {
                    SigningProtocol::Vanilla => {
                        inner.sign_vanilla(path, hash, self.device.supports_low_r)
                    }
                    SigningProtocol::AntiExfil { host_entropy } => {
                        inner.sign_anti_exfil(path, hash, &host_entropy)
                    }
                }
            }
        }
    }

    fn check_protocol(&self, protocol: SigningProtocol) -> Result<(), SignerError> {
        match (self.get_ae_protocol_support(), protocol) {
            (AeProtocolSupport::Mandatory, SigningProtocol::Vanilla) => Err(
                SignerError::Unsupported("vanilla signing on an Anti-Exfil only device".into()),
            ),
            (AeProtocolSupport::None, SigningProtocol::AntiExfil { .. }) => {
                Err(SignerError::Unsupported("Anti-Exfil signing".into()))
            }
            _ => Ok(()),
        }
    }

    // -- Liquid blinding -----------------------------------------------------

    fn require_liquid(&self) -> Result<(), SignerError> {
        if self.is_liquid() {
            Ok(())
        } else {
            Err(SignerError::NotLiquid)
        }
    }

    fn blinding_key(&self) -> Result<&MasterBlindingKey, SignerError> {
        self.require_liquid()?;
        self.master_blinding_key
            .get()
            .ok_or(SignerError::MissingBlindingKey)
    }

    pub fn has_master_blinding_key(&self) -> bool {
        self.master_blinding_key.get().is_some()
    }

    /// The master blinding key, for signers that allow host unblinding.
    pub fn get_master_blinding_key(&self) -> Result<&MasterBlindingKey, SignerError> {
        self.require_liquid()?;
        if self.get_liquid_support() == LiquidSupport::None {
            return Err(SignerError::Unsupported("Liquid".into()));
        }
        if !self.supports_host_unblinding() {
            return Err(SignerError::Unsupported("host unblinding".into()));
        }
        self.blinding_key()
    }

    /// Install the master blinding key. Succeeds at most once.
    pub fn set_master_blinding_key(&self, key_hex: &str) -> Result<(), SignerError> {
        self.require_liquid()?;
        let key = MasterBlindingKey::from_hex(key_hex)?;
        self.master_blinding_key
            .set(key)
            .map_err(|_rejected| SignerError::BlindingKeyAlreadySet)?;
        debug!("master blinding key installed");
        Ok(())
    }

    /// Private blinding key for `script`.
    pub fn get_blinding_key_from_script(&self, script: &[u8]) -> Result<SecretKey, SignerError> {
        self.blinding_key()?.blinding_key_for_script(script)
    }

    /// Compressed public blinding key for `script`.
    pub fn get_blinding_pubkey_from_script(&self, script: &[u8]) -> Result<Vec<u8>, SignerError> {
        let public = self.blinding_key()?.blinding_pubkey_for_script(script)?;
        Ok(public.serialize().to_vec())
    }

    // -- recovery ------------------------------------------------------------

    /// The mnemonic this signer was created from, if any.
    ///
    /// `password` is only consulted when the mnemonic is held encrypted.
    pub fn get_mnemonic(&self, password: &str) -> Result<Option<Zeroizing<String>>, SignerError> {
        match &self.variant {
            Variant::Software(inner) => inner.get_mnemonic(password),
            Variant::WatchOnly(_) | Variant::Hardware(_) => Ok(None),
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("variant", &self.variant())
            .field("network", &self.network.name)
            .field("device", &self.device.name)
            .field("has_master_blinding_key", &self.has_master_blinding_key())
            .finish()
    }
}
