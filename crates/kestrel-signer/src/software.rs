//! In-memory software signer.
//!
//! Holds a BIP-32 master key derived from a mnemonic, or imported directly as
//! an extended private or public key. All derivation and signing is local.

use std::str::FromStr;

use bitcoin::bip32::{ChainCode, Xpriv, Xpub};
use kestrel_core::{
    decrypt_mnemonic, derive_master_key, derive_seed, encrypt_mnemonic, parse_mnemonic,
    to_derivation_path, EncryptedMnemonic, NetworkParameters,
};
use secp256k1::{ecdsa::Signature, All, Message, Secp256k1};
use zeroize::Zeroizing;

use crate::blinding::MasterBlindingKey;
use crate::error::SignerError;

/// Master key material. The private variant is scrubbed on drop.
pub(crate) enum MasterKey {
    Private(Xpriv),
    Public(Xpub),
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        if let MasterKey::Private(xpriv) = self {
            xpriv.private_key.non_secure_erase();
            xpriv.chain_code = ChainCode::from([0u8; 32]);
        }
    }
}

/// The phrase a signer was created from, kept in one of two forms.
enum RetainedMnemonic {
    Plain(Zeroizing<String>),
    Encrypted(EncryptedMnemonic),
}

pub(crate) struct SoftwareSigner {
    master_key: MasterKey,
    mnemonic: Option<RetainedMnemonic>,
    secp: Secp256k1<All>,
}

/// A freshly built signer plus the blinding key its seed yields, if any.
pub(crate) type Built = (SoftwareSigner, Option<MasterBlindingKey>);

impl SoftwareSigner {
    /// Build from a mnemonic phrase or a base58 extended key.
    ///
    /// Input containing whitespace is treated as a mnemonic; anything else
    /// must parse as an `xprv`/`tprv` or `xpub`/`tpub` for `network`.
    pub(crate) fn from_secret(
        network: &NetworkParameters,
        mnemonic_or_xpub: &str,
    ) -> Result<Built, SignerError> {
        let secret = mnemonic_or_xpub.trim();
        if secret.split_whitespace().nth(1).is_some() {
            let (master_key, blinding, phrase) = Self::keys_from_phrase(network, secret)?;
            return Ok((
                Self::new(master_key, Some(RetainedMnemonic::Plain(phrase))),
                blinding,
            ));
        }

        let master_key = if let Ok(xpriv) = Xpriv::from_str(secret) {
            if xpriv.network != network.network_kind() {
                return Err(SignerError::NetworkMismatch);
            }
            MasterKey::Private(xpriv)
        } else if let Ok(xpub) = Xpub::from_str(secret) {
            if xpub.network != network.network_kind() {
                return Err(SignerError::NetworkMismatch);
            }
            MasterKey::Public(xpub)
        } else {
            return Err(SignerError::InvalidSecret(
                "not a mnemonic or extended key".into(),
            ));
        };
        Ok((Self::new(master_key, None), None))
    }

    /// Build from a mnemonic and keep only an encrypted copy of the phrase.
    pub(crate) fn from_mnemonic_with_password(
        network: &NetworkParameters,
        mnemonic: &str,
        password: &str,
    ) -> Result<Built, SignerError> {
        let (master_key, blinding, phrase) = Self::keys_from_phrase(network, mnemonic)?;
        let encrypted = encrypt_mnemonic(&phrase, password)?;
        Ok((
            Self::new(master_key, Some(RetainedMnemonic::Encrypted(encrypted))),
            blinding,
        ))
    }

    /// Build from an encrypted mnemonic, which stays encrypted in memory.
    pub(crate) fn from_encrypted(
        network: &NetworkParameters,
        encrypted: &EncryptedMnemonic,
        password: &str,
    ) -> Result<Built, SignerError> {
        let phrase = decrypt_mnemonic(encrypted, password)?;
        let (master_key, blinding, _) = Self::keys_from_phrase(network, &phrase)?;
        Ok((
            Self::new(
                master_key,
                Some(RetainedMnemonic::Encrypted(encrypted.clone())),
            ),
            blinding,
        ))
    }

    fn new(master_key: MasterKey, mnemonic: Option<RetainedMnemonic>) -> Self {
        Self {
            master_key,
            mnemonic,
            secp: Secp256k1::new(),
        }
    }

    /// Derive the master keys for `phrase`, returning them with the phrase in
    /// its canonical single-spaced form.
    fn keys_from_phrase(
        network: &NetworkParameters,
        phrase: &str,
    ) -> Result<(MasterKey, Option<MasterBlindingKey>, Zeroizing<String>), SignerError> {
        let mnemonic = parse_mnemonic(phrase)?;
        let seed = derive_seed(&mnemonic, "");
        let master = derive_master_key(network.network_kind(), &seed[..])?;
        let blinding = network
            .is_liquid()
            .then(|| MasterBlindingKey::from_seed(&seed[..]));
        let canonical = Zeroizing::new(mnemonic.to_string());
        Ok((MasterKey::Private(master), blinding, canonical))
    }

    pub(crate) fn has_private_key(&self) -> bool {
        matches!(self.master_key, MasterKey::Private(_))
    }

    pub(crate) fn get_xpub(&self, path: &[u32]) -> Result<Xpub, SignerError> {
        let path = to_derivation_path(path);
        match &self.master_key {
            MasterKey::Private(master) => {
                let mut child = master.derive_priv(&self.secp, &path)?;
                let xpub = Xpub::from_priv(&self.secp, &child);
                child.private_key.non_secure_erase();
                Ok(xpub)
            }
            MasterKey::Public(master) => Ok(master.derive_pub(&self.secp, &path)?),
        }
    }

    /// Deterministic (RFC 6979) low-R, low-S ECDSA.
    pub(crate) fn sign_hash(&self, path: &[u32], hash: &[u8; 32]) -> Result<Signature, SignerError> {
        let MasterKey::Private(master) = &self.master_key else {
            return Err(SignerError::NoPrivateKey);
        };
        let mut child = master.derive_priv(&self.secp, &to_derivation_path(path))?;
        let signature = self
            .secp
            .sign_ecdsa_low_r(&Message::from_digest(*hash), &child.private_key);
        child.private_key.non_secure_erase();
        Ok(signature)
    }

    pub(crate) fn get_mnemonic(
        &self,
        password: &str,
    ) -> Result<Option<Zeroizing<String>>, SignerError> {
        match &self.mnemonic {
            None => Ok(None),
            Some(RetainedMnemonic::Plain(phrase)) => Ok(Some(phrase.clone())),
            Some(RetainedMnemonic::Encrypted(encrypted)) => {
                Ok(Some(decrypt_mnemonic(encrypted, password)?))
            }
        }
    }
}
