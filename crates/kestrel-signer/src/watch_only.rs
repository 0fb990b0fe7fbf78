//! Watch-only signer: public derivation from an optional account xpub.

use bitcoin::bip32::Xpub;
use kestrel_core::to_derivation_path;
use secp256k1::{Secp256k1, VerifyOnly};

use crate::error::SignerError;

pub(crate) struct WatchOnlySigner {
    xpub: Option<Xpub>,
    secp: Secp256k1<VerifyOnly>,
}

impl WatchOnlySigner {
    pub(crate) fn new(xpub: Option<Xpub>) -> Self {
        Self {
            xpub,
            secp: Secp256k1::verification_only(),
        }
    }

    /// Non-hardened derivation only; any hardened step fails.
    pub(crate) fn get_xpub(&self, path: &[u32]) -> Result<Xpub, SignerError> {
        let xpub = self.xpub.as_ref().ok_or(SignerError::NoMasterKey)?;
        Ok(xpub.derive_pub(&self.secp, &to_derivation_path(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::bip32;
    use kestrel_core::HARDENED;
    use std::str::FromStr;

    const TV1_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

    fn signer() -> WatchOnlySigner {
        WatchOnlySigner::new(Some(Xpub::from_str(TV1_XPUB).unwrap()))
    }

    #[test]
    fn test_empty_path_returns_root() {
        assert_eq!(signer().get_xpub(&[]).unwrap().to_string(), TV1_XPUB);
    }

    #[test]
    fn test_unhardened_derivation() {
        let a = signer().get_xpub(&[0, 7]).unwrap();
        let b = signer().get_xpub(&[0]).unwrap();
        assert_eq!(a.depth, 2);
        assert_eq!(a.parent_fingerprint, b.fingerprint());
    }

    #[test]
    fn test_hardened_derivation_fails() {
        let result = signer().get_xpub(&[0, HARDENED + 1]);
        assert!(matches!(
            result,
            Err(SignerError::Derivation(
                bip32::Error::CannotDeriveFromHardenedKey
            ))
        ));
    }

    #[test]
    fn test_without_xpub() {
        let signer = WatchOnlySigner::new(None);
        assert!(matches!(
            signer.get_xpub(&[]),
            Err(SignerError::NoMasterKey)
        ));
    }
}
