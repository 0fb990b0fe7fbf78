//! Reserved derivation paths, salts and BIP-32 path helpers
//!
//! The session layer authenticates with a key derived at [`LOGIN_PATH`] and
//! derives its local encryption secret from [`CLIENT_SECRET_PATH`]. The signer
//! derives at these paths like any other; it does not interpret them.

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::NetworkKind;
use thiserror::Error;

/// Single-index path of the login key ("GA" + "login" magic).
pub const LOGIN_PATH: [u32; 1] = [0x4741_b11e];

/// Single-index path of the client secret ("pass").
pub const CLIENT_SECRET_PATH: [u32; 1] = [0x7061_7373];

/// Salt for password-based key stretching ("passsalt").
pub const PASSWORD_SALT: [u8; 8] = *b"passsalt";

/// Salt for client blob encryption key derivation ("blobsalt").
pub const BLOB_SALT: [u8; 8] = *b"blobsalt";

/// First hardened BIP-32 index.
pub const HARDENED: u32 = 0x8000_0000;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Derivation failed: {0}")]
    DerivationFailed(#[from] bitcoin::bip32::Error),
}

/// Whether a raw path element is a hardened index.
pub fn is_hardened(index: u32) -> bool {
    index >= HARDENED
}

/// Convert raw `u32` elements into a BIP-32 derivation path.
pub fn to_derivation_path(path: &[u32]) -> DerivationPath {
    path.iter()
        .copied()
        .map(ChildNumber::from)
        .collect::<Vec<_>>()
        .into()
}

/// Render a path as `m/0/1h` for logs. Indices are not secret.
pub fn display_path(path: &[u32]) -> String {
    let mut out = String::from("m");
    for &index in path {
        if is_hardened(index) {
            out.push_str(&format!("/{}h", index - HARDENED));
        } else {
            out.push_str(&format!("/{}", index));
        }
    }
    out
}

/// Derive the BIP-32 master key for a seed.
pub fn derive_master_key(network: NetworkKind, seed: &[u8]) -> Result<Xpriv, KeyError> {
    Ok(Xpriv::new_master(network, seed)?)
}
