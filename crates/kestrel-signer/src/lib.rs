//! Kestrel Signer
//!
//! One signing contract over three custody models:
//!
//! - **Software**: keys derived in memory from a mnemonic or imported xprv/xpub
//! - **Watch-Only**: public derivation only, never holds a private key
//! - **Hardware**: every request forwarded to an injected [`Device`]
//!
//! Callers query capabilities (low-R, arbitrary scripts, Liquid, host
//! unblinding, Anti-Exfil) before choosing a signing strategy.
//!
//! # Liquid
//!
//! On Liquid networks the signer holds a SLIP-0077 master blinding key, set
//! at most once, from which per-script blinding keys are derived.
//!
//! # Example
//! ```no_run
//! use kestrel_core::NetworkParameters;
//! use kestrel_signer::Signer;
//!
//! let signer = Signer::software(
//!     NetworkParameters::bitcoin_testnet(),
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//! )?;
//! let xpub = signer.get_bip32_xpub(&[0])?;
//! assert!(xpub.starts_with("tpub"));
//! # Ok::<(), kestrel_signer::SignerError>(())
//! ```

pub mod anti_exfil;
pub mod blinding;
pub mod capability;
pub mod device;
pub mod error;
mod hardware;
mod signer;
mod software;
mod watch_only;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use blinding::MasterBlindingKey;
pub use capability::{AeProtocolSupport, DeviceDescriptor, LiquidSupport, SignerKind};
pub use device::{Device, DeviceError, DeviceRequest, DeviceResponse, RequestKind};
pub use error::{ErrorKind, SignerError};
pub use signer::{Signer, SigningProtocol};

pub use kestrel_core::{BLOB_SALT, CLIENT_SECRET_PATH, LOGIN_PATH, PASSWORD_SALT};
