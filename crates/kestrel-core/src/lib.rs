//! Kestrel Core
//!
//! Shared building blocks for the Kestrel signer.
//!
//! # Contents
//!
//! - Network parameters: the main-net/test-net and Bitcoin/Liquid flags,
//!   loadable from TOML
//! - BIP-39 mnemonic parsing and seed derivation
//! - Reserved derivation paths and salts used by session layers
//!
//! # Encrypted Storage
//!
//! Mnemonics can be held encrypted at rest using Argon2id + AES-256-GCM.

pub mod crypto;
pub mod keys;
pub mod network;
pub mod seed;

pub use crypto::{decrypt_mnemonic, encrypt_mnemonic, CryptoError, EncryptedMnemonic};
pub use keys::*;
pub use network::{ConfigError, NetworkParameters};
pub use seed::*;
