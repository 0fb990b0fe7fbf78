//! BIP-39 mnemonic handling
//!
//! Parses and generates mnemonics and stretches them into 64-byte seeds.

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Mnemonic lengths offered for new wallets. Parsing accepts any valid
/// BIP-39 length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    pub fn count(self) -> usize {
        match self {
            Self::Twelve => 12,
            Self::TwentyFour => 24,
        }
    }
}

/// Generate a new English BIP-39 mnemonic.
pub fn generate_mnemonic(words: WordCount) -> Result<Mnemonic, SeedError> {
    Mnemonic::generate_in(Language::English, words.count())
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Parse a mnemonic from words.
///
/// Surrounding and repeated whitespace is tolerated. Any BIP-39 length
/// (12, 15, 18, 21 or 24 words) with a valid checksum is accepted.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, SeedError> {
    let normalized = Zeroizing::new(words.split_whitespace().collect::<Vec<_>>().join(" "));
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Derive seed bytes from a mnemonic (with optional passphrase).
pub fn derive_seed(mnemonic: &Mnemonic, passphrase: &str) -> Zeroizing<[u8; 64]> {
    Zeroizing::new(mnemonic.to_seed(passphrase))
}
