//! Network parameters, parsed from TOML or built from presets.
//!
//! The signer consults only two flags: whether the network is a main network
//! and whether it is Liquid. Everything else is informational.

use bitcoin::NetworkKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse network config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Chain selection for a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    /// Network id: "mainnet", "testnet", "liquid", "liquid-testnet", ...
    pub name: String,

    /// Main network (BIP-32 `xpub`/`xprv` prefixes) or a test network (`tpub`/`tprv`)
    pub mainnet: bool,

    /// Liquid (Elements) chain, unlocks blinding key operations
    #[serde(default)]
    pub liquid: bool,
}

/// File layout: the parameters live under a `[network]` table.
#[derive(Debug, Deserialize)]
struct NetworkFile {
    network: NetworkParameters,
}

impl NetworkParameters {
    pub fn bitcoin_mainnet() -> Self {
        Self::new("mainnet", true, false)
    }

    pub fn bitcoin_testnet() -> Self {
        Self::new("testnet", false, false)
    }

    pub fn liquid_mainnet() -> Self {
        Self::new("liquid", true, true)
    }

    pub fn liquid_testnet() -> Self {
        Self::new("liquid-testnet", false, true)
    }

    pub fn new(name: &str, mainnet: bool, liquid: bool) -> Self {
        Self {
            name: name.to_string(),
            mainnet,
            liquid,
        }
    }

    /// Parse a TOML document containing a `[network]` table.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: NetworkFile = toml::from_str(s)?;
        Ok(file.network)
    }

    /// Load parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn is_main_net(&self) -> bool {
        self.mainnet
    }

    pub fn is_liquid(&self) -> bool {
        self.liquid
    }

    /// Selects BIP-32 version bytes. Liquid shares Bitcoin's prefixes.
    pub fn network_kind(&self) -> NetworkKind {
        if self.mainnet {
            NetworkKind::Main
        } else {
            NetworkKind::Test
        }
    }

    /// P2PKH address version byte.
    pub fn btc_version(&self) -> u8 {
        match (self.liquid, self.mainnet) {
            (false, true) => 0x00,
            (false, false) => 0x6f,
            (true, true) => 57,
            (true, false) => 235,
        }
    }
}
