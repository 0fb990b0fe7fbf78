//! Capability model shared by all signer variants.
//!
//! A [`DeviceDescriptor`] is the caller-supplied record describing a hardware
//! or watch-only signer. It is JSON compatible with the device records wallets
//! already exchange: levels are integers and unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::error::SignerError;

/// Level of Liquid support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LiquidSupport {
    /// Liquid is not supported
    #[default]
    None,
    /// Liquid is supported, unblinding happens on the host
    Lite,
}

/// Anti-Exfil signing protocol support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AeProtocolSupport {
    /// Only vanilla ECDSA signatures
    #[default]
    None,
    /// Both AE and vanilla signatures
    Optional,
    /// Every signature must use the AE protocol
    Mandatory,
}

impl TryFrom<u32> for LiquidSupport {
    type Error = String;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::None),
            1 => Ok(Self::Lite),
            n => Err(format!("unknown liquid support level {}", n)),
        }
    }
}

impl From<LiquidSupport> for u32 {
    fn from(level: LiquidSupport) -> u32 {
        match level {
            LiquidSupport::None => 0,
            LiquidSupport::Lite => 1,
        }
    }
}

impl TryFrom<u32> for AeProtocolSupport {
    type Error = String;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::None),
            1 => Ok(Self::Optional),
            2 => Ok(Self::Mandatory),
            n => Err(format!("unknown AE protocol level {}", n)),
        }
    }
}

impl From<AeProtocolSupport> for u32 {
    fn from(level: AeProtocolSupport) -> u32 {
        match level {
            AeProtocolSupport::None => 0,
            AeProtocolSupport::Optional => 1,
            AeProtocolSupport::Mandatory => 2,
        }
    }
}

/// Which of the three custody models a signer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    WatchOnly,
    Software,
    Hardware,
}

/// `device_type` value marking a watch-only descriptor.
pub const WATCH_ONLY_DEVICE_TYPE: &str = "watch-only";

/// `device_type` value marking a hardware descriptor.
pub const HARDWARE_DEVICE_TYPE: &str = "hardware";

/// Capability and identity record of a non-software signer.
///
/// Carries no key material. Missing capability fields default to the
/// most conservative value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub supports_low_r: bool,
    #[serde(default)]
    pub supports_arbitrary_scripts: bool,
    #[serde(default)]
    pub supports_liquid: LiquidSupport,
    #[serde(default)]
    pub supports_host_unblinding: bool,
    #[serde(default)]
    pub supports_ae_protocol: AeProtocolSupport,
}

impl DeviceDescriptor {
    /// Parse a descriptor from JSON.
    ///
    /// Accepts either the bare record or one wrapped as `{"device": {...}}`.
    pub fn from_json(json: &str) -> Result<Self, SignerError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| SignerError::InvalidDescriptor(e.to_string()))?;
        let record = match value.get("device") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };
        serde_json::from_value(record).map_err(|e| SignerError::InvalidDescriptor(e.to_string()))
    }

    /// A descriptor for a watch-only session.
    pub fn watch_only() -> Self {
        Self {
            name: "Watch-Only".to_string(),
            device_type: WATCH_ONLY_DEVICE_TYPE.to_string(),
            supports_low_r: false,
            supports_arbitrary_scripts: false,
            supports_liquid: LiquidSupport::Lite,
            supports_host_unblinding: true,
            supports_ae_protocol: AeProtocolSupport::None,
        }
    }

    pub fn is_watch_only(&self) -> bool {
        self.device_type == WATCH_ONLY_DEVICE_TYPE
    }

    /// True when the record describes nothing (the software signer's record).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let d = DeviceDescriptor::from_json(
            r#"{
                "name": "Jade",
                "device_type": "hardware",
                "supports_low_r": true,
                "supports_arbitrary_scripts": true,
                "supports_liquid": 1,
                "supports_host_unblinding": true,
                "supports_ae_protocol": 2
            }"#,
        )
        .unwrap();
        assert_eq!(d.name, "Jade");
        assert!(!d.is_watch_only());
        assert_eq!(d.supports_liquid, LiquidSupport::Lite);
        assert_eq!(d.supports_ae_protocol, AeProtocolSupport::Mandatory);
    }

    #[test]
    fn test_wrapped_descriptor_and_defaults() {
        let d = DeviceDescriptor::from_json(
            r#"{"device": {"name": "Ledger", "device_type": "hardware", "extra": [1, 2]}}"#,
        )
        .unwrap();
        assert_eq!(d.name, "Ledger");
        assert!(!d.supports_low_r);
        assert!(!d.supports_host_unblinding);
        assert_eq!(d.supports_liquid, LiquidSupport::None);
        assert_eq!(d.supports_ae_protocol, AeProtocolSupport::None);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let err = DeviceDescriptor::from_json(r#"{"supports_ae_protocol": 3}"#).unwrap_err();
        assert!(matches!(err, SignerError::InvalidDescriptor(_)));
        let err = DeviceDescriptor::from_json("not json").unwrap_err();
        assert!(matches!(err, SignerError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_levels_serialize_as_integers() {
        let json = serde_json::to_value(DeviceDescriptor::watch_only()).unwrap();
        assert_eq!(json["supports_liquid"], 1);
        assert_eq!(json["supports_ae_protocol"], 0);
        assert_eq!(json["device_type"], "watch-only");
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(DeviceDescriptor::default().is_empty());
        assert!(!DeviceDescriptor::watch_only().is_empty());
    }
}
