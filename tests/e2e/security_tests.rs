//! Security-specific tests.
//!
//! These tests verify:
//! 1. Encrypted mnemonic storage rejects wrong passwords and tampering
//! 2. No private key material is reachable from watch-only or hardware signers
//! 3. Malformed inputs are rejected without panicking
//! 4. Secrets do not leak through Debug output or error messages

use std::sync::Arc;

use kestrel_core::crypto::{decrypt_mnemonic, encrypt_mnemonic, EncryptedMnemonic};
use kestrel_core::NetworkParameters;
use kestrel_signer::test_utils::{hardware_descriptor, FakeDevice, TEST_MNEMONIC};
use kestrel_signer::{
    AeProtocolSupport, DeviceDescriptor, DeviceResponse, MasterBlindingKey, Signer, SignerError,
};
use zeroize::Zeroize;

// ============================================================================
// 1. Encrypted mnemonic storage
// ============================================================================

#[test]
fn test_wrong_password_fails_decryption() {
    let encrypted = encrypt_mnemonic(TEST_MNEMONIC, "correct horse battery staple").unwrap();
    let result = decrypt_mnemonic(&encrypted, "wrong horse battery staple");
    assert!(result.is_err(), "Decryption with wrong password should fail");
}

#[test]
fn test_empty_password_roundtrip() {
    let encrypted = encrypt_mnemonic(TEST_MNEMONIC, "").unwrap();
    assert!(decrypt_mnemonic(&encrypted, "notempty").is_err());
    assert_eq!(decrypt_mnemonic(&encrypted, "").unwrap().as_str(), TEST_MNEMONIC);
}

#[test]
fn test_tampered_bytes_fail_decryption() {
    let password = "test password";
    let bytes = encrypt_mnemonic(TEST_MNEMONIC, password).unwrap().to_bytes();

    // salt, nonce, ciphertext, tag
    for offset in [0, 16, 28, bytes.len() - 1] {
        let mut tampered = bytes.clone();
        tampered[offset] ^= 0xFF;
        let parsed = EncryptedMnemonic::from_bytes(&tampered).unwrap();
        assert!(
            decrypt_mnemonic(&parsed, password).is_err(),
            "tampering at byte {} should fail decryption",
            offset
        );
    }
}

#[test]
fn test_truncated_blob_rejected() {
    let bytes = encrypt_mnemonic(TEST_MNEMONIC, "pw").unwrap().to_bytes();
    assert!(EncryptedMnemonic::from_bytes(&bytes[..20]).is_err());
    assert!(EncryptedMnemonic::from_bytes(&[]).is_err());
}

#[test]
fn test_signer_with_wrong_password_not_built() {
    let encrypted = encrypt_mnemonic(TEST_MNEMONIC, "right").unwrap();
    let result =
        Signer::software_from_encrypted(NetworkParameters::bitcoin_mainnet(), &encrypted, "left");
    assert!(matches!(result, Err(SignerError::InvalidPassword)));
}

#[test]
fn test_zeroize_works_on_mnemonic_copy() {
    let signer = Signer::software(NetworkParameters::bitcoin_mainnet(), TEST_MNEMONIC).unwrap();
    let mut phrase: String = signer.get_mnemonic("").unwrap().unwrap().to_string();
    phrase.zeroize();
    assert!(phrase.is_empty());
}

// ============================================================================
// 2. Private key isolation
// ============================================================================

#[test]
fn test_watch_only_has_nothing_to_leak() {
    let signer = Signer::watch_only(
        NetworkParameters::liquid_mainnet(),
        DeviceDescriptor::watch_only(),
    )
    .unwrap();
    assert!(signer.get_mnemonic("").unwrap().is_none());
    assert!(matches!(
        signer.sign_hash(&[0], &[1u8; 32]),
        Err(SignerError::NoPrivateKey)
    ));
    assert!(!signer.has_master_blinding_key());
}

#[test]
fn test_hardware_signer_never_exposes_mnemonic() {
    let net = NetworkParameters::bitcoin_mainnet();
    let device = Arc::new(FakeDevice::from_mnemonic(net.network_kind(), TEST_MNEMONIC));
    let signer = Signer::hardware(net, hardware_descriptor(AeProtocolSupport::None), device).unwrap();
    assert!(signer.get_mnemonic("").unwrap().is_none());
}

#[test]
fn test_blinding_key_cannot_be_overwritten() {
    let signer = Signer::software(NetworkParameters::liquid_mainnet(), TEST_MNEMONIC).unwrap();
    let before = signer.get_master_blinding_key().unwrap().clone();
    for attempt in ["00".repeat(32), "ff".repeat(32), before.to_hex()] {
        assert!(signer.set_master_blinding_key(&attempt).is_err());
    }
    assert_eq!(signer.get_master_blinding_key().unwrap(), &before);
}

// ============================================================================
// 3. Malformed inputs
// ============================================================================

#[test]
fn test_malformed_secrets_rejected() {
    let net = NetworkParameters::bitcoin_mainnet();
    for input in [
        "",
        "   ",
        "xpub",
        "abandon abandon",
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon",
        "\u{0}\u{1}\u{2}",
        "tpubD6NzVbkrYhZ4X",
    ] {
        assert!(
            Signer::software(net.clone(), input).is_err(),
            "input {:?} should be rejected",
            input
        );
    }
}

#[test]
fn test_malformed_descriptors_rejected() {
    for json in ["", "42", "{\"supports_ae_protocol\": 7}", "{\"device\": 3, \"name\": 1}"] {
        assert!(
            DeviceDescriptor::from_json(json).is_err(),
            "descriptor {:?} should be rejected",
            json
        );
    }
}

#[test]
fn test_malformed_blinding_keys_rejected() {
    for input in ["", "zz", "0".repeat(63).as_str(), "00".repeat(33).as_str()] {
        assert!(MasterBlindingKey::from_hex(input).is_err());
    }
}

#[test]
fn test_garbage_device_responses_rejected() {
    let net = NetworkParameters::bitcoin_mainnet();
    let responses = vec![
        Ok(DeviceResponse::Xpub(String::new())),
        Ok(DeviceResponse::Signature(vec![])),
        Ok(DeviceResponse::Signature(vec![0xFF; 64])),
        Ok(DeviceResponse::SignerCommitment(vec![0x02; 33])),
    ];
    let device = Arc::new(FakeDevice::scripted(responses));
    let signer = Signer::hardware(net, hardware_descriptor(AeProtocolSupport::None), device).unwrap();

    assert!(matches!(signer.get_xpub(&[]), Err(SignerError::DeviceProtocol(_))));
    for _ in 0..3 {
        assert!(matches!(
            signer.sign_hash(&[0], &[1u8; 32]),
            Err(SignerError::DeviceProtocol(_))
        ));
    }
}

// ============================================================================
// 4. Secrets stay out of logs
// ============================================================================

#[test]
fn test_debug_output_redacted() {
    let signer = Signer::software(NetworkParameters::liquid_mainnet(), TEST_MNEMONIC).unwrap();
    let key = signer.get_master_blinding_key().unwrap();

    let signer_debug = format!("{:?}", signer);
    let key_debug = format!("{:?}", key);
    assert!(!signer_debug.contains("abandon"));
    assert!(!key_debug.contains(&key.to_hex()));
}

#[test]
fn test_error_messages_do_not_echo_secrets() {
    let net = NetworkParameters::bitcoin_mainnet();
    let almost = TEST_MNEMONIC.replace("about", "zebra");
    let err = Signer::software(net, &almost).unwrap_err();
    assert!(!err.to_string().contains("abandon"));

    let encrypted = encrypt_mnemonic(TEST_MNEMONIC, "pw").unwrap();
    let err = decrypt_mnemonic(&encrypted, "nope").unwrap_err();
    assert!(!err.to_string().contains("abandon"));
}
