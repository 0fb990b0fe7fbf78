//! End-to-end session flows across kestrel-core and kestrel-signer.
//!
//! Each test walks the path a wallet session takes: load network config,
//! build a signer for the user's device, derive, sign, and (on Liquid)
//! install blinding keys.

use std::io::Write;
use std::sync::Arc;

use bitcoin::hashes::{sha256, Hash};
use kestrel_core::{
    display_path, encrypt_mnemonic, generate_mnemonic, EncryptedMnemonic, NetworkParameters,
    WordCount,
    CLIENT_SECRET_PATH, HARDENED, LOGIN_PATH,
};
use kestrel_signer::test_utils::{FakeDevice, TEST_MNEMONIC};
use kestrel_signer::{
    AeProtocolSupport, Device, DeviceDescriptor, LiquidSupport, Signer, SignerError,
};
use secp256k1::{Message, Secp256k1};

const LIQUID_CONFIG: &str = r#"
[network]
name = "liquid"
mainnet = true
liquid = true
"#;

const JADE_JSON: &str = r#"{
    "device": {
        "name": "Jade",
        "device_type": "hardware",
        "supports_low_r": true,
        "supports_arbitrary_scripts": true,
        "supports_liquid": 1,
        "supports_host_unblinding": true,
        "supports_ae_protocol": 2,
        "firmware": "1.0.30"
    }
}"#;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn verify(signer: &Signer, path: &[u32], hash: [u8; 32]) {
    let sig = signer.sign_hash(path, &hash).unwrap();
    let pubkey = signer.get_xpub(path).unwrap().public_key;
    Secp256k1::verification_only()
        .verify_ecdsa(&Message::from_digest(hash), &sig, &pubkey)
        .unwrap();
}

// ============================================================================
// Software session on Liquid, configured from a file
// ============================================================================

#[test]
fn test_liquid_software_session_from_config() {
    let file = config_file(LIQUID_CONFIG);
    let network = NetworkParameters::from_file(file.path()).unwrap();
    assert!(network.is_liquid());
    assert_eq!(network.btc_version(), 57);

    let signer = Signer::software(network, TEST_MNEMONIC).unwrap();

    // Login material comes from the reserved paths.
    let login = signer.get_bip32_xpub(&LOGIN_PATH).unwrap();
    let client_secret = signer.get_bip32_xpub(&CLIENT_SECRET_PATH).unwrap();
    assert!(login.starts_with("xpub"));
    assert_ne!(login, client_secret);

    let path = [HARDENED + 49, HARDENED + 1776, HARDENED, 0, 0];
    let hash = sha256::Hash::hash(b"liquid tx").to_byte_array();
    verify(&signer, &path, hash);

    // Blinding key was derived from the seed; the pubkey for an output
    // script is reproducible by a watch-only session given the master key.
    let script = hex::decode("a914f1c3b9a431134cb90a500ec06e0067cfa9b8bba787").unwrap();
    let master_hex = signer.get_master_blinding_key().unwrap().to_hex();

    let watcher = Signer::watch_only(
        NetworkParameters::from_file(file.path()).unwrap(),
        DeviceDescriptor::watch_only(),
    )
    .unwrap();
    watcher.set_master_blinding_key(&master_hex).unwrap();
    assert_eq!(
        watcher.get_blinding_pubkey_from_script(&script).unwrap(),
        signer.get_blinding_pubkey_from_script(&script).unwrap()
    );
}

// ============================================================================
// Hardware session from a JSON device record
// ============================================================================

#[test]
fn test_hardware_session_with_mandatory_anti_exfil() {
    let network = NetworkParameters::liquid_testnet();
    let descriptor = DeviceDescriptor::from_json(JADE_JSON).unwrap();
    assert_eq!(descriptor.supports_ae_protocol, AeProtocolSupport::Mandatory);

    let device = Arc::new(FakeDevice::from_mnemonic(network.network_kind(), TEST_MNEMONIC));
    let channel: Arc<dyn Device> = device.clone();
    let signer = Signer::from_device(network.clone(), descriptor, Some(channel)).unwrap();
    assert!(signer.is_hardware());
    assert_eq!(signer.get_liquid_support(), LiquidSupport::Lite);

    let software = Signer::software(network, TEST_MNEMONIC).unwrap();
    let account = [HARDENED + 84, HARDENED + 1, HARDENED];
    assert_eq!(
        signer.get_bip32_xpub(&account).unwrap(),
        software.get_bip32_xpub(&account).unwrap()
    );

    verify(&signer, &account, [0x10; 32]);

    // The hardware session starts without a blinding key; the host installs
    // the one the device exported.
    assert!(!signer.has_master_blinding_key());
    let exported = software.get_master_blinding_key().unwrap().to_hex();
    signer.set_master_blinding_key(&exported).unwrap();
    assert_eq!(
        signer.get_master_blinding_key().unwrap(),
        software.get_master_blinding_key().unwrap()
    );

    assert!(signer.get_mnemonic("").unwrap().is_none());
}

// ============================================================================
// Watch-only session
// ============================================================================

#[test]
fn test_watch_only_session_tracks_software_account() {
    let network = NetworkParameters::bitcoin_testnet();
    let software = Signer::software(network.clone(), TEST_MNEMONIC).unwrap();
    let account = [HARDENED + 84, HARDENED + 1, HARDENED];
    let account_xpub = software.get_bip32_xpub(&account).unwrap();
    assert!(account_xpub.starts_with("tpub"));

    let watcher =
        Signer::watch_only_with_xpub(network, DeviceDescriptor::watch_only(), &account_xpub).unwrap();

    for index in 0..5u32 {
        let full = [account[0], account[1], account[2], 0, index];
        assert_eq!(
            watcher.get_xpub(&[0, index]).unwrap(),
            software.get_xpub(&full).unwrap(),
            "mismatch at {}",
            display_path(&full)
        );
    }
    assert!(matches!(
        watcher.sign_hash(&[0, 0], &[1u8; 32]),
        Err(SignerError::NoPrivateKey)
    ));
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn test_fresh_wallet_backup_and_restore() {
    let network = NetworkParameters::bitcoin_mainnet();
    let mnemonic = generate_mnemonic(WordCount::Twelve).unwrap().to_string();
    let password = "long enough passphrase";

    let original = Signer::software_with_password(network.clone(), &mnemonic, password).unwrap();
    let phrase = original.get_mnemonic(password).unwrap().unwrap();
    let stored = encrypt_mnemonic(&phrase, password).unwrap().to_bytes();

    let backup = EncryptedMnemonic::from_bytes(&stored).unwrap();
    let restored = Signer::software_from_encrypted(network, &backup, password).unwrap();
    assert_eq!(
        restored.get_master_fingerprint().unwrap(),
        original.get_master_fingerprint().unwrap()
    );
    assert_eq!(
        restored.get_mnemonic(password).unwrap().unwrap().as_str(),
        mnemonic
    );
}
