//! Derive account xpubs and sign a test hash with a software signer.
//!
//! Usage:
//!   cargo run --example derive_xpub -- <network.toml> "<mnemonic>"
//!
//! Set `RUST_LOG=debug` to see signer construction and blinding logs.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bitcoin::hashes::{sha256, Hash};
use kestrel_core::{display_path, NetworkParameters, HARDENED};
use kestrel_signer::Signer;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(config), Some(mnemonic)) = (args.next(), args.next()) else {
        bail!("usage: derive_xpub <network.toml> \"<mnemonic>\"");
    };

    let network = NetworkParameters::from_file(&PathBuf::from(&config))
        .with_context(|| format!("loading network config from {}", config))?;
    let signer = Signer::software(network, &mnemonic).context("creating signer")?;

    println!("network:     {}", signer.network().name);
    println!("fingerprint: {}", signer.get_master_fingerprint()?);

    let coin = if signer.network().is_main_net() { 0 } else { 1 };
    for account in 0..3 {
        let path = [HARDENED + 84, HARDENED + coin, HARDENED + account];
        println!("{}  {}", display_path(&path), signer.get_bip32_xpub(&path)?);
    }

    let hash = sha256::Hash::hash(b"kestrel").to_byte_array();
    let signature = signer.sign_hash(&[HARDENED + 84, HARDENED + coin, HARDENED, 0, 0], &hash)?;
    println!("signature:   {}", hex::encode(signature.serialize_compact()));

    if signer.is_liquid() {
        let script = hex::decode("0014751e76e8199196d454941c45d1b3a323f1433bd6")?;
        println!(
            "blinding pubkey for P2WPKH: {}",
            hex::encode(signer.get_blinding_pubkey_from_script(&script)?)
        );
    }
    Ok(())
}
