#![no_main]

use kestrel_core::NetworkParameters;
use kestrel_signer::Signer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a mnemonic or extended key. Construction returns Ok
    // or Err and never panics; a built signer must answer get_xpub.
    if let Ok(s) = std::str::from_utf8(data) {
        for network in [
            NetworkParameters::bitcoin_mainnet(),
            NetworkParameters::liquid_testnet(),
        ] {
            if let Ok(signer) = Signer::software(network, s) {
                let _ = signer.get_xpub(&[0, 1]);
            }
        }
    }
});
