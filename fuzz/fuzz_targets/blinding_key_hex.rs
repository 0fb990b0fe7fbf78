#![no_main]

use kestrel_signer::MasterBlindingKey;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(key) = MasterBlindingKey::from_hex(s) {
            let _ = key.blinding_key_for_script(data);
        }
    }
});
