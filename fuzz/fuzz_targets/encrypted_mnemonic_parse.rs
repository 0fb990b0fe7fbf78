#![no_main]

use kestrel_core::crypto::EncryptedMnemonic;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // from_bytes never panics; anything it accepts serializes back unchanged.
    if let Ok(encrypted) = EncryptedMnemonic::from_bytes(data) {
        assert_eq!(encrypted.to_bytes(), data);
    }
});
