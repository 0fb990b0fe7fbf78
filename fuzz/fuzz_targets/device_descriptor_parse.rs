#![no_main]

use kestrel_signer::DeviceDescriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Device records arrive from the transport as JSON.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(descriptor) = DeviceDescriptor::from_json(s) {
            let _ = descriptor.is_watch_only();
        }
    }
});
