#![no_main]
use libfuzzer_sys::fuzz_target;

use flash_remoting::CodecOptions;

fuzz_target!(|data: &[u8]| {
    let _ = flash_remoting::decode_packet(data, &CodecOptions::default());
});
