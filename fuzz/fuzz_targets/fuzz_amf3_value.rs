#![no_main]
use libfuzzer_sys::fuzz_target;

use flash_remoting::amf3::read::AMF3Decoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = AMF3Decoder::default();
    let _ = decoder.parse_single_element(data);
});
