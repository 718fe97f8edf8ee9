#![no_main]
use libfuzzer_sys::fuzz_target;

use flash_remoting::amf0::read::AMF0Decoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = AMF0Decoder::default();
    let _ = decoder.parse_single_element(data);
});
