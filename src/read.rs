//! Top level decoding entry points

use crate::amf0::read::AMF0Decoder;
use crate::amf3::read::AMF3Decoder;
use crate::errors::Error;
use crate::options::CodecOptions;
use crate::packet;
use crate::types::{Packet, Value};

use nom::Err;
use std::rc::Rc;

/// Decode a single value from `i`, in the format the options select
///
/// Trailing bytes after the value are ignored.
pub fn decode<'a>(i: &'a [u8], options: &CodecOptions) -> Result<Rc<Value>, Err<Error<'a>>> {
    if options.amf3 {
        let mut decoder = AMF3Decoder::from_options(options);
        decoder.parse_single_element(i).map(|(_, value)| value)
    } else {
        let mut decoder = AMF0Decoder::from_options(options);
        decoder.parse_single_element(i).map(|(_, value)| value)
    }
}

/// Decode a packet envelope from `i`
pub fn decode_packet<'a>(i: &'a [u8], options: &CodecOptions) -> Result<Packet, Err<Error<'a>>> {
    packet::read::parse_packet(i, options).map(|(_, packet)| packet)
}
