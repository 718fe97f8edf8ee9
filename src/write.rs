//! Top level encoding entry points

use crate::amf0::write::AMF0Encoder;
use crate::amf3::write::AMF3Encoder;
use crate::errors::WriteError;
use crate::options::CodecOptions;
use crate::packet;
use crate::types::{Packet, Value};

use cookie_factory::gen_simple;
use std::rc::Rc;

/// Encode a single value, in the format the options select
pub fn encode(value: &Rc<Value>, options: &CodecOptions) -> Result<Vec<u8>, WriteError> {
    if options.amf3 {
        let encoder = AMF3Encoder::from_options(options);
        gen_simple(|out| encoder.write_value_into(out, value), Vec::new())
            .map_err(WriteError::from)
    } else {
        let encoder = AMF0Encoder::from_options(options);
        gen_simple(|out| encoder.write_value_into(out, value), Vec::new())
            .map_err(WriteError::from)
    }
}

/// Encode a packet envelope
pub fn encode_packet(packet: &Packet, options: &CodecOptions) -> Result<Vec<u8>, WriteError> {
    packet::write::write_packet(packet, options)
}
