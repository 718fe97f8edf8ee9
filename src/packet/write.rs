use crate::amf0::write::{write_short_string, AMF0Encoder};
use crate::amf0::type_marker::TypeMarker;
use crate::amf3::write::AMF3Encoder;
use crate::errors::{WriteError, GEN_PAYLOAD_TOO_LARGE};
use crate::options::CodecOptions;
use crate::types::{Packet, PacketHeader, PacketMessage, Value};

use cookie_factory::bytes::{be_u16, be_u32, be_u8};
use cookie_factory::combinator::slice;
use cookie_factory::{gen_simple, GenError, GenResult, WriteContext};

use std::ops::Deref;

/// Encode a packet envelope
///
/// Each body is encoded into a forked session first, so its byte length can
/// be written ahead of it and its references stay local.
pub fn write_packet(packet: &Packet, options: &CodecOptions) -> Result<Vec<u8>, WriteError> {
    gen_simple(
        |out: WriteContext<Vec<u8>>| write_packet_into(out, packet, options),
        Vec::new(),
    )
    .map_err(WriteError::from)
}

fn write_packet_into(
    out: WriteContext<Vec<u8>>,
    packet: &Packet,
    options: &CodecOptions,
) -> GenResult<Vec<u8>> {
    let mut out = be_u16(packet.version as u16)(out)?;

    out = be_u16(packet.headers.len() as u16)(out)?;
    for header in &packet.headers {
        out = write_header_into(out, header, options)?;
    }

    out = be_u16(packet.messages.len() as u16)(out)?;
    for message in &packet.messages {
        out = write_message_into(out, message, options)?;
    }

    Ok(out)
}

fn write_header_into(
    out: WriteContext<Vec<u8>>,
    header: &PacketHeader,
    options: &CodecOptions,
) -> GenResult<Vec<u8>> {
    if header.name.len() > u16::MAX as usize {
        return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
    }
    let out = write_short_string(&header.name)(out)?;
    let out = be_u8(header.required as u8)(out)?;

    // Fresh reference tables for every header body
    let encoder = AMF0Encoder::from_options(options);
    let body = gen_simple(
        |out| encoder.write_value_into(out, &header.value),
        Vec::new(),
    )?;

    let out = be_u32(body.len() as u32)(out)?;
    slice(body)(out)
}

fn write_message_into(
    out: WriteContext<Vec<u8>>,
    message: &PacketMessage,
    options: &CodecOptions,
) -> GenResult<Vec<u8>> {
    if message.target.len() > u16::MAX as usize || message.response.len() > u16::MAX as usize {
        return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
    }
    let out = write_short_string(&message.target)(out)?;
    let out = write_short_string(&message.response)(out)?;

    // Fresh reference tables for every message body
    let body = match (message.response.is_empty(), message.contents.deref()) {
        // A request: the argument list itself never enters the reference
        // table, and is always written in amf0
        (false, Value::Array(dense, assoc)) if assoc.borrow().is_empty() => {
            let encoder = AMF0Encoder::from_options(options);
            gen_simple(
                |out| encoder.write_argument_list_into(out, dense),
                Vec::new(),
            )?
        }
        _ if options.amf3 => {
            // Responses of an amf3 session go through the escape
            let encoder = AMF3Encoder::from_options(options);
            gen_simple(
                |out| {
                    let out = be_u8(TypeMarker::AMF3 as u8)(out)?;
                    encoder.write_value_into(out, &message.contents)
                },
                Vec::new(),
            )?
        }
        _ => {
            let encoder = AMF0Encoder::from_options(options);
            gen_simple(
                |out| encoder.write_value_into(out, &message.contents),
                Vec::new(),
            )?
        }
    };

    let out = be_u32(body.len() as u32)(out)?;
    slice(body)(out)
}
