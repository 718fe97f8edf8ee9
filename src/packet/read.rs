use crate::amf0::read::{parse_short_string, AMF0Decoder};
use crate::amf0::type_marker::TypeMarker;
use crate::errors::Error;
use crate::nom_utils::AMFResult;
use crate::options::CodecOptions;
use crate::types::{ClientVersion, Packet, PacketHeader, PacketMessage};

use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::Err;

use std::convert::TryFrom;

/// Parse a packet envelope
///
/// The byte length words ahead of each body are read but not trusted; the
/// cursor after decoding the body governs, as some peers fill the field with
/// garbage.
pub fn parse_packet<'a>(i: &'a [u8], options: &CodecOptions) -> AMFResult<'a, Packet> {
    let (i, version_word) = be_u16(i)?;
    let version = ClientVersion::try_from(version_word)
        .map_err(|_| Err::Error(Error::BadClientVersion(i, version_word)))?;

    let (i, header_count) = be_u16(i)?;
    let mut headers = Vec::with_capacity(header_count as usize);
    let mut i = i;
    for _ in 0..header_count {
        let (j, header) = parse_header(i, options)?;
        headers.push(header);
        i = j;
    }

    let (j, message_count) = be_u16(i)?;
    let mut messages = Vec::with_capacity(message_count as usize);
    let mut i = j;
    for _ in 0..message_count {
        let (j, message) = parse_message(i, options)?;
        messages.push(message);
        i = j;
    }

    Ok((
        i,
        Packet {
            version,
            headers,
            messages,
        },
    ))
}

fn parse_header<'a>(i: &'a [u8], options: &CodecOptions) -> AMFResult<'a, PacketHeader> {
    let (i, name) = parse_short_string(i)?;
    let (i, required) = be_u8(i)?;
    let (i, _byte_length) = be_u32(i)?;

    // Fresh reference tables for every header body
    let mut decoder = AMF0Decoder::from_options(options);
    let (i, value) = decoder.parse_single_element(i)?;

    Ok((
        i,
        PacketHeader {
            name,
            required: required != 0,
            value,
        },
    ))
}

fn parse_message<'a>(i: &'a [u8], options: &CodecOptions) -> AMFResult<'a, PacketMessage> {
    let (i, target) = parse_short_string(i)?;
    let (i, response) = parse_short_string(i)?;
    let (i, _byte_length) = be_u32(i)?;

    // Fresh reference tables for every message body
    let mut decoder = AMF0Decoder::from_options(options);

    let (i, contents) = if !response.is_empty() {
        // A request: the body is an argument list whose own identity never
        // entered the encoder's reference table
        let (j, marker) = be_u8(i)?;
        if marker == TypeMarker::Array as u8 {
            decoder.parse_element_strict_array(j, false)?
        } else {
            decoder.parse_single_element(i)?
        }
    } else {
        decoder.parse_single_element(i)?
    };

    Ok((
        i,
        PacketMessage {
            target,
            response,
            contents,
        },
    ))
}
