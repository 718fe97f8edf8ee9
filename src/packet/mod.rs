//! The AMF0 NetConnection packet envelope
//!
//! A packet is a version word, a list of headers and a list of messages.
//! Every header and message body is decoded and encoded in a forked session
//! with its own reference tables, so references never cross body boundaries.

/// Decoding of packets
pub mod read;
/// Encoding of packets
pub mod write;
