//! A bidirectional AMF0/AMF3 codec for flash remoting
//!
//! Values are decoded into the [`Value`] enum and encoded back, with full
//! support for the session reference tables that make shared and cyclic
//! object graphs round-trip, the trait (class definition) protocol used by
//! typed and externalized objects, the `flex.messaging.io` wrapper classes,
//! and the AMF0 NetConnection packet envelope with its amf3 escape.
//!
//! # Decoding
//! ```
//! use flash_remoting::CodecOptions;
//!
//! let options = CodecOptions::default().amf3();
//! let value = flash_remoting::decode(&[0x04, 0x2A], &options).unwrap();
//! assert_eq!(*value, flash_remoting::Value::Integer(42));
//! ```
//!
//! # Encoding
//! ```
//! use flash_remoting::{CodecOptions, Value};
//! use std::rc::Rc;
//!
//! let options = CodecOptions::default().amf3();
//! let bytes = flash_remoting::encode(&Rc::new(Value::Integer(42)), &options).unwrap();
//! assert_eq!(bytes, vec![0x04, 0x2A]);
//! ```
#![deny(missing_docs)]

/// Reading and writing of AMF0 values
pub mod amf0;
/// Reading and writing of AMF3 values
pub mod amf3;
/// Encoder side reference tables
pub mod cache;
/// The class definition registry
pub mod class_def;
/// Error types
pub mod errors;
/// The flex wrapper classes
pub mod flex;
/// Shared parser plumbing
pub mod nom_utils;
/// Session settings
pub mod options;
/// The NetConnection packet envelope
pub mod packet;
/// Top level decoding entry points
pub mod read;
/// Value and class definition types
pub mod types;
/// Top level encoding entry points
pub mod write;

pub use crate::errors::{Error, WriteError};
pub use crate::options::CodecOptions;
pub use crate::read::{decode, decode_packet};
pub use crate::types::{
    Attribute, ClassDefinition, ClientVersion, Element, Packet, PacketHeader, PacketMessage, Value,
};
pub use crate::write::{encode, encode_packet};
