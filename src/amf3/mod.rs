//! The AMF3 value codec

/// Hook types for externalized (client serialized) classes
pub mod custom_encoder;
pub(crate) mod length;
/// Decoding of AMF3 values
pub mod read;
pub(crate) mod type_marker;
/// Encoding of AMF3 values
pub mod write;

/// The low bit of a u29 header: set for inline data, clear for a reference
pub(crate) const REFERENCE_FLAG: u32 = 0x01;

/// Largest value representable as an AMF3 integer, `2^28 - 1`
pub(crate) const MAX_INT: i32 = 0x0FFF_FFFF;
/// Smallest value representable as an AMF3 integer, `-2^28`
pub(crate) const MIN_INT: i32 = -0x1000_0000;

/// Largest index encodable in a u29 reference header
pub(crate) const MAX_REFERENCE: usize = 0x0FFF_FFFF;

/// Trait headers may carry at most `2^24` static attribute names
pub(crate) const MAX_STATIC_PROPERTIES: usize = 1 << 24;
