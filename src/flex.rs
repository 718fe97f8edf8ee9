//! The flex wrapper classes recognised natively by the amf3 codec
//!
//! Both wrappers are externalized classes whose body is a redundant type
//! marker followed by the wrapped payload. Serializing one consumes two
//! object reference slots: one for the wrapper, one for the payload.

use crate::types::{Attribute, ClassDefinition};
use enumset::EnumSet;

/// Alias of the flex array wrapper
pub const ARRAY_COLLECTION: &str = "flex.messaging.io.ArrayCollection";
/// Alias of the flex object wrapper
pub const OBJECT_PROXY: &str = "flex.messaging.io.ObjectProxy";

/// Whether `alias` names one of the wrapper classes handled by the codec itself
pub fn is_wrapper_alias(alias: &str) -> bool {
    alias == ARRAY_COLLECTION || alias == OBJECT_PROXY
}

/// The trait emitted for ArrayCollection wrappers
pub fn array_collection_def() -> ClassDefinition {
    ClassDefinition {
        name: ARRAY_COLLECTION.to_string(),
        attributes: EnumSet::only(Attribute::External),
        static_properties: Vec::new(),
    }
}

/// The trait emitted for ObjectProxy wrappers
pub fn object_proxy_def() -> ClassDefinition {
    ClassDefinition {
        name: OBJECT_PROXY.to_string(),
        attributes: EnumSet::only(Attribute::External),
        static_properties: Vec::new(),
    }
}
