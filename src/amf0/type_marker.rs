use derive_try_from_primitive::TryFromPrimitive;

/// Type markers used in AMF0
#[derive(TryFromPrimitive, Eq, PartialEq, Debug, Copy, Clone)]
#[repr(u8)]
pub enum TypeMarker {
    /// Number
    Number = 0x00,
    /// Boolean
    Boolean = 0x01,
    /// String (length below 65536)
    String = 0x02,
    /// Anonymous object
    Object = 0x03,
    /// Null
    Null = 0x05,
    /// Undefined
    Undefined = 0x06,
    /// Reference into the object table
    Reference = 0x07,
    /// ECMA (mixed) array
    MixedArray = 0x08,
    /// End of a key/value body
    ObjectEnd = 0x09,
    /// Strict array
    Array = 0x0A,
    /// Date
    Date = 0x0B,
    /// Long string
    LongString = 0x0C,
    /// Legacy XMLDocument
    Xml = 0x0F,
    /// Object with a class alias
    TypedObject = 0x10,
    /// Escape into an embedded amf3 value
    AMF3 = 0x11,
}
