use core::fmt;
use core::fmt::Formatter;
use derive_try_from_primitive::TryFromPrimitive;
use enumset::EnumSet;
use enumset::EnumSetType;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::iter::FromIterator;
use std::ops::Deref;
use std::rc::Rc;

/// An AMF remoting packet, the envelope exchanged over a NetConnection
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct Packet {
    /// The flash client version that produced or should consume this packet
    pub version: ClientVersion,
    /// The packet headers
    pub headers: Vec<PacketHeader>,
    /// The packet messages
    pub messages: Vec<PacketMessage>,
}

impl Packet {
    /// Create a packet with the given messages, no headers and a Flash 9 version word
    #[inline]
    pub fn new(messages: Vec<PacketMessage>) -> Self {
        Self {
            version: ClientVersion::Flash9,
            headers: Vec::new(),
            messages,
        }
    }
}

/// The flash client versions that may appear in a packet version word
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(TryFromPrimitive, Eq, PartialEq, Debug, Copy, Clone)]
#[repr(u16)]
pub enum ClientVersion {
    /// Flash player 8 and below
    Flash8 = 0x00,
    /// Flash communication server
    FlashCom = 0x01,
    /// Flash player 9+ / AIR
    Flash9 = 0x03,
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientVersion::Flash8 => f.write_str("Flash8"),
            ClientVersion::FlashCom => f.write_str("FlashCom"),
            ClientVersion::Flash9 => f.write_str("Flash9"),
        }
    }
}

/// A single packet header
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct PacketHeader {
    /// The name of the header
    pub name: String,
    /// Whether the receiver must understand this header before processing the packet
    pub required: bool,
    /// The header value
    pub value: Rc<Value>,
}

impl PacketHeader {
    /// Create a new header
    #[inline]
    pub fn new(name: impl Into<String>, required: bool, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            required,
            value: Rc::new(value.into()),
        }
    }
}

/// A single packet message
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct PacketMessage {
    /// The operation or response target, e.g. "EchoService.echo" or "/1/onResult"
    pub target: String,
    /// The response uri the peer should reply to, empty for replies
    pub response: String,
    /// The message body, an argument list for requests
    pub contents: Rc<Value>,
}

impl PacketMessage {
    /// Create a new message
    #[inline]
    pub fn new(
        target: impl Into<String>,
        response: impl Into<String>,
        contents: impl Into<Value>,
    ) -> Self {
        Self {
            target: target.into(),
            response: response.into(),
            contents: Rc::new(contents.into()),
        }
    }
}

/// Represent a named element of an object or associative array
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// The name of the element
    pub name: String,
    /// The value of the element
    pub value: Rc<Value>,
}

impl Element {
    /// Create a new Element
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Rc::new(value.into()),
        }
    }

    /// Get the Value of this element
    pub fn value(&self) -> &Value {
        self.value.deref()
    }

    /// Get the name of this element
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// A single or compound value
///
/// Compound variants keep their children behind `RefCell` so that the decoder
/// can enter a container into the reference table before reading its
/// children; a graph with `x.child == x` round-trips this way.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Represent the number type (amf0) and the double type (amf3)
    Number(f64),
    /// Represent the boolean type (amf0) and the true/false types (amf3)
    Bool(bool),
    /// Represent the string (amf0/amf3) and long string (amf0) types
    String(String),
    /// Represent objects in both amf0 and amf3
    ///
    /// Anonymous objects carry no class definition (or one with an empty
    /// name); externalized objects carry a definition flagged
    /// [`Attribute::External`], with elements produced by the registered
    /// decoder hook
    Object(RefCell<Vec<Element>>, Option<ClassDefinition>),
    /// Represent the null type
    Null,
    /// Represent the undefined type
    Undefined,
    /// Represent every array flavour: strict (amf0), ECMA (amf0) and
    /// dense/associative (amf3)
    ///
    /// The first part holds the ordered dense items, the second the named
    /// associative entries; either may be empty
    Array(RefCell<Vec<Rc<Value>>>, RefCell<Vec<Element>>),
    /// Represent a date as milliseconds since epoch (UTC) plus the timezone
    /// offset word carried by amf0 (decoded but never applied)
    Date(f64, Option<i16>),
    /// Represent the XML types, (content, is_legacy_document)
    ///
    /// amf3 distinguishes the legacy XMLDocument flavour from E4X; amf0 only
    /// has the legacy flavour
    XML(String, bool),
    /// Represent the integer type (u29) (amf3)
    Integer(i32),
    /// Represent the bytearray type (amf3)
    ByteArray(Vec<u8>),
    /// Represent a `flex.messaging.io.ArrayCollection` wrapping an array
    ArrayCollection(Rc<Value>),
    /// Represent a `flex.messaging.io.ObjectProxy` wrapping an object
    ObjectProxy(Rc<Value>),
    /// Represent an amf3 value embedded in an amf0 stream via the escape
    /// marker
    AMF3(Rc<Value>),
}

impl Value {
    /// Create an object value from its elements and optional class definition
    #[inline]
    pub fn object(elements: Vec<Element>, class_def: Option<ClassDefinition>) -> Self {
        Value::Object(RefCell::new(elements), class_def)
    }

    /// Create an array value with only a dense part
    #[inline]
    pub fn array(dense: Vec<Rc<Value>>) -> Self {
        Value::Array(RefCell::new(dense), RefCell::new(Vec::new()))
    }

    /// Create an array value with dense and associative parts
    #[inline]
    pub fn mixed_array(dense: Vec<Rc<Value>>, assoc: Vec<Element>) -> Self {
        Value::Array(RefCell::new(dense), RefCell::new(assoc))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl FromIterator<Value> for Vec<Rc<Value>> {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        iter.into_iter().map(Rc::new).collect()
    }
}

/// A class definition (trait) used in AMF3
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassDefinition {
    /// The alias of the class, empty for anonymous objects
    pub name: String,
    /// The attributes on this trait
    pub attributes: EnumSet<Attribute>,
    /// The names of the static properties defined in this definition, in
    /// declaration order
    pub static_properties: Vec<String>,
}

impl Default for ClassDefinition {
    fn default() -> Self {
        Self {
            name: "Object".to_string(),
            attributes: EnumSet::empty(),
            static_properties: Vec::new(),
        }
    }
}

impl ClassDefinition {
    /// Creates a new ClassDefinition with the given name, and no attributes or properties
    pub fn default_with_name(name: String) -> Self {
        Self {
            name,
            attributes: EnumSet::empty(),
            static_properties: Vec::new(),
        }
    }

    /// Creates a dynamic ClassDefinition with the given name and no properties
    pub fn dynamic_with_name(name: String) -> Self {
        Self {
            name,
            attributes: EnumSet::only(Attribute::Dynamic),
            static_properties: Vec::new(),
        }
    }

    /// Whether objects of this class externalize their own body
    pub fn is_external(&self) -> bool {
        self.attributes.contains(Attribute::External)
    }

    /// Whether objects of this class may carry properties beyond the static set
    pub fn is_dynamic(&self) -> bool {
        self.attributes.contains(Attribute::Dynamic)
    }
}

/// Encodes the possible attributes that can be given to a trait
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(EnumSetType, Debug)]
pub enum Attribute {
    /// If a trait is dynamic then the object it constructs may have additional properties other than the ones specified in the trait
    Dynamic,
    /// If a trait is external then it requires custom serialization and deserialization support
    External,
    /// If a trait is amf3 then the amf0 encoder switches to amf3 for objects of this class
    Amf3,
}
