use crate::amf3::type_marker::TypeMarker;
use crate::amf3::{
    MAX_INT, MAX_REFERENCE, MAX_STATIC_PROPERTIES, MIN_INT, REFERENCE_FLAG,
};
use crate::cache::{ElementCache, ObjectCache};
use crate::class_def::ClassDefMapper;
use crate::errors::{GEN_MISSING_EXTERNAL_ENCODER, GEN_PAYLOAD_TOO_LARGE, GEN_TRAIT_TOO_LARGE};
use crate::flex;
use crate::options::CodecOptions;
use crate::types::{Attribute, ClassDefinition, Element, Value};

use cookie_factory::bytes::{be_f64, be_u8};
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::{GenError, GenResult, SerializeFn, WriteContext};

use enumset::EnumSet;
use std::cell::RefCell;
use std::io::Write;
use std::ops::Deref;
use std::rc::Rc;

pub(crate) fn write_type_marker<W: Write>(marker: TypeMarker) -> impl SerializeFn<W> {
    be_u8(marker as u8)
}

/// Write a u29 in its minimal form, masking the input to 29 bits
pub(crate) fn write_u29<W: Write>(value: u32) -> impl SerializeFn<W> {
    let value = value & 0x1FFF_FFFF;

    let mut bytes = Vec::with_capacity(4);
    if value < 0x80 {
        bytes.push(value as u8);
    } else if value < 0x4000 {
        bytes.push((value >> 7 & 0x7F) as u8 | 0x80);
        bytes.push((value & 0x7F) as u8);
    } else if value < 0x0020_0000 {
        bytes.push((value >> 14 & 0x7F) as u8 | 0x80);
        bytes.push((value >> 7 & 0x7F) as u8 | 0x80);
        bytes.push((value & 0x7F) as u8);
    } else {
        bytes.push((value >> 22 & 0x7F) as u8 | 0x80);
        bytes.push((value >> 15 & 0x7F) as u8 | 0x80);
        bytes.push((value >> 8 & 0x7F) as u8 | 0x80);
        bytes.push((value & 0xFF) as u8);
    }

    slice(bytes)
}

/// Handles encoding AMF3
pub struct AMF3Encoder {
    /// The table used to cache repeated byte strings
    pub string_reference_table: ElementCache<Vec<u8>>,
    /// The table used to cache repeated trait definitions
    pub trait_reference_table: ElementCache<ClassDefinition>,
    /// The table used to cache repeated objects, keyed by identity
    pub object_reference_table: ObjectCache,
    /// The registry consulted for externalized classes and coercions
    pub class_def_mapper: Rc<ClassDefMapper>,
    /// Wrap arrays in ArrayCollection
    pub use_collections: bool,
    /// Wrap anonymous objects in ObjectProxy
    pub use_proxies: bool,
    /// Emit references for repeated values
    pub use_references: bool,
    /// Emit the legacy XMLDocument flavour instead of E4X
    pub use_legacy_xml: bool,
    /// Keep leading underscore attributes of anonymous objects
    pub include_private: bool,
}

impl Default for AMF3Encoder {
    fn default() -> Self {
        Self {
            string_reference_table: ElementCache::default(),
            trait_reference_table: ElementCache::default(),
            object_reference_table: ObjectCache::default(),
            class_def_mapper: Rc::new(ClassDefMapper::default()),
            use_collections: false,
            use_proxies: false,
            use_references: true,
            use_legacy_xml: false,
            include_private: false,
        }
    }
}

impl AMF3Encoder {
    pub(crate) fn from_options(options: &CodecOptions) -> Self {
        Self {
            string_reference_table: ElementCache::default(),
            trait_reference_table: ElementCache::default(),
            object_reference_table: ObjectCache::default(),
            class_def_mapper: Rc::clone(&options.class_def_mapper),
            use_collections: options.use_collections,
            use_proxies: options.use_proxies,
            use_references: options.use_references,
            use_legacy_xml: options.use_legacy_xml,
            include_private: options.include_private,
        }
    }

    /// Write a single value, dispatching on its variant
    pub fn write_value_element<'a, 'b: 'a, W: Write + 'a>(
        &'a self,
        v: &'b Rc<Value>,
    ) -> impl SerializeFn<W> + 'a {
        move |out| self.write_value_into(out, v)
    }

    /// Write a string through the string reference table
    ///
    /// Exposed for the encoder hooks of externalized classes.
    pub fn write_string<'a, 'b: 'a, W: Write + 'a>(&'a self, s: &'b str) -> impl SerializeFn<W> + 'a {
        move |out| self.write_byte_string_into(out, s.as_bytes())
    }

    /// Write an integer value with its marker, falling back to a double
    /// outside the 29 bit window
    pub fn write_int<'a, W: Write + 'a>(&'a self, i: i32) -> impl SerializeFn<W> + 'a {
        move |out| self.write_integer_into(out, i)
    }

    pub(crate) fn write_value_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
    ) -> GenResult<W> {
        match v.deref() {
            Value::Undefined => write_type_marker(TypeMarker::Undefined)(out),
            Value::Null => write_type_marker(TypeMarker::Null)(out),
            Value::Bool(false) => write_type_marker(TypeMarker::False)(out),
            Value::Bool(true) => write_type_marker(TypeMarker::True)(out),
            Value::Integer(n) => self.write_integer_into(out, *n),
            Value::Number(n) => tuple((write_type_marker(TypeMarker::Number), be_f64(*n)))(out),
            Value::String(s) => {
                let out = write_type_marker(TypeMarker::String)(out)?;
                self.write_byte_string_into(out, s.as_bytes())
            }
            Value::Date(millis, _) => self.write_date_into(out, v, *millis),
            Value::ByteArray(bytes) => self.write_byte_array_into(out, v, bytes),
            Value::XML(content, document) => self.write_xml_into(out, v, content, *document),
            Value::Array(dense, assoc) => self.write_array_into(out, v, dense, assoc),
            Value::Object(members, class_def) => self.write_object_into(out, v, members, class_def),
            Value::ArrayCollection(inner) => match inner.deref() {
                Value::Array(_, _) => self.write_wrapped_array_into(out, Some(v), inner),
                _ => self.write_value_into(out, inner),
            },
            Value::ObjectProxy(inner) => match inner.deref() {
                Value::Object(_, _) => self.write_wrapped_object_into(out, Some(v), inner),
                _ => self.write_value_into(out, inner),
            },
            // Already inside an amf3 session, the escape adds nothing
            Value::AMF3(inner) => self.write_value_into(out, inner),
        }
    }

    fn write_integer_into<W: Write>(&self, out: WriteContext<W>, n: i32) -> GenResult<W> {
        if (MIN_INT..=MAX_INT).contains(&n) {
            tuple((write_type_marker(TypeMarker::Integer), write_u29(n as u32)))(out)
        } else {
            tuple((write_type_marker(TypeMarker::Number), be_f64(f64::from(n))))(out)
        }
    }

    /// Write a byte string through the string reference table
    ///
    /// The empty string is always the inline singleton header; it never
    /// enters the table.
    pub(crate) fn write_byte_string_into<W: Write>(
        &self,
        out: WriteContext<W>,
        s: &[u8],
    ) -> GenResult<W> {
        if s.is_empty() {
            return write_u29(REFERENCE_FLAG)(out);
        }

        if self.use_references {
            if let Some(index) = self.string_reference_table.get_index(&s.to_vec()) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        self.string_reference_table.store(s.to_vec());

        if s.len() > MAX_REFERENCE {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        tuple((
            write_u29(((s.len() as u32) << 1) | REFERENCE_FLAG),
            slice(s),
        ))(out)
    }

    /// Write a trait, as a reference when it was emitted before
    fn write_trait_into<W: Write>(
        &self,
        out: WriteContext<W>,
        class_def: &ClassDefinition,
    ) -> GenResult<W> {
        if self.use_references {
            if let Some(index) = self.trait_reference_table.get_index(class_def) {
                if index < (1 << 27) {
                    return write_u29(((index as u32) << 2) | 0b01)(out);
                }
            }
        }
        self.trait_reference_table.store(class_def.clone());

        if class_def.static_properties.len() >= MAX_STATIC_PROPERTIES {
            return Err(GenError::CustomError(GEN_TRAIT_TOO_LARGE));
        }

        let header: u32 = if class_def.is_external() {
            0b0111
        } else if class_def.is_dynamic() {
            ((class_def.static_properties.len() as u32) << 4) | 0b1011
        } else {
            ((class_def.static_properties.len() as u32) << 4) | 0b0011
        };

        let mut out = write_u29(header)(out)?;
        out = self.write_byte_string_into(out, class_def.name.as_bytes())?;
        if !class_def.is_external() {
            for name in &class_def.static_properties {
                out = self.write_byte_string_into(out, name.as_bytes())?;
            }
        }
        Ok(out)
    }

    fn write_array_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        dense: &RefCell<Vec<Rc<Value>>>,
        assoc: &RefCell<Vec<Element>>,
    ) -> GenResult<W> {
        if self.use_collections {
            return self.write_wrapped_array_into(out, None, v);
        }

        let out = write_type_marker(TypeMarker::Array)(out)?;
        self.write_array_parts_into(out, v, dense, assoc)
    }

    /// Reference-or-inline body of an array, without its type marker
    fn write_array_parts_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        dense: &RefCell<Vec<Rc<Value>>>,
        assoc: &RefCell<Vec<Element>>,
    ) -> GenResult<W> {
        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        // Register before children so cycles terminate
        self.object_reference_table.store(v);

        let dense = dense.borrow();
        let assoc = assoc.borrow();

        let mut out = write_u29(((dense.len() as u32) << 1) | REFERENCE_FLAG)(out)?;
        for element in assoc.iter() {
            out = self.write_byte_string_into(out, element.name.as_bytes())?;
            out = self.write_value_into(out, &element.value)?;
        }
        out = self.write_byte_string_into(out, b"")?;
        for item in dense.iter() {
            out = self.write_value_into(out, item)?;
        }
        Ok(out)
    }

    fn write_object_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        members: &RefCell<Vec<Element>>,
        class_def: &Option<ClassDefinition>,
    ) -> GenResult<W> {
        let anonymous = class_def.as_ref().map(|d| d.name.is_empty()).unwrap_or(true);
        if anonymous && self.use_proxies {
            return self.write_wrapped_object_into(out, None, v);
        }

        let out = write_type_marker(TypeMarker::Object)(out)?;
        self.write_object_parts_into(out, v, members, class_def)
    }

    /// Reference-or-inline body of an object, without its type marker
    fn write_object_parts_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        members: &RefCell<Vec<Element>>,
        class_def: &Option<ClassDefinition>,
    ) -> GenResult<W> {
        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        // Register before children so cycles terminate
        self.object_reference_table.store(v);

        match class_def {
            Some(def) if def.is_external() => self.write_external_into(out, members, def),
            Some(def) if !def.name.is_empty() => self.write_typed_body_into(out, members, def),
            _ => self.write_dynamic_body_into(out, members),
        }
    }

    fn write_external_into<W: Write>(
        &self,
        out: WriteContext<W>,
        members: &RefCell<Vec<Element>>,
        class_def: &ClassDefinition,
    ) -> GenResult<W> {
        let encoder = match self.class_def_mapper.external_encoder(&class_def.name) {
            Some(encoder) => encoder,
            None => return Err(GenError::CustomError(GEN_MISSING_EXTERNAL_ENCODER)),
        };

        let out = self.write_trait_into(out, class_def)?;
        let members = members.borrow();
        let body = encoder.encode(members.as_slice(), &Some(class_def.clone()), self);
        slice(body)(out)
    }

    fn write_typed_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        members: &RefCell<Vec<Element>>,
        class_def: &ClassDefinition,
    ) -> GenResult<W> {
        let mut out = self.write_trait_into(out, class_def)?;
        let members = members.borrow();

        // Static attributes in declaration order, missing ones as undefined
        for name in &class_def.static_properties {
            let value = members
                .iter()
                .find(|e| &e.name == name)
                .map(|e| Rc::clone(&e.value))
                .unwrap_or_else(|| Rc::new(Value::Undefined));
            let value = self
                .class_def_mapper
                .coerce_encoded(&class_def.name, name, value);
            out = self.write_value_into(out, &value)?;
        }

        if class_def.is_dynamic() {
            for element in members
                .iter()
                .filter(|e| !class_def.static_properties.contains(&e.name))
            {
                out = self.write_byte_string_into(out, element.name.as_bytes())?;
                let value = self.class_def_mapper.coerce_encoded(
                    &class_def.name,
                    &element.name,
                    Rc::clone(&element.value),
                );
                out = self.write_value_into(out, &value)?;
            }
            out = self.write_byte_string_into(out, b"")?;
        }

        Ok(out)
    }

    fn write_dynamic_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        members: &RefCell<Vec<Element>>,
    ) -> GenResult<W> {
        let class_def = ClassDefinition {
            name: String::new(),
            attributes: EnumSet::only(Attribute::Dynamic),
            static_properties: Vec::new(),
        };
        let mut out = self.write_trait_into(out, &class_def)?;

        for element in members
            .borrow()
            .iter()
            .filter(|e| self.include_private || !e.name.starts_with('_'))
        {
            out = self.write_byte_string_into(out, element.name.as_bytes())?;
            out = self.write_value_into(out, &element.value)?;
        }
        self.write_byte_string_into(out, b"")
    }

    /// Emit an ArrayCollection around `payload`
    ///
    /// Two object reference slots are consumed: the wrapper slot first (a
    /// reserved placeholder when the wrapping is implicit), then the payload
    /// slot. A repeat of the payload therefore references the second slot.
    fn write_wrapped_array_into<W: Write>(
        &self,
        out: WriteContext<W>,
        wrapper: Option<&Rc<Value>>,
        payload: &Rc<Value>,
    ) -> GenResult<W> {
        let (dense, assoc) = match payload.deref() {
            Value::Array(dense, assoc) => (dense, assoc),
            _ => return self.write_value_into(out, payload),
        };

        let out = write_type_marker(TypeMarker::Object)(out)?;
        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(wrapper.unwrap_or(payload)) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }

        let out = self.write_trait_into(out, &flex::array_collection_def())?;
        match wrapper {
            Some(w) => self.object_reference_table.store(w),
            None => self.object_reference_table.reserve(),
        }

        let out = write_type_marker(TypeMarker::Array)(out)?;
        self.write_array_parts_into(out, payload, dense, assoc)
    }

    /// Emit an ObjectProxy around `payload`, consuming two reference slots
    fn write_wrapped_object_into<W: Write>(
        &self,
        out: WriteContext<W>,
        wrapper: Option<&Rc<Value>>,
        payload: &Rc<Value>,
    ) -> GenResult<W> {
        let (members, class_def) = match payload.deref() {
            Value::Object(members, class_def) => (members, class_def),
            _ => return self.write_value_into(out, payload),
        };

        let out = write_type_marker(TypeMarker::Object)(out)?;
        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(wrapper.unwrap_or(payload)) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }

        let out = self.write_trait_into(out, &flex::object_proxy_def())?;
        match wrapper {
            Some(w) => self.object_reference_table.store(w),
            None => self.object_reference_table.reserve(),
        }

        let out = write_type_marker(TypeMarker::Object)(out)?;
        self.write_object_parts_into(out, payload, members, class_def)
    }

    fn write_date_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        millis: f64,
    ) -> GenResult<W> {
        let out = write_type_marker(TypeMarker::Date)(out)?;

        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        self.object_reference_table.store(v);

        tuple((write_u29(REFERENCE_FLAG), be_f64(millis)))(out)
    }

    fn write_byte_array_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        bytes: &[u8],
    ) -> GenResult<W> {
        let out = write_type_marker(TypeMarker::ByteArray)(out)?;

        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        self.object_reference_table.store(v);

        if bytes.len() > MAX_REFERENCE {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        tuple((
            write_u29(((bytes.len() as u32) << 1) | REFERENCE_FLAG),
            slice(bytes),
        ))(out)
    }

    fn write_xml_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        content: &str,
        document: bool,
    ) -> GenResult<W> {
        let marker = if self.use_legacy_xml || document {
            TypeMarker::XmlDoc
        } else {
            TypeMarker::Xml
        };
        let out = write_type_marker(marker)(out)?;

        if self.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_REFERENCE {
                    return write_u29((index as u32) << 1)(out);
                }
            }
        }
        self.object_reference_table.store(v);

        if content.len() > MAX_REFERENCE {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        tuple((
            write_u29(((content.len() as u32) << 1) | REFERENCE_FLAG),
            slice(content.as_bytes()),
        ))(out)
    }
}
