use crate::amf0::type_marker::TypeMarker;
use crate::amf0::{MAX_OBJECT_REFERENCES, OBJECT_END};
use crate::amf3::write::AMF3Encoder;
use crate::cache::ObjectCache;
use crate::errors::GEN_PAYLOAD_TOO_LARGE;
use crate::options::CodecOptions;
use crate::types::{Attribute, ClassDefinition, Element, Value};

use cookie_factory::bytes::{be_f64, be_i16, be_u16, be_u32, be_u8};
use cookie_factory::combinator::{slice, string};
use cookie_factory::sequence::tuple;
use cookie_factory::{GenError, GenResult, SerializeFn, WriteContext};

use std::cell::RefCell;
use std::io::Write;
use std::ops::Deref;
use std::rc::Rc;

pub(crate) fn write_type_marker<W: Write>(marker: TypeMarker) -> impl SerializeFn<W> {
    be_u8(marker as u8)
}

/// Write a u16 length prefixed UTF-8 string
pub(crate) fn write_short_string<'a, W: Write + 'a>(s: &'a str) -> impl SerializeFn<W> + 'a {
    tuple((be_u16(s.len() as u16), string(s)))
}

/// Handles encoding AMF0
pub struct AMF0Encoder {
    /// The table used to cache repeated objects, keyed by identity
    pub object_reference_table: ObjectCache,
    /// The session settings, shared with forked amf3 sessions
    pub options: CodecOptions,
}

impl Default for AMF0Encoder {
    fn default() -> Self {
        Self {
            object_reference_table: ObjectCache::default(),
            options: CodecOptions::default(),
        }
    }
}

impl AMF0Encoder {
    pub(crate) fn from_options(options: &CodecOptions) -> Self {
        Self {
            object_reference_table: ObjectCache::default(),
            options: options.clone(),
        }
    }

    /// Write a single value, dispatching on its variant
    pub fn write_value_element<'a, 'b: 'a, W: Write + 'a>(
        &'a self,
        v: &'b Rc<Value>,
    ) -> impl SerializeFn<W> + 'a {
        move |out| self.write_value_into(out, v)
    }

    pub(crate) fn write_value_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
    ) -> GenResult<W> {
        match v.deref() {
            Value::Number(n) => tuple((write_type_marker(TypeMarker::Number), be_f64(*n)))(out),
            // amf0 has no integer type
            Value::Integer(n) => {
                tuple((write_type_marker(TypeMarker::Number), be_f64(f64::from(*n))))(out)
            }
            Value::Bool(b) => {
                tuple((write_type_marker(TypeMarker::Boolean), be_u8(*b as u8)))(out)
            }
            Value::String(s) => self.write_string_value_into(out, s),
            Value::Null => write_type_marker(TypeMarker::Null)(out),
            Value::Undefined => write_type_marker(TypeMarker::Undefined)(out),
            Value::Array(dense, assoc) => self.write_array_into(out, v, dense, assoc),
            Value::Object(members, class_def) => self.write_object_into(out, v, members, class_def),
            Value::Date(millis, _) => self.write_date_into(out, v, *millis),
            Value::XML(content, _) => self.write_xml_into(out, content),
            // amf0 has no bytearray type, force the escape
            Value::ByteArray(_) => self.write_escape_into(out, v),
            Value::AMF3(inner) => self.write_escape_into(out, inner),
            // The flex wrappers only exist on the amf3 wire
            Value::ArrayCollection(inner) => self.write_value_into(out, inner),
            Value::ObjectProxy(inner) => self.write_value_into(out, inner),
        }
    }

    /// Emit a reference if `v` was written before, otherwise register it and
    /// write it inline
    fn write_referenced_or_into<W, F>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        inline: F,
    ) -> GenResult<W>
    where
        W: Write,
        F: FnOnce(&Self, WriteContext<W>) -> GenResult<W>,
    {
        if self.options.use_references {
            if let Some(index) = self.object_reference_table.get_index(v) {
                if index <= MAX_OBJECT_REFERENCES {
                    return tuple((
                        write_type_marker(TypeMarker::Reference),
                        be_u16(index as u16),
                    ))(out);
                }
            }
        }
        self.object_reference_table.store(v);
        inline(self, out)
    }

    fn write_string_value_into<W: Write>(&self, out: WriteContext<W>, s: &str) -> GenResult<W> {
        if s.len() > u32::MAX as usize {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        if s.len() > u16::MAX as usize {
            tuple((
                write_type_marker(TypeMarker::LongString),
                be_u32(s.len() as u32),
                string(s),
            ))(out)
        } else {
            tuple((write_type_marker(TypeMarker::String), write_short_string(s)))(out)
        }
    }

    fn write_array_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        dense: &RefCell<Vec<Rc<Value>>>,
        assoc: &RefCell<Vec<Element>>,
    ) -> GenResult<W> {
        if assoc.borrow().is_empty() {
            self.write_referenced_or_into(out, v, |enc, out| {
                enc.write_strict_array_body_into(out, &dense.borrow())
            })
        } else {
            self.write_referenced_or_into(out, v, |enc, out| {
                enc.write_mixed_array_body_into(out, &dense.borrow(), &assoc.borrow())
            })
        }
    }

    fn write_strict_array_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        dense: &[Rc<Value>],
    ) -> GenResult<W> {
        let mut out = tuple((
            write_type_marker(TypeMarker::Array),
            be_u32(dense.len() as u32),
        ))(out)?;
        for item in dense {
            out = self.write_value_into(out, item)?;
        }
        Ok(out)
    }

    /// ECMA array: dense items become pairs keyed by their index
    fn write_mixed_array_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        dense: &[Rc<Value>],
        assoc: &[Element],
    ) -> GenResult<W> {
        let count = (dense.len() + assoc.len()) as u32;
        let mut out = tuple((write_type_marker(TypeMarker::MixedArray), be_u32(count)))(out)?;

        for (index, item) in dense.iter().enumerate() {
            let key = index.to_string();
            out = write_short_string(&key)(out)?;
            out = self.write_value_into(out, item)?;
        }
        for element in assoc {
            out = write_short_string(&element.name)(out)?;
            out = self.write_value_into(out, &element.value)?;
        }
        slice(OBJECT_END)(out)
    }

    fn write_object_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        members: &RefCell<Vec<Element>>,
        class_def: &Option<ClassDefinition>,
    ) -> GenResult<W> {
        match class_def {
            // amf3-only classes and externalized bodies force the escape
            Some(def) if def.attributes.contains(Attribute::Amf3) || def.is_external() => {
                self.write_escape_into(out, v)
            }
            Some(def) if !def.name.is_empty() => self.write_referenced_or_into(out, v, |enc, out| {
                enc.write_typed_body_into(out, members, def)
            }),
            _ => self.write_referenced_or_into(out, v, |enc, out| {
                enc.write_anonymous_body_into(out, members)
            }),
        }
    }

    fn write_typed_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        members: &RefCell<Vec<Element>>,
        class_def: &ClassDefinition,
    ) -> GenResult<W> {
        if class_def.name.len() > u16::MAX as usize {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        let mut out = tuple((
            write_type_marker(TypeMarker::TypedObject),
            write_short_string(&class_def.name),
        ))(out)?;

        // The amf0 wire has no trait, static and dynamic attributes merge
        for element in members.borrow().iter() {
            let value = self.options.class_def_mapper.coerce_encoded(
                &class_def.name,
                &element.name,
                Rc::clone(&element.value),
            );
            out = write_short_string(&element.name)(out)?;
            out = self.write_value_into(out, &value)?;
        }
        slice(OBJECT_END)(out)
    }

    fn write_anonymous_body_into<W: Write>(
        &self,
        out: WriteContext<W>,
        members: &RefCell<Vec<Element>>,
    ) -> GenResult<W> {
        let mut out = write_type_marker(TypeMarker::Object)(out)?;
        for element in members
            .borrow()
            .iter()
            .filter(|e| self.options.include_private || !e.name.starts_with('_'))
        {
            out = write_short_string(&element.name)(out)?;
            out = self.write_value_into(out, &element.value)?;
        }
        slice(OBJECT_END)(out)
    }

    fn write_date_into<W: Write>(
        &self,
        out: WriteContext<W>,
        v: &Rc<Value>,
        millis: f64,
    ) -> GenResult<W> {
        // Dates consume a reference index but are always written inline, the
        // decoder registers them the same way
        self.object_reference_table.store(v);
        tuple((
            write_type_marker(TypeMarker::Date),
            be_f64(millis),
            be_i16(0),
        ))(out)
    }

    fn write_xml_into<W: Write>(&self, out: WriteContext<W>, content: &str) -> GenResult<W> {
        if content.len() > u32::MAX as usize {
            return Err(GenError::CustomError(GEN_PAYLOAD_TOO_LARGE));
        }
        tuple((
            write_type_marker(TypeMarker::Xml),
            be_u32(content.len() as u32),
            string(content),
        ))(out)
    }

    /// The amf3 escape: the value is written by a forked amf3 session with
    /// its own empty reference tables
    fn write_escape_into<W: Write>(&self, out: WriteContext<W>, v: &Rc<Value>) -> GenResult<W> {
        let out = write_type_marker(TypeMarker::AMF3)(out)?;
        let encoder = AMF3Encoder::from_options(&self.options);
        encoder.write_value_into(out, v)
    }

    /// A remoting argument list: a strict array whose own identity never
    /// enters the reference table, only its items may be referenced
    pub(crate) fn write_argument_list_into<W: Write>(
        &self,
        out: WriteContext<W>,
        dense: &RefCell<Vec<Rc<Value>>>,
    ) -> GenResult<W> {
        self.write_strict_array_body_into(out, &dense.borrow())
    }
}
