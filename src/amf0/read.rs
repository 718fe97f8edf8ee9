use crate::amf0::type_marker::TypeMarker;
use crate::amf3::read::AMF3Decoder;
use crate::class_def::ClassDefMapper;
use crate::errors::Error;
use crate::nom_utils::{take_str, AMFResult};
use crate::options::CodecOptions;
use crate::types::*;

use nom::number::complete::{be_f64, be_i16, be_u16, be_u32, be_u8};
use nom::Err;

use std::cell::RefCell;
use std::convert::TryFrom;
use std::ops::Deref;
use std::rc::Rc;

/// Read a u16 length prefixed UTF-8 string
pub(crate) fn parse_short_string(i: &[u8]) -> AMFResult<'_, String> {
    let (i, length) = be_u16(i)?;
    let (i, s) = take_str(i, u32::from(length))?;
    Ok((i, s.to_string()))
}

/// Read a u32 length prefixed UTF-8 string
fn parse_long_string(i: &[u8]) -> AMFResult<'_, String> {
    let (i, length) = be_u32(i)?;
    let (i, s) = take_str(i, length)?;
    Ok((i, s.to_string()))
}

/// Handles decoding AMF0
#[derive(Default)]
pub struct AMF0Decoder {
    /// The table used to cache repeated objects
    pub object_reference_table: Vec<Rc<Value>>,
    /// The registry consulted for aliases of typed objects
    pub class_def_mapper: Rc<ClassDefMapper>,
    /// Whether unmapped aliases abort the decode
    pub strict: bool,
}

impl AMF0Decoder {
    /// Create a decoder with an empty reference table over the given registry
    pub fn new(class_def_mapper: Rc<ClassDefMapper>, strict: bool) -> Self {
        Self {
            object_reference_table: Vec::new(),
            class_def_mapper,
            strict,
        }
    }

    pub(crate) fn from_options(options: &CodecOptions) -> Self {
        Self::new(Rc::clone(&options.class_def_mapper), options.strict)
    }

    /// Parse a single AMF0 element from the input
    #[inline]
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (rest, type_) = self.read_type_marker(i)?;

        match type_ {
            TypeMarker::Number => {
                let (rest, n) = be_f64(rest)?;
                Ok((rest, Rc::new(Value::Number(n))))
            }
            TypeMarker::Boolean => {
                let (rest, b) = be_u8(rest)?;
                Ok((rest, Rc::new(Value::Bool(b != 0))))
            }
            TypeMarker::String => {
                let (rest, s) = parse_short_string(rest)?;
                Ok((rest, Rc::new(Value::String(s))))
            }
            TypeMarker::LongString => {
                let (rest, s) = parse_long_string(rest)?;
                Ok((rest, Rc::new(Value::String(s))))
            }
            TypeMarker::Null => Ok((rest, Rc::new(Value::Null))),
            TypeMarker::Undefined => Ok((rest, Rc::new(Value::Undefined))),
            TypeMarker::Object => self.parse_element_object(rest),
            TypeMarker::Reference => self.parse_element_reference(rest),
            TypeMarker::MixedArray => self.parse_element_mixed_array(rest),
            TypeMarker::Array => self.parse_element_strict_array(rest, true),
            TypeMarker::Date => self.parse_element_date(rest),
            TypeMarker::Xml => self.parse_element_xml(rest),
            TypeMarker::TypedObject => self.parse_element_typed_object(rest),
            TypeMarker::AMF3 => self.parse_element_amf3(rest),
            // An end marker outside a key/value body is malformed
            TypeMarker::ObjectEnd => {
                Err(Err::Error(Error::UnknownMarker(i, TypeMarker::ObjectEnd as u8)))
            }
        }
    }

    fn read_type_marker<'a>(&self, i: &'a [u8]) -> AMFResult<'a, TypeMarker> {
        let (rest, byte) = be_u8(i)?;
        match TypeMarker::try_from(byte) {
            Ok(marker) => Ok((rest, marker)),
            Err(_) => Err(Err::Error(Error::UnknownMarker(i, byte))),
        }
    }

    /// Read key/value pairs terminated by a zero length key and the end marker
    fn parse_body_pairs<'a>(&mut self, i: &'a [u8], alias: &str) -> AMFResult<'a, Vec<Element>> {
        let mapper = Rc::clone(&self.class_def_mapper);
        let mut elements = Vec::new();
        let mut i = i;

        loop {
            let (j, name) = parse_short_string(i)?;
            if name.is_empty() {
                let (j, end) = be_u8(j)?;
                if end != TypeMarker::ObjectEnd as u8 {
                    return Err(Err::Error(Error::UnknownMarker(i, end)));
                }
                return Ok((j, elements));
            }

            let (j, value) = self.parse_single_element(j)?;
            let value = mapper.coerce_decoded(alias, &name, value);
            elements.push(Element { name, value });
            i = j;
        }
    }

    fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        // Register before children so forward and self references resolve
        let obj = Rc::new(Value::Object(RefCell::new(Vec::new()), None));
        self.object_reference_table.push(Rc::clone(&obj));

        let (i, elements) = self.parse_body_pairs(i, "")?;

        if let Value::Object(members, _) = obj.deref() {
            *members.borrow_mut() = elements;
        }

        Ok((i, obj))
    }

    fn parse_element_reference<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (rest, index) = be_u16(i)?;
        let index = index as usize;

        let value = Rc::clone(
            self.object_reference_table
                .get(index)
                .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
        );

        Ok((rest, value))
    }

    /// ECMA array: the u32 length word is a hint, the end marker governs
    fn parse_element_mixed_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, _length_hint) = be_u32(i)?;

        let arr = Rc::new(Value::Array(
            RefCell::new(Vec::new()),
            RefCell::new(Vec::new()),
        ));
        self.object_reference_table.push(Rc::clone(&arr));

        let (i, elements) = self.parse_body_pairs(i, "")?;

        if let Value::Array(_, assoc) = arr.deref() {
            *assoc.borrow_mut() = elements;
        }

        Ok((i, arr))
    }

    /// Strict array; the argument list of a remoting request is parsed with
    /// `map_reference` unset so that only its items enter the table
    pub(crate) fn parse_element_strict_array<'a>(
        &mut self,
        i: &'a [u8],
        map_reference: bool,
    ) -> AMFResult<'a, Rc<Value>> {
        let (i, length) = be_u32(i)?;
        let length = length as usize;

        // A dense item is at least one byte, bail out early on absurd sizes
        if length > i.len() {
            return Err(Err::Error(Error::OutOfRange(i, length)));
        }

        let arr = Rc::new(Value::Array(
            RefCell::new(Vec::new()),
            RefCell::new(Vec::new()),
        ));
        if map_reference {
            self.object_reference_table.push(Rc::clone(&arr));
        }

        let mut items = Vec::with_capacity(length);
        let mut i = i;
        for _ in 0..length {
            let (j, item) = self.parse_single_element(i)?;
            items.push(item);
            i = j;
        }

        if let Value::Array(dense, _) = arr.deref() {
            *dense.borrow_mut() = items;
        }

        Ok((i, arr))
    }

    fn parse_element_date<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, millis) = be_f64(i)?;
        let (i, timezone) = be_i16(i)?;

        let date = Rc::new(Value::Date(millis, Some(timezone)));
        // Dates consume a reference index even though they are never
        // reference encoded, keeping both index streams aligned
        self.object_reference_table.push(Rc::clone(&date));

        Ok((i, date))
    }

    fn parse_element_xml<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, content) = parse_long_string(i)?;
        Ok((i, Rc::new(Value::XML(content, true))))
    }

    fn parse_element_typed_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, alias) = parse_short_string(i)?;

        let class_def = match self.class_def_mapper.get_by_alias(&alias) {
            Some(def) => def.clone(),
            None => {
                if self.strict {
                    return Err(Err::Error(Error::UnmappedAlias(i, alias)));
                }
                ClassDefinition::dynamic_with_name(alias.clone())
            }
        };

        let obj = Rc::new(Value::Object(RefCell::new(Vec::new()), Some(class_def)));
        self.object_reference_table.push(Rc::clone(&obj));

        let (i, elements) = self.parse_body_pairs(i, &alias)?;

        if let Value::Object(members, _) = obj.deref() {
            *members.borrow_mut() = elements;
        }

        Ok((i, obj))
    }

    /// The amf3 escape: the rest of this value decodes in a forked amf3
    /// session with its own empty reference tables
    fn parse_element_amf3<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let mut decoder = AMF3Decoder::new(Rc::clone(&self.class_def_mapper), self.strict);
        let (i, value) = decoder.parse_single_element(i)?;
        Ok((i, Rc::new(Value::AMF3(value))))
    }
}
