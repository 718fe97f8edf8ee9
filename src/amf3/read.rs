use crate::amf3::length::Length;
use crate::amf3::type_marker::TypeMarker;
use crate::amf3::REFERENCE_FLAG;
use crate::class_def::ClassDefMapper;
use crate::errors::Error;
use crate::flex;
use crate::nom_utils::{take_str, AMFResult};
use crate::options::CodecOptions;
use crate::types::*;

use enumset::EnumSet;
use nom::bytes::complete::take;
use nom::multi::many_m_n;
use nom::number::complete::{be_f64, be_u8};
use nom::Err;

use std::cell::RefCell;
use std::convert::TryFrom;
use std::ops::Deref;
use std::rc::Rc;

/// Read a u29: one to four bytes, the high bit of the first three signalling
/// continuation, the fourth byte contributing all eight bits
fn read_int(i: &[u8]) -> AMFResult<'_, u32> {
    let mut value: u32 = 0;
    let mut rest = i;

    for position in 0..4 {
        let (j, byte) = be_u8(rest)?;
        rest = j;

        if position == 3 {
            value = (value << 8) | u32::from(byte);
        } else {
            value = (value << 7) | u32::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                break;
            }
        }
    }

    Ok((rest, value))
}

/// Read a u29 and sign-extend the 29 bit window to 32 bits
fn read_int_signed(i: &[u8]) -> AMFResult<'_, i32> {
    let (i, value) = read_int(i)?;

    let value = if value & 0x1000_0000 != 0 {
        value as i32 - 0x2000_0000
    } else {
        value as i32
    };

    Ok((i, value))
}

/// Read a combined reference-or-inline-length header
fn read_length(i: &[u8]) -> AMFResult<'_, Length> {
    let (i, header) = read_int(i)?;

    Ok((
        i,
        match header & REFERENCE_FLAG {
            0 => Length::Reference(header as usize >> 1),
            _ => Length::Size(header >> 1),
        },
    ))
}

fn parse_element_int(i: &[u8]) -> AMFResult<'_, Rc<Value>> {
    let (i, v) = read_int_signed(i)?;
    Ok((i, Rc::new(Value::Integer(v))))
}

fn parse_element_number(i: &[u8]) -> AMFResult<'_, Rc<Value>> {
    let (i, v) = be_f64(i)?;
    Ok((i, Rc::new(Value::Number(v))))
}

/// Handles decoding AMF3
#[derive(Default)]
pub struct AMF3Decoder {
    /// The table used to cache repeated byte strings
    pub string_reference_table: Vec<Vec<u8>>,
    /// The table used to cache repeated trait definitions
    pub trait_reference_table: Vec<ClassDefinition>,
    /// The table used to cache repeated objects
    pub object_reference_table: Vec<Rc<Value>>,
    /// The registry consulted for aliases and externalized classes
    pub class_def_mapper: Rc<ClassDefMapper>,
    /// Whether unmapped aliases abort the decode
    pub strict: bool,
}

impl AMF3Decoder {
    /// Create a decoder with empty reference tables over the given registry
    pub fn new(class_def_mapper: Rc<ClassDefMapper>, strict: bool) -> Self {
        Self {
            string_reference_table: Vec::new(),
            trait_reference_table: Vec::new(),
            object_reference_table: Vec::new(),
            class_def_mapper,
            strict,
        }
    }

    pub(crate) fn from_options(options: &CodecOptions) -> Self {
        Self::new(Rc::clone(&options.class_def_mapper), options.strict)
    }

    /// Parse a single AMF3 element from the input
    #[inline]
    pub fn parse_single_element<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, type_) = self.read_type_marker(i)?;

        match type_ {
            TypeMarker::Undefined => Ok((i, Rc::new(Value::Undefined))),
            TypeMarker::Null => Ok((i, Rc::new(Value::Null))),
            TypeMarker::False => Ok((i, Rc::new(Value::Bool(false)))),
            TypeMarker::True => Ok((i, Rc::new(Value::Bool(true)))),
            TypeMarker::Integer => parse_element_int(i),
            TypeMarker::Number => parse_element_number(i),
            TypeMarker::String => self.parse_element_string(i),
            TypeMarker::XmlDoc => self.parse_element_xml(i, true),
            TypeMarker::Date => self.parse_element_date(i),
            TypeMarker::Array => self.parse_element_array(i),
            TypeMarker::Object => self.parse_element_object(i),
            TypeMarker::Xml => self.parse_element_xml(i, false),
            TypeMarker::ByteArray => self.parse_element_byte_array(i),
        }
    }

    fn read_type_marker<'a>(&self, i: &'a [u8]) -> AMFResult<'a, TypeMarker> {
        let (rest, byte) = be_u8(i)?;
        match TypeMarker::try_from(byte) {
            Ok(marker) => Ok((rest, marker)),
            Err(_) => Err(Err::Error(Error::UnknownMarker(i, byte))),
        }
    }

    /// Read a byte stream through the string reference table
    ///
    /// Empty streams are never entered into the table; their inline header is
    /// indistinguishable from a reference to index zero.
    fn parse_byte_stream<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Vec<u8>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Size(0) => Ok((i, Vec::new())),
            Length::Size(len) => {
                let (rest, bytes) = take(len)(i)?;
                self.string_reference_table.push(bytes.to_vec());
                Ok((rest, bytes.to_vec()))
            }
            Length::Reference(index) => {
                let bytes = self
                    .string_reference_table
                    .get(index)
                    .cloned()
                    .ok_or(Err::Error(Error::OutOfRange(i, index)))?;
                Ok((i, bytes))
            }
        }
    }

    pub(crate) fn parse_string<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, String> {
        let (rest, bytes) = self.parse_byte_stream(i)?;
        let s = String::from_utf8(bytes).map_err(|_| Err::Error(Error::BadUtf8(i)))?;
        Ok((rest, s))
    }

    fn parse_element_string<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, s) = self.parse_string(i)?;
        Ok((i, Rc::new(Value::String(s))))
    }

    /// Decode or resolve a trait
    ///
    /// `header` is the object header with the object-reference bit already
    /// shifted out; its low bit selects a trait reference or an inline trait.
    fn parse_class_def<'a>(&mut self, header: u32, i: &'a [u8]) -> AMFResult<'a, ClassDefinition> {
        if header & REFERENCE_FLAG == 0 {
            let index = (header >> 1) as usize;

            let class_def = self
                .trait_reference_table
                .get(index)
                .cloned()
                .ok_or(Err::Error(Error::OutOfRange(i, index)))?;

            return Ok((i, class_def));
        }
        let header = header >> 1;

        let (i, name) = self.parse_string(i)?;

        let encoding = (header & 0x03) as u8;
        let is_external = encoding & 0b01 != 0;
        let is_dynamic = encoding & 0b10 != 0;

        let attribute_count = (header >> 2) as usize;
        // Every attribute name is at least one byte, reject absurd counts
        if attribute_count > i.len() {
            return Err(Err::Error(Error::OutOfRange(i, attribute_count)));
        }
        let (i, static_properties) =
            many_m_n(attribute_count, attribute_count, |i| self.parse_string(i))(i)?;

        if !name.is_empty() && !flex::is_wrapper_alias(&name) {
            match self.class_def_mapper.get_by_alias(&name) {
                Some(expected) => {
                    let shape_matches = expected.is_external() == is_external
                        && (is_external || expected.is_dynamic() == is_dynamic);
                    if !shape_matches {
                        return Err(Err::Error(Error::BadTrait(i)));
                    }
                }
                None => {
                    if self.strict {
                        return Err(Err::Error(Error::UnmappedAlias(i, name)));
                    }
                }
            }
        }

        let mut attributes = EnumSet::empty();
        if is_external {
            attributes |= Attribute::External;
        }
        if is_dynamic {
            attributes |= Attribute::Dynamic;
        }

        let class_def = ClassDefinition {
            name,
            attributes,
            static_properties,
        };

        self.trait_reference_table.push(class_def.clone());
        Ok((i, class_def))
    }

    fn parse_object_static<'a>(
        &mut self,
        i: &'a [u8],
        class_def: &ClassDefinition,
    ) -> AMFResult<'a, Vec<Element>> {
        let mapper = Rc::clone(&self.class_def_mapper);
        let mut elements = Vec::with_capacity(class_def.static_properties.len());
        let mut i = i;

        for name in class_def.static_properties.iter() {
            let (j, value) = self.parse_single_element(i)?;
            let value = mapper.coerce_decoded(&class_def.name, name, value);

            elements.push(Element {
                name: name.clone(),
                value,
            });

            i = j;
        }

        Ok((i, elements))
    }

    /// Read key/value pairs until the empty string key
    fn parse_object_dynamic<'a>(
        &mut self,
        i: &'a [u8],
        class_def: &ClassDefinition,
    ) -> AMFResult<'a, Vec<Element>> {
        let mapper = Rc::clone(&self.class_def_mapper);
        let mut elements = Vec::new();

        let (mut i, mut key) = self.parse_byte_stream(i)?;
        while !key.is_empty() {
            let name = String::from_utf8(key).map_err(|_| Err::Error(Error::BadUtf8(i)))?;
            let (j, value) = self.parse_single_element(i)?;
            let value = mapper.coerce_decoded(&class_def.name, &name, value);

            elements.push(Element { name, value });

            let (j, next_key) = self.parse_byte_stream(j)?;
            i = j;
            key = next_key;
        }

        Ok((i, elements))
    }

    pub(crate) fn parse_element_object<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, mut header) = read_int(i)?;

        if header & REFERENCE_FLAG == 0 {
            let index = (header >> 1) as usize;

            let obj = Rc::clone(
                self.object_reference_table
                    .get(index)
                    .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
            );

            return Ok((i, obj));
        }
        header >>= 1;

        let (i, class_def) = self.parse_class_def(header, i)?;

        if class_def.is_external() {
            if class_def.name == flex::ARRAY_COLLECTION {
                return self.parse_wrapper(i, true);
            }
            if class_def.name == flex::OBJECT_PROXY {
                return self.parse_wrapper(i, false);
            }
            return self.parse_external(i, class_def);
        }

        // An empty alias is an anonymous object
        let stored_def = if class_def.name.is_empty() {
            None
        } else {
            Some(class_def.clone())
        };

        // Register before children so forward and self references resolve
        let obj = Rc::new(Value::Object(RefCell::new(Vec::new()), stored_def));
        self.object_reference_table.push(Rc::clone(&obj));

        let (i, mut elements) = self.parse_object_static(i, &class_def)?;

        let i = if class_def.is_dynamic() {
            let (i, dynamic) = self.parse_object_dynamic(i, &class_def)?;
            elements.extend(dynamic);
            i
        } else {
            i
        };

        if let Value::Object(members, _) = obj.deref() {
            *members.borrow_mut() = elements;
        }

        Ok((i, obj))
    }

    /// Decode the payload of an ArrayCollection or ObjectProxy
    ///
    /// The wrapper and its payload consume two consecutive object reference
    /// slots; the wrapper slot is reserved before the payload is read and
    /// patched once the wrapper exists.
    fn parse_wrapper<'a>(&mut self, i: &'a [u8], collection: bool) -> AMFResult<'a, Rc<Value>> {
        // The payload restates its own type marker, the trait already told us
        let (i, _marker) = be_u8(i)?;

        let index = self.object_reference_table.len();
        self.object_reference_table.push(Rc::new(Value::Null));

        let (i, inner) = if collection {
            self.parse_element_array(i)?
        } else {
            self.parse_element_object(i)?
        };

        let wrapper = Rc::new(if collection {
            Value::ArrayCollection(inner)
        } else {
            Value::ObjectProxy(inner)
        });
        self.object_reference_table[index] = Rc::clone(&wrapper);

        Ok((i, wrapper))
    }

    fn parse_external<'a>(
        &mut self,
        i: &'a [u8],
        class_def: ClassDefinition,
    ) -> AMFResult<'a, Rc<Value>> {
        let decoder = self
            .class_def_mapper
            .external_decoder(&class_def.name)
            .ok_or_else(|| Err::Error(Error::UnmappedAlias(i, class_def.name.clone())))?;

        let obj = Rc::new(Value::Object(
            RefCell::new(Vec::new()),
            Some(class_def.clone()),
        ));
        self.object_reference_table.push(Rc::clone(&obj));

        let (i, elements) = decoder(i, self)?;

        if let Value::Object(members, _) = obj.deref() {
            *members.borrow_mut() = elements;
        }

        Ok((i, obj))
    }

    fn parse_element_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, len) = read_length(i)?;

        let len = match len {
            Length::Reference(index) => {
                let arr = Rc::clone(
                    self.object_reference_table
                        .get(index)
                        .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
                );
                return Ok((i, arr));
            }
            Length::Size(len) => len as usize,
        };

        // A dense item is at least one byte, bail out early on absurd sizes
        if len > i.len() {
            return Err(Err::Error(Error::OutOfRange(i, len)));
        }

        // Register before children so forward and self references resolve
        let arr = Rc::new(Value::Array(
            RefCell::new(Vec::new()),
            RefCell::new(Vec::new()),
        ));
        self.object_reference_table.push(Rc::clone(&arr));

        let mut assoc = Vec::new();
        let (mut i, mut key) = self.parse_byte_stream(i)?;
        while !key.is_empty() {
            let name = String::from_utf8(key).map_err(|_| Err::Error(Error::BadUtf8(i)))?;
            let (j, value) = self.parse_single_element(i)?;

            assoc.push(Element { name, value });

            let (j, next_key) = self.parse_byte_stream(j)?;
            i = j;
            key = next_key;
        }

        let (i, dense) = many_m_n(len, len, |i| self.parse_single_element(i))(i)?;

        if let Value::Array(dense_cell, assoc_cell) = arr.deref() {
            *dense_cell.borrow_mut() = dense;
            *assoc_cell.borrow_mut() = assoc;
        }

        Ok((i, arr))
    }

    fn parse_element_date<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Reference(index) => {
                let date = Rc::clone(
                    self.object_reference_table
                        .get(index)
                        .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
                );
                Ok((i, date))
            }
            Length::Size(_) => {
                let (i, millis) = be_f64(i)?;
                let date = Rc::new(Value::Date(millis, None));
                self.object_reference_table.push(Rc::clone(&date));
                Ok((i, date))
            }
        }
    }

    fn parse_element_byte_array<'a>(&mut self, i: &'a [u8]) -> AMFResult<'a, Rc<Value>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Reference(index) => {
                let bytes = Rc::clone(
                    self.object_reference_table
                        .get(index)
                        .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
                );
                Ok((i, bytes))
            }
            Length::Size(len) => {
                let (i, bytes) = take(len)(i)?;
                let value = Rc::new(Value::ByteArray(bytes.to_vec()));
                self.object_reference_table.push(Rc::clone(&value));
                Ok((i, value))
            }
        }
    }

    fn parse_element_xml<'a>(&mut self, i: &'a [u8], document: bool) -> AMFResult<'a, Rc<Value>> {
        let (i, len) = read_length(i)?;

        match len {
            Length::Reference(index) => {
                let xml = Rc::clone(
                    self.object_reference_table
                        .get(index)
                        .ok_or(Err::Error(Error::OutOfRange(i, index)))?,
                );
                Ok((i, xml))
            }
            Length::Size(len) => {
                let (i, content) = take_str(i, len)?;
                let value = Rc::new(Value::XML(content.to_string(), document));
                self.object_reference_table.push(Rc::clone(&value));
                Ok((i, value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8]) -> Rc<Value> {
        let mut decoder = AMF3Decoder::default();
        let (remaining, value) = decoder.parse_single_element(bytes).expect("decode failed");
        assert!(remaining.is_empty(), "undecoded trailing bytes");
        value
    }

    #[test]
    fn integer_zero() {
        assert_eq!(*decode(&[0x04, 0x00]), Value::Integer(0));
    }

    #[test]
    fn integer_minus_one() {
        assert_eq!(*decode(&[0x04, 0xFF, 0xFF, 0xFF, 0xFF]), Value::Integer(-1));
    }

    #[test]
    fn integer_boundaries() {
        let cases: &[(&[u8], i32)] = &[
            (&[0x04, 0x00], 0),
            (&[0x04, 0x7F], 0x7F),
            (&[0x04, 0x81, 0x00], 0x80),
            (&[0x04, 0xFF, 0x7F], 0x3FFF),
            (&[0x04, 0x81, 0x80, 0x00], 0x4000),
            (&[0x04, 0xFF, 0xFF, 0x7F], 0x001F_FFFF),
            (&[0x04, 0x80, 0xC0, 0x80, 0x00], 0x0020_0000),
            (&[0x04, 0xBF, 0xFF, 0xFF, 0xFF], 0x0FFF_FFFF),
            (&[0x04, 0xFF, 0xFF, 0xFF, 0xFF], -1),
            (&[0x04, 0xC0, 0x80, 0x80, 0x00], -0x1000_0000),
        ];
        for (bytes, expected) in cases {
            assert_eq!(*decode(bytes), Value::Integer(*expected), "bytes {:x?}", bytes);
        }
    }

    #[test]
    fn string_then_reference() {
        // ["foo", "foo"]: the second occurrence is a reference to index 0
        let value = decode(&[
            0x09, 0x05, 0x01, 0x06, 0x07, 0x66, 0x6F, 0x6F, 0x06, 0x00,
        ]);
        let expected = Value::array(vec![
            Rc::new(Value::String("foo".to_string())),
            Rc::new(Value::String("foo".to_string())),
        ]);
        assert_eq!(*value, expected);
    }

    #[test]
    fn empty_string_is_never_referenced() {
        // ["", ""]: both occurrences are the inline empty header
        let value = decode(&[0x09, 0x05, 0x01, 0x06, 0x01, 0x06, 0x01]);
        let expected = Value::array(vec![
            Rc::new(Value::String(String::new())),
            Rc::new(Value::String(String::new())),
        ]);
        assert_eq!(*value, expected);
    }

    #[test]
    fn dense_array() {
        let value = decode(&[0x09, 0x07, 0x01, 0x04, 0x01, 0x04, 0x02, 0x04, 0x03]);
        let expected = Value::array(vec![
            Rc::new(Value::Integer(1)),
            Rc::new(Value::Integer(2)),
            Rc::new(Value::Integer(3)),
        ]);
        assert_eq!(*value, expected);
    }

    #[test]
    fn associative_array() {
        // {"a": 1} with no dense part
        let value = decode(&[0x09, 0x01, 0x03, 0x61, 0x04, 0x01, 0x01]);
        let expected = Value::mixed_array(Vec::new(), vec![Element::new("a", 1)]);
        assert_eq!(*value, expected);
    }

    #[test]
    fn self_referential_object() {
        // o = {}; o.self = o
        let value = decode(&[
            0x0A, 0x0B, 0x01, 0x09, 0x73, 0x65, 0x6C, 0x66, 0x0A, 0x00, 0x01,
        ]);
        match value.deref() {
            Value::Object(members, _) => {
                let members = members.borrow();
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].name, "self");
                assert!(Rc::ptr_eq(&members[0].value, &value));
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn shared_objects_decode_to_shared_identity() {
        // [o, o] where o = {} (anonymous, empty)
        let value = decode(&[0x09, 0x05, 0x01, 0x0A, 0x0B, 0x01, 0x01, 0x0A, 0x02]);
        match value.deref() {
            Value::Array(dense, _) => {
                let dense = dense.borrow();
                assert_eq!(dense.len(), 2);
                assert!(Rc::ptr_eq(&dense[0], &dense[1]));
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn date_registers_in_the_object_table() {
        // [d, d]: the second date is a reference to the first
        let mut input = vec![0x09, 0x05, 0x01, 0x08, 0x01];
        input.extend_from_slice(&1234.5f64.to_be_bytes());
        input.extend_from_slice(&[0x08, 0x02]);
        let value = decode(&input);
        match value.deref() {
            Value::Array(dense, _) => {
                let dense = dense.borrow();
                assert_eq!(*dense[0], Value::Date(1234.5, None));
                assert!(Rc::ptr_eq(&dense[0], &dense[1]));
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn array_collection_consumes_two_reference_slots() {
        let mut input = vec![0x0A, 0x07, 0x43];
        input.extend_from_slice(flex::ARRAY_COLLECTION.as_bytes());
        // payload: [7]
        input.extend_from_slice(&[0x09, 0x03, 0x01, 0x04, 0x07]);

        let mut decoder = AMF3Decoder::default();
        let (rest, value) = decoder.parse_single_element(&input).expect("decode failed");
        assert!(rest.is_empty());

        assert_eq!(decoder.object_reference_table.len(), 2);
        match value.deref() {
            Value::ArrayCollection(inner) => {
                assert_eq!(**inner, Value::array(vec![Rc::new(Value::Integer(7))]));
                // slot 0 is the wrapper, slot 1 the payload
                assert!(Rc::ptr_eq(&decoder.object_reference_table[0], &value));
                assert!(Rc::ptr_eq(&decoder.object_reference_table[1], inner));
            }
            other => panic!("expected an ArrayCollection, got {:?}", other),
        }
    }

    #[test]
    fn trait_reference_reuse() {
        // Two objects of the same class: the second carries a trait reference
        let mut input = vec![0x09, 0x05, 0x01];
        // first: object, inline trait, one static attr "x", alias "T"
        input.extend_from_slice(&[0x0A, 0x13, 0x03, 0x54, 0x03, 0x78, 0x04, 0x01]);
        // second: object, trait reference 0, static value 2
        input.extend_from_slice(&[0x0A, 0x01, 0x04, 0x02]);

        let mut decoder = AMF3Decoder::default();
        let (rest, value) = decoder.parse_single_element(&input).expect("decode failed");
        assert!(rest.is_empty());
        assert_eq!(decoder.trait_reference_table.len(), 1);

        match value.deref() {
            Value::Array(dense, _) => {
                let dense = dense.borrow();
                let expected_def = ClassDefinition {
                    name: "T".to_string(),
                    attributes: EnumSet::empty(),
                    static_properties: vec!["x".to_string()],
                };
                assert_eq!(
                    *dense[0],
                    Value::object(vec![Element::new("x", 1)], Some(expected_def.clone()))
                );
                assert_eq!(
                    *dense[1],
                    Value::object(vec![Element::new("x", 2)], Some(expected_def))
                );
            }
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let mut decoder = AMF3Decoder::default();
        let result = decoder.parse_single_element(&[0x0D]);
        assert_eq!(
            result,
            Err(Err::Error(Error::UnknownMarker(&[0x0D], 0x0D)))
        );
    }

    #[test]
    fn dangling_reference_is_out_of_range() {
        let mut decoder = AMF3Decoder::default();
        let result = decoder.parse_single_element(&[0x0A, 0x04]);
        assert!(matches!(
            result,
            Err(Err::Error(Error::OutOfRange(_, 2)))
        ));
    }

    #[test]
    fn strict_mode_rejects_unmapped_aliases() {
        let mut decoder = AMF3Decoder::default();
        decoder.strict = true;
        // object, inline trait, no attrs, alias "T", static part empty
        let result = decoder.parse_single_element(&[0x0A, 0x03, 0x03, 0x54]);
        assert!(matches!(
            result,
            Err(Err::Error(Error::UnmappedAlias(_, ref alias))) if alias == "T"
        ));
    }

    #[test]
    fn externalizable_without_decoder_is_unmapped() {
        let mut decoder = AMF3Decoder::default();
        // object, inline externalizable trait, alias "E"
        let result = decoder.parse_single_element(&[0x0A, 0x07, 0x03, 0x45]);
        assert!(matches!(
            result,
            Err(Err::Error(Error::UnmappedAlias(_, ref alias))) if alias == "E"
        ));
    }

    #[test]
    fn mismatched_externalizability_is_a_bad_trait() {
        let mut mapper = ClassDefMapper::default();
        mapper.register(ClassDefinition::default_with_name("T".to_string()));
        let mut decoder = AMF3Decoder::new(Rc::new(mapper), false);
        // wire says externalizable, registry says static
        let result = decoder.parse_single_element(&[0x0A, 0x07, 0x03, 0x54]);
        assert!(matches!(result, Err(Err::Error(Error::BadTrait(_)))));
    }

    #[test]
    fn truncated_input_underflows() {
        let mut decoder = AMF3Decoder::default();
        let result = decoder.parse_single_element(&[0x05, 0x3F, 0xF0]);
        assert!(matches!(result, Err(Err::Error(Error::Underflow(_)))));
    }
}
