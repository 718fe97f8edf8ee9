//! The class definition registry consulted by both codecs
//!
//! The registry holds trait descriptors keyed by alias, the encoder/decoder
//! hook pairs of externalized classes, and optional per-attribute coercions
//! applied to typed object values.

use crate::amf3::custom_encoder::{CustomEncoder, ExternalDecoderFn};
use crate::types::{Attribute, ClassDefinition};
use crate::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A coercion applied to a single attribute value of a typed object
pub type CoercionFn = fn(Rc<Value>) -> Rc<Value>;

/// Maps class aliases to trait descriptors and externalizable hooks
#[derive(Default)]
pub struct ClassDefMapper {
    defs: HashMap<String, ClassDefinition>,
    external_decoders: HashMap<String, ExternalDecoderFn>,
    external_encoders: HashMap<String, Rc<dyn CustomEncoder>>,
    decode_coercions: HashMap<(String, String), CoercionFn>,
    encode_coercions: HashMap<(String, String), CoercionFn>,
}

impl ClassDefMapper {
    /// Register a class definition under its alias
    ///
    /// An existing registration for the same alias is replaced.
    pub fn register(&mut self, def: ClassDefinition) {
        self.defs.insert(def.name.clone(), def);
    }

    /// Register an externalized class with its decoder and encoder hooks
    ///
    /// The definition is flagged [`Attribute::External`] if it is not already.
    pub fn register_external(
        &mut self,
        mut def: ClassDefinition,
        decoder: ExternalDecoderFn,
        encoder: Rc<dyn CustomEncoder>,
    ) {
        def.attributes |= Attribute::External;
        self.external_decoders.insert(def.name.clone(), decoder);
        self.external_encoders.insert(def.name.clone(), encoder);
        self.register(def);
    }

    /// The definition registered for `alias`, if any
    pub fn get_by_alias(&self, alias: &str) -> Option<&ClassDefinition> {
        self.defs.get(alias)
    }

    /// The decoder hook registered for `alias`, if any
    pub fn external_decoder(&self, alias: &str) -> Option<ExternalDecoderFn> {
        self.external_decoders.get(alias).cloned()
    }

    /// The encoder hook registered for `alias`, if any
    pub fn external_encoder(&self, alias: &str) -> Option<Rc<dyn CustomEncoder>> {
        self.external_encoders.get(alias).cloned()
    }

    /// Apply `coercion` to attribute `attr` of class `alias` after decoding
    pub fn register_decode_coercion(
        &mut self,
        alias: impl Into<String>,
        attr: impl Into<String>,
        coercion: CoercionFn,
    ) {
        self.decode_coercions
            .insert((alias.into(), attr.into()), coercion);
    }

    /// Apply `coercion` to attribute `attr` of class `alias` before encoding
    pub fn register_encode_coercion(
        &mut self,
        alias: impl Into<String>,
        attr: impl Into<String>,
        coercion: CoercionFn,
    ) {
        self.encode_coercions
            .insert((alias.into(), attr.into()), coercion);
    }

    pub(crate) fn coerce_decoded(&self, alias: &str, attr: &str, value: Rc<Value>) -> Rc<Value> {
        match self
            .decode_coercions
            .get(&(alias.to_string(), attr.to_string()))
        {
            Some(coercion) => coercion(value),
            None => value,
        }
    }

    pub(crate) fn coerce_encoded(&self, alias: &str, attr: &str, value: Rc<Value>) -> Rc<Value> {
        match self
            .encode_coercions
            .get(&(alias.to_string(), attr.to_string()))
        {
            Some(coercion) => coercion(value),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassDefinition;

    #[test]
    fn register_and_lookup() {
        let mut mapper = ClassDefMapper::default();
        mapper.register(ClassDefinition::default_with_name("org.example.User".to_string()));
        assert!(mapper.get_by_alias("org.example.User").is_some());
        assert!(mapper.get_by_alias("org.example.Missing").is_none());
    }

    #[test]
    fn decode_coercions_apply_per_attribute() {
        let mut mapper = ClassDefMapper::default();
        mapper.register_decode_coercion("org.example.User", "age", |v| match *v {
            Value::Number(n) => Rc::new(Value::Integer(n as i32)),
            _ => v,
        });

        let coerced = mapper.coerce_decoded("org.example.User", "age", Rc::new(Value::Number(3.0)));
        assert_eq!(*coerced, Value::Integer(3));

        let untouched =
            mapper.coerce_decoded("org.example.User", "name", Rc::new(Value::Number(3.0)));
        assert_eq!(*untouched, Value::Number(3.0));
    }
}
