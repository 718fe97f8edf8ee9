use crate::class_def::ClassDefMapper;
use std::rc::Rc;

/// The per-session settings shared by encoding and decoding
///
/// A fresh pair of reference tables is created from these options for every
/// top-level call; the options themselves (and the mapper they carry) are
/// shared by forked sub-sessions such as packet bodies and the amf0 to amf3
/// escape.
#[derive(Clone)]
pub struct CodecOptions {
    /// Select amf3 (`true`) or amf0 (`false`) as the outer format
    pub amf3: bool,
    /// Wrap arrays in `flex.messaging.io.ArrayCollection` on encode (amf3 only)
    pub use_collections: bool,
    /// Wrap anonymous objects in `flex.messaging.io.ObjectProxy` on encode (amf3 only)
    pub use_proxies: bool,
    /// Deduplicate repeated objects, strings and class definitions on encode
    pub use_references: bool,
    /// Emit the legacy XMLDocument flavour instead of E4X in amf3
    pub use_legacy_xml: bool,
    /// Keep attributes with a leading underscore when encoding anonymous objects
    pub include_private: bool,
    /// Fail decoding when a class alias has no registry entry
    pub strict: bool,
    /// The class definition registry for this session
    pub class_def_mapper: Rc<ClassDefMapper>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            amf3: false,
            use_collections: false,
            use_proxies: false,
            use_references: true,
            use_legacy_xml: false,
            include_private: false,
            strict: false,
            class_def_mapper: Rc::new(ClassDefMapper::default()),
        }
    }
}

impl CodecOptions {
    /// Select amf3 as the outer format
    pub fn amf3(mut self) -> Self {
        self.amf3 = true;
        self
    }

    /// Wrap arrays in ArrayCollection on encode
    pub fn with_collections(mut self) -> Self {
        self.use_collections = true;
        self
    }

    /// Wrap anonymous objects in ObjectProxy on encode
    pub fn with_proxies(mut self) -> Self {
        self.use_proxies = true;
        self
    }

    /// Disable reference deduplication on encode
    ///
    /// Cyclic inputs cannot be encoded without references.
    pub fn without_references(mut self) -> Self {
        self.use_references = false;
        self
    }

    /// Emit legacy XMLDocument in amf3
    pub fn with_legacy_xml(mut self) -> Self {
        self.use_legacy_xml = true;
        self
    }

    /// Keep leading underscore attributes of anonymous objects
    pub fn with_private_attrs(mut self) -> Self {
        self.include_private = true;
        self
    }

    /// Fail decoding on unmapped class aliases
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Use the given class definition registry
    pub fn with_mapper(mut self, mapper: Rc<ClassDefMapper>) -> Self {
        self.class_def_mapper = mapper;
        self
    }
}
