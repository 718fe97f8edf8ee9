use crate::amf3::read::AMF3Decoder;
use crate::amf3::write::AMF3Encoder;
use crate::nom_utils::AMFResult;
use crate::types::{ClassDefinition, Element};
use std::rc::Rc;

/// Decodes the body of an externalized class into its elements
///
/// The hook receives the input positioned directly after the trait header and
/// the live decoder, whose primitive readers it may call; it must return the
/// remaining input after the body it consumed.
pub type ExternalDecoderFn =
    Rc<dyn for<'a> Fn(&'a [u8], &mut AMF3Decoder) -> AMFResult<'a, Vec<Element>>>;

/// Wrap a closure as an [`ExternalDecoderFn`]
///
/// Guides closure inference towards the higher ranked signature the type
/// requires.
pub fn external_decoder<F>(f: F) -> ExternalDecoderFn
where
    F: for<'a> Fn(&'a [u8], &mut AMF3Decoder) -> AMFResult<'a, Vec<Element>> + 'static,
{
    Rc::new(f)
}

/// Encodes the body of an externalized class
pub trait CustomEncoder {
    /// Produce the body bytes written directly after the trait header
    ///
    /// The encoder handle gives access to the primitive writers so the body
    /// can participate in the session's string references.
    fn encode(
        &self,
        elements: &[Element],
        class_def: &Option<ClassDefinition>,
        encoder: &AMF3Encoder,
    ) -> Vec<u8>;
}
