use cookie_factory::GenError;
use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// Errors that can occur while decoding AMF data
///
/// Every variant carries the remaining input at the failed primitive; the
/// absolute offset can be recovered with [`Error::offset_in`].
#[derive(Debug, PartialEq, Error)]
pub enum Error<'a> {
    /// A read ran past the end of the input
    #[error("input ended with {} bytes remaining", .0.len())]
    Underflow(&'a [u8]),
    /// A reference index or size lies outside the valid window
    #[error("index or size {1} is out of range")]
    OutOfRange(&'a [u8], usize),
    /// The tag byte is not defined for the current format
    #[error("unknown type marker {1:#04x}")]
    UnknownMarker(&'a [u8], u8),
    /// The encoded trait shape disagrees with the registered class definition
    #[error("encoded trait disagrees with the registered class definition")]
    BadTrait(&'a [u8]),
    /// A class alias has no registry entry
    #[error("no class definition registered for alias {1:?}")]
    UnmappedAlias(&'a [u8], String),
    /// A length-prefixed string is not valid UTF-8
    #[error("length-prefixed string is not valid UTF-8")]
    BadUtf8(&'a [u8]),
    /// A packet version word outside {0, 1, 3}
    #[error("unknown client version {1:#06x}")]
    BadClientVersion(&'a [u8], u16),
    /// A residual nom combinator error
    #[error("parsing failed with {1:?}")]
    Nom(&'a [u8], ErrorKind),
}

impl<'a> Error<'a> {
    /// The input remaining when the error was raised
    pub fn remaining(&self) -> &'a [u8] {
        match self {
            Error::Underflow(i)
            | Error::OutOfRange(i, _)
            | Error::UnknownMarker(i, _)
            | Error::BadTrait(i)
            | Error::UnmappedAlias(i, _)
            | Error::BadUtf8(i)
            | Error::BadClientVersion(i, _)
            | Error::Nom(i, _) => i,
        }
    }

    /// The byte offset of the failed primitive within `input`
    ///
    /// `input` must be the slice the failing decode call started from.
    pub fn offset_in(&self, input: &[u8]) -> usize {
        input.len() - self.remaining().len()
    }
}

impl<'a> ParseError<&'a [u8]> for Error<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof | ErrorKind::Complete => Error::Underflow(input),
            _ => Error::Nom(input, kind),
        }
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Custom serializer failure: a class definition exceeded the 2^24 static
/// attribute limit of the trait header
pub(crate) const GEN_TRAIT_TOO_LARGE: u32 = 1;
/// Custom serializer failure: a string or byte payload exceeded the u29
/// length window
pub(crate) const GEN_PAYLOAD_TOO_LARGE: u32 = 2;
/// Custom serializer failure: an externalized class has no registered encoder
pub(crate) const GEN_MISSING_EXTERNAL_ENCODER: u32 = 3;

/// Errors that can occur while encoding AMF data
#[derive(Debug, Error)]
pub enum WriteError {
    /// A class definition exceeds the 2^24 static attribute limit
    #[error("class definition exceeds the trait header attribute limit")]
    TraitTooLarge,
    /// A string or byte payload exceeds the u29 length window
    #[error("payload exceeds the u29 length window")]
    PayloadTooLarge,
    /// An object with an externalized class definition has no registered encoder
    #[error("no encoder registered for an externalized class definition")]
    MissingExternalEncoder,
    /// The underlying serializer failed
    #[error("serialization failed with {0:?}")]
    Serialize(GenError),
}

impl From<GenError> for WriteError {
    fn from(e: GenError) -> Self {
        match e {
            GenError::CustomError(GEN_TRAIT_TOO_LARGE) => WriteError::TraitTooLarge,
            GenError::CustomError(GEN_PAYLOAD_TOO_LARGE) => WriteError::PayloadTooLarge,
            GenError::CustomError(GEN_MISSING_EXTERNAL_ENCODER) => {
                WriteError::MissingExternalEncoder
            }
            other => WriteError::Serialize(other),
        }
    }
}
