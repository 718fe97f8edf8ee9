use crate::errors::Error;
use nom::bytes::complete::take;
use nom::IResult;

/// The result of every AMF parser in this crate
pub type AMFResult<'a, T> = IResult<&'a [u8], T, Error<'a>>;

/// Take `len` bytes and decode them as UTF-8
pub(crate) fn take_str(i: &[u8], len: u32) -> AMFResult<'_, &str> {
    let (rest, bytes) = take(len)(i)?;
    let s = std::str::from_utf8(bytes).map_err(|_| nom::Err::Error(Error::BadUtf8(i)))?;
    Ok((rest, s))
}
