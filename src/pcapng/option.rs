use std::borrow::Cow;
use std::convert::TryFrom;

use nom::bytes::streaming::take;
use nom::combinator::{complete, map_parser};
use nom::error::ParseError;
use nom::multi::many0;
use nom::number::streaming::le_u16;
use nom::IResult;
use rusticata_macros::{align32, newtype_enum};

use crate::error::WriterError;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
    IfName = 2,
    ShbUserAppl = 4,
    IfTsresol = 9,
}
}

#[derive(Debug)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    pub len: u16,
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNGOption<'a> {
    /// Build an option holding a UTF-8 string (not NUL-terminated)
    pub fn new_str(code: OptionCode, s: &str) -> Result<PcapNGOption<'static>, WriterError> {
        let len = u16::try_from(s.len()).map_err(|_| WriterError::OptionTooLong {
            code: code.0,
            len: s.len(),
        })?;
        Ok(PcapNGOption {
            code,
            len,
            value: Cow::Owned(s.as_bytes().to_vec()),
        })
    }

    /// Return a reference to the option value, as raw bytes (not related to the `len` field)
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }

    /// Return a reference to the option value, using the `len` field to limit it, or None if length is invalid
    pub fn as_bytes(&self) -> Option<&[u8]> {
        let len = usize::from(self.len);
        if len <= self.value.len() {
            Some(&self.value[..len])
        } else {
            None
        }
    }

    /// Return the option value as a string, or None if length or encoding is invalid
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Return the first option with this code
pub fn options_get<'a, 'b>(options: &'b [PcapNGOption<'a>], code: OptionCode) -> Option<&'b PcapNGOption<'a>> {
    options.iter().find(|opt| opt.code == code)
}

/// Parse a pcap-ng Option (little-endian)
pub fn parse_option_le<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption, E> {
    let (i, code) = le_u16(i)?;
    let (i, len) = le_u16(i)?;
    let (i, value) = take(align32!(len as u32))(i)?;
    let option = PcapNGOption {
        code: OptionCode(code),
        len,
        value: Cow::Borrowed(value),
    };
    Ok((i, option))
}

pub(crate) fn opt_parse_options<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
    len: usize,
    opt_offset: usize,
) -> IResult<&'i [u8], Vec<PcapNGOption>, E> {
    if len > opt_offset {
        map_parser(take(len - opt_offset), many0(complete(parse_option_le::<E>)))(i)
    } else {
        Ok((i, Vec::new()))
    }
}
