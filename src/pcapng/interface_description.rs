use std::borrow::Cow;

use nom::error::ParseError;
use nom::number::streaming::{le_u16, le_u32};
use nom::IResult;

use crate::error::PcapError;
use crate::linktype::Linktype;

use super::*;

/// Time resolution written for every interface: microseconds
pub const DEFAULT_TSRESOL: u8 = 6;

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
    pub if_tsresol: u8,
}

impl<'a> InterfaceDescriptionBlock<'a> {
    /// Create an interface description, with microsecond timestamps
    pub fn new(linktype: Linktype, snaplen: u32, options: Vec<PcapNGOption<'a>>) -> Self {
        let mut options = options;
        options.push(PcapNGOption {
            code: OptionCode::IfTsresol,
            len: 1,
            value: Cow::Owned(vec![DEFAULT_TSRESOL, 0, 0, 0]),
        });
        InterfaceDescriptionBlock {
            block_type: IDB_MAGIC,
            block_len1: 0,
            linktype,
            reserved: 0,
            snaplen,
            options,
            block_len2: 0,
            if_tsresol: DEFAULT_TSRESOL,
        }
    }

    /// Decode the interface time resolution, in units per second
    ///
    /// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
    #[inline]
    pub fn ts_resolution(&self) -> Option<u64> {
        build_ts_resolution(self.if_tsresol)
    }

    /// Return the `if_name` option value, if present and valid
    pub fn if_name(&self) -> Option<&str> {
        options_get(&self.options, OptionCode::IfName).and_then(PcapNGOption::as_str)
    }
}

impl<'a> PcapNGBlockParser<'a, InterfaceDescriptionBlock<'a>> for InterfaceDescriptionBlock<'a> {
    const HDR_SZ: usize = 20;
    const MAGIC: u32 = IDB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], InterfaceDescriptionBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, linktype) = le_u16(i)?;
        let (i, reserved) = le_u16(i)?;
        let (i, snaplen) = le_u32(i)?;
        // read options
        let (i, options) = opt_parse_options::<E>(i, block_len1 as usize, 20)?;
        let if_tsresol = options_get(&options, OptionCode::IfTsresol)
            .and_then(|opt| opt.value().first().copied())
            .unwrap_or(DEFAULT_TSRESOL);
        let block = InterfaceDescriptionBlock {
            block_type,
            block_len1,
            linktype: Linktype(linktype as i32),
            reserved,
            snaplen,
            options,
            block_len2,
            if_tsresol,
        };
        Ok((i, block))
    }
}

/// Parse an Interface Packet Block (little-endian)
pub fn parse_interfacedescriptionblock_le(
    i: &[u8],
) -> IResult<&[u8], InterfaceDescriptionBlock, PcapError> {
    ng_block_parser::<InterfaceDescriptionBlock, _, _>()(i)
}
