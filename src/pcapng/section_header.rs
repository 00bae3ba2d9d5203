use nom::error::ParseError;
use nom::number::streaming::{le_i64, le_u16, le_u32};
use nom::{Err, IResult};

use crate::error::PcapError;

use super::*;

/// The Section Header Block (SHB) identifies the
/// beginning of a section of the capture capture file.
///
/// The
/// Section Header Block does not contain data but it rather identifies a
/// list of blocks (interfaces, packets) that are logically correlated.
#[derive(Debug)]
pub struct SectionHeaderBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    /// Byte-order magic
    pub bom: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// Section length, -1 if not specified
    pub section_len: i64,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> SectionHeaderBlock<'a> {
    /// Create a section header for a new little-endian capture
    ///
    /// Lengths are set when serializing.
    pub fn new(options: Vec<PcapNGOption<'a>>) -> Self {
        SectionHeaderBlock {
            block_type: SHB_MAGIC,
            block_len1: 0,
            bom: BOM_MAGIC,
            major_version: 1,
            minor_version: 0,
            section_len: -1,
            options,
            block_len2: 0,
        }
    }

    /// Return the `shb_userappl` option value, if present and valid
    pub fn user_application(&self) -> Option<&str> {
        options_get(&self.options, OptionCode::ShbUserAppl).and_then(PcapNGOption::as_str)
    }
}

impl<'a> PcapNGBlockParser<'a, SectionHeaderBlock<'a>> for SectionHeaderBlock<'a> {
    const HDR_SZ: usize = 28;
    const MAGIC: u32 = SHB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], SectionHeaderBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, bom) = le_u32(i)?;
        let (i, major_version) = le_u16(i)?;
        let (i, minor_version) = le_u16(i)?;
        let (i, section_len) = le_i64(i)?;
        let (i, options) = opt_parse_options::<E>(i, block_len1 as usize, 28)?;
        let block = SectionHeaderBlock {
            block_type,
            block_len1,
            bom,
            major_version,
            minor_version,
            section_len,
            options,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse a Section Header Block (little endian)
///
/// Sections written in big-endian order are not recognized.
pub fn parse_sectionheaderblock_le(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock, PcapError> {
    if i.len() < 12 {
        return Err(Err::Incomplete(nom::Needed::new(12 - i.len())));
    }
    let bom = u32::from_le_bytes([i[8], i[9], i[10], i[11]]);
    if bom != BOM_MAGIC {
        return Err(Err::Error(PcapError::HeaderNotRecognized));
    }
    ng_block_parser::<SectionHeaderBlock, _, _>()(i)
}
