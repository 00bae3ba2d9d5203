use nom::bytes::streaming::take;
use nom::error::{ErrorKind, ParseError};
use nom::number::streaming::le_u32;
use nom::{Err, IResult};
use rusticata_macros::align32;

use crate::error::PcapError;

use super::*;

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// When parsed, `data` holds the packet bytes without the padding.
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    pub data: &'a [u8],
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Decode the packet timestamp
    ///
    /// The resolution is stored in the [`InterfaceDescriptionBlock`]
    /// matching the interface ID.
    ///
    /// Return the timestamp seconds and fractional part (in resolution units)
    #[inline]
    pub fn decode_ts(&self, resolution: u64) -> (u64, u64) {
        build_ts(self.ts_high, self.ts_low, resolution)
    }

    /// Return the `opt_comment` option value, if present and valid
    pub fn comment(&self) -> Option<&str> {
        options_get(&self.options, OptionCode::Comment).and_then(PcapNGOption::as_str)
    }
}

impl<'a> PcapNGBlockParser<'a, EnhancedPacketBlock<'a>> for EnhancedPacketBlock<'a> {
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = EPB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], EnhancedPacketBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, if_id) = le_u32(i)?;
        let (i, ts_high) = le_u32(i)?;
        let (i, ts_low) = le_u32(i)?;
        let (i, caplen) = le_u32(i)?;
        let (i, origlen) = le_u32(i)?;
        // align32 can overflow
        if caplen >= u32::MAX - 4 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        let padded_length = align32!(caplen);
        let (i, padded_data) = take(padded_length)(i)?;
        // read options
        let current_offset = (32 + padded_length) as usize;
        let (i, options) = opt_parse_options::<E>(i, block_len1 as usize, current_offset)?;
        let block = EnhancedPacketBlock {
            block_type,
            block_len1,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data: &padded_data[..caplen as usize],
            options,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Enhanced Packet Block (little-endian)
pub fn parse_enhancedpacketblock_le(i: &[u8]) -> IResult<&[u8], EnhancedPacketBlock, PcapError> {
    ng_block_parser::<EnhancedPacketBlock, _, _>()(i)
}
