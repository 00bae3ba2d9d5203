use std::borrow::Cow;
use std::io::Write;

use cookie_factory::bytes::{le_i64, le_u16, le_u32};
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use rusticata_macros::align32;

use crate::pcapng::*;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation (little-endian).
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation (little-endian). Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

fn pcapngoption_le<'a, 'b: 'a, W: Write + 'a>(i: &'b PcapNGOption) -> impl SerializeFn<W> + 'a {
    tuple((
        le_u16(i.code.0),
        le_u16(i.len),
        slice(&i.value),
        padding_for(i.value.len() as u32),
    ))
}

fn options_length(options: &[PcapNGOption]) -> usize {
    options.iter().map(|o| align32!(4 + o.value.len())).sum()
}

fn fix_options(options: &mut Vec<PcapNGOption>) {
    options.retain(|e| e.code != OptionCode::EndOfOpt);
    if options.is_empty() {
        // No EndOfOpt is required if there are no options.
    } else {
        options.push(PcapNGOption {
            code: OptionCode::EndOfOpt,
            len: 0,
            value: Cow::Borrowed(&[]),
        })
    }
}

/// Total length of a block: fixed part, options, and the two length fields
/// (`fixed_len` counts the block type and both lengths)
fn block_length(fixed_len: usize, options: &[PcapNGOption]) -> u32 {
    (fixed_len + options_length(options)) as u32
}

/// Serialize a block: type, leading length, `body`, options, trailing length
fn framed_block_le<'a, 'b: 'a, W, F>(
    block_type: u32,
    block_len1: u32,
    body: F,
    options: &'b [PcapNGOption],
    block_len2: u32,
) -> impl SerializeFn<W> + 'a
where
    W: Write + 'a,
    F: SerializeFn<W> + 'a,
{
    tuple((
        le_u32(block_type),
        le_u32(block_len1),
        body,
        many_ref(options, pcapngoption_le),
        le_u32(block_len2),
    ))
}

fn gen_block<F: SerializeFn<Vec<u8>>>(capacity: u32, f: F) -> Result<Vec<u8>, GenError> {
    gen(f, Vec::with_capacity(capacity as usize)).map(|(v, _)| v)
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    /// Little-endian v1.0 header of unspecified section length
    fn fix(&mut self) {
        self.block_type = SHB_MAGIC;
        self.bom = BOM_MAGIC;
        self.major_version = 1;
        self.minor_version = 0;
        fix_options(&mut self.options);
        let length = block_length(28, &self.options);
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let header = tuple((
            le_u32(self.bom),
            le_u16(self.major_version),
            le_u16(self.minor_version),
            le_i64(self.section_len),
        ));
        gen_block(
            self.block_len1,
            framed_block_le(self.block_type, self.block_len1, header, &self.options, self.block_len2),
        )
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    /// Add the `if_tsresol` option if missing, then fix lengths
    fn fix(&mut self) {
        self.block_type = IDB_MAGIC;
        self.reserved = 0;
        if options_get(&self.options, OptionCode::IfTsresol).is_none() {
            self.options.push(PcapNGOption {
                code: OptionCode::IfTsresol,
                len: 1,
                value: Cow::Owned(vec![self.if_tsresol]),
            });
        }
        fix_options(&mut self.options);
        let length = block_length(20, &self.options);
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let header = tuple((
            le_u16(self.linktype.0 as u16),
            le_u16(self.reserved),
            le_u32(self.snaplen),
        ));
        gen_block(
            self.block_len1,
            framed_block_le(self.block_type, self.block_len1, header, &self.options, self.block_len2),
        )
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    /// Packets are never truncated: `caplen` is the data length
    fn fix(&mut self) {
        self.block_type = EPB_MAGIC;
        self.caplen = self.data.len() as u32;
        self.origlen = self.origlen.max(self.caplen);
        fix_options(&mut self.options);
        let length = block_length(32 + align32!(self.data.len()), &self.options);
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let header = tuple((
            le_u32(self.if_id),
            le_u32(self.ts_high),
            le_u32(self.ts_low),
            le_u32(self.caplen),
            le_u32(self.origlen),
            slice(self.data),
            padding_for(self.data.len() as u32),
        ));
        gen_block(
            self.block_len1,
            framed_block_le(self.block_type, self.block_len1, header, &self.options, self.block_len2),
        )
    }
}
