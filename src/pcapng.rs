//! PCAPNG blocks
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! Only the blocks needed to describe a sniffer capture are modelled: the Section
//! Header Block (SHB), Interface Description Blocks (IDB) and Enhanced Packet
//! Blocks (EPB). Other blocks are read as [`UnknownBlock`].
//!
//! ## File format
//!
//! A capture file is organized in blocks. Each block starts with its type and
//! total length, and ends with the total length again. The total length
//! includes the padding of the body to a multiple of 4 bytes.
//!
//! Blocks are written little-endian, and the SHB byte-order magic says so.
//! Reading big-endian sections is not supported.
//!
//! A written capture can be read back with [`parse_section`]:
//!
//! ```rust
//! use sniffer_pcapng::convert;
//! use sniffer_pcapng::pcapng::{parse_section, Block};
//!
//! let input = b"0.000001 port1 in 127.0.0.1 -> 127.0.0.1: udp
//! 0x0000   4500 0014 0000 4000 4011 0000 7f00 0001   E.....@.@.......
//! 0x0010   7f00 0001                                 ....
//! ";
//! let conversion = convert(input).expect("conversion failed");
//! let (_, section) = parse_section(&conversion.pcapng).expect("invalid capture");
//! assert_eq!(section.iter_interfaces().count(), 1);
//! for epb in section.iter_packets() {
//!     assert_eq!(epb.caplen, 34);
//! }
//! ```

use nom::{Err, IResult};

use crate::error::PcapError;

mod block;
mod enhanced_packet;
mod interface_description;
mod option;
mod section_header;
mod time;
mod unknown;

pub use block::*;
pub use enhanced_packet::*;
pub use interface_description::*;
pub use option::*;
pub use section_header::*;
pub use time::*;
pub use unknown::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

/// A Section (including all blocks) from a PcapNG file
#[derive(Debug)]
pub struct Section<'a> {
    /// The list of blocks, starting with the section header
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Section<'a> {
    /// Returns the section header
    pub fn header(&self) -> Option<&SectionHeaderBlock> {
        if let Some(Block::SectionHeader(ref b)) = self.blocks.first() {
            Some(b)
        } else {
            None
        }
    }

    /// Returns an iterator over the interface description blocks
    pub fn iter_interfaces(&self) -> impl Iterator<Item = &InterfaceDescriptionBlock<'a>> {
        self.blocks.iter().filter_map(|b| match b {
            Block::InterfaceDescription(idb) => Some(idb),
            _ => None,
        })
    }

    /// Returns an iterator over the enhanced packet blocks
    pub fn iter_packets(&self) -> impl Iterator<Item = &EnhancedPacketBlock<'a>> {
        self.blocks.iter().filter_map(|b| match b {
            Block::EnhancedPacket(epb) => Some(epb),
            _ => None,
        })
    }
}

/// Parse a single section: a section header, then all blocks up to the next
/// section header or the end of input
pub fn parse_section(i: &[u8]) -> IResult<&[u8], Section, PcapError> {
    let (mut i, shb) = parse_sectionheaderblock_le(i)?;
    let mut blocks = vec![Block::SectionHeader(shb)];
    while !i.is_empty() {
        if i.len() >= 4 && u32::from_le_bytes([i[0], i[1], i[2], i[3]]) == SHB_MAGIC {
            break;
        }
        let (rem, block) = parse_block_le(i).map_err(|e| match e {
            Err::Incomplete(_) => Err::Error(PcapError::Incomplete),
            e => e,
        })?;
        blocks.push(block);
        i = rem;
    }
    Ok((i, Section { blocks }))
}
