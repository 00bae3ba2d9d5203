//! PCAPNG container writer
//!
//! Blocks are serialized one after the other into an in-memory buffer. Each
//! block is parsed back as soon as it is written, and its framing is checked:
//! equal leading and trailing lengths, matching the number of bytes written,
//! multiple of 4.

use std::convert::TryFrom;

use tracing::trace;

use crate::assembler::{ParsedPacket, Timestamp};
use crate::document::{CaptureDocument, InterfaceEntry};
use crate::error::WriterError;
use crate::options::ConvertOptions;
use crate::pcapng::*;
use crate::serialize::ToVec;

/// Writes a single-section little-endian PCAPNG capture
#[derive(Debug)]
pub struct PcapNGWriter {
    buf: Vec<u8>,
    interfaces: u32,
    packets: u32,
}

impl PcapNGWriter {
    /// Start a capture, writing the section header
    ///
    /// `user_appl` is stored as the `shb_userappl` option, unless empty.
    pub fn new(user_appl: &str) -> Result<Self, WriterError> {
        let mut writer = PcapNGWriter {
            buf: Vec::new(),
            interfaces: 0,
            packets: 0,
        };
        let mut options = Vec::new();
        if !user_appl.is_empty() {
            options.push(PcapNGOption::new_str(OptionCode::ShbUserAppl, user_appl)?);
        }
        let mut shb = SectionHeaderBlock::new(options);
        writer.emit(&mut shb)?;
        Ok(writer)
    }

    /// Declare an interface. Interface ids are assigned in call order, from 0.
    pub fn add_interface(&mut self, interface: &InterfaceEntry) -> Result<u32, WriterError> {
        if !interface.linktype.is_supported() {
            return Err(WriterError::UnsupportedLinktype(interface.linktype));
        }
        let options = vec![PcapNGOption::new_str(OptionCode::IfName, &interface.name)?];
        let mut idb = InterfaceDescriptionBlock::new(interface.linktype, interface.snaplen, options);
        self.emit(&mut idb)?;
        let id = self.interfaces;
        self.interfaces += 1;
        Ok(id)
    }

    /// Write a packet, captured on the interface `if_id`
    ///
    /// The packet is never truncated: captured and original lengths are both
    /// the length of `data`.
    pub fn write_packet(
        &mut self,
        if_id: u32,
        ts: Timestamp,
        data: &[u8],
        comment: Option<&str>,
    ) -> Result<(), WriterError> {
        if if_id >= self.interfaces {
            return Err(WriterError::InvalidInterfaceId(if_id));
        }
        let caplen = u32::try_from(data.len()).map_err(|_| WriterError::PacketTooLarge(data.len()))?;
        // timestamps are in microseconds (if_tsresol = 6)
        let units = ts.as_micros().ok_or(WriterError::TimestampOverflow {
            seconds: ts.seconds,
        })?;
        let (ts_high, ts_low) = split_ts(units);
        let mut options = Vec::new();
        if let Some(comment) = comment {
            options.push(PcapNGOption::new_str(OptionCode::Comment, comment)?);
        }
        let mut epb = EnhancedPacketBlock {
            block_type: EPB_MAGIC,
            block_len1: 0,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen: caplen,
            data,
            options,
            block_len2: 0,
        };
        self.emit(&mut epb)?;
        self.packets += 1;
        Ok(())
    }

    /// Number of packet blocks written
    pub fn packet_count(&self) -> u32 {
        self.packets
    }

    /// Return the capture bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn emit<T: ToVec>(&mut self, block: &mut T) -> Result<(), WriterError> {
        let bytes = block.to_vec()?;
        check_block(&bytes)?;
        trace!(
            block_type = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            len = bytes.len(),
            "block written"
        );
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }
}

/// Check the framing of a serialized block
pub fn check_block(bytes: &[u8]) -> Result<(), WriterError> {
    let leading = bytes
        .get(4..8)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);
    let trailing = bytes
        .len()
        .checked_sub(4)
        .map(|start| {
            let b = &bytes[start..];
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
        .unwrap_or(0);
    let block_type = bytes
        .get(0..4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);
    let malformed = WriterError::MalformedBlock {
        block_type,
        leading,
        trailing,
        actual: bytes.len(),
    };
    if leading != trailing || leading as usize != bytes.len() || bytes.len() % 4 != 0 {
        return Err(malformed);
    }
    match parse_unknownblock_le(bytes) {
        Ok((rem, _)) if rem.is_empty() => Ok(()),
        _ => Err(malformed),
    }
}

/// Packet comment: direction then interface, as `(in)  port1`
pub fn packet_comment(packet: &ParsedPacket, line_numbers: bool) -> String {
    let direction = packet.direction.to_string();
    let pad = 4usize.saturating_sub(direction.len());
    let mut comment = format!("({}){:pad$}{}", direction, "", packet.interface_name, pad = pad);
    if line_numbers {
        comment.push_str(&format!("  {:5}", packet.line));
    }
    comment
}

/// Serialize a whole capture document
///
/// Interfaces are written first, in table order, then packets in document order.
pub fn write_document(doc: &CaptureDocument, options: &ConvertOptions) -> Result<Vec<u8>, WriterError> {
    let mut writer = PcapNGWriter::new(&options.user_application)?;
    for interface in doc.interfaces().iter() {
        writer.add_interface(interface)?;
    }
    for entry in doc.packets() {
        let packet = &entry.packet;
        let comment = if options.packet_comments {
            Some(packet_comment(packet, options.comment_line_numbers))
        } else {
            None
        };
        writer.write_packet(
            entry.interface_id,
            packet.timestamp,
            &packet.payload_bytes,
            comment.as_deref(),
        )?;
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::InterfaceKind;
    use crate::linktype::Linktype;
    use crate::sniffer::Direction;

    fn entry(name: &str, linktype: Linktype) -> InterfaceEntry {
        InterfaceEntry {
            name: name.to_string(),
            kind: InterfaceKind::Physical,
            linktype,
            snaplen: 1514,
        }
    }

    #[test]
    fn writer_blocks() {
        let mut writer = PcapNGWriter::new("test").expect("writer");
        assert_eq!(writer.add_interface(&entry("port1", Linktype::ETHERNET)).ok(), Some(0));
        writer
            .write_packet(0, Timestamp::new(1, 500_000), &[0u8; 60], Some("(in)  port1"))
            .expect("packet");
        assert_eq!(writer.packet_count(), 1);
        let bytes = writer.into_inner();
        let (rem, section) = parse_section(&bytes).expect("parse");
        assert!(rem.is_empty());
        assert_eq!(section.blocks.len(), 3);
        assert_eq!(section.header().and_then(|shb| shb.user_application()), Some("test"));
        let idb = section.iter_interfaces().next().expect("idb");
        assert_eq!(idb.if_name(), Some("port1"));
        let epb = section.iter_packets().next().expect("epb");
        assert_eq!(epb.decode_ts(1_000_000), (1, 500_000));
        assert_eq!(epb.comment(), Some("(in)  port1"));
    }

    #[test]
    fn writer_errors() {
        let mut writer = PcapNGWriter::new("").expect("writer");
        assert!(matches!(
            writer.write_packet(0, Timestamp::default(), &[0], None),
            Err(WriterError::InvalidInterfaceId(0))
        ));
        assert!(matches!(
            writer.add_interface(&entry("x", Linktype(147))),
            Err(WriterError::UnsupportedLinktype(Linktype(147)))
        ));
        writer
            .add_interface(&entry("port1", Linktype::ETHERNET))
            .expect("interface");
        assert!(matches!(
            writer.write_packet(0, Timestamp::new(u64::MAX, 0), &[0], None),
            Err(WriterError::TimestampOverflow { .. })
        ));
    }

    #[test]
    fn check_block_framing() {
        let mut idb = InterfaceDescriptionBlock::new(Linktype::ETHERNET, 1514, vec![]);
        let mut bytes = idb.to_vec().expect("serialize");
        assert!(check_block(&bytes).is_ok());
        let last = bytes.len() - 4;
        bytes[last] = 0x24;
        assert!(matches!(
            check_block(&bytes),
            Err(WriterError::MalformedBlock {
                leading: 32,
                trailing: 36,
                ..
            })
        ));
        assert!(check_block(&bytes[..6]).is_err());
    }

    #[test]
    fn comments() {
        let mut packet = ParsedPacket {
            record_index: 1,
            line: 42,
            timestamp: Timestamp::default(),
            interface_name: "port1".to_string(),
            interface_kind: InterfaceKind::Physical,
            direction: Direction::In,
            payload_bytes: vec![],
            needs_synthetic_link_header: false,
        };
        assert_eq!(packet_comment(&packet, false), "(in)  port1");
        assert_eq!(packet_comment(&packet, true), "(in)  port1     42");
        packet.direction = Direction::Out;
        assert_eq!(packet_comment(&packet, false), "(out) port1");
        packet.direction = Direction::Unknown;
        assert_eq!(packet_comment(&packet, false), "(--)  port1");
    }
}
