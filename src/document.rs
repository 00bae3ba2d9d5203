use std::collections::HashMap;

use crate::assembler::{InterfaceKind, ParsedPacket};
use crate::linktype::Linktype;

/// An interface of the capture, as declared in an Interface Description Block
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterfaceEntry {
    pub name: String,
    pub kind: InterfaceKind,
    pub linktype: Linktype,
    /// Length of the largest packet seen on this interface
    pub snaplen: u32,
}

/// Interfaces in first-seen order. The position in the table is the interface id.
#[derive(Debug, Default)]
pub struct InterfaceTable {
    entries: Vec<InterfaceEntry>,
    ids: HashMap<String, u32>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        InterfaceTable::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn get(&self, id: u32) -> Option<&InterfaceEntry> {
        self.entries.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.entries.iter()
    }

    /// Return the id of the interface, adding it if needed
    fn intern(&mut self, name: &str, kind: InterfaceKind, linktype: Linktype) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = self.entries.len() as u32;
        self.entries.push(InterfaceEntry {
            name: name.to_string(),
            kind,
            linktype,
            snaplen: 0,
        });
        self.ids.insert(name.to_string(), id);
        id
    }
}

/// A packet and the interface it was captured on
#[derive(Clone, Debug)]
pub struct DocumentPacket {
    pub interface_id: u32,
    pub packet: ParsedPacket,
}

/// Interfaces and packets of the capture to write, in input order
#[derive(Debug, Default)]
pub struct CaptureDocument {
    interfaces: InterfaceTable,
    packets: Vec<DocumentPacket>,
}

impl CaptureDocument {
    pub fn new() -> Self {
        CaptureDocument::default()
    }

    /// Append a packet, registering its interface on first sight
    ///
    /// Returns the interface id. The link type of an interface is the one of
    /// its first packet.
    pub fn push(&mut self, packet: ParsedPacket, linktype: Linktype) -> u32 {
        let interface_id =
            self.interfaces
                .intern(&packet.interface_name, packet.interface_kind, linktype);
        let len = packet.payload_bytes.len() as u32;
        if let Some(entry) = self.interfaces.entries.get_mut(interface_id as usize) {
            entry.snaplen = entry.snaplen.max(len);
        }
        self.packets.push(DocumentPacket {
            interface_id,
            packet,
        });
        interface_id
    }

    pub fn interfaces(&self) -> &InterfaceTable {
        &self.interfaces
    }

    pub fn packets(&self) -> &[DocumentPacket] {
        &self.packets
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Timestamp;
    use crate::sniffer::Direction;

    fn packet(interface: &str, len: usize) -> ParsedPacket {
        ParsedPacket {
            record_index: 1,
            line: 1,
            timestamp: Timestamp::default(),
            interface_name: interface.to_string(),
            interface_kind: InterfaceKind::classify(interface),
            direction: Direction::Out,
            payload_bytes: vec![0; len],
            needs_synthetic_link_header: false,
        }
    }

    #[test]
    fn first_seen_order() {
        let mut doc = CaptureDocument::new();
        assert_eq!(doc.push(packet("port2", 60), Linktype::ETHERNET), 0);
        assert_eq!(doc.push(packet("port1", 60), Linktype::ETHERNET), 1);
        assert_eq!(doc.push(packet("port2", 1514), Linktype::ETHERNET), 0);
        let names: Vec<_> = doc.interfaces().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["port2", "port1"]);
        assert_eq!(doc.interfaces().id("port1"), Some(1));
        assert_eq!(doc.interfaces().get(0).map(|e| e.snaplen), Some(1514));
        assert_eq!(doc.interfaces().get(1).map(|e| e.snaplen), Some(60));
        let ids: Vec<_> = doc.packets().iter().map(|p| p.interface_id).collect();
        assert_eq!(ids, vec![0, 1, 0]);
    }
}
