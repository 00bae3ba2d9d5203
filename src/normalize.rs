//! Link-layer normalization
//!
//! Depending on the sniffer verbosity, a dump holds full Ethernet frames or
//! only the IP packet. All packets are written with the Ethernet link type:
//! IP packets get a synthetic Ethernet II header with zeroed addresses.

use tracing::warn;

use crate::assembler::{InterfaceKind, ParsedPacket};
use crate::error::{AssemblyError, AssemblyErrorKind};
use crate::linktype::Linktype;
use crate::options::{ConvertOptions, LinkHint};

pub const ETHERNET_HEADER_LEN: usize = 14;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86dd;

const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;

/// EtherTypes accepted as evidence of an Ethernet header
const KNOWN_ETHERTYPES: &[u16] = &[
    ETHERTYPE_IPV4,
    0x0806, // ARP
    ETHERTYPE_IPV6,
    0x8100, // 802.1Q
    0x88a8, // 802.1ad
    0x9100, // QinQ
    0x8035, // RARP
    0x8847, // MPLS
    0x8848,
    0x8863, // PPPoE
    0x8864,
    0x88cc, // LLDP
    0x88e5, // MACsec
    0x8906, // FCoE
];

/// Framing of the bytes found in a dump
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    Ethernet,
    RawIpv4,
    RawIpv6,
    /// Neither an Ethernet frame nor an IP packet. Written as is.
    Unknown,
}

/// Test if the bytes start with a consistent IP header
pub fn raw_ip_framing(data: &[u8]) -> Option<Framing> {
    let first = *data.first()?;
    match first >> 4 {
        4 => {
            let ihl = ((first & 0x0f) as usize) * 4;
            if data.len() < IPV4_MIN_HEADER_LEN || ihl < IPV4_MIN_HEADER_LEN || ihl > data.len() {
                return None;
            }
            let total_length = u16::from_be_bytes([data[2], data[3]]) as usize;
            if total_length < ihl {
                return None;
            }
            Some(Framing::RawIpv4)
        }
        6 if data.len() >= IPV6_HEADER_LEN => Some(Framing::RawIpv6),
        _ => None,
    }
}

/// Test if the bytes start with two MAC addresses and a plausible EtherType
pub fn is_ethernet_frame(data: &[u8]) -> bool {
    if data.len() < ETHERNET_HEADER_LEN {
        return false;
    }
    let ethertype = u16::from_be_bytes([data[12], data[13]]);
    if KNOWN_ETHERTYPES.contains(&ethertype) {
        return true;
    }
    // 802.3 length field
    ethertype as usize <= 1500 && ethertype as usize <= data.len() - ETHERNET_HEADER_LEN
}

/// Decide the framing of a packet
///
/// When the bytes are plausible both as an IP packet and as an Ethernet
/// frame, physical ports are assumed to carry frames.
pub fn detect_framing(data: &[u8], kind: InterfaceKind, hint: LinkHint) -> Framing {
    match hint {
        LinkHint::Ethernet => Framing::Ethernet,
        LinkHint::RawIp => match data.first().map(|b| b >> 4) {
            Some(4) => Framing::RawIpv4,
            Some(6) => Framing::RawIpv6,
            _ => Framing::Unknown,
        },
        LinkHint::Auto => match (raw_ip_framing(data), is_ethernet_frame(data)) {
            (Some(_), true) if kind == InterfaceKind::Physical => Framing::Ethernet,
            (Some(ip), _) => ip,
            (None, true) => Framing::Ethernet,
            (None, false) => Framing::Unknown,
        },
    }
}

/// Ethernet II header with zeroed addresses
pub fn synthetic_ethernet_header(ethertype: u16) -> [u8; ETHERNET_HEADER_LEN] {
    let mut header = [0u8; ETHERNET_HEADER_LEN];
    header[12..].copy_from_slice(&ethertype.to_be_bytes());
    header
}

/// Check that an IPv4-in-Ethernet frame holds the whole IP packet
pub fn check_ipv4_length(frame: &[u8]) -> Result<(), AssemblyErrorKind> {
    if frame.len() < ETHERNET_HEADER_LEN + 4 {
        return Ok(());
    }
    if u16::from_be_bytes([frame[12], frame[13]]) != ETHERTYPE_IPV4 {
        return Ok(());
    }
    let total_length = u16::from_be_bytes([frame[16], frame[17]]) as usize;
    let declared = total_length + ETHERNET_HEADER_LEN;
    if declared > frame.len() {
        return Err(AssemblyErrorKind::TruncatedPacket {
            declared,
            available: frame.len(),
        });
    }
    Ok(())
}

/// Give a packet Ethernet framing
///
/// Returns the packet, with a synthetic header if needed, and the link type to
/// declare for it.
pub fn normalize(
    mut packet: ParsedPacket,
    options: &ConvertOptions,
) -> Result<(ParsedPacket, Linktype), AssemblyError> {
    let hint = options.hint_for(&packet.interface_name);
    let framing = detect_framing(&packet.payload_bytes, packet.interface_kind, hint);
    let ethertype = match framing {
        Framing::RawIpv4 => Some(ETHERTYPE_IPV4),
        Framing::RawIpv6 => Some(ETHERTYPE_IPV6),
        Framing::Ethernet => None,
        Framing::Unknown => {
            warn!(
                record = packet.record_index,
                line = packet.line,
                interface = %packet.interface_name,
                "neither an Ethernet frame nor an IP packet, writing bytes as is"
            );
            None
        }
    };
    if let Some(ethertype) = ethertype {
        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + packet.payload_bytes.len());
        frame.extend_from_slice(&synthetic_ethernet_header(ethertype));
        frame.extend_from_slice(&packet.payload_bytes);
        packet.payload_bytes = frame;
        packet.needs_synthetic_link_header = true;
    }
    if options.check_packet_size {
        check_ipv4_length(&packet.payload_bytes)
            .map_err(|kind| AssemblyError::new(kind, packet.record_index, packet.line))?;
    }
    Ok((packet, Linktype::ETHERNET))
}
