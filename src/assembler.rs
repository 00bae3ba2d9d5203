//! Packet assembly: from a [`RawRecord`] to the packet bytes and metadata

use std::borrow::Cow;
use std::convert::TryFrom;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AssemblyError, AssemblyErrorKind};
use crate::options::ConvertOptions;
use crate::sniffer::{normalize_line, parse_hex_line, Direction, RawRecord, RawTimestamp};

const MICROS_PER_SEC: u32 = 1_000_000;

/// Longest interface name accepted. Leaves room in a 16-bit option length for
/// the direction and line number added to packet comments.
pub const MAX_INTERFACE_NAME_LEN: usize = u16::MAX as usize - 32;

/// Packet timestamp, in seconds and microseconds
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp {
    pub seconds: u64,
    pub micros: u32,
}

impl Timestamp {
    pub const fn new(seconds: u64, micros: u32) -> Self {
        Timestamp { seconds, micros }
    }

    /// Total number of microseconds, or `None` on overflow
    pub fn as_micros(&self) -> Option<u64> {
        self.seconds
            .checked_mul(MICROS_PER_SEC as u64)?
            .checked_add(self.micros as u64)
    }
}

/// Kind of interface, guessed from its name
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterfaceKind {
    /// A port carrying Ethernet frames
    Physical,
    Loopback,
    /// IPsec, SSL VPN and other tunnels, which carry IP packets only
    Tunnel,
    Unknown,
}

const PHYSICAL_PREFIXES: &[&str] = &[
    "port", "wan", "lan", "internal", "dmz", "mgmt", "ha", "eth", "fortilink", "npu",
];
const LOOPBACK_PREFIXES: &[&str] = &["lo", "loopback"];
const TUNNEL_PREFIXES: &[&str] = &["ssl.", "tun", "gre", "vpn", "ipsec", "ppp", "wg", "vxlan"];

impl InterfaceKind {
    /// Classify an interface by name. Never fails.
    ///
    /// A chassis slot prefix (`FPC01/port1`) is ignored.
    pub fn classify(name: &str) -> InterfaceKind {
        let base = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| base.starts_with(p));
        if has_prefix(LOOPBACK_PREFIXES) {
            InterfaceKind::Loopback
        } else if has_prefix(TUNNEL_PREFIXES) {
            InterfaceKind::Tunnel
        } else if has_prefix(PHYSICAL_PREFIXES) {
            InterfaceKind::Physical
        } else {
            InterfaceKind::Unknown
        }
    }
}

/// A packet rebuilt from a sniffer record
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedPacket {
    /// 1-based index of the source record
    pub record_index: usize,
    /// Line number of the source record header
    pub line: usize,
    pub timestamp: Timestamp,
    pub interface_name: String,
    pub interface_kind: InterfaceKind,
    pub direction: Direction,
    pub payload_bytes: Vec<u8>,
    /// Set when an Ethernet header was synthesized in front of an IP packet
    pub needs_synthetic_link_header: bool,
}

/// Hex digits of a record, decoded on the fly
///
/// Every digit is counted, but bytes are only stored up to `max`.
struct NibbleStream {
    bytes: Vec<u8>,
    nibbles: usize,
    pending: Option<u8>,
    max: usize,
}

impl NibbleStream {
    fn new(max: usize) -> Self {
        NibbleStream {
            bytes: Vec::new(),
            nibbles: 0,
            pending: None,
            max,
        }
    }

    fn bytes_read(&self) -> usize {
        self.nibbles / 2
    }

    fn push_group(&mut self, group: &str) {
        for c in group.chars() {
            let v = match c.to_digit(16) {
                Some(v) => v as u8,
                None => continue,
            };
            self.nibbles += 1;
            match self.pending.take() {
                Some(high) => {
                    if self.bytes.len() < self.max {
                        self.bytes.push((high << 4) | v);
                    }
                }
                None => self.pending = Some(v),
            }
        }
    }

    fn finish(self) -> Result<Vec<u8>, AssemblyErrorKind> {
        if self.nibbles % 2 != 0 {
            return Err(AssemblyErrorKind::OddNibbleCount);
        }
        let size = self.nibbles / 2;
        if size == 0 {
            return Err(AssemblyErrorKind::EmptyPayload);
        }
        if size > self.max {
            return Err(AssemblyErrorKind::PayloadTooLarge {
                size,
                max: self.max,
            });
        }
        Ok(self.bytes)
    }
}

/// Decode the hex-dump lines of a record
pub fn decode_hex_lines(
    hex_lines: &[&str],
    options: &ConvertOptions,
) -> Result<Vec<u8>, AssemblyErrorKind> {
    if hex_lines.is_empty() {
        return Err(AssemblyErrorKind::EmptyRecord);
    }
    let mut stream = NibbleStream::new(options.max_packet_size);
    for &line in hex_lines {
        let line = if options.normalize_lines {
            normalize_line(line)
        } else {
            Cow::Borrowed(line)
        };
        let hex_line = match parse_hex_line(&line, options.dialect) {
            Ok((_, hex_line)) => hex_line,
            Err(_) => {
                debug!(line = %line, "skipping unparsable hex-dump line");
                continue;
            }
        };
        if options.strict_offsets {
            if let Some(found) = hex_line.offset {
                let expected = stream.bytes_read();
                if found != expected {
                    return Err(AssemblyErrorKind::OffsetMismatch { expected, found });
                }
            }
        }
        for group in hex_line.groups {
            stream.push_group(group);
        }
    }
    stream.finish()
}

/// Convert a fraction of second to microseconds, rounding to the nearest
///
/// Returns the microseconds and a carry of 1 second when rounding reaches it.
fn fraction_to_micros(fraction: &str) -> Option<(u32, bool)> {
    let digits = fraction.as_bytes();
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut micros: u32 = 0;
    for idx in 0..6 {
        let d = digits.get(idx).map(|d| (d - b'0') as u32).unwrap_or(0);
        micros = micros * 10 + d;
    }
    if digits.get(6).map(|&d| d >= b'5').unwrap_or(false) {
        micros += 1;
    }
    if micros == MICROS_PER_SEC {
        Some((0, true))
    } else {
        Some((micros, false))
    }
}

/// Normalize a header timestamp to seconds and microseconds
///
/// Absolute timestamps are read as UTC. Returns `None` if the value cannot be
/// represented (bad calendar date, before the epoch, overflow). The result
/// always fits a 64-bit count of microseconds.
pub fn normalize_timestamp(ts: &RawTimestamp) -> Option<Timestamp> {
    let (seconds, fraction) = match *ts {
        RawTimestamp::Relative { seconds, fraction } => (seconds.parse::<u64>().ok()?, fraction),
        RawTimestamp::Absolute {
            year,
            month,
            day,
            hour,
            minute,
            second,
            fraction,
        } => {
            let dt = NaiveDate::from_ymd_opt(year as i32, month, day)?
                .and_hms_opt(hour, minute, second)?
                .and_utc();
            (u64::try_from(dt.timestamp()).ok()?, fraction)
        }
    };
    let (micros, carry) = fraction_to_micros(fraction)?;
    let seconds = if carry {
        seconds.checked_add(1)?
    } else {
        seconds
    };
    let ts = Timestamp { seconds, micros };
    ts.as_micros().map(|_| ts)
}

/// Build a packet from a record
///
/// The payload is the raw dump content; link-layer framing is decided later
/// (see [`normalize`](crate::normalize)).
pub fn assemble(record: &RawRecord, options: &ConvertOptions) -> Result<ParsedPacket, AssemblyError> {
    let err = |kind: AssemblyErrorKind| AssemblyError::new(kind, record.index, record.line);
    let payload_bytes = decode_hex_lines(&record.hex_lines, options).map_err(err)?;
    let timestamp =
        normalize_timestamp(&record.timestamp).ok_or_else(|| err(AssemblyErrorKind::InvalidTimestamp))?;
    let name_len = record.interface_name.len();
    if name_len > MAX_INTERFACE_NAME_LEN {
        return Err(err(AssemblyErrorKind::InterfaceNameTooLong {
            len: name_len,
            max: MAX_INTERFACE_NAME_LEN,
        }));
    }
    let interface_name = record.interface_name.to_string();
    let interface_kind = InterfaceKind::classify(&interface_name);
    Ok(ParsedPacket {
        record_index: record.index,
        line: record.line,
        timestamp,
        interface_name,
        interface_kind,
        direction: record.direction,
        payload_bytes,
        needs_synthetic_link_header: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HexDialect;
    use hex_literal::hex;

    fn record<'a>(hex_lines: Vec<&'a str>) -> RawRecord<'a> {
        RawRecord {
            index: 3,
            line: 12,
            timestamp: RawTimestamp::Relative {
                seconds: "0",
                fraction: "000001",
            },
            interface_name: Cow::Borrowed("port1"),
            direction: Direction::In,
            summary_text: "",
            hex_lines,
        }
    }

    #[test]
    fn assemble_ipv4() {
        let r = record(vec![
            "0x0000   4500 0014 0000 4000 4011 0000 7f00 0001   E.....@.@.......",
            "0x0010   7f00 0001                                 ....",
        ]);
        let p = assemble(&r, &ConvertOptions::default()).expect("assemble");
        assert_eq!(
            p.payload_bytes,
            hex!("4500 0014 0000 4000 4011 0000 7f00 0001 7f00 0001").to_vec()
        );
        assert_eq!(p.timestamp, Timestamp::new(0, 1));
        assert_eq!(p.interface_kind, InterfaceKind::Physical);
        assert_eq!(p.record_index, 3);
        assert!(!p.needs_synthetic_link_header);
    }

    #[test]
    fn assemble_errors() {
        let options = ConvertOptions::default();
        let e = assemble(&record(vec!["0x0000   4500 001"]), &options).unwrap_err();
        assert_eq!(e.kind, AssemblyErrorKind::OddNibbleCount);
        assert_eq!(e.record_index, 3);
        assert_eq!(e.line, 12);
        let e = assemble(&record(vec!["0x0000          ......"]), &options).unwrap_err();
        assert_eq!(e.kind, AssemblyErrorKind::EmptyPayload);
        let e = assemble(&record(vec![]), &options).unwrap_err();
        assert_eq!(e.kind, AssemblyErrorKind::EmptyRecord);
        let mut r = record(vec!["0x0000   4500 0014"]);
        r.interface_name = Cow::Owned("p".repeat(MAX_INTERFACE_NAME_LEN + 1));
        let e = assemble(&r, &options).unwrap_err();
        assert_eq!(
            e.kind,
            AssemblyErrorKind::InterfaceNameTooLong {
                len: MAX_INTERFACE_NAME_LEN + 1,
                max: MAX_INTERFACE_NAME_LEN
            }
        );
        let options = options.with_max_packet_size(2);
        let e = assemble(&record(vec!["0x0000   4500 0014"]), &options).unwrap_err();
        assert_eq!(e.kind, AssemblyErrorKind::PayloadTooLarge { size: 4, max: 2 });
    }

    #[test]
    fn strict_offsets() {
        let lines = vec!["0x0000   4500 0014", "0x0010   0000 4000"];
        let lenient = ConvertOptions::default();
        assert!(assemble(&record(lines.clone()), &lenient).is_ok());
        let strict = lenient.with_strict_offsets(true);
        let e = assemble(&record(lines), &strict).unwrap_err();
        assert_eq!(
            e.kind,
            AssemblyErrorKind::OffsetMismatch {
                expected: 4,
                found: 0x10
            }
        );
    }

    #[test]
    fn compatible_lines() {
        let options = ConvertOptions::default().with_dialect(HexDialect::Compatible);
        let r = record(vec!["0x0000:  4500 0014  E...", "0004\t0000 4000"]);
        let p = assemble(&r, &options).expect("assemble");
        assert_eq!(p.payload_bytes, hex!("4500 0014 0000 4000").to_vec());
    }

    #[test]
    fn timestamp_rounding() {
        let rel = |seconds, fraction| normalize_timestamp(&RawTimestamp::Relative { seconds, fraction });
        assert_eq!(rel("5", "918957"), Some(Timestamp::new(5, 918_957)));
        assert_eq!(rel("5", "5"), Some(Timestamp::new(5, 500_000)));
        assert_eq!(rel("5", "1234564"), Some(Timestamp::new(5, 123_456)));
        assert_eq!(rel("5", "1234565"), Some(Timestamp::new(5, 123_457)));
        assert_eq!(rel("5", "9999995"), Some(Timestamp::new(6, 0)));
        assert_eq!(rel("99999999999999999999999", "0"), None);
        // fits a u64, but not once counted in microseconds
        assert_eq!(rel("20000000000000", "000000"), None);
        assert_eq!(rel("18446744073709", "551615"), Some(Timestamp::new(18_446_744_073_709, 551_615)));
        assert_eq!(rel("18446744073709", "551616"), None);
    }

    #[test]
    fn absolute_timestamp() {
        let ts = RawTimestamp::Absolute {
            year: 2012,
            month: 6,
            day: 29,
            hour: 7,
            minute: 28,
            second: 25,
            fraction: "298858",
        };
        assert_eq!(
            normalize_timestamp(&ts),
            Some(Timestamp::new(1_340_954_905, 298_858))
        );
        let bad = RawTimestamp::Absolute {
            year: 2012,
            month: 2,
            day: 30,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: "",
        };
        assert_eq!(normalize_timestamp(&bad), None);
    }

    #[test]
    fn classify_interfaces() {
        assert_eq!(InterfaceKind::classify("port1"), InterfaceKind::Physical);
        assert_eq!(InterfaceKind::classify("FPC01/port3"), InterfaceKind::Physical);
        assert_eq!(InterfaceKind::classify("lan"), InterfaceKind::Physical);
        assert_eq!(InterfaceKind::classify("loopback0"), InterfaceKind::Loopback);
        assert_eq!(InterfaceKind::classify("ssl.root"), InterfaceKind::Tunnel);
        assert_eq!(InterfaceKind::classify("ipsec-to-hq"), InterfaceKind::Tunnel);
        assert_eq!(InterfaceKind::classify("unknown"), InterfaceKind::Unknown);
        assert_eq!(InterfaceKind::classify("any"), InterfaceKind::Unknown);
    }
}
