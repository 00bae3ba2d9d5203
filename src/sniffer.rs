//! FortiGate sniffer text output
//!
//! `diagnose sniffer packet <iface> <filter> 6` prints one header line per
//! packet, followed by a hex dump of the packet bytes:
//!
//! ```text
//! interfaces=[any]
//! filters=[icmp]
//! 0.918957 port1 in 10.109.1.1 -> 10.109.1.10: icmp: echo request
//! 0x0000   0009 0f09 0a04 0050 5696 1b6d 0800 4500        .......PV..m..E.
//! 0x0010   0054 6a1b 4000 4001 3e2d 0a6d 0101 0a6d        .Tj.@.@.>-.m...m
//! ...
//! 12 packets received by filter
//! 0 packets dropped by kernel
//! ```
//!
//! Depending on the options, the timestamp is relative (`<seconds>.<fraction>`)
//! or absolute (`YYYY-MM-DD HH:MM:SS.ffffff`), and chassis models prefix the line
//! with the blade slot (`[FPC01] `).
//!
//! The [`Tokenizer`] splits such a text into [`RawRecord`]s, one per header line.

use std::borrow::Cow;
use std::fmt;

mod header;
mod hexdump;
mod tokenizer;

pub use header::*;
pub use hexdump::*;
pub use tokenizer::*;

/// Direction of a packet, relative to the interface
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
    Unknown,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
            Direction::Unknown => f.write_str("--"),
        }
    }
}

/// Timestamp as printed in a header line, not yet validated
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RawTimestamp<'a> {
    /// `<seconds>.<fraction>`, seconds since the start of the capture
    Relative { seconds: &'a str, fraction: &'a str },
    /// `YYYY-MM-DD HH:MM:SS.<fraction>`, wall clock
    Absolute {
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        fraction: &'a str,
    },
}

/// One packet event: a header line and the hex-dump lines following it
#[derive(Clone, Debug)]
pub struct RawRecord<'a> {
    /// 1-based position of the header among all header lines
    pub index: usize,
    /// 1-based line number of the header
    pub line: usize,
    pub timestamp: RawTimestamp<'a>,
    pub interface_name: Cow<'a, str>,
    pub direction: Direction,
    /// Protocol summary printed by the sniffer, advisory only
    pub summary_text: &'a str,
    /// Hex-dump lines, trimmed but otherwise verbatim
    pub hex_lines: Vec<&'a str>,
}

/// Statistics printed by the sniffer when it stops
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SnifferSummary {
    pub received_by_filter: Option<u64>,
    pub dropped_by_kernel: Option<u64>,
}
