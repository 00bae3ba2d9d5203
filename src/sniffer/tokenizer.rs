use std::borrow::Cow;
use std::iter::Enumerate;
use std::str::Lines;

use tracing::debug;

use super::header::{parse_footer_line, parse_header_line, FooterLine, HeaderLine};
use super::hexdump::is_hex_line;
use super::{RawRecord, SnifferSummary};
use crate::error::{AssemblyError, AssemblyErrorKind};
use crate::options::HexDialect;

/// Interface name used when the header line does not print one
pub const UNKNOWN_INTERFACE: &str = "unknown";

/// Shape of one input line
#[derive(Debug)]
pub enum LineClass<'a> {
    Blank,
    Header(HeaderLine<'a>),
    HexDump,
    Other,
}

/// Scanner state
#[derive(Debug)]
pub enum ScanState<'a> {
    AwaitingHeader,
    /// A header was read, no hex-dump line yet
    HeaderOnly(RawRecord<'a>),
    InHexBody(RawRecord<'a>),
}

/// What a transition does besides changing state
#[derive(Debug)]
pub enum ScanAction<'a> {
    None,
    /// The record is complete
    Emit(RawRecord<'a>),
    /// The record had no hex-dump line and is dropped
    DiscardEmpty(RawRecord<'a>),
    /// A hex-dump line outside of any record
    Orphan,
}

/// Classify a trimmed line
pub fn classify_line(line: &str, dialect: HexDialect) -> LineClass {
    if line.is_empty() {
        return LineClass::Blank;
    }
    if is_hex_line(line, dialect) {
        return LineClass::HexDump;
    }
    match parse_header_line(line) {
        Ok((_, header)) => LineClass::Header(header),
        Err(_) => LineClass::Other,
    }
}

/// The transition table
///
/// `record` builds a new record from a header line, when needed.
pub fn transition<'a, F>(
    state: ScanState<'a>,
    class: LineClass<'a>,
    line: &'a str,
    record: F,
) -> (ScanState<'a>, ScanAction<'a>)
where
    F: FnOnce(HeaderLine<'a>) -> RawRecord<'a>,
{
    use ScanState::*;
    match (state, class) {
        (state, LineClass::Blank) => (state, ScanAction::None),
        (AwaitingHeader, LineClass::Other) => (AwaitingHeader, ScanAction::None),
        (AwaitingHeader, LineClass::HexDump) => (AwaitingHeader, ScanAction::Orphan),
        (AwaitingHeader, LineClass::Header(h)) => (HeaderOnly(record(h)), ScanAction::None),
        (HeaderOnly(r), LineClass::Header(h)) => {
            (HeaderOnly(record(h)), ScanAction::DiscardEmpty(r))
        }
        (HeaderOnly(mut r), LineClass::HexDump) => {
            r.hex_lines.push(line);
            (InHexBody(r), ScanAction::None)
        }
        (HeaderOnly(r), LineClass::Other) => (HeaderOnly(r), ScanAction::None),
        (InHexBody(mut r), LineClass::HexDump) => {
            r.hex_lines.push(line);
            (InHexBody(r), ScanAction::None)
        }
        (InHexBody(r), LineClass::Header(h)) => (HeaderOnly(record(h)), ScanAction::Emit(r)),
        (InHexBody(r), LineClass::Other) => (AwaitingHeader, ScanAction::Emit(r)),
    }
}

/// Splits sniffer text into records
///
/// The tokenizer is an iterator over [`RawRecord`]s, borrowing from the input.
/// Headers followed by no hex dump are not yielded (except at the end of the
/// input), they are collected in [`empty_records`](Tokenizer::empty_records).
pub struct Tokenizer<'a> {
    lines: Enumerate<Lines<'a>>,
    dialect: HexDialect,
    state: ScanState<'a>,
    headers_seen: usize,
    empty_records: Vec<AssemblyError>,
    orphan_lines: usize,
    summary: SnifferSummary,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str, dialect: HexDialect) -> Self {
        Tokenizer {
            lines: input.lines().enumerate(),
            dialect,
            state: ScanState::AwaitingHeader,
            headers_seen: 0,
            empty_records: Vec::new(),
            orphan_lines: 0,
            summary: SnifferSummary::default(),
        }
    }

    /// Number of header lines read so far
    pub fn headers_seen(&self) -> usize {
        self.headers_seen
    }

    /// Headers that were immediately followed by another header
    pub fn empty_records(&self) -> &[AssemblyError] {
        &self.empty_records
    }

    /// Number of hex-dump lines found outside of a record
    pub fn orphan_lines(&self) -> usize {
        self.orphan_lines
    }

    /// Sniffer statistics found so far
    pub fn summary(&self) -> SnifferSummary {
        self.summary
    }

    fn note_footer(&mut self, line: &str) {
        match parse_footer_line(line) {
            Ok((_, FooterLine::ReceivedByFilter(n))) => self.summary.received_by_filter = Some(n),
            Ok((_, FooterLine::DroppedByKernel(n))) => self.summary.dropped_by_kernel = Some(n),
            Err(_) => (),
        }
    }
}

fn build_record<'a>(header: HeaderLine<'a>, index: usize, line: usize) -> RawRecord<'a> {
    let interface_name = match (header.slot, header.interface) {
        (Some(slot), Some(iface)) => Cow::Owned(format!("{}/{}", slot, iface)),
        (None, Some(iface)) => Cow::Borrowed(iface),
        (_, None) => Cow::Borrowed(UNKNOWN_INTERFACE),
    };
    RawRecord {
        index,
        line,
        timestamp: header.timestamp,
        interface_name,
        direction: header.direction,
        summary_text: header.summary,
        hex_lines: Vec::new(),
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<RawRecord<'a>> {
        while let Some((idx, raw_line)) = self.lines.next() {
            let line = raw_line.trim();
            let class = classify_line(line, self.dialect);
            match class {
                LineClass::Header(_) => self.headers_seen += 1,
                LineClass::Other => self.note_footer(line),
                _ => (),
            }
            let index = self.headers_seen;
            let state = std::mem::replace(&mut self.state, ScanState::AwaitingHeader);
            let (state, action) = transition(state, class, line, |h| build_record(h, index, idx + 1));
            self.state = state;
            match action {
                ScanAction::None => (),
                ScanAction::Emit(r) => return Some(r),
                ScanAction::DiscardEmpty(r) => {
                    debug!(record = r.index, line = r.line, "header without hex dump");
                    self.empty_records
                        .push(AssemblyError::new(AssemblyErrorKind::EmptyRecord, r.index, r.line));
                }
                ScanAction::Orphan => {
                    debug!(line = idx + 1, "hex-dump line outside of a record");
                    self.orphan_lines += 1;
                }
            }
        }
        // end of input closes the open record, even an empty one
        match std::mem::replace(&mut self.state, ScanState::AwaitingHeader) {
            ScanState::AwaitingHeader => None,
            ScanState::HeaderOnly(r) | ScanState::InHexBody(r) => Some(r),
        }
    }
}
