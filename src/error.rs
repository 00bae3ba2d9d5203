use std::fmt;

use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

use crate::linktype::Linktype;

/// Reason a single sniffer record could not be turned into a packet
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssemblyErrorKind {
    /// The header line was followed by no hex-dump line at all
    EmptyRecord,
    /// The hex digits of the record do not form whole bytes
    OddNibbleCount,
    /// The hex-dump lines carried no byte
    EmptyPayload,
    /// The packet is larger than the configured ceiling
    PayloadTooLarge { size: usize, max: usize },
    /// Seconds or calendar fields of the header could not be represented
    InvalidTimestamp,
    /// The interface name does not fit a PCAPNG option
    InterfaceNameTooLong { len: usize, max: usize },
    /// A hex-dump line offset does not follow the previous line
    OffsetMismatch { expected: usize, found: usize },
    /// The IPv4 total length is larger than the captured bytes
    TruncatedPacket { declared: usize, available: usize },
}

impl fmt::Display for AssemblyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssemblyErrorKind::EmptyRecord => f.write_str("header without hex dump"),
            AssemblyErrorKind::OddNibbleCount => f.write_str("odd number of hex digits"),
            AssemblyErrorKind::EmptyPayload => f.write_str("empty payload"),
            AssemblyErrorKind::PayloadTooLarge { size, max } => {
                write!(f, "payload too large ({} bytes, max {})", size, max)
            }
            AssemblyErrorKind::InvalidTimestamp => f.write_str("invalid timestamp"),
            AssemblyErrorKind::InterfaceNameTooLong { len, max } => {
                write!(f, "interface name too long ({} bytes, max {})", len, max)
            }
            AssemblyErrorKind::OffsetMismatch { expected, found } => {
                write!(f, "offset mismatch (expected {:#06x}, found {:#06x})", expected, found)
            }
            AssemblyErrorKind::TruncatedPacket {
                declared,
                available,
            } => write!(
                f,
                "truncated packet ({} bytes declared, {} captured)",
                declared, available
            ),
        }
    }
}

/// A per-record failure. The record is dropped, the conversion goes on.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("record #{record_index} (line {line}): {kind}")]
pub struct AssemblyError {
    pub kind: AssemblyErrorKind,
    /// 1-based index of the record among all header lines of the input
    pub record_index: usize,
    /// 1-based line number of the record header
    pub line: usize,
}

impl AssemblyError {
    pub fn new(kind: AssemblyErrorKind, record_index: usize, line: usize) -> Self {
        AssemblyError {
            kind,
            record_index,
            line,
        }
    }
}

/// Errors raised while serializing blocks.
///
/// These never come from bad input: they mean the writer produced something
/// inconsistent.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("malformed block {block_type:#010x}: lengths {leading}/{trailing}, {actual} bytes written")]
    MalformedBlock {
        block_type: u32,
        leading: u32,
        trailing: u32,
        actual: usize,
    },

    #[error("no corresponding interface id: {0}")]
    InvalidInterfaceId(u32),

    #[error("unsupported link type: {0}")]
    UnsupportedLinktype(Linktype),

    #[error("timestamp out of range: {seconds} seconds")]
    TimestampOverflow { seconds: u64 },

    #[error("option {code} too long: {len} bytes")]
    OptionTooLong { code: u16, len: usize },

    #[error("packet too large for a block: {0} bytes")]
    PacketTooLarge(usize),

    #[error("block serialization failed: {0}")]
    Serialize(String),
}

impl From<cookie_factory::GenError> for WriterError {
    fn from(err: cookie_factory::GenError) -> Self {
        WriterError::Serialize(format!("{:?}", err))
    }
}

/// Errors returned by [`convert`](crate::convert)
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("no sniffer packet header found in input")]
    NoRecognizableHeader,

    #[error("no valid packet in input ({skipped} records could not be parsed)")]
    NoValidPackets { skipped: u32 },

    #[error("all {filtered} packets were removed by the interface filters or limits")]
    NothingSelected { filtered: u32 },

    #[error("internal error while writing capture: {0}")]
    Writer(#[from] WriterError),
}

impl ConversionError {
    /// True if the error is a writer bug rather than a problem with the input
    pub fn is_internal(&self) -> bool {
        matches!(self, ConversionError::Writer(_))
    }
}

/// Errors raised while reading PCAPNG blocks back
#[derive(Debug, Eq, PartialEq)]
pub enum PcapError {
    Incomplete,

    HeaderNotRecognized,

    NomError(ErrorKind),
}

impl<I> ParseError<I> for PcapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        PcapError::NomError(kind)
    }
}
