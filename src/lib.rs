//! # FortiGate sniffer to PCAPNG converter
//!
//! This crate converts the text output of the FortiGate `diagnose sniffer packet`
//! command into a PCAPNG capture, readable by packet analysis tools.
//!
//! The conversion is a pure function over the input bytes: no I/O, no global
//! state. It goes through four stages:
//!
//! - the [`Tokenizer`] splits the text into records, one per sniffer header line
//!   ([`sniffer`] module),
//! - the [assembler](assembler::assemble) decodes the hex dump of each record
//!   into a [`ParsedPacket`],
//! - the [normalizer](normalize::normalize) gives every packet Ethernet framing,
//!   prepending a synthetic header to IP packets,
//! - the [writer](writer::write_document) serializes the interfaces and packets
//!   as PCAPNG blocks.
//!
//! A record that cannot be converted is dropped and reported, the conversion goes
//! on with the next one.
//!
//! # Example
//!
//! ```rust
//! use sniffer_pcapng::{convert_with, ConvertOptions};
//!
//! let input = b"interfaces=[port1]
//! filters=[udp]
//! 0.000001 port1 in 127.0.0.1.53 -> 127.0.0.1.53: udp 0
//! 0x0000   4500 0014 0000 4000 4011 0000 7f00 0001   E.....@.@.......
//! 0x0010   7f00 0001                                 ....
//! 1.500000 port1 out 127.0.0.1.53 -> 127.0.0.1.53: udp 0
//! 0x0000   4500 0014 0000 4000 4011 0000 7f00 0001   E.....@.@.......
//! 0x0010   7f00 001                                  ...
//! ";
//! let options = ConvertOptions::default().with_user_application("example");
//! let conversion = convert_with(input, &options).expect("conversion failed");
//! assert_eq!(conversion.packet_count, 1);
//! assert_eq!(conversion.skipped_count, 1);
//! for diag in &conversion.diagnostics {
//!     println!("skipped: {}", diag);
//! }
//! // conversion.pcapng holds the capture bytes
//! ```

pub mod assembler;
pub mod document;
mod error;
mod linktype;
pub mod normalize;
mod options;
pub mod pcapng;
pub mod serialize;
pub mod sniffer;
pub mod writer;

mod convert;

pub use assembler::{InterfaceKind, ParsedPacket, Timestamp, MAX_INTERFACE_NAME_LEN};
pub use convert::*;
pub use document::CaptureDocument;
pub use error::*;
pub use linktype::*;
pub use options::*;
pub use sniffer::{Direction, RawRecord, SnifferSummary, Tokenizer};
