use tracing::{info, warn};

use crate::assembler::assemble;
use crate::document::CaptureDocument;
use crate::error::{AssemblyError, ConversionError};
use crate::normalize::{is_ethernet_frame, normalize};
use crate::options::ConvertOptions;
use crate::sniffer::{SnifferSummary, Tokenizer};
use crate::writer::write_document;

/// Result of a successful conversion
#[derive(Debug)]
pub struct Conversion {
    /// The PCAPNG capture
    pub pcapng: Vec<u8>,
    /// Number of packets written
    pub packet_count: u32,
    /// Number of records that could not be parsed
    pub skipped_count: u32,
    /// Number of valid packets removed by interface filters, skip or limit
    pub filtered_count: u32,
    /// Number of written packets whose bytes do not start with an Ethernet
    /// header (neither a frame nor an IP packet in the dump)
    pub unframed_count: u32,
    /// One entry per skipped record, ordered by record index
    pub diagnostics: Vec<AssemblyError>,
    /// Interface names, in interface id order
    pub interfaces: Vec<String>,
    /// Statistics printed by the sniffer, if found
    pub summary: SnifferSummary,
}

/// Convert sniffer text to a PCAPNG capture, with default options
///
/// The input is read as text; invalid UTF-8 sequences are replaced.
///
/// ```rust
/// use sniffer_pcapng::{convert, ConversionError};
///
/// let result = convert(b"no packet here");
/// assert!(matches!(result, Err(ConversionError::NoRecognizableHeader)));
/// ```
pub fn convert(raw: &[u8]) -> Result<Conversion, ConversionError> {
    convert_with(raw, &ConvertOptions::default())
}

/// Convert sniffer text to a PCAPNG capture
///
/// Records that cannot be turned into packets are dropped and reported in
/// [`Conversion::diagnostics`]. The conversion fails only if the input holds no
/// header at all, or no valid packet.
pub fn convert_with(raw: &[u8], options: &ConvertOptions) -> Result<Conversion, ConversionError> {
    let text = String::from_utf8_lossy(raw);
    let mut tokenizer = Tokenizer::new(&text, options.dialect);
    let mut document = CaptureDocument::new();
    let mut diagnostics = Vec::new();
    let mut valid: u32 = 0;
    let mut filtered: u32 = 0;
    let mut selected: usize = 0;
    let mut unframed: u32 = 0;

    for record in tokenizer.by_ref() {
        let packet = assemble(&record, options).and_then(|p| normalize(p, options));
        let (packet, linktype) = match packet {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    record = e.record_index,
                    line = e.line,
                    interface = %record.interface_name,
                    "dropping record: {}",
                    e.kind
                );
                diagnostics.push(e);
                continue;
            }
        };
        valid += 1;
        if !options.selects(&packet.interface_name) {
            filtered += 1;
            continue;
        }
        selected += 1;
        let over_limit = options
            .limit_packets
            .map(|limit| document.packets().len() >= limit)
            .unwrap_or(false);
        if selected <= options.skip_packets || over_limit {
            filtered += 1;
            continue;
        }
        if !packet.needs_synthetic_link_header && !is_ethernet_frame(&packet.payload_bytes) {
            unframed += 1;
        }
        document.push(packet, linktype);
    }

    if tokenizer.headers_seen() == 0 {
        return Err(ConversionError::NoRecognizableHeader);
    }
    for e in tokenizer.empty_records() {
        warn!(record = e.record_index, line = e.line, "dropping record: {}", e.kind);
    }
    diagnostics.extend_from_slice(tokenizer.empty_records());
    diagnostics.sort_by_key(|e| e.record_index);
    let skipped_count = diagnostics.len() as u32;

    if valid == 0 {
        return Err(ConversionError::NoValidPackets {
            skipped: skipped_count,
        });
    }
    if document.is_empty() {
        return Err(ConversionError::NothingSelected { filtered });
    }

    let pcapng = write_document(&document, options)?;
    let packet_count = document.packets().len() as u32;
    info!(
        packets = packet_count,
        skipped = skipped_count,
        filtered,
        unframed,
        interfaces = document.interfaces().len(),
        "conversion done"
    );
    Ok(Conversion {
        pcapng,
        packet_count,
        skipped_count,
        filtered_count: filtered,
        unframed_count: unframed,
        diagnostics,
        interfaces: document.interfaces().iter().map(|i| i.name.clone()).collect(),
        summary: tokenizer.summary(),
    })
}
