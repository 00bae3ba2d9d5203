use hex_literal::hex;
use sniffer_pcapng::document::InterfaceEntry;
use sniffer_pcapng::pcapng::*;
use sniffer_pcapng::serialize::ToVec;
use sniffer_pcapng::writer::{check_block, PcapNGWriter};
use sniffer_pcapng::{InterfaceKind, Linktype, PcapError, Timestamp, WriterError};

// SHB, IDB (no options), unknown block type 5, EPB with 4 bytes of data
static SMALL_LE: &[u8] = &hex!(
    "0a0d0d0a 1c000000 4d3c2b1a 0100 0000 ffffffffffffffff 1c000000
     01000000 14000000 0100 0000 ea050000 14000000
     05000000 10000000 00000000 10000000
     06000000 24000000 00000000 00000000 40420f00 04000000 04000000 deadbeef 24000000"
);

#[test]
fn test_pcapng_parse_section() {
    let (rem, section) = parse_section(SMALL_LE).expect("could not parse section");
    assert!(rem.is_empty());
    let magics: Vec<_> = section.blocks.iter().map(Block::magic).collect();
    assert_eq!(magics, vec![SHB_MAGIC, IDB_MAGIC, 5, EPB_MAGIC]);
    for block in &section.blocks {
        let (len1, len2) = block.lengths();
        assert_eq!(len1, len2);
    }
    let shb = section.header().expect("no section header");
    assert_eq!(shb.section_len, -1);
    assert_eq!(shb.user_application(), None);

    let idb = section.iter_interfaces().next().expect("no interface");
    assert_eq!(idb.linktype, Linktype::ETHERNET);
    assert_eq!(idb.snaplen, 1514);
    // no if_tsresol option: microseconds
    assert_eq!(idb.ts_resolution(), Some(1_000_000));
    assert_eq!(idb.if_name(), None);

    let epb = section.iter_packets().next().expect("no packet");
    assert_eq!(epb.caplen, 4);
    assert_eq!(epb.data, &hex!("deadbeef")[..]);
    assert_eq!(epb.decode_ts(1_000_000), (1, 0));
    assert!(section.blocks[3].is_data_block());
    assert!(!section.blocks[2].is_data_block());
}

#[test]
fn test_pcapng_section_stops_at_next_header() {
    let mut input = SMALL_LE.to_vec();
    input.extend_from_slice(&SMALL_LE[..28]);
    let (rem, section) = parse_section(&input).expect("could not parse section");
    assert_eq!(section.blocks.len(), 4);
    assert_eq!(rem.len(), 28);
    let (rem, next) = parse_section(rem).expect("could not parse second section");
    assert!(rem.is_empty());
    assert_eq!(next.blocks.len(), 1);
}

#[test]
fn test_pcapng_truncated() {
    let truncated = &SMALL_LE[..SMALL_LE.len() - 2];
    assert!(matches!(
        parse_section(truncated),
        Err(nom::Err::Error(PcapError::Incomplete))
    ));
}

#[test]
fn test_pcapng_big_endian_not_recognized() {
    let mut input = SMALL_LE.to_vec();
    input[8..12].copy_from_slice(&hex!("1a2b3c4d"));
    assert!(matches!(
        parse_section(&input),
        Err(nom::Err::Error(PcapError::HeaderNotRecognized))
    ));
}

#[test]
fn test_pcapng_length_mismatch() {
    let mut input = SMALL_LE[28..48].to_vec();
    input[16] = 0x18;
    assert!(parse_interfacedescriptionblock_le(&input).is_err());
    assert!(matches!(
        check_block(&input),
        Err(WriterError::MalformedBlock {
            block_type: IDB_MAGIC,
            leading: 20,
            trailing: 24,
            actual: 20,
        })
    ));
}

#[test]
fn test_pcapng_unknown_block() {
    let (rem, block) = parse_unknownblock_le(&SMALL_LE[48..64]).expect("could not parse block");
    assert!(rem.is_empty());
    assert_eq!(block.block_type, 5);
    assert_eq!(block.data, &[0, 0, 0, 0][..]);
    assert!(check_block(&SMALL_LE[48..64]).is_ok());
}

#[test]
fn test_pcapng_write_read_back() {
    let mut writer = PcapNGWriter::new("sniffer-pcapng tests").expect("writer");
    for name in &["port1", "ssl.root"] {
        let entry = InterfaceEntry {
            name: name.to_string(),
            kind: InterfaceKind::classify(name),
            linktype: Linktype::ETHERNET,
            snaplen: 64,
        };
        writer.add_interface(&entry).expect("interface");
    }
    let frame = [0x42u8; 61];
    writer
        .write_packet(1, Timestamp::new(1_340_954_905, 298_858), &frame, Some("(out) ssl.root"))
        .expect("packet");
    writer
        .write_packet(0, Timestamp::new(1_340_954_906, 0), &frame[..60], None)
        .expect("packet");
    let bytes = writer.into_inner();

    let (rem, section) = parse_section(&bytes).expect("could not parse section");
    assert!(rem.is_empty());
    assert_eq!(
        section.header().and_then(|shb| shb.user_application()),
        Some("sniffer-pcapng tests")
    );
    let names: Vec<_> = section.iter_interfaces().map(|idb| idb.if_name()).collect();
    assert_eq!(names, vec![Some("port1"), Some("ssl.root")]);

    let packets: Vec<_> = section.iter_packets().collect();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].if_id, 1);
    assert_eq!(packets[0].caplen, 61);
    assert_eq!(packets[0].origlen, 61);
    // 32 + 64 (padded data) + 20 (comment) + 4 (end of options)
    assert_eq!(packets[0].block_len1, 120);
    assert_eq!(packets[0].decode_ts(1_000_000), (1_340_954_905, 298_858));
    assert_eq!(packets[0].comment(), Some("(out) ssl.root"));
    assert_eq!(packets[1].if_id, 0);
    assert_eq!(packets[1].block_len1, 92);
    assert_eq!(packets[1].comment(), None);
}

#[test]
fn test_pcapng_serialize_parsed_block() {
    let (_, mut epb) = parse_enhancedpacketblock_le(&SMALL_LE[64..]).expect("could not parse epb");
    let v = epb.to_vec().expect("serialize");
    assert_eq!(v, &SMALL_LE[64..]);
}
