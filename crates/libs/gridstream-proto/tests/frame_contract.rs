use gridstream_proto::packets::{data, routing};
use gridstream_proto::{
    ChecksumConfig, ConstructionError, Frame, FrameError, FrameOptions, HexPayload, Packet,
    SlotRole, ValidationError, Value, MAGIC,
};
use rand_core::{OsRng, RngCore};

fn arp_payload() -> Vec<u8> {
    let mut payload = vec![0u8; 34];
    payload[0] = routing::ARP_PACKET_TYPE;
    payload[1..7].copy_from_slice(&[0x10, 0x11, 0x12, 0x13, 0x14, 0x15]);
    payload[7..13].copy_from_slice(&[0x20, 0x21, 0x22, 0x23, 0x24, 0x25]);
    payload[13] = 0x07;
    payload[14..18].copy_from_slice(&[0x00, 0x01, 0x51, 0x80]);
    payload[18..20].copy_from_slice(&[0xEE, 0xEE]);
    payload[20..24].copy_from_slice(&[0xC0, 0xA8, 0x01, 0x02]);
    payload[29..31].copy_from_slice(&[0x01, 0xF4]);
    payload[31..34].copy_from_slice(&[0xAA, 0xBB, 0xCC]);
    payload
}

fn wire(frame_type: u8, payload: &[u8], seed: u16) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.push(frame_type);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&ChecksumConfig::with_seed(seed).checksum(payload).to_be_bytes());
    out
}

#[test]
fn arp_frame_decodes_every_field() {
    let options = FrameOptions {
        validate_checksum: true,
        checksum: ChecksumConfig::with_seed(0),
        ..FrameOptions::default()
    };
    let frame = Frame::decode(&wire(0x55, &arp_payload(), 0), &options).expect("frame");

    assert_eq!(frame.kind().name(), "RoutingFrame");
    assert_eq!(frame.length(), 34);
    let packet = frame.packet().expect("packet");
    assert_eq!(packet.kind().name(), "ArpPacket");
    assert_eq!(packet.get_integer("packet_type"), Ok(0x30));
    assert_eq!(packet.get_bytes("destination"), Ok(vec![0x10, 0x11, 0x12, 0x13, 0x14, 0x15]));
    assert_eq!(packet.get_bytes("source"), Ok(vec![0x20, 0x21, 0x22, 0x23, 0x24, 0x25]));
    assert_eq!(packet.get_integer("sequence"), Ok(7));
    assert_eq!(packet.get_integer("uptime"), Ok(86_400));
    assert_eq!(packet.get_bytes("lan_address"), Ok(vec![0xC0, 0xA8, 0x01, 0x02]));
    assert_eq!(packet.get_integer("timing"), Ok(500));
}

#[test]
fn arp_layout_accounts_for_unknown_bytes() {
    let packet = Packet::decode(arp_payload()).expect("packet");
    assert_eq!(packet.kind().name(), "ArpPacket");
    let entries = packet.layout().expect("layout");

    let fillers: Vec<_> = entries
        .iter()
        .filter(|entry| entry.role == SlotRole::Filler)
        .map(|entry| (entry.range.clone(), entry.bytes.to_vec()))
        .collect();
    assert_eq!(fillers, vec![(18..20, vec![0xEE, 0xEE]), (24..29, vec![0; 5])]);

    let tail = entries.last().expect("tail");
    assert_eq!(tail.role, SlotRole::Tail);
    assert_eq!(tail.value, Value::Bytes(vec![0xAA, 0xBB, 0xCC]));

    let covered: usize = entries.iter().map(|entry| entry.bytes.len()).sum();
    assert_eq!(covered, packet.len());
}

#[test]
fn wrapped_packet_survives_the_wire() {
    let mut arp = Packet::zeroed(routing::arp());
    arp.set("destination", [1, 2, 3, 4, 5, 6]).expect("destination");
    arp.set("uptime", 3_600u32).expect("uptime");
    arp.set("timing", 0x0102u16).expect("timing");

    let frame = Frame::wrap(&arp).expect("wrap");
    assert_eq!(frame.frame_type(), 0x55);
    let encoded = frame.encode();
    assert_eq!(&encoded[..6], &[0x00, 0xFF, 0x2A, 0x55, 0x00, 33]);

    let options = FrameOptions {
        validate_checksum: true,
        checksum: frame.checksum_config(),
        ..FrameOptions::default()
    };
    let decoded = Frame::decode(&encoded, &options).expect("decode");
    assert_eq!(decoded.payload(), arp.as_bytes());
    assert_eq!(decoded.checksum(), Some(frame.generate_checksum()));
    assert_eq!(decoded.into_packet().expect("packet"), arp);
}

#[test]
fn hex_capture_decodes() {
    let capture = hex::encode(wire(0xD5, &[0x00, 1, 2, 3, 4, 5, 6, 7, 8], 0));
    let frame = Frame::from_hex(&capture, &FrameOptions::default()).expect("frame");
    assert_eq!(frame.kind().name(), "DataFrame");
    let packet = frame.packet().expect("packet");
    assert_eq!(packet.kind().name(), "DataPacket");
    assert_eq!(packet.get_bytes("destination"), Ok(vec![1, 2, 3, 4]));
    assert_eq!(packet.get_bytes("source"), Ok(vec![5, 6, 7, 8]));
    assert!(std::sync::Arc::ptr_eq(packet.kind_arc(), data::root()));
}

#[test]
fn builder_accepts_spaced_hex() {
    let frame = Frame::builder(0x55)
        .payload(HexPayload("30 10 11 12 13 14 15"))
        .skip_checksum_validation()
        .build()
        .expect("frame");
    assert_eq!(frame.length(), 7);
}

#[test]
fn random_bad_headers_are_rejected() {
    let mut rng = OsRng;
    for _ in 0..64 {
        let mut buffer = vec![0u8; 8 + (rng.next_u32() % 32) as usize];
        rng.fill_bytes(&mut buffer);
        if buffer[..3] == MAGIC {
            buffer[2] ^= 0xFF;
        }
        let err = Frame::decode(&buffer, &FrameOptions::default()).expect_err("bad header");
        assert!(
            matches!(err, FrameError::Validation(ValidationError::Header { .. })),
            "unexpected {err:?}"
        );
    }
}

#[test]
fn length_mismatch_names_both_lengths() {
    let mut buffer = wire(0x55, &[0x30, 0x01, 0x02], 0);
    buffer[5] = 0x09;
    let err = Frame::decode(&buffer, &FrameOptions::default()).expect_err("mismatch");
    let FrameError::Validation(ValidationError::Length { declared, actual }) = &err else {
        panic!("unexpected {err:?}");
    };
    assert_eq!((*declared, *actual), (7, 5));
    let message = err.to_string();
    assert!(message.contains('7') && message.contains('5'), "{message}");
}

#[test]
fn corrupted_checksum_names_both_values() {
    let payload = [0x30, 0x01, 0x02, 0x03];
    let mut buffer = wire(0x55, &payload, 0);
    let last = buffer.len() - 1;
    buffer[last] ^= 0x01;

    let options = FrameOptions {
        validate_checksum: true,
        checksum: ChecksumConfig::with_seed(0),
        ..FrameOptions::default()
    };
    let err = Frame::decode(&buffer, &options).expect_err("checksum");
    let computed = ChecksumConfig::with_seed(0).checksum(&payload);
    let provided = computed ^ 0x0001;
    assert_eq!(err, FrameError::Validation(ValidationError::Checksum { provided, computed }));
    let message = err.to_string();
    assert!(message.contains(&format!("0x{provided:04x}")), "{message}");
    assert!(message.contains(&format!("0x{computed:04x}")), "{message}");

    // The same bytes pass when the checksum is not requested.
    assert!(Frame::decode(&buffer, &FrameOptions::default()).is_ok());
}

#[test]
fn seed_mismatch_fails_checksum() {
    let buffer = wire(0x55, &[0x30, 0x01], 0x1D0F);
    let options = FrameOptions {
        validate_checksum: true,
        checksum: ChecksumConfig::with_seed(0),
        ..FrameOptions::default()
    };
    assert!(matches!(
        Frame::decode(&buffer, &options),
        Err(FrameError::Validation(ValidationError::Checksum { .. }))
    ));
}

#[test]
fn unregistered_types_fall_back_to_generic_kinds() {
    let frame =
        Frame::decode(&wire(0x77, &[0x99, 0xAB, 0xCD], 0), &FrameOptions::default()).expect("frame");
    assert_eq!(frame.kind().name(), "Frame");
    let packet = frame.packet().expect("packet");
    assert_eq!(packet.kind().name(), "Packet");
    assert_eq!(packet.get_integer("packet_type"), Ok(0x99));
    let tail = packet.layout().expect("layout").last().map(|entry| entry.bytes.to_vec());
    assert_eq!(tail, Some(vec![0xAB, 0xCD]));

    let frame =
        Frame::decode(&wire(0x55, &[0x42, 0x00], 0), &FrameOptions::default()).expect("frame");
    let packet = frame.packet().expect("packet");
    assert_eq!(packet.kind().name(), "RoutingPacket");
    assert_eq!(packet.get_integer("packet_type"), Ok(0x42));
}

#[test]
fn truncated_input_is_a_construction_error() {
    let err = Frame::from_hex("00ff2a", &FrameOptions::default()).expect_err("short");
    assert!(matches!(err, FrameError::Construction(ConstructionError::Truncated { .. })));
}

#[test]
fn catalog_layouts_cover_every_byte() {
    let mut rng = OsRng;
    let kinds = [gridstream_proto::packets::base(), routing::root(), routing::arp(), data::root()];
    for kind in kinds {
        for extra in [0usize, 1, 7] {
            let mut buffer = vec![0u8; kind.min_len() + extra];
            rng.fill_bytes(&mut buffer);
            let packet = Packet::new(std::sync::Arc::clone(kind), buffer).expect("packet");
            let entries = packet.layout().expect("layout");

            let mut next = 0;
            for entry in &entries {
                assert_eq!(entry.range.start, next, "{}: gap before {}", kind.name(), entry.name);
                assert_eq!(entry.bytes.len(), entry.range.len(), "{}: {}", kind.name(), entry.name);
                next = entry.range.end;
            }
            assert_eq!(next, packet.len(), "{} with {extra} extra bytes", kind.name());
            assert_eq!(entries.last().map(|entry| entry.role), Some(SlotRole::Tail));
        }
    }
}
