use std::io::{self, Cursor, Read, Write};

use framewire::protocol::{read_frame, write_frame};
use framewire::{
    CommandId, Error, FrameCodec, Packet, PacketId, PacketRegistry, PacketStream, Submit,
    SubmitAck, SubmitPool,
};
use proptest::prelude::*;

/// Sink that accepts the length field, then fails every later write.
struct FailAfterHeader {
    written: Vec<u8>,
}

impl Write for FailAfterHeader {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() >= 4 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
        }
        let n = buf.len().min(4 - self.written.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Source that yields its bytes in fixed-size chunks.
struct Chunked {
    data: Cursor<Vec<u8>>,
    chunk: usize,
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let end = buf.len().min(self.chunk);
        self.data.read(&mut buf[..end])
    }
}

fn encode_frame(packet: &Packet) -> Vec<u8> {
    let body = PacketRegistry::encode(packet).unwrap();
    let mut wire = Vec::new();
    write_frame(&mut wire, &body).unwrap();
    wire
}

#[test]
fn submit_example_matches_documented_bytes() {
    let packet = Packet::Submit(Submit::new("00000001", b"abcd".to_vec()));
    let body = PacketRegistry::encode(&packet).unwrap();

    let mut expected_body = vec![0x02];
    expected_body.extend_from_slice(b"00000001abcd");
    assert_eq!(body, expected_body);
    assert_eq!(body.len(), 13);

    let wire = encode_frame(&packet);
    assert_eq!(wire.len(), 17);
    assert_eq!(&wire[..4], &17u32.to_be_bytes());
    assert_eq!(&wire[4..], body.as_slice());

    let registry = PacketRegistry::new(SubmitPool::disabled());
    let decoded = registry
        .decode(&read_frame(&mut Cursor::new(wire)).unwrap())
        .unwrap();
    assert_eq!(decoded, packet);
}

#[test]
fn submit_ack_example_matches_documented_bytes() {
    let wire = encode_frame(&Packet::SubmitAck(SubmitAck::new("00000001", 0)));
    assert_eq!(wire.len(), 4 + 1 + 8 + 1);
    assert_eq!(&wire[..5], &[0x00, 0x00, 0x00, 0x0E, 0x82]);
    assert_eq!(&wire[5..13], b"00000001");
    assert_eq!(wire[13], 0x00);
}

#[test]
fn write_failing_after_header_is_short_write() {
    let mut sink = FailAfterHeader {
        written: Vec::new(),
    };
    let err = FrameCodec::new()
        .encode(&mut sink, b"\x0200000001abcd")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ShortWrite {
            expected: 13,
            written: 0,
            cause: Some(io::ErrorKind::BrokenPipe),
        }
    ));
    assert_eq!(sink.written, 17u32.to_be_bytes());
}

#[test]
fn stream_ending_mid_body_never_returns_partial_body() {
    let mut wire = encode_frame(&Packet::Submit(Submit::new("00000001", b"abcdef".to_vec())));
    wire.truncate(wire.len() - 3);

    let err = read_frame(&mut Cursor::new(wire)).unwrap_err();
    assert!(matches!(err, Error::ShortRead { .. }));
}

#[test]
fn unknown_command_is_an_error_not_a_crash() {
    let mut wire = Vec::new();
    write_frame(&mut wire, b"\x03whatever").unwrap();

    let mut stream = PacketStream::new(Cursor::new(wire));
    let err = stream.read_packet().unwrap_err();
    assert!(matches!(err, Error::UnknownCommand { id: 0x03 }));
}

#[test]
fn mixed_stream_decodes_in_order_across_chunk_boundaries() {
    let packets = vec![
        Packet::Submit(Submit::new("00000001", b"first".to_vec())),
        Packet::SubmitAck(SubmitAck::new("00000001", 0)),
        Packet::Submit(Submit::new("00000002", Vec::new())),
        Packet::SubmitAck(SubmitAck::new("00000002", 7)),
    ];
    let wire: Vec<u8> = packets.iter().flat_map(encode_frame).collect();

    for chunk in [1, 3, 7, 64] {
        let source = Chunked {
            data: Cursor::new(wire.clone()),
            chunk,
        };
        let mut stream = PacketStream::with_parts(
            source,
            FrameCodec::new(),
            PacketRegistry::new(SubmitPool::new(2)),
        );
        for expected in &packets {
            let packet = stream.read_packet().unwrap();
            assert_eq!(&packet, expected, "chunk size {chunk}");
            stream.registry().release(packet);
        }
    }
}

#[test]
fn reserved_stub_frames_decode_to_placeholders() {
    let registry = PacketRegistry::default();
    for (byte, expected) in [(0x01u8, Packet::Conn), (0x81, Packet::ConnAck)] {
        let mut wire = Vec::new();
        write_frame(&mut wire, &[byte]).unwrap();
        let body = read_frame(&mut Cursor::new(wire)).unwrap();
        let packet = registry.decode(&body).unwrap();
        assert_eq!(packet, expected);
        assert!(packet.command().is_reserved());
    }
    assert_eq!(CommandId::from_u8(0x01), Some(CommandId::Conn));
}

#[test]
fn short_id_is_padded_on_the_wire() {
    let wire = encode_frame(&Packet::Submit(Submit::new("ab", b"z".to_vec())));
    assert_eq!(&wire[5..13], b"ab\0\0\0\0\0\0");

    let registry = PacketRegistry::default();
    let packet = registry
        .decode(&read_frame(&mut Cursor::new(wire)).unwrap())
        .unwrap();
    assert_eq!(packet.as_submit().unwrap().id.to_string(), "ab");
}

proptest! {
    /// Property: submit frames roundtrip through codec + registry
    #[test]
    fn prop_submit_frame_roundtrip(
        seq in 0u64..100_000_000,
        payload in prop::collection::vec(any::<u8>(), 0..=1024),
    ) {
        let packet = Packet::Submit(Submit::new(PacketId::from_sequence(seq), payload));
        let wire = encode_frame(&packet);

        let registry = PacketRegistry::default();
        let decoded = registry.decode(&read_frame(&mut Cursor::new(wire)).unwrap()).unwrap();
        prop_assert_eq!(&decoded, &packet);
        registry.release(decoded);
    }

    /// Property: ack frames roundtrip through codec + registry
    #[test]
    fn prop_submit_ack_frame_roundtrip(id in any::<[u8; 8]>(), result in any::<u8>()) {
        let packet = Packet::SubmitAck(SubmitAck::new(id, result));
        let wire = encode_frame(&packet);

        let registry = PacketRegistry::default();
        let decoded = registry.decode(&read_frame(&mut Cursor::new(wire)).unwrap()).unwrap();
        prop_assert_eq!(decoded, packet);
    }
}
