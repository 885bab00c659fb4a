//! Tests for frame header reading and dispatch

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use h2_frame_parser::{
    flags, ConnectionSettings, ErrorCode, FrameType, H2Error, H2Parser, ReadInput,
};

use crate::support::{frame, parser, read_all, Event, RecordingOutput};

#[test]
fn test_empty_input_is_no_frame() {
    let mut p = parser(&[]);
    assert!(!p.read_frame(true).unwrap());
    assert!(!p.read_frame(false).unwrap());
    assert!(p.output().events.is_empty());
}

#[test]
fn test_frames_read_in_order() {
    let mut wire = frame(FrameType::Ping, 0, 0, &[1; 8]);
    wire.extend(frame(FrameType::RstStream, 0, 1, &[0, 0, 0, 8]));
    wire.extend(frame(FrameType::Settings, flags::ACK, 0, &[]));

    let mut p = parser(&wire);
    assert_eq!(read_all(&mut p).unwrap(), 3);
    assert_eq!(
        p.output().events,
        vec![
            Event::PingAck([1; 8]),
            Event::Reset { stream_id: 1, error_code: 8 },
            Event::SettingsEnd { ack: true },
        ]
    );
}

#[test]
fn test_unknown_frame_is_swallowed() {
    let mut wire = frame(FrameType::Unknown(0xFA), 0x3, 7, b"hello");
    wire.extend(frame(FrameType::Ping, 0, 0, &[2; 8]));

    let mut p = parser(&wire);
    assert_eq!(read_all(&mut p).unwrap(), 2);
    assert_eq!(
        p.output().events,
        vec![
            Event::Swallowed {
                stream_id: 7,
                frame_type: FrameType::Unknown(0xFA),
                flags: 0x3,
                size: 5,
            },
            Event::PingAck([2; 8]),
        ]
    );
}

#[test]
fn test_unknown_frame_larger_than_swallow_chunk() {
    let payload = vec![0xAB; 5000];
    let mut wire = frame(FrameType::Unknown(0x20), 0, 0, &payload);
    wire.extend(frame(FrameType::Ping, flags::ACK, 0, &[3; 8]));

    let mut p = parser(&wire);
    assert_eq!(read_all(&mut p).unwrap(), 2);
    assert_eq!(p.output().events[1], Event::PingReceive([3; 8]));
}

#[test]
fn test_reserved_stream_id_bit_ignored() {
    let mut wire = frame(FrameType::RstStream, 0, 1, &[0, 0, 0, 2]);
    wire[5] |= 0x80;

    let mut p = parser(&wire);
    assert!(p.read_frame(true).unwrap());
    assert_eq!(p.output().events, vec![Event::Reset { stream_id: 1, error_code: 2 }]);
}

#[test]
fn test_frame_too_large() {
    let wire = frame(FrameType::Data, 0, 1, &vec![0; 16_385]);
    let mut p = parser(&wire);

    let err = p.read_frame(true).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FrameSizeError);
    assert!(err.is_connection_error());
    assert!(p.output().events.is_empty());
}

#[test]
fn test_shared_settings_raise_frame_limit() {
    let settings = Arc::new(ConnectionSettings::default());
    let wire = frame(FrameType::Data, 0, 1, &vec![0; 20_000]);
    let mut p = H2Parser::new("test", &wire[..], RecordingOutput::new())
        .with_settings(Arc::clone(&settings));

    settings.set_max_frame_size(32_768).unwrap();
    assert!(p.read_frame(true).unwrap());
    assert_eq!(p.output().events, vec![Event::Data { stream_id: 1, len: 20_000 }]);
}

#[test]
fn test_truncated_payload_is_io_error() {
    let wire = frame(FrameType::Ping, 0, 0, &[0; 8]);
    let mut p = parser(&wire[..12]);

    match p.read_frame(true) {
        Err(H2Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_truncated_header_is_io_error() {
    let wire = frame(FrameType::Ping, 0, 0, &[0; 8]);
    let mut p = parser(&wire[..4]);
    assert!(matches!(p.read_frame(false), Err(H2Error::Io(_))));
}

/// Reader that reports `WouldBlock` until `ready` is set.
struct Gate {
    inner: Cursor<Vec<u8>>,
    ready: bool,
}

impl Read for Gate {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.ready {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.inner.read(buf)
    }
}

#[test]
fn test_non_blocking_read_with_nothing_pending() {
    let gate = Gate {
        inner: Cursor::new(frame(FrameType::Ping, 0, 0, &[9; 8])),
        ready: false,
    };
    let mut p = H2Parser::new("test", ReadInput::new(gate), RecordingOutput::new());

    assert!(!p.read_frame(false).unwrap());
    assert!(p.output().events.is_empty());

    p.input_mut().get_mut().ready = true;
    assert!(p.read_frame(false).unwrap());
    assert_eq!(p.output().events, vec![Event::PingAck([9; 8])]);
}
