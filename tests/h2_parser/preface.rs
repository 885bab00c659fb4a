//! Tests for the client connection preface

use std::io;

use h2_frame_parser::{flags, ErrorCode, FrameType, H2Error, CONNECTION_PREFACE};

use crate::support::{frame, parser, Event};

fn with_preface(frames: &[u8]) -> Vec<u8> {
    let mut wire = CONNECTION_PREFACE.to_vec();
    wire.extend_from_slice(frames);
    wire
}

#[test]
fn test_preface_then_settings() {
    let wire = with_preface(&frame(FrameType::Settings, 0, 0, &[0, 5, 0, 0, 0x40, 0]));
    let mut p = parser(&wire);

    p.read_connection_preface().unwrap();
    assert_eq!(
        p.output().events,
        vec![
            Event::Setting { id: 5, value: 16_384 },
            Event::SettingsEnd { ack: false },
        ]
    );
    assert!(!p.read_frame(true).unwrap());
}

#[test]
fn test_invalid_preface() {
    let mut wire = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
    wire.extend(frame(FrameType::Settings, 0, 0, &[]));
    let mut p = parser(&wire);

    assert!(matches!(p.read_connection_preface(), Err(H2Error::InvalidPreface)));
}

#[test]
fn test_preface_followed_by_other_frame() {
    let wire = with_preface(&frame(FrameType::Ping, 0, 0, &[0; 8]));
    let mut p = parser(&wire);

    let err = p.read_connection_preface().unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProtocolError);
    assert!(err.is_connection_error());
}

#[test]
fn test_preface_followed_by_settings_ack() {
    let wire = with_preface(&frame(FrameType::Settings, flags::ACK, 0, &[]));
    let mut p = parser(&wire);

    p.read_connection_preface().unwrap();
    assert_eq!(p.output().events, vec![Event::SettingsEnd { ack: true }]);
}

#[test]
fn test_preface_without_settings() {
    let wire = CONNECTION_PREFACE.to_vec();
    let mut p = parser(&wire);

    match p.read_connection_preface() {
        Err(H2Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_short_preface() {
    let wire = CONNECTION_PREFACE[..10].to_vec();
    let mut p = parser(&wire);
    assert!(matches!(p.read_connection_preface(), Err(H2Error::Io(_))));
}
