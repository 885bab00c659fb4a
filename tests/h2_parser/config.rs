//! Tests for serialized parser configuration

use h2_frame_parser::{
    flags, ConnectionSettings, ErrorCode, FrameType, H2Parser, ParserConfig,
    DEFAULT_HEADER_BUFFER_SIZE, MAX_HEADER_BLOCK_SIZE,
};

use crate::support::{frame, RecordingOutput};

#[test]
fn test_partial_json_uses_defaults() {
    let config: ParserConfig = serde_json::from_str(r#"{"max_frame_size": 65536}"#).unwrap();
    assert_eq!(config.max_frame_size, 65_536);
    assert_eq!(config.header_buffer_size, DEFAULT_HEADER_BUFFER_SIZE);
    assert_eq!(config.max_header_block_size, MAX_HEADER_BLOCK_SIZE);
}

#[test]
fn test_json_round_trip() {
    let config = ParserConfig {
        max_frame_size: 32_768,
        header_buffer_size: 512,
        max_header_block_size: 8192,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: ParserConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_configured_frame_size_applies() {
    let config: ParserConfig = serde_json::from_str(r#"{"max_frame_size": 32768}"#).unwrap();
    let wire = frame(FrameType::Data, flags::END_STREAM, 1, &vec![0; 20_000]);
    let mut p = H2Parser::with_config("test", &wire[..], RecordingOutput::new(), &config);

    assert_eq!(p.settings().max_frame_size(), 32_768);
    assert!(p.read_frame(true).unwrap());
}

#[test]
fn test_out_of_range_frame_size_is_clamped() {
    let config = ParserConfig { max_frame_size: 100, ..ParserConfig::default() };
    assert_eq!(ConnectionSettings::from_config(&config).max_frame_size(), 16_384);

    let wire = frame(FrameType::Data, 0, 1, &vec![0; 200]);
    let mut p = H2Parser::with_config("test", &wire[..], RecordingOutput::new(), &config);
    assert!(p.read_frame(true).unwrap());
}

#[test]
fn test_lowering_limit_rejects_frame() {
    let wire = frame(FrameType::Data, 0, 1, &vec![0; 20_000]);
    let config = ParserConfig { max_frame_size: 32_768, ..ParserConfig::default() };
    let mut p = H2Parser::with_config("test", &wire[..], RecordingOutput::new(), &config);

    p.settings().set_max_frame_size(16_384).unwrap();
    let err = p.read_frame(true).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FrameSizeError);
}
