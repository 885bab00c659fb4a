//! Tests for the HeaderDecoder adapter over fluke-hpack

use bytes::BytesMut;
use h2_frame_parser::{HeaderDecoder, HpackDecoder};

fn encode(headers: &[(&str, &str)]) -> Vec<u8> {
    let mut encoder = fluke_hpack::Encoder::new();
    encoder.encode(headers.iter().map(|(n, v)| (n.as_bytes(), v.as_bytes())))
}

fn collect(decoder: &mut HpackDecoder, src: &mut BytesMut, end: bool) -> Vec<(String, String)> {
    let mut out = Vec::new();
    decoder
        .decode(src, end, &mut |name, value| {
            out.push((
                String::from_utf8_lossy(name).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            ))
        })
        .unwrap();
    out
}

fn decode_whole(decoder: &mut HpackDecoder, block: &[u8]) -> Vec<(String, String)> {
    let mut src = BytesMut::from(block);
    let fields = collect(decoder, &mut src, true);
    assert!(src.is_empty(), "decoded block leaves nothing behind");
    fields
}

fn field(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

#[test]
fn test_static_table_entries() {
    let mut decoder = HpackDecoder::new();

    // 0x82 = :method: GET, 0x86 = :scheme: http, 0x84 = :path: /
    let fields = decode_whole(&mut decoder, &[0x82, 0x86, 0x84]);
    assert_eq!(
        fields,
        vec![field(":method", "GET"), field(":scheme", "http"), field(":path", "/")]
    );
}

#[test]
fn test_literal_with_indexed_name() {
    let mut decoder = HpackDecoder::new();

    // Literal with incremental indexing, name index 1 (:authority)
    let mut block = vec![0x41, 0x0B];
    block.extend_from_slice(b"example.com");

    let fields = decode_whole(&mut decoder, &block);
    assert_eq!(fields, vec![field(":authority", "example.com")]);
}

#[test]
fn test_dynamic_table_persists_between_blocks() {
    let mut decoder = HpackDecoder::new();

    // Literal with incremental indexing, new name "custom", value "value"
    let mut first = vec![0x40, 0x06];
    first.extend_from_slice(b"custom");
    first.push(0x05);
    first.extend_from_slice(b"value");
    assert_eq!(decode_whole(&mut decoder, &first), vec![field("custom", "value")]);

    // 0xBE = indexed header, index 62: first dynamic table entry
    assert_eq!(decode_whole(&mut decoder, &[0xBE]), vec![field("custom", "value")]);
}

#[test]
fn test_waits_for_end_of_block() {
    let mut decoder = HpackDecoder::new();
    let mut src = BytesMut::from(&encode(&[(":method", "GET"), (":path", "/")])[..]);
    let len = src.len();

    assert!(collect(&mut decoder, &mut src, false).is_empty());
    assert_eq!(src.len(), len, "bytes stay buffered until the block ends");

    let fields = collect(&mut decoder, &mut src, true);
    assert_eq!(fields, vec![field(":method", "GET"), field(":path", "/")]);
    assert!(src.is_empty());
}

#[test]
fn test_block_split_across_calls() {
    let mut decoder = HpackDecoder::new();
    let block = encode(&[("content-type", "application/json"), ("x-trace", "abc123")]);
    let (first, second) = block.split_at(block.len() / 2);

    let mut src = BytesMut::from(first);
    assert!(collect(&mut decoder, &mut src, false).is_empty());
    src.extend_from_slice(second);

    let fields = collect(&mut decoder, &mut src, true);
    assert_eq!(
        fields,
        vec![field("content-type", "application/json"), field("x-trace", "abc123")]
    );
}

#[test]
fn test_empty_block_emits_nothing() {
    let mut decoder = HpackDecoder::new();
    let mut src = BytesMut::new();
    assert!(collect(&mut decoder, &mut src, true).is_empty());
}

#[test]
fn test_shared_handle_keeps_table_state() {
    let shared = HpackDecoder::shared();
    let mut encoder = fluke_hpack::Encoder::new();
    let mut values = Vec::new();

    for path in ["/a", "/b", "/a"] {
        let block = encoder.encode(vec![(&b"x-path"[..], path.as_bytes())]);
        let mut src = BytesMut::from(&block[..]);
        shared
            .lock()
            .decode(&mut src, true, &mut |_, value| values.push(value.to_vec()))
            .unwrap();
    }
    assert_eq!(values, vec![b"/a".to_vec(), b"/b".to_vec(), b"/a".to_vec()]);
}

#[test]
fn test_invalid_index_is_decode_error() {
    let mut decoder = HpackDecoder::new();

    // 0xFE = indexed header, index 126: not in the static or dynamic table
    let mut src = BytesMut::from(&[0xFEu8][..]);
    let err = decoder.decode(&mut src, true, &mut |_, _| {}).unwrap_err();
    assert!(err.to_string().starts_with("HPACK decode error"), "{}", err);
}
