//! h2-frame-parser: A blocking, callback-driven HTTP/2 frame parser
//!
//! This crate reads HTTP/2 frames from a byte source, checks them against the
//! framing rules of RFC 7540 and reports their contents to an event receiver.
//! It sits between a transport and a connection/stream state machine.
//!
//! # Features
//!
//! - **Frame Validation**: Size limits, stream id rules and payload shapes are
//!   checked before any payload byte is read
//! - **Header Blocks**: HEADERS + CONTINUATION sequences are fed through an
//!   HPACK decoder via a bounded buffer
//! - **HPACK Support**: Header decompression via fluke-hpack
//! - **Error Scope**: Every failure is classified as a stream or connection
//!   error with its RFC 7540 error code
//! - **Non-blocking Probe**: `read_frame(false)` returns immediately when no
//!   frame has started arriving
//!
//! # Quick Start
//!
//! ```rust
//! use h2_frame_parser::{
//!     H2Parser, HpackDecoder, Output, PriorityInfo, Result, SharedHeaderDecoder, StreamBuffer,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Pings(Vec<[u8; 8]>);
//!
//! impl Output for Pings {
//!     fn header_decoder(&mut self) -> SharedHeaderDecoder { HpackDecoder::shared() }
//!     fn data_buffer(&mut self, _: u32, _: u32) -> Result<Option<Arc<StreamBuffer>>> { Ok(None) }
//!     fn receive_end_of_stream(&mut self, _: u32) -> Result<()> { Ok(()) }
//!     fn headers_start(&mut self, _: u32) -> Result<()> { Ok(()) }
//!     fn emit_header(&mut self, _: u32, _: &[u8], _: &[u8]) {}
//!     fn headers_end(&mut self, _: u32) -> Result<()> { Ok(()) }
//!     fn reprioritise(&mut self, _: u32, _: PriorityInfo) -> Result<()> { Ok(()) }
//!     fn reset(&mut self, _: u32, _: u32) -> Result<()> { Ok(()) }
//!     fn setting(&mut self, _: u16, _: u32) -> Result<()> { Ok(()) }
//!     fn settings_end(&mut self, _: bool) -> Result<()> { Ok(()) }
//!     fn ping_receive(&mut self, _: [u8; 8]) -> Result<()> { Ok(()) }
//!     fn ping_ack(&mut self, payload: [u8; 8]) -> Result<()> {
//!         self.0.push(payload);
//!         Ok(())
//!     }
//!     fn goaway(&mut self, _: u32, _: u32, _: String) {}
//!     fn increment_window_size(&mut self, _: u32, _: u32) -> Result<()> { Ok(()) }
//! }
//!
//! // PING on stream 0 with an 8 byte payload
//! let wire = [0, 0, 8, 6, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];
//! let mut parser = H2Parser::new("conn-1", &wire[..], Pings::default());
//!
//! assert!(parser.read_frame(true).unwrap());
//! assert!(!parser.read_frame(true).unwrap());
//! assert_eq!(parser.output().0, vec![[1, 2, 3, 4, 5, 6, 7, 8]]);
//! ```
//!
//! # Architecture
//!
//! This crate is intentionally minimal. It provides:
//! - Frame header decoding and validation
//! - Per-type payload decoding into [`Output`] callbacks
//! - Header block continuation tracking
//!
//! It does NOT provide:
//! - Frame encoding or writing
//! - Stream state or flow control accounting (the [`Output`] owns those)
//! - TLS or transport setup (you provide the [`Input`])

pub mod config;
pub mod error;
pub mod frame;
pub mod header_block;
pub mod hpack;
pub mod input;
pub mod output;
pub mod parser;
mod validate;

pub use config::{
    ConnectionSettings, ParserConfig, DEFAULT_HEADER_BUFFER_SIZE, MAX_HEADER_BLOCK_SIZE,
};
pub use error::{ErrorCode, ErrorScope, H2Error, HpackError, Result};
pub use frame::{
    flags, settings_id, FrameHeader, FrameType, PayloadRule, PriorityInfo, StreamRule,
    CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE, MAX_ALLOWED_FRAME_SIZE,
};
pub use header_block::HeaderBlockState;
pub use hpack::{HeaderDecoder, HpackDecoder, SharedHeaderDecoder};
pub use input::{Input, ReadInput};
pub use output::{Output, StreamBuffer, StreamData};
pub use parser::H2Parser;
