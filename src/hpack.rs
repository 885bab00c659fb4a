//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! The parser treats header decompression as an opaque capability behind
//! [`HeaderDecoder`]. [`HpackDecoder`] implements it over `fluke-hpack`.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;

use crate::error::HpackError;

/// Incremental decoder for a header block.
///
/// The parser pushes header block bytes through a bounded buffer. Each call
/// consumes as many complete field representations from the front of `src`
/// as it can and reports each decoded field to `emit`. Bytes belonging to a
/// representation that is not yet complete must be left in `src`; the parser
/// appends more bytes and calls again. `end_of_block` is true once the last
/// byte of the header block is in `src`.
pub trait HeaderDecoder {
    fn decode(
        &mut self,
        src: &mut BytesMut,
        end_of_block: bool,
        emit: &mut dyn FnMut(&[u8], &[u8]),
    ) -> Result<(), HpackError>;
}

/// Decoder handle shared between the parser and settings negotiation.
pub type SharedHeaderDecoder = Arc<Mutex<dyn HeaderDecoder + Send>>;

/// HPACK decoder for HTTP/2 header blocks.
/// Wraps `fluke_hpack::Decoder` which maintains dynamic table state per-connection.
///
/// `fluke-hpack` only decodes whole blocks, so this adapter leaves bytes in
/// `src` until `end_of_block`. Memory use is then bounded by the parser's
/// maximum header block size rather than its header buffer size.
pub struct HpackDecoder {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecoder").finish()
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// Wrap in the shared handle the parser expects.
    pub fn shared() -> SharedHeaderDecoder {
        Arc::new(Mutex::new(Self::new()))
    }
}

impl HeaderDecoder for HpackDecoder {
    fn decode(
        &mut self,
        src: &mut BytesMut,
        end_of_block: bool,
        emit: &mut dyn FnMut(&[u8], &[u8]),
    ) -> Result<(), HpackError> {
        if !end_of_block || src.is_empty() {
            return Ok(());
        }
        let pairs = self
            .inner
            .decode(&src[..])
            .map_err(|e| HpackError::Decode(format!("{:?}", e)))?;
        src.advance(src.len());
        for (name, value) in pairs {
            emit(&name, &value);
        }
        Ok(())
    }
}
