//! Header block assembly across HEADERS + CONTINUATION frames.
//!
//! A header block starts in a HEADERS frame and continues through zero or
//! more CONTINUATION frames on the same stream until END_HEADERS. While a
//! block is open no other frame may appear on the connection; the validator
//! enforces that before any bytes reach this module.

use bytes::BytesMut;

use crate::error::{ErrorCode, H2Error, HpackError, Result};
use crate::hpack::HeaderDecoder;
use crate::input::{fill_blocking, Input};

/// Whether a header block is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderBlockState {
    #[default]
    Idle,
    /// Waiting for CONTINUATION frames on `stream_id`. `end_of_stream` holds
    /// an END_STREAM flag seen on the HEADERS frame, delivered once the block
    /// completes. `rejected` is set when the output refused the stream; the
    /// rest of the block is decoded but nothing more is reported for it.
    Open {
        stream_id: u32,
        end_of_stream: bool,
        rejected: bool,
    },
}

impl HeaderBlockState {
    pub fn open_stream(&self) -> Option<u32> {
        match self {
            HeaderBlockState::Idle => None,
            HeaderBlockState::Open { stream_id, .. } => Some(*stream_id),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open_stream().is_some()
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, HeaderBlockState::Open { rejected: true, .. })
    }

    pub(crate) fn open(&mut self, stream_id: u32, end_of_stream: bool, rejected: bool) {
        *self = HeaderBlockState::Open {
            stream_id,
            end_of_stream,
            rejected,
        };
    }

    /// Return to idle. Yields the deferred END_STREAM flag.
    pub(crate) fn close(&mut self) -> bool {
        match std::mem::take(self) {
            HeaderBlockState::Open { end_of_stream, .. } => end_of_stream,
            HeaderBlockState::Idle => false,
        }
    }
}

/// Bounded buffer header block bytes pass through on their way to the
/// decoder.
///
/// The buffer starts at `initial` bytes. It only grows, doubling up to `max`,
/// when it is full and the decoder cannot consume anything from it.
#[derive(Debug)]
pub(crate) struct HeaderBlockBuffer {
    buf: BytesMut,
    limit: usize,
    initial: usize,
    max: usize,
}

impl HeaderBlockBuffer {
    pub(crate) fn new(initial: usize, max: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(initial),
            limit: initial,
            initial,
            max,
        }
    }

    /// Undecoded bytes currently held.
    pub(crate) fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Read `len` header block bytes from `input` and push them through
    /// `decoder`. `end_of_headers` marks the frame that completes the block.
    pub(crate) fn read_block<I, D>(
        &mut self,
        input: &mut I,
        decoder: &mut D,
        mut len: usize,
        end_of_headers: bool,
        emit: &mut dyn FnMut(&[u8], &[u8]),
    ) -> Result<()>
    where
        I: Input + ?Sized,
        D: HeaderDecoder + ?Sized,
    {
        let mut decoded_last = false;
        while len > 0 {
            if self.buf.len() == self.limit {
                self.grow()?;
            }
            let to_read = (self.limit - self.buf.len()).min(len);
            let start = self.buf.len();
            self.buf.resize(start + to_read, 0);
            fill_blocking(input, &mut self.buf[start..])?;
            len -= to_read;

            decoded_last = end_of_headers && len == 0;
            decoder
                .decode(&mut self.buf, decoded_last, emit)
                .map_err(|e| self.fail(e))?;
        }

        if end_of_headers {
            if !decoded_last {
                decoder
                    .decode(&mut self.buf, true, emit)
                    .map_err(|e| self.fail(e))?;
            }
            if !self.buf.is_empty() {
                let left = self.buf.len();
                self.reset();
                return Err(H2Error::connection(
                    ErrorCode::CompressionError,
                    format!("{} bytes of header block left undecoded", left),
                ));
            }
            self.reset();
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        if self.limit >= self.max {
            let err = HpackError::BlockTooLarge {
                size: self.buf.len(),
                max: self.max,
            };
            return Err(self.fail(err));
        }
        self.limit = (self.limit * 2).min(self.max);
        self.buf.reserve(self.limit - self.buf.len());
        tracing::trace!(limit = self.limit, "header buffer grown");
        Ok(())
    }

    fn fail(&mut self, err: HpackError) -> H2Error {
        self.reset();
        H2Error::connection(ErrorCode::CompressionError, err.to_string())
    }

    pub(crate) fn reset(&mut self) {
        self.buf.clear();
        if self.limit != self.initial {
            self.limit = self.initial;
            self.buf = BytesMut::with_capacity(self.initial);
        }
    }
}
