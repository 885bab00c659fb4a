//! Receiver of parser events.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::Result;
use crate::frame::{FrameType, PriorityInfo};
use crate::hpack::SharedHeaderDecoder;

/// Callbacks invoked by [`H2Parser`](crate::H2Parser) as frames are read.
///
/// Events arrive one at a time in wire order. An error returned from any
/// fallible method aborts the current `read_frame` call and is returned to
/// its caller unchanged.
pub trait Output {
    /// Header decoder for this connection. Called once, on the first HEADERS
    /// frame, unless one was installed with `set_header_decoder`.
    fn header_decoder(&mut self) -> SharedHeaderDecoder;

    // DATA frames

    /// Destination for `len` bytes of DATA payload on `stream_id`.
    /// `None` discards the payload.
    fn data_buffer(&mut self, stream_id: u32, len: u32) -> Result<Option<Arc<StreamBuffer>>>;
    fn receive_end_of_stream(&mut self, stream_id: u32) -> Result<()>;

    // HEADERS / CONTINUATION frames
    fn headers_start(&mut self, stream_id: u32) -> Result<()>;
    fn emit_header(&mut self, stream_id: u32, name: &[u8], value: &[u8]);
    fn headers_end(&mut self, stream_id: u32) -> Result<()>;

    // PRIORITY frames (also HEADERS with PRIORITY flag)
    fn reprioritise(&mut self, stream_id: u32, priority: PriorityInfo) -> Result<()>;

    // RST_STREAM frames
    fn reset(&mut self, stream_id: u32, error_code: u32) -> Result<()>;

    // SETTINGS frames
    fn setting(&mut self, id: u16, value: u32) -> Result<()>;
    fn settings_end(&mut self, ack: bool) -> Result<()>;

    // PING frames

    /// A PING ACK echoing a ping we sent.
    fn ping_receive(&mut self, payload: [u8; 8]) -> Result<()>;
    /// A PING from the peer that must be answered with an ACK carrying `payload`.
    fn ping_ack(&mut self, payload: [u8; 8]) -> Result<()>;

    // GOAWAY frames

    /// `debug_data` is empty when the frame carries none.
    fn goaway(&mut self, last_stream_id: u32, error_code: u32, debug_data: String);

    // WINDOW_UPDATE frames; stream 0 is the connection window
    fn increment_window_size(&mut self, stream_id: u32, increment: u32) -> Result<()>;

    /// A frame of unrecognised type whose payload is about to be discarded.
    fn swallowed(
        &mut self,
        stream_id: u32,
        frame_type: FrameType,
        flags: u8,
        size: u32,
    ) -> Result<()> {
        let _ = (stream_id, frame_type, flags, size);
        Ok(())
    }
}

/// Stream payload shared between the parser and a consumer thread.
#[derive(Debug, Default)]
pub struct StreamData {
    pub data: BytesMut,
    pub end_of_stream: bool,
}

/// DATA destination for one stream.
///
/// The parser holds the lock while writing a frame's payload and marking end
/// of stream, then wakes waiters.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    state: Mutex<StreamData>,
    ready: Condvar,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, StreamData> {
        self.state.lock()
    }

    pub fn notify_all(&self) {
        self.ready.notify_all();
    }

    /// Wait up to `timeout` for payload or end of stream, then take whatever
    /// is buffered. Returns `None` on timeout with nothing buffered.
    pub fn read(&self, timeout: Duration) -> Option<(Bytes, bool)> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.data.is_empty() && !state.end_of_stream {
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return None;
            }
        }
        let data = state.data.split().freeze();
        Some((data, state.end_of_stream))
    }
}
