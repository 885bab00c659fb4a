//! Blocking HTTP/2 frame parser.
//!
//! Reads one frame per call from an [`Input`], validates it and reports its
//! contents to an [`Output`]. The frame header may be read without blocking
//! to check whether a frame is available; once any byte of a frame has been
//! seen, the rest of the frame is read with blocking I/O.
//!
//! Reference: RFC 7540 (HTTP/2)

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{ConnectionSettings, ParserConfig};
use crate::error::{ErrorCode, H2Error, Result};
use crate::frame::{
    read_u31, read_u32, FrameHeader, FrameType, PriorityInfo, CONNECTION_PREFACE, FRAME_HEADER_SIZE,
};
use crate::header_block::{HeaderBlockBuffer, HeaderBlockState};
use crate::hpack::SharedHeaderDecoder;
use crate::input::{fill_blocking, Input};
use crate::output::Output;
use crate::validate::validate_frame;

const SWALLOW_CHUNK_SIZE: usize = 1024;

/// HTTP/2 frame parser for one connection.
///
/// Owns the header block continuation state for the lifetime of the
/// connection. Streams, flow control windows and decoded header fields
/// belong to the [`Output`].
pub struct H2Parser<I, O> {
    connection_id: String,
    input: I,
    output: O,
    settings: Arc<ConnectionSettings>,
    header_decoder: Option<SharedHeaderDecoder>,
    header_state: HeaderBlockState,
    header_buffer: HeaderBlockBuffer,
}

impl<I, O> std::fmt::Debug for H2Parser<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("H2Parser")
            .field("connection_id", &self.connection_id)
            .field("max_frame_size", &self.settings.max_frame_size())
            .field("header_state", &self.header_state)
            .finish()
    }
}

impl<I: Input, O: Output> H2Parser<I, O> {
    pub fn new(connection_id: impl Into<String>, input: I, output: O) -> Self {
        Self::with_config(connection_id, input, output, &ParserConfig::default())
    }

    pub fn with_config(
        connection_id: impl Into<String>,
        input: I,
        output: O,
        config: &ParserConfig,
    ) -> Self {
        let (initial, max) = config.header_buffer_bounds();
        Self {
            connection_id: connection_id.into(),
            input,
            output,
            settings: Arc::new(ConnectionSettings::from_config(config)),
            header_decoder: None,
            header_state: HeaderBlockState::Idle,
            header_buffer: HeaderBlockBuffer::new(initial, max),
        }
    }

    /// Share negotiated settings with the connection's settings handling.
    pub fn with_settings(mut self, settings: Arc<ConnectionSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Replace the header decoder, e.g. after a new HEADER_TABLE_SIZE.
    pub fn set_header_decoder(&mut self, decoder: SharedHeaderDecoder) {
        self.header_decoder = Some(decoder);
    }

    pub fn header_state(&self) -> HeaderBlockState {
        self.header_state
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn into_parts(self) -> (I, O) {
        (self.input, self.output)
    }

    /// Read and validate the client connection preface, then the SETTINGS
    /// frame that must follow it. Uses blocking I/O throughout.
    pub fn read_connection_preface(&mut self) -> Result<()> {
        let mut data = [0u8; 24];
        fill_blocking(&mut self.input, &mut data)?;
        if data[..] != *CONNECTION_PREFACE {
            debug!(conn = %self.connection_id, "invalid connection preface");
            return Err(H2Error::InvalidPreface);
        }
        debug!(conn = %self.connection_id, "connection preface received");

        if !self.read_frame_expecting(true, Some(FrameType::Settings))? {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(())
    }

    /// Read and process a single frame.
    ///
    /// With `block == false` this returns `Ok(false)` if no frame is
    /// available yet. `Ok(false)` is also returned at end of input on a frame
    /// boundary.
    pub fn read_frame(&mut self, block: bool) -> Result<bool> {
        self.read_frame_expecting(block, None)
    }

    fn read_frame_expecting(&mut self, block: bool, expected: Option<FrameType>) -> Result<bool> {
        let mut raw = [0u8; FRAME_HEADER_SIZE];
        if !self.input.fill(block, &mut raw)? {
            return Ok(false);
        }
        let header = FrameHeader::parse(&raw);

        debug!(
            conn = %self.connection_id,
            stream_id = header.stream_id,
            frame_type = ?header.frame_type,
            flags = header.flags,
            length = header.length,
            "frame received"
        );

        let result = self.process_frame(&header, expected);
        if let Err(e) = &result {
            debug!(conn = %self.connection_id, error = %e, "frame rejected");
            if e.is_connection_error() {
                self.header_state = HeaderBlockState::Idle;
                self.header_buffer.reset();
            }
        }
        result.map(|()| true)
    }

    fn process_frame(&mut self, header: &FrameHeader, expected: Option<FrameType>) -> Result<()> {
        let max_frame_size = self.settings.max_frame_size();
        if let Err(e) = validate_frame(header, expected, max_frame_size, &self.header_state) {
            if !e.is_connection_error() {
                self.swallow(header.length as usize)?;
            }
            return Err(e);
        }

        match header.frame_type {
            FrameType::Data => self.read_data_frame(header),
            FrameType::Headers => self.read_headers_frame(header),
            FrameType::Priority => self.read_priority_frame(header),
            FrameType::RstStream => self.read_rst_frame(header),
            FrameType::Settings => self.read_settings_frame(header),
            FrameType::PushPromise => self.read_push_promise_frame(header),
            FrameType::Ping => self.read_ping_frame(header),
            FrameType::GoAway => self.read_goaway_frame(header),
            FrameType::WindowUpdate => self.read_window_update_frame(header),
            FrameType::Continuation => self.read_continuation_frame(header),
            FrameType::Unknown(_) => self.read_unknown_frame(header),
        }
    }

    fn read_data_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let stream_id = header.stream_id;
        let end_of_stream = header.is_end_stream();
        let mut remaining = header.length as usize;
        let mut pad_length = 0;

        if header.is_padded() {
            pad_length = self.read_pad_length(header)?;
            remaining -= 1;
            if pad_length > remaining {
                return Err(H2Error::connection(
                    ErrorCode::ProtocolError,
                    format!(
                        "invalid padding length {} in DATA frame of size {}",
                        pad_length, header.length
                    ),
                ));
            }
        }
        let data_length = remaining - pad_length;

        let dest = match self.output.data_buffer(stream_id, data_length as u32) {
            Ok(dest) => dest,
            Err(e) => {
                if !e.is_connection_error() {
                    self.swallow(remaining)?;
                }
                return Err(e);
            }
        };

        match dest {
            None => self.swallow(data_length)?,
            Some(dest) => {
                {
                    let mut state = dest.lock();
                    let start = state.data.len();
                    state.data.resize(start + data_length, 0);
                    if let Err(e) = fill_blocking(&mut self.input, &mut state.data[start..]) {
                        state.data.truncate(start);
                        return Err(e.into());
                    }
                    if end_of_stream {
                        state.end_of_stream = true;
                    }
                }
                dest.notify_all();
            }
        }

        let delivered = if end_of_stream {
            self.output.receive_end_of_stream(stream_id)
        } else {
            Ok(())
        };
        self.swallow(pad_length)?;
        delivered
    }

    fn read_headers_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let stream_id = header.stream_id;
        let padded = header.is_padded();
        let priority = header.has_priority();

        let mut optional_length = 0;
        if padded {
            optional_length += 1;
        }
        if priority {
            optional_length += PriorityInfo::SIZE;
        }
        let mut remaining = header.length as usize;
        if remaining < optional_length {
            return Err(H2Error::connection(
                ErrorCode::FrameSizeError,
                format!(
                    "HEADERS frame of size {} too short for flags {:#x}",
                    header.length, header.flags
                ),
            ));
        }

        // Stream errors raised by the output before the header block is read
        // are held back until the block has been decoded.
        let mut deferred = None;
        defer(&mut deferred, self.output.headers_start(stream_id))?;

        let mut pad_length = 0;
        if optional_length > 0 {
            let mut optional = [0u8; 1 + PriorityInfo::SIZE];
            fill_blocking(&mut self.input, &mut optional[..optional_length])?;
            let mut pos = 0;
            if padded {
                pad_length = optional[0] as usize;
                pos = 1;
            }
            if priority {
                let mut block = [0u8; PriorityInfo::SIZE];
                block.copy_from_slice(&optional[pos..pos + PriorityInfo::SIZE]);
                let info = PriorityInfo::parse(&block);
                if deferred.is_none() {
                    defer(&mut deferred, self.output.reprioritise(stream_id, info))?;
                }
            }
            remaining -= optional_length;
        }

        if pad_length > remaining {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!(
                    "invalid padding length {} in HEADERS frame of size {}",
                    pad_length, header.length
                ),
            ));
        }

        let end_of_headers = header.is_end_headers();
        let emit = deferred.is_none();
        self.read_header_block(stream_id, remaining - pad_length, end_of_headers, emit)?;
        self.swallow(pad_length)?;

        if !end_of_headers {
            self.header_state.open(stream_id, header.is_end_stream(), deferred.is_some());
        }
        if let Some(e) = deferred {
            return Err(e);
        }

        if end_of_headers {
            self.output.headers_end(stream_id)?;
            if header.is_end_stream() {
                self.output.receive_end_of_stream(stream_id)?;
            }
        }
        Ok(())
    }

    fn read_priority_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let mut payload = [0u8; PriorityInfo::SIZE];
        fill_blocking(&mut self.input, &mut payload)?;

        let info = PriorityInfo::parse(&payload);
        self.output.reprioritise(header.stream_id, info)
    }

    fn read_rst_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let mut payload = [0u8; 4];
        fill_blocking(&mut self.input, &mut payload)?;

        self.output.reset(header.stream_id, u32::from_be_bytes(payload))
    }

    fn read_settings_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let ack = header.is_ack();
        if ack && header.length > 0 {
            return Err(H2Error::connection(
                ErrorCode::FrameSizeError,
                format!("SETTINGS ACK with non-zero payload size {}", header.length),
            ));
        }

        let mut setting = [0u8; 6];
        for _ in 0..header.length / 6 {
            fill_blocking(&mut self.input, &mut setting)?;
            let id = u16::from_be_bytes([setting[0], setting[1]]);
            let value = read_u32(&setting[2..]);
            trace!(conn = %self.connection_id, id, value, "setting received");
            self.output.setting(id, value)?;
        }
        self.output.settings_end(ack)
    }

    fn read_push_promise_frame(&mut self, header: &FrameHeader) -> Result<()> {
        Err(H2Error::connection(
            ErrorCode::ProtocolError,
            format!(
                "PUSH_PROMISE received for stream {}; server push is not supported",
                header.stream_id
            ),
        ))
    }

    fn read_ping_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let mut payload = [0u8; 8];
        fill_blocking(&mut self.input, &mut payload)?;

        if header.is_ack() {
            self.output.ping_receive(payload)
        } else {
            self.output.ping_ack(payload)
        }
    }

    fn read_goaway_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let mut payload = vec![0u8; header.length as usize];
        fill_blocking(&mut self.input, &mut payload)?;

        let last_stream_id = read_u31(&payload[0..4]);
        let error_code = read_u32(&payload[4..8]);
        let debug_data = String::from_utf8_lossy(&payload[8..]).into_owned();
        debug!(
            conn = %self.connection_id,
            last_stream_id,
            error_code,
            debug_data = %debug_data,
            "GOAWAY received"
        );
        self.output.goaway(last_stream_id, error_code, debug_data);
        Ok(())
    }

    fn read_window_update_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let mut payload = [0u8; 4];
        fill_blocking(&mut self.input, &mut payload)?;
        let increment = read_u31(&payload);

        debug!(
            conn = %self.connection_id,
            stream_id = header.stream_id,
            increment,
            "WINDOW_UPDATE received"
        );

        if increment == 0 {
            return Err(H2Error::stream(
                header.stream_id,
                ErrorCode::ProtocolError,
                "WINDOW_UPDATE with zero increment",
            ));
        }
        self.output.increment_window_size(header.stream_id, increment)
    }

    fn read_continuation_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let stream_id = header.stream_id;
        let end_of_headers = header.is_end_headers();
        let rejected = self.header_state.is_rejected();
        self.read_header_block(stream_id, header.length as usize, end_of_headers, !rejected)?;

        if end_of_headers {
            let end_of_stream = self.header_state.close();
            if rejected {
                return Ok(());
            }
            self.output.headers_end(stream_id)?;
            if end_of_stream {
                self.output.receive_end_of_stream(stream_id)?;
            }
        }
        Ok(())
    }

    fn read_unknown_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let notified =
            self.output
                .swallowed(header.stream_id, header.frame_type, header.flags, header.length);
        self.swallow(header.length as usize)?;
        notified
    }

    /// Push `length` bytes of header block through the decoder. With `emit`
    /// false the block is still decoded but fields are not reported.
    fn read_header_block(
        &mut self,
        stream_id: u32,
        length: usize,
        end_of_headers: bool,
        emit: bool,
    ) -> Result<()> {
        let decoder = match &self.header_decoder {
            Some(decoder) => Arc::clone(decoder),
            None => {
                let decoder = self.output.header_decoder();
                self.header_decoder = Some(Arc::clone(&decoder));
                decoder
            }
        };
        let mut decoder = decoder.lock();

        let output = &mut self.output;
        let mut emit_header = |name: &[u8], value: &[u8]| {
            if emit {
                output.emit_header(stream_id, name, value);
            }
        };
        self.header_buffer.read_block(
            &mut self.input,
            &mut *decoder,
            length,
            end_of_headers,
            &mut emit_header,
        )
    }

    fn read_pad_length(&mut self, header: &FrameHeader) -> Result<usize> {
        if header.length == 0 {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!("PADDED {:?} frame with empty payload", header.frame_type),
            ));
        }
        let mut b = [0u8; 1];
        fill_blocking(&mut self.input, &mut b)?;
        Ok(b[0] as usize)
    }

    fn swallow(&mut self, len: usize) -> Result<()> {
        let mut buffer = [0u8; SWALLOW_CHUNK_SIZE];
        let mut read = 0;
        while read < len {
            let this_time = (len - read).min(buffer.len());
            fill_blocking(&mut self.input, &mut buffer[..this_time])?;
            read += this_time;
        }
        Ok(())
    }
}

/// Keep a stream-scoped error for later; connection errors end the frame now.
fn defer(slot: &mut Option<H2Error>, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_connection_error() => Err(e),
        Err(e) => {
            slot.get_or_insert(e);
            Ok(())
        }
    }
}
