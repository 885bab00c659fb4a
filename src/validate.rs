//! Checks applied to every frame header before its payload is read.
//!
//! Frame type specific validation that depends on flags or payload content
//! lives with the payload decoders in the parser.

use crate::error::{ErrorCode, H2Error, Result};
use crate::frame::{FrameHeader, FrameType, PayloadRule, StreamRule};
use crate::header_block::HeaderBlockState;

/// Validate `header` in order; the first failure wins.
///
/// `expected` is only set for the frame that must follow the connection
/// preface.
pub(crate) fn validate_frame(
    header: &FrameHeader,
    expected: Option<FrameType>,
    max_frame_size: u32,
    headers: &HeaderBlockState,
) -> Result<()> {
    let frame_type = header.frame_type;
    let stream_id = header.stream_id;

    if let Some(expected) = expected {
        if frame_type != expected {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!("expected {:?} frame, received {:?}", expected, frame_type),
            ));
        }
    }

    if header.length > max_frame_size {
        return Err(H2Error::connection(
            ErrorCode::FrameSizeError,
            format!("payload size {} exceeds maximum {}", header.length, max_frame_size),
        ));
    }

    if let Some(open) = headers.open_stream() {
        if open != stream_id {
            return Err(H2Error::connection(
                ErrorCode::CompressionError,
                format!(
                    "header block open on stream {}, received frame for stream {}",
                    open, stream_id
                ),
            ));
        }
        if frame_type != FrameType::Continuation {
            return Err(H2Error::connection(
                ErrorCode::CompressionError,
                format!(
                    "header block open on stream {}, received {:?} frame",
                    open, frame_type
                ),
            ));
        }
    } else if frame_type == FrameType::Continuation {
        return Err(H2Error::connection(
            ErrorCode::ProtocolError,
            format!("unexpected CONTINUATION frame for stream {}", stream_id),
        ));
    }

    match frame_type.stream_rule() {
        StreamRule::ConnectionOnly if stream_id != 0 => {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!("{:?} frame on stream {}, must be stream 0", frame_type, stream_id),
            ));
        }
        StreamRule::StreamOnly if stream_id == 0 => {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!("{:?} frame on stream 0", frame_type),
            ));
        }
        _ => {}
    }

    let rule = frame_type.payload_rule();
    if !rule.allows(header.length) {
        let message = match rule {
            PayloadRule::Exactly(n) => format!(
                "{:?} frame payload size {}, must be {}",
                frame_type, header.length, n
            ),
            PayloadRule::AtLeast(n) => format!(
                "{:?} frame payload size {}, must be at least {}",
                frame_type, header.length, n
            ),
            PayloadRule::MultipleOf(n) => format!(
                "{:?} frame payload size {}, must be a multiple of {}",
                frame_type, header.length, n
            ),
            PayloadRule::Any => String::new(),
        };
        // RFC 7540 Section 6.3: a bad PRIORITY size only affects its stream.
        return Err(match frame_type {
            FrameType::Priority => H2Error::stream(stream_id, ErrorCode::FrameSizeError, message),
            _ => H2Error::connection(ErrorCode::FrameSizeError, message),
        });
    }

    Ok(())
}
