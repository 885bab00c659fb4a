//! Error classification for HTTP/2 frame parsing.
//!
//! Every protocol violation carries an [`ErrorCode`] and the id of the stream
//! it applies to. Stream id 0 means the whole connection is affected; the
//! parser cannot recover the scope later, so it is fixed at the point the
//! violation is detected.

use std::fmt;

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, H2Error>;

/// HTTP/2 error codes (RFC 7540 Section 7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    /// Map a wire value to a known code. Unknown values yield `None`; callers
    /// that forward peer-supplied codes keep the raw `u32` instead.
    pub fn from_u32(code: u32) -> Option<Self> {
        let code = match code {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            _ => return None,
        };
        Some(code)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NoError => "NO_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::FlowControlError => "FLOW_CONTROL_ERROR",
            ErrorCode::SettingsTimeout => "SETTINGS_TIMEOUT",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::FrameSizeError => "FRAME_SIZE_ERROR",
            ErrorCode::RefusedStream => "REFUSED_STREAM",
            ErrorCode::Cancel => "CANCEL",
            ErrorCode::CompressionError => "COMPRESSION_ERROR",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            ErrorCode::InadequateSecurity => "INADEQUATE_SECURITY",
            ErrorCode::Http11Required => "HTTP_1_1_REQUIRED",
        };
        f.write_str(name)
    }
}

/// Which part of the connection an error tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// The whole connection must be closed.
    Connection,
    /// Only the given stream is reset; the connection continues.
    Stream(u32),
}

/// Errors produced while reading frames.
#[derive(Debug, thiserror::Error)]
pub enum H2Error {
    /// The byte source failed. Always fatal to the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client connection preface did not match.
    #[error("invalid connection preface")]
    InvalidPreface,

    /// A protocol violation. `stream_id == 0` means connection scope.
    #[error("{code} on stream {stream_id}: {message}")]
    Protocol {
        code: ErrorCode,
        stream_id: u32,
        message: String,
    },
}

impl H2Error {
    /// A connection-scoped protocol violation.
    pub fn connection(code: ErrorCode, message: impl Into<String>) -> Self {
        H2Error::Protocol {
            code,
            stream_id: 0,
            message: message.into(),
        }
    }

    /// A violation that only affects `stream_id`.
    pub fn stream(stream_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        H2Error::Protocol {
            code,
            stream_id,
            message: message.into(),
        }
    }

    pub fn scope(&self) -> ErrorScope {
        match self {
            H2Error::Protocol { stream_id, .. } if *stream_id != 0 => {
                ErrorScope::Stream(*stream_id)
            }
            _ => ErrorScope::Connection,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        self.scope() == ErrorScope::Connection
    }

    /// The error code to report to the peer in RST_STREAM or GOAWAY.
    pub fn code(&self) -> ErrorCode {
        match self {
            H2Error::Protocol { code, .. } => *code,
            H2Error::InvalidPreface => ErrorCode::ProtocolError,
            H2Error::Io(_) => ErrorCode::InternalError,
        }
    }

    /// The stream the error applies to, 0 for the connection.
    pub fn stream_id(&self) -> u32 {
        match self {
            H2Error::Protocol { stream_id, .. } => *stream_id,
            _ => 0,
        }
    }
}

/// Failure reported by a header block decoder.
#[derive(Debug, thiserror::Error)]
pub enum HpackError {
    #[error("HPACK decode error: {0}")]
    Decode(String),

    #[error("header block too large ({size} bytes, max {max})")]
    BlockTooLarge { size: usize, max: usize },
}
