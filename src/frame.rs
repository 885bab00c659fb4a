//! HTTP/2 frame header layout and per-type frame properties.
//!
//! Reference: RFC 7540 Section 4 and Section 6

use bytes::{BufMut, BytesMut};

/// Size of the fixed frame header.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Default SETTINGS_MAX_FRAME_SIZE (RFC 7540 Section 6.5.2)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Largest value SETTINGS_MAX_FRAME_SIZE may take (2^24 - 1).
pub const MAX_ALLOWED_FRAME_SIZE: u32 = (1 << 24) - 1;

/// The HTTP/2 client connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// Same bit as END_STREAM; meaning depends on the frame type (SETTINGS, PING).
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// HTTP/2 frame types (RFC 7540 Section 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    RstStream,
    Settings,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation,
    /// Any type code not defined above. Carries the raw code.
    Unknown(u8),
}

/// Which stream ids a frame type may be sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRule {
    /// Connection-level frame: stream id must be 0.
    ConnectionOnly,
    /// Stream-level frame: stream id must not be 0.
    StreamOnly,
    Any,
}

/// Constraint on the payload length of a frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRule {
    Exactly(u32),
    AtLeast(u32),
    MultipleOf(u32),
    Any,
}

impl PayloadRule {
    pub fn allows(self, len: u32) -> bool {
        match self {
            PayloadRule::Exactly(n) => len == n,
            PayloadRule::AtLeast(n) => len >= n,
            PayloadRule::MultipleOf(n) => len % n == 0,
            PayloadRule::Any => true,
        }
    }
}

impl FrameType {
    pub fn stream_rule(self) -> StreamRule {
        match self {
            FrameType::Settings | FrameType::Ping | FrameType::GoAway => StreamRule::ConnectionOnly,
            FrameType::Data
            | FrameType::Headers
            | FrameType::Priority
            | FrameType::RstStream
            | FrameType::PushPromise
            | FrameType::Continuation => StreamRule::StreamOnly,
            // WINDOW_UPDATE applies to a stream or, on stream 0, to the connection.
            FrameType::WindowUpdate | FrameType::Unknown(_) => StreamRule::Any,
        }
    }

    pub fn payload_rule(self) -> PayloadRule {
        match self {
            FrameType::Priority => PayloadRule::Exactly(5),
            FrameType::RstStream => PayloadRule::Exactly(4),
            FrameType::WindowUpdate => PayloadRule::Exactly(4),
            FrameType::Ping => PayloadRule::Exactly(8),
            FrameType::Settings => PayloadRule::MultipleOf(6),
            FrameType::GoAway => PayloadRule::AtLeast(8),
            _ => PayloadRule::Any,
        }
    }
}

impl From<u8> for FrameType {
    fn from(v: u8) -> Self {
        match v {
            0x0 => Self::Data,
            0x1 => Self::Headers,
            0x2 => Self::Priority,
            0x3 => Self::RstStream,
            0x4 => Self::Settings,
            0x5 => Self::PushPromise,
            0x6 => Self::Ping,
            0x7 => Self::GoAway,
            0x8 => Self::WindowUpdate,
            0x9 => Self::Continuation,
            other => Self::Unknown(other),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        match ft {
            FrameType::Data => 0x0,
            FrameType::Headers => 0x1,
            FrameType::Priority => 0x2,
            FrameType::RstStream => 0x3,
            FrameType::Settings => 0x4,
            FrameType::PushPromise => 0x5,
            FrameType::Ping => 0x6,
            FrameType::GoAway => 0x7,
            FrameType::WindowUpdate => 0x8,
            FrameType::Continuation => 0x9,
            FrameType::Unknown(v) => v,
        }
    }
}

/// A parsed HTTP/2 frame header (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32,      // 24 bits
    pub frame_type: FrameType,
    pub flags: u8,
    pub stream_id: u32,   // 31 bits (high bit reserved)
}

impl FrameHeader {
    /// Parse a 9-byte frame header. The reserved stream id bit is masked off.
    pub fn parse(data: &[u8; FRAME_HEADER_SIZE]) -> Self {
        let length = u32::from_be_bytes([0, data[0], data[1], data[2]]);
        let stream_id = read_u31(&data[5..9]);

        Self {
            length,
            frame_type: FrameType::from(data[3]),
            flags: data[4],
            stream_id,
        }
    }

    /// Append the 9-byte wire form of this header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(FRAME_HEADER_SIZE);
        buf.put_u8((self.length >> 16) as u8);
        buf.put_u8((self.length >> 8) as u8);
        buf.put_u8(self.length as u8);
        buf.put_u8(self.frame_type.into());
        buf.put_u8(self.flags);
        buf.put_u32(self.stream_id & STREAM_ID_MASK);
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub fn is_end_stream(&self) -> bool {
        self.has_flag(flags::END_STREAM)
    }

    pub fn is_end_headers(&self) -> bool {
        self.has_flag(flags::END_HEADERS)
    }

    pub fn is_padded(&self) -> bool {
        self.has_flag(flags::PADDED)
    }

    pub fn has_priority(&self) -> bool {
        self.has_flag(flags::PRIORITY)
    }

    pub fn is_ack(&self) -> bool {
        self.has_flag(flags::ACK)
    }
}

/// Stream dependency information from a PRIORITY frame or a HEADERS frame
/// with the PRIORITY flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityInfo {
    pub exclusive: bool,
    pub parent_stream_id: u32,
    /// 1..=256 (wire value + 1)
    pub weight: u16,
}

impl PriorityInfo {
    /// Size of the priority block on the wire.
    pub const SIZE: usize = 5;

    pub fn parse(data: &[u8; Self::SIZE]) -> Self {
        Self {
            exclusive: data[0] & 0x80 != 0,
            parent_stream_id: read_u31(&data[0..4]),
            weight: data[4] as u16 + 1,
        }
    }
}

/// Read a big-endian 31-bit value, ignoring the reserved high bit.
pub(crate) fn read_u31(data: &[u8]) -> u32 {
    read_u32(data) & STREAM_ID_MASK
}

pub(crate) fn read_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}
