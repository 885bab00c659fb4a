//! Parser configuration and negotiated per-connection state.
//!
//! Configuration is built in the following order (later overrides earlier):
//! 1. Default values
//! 2. Serialized config (any serde format)
//! 3. Environment variables, via [`ParserConfig::from_env`]

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, H2Error, Result};
use crate::frame::{DEFAULT_MAX_FRAME_SIZE, MAX_ALLOWED_FRAME_SIZE};

/// Default size of the intermediate header block buffer.
pub const DEFAULT_HEADER_BUFFER_SIZE: usize = 1024;

/// Maximum accumulated header block size (256 KB).
pub const MAX_HEADER_BLOCK_SIZE: usize = 256 * 1024;

/// Static parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Initial maximum frame payload size, before any SETTINGS are applied.
    pub max_frame_size: u32,
    /// Capacity of the buffer header block bytes are pushed through.
    pub header_buffer_size: usize,
    /// Largest the header buffer may grow when the decoder needs more bytes
    /// than fit in it to make progress.
    pub max_header_block_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            header_buffer_size: DEFAULT_HEADER_BUFFER_SIZE,
            max_header_block_size: MAX_HEADER_BLOCK_SIZE,
        }
    }
}

impl ParserConfig {
    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(size) = env_parse("H2_MAX_FRAME_SIZE") {
            self.max_frame_size = size;
        }
        if let Some(size) = env_parse("H2_HEADER_BUFFER_SIZE") {
            self.header_buffer_size = size;
        }
        if let Some(size) = env_parse("H2_MAX_HEADER_BLOCK_SIZE") {
            self.max_header_block_size = size;
        }
    }

    /// Max frame size clamped to the range RFC 7540 permits.
    pub fn effective_max_frame_size(&self) -> u32 {
        self.max_frame_size.clamp(DEFAULT_MAX_FRAME_SIZE, MAX_ALLOWED_FRAME_SIZE)
    }

    /// Header buffer bounds, with the ceiling never below the initial size.
    pub(crate) fn header_buffer_bounds(&self) -> (usize, usize) {
        let initial = self.header_buffer_size.max(1);
        (initial, self.max_header_block_size.max(initial))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Negotiated connection state read by the parser on every frame.
///
/// Settings negotiation writes, the parser reads. Share it with `Arc`.
#[derive(Debug)]
pub struct ConnectionSettings {
    max_frame_size: AtomicU32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl ConnectionSettings {
    pub fn new(max_frame_size: u32) -> Self {
        Self {
            max_frame_size: AtomicU32::new(max_frame_size),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(config.effective_max_frame_size())
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size.load(Ordering::Acquire)
    }

    /// Apply a SETTINGS_MAX_FRAME_SIZE value.
    pub fn set_max_frame_size(&self, size: u32) -> Result<()> {
        if !(DEFAULT_MAX_FRAME_SIZE..=MAX_ALLOWED_FRAME_SIZE).contains(&size) {
            return Err(H2Error::connection(
                ErrorCode::ProtocolError,
                format!(
                    "max frame size {} outside {}..={}",
                    size, DEFAULT_MAX_FRAME_SIZE, MAX_ALLOWED_FRAME_SIZE
                ),
            ));
        }
        self.max_frame_size.store(size, Ordering::Release);
        Ok(())
    }
}
