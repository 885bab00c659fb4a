//! Byte sources the parser reads frames from.

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// Longest sleep between polls of a reader that keeps returning `WouldBlock`.
pub const MAX_POLL_BACKOFF: Duration = Duration::from_millis(10);

/// Polls that only yield before sleeping starts.
const SPIN_POLLS: u32 = 16;

/// Source of data for the parser.
///
/// `fill` reads exactly `buf.len()` bytes. If `block` is false and nothing is
/// pending, or the source is at end of input before the first byte, it returns
/// `Ok(false)` without consuming anything. Once any byte of `buf` has been
/// read, the rest is read with blocking I/O; running out of input part way is
/// an [`io::ErrorKind::UnexpectedEof`] error.
pub trait Input {
    fn fill(&mut self, block: bool, buf: &mut [u8]) -> io::Result<bool>;
}

impl<I: Input + ?Sized> Input for &mut I {
    fn fill(&mut self, block: bool, buf: &mut [u8]) -> io::Result<bool> {
        (**self).fill(block, buf)
    }
}

impl Input for &[u8] {
    fn fill(&mut self, _block: bool, buf: &mut [u8]) -> io::Result<bool> {
        if buf.is_empty() {
            return Ok(true);
        }
        if self.is_empty() {
            return Ok(false);
        }
        if self.len() < buf.len() {
            *self = &[];
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(true)
    }
}

/// Blocking fill for bytes inside a frame whose header has been read.
pub(crate) fn fill_blocking<I: Input + ?Sized>(input: &mut I, buf: &mut [u8]) -> io::Result<()> {
    if input.fill(true, buf)? {
        Ok(())
    } else {
        Err(io::ErrorKind::UnexpectedEof.into())
    }
}

/// [`Input`] over any [`Read`] implementation.
///
/// For a reader in non-blocking mode, `WouldBlock` before the first byte of a
/// non-blocking fill reports "nothing pending". After the first byte, or for a
/// blocking fill, the reader is polled until the buffer is complete, yielding
/// at first and then sleeping up to [`MAX_POLL_BACKOFF`] between attempts.
/// Readers that are not in non-blocking mode never take this path.
#[derive(Debug)]
pub struct ReadInput<R> {
    inner: R,
}

impl<R: Read> ReadInput<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Input for ReadInput<R> {
    fn fill(&mut self, block: bool, buf: &mut [u8]) -> io::Result<bool> {
        let mut filled = 0;
        let mut stalls = 0u32;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    filled += n;
                    stalls = 0;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if filled == 0 && !block {
                        return Ok(false);
                    }
                    backoff(stalls);
                    stalls = stalls.saturating_add(1);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

fn backoff(stalls: u32) {
    if stalls < SPIN_POLLS {
        thread::yield_now();
    } else {
        let exp = (stalls - SPIN_POLLS).min(4);
        thread::sleep((Duration::from_micros(500) * (1 << exp)).min(MAX_POLL_BACKOFF));
    }
}
