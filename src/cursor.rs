//! Byte cursor over an in-memory buffer
//!
//! Every decoding step in this crate advances a cursor by exactly the number
//! of bytes it consumes, and the current offset stays introspectable so
//! callers can check declared lengths against actual consumption.

use crate::{Error, Result};

/// An exclusively-owned read position over a byte slice
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of a buffer
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_exact(1)?;
        Ok(bytes[0])
    }

    /// Read exactly `n` bytes; a short buffer is an end-of-input error
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                requested: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}
