//! Unsigned LEB128 varint decoding
//!
//! Block and header lengths in a CAR file are framed with little-endian
//! base-128 varints: each byte contributes its low 7 bits at the current
//! shift, and a set high bit means another byte follows.

use crate::cursor::Cursor;
use crate::{Error, Result};

/// A 64-bit value never needs more than 10 varint bytes; anything longer is
/// malformed rather than a hang on a hostile stream.
const MAX_VARINT_LEN: usize = 10;

/// Read one unsigned varint from the cursor
pub fn read_varint(cursor: &mut Cursor<'_>) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for _ in 0..MAX_VARINT_LEN {
        let byte = cursor.read_u8()?;
        let bits = u64::from(byte & 0x7f);
        // Reject bits that would shift off the top of a u64
        if bits << shift >> shift != bits {
            return Err(Error::MalformedVarint);
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(Error::MalformedVarint)
}
