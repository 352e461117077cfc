//! CBOR head decoding
//!
//! A head is one initial byte (3 bits of major type, 5 bits of additional
//! info) plus up to 8 argument bytes. The argument is a value for integer
//! and float types and a length or count for everything else.
//!
//! This decoder is strict: indefinite lengths are rejected outright, and
//! integer arguments encoded with more bytes than necessary are rejected as
//! non-canonical. Content addressing makes the second rule load-bearing:
//! two encodings of the same value would hash to different CIDs.

use crate::cursor::Cursor;
use crate::{Error, Result};

/// The eight CBOR major types, from the top 3 bits of the initial byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MajorType {
    UnsignedInt,
    NegativeInt,
    ByteString,
    TextString,
    Array,
    Map,
    Tag,
    Simple,
}

impl MajorType {
    fn from_initial_byte(byte: u8) -> Self {
        match byte >> 5 {
            0 => MajorType::UnsignedInt,
            1 => MajorType::NegativeInt,
            2 => MajorType::ByteString,
            3 => MajorType::TextString,
            4 => MajorType::Array,
            5 => MajorType::Map,
            6 => MajorType::Tag,
            _ => MajorType::Simple,
        }
    }
}

/// The decoded argument of a head
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Atom {
    /// Unsigned value, or length/count/tag-number for the container types
    Uint(u64),
    /// Fully decoded negative integer (`-1 - n`)
    Int(i64),
    Bool(bool),
    Null,
    /// Half/single/double precision, promoted to f64
    Float(f64),
}

/// Read one head from the cursor, returning the major type and its argument
pub fn read_head(cursor: &mut Cursor<'_>) -> Result<(MajorType, Atom)> {
    let initial = cursor.read_u8()?;
    let major = MajorType::from_initial_byte(initial);
    let info = initial & 0x1f;

    if info < 24 {
        if major == MajorType::Simple {
            return match info {
                20 => Ok((major, Atom::Bool(false))),
                21 => Ok((major, Atom::Bool(true))),
                22 => Ok((major, Atom::Null)),
                other => Err(Error::Malformed(format!(
                    "unsupported simple value {other}"
                ))),
            };
        }
        return Ok((major, Atom::Uint(u64::from(info))));
    }

    let arg_len = match info {
        24 => 1,
        25 => 2,
        26 => 4,
        27 => 8,
        31 => return Err(Error::IndefiniteLength),
        _ => return Err(Error::Malformed("not well-formed".into())),
    };

    let bytes = cursor.read_exact(arg_len)?;

    if major == MajorType::Simple {
        let float = match arg_len {
            1 => {
                return Err(Error::Malformed(
                    "one-byte simple argument is not supported".into(),
                ))
            }
            2 => half_to_f64(u16::from_be_bytes([bytes[0], bytes[1]])),
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                f64::from(f32::from_be_bytes(buf))
            }
            _ => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                f64::from_be_bytes(buf)
            }
        };
        return Ok((major, Atom::Float(float)));
    }

    let mut value: u64 = 0;
    for &b in bytes {
        value = value << 8 | u64::from(b);
    }

    // Canonical form: the argument must not fit in a shorter encoding
    let minimal = match arg_len {
        1 => value >= 24,
        2 => value > u64::from(u8::MAX),
        4 => value > u64::from(u16::MAX),
        _ => value > u64::from(u32::MAX),
    };
    if !minimal {
        return Err(Error::Malformed(format!(
            "non-minimal integer encoding of {value}"
        )));
    }

    if major == MajorType::NegativeInt {
        let n = i64::try_from(value)
            .map_err(|_| Error::Malformed(format!("negative integer -1-{value} out of range")))?;
        return Ok((major, Atom::Int(-1 - n)));
    }

    Ok((major, Atom::Uint(value)))
}

/// Promote an IEEE-754 half-precision value to f64
fn half_to_f64(bits: u16) -> f64 {
    let exp = (bits >> 10) & 0x1f;
    let mantissa = f64::from(bits & 0x3ff);
    let magnitude = match exp {
        0 => mantissa * 2f64.powi(-24),
        31 => {
            if mantissa == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (mantissa + 1024.0) * 2f64.powi(i32::from(exp) - 25),
    };
    if bits & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}
