//! Strict DAG-CBOR decoding
//!
//! Split like the wire format itself: [`head`] reads one type tag and its
//! argument, [`value`] builds complete value trees on top of it.

mod head;
mod value;

pub use head::{read_head, Atom, MajorType};
pub use value::{decode_value, Value};
