//! Primitive encoding shared by every ballot record.
//!
//! All integers are big-endian and 32 bits wide. Values occupy the range
//! `[0, 2^31)`; a first byte with its top bit set marks the reserved null
//! sentinel, which must then be exactly `FF FF FF FF`. Sequences and strings
//! carry a count prefix, and strings are restricted to printable ASCII.
//!
//! Records are built from these primitives through the [`Wire`] trait, which
//! is derived for structs with named fields (fields travel in declaration
//! order). Decoding pulls bytes from a [`Source`], letting each loader decide
//! how bytes are fetched and what error type a short read produces.

use alloc::{string::String, vec::Vec};
use core::ops::RangeInclusive;

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::byteorder::{BigEndian, U32};

/// Derive [`Wire`] for a struct with named fields.
///
/// The generated implementation decodes and encodes each field in declaration
/// order, and expects `Wire`, `Source` and `Vec` to be in scope.
pub use kiosk_ballot_derive::Wire;

/// Encoding of a null reference.
pub const NULL: [u8; 4] = [0xFF; 4];

/// Longest permitted text string, in bytes.
pub const TEXT_CAP: usize = 50;

/// Bytes permitted in text strings.
pub const PRINTABLE: RangeInclusive<u8> = 32..=125;

/// A malformed primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Found the null sentinel where a value is required.
    #[error("Found a null reference where a value is required.")]
    UnexpectedNull,
    /// Top bit set, but not the exact null sentinel.
    #[error("Malformed null sentinel ({0:#010x}).")]
    BadSentinel(u32),
    /// Enumeration value outside its cardinality.
    #[error("Enumeration value {value} is not below {cardinality}.")]
    EnumOutOfRange { value: u32, cardinality: u32 },
    /// String longer than its context permits.
    #[error("String of {len} bytes exceeds the limit of {cap}.")]
    StringTooLong { len: u32, cap: usize },
    /// Byte outside the printable range in a string.
    #[error("Non-printable byte ({0}) in string.")]
    NotPrintable(u8),
    /// A payload length that cannot be addressed.
    #[error("Payload length overflows the address space.")]
    Oversize,
}

/// A supply of bytes to decode from.
pub trait Source {
    /// The error produced by this source, able to carry a format error.
    type Error: From<Error>;

    /// Take an exact number of bytes.
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Self::Error>;

    /// Take a run of `len` bytes.
    fn take_vec(&mut self, len: usize) -> Result<Vec<u8>, Self::Error>;
}

/// A value with a fixed position in the ballot encoding.
pub trait Wire: Sized {
    /// Decode a value from a source.
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error>;

    /// Append the encoding of this value to a buffer.
    fn encode(&self, w: &mut Vec<u8>);
}

bitfield! {
    struct Lead(u8) {
        [7] is_null,
    }
}

/// Read an integer, or `None` for the null sentinel when `allow_null` is set.
pub fn read_u32<S: Source>(s: &mut S, allow_null: bool) -> Result<Option<u32>, S::Error> {
    let r = s.take::<4>()?;

    if !Lead(r[0]).is_null() {
        return Ok(Some(U32::<BigEndian>::from_bytes(r).get()));
    }

    if r != NULL {
        Err(Error::BadSentinel(u32::from_be_bytes(r)))?;
    }
    if !allow_null {
        Err(Error::UnexpectedNull)?;
    }

    Ok(None)
}

/// Read a non-null integer below `cardinality`.
pub fn read_enum<S: Source>(s: &mut S, cardinality: u32) -> Result<u32, S::Error> {
    let value = u32::decode(s)?;

    if value >= cardinality {
        Err(Error::EnumOutOfRange { value, cardinality })?;
    }

    Ok(value)
}

/// Read a printable string of at most `cap` bytes.
pub fn read_string<S: Source>(s: &mut S, cap: usize) -> Result<String, S::Error> {
    let len = u32::decode(s)?;

    if len as usize > cap {
        Err(Error::StringTooLong { len, cap })?;
    }

    let bytes = s.take_vec(len as usize)?;
    if let Some(&b) = bytes.iter().find(|&&b| !PRINTABLE.contains(&b)) {
        Err(Error::NotPrintable(b))?;
    }

    Ok(bytes.into_iter().map(char::from).collect())
}

/// Read a count, then that many values in order.
pub fn read_sequence<S: Source, T: Wire>(s: &mut S) -> Result<Vec<T>, S::Error> {
    let count = u32::decode(s)?;

    let mut items = Vec::new();
    for _ in 0..count {
        items.push(T::decode(s)?);
    }

    Ok(items)
}

/// Read a run of `count * width` raw bytes.
pub fn read_raw<S: Source>(s: &mut S, count: u32, width: u32) -> Result<Vec<u8>, S::Error> {
    let len = usize::try_from(u64::from(count) * u64::from(width)).map_err(|_| Error::Oversize)?;
    s.take_vec(len)
}

/// Append an integer, or the null sentinel for `None`.
pub fn write_u32(w: &mut Vec<u8>, value: Option<u32>) {
    match value {
        Some(value) => w.extend_from_slice(&U32::<BigEndian>::new(value).to_bytes()),
        None => w.extend_from_slice(&NULL),
    }
}

impl Wire for u32 {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        match read_u32(s, false)? {
            Some(value) => Ok(value),
            None => Err(Error::UnexpectedNull.into()),
        }
    }

    fn encode(&self, w: &mut Vec<u8>) {
        write_u32(w, Some(*self));
    }
}

impl Wire for Option<u32> {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        read_u32(s, true)
    }

    fn encode(&self, w: &mut Vec<u8>) {
        write_u32(w, *self);
    }
}

/// Flags travel as a two-valued enumeration.
impl Wire for bool {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        Ok(read_enum(s, 2)? == 1)
    }

    fn encode(&self, w: &mut Vec<u8>) {
        write_u32(w, Some(u32::from(*self)));
    }
}

/// Strings in a ballot are display text, capped at [`TEXT_CAP`].
impl Wire for String {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        read_string(s, TEXT_CAP)
    }

    fn encode(&self, w: &mut Vec<u8>) {
        write_u32(w, Some(self.len() as u32));
        w.extend_from_slice(self.as_bytes());
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        read_sequence(s)
    }

    fn encode(&self, w: &mut Vec<u8>) {
        write_u32(w, Some(self.len() as u32));
        for item in self {
            item.encode(w);
        }
    }
}
