//! Bit-level building blocks shared by every consent string version.
//!
//! [`BitBuffer`] owns the raw bytes of a consent string and gives random access to the bits
//! they contain. The [`DataRead`] trait adds the consent-specific value types on top of any
//! [`BitRead`] implementation.
//!
use bitstream_io::BitRead;
use std::collections::BTreeSet;
use std::io;
use std::iter::repeat_with;

pub mod base64;
mod bit_buffer;

pub use bit_buffer::{BitBuffer, BitBufferError};

/// Ordered set of 1-indexed purpose ids.
pub type IdSet = BTreeSet<u16>;

/// Location of a fixed-width field inside a bit string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Field {
    /// Offset of the most significant bit of the field.
    pub offset: usize,
    /// Width of the field, in bits.
    pub width: u32,
}

impl Field {
    pub const fn new(offset: usize, width: u32) -> Self {
        Self { offset, width }
    }

    /// Field of the given width starting right where `previous` ends.
    pub const fn after(previous: Field, width: u32) -> Self {
        Self::new(previous.end(), width)
    }

    /// Offset of the first bit following this field.
    pub const fn end(&self) -> usize {
        self.offset + self.width as usize
    }
}

pub trait DataRead {
    /// Reads `chars` characters of 6 bits each, `0` being `A`.
    fn read_string(&mut self, chars: usize) -> io::Result<String>;

    /// Reads a count of deciseconds and converts it to milliseconds.
    fn read_deciseconds_as_millis(&mut self, bits: u32) -> io::Result<u64>;

    /// Reads `bits` flags and returns the 1-indexed positions of those which are set.
    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<IdSet>;
}

impl<T> DataRead for T
where
    T: BitRead,
{
    fn read_string(&mut self, chars: usize) -> io::Result<String> {
        repeat_with(|| self.read_unsigned::<6, u8>())
            .take(chars)
            .map(|r| r.map(|n| (n + b'A') as char))
            .collect::<Result<String, _>>()
    }

    fn read_deciseconds_as_millis(&mut self, bits: u32) -> io::Result<u64> {
        Ok(self.read_unsigned_var::<u64>(bits)? * 100)
    }

    fn read_fixed_bitfield(&mut self, bits: usize) -> io::Result<IdSet> {
        let mut result = BTreeSet::new();
        for i in 1..=bits {
            let b = self.read_bit()?;
            if b {
                result.insert(i as u16);
            }
        }

        Ok(result)
    }
}

/// Transform a string of literal binary digits into a vector of bytes.
/// Zeroes will be appended to fill missing bits.
#[cfg(test)]
pub(crate) fn b(s: &str) -> Vec<u8> {
    let chars = s
        .chars()
        .filter(|&c| c == '1' || c == '0')
        .collect::<Vec<_>>();
    chars
        .chunks(8)
        .map(|c| (8 - c.len(), String::from_iter(c)))
        .map(|(l, s)| u8::from_str_radix(&s, 2).map(|n| n << l))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or(vec![])
}
