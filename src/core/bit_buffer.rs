use crate::core::DataRead;
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io;
use thiserror::Error;

const MAX_WIDTH: u32 = u64::BITS;
const CHAR_WIDTH: u32 = 6;

/// The error type for out of contract accesses to a [`BitBuffer`].
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum BitBufferError {
    /// The accessed bits do not fit in the buffer.
    #[error("{width} bits at offset {offset} exceed buffer length of {bit_len} bits")]
    OutOfRange {
        offset: usize,
        width: u32,
        bit_len: usize,
    },
    /// Integers wider than 64 bits cannot be read or written.
    #[error("invalid field width {0} (at most {MAX_WIDTH} bits)")]
    InvalidWidth(u32),
    /// Six-bit strings only hold uppercase `A` to `Z`.
    #[error("invalid character {0:?} in six-bit string")]
    InvalidCharacter(char),
    #[error("invalid string length (expected {expected} characters, found {found})")]
    StringLength { expected: usize, found: usize },
}

/// Fixed-size byte storage addressed as a big-endian bit string.
///
/// Bit `0` is the most significant bit of byte `0`, bit `8` the most significant bit of byte
/// `1`, and so on. Every accessor checks that the bits it touches lie inside the buffer and
/// fails with [`BitBufferError::OutOfRange`] otherwise, leaving the buffer untouched.
///
/// Equality and hashing are those of the underlying bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BitBuffer {
    bytes: Vec<u8>,
}

impl BitBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Creates a zeroed buffer of the smallest number of bytes holding `bits` bits.
    pub fn with_bit_len(bits: usize) -> Self {
        Self::new(vec![0; bits.div_ceil(8)])
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn get_bit(&self, pos: usize) -> Result<bool, BitBufferError> {
        self.check(pos, 1)?;
        Ok(self.bytes[pos / 8] & bit_mask(pos) != 0)
    }

    pub fn set_bit(&mut self, pos: usize) -> Result<(), BitBufferError> {
        self.check(pos, 1)?;
        self.assign_bit(pos, true);
        Ok(())
    }

    pub fn clear_bit(&mut self, pos: usize) -> Result<(), BitBufferError> {
        self.check(pos, 1)?;
        self.assign_bit(pos, false);
        Ok(())
    }

    /// Reads a `width` bits unsigned integer, most significant bit first.
    pub fn get_uint(&self, offset: usize, width: u32) -> Result<u64, BitBufferError> {
        check_width(width)?;
        if width == 0 {
            self.check(offset, 0)?;
            return Ok(0);
        }

        self.read_with(offset, width, |r| r.read_unsigned_var::<u64>(width))
    }

    /// Writes the low `width` bits of `value`, most significant bit first.
    ///
    /// Higher bits of `value` are dropped and bits outside of the field are never modified.
    pub fn set_uint(&mut self, offset: usize, width: u32, value: u64) -> Result<(), BitBufferError> {
        check_width(width)?;
        self.check(offset, width)?;

        for i in 0..width {
            let bit = (value >> (width - 1 - i)) & 1 == 1;
            self.assign_bit(offset + i as usize, bit);
        }

        Ok(())
    }

    /// Reads a count of deciseconds since the Unix epoch, returned as milliseconds.
    pub fn get_timestamp_deciseconds(
        &self,
        offset: usize,
        width: u32,
    ) -> Result<u64, BitBufferError> {
        check_width(width)?;
        if width == 0 {
            self.check(offset, 0)?;
            return Ok(0);
        }

        self.read_with(offset, width, |r| r.read_deciseconds_as_millis(width))
    }

    /// Stores a millisecond timestamp as deciseconds since the Unix epoch.
    ///
    /// Sub-decisecond precision is truncated.
    pub fn set_timestamp_deciseconds(
        &mut self,
        offset: usize,
        width: u32,
        millis: u64,
    ) -> Result<(), BitBufferError> {
        self.set_uint(offset, width, millis / 100)
    }

    /// Reads `chars` characters of 6 bits each.
    pub fn get_six_bit_string(&self, offset: usize, chars: usize) -> Result<String, BitBufferError> {
        let width = string_width(chars);
        self.read_with(offset, width, |r| r.read_string(chars))
    }

    /// Writes exactly `chars` characters from `s`, which may only contain `A` to `Z`.
    ///
    /// The whole string is validated before any bit is written.
    pub fn set_six_bit_string(
        &mut self,
        offset: usize,
        chars: usize,
        s: &str,
    ) -> Result<(), BitBufferError> {
        let found = s.chars().count();
        if found != chars {
            return Err(BitBufferError::StringLength {
                expected: chars,
                found,
            });
        }
        self.check(offset, string_width(chars))?;

        let values = s
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    Ok(c as u8 - b'A')
                } else {
                    Err(BitBufferError::InvalidCharacter(c))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, value) in values.into_iter().enumerate() {
            let char_offset = offset + i * CHAR_WIDTH as usize;
            self.set_uint(char_offset, CHAR_WIDTH, value.into())?;
        }

        Ok(())
    }

    /// Returns a reader positioned on the first bit of a `width` bits region.
    pub fn reader_at(
        &self,
        offset: usize,
        width: u32,
    ) -> Result<BitReader<&[u8], BigEndian>, BitBufferError> {
        self.check(offset, width)?;
        let skip = u32::try_from(offset).map_err(|_| self.out_of_range(offset, width))?;

        let mut reader = BitReader::endian(self.bytes.as_slice(), BigEndian);
        reader
            .skip(skip)
            .map_err(|_| self.out_of_range(offset, width))?;

        Ok(reader)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn read_with<T, F>(&self, offset: usize, width: u32, f: F) -> Result<T, BitBufferError>
    where
        F: FnOnce(&mut BitReader<&[u8], BigEndian>) -> io::Result<T>,
    {
        let mut reader = self.reader_at(offset, width)?;
        f(&mut reader).map_err(|_| self.out_of_range(offset, width))
    }

    fn assign_bit(&mut self, pos: usize, value: bool) {
        if value {
            self.bytes[pos / 8] |= bit_mask(pos);
        } else {
            self.bytes[pos / 8] &= !bit_mask(pos);
        }
    }

    fn check(&self, offset: usize, width: u32) -> Result<(), BitBufferError> {
        match offset.checked_add(width as usize) {
            Some(end) if end <= self.bit_len() => Ok(()),
            _ => Err(self.out_of_range(offset, width)),
        }
    }

    fn out_of_range(&self, offset: usize, width: u32) -> BitBufferError {
        BitBufferError::OutOfRange {
            offset,
            width,
            bit_len: self.bit_len(),
        }
    }
}

impl From<Vec<u8>> for BitBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for BitBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn bit_mask(pos: usize) -> u8 {
    0x80 >> (pos % 8)
}

fn check_width(width: u32) -> Result<(), BitBufferError> {
    if width > MAX_WIDTH {
        return Err(BitBufferError::InvalidWidth(width));
    }
    Ok(())
}

fn string_width(chars: usize) -> u32 {
    u32::try_from(chars)
        .ok()
        .and_then(|n| n.checked_mul(CHAR_WIDTH))
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::b;
    use test_case::test_case;

    fn buf(s: &str) -> BitBuffer {
        BitBuffer::new(b(s))
    }

    #[test_case(0 => true)]
    #[test_case(1 => false)]
    #[test_case(2 => true)]
    #[test_case(7 => false)]
    #[test_case(8 => false)]
    #[test_case(15 => true)]
    fn get_bit(pos: usize) -> bool {
        buf("10100000 00000001").get_bit(pos).unwrap()
    }

    #[test]
    fn set_and_clear_bit_leave_other_bits_alone() {
        let mut bits = buf("00000000 11111111");

        bits.set_bit(3).unwrap();
        bits.clear_bit(12).unwrap();

        assert_eq!(bits, buf("00010000 11110111"));
    }

    #[test_case("00001111 11110000", 4, 8 => 255 ; "across byte boundary")]
    #[test_case("000001", 0, 6 => 1 ; "version field")]
    #[test_case("10000000", 0, 1 => 1 ; "single bit")]
    #[test_case("11111111", 3, 0 => 0 ; "empty field")]
    #[test_case("11111111 11111111 11111111 11111111 11111111", 2, 36 => 0xF_FFFF_FFFF ; "36 bits")]
    fn get_uint(s: &str, offset: usize, width: u32) -> u64 {
        buf(s).get_uint(offset, width).unwrap()
    }

    #[test_case(4, 8, 255 => buf("00001111 11110000") ; "across byte boundary")]
    #[test_case(4, 4, 0x1F => buf("00001111 00000000") ; "truncated to width")]
    #[test_case(0, 16, 0x0102 => buf("00000001 00000010") ; "full bytes")]
    fn set_uint(offset: usize, width: u32, value: u64) -> BitBuffer {
        let mut bits = BitBuffer::with_bit_len(16);
        bits.set_uint(offset, width, value).unwrap();
        bits
    }

    #[test]
    fn set_uint_overwrites_only_its_field() {
        let mut bits = buf("11111111 11111111");

        bits.set_uint(4, 6, 0).unwrap();

        assert_eq!(bits, buf("11110000 00111111"));
    }

    #[test_case(16, 1 ; "past the end")]
    #[test_case(10, 7 ; "overlapping the end")]
    #[test_case(usize::MAX, 2 ; "overflowing offset")]
    fn get_uint_out_of_range(offset: usize, width: u32) {
        let bits = BitBuffer::with_bit_len(16);

        assert_eq!(
            bits.get_uint(offset, width).unwrap_err(),
            BitBufferError::OutOfRange {
                offset,
                width,
                bit_len: 16
            }
        );
    }

    #[test]
    fn out_of_range_writes_do_not_modify_buffer() {
        let mut bits = buf("10101010");

        assert!(matches!(
            bits.set_uint(4, 8, 0),
            Err(BitBufferError::OutOfRange { .. })
        ));
        assert!(matches!(
            bits.set_bit(8),
            Err(BitBufferError::OutOfRange { .. })
        ));
        assert_eq!(bits, buf("10101010"));
    }

    #[test]
    fn width_limit() {
        let bits = BitBuffer::with_bit_len(128);

        assert_eq!(bits.get_uint(0, 64).unwrap(), 0);
        assert_eq!(
            bits.get_uint(0, 65).unwrap_err(),
            BitBufferError::InvalidWidth(65)
        );
    }

    #[test_case(1562488450700 => 1562488450700 ; "aligned")]
    #[test_case(1562488450799 => 1562488450700 ; "truncated")]
    #[test_case(0 => 0 ; "epoch")]
    fn timestamp(millis: u64) -> u64 {
        let mut bits = BitBuffer::with_bit_len(48);
        bits.set_timestamp_deciseconds(6, 36, millis).unwrap();
        bits.get_timestamp_deciseconds(6, 36).unwrap()
    }

    #[test]
    fn six_bit_string() {
        let mut bits = BitBuffer::with_bit_len(16);

        bits.set_six_bit_string(2, 2, "EN").unwrap();

        assert_eq!(bits, buf("00 000100 001101 00"));
        assert_eq!(bits.get_six_bit_string(2, 2).unwrap(), "EN");
    }

    #[test_case("eN" => BitBufferError::InvalidCharacter('e') ; "lowercase")]
    #[test_case("E1" => BitBufferError::InvalidCharacter('1') ; "digit")]
    #[test_case("ENG" => BitBufferError::StringLength { expected: 2, found: 3 } ; "too long")]
    fn six_bit_string_error(s: &str) -> BitBufferError {
        let mut bits = BitBuffer::with_bit_len(16);
        let err = bits.set_six_bit_string(0, 2, s).unwrap_err();
        assert_eq!(bits, BitBuffer::with_bit_len(16));
        err
    }

    #[test_case(0 => 0)]
    #[test_case(1 => 1)]
    #[test_case(174 => 22)]
    #[test_case(179 => 23)]
    #[test_case(176 => 22)]
    fn with_bit_len(bits: usize) -> usize {
        BitBuffer::with_bit_len(bits).as_bytes().len()
    }
}
