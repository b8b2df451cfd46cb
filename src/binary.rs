//! Binary reading utilities for parsing Generals replay files.
//!
//! This module provides [`BitReader`], a thin wrapper over any sequential
//! byte source that reads little-endian integers, IEEE-754 floats,
//! fixed-length strings, and null-terminated strings in UTF-8 or
//! UTF-16LE. All reads perform bounds checking and return appropriate
//! errors for truncated or malformed data; none of them panic.
//!
//! # Endianness
//!
//! The replay format uses little-endian byte order for every multi-byte
//! integer. The functions in this module handle the conversion
//! automatically.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use genrep_parser::binary::BitReader;
//!
//! let data = [0x4B, 0xA3, 0x57, 0x62, b'H', b'i'];
//! let mut reader = BitReader::new(Cursor::new(data));
//!
//! // Read a little-endian u32
//! assert_eq!(reader.read_u32().unwrap(), 1_649_910_603);
//!
//! // Read a fixed-length string
//! assert_eq!(reader.read_string(2).unwrap(), "Hi");
//! ```

use std::io::Read;
use std::str::FromStr;

use crate::error::{ParserError, Result, MAX_READ_LEN};

/// Character encodings accepted by [`BitReader::read_null_terminated`].
///
/// The replay header mixes both: file name, version, and build date are
/// UTF-16LE; the trailing metadata string is UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One byte per code unit.
    Utf8,
    /// Two bytes per code unit, little-endian.
    ///
    /// Only the low byte of each unit is kept — the game writes Latin-1
    /// content into these fields, and observed fixtures depend on this
    /// exact downcast.
    Utf16Le,
}

impl Encoding {
    /// Size of one code unit in bytes.
    #[must_use]
    pub fn unit_size(self) -> usize {
        match self {
            Encoding::Utf8 => 1,
            Encoding::Utf16Le => 2,
        }
    }
}

impl FromStr for Encoding {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "utf8" => Ok(Encoding::Utf8),
            "utf16le" | "utf16" => Ok(Encoding::Utf16Le),
            other => Err(ParserError::UnsupportedEncoding {
                name: other.to_string(),
            }),
        }
    }
}

/// Sequential binary reader over any [`Read`] source.
///
/// Unlike slice-based readers, `BitReader` advances strictly by the
/// sizes it reads — the replay format has no framing, so the cursor
/// position after each field *is* the position of the next field.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use genrep_parser::binary::{BitReader, Encoding};
///
/// let data = [b'G', b'E', b'N', b'R', b'E', b'P', 0x01, 0x00];
/// let mut reader = BitReader::new(Cursor::new(data));
/// assert_eq!(reader.read_string(6).unwrap(), "GENREP");
/// assert_eq!(reader.read_u16().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct BitReader<R> {
    source: R,
}

impl<R: Read> BitReader<R> {
    /// Creates a new reader over the given source.
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Reads exactly `size` bytes from the source.
    ///
    /// # Errors
    ///
    /// - [`ParserError::InvalidSize`] if `size` exceeds 1 MiB
    /// - [`ParserError::ShortRead`] if the source ends early; the error
    ///   reports how many bytes were actually available
    /// - [`ParserError::Io`] for underlying source failures
    pub fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>> {
        if size > MAX_READ_LEN {
            return Err(ParserError::invalid_size(size));
        }

        let mut buf = vec![0u8; size];
        read_full(&mut self.source, &mut buf)?;
        Ok(buf)
    }

    /// Reads `size` bytes and converts them to a string.
    ///
    /// Bytes are interpreted as UTF-8; invalid sequences are replaced
    /// with U+FFFD rather than failing, since fixed-width string fields
    /// in replay headers are plain ASCII in practice.
    ///
    /// # Errors
    ///
    /// Same as [`BitReader::read_bytes`].
    pub fn read_string(&mut self, size: usize) -> Result<String> {
        let bytes = self.read_bytes(size)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads a little-endian u8.
    ///
    /// # Errors
    ///
    /// [`ParserError::ShortRead`] if the source is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Reads a little-endian u16.
    ///
    /// # Errors
    ///
    /// [`ParserError::ShortRead`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian u32.
    ///
    /// # Errors
    ///
    /// [`ParserError::ShortRead`] if fewer than 4 bytes remain.
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::Cursor;
    /// use genrep_parser::binary::BitReader;
    ///
    /// let mut reader = BitReader::new(Cursor::new([0x78, 0x56, 0x34, 0x12]));
    /// assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
    /// ```
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian IEEE-754 f32.
    ///
    /// # Errors
    ///
    /// [`ParserError::ShortRead`] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads one byte as a boolean: nonzero → `true`.
    ///
    /// # Errors
    ///
    /// [`ParserError::ShortRead`] if the source is exhausted.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a null-terminated string in the given encoding.
    ///
    /// Code units are consumed one at a time (1 byte for UTF-8, 2 bytes
    /// for UTF-16LE) until a unit of all zero bytes is found. The
    /// terminator is consumed but not included in the result. For
    /// UTF-16LE only the low byte of each unit is kept (see
    /// [`Encoding::Utf16Le`]).
    ///
    /// # Errors
    ///
    /// - [`ParserError::StringTooLong`] after 1 MiB without a terminator
    /// - [`ParserError::TruncatedString`] if the source ends before the
    ///   terminator; the error carries the partial string accumulated so
    ///   far, which callers may choose to keep
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::Cursor;
    /// use genrep_parser::binary::{BitReader, Encoding};
    ///
    /// let data = [76, 0, 97, 0, 115, 0, 116, 0, 0, 0];
    /// let mut reader = BitReader::new(Cursor::new(data));
    /// let s = reader.read_null_terminated(Encoding::Utf16Le).unwrap();
    /// assert_eq!(s, "Last");
    /// ```
    pub fn read_null_terminated(&mut self, encoding: Encoding) -> Result<String> {
        let unit_size = encoding.unit_size();
        let mut out = Vec::new();
        let mut bytes_read = 0usize;
        let mut unit = [0u8; 2];

        loop {
            if bytes_read > MAX_READ_LEN {
                return Err(ParserError::StringTooLong {
                    len: bytes_read,
                    max: MAX_READ_LEN,
                });
            }

            let unit = &mut unit[..unit_size];
            if read_full(&mut self.source, unit).is_err() {
                return Err(ParserError::TruncatedString {
                    partial: String::from_utf8_lossy(&out).into_owned(),
                });
            }

            if unit.iter().all(|&b| b == 0) {
                break;
            }

            // Low byte only; high byte of a UTF-16 unit is dropped.
            out.push(unit[0]);
            bytes_read += unit_size;
        }

        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Reads exactly `buf.len()` bytes or reports how many were available.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => return Err(ParserError::short_read(buf.len(), filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(ParserError::Io(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(data: &[u8]) -> BitReader<Cursor<Vec<u8>>> {
        BitReader::new(Cursor::new(data.to_vec()))
    }

    // ========================
    // read_u16 / read_u32 tests
    // ========================

    #[test]
    fn test_read_u16_basic() {
        assert_eq!(reader(&[0x34, 0x12]).read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u16_sequence() {
        let mut r = reader(&[0x34, 0x12, 0xFF, 0xFF]);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_u16().unwrap(), 0xFFFF);
    }

    #[test]
    fn test_read_u16_short() {
        let result = reader(&[0x34]).read_u16();
        assert!(matches!(
            result,
            Err(ParserError::ShortRead { wanted: 2, got: 1 })
        ));
    }

    #[test]
    fn test_read_u32_basic() {
        assert_eq!(
            reader(&[0x78, 0x56, 0x34, 0x12]).read_u32().unwrap(),
            0x1234_5678
        );
    }

    #[test]
    fn test_read_u32_epoch_timestamp() {
        // 2022-04-14 05:10:03 UTC stored little-endian
        assert_eq!(
            reader(&[75, 163, 87, 98]).read_u32().unwrap(),
            1_649_910_603
        );
    }

    #[test]
    fn test_read_u32_roundtrip_extremes() {
        for value in [0u32, 1, 0x7FFF_FFFF, u32::MAX] {
            let mut r = reader(&value.to_le_bytes());
            assert_eq!(r.read_u32().unwrap(), value);
        }
    }

    #[test]
    fn test_read_u8_u16_exhaustive_roundtrip() {
        for value in u8::MIN..=u8::MAX {
            assert_eq!(reader(&[value]).read_u8().unwrap(), value);
        }
        for value in u16::MIN..=u16::MAX {
            assert_eq!(reader(&value.to_le_bytes()).read_u16().unwrap(), value);
        }
    }

    #[test]
    fn test_read_u32_short() {
        let result = reader(&[0x78, 0x56, 0x34]).read_u32();
        assert!(matches!(
            result,
            Err(ParserError::ShortRead { wanted: 4, got: 3 })
        ));
    }

    #[test]
    fn test_read_u8_empty() {
        let result = reader(&[]).read_u8();
        assert!(matches!(result, Err(ParserError::ShortRead { .. })));
    }

    // ========================
    // read_f32 / read_bool tests
    // ========================

    #[test]
    fn test_read_f32_bit_exact() {
        for value in [0.0f32, -1.5, 1024.25, f32::MIN_POSITIVE] {
            let mut r = reader(&value.to_le_bytes());
            assert_eq!(r.read_f32().unwrap().to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_read_bool() {
        let mut r = reader(&[0, 1, 0xFF]);
        assert!(!r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
    }

    // ========================
    // read_bytes / read_string tests
    // ========================

    #[test]
    fn test_read_bytes_basic() {
        let mut r = reader(b"GENREP\x01\x00");
        assert_eq!(r.read_bytes(6).unwrap(), b"GENREP");
    }

    #[test]
    fn test_read_bytes_zero_length() {
        assert_eq!(reader(b"GENREP").read_bytes(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_read_bytes_too_large() {
        let result = reader(&[]).read_bytes(MAX_READ_LEN + 1);
        assert!(matches!(result, Err(ParserError::InvalidSize { .. })));
    }

    #[test]
    fn test_read_bytes_reports_partial_count() {
        let result = reader(&[1, 2, 3]).read_bytes(8);
        assert!(matches!(
            result,
            Err(ParserError::ShortRead { wanted: 8, got: 3 })
        ));
    }

    #[test]
    fn test_read_string_basic() {
        let data = [76, 97, 115, 116, 32, 82, 101, 112, 108, 97, 121];
        assert_eq!(reader(&data).read_string(11).unwrap(), "Last Replay");
    }

    #[test]
    fn test_read_string_keeps_embedded_nulls() {
        let data = [76, 97, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            reader(&data).read_string(10).unwrap(),
            "La\0\0\0\0\0\0\0\0"
        );
    }

    // ========================
    // read_null_terminated tests
    // ========================

    #[test]
    fn test_null_terminated_utf16_full() {
        // "Last Replay" followed by a full two-byte terminator
        let data = [
            76, 0, 97, 0, 115, 0, 116, 0, 32, 0, 82, 0, 101, 0, 112, 0, 108, 0, 97, 0, 121, 0, 0,
            0,
        ];
        let mut r = reader(&data);
        assert_eq!(
            r.read_null_terminated(Encoding::Utf16Le).unwrap(),
            "Last Replay"
        );
        // All 24 bytes were consumed, including the terminator.
        let result = r.read_u8();
        assert!(matches!(result, Err(ParserError::ShortRead { .. })));
    }

    #[test]
    fn test_null_terminated_utf16_stops_at_terminator() {
        let data = [
            76, 0, 97, 0, 115, 0, 116, 0, 32, 0, 82, 0, 101, 0, 112, 0, 108, 0, 97, 0, 121, 0, 0,
            0, 76, 0, 97, 0,
        ];
        let mut r = reader(&data);
        assert_eq!(
            r.read_null_terminated(Encoding::Utf16Le).unwrap(),
            "Last Replay"
        );
        // Bytes past the terminator stay available.
        assert_eq!(r.read_u8().unwrap(), 76);
    }

    #[test]
    fn test_null_terminated_utf8() {
        let data = [76, 97, 115, 116, 32, 82, 101, 112, 108, 97, 121, 0, 0];
        let mut r = reader(&data);
        assert_eq!(
            r.read_null_terminated(Encoding::Utf8).unwrap(),
            "Last Replay"
        );
    }

    #[test]
    fn test_null_terminated_empty_string() {
        let mut r = reader(&[0, 0, 42]);
        assert_eq!(r.read_null_terminated(Encoding::Utf16Le).unwrap(), "");
    }

    #[test]
    fn test_null_terminated_truncation_keeps_partial() {
        // No terminator before the data runs out
        let data = [76, 97, 115, 116];
        let result = reader(&data).read_null_terminated(Encoding::Utf8);
        match result {
            Err(ParserError::TruncatedString { partial }) => assert_eq!(partial, "Last"),
            other => panic!("Expected TruncatedString, got {other:?}"),
        }
    }

    #[test]
    fn test_null_terminated_utf16_odd_tail() {
        // A dangling single byte can't form a UTF-16 unit
        let data = [76, 0, 97];
        let result = reader(&data).read_null_terminated(Encoding::Utf16Le);
        match result {
            Err(ParserError::TruncatedString { partial }) => assert_eq!(partial, "L"),
            other => panic!("Expected TruncatedString, got {other:?}"),
        }
    }

    #[test]
    fn test_null_terminated_utf16_low_byte_only() {
        // High bytes are dropped: U+0141 comes out as 0x41 'A'
        let data = [0x41, 0x01, 0x42, 0x00, 0, 0];
        let mut r = reader(&data);
        assert_eq!(r.read_null_terminated(Encoding::Utf16Le).unwrap(), "AB");
    }

    #[test]
    fn test_null_terminated_length_limit() {
        // 1 MiB of 'a' with no terminator trips the safety cap
        let data = vec![b'a'; MAX_READ_LEN + 2];
        let result = reader(&data).read_null_terminated(Encoding::Utf8);
        assert!(matches!(result, Err(ParserError::StringTooLong { .. })));
    }

    // ========================
    // Encoding tests
    // ========================

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf16le".parse::<Encoding>().unwrap(), Encoding::Utf16Le);
        assert_eq!("utf16".parse::<Encoding>().unwrap(), Encoding::Utf16Le);

        let result = "latin1".parse::<Encoding>();
        assert!(matches!(
            result,
            Err(ParserError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_encoding_unit_size() {
        assert_eq!(Encoding::Utf8.unit_size(), 1);
        assert_eq!(Encoding::Utf16Le.unit_size(), 2);
    }
}
