//! Binary stream encoding for built grids and mesh tables.
//!
//! All multi-byte values are **big-endian**.
//!
//! ```text
//! i32 / u32 / f32 : 4 bytes
//! u8             : 1 byte
//! Vec3           : f32 x, f32 y, f32 z
//! string         : u32 byte length, then UTF-8 bytes
//! ```

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::foundation::math::Vec3;

/// Stream encoding and decoding errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// Underlying reader or writer failed (including a truncated stream)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes were read but do not describe a valid value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A stored index points past the end of its table
    #[error("{kind} index {index} out of range (table holds {len})")]
    IndexOutOfRange {
        /// What the index refers to
        kind: &'static str,
        /// The offending index
        index: i64,
        /// Size of the referenced table
        len: usize,
    },
}

/// Most elements reserved up front from a count read off a stream
const MAX_PREALLOCATION: usize = 4096;

/// Capacity to reserve for `count` elements announced by a stream
///
/// Counts come from untrusted input, so the reservation is capped and the
/// collection grows as elements actually arrive.
pub fn capacity_hint(count: usize) -> usize {
    count.min(MAX_PREALLOCATION)
}

/// Reads big-endian values from any [`Read`]
pub struct StreamReader<R> {
    inner: R,
}

impl<R: Read> StreamReader<R> {
    /// Wrap a reader
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap the reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a signed 32-bit integer
    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Read an unsigned 32-bit integer
    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read a 32-bit float
    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Read three floats as a vector
    pub fn read_vec3(&mut self) -> Result<Vec3, StreamError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read a count stored as i32, rejecting negative values
    pub fn read_count(&mut self, what: &str) -> Result<usize, StreamError> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| StreamError::InvalidData(format!("negative {what} count {count}")))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let len = self.read_u32()? as usize;
        let mut bytes = Vec::with_capacity(capacity_hint(len));
        self.inner.by_ref().take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(bytes).map_err(|e| StreamError::InvalidData(e.to_string()))
    }
}

/// Writes big-endian values to any [`Write`]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    /// Wrap a writer
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write one byte
    pub fn write_u8(&mut self, value: u8) -> Result<(), StreamError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    /// Write a signed 32-bit integer
    pub fn write_i32(&mut self, value: i32) -> Result<(), StreamError> {
        self.inner.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write an unsigned 32-bit integer
    pub fn write_u32(&mut self, value: u32) -> Result<(), StreamError> {
        self.inner.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a 32-bit float
    pub fn write_f32(&mut self, value: f32) -> Result<(), StreamError> {
        self.inner.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a vector as three floats
    pub fn write_vec3(&mut self, value: &Vec3) -> Result<(), StreamError> {
        self.write_f32(value.x)?;
        self.write_f32(value.y)?;
        self.write_f32(value.z)
    }

    /// Write a count as i32
    pub fn write_count(&mut self, count: usize) -> Result<(), StreamError> {
        let count = i32::try_from(count)
            .map_err(|_| StreamError::InvalidData(format!("count {count} exceeds i32")))?;
        self.write_i32(count)
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        let len = u32::try_from(value.len())
            .map_err(|_| StreamError::InvalidData("string longer than u32::MAX".to_string()))?;
        self.write_u32(len)?;
        self.inner.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_big_endian() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_i32(1).unwrap();
        writer.write_f32(1.0).unwrap();
        let bytes = writer.into_inner();

        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[0x3F, 0x80, 0, 0]);
    }

    #[test]
    fn test_mixed_sequence_reads_back() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_string("terrain").unwrap();
        writer.write_vec3(&Vec3::new(1.5, -2.0, 3.25)).unwrap();
        writer.write_u8(7).unwrap();
        writer.write_count(42).unwrap();
        let bytes = writer.into_inner();

        let mut reader = StreamReader::new(bytes.as_slice());
        assert_eq!(reader.read_string().unwrap(), "terrain");
        assert_eq!(reader.read_vec3().unwrap(), Vec3::new(1.5, -2.0, 3.25));
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_count("cell").unwrap(), 42);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let bytes = (-3i32).to_be_bytes();
        let mut reader = StreamReader::new(&bytes[..]);
        assert!(matches!(reader.read_count("vertex"), Err(StreamError::InvalidData(_))));
    }

    #[test]
    fn test_string_longer_than_stream_is_io_error() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_u32(u32::MAX).unwrap();
        writer.write_u8(b'a').unwrap();
        let bytes = writer.into_inner();

        let mut reader = StreamReader::new(bytes.as_slice());
        assert!(matches!(reader.read_string(), Err(StreamError::Io(_))));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let bytes = [0u8, 1];
        let mut reader = StreamReader::new(&bytes[..]);
        assert!(matches!(reader.read_f32(), Err(StreamError::Io(_))));
    }
}
