//! Caller buffers handed to file operations.
//!
//! A read fills a [`UserSliceWriter`], a write drains a [`UserSliceReader`].
//! Both track how much of the caller's buffer is left and fail with
//! [`EFAULT`] instead of running past its end.

use alloc::vec::Vec;

use crate::{code::EFAULT, error::KernelResult as Result};

/// A reader over the caller's buffer for a write operation.
///
/// Used to incrementally read from the caller's data.
pub struct UserSliceReader<'a> {
    data: &'a [u8],
}

impl<'a> UserSliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Skip the provided number of bytes.
    ///
    /// Returns an error if skipping more than the length of the buffer.
    pub fn skip(&mut self, num_skip: usize) -> Result {
        if num_skip > self.data.len() {
            return Err(EFAULT);
        }
        self.data = &self.data[num_skip..];
        Ok(())
    }

    /// Create a reader that can access the same range of data.
    ///
    /// Reading from the clone does not advance the current reader.
    pub fn clone_reader(&self) -> UserSliceReader<'a> {
        UserSliceReader { data: self.data }
    }

    /// Returns the number of bytes left to be read from this reader.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no data is available in the io buffer.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reads exactly `out.len()` bytes.
    ///
    /// Fails with [`EFAULT`] if the read goes out of bounds of this reader, in
    /// which case nothing is consumed.
    pub fn read_slice(&mut self, out: &mut [u8]) -> Result {
        let len = out.len();
        if len > self.data.len() {
            return Err(EFAULT);
        }
        out.copy_from_slice(&self.data[..len]);
        self.data = &self.data[len..];
        Ok(())
    }

    /// Reads the entirety of the remaining data, appending it to `buf`.
    pub fn read_all(self, buf: &mut Vec<u8>) -> Result {
        buf.try_reserve(self.data.len())?;
        buf.extend_from_slice(self.data);
        Ok(())
    }
}

/// A writer over the caller's buffer for a read operation.
pub struct UserSliceWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> UserSliceWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the amount of space left in the caller's buffer.
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if no more data can be written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Writes all of `data`.
    ///
    /// Fails with [`EFAULT`] without writing anything if `data` does not fit.
    pub fn write_slice(&mut self, data: &[u8]) -> Result {
        if data.len() > self.len() {
            return Err(EFAULT);
        }
        self.data[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_consumes_in_order() {
        let src = [1u8, 2, 3, 4, 5];
        let mut reader = UserSliceReader::new(&src);
        let mut out = [0u8; 2];
        reader.read_slice(&mut out).unwrap();
        assert_eq!(out, [1u8, 2]);
        reader.skip(1).unwrap();
        assert_eq!(reader.len(), 2);

        let peek = reader.clone_reader();
        let mut rest = Vec::new();
        reader.read_all(&mut rest).unwrap();
        assert_eq!(rest, [4u8, 5]);
        assert_eq!(peek.len(), 2);
    }

    #[test]
    fn reader_rejects_overrun() {
        let src = [0u8; 3];
        let mut reader = UserSliceReader::new(&src);
        let mut out = [0u8; 4];
        assert_eq!(reader.read_slice(&mut out), Err(EFAULT));
        assert_eq!(reader.skip(4), Err(EFAULT));
        assert_eq!(reader.len(), 3);
    }

    #[test]
    fn writer_tracks_position() {
        let mut dst = [0u8; 4];
        let mut writer = UserSliceWriter::new(&mut dst);
        writer.write_slice(b"ab").unwrap();
        assert_eq!(writer.written(), 2);
        assert_eq!(writer.write_slice(b"cde"), Err(EFAULT));
        writer.write_slice(b"cd").unwrap();
        assert!(writer.is_empty());
        assert_eq!(&dst, b"abcd");
    }
}
