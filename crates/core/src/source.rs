//! Byte sources and sinks the codec reads from and writes to.
//!
//! A [`ByteSource`] is an addressable, length-known sequence of bytes that
//! many tasks may read concurrently, each over its own range. A
//! [`ByteSink`] is an append-only output.
//!
//! Reads are all-or-nothing: a source either returns exactly the requested
//! range or fails with [`Error::Io`]. Short reads are never surfaced as
//! partial data.

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Read-only, random-access input shared across parallel tasks.
pub trait ByteSource: Sync {
    /// Total number of bytes in the source.
    fn length(&self) -> u64;

    /// Read the bytes in `[start, end)`.
    ///
    /// # Errors
    /// `Error::Io` if the range is out of bounds or cannot be read in full.
    fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>>;
}

/// Append-only output for compressed or decompressed bytes.
pub trait ByteSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()>;
}

fn check_range(start: u64, end: u64, len: u64) -> Result<()> {
    if start > end || end > len {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range {start}..{end} outside source of length {len}"),
        )));
    }
    Ok(())
}

impl ByteSource for [u8] {
    fn length(&self) -> u64 {
        self.len() as u64
    }

    fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        check_range(start, end, self.len() as u64)?;
        Ok(Cow::Borrowed(&self[start as usize..end as usize]))
    }
}

impl ByteSource for Vec<u8> {
    fn length(&self) -> u64 {
        self.as_slice().length()
    }

    fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        self.as_slice().read(start, end)
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    fn length(&self) -> u64 {
        N as u64
    }

    fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        self.as_slice().read(start, end)
    }
}

/// A file on disk exposed as a [`ByteSource`].
///
/// The length is captured at open. Every read opens its own handle, so
/// concurrent tasks never share a file cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    /// Open `path` and record its current length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = std::fs::metadata(&path)?.len();
        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn length(&self) -> u64 {
        self.len
    }

    fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        check_range(start, end, self.len)?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        // read_exact retries short reads and fails on EOF
        file.read_exact(&mut buf)?;
        Ok(Cow::Owned(buf))
    }
}

impl ByteSink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts any [`Write`] into a [`ByteSink`], counting bytes written.
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> ByteSink for WriteSink<W> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_slice_read() {
        let data = b"abcdef".to_vec();
        assert_eq!(data.length(), 6);
        assert_eq!(&*data.read(1, 4).unwrap(), b"bcd");
        assert_eq!(&*data.read(6, 6).unwrap(), b"");
    }

    #[test]
    fn test_out_of_range_is_io_error() {
        let data = [1u8, 2, 3];
        assert_eq!(data.read(2, 5).unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(data.read(3, 2).unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello file source").unwrap();
        file.flush().unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.length(), 17);
        assert_eq!(&*source.read(6, 10).unwrap(), b"file");
        assert!(source.read(10, 18).is_err());
    }

    #[test]
    fn test_file_source_truncated_after_open() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 64]).unwrap();
        file.flush().unwrap();

        let source = FileSource::open(file.path()).unwrap();
        file.as_file().set_len(10).unwrap();

        let err = source.read(0, 64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_write_sink_counts() {
        let mut sink = WriteSink::new(Vec::new());
        sink.append(b"abc").unwrap();
        sink.append(b"de").unwrap();
        assert_eq!(sink.written(), 5);
        assert_eq!(sink.into_inner().unwrap(), b"abcde");
    }
}
