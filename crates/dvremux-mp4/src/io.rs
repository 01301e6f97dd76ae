//! Positioned byte streams used by the locator and the rewriter.
//!
//! Reads and writes are exact: a short read surfaces as
//! [`std::io::ErrorKind::UnexpectedEof`] and aborts the operation. Bulk
//! copies move through one fixed [`IO_BLOCK`] scratch buffer so memory use
//! does not depend on box sizes.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Chunk size for bulk copies.
pub const IO_BLOCK: usize = 1024;

/// Read side: a seekable source with big-endian helpers.
pub struct Source<R> {
    inner: R,
    scratch: [u8; IO_BLOCK],
}

impl<R: Read + Seek> Source<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scratch: [0u8; IO_BLOCK],
        }
    }

    /// Fill `buf` completely.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf)
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Read a big-endian u64.
    pub fn read_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Read a four-character code.
    pub fn read_fourcc(&mut self) -> io::Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Advance `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        let delta = i64::try_from(n)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "skip distance too large"))?;
        self.inner.seek(SeekFrom::Current(delta))?;
        Ok(())
    }

    /// Absolute position in the underlying stream.
    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Move to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Total stream length. The current position is preserved.
    pub fn stream_len(&mut self) -> io::Result<u64> {
        let pos = self.inner.stream_position()?;
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }

    /// Copy `n` bytes to `sink` in [`IO_BLOCK`] chunks plus a remainder.
    pub fn copy_to<W: Write>(&mut self, sink: &mut Sink<W>, n: u64) -> io::Result<()> {
        let mut left = n;
        while left > 0 {
            let chunk = left.min(IO_BLOCK as u64) as usize;
            self.inner.read_exact(&mut self.scratch[..chunk])?;
            sink.write_all(&self.scratch[..chunk])?;
            left -= chunk as u64;
        }
        Ok(())
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Write side: counts every byte it emits.
pub struct Sink<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Sink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Write all of `buf`.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a big-endian u64.
    pub fn write_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Bytes emitted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
