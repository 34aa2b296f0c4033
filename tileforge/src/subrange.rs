//! Bounded view over a window of a seekable source.
//!
//! [`BoundedSubRange`] exposes bytes `[offset, offset + length)` of an inner
//! reader as if they were a complete stream. Positions reported by `seek`
//! are relative to the start of the window.

use std::io::{self, Read, Seek, SeekFrom};

/// A `Read + Seek` window over `[min, max)` of an inner source.
#[derive(Debug)]
pub struct BoundedSubRange<R> {
    inner: R,
    min: u64,
    max: u64,
    /// Absolute position in `inner`, always within `[min, max]`
    cursor: u64,
}

impl<R: Read + Seek> BoundedSubRange<R> {
    /// Create a window of `length` bytes starting at `offset`.
    ///
    /// The inner reader is positioned at `offset`.
    pub fn new(mut inner: R, offset: u64, length: u64) -> io::Result<Self> {
        let max = offset.checked_add(length).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "sub-range end overflows u64")
        })?;
        inner.seek(SeekFrom::Start(offset))?;
        Ok(Self {
            inner,
            min: offset,
            max,
            cursor: offset,
        })
    }
}

impl<R> BoundedSubRange<R> {
    /// Total window length.
    pub fn len(&self) -> u64 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        self.max == self.min
    }

    /// Bytes left before the end of the window.
    pub fn remaining(&self) -> u64 {
        self.max - self.cursor
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> Read for BoundedSubRange<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..want])?;
        self.cursor = self.cursor.saturating_add(n as u64).min(self.max);
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for BoundedSubRange<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => self.min.checked_add(n),
            SeekFrom::Current(n) => self.cursor.checked_add_signed(n),
            SeekFrom::End(n) => self.max.checked_add_signed(n),
        };

        let target = match target {
            Some(t) if t >= self.min && t <= self.max => t,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek outside sub-range",
                ))
            }
        };

        self.inner.seek(SeekFrom::Start(target))?;
        self.cursor = target;
        Ok(target - self.min)
    }
}
