use std::io;

use bytes::Bytes;

/// Default chunk size handed out by [`SliceSource`].
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Once this many bytes have been consumed from the front of the buffer the
/// consumed prefix is sliced off.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// A pull-based producer of byte chunks.
///
/// This is the only input abstraction the progressive parsers know about:
/// they request the next chunk when their buffered bytes run out, and `None`
/// signals end of input.
pub trait ChunkSource {
    /// Returns the next chunk, or `None` at end of input.
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        (**self).next_chunk()
    }
}

impl ChunkSource for Box<dyn ChunkSource + '_> {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        (**self).next_chunk()
    }
}

/// A [`ChunkSource`] over an in-memory buffer, yielding fixed-size chunks.
///
/// Mostly useful in tests, where the chunk size is made artificially small to
/// exercise the refill paths of the progressive parsers.
#[derive(Debug, Clone)]
pub struct SliceSource {
    data: Bytes,
    pos: usize,
    chunk_size: usize,
}

impl SliceSource {
    /// Creates a source over `data` with the default chunk size.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_chunk_size(data, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a source over `data` yielding chunks of at most `chunk_size`.
    pub fn with_chunk_size(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl ChunkSource for SliceSource {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }

        let end = (self.pos + self.chunk_size).min(self.data.len());
        let chunk = self.data.slice(self.pos..end);
        self.pos = end;
        Ok(Some(chunk))
    }
}

/// A growing buffer over a [`ChunkSource`].
///
/// Parsers call [`ChunkBuffer::ensure`] (or [`ChunkBuffer::require`]) with
/// the number of bytes the next parsing step needs; the buffer pulls chunks
/// until that many bytes are available and compacts the consumed prefix as
/// the read cursor advances past logical boundaries.
#[derive(Debug)]
pub struct ChunkBuffer<S> {
    source: S,
    buf: Vec<u8>,
    start: usize,
    consumed_total: u64,
    eof: bool,
}

impl<S: ChunkSource> ChunkBuffer<S> {
    /// Creates an empty buffer over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: Vec::new(),
            start: 0,
            consumed_total: 0,
            eof: false,
        }
    }

    /// Number of buffered, unconsumed bytes.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buf.len() - self.start
    }

    /// The buffered, unconsumed window.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Total bytes consumed since creation.
    #[must_use]
    pub const fn total_consumed(&self) -> u64 {
        self.consumed_total
    }

    /// Whether the source has reported end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Pulls one more chunk into the buffer.
    ///
    /// Returns `false` when the source is exhausted.
    pub fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        match self.source.next_chunk()? {
            Some(chunk) => {
                self.buf.extend_from_slice(&chunk);
                Ok(true)
            }
            None => {
                self.eof = true;
                Ok(false)
            }
        }
    }

    /// Grows the buffer until at least `count` unconsumed bytes are
    /// available. Returns `false` if the source ended first.
    pub fn ensure(&mut self, count: usize) -> io::Result<bool> {
        while self.available() < count {
            if !self.fill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Like [`ChunkBuffer::ensure`], but end of input is an
    /// [`io::ErrorKind::UnexpectedEof`] error.
    pub fn require(&mut self, count: usize) -> io::Result<()> {
        if !self.ensure(count)? {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "needed {count} bytes but input ended after {}",
                    self.available()
                ),
            ));
        }
        Ok(())
    }

    /// Advances the read cursor past `count` consumed bytes.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the available bytes; callers must `ensure`
    /// first.
    pub fn consume(&mut self, count: usize) {
        assert!(count <= self.available(), "consume past buffered data");
        self.start += count;
        self.consumed_total += count as u64;

        if self.start >= COMPACT_THRESHOLD {
            self.buf.drain(..self.start);
            self.start = 0;
        }
    }
}
