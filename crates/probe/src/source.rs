use std::io::{self, Read};

use bytes::Bytes;
use bytes_util::ChunkSource;
use media_types::ProbeError;

/// Chunk size pulled from wrapped readers.
const READ_CHUNK: usize = 64 * 1024;

/// Bytes the replay tee records before giving up on rewinds.
const REPLAY_CAP: usize = 4 * 1024 * 1024;

/// A [`ChunkSource`] over any [`io::Read`].
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    /// Wraps a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut chunk = vec![0u8; READ_CHUNK];
        let read = self.reader.read(&mut chunk)?;
        if read == 0 {
            return Ok(None);
        }
        chunk.truncate(read);
        Ok(Some(Bytes::from(chunk)))
    }
}

/// A recording tee over a single-shot chunk source.
///
/// Every chunk handed out is kept (up to a cap), so the dispatcher can
/// rewind the stream before each adapter attempt. Rewinding past the cap
/// is refused: an adapter that consumed more than the recorded window has
/// destroyed the replay.
pub struct ReplaySource<S> {
    inner: S,
    history: Vec<Bytes>,
    replay_index: usize,
    recorded: usize,
    overflowed: bool,
}

impl<S: ChunkSource> ReplaySource<S> {
    /// Wraps a source, recording up to the default cap.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            history: Vec::new(),
            replay_index: 0,
            recorded: 0,
            overflowed: false,
        }
    }

    /// Restarts the stream from the first recorded byte.
    pub fn rewind(&mut self) -> Result<(), ProbeError> {
        if self.overflowed {
            return Err(ProbeError::unsupported(
                "input advanced past the replay window; no fallback possible",
            ));
        }
        self.replay_index = 0;
        Ok(())
    }
}

impl<S: ChunkSource> ChunkSource for ReplaySource<S> {
    fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.replay_index < self.history.len() {
            let chunk = self.history[self.replay_index].clone();
            self.replay_index += 1;
            return Ok(Some(chunk));
        }

        match self.inner.next_chunk()? {
            Some(chunk) => {
                if self.recorded + chunk.len() <= REPLAY_CAP {
                    self.history.push(chunk.clone());
                    self.recorded += chunk.len();
                    self.replay_index = self.history.len();
                } else {
                    self.overflowed = true;
                }
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes_util::SliceSource;

    use super::*;

    #[test]
    fn test_reader_source() {
        let data = vec![0x42u8; 100];
        let mut source = ReaderSource::new(&data[..]);
        let chunk = source.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.len(), 100);
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_replay_rewind() {
        let data: Vec<u8> = (0..50).collect();
        let mut replay = ReplaySource::new(SliceSource::with_chunk_size(data, 16));

        let first_run: Vec<u8> = std::iter::from_fn(|| replay.next_chunk().unwrap())
            .flat_map(|chunk| chunk.to_vec())
            .collect();
        assert_eq!(first_run.len(), 50);

        replay.rewind().unwrap();
        let second_run: Vec<u8> = std::iter::from_fn(|| replay.next_chunk().unwrap())
            .flat_map(|chunk| chunk.to_vec())
            .collect();
        assert_eq!(first_run, second_run);
    }

    #[test]
    fn test_partial_consumption_then_rewind() {
        let data: Vec<u8> = (0..100).collect();
        let mut replay = ReplaySource::new(SliceSource::with_chunk_size(data, 10));

        let chunk = replay.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.as_ref(), &(0..10).collect::<Vec<u8>>()[..]);

        replay.rewind().unwrap();
        let chunk = replay.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.as_ref(), &(0..10).collect::<Vec<u8>>()[..]);
    }
}
