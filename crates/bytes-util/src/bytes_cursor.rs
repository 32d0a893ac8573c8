use std::io;

use bytes::Bytes;

/// A cursor over a [`Bytes`] buffer, enabling zero-copy extraction.
pub type BytesCursor = io::Cursor<Bytes>;

/// Zero-copy extraction helpers for [`BytesCursor`].
pub trait BytesCursorExt {
    /// Extracts the remaining bytes from the cursor without copying.
    fn extract_remaining(&mut self) -> Bytes;

    /// Extracts `size` bytes from the cursor without copying.
    ///
    /// Fails if `size` exceeds the remaining bytes.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;
}

fn remaining(cursor: &BytesCursor) -> usize {
    cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize)
}

impl BytesCursorExt for BytesCursor {
    fn extract_remaining(&mut self) -> Bytes {
        // Extracting whatever is left can only fail if nothing is left, in
        // which case the empty buffer is the right answer anyway.
        self.extract_bytes(remaining(self)).unwrap_or_default()
    }

    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        if size > remaining(self) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "not enough bytes",
            ));
        }

        let position = self.position() as usize;

        // Bytes::slice is O(1): it bumps a refcount instead of copying.
        let slice = self.get_ref().slice(position..position + size);
        self.set_position((position + size) as u64);

        Ok(slice)
    }
}
