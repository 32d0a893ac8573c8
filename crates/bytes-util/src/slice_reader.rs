use std::io;

/// A bounds-checked forward reader over a byte slice.
///
/// Every read verifies that `position + width` fits inside the slice and
/// fails with [`io::ErrorKind::UnexpectedEof`] otherwise, so header parsers
/// never have to index the slice directly.
#[derive(Debug)]
#[must_use]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position in bytes.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether all bytes have been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn check(&self, width: usize) -> io::Result<()> {
        if self.pos + width > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {width} bytes at offset {} exceeds buffer of {} bytes",
                    self.pos,
                    self.data.len()
                ),
            ));
        }
        Ok(())
    }

    /// Advances the position by `count` bytes.
    pub fn skip(&mut self, count: usize) -> io::Result<()> {
        self.check(count)?;
        self.pos += count;
        Ok(())
    }

    /// Moves the position to an absolute byte offset.
    pub fn seek(&mut self, pos: usize) -> io::Result<()> {
        if pos > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to {pos} exceeds buffer of {} bytes", self.data.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    /// Reads `count` bytes as a sub-slice.
    pub fn read_slice(&mut self, count: usize) -> io::Result<&'a [u8]> {
        self.check(count)?;
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Reads `count` bytes as an ASCII string.
    ///
    /// Non-ASCII input is rejected with [`io::ErrorKind::InvalidData`].
    pub fn read_ascii(&mut self, count: usize) -> io::Result<&'a str> {
        let slice = self.read_slice(count)?;
        if !slice.is_ascii() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "expected ASCII bytes",
            ));
        }
        // Cannot fail: ASCII is always valid UTF-8.
        Ok(std::str::from_utf8(slice).unwrap_or_default())
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.check(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads a big-endian u16.
    pub fn read_u16_be(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a little-endian u16.
    pub fn read_u16_le(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads a big-endian u24 into the low bits of a u32.
    pub fn read_u24_be(&mut self) -> io::Result<u32> {
        let bytes = self.read_slice(3)?;
        Ok(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
    }

    /// Reads a big-endian u32.
    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a little-endian u32.
    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads a big-endian u64.
    pub fn read_u64_be(&mut self) -> io::Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads a little-endian u64.
    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a big-endian i16.
    pub fn read_i16_be(&mut self) -> io::Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    /// Reads a little-endian i16.
    pub fn read_i16_le(&mut self) -> io::Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// Reads a big-endian i32.
    pub fn read_i32_be(&mut self) -> io::Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Reads a little-endian i32.
    pub fn read_i32_le(&mut self) -> io::Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Returns the unread tail without consuming it.
    #[must_use]
    pub fn peek_remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let slice = self.read_slice(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(slice);
        Ok(array)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_endian_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        let mut reader = SliceReader::new(&data);
        assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
        reader.seek(0).unwrap();
        assert_eq!(reader.read_u16_le().unwrap(), 0x3412);
        reader.seek(0).unwrap();
        assert_eq!(reader.read_u32_be().unwrap(), 0x12345678);
        reader.seek(0).unwrap();
        assert_eq!(reader.read_u32_le().unwrap(), 0x78563412);
        reader.seek(0).unwrap();
        assert_eq!(reader.read_u64_be().unwrap(), 0x123456789ABCDEF0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_u24() {
        let mut reader = SliceReader::new(&[0x01, 0x02, 0x03]);
        assert_eq!(reader.read_u24_be().unwrap(), 0x010203);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut reader = SliceReader::new(&[0x01, 0x02]);
        let err = reader.read_u32_be().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // A failed read must not advance the position.
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16_be().unwrap(), 0x0102);
    }

    #[test]
    fn test_ascii() {
        let mut reader = SliceReader::new(b"ftypisom");
        assert_eq!(reader.read_ascii(4).unwrap(), "ftyp");
        assert_eq!(reader.read_ascii(4).unwrap(), "isom");

        let mut reader = SliceReader::new(&[0xFF, 0xFE]);
        assert!(reader.read_ascii(2).is_err());
    }

    #[test]
    fn test_skip_and_seek() {
        let mut reader = SliceReader::new(&[0u8; 10]);
        reader.skip(4).unwrap();
        assert_eq!(reader.position(), 4);
        assert!(reader.skip(7).is_err());
        reader.seek(10).unwrap();
        assert!(reader.is_empty());
        assert!(reader.seek(11).is_err());
    }
}
