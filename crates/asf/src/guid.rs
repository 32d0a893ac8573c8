use std::fmt;

/// A 16-byte object identifier, kept in its on-disk byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Reads a GUID from the start of a slice.
    #[must_use]
    pub fn read(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 16] = data.get(..16)?.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", bytes_util::fmt_hex(&self.0))
    }
}

/// ASF Header Object.
pub const HEADER_OBJECT: Guid = Guid([
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
    0x6C,
]);

/// ASF Data Object.
pub const DATA_OBJECT: Guid = Guid([
    0x36, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
    0x6C,
]);

/// Stream Properties Object.
pub const STREAM_PROPERTIES: Guid = Guid([
    0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53,
    0x65,
]);

/// File Properties Object.
pub const FILE_PROPERTIES: Guid = Guid([
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53,
    0x65,
]);

/// Header Extension Object.
pub const HEADER_EXTENSION: Guid = Guid([
    0xB5, 0x03, 0xBF, 0x5F, 0x2E, 0xA9, 0xCF, 0x11, 0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53,
    0x65,
]);

/// Extended Stream Properties Object (inside the Header Extension).
pub const EXTENDED_STREAM_PROPERTIES: Guid = Guid([
    0xCB, 0xA5, 0xE6, 0x14, 0x72, 0xC6, 0x32, 0x43, 0x83, 0x99, 0xA9, 0x69, 0x52, 0x06, 0x5B,
    0x5A,
]);

/// Audio Media stream type.
pub const AUDIO_MEDIA: Guid = Guid([
    0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44,
    0x2B,
]);

/// Video Media stream type.
pub const VIDEO_MEDIA: Guid = Guid([
    0xC0, 0xEF, 0x19, 0xBC, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44,
    0x2B,
]);
