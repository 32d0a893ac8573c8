//! Bit- and byte-level reading primitives shared by the container and
//! codec-header parsers, plus the chunked-input buffer the progressive
//! parsers pull from.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bit_read;
mod bit_write;
mod bytes_cursor;
mod chunk;
mod slice_reader;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use bytes_cursor::{BytesCursor, BytesCursorExt};
pub use chunk::{ChunkBuffer, ChunkSource, SliceSource};
pub use slice_reader::SliceReader;

/// Formats a byte slice as lowercase hex pairs separated by spaces.
///
/// Used by the demuxers when logging 16-byte keys and GUIDs.
pub fn fmt_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_hex() {
        assert_eq!(fmt_hex(&[0x06, 0x0e, 0x2b, 0x34]), "06 0e 2b 34");
        assert_eq!(fmt_hex(&[]), "");
    }
}
