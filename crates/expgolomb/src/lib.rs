//! Exp-Golomb read/write extensions over the [`BitReader`] and
//! [`BitWriter`] from the [`bytes-util`](bytes_util) crate, as used by the
//! H.264 parameter-set decoder.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::io;

use bytes_util::{BitReader, BitWriter};

/// Codewords with more than this many leading zeros are rejected as
/// malformed rather than consuming the rest of the stream.
const MAX_LEADING_ZEROS: u32 = 32;

/// Extension trait for reading Exp-Golomb encoded numbers from a bit reader.
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned Exp-Golomb encoded number.
    fn read_exp_golomb(&mut self) -> io::Result<u64>;

    /// Reads a signed Exp-Golomb encoded number.
    fn read_signed_exp_golomb(&mut self) -> io::Result<i64> {
        let exp_golomb = self.read_exp_golomb()?;

        if exp_golomb % 2 == 0 {
            Ok(-((exp_golomb / 2) as i64))
        } else {
            Ok((exp_golomb / 2) as i64 + 1)
        }
    }
}

impl<R: io::Read> BitReaderExpGolombExt for BitReader<R> {
    fn read_exp_golomb(&mut self) -> io::Result<u64> {
        let mut leading_zeros = 0;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > MAX_LEADING_ZEROS {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "malformed exp-golomb codeword",
                ));
            }
        }

        let mut result = 1;
        for _ in 0..leading_zeros {
            result <<= 1;
            result |= self.read_bit()? as u64;
        }

        Ok(result - 1)
    }
}

/// Extension trait for writing Exp-Golomb encoded numbers to a bit writer.
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitWriterExpGolombExt {
    /// Writes an unsigned Exp-Golomb encoded number.
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()>;

    /// Writes a signed Exp-Golomb encoded number.
    fn write_signed_exp_golomb(&mut self, number: i64) -> io::Result<()> {
        let number = if number <= 0 {
            -number as u64 * 2
        } else {
            number as u64 * 2 - 1
        };

        self.write_exp_golomb(number)
    }
}

impl<W: io::Write> BitWriterExpGolombExt for BitWriter<W> {
    fn write_exp_golomb(&mut self, input: u64) -> io::Result<()> {
        let mut number = input + 1;
        let mut leading_zeros = 0;
        while number > 1 {
            number >>= 1;
            leading_zeros += 1;
        }

        for _ in 0..leading_zeros {
            self.write_bit(false)?;
        }

        self.write_bits(input + 1, leading_zeros + 1)?;

        Ok(())
    }
}
