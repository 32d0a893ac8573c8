use std::io;

use bytes_util::BitReader;

use crate::AudioSpecificConfig;

/// The decoded head of a LATM audio mux element.
/// ISO/IEC 14496-3:2019(E) - 1.7.3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LatmMux {
    /// The embedded AudioSpecificConfig.
    pub config: AudioSpecificConfig,
    /// The frame length type of layer 0.
    pub frame_length_type: u8,
    /// The audioMuxLength in bytes when LOAS framing was present.
    pub audio_mux_length: Option<usize>,
}

fn unsupported(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, message.to_owned())
}

/// Whether `data` starts with the LOAS syncword (11 bits of `0x2B7`).
#[must_use]
pub fn has_loas_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x56 && (data[1] & 0xE0) == 0xE0
}

/// Parses a LATM audio mux element, with or without a leading LOAS
/// syncword.
///
/// Only the single-program, single-layer profile with audioMuxVersion 0 is
/// supported; anything else fails with [`io::ErrorKind::Unsupported`],
/// which the container parsers surface as a codec-specific rejection.
pub fn parse_latm(data: &[u8]) -> io::Result<LatmMux> {
    let mut reader = BitReader::new_from_slice(data);

    let audio_mux_length = if has_loas_sync(data) {
        reader.skip_bits(11)?;

        // Length limbs: 255 means "more follows".
        let mut length = 0usize;
        loop {
            let limb = reader.read_bits(8)? as usize;
            length += limb;
            if limb != 255 {
                break;
            }
        }
        Some(length)
    } else {
        None
    };

    if reader.read_bit()? {
        return Err(unsupported("audioMuxVersion 1 is not supported"));
    }
    if reader.read_bit()? {
        return Err(unsupported("audioMuxVersionA 1 is not supported"));
    }

    // allStreamsSameTimeFraming + numSubFrames; neither changes how the
    // config is located.
    reader.read_bits(2)?;
    reader.read_bits(6)?;

    if reader.read_bits(4)? != 0 {
        return Err(unsupported("multi-program LATM is not supported"));
    }
    if reader.read_bits(3)? != 0 {
        return Err(unsupported("multi-layer LATM is not supported"));
    }

    let config = AudioSpecificConfig::parse_bits(&mut reader)?;

    let frame_length_type = reader.read_bits(3)? as u8;
    match frame_length_type {
        0 => {
            // latmBufferFullness
            reader.read_bits(8)?;
        }
        1 => {
            // CELP frame length table index
            reader.read_bits(6)?;
        }
        2 => {}
        3 => {
            // HVXC frame length table index
            reader.read_bit()?;
        }
        _ => {
            return Err(unsupported("LATM frameLengthType >= 4 is not supported"));
        }
    }

    if reader.read_bit()? {
        // otherDataLenBits: escape-extended 8-bit limbs, then skipped.
        let mut other_data_bits = 0u64;
        loop {
            let escape = reader.read_bit()?;
            other_data_bits = (other_data_bits << 8) | reader.read_bits(8)?;
            if !escape {
                break;
            }
        }
        reader.skip_bits(other_data_bits)?;
    }

    if reader.read_bit()? {
        // CRC
        reader.read_bits(8)?;
    }

    Ok(LatmMux {
        config,
        frame_length_type,
        audio_mux_length,
    })
}
