//! Decoder for the MPEG-2 video sequence header (ISO/IEC 13818-2 - 6.2.2.1)
//! and the profile labels shared with the MXF descriptor parser.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::io;

/// The sequence-header start code.
pub const SEQUENCE_HEADER_CODE: [u8; 4] = [0x00, 0x00, 0x01, 0xB3];

/// A decoded MPEG-2 (or MPEG-1) video sequence header.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct SequenceHeader {
    /// Horizontal size in pixels.
    pub width: u32,
    /// Vertical size in pixels.
    pub height: u32,
    /// The 4-bit frame-rate code.
    pub frame_rate_code: u8,
    /// Frames per second for the code, when it is a table entry.
    pub frame_rate: Option<f64>,
}

impl SequenceHeader {
    /// Parses a sequence header starting at the `00 00 01 B3` start code.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 8 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "sequence header needs at least 8 bytes",
            ));
        }

        if data[..4] != SEQUENCE_HEADER_CODE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing sequence header start code",
            ));
        }

        // Two 12-bit sizes packed into three bytes.
        let width = ((data[4] as u32) << 4) | ((data[5] as u32) >> 4);
        let height = ((data[5] as u32 & 0x0F) << 8) | data[6] as u32;
        let frame_rate_code = data[7] & 0x0F;

        Ok(Self {
            width,
            height,
            frame_rate_code,
            frame_rate: frame_rate_for_code(frame_rate_code),
        })
    }
}

/// Frames per second for a frame-rate code.
/// ISO/IEC 13818-2 - 6.3.3 (Table 6-4)
#[must_use]
pub const fn frame_rate_for_code(code: u8) -> Option<f64> {
    match code {
        1 => Some(23.976),
        2 => Some(24.0),
        3 => Some(25.0),
        4 => Some(29.97),
        5 => Some(30.0),
        6 => Some(50.0),
        7 => Some(59.94),
        8 => Some(60.0),
        _ => None,
    }
}

/// Conventional MPEG-2 profile name for a 3-bit profile identifier, as
/// carried in the profile_and_level_indication and in MXF picture-essence
/// metadata.
#[must_use]
pub const fn profile_name(profile: u8) -> Option<&'static str> {
    match profile {
        1 => Some("High"),
        2 => Some("Spatially Scalable"),
        3 => Some("SNR Scalable"),
        4 => Some("Main"),
        5 => Some("Simple"),
        7 => Some("4:2:2"),
        _ => None,
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pal_sd() {
        // 720x576 @ 25 fps.
        let data = [0x00, 0x00, 0x01, 0xB3, 0x2D, 0x02, 0x40, 0x23];
        let header = SequenceHeader::parse(&data).unwrap();
        assert_eq!(header.width, 720);
        assert_eq!(header.height, 576);
        assert_eq!(header.frame_rate_code, 3);
        assert_eq!(header.frame_rate, Some(25.0));
    }

    #[test]
    fn test_parse_ntsc() {
        // 1920x1080 @ 29.97 fps.
        let data = [0x00, 0x00, 0x01, 0xB3, 0x78, 0x04, 0x38, 0x14];
        let header = SequenceHeader::parse(&data).unwrap();
        assert_eq!(header.width, 1920);
        assert_eq!(header.height, 1080);
        assert_eq!(header.frame_rate, Some(29.97));
    }

    #[test]
    fn test_reserved_frame_rate() {
        let data = [0x00, 0x00, 0x01, 0xB3, 0x2D, 0x02, 0x40, 0x2F];
        let header = SequenceHeader::parse(&data).unwrap();
        assert_eq!(header.frame_rate, None);
    }

    #[test]
    fn test_rejects_wrong_start_code() {
        let data = [0x00, 0x00, 0x01, 0xB8, 0x2D, 0x02, 0x40, 0x23];
        assert!(SequenceHeader::parse(&data).is_err());
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(profile_name(4), Some("Main"));
        assert_eq!(profile_name(5), Some("Simple"));
        assert_eq!(profile_name(1), Some("High"));
        assert_eq!(profile_name(7), Some("4:2:2"));
        assert_eq!(profile_name(0), None);
    }
}
