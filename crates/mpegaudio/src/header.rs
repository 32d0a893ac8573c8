use std::io;

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    /// MPEG-1 (ISO/IEC 11172-3)
    Mpeg1,
    /// MPEG-2 (ISO/IEC 13818-3)
    Mpeg2,
    /// MPEG-2.5 (unofficial low-rate extension)
    Mpeg25,
}

/// MPEG audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Layer I
    I,
    /// Layer II
    II,
    /// Layer III
    III,
}

impl Layer {
    /// The layer number (1, 2 or 3).
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::I => 1,
            Self::II => 2,
            Self::III => 3,
        }
    }
}

/// Channel mode of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Independent left/right
    Stereo,
    /// Joint stereo (MS/intensity)
    JointStereo,
    /// Two independent mono channels
    DualChannel,
    /// Single channel
    Mono,
}

/// Bitrates in kbps by [version group][layer][index - 1].
///
/// ISO/IEC 11172-3 table B.1 and ISO/IEC 13818-3 table B.1; MPEG-2.5 uses
/// the MPEG-2 rows.
const BITRATES_KBPS: [[[u32; 14]; 3]; 2] = [
    // MPEG-1
    [
        [32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448], // Layer I
        [32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],    // Layer II
        [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],     // Layer III
    ],
    // MPEG-2 / MPEG-2.5
    [
        [32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256], // Layer I
        [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],      // Layer II
        [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],      // Layer III
    ],
];

/// Sample rates in Hz by [version][index].
const SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000], // MPEG-1
    [22050, 24000, 16000], // MPEG-2
    [11025, 12000, 8000],  // MPEG-2.5
];

/// A decoded MPEG audio frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FrameHeader {
    /// MPEG version.
    pub version: MpegVersion,
    /// Layer.
    pub layer: Layer,
    /// Bitrate in bits per second. `None` for the "free format" index 0.
    pub bitrate: Option<u32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Whether the frame carries a padding slot.
    pub padding: bool,
    /// Channel mode.
    pub channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Parses a frame header from the first 4 bytes of `data`.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 4 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "MPEG audio header needs 4 bytes",
            ));
        }

        if data[0] != 0xFF || (data[1] & 0xE0) != 0xE0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid MPEG audio syncword",
            ));
        }

        let version = match (data[1] >> 3) & 0x03 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "reserved MPEG version",
                ));
            }
        };

        let layer = match (data[1] >> 1) & 0x03 {
            1 => Layer::III,
            2 => Layer::II,
            3 => Layer::I,
            _ => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "reserved layer"));
            }
        };

        let bitrate_index = (data[2] >> 4) & 0x0F;
        if bitrate_index == 0x0F {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid bitrate index",
            ));
        }

        let bitrate = if bitrate_index == 0 {
            None
        } else {
            let version_group = match version {
                MpegVersion::Mpeg1 => 0,
                _ => 1,
            };
            let layer_row = layer.number() as usize - 1;
            Some(BITRATES_KBPS[version_group][layer_row][bitrate_index as usize - 1] * 1000)
        };

        let sample_rate_index = (data[2] >> 2) & 0x03;
        if sample_rate_index == 3 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "reserved sample rate index",
            ));
        }
        let version_row = match version {
            MpegVersion::Mpeg1 => 0,
            MpegVersion::Mpeg2 => 1,
            MpegVersion::Mpeg25 => 2,
        };
        let sample_rate = SAMPLE_RATES[version_row][sample_rate_index as usize];

        let padding = (data[2] & 0x02) != 0;

        let channel_mode = match (data[3] >> 6) & 0x03 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Ok(Self {
            version,
            layer,
            bitrate,
            sample_rate,
            padding,
            channel_mode,
        })
    }

    /// Number of channels.
    #[must_use]
    pub const fn channel_count(&self) -> u8 {
        match self.channel_mode {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    /// PCM samples per frame for this version/layer combination.
    #[must_use]
    pub const fn samples_per_frame(&self) -> u32 {
        match self.layer {
            Layer::I => 384,
            Layer::II => 1152,
            Layer::III => match self.version {
                MpegVersion::Mpeg1 => 1152,
                _ => 576,
            },
        }
    }

    /// Frame length in bytes, header included. `None` for free-format
    /// frames, whose length is not derivable from the header alone.
    #[must_use]
    pub fn frame_length(&self) -> Option<usize> {
        let bitrate = self.bitrate? as usize;
        let sample_rate = self.sample_rate as usize;
        let padding = self.padding as usize;

        let length = match self.layer {
            Layer::I => (12 * bitrate / sample_rate + padding) * 4,
            _ => {
                let slots = self.samples_per_frame() as usize / 8;
                slots * bitrate / sample_rate + padding
            }
        };
        Some(length)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mpeg1_layer3() {
        // The classic 128 kbps / 44100 Hz joint-stereo header.
        let header = FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0x64]).unwrap();
        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, Layer::III);
        assert_eq!(header.bitrate, Some(128_000));
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.channel_mode, ChannelMode::JointStereo);
        assert_eq!(header.channel_count(), 2);
        assert_eq!(header.samples_per_frame(), 1152);
        // floor(144 * 128000 / 44100) = 417, no padding
        assert_eq!(header.frame_length(), Some(417));
    }

    #[test]
    fn test_parse_mpeg2_layer2_mono() {
        // MPEG-2, layer II, index 5 (40 kbps), 24000 Hz, mono.
        let header = FrameHeader::parse(&[0xFF, 0xF4, 0x54, 0xC0]).unwrap();
        assert_eq!(header.version, MpegVersion::Mpeg2);
        assert_eq!(header.layer, Layer::II);
        assert_eq!(header.bitrate, Some(40_000));
        assert_eq!(header.sample_rate, 24000);
        assert_eq!(header.channel_count(), 1);
        assert_eq!(header.samples_per_frame(), 1152);
    }

    #[test]
    fn test_mpeg25_layer3_samples() {
        // MPEG-2.5, layer III, index 2 (16 kbps), 11025 Hz.
        let header = FrameHeader::parse(&[0xFF, 0xE2, 0x20, 0x00]).unwrap();
        assert_eq!(header.version, MpegVersion::Mpeg25);
        assert_eq!(header.sample_rate, 11025);
        assert_eq!(header.samples_per_frame(), 576);
    }

    #[test]
    fn test_free_format() {
        let header = FrameHeader::parse(&[0xFF, 0xFB, 0x00, 0x00]).unwrap();
        assert_eq!(header.bitrate, None);
        assert_eq!(header.frame_length(), None);
    }

    #[test]
    fn test_rejects_reserved_fields() {
        // Reserved version (bits 01).
        assert!(FrameHeader::parse(&[0xFF, 0xEB, 0x90, 0x64]).is_err());
        // Reserved layer (bits 00).
        assert!(FrameHeader::parse(&[0xFF, 0xF9, 0x90, 0x64]).is_err());
        // Bitrate index 0xF.
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0xF0, 0x64]).is_err());
        // Sample rate index 3.
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x9C, 0x64]).is_err());
        // No sync.
        assert!(FrameHeader::parse(&[0xFE, 0xFB, 0x90, 0x64]).is_err());
    }
}
