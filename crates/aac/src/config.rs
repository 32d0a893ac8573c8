use std::io;

use bytes_util::BitReader;
use num_traits::FromPrimitive;

use crate::{AudioObjectType, SampleFrequencyIndex, channel_count_for_configuration};

/// A partial AudioSpecificConfig.
/// ISO/IEC 14496-3:2019(E) - 1.6
///
/// Only the top fields are decoded; the object-type-specific tail (GA
/// specific config and friends) is left to the decoder this probe does not
/// contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AudioSpecificConfig {
    /// Audio Object Type
    pub audio_object_type: AudioObjectType,
    /// Sampling Frequency in Hz
    pub sampling_frequency: u32,
    /// The raw 4-bit channel configuration
    pub channel_configuration: u8,
}

impl AudioSpecificConfig {
    /// Parse the Audio Specific Config from the given bytes.
    /// ISO/IEC 14496-3:2019(E) - 1.6.2.1 (Table 1.19)
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new_from_slice(data);
        Self::parse_bits(&mut reader)
    }

    /// Parse the Audio Specific Config from a bit reader, leaving the
    /// reader positioned after the consumed fields. Used by the LATM
    /// StreamMuxConfig, where the config is embedded mid-stream.
    pub fn parse_bits<R: io::Read>(reader: &mut BitReader<R>) -> io::Result<Self> {
        // GetAudioObjectType() # ISO/IEC 14496-3:2019(E) - 1.6.2.1 (Table 1.20)
        let mut audio_object_type = reader.read_bits(5)? as u16;
        if audio_object_type == 31 {
            audio_object_type = 32 + reader.read_bits(6)? as u16;
        }

        let sampling_frequency_index = SampleFrequencyIndex::from_u8(reader.read_bits(4)? as u8)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "invalid sampling frequency index")
            })?;

        let sampling_frequency = match sampling_frequency_index {
            // Escape: the frequency follows as an explicit 24-bit value.
            SampleFrequencyIndex::FreqEscape => reader.read_bits(24)? as u32,
            _ => sampling_frequency_index.to_freq().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "reserved sampling frequency index")
            })?,
        };

        let channel_configuration = reader.read_bits(4)? as u8;

        Ok(Self {
            audio_object_type: AudioObjectType::from_u16(audio_object_type),
            sampling_frequency,
            channel_configuration,
        })
    }

    /// Channel count mapped from the configuration, when it defines one.
    #[must_use]
    pub const fn channel_count(&self) -> Option<u8> {
        channel_count_for_configuration(self.channel_configuration)
    }

    /// The codec-detail label for this config (`aac-lc`, `he-aac`, ...).
    #[must_use]
    pub fn detail(&self) -> String {
        self.audio_object_type.detail()
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lc_stereo() {
        // AOT 2 (LC), frequency index 4 (44100), channel config 2.
        let data = [0x12, 0x10];
        let config = AudioSpecificConfig::parse(&data).unwrap();
        assert_eq!(config.audio_object_type, AudioObjectType::AacLowComplexity);
        assert_eq!(config.sampling_frequency, 44100);
        assert_eq!(config.channel_configuration, 2);
        assert_eq!(config.channel_count(), Some(2));
        assert_eq!(config.detail(), "aac-lc");
    }

    #[test]
    fn test_parse_escaped_aot() {
        use bytes_util::BitWriter;

        let mut writer = BitWriter::<Vec<u8>>::default();
        writer.write_bits(31, 5).unwrap(); // escape
        writer.write_bits(34 - 32, 6).unwrap(); // AOT 34 (Layer-3)
        writer.write_bits(3, 4).unwrap(); // 48000
        writer.write_bits(1, 4).unwrap(); // mono
        let data = writer.finish().unwrap();

        let config = AudioSpecificConfig::parse(&data).unwrap();
        assert_eq!(config.audio_object_type, AudioObjectType::Unknown(34));
        assert_eq!(config.sampling_frequency, 48000);
        assert_eq!(config.channel_count(), Some(1));
    }

    #[test]
    fn test_parse_escaped_frequency() {
        use bytes_util::BitWriter;

        let mut writer = BitWriter::<Vec<u8>>::default();
        writer.write_bits(2, 5).unwrap(); // LC
        writer.write_bits(0xF, 4).unwrap(); // escape
        writer.write_bits(37800, 24).unwrap();
        writer.write_bits(2, 4).unwrap();
        let data = writer.finish().unwrap();

        let config = AudioSpecificConfig::parse(&data).unwrap();
        assert_eq!(config.sampling_frequency, 37800);
    }

    #[test]
    fn test_truncated() {
        let err = AudioSpecificConfig::parse(&[0x12]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
