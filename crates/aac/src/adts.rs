use std::io;

use bytes_util::{BitReader, BitWriter};
use num_traits::FromPrimitive;

use crate::{AudioObjectType, SampleFrequencyIndex, channel_count_for_configuration};

/// Maximum value of the 13-bit ADTS frame-length field.
const MAX_FRAME_LENGTH: usize = 0x1FFF;

/// A decoded ADTS frame header.
/// ISO/IEC 13818-7 - 6.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AdtsHeader {
    /// Audio Object Type, derived from the 2-bit profile field
    /// (`profile + 1`).
    pub audio_object_type: AudioObjectType,
    /// Sampling frequency in Hz.
    pub sample_rate: u32,
    /// The 3-bit channel configuration. 0 means the layout is defined
    /// inside the raw data blocks.
    pub channel_configuration: u8,
    /// Channel count mapped from the configuration, when it defines one.
    pub channel_count: Option<u8>,
    /// Total frame length in bytes, header included.
    pub frame_length: u16,
    /// Header length in bytes: 7, or 9 when a CRC is present.
    pub header_length: u8,
    /// The 11-bit buffer fullness field.
    pub buffer_fullness: u16,
    /// Number of raw data blocks in the frame minus one.
    pub raw_data_blocks: u8,
}

impl AdtsHeader {
    /// Parses an ADTS header from the start of `data`.
    ///
    /// The layer bits must be zero; a nonzero layer means the sync pattern
    /// belongs to an MPEG audio frame, not ADTS.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 7 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "ADTS header needs at least 7 bytes",
            ));
        }

        let mut reader = BitReader::new_from_slice(data);

        if reader.read_bits(12)? != 0xFFF {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid ADTS syncword",
            ));
        }

        // MPEG version bit: 0 = MPEG-4, 1 = MPEG-2. Irrelevant for the
        // fields we expose.
        reader.read_bit()?;

        if reader.read_bits(2)? != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "ADTS layer bits must be zero",
            ));
        }

        let protection_absent = reader.read_bit()?;

        let profile = reader.read_bits(2)? as u16;
        let audio_object_type = AudioObjectType::from_u16(profile + 1);

        let frequency_index = SampleFrequencyIndex::from_u8(reader.read_bits(4)? as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid sampling frequency index"))?;
        let sample_rate = frequency_index.to_freq().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "reserved sampling frequency index",
            )
        })?;

        // private_bit
        reader.read_bit()?;

        // The channel configuration straddles the byte 2/3 boundary.
        let channel_configuration = reader.read_bits(3)? as u8;

        // original/copy, home
        reader.read_bits(2)?;
        // copyright identification bit + start
        reader.read_bits(2)?;

        let frame_length = reader.read_bits(13)? as u16;
        let buffer_fullness = reader.read_bits(11)? as u16;
        let raw_data_blocks = reader.read_bits(2)? as u8;

        let header_length = if protection_absent { 7 } else { 9 };
        if (frame_length as usize) < header_length as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "ADTS frame length smaller than its header",
            ));
        }

        Ok(Self {
            audio_object_type,
            sample_rate,
            channel_configuration,
            channel_count: channel_count_for_configuration(channel_configuration),
            frame_length,
            header_length,
            buffer_fullness,
            raw_data_blocks,
        })
    }

    /// Length of the payload carried by this frame.
    #[must_use]
    pub const fn payload_length(&self) -> usize {
        self.frame_length as usize - self.header_length as usize
    }
}

/// Builds a 7-byte ADTS frame around a raw AAC access unit.
///
/// Buffer fullness is set to `0x7FF` (variable rate) and the frame carries
/// one raw data block. The 2-bit profile field can only express the first
/// four object types; the SBR and PS types are signaled as LC, which is
/// what their backward-compatible core is.
pub fn build_adts_frame(
    payload: &[u8],
    sample_rate: u32,
    channel_configuration: u8,
    audio_object_type: AudioObjectType,
) -> io::Result<Vec<u8>> {
    let frequency_index = SampleFrequencyIndex::from_freq(sample_rate).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("sample rate {sample_rate} has no ADTS frequency index"),
        )
    })?;

    if channel_configuration > 7 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "channel configuration does not fit in 3 bits",
        ));
    }

    let frame_length = 7 + payload.len();
    if frame_length > MAX_FRAME_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "payload too large for the 13-bit frame length",
        ));
    }

    let profile = match audio_object_type.as_u16() {
        aot @ 1..=4 => aot - 1,
        // HE-AAC / HE-AACv2 carry an LC core.
        5 | 29 => 1,
        aot => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("audio object type {aot} is not expressible in ADTS"),
            ));
        }
    };

    let mut writer = BitWriter::new(Vec::with_capacity(frame_length));
    writer.write_bits(0xFFF, 12)?; // syncword
    writer.write_bit(false)?; // MPEG-4
    writer.write_bits(0, 2)?; // layer
    writer.write_bit(true)?; // no CRC
    writer.write_bits(profile as u64, 2)?;
    writer.write_bits(frequency_index as u64, 4)?;
    writer.write_bit(false)?; // private_bit
    writer.write_bits(channel_configuration as u64, 3)?;
    writer.write_bits(0, 2)?; // original/copy, home
    writer.write_bits(0, 2)?; // copyright bit + start
    writer.write_bits(frame_length as u64, 13)?;
    writer.write_bits(0x7FF, 11)?; // buffer fullness
    writer.write_bits(0, 2)?; // one raw data block

    let mut frame = writer.finish()?;
    frame.extend_from_slice(payload);
    Ok(frame)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_header() {
        // 44100 Hz, stereo, LC, frame length 1024 + 7.
        let frame = build_adts_frame(&[0u8; 1024], 44100, 2, AudioObjectType::AacLowComplexity)
            .unwrap();
        let header = AdtsHeader::parse(&frame).unwrap();
        assert_eq!(header.audio_object_type, AudioObjectType::AacLowComplexity);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.channel_configuration, 2);
        assert_eq!(header.channel_count, Some(2));
        assert_eq!(header.frame_length, 1031);
        assert_eq!(header.header_length, 7);
        assert_eq!(header.buffer_fullness, 0x7FF);
        assert_eq!(header.payload_length(), 1024);
    }

    #[test]
    fn test_roundtrip_profiles_and_channels() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        for sample_rate in [96000u32, 48000, 44100, 16000, 8000, 7350] {
            for channel_configuration in 1u8..=7 {
                for aot in [1u16, 2, 3, 4] {
                    let aot = AudioObjectType::from_u16(aot);
                    let frame =
                        build_adts_frame(&payload, sample_rate, channel_configuration, aot)
                            .unwrap();
                    let header = AdtsHeader::parse(&frame).unwrap();
                    assert_eq!(header.audio_object_type, aot);
                    assert_eq!(header.sample_rate, sample_rate);
                    assert_eq!(header.channel_configuration, channel_configuration);
                    assert_eq!(header.frame_length as usize, 7 + payload.len());
                }
            }
        }
    }

    #[test]
    fn test_he_aac_synthesizes_as_lc() {
        for aot in [AudioObjectType::Sbr, AudioObjectType::ParametricStereo] {
            let frame = build_adts_frame(&[0u8; 16], 48000, 2, aot).unwrap();
            let header = AdtsHeader::parse(&frame).unwrap();
            assert_eq!(header.audio_object_type, AudioObjectType::AacLowComplexity);
        }
    }

    #[test]
    fn test_rejects_mp3_sync() {
        // An MPEG-1 layer III header also starts with eleven sync bits, but
        // its layer bits are nonzero.
        let data = [0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00];
        let err = AdtsHeader::parse(&data).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_unsupported_rate() {
        assert!(build_adts_frame(&[], 44000, 2, AudioObjectType::AacLowComplexity).is_err());
    }

    #[test]
    fn test_short_input() {
        let err = AdtsHeader::parse(&[0xFF, 0xF1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
