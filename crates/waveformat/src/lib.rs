//! Parse and build the Windows WAVEFORMATEX structure, shared by the WAV,
//! AVI, Matroska (`A_MS/ACM`) and ASF stream headers, including the
//! MS-ADPCM extension block and the format-tag to codec mapping.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use media_types::AudioCodec;

/// wFormatTag values this probe maps onto codecs.
#[allow(missing_docs)]
pub mod format_tag {
    pub const PCM: u16 = 0x0001;
    pub const MS_ADPCM: u16 = 0x0002;
    pub const IEEE_FLOAT: u16 = 0x0003;
    pub const ALAW: u16 = 0x0006;
    pub const MULAW: u16 = 0x0007;
    pub const IMA_ADPCM: u16 = 0x0011;
    pub const MPEG: u16 = 0x0050;
    pub const MPEG_LAYER3: u16 = 0x0055;
    pub const WMA_V1: u16 = 0x0160;
    pub const WMA_V2: u16 = 0x0161;
    pub const WMA_PRO: u16 = 0x0162;
    pub const WMA_LOSSLESS: u16 = 0x0163;
    pub const DOLBY_AC3_SPDIF: u16 = 0x2000;
    pub const DTS: u16 = 0x2001;
    pub const EXTENSIBLE: u16 = 0xFFFE;
}

/// The seven canonical MS-ADPCM predictor coefficient pairs.
pub const MS_ADPCM_COEFFICIENTS: [(i16, i16); 7] = [
    (256, 0),
    (512, -256),
    (0, 0),
    (192, 64),
    (240, 0),
    (460, -208),
    (392, -232),
];

/// The MS-ADPCM extension carried in the cbSize area for format tag 0x0002.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsAdpcmInfo {
    /// Samples per compressed block.
    pub samples_per_block: u16,
    /// Predictor coefficient pairs; normally the seven canonical ones.
    pub coefficients: Vec<(i16, i16)>,
}

impl MsAdpcmInfo {
    /// The standard extension for a given samples-per-block value.
    #[must_use]
    pub fn standard(samples_per_block: u16) -> Self {
        Self {
            samples_per_block,
            coefficients: MS_ADPCM_COEFFICIENTS.to_vec(),
        }
    }
}

/// Extra bytes following the fixed 16-byte layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveFormatExtra {
    /// No extra block (cbSize absent or zero).
    None,
    /// Decoded MS-ADPCM extension.
    MsAdpcm(MsAdpcmInfo),
    /// Extra bytes kept opaque (WMA codec data, extensible sub-format, ...).
    Raw(Vec<u8>),
}

/// A decoded WAVEFORMATEX structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct WaveFormatEx {
    /// wFormatTag
    pub format_tag: u16,
    /// nChannels
    pub channels: u16,
    /// nSamplesPerSec
    pub samples_per_sec: u32,
    /// nAvgBytesPerSec
    pub avg_bytes_per_sec: u32,
    /// nBlockAlign
    pub block_align: u16,
    /// wBitsPerSample
    pub bits_per_sample: u16,
    /// Decoded form of the cbSize extra block.
    pub extra: WaveFormatExtra,
}

impl WaveFormatEx {
    /// Parses a WAVEFORMATEX from `data`.
    ///
    /// The fixed 16-byte layout is required; a trailing cbSize and extra
    /// block are decoded when present.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 16 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "WAVEFORMATEX needs at least 16 bytes",
            ));
        }

        let mut cursor = Cursor::new(data);
        let format_tag = cursor.read_u16::<LittleEndian>()?;
        let channels = cursor.read_u16::<LittleEndian>()?;
        let samples_per_sec = cursor.read_u32::<LittleEndian>()?;
        let avg_bytes_per_sec = cursor.read_u32::<LittleEndian>()?;
        let block_align = cursor.read_u16::<LittleEndian>()?;
        let bits_per_sample = cursor.read_u16::<LittleEndian>()?;

        let mut extra = WaveFormatExtra::None;
        if data.len() >= 18 {
            let cb_size = cursor.read_u16::<LittleEndian>()? as usize;
            let cb_size = cb_size.min(data.len() - 18);
            if cb_size > 0 {
                let extra_bytes = &data[18..18 + cb_size];
                extra = if format_tag == format_tag::MS_ADPCM {
                    parse_ms_adpcm_extra(extra_bytes)
                        .unwrap_or_else(|| WaveFormatExtra::Raw(extra_bytes.to_vec()))
                } else {
                    WaveFormatExtra::Raw(extra_bytes.to_vec())
                };
            }
        }

        Ok(Self {
            format_tag,
            channels,
            samples_per_sec,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            extra,
        })
    }

    /// Serializes back to the on-disk layout. The cbSize field is written
    /// whenever an extra block is present.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        out.extend_from_slice(&self.format_tag.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.samples_per_sec.to_le_bytes());
        out.extend_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        match &self.extra {
            WaveFormatExtra::None => {}
            WaveFormatExtra::MsAdpcm(info) => {
                let cb_size = (4 + info.coefficients.len() * 4) as u16;
                out.extend_from_slice(&cb_size.to_le_bytes());
                out.extend_from_slice(&info.samples_per_block.to_le_bytes());
                out.extend_from_slice(&(info.coefficients.len() as u16).to_le_bytes());
                for &(coef1, coef2) in &info.coefficients {
                    out.extend_from_slice(&coef1.to_le_bytes());
                    out.extend_from_slice(&coef2.to_le_bytes());
                }
            }
            WaveFormatExtra::Raw(bytes) => {
                out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                out.extend_from_slice(bytes);
            }
        }

        out
    }

    /// Maps the format tag (and bit depth, for PCM) onto a codec kind.
    #[must_use]
    pub fn codec(&self) -> AudioCodec {
        match self.format_tag {
            format_tag::PCM => AudioCodec::pcm_for_depth(self.bits_per_sample as u32, false),
            format_tag::MS_ADPCM => AudioCodec::AdpcmMs,
            format_tag::IEEE_FLOAT => AudioCodec::PcmF32Le,
            format_tag::ALAW => AudioCodec::PcmAlaw,
            format_tag::MULAW => AudioCodec::PcmMulaw,
            format_tag::IMA_ADPCM => AudioCodec::AdpcmImaWav,
            format_tag::MPEG | format_tag::MPEG_LAYER3 => AudioCodec::Mp3,
            format_tag::WMA_V1 => AudioCodec::Wmav1,
            format_tag::WMA_V2 => AudioCodec::Wmav2,
            format_tag::WMA_PRO => AudioCodec::WmaPro,
            format_tag::WMA_LOSSLESS => AudioCodec::WmaLossless,
            format_tag::DOLBY_AC3_SPDIF => AudioCodec::Ac3,
            format_tag::DTS => AudioCodec::Dts,
            // The sub-format GUID is in the extra block; integer PCM is by
            // far the common case.
            format_tag::EXTENSIBLE => AudioCodec::PcmS16Le,
            _ => AudioCodec::Unknown,
        }
    }

    /// Human-readable name of the format tag, mirroring the spelling a
    /// Windows tool would use.
    #[must_use]
    pub const fn format_name(&self) -> Option<&'static str> {
        match self.format_tag {
            format_tag::PCM => Some("PCM"),
            format_tag::MS_ADPCM => Some("MS-ADPCM"),
            format_tag::IEEE_FLOAT => Some("IEEE Float"),
            format_tag::ALAW => Some("A-law"),
            format_tag::MULAW => Some("u-law"),
            format_tag::IMA_ADPCM => Some("IMA-ADPCM"),
            format_tag::MPEG | format_tag::MPEG_LAYER3 => Some("MP3"),
            format_tag::WMA_V1 => Some("WMAv1"),
            format_tag::WMA_V2 => Some("WMAv2"),
            format_tag::WMA_PRO => Some("WMAPro"),
            format_tag::WMA_LOSSLESS => Some("WMALossless"),
            format_tag::DOLBY_AC3_SPDIF => Some("AC-3"),
            format_tag::DTS => Some("DTS"),
            _ => None,
        }
    }

    /// Bitrate in bits per second derived from nAvgBytesPerSec.
    #[must_use]
    pub const fn bitrate(&self) -> u64 {
        self.avg_bytes_per_sec as u64 * 8
    }
}

fn parse_ms_adpcm_extra(extra: &[u8]) -> Option<WaveFormatExtra> {
    let mut cursor = Cursor::new(extra);
    let samples_per_block = cursor.read_u16::<LittleEndian>().ok()?;
    let num_coef = cursor.read_u16::<LittleEndian>().ok()? as usize;
    if extra.len() < 4 + num_coef * 4 {
        return None;
    }

    let mut coefficients = Vec::with_capacity(num_coef);
    for _ in 0..num_coef {
        let coef1 = cursor.read_i16::<LittleEndian>().ok()?;
        let coef2 = cursor.read_i16::<LittleEndian>().ok()?;
        coefficients.push((coef1, coef2));
    }

    Some(WaveFormatExtra::MsAdpcm(MsAdpcmInfo {
        samples_per_block,
        coefficients,
    }))
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn pcm_format() -> WaveFormatEx {
        WaveFormatEx {
            format_tag: format_tag::PCM,
            channels: 2,
            samples_per_sec: 44100,
            avg_bytes_per_sec: 176400,
            block_align: 4,
            bits_per_sample: 16,
            extra: WaveFormatExtra::None,
        }
    }

    #[test]
    fn test_roundtrip_simple_tags() {
        let tags = [
            format_tag::PCM,
            format_tag::IEEE_FLOAT,
            format_tag::ALAW,
            format_tag::MULAW,
            format_tag::IMA_ADPCM,
            format_tag::MPEG_LAYER3,
            format_tag::WMA_V1,
            format_tag::WMA_V2,
            format_tag::WMA_PRO,
            format_tag::WMA_LOSSLESS,
        ];
        for tag in tags {
            let mut format = pcm_format();
            format.format_tag = tag;
            let rebuilt = WaveFormatEx::parse(&format.build()).unwrap();
            assert_eq!(rebuilt, format, "format tag {tag:#06x}");
        }
    }

    #[test]
    fn test_roundtrip_ms_adpcm() {
        let format = WaveFormatEx {
            format_tag: format_tag::MS_ADPCM,
            channels: 1,
            samples_per_sec: 22050,
            avg_bytes_per_sec: 11155,
            block_align: 512,
            bits_per_sample: 4,
            extra: WaveFormatExtra::MsAdpcm(MsAdpcmInfo::standard(1012)),
        };

        let bytes = format.build();
        // 16 fixed + 2 cbSize + 2 samplesPerBlock + 2 numCoef + 7*4 pairs
        assert_eq!(bytes.len(), 50);

        let rebuilt = WaveFormatEx::parse(&bytes).unwrap();
        assert_eq!(rebuilt, format);
        let WaveFormatExtra::MsAdpcm(info) = &rebuilt.extra else {
            panic!("expected MS-ADPCM extra");
        };
        assert_eq!(info.samples_per_block, 1012);
        assert_eq!(info.coefficients, MS_ADPCM_COEFFICIENTS.to_vec());
    }

    #[test]
    fn test_codec_mapping() {
        let mut format = pcm_format();
        assert_eq!(format.codec(), AudioCodec::PcmS16Le);

        format.bits_per_sample = 8;
        assert_eq!(format.codec(), AudioCodec::PcmU8);
        format.bits_per_sample = 24;
        assert_eq!(format.codec(), AudioCodec::PcmS24Le);
        format.bits_per_sample = 32;
        assert_eq!(format.codec(), AudioCodec::PcmS32Le);

        format.format_tag = format_tag::WMA_V2;
        assert_eq!(format.codec(), AudioCodec::Wmav2);
        assert_eq!(format.format_name(), Some("WMAv2"));

        format.format_tag = format_tag::EXTENSIBLE;
        assert_eq!(format.codec(), AudioCodec::PcmS16Le);

        format.format_tag = 0x1234;
        assert_eq!(format.codec(), AudioCodec::Unknown);
    }

    #[test]
    fn test_parse_without_cb_size() {
        let mut bytes = pcm_format().build();
        assert_eq!(bytes.len(), 16);
        let parsed = WaveFormatEx::parse(&bytes).unwrap();
        assert_eq!(parsed.extra, WaveFormatExtra::None);

        // cbSize = 0 parses the same.
        bytes.extend_from_slice(&[0, 0]);
        let parsed = WaveFormatEx::parse(&bytes).unwrap();
        assert_eq!(parsed.extra, WaveFormatExtra::None);
    }

    #[test]
    fn test_bitrate() {
        assert_eq!(pcm_format().bitrate(), 1_411_200);
    }

    #[test]
    fn test_too_short() {
        let err = WaveFormatEx::parse(&[0u8; 10]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
