use bytes_util::SliceReader;
use h264::AvcDecoderConfigurationRecord;
use media_types::{AudioCodec, VideoCodec};
use waveformat::WaveFormatEx;

/// The identification fields of a Vorbis stream, from the first packet of
/// the Xiph-laced CodecPrivate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VorbisId {
    /// Channel count.
    pub channels: u8,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Nominal bitrate in bits per second, when positive.
    pub bitrate_nominal: Option<u32>,
}

/// The OpusHead fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    /// Channel count.
    pub channels: u8,
    /// Pre-skip in 48 kHz samples.
    pub pre_skip: u16,
    /// Original input sample rate in Hz.
    pub input_sample_rate: u32,
}

/// The STREAMINFO fields of a FLAC stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlacStreamInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u8,
    /// Bits per sample.
    pub bits_per_sample: u8,
}

/// Decoded CodecPrivate payloads, one case per codec family this probe
/// interprets, with a shared fallback for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecPrivate {
    /// `A_VORBIS` identification header.
    Vorbis(VorbisId),
    /// `A_OPUS` OpusHead.
    Opus(OpusHead),
    /// `A_FLAC` STREAMINFO.
    Flac(FlacStreamInfo),
    /// `A_MS/ACM` / `A_ADPCM` WAVEFORMATEX.
    MsAcm(WaveFormatEx),
    /// `V_MS/VFW/FOURCC` BITMAPINFOHEADER, reduced to its fourcc.
    MsVfwFourcc {
        /// The fourcc spelled as ASCII.
        fourcc: String,
        /// The codec the fourcc maps to, when known.
        codec: Option<VideoCodec>,
    },
    /// `V_MPEG4/ISO/AVC` decoder configuration record.
    Avc(AvcDecoderConfigurationRecord),
    /// Raw, uninterpreted bytes.
    Unknown,
}

impl CodecPrivate {
    /// Interprets a CodecPrivate payload according to the track's codec ID.
    #[must_use]
    pub fn parse(codec_id: &str, data: &[u8]) -> Self {
        match codec_id {
            "A_VORBIS" => parse_vorbis(data).map_or(Self::Unknown, Self::Vorbis),
            "A_OPUS" => parse_opus(data).map_or(Self::Unknown, Self::Opus),
            "A_FLAC" => parse_flac(data).map_or(Self::Unknown, Self::Flac),
            "A_MS/ACM" | "A_ADPCM" => {
                WaveFormatEx::parse(data).map_or(Self::Unknown, Self::MsAcm)
            }
            "V_MS/VFW/FOURCC" => parse_vfw(data).map_or(Self::Unknown, |fourcc| {
                let codec = VideoCodec::from_alias(&fourcc);
                Self::MsVfwFourcc { fourcc, codec }
            }),
            "V_MPEG4/ISO/AVC" => {
                AvcDecoderConfigurationRecord::parse(data).map_or(Self::Unknown, Self::Avc)
            }
            _ => Self::Unknown,
        }
    }
}

/// The PCM codec for a Matroska PCM codec ID and bit depth.
#[must_use]
pub fn pcm_codec(codec_id: &str, bit_depth: u32) -> Option<AudioCodec> {
    match codec_id {
        "A_PCM/INT/LIT" => Some(AudioCodec::pcm_for_depth(bit_depth, false)),
        "A_PCM/INT/BIG" => Some(AudioCodec::pcm_for_depth(bit_depth, true)),
        "A_PCM/FLOAT/IEEE" => Some(AudioCodec::PcmF32Le),
        _ => None,
    }
}

fn parse_vorbis(data: &[u8]) -> Option<VorbisId> {
    // Xiph lacing: packet count minus one, then 255-limb sizes; the
    // identification packet is the first one.
    let count = *data.first()? as usize;
    let mut offset = 1;
    for _ in 0..count {
        loop {
            let limb = *data.get(offset)?;
            offset += 1;
            if limb != 255 {
                break;
            }
        }
    }

    let packet = &data[offset..];
    if packet.len() < 30 || packet[0] != 0x01 || &packet[1..7] != b"vorbis" {
        return None;
    }

    let mut reader = SliceReader::new(&packet[7..]);
    let _version = reader.read_u32_le().ok()?;
    let channels = reader.read_u8().ok()?;
    let sample_rate = reader.read_u32_le().ok()?;
    let _bitrate_max = reader.read_i32_le().ok()?;
    let bitrate_nominal = reader.read_i32_le().ok()?;

    Some(VorbisId {
        channels,
        sample_rate,
        bitrate_nominal: (bitrate_nominal > 0).then_some(bitrate_nominal as u32),
    })
}

fn parse_opus(data: &[u8]) -> Option<OpusHead> {
    if data.len() < 19 || &data[..8] != b"OpusHead" {
        return None;
    }

    let mut reader = SliceReader::new(&data[8..]);
    let _version = reader.read_u8().ok()?;
    let channels = reader.read_u8().ok()?;
    let pre_skip = reader.read_u16_le().ok()?;
    let input_sample_rate = reader.read_u32_le().ok()?;

    Some(OpusHead {
        channels,
        pre_skip,
        input_sample_rate,
    })
}

fn parse_flac(data: &[u8]) -> Option<FlacStreamInfo> {
    // CodecPrivate is the full FLAC header stream: "fLaC" magic, then
    // metadata blocks with STREAMINFO first.
    let streaminfo = if data.starts_with(b"fLaC") {
        data.get(8..)?
    } else {
        data
    };
    if streaminfo.len() < 18 {
        return None;
    }

    let sample_rate = ((streaminfo[10] as u32) << 12)
        | ((streaminfo[11] as u32) << 4)
        | ((streaminfo[12] as u32) >> 4);
    let channels = ((streaminfo[12] >> 1) & 0x07) + 1;
    let bits_per_sample = (((streaminfo[12] & 0x01) << 4) | (streaminfo[13] >> 4)) + 1;

    Some(FlacStreamInfo {
        sample_rate,
        channels,
        bits_per_sample,
    })
}

fn parse_vfw(data: &[u8]) -> Option<String> {
    // BITMAPINFOHEADER: biCompression holds the fourcc at offset 16.
    let fourcc = data.get(16..20)?;
    if !fourcc.is_ascii() {
        return None;
    }
    Some(String::from_utf8_lossy(fourcc).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vorbis_private(channels: u8, sample_rate: u32, nominal: i32) -> Vec<u8> {
        let mut id_packet = vec![0x01];
        id_packet.extend_from_slice(b"vorbis");
        id_packet.extend_from_slice(&0u32.to_le_bytes()); // version
        id_packet.push(channels);
        id_packet.extend_from_slice(&sample_rate.to_le_bytes());
        id_packet.extend_from_slice(&(-1i32).to_le_bytes()); // max
        id_packet.extend_from_slice(&nominal.to_le_bytes()); // nominal
        id_packet.extend_from_slice(&(-1i32).to_le_bytes()); // min
        id_packet.push(0xB8); // blocksizes
        id_packet.push(0x01); // framing

        let mut private = vec![2]; // three packets
        private.push(id_packet.len() as u8);
        private.push(8); // comment packet size
        private.extend_from_slice(&id_packet);
        private.extend_from_slice(&[0x03; 8]); // fake comment packet
        private.extend_from_slice(&[0x05; 16]); // fake setup packet
        private
    }

    #[test]
    fn test_vorbis() {
        let private = vorbis_private(2, 44100, 160_000);
        let CodecPrivate::Vorbis(id) = CodecPrivate::parse("A_VORBIS", &private) else {
            panic!("expected Vorbis");
        };
        assert_eq!(id.channels, 2);
        assert_eq!(id.sample_rate, 44100);
        assert_eq!(id.bitrate_nominal, Some(160_000));
    }

    #[test]
    fn test_vorbis_negative_nominal() {
        let private = vorbis_private(1, 8000, -1);
        let CodecPrivate::Vorbis(id) = CodecPrivate::parse("A_VORBIS", &private) else {
            panic!("expected Vorbis");
        };
        assert_eq!(id.bitrate_nominal, None);
    }

    #[test]
    fn test_opus() {
        let mut private = b"OpusHead".to_vec();
        private.push(1); // version
        private.push(2); // channels
        private.extend_from_slice(&312u16.to_le_bytes()); // pre-skip
        private.extend_from_slice(&48000u32.to_le_bytes());
        private.extend_from_slice(&0i16.to_le_bytes()); // gain
        private.push(0); // mapping family

        let CodecPrivate::Opus(head) = CodecPrivate::parse("A_OPUS", &private) else {
            panic!("expected Opus");
        };
        assert_eq!(head.channels, 2);
        assert_eq!(head.pre_skip, 312);
        assert_eq!(head.input_sample_rate, 48000);
    }

    #[test]
    fn test_flac() {
        // STREAMINFO for 44100 Hz, 2 channels, 16 bps.
        let mut streaminfo = vec![0u8; 34];
        streaminfo[10] = (44100 >> 12) as u8;
        streaminfo[11] = ((44100 >> 4) & 0xFF) as u8;
        streaminfo[12] = (((44100 & 0x0F) as u8) << 4) | (1 << 1) | 0; // channels-1=1, bps high bit 0
        streaminfo[13] = 0xF0; // bps low bits: 15 -> 16 bps

        let mut private = b"fLaC".to_vec();
        private.extend_from_slice(&[0x00, 0x00, 0x00, 34]); // block header
        private.extend_from_slice(&streaminfo);

        let CodecPrivate::Flac(info) = CodecPrivate::parse("A_FLAC", &private) else {
            panic!("expected Flac");
        };
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bits_per_sample, 16);
    }

    #[test]
    fn test_ms_acm() {
        let format = WaveFormatEx {
            format_tag: waveformat::format_tag::MS_ADPCM,
            channels: 2,
            samples_per_sec: 22050,
            avg_bytes_per_sec: 22311,
            block_align: 1024,
            bits_per_sample: 4,
            extra: waveformat::WaveFormatExtra::None,
        };
        let CodecPrivate::MsAcm(parsed) = CodecPrivate::parse("A_MS/ACM", &format.build())
        else {
            panic!("expected MsAcm");
        };
        assert_eq!(parsed, format);
    }

    #[test]
    fn test_vfw_fourcc() {
        let mut bih = vec![0u8; 40];
        bih[16..20].copy_from_slice(b"WMV2");
        let CodecPrivate::MsVfwFourcc { fourcc, codec } =
            CodecPrivate::parse("V_MS/VFW/FOURCC", &bih)
        else {
            panic!("expected fourcc");
        };
        assert_eq!(fourcc, "WMV2");
        assert_eq!(codec, Some(VideoCodec::Wmv2));
    }

    #[test]
    fn test_pcm_codecs() {
        assert_eq!(pcm_codec("A_PCM/INT/LIT", 16), Some(AudioCodec::PcmS16Le));
        assert_eq!(pcm_codec("A_PCM/INT/LIT", 8), Some(AudioCodec::PcmU8));
        assert_eq!(pcm_codec("A_PCM/INT/BIG", 24), Some(AudioCodec::PcmS24Be));
        assert_eq!(pcm_codec("A_PCM/FLOAT/IEEE", 32), Some(AudioCodec::PcmF32Le));
        assert_eq!(pcm_codec("A_AAC", 16), None);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            CodecPrivate::parse("A_TRUEHD", &[1, 2, 3]),
            CodecPrivate::Unknown
        );
    }
}
