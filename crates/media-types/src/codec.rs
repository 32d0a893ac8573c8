use crate::ContainerFormat;

/// Audio codecs recognized by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AudioCodec {
    Aac,
    /// AAC carried in LATM/LOAS framing.
    AacLatm,
    Mp3,
    Mp2,
    Mp1,
    Ac3,
    Eac3,
    Dts,
    Flac,
    Opus,
    Vorbis,
    Wmav1,
    Wmav2,
    WmaPro,
    WmaLossless,
    Alac,
    AdpcmMs,
    AdpcmImaWav,
    PcmU8,
    PcmS16Le,
    PcmS16Be,
    PcmS24Le,
    PcmS24Be,
    PcmS32Le,
    PcmS32Be,
    PcmF32Le,
    PcmAlaw,
    PcmMulaw,
    Unknown,
}

impl AudioCodec {
    /// Canonical code for this codec.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::AacLatm => "aac_latm",
            Self::Mp3 => "mp3",
            Self::Mp2 => "mp2",
            Self::Mp1 => "mp1",
            Self::Ac3 => "ac3",
            Self::Eac3 => "eac3",
            Self::Dts => "dts",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Wmav1 => "wmav1",
            Self::Wmav2 => "wmav2",
            Self::WmaPro => "wmapro",
            Self::WmaLossless => "wmalossless",
            Self::Alac => "alac",
            Self::AdpcmMs => "adpcm_ms",
            Self::AdpcmImaWav => "adpcm_ima_wav",
            Self::PcmU8 => "pcm_u8",
            Self::PcmS16Le => "pcm_s16le",
            Self::PcmS16Be => "pcm_s16be",
            Self::PcmS24Le => "pcm_s24le",
            Self::PcmS24Be => "pcm_s24be",
            Self::PcmS32Le => "pcm_s32le",
            Self::PcmS32Be => "pcm_s32be",
            Self::PcmF32Le => "pcm_f32le",
            Self::PcmAlaw => "pcm_alaw",
            Self::PcmMulaw => "pcm_mulaw",
            Self::Unknown => "unknown",
        }
    }

    /// The container a raw elementary stream of this codec implies, if any.
    #[must_use]
    pub const fn default_container(&self) -> Option<ContainerFormat> {
        match self {
            Self::Aac => Some(ContainerFormat::Aac),
            Self::Mp3 => Some(ContainerFormat::Mp3),
            Self::Mp2 => Some(ContainerFormat::Mp2),
            Self::Mp1 => Some(ContainerFormat::Mp1),
            Self::Ac3 => Some(ContainerFormat::Ac3),
            Self::Dts => Some(ContainerFormat::Dts),
            Self::Flac => Some(ContainerFormat::Flac),
            _ => None,
        }
    }

    /// Resolves the many spellings of an audio codec onto its canonical
    /// kind: Matroska codec IDs, RFC 6381 strings, fourcc-ish names.
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim().trim_end_matches('\0').to_ascii_lowercase();

        // mp4a.40.<aot> strings all denote AAC object types.
        if alias.starts_with("mp4a.40.") {
            return Some(Self::Aac);
        }

        let kind = match alias.as_str() {
            "aac" | "a_aac" | "mp4a" => Self::Aac,
            "aac_latm" | "aac-latm" => Self::AacLatm,
            "mp3" | "a_mpeg/l3" | ".mp3" | "mp4a.6b" | "mp4a.69" => Self::Mp3,
            "mp2" | "a_mpeg/l2" => Self::Mp2,
            "mp1" | "a_mpeg/l1" => Self::Mp1,
            "ac3" | "ac-3" | "a_ac3" => Self::Ac3,
            "eac3" | "ec-3" | "a_eac3" => Self::Eac3,
            "dts" | "a_dts" => Self::Dts,
            "flac" | "a_flac" => Self::Flac,
            "opus" | "a_opus" => Self::Opus,
            "vorbis" | "a_vorbis" => Self::Vorbis,
            "wmav1" => Self::Wmav1,
            "wmav2" => Self::Wmav2,
            "wmapro" => Self::WmaPro,
            "wmalossless" => Self::WmaLossless,
            "alac" | "a_alac" => Self::Alac,
            "adpcm_ms" => Self::AdpcmMs,
            "adpcm_ima_wav" => Self::AdpcmImaWav,
            "a_pcm/int/lit" => Self::PcmS16Le,
            "a_pcm/int/big" => Self::PcmS16Be,
            "a_pcm/float/ieee" => Self::PcmF32Le,
            "ulaw" => Self::PcmMulaw,
            "alaw" => Self::PcmAlaw,
            _ => return None,
        };
        Some(kind)
    }

    /// The PCM codec for a given bit depth and endianness; 8-bit PCM is
    /// always unsigned.
    #[must_use]
    pub const fn pcm_for_depth(bits: u32, big_endian: bool) -> Self {
        match (bits, big_endian) {
            (8, _) => Self::PcmU8,
            (24, false) => Self::PcmS24Le,
            (24, true) => Self::PcmS24Be,
            (32, false) => Self::PcmS32Le,
            (32, true) => Self::PcmS32Be,
            (_, false) => Self::PcmS16Le,
            (_, true) => Self::PcmS16Be,
        }
    }
}

/// Video codecs recognized by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum VideoCodec {
    H264,
    Hevc,
    Vp8,
    Vp9,
    Av1,
    ProRes,
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4,
    Msmpeg4v2,
    Mjpeg,
    Theora,
    Wmv2,
    Unknown,
}

impl VideoCodec {
    /// Canonical code for this codec.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::ProRes => "prores",
            Self::Mpeg1Video => "mpeg1video",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
            Self::Msmpeg4v2 => "msmpeg4v2",
            Self::Mjpeg => "mjpeg",
            Self::Theora => "theora",
            Self::Wmv2 => "wmv2",
            Self::Unknown => "unknown",
        }
    }

    /// Resolves the many spellings of a video codec onto its canonical
    /// kind: Matroska codec IDs, RFC 6381 prefixes, BITMAPINFOHEADER and
    /// sample-entry fourccs.
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim().trim_end_matches('\0').to_ascii_lowercase();

        // RFC 6381 strings carry profile/level suffixes; match on prefix.
        for (prefix, kind) in [
            ("avc1.", Self::H264),
            ("avc3.", Self::H264),
            ("hvc1.", Self::Hevc),
            ("hev1.", Self::Hevc),
            ("vp09.", Self::Vp9),
            ("av01.", Self::Av1),
        ] {
            if alias.starts_with(prefix) {
                return Some(kind);
            }
        }

        let kind = match alias.as_str() {
            "h264" | "avc" | "avc1" | "avc3" | "x264" | "v_mpeg4/iso/avc" => Self::H264,
            "h265" | "hevc" | "hvc1" | "hev1" | "x265" | "v_mpegh/iso/hevc" => Self::Hevc,
            "vp8" | "vp80" | "v_vp8" => Self::Vp8,
            "vp9" | "vp90" | "v_vp9" => Self::Vp9,
            "av1" | "av01" | "v_av1" => Self::Av1,
            "apco" | "apcs" | "apcn" | "apch" | "ap4h" | "ap4x" | "prores" => Self::ProRes,
            "mpeg1video" | "v_mpeg1" | "mpg1" => Self::Mpeg1Video,
            "mpeg2video" | "v_mpeg2" | "mpg2" | "mx3p" | "mx4p" | "mx5p" => Self::Mpeg2Video,
            "mpeg4" | "mp4v" | "v_mpeg4/iso/asp" | "v_mpeg4/iso/sp" | "divx" | "dx50" | "xvid"
            | "fmp4" => Self::Mpeg4,
            "msmpeg4v2" | "mp42" | "div2" => Self::Msmpeg4v2,
            "mjpeg" | "mjpg" | "v_mjpeg" | "jpeg" => Self::Mjpeg,
            "theora" | "v_theora" => Self::Theora,
            "wmv2" => Self::Wmv2,
            _ => return None,
        };
        Some(kind)
    }
}
