/// Container families recognized by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// ISO-BMFF MP4
    Mp4,
    /// QuickTime MOV
    Mov,
    /// MPEG-4 audio-only (M4A)
    M4a,
    /// WebM (Matroska subset)
    Webm,
    /// Matroska
    Mkv,
    /// Audio Video Interleave
    Avi,
    /// MPEG transport stream (including M2TS)
    MpegTs,
    /// Material Exchange Format
    Mxf,
    /// Advanced Systems Format (WMV)
    Asf,
    /// ASF carrying only Windows Media Audio
    Wma,
    /// OGG
    Ogg,
    /// Raw AAC (ADTS framing)
    Aac,
    /// MPEG audio layer III
    Mp3,
    /// FLAC
    Flac,
    /// RIFF WAVE
    Wav,
    /// Raw AC-3
    Ac3,
    /// MPEG audio layer II
    Mp2,
    /// MPEG audio layer I
    Mp1,
    /// Raw DTS
    Dts,
    /// Unrecognized container
    Unknown,
}

impl ContainerFormat {
    /// Canonical short code for this container.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::M4a => "m4a",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
            Self::MpegTs => "mpegts",
            Self::Mxf => "mxf",
            Self::Asf => "asf",
            Self::Wma => "wma",
            Self::Ogg => "ogg",
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Ac3 => "ac3",
            Self::Mp2 => "mp2",
            Self::Mp1 => "mp1",
            Self::Dts => "dts",
            Self::Unknown => "unknown",
        }
    }

    /// Default file extension for this container.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::MpegTs => "ts",
            Self::Mov => "mov",
            other => other.code(),
        }
    }

    /// The MIME type commonly associated with this container.
    #[must_use]
    pub const fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Mp4 => Some("video/mp4"),
            Self::Mov => Some("video/quicktime"),
            Self::M4a => Some("audio/mp4"),
            Self::Webm => Some("video/webm"),
            Self::Mkv => Some("video/x-matroska"),
            Self::Avi => Some("video/x-msvideo"),
            Self::MpegTs => Some("video/mp2t"),
            Self::Mxf => Some("application/mxf"),
            Self::Asf => Some("video/x-ms-asf"),
            Self::Wma => Some("audio/x-ms-wma"),
            Self::Ogg => Some("audio/ogg"),
            Self::Aac => Some("audio/aac"),
            Self::Mp3 => Some("audio/mpeg"),
            Self::Flac => Some("audio/flac"),
            Self::Wav => Some("audio/wav"),
            Self::Ac3 => Some("audio/ac3"),
            Self::Mp2 | Self::Mp1 => Some("audio/mpeg"),
            Self::Dts => Some("audio/vnd.dts"),
            Self::Unknown => None,
        }
    }

    /// Resolves the many spellings of a container name onto its canonical
    /// kind. Matching is case-insensitive.
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim().to_ascii_lowercase();
        let kind = match alias.as_str() {
            "mp4" | "isom" | "iso2" | "mp41" | "mp42" | "avc1" | "dash" => Self::Mp4,
            "mov" | "qt" | "quicktime" => Self::Mov,
            "m4a" | "m4b" => Self::M4a,
            "webm" => Self::Webm,
            "mkv" | "matroska" | "mk3d" => Self::Mkv,
            "avi" => Self::Avi,
            "ts" | "m2ts" | "mts" | "mpegts" | "mpeg-ts" => Self::MpegTs,
            "mxf" => Self::Mxf,
            "asf" | "wmv" => Self::Asf,
            "wma" => Self::Wma,
            "ogg" | "oga" | "ogv" | "opus" => Self::Ogg,
            "aac" | "adts" => Self::Aac,
            "mp3" => Self::Mp3,
            "flac" => Self::Flac,
            "wav" | "wave" | "riff" => Self::Wav,
            "ac3" | "ac-3" => Self::Ac3,
            "mp2" => Self::Mp2,
            "mp1" => Self::Mp1,
            "dts" => Self::Dts,
            _ => return None,
        };
        Some(kind)
    }
}
