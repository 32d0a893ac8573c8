use crate::{AudioCodec, ContainerFormat, VideoCodec};

/// One video elementary stream as surfaced to callers.
///
/// The `id` is container-dependent: MP4 track_id, Matroska track number,
/// MPEG-TS PID, ASF stream number.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
    /// Container-dependent stream identifier.
    pub id: u32,
    /// Canonical codec kind.
    pub codec: VideoCodec,
    /// The codec spelling as found in the source file (`avc1.64001f`,
    /// `V_VP9`, a fourcc, ...).
    pub codec_detail: Option<String>,
    /// Coded width in pixels.
    pub width: Option<u32>,
    /// Coded height in pixels.
    pub height: Option<u32>,
    /// Frames per second.
    pub fps: Option<f64>,
    /// Codec profile name, when the headers carry one.
    pub profile: Option<String>,
    /// Codec level, when the headers carry one.
    pub level: Option<String>,
    /// Bits per second, when derivable.
    pub bitrate: Option<u64>,
}

impl VideoStream {
    /// Creates a stream with only the identifier and codec set.
    #[must_use]
    pub fn new(id: u32, codec: VideoCodec) -> Self {
        Self {
            id,
            codec,
            codec_detail: None,
            width: None,
            height: None,
            fps: None,
            profile: None,
            level: None,
            bitrate: None,
        }
    }
}

/// One audio elementary stream as surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    /// Container-dependent stream identifier.
    pub id: u32,
    /// Canonical codec kind.
    pub codec: AudioCodec,
    /// The codec spelling as found in the source file.
    pub codec_detail: Option<String>,
    /// Number of channels.
    pub channel_count: Option<u32>,
    /// Samples per second.
    pub sample_rate: Option<u32>,
    /// Bits per sample, for PCM-family codecs.
    pub bits_per_sample: Option<u32>,
    /// Bits per second, when derivable.
    pub bitrate: Option<u64>,
    /// Codec profile name (`LC`, `HE-AAC`, ...).
    pub profile: Option<String>,
    /// Codec level.
    pub level: Option<String>,
    /// ISO-639 language code from the container metadata.
    pub language: Option<String>,
    /// Broadcast audio-type label (`Music`, `Effects`, ...).
    pub audio_type: Option<String>,
    /// Surround mode label from DTS/AC-3 descriptors.
    pub surround_mode: Option<String>,
    /// Codec- or container-specific extra fields.
    pub extra: Option<AudioExtra>,
}

impl AudioStream {
    /// Creates a stream with only the identifier and codec set.
    #[must_use]
    pub fn new(id: u32, codec: AudioCodec) -> Self {
        Self {
            id,
            codec,
            codec_detail: None,
            channel_count: None,
            sample_rate: None,
            bits_per_sample: None,
            bitrate: None,
            profile: None,
            level: None,
            language: None,
            audio_type: None,
            surround_mode: None,
            extra: None,
        }
    }
}

/// Codec-specific sub-record attached to an [`AudioStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioExtra {
    /// MPEG audio framing details.
    MpegAudio {
        /// Layer (1, 2 or 3).
        layer: u8,
        /// Whether the sampled frame carried the padding bit.
        padding: bool,
    },
    /// AC-3 / E-AC-3 descriptor fields from MPEG-TS.
    Ac3 {
        /// component_type byte, when flagged.
        component_type: Option<u8>,
        /// Bit-stream mode.
        bsmod: Option<u8>,
        /// mainid, when flagged.
        main_id: Option<u8>,
        /// asvc, when flagged.
        asvc: Option<u8>,
    },
    /// MXF essence linkage.
    MxfEssence {
        /// The 32-bit essence track number from the source package.
        track_number: u32,
    },
    /// WAVEFORMATEX fragments kept for WAV/AVI/MKV/ASF tracks.
    Wave {
        /// Original wFormatTag.
        format_tag: u16,
        /// nBlockAlign.
        block_align: u16,
        /// nAvgBytesPerSec.
        avg_bytes_per_sec: u32,
    },
}

/// The per-file result of a successful probe.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container family.
    pub container: ContainerFormat,
    /// Sub-family or variant detail (`wma`, `OP1a`, a service name, ...).
    pub container_detail: Option<String>,
    /// Duration in seconds, when derivable from the metadata.
    pub duration_seconds: Option<f64>,
    /// Video streams in container order.
    pub video_streams: Vec<VideoStream>,
    /// Audio streams in container order.
    pub audio_streams: Vec<AudioStream>,
    /// MIME type of the container.
    pub mime_type: Option<String>,
    /// Name of the adapter that produced this record.
    pub parser: &'static str,
}

impl MediaInfo {
    /// Creates an empty record for `container`.
    #[must_use]
    pub fn new(container: ContainerFormat) -> Self {
        Self {
            container,
            container_detail: None,
            duration_seconds: None,
            video_streams: Vec::new(),
            audio_streams: Vec::new(),
            mime_type: container.mime_type().map(str::to_owned),
            parser: "",
        }
    }

    /// Adds a video stream, replacing any previous stream with the same id.
    pub fn add_video(&mut self, stream: VideoStream) {
        if let Some(existing) = self.video_streams.iter_mut().find(|s| s.id == stream.id) {
            *existing = stream;
        } else {
            self.video_streams.push(stream);
        }
    }

    /// Adds an audio stream, replacing any previous stream with the same id.
    pub fn add_audio(&mut self, stream: AudioStream) {
        if let Some(existing) = self.audio_streams.iter_mut().find(|s| s.id == stream.id) {
            *existing = stream;
        } else {
            self.audio_streams.push(stream);
        }
    }

    /// Total number of streams.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.video_streams.len() + self.audio_streams.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_ids_stay_unique() {
        let mut info = MediaInfo::new(ContainerFormat::MpegTs);

        let mut first = AudioStream::new(256, AudioCodec::Aac);
        first.sample_rate = Some(44100);
        info.add_audio(first);

        let mut refined = AudioStream::new(256, AudioCodec::Aac);
        refined.sample_rate = Some(48000);
        refined.channel_count = Some(2);
        info.add_audio(refined);

        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.audio_streams[0].sample_rate, Some(48000));

        info.add_audio(AudioStream::new(257, AudioCodec::Ac3));
        assert_eq!(info.stream_count(), 2);
    }

    #[test]
    fn test_mime_type_follows_container() {
        let info = MediaInfo::new(ContainerFormat::Webm);
        assert_eq!(info.mime_type.as_deref(), Some("video/webm"));
    }
}
