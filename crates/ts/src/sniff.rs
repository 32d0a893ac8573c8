use aac::{AdtsHeader, parse_latm};
use h264::{NalUnitType, Sps, find_nal_units};
use media_types::{AudioCodec, VideoCodec};
use memchr::memmem;
use mpeg2::SequenceHeader;
use mpegaudio::{FrameHeader, Layer};

/// How far into a PES payload the audio syncwords are searched for.
const AUDIO_SYNC_SCAN: usize = 20;

/// What payload sniffing established about an audio elementary stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSniff {
    /// Refined codec kind.
    pub codec: AudioCodec,
    /// Codec detail label.
    pub detail: Option<String>,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Channel count.
    pub channel_count: Option<u32>,
    /// Profile name.
    pub profile: Option<String>,
    /// Bitrate in bits per second.
    pub bitrate: Option<u64>,
    /// MPEG audio layer, when applicable.
    pub layer: Option<u8>,
    /// Padding bit of the sampled frame, when applicable.
    pub padding: Option<bool>,
}

/// What payload sniffing established about a video elementary stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSniff {
    /// Refined codec kind.
    pub codec: VideoCodec,
    /// Codec detail label (RFC 6381 for H.264).
    pub detail: Option<String>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// Frame rate, when the headers carry one.
    pub fps: Option<f64>,
    /// Profile name.
    pub profile: Option<String>,
    /// Level.
    pub level: Option<String>,
}

/// Looks for an ADTS or LATM syncword near the start of a payload and
/// decodes the matching header.
#[must_use]
pub fn sniff_aac(payload: &[u8]) -> Option<AudioSniff> {
    let scan_end = payload.len().min(AUDIO_SYNC_SCAN);

    for pos in 0..scan_end {
        let window = &payload[pos..];

        // ADTS: 12-bit sync with zero layer bits.
        if let Ok(header) = AdtsHeader::parse(window) {
            return Some(AudioSniff {
                codec: AudioCodec::Aac,
                detail: Some(header.audio_object_type.detail()),
                sample_rate: Some(header.sample_rate),
                channel_count: header.channel_count.map(u32::from),
                profile: Some(header.audio_object_type.profile_name().to_owned()),
                bitrate: None,
                layer: None,
                padding: None,
            });
        }

        // LATM/LOAS: 11-bit sync 0x2B7 (0x56 0xE_).
        if aac::has_loas_sync(window) {
            if let Ok(mux) = parse_latm(window) {
                return Some(latm_sniff(&mux));
            }
        }
    }

    None
}

fn latm_sniff(mux: &aac::LatmMux) -> AudioSniff {
    AudioSniff {
        codec: AudioCodec::AacLatm,
        detail: Some(mux.config.detail()),
        sample_rate: Some(mux.config.sampling_frequency),
        channel_count: mux.config.channel_count().map(u32::from),
        profile: Some(mux.config.audio_object_type.profile_name().to_owned()),
        bitrate: None,
        layer: None,
        padding: None,
    }
}

/// Looks for an MPEG audio frame sync and decodes the frame header.
#[must_use]
pub fn sniff_mpeg_audio(payload: &[u8]) -> Option<AudioSniff> {
    let scan_end = payload.len().min(AUDIO_SYNC_SCAN);

    for pos in 0..scan_end {
        if let Ok(header) = FrameHeader::parse(&payload[pos..]) {
            let codec = match header.layer {
                Layer::I => AudioCodec::Mp1,
                Layer::II => AudioCodec::Mp2,
                Layer::III => AudioCodec::Mp3,
            };
            return Some(AudioSniff {
                codec,
                detail: None,
                sample_rate: Some(header.sample_rate),
                channel_count: Some(header.channel_count() as u32),
                profile: None,
                bitrate: header.bitrate.map(u64::from),
                layer: Some(header.layer.number()),
                padding: Some(header.padding),
            });
        }
    }

    None
}

/// Scans for an SPS NAL unit and decodes it.
#[must_use]
pub fn sniff_h264(payload: &[u8]) -> Option<VideoSniff> {
    for unit in find_nal_units(payload) {
        if unit.nal_type != NalUnitType::SequenceParameterSet {
            continue;
        }
        if let Ok(sps) = Sps::parse(unit.data) {
            return Some(VideoSniff {
                codec: VideoCodec::H264,
                detail: Some(sps.rfc6381_codec()),
                width: Some(sps.width),
                height: Some(sps.height),
                fps: None,
                profile: Some(sps.profile_name().to_owned()),
                level: Some(sps.level_name()),
            });
        }
    }
    None
}

/// Scans for an MPEG-2 sequence header.
#[must_use]
pub fn sniff_mpeg2_video(payload: &[u8]) -> Option<VideoSniff> {
    let pos = memmem::find(payload, &mpeg2::SEQUENCE_HEADER_CODE)?;
    let header = SequenceHeader::parse(&payload[pos..]).ok()?;
    Some(VideoSniff {
        codec: VideoCodec::Mpeg2Video,
        detail: None,
        width: Some(header.width),
        height: Some(header.height),
        fps: header.frame_rate,
        profile: None,
        level: None,
    })
}

/// Sniffing order for private (stream type 0x06) payloads: a LATM mux
/// config at byte 0, then MPEG audio, then ADTS.
#[must_use]
pub fn sniff_private(payload: &[u8]) -> Option<AudioSniff> {
    if let Ok(mux) = parse_latm(payload) {
        return Some(latm_sniff(&mux));
    }
    if let Some(sniff) = sniff_mpeg_audio(payload) {
        return Some(sniff);
    }
    sniff_aac(payload)
}
