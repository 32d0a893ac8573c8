use bytes_util::{ChunkBuffer, ChunkSource};
use media_types::{
    AudioCodec, AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, VideoCodec,
    VideoStream,
};
use tracing::{debug, trace};

use crate::Result;
use crate::klv::{KlvKind, PARTITION_KEY_PREFIX, parse_klv_header};
use crate::metadata::{MetadataSet, SetArena, set_kind, tag};
use crate::partition::operational_pattern;

/// Essence values are streamed to the sink in chunks of at most this
/// size.
const ESSENCE_CHUNK: usize = 64 * 1024;

/// Values the metadata walk buffers are capped at this size.
const MAX_METADATA_VALUE: u64 = 16 * 1024 * 1024;

/// Essence-extraction request.
pub struct MxfExtract<'a> {
    /// Receives `(essence_track_number, bytes)` for every essence KLV, in
    /// file order. Large values arrive in multiple chunks.
    pub on_essence: Box<dyn FnMut(u16, &[u8]) -> Result<()> + 'a>,
}

/// MXF demuxer: KLV walk, metadata-set graph resolution, optional essence
/// streaming.
pub struct MxfDemuxer<'a> {
    extract: Option<MxfExtract<'a>>,
}

/// Parses metadata from an MXF byte stream.
pub fn parse_mxf<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    MxfDemuxer::new().parse(source)
}

impl Default for MxfDemuxer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MxfDemuxer<'a> {
    /// Creates a metadata-only demuxer.
    #[must_use]
    pub fn new() -> Self {
        Self { extract: None }
    }

    /// Creates a demuxer that also hands essence KLV values to the sink.
    #[must_use]
    pub fn with_extract(extract: MxfExtract<'a>) -> Self {
        Self {
            extract: Some(extract),
        }
    }

    /// Consumes the source and returns the stream description.
    pub fn parse<S: ChunkSource>(mut self, source: S) -> Result<MediaInfo> {
        let mut buf = ChunkBuffer::new(source);

        buf.require(16)?;
        if buf.data()[..7] != PARTITION_KEY_PREFIX {
            return Err(ProbeError::unsupported("first KLV key is not a partition pack"));
        }

        let mut arena = SetArena::new();
        let mut op_label: Option<String> = None;

        loop {
            let header = loop {
                match parse_klv_header(buf.data())? {
                    Some(header) => break Some(header),
                    None => {
                        if !buf.fill()? {
                            break None;
                        }
                    }
                }
            };
            let Some(header) = header else { break };

            let kind = header.kind();
            let Some(length) = header.length else {
                // Undefined-length KLV: without an index there is no way
                // to find the next key, so the metadata walk ends here.
                debug!("undefined-length KLV, ending metadata walk");
                break;
            };

            match kind {
                KlvKind::MetadataSet | KlvKind::PartitionPack => {
                    if length > MAX_METADATA_VALUE {
                        return Err(ProbeError::unsupported(format!(
                            "metadata KLV of {length} bytes exceeds the parse limit"
                        )));
                    }
                    let total = header.header_len + length as usize;
                    if !buf.ensure(total)? {
                        break;
                    }

                    {
                        let value = &buf.data()[header.header_len..total];
                        match kind {
                            KlvKind::PartitionPack => {
                                if op_label.is_none() {
                                    op_label = operational_pattern(value);
                                    trace!(op = ?op_label, "partition pack");
                                }
                            }
                            _ => {
                                arena.insert(MetadataSet::parse(header.key, value));
                            }
                        }
                    }
                    buf.consume(total);
                }
                KlvKind::Essence { track_number } => {
                    buf.consume(header.header_len);
                    self.stream_essence(&mut buf, track_number, length)?;

                    // Metadata precedes essence; without extraction there
                    // is nothing further to learn.
                    if self.extract.is_none() {
                        break;
                    }
                }
                KlvKind::Other => {
                    buf.consume(header.header_len);
                    skip_value(&mut buf, length)?;
                }
            }
        }

        build_media_info(&arena, op_label)
    }

    fn stream_essence<S: ChunkSource>(
        &mut self,
        buf: &mut ChunkBuffer<S>,
        track_number: u16,
        length: u64,
    ) -> Result<()> {
        match self.extract.as_mut() {
            Some(extract) => {
                let mut remaining = length;
                while remaining > 0 {
                    let chunk = (remaining as usize).min(ESSENCE_CHUNK);
                    if !buf.ensure(chunk)? {
                        return Err(ProbeError::InsufficientData {
                            needed: chunk,
                            available: buf.available(),
                        });
                    }
                    (extract.on_essence)(track_number, &buf.data()[..chunk])?;
                    buf.consume(chunk);
                    remaining -= chunk as u64;
                }
                Ok(())
            }
            None => skip_value(buf, length),
        }
    }
}

fn skip_value<S: ChunkSource>(buf: &mut ChunkBuffer<S>, length: u64) -> Result<()> {
    let mut remaining = length;
    while remaining > 0 {
        let chunk = (remaining as usize).min(ESSENCE_CHUNK);
        if !buf.ensure(chunk)? {
            // Truncated tail: drain what arrived so the caller sees a
            // clean end of input; the metadata already read stands.
            let available = buf.available();
            buf.consume(available);
            return Ok(());
        }
        buf.consume(chunk);
        remaining -= chunk as u64;
    }
    Ok(())
}

/// One resolved track of the material package.
struct ResolvedTrack {
    track_id: u32,
    edit_rate: Option<f64>,
    duration_seconds: Option<f64>,
    essence_track_number: Option<u32>,
    descriptor_uids: Vec<[u8; 16]>,
}

fn build_media_info(arena: &SetArena, op_label: Option<String>) -> Result<MediaInfo> {
    let material = arena
        .first_of_kind(set_kind::MATERIAL_PACKAGE)
        .ok_or_else(|| ProbeError::unsupported("MXF without a MaterialPackage"))?;

    let mut info = MediaInfo::new(ContainerFormat::Mxf);
    info.container_detail = op_label;

    let track_uids = material
        .get_uid_array(tag::PACKAGE_TRACKS)
        .unwrap_or_default();

    for track_uid in track_uids {
        let Some(track) = resolve_track(arena, &track_uid) else {
            continue;
        };
        surface_track(arena, &mut info, &track);

        if let Some(duration) = track.duration_seconds {
            let current = info.duration_seconds.unwrap_or(0.0);
            info.duration_seconds = Some(current.max(duration));
        }
    }

    if info.stream_count() == 0 {
        return Err(ProbeError::unsupported(
            "no audio or video tracks resolved from MXF metadata",
        ));
    }

    Ok(info)
}

fn resolve_track(arena: &SetArena, track_uid: &[u8; 16]) -> Option<ResolvedTrack> {
    let track = arena.by_uid(track_uid)?;
    if !matches!(
        track.kind(),
        set_kind::TIMELINE_TRACK | set_kind::STATIC_TRACK | set_kind::EVENT_TRACK
    ) {
        return None;
    }

    let track_id = track.get_uint(tag::TRACK_ID)? as u32;
    let edit_rate = track
        .get_rational(tag::EDIT_RATE)
        .and_then(|rate| rate.as_f64());

    let mut resolved = ResolvedTrack {
        track_id,
        edit_rate,
        duration_seconds: None,
        essence_track_number: None,
        descriptor_uids: Vec::new(),
    };

    // Walk the sequence's components, accumulating duration and chasing
    // the first SourceClip to its package.
    let sequence_uid = track.get(tag::SEQUENCE_REF)?.get(..16)?.try_into().ok()?;
    let sequence = arena.by_uid(&sequence_uid)?;
    let components = sequence
        .get_uid_array(tag::STRUCTURAL_COMPONENTS)
        .unwrap_or_default();

    for component_uid in components {
        let Some(component) = arena.by_uid(&component_uid) else {
            continue;
        };
        if component.kind() != set_kind::SOURCE_CLIP {
            continue;
        }

        if let (Some(duration), Some(rate)) =
            (component.get_uint(tag::COMPONENT_DURATION), edit_rate)
        {
            let seconds = duration as f64 / rate;
            resolved.duration_seconds =
                Some(resolved.duration_seconds.unwrap_or(0.0) + seconds);
        }

        if resolved.essence_track_number.is_none() {
            chase_source_package(arena, component, &mut resolved);
        }
    }

    Some(resolved)
}

fn chase_source_package(arena: &SetArena, clip: &MetadataSet, resolved: &mut ResolvedTrack) {
    let Some(package_id) = clip.get(tag::SOURCE_PACKAGE_ID) else {
        return;
    };
    let source_track_id = clip.get_uint(tag::SOURCE_TRACK_ID).map(|id| id as u32);

    // Resolve the package by PackageID (a UMID, compared bytewise).
    let Some(package) = arena.iter().find(|set| {
        set.kind() == set_kind::SOURCE_PACKAGE && set.get(tag::PACKAGE_ID) == Some(package_id)
    }) else {
        return;
    };

    // Locate the matching track of the source package.
    let package_tracks = package
        .get_uid_array(tag::PACKAGE_TRACKS)
        .unwrap_or_default();
    let mut matched_track = None;
    for uid in &package_tracks {
        let Some(track) = arena.by_uid(uid) else { continue };
        let track_id = track.get_uint(tag::TRACK_ID).map(|id| id as u32);
        if source_track_id.is_some() && track_id == source_track_id {
            matched_track = Some(track);
            break;
        }
        if matched_track.is_none() && track.get(tag::TRACK_NUMBER).is_some() {
            matched_track = Some(track);
        }
    }

    if let Some(track) = matched_track {
        // The high 16 bits of the track number match the essence keys.
        resolved.essence_track_number = track
            .get_uint(tag::TRACK_NUMBER)
            .map(|number| number as u32);
    }

    // Resolve the descriptor, expanding a MultipleDescriptor.
    let Some(descriptor_uid) = package
        .get(tag::DESCRIPTOR)
        .and_then(|bytes| bytes.get(..16))
        .and_then(|bytes| <[u8; 16]>::try_from(bytes).ok())
    else {
        return;
    };
    let Some(descriptor) = arena.by_uid(&descriptor_uid) else {
        return;
    };

    if descriptor.kind() == set_kind::MULTIPLE_DESCRIPTOR {
        resolved.descriptor_uids = descriptor
            .get_uid_array(tag::SUB_DESCRIPTORS)
            .unwrap_or_default();
    } else {
        resolved.descriptor_uids = vec![descriptor_uid];
    }
}

fn surface_track(arena: &SetArena, info: &mut MediaInfo, track: &ResolvedTrack) {
    for uid in &track.descriptor_uids {
        let Some(descriptor) = arena.by_uid(uid) else {
            continue;
        };

        if !descriptor_matches_track(descriptor, track) {
            continue;
        }

        match descriptor.kind() {
            set_kind::WAVE_DESCRIPTOR
            | set_kind::AES3_DESCRIPTOR
            | set_kind::GENERIC_SOUND_DESCRIPTOR => {
                surface_audio(info, track, descriptor);
            }
            set_kind::MPEG2_VIDEO_DESCRIPTOR | set_kind::CDCI_DESCRIPTOR => {
                surface_video(info, track, descriptor);
            }
            other => {
                trace!(kind = other, "ignoring descriptor kind");
            }
        }
    }
}

/// A descriptor belongs to a track when its LinkedTrackID matches, or, in
/// its absence, when the essence-track-number category byte agrees with
/// the descriptor family.
fn descriptor_matches_track(descriptor: &MetadataSet, track: &ResolvedTrack) -> bool {
    if let Some(linked) = descriptor.get_uint(tag::LINKED_TRACK_ID) {
        return linked as u32 == track.track_id;
    }

    let Some(number) = track.essence_track_number else {
        // Nothing to correlate on; accept.
        return true;
    };
    let category = (number >> 24) as u8;
    match descriptor.kind() {
        set_kind::MPEG2_VIDEO_DESCRIPTOR | set_kind::CDCI_DESCRIPTOR => category == 0x15,
        _ => category == 0x16,
    }
}

fn surface_audio(info: &mut MediaInfo, track: &ResolvedTrack, descriptor: &MetadataSet) {
    let sample_rate = descriptor
        .get_rational(tag::SOUND_SAMPLE_RATE)
        .and_then(|rate| rate.as_f64())
        .map(|rate| rate.round() as u32);
    let channels = descriptor.get_uint(tag::CHANNEL_COUNT).map(|c| c as u32);
    let bits = descriptor.get_uint(tag::QUANTIZATION_BITS).map(|b| b as u32);

    let codec = descriptor
        .get(tag::SOUND_ESSENCE_CODING)
        .and_then(sound_coding_codec)
        .unwrap_or_else(|| AudioCodec::pcm_for_depth(bits.unwrap_or(16), false));

    let mut stream = AudioStream::new(track.track_id, codec);
    stream.sample_rate = sample_rate;
    stream.channel_count = channels;
    stream.bits_per_sample = bits;
    if let (Some(rate), Some(channels), Some(bits)) = (sample_rate, channels, bits) {
        stream.bitrate = Some(rate as u64 * channels as u64 * bits as u64);
    }
    if let Some(number) = track.essence_track_number {
        stream.extra = Some(AudioExtra::MxfEssence {
            track_number: number,
        });
    }

    debug!(track = track.track_id, codec = ?stream.codec, "MXF audio track");
    info.add_audio(stream);
}

fn surface_video(info: &mut MediaInfo, track: &ResolvedTrack, descriptor: &MetadataSet) {
    let is_mpeg2 = descriptor.kind() == set_kind::MPEG2_VIDEO_DESCRIPTOR
        || descriptor
            .get(tag::PICTURE_ESSENCE_CODING)
            .is_some_and(is_mpeg2_coding);

    let codec = if is_mpeg2 {
        VideoCodec::Mpeg2Video
    } else {
        VideoCodec::Unknown
    };

    let mut stream = VideoStream::new(track.track_id, codec);
    stream.width = descriptor.get_uint(tag::STORED_WIDTH).map(|w| w as u32);
    stream.height = descriptor.get_uint(tag::STORED_HEIGHT).map(|h| h as u32);
    stream.fps = track.edit_rate;

    // Profile from the MPEG video property, or from the coding label.
    stream.profile = descriptor
        .get(tag::MPEG_VIDEO_PROFILE)
        .and_then(|bytes| bytes.first().copied())
        .and_then(|byte| mpeg2::profile_name((byte & 0x70) >> 4))
        .or_else(|| {
            descriptor
                .get(tag::PICTURE_ESSENCE_CODING)
                .and_then(|ul| ul.get(13).copied())
                .and_then(|byte| mpeg2::profile_name(byte & 0x07))
        })
        .map(str::to_owned);

    debug!(track = track.track_id, codec = ?stream.codec, "MXF video track");
    info.add_video(stream);
}

/// SMPTE sound-essence-coding labels; byte 11 distinguishes the families
/// this probe can name.
fn sound_coding_codec(ul: &[u8]) -> Option<AudioCodec> {
    if ul.len() < 16 || ul[..4] != [0x06, 0x0E, 0x2B, 0x34] {
        return None;
    }
    // 04 02 02 02 03 02 .. : compressed sound codings.
    if ul[8..12] == [0x04, 0x02, 0x02, 0x02] {
        return match ul[12..14] {
            [0x03, 0x02] => Some(AudioCodec::Ac3),
            [0x03, 0x01] => Some(AudioCodec::Mp2),
            _ => None,
        };
    }
    // Uncompressed sound coding: defer to the quantization bits.
    None
}

fn is_mpeg2_coding(ul: &[u8]) -> bool {
    // 04 01 02 02 01 .. : MPEG picture coding family.
    ul.len() >= 13 && ul[..4] == [0x06, 0x0E, 0x2B, 0x34] && ul[8..13] == [0x04, 0x01, 0x02, 0x02, 0x01]
}
