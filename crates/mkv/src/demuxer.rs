use bytes_util::{ChunkBuffer, ChunkSource};
use media_types::{
    AudioCodec, AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, VideoCodec,
    VideoStream,
};
use tracing::{debug, trace};

use crate::codec_private::{CodecPrivate, pcm_codec};
use crate::ebml::{parse_vint_id, parse_vint_size};
use crate::element_ids as ids;
use crate::Result;

/// Default refill target while walking header elements.
const REFILL_TARGET: usize = 64 * 1024;

/// Leaf elements larger than this are never buffered; nothing the track
/// description needs is that big.
const MAX_LEAF_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct MasterScope {
    id: u64,
    /// Absolute input offset where the scope ends; `None` for unknown
    /// size.
    end: Option<u64>,
}

#[derive(Debug, Default, Clone)]
struct TrackBuilder {
    number: Option<u64>,
    track_type: Option<u64>,
    codec_id: Option<String>,
    codec_private: Option<Vec<u8>>,
    sampling_frequency: Option<f64>,
    channels: Option<u64>,
    bit_depth: Option<u64>,
    pixel_width: Option<u64>,
    pixel_height: Option<u64>,
}

/// Progressive Matroska/WebM demuxer.
///
/// Consumes header elements until the first Cluster (or an unknown-size
/// element that announces the unbounded live payload), then reports the
/// tracks seen so far.
#[derive(Debug, Default)]
pub struct MkvDemuxer {
    doc_type: Option<String>,
    timecode_scale: u64,
    duration_ticks: Option<f64>,
    tracks: Vec<TrackBuilder>,
    current_track: Option<TrackBuilder>,
    stack: Vec<MasterScope>,
}

/// Parses metadata from a Matroska/WebM stream.
pub fn parse_mkv<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    MkvDemuxer::new().parse(source)
}

impl MkvDemuxer {
    /// Creates a demuxer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timecode_scale: 1_000_000,
            ..Self::default()
        }
    }

    /// Consumes the source until the metadata is complete and returns the
    /// stream description.
    pub fn parse<S: ChunkSource>(mut self, source: S) -> Result<MediaInfo> {
        let mut buf = ChunkBuffer::new(source);

        // The file must open with the EBML head.
        buf.ensure(4)?;
        if buf.data().len() < 4 || buf.data()[..4] != [0x1A, 0x45, 0xDF, 0xA3] {
            return Err(ProbeError::unsupported("not an EBML document"));
        }

        loop {
            self.close_finished_scopes(buf.total_consumed());

            // Element ID.
            let id = loop {
                match parse_vint_id(buf.data())? {
                    Some(vint) => break vint,
                    None => {
                        if !buf.fill()? {
                            return self.finish(true);
                        }
                    }
                }
            };

            // Element size.
            let size = loop {
                match parse_vint_size(&buf.data()[id.width..])? {
                    Some(vint) => break vint,
                    None => {
                        if !buf.fill()? {
                            return self.finish(true);
                        }
                    }
                }
            };
            let (size_value, size_width) = size;
            let header_len = id.width + size_width;

            trace!(id = format_args!("{:#x}", id.value), size = ?size_value, "element");

            if ids::is_master(id.value) {
                if id.value == ids::CLUSTER {
                    // Metadata is complete once payload begins.
                    return self.finish(false);
                }

                buf.consume(header_len);
                if id.value == ids::TRACK_ENTRY {
                    self.current_track = Some(TrackBuilder::default());
                }
                let end = size_value.map(|s| buf.total_consumed() + s);
                self.stack.push(MasterScope { id: id.value, end });
                continue;
            }

            let Some(content_len) = size_value else {
                // An unknown-size leaf announces an unbounded live
                // payload; whatever metadata exists is all there will be.
                debug!("unknown-size element, ending metadata parse");
                return self.finish(false);
            };

            if id.value == ids::SIMPLE_BLOCK {
                return self.finish(false);
            }

            if content_len > MAX_LEAF_SIZE {
                return Err(ProbeError::unsupported(format!(
                    "EBML leaf element of {content_len} bytes exceeds the parse limit"
                )));
            }

            // Refill to the default target, raised to the element size for
            // a large leaf.
            let total = header_len + content_len as usize;
            if !buf.ensure(total.max(REFILL_TARGET))? && buf.available() < total {
                return self.finish(true);
            }

            {
                let content = &buf.data()[header_len..total];
                self.handle_leaf(id.value, content)?;
            }
            buf.consume(total);
        }
    }

    fn close_finished_scopes(&mut self, offset: u64) {
        while self
            .stack
            .last()
            .is_some_and(|scope| scope.end.is_some_and(|end| offset >= end))
        {
            if let Some(scope) = self.stack.pop() {
                if scope.id == ids::TRACK_ENTRY {
                    self.commit_track();
                }
            }
        }
    }

    fn commit_track(&mut self) {
        if let Some(track) = self.current_track.take() {
            if track.number.is_some() {
                self.tracks.push(track);
            } else {
                // A TrackEntry without a TrackNumber cannot be addressed;
                // drop the partial track.
                debug!("discarding TrackEntry without TrackNumber");
            }
        }
    }

    fn in_scope(&self, id: u64) -> bool {
        self.stack.iter().any(|scope| scope.id == id)
    }

    fn handle_leaf(&mut self, id: u64, content: &[u8]) -> Result<()> {
        match id {
            ids::DOC_TYPE => {
                let doc_type = ebml_string(content);
                if doc_type != "webm" && doc_type != "matroska" {
                    return Err(ProbeError::unsupported(format!(
                        "unsupported EBML DocType {doc_type:?}"
                    )));
                }
                self.doc_type = Some(doc_type);
            }
            ids::TIMECODE_SCALE if self.in_scope(ids::INFO) => {
                self.timecode_scale = ebml_uint(content);
            }
            ids::DURATION if self.in_scope(ids::INFO) => {
                self.duration_ticks = ebml_float(content);
            }
            _ if self.in_scope(ids::TRACK_ENTRY) => {
                if let Some(track) = self.current_track.as_mut() {
                    match id {
                        ids::TRACK_NUMBER => track.number = Some(ebml_uint(content)),
                        ids::TRACK_TYPE => track.track_type = Some(ebml_uint(content)),
                        ids::CODEC_ID => track.codec_id = Some(ebml_string(content)),
                        ids::CODEC_PRIVATE => track.codec_private = Some(content.to_vec()),
                        ids::SAMPLING_FREQUENCY if self.stack.last().is_some_and(|s| s.id == ids::AUDIO) => {
                            track.sampling_frequency = ebml_float(content);
                        }
                        ids::CHANNELS => track.channels = Some(ebml_uint(content)),
                        ids::BIT_DEPTH => track.bit_depth = Some(ebml_uint(content)),
                        ids::PIXEL_WIDTH => track.pixel_width = Some(ebml_uint(content)),
                        ids::PIXEL_HEIGHT => track.pixel_height = Some(ebml_uint(content)),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self, at_eof: bool) -> Result<MediaInfo> {
        // Close whatever scopes are still open, committing a pending
        // track.
        self.commit_track();

        let Some(doc_type) = self.doc_type.clone() else {
            return Err(ProbeError::unsupported("EBML document without a DocType"));
        };

        if self.tracks.is_empty() {
            return Err(ProbeError::unsupported(if at_eof {
                "input ended before any Matroska track was declared"
            } else {
                "Matroska segment declares no tracks"
            }));
        }

        let container = if doc_type == "webm" {
            ContainerFormat::Webm
        } else {
            ContainerFormat::Mkv
        };
        let mut info = MediaInfo::new(container);
        info.container_detail = Some(doc_type);
        info.duration_seconds = self
            .duration_ticks
            .map(|ticks| ticks * self.timecode_scale as f64 / 1e9);

        let tracks = std::mem::take(&mut self.tracks);
        for track in tracks {
            self.surface_track(&mut info, track);
        }

        if info.stream_count() == 0 {
            return Err(ProbeError::unsupported(
                "no audio or video tracks recognized",
            ));
        }

        debug!(
            audio = info.audio_streams.len(),
            video = info.video_streams.len(),
            "matroska metadata complete"
        );
        Ok(info)
    }

    fn surface_track(&self, info: &mut MediaInfo, track: TrackBuilder) {
        let Some(number) = track.number else { return };
        let codec_id = track.codec_id.clone().unwrap_or_default();
        let private = CodecPrivate::parse(
            &codec_id,
            track.codec_private.as_deref().unwrap_or_default(),
        );

        match track.track_type {
            // 1 = video
            Some(1) => {
                let mut stream = VideoStream::new(
                    number as u32,
                    VideoCodec::from_alias(&codec_id).unwrap_or(VideoCodec::Unknown),
                );
                stream.codec_detail = Some(codec_id);
                stream.width = track.pixel_width.map(|w| w as u32);
                stream.height = track.pixel_height.map(|h| h as u32);

                match private {
                    CodecPrivate::MsVfwFourcc { fourcc, codec } => {
                        if let Some(codec) = codec {
                            stream.codec = codec;
                        }
                        stream.codec_detail = Some(fourcc);
                    }
                    CodecPrivate::Avc(record) => {
                        stream.codec_detail = Some(record.rfc6381_codec());
                        if let Some(sps) = &record.sps {
                            stream.width = stream.width.or(Some(sps.width));
                            stream.height = stream.height.or(Some(sps.height));
                            stream.profile = Some(sps.profile_name().to_owned());
                            stream.level = Some(sps.level_name());
                        }
                    }
                    _ => {}
                }

                info.add_video(stream);
            }
            // 2 = audio
            Some(2) => {
                let bit_depth = track.bit_depth.map(|b| b as u32);
                let codec = AudioCodec::from_alias(&codec_id)
                    .or_else(|| pcm_codec(&codec_id, bit_depth.unwrap_or(16)))
                    .unwrap_or(AudioCodec::Unknown);

                let mut stream = AudioStream::new(number as u32, codec);
                stream.codec_detail = Some(codec_id.clone());
                stream.sample_rate = track.sampling_frequency.map(|f| f.round() as u32);
                stream.channel_count = track.channels.map(|c| c as u32);
                stream.bits_per_sample = bit_depth;

                match private {
                    CodecPrivate::Vorbis(id) => {
                        stream.sample_rate = stream.sample_rate.or(Some(id.sample_rate));
                        stream.channel_count =
                            stream.channel_count.or(Some(id.channels as u32));
                        stream.bitrate = id.bitrate_nominal.map(u64::from);
                    }
                    CodecPrivate::Opus(head) => {
                        stream.channel_count = Some(head.channels as u32);
                        // Opus always plays at 48 kHz; surface the source
                        // rate only when it differs.
                        if head.input_sample_rate != 48_000 {
                            stream.sample_rate = Some(head.input_sample_rate);
                        } else {
                            stream.sample_rate = stream.sample_rate.or(Some(48_000));
                        }
                    }
                    CodecPrivate::Flac(streaminfo) => {
                        stream.sample_rate = Some(streaminfo.sample_rate);
                        stream.channel_count = Some(streaminfo.channels as u32);
                        stream.bits_per_sample = Some(streaminfo.bits_per_sample as u32);
                    }
                    CodecPrivate::MsAcm(format) => {
                        stream.codec = format.codec();
                        stream.codec_detail =
                            format.format_name().map(str::to_owned).or(stream.codec_detail);
                        stream.sample_rate = Some(format.samples_per_sec);
                        stream.channel_count = Some(format.channels as u32);
                        stream.bitrate = Some(format.bitrate());
                        stream.bits_per_sample = match format.format_tag {
                            // 4-bit ADPCM families.
                            waveformat::format_tag::MS_ADPCM
                            | waveformat::format_tag::IMA_ADPCM => Some(4),
                            _ => Some(format.bits_per_sample as u32),
                        };
                        stream.extra = Some(AudioExtra::Wave {
                            format_tag: format.format_tag,
                            block_align: format.block_align,
                            avg_bytes_per_sec: format.avg_bytes_per_sec,
                        });
                    }
                    _ => {}
                }

                if matches!(
                    stream.codec,
                    AudioCodec::PcmU8
                        | AudioCodec::PcmS16Le
                        | AudioCodec::PcmS16Be
                        | AudioCodec::PcmS24Le
                        | AudioCodec::PcmS24Be
                        | AudioCodec::PcmS32Le
                        | AudioCodec::PcmS32Be
                        | AudioCodec::PcmF32Le
                ) {
                    if let (Some(rate), Some(channels), Some(bits)) = (
                        stream.sample_rate,
                        stream.channel_count,
                        stream.bits_per_sample,
                    ) {
                        stream.bitrate =
                            Some(rate as u64 * channels as u64 * bits as u64);
                    }
                }

                info.add_audio(stream);
            }
            _ => {
                trace!(number, "skipping non-audio/video track");
            }
        }
    }
}

/// Big-endian unsigned integer of 0-8 bytes.
fn ebml_uint(content: &[u8]) -> u64 {
    let mut value = 0u64;
    for &byte in content.iter().take(8) {
        value = (value << 8) | byte as u64;
    }
    value
}

/// 32- or 64-bit IEEE float; anything else is ignored.
fn ebml_float(content: &[u8]) -> Option<f64> {
    match content.len() {
        4 => Some(f32::from_be_bytes(content.try_into().ok()?) as f64),
        8 => Some(f64::from_be_bytes(content.try_into().ok()?)),
        _ => None,
    }
}

/// ASCII/UTF-8 string with trailing NUL padding removed.
fn ebml_string(content: &[u8]) -> String {
    let trimmed = content
        .iter()
        .rposition(|&b| b != 0)
        .map_or(&content[..0], |last| &content[..=last]);
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(test)]
mod tests {
    use bytes_util::SliceSource;

    use super::*;
    use crate::ebml::encode_vint;

    fn element(id: u64, body: &[u8]) -> Vec<u8> {
        let mut out = id_bytes(id);
        out.extend_from_slice(&encode_vint(body.len() as u64));
        out.extend_from_slice(body);
        out
    }

    fn id_bytes(id: u64) -> Vec<u8> {
        let width = (8 - id.leading_zeros() as usize / 8).max(1);
        let mut out = Vec::with_capacity(width);
        for i in (0..width).rev() {
            out.push((id >> (8 * i)) as u8);
        }
        out
    }

    fn ebml_head(doc_type: &str) -> Vec<u8> {
        element(ids::EBML, &element(ids::DOC_TYPE, doc_type.as_bytes()))
    }

    fn info(duration_ticks: f32) -> Vec<u8> {
        let mut body = element(ids::TIMECODE_SCALE, &[0x0F, 0x42, 0x40]); // 1_000_000
        body.extend_from_slice(&element(ids::DURATION, &duration_ticks.to_be_bytes()));
        element(ids::INFO, &body)
    }

    fn video_track(number: u8, codec_id: &str, width: u16, height: u16) -> Vec<u8> {
        let mut body = element(ids::TRACK_NUMBER, &[number]);
        body.extend_from_slice(&element(ids::TRACK_TYPE, &[1]));
        body.extend_from_slice(&element(ids::CODEC_ID, codec_id.as_bytes()));
        let mut video = element(ids::PIXEL_WIDTH, &width.to_be_bytes());
        video.extend_from_slice(&element(ids::PIXEL_HEIGHT, &height.to_be_bytes()));
        body.extend_from_slice(&element(ids::VIDEO, &video));
        element(ids::TRACK_ENTRY, &body)
    }

    fn audio_track(number: u8, codec_id: &str, private: Option<&[u8]>) -> Vec<u8> {
        let mut body = element(ids::TRACK_NUMBER, &[number]);
        body.extend_from_slice(&element(ids::TRACK_TYPE, &[2]));
        body.extend_from_slice(&element(ids::CODEC_ID, codec_id.as_bytes()));
        if let Some(private) = private {
            body.extend_from_slice(&element(ids::CODEC_PRIVATE, private));
        }
        let mut audio = element(ids::SAMPLING_FREQUENCY, &48000.0f32.to_be_bytes());
        audio.extend_from_slice(&element(ids::CHANNELS, &[2]));
        body.extend_from_slice(&element(ids::AUDIO, &audio));
        element(ids::TRACK_ENTRY, &body)
    }

    fn opus_head() -> Vec<u8> {
        let mut head = b"OpusHead".to_vec();
        head.push(1);
        head.push(2);
        head.extend_from_slice(&312u16.to_le_bytes());
        head.extend_from_slice(&48000u32.to_le_bytes());
        head.extend_from_slice(&0i16.to_le_bytes());
        head.push(0);
        head
    }

    fn webm_with_cluster() -> Vec<u8> {
        let mut tracks_body = video_track(1, "V_VP9", 1920, 1080);
        tracks_body.extend_from_slice(&audio_track(2, "A_OPUS", Some(&opus_head())));

        let mut segment_body = info(6000.0);
        segment_body.extend_from_slice(&element(ids::TRACKS, &tracks_body));
        // A cluster with a timecode and one SimpleBlock.
        let mut cluster_body = element(ids::TIMECODE, &[0x00]);
        let mut block = vec![0x81, 0x00, 0x00, 0x80];
        block.extend_from_slice(&[0xAB; 16]);
        cluster_body.extend_from_slice(&element(ids::SIMPLE_BLOCK, &block));
        segment_body.extend_from_slice(&element(ids::CLUSTER, &cluster_body));

        let mut file = ebml_head("webm");
        file.extend_from_slice(&element(ids::SEGMENT, &segment_body));
        file
    }

    #[test]
    fn test_webm_vp9_opus() {
        let data = webm_with_cluster();
        let info = parse_mkv(SliceSource::with_chunk_size(data, 13)).unwrap();

        assert_eq!(info.container, ContainerFormat::Webm);
        assert_eq!(info.container_detail.as_deref(), Some("webm"));
        assert!((info.duration_seconds.unwrap() - 6.0).abs() < 1e-9);

        assert_eq!(info.video_streams.len(), 1);
        let video = &info.video_streams[0];
        assert_eq!(video.id, 1);
        assert_eq!(video.codec, VideoCodec::Vp9);
        assert_eq!(video.width, Some(1920));
        assert_eq!(video.height, Some(1080));

        assert_eq!(info.audio_streams.len(), 1);
        let audio = &info.audio_streams[0];
        assert_eq!(audio.id, 2);
        assert_eq!(audio.codec, AudioCodec::Opus);
        assert_eq!(audio.sample_rate, Some(48000));
        assert_eq!(audio.channel_count, Some(2));
    }

    #[test]
    fn test_header_only_file_reports_at_eof() {
        let mut file = ebml_head("matroska");
        let mut segment_body = info(1000.0);
        segment_body
            .extend_from_slice(&element(ids::TRACKS, &audio_track(1, "A_FLAC", None)));
        file.extend_from_slice(&element(ids::SEGMENT, &segment_body));

        let info = parse_mkv(SliceSource::new(file)).unwrap();
        assert_eq!(info.container, ContainerFormat::Mkv);
        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.audio_streams[0].codec, AudioCodec::Flac);
    }

    #[test]
    fn test_track_without_number_discarded() {
        let mut bad_track = element(ids::TRACK_TYPE, &[2]);
        bad_track.extend_from_slice(&element(ids::CODEC_ID, b"A_OPUS"));
        let bad_track = element(ids::TRACK_ENTRY, &bad_track);

        let mut tracks_body = bad_track;
        tracks_body.extend_from_slice(&audio_track(3, "A_OPUS", Some(&opus_head())));

        let mut file = ebml_head("webm");
        let mut segment_body = info(100.0);
        segment_body.extend_from_slice(&element(ids::TRACKS, &tracks_body));
        file.extend_from_slice(&element(ids::SEGMENT, &segment_body));

        let info = parse_mkv(SliceSource::new(file)).unwrap();
        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.audio_streams[0].id, 3);
    }

    #[test]
    fn test_rejects_foreign_doctype() {
        let file = ebml_head("mystery");
        let err = parse_mkv(SliceSource::new(file)).unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_non_ebml() {
        let err = parse_mkv(SliceSource::new(vec![0x00u8; 64])).unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_ms_acm_track() {
        let format = waveformat::WaveFormatEx {
            format_tag: waveformat::format_tag::MS_ADPCM,
            channels: 2,
            samples_per_sec: 22050,
            avg_bytes_per_sec: 22311,
            block_align: 1024,
            bits_per_sample: 4,
            extra: waveformat::WaveFormatExtra::None,
        };

        let mut file = ebml_head("matroska");
        let mut segment_body = info(100.0);
        segment_body.extend_from_slice(&element(
            ids::TRACKS,
            &audio_track(1, "A_MS/ACM", Some(&format.build())),
        ));
        file.extend_from_slice(&element(ids::SEGMENT, &segment_body));

        let info = parse_mkv(SliceSource::new(file)).unwrap();
        let audio = &info.audio_streams[0];
        assert_eq!(audio.codec, AudioCodec::AdpcmMs);
        assert_eq!(audio.bits_per_sample, Some(4));
        assert_eq!(audio.bitrate, Some(22311 * 8));
        assert_eq!(audio.sample_rate, Some(22050));
    }
}
