use bytes_util::{ChunkBuffer, ChunkSource, SliceReader};
use media_types::{
    AudioCodec, AudioStream, ContainerFormat, MediaInfo, ProbeError, VideoCodec, VideoStream,
};
use tracing::{debug, trace};

use crate::Result;
use crate::boxes::{BoxHeader, find_child, walk_children};
use crate::esds::parse_es_descriptor;

/// Boxes the metadata walk buffers are capped at this size.
const MAX_BUFFERED_BOX: u64 = 64 * 1024 * 1024;

/// Skip stride for boxes we pass over (mdat).
const SKIP_CHUNK: usize = 64 * 1024;

/// Parses metadata from an ISO-BMFF (MP4/MOV) byte stream.
pub fn parse_isobmff<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    let mut buf = ChunkBuffer::new(source);

    let mut container = ContainerFormat::Mp4;
    let mut container_detail = None;
    let mut saw_ftyp = false;
    let mut moov: Option<MovieInfo> = None;

    loop {
        let header = loop {
            match BoxHeader::parse(buf.data())? {
                Some(header) => break Some(header),
                None => {
                    if !buf.fill()? {
                        break None;
                    }
                }
            }
        };
        let Some(header) = header else { break };

        // The first box of a BMFF file is conventionally ftyp; anything
        // unboxlike was already rejected by the header parse above.
        match &header.box_type {
            b"ftyp" => {
                let content_size = header.content_size.unwrap_or(0) as usize;
                let total = header.header_len + content_size;
                buf.require(total)?;
                {
                    let content = &buf.data()[header.header_len..total];
                    (container, container_detail) = parse_ftyp(content);
                }
                saw_ftyp = true;
                buf.consume(total);
            }
            b"moov" => {
                let Some(content_size) = header.content_size else {
                    return Err(ProbeError::unsupported("moov box without a size"));
                };
                if content_size > MAX_BUFFERED_BOX {
                    return Err(ProbeError::unsupported("moov box exceeds the parse limit"));
                }
                let total = header.header_len + content_size as usize;
                buf.require(total)?;
                {
                    let content = &buf.data()[header.header_len..total];
                    moov = Some(parse_moov(content));
                }
                buf.consume(total);
                break;
            }
            _ => {
                trace!(box_type = %header.type_str(), "skipping box");
                buf.consume(header.header_len);
                match header.content_size {
                    Some(size) => skip_content(&mut buf, size)?,
                    // A to-end box (open-ended mdat); nothing follows.
                    None => break,
                }
            }
        }
    }

    let Some(movie) = moov else {
        return Err(ProbeError::unsupported(if saw_ftyp {
            "BMFF file without a moov box"
        } else {
            "not an ISO-BMFF file"
        }));
    };

    build_media_info(container, container_detail, movie)
}

fn skip_content<S: ChunkSource>(buf: &mut ChunkBuffer<S>, size: u64) -> Result<()> {
    let mut remaining = size;
    while remaining > 0 {
        let chunk = (remaining as usize).min(SKIP_CHUNK);
        if !buf.ensure(chunk)? {
            // Truncated tail: drain what arrived so the caller sees a
            // clean end of input instead of the same bytes again.
            let available = buf.available();
            buf.consume(available);
            return Ok(());
        }
        buf.consume(chunk);
        remaining -= chunk as u64;
    }
    Ok(())
}

fn parse_ftyp(content: &[u8]) -> (ContainerFormat, Option<String>) {
    let major = content
        .get(..4)
        .map(|b| String::from_utf8_lossy(b).trim().to_owned())
        .unwrap_or_default();

    let container = match major.as_str() {
        "qt" => ContainerFormat::Mov,
        "M4A" | "M4B" => ContainerFormat::M4a,
        _ => ContainerFormat::Mp4,
    };

    let detail = (!major.is_empty()).then_some(major);
    (container, detail)
}

#[derive(Debug, Default)]
struct MovieInfo {
    duration_seconds: Option<f64>,
    tracks: Vec<TrackInfo>,
}

#[derive(Debug, Default)]
struct TrackInfo {
    track_id: u32,
    handler: [u8; 4],
    duration_seconds: Option<f64>,
    language: Option<String>,
    sample_count: Option<u64>,
    entry: Option<SampleEntry>,
}

#[derive(Debug)]
enum SampleEntry {
    Audio {
        channels: u16,
        sample_rate: u32,
        sample_size: u16,
        codec: AudioCodec,
        detail: Option<String>,
        bitrate: Option<u32>,
        profile: Option<String>,
    },
    Video {
        width: u16,
        height: u16,
        codec: VideoCodec,
        detail: Option<String>,
        profile: Option<String>,
        level: Option<String>,
    },
}

fn parse_moov(content: &[u8]) -> MovieInfo {
    let mut movie = MovieInfo::default();

    for (box_type, body) in walk_children(content) {
        match &box_type {
            b"mvhd" => movie.duration_seconds = parse_mvhd(body),
            b"trak" => {
                if let Some(track) = parse_trak(body) {
                    movie.tracks.push(track);
                }
            }
            _ => {}
        }
    }

    movie
}

fn parse_mvhd(body: &[u8]) -> Option<f64> {
    let mut reader = SliceReader::new(body);
    let version = reader.read_u8().ok()?;
    reader.skip(3).ok()?; // flags

    let (timescale, duration) = if version == 1 {
        reader.skip(16).ok()?; // creation + modification
        let timescale = reader.read_u32_be().ok()?;
        let duration = reader.read_u64_be().ok()?;
        (timescale, duration)
    } else {
        reader.skip(8).ok()?;
        let timescale = reader.read_u32_be().ok()?;
        let duration = reader.read_u32_be().ok()? as u64;
        (timescale, duration)
    };

    if timescale == 0 || duration == 0 || duration == u64::MAX {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

fn parse_trak(body: &[u8]) -> Option<TrackInfo> {
    let mut track = TrackInfo::default();

    if let Some(tkhd) = find_child(body, b"tkhd") {
        track.track_id = parse_tkhd_track_id(tkhd).unwrap_or_default();
    }

    let mdia = find_child(body, b"mdia")?;

    if let Some(mdhd) = find_child(mdia, b"mdhd") {
        let (duration, language) = parse_mdhd(mdhd);
        track.duration_seconds = duration;
        track.language = language;
    }

    let hdlr = find_child(mdia, b"hdlr")?;
    track.handler = hdlr.get(8..12)?.try_into().ok()?;

    let minf = find_child(mdia, b"minf")?;
    let stbl = find_child(minf, b"stbl")?;

    if let Some(stts) = find_child(stbl, b"stts") {
        track.sample_count = parse_stts_sample_count(stts);
    }

    let stsd = find_child(stbl, b"stsd")?;
    track.entry = parse_stsd(stsd, &track.handler);

    Some(track)
}

fn parse_tkhd_track_id(body: &[u8]) -> Option<u32> {
    let version = *body.first()?;
    let offset = if version == 1 { 20 } else { 12 };
    let bytes = body.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn parse_mdhd(body: &[u8]) -> (Option<f64>, Option<String>) {
    let mut reader = SliceReader::new(body);
    let Ok(version) = reader.read_u8() else {
        return (None, None);
    };
    let _ = reader.skip(3);

    let parsed = if version == 1 {
        reader.skip(16).ok().and_then(|()| {
            let timescale = reader.read_u32_be().ok()?;
            let duration = reader.read_u64_be().ok()?;
            Some((timescale, duration))
        })
    } else {
        reader.skip(8).ok().and_then(|()| {
            let timescale = reader.read_u32_be().ok()?;
            let duration = reader.read_u32_be().ok()? as u64;
            Some((timescale, duration))
        })
    };

    let duration_seconds = parsed.and_then(|(timescale, duration)| {
        if timescale == 0 || duration == 0 || duration == u64::MAX {
            None
        } else {
            Some(duration as f64 / timescale as f64)
        }
    });

    // Packed ISO-639-2/T: three 5-bit letters biased by 0x60.
    let language = reader.read_u16_be().ok().and_then(|packed| {
        let letters = [
            ((packed >> 10) & 0x1F) as u8 + 0x60,
            ((packed >> 5) & 0x1F) as u8 + 0x60,
            (packed & 0x1F) as u8 + 0x60,
        ];
        let code = std::str::from_utf8(&letters).ok()?.to_owned();
        (code != "und" && code.chars().all(|c| c.is_ascii_lowercase())).then_some(code)
    });

    (duration_seconds, language)
}

fn parse_stts_sample_count(body: &[u8]) -> Option<u64> {
    let mut reader = SliceReader::new(body);
    reader.skip(4).ok()?; // version + flags
    let entry_count = reader.read_u32_be().ok()?;

    let mut total = 0u64;
    for _ in 0..entry_count {
        let count = reader.read_u32_be().ok()?;
        reader.skip(4).ok()?; // delta
        total += count as u64;
    }
    Some(total)
}

fn parse_stsd(body: &[u8], handler: &[u8; 4]) -> Option<SampleEntry> {
    let mut reader = SliceReader::new(body);
    reader.skip(4).ok()?; // version + flags
    let entry_count = reader.read_u32_be().ok()?;
    if entry_count == 0 {
        return None;
    }

    let entries = reader.peek_remaining();
    let (fourcc_bytes, content) = walk_children(entries).next()?;
    let fourcc = String::from_utf8_lossy(&fourcc_bytes).trim().to_owned();

    match handler {
        b"soun" => parse_audio_entry(fourcc, content),
        b"vide" => parse_video_entry(fourcc, content),
        _ => None,
    }
}

fn parse_audio_entry(fourcc: String, content: &[u8]) -> Option<SampleEntry> {
    let mut reader = SliceReader::new(content);
    reader.skip(8).ok()?; // reserved + data reference index
    reader.skip(8).ok()?; // version, revision, vendor
    let channels = reader.read_u16_be().ok()?;
    let sample_size = reader.read_u16_be().ok()?;
    reader.skip(4).ok()?; // compression id + packet size
    let sample_rate = (reader.read_u32_be().ok()? >> 16) as u32;

    let mut codec = AudioCodec::from_alias(&fourcc).unwrap_or(AudioCodec::Unknown);
    let mut detail = Some(fourcc.clone());
    let mut bitrate = None;
    let mut profile = None;
    let mut channels = channels;
    let mut sample_rate = sample_rate;

    // Children of the sample entry (esds and friends).
    let children = reader.peek_remaining();
    if let Some(esds) = find_child(children, b"esds") {
        if let Some(descriptor) = esds.get(4..).and_then(parse_es_descriptor) {
            codec = descriptor.codec().unwrap_or(codec);
            detail = descriptor.codec_detail().or(detail);
            bitrate = descriptor.avg_bitrate;
            if let Some(config) = descriptor.audio_config {
                profile = Some(config.audio_object_type.profile_name().to_owned());
                sample_rate = config.sampling_frequency;
                if let Some(count) = config.channel_count() {
                    channels = count as u16;
                }
            }
        }
    }

    Some(SampleEntry::Audio {
        channels,
        sample_rate,
        sample_size,
        codec,
        detail,
        bitrate,
        profile,
    })
}

fn parse_video_entry(fourcc: String, content: &[u8]) -> Option<SampleEntry> {
    let mut reader = SliceReader::new(content);
    reader.skip(8).ok()?; // reserved + data reference index
    reader.skip(16).ok()?; // predefined/reserved
    let width = reader.read_u16_be().ok()?;
    let height = reader.read_u16_be().ok()?;
    // Resolution, frame count, compressor name, depth, predefined.
    reader.skip(4 + 4 + 4 + 2 + 32 + 2 + 2).ok()?;

    let mut codec = VideoCodec::from_alias(&fourcc).unwrap_or(VideoCodec::Unknown);
    let mut detail = Some(fourcc.clone());
    let mut profile = None;
    let mut level = None;

    let children = reader.peek_remaining();
    if let Some(avcc) = find_child(children, b"avcC") {
        codec = VideoCodec::H264;
        if let Ok(record) = h264::AvcDecoderConfigurationRecord::parse(avcc) {
            detail = Some(record.rfc6381_codec());
            if let Some(sps) = &record.sps {
                profile = Some(sps.profile_name().to_owned());
                level = Some(sps.level_name());
            }
        }
    } else if let Some(hvcc) = find_child(children, b"hvcC") {
        codec = VideoCodec::Hevc;
        // HEVCDecoderConfigurationRecord: profile in byte 1, level in
        // byte 12.
        if let (Some(&profile_byte), Some(&level_byte)) = (hvcc.get(1), hvcc.get(12)) {
            let profile_idc = profile_byte & 0x1F;
            profile = Some(profile_idc.to_string());
            level = Some(format!("{}.{}", level_byte / 30, (level_byte % 30) / 3));
            detail = Some(format!("hvc1.{profile_idc}.L{level_byte}"));
        }
    }

    Some(SampleEntry::Video {
        width,
        height,
        codec,
        detail,
        profile,
        level,
    })
}

fn build_media_info(
    container: ContainerFormat,
    container_detail: Option<String>,
    movie: MovieInfo,
) -> Result<MediaInfo> {
    let mut info = MediaInfo::new(container);
    info.container_detail = container_detail;
    info.duration_seconds = movie.duration_seconds;

    for track in movie.tracks {
        match track.entry {
            Some(SampleEntry::Audio {
                channels,
                sample_rate,
                sample_size,
                codec,
                detail,
                bitrate,
                profile,
                ..
            }) => {
                let mut stream = AudioStream::new(track.track_id, codec);
                stream.codec_detail = detail;
                stream.channel_count = Some(channels as u32);
                stream.sample_rate = Some(sample_rate);
                stream.bits_per_sample = (sample_size > 0).then_some(sample_size as u32);
                stream.bitrate = bitrate.map(u64::from);
                stream.profile = profile;
                stream.language = track.language;
                debug!(track = track.track_id, codec = ?stream.codec, "BMFF audio track");
                info.add_audio(stream);
            }
            Some(SampleEntry::Video {
                width,
                height,
                codec,
                detail,
                profile,
                level,
                ..
            }) => {
                let mut stream = VideoStream::new(track.track_id, codec);
                stream.codec_detail = detail;
                stream.width = Some(width as u32);
                stream.height = Some(height as u32);
                stream.profile = profile;
                stream.level = level;
                stream.fps = match (track.sample_count, track.duration_seconds) {
                    (Some(samples), Some(duration)) if duration > 0.0 && samples > 0 => {
                        Some(samples as f64 / duration)
                    }
                    _ => None,
                };
                debug!(track = track.track_id, codec = ?stream.codec, "BMFF video track");
                info.add_video(stream);
            }
            None => {
                trace!(track = track.track_id, handler = ?track.handler, "skipping track");
            }
        }
    }

    if info.stream_count() == 0 {
        return Err(ProbeError::unsupported(
            "no audio or video tracks in the movie box",
        ));
    }

    Ok(info)
}
