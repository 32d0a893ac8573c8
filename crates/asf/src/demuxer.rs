use std::collections::HashMap;

use bytes_util::{ChunkBuffer, ChunkSource, SliceReader};
use media_types::{
    AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, VideoCodec, VideoStream,
};
use tracing::debug;

use crate::Result;
use crate::guid::{self, Guid};
use crate::objects::{
    FileProperties, StreamMedia, StreamProperties, extended_stream_properties,
    walk_header_children,
};
use crate::packet::{PayloadContext, parse_packet};

/// Refill target while consuming data packets.
const PACKET_REFILL_TARGET: usize = 64 * 1024;

/// Codec-private and extended-properties blobs for one stream, surfaced
/// alongside the media info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsfStreamExtra {
    /// The stream's type-specific (codec private) data.
    pub codec_private: Vec<u8>,
    /// The raw Extended Stream Properties body, when present.
    pub extended_properties: Vec<u8>,
}

/// Result of an ASF parse.
#[derive(Debug)]
pub struct AsfParseResult {
    /// The stream description.
    pub media_info: MediaInfo,
    /// Per-stream-number extra blobs.
    pub additional_stream_info: HashMap<u8, AsfStreamExtra>,
}

/// Payload-extraction request.
pub struct AsfExtract<'a> {
    /// Stream numbers of interest.
    pub stream_numbers: Vec<u8>,
    /// Receives `(stream_number, payload, context)` as data packets are
    /// walked, in packet order.
    pub on_payload: Box<dyn FnMut(u8, &[u8], &PayloadContext) -> Result<()> + 'a>,
}

/// ASF (WMA/WMV) demuxer.
pub struct AsfDemuxer<'a> {
    extract: Option<AsfExtract<'a>>,
}

/// Parses metadata from an ASF byte stream without payload extraction.
pub fn parse_asf<S: ChunkSource>(source: S) -> Result<AsfParseResult> {
    AsfDemuxer::new().parse(source)
}

impl Default for AsfDemuxer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AsfDemuxer<'a> {
    /// Creates a metadata-only demuxer.
    #[must_use]
    pub fn new() -> Self {
        Self { extract: None }
    }

    /// Creates a demuxer that also walks the Data Object and hands payload
    /// bytes of the selected streams to the callback.
    #[must_use]
    pub fn with_extract(extract: AsfExtract<'a>) -> Self {
        Self {
            extract: Some(extract),
        }
    }

    /// Consumes the source and returns the parse result.
    pub fn parse<S: ChunkSource>(mut self, source: S) -> Result<AsfParseResult> {
        let mut buf = ChunkBuffer::new(source);

        // Header Object prelude: GUID, size, child count, 2 reserved.
        buf.require(30).map_err(ProbeError::from)?;
        let header_guid = Guid::read(buf.data());
        if header_guid != Some(guid::HEADER_OBJECT) {
            return Err(ProbeError::unsupported("not an ASF header object"));
        }

        let (header_size, child_count) = {
            let mut reader = SliceReader::new(&buf.data()[16..]);
            let size = reader.read_u64_le().map_err(ProbeError::from)? as usize;
            let count = reader.read_u32_le().map_err(ProbeError::from)?;
            (size, count)
        };
        if header_size < 30 {
            return Err(ProbeError::unsupported("ASF header object too small"));
        }

        buf.require(header_size).map_err(ProbeError::from)?;
        let children = walk_header_children(&buf.data()[30..header_size], child_count)?;
        buf.consume(header_size);

        let mut file_properties = None;
        let mut streams: Vec<StreamProperties> = Vec::new();
        let mut extended: Vec<(u8, Vec<u8>)> = Vec::new();

        for child in children {
            if child.guid == guid::FILE_PROPERTIES {
                file_properties = Some(FileProperties::parse(&child.body)?);
            } else if child.guid == guid::STREAM_PROPERTIES {
                let properties = StreamProperties::parse(&child.body)?;
                debug!(
                    stream = properties.stream_number,
                    media = ?properties.media,
                    "ASF stream"
                );
                streams.push(properties);
            } else if child.guid == guid::HEADER_EXTENSION {
                extended = extended_stream_properties(&child.body);
            }
        }

        let file_properties = file_properties
            .ok_or_else(|| ProbeError::unsupported("ASF without a File Properties Object"))?;
        if streams.is_empty() {
            return Err(ProbeError::unsupported("ASF declares no streams"));
        }

        if self.extract.is_some() {
            self.walk_data_object(&mut buf, &file_properties)?;
        }

        Ok(build_result(file_properties, streams, extended))
    }

    fn walk_data_object<S: ChunkSource>(
        &mut self,
        buf: &mut ChunkBuffer<S>,
        file_properties: &FileProperties,
    ) -> Result<()> {
        // Data Object prelude: GUID, size, file id, packet count, reserved.
        buf.require(50).map_err(ProbeError::from)?;
        if Guid::read(buf.data()) != Some(guid::DATA_OBJECT) {
            return Err(ProbeError::unsupported("ASF Data Object missing"));
        }
        let packet_count = {
            let mut reader = SliceReader::new(&buf.data()[40..]);
            reader.read_u64_le().map_err(ProbeError::from)?
        };
        buf.consume(50);

        let packet_size = file_properties.packet_size as usize;
        if packet_size == 0 {
            return Err(ProbeError::unsupported("ASF packet size is zero"));
        }

        let Some(extract) = self.extract.as_mut() else {
            return Ok(());
        };

        let mut remaining = packet_count;
        loop {
            if remaining == 0 && packet_count > 0 {
                break;
            }
            if !buf.ensure(PACKET_REFILL_TARGET.max(packet_size))? && buf.available() < packet_size
            {
                break;
            }

            {
                let packet = &buf.data()[..packet_size];
                let wanted = &extract.stream_numbers;
                let sink = &mut extract.on_payload;
                parse_packet(packet, &mut |stream_number, payload, context| {
                    if wanted.is_empty() || wanted.contains(&stream_number) {
                        sink(stream_number, payload, context)?;
                    }
                    Ok(())
                })?;
            }

            buf.consume(packet_size);
            remaining = remaining.saturating_sub(1);
        }

        Ok(())
    }
}

fn build_result(
    file_properties: FileProperties,
    streams: Vec<StreamProperties>,
    extended: Vec<(u8, Vec<u8>)>,
) -> AsfParseResult {
    let mut additional: HashMap<u8, AsfStreamExtra> = HashMap::new();
    let mut info = MediaInfo::new(ContainerFormat::Asf);
    info.duration_seconds = file_properties.duration_seconds();

    for properties in streams {
        let extra = additional.entry(properties.stream_number).or_default();
        extra.codec_private = properties.type_specific_data.clone();

        match properties.media {
            StreamMedia::Audio(format) => {
                let mut stream =
                    AudioStream::new(properties.stream_number as u32, format.codec());
                stream.codec_detail = format.format_name().map(str::to_owned);
                stream.channel_count = Some(format.channels as u32);
                stream.sample_rate = Some(format.samples_per_sec);
                stream.bits_per_sample = Some(format.bits_per_sample as u32);
                stream.bitrate = Some(format.bitrate());
                stream.extra = Some(AudioExtra::Wave {
                    format_tag: format.format_tag,
                    block_align: format.block_align,
                    avg_bytes_per_sec: format.avg_bytes_per_sec,
                });
                info.add_audio(stream);
            }
            StreamMedia::Video {
                width,
                height,
                fourcc,
                codec,
            } => {
                let mut stream = VideoStream::new(
                    properties.stream_number as u32,
                    codec.unwrap_or(VideoCodec::Unknown),
                );
                stream.codec_detail = Some(fourcc);
                stream.width = Some(width);
                stream.height = Some(height);
                info.add_video(stream);
            }
            StreamMedia::Other(stream_type) => {
                debug!(?stream_type, "ignoring unrecognized ASF stream type");
            }
        }
    }

    for (stream_number, body) in extended {
        additional.entry(stream_number).or_default().extended_properties = body;
    }

    // A video-less ASF file is what the .wma extension denotes.
    info.container_detail = Some(if info.video_streams.is_empty() {
        "wma".to_owned()
    } else {
        "wmv".to_owned()
    });

    AsfParseResult {
        media_info: info,
        additional_stream_info: additional,
    }
}
