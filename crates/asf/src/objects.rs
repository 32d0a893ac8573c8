use bytes_util::SliceReader;
use media_types::{ProbeError, VideoCodec};
use waveformat::WaveFormatEx;

use crate::Result;
use crate::guid::{self, Guid};

/// One child object of the Header Object.
#[derive(Debug, Clone)]
pub struct HeaderChild {
    /// The object's GUID.
    pub guid: Guid,
    /// The object body, after the 24-byte GUID + size prelude.
    pub body: Vec<u8>,
}

/// Walks the children of a Header Object body (the bytes after the
/// 30-byte Header Object prelude).
pub fn walk_header_children(body: &[u8], count: u32) -> Result<Vec<HeaderChild>> {
    let mut children = Vec::new();
    let mut offset = 0usize;

    for _ in 0..count {
        if offset + 24 > body.len() {
            break;
        }
        let Some(guid) = Guid::read(&body[offset..]) else {
            break;
        };
        let mut reader = SliceReader::new(&body[offset + 16..]);
        let size = reader
            .read_u64_le()
            .map_err(|_| ProbeError::unsupported("truncated ASF object size"))?
            as usize;
        if size < 24 || offset + size > body.len() {
            return Err(ProbeError::unsupported("ASF header object overruns its parent"));
        }

        children.push(HeaderChild {
            guid,
            body: body[offset + 24..offset + size].to_vec(),
        });
        offset += size;
    }

    Ok(children)
}

/// Decoded File Properties Object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileProperties {
    /// Play duration in 100 ns units.
    pub play_duration: u64,
    /// Send duration in 100 ns units.
    pub send_duration: u64,
    /// Preroll in milliseconds.
    pub preroll: u64,
    /// Whether the broadcast flag is set (durations are then meaningless).
    pub broadcast: bool,
    /// Whether the seekable flag is set.
    pub seekable: bool,
    /// The fixed data-packet size in bytes.
    pub packet_size: u32,
}

impl FileProperties {
    /// Parses a File Properties Object body.
    ///
    /// Minimum and maximum data-packet sizes must agree; variable-size
    /// packets are not implemented.
    pub fn parse(body: &[u8]) -> Result<Self> {
        // The body starts after GUID + size: file id (16), file size (8),
        // creation date (8), packet count (8).
        let mut reader = SliceReader::new(body);
        reader.skip(40)?;
        let play_duration = reader.read_u64_le()?;
        let send_duration = reader.read_u64_le()?;
        let preroll = reader.read_u64_le()?;
        let flags = reader.read_u32_le()?;
        let min_packet_size = reader.read_u32_le()?;
        let max_packet_size = reader.read_u32_le()?;

        if min_packet_size != max_packet_size {
            return Err(ProbeError::unsupported(
                "ASF with variable packet sizes is not supported",
            ));
        }

        Ok(Self {
            play_duration,
            send_duration,
            preroll,
            broadcast: flags & 0x01 != 0,
            seekable: flags & 0x02 != 0,
            packet_size: min_packet_size,
        })
    }

    /// Duration in seconds, when the file is not a broadcast.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.broadcast {
            return None;
        }
        Some(self.play_duration as f64 / 1e7 - self.preroll as f64 / 1e3)
    }
}

/// Media carried by one ASF stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMedia {
    /// Audio, with its decoded WAVEFORMATEX.
    Audio(WaveFormatEx),
    /// Video, with its dimensions and fourcc.
    Video {
        /// Encoded image width.
        width: u32,
        /// Encoded image height.
        height: u32,
        /// The BITMAPINFOHEADER compression fourcc.
        fourcc: String,
        /// The codec the fourcc maps to, when known.
        codec: Option<VideoCodec>,
    },
    /// A stream type this probe does not interpret.
    Other(Guid),
}

/// Decoded Stream Properties Object.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamProperties {
    /// Stream number (1-127).
    pub stream_number: u8,
    /// Presentation time offset in 100 ns units.
    pub time_offset: u64,
    /// Decoded type-specific data.
    pub media: StreamMedia,
    /// The raw type-specific data, kept for callers that need the codec
    /// private bytes.
    pub type_specific_data: Vec<u8>,
}

impl StreamProperties {
    /// Parses a Stream Properties Object body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let stream_type =
            Guid::read(body).ok_or_else(|| ProbeError::unsupported("truncated stream type"))?;

        let mut reader = SliceReader::new(body);
        reader.skip(32)?; // stream type + error correction type
        let time_offset = reader.read_u64_le()?;
        let type_specific_len = reader.read_u32_le()? as usize;
        let _error_correction_len = reader.read_u32_le()?;
        let flags = reader.read_u16_le()?;
        let stream_number = (flags & 0x7F) as u8;
        reader.skip(4)?; // reserved

        let type_specific = reader.read_slice(type_specific_len)?;

        let media = if stream_type == guid::AUDIO_MEDIA {
            StreamMedia::Audio(WaveFormatEx::parse(type_specific)?)
        } else if stream_type == guid::VIDEO_MEDIA {
            parse_video_data(type_specific)?
        } else {
            StreamMedia::Other(stream_type)
        };

        Ok(Self {
            stream_number,
            time_offset,
            media,
            type_specific_data: type_specific.to_vec(),
        })
    }
}

fn parse_video_data(data: &[u8]) -> Result<StreamMedia> {
    let mut reader = SliceReader::new(data);
    let width = reader.read_u32_le()?;
    let height = reader.read_u32_le()?;
    reader.skip(1)?; // reserved flags
    let _format_data_size = reader.read_u16_le()?;

    // BITMAPINFOHEADER follows; biCompression is its fourcc.
    let bih = reader.peek_remaining();
    let fourcc = bih
        .get(16..20)
        .filter(|bytes| bytes.is_ascii())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();

    let codec = VideoCodec::from_alias(&fourcc);
    Ok(StreamMedia::Video {
        width,
        height,
        fourcc,
        codec,
    })
}

/// Splits a Header Extension Object body into its nested objects and
/// returns the Extended Stream Properties blobs keyed by stream number.
#[must_use]
pub fn extended_stream_properties(body: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut out = Vec::new();

    // Reserved GUID (16) + reserved u16 + data size u32.
    let Some(mut rest) = body.get(22..) else {
        return out;
    };

    while rest.len() >= 24 {
        let Some(guid) = Guid::read(rest) else { break };
        let size = u64::from_le_bytes(match rest[16..24].try_into() {
            Ok(bytes) => bytes,
            Err(_) => break,
        }) as usize;
        if size < 24 || size > rest.len() {
            break;
        }

        if guid == guid::EXTENDED_STREAM_PROPERTIES {
            let object_body = &rest[24..size];
            // Stream number sits after 8 fixed u32/u64 rate fields.
            if let Some(bytes) = object_body.get(48..50) {
                let stream_number = (u16::from_le_bytes([bytes[0], bytes[1]]) & 0x7F) as u8;
                out.push((stream_number, object_body.to_vec()));
            }
        }
        rest = &rest[size..];
    }

    out
}
