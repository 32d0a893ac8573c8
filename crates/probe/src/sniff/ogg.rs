use bytes_util::{ChunkBuffer, ChunkSource, SliceReader};
use media_types::{
    AudioCodec, AudioStream, ContainerFormat, MediaInfo, ProbeError, Result,
};
use tracing::debug;

/// The fixed OGG page-header length before the segment table.
const PAGE_HEADER_LEN: usize = 27;

/// Identifies an OGG stream from its first page, which carries the Vorbis
/// or Opus identification header.
pub fn sniff_ogg<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    let mut buf = ChunkBuffer::new(source);
    buf.require(PAGE_HEADER_LEN + 1)?;

    {
        let data = buf.data();
        if &data[..4] != b"OggS" {
            return Err(ProbeError::unsupported("no OggS capture pattern"));
        }
        if data[4] != 0 {
            return Err(ProbeError::unsupported(format!(
                "unsupported OGG stream structure version {}",
                data[4]
            )));
        }
    }

    let segment_count = buf.data()[26] as usize;
    buf.require(PAGE_HEADER_LEN + segment_count)?;
    let payload_len: usize = buf.data()[PAGE_HEADER_LEN..PAGE_HEADER_LEN + segment_count]
        .iter()
        .map(|&b| b as usize)
        .sum();
    buf.require(PAGE_HEADER_LEN + segment_count + payload_len)?;

    let payload_start = PAGE_HEADER_LEN + segment_count;
    let payload = &buf.data()[payload_start..payload_start + payload_len];

    let mut info = MediaInfo::new(ContainerFormat::Ogg);

    if payload.len() >= 30 && payload[0] == 0x01 && &payload[1..7] == b"vorbis" {
        let mut reader = SliceReader::new(&payload[7..]);
        let _version = reader.read_u32_le()?;
        let channels = reader.read_u8()?;
        let sample_rate = reader.read_u32_le()?;
        let _bitrate_max = reader.read_i32_le()?;
        let bitrate_nominal = reader.read_i32_le()?;

        debug!(channels, sample_rate, "OGG vorbis");
        info.container_detail = Some("vorbis".to_owned());
        let mut stream = AudioStream::new(0, AudioCodec::Vorbis);
        stream.channel_count = Some(channels as u32);
        stream.sample_rate = Some(sample_rate);
        stream.bitrate = (bitrate_nominal > 0).then_some(bitrate_nominal as u64);
        info.add_audio(stream);
    } else if payload.len() >= 19 && payload.starts_with(b"OpusHead") {
        let mut reader = SliceReader::new(&payload[8..]);
        let _version = reader.read_u8()?;
        let channels = reader.read_u8()?;
        let _pre_skip = reader.read_u16_le()?;
        let input_sample_rate = reader.read_u32_le()?;

        debug!(channels, input_sample_rate, "OGG opus");
        info.container_detail = Some("opus".to_owned());
        let mut stream = AudioStream::new(0, AudioCodec::Opus);
        stream.channel_count = Some(channels as u32);
        stream.sample_rate = Some(if input_sample_rate != 48_000 {
            input_sample_rate
        } else {
            48_000
        });
        info.add_audio(stream);
    } else {
        return Err(ProbeError::unsupported(
            "OGG first page carries no recognized identification header",
        ));
    }

    Ok(info)
}
