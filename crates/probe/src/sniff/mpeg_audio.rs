use bytes_util::{ChunkBuffer, ChunkSource};
use media_types::{
    AudioCodec, AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, Result,
};
use mpegaudio::{FrameHeader, Layer, VbrInfo};
use tracing::debug;

/// How much of the head is buffered for the scan (enough for a frame plus
/// its VBR side-band).
const HEAD: usize = 16 * 1024;

/// How far past any ID3 tag the first syncword may sit.
const SYNC_SCAN: usize = 2048;

/// Identifies an MPEG audio (MP1/MP2/MP3) stream from its first frames.
pub fn sniff_mpeg_audio<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    let mut buf = ChunkBuffer::new(source);
    buf.ensure(HEAD)?;
    let data = buf.data();

    let skip = super::id3v2_tag_length(data);
    let body = data
        .get(skip..)
        .ok_or_else(|| ProbeError::unsupported("input ends inside the ID3 tag"))?;

    let scan_end = body.len().min(SYNC_SCAN);
    for pos in 0..scan_end {
        let frame = &body[pos..];
        let Ok(header) = FrameHeader::parse(frame) else {
            continue;
        };

        // Demand a second header at the frame boundary; an isolated sync
        // inside random data is common.
        if let Some(length) = header.frame_length() {
            if pos + length + 4 <= body.len() && FrameHeader::parse(&body[pos + length..]).is_err()
            {
                continue;
            }
        }

        let (container, codec) = match header.layer {
            Layer::I => (ContainerFormat::Mp1, AudioCodec::Mp1),
            Layer::II => (ContainerFormat::Mp2, AudioCodec::Mp2),
            Layer::III => (ContainerFormat::Mp3, AudioCodec::Mp3),
        };

        let vbr = VbrInfo::scan(frame);
        debug!(offset = pos, layer = header.layer.number(), vbr = vbr.is_some(), "MPEG audio");

        let mut info = MediaInfo::new(container);
        let mut stream = AudioStream::new(0, codec);
        stream.sample_rate = Some(header.sample_rate);
        stream.channel_count = Some(header.channel_count() as u32);
        stream.bitrate = header.bitrate.map(u64::from);
        stream.extra = Some(AudioExtra::MpegAudio {
            layer: header.layer.number(),
            padding: header.padding,
        });

        if let Some(vbr) = vbr {
            info.duration_seconds = vbr.duration_seconds(&header);
            if let Some(average) = vbr.average_bitrate(&header) {
                stream.bitrate = Some(average);
            }
        }

        info.add_audio(stream);
        return Ok(info);
    }

    Err(ProbeError::unsupported("no MPEG audio sync pattern found"))
}
