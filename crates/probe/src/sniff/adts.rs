use aac::AdtsHeader;
use bytes_util::{ChunkBuffer, ChunkSource};
use media_types::{
    AudioCodec, AudioStream, ContainerFormat, MediaInfo, ProbeError, Result,
};
use tracing::debug;

/// How much of the head is buffered for the scan.
const HEAD: usize = 8 * 1024;

/// How far past any ID3 tag the first syncword may sit.
const SYNC_SCAN: usize = 1024;

/// Identifies a raw ADTS AAC stream from its first frames.
///
/// A candidate header only counts when a second valid header follows at
/// the frame boundary, which keeps MPEG audio and random data out.
pub fn sniff_adts<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    let mut buf = ChunkBuffer::new(source);
    buf.ensure(HEAD)?;
    let data = buf.data();

    let skip = super::id3v2_tag_length(data);
    let body = data
        .get(skip..)
        .ok_or_else(|| ProbeError::unsupported("input ends inside the ID3 tag"))?;

    let scan_end = body.len().min(SYNC_SCAN);
    for pos in 0..scan_end {
        let Ok(header) = AdtsHeader::parse(&body[pos..]) else {
            continue;
        };

        // Confirm with the next frame when it is in the buffer.
        let next = pos + header.frame_length as usize;
        if next + 7 <= body.len() && AdtsHeader::parse(&body[next..]).is_err() {
            continue;
        }

        debug!(offset = pos, rate = header.sample_rate, "ADTS stream");

        let mut info = MediaInfo::new(ContainerFormat::Aac);
        let mut stream = AudioStream::new(0, AudioCodec::Aac);
        stream.codec_detail = Some(header.audio_object_type.detail());
        stream.profile = Some(header.audio_object_type.profile_name().to_owned());
        stream.sample_rate = Some(header.sample_rate);
        stream.channel_count = header.channel_count.map(u32::from);
        info.add_audio(stream);
        return Ok(info);
    }

    Err(ProbeError::unsupported("no ADTS sync pattern found"))
}

#[cfg(test)]
mod tests {
    use bytes_util::SliceSource;

    use super::*;

    fn adts_stream(frames: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for _ in 0..frames {
            out.extend_from_slice(
                &aac::build_adts_frame(
                    &[0x11; 64],
                    48000,
                    2,
                    aac::AudioObjectType::AacLowComplexity,
                )
                .unwrap(),
            );
        }
        out
    }

    #[test]
    fn test_sniff_plain_stream() {
        let info = sniff_adts(SliceSource::new(adts_stream(4))).unwrap();
        assert_eq!(info.container, ContainerFormat::Aac);
        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.audio_streams[0].codec, AudioCodec::Aac);
        assert_eq!(info.audio_streams[0].sample_rate, Some(48000));
        assert_eq!(info.audio_streams[0].profile.as_deref(), Some("LC"));
    }

    #[test]
    fn test_sniff_with_id3() {
        let mut data = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 30];
        data.extend_from_slice(&[0u8; 30]);
        data.extend_from_slice(&adts_stream(3));

        let info = sniff_adts(SliceSource::new(data)).unwrap();
        assert_eq!(info.audio_streams[0].channel_count, Some(2));
    }

    #[test]
    fn test_rejects_mp3() {
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x64];
        frame.resize(417, 0);
        let mut data = frame.clone();
        data.extend_from_slice(&frame);

        assert!(sniff_adts(SliceSource::new(data)).is_err());
    }

    #[test]
    fn test_rejects_noise() {
        assert!(sniff_adts(SliceSource::new(vec![0x12u8; 2048])).is_err());
    }
}
