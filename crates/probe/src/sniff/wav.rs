use bytes_util::{ChunkBuffer, ChunkSource, SliceReader};
use media_types::{
    AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, Result,
};
use tracing::debug;
use waveformat::WaveFormatEx;

/// How much of the head is buffered for the chunk walk; fmt and the data
/// header land well inside this on real files.
const HEAD: usize = 64 * 1024;

/// Identifies a RIFF/WAVE file from its fmt and data chunks.
pub fn sniff_wav<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    let mut buf = ChunkBuffer::new(source);
    buf.require(12)?;
    buf.ensure(HEAD)?;
    let data = buf.data();

    if &data[..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(ProbeError::unsupported("not a RIFF/WAVE file"));
    }

    let mut reader = SliceReader::new(data);
    reader.skip(12)?;

    let mut format: Option<WaveFormatEx> = None;
    let mut data_size: Option<u32> = None;

    // Chunk walk: fourcc + u32le size, byte-padded to even sizes.
    while reader.remaining() >= 8 && (format.is_none() || data_size.is_none()) {
        let id: [u8; 4] = reader.read_slice(4)?.try_into().unwrap_or_default();
        let size = reader.read_u32_le()?;

        match &id {
            b"fmt " => {
                let body = reader.read_slice((size as usize).min(reader.remaining()))?;
                format = Some(WaveFormatEx::parse(body)?);
            }
            b"data" => {
                data_size = Some(size);
                // The samples themselves are not read.
                break;
            }
            _ => {
                let skip = (size as usize + (size as usize & 1)).min(reader.remaining());
                reader.skip(skip)?;
            }
        }
    }

    let format = format.ok_or_else(|| ProbeError::unsupported("WAVE without a fmt chunk"))?;
    debug!(format_tag = format.format_tag, "RIFF/WAVE");

    let mut info = MediaInfo::new(ContainerFormat::Wav);
    let mut stream = AudioStream::new(0, format.codec());
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

    if let (Some(size), avg) = (data_size, format.avg_bytes_per_sec) {
        if avg > 0 {
            info.duration_seconds = Some(size as f64 / avg as f64);
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use bytes_util::SliceSource;
    use media_types::AudioCodec;

    use super::*;

    fn wav_file(format: &WaveFormatEx, data_len: u32) -> Vec<u8> {
        let fmt_body = format.build();
        let mut file = b"RIFF".to_vec();
        file.extend_from_slice(&(36 + data_len).to_le_bytes());
        file.extend_from_slice(b"WAVE");
        file.extend_from_slice(b"fmt ");
        file.extend_from_slice(&(fmt_body.len() as u32).to_le_bytes());
        file.extend_from_slice(&fmt_body);
        file.extend_from_slice(b"data");
        file.extend_from_slice(&data_len.to_le_bytes());
        file.extend_from_slice(&vec![0u8; data_len as usize]);
        file
    }

    fn pcm() -> WaveFormatEx {
        WaveFormatEx {
            format_tag: waveformat::format_tag::PCM,
            channels: 2,
            samples_per_sec: 44100,
            avg_bytes_per_sec: 176_400,
            block_align: 4,
            bits_per_sample: 16,
            extra: waveformat::WaveFormatExtra::None,
        }
    }

    #[test]
    fn test_sniff_pcm_wav() {
        // Two seconds of audio.
        let info = sniff_wav(SliceSource::new(wav_file(&pcm(), 352_800))).unwrap();
        assert_eq!(info.container, ContainerFormat::Wav);
        let stream = &info.audio_streams[0];
        assert_eq!(stream.codec, AudioCodec::PcmS16Le);
        assert_eq!(stream.sample_rate, Some(44100));
        assert_eq!(stream.channel_count, Some(2));
        assert_eq!(stream.bits_per_sample, Some(16));
        assert!((info.duration_seconds.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sniff_with_list_chunk() {
        let format = pcm();
        let fmt_body = format.build();
        let mut file = b"RIFF".to_vec();
        file.extend_from_slice(&100u32.to_le_bytes());
        file.extend_from_slice(b"WAVE");
        // An unknown chunk before fmt.
        file.extend_from_slice(b"LIST");
        file.extend_from_slice(&7u32.to_le_bytes());
        file.extend_from_slice(&[0u8; 8]); // padded to even
        file.extend_from_slice(b"fmt ");
        file.extend_from_slice(&(fmt_body.len() as u32).to_le_bytes());
        file.extend_from_slice(&fmt_body);
        file.extend_from_slice(b"data");
        file.extend_from_slice(&1000u32.to_le_bytes());

        let info = sniff_wav(SliceSource::new(file)).unwrap();
        assert_eq!(info.audio_streams[0].codec, AudioCodec::PcmS16Le);
    }

    #[test]
    fn test_rejects_non_riff() {
        assert!(sniff_wav(SliceSource::new(vec![0u8; 64])).is_err());
        // RIFF but not WAVE.
        let mut file = b"RIFF".to_vec();
        file.extend_from_slice(&4u32.to_le_bytes());
        file.extend_from_slice(b"AVI ");
        assert!(sniff_wav(SliceSource::new(file)).is_err());
    }
}
