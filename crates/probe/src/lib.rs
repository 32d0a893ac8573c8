//! Media track probe: identifies and describes the tracks of a media byte
//! stream by parsing container and codec headers, without decoding
//! samples.
//!
//! The input is any [`ChunkSource`]; the dispatcher tees it and walks a
//! chain of container adapters (ISO-BMFF, Matroska/WebM, ASF, MXF,
//! MPEG-TS) and first-chunk sniffers (WAV, OGG, ADTS AAC, MPEG audio)
//! until one recognizes the bytes.
//!
//! ```no_run
//! use bytes_util::SliceSource;
//! use media_probe::{ProbeOptions, probe_media_info};
//!
//! # fn example(bytes: Vec<u8>) -> media_types::Result<()> {
//! let info = probe_media_info(SliceSource::new(bytes), &mut ProbeOptions::default())?;
//! println!("{} ({} tracks)", info.container.code(), info.stream_count());
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod options;
pub mod sniff;
mod source;

pub use bytes_util::{ChunkSource, SliceSource};
pub use dispatcher::probe_media_info;
pub use media_types::{
    AudioCodec, AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, Result,
    VideoCodec, VideoStream,
};
pub use options::{ParserChoice, ProbeOptions};
pub use source::{ReaderSource, ReplaySource};

use asf::{AsfDemuxer, AsfExtract};
pub use asf::{AsfParseResult, AsfStreamExtra, PayloadContext};

/// Options for [`parse_asf`].
#[derive(Default)]
pub struct AsfOptions<'a> {
    /// Stream numbers to extract payloads for; empty extracts every
    /// stream when a callback is present.
    pub extract_streams: Vec<u8>,
    /// Payload sink; when absent only the header metadata is read.
    #[allow(clippy::type_complexity)]
    pub on_payload: Option<Box<dyn FnMut(u8, &[u8], &PayloadContext) -> Result<()> + 'a>>,
}

/// Parses an ASF (WMA/WMV) stream, optionally extracting the payload
/// bytes of selected streams.
///
/// Beyond the media info, the result carries each stream's codec-private
/// data and extended-properties blob, keyed by stream number.
pub fn parse_asf<S: ChunkSource>(source: S, options: AsfOptions<'_>) -> Result<AsfParseResult> {
    match options.on_payload {
        Some(on_payload) => AsfDemuxer::with_extract(AsfExtract {
            stream_numbers: options.extract_streams,
            on_payload,
        })
        .parse(source),
        None => AsfDemuxer::new().parse(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asf_metadata_only() {
        // A minimal WMA header: file properties + one audio stream.
        let format = waveformat::WaveFormatEx {
            format_tag: waveformat::format_tag::WMA_V2,
            channels: 2,
            samples_per_sec: 44100,
            avg_bytes_per_sec: 16_000,
            block_align: 1485,
            bits_per_sample: 16,
            extra: waveformat::WaveFormatExtra::None,
        };

        let type_specific = format.build();
        let mut stream_body = Vec::new();
        stream_body.extend_from_slice(&asf::guid::AUDIO_MEDIA.0);
        stream_body.extend_from_slice(&[0u8; 16]);
        stream_body.extend_from_slice(&0u64.to_le_bytes());
        stream_body.extend_from_slice(&(type_specific.len() as u32).to_le_bytes());
        stream_body.extend_from_slice(&0u32.to_le_bytes());
        stream_body.extend_from_slice(&1u16.to_le_bytes());
        stream_body.extend_from_slice(&[0u8; 4]);
        stream_body.extend_from_slice(&type_specific);

        let mut file_body = vec![0u8; 40];
        file_body.extend_from_slice(&60_000_000u64.to_le_bytes());
        file_body.extend_from_slice(&60_000_000u64.to_le_bytes());
        file_body.extend_from_slice(&0u64.to_le_bytes());
        file_body.extend_from_slice(&0x02u32.to_le_bytes());
        file_body.extend_from_slice(&3200u32.to_le_bytes());
        file_body.extend_from_slice(&3200u32.to_le_bytes());
        file_body.extend_from_slice(&0u32.to_le_bytes());

        let mut children = Vec::new();
        for (guid, body) in [
            (asf::guid::FILE_PROPERTIES, &file_body),
            (asf::guid::STREAM_PROPERTIES, &stream_body),
        ] {
            children.extend_from_slice(&guid.0);
            children.extend_from_slice(&((24 + body.len()) as u64).to_le_bytes());
            children.extend_from_slice(body);
        }

        let mut data = asf::guid::HEADER_OBJECT.0.to_vec();
        data.extend_from_slice(&((30 + children.len()) as u64).to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&children);

        let result = parse_asf(SliceSource::new(data), AsfOptions::default()).unwrap();
        assert_eq!(result.media_info.container, ContainerFormat::Asf);
        assert_eq!(result.media_info.container_detail.as_deref(), Some("wma"));
        assert_eq!(result.media_info.audio_streams.len(), 1);
        assert_eq!(result.media_info.audio_streams[0].codec, AudioCodec::Wmav2);
        assert!(result.additional_stream_info.contains_key(&1));
    }
}
