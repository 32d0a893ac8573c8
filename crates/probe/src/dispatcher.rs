use bytes_util::ChunkSource;
use media_types::{MediaInfo, ProbeError, Result};
use tracing::debug;

use crate::options::{ParserChoice, ProbeOptions};
use crate::sniff;
use crate::source::ReplaySource;

/// The adapters, in the order the default chain attempts them: the
/// strong-magic container parsers first, the scan-happy sniffers last
/// (an MPEG audio sync can be found in almost anything).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adapter {
    IsoBmff,
    Mkv,
    Asf,
    Mxf,
    Ts,
    Wav,
    Ogg,
    Adts,
    MpegAudio,
}

const FULL_CHAIN: [Adapter; 9] = [
    Adapter::IsoBmff,
    Adapter::Mkv,
    Adapter::Asf,
    Adapter::Mxf,
    Adapter::Ts,
    Adapter::Wav,
    Adapter::Ogg,
    Adapter::Adts,
    Adapter::MpegAudio,
];

impl Adapter {
    const fn name(self) -> &'static str {
        match self {
            Self::IsoBmff => "isobmff",
            Self::Mkv => "matroska",
            Self::Asf => "asf",
            Self::Mxf => "mxf",
            Self::Ts => "mpegts",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Adts => "adts",
            Self::MpegAudio => "mpegaudio",
        }
    }

    fn run<S: ChunkSource>(self, source: S) -> Result<MediaInfo> {
        match self {
            Self::IsoBmff => isobmff::parse_isobmff(source),
            Self::Mkv => mkv::parse_mkv(source),
            Self::Asf => asf::parse_asf(source).map(|result| result.media_info),
            Self::Mxf => mxf::parse_mxf(source),
            Self::Ts => ts::parse_ts(source),
            Self::Wav => sniff::sniff_wav(source),
            Self::Ogg => sniff::sniff_ogg(source),
            Self::Adts => sniff::sniff_adts(source),
            Self::MpegAudio => sniff::sniff_mpeg_audio(source),
        }
    }
}

fn chain_for(choice: ParserChoice) -> &'static [Adapter] {
    match choice {
        ParserChoice::Auto | ParserChoice::InHouse => &FULL_CHAIN,
        ParserChoice::IsoBmff => &FULL_CHAIN[..1],
        ParserChoice::Delegated => &[],
    }
}

/// Identifies the tracks of a media byte stream.
///
/// The source is teed before every adapter attempt; an adapter that
/// rejects its input with a recoverable error (unsupported format,
/// truncated data, out-of-range codec parameters) falls through to the
/// next adapter, while sink errors and the final adapter's failure are
/// surfaced as-is. On success the result's `parser` field names the
/// adapter that won.
pub fn probe_media_info<S: ChunkSource>(
    source: S,
    options: &mut ProbeOptions<'_>,
) -> Result<MediaInfo> {
    let chain = chain_for(options.parser);
    if chain.is_empty() {
        return Err(ProbeError::unsupported(
            "no delegated adapters are registered in this build",
        ));
    }

    let mut replay = ReplaySource::new(source);
    let mut last_error: Option<ProbeError> = None;

    for (index, adapter) in chain.iter().enumerate() {
        if let Some(progress) = options.on_progress.as_mut() {
            progress((index * 100 / chain.len()) as u8);
        }

        replay.rewind()?;
        match adapter.run(&mut replay) {
            Ok(mut info) => {
                info.parser = adapter.name();
                debug!(parser = info.parser, "probe succeeded");
                if let Some(progress) = options.on_progress.as_mut() {
                    progress(100);
                }
                return Ok(info);
            }
            Err(error) if error.is_recoverable() => {
                debug!(adapter = adapter.name(), %error, "adapter fell through");
                last_error = Some(error);
            }
            Err(error) => return Err(error),
        }
    }

    // The final adapter's error is surfaced with its original message.
    Err(last_error.unwrap_or_else(|| ProbeError::unsupported("no adapter matched the input")))
}
