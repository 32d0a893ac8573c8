//! Single-stream sniffers for the headerless (or nearly so) formats: raw
//! ADTS AAC, MPEG audio, OGG and RIFF/WAVE. Each reads just enough of the
//! first chunks to identify the stream and fill one audio track.

mod adts;
mod id3;
mod mpeg_audio;
mod ogg;
mod wav;

pub use adts::sniff_adts;
pub use id3::id3v2_tag_length;
pub use mpeg_audio::sniff_mpeg_audio;
pub use ogg::sniff_ogg;
pub use wav::sniff_wav;
