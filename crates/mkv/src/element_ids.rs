//! The EBML element IDs this demuxer reacts to, with their width markers
//! kept (the form [`crate::ebml::parse_vint_id`] yields).

#![allow(missing_docs)]

pub const EBML: u64 = 0x1A45DFA3;
pub const DOC_TYPE: u64 = 0x4282;

pub const SEGMENT: u64 = 0x18538067;

pub const INFO: u64 = 0x1549A966;
pub const TIMECODE_SCALE: u64 = 0x2AD7B1;
pub const DURATION: u64 = 0x4489;

pub const TRACKS: u64 = 0x1654AE6B;
pub const TRACK_ENTRY: u64 = 0xAE;
pub const TRACK_NUMBER: u64 = 0xD7;
pub const TRACK_TYPE: u64 = 0x83;
pub const CODEC_ID: u64 = 0x86;
pub const CODEC_PRIVATE: u64 = 0x63A2;

pub const AUDIO: u64 = 0xE1;
pub const SAMPLING_FREQUENCY: u64 = 0xB5;
pub const CHANNELS: u64 = 0x9F;
pub const BIT_DEPTH: u64 = 0x6264;

pub const VIDEO: u64 = 0xE0;
pub const PIXEL_WIDTH: u64 = 0xB0;
pub const PIXEL_HEIGHT: u64 = 0xBA;

pub const CLUSTER: u64 = 0x1F43B675;
pub const TIMECODE: u64 = 0xE7;
pub const SIMPLE_BLOCK: u64 = 0xA3;
pub const BLOCK_GROUP: u64 = 0xA0;
pub const BLOCK: u64 = 0xA1;

/// Whether an element is a master (its content is more elements).
#[must_use]
pub const fn is_master(id: u64) -> bool {
    matches!(
        id,
        EBML | SEGMENT | INFO | TRACKS | TRACK_ENTRY | AUDIO | VIDEO | CLUSTER | BLOCK_GROUP
    )
}
