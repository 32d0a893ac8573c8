//! Progressive Matroska/WebM demuxer built on the EBML element encoding.
//!
//! Walks the header elements (EBML head, Segment Info, Tracks) far enough
//! to describe every track, interprets the per-codec CodecPrivate payloads,
//! and stops at the first Cluster or SimpleBlock. Block framing and lacing
//! are exposed for callers that feed payloads onward.

pub mod codec_private;
pub mod demuxer;
pub mod ebml;
pub mod element_ids;
pub mod lacing;

pub use codec_private::CodecPrivate;
pub use demuxer::{MkvDemuxer, parse_mkv};
pub use ebml::{encode_vint, parse_vint_id, parse_vint_size, Vint};
pub use lacing::{Lacing, SimpleBlock};

/// Result type for Matroska parsing operations.
pub type Result<T> = media_types::Result<T>;
