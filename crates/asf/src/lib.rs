//! ASF (WMA/WMV) demuxer: Header Object walk, stream and file properties,
//! and the bit-packed Data Object packet parser with optional payload
//! extraction to a caller-supplied sink.

pub mod demuxer;
pub mod guid;
pub mod objects;
pub mod packet;

pub use demuxer::{AsfDemuxer, AsfExtract, AsfParseResult, AsfStreamExtra, parse_asf};
pub use guid::Guid;
pub use objects::{FileProperties, StreamMedia, StreamProperties};
pub use packet::PayloadContext;

/// Result type for ASF parsing operations.
pub type Result<T> = media_types::Result<T>;
