//! MXF demuxer: KLV stream reader, partition-pack operational-pattern
//! decoding, and resolution of the metadata-set graph (MaterialPackage ->
//! Track -> Sequence -> SourceClip -> SourcePackage -> Descriptor) into
//! track descriptions, with optional essence-KLV streaming.

pub mod demuxer;
pub mod klv;
pub mod metadata;
pub mod partition;

pub use demuxer::{MxfDemuxer, MxfExtract, parse_mxf};
pub use klv::{KlvHeader, KlvKind, parse_klv_header};
pub use metadata::{MetadataSet, Rational, SetArena};
pub use partition::operational_pattern;

/// Result type for MXF parsing operations.
pub type Result<T> = media_types::Result<T>;
