//! Light ISO-BMFF (MP4/MOV) parser: box-tree walk over ftyp and moov,
//! sample-entry decoding with the esds descriptor loop and `avcC`/`hvcC`
//! configuration records. Used when the in-house parser handles BMFF
//! inputs itself rather than delegating.

pub mod boxes;
pub mod demuxer;
pub mod esds;

pub use boxes::{BoxHeader, find_child, walk_children};
pub use demuxer::parse_isobmff;
pub use esds::{EsDescriptor, parse_es_descriptor};

/// Result type for BMFF parsing operations.
pub type Result<T> = media_types::Result<T>;
