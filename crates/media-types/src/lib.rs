//! Shared vocabulary of the probe: container and codec taxonomies with
//! their alias tables, the per-stream and per-file result records, and the
//! error taxonomy the dispatcher's fallback logic is driven by.
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod codec;
mod container;
mod error;
mod stream;

pub use codec::{AudioCodec, VideoCodec};
pub use container::ContainerFormat;
pub use error::{ProbeError, Result};
pub use stream::{AudioExtra, AudioStream, MediaInfo, VideoStream};
