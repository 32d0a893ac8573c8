//! Progressive MPEG transport stream (TS / M2TS) demuxer.
//!
//! Parses PAT, PMT and SDT sections, reassembles PES packets per PID, and
//! sniffs the codec of each elementary stream from its first payloads
//! without decoding samples. An optional extraction mode reassembles audio
//! access units and streams them to a caller-supplied sink.

pub mod demuxer;
pub mod descriptor;
pub mod packet;
pub mod pat;
pub mod pes;
pub mod pmt;
pub mod sdt;
pub mod sniff;

pub use demuxer::{TsDemuxer, TsExtract, parse_ts};
pub use descriptor::EsDescriptors;
pub use packet::{PID_NULL, PID_PAT, PID_SDT, PacketSize, TsPacket, detect_packet_size};
pub use pat::{Pat, PatProgram};
pub use pes::{FrameSync, PesAssembler, PesPacket, PesPayloadHandler};
pub use pmt::{Pmt, PmtStream, StreamType};
pub use sdt::Sdt;

/// Result type for TS parsing operations.
pub type Result<T> = media_types::Result<T>;
