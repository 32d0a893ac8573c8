//! Decoder for MPEG audio (MP1/MP2/MP3) frame headers and the Xing/Info/
//! LAME and VBRI side-band blocks that variable-bitrate files carry in
//! their first frame.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod header;
mod vbr;

pub use header::{ChannelMode, FrameHeader, Layer, MpegVersion};
pub use vbr::VbrInfo;
