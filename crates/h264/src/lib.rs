//! Decoding of H.264 Annex-B byte streams far enough to describe them:
//! NAL unit scanning, emulation-prevention removal, and the Sequence
//! Parameter Set fields that carry picture dimensions and profile/level.
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

mod config;
mod nal;
mod sps;

pub use config::AvcDecoderConfigurationRecord;
pub use nal::{NalUnit, NalUnitType, find_nal_units, strip_emulation_prevention};
pub use sps::Sps;
