//! Decoders for the AAC transport headers: ADTS frame headers, the
//! AudioSpecificConfig, and the LATM/LOAS audio mux, plus the small ADTS
//! frame-construction utility.
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

mod adts;
mod config;
mod latm;

pub use adts::{AdtsHeader, build_adts_frame};
pub use config::AudioSpecificConfig;
pub use latm::{LatmMux, has_loas_sync, parse_latm};

use num_derive::FromPrimitive;

/// Audio Object Type
/// ISO/IEC 14496-3:2019(E) - 1.5.1.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AudioObjectType {
    /// AAC main
    AacMain,
    /// AAC LC
    AacLowComplexity,
    /// AAC SSR
    AacScalableSampleRate,
    /// AAC LTP
    AacLongTermPrediction,
    /// SBR (HE-AAC)
    Sbr,
    /// Parametric Stereo (HE-AACv2)
    ParametricStereo,
    /// Any other object type
    Unknown(u16),
}

impl AudioObjectType {
    /// Converts an AudioObjectType to a u16
    pub const fn as_u16(&self) -> u16 {
        match self {
            AudioObjectType::AacMain => 1,
            AudioObjectType::AacLowComplexity => 2,
            AudioObjectType::AacScalableSampleRate => 3,
            AudioObjectType::AacLongTermPrediction => 4,
            AudioObjectType::Sbr => 5,
            AudioObjectType::ParametricStereo => 29,
            AudioObjectType::Unknown(value) => *value,
        }
    }

    /// Converts a u16 to an AudioObjectType
    pub const fn from_u16(value: u16) -> Self {
        match value {
            1 => AudioObjectType::AacMain,
            2 => AudioObjectType::AacLowComplexity,
            3 => AudioObjectType::AacScalableSampleRate,
            4 => AudioObjectType::AacLongTermPrediction,
            5 => AudioObjectType::Sbr,
            29 => AudioObjectType::ParametricStereo,
            _ => AudioObjectType::Unknown(value),
        }
    }

    /// The codec-detail label used for this object type.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            AudioObjectType::AacMain => "aac-main".into(),
            AudioObjectType::AacLowComplexity => "aac-lc".into(),
            AudioObjectType::AacScalableSampleRate => "aac-ssr".into(),
            AudioObjectType::AacLongTermPrediction => "aac-ltp".into(),
            AudioObjectType::Sbr => "he-aac".into(),
            AudioObjectType::ParametricStereo => "he-aacv2".into(),
            AudioObjectType::Unknown(value) => format!("AAC AOT {value}"),
        }
    }

    /// The profile name used for this object type.
    #[must_use]
    pub const fn profile_name(&self) -> &'static str {
        match self {
            AudioObjectType::AacMain => "Main",
            AudioObjectType::AacLowComplexity => "LC",
            AudioObjectType::AacScalableSampleRate => "SSR",
            AudioObjectType::AacLongTermPrediction => "LTP",
            AudioObjectType::Sbr => "HE-AAC",
            AudioObjectType::ParametricStereo => "HE-AACv2",
            AudioObjectType::Unknown(_) => "Unknown",
        }
    }
}

impl From<u16> for AudioObjectType {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<AudioObjectType> for u16 {
    fn from(value: AudioObjectType) -> Self {
        value.as_u16()
    }
}

/// Sampling Frequency Index
///
/// Commonly used frequencies are encoded in 4 bits; index 0xF escapes to a
/// 24-bit explicit frequency.
///
/// ISO/IEC 14496-3:2019(E) - 1.6.2.4 (Table 1.22)
#[derive(FromPrimitive, Debug, Clone, PartialEq, Copy, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[must_use]
pub enum SampleFrequencyIndex {
    /// 96000 Hz
    Freq96000 = 0x0,
    /// 88200 Hz
    Freq88200 = 0x1,
    /// 64000 Hz
    Freq64000 = 0x2,
    /// 48000 Hz
    Freq48000 = 0x3,
    /// 44100 Hz
    Freq44100 = 0x4,
    /// 32000 Hz
    Freq32000 = 0x5,
    /// 24000 Hz
    Freq24000 = 0x6,
    /// 22050 Hz
    Freq22050 = 0x7,
    /// 16000 Hz
    Freq16000 = 0x8,
    /// 12000 Hz
    Freq12000 = 0x9,
    /// 11025 Hz
    Freq11025 = 0xA,
    /// 8000 Hz
    Freq8000 = 0xB,
    /// 7350 Hz
    Freq7350 = 0xC,
    /// Reserved
    FreqReserved = 0xD,
    /// Reserved
    FreqReserved2 = 0xE,
    /// Escape (the frequency follows as an explicit 24-bit value)
    FreqEscape = 0xF,
}

impl SampleFrequencyIndex {
    /// Convert the SampleFrequencyIndex to the actual frequency in Hz
    pub const fn to_freq(&self) -> Option<u32> {
        match self {
            SampleFrequencyIndex::Freq96000 => Some(96000),
            SampleFrequencyIndex::Freq88200 => Some(88200),
            SampleFrequencyIndex::Freq64000 => Some(64000),
            SampleFrequencyIndex::Freq48000 => Some(48000),
            SampleFrequencyIndex::Freq44100 => Some(44100),
            SampleFrequencyIndex::Freq32000 => Some(32000),
            SampleFrequencyIndex::Freq24000 => Some(24000),
            SampleFrequencyIndex::Freq22050 => Some(22050),
            SampleFrequencyIndex::Freq16000 => Some(16000),
            SampleFrequencyIndex::Freq12000 => Some(12000),
            SampleFrequencyIndex::Freq11025 => Some(11025),
            SampleFrequencyIndex::Freq8000 => Some(8000),
            SampleFrequencyIndex::Freq7350 => Some(7350),
            SampleFrequencyIndex::FreqReserved => None,
            SampleFrequencyIndex::FreqReserved2 => None,
            SampleFrequencyIndex::FreqEscape => None,
        }
    }

    /// Find the index encoding a frequency, if it is one of the table
    /// entries.
    pub fn from_freq(freq: u32) -> Option<Self> {
        let index = match freq {
            96000 => Self::Freq96000,
            88200 => Self::Freq88200,
            64000 => Self::Freq64000,
            48000 => Self::Freq48000,
            44100 => Self::Freq44100,
            32000 => Self::Freq32000,
            24000 => Self::Freq24000,
            22050 => Self::Freq22050,
            16000 => Self::Freq16000,
            12000 => Self::Freq12000,
            11025 => Self::Freq11025,
            8000 => Self::Freq8000,
            7350 => Self::Freq7350,
            _ => return None,
        };
        Some(index)
    }
}

/// Maps a 4-bit channel configuration onto the actual channel count.
///
/// Configuration 0 means the channel layout is defined elsewhere (in the
/// bitstream itself) and yields `None`.
/// ISO/IEC 14496-3:2019(E) - 1.6.3.4 (Table 1.23)
#[must_use]
pub const fn channel_count_for_configuration(config: u8) -> Option<u8> {
    match config {
        1 | 2 | 3 | 4 | 5 | 6 => Some(config),
        7 => Some(8),
        11 => Some(7),
        12 => Some(8),
        13 => Some(24),
        14 => Some(8),
        _ => None,
    }
}
