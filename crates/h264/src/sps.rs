use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::{NalUnitType, strip_emulation_prevention};

/// Profiles that carry the chroma/bit-depth extension block before the
/// frame fields.
/// ISO/IEC-14496-10-2022 - 7.3.2.1.1
const EXTENDED_PROFILES: [u64; 9] = [44, 83, 86, 100, 110, 118, 122, 128, 244];

/// The fields of a Sequence Parameter Set a probe cares about.
/// ISO/IEC-14496-10-2022 - 7.3.2.1
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Sps {
    /// The `profile_idc` byte.
    pub profile_idc: u8,
    /// The six constraint flags plus the two reserved bits, as one byte.
    pub constraint_flags: u8,
    /// The `level_idc` byte.
    pub level_idc: u8,
    /// `seq_parameter_set_id`.
    pub seq_parameter_set_id: u16,
    /// `chroma_format_idc`; 1 (4:2:0) unless the extension block says
    /// otherwise.
    pub chroma_format_idc: u8,
    /// Luma bit depth.
    pub bit_depth_luma: u8,
    /// Chroma bit depth.
    pub bit_depth_chroma: u8,
    /// `frame_mbs_only_flag`.
    pub frame_mbs_only: bool,
    /// Decoded picture width in pixels, cropping applied.
    pub width: u32,
    /// Decoded picture height in pixels, cropping applied.
    pub height: u32,
}

impl Sps {
    /// Parses an SPS NAL unit (header byte first, emulation-prevention
    /// bytes still present).
    pub fn parse(nal: &[u8]) -> io::Result<Self> {
        if nal.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty NAL unit"));
        }
        if NalUnitType::from(nal[0] & 0x1F) != NalUnitType::SequenceParameterSet {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "NAL unit is not an SPS",
            ));
        }

        let rbsp = strip_emulation_prevention(&nal[1..]);
        Self::parse_rbsp(&rbsp)
    }

    /// Parses an SPS RBSP (emulation-prevention bytes already removed, no
    /// NAL header byte).
    pub fn parse_rbsp(rbsp: &[u8]) -> io::Result<Self> {
        let mut bits = BitReader::new_from_slice(rbsp);

        let profile_idc = bits.read_bits(8)? as u8;
        let constraint_flags = bits.read_bits(8)? as u8;
        let level_idc = bits.read_bits(8)? as u8;
        let seq_parameter_set_id = bits.read_exp_golomb()? as u16;

        let mut chroma_format_idc = 1u8;
        let mut bit_depth_luma = 8u8;
        let mut bit_depth_chroma = 8u8;

        if EXTENDED_PROFILES.contains(&(profile_idc as u64)) {
            chroma_format_idc = bits.read_exp_golomb()? as u8;
            if chroma_format_idc == 3 {
                // separate_colour_plane_flag
                bits.read_bit()?;
            }
            bit_depth_luma = bits.read_exp_golomb()? as u8 + 8;
            bit_depth_chroma = bits.read_exp_golomb()? as u8 + 8;
            // qpprime_y_zero_transform_bypass_flag
            bits.read_bit()?;

            if bits.read_bit()? {
                // seq_scaling_matrix_present_flag
                let list_count = if chroma_format_idc == 3 { 12 } else { 8 };
                for i in 0..list_count {
                    if bits.read_bit()? {
                        let size = if i < 6 { 16 } else { 64 };
                        skip_scaling_list(&mut bits, size)?;
                    }
                }
            }
        }

        // log2_max_frame_num_minus4
        bits.read_exp_golomb()?;

        let pic_order_cnt_type = bits.read_exp_golomb()?;
        match pic_order_cnt_type {
            0 => {
                // log2_max_pic_order_cnt_lsb_minus4
                bits.read_exp_golomb()?;
            }
            1 => {
                // delta_pic_order_always_zero_flag
                bits.read_bit()?;
                // offset_for_non_ref_pic
                bits.read_signed_exp_golomb()?;
                // offset_for_top_to_bottom_field
                bits.read_signed_exp_golomb()?;
                let cycle_length = bits.read_exp_golomb()?;
                for _ in 0..cycle_length {
                    bits.read_signed_exp_golomb()?;
                }
            }
            _ => {}
        }

        // max_num_ref_frames
        bits.read_exp_golomb()?;
        // gaps_in_frame_num_value_allowed_flag
        bits.read_bit()?;

        let pic_width_in_mbs_minus1 = bits.read_exp_golomb()? as u32;
        let pic_height_in_map_units_minus1 = bits.read_exp_golomb()? as u32;
        let frame_mbs_only = bits.read_bit()?;
        if !frame_mbs_only {
            // mb_adaptive_frame_field_flag
            bits.read_bit()?;
        }
        // direct_8x8_inference_flag
        bits.read_bit()?;

        let (crop_left, crop_right, crop_top, crop_bottom) = if bits.read_bit()? {
            (
                bits.read_exp_golomb()? as u32,
                bits.read_exp_golomb()? as u32,
                bits.read_exp_golomb()? as u32,
                bits.read_exp_golomb()? as u32,
            )
        } else {
            (0, 0, 0, 0)
        };

        // Crop units assume 4:2:0 subsampling; that covers everything this
        // probe is pointed at.
        let frame_height_factor = 2 - frame_mbs_only as u32;
        let width = (pic_width_in_mbs_minus1 + 1) * 16 - (crop_left + crop_right) * 2;
        let height = frame_height_factor * (pic_height_in_map_units_minus1 + 1) * 16
            - (crop_top + crop_bottom) * 2 * frame_height_factor;

        Ok(Self {
            profile_idc,
            constraint_flags,
            level_idc,
            seq_parameter_set_id,
            chroma_format_idc,
            bit_depth_luma,
            bit_depth_chroma,
            frame_mbs_only,
            width,
            height,
        })
    }

    /// The RFC 6381 codec string (`avc1.PPCCLL`).
    #[must_use]
    pub fn rfc6381_codec(&self) -> String {
        format!(
            "avc1.{:02X}{:02X}{:02X}",
            self.profile_idc, self.constraint_flags, self.level_idc
        )
    }

    /// The conventional profile name for `profile_idc`.
    #[must_use]
    pub const fn profile_name(&self) -> &'static str {
        match self.profile_idc {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4",
            _ => "Unknown",
        }
    }

    /// Level as its conventional decimal form (`level_idc` 31 -> "3.1").
    #[must_use]
    pub fn level_name(&self) -> String {
        format!("{}.{}", self.level_idc / 10, self.level_idc % 10)
    }
}

fn skip_scaling_list<R: io::Read>(bits: &mut BitReader<R>, size: u32) -> io::Result<()> {
    let mut last_scale: i64 = 8;
    let mut next_scale: i64 = 8;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = bits.read_signed_exp_golomb()?;
            next_scale = (last_scale + delta + 256) % 256;
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}
