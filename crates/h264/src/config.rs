use std::io;

use bytes_util::SliceReader;

use crate::Sps;

/// The AVCDecoderConfigurationRecord carried in `avcC` boxes and Matroska
/// CodecPrivate.
/// ISO/IEC-14496-15-2022 - 5.3.2.1
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct AvcDecoderConfigurationRecord {
    /// AVCProfileIndication
    pub profile_indication: u8,
    /// profile_compatibility
    pub profile_compatibility: u8,
    /// AVCLevelIndication
    pub level_indication: u8,
    /// lengthSizeMinusOne (NAL length prefix size - 1)
    pub length_size_minus_one: u8,
    /// The first sequence parameter set, decoded.
    pub sps: Option<Sps>,
}

impl AvcDecoderConfigurationRecord {
    /// Parses an `avcC` payload.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut reader = SliceReader::new(data);

        let configuration_version = reader.read_u8()?;
        if configuration_version != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unsupported avcC configuration version",
            ));
        }

        let profile_indication = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;
        let length_size_minus_one = reader.read_u8()? & 0x03;

        let sps_count = reader.read_u8()? & 0x1F;
        let mut sps = None;
        for _ in 0..sps_count {
            let length = reader.read_u16_be()? as usize;
            let nal = reader.read_slice(length)?;
            if sps.is_none() {
                sps = Sps::parse(nal).ok();
            }
        }

        Ok(Self {
            profile_indication,
            profile_compatibility,
            level_indication,
            length_size_minus_one,
            sps,
        })
    }

    /// The RFC 6381 codec string (`avc1.PPCCLL`).
    #[must_use]
    pub fn rfc6381_codec(&self) -> String {
        format!(
            "avc1.{:02X}{:02X}{:02X}",
            self.profile_indication, self.profile_compatibility, self.level_indication
        )
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn baseline_sps_nal() -> Vec<u8> {
        use bytes_util::BitWriter;
        use expgolomb::BitWriterExpGolombExt;

        let mut w = BitWriter::<Vec<u8>>::default();
        w.write_bits(66, 8).unwrap();
        w.write_bits(0xC0, 8).unwrap();
        w.write_bits(30, 8).unwrap();
        w.write_exp_golomb(0).unwrap();
        w.write_exp_golomb(4).unwrap();
        w.write_exp_golomb(2).unwrap();
        w.write_exp_golomb(3).unwrap();
        w.write_bit(false).unwrap();
        w.write_exp_golomb(79).unwrap();
        w.write_exp_golomb(44).unwrap();
        w.write_bit(true).unwrap();
        w.write_bit(true).unwrap();
        w.write_bit(false).unwrap();
        w.write_bit(true).unwrap();
        let rbsp = w.finish().unwrap();

        let mut nal = vec![0x67];
        nal.extend_from_slice(&rbsp);
        nal
    }

    #[test]
    fn test_parse_avcc() {
        let sps_nal = baseline_sps_nal();

        let mut avcc = vec![
            0x01, // configuration version
            66,   // profile
            0xC0, // compatibility
            30,   // level
            0xFF, // reserved + lengthSizeMinusOne = 3
            0xE1, // reserved + 1 SPS
        ];
        avcc.extend_from_slice(&(sps_nal.len() as u16).to_be_bytes());
        avcc.extend_from_slice(&sps_nal);
        avcc.push(0x00); // 0 PPS

        let record = AvcDecoderConfigurationRecord::parse(&avcc).unwrap();
        assert_eq!(record.profile_indication, 66);
        assert_eq!(record.level_indication, 30);
        assert_eq!(record.length_size_minus_one, 3);
        assert_eq!(record.rfc6381_codec(), "avc1.42C01E");

        let sps = record.sps.unwrap();
        assert_eq!(sps.width, 1280);
        assert_eq!(sps.height, 720);
    }

    #[test]
    fn test_rejects_bad_version() {
        assert!(AvcDecoderConfigurationRecord::parse(&[0x02, 66, 0, 30, 0xFF, 0xE0]).is_err());
    }
}
