use memchr::memmem;

/// NAL unit types.
/// ISO/IEC-14496-10-2022 - 7.4.1 (Table 7-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// Coded slice of a non-IDR picture
    NonIdrSlice,
    /// Coded slice data partition A
    DataPartitionA,
    /// Coded slice data partition B
    DataPartitionB,
    /// Coded slice data partition C
    DataPartitionC,
    /// Coded slice of an IDR picture
    IdrSlice,
    /// Supplemental enhancement information
    Sei,
    /// Sequence parameter set
    SequenceParameterSet,
    /// Picture parameter set
    PictureParameterSet,
    /// Access unit delimiter
    AccessUnitDelimiter,
    /// End of sequence
    EndOfSequence,
    /// End of stream
    EndOfStream,
    /// Filler data
    FillerData,
    /// Any other type
    Unknown(u8),
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::NonIdrSlice,
            2 => Self::DataPartitionA,
            3 => Self::DataPartitionB,
            4 => Self::DataPartitionC,
            5 => Self::IdrSlice,
            6 => Self::Sei,
            7 => Self::SequenceParameterSet,
            8 => Self::PictureParameterSet,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            other => Self::Unknown(other),
        }
    }
}

/// A NAL unit located inside an Annex-B byte stream.
///
/// `data` starts at the NAL header byte and runs to the next start code
/// (or the end of the scanned buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// The NAL unit type from the header byte.
    pub nal_type: NalUnitType,
    /// Header byte plus EBSP payload.
    pub data: &'a [u8],
}

/// Scans an Annex-B byte stream for NAL units delimited by `00 00 01` or
/// `00 00 00 01` start codes.
#[must_use]
pub fn find_nal_units(data: &[u8]) -> Vec<NalUnit<'_>> {
    let mut units = Vec::new();
    let finder = memmem::Finder::new(&[0x00, 0x00, 0x01]);

    let mut starts = Vec::new();
    let mut search_from = 0;
    while let Some(pos) = finder.find(&data[search_from..]) {
        let pos = search_from + pos;
        starts.push(pos + 3);
        search_from = pos + 3;
    }

    for (i, &start) in starts.iter().enumerate() {
        if start >= data.len() {
            break;
        }
        let mut end = match starts.get(i + 1) {
            Some(&next_start) => next_start - 3,
            None => data.len(),
        };
        // A four-byte start code leaves its leading zero on the previous
        // unit; trim it.
        while end > start && data[end - 1] == 0x00 {
            end -= 1;
        }

        let unit = &data[start..end];
        if unit.is_empty() {
            continue;
        }
        units.push(NalUnit {
            nal_type: NalUnitType::from(unit[0] & 0x1F),
            data: unit,
        });
    }

    units
}

/// Removes emulation-prevention bytes from an EBSP, yielding the RBSP.
///
/// Every `00 00 03` sequence becomes `00 00`; the following byte is kept
/// as-is.
#[must_use]
pub fn strip_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(data.len());
    let mut zero_count = 0u8;

    for &byte in data {
        if zero_count >= 2 && byte == 0x03 {
            zero_count = 0;
            continue;
        }

        if byte == 0x00 {
            zero_count += 1;
        } else {
            zero_count = 0;
        }
        rbsp.push(byte);
    }

    rbsp
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    /// Inserts emulation-prevention bytes, the inverse of
    /// [`strip_emulation_prevention`].
    fn insert_emulation_prevention(data: &[u8]) -> Vec<u8> {
        let mut ebsp = Vec::with_capacity(data.len());
        let mut zero_count = 0u8;
        for &byte in data {
            if zero_count >= 2 && byte <= 0x03 {
                ebsp.push(0x03);
                zero_count = 0;
            }
            ebsp.push(byte);
            if byte == 0x00 {
                zero_count += 1;
            } else {
                zero_count = 0;
            }
        }
        ebsp
    }

    #[test]
    fn test_strip_emulation_prevention() {
        assert_eq!(
            strip_emulation_prevention(&[0x00, 0x00, 0x03, 0x01]),
            vec![0x00, 0x00, 0x01]
        );
        assert_eq!(
            strip_emulation_prevention(&[0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x02]),
            vec![0x00, 0x00, 0x00, 0x00, 0x02]
        );
        // 0x03 not preceded by two zeros is data.
        assert_eq!(
            strip_emulation_prevention(&[0x00, 0x03, 0x00]),
            vec![0x00, 0x03, 0x00]
        );
    }

    #[test]
    fn test_roundtrip_any_byte() {
        // Whatever byte is spliced into an RBSP, inserting and then
        // removing emulation prevention returns the original.
        let base: Vec<u8> = vec![0x00, 0x00, 0x01, 0x42, 0x00, 0x00, 0x00, 0x7F];
        for value in 0u16..=255 {
            for pos in 0..=base.len() {
                let mut rbsp = base.clone();
                rbsp.insert(pos, value as u8);
                let ebsp = insert_emulation_prevention(&rbsp);
                assert_eq!(strip_emulation_prevention(&ebsp), rbsp);
            }
        }
    }

    #[test]
    fn test_find_nal_units() {
        let stream = [
            0x00, 0x00, 0x00, 0x01, 0x67, 0xAA, 0xBB, // SPS (4-byte start code)
            0x00, 0x00, 0x01, 0x68, 0xCC, // PPS (3-byte start code)
            0x00, 0x00, 0x01, 0x65, 0xDD, 0xEE, // IDR slice
        ];

        let units = find_nal_units(&stream);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].nal_type, NalUnitType::SequenceParameterSet);
        assert_eq!(units[0].data, &[0x67, 0xAA, 0xBB]);
        assert_eq!(units[1].nal_type, NalUnitType::PictureParameterSet);
        assert_eq!(units[1].data, &[0x68, 0xCC]);
        assert_eq!(units[2].nal_type, NalUnitType::IdrSlice);
        assert_eq!(units[2].data, &[0x65, 0xDD, 0xEE]);
    }

    #[test]
    fn test_find_nal_units_empty() {
        assert!(find_nal_units(&[0xAA, 0xBB, 0xCC]).is_empty());
    }
}
