use media_types::ProbeError;

use crate::Result;

/// The 7-byte prefix every top-level MXF key opens with; the first key of
/// a file must match it exactly.
pub const PARTITION_KEY_PREFIX: [u8; 7] = [0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01];

/// The prefix of essence-element keys.
pub const ESSENCE_KEY_PREFIX: [u8; 7] = [0x06, 0x0E, 0x2B, 0x34, 0x01, 0x02, 0x01];

/// A parsed KLV header (key + BER length), without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KlvHeader {
    /// The 16-byte SMPTE Universal Label.
    pub key: [u8; 16],
    /// Value length; `None` for the undefined-length encoding (0x80).
    pub length: Option<u64>,
    /// Bytes the key and length occupy.
    pub header_len: usize,
}

/// What a KLV's key classifies it as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlvKind {
    /// A local-set metadata item (key bytes 5-6 are `02 53`).
    MetadataSet,
    /// A partition pack (key bytes 5-6 are `02 05`, byte 13 in 2..=4).
    PartitionPack,
    /// An essence element; carries the 16-bit essence track number from
    /// key bytes 12-13.
    Essence {
        /// Track number from the key.
        track_number: u16,
    },
    /// Anything else (index tables, fill items, ...).
    Other,
}

/// Parses a KLV header from the start of `data`.
///
/// Returns `None` when more bytes are needed to complete the header.
pub fn parse_klv_header(data: &[u8]) -> Result<Option<KlvHeader>> {
    if data.len() < 17 {
        return Ok(None);
    }

    let mut key = [0u8; 16];
    key.copy_from_slice(&data[..16]);

    let first = data[16];
    if first & 0x80 == 0 {
        // Short form.
        return Ok(Some(KlvHeader {
            key,
            length: Some(first as u64),
            header_len: 17,
        }));
    }

    let length_of_length = (first & 0x7F) as usize;
    if length_of_length == 0 {
        // BER "undefined length".
        return Ok(Some(KlvHeader {
            key,
            length: None,
            header_len: 17,
        }));
    }
    if length_of_length > 8 {
        return Err(ProbeError::unsupported("BER length wider than 8 bytes"));
    }
    if data.len() < 17 + length_of_length {
        return Ok(None);
    }

    let mut length = 0u64;
    for &byte in &data[17..17 + length_of_length] {
        length = (length << 8) | byte as u64;
    }

    Ok(Some(KlvHeader {
        key,
        length: Some(length),
        header_len: 17 + length_of_length,
    }))
}

impl KlvHeader {
    /// Classifies this KLV by its key.
    #[must_use]
    pub fn kind(&self) -> KlvKind {
        if self.key[..7] == ESSENCE_KEY_PREFIX {
            let track_number = ((self.key[12] as u16) << 8) | self.key[13] as u16;
            return KlvKind::Essence { track_number };
        }
        match self.key[4..6] {
            [0x02, 0x53] => KlvKind::MetadataSet,
            [0x02, 0x05] if matches!(self.key[13], 2..=4) => KlvKind::PartitionPack,
            _ => KlvKind::Other,
        }
    }
}
