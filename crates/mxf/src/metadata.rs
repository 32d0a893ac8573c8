use std::collections::HashMap;

use bytes_util::SliceReader;

/// Structural and descriptor set identifiers (byte 14 of a metadata-set
/// key).
#[allow(missing_docs)]
pub mod set_kind {
    pub const SEQUENCE: u8 = 0x0F;
    pub const SOURCE_CLIP: u8 = 0x11;
    pub const CDCI_DESCRIPTOR: u8 = 0x28;
    pub const MATERIAL_PACKAGE: u8 = 0x36;
    pub const SOURCE_PACKAGE: u8 = 0x37;
    pub const EVENT_TRACK: u8 = 0x39;
    pub const STATIC_TRACK: u8 = 0x3A;
    pub const TIMELINE_TRACK: u8 = 0x3B;
    pub const GENERIC_SOUND_DESCRIPTOR: u8 = 0x42;
    pub const MULTIPLE_DESCRIPTOR: u8 = 0x44;
    pub const AES3_DESCRIPTOR: u8 = 0x47;
    pub const WAVE_DESCRIPTOR: u8 = 0x48;
    pub const MPEG2_VIDEO_DESCRIPTOR: u8 = 0x51;
}

/// Local-set property tags used by the track-discovery walk.
#[allow(missing_docs)]
pub mod tag {
    pub const COMPONENT_DURATION: u16 = 0x0202;
    pub const STRUCTURAL_COMPONENTS: u16 = 0x1001;
    pub const SOURCE_PACKAGE_ID: u16 = 0x1101;
    pub const SOURCE_TRACK_ID: u16 = 0x1102;
    pub const LINKED_TRACK_ID: u16 = 0x3002;
    pub const PICTURE_ESSENCE_CODING: u16 = 0x3201;
    pub const STORED_HEIGHT: u16 = 0x3202;
    pub const STORED_WIDTH: u16 = 0x3203;
    pub const INSTANCE_UID: u16 = 0x3C0A;
    pub const QUANTIZATION_BITS: u16 = 0x3D01;
    pub const SOUND_SAMPLE_RATE: u16 = 0x3D03;
    pub const SOUND_ESSENCE_CODING: u16 = 0x3D06;
    pub const CHANNEL_COUNT: u16 = 0x3D07;
    pub const SUB_DESCRIPTORS: u16 = 0x3F01;
    pub const PACKAGE_ID: u16 = 0x4401;
    pub const PACKAGE_TRACKS: u16 = 0x4403;
    pub const DESCRIPTOR: u16 = 0x4701;
    pub const TRACK_ID: u16 = 0x4801;
    pub const TRACK_NUMBER: u16 = 0x4804;
    pub const SEQUENCE_REF: u16 = 0x4803;
    pub const EDIT_RATE: u16 = 0x4B01;
    pub const MPEG_VIDEO_PROFILE: u16 = 0x8007;
}

/// A num/den rational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    /// Numerator.
    pub num: u32,
    /// Denominator.
    pub den: u32,
}

impl Rational {
    /// The rational as a float; `None` when degenerate.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        if self.num == 0 || self.den == 0 {
            return None;
        }
        Some(self.num as f64 / self.den as f64)
    }
}

/// One decoded metadata local set: its key and flat (tag, bytes)
/// properties.
#[derive(Debug, Clone)]
pub struct MetadataSet {
    /// The full 16-byte set key.
    pub key: [u8; 16],
    properties: Vec<(u16, Vec<u8>)>,
}

impl MetadataSet {
    /// Decodes a local set from a KLV value.
    #[must_use]
    pub fn parse(key: [u8; 16], value: &[u8]) -> Self {
        let mut properties = Vec::new();
        let mut reader = SliceReader::new(value);

        while reader.remaining() >= 4 {
            let Ok(tag) = reader.read_u16_be() else { break };
            let Ok(length) = reader.read_u16_be() else { break };
            let Ok(bytes) = reader.read_slice(length as usize) else {
                break;
            };
            properties.push((tag, bytes.to_vec()));
        }

        Self { key, properties }
    }

    /// The set-kind byte of the key.
    #[must_use]
    pub const fn kind(&self) -> u8 {
        self.key[14]
    }

    /// Raw bytes of a property.
    #[must_use]
    pub fn get(&self, tag: u16) -> Option<&[u8]> {
        self.properties
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// The instance UID, used for cross-referencing.
    #[must_use]
    pub fn instance_uid(&self) -> Option<[u8; 16]> {
        self.get(tag::INSTANCE_UID)?.get(..16)?.try_into().ok()
    }

    /// A property as a big-endian unsigned integer of up to 8 bytes.
    #[must_use]
    pub fn get_uint(&self, tag: u16) -> Option<u64> {
        let bytes = self.get(tag)?;
        if bytes.is_empty() || bytes.len() > 8 {
            return None;
        }
        let mut value = 0u64;
        for &byte in bytes {
            value = (value << 8) | byte as u64;
        }
        Some(value)
    }

    /// A property as a num/den rational.
    #[must_use]
    pub fn get_rational(&self, tag: u16) -> Option<Rational> {
        let bytes = self.get(tag)?;
        let mut reader = SliceReader::new(bytes);
        let num = reader.read_u32_be().ok()?;
        let den = reader.read_u32_be().ok()?;
        Some(Rational { num, den })
    }

    /// A property as a batch of 16-byte UID references
    /// (count + item-size prefixed).
    #[must_use]
    pub fn get_uid_array(&self, tag: u16) -> Option<Vec<[u8; 16]>> {
        let bytes = self.get(tag)?;
        let mut reader = SliceReader::new(bytes);
        let count = reader.read_u32_be().ok()? as usize;
        let item_size = reader.read_u32_be().ok()? as usize;
        if item_size < 16 {
            return None;
        }

        let mut out = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let item = reader.read_slice(item_size).ok()?;
            let uid: [u8; 16] = item[..16].try_into().ok()?;
            out.push(uid);
        }
        Some(out)
    }
}

/// All metadata sets of a file: an ordered arena plus an instance-UID
/// index for reference chasing. Dangling references resolve to `None`.
#[derive(Debug, Default)]
pub struct SetArena {
    sets: Vec<MetadataSet>,
    by_uid: HashMap<[u8; 16], usize>,
}

impl SetArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a set, indexing it by instance UID when it has one.
    pub fn insert(&mut self, set: MetadataSet) {
        if let Some(uid) = set.instance_uid() {
            self.by_uid.insert(uid, self.sets.len());
        }
        self.sets.push(set);
    }

    /// Resolves an instance-UID reference.
    #[must_use]
    pub fn by_uid(&self, uid: &[u8; 16]) -> Option<&MetadataSet> {
        self.sets.get(*self.by_uid.get(uid)?)
    }

    /// Iterates all sets in file order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataSet> {
        self.sets.iter()
    }

    /// The first set of a given kind, in file order.
    #[must_use]
    pub fn first_of_kind(&self, kind: u8) -> Option<&MetadataSet> {
        self.sets.iter().find(|set| set.kind() == kind)
    }
}
