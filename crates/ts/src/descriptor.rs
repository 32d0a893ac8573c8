/// Decoded fields from a PMT elementary-stream descriptor loop.
///
/// Everything is optional: descriptors only enrich what the stream type
/// and payload sniffing established.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EsDescriptors {
    /// ISO-639 language code.
    pub language: Option<String>,
    /// Broadcast audio-type label.
    pub audio_type: Option<String>,
    /// Registration descriptor format identifier (4 ASCII chars).
    pub registration: Option<String>,
    /// AVC descriptor (profile_idc, level_idc).
    pub avc: Option<(u8, u8)>,
    /// HEVC descriptor (profile_idc, level_idc).
    pub hevc: Option<(u8, u8)>,
    /// AC-3 / E-AC-3 descriptor fields.
    pub ac3: Option<Ac3Descriptor>,
    /// DTS descriptor fields.
    pub dts: Option<DtsDescriptor>,
}

/// Fields of the AC-3 and E-AC-3 descriptors (tags 0x6A and 0x7B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ac3Descriptor {
    /// Whether this is the E-AC-3 variant.
    pub enhanced: bool,
    /// component_type byte, when flagged.
    pub component_type: Option<u8>,
    /// Bit-stream mode, when flagged.
    pub bsmod: Option<u8>,
    /// mainid, when flagged.
    pub main_id: Option<u8>,
    /// asvc, when flagged.
    pub asvc: Option<u8>,
}

/// Fields of the DTS descriptor (tag 0x7A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtsDescriptor {
    /// Sample-rate code (high nibble of byte 0).
    pub sample_rate_code: u8,
    /// Bit-rate code (low nibble of byte 0).
    pub bitrate_code: u8,
    /// Surround-mode code (high bits of byte 1).
    pub surround_mode: u8,
}

impl DtsDescriptor {
    /// Human-readable surround mode.
    #[must_use]
    pub fn surround_mode_name(&self) -> String {
        match self.surround_mode {
            0 => "Not indicated".to_owned(),
            1 => "2ch matrix encoded".to_owned(),
            2 => "Discrete".to_owned(),
            other => format!("Mode {other}"),
        }
    }
}

/// Broadcast audio-type labels of the ISO-639 language descriptor.
fn audio_type_name(value: u8) -> Option<String> {
    let name = match value {
        0 => "Music",
        1 => "Effects",
        2 => "Hearing impaired",
        3 => "Visual impaired",
        other => return Some(format!("Type {other}")),
    };
    Some(name.to_owned())
}

impl EsDescriptors {
    /// Walks a descriptor loop, picking out the tags the probe uses.
    #[must_use]
    pub fn parse(es_info: &[u8]) -> Self {
        let mut out = Self::default();
        let mut offset = 0;

        while offset + 2 <= es_info.len() {
            let tag = es_info[offset];
            let length = es_info[offset + 1] as usize;
            offset += 2;
            if offset + length > es_info.len() {
                break;
            }
            let body = &es_info[offset..offset + length];
            offset += length;

            match tag {
                // ISO-639 language descriptor
                0x0A if body.len() >= 4 => {
                    if let Ok(language) = std::str::from_utf8(&body[..3]) {
                        out.language = Some(language.to_owned());
                    }
                    out.audio_type = audio_type_name(body[3]);
                }
                // Registration descriptor
                0x05 if body.len() >= 4 => {
                    if let Ok(format) = std::str::from_utf8(&body[..4]) {
                        out.registration = Some(format.to_owned());
                    }
                }
                // AVC video descriptor
                0x28 if body.len() >= 3 => {
                    out.avc = Some((body[0], body[2]));
                }
                // HEVC video descriptor
                0x38 if body.len() >= 12 => {
                    out.hevc = Some((body[0] & 0x1F, body[11]));
                }
                // AC-3 descriptor
                0x6A => {
                    out.ac3 = Some(parse_ac3(body, false));
                }
                // E-AC-3 descriptor
                0x7B => {
                    out.ac3 = Some(parse_ac3(body, true));
                }
                // DTS descriptor
                0x7A if body.len() >= 2 => {
                    out.dts = Some(DtsDescriptor {
                        sample_rate_code: body[0] >> 4,
                        bitrate_code: body[0] & 0x0F,
                        surround_mode: body[1] >> 5,
                    });
                }
                _ => {}
            }
        }

        out
    }
}

fn parse_ac3(body: &[u8], enhanced: bool) -> Ac3Descriptor {
    let mut descriptor = Ac3Descriptor {
        enhanced,
        ..Default::default()
    };

    let Some(&flags) = body.first() else {
        return descriptor;
    };

    let mut index = 1;
    let mut take = || {
        let value = body.get(index).copied();
        index += 1;
        value
    };

    if flags & 0x80 != 0 {
        descriptor.component_type = take();
    }
    if flags & 0x40 != 0 {
        descriptor.bsmod = take();
    }
    if flags & 0x20 != 0 {
        descriptor.main_id = take();
    }
    if flags & 0x10 != 0 {
        descriptor.asvc = take();
    }

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_and_audio_type() {
        let info = [0x0A, 0x04, b'e', b'n', b'g', 0x02];
        let descriptors = EsDescriptors::parse(&info);
        assert_eq!(descriptors.language.as_deref(), Some("eng"));
        assert_eq!(descriptors.audio_type.as_deref(), Some("Hearing impaired"));
    }

    #[test]
    fn test_registration() {
        let info = [0x05, 0x04, b'A', b'C', b'-', b'3'];
        let descriptors = EsDescriptors::parse(&info);
        assert_eq!(descriptors.registration.as_deref(), Some("AC-3"));
    }

    #[test]
    fn test_avc_and_hevc() {
        let avc = [0x28, 0x04, 100, 0x00, 41, 0x00];
        assert_eq!(EsDescriptors::parse(&avc).avc, Some((100, 41)));

        let mut hevc = vec![0x38, 13];
        hevc.extend_from_slice(&[0x21, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 123, 0]);
        assert_eq!(EsDescriptors::parse(&hevc).hevc, Some((0x01, 123)));
    }

    #[test]
    fn test_ac3_flags() {
        // component_type + mainid present, bsmod + asvc absent.
        let info = [0x6A, 0x03, 0xA0, 0x42, 0x01];
        let ac3 = EsDescriptors::parse(&info).ac3.unwrap();
        assert!(!ac3.enhanced);
        assert_eq!(ac3.component_type, Some(0x42));
        assert_eq!(ac3.bsmod, None);
        assert_eq!(ac3.main_id, Some(0x01));
        assert_eq!(ac3.asvc, None);
    }

    #[test]
    fn test_eac3() {
        let info = [0x7B, 0x01, 0x00];
        let ac3 = EsDescriptors::parse(&info).ac3.unwrap();
        assert!(ac3.enhanced);
    }

    #[test]
    fn test_dts() {
        let info = [0x7A, 0x02, 0x2B, 0x40];
        let dts = EsDescriptors::parse(&info).dts.unwrap();
        assert_eq!(dts.sample_rate_code, 2);
        assert_eq!(dts.bitrate_code, 0x0B);
        assert_eq!(dts.surround_mode, 2);
        assert_eq!(dts.surround_mode_name(), "Discrete");
    }

    #[test]
    fn test_truncated_loop_is_ignored() {
        let info = [0x0A, 0x20, b'e'];
        assert_eq!(EsDescriptors::parse(&info), EsDescriptors::default());
    }
}
