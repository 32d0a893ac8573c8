use media_types::ProbeError;

use crate::Result;

/// Service Description Table - Table ID 0x42 on PID 0x0011.
///
/// Only the service names are extracted; they label the stream in the
/// probe result.
#[derive(Debug, Clone, Default)]
pub struct Sdt {
    /// Service names in section order.
    pub service_names: Vec<String>,
}

impl Sdt {
    /// Parses an SDT (actual transport stream) from PSI section data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 11 {
            return Err(ProbeError::InsufficientData {
                needed: 11,
                available: data.len(),
            });
        }

        if data[0] != 0x42 {
            return Err(ProbeError::unsupported(format!(
                "SDT table_id must be 0x42, got 0x{:02x}",
                data[0]
            )));
        }

        let section_length = ((data[1] as usize & 0x0F) << 8) | data[2] as usize;
        let section_end = (3 + section_length).min(data.len());
        let loop_end = section_end.saturating_sub(4); // exclude CRC32

        let mut service_names = Vec::new();
        // 8 header bytes, then original_network_id (2) + reserved (1).
        let mut offset = 11;

        while offset + 5 <= loop_end {
            let descriptors_loop_length =
                ((data[offset + 3] as usize & 0x0F) << 8) | data[offset + 4] as usize;
            offset += 5;

            let descriptors_end = (offset + descriptors_loop_length).min(loop_end);
            while offset + 2 <= descriptors_end {
                let tag = data[offset];
                let length = data[offset + 1] as usize;
                offset += 2;
                if offset + length > descriptors_end {
                    break;
                }

                // Service descriptor: type, provider, name.
                if tag == 0x48 && length >= 3 {
                    let body = &data[offset..offset + length];
                    let provider_len = body[1] as usize;
                    if let Some(name_len) = body.get(2 + provider_len).map(|&l| l as usize) {
                        let name_start = 3 + provider_len;
                        if name_start + name_len <= body.len() {
                            let name = &body[name_start..name_start + name_len];
                            if let Ok(name) = std::str::from_utf8(name) {
                                if !name.is_empty() {
                                    service_names.push(name.to_owned());
                                }
                            }
                        }
                    }
                }
                offset += length;
            }
            offset = descriptors_end;
        }

        Ok(Sdt { service_names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_name() {
        let provider = b"prov";
        let name = b"News HD";
        let descriptor_len = 3 + provider.len() + name.len();
        let loop_len = 2 + descriptor_len;
        let section_length = 8 + 5 + loop_len + 4;

        let mut data = vec![
            0x42,
            0xF0 | ((section_length >> 8) as u8 & 0x0F),
            (section_length & 0xFF) as u8,
            0x00, 0x01, // transport stream id
            0xC1, // version + current
            0x00, 0x00, // section numbers
            0x00, 0x01, // original network id
            0xFF, // reserved
            0x00, 0x01, // service id
            0xFC, // EIT flags
        ];
        data.push(0x80 | ((loop_len >> 8) as u8 & 0x0F));
        data.push((loop_len & 0xFF) as u8);
        data.push(0x48);
        data.push(descriptor_len as u8);
        data.push(0x01); // digital television service
        data.push(provider.len() as u8);
        data.extend_from_slice(provider);
        data.push(name.len() as u8);
        data.extend_from_slice(name);
        data.extend_from_slice(&[0, 0, 0, 0]); // CRC32

        let sdt = Sdt::parse(&data).unwrap();
        assert_eq!(sdt.service_names, vec!["News HD".to_string()]);
    }

    #[test]
    fn test_rejects_wrong_table() {
        assert!(Sdt::parse(&[0x00; 16]).is_err());
    }
}
