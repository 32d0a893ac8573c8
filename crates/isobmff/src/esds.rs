use aac::AudioSpecificConfig;
use bytes_util::SliceReader;
use media_types::AudioCodec;

/// What the ES-descriptor loop of an `esds` box yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsDescriptor {
    /// objectTypeIndication from the DecoderConfigDescriptor.
    pub object_type_indication: u8,
    /// Average bitrate in bits per second, when nonzero.
    pub avg_bitrate: Option<u32>,
    /// The decoder-specific info, parsed as an AudioSpecificConfig when
    /// present.
    pub audio_config: Option<AudioSpecificConfig>,
}

impl EsDescriptor {
    /// The codec the objectTypeIndication maps to.
    #[must_use]
    pub const fn codec(&self) -> Option<AudioCodec> {
        match self.object_type_indication {
            // MPEG-4 audio and the MPEG-2 AAC profiles.
            0x40 | 0x66 | 0x67 | 0x68 => Some(AudioCodec::Aac),
            // MPEG-1/2 audio layer III.
            0x69 | 0x6B => Some(AudioCodec::Mp3),
            0xA5 => Some(AudioCodec::Ac3),
            0xA6 => Some(AudioCodec::Eac3),
            0xA9 => Some(AudioCodec::Dts),
            0xDD => Some(AudioCodec::Vorbis),
            _ => None,
        }
    }

    /// The RFC 6381 style codec detail for an AAC stream
    /// (`mp4a.40.<aot>`).
    #[must_use]
    pub fn codec_detail(&self) -> Option<String> {
        match (self.object_type_indication, self.audio_config) {
            (0x40, Some(config)) => Some(format!(
                "mp4a.40.{}",
                config.audio_object_type.as_u16()
            )),
            (oti, _) => Some(format!("mp4a.{oti:02x}")),
        }
    }
}

/// Reads an MPEG-4 descriptor "expandable" length: 7-bit limbs, high bit
/// flags continuation, at most 4 bytes.
fn read_expandable_length(reader: &mut SliceReader<'_>) -> Option<usize> {
    let mut length = 0usize;
    for _ in 0..4 {
        let byte = reader.read_u8().ok()?;
        length = (length << 7) | (byte & 0x7F) as usize;
        if byte & 0x80 == 0 {
            return Some(length);
        }
    }
    Some(length)
}

/// Parses the descriptor loop of an `esds` box body (after the full-box
/// version/flags word).
#[must_use]
pub fn parse_es_descriptor(body: &[u8]) -> Option<EsDescriptor> {
    let mut reader = SliceReader::new(body);

    // ES_Descriptor.
    if reader.read_u8().ok()? != 0x03 {
        return None;
    }
    read_expandable_length(&mut reader)?;
    reader.skip(2).ok()?; // ES_ID
    let flags = reader.read_u8().ok()?;
    if flags & 0x80 != 0 {
        reader.skip(2).ok()?; // dependsOn_ES_ID
    }
    if flags & 0x40 != 0 {
        let url_length = reader.read_u8().ok()? as usize;
        reader.skip(url_length).ok()?;
    }
    if flags & 0x20 != 0 {
        reader.skip(2).ok()?; // OCR_ES_ID
    }

    // DecoderConfigDescriptor.
    if reader.read_u8().ok()? != 0x04 {
        return None;
    }
    read_expandable_length(&mut reader)?;
    let object_type_indication = reader.read_u8().ok()?;
    reader.skip(1).ok()?; // streamType + upStream
    reader.skip(3).ok()?; // bufferSizeDB
    reader.skip(4).ok()?; // maxBitrate
    let avg_bitrate = reader.read_u32_be().ok()?;

    // DecoderSpecificInfo, when present.
    let mut audio_config = None;
    if reader.remaining() > 1 && reader.read_u8().ok()? == 0x05 {
        let length = read_expandable_length(&mut reader)?;
        let info = reader.read_slice(length).ok()?;
        audio_config = AudioSpecificConfig::parse(info).ok();
    }

    Some(EsDescriptor {
        object_type_indication,
        avg_bitrate: (avg_bitrate > 0).then_some(avg_bitrate),
        audio_config,
    })
}

/// Builds a minimal descriptor loop, shared by the unit tests of this
/// crate.
#[cfg(test)]
pub(crate) fn build_esds_body(oti: u8, avg_bitrate: u32, asc: &[u8]) -> Vec<u8> {
    let dsi_len = asc.len();
    let dcd_len = 13 + if dsi_len > 0 { 2 + dsi_len } else { 0 };
    let esd_len = 3 + 2 + dcd_len;

    let mut body = vec![0x03, esd_len as u8];
    body.extend_from_slice(&[0x00, 0x01]); // ES_ID
    body.push(0x00); // flags
    body.push(0x04);
    body.push(dcd_len as u8);
    body.push(oti);
    body.push(0x15); // audio stream
    body.extend_from_slice(&[0x00, 0x00, 0x00]); // buffer size
    body.extend_from_slice(&0u32.to_be_bytes()); // max bitrate
    body.extend_from_slice(&avg_bitrate.to_be_bytes());
    if dsi_len > 0 {
        body.push(0x05);
        body.push(dsi_len as u8);
        body.extend_from_slice(asc);
    }
    body
}
