use bytes_util::SliceReader;
use media_types::ProbeError;

use crate::Result;

/// Metadata accompanying every extracted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadContext {
    /// Whether the packet carried multiple payloads.
    pub is_multi_payload: bool,
    /// Whether this payload is a sub-payload of a compressed payload.
    pub is_sub_payload: bool,
    /// Keyframe flag from the stream-number byte.
    pub is_key_frame: bool,
    /// Packet send time in milliseconds.
    pub packet_send_time: u32,
    /// Packet duration in milliseconds.
    pub packet_duration: u16,
    /// Media object number.
    pub media_object_number: u32,
    /// Offset into the media object, or the presentation time for
    /// compressed payloads.
    pub offset_into_media_object: u32,
    /// The replicated data bytes (empty for compressed payloads).
    pub replicated_data: Vec<u8>,
}

/// Reads a field whose width is governed by a 2-bit length-type code.
fn read_varlen(reader: &mut SliceReader<'_>, length_type: u8) -> Result<u32> {
    let value = match length_type {
        0 => 0,
        1 => reader.read_u8()? as u32,
        2 => reader.read_u16_le()? as u32,
        _ => reader.read_u32_le()?,
    };
    Ok(value)
}

/// Parses one data packet, invoking `on_payload` for every payload (or
/// sub-payload) it carries.
///
/// `data` must hold exactly one packet of the fixed size from the File
/// Properties Object.
pub fn parse_packet<F>(data: &[u8], on_payload: &mut F) -> Result<()>
where
    F: FnMut(u8, &[u8], &PayloadContext) -> Result<()>,
{
    let mut reader = SliceReader::new(data);

    // Error correction data, only in its compact 2-byte form.
    let first = reader.read_u8()?;
    let length_type_flags = if first & 0x80 != 0 {
        if first != 0x82 {
            return Err(ProbeError::unsupported(format!(
                "unsupported ASF error-correction descriptor 0x{first:02x}"
            )));
        }
        reader.skip(2)?;
        reader.read_u8()?
    } else {
        first
    };

    let multiple_payloads = length_type_flags & 0x01 != 0;
    let sequence_type = (length_type_flags >> 1) & 0x03;
    let padding_length_type = (length_type_flags >> 3) & 0x03;
    let packet_length_type = (length_type_flags >> 5) & 0x03;

    let property_flags = reader.read_u8()?;
    let replicated_data_length_type = property_flags & 0x03;
    let offset_length_type = (property_flags >> 2) & 0x03;
    let media_object_number_length_type = (property_flags >> 4) & 0x03;
    let stream_number_length_type = (property_flags >> 6) & 0x03;
    if stream_number_length_type != 1 {
        return Err(ProbeError::unsupported(
            "ASF stream-number length type must be 1",
        ));
    }

    let explicit_packet_length = read_varlen(&mut reader, packet_length_type)?;
    read_varlen(&mut reader, sequence_type)?;
    let padding_length = read_varlen(&mut reader, padding_length_type)? as usize;

    let packet_length = if explicit_packet_length > 0 {
        explicit_packet_length as usize
    } else {
        data.len()
    };
    if packet_length > data.len() || padding_length > packet_length {
        return Err(ProbeError::unsupported("ASF packet lengths are inconsistent"));
    }

    let send_time = reader.read_u32_le()?;
    let duration = reader.read_u16_le()?;

    let data_end = packet_length - padding_length;

    if multiple_payloads {
        let payload_flags = reader.read_u8()?;
        let payload_count = payload_flags & 0x3F;
        let payload_length_type = (payload_flags >> 6) & 0x03;

        for _ in 0..payload_count {
            parse_one_payload(
                &mut reader,
                PayloadLayout {
                    multiple: true,
                    payload_length_type,
                    replicated_data_length_type,
                    offset_length_type,
                    media_object_number_length_type,
                    send_time,
                    duration,
                    data_end,
                },
                on_payload,
            )?;
        }
    } else {
        parse_one_payload(
            &mut reader,
            PayloadLayout {
                multiple: false,
                payload_length_type: 0,
                replicated_data_length_type,
                offset_length_type,
                media_object_number_length_type,
                send_time,
                duration,
                data_end,
            },
            on_payload,
        )?;
    }

    Ok(())
}

struct PayloadLayout {
    multiple: bool,
    payload_length_type: u8,
    replicated_data_length_type: u8,
    offset_length_type: u8,
    media_object_number_length_type: u8,
    send_time: u32,
    duration: u16,
    data_end: usize,
}

fn parse_one_payload<F>(
    reader: &mut SliceReader<'_>,
    layout: PayloadLayout,
    on_payload: &mut F,
) -> Result<()>
where
    F: FnMut(u8, &[u8], &PayloadContext) -> Result<()>,
{
    let stream_byte = reader.read_u8()?;
    let stream_number = stream_byte & 0x7F;
    let is_key_frame = stream_byte & 0x80 != 0;

    let media_object_number =
        read_varlen(reader, layout.media_object_number_length_type)?;
    let offset_into_media_object = read_varlen(reader, layout.offset_length_type)?;
    let replicated_data_length =
        read_varlen(reader, layout.replicated_data_length_type)? as usize;

    if replicated_data_length == 1 {
        // Compressed payload: the offset field is the presentation time
        // and the data is a run of sub-payloads.
        let _presentation_time_delta = reader.read_u8()?;

        let total = if layout.multiple {
            read_varlen(reader, layout.payload_length_type)? as usize
        } else {
            layout.data_end.saturating_sub(reader.position())
        };
        let end = reader.position() + total;

        while reader.position() < end {
            let size = reader.read_u8()? as usize;
            if size == 0 {
                break;
            }
            let sub_payload = reader.read_slice(size)?;
            let context = PayloadContext {
                is_multi_payload: layout.multiple,
                is_sub_payload: true,
                is_key_frame,
                packet_send_time: layout.send_time,
                packet_duration: layout.duration,
                media_object_number,
                offset_into_media_object,
                replicated_data: Vec::new(),
            };
            on_payload(stream_number, sub_payload, &context)?;
        }
        return Ok(());
    }

    let replicated_data = reader.read_slice(replicated_data_length)?.to_vec();

    let payload_length = if layout.multiple {
        read_varlen(reader, layout.payload_length_type)? as usize
    } else {
        layout.data_end.saturating_sub(reader.position())
    };
    let payload = reader.read_slice(payload_length)?;

    let context = PayloadContext {
        is_multi_payload: layout.multiple,
        is_sub_payload: false,
        is_key_frame,
        packet_send_time: layout.send_time,
        packet_duration: layout.duration,
        media_object_number,
        offset_into_media_object,
        replicated_data,
    };
    on_payload(stream_number, payload, &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single-payload packet: EC byte 0x82, explicit types, 8 bytes of
    /// replicated data.
    fn single_payload_packet(payload: &[u8], padding: usize) -> Vec<u8> {
        let mut packet = vec![0x82, 0x00, 0x00];
        packet.push(0b0100_1000); // packet len u16, padding u8, no sequence, single payload
        packet.push(0b0101_0110); // stream number u8, object u8, offset u8, replicated u16
        let header_len = 3 + 2 + 2 + 1 + 4 + 2 + 1 + 1 + 1 + 2 + 8;
        let total = header_len + payload.len() + padding;
        packet.extend_from_slice(&(total as u16).to_le_bytes());
        packet.push(padding as u8);
        packet.extend_from_slice(&1500u32.to_le_bytes()); // send time
        packet.extend_from_slice(&40u16.to_le_bytes()); // duration
        packet.push(0x81); // keyframe, stream 1
        packet.push(7); // media object number
        packet.push(0); // offset
        packet.extend_from_slice(&8u16.to_le_bytes()); // replicated length
        packet.extend_from_slice(&[0xEE; 8]); // replicated data
        packet.extend_from_slice(payload);
        packet.extend_from_slice(&vec![0u8; padding]);
        packet
    }

    #[test]
    fn test_single_payload() {
        let packet = single_payload_packet(b"media-bytes-here", 5);

        let mut seen = Vec::new();
        parse_packet(&packet, &mut |stream, payload, context| {
            seen.push((stream, payload.to_vec(), context.clone()));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 1);
        let (stream, payload, context) = &seen[0];
        assert_eq!(*stream, 1);
        assert_eq!(payload, b"media-bytes-here");
        assert!(context.is_key_frame);
        assert!(!context.is_multi_payload);
        assert!(!context.is_sub_payload);
        assert_eq!(context.packet_send_time, 1500);
        assert_eq!(context.packet_duration, 40);
        assert_eq!(context.media_object_number, 7);
        assert_eq!(context.replicated_data, vec![0xEE; 8]);
    }

    #[test]
    fn test_multiple_payloads() {
        let mut packet = vec![0x82, 0x00, 0x00];
        packet.push(0b0000_0001); // no explicit lengths, multiple payloads
        packet.push(0b0101_0101); // all varlen fields u8, stream number u8
        packet.extend_from_slice(&9999u32.to_le_bytes());
        packet.extend_from_slice(&0u16.to_le_bytes());
        packet.push(0x42); // 2 payloads, length type 1 (u8)

        for (stream, body) in [(1u8, &b"first"[..]), (2, &b"second!"[..])] {
            packet.push(stream);
            packet.push(3); // media object number
            packet.push(0); // offset
            packet.push(0); // replicated data length 0
            packet.push(body.len() as u8);
            packet.extend_from_slice(body);
        }

        let mut seen = Vec::new();
        parse_packet(&packet, &mut |stream, payload, context| {
            seen.push((stream, payload.to_vec(), context.is_multi_payload));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, b"first".to_vec(), true),
                (2, b"second!".to_vec(), true),
            ]
        );
    }

    #[test]
    fn test_compressed_payload() {
        let mut packet = vec![0x82, 0x00, 0x00];
        packet.push(0b0000_0000); // single payload, no explicit lengths
        packet.push(0b0101_0101); // u8 fields
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.extend_from_slice(&0u16.to_le_bytes());
        packet.push(0x03); // stream 3
        packet.push(1); // media object number
        packet.push(9); // presentation time
        packet.push(1); // replicated length 1 -> compressed
        packet.push(0); // presentation time delta
        packet.extend_from_slice(&[4]); // sub-payload size
        packet.extend_from_slice(b"abcd");
        packet.extend_from_slice(&[2]);
        packet.extend_from_slice(b"ef");

        let mut seen = Vec::new();
        parse_packet(&packet, &mut |stream, payload, context| {
            assert!(context.is_sub_payload);
            seen.push((stream, payload.to_vec()));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![(3, b"abcd".to_vec()), (2 + 1, b"ef".to_vec())]);
    }

    #[test]
    fn test_rejects_long_error_correction() {
        let packet = [0x84u8, 0, 0, 0, 0, 0, 0, 0];
        let err = parse_packet(&packet, &mut |_, _, _| Ok(())).unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedFormat(_)));
    }
}
