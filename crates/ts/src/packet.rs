use media_types::ProbeError;

use crate::Result;

/// PAT PID (always 0x0000)
pub const PID_PAT: u16 = 0x0000;

/// SDT PID (always 0x0011)
pub const PID_SDT: u16 = 0x0011;

/// NULL PID (always 0x1FFF)
pub const PID_NULL: u16 = 0x1FFF;

/// TS sync byte
pub const SYNC_BYTE: u8 = 0x47;

/// Bytes of TS content per packet.
pub const TS_PACKET_LEN: usize = 188;

/// How far into the stream a sync pattern is searched for.
const SYNC_SCAN_LIMIT: usize = 1000;

/// How many consecutive slots must repeat the sync byte before a packet
/// size is trusted.
const SYNC_VERIFY_SLOTS: usize = 4;

/// Physical packet layout of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketSize {
    /// Plain 188-byte transport packets.
    Standard,
    /// 192-byte M2TS packets: a 4-byte TP_extra_header before each
    /// transport packet.
    M2ts,
}

impl PacketSize {
    /// Total stored bytes per packet.
    #[must_use]
    pub const fn total_len(&self) -> usize {
        match self {
            Self::Standard => TS_PACKET_LEN,
            Self::M2ts => 192,
        }
    }

    /// Offset of the sync byte within a stored packet.
    #[must_use]
    pub const fn sync_offset(&self) -> usize {
        match self {
            Self::Standard => 0,
            Self::M2ts => 4,
        }
    }
}

/// Detects the packet layout by finding a sync byte whose position repeats
/// at 188- or 192-byte spacing.
///
/// Returns the layout and the offset of the first packet (the start of its
/// stored slot, i.e. before the TP_extra_header for M2TS). Fails with
/// [`ProbeError::UnsupportedFormat`] when no pattern validates within the
/// first 1000 bytes.
pub fn detect_packet_size(data: &[u8]) -> Result<(PacketSize, usize)> {
    let scan_limit = data.len().min(SYNC_SCAN_LIMIT);

    for candidate in 0..scan_limit {
        if data[candidate] != SYNC_BYTE {
            continue;
        }

        for size in [PacketSize::Standard, PacketSize::M2ts] {
            let stride = size.total_len();
            let verified = (1..=SYNC_VERIFY_SLOTS).all(|slot| {
                data.get(candidate + slot * stride) == Some(&SYNC_BYTE)
            });
            if verified {
                let start = match size {
                    PacketSize::Standard => candidate,
                    // The candidate points at the sync byte, which sits 4
                    // bytes into the stored slot.
                    PacketSize::M2ts => {
                        if candidate < 4 {
                            continue;
                        }
                        candidate - 4
                    }
                };
                return Ok((size, start));
            }
        }
    }

    Err(ProbeError::unsupported(
        "no repeating TS sync pattern within the first 1000 bytes",
    ))
}

/// A parsed transport packet header with its payload borrowed from the
/// input window.
#[derive(Debug, Clone, Copy)]
pub struct TsPacket<'a> {
    /// Transport Error Indicator
    pub transport_error_indicator: bool,
    /// Payload Unit Start Indicator
    pub payload_unit_start_indicator: bool,
    /// Packet Identifier
    pub pid: u16,
    /// Adaptation Field Control
    pub adaptation_field_control: u8,
    /// Continuity Counter
    pub continuity_counter: u8,
    /// Payload bytes after the header and any adaptation field.
    pub payload: Option<&'a [u8]>,
}

impl<'a> TsPacket<'a> {
    /// Parses one 188-byte transport packet.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() != TS_PACKET_LEN {
            return Err(ProbeError::unsupported(format!(
                "TS packet must be 188 bytes, got {}",
                data.len()
            )));
        }

        if data[0] != SYNC_BYTE {
            return Err(ProbeError::unsupported(format!(
                "invalid sync byte 0x{:02x}",
                data[0]
            )));
        }

        let byte1 = data[1];
        let byte2 = data[2];
        let byte3 = data[3];

        let transport_error_indicator = (byte1 & 0x80) != 0;
        let payload_unit_start_indicator = (byte1 & 0x40) != 0;
        let pid = ((byte1 as u16 & 0x1F) << 8) | byte2 as u16;

        let adaptation_field_control = (byte3 >> 4) & 0x03;
        let continuity_counter = byte3 & 0x0F;

        let mut offset = 4;

        // Skip the adaptation field if present.
        if adaptation_field_control == 0x02 || adaptation_field_control == 0x03 {
            let adaptation_field_length = data[offset] as usize;
            offset += 1 + adaptation_field_length;
            if offset > data.len() {
                return Err(ProbeError::unsupported(
                    "adaptation field overruns the packet",
                ));
            }
        }

        let payload = if (adaptation_field_control == 0x01 || adaptation_field_control == 0x03)
            && offset < data.len()
        {
            Some(&data[offset..])
        } else {
            None
        };

        Ok(TsPacket {
            transport_error_indicator,
            payload_unit_start_indicator,
            pid,
            adaptation_field_control,
            continuity_counter,
            payload,
        })
    }

    /// Check if this packet has a payload
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Get the PSI payload (removes the pointer field if PUSI is set).
    #[must_use]
    pub fn psi_payload(&self) -> Option<&'a [u8]> {
        let payload = self.payload?;
        if self.payload_unit_start_indicator {
            let pointer_field = *payload.first()? as usize;
            payload.get(1 + pointer_field..)
        } else {
            Some(payload)
        }
    }
}
