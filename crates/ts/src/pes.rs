use aac::AdtsHeader;
use mpegaudio::FrameHeader;

use crate::Result;

/// Payload buffer hard cap; exceeding it without producing a frame drops
/// the oldest bytes.
const HANDLER_BUFFER_CAP: usize = 100_000;

/// Bytes retained after a cap overflow, for a coarse resync.
const HANDLER_BUFFER_KEEP: usize = 10_000;

/// A completed PES packet with its elementary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesPacket {
    /// The PES stream id byte.
    pub stream_id: u8,
    /// Elementary stream bytes after the PES header.
    pub payload: Vec<u8>,
}

/// Whether a stream id belongs to a PES packet family this probe reads.
#[must_use]
pub const fn is_known_stream_id(stream_id: u8) -> bool {
    // Video, audio, private stream 1.
    matches!(stream_id, 0xE0..=0xEF | 0xC0..=0xDF | 0xBD)
}

/// Reassembles PES packets from the transport payload of one PID.
///
/// A packet with PUSI set starts a new PES packet; continuation packets
/// append. Bounded packets complete as soon as their length is satisfied;
/// unbounded video packets (length 0) complete at the next PUSI or at end
/// of input.
#[derive(Debug, Default)]
pub struct PesAssembler {
    buffer: Vec<u8>,
    started: bool,
}

impl PesAssembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the payload of one transport packet. Returns any PES packets
    /// that completed.
    pub fn push(&mut self, payload: &[u8], payload_unit_start: bool) -> Vec<PesPacket> {
        let mut completed = Vec::new();

        if payload_unit_start {
            // The previous packet was unbounded; the new start delimits it.
            if self.started {
                if let Some(packet) = finalize_pes(&self.buffer) {
                    completed.push(packet);
                }
            }
            self.buffer.clear();
            self.started = true;
        }

        if !self.started {
            return completed;
        }

        self.buffer.extend_from_slice(payload);

        if let Some(length) = bounded_length(&self.buffer) {
            if self.buffer.len() >= length {
                if let Some(packet) = finalize_pes(&self.buffer[..length]) {
                    completed.push(packet);
                }
                // Anything after the bounded packet up to the next PUSI is
                // stuffing.
                self.buffer.clear();
                self.started = false;
            }
        }

        completed
    }

    /// Flushes a pending unbounded packet at end of input.
    pub fn finish(&mut self) -> Option<PesPacket> {
        if !self.started {
            return None;
        }
        self.started = false;
        let packet = finalize_pes(&self.buffer);
        self.buffer.clear();
        packet
    }
}

/// Total byte length of a bounded PES packet, when the header and length
/// field are available and nonzero.
fn bounded_length(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < 6 || buffer[..3] != [0x00, 0x00, 0x01] {
        return None;
    }
    let length = ((buffer[4] as usize) << 8) | buffer[5] as usize;
    if length == 0 {
        // Unbounded, allowed for video elementary streams.
        None
    } else {
        Some(6 + length)
    }
}

/// Strips the PES header, yielding the elementary payload.
fn finalize_pes(buffer: &[u8]) -> Option<PesPacket> {
    if buffer.len() < 9 || buffer[..3] != [0x00, 0x00, 0x01] {
        return None;
    }

    let stream_id = buffer[3];
    if !is_known_stream_id(stream_id) {
        return None;
    }

    let header_data_length = buffer[8] as usize;
    let payload_start = 9 + header_data_length;
    if payload_start > buffer.len() {
        return None;
    }

    Some(PesPacket {
        stream_id,
        payload: buffer[payload_start..].to_vec(),
    })
}

/// Codecs the payload handler can locate frame boundaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSync {
    /// ADTS AAC frames.
    Adts,
    /// MPEG audio (MP1/MP2/MP3) frames.
    MpegAudio,
}

/// Reassembles whole audio access units from PES payloads.
///
/// A rolling buffer is scanned for the codec's frame sync; every complete
/// frame is handed to the sink in input order.
#[derive(Debug)]
pub struct PesPayloadHandler {
    codec: FrameSync,
    buffer: Vec<u8>,
}

impl PesPayloadHandler {
    /// Creates a handler for `codec`.
    #[must_use]
    pub fn new(codec: FrameSync) -> Self {
        Self {
            codec,
            buffer: Vec::new(),
        }
    }

    /// Appends a PES payload and drives `sink` with every frame that
    /// completed.
    pub fn push<F>(&mut self, payload: &[u8], sink: &mut F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        self.buffer.extend_from_slice(payload);

        let mut pos = 0;
        loop {
            match self.next_frame(pos) {
                FrameScan::Complete { start, length } => {
                    sink(&self.buffer[start..start + length])?;
                    pos = start + length;
                }
                FrameScan::NeedMore { start } => {
                    pos = start;
                    break;
                }
            }
        }

        self.buffer.drain(..pos);

        if self.buffer.len() > HANDLER_BUFFER_CAP {
            // No frame for a long while; keep a tail and resync later.
            let drop = self.buffer.len() - HANDLER_BUFFER_KEEP;
            self.buffer.drain(..drop);
        }

        Ok(())
    }

    fn next_frame(&self, mut pos: usize) -> FrameScan {
        let min_header = match self.codec {
            FrameSync::Adts => 7,
            FrameSync::MpegAudio => 4,
        };

        while pos < self.buffer.len() {
            let window = &self.buffer[pos..];
            if !self.maybe_sync(window) {
                pos += 1;
                continue;
            }
            if window.len() < min_header {
                // Possible sync at the tail; decide once more bytes arrive.
                return FrameScan::NeedMore { start: pos };
            }
            match self.frame_length(window) {
                Some(Some(length)) => {
                    if window.len() >= length {
                        return FrameScan::Complete { start: pos, length };
                    }
                    // Sync found, frame incomplete: wait for more bytes.
                    return FrameScan::NeedMore { start: pos };
                }
                // A header without a derivable length, or a false sync.
                _ => pos += 1,
            }
        }
        FrameScan::NeedMore { start: pos }
    }

    /// Cheap first-bytes check so a truncated header at the buffer tail is
    /// kept instead of being scanned past.
    fn maybe_sync(&self, window: &[u8]) -> bool {
        if window[0] != 0xFF {
            return false;
        }
        match self.codec {
            // 12-bit sync plus zero layer bits.
            FrameSync::Adts => window.get(1).is_none_or(|b| (b & 0xF6) == 0xF0),
            // 11-bit sync.
            FrameSync::MpegAudio => window.get(1).is_none_or(|b| (b & 0xE0) == 0xE0),
        }
    }

    /// `None`: no sync at this offset. `Some(None)`: a header without a
    /// derivable length (free-format MPEG audio). `Some(Some(n))`: a frame
    /// of n bytes.
    fn frame_length(&self, window: &[u8]) -> Option<Option<usize>> {
        match self.codec {
            FrameSync::Adts => AdtsHeader::parse(window)
                .ok()
                .map(|header| Some(header.frame_length as usize)),
            FrameSync::MpegAudio => FrameHeader::parse(window)
                .ok()
                .map(|header| header.frame_length()),
        }
    }
}

enum FrameScan {
    Complete { start: usize, length: usize },
    NeedMore { start: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_pes(stream_id: u8, payload: &[u8], bounded: bool) -> Vec<u8> {
        let mut pes = vec![0x00, 0x00, 0x01, stream_id];
        let length = if bounded { 3 + payload.len() } else { 0 };
        pes.extend_from_slice(&(length as u16).to_be_bytes());
        pes.extend_from_slice(&[0x80, 0x00, 0x00]); // flags, no header data
        pes.extend_from_slice(payload);
        pes
    }

    #[test]
    fn test_bounded_audio_pes() {
        let mut assembler = PesAssembler::new();
        let pes = wrap_pes(0xC0, b"audio-frame-bytes", true);

        // Split across two transport payloads.
        let (first, second) = pes.split_at(10);
        assert!(assembler.push(first, true).is_empty());
        let completed = assembler.push(second, false);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].stream_id, 0xC0);
        assert_eq!(completed[0].payload, b"audio-frame-bytes");
    }

    #[test]
    fn test_unbounded_video_ends_at_next_start() {
        let mut assembler = PesAssembler::new();
        let video = wrap_pes(0xE0, &[0x11; 32], false);
        assert!(assembler.push(&video, true).is_empty());

        // The next PUSI closes the pending packet.
        let next = wrap_pes(0xE0, &[0x22; 8], false);
        let completed = assembler.push(&next, true);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].payload, vec![0x11; 32]);

        let flushed = assembler.finish().unwrap();
        assert_eq!(flushed.payload, vec![0x22; 8]);
    }

    #[test]
    fn test_unknown_stream_id_dropped() {
        let mut assembler = PesAssembler::new();
        let pes = wrap_pes(0xBE, &[0u8; 4], true); // padding stream
        assert!(assembler.push(&pes, true).is_empty());
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn test_continuation_without_start_ignored() {
        let mut assembler = PesAssembler::new();
        assert!(assembler.push(&[1, 2, 3], false).is_empty());
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn test_payload_handler_extracts_adts_frames() {
        let frame_a =
            aac::build_adts_frame(&[0xAA; 20], 48000, 2, aac::AudioObjectType::AacLowComplexity)
                .unwrap();
        let frame_b =
            aac::build_adts_frame(&[0xBB; 9], 48000, 2, aac::AudioObjectType::AacLowComplexity)
                .unwrap();

        let mut stream = vec![0x00, 0x01]; // leading garbage before sync
        stream.extend_from_slice(&frame_a);
        stream.extend_from_slice(&frame_b);

        let mut frames = Vec::new();
        let mut handler = PesPayloadHandler::new(FrameSync::Adts);
        // Feed in awkward small pieces.
        for piece in stream.chunks(7) {
            handler
                .push(piece, &mut |frame: &[u8]| {
                    frames.push(frame.to_vec());
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frame_a);
        assert_eq!(frames[1], frame_b);
    }

    #[test]
    fn test_payload_handler_mpeg_audio() {
        // 128 kbps 44.1 kHz layer III: 417-byte frames.
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x64];
        frame.resize(417, 0x55);

        let mut stream = frame.clone();
        stream.extend_from_slice(&frame);

        let mut count = 0;
        let mut handler = PesPayloadHandler::new(FrameSync::MpegAudio);
        handler
            .push(&stream, &mut |emitted: &[u8]| {
                assert_eq!(emitted.len(), 417);
                count += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 2);
    }
}
