use bytes_util::SliceReader;

use crate::FrameHeader;

/// How far past the frame header the Xing/Info/LAME tag is searched for.
const TAG_SCAN_WINDOW: usize = 256;

/// Fixed offset of the VBRI block past the 4-byte frame header (the tag
/// sits at frame offset 36).
const VBRI_OFFSET: usize = 32;

/// Totals recovered from a Xing/Info/LAME or VBRI side-band block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct VbrInfo {
    /// Total number of audio frames in the file.
    pub total_frames: Option<u32>,
    /// Total file size in bytes.
    pub file_size: Option<u32>,
}

impl VbrInfo {
    /// Scans a frame (header byte first) for a VBR side-band block.
    ///
    /// The Xing-family tags are searched within the first 256 bytes after
    /// the 4-byte header; the VBRI block lives 32 bytes past it.
    #[must_use]
    pub fn scan(frame: &[u8]) -> Option<Self> {
        if frame.len() < 4 {
            return None;
        }
        let body = &frame[4..];

        if let Some(info) = scan_xing(body) {
            return Some(info);
        }
        scan_vbri(body)
    }

    /// Duration in seconds derived from the frame totals.
    #[must_use]
    pub fn duration_seconds(&self, header: &FrameHeader) -> Option<f64> {
        let frames = self.total_frames? as f64;
        Some(frames * header.samples_per_frame() as f64 / header.sample_rate as f64)
    }

    /// Average bitrate in bits per second, when both totals are known.
    #[must_use]
    pub fn average_bitrate(&self, header: &FrameHeader) -> Option<u64> {
        let duration = self.duration_seconds(header)?;
        if duration <= 0.0 {
            return None;
        }
        Some((self.file_size? as f64 * 8.0 / duration) as u64)
    }
}

fn scan_xing(body: &[u8]) -> Option<VbrInfo> {
    let window = &body[..body.len().min(TAG_SCAN_WINDOW)];

    let pos = window
        .windows(4)
        .position(|w| w == b"Xing" || w == b"Info" || w == b"LAME")?;

    let mut reader = SliceReader::new(body);
    reader.seek(pos + 4).ok()?;
    let flags = reader.read_u32_be().ok()?;

    let total_frames = if flags & 0x01 != 0 {
        Some(reader.read_u32_be().ok()?)
    } else {
        None
    };
    let file_size = if flags & 0x02 != 0 {
        Some(reader.read_u32_be().ok()?)
    } else {
        None
    };
    // TOC and quality follow; nothing in them refines the totals.

    Some(VbrInfo {
        total_frames,
        file_size,
    })
}

fn scan_vbri(body: &[u8]) -> Option<VbrInfo> {
    if body.len() < VBRI_OFFSET + 18 || &body[VBRI_OFFSET..VBRI_OFFSET + 4] != b"VBRI" {
        return None;
    }

    let mut reader = SliceReader::new(&body[VBRI_OFFSET..]);
    reader.seek(10).ok()?;
    let file_size = reader.read_u32_be().ok()?;
    let total_frames = reader.read_u32_be().ok()?;

    Some(VbrInfo {
        total_frames: Some(total_frames),
        file_size: Some(file_size),
    })
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

    fn frame_with_xing(offset: usize, flags: u32, frames: u32, bytes: u32) -> Vec<u8> {
        let mut frame = HEADER.to_vec();
        frame.resize(4 + offset, 0);
        frame.extend_from_slice(b"Xing");
        frame.extend_from_slice(&flags.to_be_bytes());
        if flags & 1 != 0 {
            frame.extend_from_slice(&frames.to_be_bytes());
        }
        if flags & 2 != 0 {
            frame.extend_from_slice(&bytes.to_be_bytes());
        }
        frame
    }

    #[test]
    fn test_xing_frames_and_size() {
        // The Xing block sits past the side info, as in a real layer III
        // frame (32 bytes for MPEG-1 stereo).
        let frame = frame_with_xing(32, 0x03, 230, 960_000);
        let info = VbrInfo::scan(&frame).unwrap();
        assert_eq!(info.total_frames, Some(230));
        assert_eq!(info.file_size, Some(960_000));
    }

    #[test]
    fn test_xing_frames_only() {
        let frame = frame_with_xing(32, 0x01, 1000, 0);
        let info = VbrInfo::scan(&frame).unwrap();
        assert_eq!(info.total_frames, Some(1000));
        assert_eq!(info.file_size, None);
    }

    #[test]
    fn test_duration_agreement() {
        let header = FrameHeader::parse(&HEADER).unwrap();
        let frame = frame_with_xing(32, 0x03, 230, 960_000);
        let info = VbrInfo::scan(&frame).unwrap();

        // 230 frames x 1152 samples / 44100 Hz
        let expected = 230.0 * 1152.0 / 44100.0;
        let duration = info.duration_seconds(&header).unwrap();
        assert!((duration - expected).abs() < 1e-9);

        let bitrate = info.average_bitrate(&header).unwrap();
        assert_eq!(bitrate, (960_000.0 * 8.0 / expected) as u64);
    }

    #[test]
    fn test_vbri() {
        let mut frame = HEADER.to_vec();
        // The tag sits at frame offset 36: 4-byte header + 32 bytes.
        frame.resize(36, 0);
        frame.extend_from_slice(b"VBRI");
        frame.extend_from_slice(&[0, 1]); // version
        frame.extend_from_slice(&[0, 0]); // delay
        frame.extend_from_slice(&[0, 50]); // quality
        frame.extend_from_slice(&500_000u32.to_be_bytes()); // bytes
        frame.extend_from_slice(&123u32.to_be_bytes()); // frames

        let info = VbrInfo::scan(&frame).unwrap();
        assert_eq!(info.total_frames, Some(123));
        assert_eq!(info.file_size, Some(500_000));
    }

    #[test]
    fn test_no_sideband() {
        let mut frame = HEADER.to_vec();
        frame.resize(400, 0);
        assert_eq!(VbrInfo::scan(&frame), None);
    }
}
