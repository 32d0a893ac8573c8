use media_types::ProbeError;

use crate::Result;
use crate::ebml::{parse_vint_size, vint_to_signed};

/// Block lacing modes, from bits 1-2 of the block flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lacing {
    /// One frame, no lacing.
    None,
    /// Sizes as chains of 255-limbs.
    Xiph,
    /// Equal-size frames.
    FixedSize,
    /// First size as a vint, then signed vint deltas.
    Ebml,
}

impl Lacing {
    fn from_flags(flags: u8) -> Self {
        match (flags >> 1) & 0x03 {
            0 => Self::None,
            1 => Self::Xiph,
            2 => Self::FixedSize,
            _ => Self::Ebml,
        }
    }
}

/// A parsed SimpleBlock (or BlockGroup Block, which shares the framing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleBlock<'a> {
    /// Track number the block belongs to.
    pub track_number: u64,
    /// Timecode delta relative to the enclosing Cluster, in timecode-scale
    /// ticks.
    pub timecode_delta: i16,
    /// Keyframe flag (bit 7; meaningless for Block elements).
    pub keyframe: bool,
    /// Lacing mode the frames were packed with.
    pub lacing: Lacing,
    /// The frames, in order.
    pub frames: Vec<&'a [u8]>,
}

impl<'a> SimpleBlock<'a> {
    /// Parses the payload of a SimpleBlock element.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let vint = parse_vint_size(data)?
            .ok_or_else(|| ProbeError::unsupported("block too short for track number"))?;
        let (Some(track_number), track_width) = vint else {
            return Err(ProbeError::unsupported("block track number has unknown size"));
        };

        let rest = &data[track_width..];
        if rest.len() < 3 {
            return Err(ProbeError::unsupported("block too short for header"));
        }

        let timecode_delta = i16::from_be_bytes([rest[0], rest[1]]);
        let flags = rest[2];
        let keyframe = flags & 0x80 != 0;
        let lacing = Lacing::from_flags(flags);

        let payload = &rest[3..];
        let frames = split_frames(payload, lacing)?;

        Ok(Self {
            track_number,
            timecode_delta,
            keyframe,
            lacing,
            frames,
        })
    }

    /// Absolute timestamp of this block in seconds.
    #[must_use]
    pub fn timestamp_seconds(&self, cluster_timecode: u64, timecode_scale: u64) -> f64 {
        (cluster_timecode as i64 + self.timecode_delta as i64) as f64 * timecode_scale as f64
            / 1e9
    }
}

fn split_frames(payload: &[u8], lacing: Lacing) -> Result<Vec<&[u8]>> {
    match lacing {
        Lacing::None => Ok(vec![payload]),
        Lacing::Xiph => split_xiph(payload),
        Lacing::FixedSize => split_fixed(payload),
        Lacing::Ebml => split_ebml(payload),
    }
}

fn frame_count(payload: &[u8]) -> Result<(usize, &[u8])> {
    let Some(&first) = payload.first() else {
        return Err(ProbeError::unsupported("laced block without frame count"));
    };
    Ok((first as usize + 1, &payload[1..]))
}

fn slice_frames<'a>(data: &'a [u8], sizes: &[usize]) -> Result<Vec<&'a [u8]>> {
    let known: usize = sizes.iter().sum();
    if known > data.len() {
        return Err(ProbeError::unsupported("laced frame sizes overrun the block"));
    }

    let mut frames = Vec::with_capacity(sizes.len() + 1);
    let mut offset = 0;
    for &size in sizes {
        frames.push(&data[offset..offset + size]);
        offset += size;
    }
    // The last frame fills the remainder.
    frames.push(&data[offset..]);
    Ok(frames)
}

fn split_xiph(payload: &[u8]) -> Result<Vec<&[u8]>> {
    let (count, rest) = frame_count(payload)?;

    let mut sizes = Vec::with_capacity(count - 1);
    let mut pos = 0;
    for _ in 0..count - 1 {
        let mut size = 0usize;
        loop {
            let Some(&limb) = rest.get(pos) else {
                return Err(ProbeError::unsupported("xiph lace sizes truncated"));
            };
            pos += 1;
            size += limb as usize;
            if limb != 255 {
                break;
            }
        }
        sizes.push(size);
    }

    slice_frames(&rest[pos..], &sizes)
}

fn split_fixed(payload: &[u8]) -> Result<Vec<&[u8]>> {
    let (count, rest) = frame_count(payload)?;
    if rest.len() % count != 0 {
        return Err(ProbeError::unsupported(
            "fixed-size lacing does not divide the block evenly",
        ));
    }
    let size = rest.len() / count;
    Ok(rest.chunks(size.max(1)).take(count).collect())
}

fn split_ebml(payload: &[u8]) -> Result<Vec<&[u8]>> {
    let (count, rest) = frame_count(payload)?;

    let mut sizes = Vec::with_capacity(count - 1);
    let mut pos = 0;

    if count > 1 {
        let (first_size, width) = match parse_vint_size(&rest[pos.min(rest.len())..])? {
            Some((Some(value), width)) => (value as usize, width),
            _ => return Err(ProbeError::unsupported("ebml lace first size truncated")),
        };
        pos += width;
        sizes.push(first_size);

        let mut previous = first_size as i64;
        for _ in 1..count - 1 {
            let (value, width) = match parse_vint_size(&rest[pos.min(rest.len())..])? {
                Some((Some(value), width)) => (value, width),
                _ => return Err(ProbeError::unsupported("ebml lace delta truncated")),
            };
            pos += width;
            previous += vint_to_signed(value, width);
            if previous < 0 {
                return Err(ProbeError::unsupported("ebml lace size went negative"));
            }
            sizes.push(previous as usize);
        }
    }

    slice_frames(&rest[pos..], &sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebml::encode_vint;

    fn block_header(track: u8, delta: i16, flags: u8) -> Vec<u8> {
        let mut data = vec![0x80 | track];
        data.extend_from_slice(&delta.to_be_bytes());
        data.push(flags);
        data
    }

    #[test]
    fn test_no_lacing() {
        let mut data = block_header(1, 16, 0x80);
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

        let block = SimpleBlock::parse(&data).unwrap();
        assert_eq!(block.track_number, 1);
        assert_eq!(block.timecode_delta, 16);
        assert!(block.keyframe);
        assert_eq!(block.lacing, Lacing::None);
        assert_eq!(block.frames, vec![&[0xAA, 0xBB, 0xCC][..]]);
    }

    #[test]
    fn test_timestamp() {
        let mut data = block_header(1, -5, 0x00);
        data.push(0xEE);
        let block = SimpleBlock::parse(&data).unwrap();
        // (100 - 5) ticks x 1ms per tick
        let ts = block.timestamp_seconds(100, 1_000_000);
        assert!((ts - 0.095).abs() < 1e-12);
    }

    #[test]
    fn test_xiph_lacing() {
        let frames: [&[u8]; 3] = [&[0x11; 300], &[0x22; 4], &[0x33; 7]];

        let mut data = block_header(2, 0, 0x02);
        data.push(2); // frames - 1
        // 300 = 255 + 45
        data.extend_from_slice(&[255, 45]);
        data.push(4);
        for frame in frames {
            data.extend_from_slice(frame);
        }

        let block = SimpleBlock::parse(&data).unwrap();
        assert_eq!(block.lacing, Lacing::Xiph);
        assert_eq!(block.frames.len(), 3);
        assert_eq!(block.frames[0].len(), 300);
        assert_eq!(block.frames[1], &[0x22; 4][..]);
        assert_eq!(block.frames[2], &[0x33; 7][..]);
    }

    #[test]
    fn test_fixed_lacing() {
        let mut data = block_header(1, 0, 0x04);
        data.push(3); // 4 frames
        data.extend_from_slice(&[0x01; 20]);

        let block = SimpleBlock::parse(&data).unwrap();
        assert_eq!(block.lacing, Lacing::FixedSize);
        assert_eq!(block.frames.len(), 4);
        assert!(block.frames.iter().all(|f| f.len() == 5));
    }

    #[test]
    fn test_fixed_lacing_uneven_rejected() {
        let mut data = block_header(1, 0, 0x04);
        data.push(2); // 3 frames
        data.extend_from_slice(&[0x01; 20]);
        assert!(SimpleBlock::parse(&data).is_err());
    }

    #[test]
    fn test_ebml_lacing() {
        let sizes = [480usize, 500, 490];
        let frames: Vec<Vec<u8>> = sizes.iter().map(|&s| vec![0xAB; s]).collect();
        let tail = vec![0xCD; 123];

        let mut data = block_header(1, 0, 0x06);
        data.push(3); // 4 frames
        data.extend_from_slice(&encode_vint(480));
        // Deltas +20 and -10 as width-2 signed vints (bias 8191).
        data.extend_from_slice(&encode_vint(8191 + 20));
        data.extend_from_slice(&encode_vint(8191 - 10));
        for frame in &frames {
            data.extend_from_slice(frame);
        }
        data.extend_from_slice(&tail);

        let block = SimpleBlock::parse(&data).unwrap();
        assert_eq!(block.lacing, Lacing::Ebml);
        assert_eq!(block.frames.len(), 4);
        assert_eq!(block.frames[0].len(), 480);
        assert_eq!(block.frames[1].len(), 500);
        assert_eq!(block.frames[2].len(), 490);
        assert_eq!(block.frames[3].len(), 123);
    }

    #[test]
    fn test_lacing_bijection_all_modes() {
        // Equal 8-byte frames are expressible in every mode.
        let frame_sizes = [8usize, 8, 8];

        for (flags, lacing) in [
            (0x02u8, Lacing::Xiph),
            (0x04, Lacing::FixedSize),
            (0x06, Lacing::Ebml),
        ] {
            let mut data = block_header(1, 0, flags);
            data.push(frame_sizes.len() as u8 - 1);
            match lacing {
                Lacing::Xiph => {
                    data.push(8);
                    data.push(8);
                }
                Lacing::Ebml => {
                    data.extend_from_slice(&encode_vint(8));
                    data.extend_from_slice(&encode_vint(8191)); // delta 0
                }
                _ => {}
            }
            for _ in &frame_sizes {
                data.extend_from_slice(&[0x5A; 8]);
            }

            let block = SimpleBlock::parse(&data).unwrap();
            assert_eq!(block.lacing, lacing, "flags {flags:#04x}");
            assert_eq!(block.frames.len(), frame_sizes.len());
            assert!(block.frames.iter().all(|f| f.len() == 8));
        }
    }
}
