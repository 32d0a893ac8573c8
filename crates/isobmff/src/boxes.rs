use bytes_util::SliceReader;
use media_types::ProbeError;

use crate::Result;

/// A parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// The four-character box type.
    pub box_type: [u8; 4],
    /// Content size in bytes; `None` when the box runs to end of file
    /// (size 0).
    pub content_size: Option<u64>,
    /// Bytes the header occupies (8, or 16 with a largesize).
    pub header_len: usize,
}

impl BoxHeader {
    /// Parses a box header from the start of `data`.
    ///
    /// Returns `None` when more bytes are needed.
    pub fn parse(data: &[u8]) -> Result<Option<Self>> {
        if data.len() < 8 {
            return Ok(None);
        }

        let mut reader = SliceReader::new(data);
        let size32 = reader.read_u32_be().map_err(ProbeError::from)?;
        let mut box_type = [0u8; 4];
        box_type.copy_from_slice(reader.read_slice(4).map_err(ProbeError::from)?);

        match size32 {
            0 => Ok(Some(Self {
                box_type,
                content_size: None,
                header_len: 8,
            })),
            1 => {
                if data.len() < 16 {
                    return Ok(None);
                }
                let size64 = reader.read_u64_be().map_err(ProbeError::from)?;
                if size64 < 16 {
                    return Err(ProbeError::unsupported("box largesize smaller than header"));
                }
                Ok(Some(Self {
                    box_type,
                    content_size: Some(size64 - 16),
                    header_len: 16,
                }))
            }
            2..=7 => Err(ProbeError::unsupported(format!(
                "box size {size32} smaller than its header"
            ))),
            _ => Ok(Some(Self {
                box_type,
                content_size: Some(size32 as u64 - 8),
                header_len: 8,
            })),
        }
    }

    /// The box type as ASCII.
    #[must_use]
    pub fn type_str(&self) -> String {
        String::from_utf8_lossy(&self.box_type).into_owned()
    }
}

/// Iterates the child boxes of a fully-buffered container body, yielding
/// `(type, content)` pairs.
pub fn walk_children<'a>(body: &'a [u8]) -> impl Iterator<Item = ([u8; 4], &'a [u8])> {
    let mut offset = 0usize;
    std::iter::from_fn(move || {
        let rest = &body[offset.min(body.len())..];
        let header = BoxHeader::parse(rest).ok().flatten()?;
        let content_size = header.content_size.unwrap_or((rest.len() - header.header_len) as u64);
        let end = header.header_len.checked_add(content_size as usize)?;
        if end > rest.len() {
            return None;
        }
        let content = &rest[header.header_len..end];
        offset += end;
        Some((header.box_type, content))
    })
}

/// Finds the first child of a given type.
#[must_use]
pub fn find_child<'a>(body: &'a [u8], box_type: &[u8; 4]) -> Option<&'a [u8]> {
    walk_children(body).find(|(t, _)| t == box_type).map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn make_box(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = ((content.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(box_type);
        out.extend_from_slice(content);
        out
    }

    #[test]
    fn test_parse_header() {
        let data = make_box(b"ftyp", b"isom");
        let header = BoxHeader::parse(&data).unwrap().unwrap();
        assert_eq!(&header.box_type, b"ftyp");
        assert_eq!(header.content_size, Some(4));
        assert_eq!(header.header_len, 8);
        assert_eq!(header.type_str(), "ftyp");
    }

    #[test]
    fn test_largesize() {
        let mut data = 1u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&100u64.to_be_bytes());
        let header = BoxHeader::parse(&data).unwrap().unwrap();
        assert_eq!(header.content_size, Some(84));
        assert_eq!(header.header_len, 16);
    }

    #[test]
    fn test_to_end_box() {
        let mut data = 0u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"mdat");
        let header = BoxHeader::parse(&data).unwrap().unwrap();
        assert_eq!(header.content_size, None);
    }

    #[test]
    fn test_walk_children() {
        let mut body = make_box(b"mvhd", &[0x01; 10]);
        body.extend_from_slice(&make_box(b"trak", &[0x02; 4]));

        let children: Vec<_> = walk_children(&body).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(&children[0].0, b"mvhd");
        assert_eq!(children[0].1.len(), 10);
        assert_eq!(&children[1].0, b"trak");

        assert!(find_child(&body, b"trak").is_some());
        assert!(find_child(&body, b"mdia").is_none());
    }

    #[test]
    fn test_undersized_rejected() {
        let mut data = 4u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"free");
        assert!(BoxHeader::parse(&data).is_err());
    }
}
