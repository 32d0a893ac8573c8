use media_types::{AudioCodec, ProbeError, VideoCodec};

use crate::Result;

/// Elementary stream types this probe understands.
/// ISO/IEC 13818-1 table 2-34 plus the ATSC registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    /// MPEG-1 Video
    Mpeg1Video,
    /// MPEG-2 Video
    Mpeg2Video,
    /// MPEG-1 Audio
    Mpeg1Audio,
    /// MPEG-2 Audio
    Mpeg2Audio,
    /// Private PES data; the codec has to be sniffed from the payload.
    PrivatePes,
    /// ADTS AAC Audio
    AdtsAac,
    /// MPEG-4 Visual
    Mpeg4Visual,
    /// LATM AAC Audio
    LatmAac,
    /// AVC video stream (ITU-T Rec. H.264 | ISO/IEC 14496-10)
    H264,
    /// HEVC video stream (ITU-T Rec. H.265 | ISO/IEC 23008-2)
    H265,
    /// AC-3 audio stream (ATSC A/52B)
    Ac3,
    /// DTS audio stream
    Dts,
    /// E-AC-3 audio stream (ATSC A/52B)
    EAc3,
    /// Unknown stream type
    Unknown(u8),
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x06 => StreamType::PrivatePes,
            0x0F => StreamType::AdtsAac,
            0x10 => StreamType::Mpeg4Visual,
            0x11 => StreamType::LatmAac,
            0x1B => StreamType::H264,
            0x24 => StreamType::H265,
            0x81 => StreamType::Ac3,
            0x82 => StreamType::Dts,
            0x87 => StreamType::EAc3,
            other => StreamType::Unknown(other),
        }
    }
}

impl StreamType {
    /// Check if this stream type is video
    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            StreamType::Mpeg1Video
                | StreamType::Mpeg2Video
                | StreamType::Mpeg4Visual
                | StreamType::H264
                | StreamType::H265
        )
    }

    /// Check if this stream type is audio
    #[must_use]
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            StreamType::Mpeg1Audio
                | StreamType::Mpeg2Audio
                | StreamType::AdtsAac
                | StreamType::LatmAac
                | StreamType::Ac3
                | StreamType::Dts
                | StreamType::EAc3
        )
    }

    /// The audio codec this stream type maps to, before payload sniffing
    /// refines it.
    #[must_use]
    pub fn audio_codec(&self) -> Option<AudioCodec> {
        let codec = match self {
            // Layer is refined from the frame header later.
            StreamType::Mpeg1Audio | StreamType::Mpeg2Audio => AudioCodec::Mp2,
            StreamType::AdtsAac => AudioCodec::Aac,
            StreamType::LatmAac => AudioCodec::AacLatm,
            StreamType::Ac3 => AudioCodec::Ac3,
            StreamType::Dts => AudioCodec::Dts,
            StreamType::EAc3 => AudioCodec::Eac3,
            _ => return None,
        };
        Some(codec)
    }

    /// The video codec this stream type maps to.
    #[must_use]
    pub fn video_codec(&self) -> Option<VideoCodec> {
        let codec = match self {
            StreamType::Mpeg1Video => VideoCodec::Mpeg1Video,
            StreamType::Mpeg2Video => VideoCodec::Mpeg2Video,
            StreamType::Mpeg4Visual => VideoCodec::Mpeg4,
            StreamType::H264 => VideoCodec::H264,
            StreamType::H265 => VideoCodec::Hevc,
            _ => return None,
        };
        Some(codec)
    }
}

/// Program Map Table - Table ID 0x02
#[derive(Debug, Clone)]
pub struct Pmt {
    /// Program number
    pub program_number: u16,
    /// Version number
    pub version_number: u8,
    /// PCR PID
    pub pcr_pid: u16,
    /// Elementary streams
    pub streams: Vec<PmtStream>,
}

/// Elementary stream in PMT
#[derive(Debug, Clone)]
pub struct PmtStream {
    /// Stream type
    pub stream_type: StreamType,
    /// Elementary PID
    pub elementary_pid: u16,
    /// ES info descriptors
    pub es_info: Vec<u8>,
}

impl Pmt {
    /// Parse PMT from PSI section data
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(ProbeError::InsufficientData {
                needed: 12,
                available: data.len(),
            });
        }

        if data[0] != 0x02 {
            return Err(ProbeError::unsupported(format!(
                "PMT table_id must be 0x02, got 0x{:02x}",
                data[0]
            )));
        }

        let section_length = ((data[1] as usize & 0x0F) << 8) | data[2] as usize;
        if section_length < 9 {
            return Err(ProbeError::unsupported(format!(
                "PMT section length {section_length} too small"
            )));
        }
        if data.len() < 3 + section_length {
            return Err(ProbeError::InsufficientData {
                needed: 3 + section_length,
                available: data.len(),
            });
        }

        let program_number = ((data[3] as u16) << 8) | data[4] as u16;
        let version_number = (data[5] >> 1) & 0x1F;
        let pcr_pid = ((data[8] as u16 & 0x1F) << 8) | data[9] as u16;

        let program_info_length = ((data[10] as usize & 0x0F) << 8) | data[11] as usize;
        let mut offset = 12 + program_info_length;

        let mut streams = Vec::new();
        let streams_end = 3 + section_length - 4; // exclude CRC32

        while offset + 5 <= streams_end {
            let stream_type = StreamType::from(data[offset]);
            let elementary_pid = ((data[offset + 1] as u16 & 0x1F) << 8) | data[offset + 2] as u16;
            let es_info_length =
                ((data[offset + 3] as usize & 0x0F) << 8) | data[offset + 4] as usize;
            offset += 5;

            if offset + es_info_length > streams_end {
                return Err(ProbeError::unsupported(
                    "PMT es_info overruns the section",
                ));
            }
            let es_info = data[offset..offset + es_info_length].to_vec();
            offset += es_info_length;

            streams.push(PmtStream {
                stream_type,
                elementary_pid,
                es_info,
            });
        }

        Ok(Pmt {
            program_number,
            version_number,
            pcr_pid,
            streams,
        })
    }
}
