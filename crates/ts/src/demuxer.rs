use std::collections::HashMap;

use bytes_util::{ChunkBuffer, ChunkSource};
use media_types::{
    AudioExtra, AudioStream, ContainerFormat, MediaInfo, ProbeError, VideoStream,
};
use memchr::memchr;
use tracing::{debug, trace};

use crate::descriptor::EsDescriptors;
use crate::packet::{PID_PAT, PID_SDT, PacketSize, TsPacket, detect_packet_size};
use crate::pat::Pat;
use crate::pes::{FrameSync, PesAssembler, PesPayloadHandler};
use crate::pmt::{Pmt, StreamType};
use crate::sdt::Sdt;
use crate::sniff::{
    AudioSniff, VideoSniff, sniff_aac, sniff_h264, sniff_mpeg2_video, sniff_mpeg_audio,
    sniff_private,
};
use crate::Result;

/// Metadata is considered complete only after this many packets, so that
/// PMT repeats have had a chance to arrive.
const MIN_PACKETS_FOR_COMPLETION: u64 = 200;

/// Scan cap when no sample extraction was requested.
const METADATA_SCAN_CAP: u64 = 2 * 1024 * 1024;

/// Payload sniffing gives up on a stream after this many PES packets.
const MAX_SNIFF_ATTEMPTS: u8 = 8;

/// Number of packets the buffer is asked to hold before parsing resumes
/// after a refill.
const REFILL_PACKETS: usize = 10;

/// Sample-extraction request: which PIDs to extract and where the frames
/// go. An empty PID list selects every audio stream.
pub struct TsExtract<'a> {
    /// Elementary PIDs of interest; empty selects all audio PIDs.
    pub pids: Vec<u16>,
    /// Receives `(pid, frame)` for every reassembled access unit, in
    /// stream order.
    pub on_frames: Box<dyn FnMut(u16, &[u8]) -> Result<()> + 'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Audio,
    Video,
    Private,
    Other,
}

struct StreamDetails {
    program_number: u16,
    pid: u16,
    stream_type: StreamType,
    category: Category,
    descriptors: EsDescriptors,
    audio: Option<AudioSniff>,
    video: Option<VideoSniff>,
    parsed: bool,
    sniff_attempts: u8,
    assembler: PesAssembler,
    handler: Option<PesPayloadHandler>,
}

impl StreamDetails {
    fn new(program_number: u16, pid: u16, stream_type: StreamType, es_info: &[u8]) -> Self {
        let category = if stream_type.is_audio() {
            Category::Audio
        } else if stream_type.is_video() {
            Category::Video
        } else if stream_type == StreamType::PrivatePes {
            Category::Private
        } else {
            Category::Other
        };

        Self {
            program_number,
            pid,
            stream_type,
            category,
            descriptors: EsDescriptors::parse(es_info),
            audio: None,
            video: None,
            // Streams we cannot describe any further start out parsed.
            parsed: category == Category::Other,
            sniff_attempts: 0,
            assembler: PesAssembler::new(),
            handler: None,
        }
    }
}

/// Progressive MPEG-TS / M2TS demuxer.
pub struct TsDemuxer<'a> {
    extract: Option<TsExtract<'a>>,
    pat: Option<Pat>,
    pmts: HashMap<u16, Pmt>,
    pmt_section_counts: HashMap<u16, u32>,
    streams: HashMap<u16, StreamDetails>,
    service_name: Option<String>,
    packets_processed: u64,
}

impl Default for TsDemuxer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses metadata from a transport stream without sample extraction.
pub fn parse_ts<S: ChunkSource>(source: S) -> Result<MediaInfo> {
    TsDemuxer::new().parse(source)
}

impl<'a> TsDemuxer<'a> {
    /// Creates a metadata-only demuxer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extract: None,
            pat: None,
            pmts: HashMap::new(),
            pmt_section_counts: HashMap::new(),
            streams: HashMap::new(),
            service_name: None,
            packets_processed: 0,
        }
    }

    /// Creates a demuxer that additionally streams reassembled audio
    /// frames to the given sink.
    #[must_use]
    pub fn with_extract(extract: TsExtract<'a>) -> Self {
        Self {
            extract: Some(extract),
            ..Self::new()
        }
    }

    /// Consumes the source and returns the stream description.
    ///
    /// Without extraction the parse stops as soon as the metadata is
    /// complete or the scan cap is reached; with extraction it runs to end
    /// of input.
    pub fn parse<S: ChunkSource>(mut self, source: S) -> Result<MediaInfo> {
        let mut buf = ChunkBuffer::new(source);

        // Packet-size detection needs the 1000-byte scan window plus room
        // for the verification slots.
        buf.ensure(2048)?;
        let (size, start) = detect_packet_size(buf.data())?;
        buf.consume(start);
        debug!(?size, start, "detected TS packet layout");

        let total_len = size.total_len();
        let sync_offset = size.sync_offset();

        loop {
            if buf.available() < total_len * REFILL_PACKETS && !buf.is_eof() {
                buf.ensure(total_len * REFILL_PACKETS)?;
            }
            if buf.available() < total_len {
                break;
            }

            // Realign if the expected sync byte is missing.
            if buf.data()[sync_offset] != 0x47 {
                let skip = memchr(0x47, &buf.data()[sync_offset..])
                    .unwrap_or(buf.available() - sync_offset)
                    .max(1);
                trace!(skip, "lost TS sync, realigning");
                buf.consume(skip);
                continue;
            }

            let mut consumed_early = false;
            {
                let window = buf.data();
                let packet_bytes = &window[sync_offset..sync_offset + 188];
                match TsPacket::parse(packet_bytes) {
                    Ok(packet) => {
                        self.process_packet(&packet)?;
                    }
                    Err(_) => {
                        consumed_early = true;
                    }
                }
            }

            if consumed_early {
                // Sync byte without a valid packet behind it; advance one
                // byte and rescan.
                buf.consume(1);
                continue;
            }

            buf.consume(total_len);
            self.packets_processed += 1;

            if self.extract.is_none() {
                if self.metadata_complete() {
                    debug!(
                        packets = self.packets_processed,
                        "TS metadata complete"
                    );
                    break;
                }
                if buf.total_consumed() > METADATA_SCAN_CAP {
                    debug!("TS metadata scan cap reached");
                    break;
                }
            }
        }

        self.flush_pending()?;
        self.build_media_info(size)
    }

    fn process_packet(&mut self, packet: &TsPacket<'_>) -> Result<()> {
        if packet.transport_error_indicator {
            return Ok(());
        }

        match packet.pid {
            PID_PAT if packet.payload_unit_start_indicator => {
                if let Some(psi) = packet.psi_payload() {
                    let pat = Pat::parse(psi)?;
                    trace!(programs = pat.programs.len(), "PAT");
                    self.pat = Some(pat);
                }
            }
            PID_SDT if packet.payload_unit_start_indicator => {
                // The SDT shares its PID with other service tables; ignore
                // anything that does not parse.
                if self.service_name.is_none() {
                    if let Some(psi) = packet.psi_payload() {
                        if let Ok(sdt) = Sdt::parse(psi) {
                            self.service_name = sdt.service_names.into_iter().next();
                        }
                    }
                }
            }
            pid if self.is_pmt_pid(pid) && packet.payload_unit_start_indicator => {
                if let Some(psi) = packet.psi_payload() {
                    let pmt = Pmt::parse(psi)?;
                    self.register_pmt(pmt);
                }
            }
            pid => {
                if let Some(payload) = packet.payload {
                    self.process_es_payload(pid, payload, packet.payload_unit_start_indicator)?;
                }
            }
        }

        Ok(())
    }

    fn is_pmt_pid(&self, pid: u16) -> bool {
        self.pat
            .as_ref()
            .is_some_and(|pat| pat.programs.iter().any(|p| p.pmt_pid == pid))
    }

    fn register_pmt(&mut self, pmt: Pmt) {
        *self
            .pmt_section_counts
            .entry(pmt.program_number)
            .or_insert(0) += 1;

        for stream in &pmt.streams {
            if !self.streams.contains_key(&stream.elementary_pid) {
                debug!(
                    pid = stream.elementary_pid,
                    stream_type = ?stream.stream_type,
                    "discovered elementary stream"
                );
                self.streams.insert(
                    stream.elementary_pid,
                    StreamDetails::new(
                        pmt.program_number,
                        stream.elementary_pid,
                        stream.stream_type,
                        &stream.es_info,
                    ),
                );
            }
        }

        self.pmts.insert(pmt.program_number, pmt);
    }

    fn process_es_payload(&mut self, pid: u16, payload: &[u8], pusi: bool) -> Result<()> {
        let Some(details) = self.streams.get_mut(&pid) else {
            return Ok(());
        };

        let completed = details.assembler.push(payload, pusi);
        for pes in completed {
            Self::handle_pes(details, &mut self.extract, &pes.payload)?;
        }
        Ok(())
    }

    fn handle_pes(
        details: &mut StreamDetails,
        extract: &mut Option<TsExtract<'_>>,
        payload: &[u8],
    ) -> Result<()> {
        if !details.parsed {
            Self::sniff_stream(details, payload);
        }

        if let Some(extract) = extract {
            let wanted = match details.category {
                Category::Audio => {
                    extract.pids.is_empty() || extract.pids.contains(&details.pid)
                }
                _ => extract.pids.contains(&details.pid),
            };
            if wanted {
                Self::deliver_frames(details, extract, payload)?;
            }
        }

        Ok(())
    }

    fn sniff_stream(details: &mut StreamDetails, payload: &[u8]) {
        let found = match details.stream_type {
            StreamType::AdtsAac | StreamType::LatmAac => {
                if let Some(sniff) = sniff_aac(payload) {
                    details.audio = Some(sniff);
                    true
                } else {
                    false
                }
            }
            StreamType::Mpeg1Audio | StreamType::Mpeg2Audio => {
                if let Some(sniff) = sniff_mpeg_audio(payload) {
                    details.audio = Some(sniff);
                    true
                } else {
                    false
                }
            }
            StreamType::Ac3 | StreamType::Dts | StreamType::EAc3 => {
                // The descriptors already carry what we surface.
                true
            }
            StreamType::H264 => {
                if let Some(sniff) = sniff_h264(payload) {
                    details.video = Some(sniff);
                    true
                } else {
                    false
                }
            }
            StreamType::Mpeg1Video | StreamType::Mpeg2Video => {
                if let Some(mut sniff) = sniff_mpeg2_video(payload) {
                    if details.stream_type == StreamType::Mpeg1Video {
                        sniff.codec = media_types::VideoCodec::Mpeg1Video;
                    }
                    details.video = Some(sniff);
                    true
                } else {
                    false
                }
            }
            StreamType::PrivatePes => {
                if let Some(sniff) = sniff_private(payload) {
                    debug!(pid = details.pid, codec = ?sniff.codec, "sniffed private stream");
                    details.category = Category::Audio;
                    details.audio = Some(sniff);
                    true
                } else {
                    false
                }
            }
            _ => true,
        };

        if found {
            details.parsed = true;
        } else {
            details.sniff_attempts += 1;
            if details.sniff_attempts >= MAX_SNIFF_ATTEMPTS {
                trace!(pid = details.pid, "giving up on payload sniffing");
                details.parsed = true;
            }
        }
    }

    fn deliver_frames(
        details: &mut StreamDetails,
        extract: &mut TsExtract<'_>,
        payload: &[u8],
    ) -> Result<()> {
        let frame_sync = details
            .audio
            .as_ref()
            .map(|sniff| sniff.codec)
            .or_else(|| details.stream_type.audio_codec())
            .and_then(|codec| match codec {
                media_types::AudioCodec::Aac => Some(FrameSync::Adts),
                media_types::AudioCodec::Mp1
                | media_types::AudioCodec::Mp2
                | media_types::AudioCodec::Mp3 => Some(FrameSync::MpegAudio),
                _ => None,
            });

        match frame_sync {
            Some(sync) => {
                let handler = details
                    .handler
                    .get_or_insert_with(|| PesPayloadHandler::new(sync));
                let pid = details.pid;
                let sink = &mut extract.on_frames;
                handler.push(payload, &mut |frame| sink(pid, frame))
            }
            // No frame syntax to search for; hand the PES payload through.
            None => (extract.on_frames)(details.pid, payload),
        }
    }

    fn metadata_complete(&self) -> bool {
        let Some(pat) = &self.pat else {
            return false;
        };
        if pat.programs.is_empty() {
            return false;
        }

        let all_pmts_seen = pat
            .programs
            .iter()
            .all(|p| self.pmts.contains_key(&p.program_number));
        if !all_pmts_seen || self.streams.is_empty() {
            return false;
        }

        let all_parsed = self
            .streams
            .values()
            .filter(|d| matches!(d.category, Category::Audio | Category::Video))
            .all(|d| d.parsed);
        if !all_parsed {
            return false;
        }

        if self.packets_processed >= MIN_PACKETS_FOR_COMPLETION {
            return true;
        }

        // Early exit: every PMT repeated at least twice.
        pat.programs.iter().all(|p| {
            self.pmt_section_counts
                .get(&p.program_number)
                .is_some_and(|&count| count >= 2)
        })
    }

    fn flush_pending(&mut self) -> Result<()> {
        let pids: Vec<u16> = self.streams.keys().copied().collect();
        for pid in pids {
            let Some(details) = self.streams.get_mut(&pid) else {
                continue;
            };
            if let Some(pes) = details.assembler.finish() {
                Self::handle_pes(details, &mut self.extract, &pes.payload)?;
            }
        }
        Ok(())
    }

    fn build_media_info(mut self, size: PacketSize) -> Result<MediaInfo> {
        if self.pat.is_none() {
            return Err(ProbeError::unsupported("no PAT found in transport stream"));
        }

        let mut info = MediaInfo::new(ContainerFormat::MpegTs);
        info.container_detail = self
            .service_name
            .take()
            .or_else(|| matches!(size, PacketSize::M2ts).then(|| "m2ts".to_owned()));

        let mut pids: Vec<u16> = self.streams.keys().copied().collect();
        pids.sort_unstable();

        for pid in pids {
            let Some(details) = self.streams.remove(&pid) else {
                continue;
            };
            trace!(
                pid,
                program = details.program_number,
                category = ?details.category,
                "surfacing stream"
            );
            match details.category {
                Category::Audio => info.add_audio(Self::audio_stream(details)),
                Category::Video => info.add_video(Self::video_stream(details)),
                _ => {}
            }
        }

        if info.stream_count() == 0 {
            return Err(ProbeError::unsupported(
                "no recognizable streams in transport stream",
            ));
        }

        Ok(info)
    }

    fn audio_stream(details: StreamDetails) -> AudioStream {
        let codec = details
            .audio
            .as_ref()
            .map(|sniff| sniff.codec)
            .or_else(|| details.stream_type.audio_codec())
            .unwrap_or(media_types::AudioCodec::Unknown);

        let mut stream = AudioStream::new(details.pid as u32, codec);
        stream.language = details.descriptors.language.clone();
        stream.audio_type = details.descriptors.audio_type.clone();

        if let Some(sniff) = details.audio {
            stream.codec_detail = sniff.detail;
            stream.sample_rate = sniff.sample_rate;
            stream.channel_count = sniff.channel_count;
            stream.profile = sniff.profile;
            stream.bitrate = sniff.bitrate;
            if let (Some(layer), Some(padding)) = (sniff.layer, sniff.padding) {
                stream.extra = Some(AudioExtra::MpegAudio { layer, padding });
            }
        }

        if let Some(ac3) = details.descriptors.ac3 {
            stream.extra = Some(AudioExtra::Ac3 {
                component_type: ac3.component_type,
                bsmod: ac3.bsmod,
                main_id: ac3.main_id,
                asvc: ac3.asvc,
            });
        }
        if let Some(dts) = details.descriptors.dts {
            stream.surround_mode = Some(dts.surround_mode_name());
        }

        stream
    }

    fn video_stream(details: StreamDetails) -> VideoStream {
        let codec = details
            .video
            .as_ref()
            .map(|sniff| sniff.codec)
            .or_else(|| details.stream_type.video_codec())
            .unwrap_or(media_types::VideoCodec::Unknown);

        let mut stream = VideoStream::new(details.pid as u32, codec);

        if let Some(sniff) = details.video {
            stream.codec_detail = sniff.detail;
            stream.width = sniff.width;
            stream.height = sniff.height;
            stream.fps = sniff.fps;
            stream.profile = sniff.profile;
            stream.level = sniff.level;
        }

        // Descriptor profile/level fill in when the payload never yielded
        // a parameter set.
        if stream.profile.is_none() {
            if let Some((profile, level)) = details.descriptors.avc.or(details.descriptors.hevc)
            {
                stream.profile = Some(profile.to_string());
                stream.level = Some(level.to_string());
            }
        }

        stream
    }
}

#[cfg(test)]
mod tests {
    use bytes_util::SliceSource;
    use media_types::AudioCodec;

    use super::*;

    const PMT_PID: u16 = 0x20;
    const AUDIO_PID: u16 = 0x101;
    const VIDEO_PID: u16 = 0x100;

    fn ts_packet(pid: u16, pusi: bool, continuity: u8, payload: &[u8]) -> Vec<u8> {
        assert!(payload.len() <= 184);
        let mut packet = vec![0xFFu8; 188];
        packet[0] = 0x47;
        packet[1] = ((pid >> 8) as u8 & 0x1F) | if pusi { 0x40 } else { 0 };
        packet[2] = (pid & 0xFF) as u8;
        packet[3] = 0x10 | (continuity & 0x0F);
        packet[4..4 + payload.len()].copy_from_slice(payload);
        packet
    }

    fn psi(section: &[u8]) -> Vec<u8> {
        let mut payload = vec![0x00]; // pointer field
        payload.extend_from_slice(section);
        payload
    }

    fn pat_section() -> Vec<u8> {
        vec![
            0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, //
            0x00, 0x01, 0xE0 | (PMT_PID >> 8) as u8, (PMT_PID & 0xFF) as u8, //
            0x00, 0x00, 0x00, 0x00,
        ]
    }

    fn pmt_section(audio_stream_type: u8) -> Vec<u8> {
        let mut section = vec![
            0x02, 0xB0, 0x17, 0x00, 0x01, 0xC1, 0x00, 0x00, //
            0xE0 | (VIDEO_PID >> 8) as u8, (VIDEO_PID & 0xFF) as u8, // PCR PID
            0x00, 0x00, // program info length
        ];
        // H.264 video on VIDEO_PID.
        section.extend_from_slice(&[
            0x1B, 0xE0 | (VIDEO_PID >> 8) as u8, (VIDEO_PID & 0xFF) as u8, 0x00, 0x00,
        ]);
        // Audio on AUDIO_PID.
        section.extend_from_slice(&[
            audio_stream_type,
            0xE0 | (AUDIO_PID >> 8) as u8,
            (AUDIO_PID & 0xFF) as u8,
            0x00,
            0x00,
        ]);
        section.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // CRC
        section
    }

    fn pes_with_payload(stream_id: u8, es: &[u8]) -> Vec<u8> {
        let mut pes = vec![0x00, 0x00, 0x01, stream_id];
        let length = 3 + es.len();
        pes.extend_from_slice(&(length as u16).to_be_bytes());
        pes.extend_from_slice(&[0x80, 0x00, 0x00]);
        pes.extend_from_slice(es);
        pes
    }

    fn adts_stream(packets: usize) -> Vec<u8> {
        let frame =
            aac::build_adts_frame(&[0x42; 64], 48000, 2, aac::AudioObjectType::AacLowComplexity)
                .unwrap();
        let pes = pes_with_payload(0xC0, &frame);

        let mut ts = Vec::new();
        ts.extend_from_slice(&ts_packet(PID_PAT, true, 0, &psi(&pat_section())));
        ts.extend_from_slice(&ts_packet(PMT_PID, true, 0, &psi(&pmt_section(0x0F))));

        // A video PES carrying an SPS so the H.264 track gets dimensions.
        let mut annex_b = vec![0x00, 0x00, 0x00, 0x01, 0x67];
        annex_b.extend_from_slice(&sps_rbsp_1280x720());
        let video_pes = pes_with_payload(0xE0, &annex_b);
        ts.extend_from_slice(&ts_packet(VIDEO_PID, true, 0, &video_pes));

        for i in 0..packets {
            ts.extend_from_slice(&ts_packet(AUDIO_PID, true, i as u8, &pes));
            // Repeat tables so the early completion heuristic can trigger.
            ts.extend_from_slice(&ts_packet(PID_PAT, true, i as u8, &psi(&pat_section())));
            ts.extend_from_slice(&ts_packet(PMT_PID, true, i as u8, &psi(&pmt_section(0x0F))));
        }
        ts
    }

    fn sps_rbsp_1280x720() -> Vec<u8> {
        use bytes_util::BitWriter;
        use expgolomb::BitWriterExpGolombExt;

        let mut w = BitWriter::<Vec<u8>>::default();
        w.write_bits(66, 8).unwrap();
        w.write_bits(0xC0, 8).unwrap();
        w.write_bits(30, 8).unwrap();
        w.write_exp_golomb(0).unwrap(); // sps id
        w.write_exp_golomb(4).unwrap(); // log2_max_frame_num_minus4
        w.write_exp_golomb(2).unwrap(); // pic_order_cnt_type
        w.write_exp_golomb(3).unwrap(); // max_num_ref_frames
        w.write_bit(false).unwrap();
        w.write_exp_golomb(79).unwrap(); // width mbs - 1
        w.write_exp_golomb(44).unwrap(); // height map units - 1
        w.write_bit(true).unwrap(); // frame_mbs_only
        w.write_bit(true).unwrap(); // direct_8x8
        w.write_bit(false).unwrap(); // no cropping
        w.write_bit(true).unwrap(); // stop bit
        w.finish().unwrap()
    }

    #[test]
    fn test_demux_adts_program() {
        let data = adts_stream(4);
        let info = parse_ts(SliceSource::with_chunk_size(data, 100)).unwrap();

        assert_eq!(info.container, ContainerFormat::MpegTs);
        assert_eq!(info.audio_streams.len(), 1);
        assert_eq!(info.video_streams.len(), 1);

        let audio = &info.audio_streams[0];
        assert_eq!(audio.id, AUDIO_PID as u32);
        assert_eq!(audio.codec, AudioCodec::Aac);
        assert_eq!(audio.sample_rate, Some(48000));
        assert_eq!(audio.channel_count, Some(2));
        assert_eq!(audio.profile.as_deref(), Some("LC"));

        let video = &info.video_streams[0];
        assert_eq!(video.id, VIDEO_PID as u32);
        assert_eq!(video.codec, media_types::VideoCodec::H264);
        assert_eq!(video.width, Some(1280));
        assert_eq!(video.height, Some(720));
    }

    #[test]
    fn test_demux_latm_stream_type() {
        use bytes_util::BitWriter;

        // LATM mux element: LC, 44100 Hz, stereo, with LOAS sync.
        let mut w = BitWriter::<Vec<u8>>::default();
        w.write_bits(0x2B7, 11).unwrap();
        w.write_bits(9, 8).unwrap();
        w.write_bit(false).unwrap();
        w.write_bit(false).unwrap();
        w.write_bits(0b01, 2).unwrap();
        w.write_bits(0, 6).unwrap();
        w.write_bits(0, 4).unwrap();
        w.write_bits(0, 3).unwrap();
        w.write_bits(2, 5).unwrap();
        w.write_bits(4, 4).unwrap(); // 44100
        w.write_bits(2, 4).unwrap();
        w.write_bits(0, 3).unwrap();
        w.write_bits(0xFF, 8).unwrap();
        w.write_bit(false).unwrap();
        w.write_bit(false).unwrap();
        let latm = w.finish().unwrap();
        let pes = pes_with_payload(0xC0, &latm);

        let mut ts = Vec::new();
        ts.extend_from_slice(&ts_packet(PID_PAT, true, 0, &psi(&pat_section())));
        ts.extend_from_slice(&ts_packet(PMT_PID, true, 0, &psi(&pmt_section(0x11))));
        for i in 0..3u8 {
            ts.extend_from_slice(&ts_packet(AUDIO_PID, true, i, &pes));
            ts.extend_from_slice(&ts_packet(PID_PAT, true, i, &psi(&pat_section())));
            ts.extend_from_slice(&ts_packet(PMT_PID, true, i, &psi(&pmt_section(0x11))));
        }
        // The video PID never delivers a payload; sniffing gives up after
        // the attempt cap, so pad with audio-only traffic.
        let mut demuxer_input = ts.clone();
        for i in 0..8u8 {
            demuxer_input.extend_from_slice(&ts_packet(AUDIO_PID, true, 3 + i, &pes));
        }

        let info = parse_ts(SliceSource::new(demuxer_input)).unwrap();
        let audio = &info.audio_streams[0];
        assert_eq!(audio.codec, AudioCodec::AacLatm);
        assert_eq!(audio.sample_rate, Some(44100));
        assert_eq!(audio.channel_count, Some(2));
    }

    #[test]
    fn test_extract_audio_frames() {
        let data = adts_stream(6);

        let mut frames: Vec<(u16, usize)> = Vec::new();
        {
            let extract = TsExtract {
                pids: vec![AUDIO_PID],
                on_frames: Box::new(|pid, frame| {
                    frames.push((pid, frame.len()));
                    Ok(())
                }),
            };
            TsDemuxer::with_extract(extract)
                .parse(SliceSource::new(data))
                .unwrap();
        }

        assert_eq!(frames.len(), 6);
        assert!(frames.iter().all(|&(pid, len)| pid == AUDIO_PID && len == 71));
    }

    #[test]
    fn test_sink_error_propagates() {
        let data = adts_stream(3);

        let extract = TsExtract {
            pids: vec![],
            on_frames: Box::new(|_, _| Err(ProbeError::Sink("cancelled".into()))),
        };
        let err = TsDemuxer::with_extract(extract)
            .parse(SliceSource::new(data))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Sink(_)));
    }

    #[test]
    fn test_rejects_non_ts() {
        let data = vec![0xABu8; 4096];
        assert!(parse_ts(SliceSource::new(data)).is_err());
    }
}
