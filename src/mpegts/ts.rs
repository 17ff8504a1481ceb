use {
    super::{
        define::{
            epat_pid, epes_stream_id, MPEG_FLAG_IDR_FRAME, TS_DEFAULT_AUDIO_PID,
            TS_DEFAULT_PMT_PID, TS_DEFAULT_VIDEO_PID, TS_PACKET_SIZE, TS_SYNC_BYTE,
        },
        errors::{MpegTsError, MpegTsErrorValue},
        pat::{Pat, PatMuxer},
        pes::{Pes, PesMuxer},
        pmt::{Pmt, PmtMuxer},
    },
    bytes::{BufMut, BytesMut},
    std::collections::HashMap,
};

/// How often (in TS packets carrying the same PID) to re-insert PAT/PMT,
/// so a player tuning in mid-segment can still find the program map.
const PSI_REPEAT_PACKET_INTERVAL: u32 = 50;

/// Builds a single elementary-stream track and multiplexes it with the
/// program's other tracks into 188-byte TS packets. One `TsMuxer` instance
/// lives for the lifetime of one HLS segment: `reset` is called after each
/// segment is flushed to storage so a fresh instance isn't needed per file.
pub struct TsMuxer {
    pat: Pat,
    pmt: Pmt,
    streams: HashMap<u16, Pes>,
    next_pid: u16,
    continuity_counters: HashMap<u16, u8>,
    packets_since_psi: u32,
    data: BytesMut,
}

impl Default for TsMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl TsMuxer {
    #[must_use]
    pub fn new() -> Self {
        let mut pmt = Pmt::new();
        pmt.pid = TS_DEFAULT_PMT_PID;
        pmt.program_number = 1;

        let mut pat = Pat::new();
        pat.pmt.push(pmt.clone());

        Self {
            pat,
            pmt,
            streams: HashMap::new(),
            next_pid: TS_DEFAULT_VIDEO_PID,
            continuity_counters: HashMap::new(),
            packets_since_psi: PSI_REPEAT_PACKET_INTERVAL,
            data: BytesMut::new(),
        }
    }

    /// Registers an elementary stream and returns its assigned PID. Video
    /// and audio get fixed, well-known PIDs the first time each is added;
    /// anything else is assigned sequentially.
    pub fn add_stream(&mut self, codec_id: u8, extra_data: BytesMut) -> Result<u16, MpegTsError> {
        let is_video = matches!(
            codec_id,
            super::define::epsi_stream_type::PSI_STREAM_H264 | super::define::epsi_stream_type::PSI_STREAM_H265
        );
        let pid = if is_video {
            TS_DEFAULT_VIDEO_PID
        } else if self.streams.contains_key(&TS_DEFAULT_VIDEO_PID) {
            TS_DEFAULT_AUDIO_PID
        } else {
            self.next_pid += 1;
            self.next_pid
        };

        if self.streams.len() >= 8 {
            return Err(MpegTsErrorValue::StreamCountExeceed.into());
        }

        let _ = extra_data; // reserved for future descriptor use (e.g. AAC config)
        let pes = Pes::new(pid, codec_id);
        self.streams.insert(pid, pes.clone());
        self.pmt.streams.push(pes);

        if self.pmt.pcr_pid == 0 || is_video {
            self.pmt.pcr_pid = pid;
        }

        self.pat.pmt.clear();
        self.pat.pmt.push(self.pmt.clone());

        self.continuity_counters.entry(pid).or_insert(0);

        Ok(pid)
    }

    fn next_continuity_counter(&mut self, pid: u16) -> u8 {
        let counter = self.continuity_counters.entry(pid).or_insert(0);
        let value = *counter;
        *counter = (*counter + 1) & 0x0F;
        value
    }

    fn write_psi_if_due(&mut self) -> Result<(), MpegTsError> {
        if self.packets_since_psi < PSI_REPEAT_PACKET_INTERVAL {
            return Ok(());
        }
        self.packets_since_psi = 0;

        let mut pat_muxer = PatMuxer::new();
        let pat_section = pat_muxer.write(self.pat.clone())?;
        self.write_psi_packet(epat_pid::PAT_TID_PAS as u16, &pat_section)?;

        let mut pmt_muxer = PmtMuxer::new();
        let pmt_section = pmt_muxer.write(&self.pmt)?;
        self.write_psi_packet(self.pmt.pid, &pmt_section)?;

        Ok(())
    }

    fn write_psi_packet(&mut self, pid: u16, section: &BytesMut) -> Result<(), MpegTsError> {
        let cc = self.next_continuity_counter(pid);
        let mut packet = BytesMut::with_capacity(TS_PACKET_SIZE);
        packet.put_u8(TS_SYNC_BYTE);
        packet.put_u8(0x40 | (((pid >> 8) & 0x1F) as u8)); // payload_unit_start_indicator
        packet.put_u8((pid & 0xFF) as u8);
        packet.put_u8(0x10 | (cc & 0x0F)); // no adaptation field, payload only

        packet.put_u8(0x00); // pointer_field
        packet.extend_from_slice(section);

        packet.resize(TS_PACKET_SIZE, 0xFF);
        self.data.extend_from_slice(&packet);
        Ok(())
    }

    /// Packetizes one access unit. `pts`/`dts` are in 90kHz units. `flags`
    /// non-zero (`MPEG_FLAG_IDR_FRAME`) marks a video keyframe and triggers
    /// a PCR insertion adjacent to the random-access point.
    pub fn write(
        &mut self,
        pid: u16,
        pts_90k: i64,
        dts_90k: i64,
        flags: u8,
        payload: BytesMut,
    ) -> Result<(), MpegTsError> {
        if !self.streams.contains_key(&pid) {
            return Err(MpegTsErrorValue::StreamNotFound.into());
        }

        self.write_psi_if_due()?;

        let stream_id = if pid == self.pmt.pcr_pid && flags == MPEG_FLAG_IDR_FRAME {
            epes_stream_id::STREAM_ID_VIDEO
        } else if self.streams.get(&pid).map(|s| s.codec_id) == Some(super::define::epsi_stream_type::PSI_STREAM_H264)
            || self.streams.get(&pid).map(|s| s.codec_id) == Some(super::define::epsi_stream_type::PSI_STREAM_H265)
        {
            epes_stream_id::STREAM_ID_VIDEO
        } else {
            epes_stream_id::STREAM_ID_AUDIO
        };

        let mut pes_muxer = PesMuxer::new();
        let pts_ms = (pts_90k.max(0) as u64 * 1000) / super::define::TS_TIMESCALE;
        let dts_ms = (dts_90k.max(0) as u64 * 1000) / super::define::TS_TIMESCALE;
        let pes_packet = pes_muxer.write(stream_id, pts_ms, dts_ms, dts_90k != pts_90k, &payload)?;

        let write_pcr = pid == self.pmt.pcr_pid;
        self.write_ts_packets(pid, &pes_packet, write_pcr, dts_90k.max(0) as u64)?;

        Ok(())
    }

    fn write_ts_packets(
        &mut self,
        pid: u16,
        pes_packet: &BytesMut,
        write_pcr: bool,
        pcr_base_90k: u64,
    ) -> Result<(), MpegTsError> {
        let mut offset = 0usize;
        let mut first = true;

        while offset < pes_packet.len() {
            let cc = self.next_continuity_counter(pid);
            let mut packet = BytesMut::with_capacity(TS_PACKET_SIZE);
            packet.put_u8(TS_SYNC_BYTE);

            let pusi = u8::from(first);
            packet.put_u8((pusi << 6) | (((pid >> 8) & 0x1F) as u8));
            packet.put_u8((pid & 0xFF) as u8);

            let remaining_payload = pes_packet.len() - offset;
            let has_adaptation = first && write_pcr;

            if has_adaptation {
                // adaptation field with PCR (6 bytes) + flags byte + length byte
                let adaptation_len = 7u8;
                let header_overhead = 4 + 1 + usize::from(adaptation_len);
                let payload_len = remaining_payload.min(TS_PACKET_SIZE - header_overhead);
                let stuffing = TS_PACKET_SIZE - header_overhead - payload_len;

                packet.put_u8(0x30 | (cc & 0x0F)); // adaptation field + payload
                packet.put_u8(adaptation_len + stuffing as u8);
                packet.put_u8(0x10); // PCR_flag set
                write_pcr_field(&mut packet, pcr_base_90k);
                for _ in 0..stuffing {
                    packet.put_u8(0xFF);
                }
                packet.extend_from_slice(&pes_packet[offset..offset + payload_len]);
                offset += payload_len;
            } else {
                let header_overhead = 4;
                let payload_len = remaining_payload.min(TS_PACKET_SIZE - header_overhead);
                let needs_stuffing = payload_len < TS_PACKET_SIZE - header_overhead;

                if needs_stuffing {
                    let stuffing = TS_PACKET_SIZE - header_overhead - payload_len - 1;
                    packet.put_u8(0x30 | (cc & 0x0F));
                    packet.put_u8(stuffing as u8);
                    if stuffing > 0 {
                        packet.put_u8(0x00);
                        for _ in 0..stuffing.saturating_sub(1) {
                            packet.put_u8(0xFF);
                        }
                    }
                } else {
                    packet.put_u8(0x10 | (cc & 0x0F));
                }
                packet.extend_from_slice(&pes_packet[offset..offset + payload_len]);
                offset += payload_len;
            }

            packet.resize(TS_PACKET_SIZE, 0xFF);
            self.data.extend_from_slice(&packet);
            self.packets_since_psi += 1;
            first = false;
        }

        Ok(())
    }

    /// The accumulated TS bytes for the current segment.
    #[must_use]
    pub fn get_data(&self) -> BytesMut {
        self.data.clone()
    }

    /// Clears accumulated bytes after a segment is flushed. PSI state
    /// (PAT/PMT/stream table) persists so a new segment is immediately
    /// demuxable without re-adding streams.
    pub fn reset(&mut self) {
        self.data.clear();
        self.packets_since_psi = PSI_REPEAT_PACKET_INTERVAL;
    }
}

/// Writes the 6-byte PCR field (33-bit base @ 90kHz + 6 reserved bits + 9-bit extension).
fn write_pcr_field(packet: &mut BytesMut, pcr_base_90k: u64) {
    let base = pcr_base_90k & 0x1_FFFF_FFFF;
    let extension: u64 = 0;
    packet.put_u8(((base >> 25) & 0xFF) as u8);
    packet.put_u8(((base >> 17) & 0xFF) as u8);
    packet.put_u8(((base >> 9) & 0xFF) as u8);
    packet.put_u8(((base >> 1) & 0xFF) as u8);
    packet.put_u8((((base & 0x01) as u8) << 7) | 0x7E | (((extension >> 8) & 0x01) as u8));
    packet.put_u8((extension & 0xFF) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::define::epsi_stream_type;

    #[test]
    fn test_add_stream_assigns_known_pids() {
        let mut muxer = TsMuxer::new();
        let video_pid = muxer.add_stream(epsi_stream_type::PSI_STREAM_H264, BytesMut::new()).unwrap();
        let audio_pid = muxer.add_stream(epsi_stream_type::PSI_STREAM_AAC, BytesMut::new()).unwrap();
        assert_eq!(video_pid, TS_DEFAULT_VIDEO_PID);
        assert_eq!(audio_pid, TS_DEFAULT_AUDIO_PID);
        assert_ne!(video_pid, audio_pid);
    }

    #[test]
    fn test_write_produces_188_byte_packets() {
        let mut muxer = TsMuxer::new();
        let video_pid = muxer.add_stream(epsi_stream_type::PSI_STREAM_H264, BytesMut::new()).unwrap();
        let payload = BytesMut::from(&[0u8; 300][..]);
        muxer.write(video_pid, 9000, 9000, MPEG_FLAG_IDR_FRAME, payload).unwrap();
        let data = muxer.get_data();
        assert!(!data.is_empty());
        assert_eq!(data.len() % TS_PACKET_SIZE, 0);
        for chunk in data.chunks(TS_PACKET_SIZE) {
            assert_eq!(chunk[0], TS_SYNC_BYTE);
        }
    }

    #[test]
    fn test_reset_clears_data_not_streams() {
        let mut muxer = TsMuxer::new();
        let video_pid = muxer.add_stream(epsi_stream_type::PSI_STREAM_H264, BytesMut::new()).unwrap();
        muxer.write(video_pid, 0, 0, MPEG_FLAG_IDR_FRAME, BytesMut::from(&[1u8][..])).unwrap();
        assert!(!muxer.get_data().is_empty());
        muxer.reset();
        assert!(muxer.get_data().is_empty());
        // Stream table survives, so another write still succeeds.
        assert!(muxer.write(video_pid, 1, 1, 0, BytesMut::from(&[2u8][..])).is_ok());
    }

    #[test]
    fn test_write_unknown_pid_fails() {
        let mut muxer = TsMuxer::new();
        assert!(muxer.write(0x1234, 0, 0, 0, BytesMut::new()).is_err());
    }
}
