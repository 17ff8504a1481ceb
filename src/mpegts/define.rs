/// Table IDs carried in the PAT/PMT PSI section header.
pub mod epat_pid {
    pub const PAT_TID_PAS: u16 = 0x00;
    pub const PAT_TID_PMS: u16 = 0x02;
}

/// `stream_type` values from ISO 13818-1 Table 2-34, restricted to the
/// codecs this server actually remuxes.
pub mod epsi_stream_type {
    pub const PSI_STREAM_MPEG1: u8 = 0x01;
    pub const PSI_STREAM_MPEG2: u8 = 0x02;
    pub const PSI_STREAM_AAC: u8 = 0x0f;
    pub const PSI_STREAM_H264: u8 = 0x1b;
    pub const PSI_STREAM_H265: u8 = 0x24;
    pub const PSI_STREAM_AUDIO_OPUS: u8 = 0x9c;
    /// Placeholder `stream_type` for payloads without a registered ISO
    /// value (e.g. Opus muxed as private data, per the HLS-TS convention).
    pub const PSI_STREAM_PRIVATE_DATA: u8 = 0x06;
}

/// PES `stream_id` prefixes (ISO 13818-1 Table 2-18).
pub mod epes_stream_id {
    pub const STREAM_ID_AUDIO: u8 = 0xc0;
    pub const STREAM_ID_VIDEO: u8 = 0xe0;
}

/// Low nibble of a video PES's frame flags, mirroring the FLV `frame_type`
/// values so the remuxer can pass one flag straight through.
pub const MPEG_FLAG_IDR_FRAME: u8 = 0x0001;
pub const MPEG_FLAG_IDR_FRAME_UNSET: u8 = 0x0000;

/// Fixed TS packet size (ISO 13818-1 §2.4.3.2).
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;

/// Well-known PIDs.
pub const TS_PAT_PID: u16 = 0x0000;
pub const TS_DEFAULT_PMT_PID: u16 = 0x1001;
pub const TS_DEFAULT_VIDEO_PID: u16 = 0x0100;
pub const TS_DEFAULT_AUDIO_PID: u16 = 0x0101;

/// Sync byte that begins every TS packet.
pub const TS_SYNC_BYTE: u8 = 0x47;

/// 90kHz clock used for PTS/DTS/PCR, per §2.4.3.6.
pub const TS_TIMESCALE: u64 = 90_000;

/// Maximum interval between PCR insertions within a PES stream (ISO
/// 13818-1 recommends ≤ 100 ms).
pub const PCR_MAX_INTERVAL_MS: u64 = 100;
