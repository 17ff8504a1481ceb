use {
    super::{define::TS_TIMESCALE, errors::MpegTsError},
    byteorder::BigEndian,
    bytes::BytesMut,
    crate::bytesio::bytes_writer::BytesWriter,
};

/// One elementary stream tracked by a `Pmt` entry and packetized by
/// `PesMuxer`. `codec_id` is the ISO 13818-1 `stream_type` (see
/// `epsi_stream_type`).
#[derive(Debug, Clone)]
pub struct Pes {
    pub pid: u16,
    pub codec_id: u8,
    pub continuity_counter: u8,
}

impl Pes {
    #[must_use]
    pub const fn new(pid: u16, codec_id: u8) -> Self {
        Self {
            pid,
            codec_id,
            continuity_counter: 0,
        }
    }
}

/// Builds a PES packet: start code + stream id + packet length + optional
/// header (flags, PTS/DTS) + the elementary stream payload. The caller
/// slices the result into TS packets.
#[derive(Default)]
pub struct PesMuxer {
    pub bytes_writer: BytesWriter,
}

impl PesMuxer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes_writer: BytesWriter::new(),
        }
    }

    /// Writes a 5-byte `PTS_DTS` field per ISO 13818-1 §2.4.3.7, with the
    /// 4-bit marker prefix chosen by the caller (0x2 for PTS-only, 0x3/0x1
    /// for the PTS/DTS pair).
    fn write_timestamp_field(&mut self, marker: u8, ts_90khz: u64) -> Result<(), MpegTsError> {
        let ts = ts_90khz & 0x1_ffff_ffff;
        let b0 = (marker << 4) | (((ts >> 30) & 0x07) as u8) << 1 | 1;
        let b1 = ((ts >> 22) & 0xff) as u8;
        let b2 = ((((ts >> 15) & 0x7f) as u8) << 1) | 1;
        let b3 = ((ts >> 7) & 0xff) as u8;
        let b4 = (((ts & 0x7f) as u8) << 1) | 1;
        self.bytes_writer.write_u8(b0)?;
        self.bytes_writer.write_u8(b1)?;
        self.bytes_writer.write_u8(b2)?;
        self.bytes_writer.write_u8(b3)?;
        self.bytes_writer.write_u8(b4)?;
        Ok(())
    }

    /// Builds one PES packet. `pts`/`dts` are in milliseconds; converted to
    /// the 90kHz PES clock internally. Video frames pass both; audio
    /// frames typically pass `pts == dts`.
    pub fn write(
        &mut self,
        stream_id: u8,
        pts_ms: u64,
        dts_ms: u64,
        has_dts: bool,
        payload: &BytesMut,
    ) -> Result<BytesMut, MpegTsError> {
        let pts_90k = pts_ms * TS_TIMESCALE / 1000;
        let dts_90k = dts_ms * TS_TIMESCALE / 1000;

        self.bytes_writer.write_u8(0x00)?;
        self.bytes_writer.write_u8(0x00)?;
        self.bytes_writer.write_u8(0x01)?;
        self.bytes_writer.write_u8(stream_id)?;

        let header_len: u8 = if has_dts && dts_90k != pts_90k { 10 } else { 5 };
        let pes_packet_length = payload.len() as u64 + u64::from(header_len) + 3;
        // PES_packet_length is a 16-bit field; 0 means "unbounded", used by
        // video streams whose payload can exceed 0xFFFF (per spec, allowed
        // only for video). We clamp rather than special-case here.
        self.bytes_writer
            .write_u16::<BigEndian>(pes_packet_length.min(0xFFFF) as u16)?;

        // '10' marker, no scrambling, no priority/alignment/copyright/original
        self.bytes_writer.write_u8(0x80)?;
        let pts_dts_flags: u8 = if has_dts && dts_90k != pts_90k { 0xC0 } else { 0x80 };
        self.bytes_writer.write_u8(pts_dts_flags)?;
        self.bytes_writer.write_u8(header_len)?;

        if has_dts && dts_90k != pts_90k {
            self.write_timestamp_field(0x3, pts_90k)?;
            self.write_timestamp_field(0x1, dts_90k)?;
        } else {
            self.write_timestamp_field(0x2, pts_90k)?;
        }

        self.bytes_writer.write(payload)?;

        Ok(self.bytes_writer.extract_current_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::define::epes_stream_id;

    #[test]
    fn test_pes_header_markers() {
        let mut muxer = PesMuxer::new();
        let payload = BytesMut::from(&[0xAA, 0xBB][..]);
        let data = muxer
            .write(epes_stream_id::STREAM_ID_VIDEO, 1000, 1000, false, &payload)
            .unwrap();
        assert_eq!(&data[0..3], &[0x00, 0x00, 0x01]);
        assert_eq!(data[3], epes_stream_id::STREAM_ID_VIDEO);
        // marker bits '0010' or '0011' at top nibble of first PTS byte
        let pts_marker = data[9] >> 4;
        assert!(pts_marker == 0x2 || pts_marker == 0x3);
    }

    #[test]
    fn test_pes_with_dts() {
        let mut muxer = PesMuxer::new();
        let payload = BytesMut::from(&[0x01, 0x02, 0x03][..]);
        let data = muxer
            .write(epes_stream_id::STREAM_ID_VIDEO, 2000, 1800, true, &payload)
            .unwrap();
        assert_eq!(data[8], 10); // header_len with PTS+DTS
    }
}
