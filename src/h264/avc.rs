use bytes::{Buf, BufMut, BytesMut};

use super::errors::{H264Error, H264ErrorValue};
use super::sps::{parse_sps, SpsInfo};

const ANNEXB_START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Holds the AVCDecoderConfigurationRecord parsed from the RTMP/FLV video
/// sequence header, and converts subsequent AVCC-framed NALUs (4-byte length
/// prefix) into Annex-B (start-code prefixed) for containers that want it.
#[derive(Default)]
pub struct Mpeg4AvcProcessor {
    pub nalu_length_size: u8,
    pub sps: Vec<BytesMut>,
    pub pps: Vec<BytesMut>,
    pub sps_info: Option<SpsInfo>,
}

impl Mpeg4AvcProcessor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nalu_length_size: 4,
            sps: Vec::new(),
            pps: Vec::new(),
            sps_info: None,
        }
    }

    /// Parse an `AVCDecoderConfigurationRecord` (ISO 14496-15 §5.2.4.1).
    pub fn decoder_configuration_record_load(&mut self, data: &mut BytesMut) -> Result<(), H264Error> {
        if data.len() < 6 {
            return Err(H264ErrorValue::InvalidDecoderConfig.into());
        }
        let _configuration_version = data.get_u8();
        let _avc_profile_indication = data.get_u8();
        let _profile_compatibility = data.get_u8();
        let _avc_level_indication = data.get_u8();
        let length_size_minus_one = data.get_u8() & 0x03;
        self.nalu_length_size = length_size_minus_one + 1;

        let num_sps = data.get_u8() & 0x1F;
        self.sps.clear();
        for _ in 0..num_sps {
            if data.len() < 2 {
                return Err(H264ErrorValue::InvalidDecoderConfig.into());
            }
            let len = data.get_u16() as usize;
            if data.len() < len {
                return Err(H264ErrorValue::InvalidDecoderConfig.into());
            }
            let sps = data.split_to(len);
            if len > 1 {
                if let Ok(info) = parse_sps(&sps[1..]) {
                    self.sps_info = Some(info);
                }
            }
            self.sps.push(sps);
        }

        if data.is_empty() {
            return Ok(());
        }
        let num_pps = data.get_u8();
        self.pps.clear();
        for _ in 0..num_pps {
            if data.len() < 2 {
                return Err(H264ErrorValue::InvalidDecoderConfig.into());
            }
            let len = data.get_u16() as usize;
            if data.len() < len {
                return Err(H264ErrorValue::InvalidDecoderConfig.into());
            }
            self.pps.push(data.split_to(len));
        }

        Ok(())
    }

    /// Convert one AVCC-framed access unit (length-prefixed NALUs, per the
    /// negotiated `nalu_length_size`) into Annex-B (start-code prefixed).
    pub fn h264_mp4toannexb(&self, data: &mut BytesMut) -> Result<BytesMut, H264Error> {
        let mut out = BytesMut::new();
        let len_size = self.nalu_length_size as usize;

        while data.len() >= len_size {
            let nalu_len = read_length(data, len_size)?;
            data.advance(len_size);
            if data.len() < nalu_len {
                return Err(H264ErrorValue::TruncatedNalu.into());
            }
            let nalu = data.split_to(nalu_len);
            let nalu_type = nalu.first().map(|b| b & 0x1F).unwrap_or(0);

            out.extend_from_slice(&ANNEXB_START_CODE);
            out.put_slice(&nalu);

            // SPS (7) is always immediately followed by PPS (8) in practice;
            // nothing special to insert here, containers reassemble freely.
            let _ = nalu_type;
        }
        Ok(out)
    }

    /// Re-serializes an `AVCDecoderConfigurationRecord` (ISO 14496-15 §5.2.4.1)
    /// from the parsed SPS/PPS — the inverse of
    /// `decoder_configuration_record_load` — for embedding verbatim in an
    /// fMP4 `avcC` box. `None` if no sequence header has been parsed yet.
    #[must_use]
    pub fn build_decoder_configuration_record(&self) -> Option<BytesMut> {
        if self.sps.is_empty() || self.pps.is_empty() {
            return None;
        }
        let info = self.sps_info.as_ref()?;

        let mut out = BytesMut::new();
        out.put_u8(1); // configurationVersion
        out.put_u8(info.profile_idc);
        out.put_u8(0); // profile_compatibility
        out.put_u8(info.level_idc);
        out.put_u8(0xFC | (self.nalu_length_size.saturating_sub(1) & 0x03));
        out.put_u8(0xE0 | (self.sps.len() as u8 & 0x1F));
        for sps in &self.sps {
            out.put_u16(sps.len() as u16);
            out.put_slice(sps);
        }
        out.put_u8(self.pps.len() as u8);
        for pps in &self.pps {
            out.put_u16(pps.len() as u16);
            out.put_slice(pps);
        }
        Some(out)
    }
}

fn read_length(data: &BytesMut, len_size: usize) -> Result<usize, H264Error> {
    if data.len() < len_size {
        return Err(H264ErrorValue::TruncatedNalu.into());
    }
    let v = match len_size {
        1 => data[0] as usize,
        2 => u16::from_be_bytes([data[0], data[1]]) as usize,
        3 => ((data[0] as usize) << 16) | ((data[1] as usize) << 8) | data[2] as usize,
        4 => u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize,
        _ => return Err(H264ErrorValue::InvalidDecoderConfig.into()),
    };
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp4_to_annexb_single_nalu() {
        let processor = Mpeg4AvcProcessor::new();
        let mut data = BytesMut::from(&[0, 0, 0, 3, 0x65, 0xAA, 0xBB][..]);
        let out = processor.h264_mp4toannexb(&mut data).unwrap();
        assert_eq!(&out[..], &[0, 0, 0, 1, 0x65, 0xAA, 0xBB]);
    }

    #[test]
    fn test_mp4_to_annexb_multiple_nalus() {
        let processor = Mpeg4AvcProcessor::new();
        let mut data = BytesMut::from(&[0, 0, 0, 1, 0x41, 0, 0, 0, 2, 0x61, 0x00][..]);
        let out = processor.h264_mp4toannexb(&mut data).unwrap();
        assert_eq!(&out[..], &[0, 0, 0, 1, 0x41, 0, 0, 0, 1, 0x61, 0x00]);
    }

    #[test]
    fn test_decoder_config_load() {
        let mut processor = Mpeg4AvcProcessor::new();
        let sps_payload = [0x67, 0x42, 0x00, 0x1E];
        let pps_payload = [0x68, 0xCE, 0x3C, 0x80];
        let mut record = BytesMut::new();
        record.put_u8(1); // configurationVersion
        record.put_u8(0x42); // profile
        record.put_u8(0x00); // compat
        record.put_u8(0x1E); // level
        record.put_u8(0xFF); // length_size_minus_one = 3 -> nalu_length_size = 4
        record.put_u8(0xE1); // num sps = 1
        record.put_u16(sps_payload.len() as u16);
        record.put_slice(&sps_payload);
        record.put_u8(1); // num pps
        record.put_u16(pps_payload.len() as u16);
        record.put_slice(&pps_payload);

        processor.decoder_configuration_record_load(&mut record).unwrap();
        assert_eq!(processor.nalu_length_size, 4);
        assert_eq!(processor.sps.len(), 1);
        assert_eq!(processor.pps.len(), 1);
    }
}
