use bytes::{BufMut, BytesMut};

use super::errors::{MpegAacError, MpegErrorValue};
use crate::bytesio::bytes_reader::BytesReader;
use crate::bytesio::bytes_writer::BytesWriter;

/// Sampling frequency table from ISO 14496-3 Table 1.16, indexed by the
/// 4-bit `samplingFrequencyIndex` used in both `AudioSpecificConfig` and
/// ADTS headers. Index 15 (explicit frequency) is not produced by RTMP/FLV
/// encoders and is treated as unsupported.
const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Parses the FLV AAC sequence header (`AudioSpecificConfig`) and converts
/// subsequent raw AAC frames into ADTS-framed output for containers/clients
/// that expect self-contained AAC (e.g. MPEG-TS, plain HTTP audio).
#[derive(Default)]
pub struct Mpeg4AacProcessor {
    pub bytes_reader: BytesReader,
    pub bytes_writer: BytesWriter,

    object_type: u8,
    sampling_frequency_index: u8,
    channel_config: u8,
}

impl Mpeg4AacProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_data(&mut self, data: BytesMut) -> Result<(), MpegAacError> {
        self.bytes_reader.extend_from_slice(&data);
        Ok(())
    }

    /// Parse a 2-byte `AudioSpecificConfig` (ISO 14496-3 §1.6.2.1): 5 bits
    /// audioObjectType, 4 bits samplingFrequencyIndex, 4 bits channelConfiguration.
    pub fn audio_specific_config_load(&mut self) -> Result<(), MpegAacError> {
        let data = self.bytes_reader.read_bytes(2)?;
        let b0 = data[0];
        let b1 = data[1];

        self.object_type = b0 >> 3;
        self.sampling_frequency_index = ((b0 & 0x07) << 1) | (b1 >> 7);
        self.channel_config = (b1 >> 3) & 0x0F;

        if self.sampling_frequency_index as usize >= SAMPLING_FREQUENCIES.len() {
            return Err(MpegErrorValue::NotSupportedSamplingFrequency.into());
        }

        Ok(())
    }

    /// Prefix the remaining raw AAC payload with a 7-byte ADTS header
    /// (no CRC) and push the result into `bytes_writer`.
    pub fn adts_save(&mut self) -> Result<(), MpegAacError> {
        if self.sampling_frequency_index as usize >= SAMPLING_FREQUENCIES.len() {
            return Err(MpegErrorValue::NotSupportedSamplingFrequency.into());
        }

        let payload = self.bytes_reader.extract_remaining_bytes();
        let frame_length = 7 + payload.len() as u32;

        let mut header = [0u8; 7];
        header[0] = 0xFF;
        header[1] = 0xF1; // MPEG-4, layer 0, no CRC
        header[2] = ((self.object_type.saturating_sub(1) & 0x03) << 6)
            | ((self.sampling_frequency_index & 0x0F) << 2)
            | ((self.channel_config >> 2) & 0x01);
        header[3] = ((self.channel_config & 0x03) << 6) | ((frame_length >> 11) & 0x03) as u8;
        header[4] = ((frame_length >> 3) & 0xFF) as u8;
        header[5] = (((frame_length & 0x07) << 5) as u8) | 0x1F;
        header[6] = 0xFC;

        self.bytes_writer.write(&header)?;
        self.bytes_writer.write(&payload)?;

        Ok(())
    }

    /// MPEG-4 audio object type (2 = AAC-LC, the type RTMP encoders emit).
    #[must_use]
    pub const fn object_type(&self) -> u8 {
        self.object_type
    }

    /// Sample rate in Hz, looked up from the parsed `samplingFrequencyIndex`.
    /// `None` before a sequence header has been parsed.
    #[must_use]
    pub fn sample_rate(&self) -> Option<u32> {
        SAMPLING_FREQUENCIES
            .get(self.sampling_frequency_index as usize)
            .copied()
    }

    /// Channel count. `channelConfiguration` doubles as the channel count
    /// for the mono/stereo/5.1 layouts RTMP encoders actually produce.
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channel_config as u16
    }

    /// Re-serializes the 2-byte `AudioSpecificConfig` this processor parsed,
    /// the exact inverse of `audio_specific_config_load` — used verbatim as
    /// the fMP4 `esds` decoder-specific-info payload.
    #[must_use]
    pub fn audio_specific_config(&self) -> [u8; 2] {
        let b0 = (self.object_type << 3) | (self.sampling_frequency_index >> 1);
        let b1 = ((self.sampling_frequency_index & 0x01) << 7) | (self.channel_config << 3);
        [b0, b1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_specific_config_44100_stereo() {
        let mut p = Mpeg4AacProcessor::new();
        // objectType=2 (AAC LC), samplingFrequencyIndex=4 (44100), channelConfig=2
        let mut cfg = BytesMut::new();
        cfg.put_u8((2 << 3) | (4 >> 1));
        cfg.put_u8(((4 & 0x01) << 7) | (2 << 3));
        p.extend_data(cfg).unwrap();
        p.audio_specific_config_load().unwrap();
        assert_eq!(p.sampling_frequency_index, 4);
        assert_eq!(p.channel_config, 2);
        assert_eq!(p.object_type, 2);
    }

    #[test]
    fn test_adts_save_header_length() {
        let mut p = Mpeg4AacProcessor::new();
        p.object_type = 2;
        p.sampling_frequency_index = 4;
        p.channel_config = 2;
        p.extend_data(BytesMut::from(&[0xAA, 0xBB, 0xCC][..])).unwrap();
        p.adts_save().unwrap();
        let out = p.bytes_writer.extract_current_bytes();
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out[1], 0xF1);
    }

    #[test]
    fn test_unsupported_sampling_frequency() {
        let mut p = Mpeg4AacProcessor::new();
        p.sampling_frequency_index = 15;
        assert!(p.adts_save().is_err());
    }
}
