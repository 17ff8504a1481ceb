use byteorder::BigEndian;

use super::define::AvcCodecId;
use super::errors::FlvDemuxerError;
use super::Unmarshal;
use crate::bytesio::bytes_reader::BytesReader;

/// First byte of an FLV audio tag, split into its bitfields (ISO/IEC
/// unofficial FLV spec §E.4.2.1). `aac_packet_type` is only present when
/// `sound_format` is AAC.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioTagHeader {
    pub sound_format: u8,
    pub sound_rate: u8,
    pub sound_size: u8,
    pub sound_type: u8,
    pub aac_packet_type: u8,
}

impl Unmarshal<AudioTagHeader> for AudioTagHeader {
    fn unmarshal(reader: &mut BytesReader) -> Result<Self, FlvDemuxerError> {
        let flags = reader.read_u8()?;
        let sound_format = flags >> 4;
        let mut header = Self {
            sound_format,
            sound_rate: (flags >> 2) & 0x03,
            sound_size: (flags >> 1) & 0x01,
            sound_type: flags & 0x01,
            aac_packet_type: 0,
        };

        if sound_format == super::define::SoundFormat::AAC as u8 {
            header.aac_packet_type = reader.read_u8()?;
        }

        Ok(header)
    }
}

/// First byte (plus, for AVC, 4 more) of an FLV video tag (ISO/IEC
/// unofficial FLV spec §E.4.3.1). `composition_time` is the signed
/// 24-bit PTS-minus-DTS offset, only meaningful for AVC NALU tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoTagHeader {
    pub frame_type: u8,
    pub codec_id: u8,
    pub avc_packet_type: u8,
    pub composition_time: i32,
}

impl Unmarshal<VideoTagHeader> for VideoTagHeader {
    fn unmarshal(reader: &mut BytesReader) -> Result<Self, FlvDemuxerError> {
        let flags = reader.read_u8()?;
        let codec_id = flags & 0x0F;
        let mut header = Self {
            frame_type: flags >> 4,
            codec_id,
            avc_packet_type: 0,
            composition_time: 0,
        };

        if codec_id == AvcCodecId::H264 as u8 {
            header.avc_packet_type = reader.read_u8()?;
            let raw = reader.read_u24::<BigEndian>()?;
            // sign-extend the 24-bit composition time offset
            header.composition_time = (((raw << 8) as i32) >> 8) as i32;
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_audio_tag_header_aac() {
        let mut reader = BytesReader::new(BytesMut::from(&[0xAF, 0x01][..]));
        let header = AudioTagHeader::unmarshal(&mut reader).unwrap();
        assert_eq!(header.sound_format, 10);
        assert_eq!(header.aac_packet_type, 1);
    }

    #[test]
    fn test_video_tag_header_avc_nalu() {
        let mut reader = BytesReader::new(BytesMut::from(&[0x17, 0x01, 0xFF, 0xFF, 0xFF][..]));
        let header = VideoTagHeader::unmarshal(&mut reader).unwrap();
        assert_eq!(header.frame_type, 1);
        assert_eq!(header.codec_id, 7);
        assert_eq!(header.avc_packet_type, 1);
        assert_eq!(header.composition_time, -1);
    }
}
