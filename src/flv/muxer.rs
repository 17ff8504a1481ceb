use byteorder::BigEndian;
use bytes::BytesMut;

use super::errors::FlvMuxerError;
use crate::bytesio::bytes_writer::BytesWriter;

/// Tag header size: type(1) + data size(3) + timestamp(3) + timestamp ext(1) + stream id(3).
pub const HEADER_LENGTH: u32 = 11;

const FLV_HEADER_SIZE: u32 = 9;

/// Builds an FLV byte stream (header + tags) into `writer`, one call per
/// piece the way a streaming remux has to: header once, then a
/// tag-header/tag-body/previous-tag-size triple per frame.
#[derive(Default)]
pub struct FlvMuxer {
    pub writer: BytesWriter,
}

impl FlvMuxer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writer: BytesWriter::new(),
        }
    }

    pub fn write_flv_header(&mut self, has_audio: bool, has_video: bool) -> Result<(), FlvMuxerError> {
        self.writer.write(b"FLV")?;
        self.writer.write_u8(1)?; // version
        let flags = (u8::from(has_audio) << 2) | u8::from(has_video);
        self.writer.write_u8(flags)?;
        self.writer.write_u32::<BigEndian>(FLV_HEADER_SIZE)?;
        Ok(())
    }

    pub fn write_previous_tag_size(&mut self, size: u32) -> Result<(), FlvMuxerError> {
        self.writer.write_u32::<BigEndian>(size)?;
        Ok(())
    }

    pub fn write_flv_tag_header(
        &mut self,
        tag_type: u8,
        data_size: u32,
        timestamp: u32,
    ) -> Result<(), FlvMuxerError> {
        self.writer.write_u8(tag_type)?;
        self.writer.write_u24::<BigEndian>(data_size)?;
        self.writer.write_u24::<BigEndian>(timestamp & 0x00FF_FFFF)?;
        self.writer.write_u8(((timestamp >> 24) & 0xFF) as u8)?;
        self.writer.write_u24::<BigEndian>(0)?; // stream id, always 0
        Ok(())
    }

    pub fn write_flv_tag_body(&mut self, data: BytesMut) -> Result<(), FlvMuxerError> {
        self.writer.write(&data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flv_header_flags() {
        let mut muxer = FlvMuxer::new();
        muxer.write_flv_header(true, true).unwrap();
        let data = muxer.writer.get_current_bytes();
        assert_eq!(&data[0..3], b"FLV");
        assert_eq!(data[4], 0b0000_0101);
    }

    #[test]
    fn test_tag_header_layout() {
        let mut muxer = FlvMuxer::new();
        muxer.write_flv_tag_header(9, 100, 0x0A01_0203).unwrap();
        let data = muxer.writer.extract_current_bytes();
        assert_eq!(data.len(), HEADER_LENGTH as usize);
        assert_eq!(data[0], 9);
        assert_eq!(&data[1..4], &[0, 0, 100]);
        assert_eq!(&data[4..7], &[0x01, 0x02, 0x03]);
        assert_eq!(data[7], 0x0A);
        assert_eq!(&data[8..11], &[0, 0, 0]);
    }
}
