use {
    super::{
        define::{CONTROL_CHUNK_STREAM_ID, INIT_CHUNK_SIZE},
        errors::PackError,
    },
    crate::bytesio::bytes_writer::BytesWriter,
    byteorder::BigEndian,
    bytes::BytesMut,
};

/// Serializes one RTMP message into a basic-header/message-header/payload
/// chunk stream (spec §5.3). Always emits a type 0 header for the first
/// chunk of a message and type 3 headers for the continuation chunks; this
/// forgoes the delta-timestamp compression the spec allows but never needs
/// a previous-chunk cache to stay correct.
pub struct ChunkPacketizer {
    writer: BytesWriter,
    max_chunk_size: usize,
}

impl Default for ChunkPacketizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkPacketizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writer: BytesWriter::new(),
            max_chunk_size: INIT_CHUNK_SIZE as usize,
        }
    }

    pub fn update_max_chunk_size(&mut self, chunk_size: usize) {
        self.max_chunk_size = chunk_size;
    }

    fn write_basic_header(&mut self, format: u8, chunk_stream_id: u32) -> Result<(), PackError> {
        if chunk_stream_id < 64 {
            self.writer.write_u8((format << 6) | chunk_stream_id as u8)?;
        } else if chunk_stream_id < 320 {
            self.writer.write_u8(format << 6)?;
            self.writer.write_u8((chunk_stream_id - 64) as u8)?;
        } else {
            self.writer.write_u8((format << 6) | 0b0000_0001)?;
            let id = chunk_stream_id - 64;
            self.writer.write_u8((id & 0xff) as u8)?;
            self.writer.write_u8((id >> 8) as u8)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_chunk(
        &mut self,
        chunk_stream_id: u32,
        timestamp: u32,
        msg_type_id: u8,
        msg_stream_id: u32,
        payload: &BytesMut,
    ) -> Result<(), PackError> {
        let extended_timestamp = timestamp >= 0xFF_FFFF;
        let header_timestamp = if extended_timestamp { 0xFF_FFFF } else { timestamp };

        self.write_basic_header(0, chunk_stream_id)?;
        self.writer.write_u24::<BigEndian>(header_timestamp)?;
        self.writer.write_u24::<BigEndian>(payload.len() as u32)?;
        self.writer.write_u8(msg_type_id)?;
        self.writer
            .write_u32::<byteorder::LittleEndian>(msg_stream_id)?;
        if extended_timestamp {
            self.writer.write_u32::<BigEndian>(timestamp)?;
        }

        let mut remaining = &payload[..];
        let mut first = true;
        while !remaining.is_empty() || first {
            let take = remaining.len().min(self.max_chunk_size);
            let (chunk, rest) = remaining.split_at(take);
            if !first {
                self.write_basic_header(3, chunk_stream_id)?;
                if extended_timestamp {
                    self.writer.write_u32::<BigEndian>(timestamp)?;
                }
            }
            self.writer.write(chunk)?;
            remaining = rest;
            first = false;
            if remaining.is_empty() {
                break;
            }
        }

        Ok(())
    }

    /// Writes a protocol control message (spec §5.4), always on chunk stream
    /// 2 with message stream id 0, never split across chunks.
    pub fn write_control_message(
        &mut self,
        msg_type_id: u8,
        payload: &BytesMut,
    ) -> Result<(), PackError> {
        self.write_chunk(CONTROL_CHUNK_STREAM_ID, 0, msg_type_id, 0, payload)
    }

    #[must_use]
    pub fn extract_current_bytes(&mut self) -> BytesMut {
        self.writer.extract_current_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_chunk_splits_on_max_chunk_size() {
        let mut packetizer = ChunkPacketizer::new();
        packetizer.update_max_chunk_size(4);
        let payload = BytesMut::from(&[1u8, 2, 3, 4, 5, 6, 7, 8, 9][..]);
        packetizer
            .write_chunk(5, 100, 9, 1, &payload)
            .expect("pack video chunk");
        let bytes = packetizer.extract_current_bytes();
        // first byte: format 0, csid 5
        assert_eq!(bytes[0], 5);
        // a continuation basic header (format 3) must appear once the 4-byte
        // max chunk size is exceeded by the 9-byte payload.
        assert!(bytes.iter().any(|&b| b >> 6 == 3));
    }

    #[test]
    fn small_csid_uses_one_byte_basic_header() {
        let mut packetizer = ChunkPacketizer::new();
        let payload = BytesMut::from(&[0xAA][..]);
        packetizer.write_chunk(3, 0, 18, 0, &payload).unwrap();
        let bytes = packetizer.extract_current_bytes();
        assert_eq!(bytes[0] & 0b0011_1111, 3);
    }
}
