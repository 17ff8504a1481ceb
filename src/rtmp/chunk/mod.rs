pub mod define;
pub mod errors;
pub mod packetizer;
pub mod unpacketizer;

use bytes::BytesMut;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChunkBasicHeader {
    pub format: u8,
    pub chunk_stream_id: u32,
}

impl ChunkBasicHeader {
    #[must_use]
    pub const fn new(format: u8, chunk_stream_id: u32) -> Self {
        Self {
            format,
            chunk_stream_id,
        }
    }
}

impl Default for ChunkBasicHeader {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Whether, and in what form, an extended timestamp field follows the
/// message header (RTMP spec §5.3.1.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum ExtendTimestampType {
    #[default]
    NONE,
    /// Type 0 chunk: the field carries an absolute timestamp.
    FORMAT0,
    /// Type 1/2 chunk (or a type 3 inheriting from one): the field carries
    /// a timestamp delta.
    FORMAT12,
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ChunkMessageHeader {
    pub timestamp: u32,
    pub timestamp_delta: u32,
    pub msg_length: u32,
    pub msg_type_id: u8,
    pub msg_streamd_id: u32,
    pub extended_timestamp_type: ExtendTimestampType,
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ChunkInfo {
    pub basic_header: ChunkBasicHeader,
    pub message_header: ChunkMessageHeader,
    pub payload: BytesMut,
}

impl ChunkInfo {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        format: u8,
        chunk_stream_id: u32,
        timestamp: u32,
        msg_length: u32,
        msg_type_id: u8,
        msg_streamd_id: u32,
        payload: BytesMut,
    ) -> Self {
        Self {
            basic_header: ChunkBasicHeader::new(format, chunk_stream_id),
            message_header: ChunkMessageHeader {
                timestamp,
                timestamp_delta: 0,
                msg_length,
                msg_type_id,
                msg_streamd_id,
                extended_timestamp_type: ExtendTimestampType::NONE,
            },
            payload,
        }
    }
}
