use super::errors::ControlMessagesError;
use crate::bytesio::bytes_writer::BytesWriter;
use crate::rtmp::messages::define::msg_type_id;
use byteorder::BigEndian;
use bytes::BytesMut;

/// Builds protocol control message payloads (spec §5.4). Returns raw
/// message bodies plus the `msg_type_id` they should be sent as; the caller
/// packetizes them onto the control chunk stream.
pub struct ProtocolControlMessagesWriter;

impl ProtocolControlMessagesWriter {
    pub fn write_set_chunk_size(chunk_size: u32) -> Result<(u8, BytesMut), ControlMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u32::<BigEndian>(chunk_size & 0x7FFF_FFFF)?;
        Ok((msg_type_id::SET_CHUNK_SIZE, writer.extract_current_bytes()))
    }

    pub fn write_abort_message(chunk_stream_id: u32) -> Result<(u8, BytesMut), ControlMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u32::<BigEndian>(chunk_stream_id)?;
        Ok((msg_type_id::ABORT, writer.extract_current_bytes()))
    }

    pub fn write_acknowledgement(sequence_number: u32) -> Result<(u8, BytesMut), ControlMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u32::<BigEndian>(sequence_number)?;
        Ok((msg_type_id::ACKNOWLEDGEMENT, writer.extract_current_bytes()))
    }

    pub fn write_window_ack_size(window_size: u32) -> Result<(u8, BytesMut), ControlMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u32::<BigEndian>(window_size)?;
        Ok((msg_type_id::WIN_ACKNOWLEDGEMENT_SIZE, writer.extract_current_bytes()))
    }

    pub fn write_set_peer_bandwidth(
        window_size: u32,
        limit_type: u8,
    ) -> Result<(u8, BytesMut), ControlMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u32::<BigEndian>(window_size)?;
        writer.write_u8(limit_type)?;
        Ok((msg_type_id::SET_PEER_BANDWIDTH, writer.extract_current_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_chunk_size_is_four_bytes() {
        let (id, body) = ProtocolControlMessagesWriter::write_set_chunk_size(4096).unwrap();
        assert_eq!(id, msg_type_id::SET_CHUNK_SIZE);
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn set_peer_bandwidth_is_five_bytes() {
        let (id, body) =
            ProtocolControlMessagesWriter::write_set_peer_bandwidth(2_500_000, super::limit_type::DYNAMIC)
                .unwrap();
        assert_eq!(id, msg_type_id::SET_PEER_BANDWIDTH);
        assert_eq!(body.len(), 5);
    }
}
