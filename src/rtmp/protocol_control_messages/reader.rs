use super::errors::ProtocolControlMessageReaderError;
use crate::bytesio::bytes_reader::BytesReader;
use byteorder::BigEndian;
use bytes::BytesMut;

/// Decoded protocol control messages (spec §5.4). `SetChunkSize` and
/// `WindowAckSize`/`SetPeerBandwidth` affect the session's chunking and flow
/// control state; `Abort`/`Acknowledgement` are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolControlMessage {
    SetChunkSize(u32),
    AbortMessage { chunk_stream_id: u32 },
    Acknowledgement { sequence_number: u32 },
    WindowAckSize(u32),
    SetPeerBandwidth { window_size: u32, limit_type: u8 },
}

pub struct ProtocolControlMessageReader;

impl ProtocolControlMessageReader {
    pub fn read_set_chunk_size(payload: BytesMut) -> Result<u32, ProtocolControlMessageReaderError> {
        let mut reader = BytesReader::new(payload);
        Ok(reader.read_u32::<BigEndian>()? & 0x7FFF_FFFF)
    }

    pub fn read_abort_message(payload: BytesMut) -> Result<u32, ProtocolControlMessageReaderError> {
        let mut reader = BytesReader::new(payload);
        reader.read_u32::<BigEndian>().map_err(Into::into)
    }

    pub fn read_acknowledgement(payload: BytesMut) -> Result<u32, ProtocolControlMessageReaderError> {
        let mut reader = BytesReader::new(payload);
        reader.read_u32::<BigEndian>().map_err(Into::into)
    }

    pub fn read_window_ack_size(payload: BytesMut) -> Result<u32, ProtocolControlMessageReaderError> {
        let mut reader = BytesReader::new(payload);
        reader.read_u32::<BigEndian>().map_err(Into::into)
    }

    pub fn read_set_peer_bandwidth(
        payload: BytesMut,
    ) -> Result<(u32, u8), ProtocolControlMessageReaderError> {
        let mut reader = BytesReader::new(payload);
        let window_size = reader.read_u32::<BigEndian>()?;
        let limit_type = reader.read_u8()?;
        Ok((window_size, limit_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_set_chunk_size() {
        let payload = BytesMut::from(&[0x00, 0x00, 0x10, 0x00][..]);
        assert_eq!(
            ProtocolControlMessageReader::read_set_chunk_size(payload).unwrap(),
            4096
        );
    }
}
