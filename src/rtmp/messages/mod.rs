pub mod define;
pub mod errors;

use crate::bytesio::bytes_reader::BytesReader;
use crate::flv::amf0::{amf0_reader::Amf0Reader, Amf0Value};
use crate::rtmp::protocol_control_messages::ProtocolControlMessageReader;
use crate::rtmp::user_control_messages::{EventMessageReader, UserControlEvent};
use bytes::BytesMut;
use define::msg_type_id;
use errors::MessageError;

/// One decoded RTMP message (spec §7.1), dispatched from its `msg_type_id`.
#[derive(Debug)]
pub enum RtmpMessageData {
    Audio { timestamp: u32, data: BytesMut },
    Video { timestamp: u32, data: BytesMut },
    AmfCommand { values: Vec<Amf0Value>, timestamp: u32 },
    AmfData { values: Vec<Amf0Value>, timestamp: u32 },
    SetChunkSize(u32),
    AbortMessage { chunk_stream_id: u32 },
    Acknowledgement { sequence_number: u32 },
    WindowAckSize(u32),
    SetPeerBandwidth { window_size: u32, limit_type: u8 },
    UserControl(UserControlEvent),
    Unknown { type_id: u8 },
}

pub struct MessageParser;

impl MessageParser {
    pub fn parse(msg_type_id: u8, timestamp: u32, payload: BytesMut) -> Result<RtmpMessageData, MessageError> {
        match msg_type_id {
            self::msg_type_id::AUDIO => Ok(RtmpMessageData::Audio { timestamp, data: payload }),
            self::msg_type_id::VIDEO => Ok(RtmpMessageData::Video { timestamp, data: payload }),
            self::msg_type_id::AMF0_COMMAND | self::msg_type_id::AMF3_COMMAND => {
                let mut reader = BytesReader::new(payload);
                let values = Amf0Reader::new().read_all(&mut reader)?;
                Ok(RtmpMessageData::AmfCommand { values, timestamp })
            }
            self::msg_type_id::AMF0_DATA | self::msg_type_id::AMF3_DATA => {
                let mut reader = BytesReader::new(payload);
                let values = Amf0Reader::new().read_all(&mut reader)?;
                Ok(RtmpMessageData::AmfData { values, timestamp })
            }
            self::msg_type_id::SET_CHUNK_SIZE => Ok(RtmpMessageData::SetChunkSize(
                ProtocolControlMessageReader::read_set_chunk_size(payload)?,
            )),
            self::msg_type_id::ABORT => Ok(RtmpMessageData::AbortMessage {
                chunk_stream_id: ProtocolControlMessageReader::read_abort_message(payload)?,
            }),
            self::msg_type_id::ACKNOWLEDGEMENT => Ok(RtmpMessageData::Acknowledgement {
                sequence_number: ProtocolControlMessageReader::read_acknowledgement(payload)?,
            }),
            self::msg_type_id::WIN_ACKNOWLEDGEMENT_SIZE => Ok(RtmpMessageData::WindowAckSize(
                ProtocolControlMessageReader::read_window_ack_size(payload)?,
            )),
            self::msg_type_id::SET_PEER_BANDWIDTH => {
                let (window_size, limit_type) = ProtocolControlMessageReader::read_set_peer_bandwidth(payload)?;
                Ok(RtmpMessageData::SetPeerBandwidth { window_size, limit_type })
            }
            self::msg_type_id::USER_CONTROL_EVENT => {
                Ok(RtmpMessageData::UserControl(EventMessageReader::read(payload)?))
            }
            other => Ok(RtmpMessageData::Unknown { type_id: other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_audio_passthrough() {
        let payload = BytesMut::from(&[0xAF, 0x01][..]);
        let parsed = MessageParser::parse(msg_type_id::AUDIO, 10, payload).unwrap();
        assert!(matches!(parsed, RtmpMessageData::Audio { timestamp: 10, .. }));
    }

    #[test]
    fn parses_set_chunk_size() {
        let payload = BytesMut::from(&[0x00, 0x00, 0x10, 0x00][..]);
        let parsed = MessageParser::parse(msg_type_id::SET_CHUNK_SIZE, 0, payload).unwrap();
        match parsed {
            RtmpMessageData::SetChunkSize(size) => assert_eq!(size, 4096),
            _ => panic!("expected SetChunkSize"),
        }
    }
}
