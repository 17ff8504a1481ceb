use super::errors::{EventMessagesError, EventMessagesErrorValue};
use super::event_type;
use crate::bytesio::bytes_reader::BytesReader;
use byteorder::BigEndian;
use bytes::BytesMut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserControlEvent {
    StreamBegin { stream_id: u32 },
    StreamEof { stream_id: u32 },
    StreamDry { stream_id: u32 },
    SetBufferLength { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded { stream_id: u32 },
    PingRequest { timestamp: u32 },
    PingResponse { timestamp: u32 },
}

pub struct EventMessageReader;

impl EventMessageReader {
    pub fn read(payload: BytesMut) -> Result<UserControlEvent, EventMessagesError> {
        let mut reader = BytesReader::new(payload);
        let event = reader.read_u16::<BigEndian>()?;
        match event {
            event_type::STREAM_BEGIN => Ok(UserControlEvent::StreamBegin {
                stream_id: reader.read_u32::<BigEndian>()?,
            }),
            event_type::STREAM_EOF => Ok(UserControlEvent::StreamEof {
                stream_id: reader.read_u32::<BigEndian>()?,
            }),
            event_type::STREAM_DRY => Ok(UserControlEvent::StreamDry {
                stream_id: reader.read_u32::<BigEndian>()?,
            }),
            event_type::SET_BUFFER_LENGTH => Ok(UserControlEvent::SetBufferLength {
                stream_id: reader.read_u32::<BigEndian>()?,
                buffer_ms: reader.read_u32::<BigEndian>()?,
            }),
            event_type::STREAM_IS_RECORDED => Ok(UserControlEvent::StreamIsRecorded {
                stream_id: reader.read_u32::<BigEndian>()?,
            }),
            event_type::PING_REQUEST => Ok(UserControlEvent::PingRequest {
                timestamp: reader.read_u32::<BigEndian>()?,
            }),
            event_type::PING_RESPONSE => Ok(UserControlEvent::PingResponse {
                timestamp: reader.read_u32::<BigEndian>()?,
            }),
            _ => Err(EventMessagesErrorValue::UnknowEventMessageType.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ping_request() {
        let mut payload = BytesMut::new();
        payload.extend_from_slice(&event_type::PING_REQUEST.to_be_bytes());
        payload.extend_from_slice(&42u32.to_be_bytes());
        assert_eq!(
            EventMessageReader::read(payload).unwrap(),
            UserControlEvent::PingRequest { timestamp: 42 }
        );
    }
}
