use super::errors::EventMessagesError;
use super::event_type;
use crate::bytesio::bytes_writer::BytesWriter;
use crate::rtmp::messages::define::msg_type_id;
use byteorder::BigEndian;
use bytes::BytesMut;

/// Builds `UserControl` message payloads (the event-type 2-byte header
/// plus its event data). Returns the body; the caller sends it as
/// `msg_type_id::USER_CONTROL_EVENT` on the control chunk stream.
pub struct UserControlMessageWriter;

impl UserControlMessageWriter {
    fn with_event(event: u16, body: impl FnOnce(&mut BytesWriter) -> Result<(), EventMessagesError>) -> Result<(u8, BytesMut), EventMessagesError> {
        let mut writer = BytesWriter::new();
        writer.write_u16::<BigEndian>(event)?;
        body(&mut writer)?;
        Ok((msg_type_id::USER_CONTROL_EVENT, writer.extract_current_bytes()))
    }

    pub fn write_stream_begin(stream_id: u32) -> Result<(u8, BytesMut), EventMessagesError> {
        Self::with_event(event_type::STREAM_BEGIN, |w| {
            w.write_u32::<BigEndian>(stream_id)?;
            Ok(())
        })
    }

    pub fn write_stream_eof(stream_id: u32) -> Result<(u8, BytesMut), EventMessagesError> {
        Self::with_event(event_type::STREAM_EOF, |w| {
            w.write_u32::<BigEndian>(stream_id)?;
            Ok(())
        })
    }

    pub fn write_stream_is_recorded(stream_id: u32) -> Result<(u8, BytesMut), EventMessagesError> {
        Self::with_event(event_type::STREAM_IS_RECORDED, |w| {
            w.write_u32::<BigEndian>(stream_id)?;
            Ok(())
        })
    }

    pub fn write_set_buffer_length(stream_id: u32, buffer_ms: u32) -> Result<(u8, BytesMut), EventMessagesError> {
        Self::with_event(event_type::SET_BUFFER_LENGTH, |w| {
            w.write_u32::<BigEndian>(stream_id)?;
            w.write_u32::<BigEndian>(buffer_ms)?;
            Ok(())
        })
    }

    pub fn write_ping_response(timestamp: u32) -> Result<(u8, BytesMut), EventMessagesError> {
        Self::with_event(event_type::PING_RESPONSE, |w| {
            w.write_u32::<BigEndian>(timestamp)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_begin_encodes_event_and_stream_id() {
        let (id, body) = UserControlMessageWriter::write_stream_begin(1).unwrap();
        assert_eq!(id, msg_type_id::USER_CONTROL_EVENT);
        assert_eq!(&body[0..2], &event_type::STREAM_BEGIN.to_be_bytes());
        assert_eq!(&body[2..6], &1u32.to_be_bytes());
    }
}
