use super::errors::NetStreamError;
use crate::flv::amf0::amf0_writer::Amf0Writer;
use crate::flv::amf0::Amf0Value;
use crate::rtmp::messages::define::msg_type_id;
use bytes::BytesMut;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Status,
    Error,
    Warning,
}

impl StatusLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Builds `onStatus` command messages for `NetStream` events (spec §7.2.4).
pub struct NetStreamWriter;

impl NetStreamWriter {
    pub fn write_on_status(
        level: StatusLevel,
        code: &str,
        description: &str,
    ) -> Result<(u8, BytesMut), NetStreamError> {
        let mut info = IndexMap::new();
        info.insert("level".to_string(), Amf0Value::Utf8String(level.as_str().to_string()));
        info.insert("code".to_string(), Amf0Value::Utf8String(code.to_string()));
        info.insert(
            "description".to_string(),
            Amf0Value::Utf8String(description.to_string()),
        );

        let mut writer = Amf0Writer::new();
        writer.write_string("onStatus")?;
        writer.write_number(0.0)?;
        writer.write_any(&Amf0Value::Null)?;
        writer.write_object(&info)?;

        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// Client-side `publish` request, sent by `relay::push::Forwarder`
    /// against a peer it's pushing a local stream to.
    pub fn write_publish(transaction_id: f64, stream_name: &str) -> Result<(u8, BytesMut), NetStreamError> {
        let mut writer = Amf0Writer::new();
        writer.write_string("publish")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        writer.write_string(stream_name)?;
        writer.write_string("live")?;
        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// Client-side `play` request, sent by `relay::pull::EdgePuller` against
    /// the configured upstream.
    pub fn write_play(transaction_id: f64, stream_name: &str) -> Result<(u8, BytesMut), NetStreamError> {
        let mut writer = Amf0Writer::new();
        writer.write_string("play")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        writer.write_string(stream_name)?;
        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_status_is_amf0_command() {
        let (id, body) =
            NetStreamWriter::write_on_status(StatusLevel::Status, super::code::PLAY_START, "ok").unwrap();
        assert_eq!(id, msg_type_id::AMF0_COMMAND);
        assert!(!body.is_empty());
    }
}
