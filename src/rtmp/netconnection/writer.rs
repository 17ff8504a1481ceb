use super::errors::NetConnectionError;
use crate::flv::amf0::amf0_writer::Amf0Writer;
use crate::flv::amf0::Amf0Value;
use crate::rtmp::messages::define::msg_type_id;
use bytes::BytesMut;
use indexmap::IndexMap;

/// Builds `NetConnection` command replies (spec §7.2): `connect`'s
/// `_result`/`_error`, sent as AMF0 command messages on the control chunk
/// stream.
pub struct NetConnectionWriter;

impl NetConnectionWriter {
    pub fn write_connect_success(
        transaction_id: f64,
        object_encoding: f64,
    ) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut properties = IndexMap::new();
        properties.insert("fmsVer".to_string(), Amf0Value::Utf8String("FMS/3,0,1,123".to_string()));
        properties.insert("capabilities".to_string(), Amf0Value::Number(31.0));

        let mut information = IndexMap::new();
        information.insert("level".to_string(), Amf0Value::Utf8String("status".to_string()));
        information.insert(
            "code".to_string(),
            Amf0Value::Utf8String("NetConnection.Connect.Success".to_string()),
        );
        information.insert(
            "description".to_string(),
            Amf0Value::Utf8String("Connection succeeded.".to_string()),
        );
        information.insert("objectEncoding".to_string(), Amf0Value::Number(object_encoding));

        let mut writer = Amf0Writer::new();
        writer.write_string("_result")?;
        writer.write_number(transaction_id)?;
        writer.write_object(&properties)?;
        writer.write_object(&information)?;

        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    pub fn write_connect_error(
        transaction_id: f64,
        code: &str,
        description: &str,
    ) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut information = IndexMap::new();
        information.insert("level".to_string(), Amf0Value::Utf8String("error".to_string()));
        information.insert("code".to_string(), Amf0Value::Utf8String(code.to_string()));
        information.insert(
            "description".to_string(),
            Amf0Value::Utf8String(description.to_string()),
        );

        let mut writer = Amf0Writer::new();
        writer.write_string("_error")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        writer.write_object(&information)?;

        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// `onBWDone`, sent after `connect` to let the client measure bandwidth.
    pub fn write_on_bw_done(transaction_id: f64) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut writer = Amf0Writer::new();
        writer.write_string("onBWDone")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// `_result` reply to `createStream`, carrying the newly assigned
    /// message stream id.
    pub fn write_create_stream_success(
        transaction_id: f64,
        stream_id: f64,
    ) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut writer = Amf0Writer::new();
        writer.write_string("_result")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        writer.write_number(stream_id)?;
        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// Client-side `connect` request, issued by `relay`'s outbound sessions
    /// against an upstream RTMP server.
    pub fn write_connect(
        transaction_id: f64,
        app: &str,
        tc_url: &str,
    ) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut command_object = IndexMap::new();
        command_object.insert("app".to_string(), Amf0Value::Utf8String(app.to_string()));
        command_object.insert("type".to_string(), Amf0Value::Utf8String("nonprivate".to_string()));
        command_object.insert("flashVer".to_string(), Amf0Value::Utf8String("FMLE/3.0".to_string()));
        command_object.insert("tcUrl".to_string(), Amf0Value::Utf8String(tc_url.to_string()));

        let mut writer = Amf0Writer::new();
        writer.write_string("connect")?;
        writer.write_number(transaction_id)?;
        writer.write_object(&command_object)?;

        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }

    /// Client-side `createStream` request.
    pub fn write_create_stream(transaction_id: f64) -> Result<(u8, BytesMut), NetConnectionError> {
        let mut writer = Amf0Writer::new();
        writer.write_string("createStream")?;
        writer.write_number(transaction_id)?;
        writer.write_any(&Amf0Value::Null)?;
        Ok((msg_type_id::AMF0_COMMAND, writer.extract_current_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_success_is_amf0_command() {
        let (id, body) = NetConnectionWriter::write_connect_success(1.0, 0.0).unwrap();
        assert_eq!(id, msg_type_id::AMF0_COMMAND);
        assert!(!body.is_empty());
    }
}
