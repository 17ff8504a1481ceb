use byteorder::BigEndian;

use super::errors::{Amf0WriteError, Amf0WriteErrorValue};
use super::{amf0_markers, Amf0Value};
use crate::bytesio::bytes_writer::BytesWriter;

const MAX_NORMAL_STRING_LEN: usize = u16::MAX as usize;

/// AMF0 encoder with its own backing buffer, the way RTMP command building
/// and FLV `onMetaData` tags assemble a payload before handing it off to
/// the chunk/tag layer.
#[derive(Default)]
pub struct Amf0Writer {
    writer: BytesWriter,
}

impl Amf0Writer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writer: BytesWriter::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    #[must_use]
    pub fn get_current_bytes(&self) -> &[u8] {
        self.writer.get_current_bytes()
    }

    pub fn extract_current_bytes(&mut self) -> bytes::BytesMut {
        self.writer.extract_current_bytes()
    }

    pub fn write_any(&mut self, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        match value {
            Amf0Value::Number(n) => self.write_number(*n),
            Amf0Value::Boolean(b) => self.write_bool(*b),
            Amf0Value::Utf8String(s) => self.write_string(s),
            Amf0Value::Object(map) => self.write_object(map),
            Amf0Value::Null => {
                self.writer.write_u8(amf0_markers::NULL)?;
                Ok(())
            }
            Amf0Value::Undefined => {
                self.writer.write_u8(amf0_markers::UNDEFINED)?;
                Ok(())
            }
            Amf0Value::EcmaArray(map) => self.write_ecma_array(map),
            Amf0Value::StrictArray(values) => self.write_strict_array(values),
            Amf0Value::Date { timestamp, timezone } => self.write_date(*timestamp, *timezone),
        }
    }

    pub fn write_number(&mut self, n: f64) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::NUMBER)?;
        let bits = n.to_bits();
        self.writer.write_u32::<BigEndian>((bits >> 32) as u32)?;
        self.writer.write_u32::<BigEndian>(bits as u32)?;
        Ok(())
    }

    pub fn write_bool(&mut self, b: bool) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::BOOLEAN)?;
        self.writer.write_u8(u8::from(b))?;
        Ok(())
    }

    pub fn write_string(&mut self, s: &str) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::STRING)?;
        self.write_raw_string(s)
    }

    fn write_raw_string(&mut self, s: &str) -> Result<(), Amf0WriteError> {
        if s.len() > MAX_NORMAL_STRING_LEN {
            return Err(Amf0WriteErrorValue::NormalStringTooLong.into());
        }
        self.writer.write_u16::<BigEndian>(s.len() as u16)?;
        self.writer.write(s.as_bytes())?;
        Ok(())
    }

    pub fn write_object(&mut self, entries: &indexmap::IndexMap<String, Amf0Value>) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::OBJECT)?;
        for (key, value) in entries {
            self.write_raw_string(key)?;
            self.write_any(value)?;
        }
        self.writer.write_u16::<BigEndian>(0)?;
        self.writer.write_u8(amf0_markers::OBJECT_END)?;
        Ok(())
    }

    pub fn write_ecma_array(&mut self, entries: &indexmap::IndexMap<String, Amf0Value>) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::ECMA_ARRAY)?;
        self.writer.write_u32::<BigEndian>(entries.len() as u32)?;
        for (key, value) in entries {
            self.write_raw_string(key)?;
            self.write_any(value)?;
        }
        self.writer.write_u16::<BigEndian>(0)?;
        self.writer.write_u8(amf0_markers::OBJECT_END)?;
        Ok(())
    }

    pub fn write_strict_array(&mut self, values: &[Amf0Value]) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::STRICT_ARRAY)?;
        self.writer.write_u32::<BigEndian>(values.len() as u32)?;
        for value in values {
            self.write_any(value)?;
        }
        Ok(())
    }

    pub fn write_date(&mut self, timestamp: f64, timezone: i16) -> Result<(), Amf0WriteError> {
        self.writer.write_u8(amf0_markers::DATE)?;
        let bits = timestamp.to_bits();
        self.writer.write_u32::<BigEndian>((bits >> 32) as u32)?;
        self.writer.write_u32::<BigEndian>(bits as u32)?;
        self.writer.write_u16::<BigEndian>(timezone as u16)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytesio::bytes_reader::BytesReader;
    use crate::flv::amf0::amf0_reader::Amf0Reader;
    use bytes::BytesMut;

    #[test]
    fn test_write_read_number_roundtrip() {
        let mut writer = Amf0Writer::new();
        writer.write_number(3.5).unwrap();
        let bytes = writer.extract_current_bytes();
        let mut reader = BytesReader::new(BytesMut::from(&bytes[..]));
        let value = Amf0Reader::new().read_any(&mut reader).unwrap();
        assert_eq!(value, Amf0Value::Number(3.5));
    }

    #[test]
    fn test_write_read_string_roundtrip() {
        let mut writer = Amf0Writer::new();
        writer.write_string("hello").unwrap();
        let bytes = writer.extract_current_bytes();
        let mut reader = BytesReader::new(BytesMut::from(&bytes[..]));
        let value = Amf0Reader::new().read_any(&mut reader).unwrap();
        assert_eq!(value, Amf0Value::Utf8String("hello".to_string()));
    }

    #[test]
    fn test_set_data_frame_prefix_len() {
        let mut writer = Amf0Writer::new();
        writer.write_string("@setDataFrame").unwrap();
        assert_eq!(writer.len(), 1 + 2 + "@setDataFrame".len());
    }
}
