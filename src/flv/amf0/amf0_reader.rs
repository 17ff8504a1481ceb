use byteorder::BigEndian;
use indexmap::IndexMap;

use super::errors::{Amf0ReadError, Amf0ReadErrorValue};
use super::{amf0_markers, Amf0Value};
use crate::bytesio::bytes_reader::BytesReader;

/// Stateless AMF0 decoder. Each call takes the `BytesReader` it should
/// consume from, mirroring how RTMP command messages and FLV script tags
/// are decoded straight out of the message/tag body buffer.
#[derive(Default)]
pub struct Amf0Reader;

impl Amf0Reader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub fn read_all(&self, reader: &mut BytesReader) -> Result<Vec<Amf0Value>, Amf0ReadError> {
        let mut values = Vec::new();
        while !reader.is_empty() {
            values.push(self.read_any(reader)?);
        }
        Ok(values)
    }

    pub fn read_any(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let marker = reader.read_u8()?;
        match marker {
            amf0_markers::NUMBER => self.read_number(reader),
            amf0_markers::BOOLEAN => self.read_bool(reader),
            amf0_markers::STRING => Ok(Amf0Value::Utf8String(self.read_raw_string(reader)?)),
            amf0_markers::OBJECT => self.read_object(reader),
            amf0_markers::NULL => Ok(Amf0Value::Null),
            amf0_markers::UNDEFINED => Ok(Amf0Value::Undefined),
            amf0_markers::ECMA_ARRAY => self.read_ecma_array(reader),
            amf0_markers::STRICT_ARRAY => self.read_strict_array(reader),
            amf0_markers::DATE => self.read_date(reader),
            amf0_markers::LONG_STRING => Ok(Amf0Value::Utf8String(self.read_long_string(reader)?)),
            _ => Err(Amf0ReadErrorValue::UnknownMarker { marker }.into()),
        }
    }

    fn read_number(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let hi = u64::from(reader.read_u32::<BigEndian>()?);
        let lo = u64::from(reader.read_u32::<BigEndian>()?);
        Ok(Amf0Value::Number(f64::from_bits((hi << 32) | lo)))
    }

    fn read_bool(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        Ok(Amf0Value::Boolean(reader.read_u8()? != 0))
    }

    fn read_raw_string(&self, reader: &mut BytesReader) -> Result<String, Amf0ReadError> {
        let len = reader.read_u16::<BigEndian>()? as usize;
        let bytes = reader.read_bytes(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn read_long_string(&self, reader: &mut BytesReader) -> Result<String, Amf0ReadError> {
        let len = reader.read_u32::<BigEndian>()? as usize;
        let bytes = reader.read_bytes(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn read_object(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let mut map = IndexMap::new();
        loop {
            let key = self.read_raw_string(reader)?;
            let marker = reader
                .peek_bytes(1)
                .map(|b| b[0])
                .ok_or(Amf0ReadErrorValue::WrongType)?;
            if key.is_empty() && marker == amf0_markers::OBJECT_END {
                reader.read_u8()?;
                break;
            }
            map.insert(key, self.read_any(reader)?);
        }
        Ok(Amf0Value::Object(map))
    }

    fn read_ecma_array(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let _count = reader.read_u32::<BigEndian>()?;
        let mut map = IndexMap::new();
        loop {
            let key = self.read_raw_string(reader)?;
            let marker = reader
                .peek_bytes(1)
                .map(|b| b[0])
                .ok_or(Amf0ReadErrorValue::WrongType)?;
            if key.is_empty() && marker == amf0_markers::OBJECT_END {
                reader.read_u8()?;
                break;
            }
            map.insert(key, self.read_any(reader)?);
        }
        Ok(Amf0Value::EcmaArray(map))
    }

    fn read_strict_array(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let count = reader.read_u32::<BigEndian>()?;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(self.read_any(reader)?);
        }
        Ok(Amf0Value::StrictArray(values))
    }

    fn read_date(&self, reader: &mut BytesReader) -> Result<Amf0Value, Amf0ReadError> {
        let hi = u64::from(reader.read_u32::<BigEndian>()?);
        let lo = u64::from(reader.read_u32::<BigEndian>()?);
        let timestamp = f64::from_bits((hi << 32) | lo);
        let timezone = reader.read_u16::<BigEndian>()? as i16;
        Ok(Amf0Value::Date { timestamp, timezone })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_read_number() {
        let mut data = BytesMut::new();
        data.extend_from_slice(&[amf0_markers::NUMBER]);
        data.extend_from_slice(&3.0_f64.to_bits().to_be_bytes());
        let mut reader = BytesReader::new(data);
        let value = Amf0Reader::new().read_any(&mut reader).unwrap();
        assert_eq!(value, Amf0Value::Number(3.0));
    }

    #[test]
    fn test_read_string() {
        let mut data = BytesMut::new();
        data.extend_from_slice(&[amf0_markers::STRING, 0x00, 0x04]);
        data.extend_from_slice(b"test");
        let mut reader = BytesReader::new(data);
        let value = Amf0Reader::new().read_any(&mut reader).unwrap();
        assert_eq!(value, Amf0Value::Utf8String("test".to_string()));
    }

    #[test]
    fn test_read_object() {
        let mut data = BytesMut::new();
        data.extend_from_slice(&[amf0_markers::OBJECT]);
        data.extend_from_slice(&[0x00, 0x02]);
        data.extend_from_slice(b"ok");
        data.extend_from_slice(&[amf0_markers::BOOLEAN, 0x01]);
        data.extend_from_slice(&[0x00, 0x00, amf0_markers::OBJECT_END]);
        let mut reader = BytesReader::new(data);
        let value = Amf0Reader::new().read_any(&mut reader).unwrap();
        match value {
            Amf0Value::Object(map) => {
                assert_eq!(map.get("ok"), Some(&Amf0Value::Boolean(true)));
            }
            _ => panic!("expected object"),
        }
    }
}
