use byteorder::{ByteOrder, WriteBytesExt};
use bytes::BytesMut;
use std::io::Write;

use super::bytes_errors::BytesWriteError;

/// Growable write buffer. `write_u*` methods panic-free append to an internal
/// `Vec`-backed writer; `extract_current_bytes` drains it for sending or
/// further framing (e.g. prefixing a length after the fact).
#[derive(Default)]
pub struct BytesWriter {
    buffer: Vec<u8>,
}

impl BytesWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), BytesWriteError> {
        self.buffer.write_all(data)?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), BytesWriteError> {
        self.buffer.write_u8(v)?;
        Ok(())
    }

    pub fn write_u16<T: ByteOrder>(&mut self, v: u16) -> Result<(), BytesWriteError> {
        self.buffer.write_u16::<T>(v)?;
        Ok(())
    }

    pub fn write_u24<T: ByteOrder>(&mut self, v: u32) -> Result<(), BytesWriteError> {
        self.buffer.write_u24::<T>(v)?;
        Ok(())
    }

    pub fn write_u32<T: ByteOrder>(&mut self, v: u32) -> Result<(), BytesWriteError> {
        self.buffer.write_u32::<T>(v)?;
        Ok(())
    }

    #[must_use]
    pub fn get_current_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn extract_current_bytes(&mut self) -> BytesMut {
        BytesMut::from(std::mem::take(&mut self.buffer).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::BigEndian;

    #[test]
    fn test_write_roundtrip() {
        let mut w = BytesWriter::new();
        w.write_u8(1).unwrap();
        w.write_u16::<BigEndian>(0x0203).unwrap();
        w.write_u24::<BigEndian>(0x0405_06).unwrap();
        let data = w.extract_current_bytes();
        assert_eq!(&data[..], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert!(w.is_empty());
    }
}
