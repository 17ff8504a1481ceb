use byteorder::{ByteOrder, BigEndian};
use bytes::{Buf, BytesMut};

use super::bytes_errors::{BytesReadError, BytesReadErrorValue};

/// Reads from a growable in-memory buffer, advancing a cursor as bytes are
/// consumed. Callers `extend_from_slice` new network bytes in, then call the
/// `read_*` methods, which error with `NotEnoughBytes` instead of blocking.
#[derive(Default)]
pub struct BytesReader {
    buffer: BytesMut,
}

impl BytesReader {
    #[must_use]
    pub fn new(data: BytesMut) -> Self {
        Self { buffer: data }
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn need(&self, n: usize) -> Result<(), BytesReadError> {
        if self.buffer.len() < n {
            return Err(BytesReadErrorValue::NotEnoughBytes.into());
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, BytesReadError> {
        self.need(1)?;
        Ok(self.buffer.get_u8())
    }

    pub fn read_u16be(&mut self) -> Result<u16, BytesReadError> {
        self.need(2)?;
        Ok(self.buffer.get_u16())
    }

    pub fn read_u24be(&mut self) -> Result<u32, BytesReadError> {
        self.need(3)?;
        let v = BigEndian::read_u24(&self.buffer[..3]);
        self.buffer.advance(3);
        Ok(v)
    }

    pub fn read_u32be(&mut self) -> Result<u32, BytesReadError> {
        self.need(4)?;
        Ok(self.buffer.get_u32())
    }

    pub fn read_u32le(&mut self) -> Result<u32, BytesReadError> {
        self.need(4)?;
        Ok(self.buffer.get_u32_le())
    }

    pub fn read_u16<T: ByteOrder>(&mut self) -> Result<u16, BytesReadError> {
        self.need(2)?;
        let v = T::read_u16(&self.buffer[..2]);
        self.buffer.advance(2);
        Ok(v)
    }

    pub fn read_u24<T: ByteOrder>(&mut self) -> Result<u32, BytesReadError> {
        self.need(3)?;
        let v = T::read_u24(&self.buffer[..3]);
        self.buffer.advance(3);
        Ok(v)
    }

    pub fn read_u32<T: ByteOrder>(&mut self) -> Result<u32, BytesReadError> {
        self.need(4)?;
        let v = T::read_u32(&self.buffer[..4]);
        self.buffer.advance(4);
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<BytesMut, BytesReadError> {
        self.need(n)?;
        Ok(self.buffer.split_to(n))
    }

    pub fn advance_by(&mut self, n: usize) -> Result<(), BytesReadError> {
        self.need(n)?;
        self.buffer.advance(n);
        Ok(())
    }

    #[must_use]
    pub fn peek_bytes(&self, n: usize) -> Option<&[u8]> {
        if self.buffer.len() < n {
            return None;
        }
        Some(&self.buffer[..n])
    }

    #[must_use]
    pub fn get_current_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn extract_remaining_bytes(&mut self) -> BytesMut {
        self.buffer.split()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let mut r = BytesReader::default();
        r.extend_from_slice(&[0x01, 0x02, 0x03, 0x00, 0x00, 0x00, 0x10]);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16be().unwrap(), 0x0203);
        assert_eq!(r.read_u32be().unwrap(), 0x10);
    }

    #[test]
    fn test_not_enough_bytes() {
        let mut r = BytesReader::default();
        r.extend_from_slice(&[0x01]);
        assert!(r.read_u32be().is_err());
    }

    #[test]
    fn test_u24be() {
        let mut r = BytesReader::default();
        r.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(r.read_u24be().unwrap(), 0x00FF_FFFF);
    }
}
