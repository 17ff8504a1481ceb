use bytes::BytesMut;

use super::errors::Mpeg4AvcHevcError;
use crate::bytesio::bytes_reader::BytesReader;
use crate::h264::avc;

/// FLV-facing wrapper around the generic H.264 AVCC/Annex-B conversion and
/// `AVCDecoderConfigurationRecord` parsing, adapted to read straight out of
/// the tag body's `BytesReader` rather than a detached `BytesMut`.
#[derive(Default)]
pub struct Mpeg4AvcProcessor {
    inner: avc::Mpeg4AvcProcessor,
}

impl Mpeg4AvcProcessor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: avc::Mpeg4AvcProcessor::new(),
        }
    }

    pub fn decoder_configuration_record_load(
        &mut self,
        reader: &mut BytesReader,
    ) -> Result<(), Mpeg4AvcHevcError> {
        let mut data = reader.extract_remaining_bytes();
        self.inner.decoder_configuration_record_load(&mut data)?;
        Ok(())
    }

    pub fn h264_mp4toannexb(&mut self, reader: &mut BytesReader) -> Result<BytesMut, Mpeg4AvcHevcError> {
        let mut data = reader.extract_remaining_bytes();
        let out = self.inner.h264_mp4toannexb(&mut data)?;
        Ok(out)
    }
}
