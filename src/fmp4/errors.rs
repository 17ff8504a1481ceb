use crate::bytesio::bytes_errors::BytesWriteError;

#[derive(Debug, thiserror::Error)]
pub enum Fmp4ErrorValue {
    #[error("bytes write error")]
    BytesWriteError(#[source] BytesWriteError),
    #[error("no video sequence header seen yet")]
    MissingVideoSequenceHeader,
    #[error("no audio sequence header seen yet")]
    MissingAudioSequenceHeader,
    #[error("unsupported track combination: at least one of audio/video must be present")]
    EmptyInitSegment,
}

#[derive(Debug, thiserror::Error)]
#[error("{value}")]
pub struct Fmp4Error {
    pub value: Fmp4ErrorValue,
}

impl From<BytesWriteError> for Fmp4Error {
    fn from(error: BytesWriteError) -> Self {
        Self {
            value: Fmp4ErrorValue::BytesWriteError(error),
        }
    }
}

impl From<Fmp4ErrorValue> for Fmp4Error {
    fn from(value: Fmp4ErrorValue) -> Self {
        Self { value }
    }
}
