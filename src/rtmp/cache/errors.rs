use crate::bytesio::bytes_errors::BytesReadError;
use crate::flv::amf0::errors::Amf0WriteError;
use crate::flv::errors::{FlvDemuxerError, Mpeg4AvcHevcError, MpegAacError};
use crate::h264::errors::H264Error;
use crate::rtmp::chunk::errors::PackError;

#[derive(Debug, thiserror::Error)]
pub enum CacheErrorValue {
    #[error("cache tag parse error")]
    DemuxerError(#[source] FlvDemuxerError),
    #[error("mpeg aac error")]
    MpegAacError(#[source] MpegAacError),
    #[error("mpeg avc error")]
    MpegAvcError(#[source] Mpeg4AvcHevcError),
    #[error("pack error")]
    PackError(#[source] PackError),
    #[error("read bytes error")]
    BytesReadError(#[source] BytesReadError),
    #[error("h264 error")]
    H264Error(#[source] H264Error),
}

#[derive(Debug, thiserror::Error)]
#[error("{value}")]
pub struct CacheError {
    pub value: CacheErrorValue,
}

impl From<FlvDemuxerError> for CacheError {
    fn from(error: FlvDemuxerError) -> Self {
        Self {
            value: CacheErrorValue::DemuxerError(error),
        }
    }
}

impl From<H264Error> for CacheError {
    fn from(error: H264Error) -> Self {
        Self {
            value: CacheErrorValue::H264Error(error),
        }
    }
}

impl From<MpegAacError> for CacheError {
    fn from(error: MpegAacError) -> Self {
        Self {
            value: CacheErrorValue::MpegAacError(error),
        }
    }
}

impl From<Mpeg4AvcHevcError> for CacheError {
    fn from(error: Mpeg4AvcHevcError) -> Self {
        Self {
            value: CacheErrorValue::MpegAvcError(error),
        }
    }
}

impl From<BytesReadError> for CacheError {
    fn from(error: BytesReadError) -> Self {
        Self {
            value: CacheErrorValue::BytesReadError(error),
        }
    }
}

impl From<PackError> for CacheError {
    fn from(error: PackError) -> Self {
        Self {
            value: CacheErrorValue::PackError(error),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataErrorValue {
    #[error("metadata tag parse error")]
    DemuxerError(#[source] FlvDemuxerError),
    #[error("pack error")]
    PackError(#[source] PackError),
    #[error("amf write error")]
    Amf0WriteError(#[source] Amf0WriteError),
}

#[derive(Debug, thiserror::Error)]
#[error("{value}")]
pub struct MetadataError {
    pub value: MetadataErrorValue,
}

impl From<Amf0WriteError> for MetadataError {
    fn from(error: Amf0WriteError) -> Self {
        Self {
            value: MetadataErrorValue::Amf0WriteError(error),
        }
    }
}

impl From<FlvDemuxerError> for MetadataError {
    fn from(error: FlvDemuxerError) -> Self {
        Self {
            value: MetadataErrorValue::DemuxerError(error),
        }
    }
}

impl From<PackError> for MetadataError {
    fn from(error: PackError) -> Self {
        Self {
            value: MetadataErrorValue::PackError(error),
        }
    }
}
