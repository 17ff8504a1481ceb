use crate::bytesio::bytes_errors::BytesReadError;
use crate::bytesio::bytes_errors::BytesWriteError;
use serde_json::error::Error as SerdeJsonError;
use tokio::sync::oneshot::error::RecvError;

#[derive(Debug, thiserror::Error)]
pub enum StreamHubErrorValue {
    #[error("no app name")]
    NoAppName,
    #[error("no stream name")]
    NoStreamName,
    #[error("no app or stream name")]
    NoAppOrStreamName,
    #[error("exists")]
    Exists,
    #[error("send error")]
    SendError,
    #[error("send video error")]
    SendVideoError,
    #[error("send audio error")]
    SendAudioError,
    #[error("bytes read error")]
    BytesReadError(#[source] BytesReadError),
    #[error("bytes write error")]
    BytesWriteError(#[source] BytesWriteError),
    #[error("not correct data sender type")]
    NotCorrectDataSenderType,
    #[error("subscriber channel closed")]
    SubscriberClosed,
    #[error("Tokio oneshot recv error")]
    RecvError(#[source] RecvError),
    #[error("Serde json error")]
    SerdeError(#[source] SerdeJsonError),
    #[error("client session error: {0}")]
    ClientSessionError(String),
}

#[derive(Debug, thiserror::Error)]
#[error("{value}")]
pub struct StreamHubError {
    pub value: StreamHubErrorValue,
}

impl From<StreamHubErrorValue> for StreamHubError {
    fn from(value: StreamHubErrorValue) -> Self {
        Self { value }
    }
}

impl From<BytesReadError> for StreamHubError {
    fn from(error: BytesReadError) -> Self {
        Self {
            value: StreamHubErrorValue::BytesReadError(error),
        }
    }
}

impl From<BytesWriteError> for StreamHubError {
    fn from(error: BytesWriteError) -> Self {
        Self {
            value: StreamHubErrorValue::BytesWriteError(error),
        }
    }
}

impl From<RecvError> for StreamHubError {
    fn from(error: RecvError) -> Self {
        Self {
            value: StreamHubErrorValue::RecvError(error),
        }
    }
}

impl From<SerdeJsonError> for StreamHubError {
    fn from(error: SerdeJsonError) -> Self {
        Self {
            value: StreamHubErrorValue::SerdeError(error),
        }
    }
}

impl From<String> for StreamHubError {
    fn from(error: String) -> Self {
        Self {
            value: StreamHubErrorValue::ClientSessionError(error),
        }
    }
}
