#[derive(Debug, thiserror::Error)]
pub enum DashRemuxerError {
    #[error("StreamHub event send error")]
    StreamHubEventSendError,

    #[error("Subscribe error")]
    SubscribeError,

    #[error("No frame receiver")]
    NoFrameReceiver,

    #[error("Demux error: {0}")]
    DemuxError(String),

    #[error("fMP4 mux error: {0}")]
    MuxError(#[from] crate::fmp4::errors::Fmp4Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Receive error: {0}")]
    ReceiveError(#[from] tokio::sync::broadcast::error::RecvError),
}

impl From<crate::streamhub::errors::StreamHubError> for DashRemuxerError {
    fn from(_: crate::streamhub::errors::StreamHubError) -> Self {
        Self::SubscribeError
    }
}
