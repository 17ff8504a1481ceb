use crate::rtmp::session::errors::SessionError;
use crate::streamhub::errors::StreamHubError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("rtmp session error: {0}")]
    Session(#[from] SessionError),
    #[error("stream hub error: {0}")]
    StreamHub(#[from] StreamHubError),
    #[error("stream hub channel closed")]
    ChannelClosed,
    #[error("upstream closed before any frame arrived")]
    EmptyStream,
    #[error("invalid relay target url: {0}")]
    InvalidUrl(String),
    #[error("retry attempts exhausted, last error: {0}")]
    Exhausted(String),
}
