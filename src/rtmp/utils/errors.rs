#[derive(Debug, thiserror::Error)]
#[error("{value}")]
pub struct RtmpUrlParseError {
    pub value: RtmpUrlParseErrorValue,
}

#[derive(Debug, thiserror::Error)]
pub enum RtmpUrlParseErrorValue {
    #[error("The url is not valid")]
    Notvalid,
}

impl From<RtmpUrlParseErrorValue> for RtmpUrlParseError {
    fn from(value: RtmpUrlParseErrorValue) -> Self {
        Self { value }
    }
}
