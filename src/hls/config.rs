use serde::{Deserialize, Serialize};

/// What the remuxer does when it hits a segment write/mux error mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HlsOnError {
    /// Drop the failed segment and keep going.
    Ignore,
    /// Tear down the stream handler; the publisher must republish.
    Disconnect,
    /// Keep the playlist open across the error, retrying on the next segment.
    Continue,
}

impl Default for HlsOnError {
    fn default() -> Self {
        Self::Continue
    }
}

/// Tunables for HLS segmenting (spec §4.E), previously hardcoded in
/// `StreamProcessor`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HlsConfig {
    /// Target segment duration in milliseconds.
    pub fragment_ms: i64,
    /// Number of segments kept in the live playlist window.
    pub window_size: usize,
    /// How long a segment file is retained in storage after it leaves the
    /// playlist window, independent of `window_size` itself.
    pub keep_after_expire_secs: u64,
    pub hls_on_error: HlsOnError,
    /// Emit `#EXT-X-DISCONTINUITY` when a sequence header's bytes change
    /// (codec/profile switch) mid-stream.
    pub discontinuity_on_codec_change: bool,
    /// How long to wait for a video sequence header before falling back to
    /// audio-only segmenting (cutting on accumulated AAC duration instead
    /// of keyframes).
    pub audio_only_grace_ms: i64,
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self {
            fragment_ms: 10_000,
            window_size: 6,
            keep_after_expire_secs: 60,
            hls_on_error: HlsOnError::default(),
            discontinuity_on_codec_change: true,
            audio_only_grace_ms: 5_000,
        }
    }
}
