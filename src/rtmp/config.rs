use std::time::Duration;

use crate::rtmp::protocol_control_messages::limit_type;

/// Chunk size the server advertises right after `connect` (spec §5.4.1).
pub const DEFAULT_CHUNK_SIZE: u32 = 60_000;
/// TCP read/write idle timeout applied to every session's `BytesIO`
/// (spec.md §5: 30s default for RTMP control; HTTP live paths use the
/// separate 5s default in `httpflv::DEFAULT_HTTP_IDLE_TIMEOUT_SECS`).
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);
/// Window acknowledgement size advertised to publishers (spec §5.4.3).
pub const DEFAULT_WINDOW_ACK_SIZE: u32 = 2_500_000;
/// Peer bandwidth advertised to publishers (spec §5.4.5).
pub const DEFAULT_PEER_BANDWIDTH: u32 = 2_500_000;
/// Number of GOPs cached per stream for late subscribers (spec §4.D).
pub const DEFAULT_GOP_NUM: usize = 1;
/// Simultaneous TCP connection cap for a single `RtmpServer`.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1000;

/// Runtime configuration for a single RTMP chunk-stream session.
///
/// `RtmpServer`/`ServerSession::new` fill this with defaults (overridable
/// per deployment via `with_config`); nothing here is negotiated over the
/// wire beyond what `chunk_size` feeds into `SetChunkSize`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RtmpConfig {
    pub chunk_size: u32,
    pub gop_num: usize,
    pub max_connections: usize,
    pub window_ack_size: u32,
    pub peer_bandwidth: u32,
    pub peer_bandwidth_limit_type: u8,
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub write_timeout: Duration,
}

impl Default for RtmpConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            gop_num: DEFAULT_GOP_NUM,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            window_ack_size: DEFAULT_WINDOW_ACK_SIZE,
            peer_bandwidth: DEFAULT_PEER_BANDWIDTH,
            peer_bandwidth_limit_type: limit_type::DYNAMIC,
            read_timeout: DEFAULT_IO_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RtmpConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.gop_num, DEFAULT_GOP_NUM);
        assert_eq!(config.read_timeout, DEFAULT_IO_TIMEOUT);
    }

    #[test]
    fn roundtrips_through_json() {
        let config = RtmpConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RtmpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chunk_size, config.chunk_size);
    }
}
