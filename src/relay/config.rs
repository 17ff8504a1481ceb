use std::time::Duration;

use serde::Deserialize;

use super::backoff::RetryPolicy;

fn default_max_attempts() -> usize {
    5
}

fn default_min_delay_ms() -> u64 {
    100
}

fn default_max_delay_secs() -> u64 {
    30
}

/// Per-vhost relay configuration: where to pull from when acting as an
/// edge, and which peers to push to on every local publish.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// `rtmp://host:port/app/stream` of the node this vhost edges from.
    /// `None` means this vhost never edge-pulls.
    #[serde(default)]
    pub edge_pull_upstream: Option<String>,

    /// `rtmp://host:port/app/stream` targets to forward every local publish
    /// to. Empty means this vhost never pushes out.
    #[serde(default)]
    pub forward_destinations: Vec<String>,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            edge_pull_upstream: None,
            forward_destinations: Vec::new(),
            max_attempts: default_max_attempts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.min_delay_ms),
            Duration::from_secs(self.max_delay_secs),
            self.max_attempts,
        )
    }
}

/// Splits `rtmp://host:port/app/stream[?query]` into `(addr, app,
/// stream_name)`. No query-string handling: relay targets are configured by
/// operators, not carried in from a client's URL, so there's nothing to
/// parse out of them.
#[must_use]
pub fn parse_rtmp_url(url: &str) -> Option<(String, String, String)> {
    let rest = url.strip_prefix("rtmp://")?;
    let mut parts = rest.splitn(3, '/');
    let addr = parts.next()?;
    let app = parts.next()?;
    let stream_name = parts.next()?;
    if addr.is_empty() || app.is_empty() || stream_name.is_empty() {
        return None;
    }
    Some((addr.to_string(), app.to_string(), stream_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_url() {
        let parsed = parse_rtmp_url("rtmp://edge.example.com:1935/live/room1").unwrap();
        assert_eq!(parsed, ("edge.example.com:1935".to_string(), "live".to_string(), "room1".to_string()));
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(parse_rtmp_url("edge.example.com:1935/live/room1").is_none());
    }

    #[test]
    fn rejects_missing_stream_name() {
        assert!(parse_rtmp_url("rtmp://edge.example.com:1935/live").is_none());
    }

    #[test]
    fn default_config_has_no_targets() {
        let config = RelayConfig::default();
        assert!(config.edge_pull_upstream.is_none());
        assert!(config.forward_destinations.is_empty());
        assert_eq!(config.max_attempts, 5);
    }
}
