use std::fmt;

/// Reserved vhost used whenever a client's URL carries no explicit vhost.
pub const DEFAULT_VHOST: &str = "__defaultVhost__";

/// Identifies a single live stream within the hub: the `(vhost, app,
/// stream)` triple. RTMP's app/stream-name pair (scoped by vhost) is the
/// only scheme in use today; kept as an enum so other ingest protocols can
/// be added without changing every call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamIdentifier {
    Rtmp {
        vhost: String,
        app_name: String,
        stream_name: String,
    },
}

impl StreamIdentifier {
    /// Builds an identifier on the reserved default vhost.
    #[must_use]
    pub fn rtmp(app_name: impl Into<String>, stream_name: impl Into<String>) -> Self {
        Self::Rtmp {
            vhost: DEFAULT_VHOST.to_string(),
            app_name: app_name.into(),
            stream_name: stream_name.into(),
        }
    }

    #[must_use]
    pub fn rtmp_with_vhost(
        vhost: impl Into<String>,
        app_name: impl Into<String>,
        stream_name: impl Into<String>,
    ) -> Self {
        let vhost = vhost.into();
        let vhost = if vhost.is_empty() { DEFAULT_VHOST.to_string() } else { vhost };
        Self::Rtmp {
            vhost,
            app_name: app_name.into(),
            stream_name: stream_name.into(),
        }
    }

    #[must_use]
    pub fn vhost(&self) -> &str {
        match self {
            Self::Rtmp { vhost, .. } => vhost,
        }
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        match self {
            Self::Rtmp { app_name, .. } => app_name,
        }
    }

    #[must_use]
    pub fn stream_name(&self) -> &str {
        match self {
            Self::Rtmp { stream_name, .. } => stream_name,
        }
    }
}

impl fmt::Display for StreamIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtmp { vhost, app_name, stream_name } => {
                write!(f, "{vhost}/{app_name}/{stream_name}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = StreamIdentifier::rtmp("live", "test");
        assert_eq!(id.to_string(), "__defaultVhost__/live/test");
    }

    #[test]
    fn empty_vhost_falls_back_to_default() {
        let id = StreamIdentifier::rtmp_with_vhost("", "live", "test");
        assert_eq!(id.vhost(), DEFAULT_VHOST);
    }
}
