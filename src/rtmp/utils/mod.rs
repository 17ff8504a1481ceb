pub mod errors;

use errors::{RtmpUrlParseError, RtmpUrlParseErrorValue};
use std::collections::HashMap;

/// A parsed RTMP publish/play URL: `rtmp://host[:port]/app[/...]/stream[?k=v&...]`.
/// `app_name` is everything between the host and the final path segment;
/// `stream_name` is that final segment, with any query string split off
/// into `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpUrl {
    pub app_name: String,
    pub stream_name: String,
    pub params: HashMap<String, String>,
}

pub fn parse_rtmp_url(url: &str) -> Result<RtmpUrl, RtmpUrlParseError> {
    let without_scheme = url
        .strip_prefix("rtmp://")
        .ok_or(RtmpUrlParseErrorValue::Notvalid)?;

    let path_start = without_scheme.find('/').ok_or(RtmpUrlParseErrorValue::Notvalid)?;
    let path = &without_scheme[path_start + 1..];
    if path.is_empty() {
        return Err(RtmpUrlParseErrorValue::Notvalid.into());
    }

    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(RtmpUrlParseErrorValue::Notvalid.into());
    }
    let stream_name = segments.pop().unwrap().to_string();
    if segments.is_empty() {
        return Err(RtmpUrlParseErrorValue::Notvalid.into());
    }
    let app_name = segments.join("/");

    let mut params = HashMap::new();
    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some((k, v)) = pair.split_once('=') {
                params.insert(k.to_string(), v.to_string());
            } else if !pair.is_empty() {
                params.insert(pair.to_string(), String::new());
            }
        }
    }

    Ok(RtmpUrl {
        app_name,
        stream_name,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_url() {
        let parsed = parse_rtmp_url("rtmp://localhost:1935/live/stream1").unwrap();
        assert_eq!(parsed.app_name, "live");
        assert_eq!(parsed.stream_name, "stream1");
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn parses_query_params() {
        let parsed = parse_rtmp_url("rtmp://localhost/live/room123?token=abc&x=1").unwrap();
        assert_eq!(parsed.stream_name, "room123");
        assert_eq!(parsed.params.get("token"), Some(&"abc".to_string()));
        assert_eq!(parsed.params.get("x"), Some(&"1".to_string()));
    }

    #[test]
    fn rejects_non_rtmp_scheme() {
        assert!(parse_rtmp_url("http://localhost/live/stream1").is_err());
    }

    #[test]
    fn rejects_missing_stream_name() {
        assert!(parse_rtmp_url("rtmp://localhost/live").is_err());
    }
}
