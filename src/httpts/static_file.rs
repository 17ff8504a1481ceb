// Minimal range-serving static file responder, used for VOD-like content
// (e.g. an HLS/DASH segment kept on disk past its playlist window). Mirrors
// `SrsHttpFileServer`'s range behavior: live paths never call this — they
// reject `Range:` outright — this is only for on-disk files addressed
// directly by storage key.
//
// Generic over `HlsStorage` so it works with any configured backend
// (`FileStorage`, `MemoryStorage`, `OssStorage`); the HTTP routing layer
// that maps a URL onto a storage key lives in the downstream crate.

use crate::storage::HlsStorage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Parses a single-range `Range: bytes=start-end` header (the only form HLS
/// clients send). Multi-range requests aren't supported; anything else is
/// treated as "no usable range" and falls back to a full 200 response.
fn parse_byte_range(header: &str, total_len: u64) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }
    let (start_s, end_s) = spec.split_once('-')?;

    if start_s.is_empty() {
        // suffix range: "bytes=-500" means the last 500 bytes
        let suffix_len: u64 = end_s.parse().ok()?;
        if suffix_len == 0 || total_len == 0 {
            return None;
        }
        let suffix_len = suffix_len.min(total_len);
        return Some((total_len - suffix_len, total_len - 1));
    }

    let start: u64 = start_s.parse().ok()?;
    let end: u64 = if end_s.is_empty() {
        total_len.saturating_sub(1)
    } else {
        end_s.parse().ok()?
    };
    if start > end || start >= total_len {
        return None;
    }
    Some((start, end.min(total_len.saturating_sub(1))))
}

/// Serves `key` out of `storage` honoring an optional `Range:` header.
/// Returns 200 with the full body, 206 with the requested slice, 416 if the
/// range is unsatisfiable, or 404 if the key doesn't exist.
pub async fn serve_range(
    storage: &dyn HlsStorage,
    key: &str,
    range_header: Option<&str>,
    content_type: &str,
) -> Response {
    let total_len = match storage.size(key).await {
        Ok(len) => len,
        Err(_) => return (StatusCode::NOT_FOUND, "not found").into_response(),
    };

    match range_header.and_then(|h| parse_byte_range(h, total_len)) {
        Some((start, end)) => match storage.read_range(key, start, end + 1).await {
            Ok(data) => {
                let content_range = format!("bytes {start}-{end}/{total_len}");
                (
                    StatusCode::PARTIAL_CONTENT,
                    [
                        ("Content-Type", content_type.to_string()),
                        ("Content-Range", content_range),
                        ("Accept-Ranges", "bytes".to_string()),
                        ("Content-Length", data.len().to_string()),
                    ],
                    data,
                )
                    .into_response()
            }
            Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
        },
        None if range_header.is_some() => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [("Content-Range", format!("bytes */{total_len}"))],
            "range not satisfiable",
        )
            .into_response(),
        None => match storage.read(key).await {
            Ok(data) => (
                StatusCode::OK,
                [
                    ("Content-Type", content_type.to_string()),
                    ("Accept-Ranges", "bytes".to_string()),
                    ("Content-Length", data.len().to_string()),
                ],
                data,
            )
                .into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use bytes::Bytes;

    #[test]
    fn test_parse_byte_range_basic() {
        assert_eq!(parse_byte_range("bytes=0-99", 1000), Some((0, 99)));
        assert_eq!(parse_byte_range("bytes=100-", 1000), Some((100, 999)));
        assert_eq!(parse_byte_range("bytes=-500", 1000), Some((500, 999)));
    }

    #[test]
    fn test_parse_byte_range_rejects_multi_range() {
        assert_eq!(parse_byte_range("bytes=0-99,200-299", 1000), None);
    }

    #[test]
    fn test_parse_byte_range_out_of_bounds() {
        assert_eq!(parse_byte_range("bytes=2000-3000", 1000), None);
    }

    #[tokio::test]
    async fn test_serve_range_full_body() {
        let storage = MemoryStorage::new();
        storage.write("k", Bytes::from_static(b"0123456789")).await.unwrap();

        let resp = serve_range(&storage, "k", None, "video/mp4").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serve_range_partial() {
        let storage = MemoryStorage::new();
        storage.write("k", Bytes::from_static(b"0123456789")).await.unwrap();

        let resp = serve_range(&storage, "k", Some("bytes=2-5"), "video/mp4").await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    }

    #[tokio::test]
    async fn test_serve_range_unsatisfiable() {
        let storage = MemoryStorage::new();
        storage.write("k", Bytes::from_static(b"0123456789")).await.unwrap();

        let resp = serve_range(&storage, "k", Some("bytes=50-60"), "video/mp4").await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn test_serve_range_not_found() {
        let storage = MemoryStorage::new();
        let resp = serve_range(&storage, "missing", None, "video/mp4").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
