// HLS Storage abstraction layer
//
// Supports multiple storage backends:
// - FileStorage: Local filesystem (default)
// - MemoryStorage: In-memory (for testing/caching)
// - OssStorage: Object storage (S3/Aliyun OSS/etc)
//
// Based on xiu's HLS implementation but with pluggable storage

pub mod file;
pub mod memory;
pub mod oss;

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Result;

/// HLS storage trait for pluggable backends
///
/// Pure key-value storage interface. The storage layer should NOT know about:
/// - Segment metadata/lifecycle (handled by `SegmentManager`)
/// - M3U8 generation (handled by HLS layer)
///
/// Storage layer does: write, read, delete, exists, cleanup, and optionally provides public URLs.
#[async_trait]
pub trait HlsStorage: Send + Sync {
    /// Write data to storage
    ///
    /// # Arguments
    /// * `key` - Storage key (e.g., "`live/room_123/segment_0.ts`")
    /// * `data` - Binary data to store
    async fn write(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read data from storage
    ///
    /// # Arguments
    /// * `key` - Storage key
    ///
    /// # Returns
    /// Binary data or `NotFound` error
    async fn read(&self, key: &str) -> Result<Bytes>;

    /// Delete single key from storage
    ///
    /// # Arguments
    /// * `key` - Storage key
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if key exists
    ///
    /// # Arguments
    /// * `key` - Storage key
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Cleanup expired data
    ///
    /// Storage backend scans and deletes all data older than the specified duration.
    /// Upper layer (`SegmentManager`) calls this periodically to cleanup old segments.
    ///
    /// # Arguments
    /// * `older_than` - Delete data older than this duration
    ///
    /// # Returns
    /// Number of keys successfully deleted
    ///
    /// # Default Implementation
    /// No-op by default (returns 0). Storage backends should implement this if possible.
    async fn cleanup(&self, _older_than: std::time::Duration) -> Result<usize> {
        Ok(0)
    }

    /// Total size in bytes of the object stored under `key`.
    ///
    /// Used by HTTP range serving to compute `Content-Length` and validate
    /// `Range:` requests without reading the whole object.
    ///
    /// # Default Implementation
    /// Reads the full object and returns its length. Backends that can stat
    /// a file (e.g. `FileStorage`) should override this.
    async fn size(&self, key: &str) -> Result<u64> {
        Ok(self.read(key).await?.len() as u64)
    }

    /// Read the half-open byte range `[start, end)` from storage.
    ///
    /// Used for HTTP `Range:` requests against static/VOD-like content
    /// (§4.G `SrsHttpFileServer`-equivalent range serving). `end` is clamped
    /// to the object's actual size.
    ///
    /// # Default Implementation
    /// Reads the full object and slices it in memory. Backends that can
    /// seek (e.g. `FileStorage`) should override this to avoid buffering
    /// the whole object for a small range request.
    async fn read_range(&self, key: &str, start: u64, end: u64) -> Result<Bytes> {
        let data = self.read(key).await?;
        let len = data.len() as u64;
        let start = start.min(len) as usize;
        let end = end.min(len) as usize;
        Ok(data.slice(start..end))
    }

    /// Get public URL for direct access (async)
    ///
    /// Use cases:
    /// - **OSS Storage with CDN**: Return CDN URL
    /// - **OSS Storage without CDN**: Generate temporary presigned URL with expiration
    /// - **File/Memory Storage**: Return None, let HTTP layer generate local URLs
    ///
    /// # Arguments
    /// * `key` - Storage key
    ///
    /// # Returns
    /// - `Ok(Some(url))` - Public URL (CDN or presigned) for direct access
    /// - `Ok(None)` - No public URL available (File/Memory storage)
    /// - `Err(e)` - Failed to generate presigned URL
    ///
    /// # Default Implementation
    /// Returns None by default (File/Memory storage don't need public URLs)
    async fn get_public_url(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local filesystem storage
    File,
    /// In-memory storage (for testing/caching)
    Memory,
    /// Object storage (S3/OSS/etc)
    Oss,
}

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use oss::{OssStorage, OssConfig};
