// Segment lifecycle management: owns the storage backend and periodically
// sweeps expired segments out of it. Playlist/segment-list bookkeeping lives
// in `StreamProcessorState` (remuxer.rs); this module only knows about the
// raw key-value store and how long to keep things in it.

use crate::storage::HlsStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cleanup policy for expired HLS segments.
#[derive(Debug, Clone, Copy)]
pub struct CleanupConfig {
    /// How often the cleanup sweep runs.
    pub interval: Duration,
    /// Segments older than this are deleted from storage.
    pub max_age: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_age: Duration::from_secs(120),
        }
    }
}

/// Owns the pluggable storage backend used by the HLS remuxer and HTTP
/// server, and runs the background sweep that evicts expired segments.
pub struct SegmentManager {
    storage: Arc<dyn HlsStorage>,
    cleanup_config: CleanupConfig,
}

impl SegmentManager {
    #[must_use]
    pub fn new(storage: Arc<dyn HlsStorage>, cleanup_config: CleanupConfig) -> Self {
        Self {
            storage,
            cleanup_config,
        }
    }

    #[must_use]
    pub fn with_defaults(storage: Arc<dyn HlsStorage>) -> Self {
        Self::new(storage, CleanupConfig::default())
    }

    /// The storage backend segments are written to and served from.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn HlsStorage> {
        &self.storage
    }

    /// Runs the periodic cleanup sweep until `cancel_token` fires. Intended
    /// to be spawned once per process alongside the HLS server/remuxer.
    pub async fn run_cleanup_loop(self: Arc<Self>, cancel_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.cleanup_config.interval);
        ticker.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::info!("HLS segment cleanup loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.storage.cleanup(self.cleanup_config.max_age).await {
                        Ok(count) if count > 0 => {
                            tracing::debug!("HLS segment cleanup removed {} expired segment(s)", count);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("HLS segment cleanup failed: {}", e);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use bytes::Bytes;

    #[tokio::test]
    async fn storage_roundtrip_through_manager() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = SegmentManager::with_defaults(storage);

        manager
            .storage()
            .write("app-stream-abc123", Bytes::from_static(b"tsdata"))
            .await
            .unwrap();

        let data = manager.storage().read("app-stream-abc123").await.unwrap();
        assert_eq!(&data[..], b"tsdata");
    }

    #[tokio::test]
    async fn cleanup_loop_exits_on_cancel() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = Arc::new(SegmentManager::new(
            storage,
            CleanupConfig {
                interval: Duration::from_millis(10),
                max_age: Duration::from_secs(1),
            },
        ));
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let handle = tokio::spawn(async move {
            manager.run_cleanup_loop(token_clone).await;
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cleanup loop did not exit after cancellation")
            .unwrap();
    }
}
