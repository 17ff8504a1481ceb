// DASH reuses the HLS segment manager as-is: both remuxers write immutable,
// content-addressed blobs through the same `HlsStorage` trait and need the
// same age-based eviction sweep. See DESIGN.md for why this isn't forked.

pub use crate::hls::segment_manager::{CleanupConfig, SegmentManager};
