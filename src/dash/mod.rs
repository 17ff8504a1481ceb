//! MPEG-DASH output: the fMP4/MPD counterpart to the `hls` module. Shares
//! its storage abstraction and segmenting tunables, diverging only where the
//! container format forces it to (two independently-addressable
//! representations instead of one muxed stream, an XML manifest instead of
//! M3U8).

pub mod errors;
pub mod mpd;
pub mod remuxer;
pub mod segment_manager;
pub mod server;

pub use errors::DashRemuxerError;
pub use mpd::Mpd;
pub use remuxer::{DashRemuxer, DashSegmentInfo, DashStreamProcessorState, DashStreamRegistry};
pub use segment_manager::{CleanupConfig, SegmentManager};
pub use server::DashServer;
