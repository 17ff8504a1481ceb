pub mod config;
pub mod remuxer;
pub mod segment_manager;
pub mod server;

pub use config::{HlsConfig, HlsOnError};
pub use remuxer::{CustomHlsRemuxer, StreamRegistry, StreamProcessorState, SegmentInfo, HlsRemuxerError};
pub use segment_manager::{SegmentManager, CleanupConfig};
pub use server::HlsServer;
