pub mod errors;
pub mod writer;

pub use writer::{NetStreamWriter, StatusLevel};

/// `NetStream.*` status/error codes this server emits (spec §7.2.4's
/// `onStatus` taxonomy, scoped to what publish/play actually produce).
pub mod code {
    pub const PUBLISH_START: &str = "NetStream.Publish.Start";
    pub const PUBLISH_BAD_NAME: &str = "NetStream.Publish.BadName";
    pub const UNPUBLISH_SUCCESS: &str = "NetStream.Unpublish.Success";
    pub const PLAY_START: &str = "NetStream.Play.Start";
    pub const PLAY_RESET: &str = "NetStream.Play.Reset";
    pub const PLAY_STOP: &str = "NetStream.Play.Stop";
    pub const PLAY_STREAM_NOT_FOUND: &str = "NetStream.Play.StreamNotFound";
    pub const PLAY_FAILED: &str = "NetStream.Play.Failed";
}
