pub mod errors;
pub mod gop;

use gop::Gops;
use tokio::sync::Mutex;

use crate::streamhub::define::{DataSender, FrameData, SubscribeType};
use crate::streamhub::define::{TStreamHandler};
use crate::streamhub::errors::{StreamHubError, StreamHubErrorValue};
use async_trait::async_trait;
use bytes::BytesMut;

/// Replays a publisher's most recent metadata, codec sequence headers, and
/// GOP cache to a newly-subscribed consumer, so it doesn't have to wait for
/// the next keyframe/metadata tag to start decoding (spec's subscriber
/// "prior data" requirement).
pub struct Cache {
    metadata: Option<BytesMut>,
    metadata_timestamp: i64,
    video_seq_header: Option<BytesMut>,
    video_timestamp: i64,
    audio_seq_header: Option<BytesMut>,
    audio_timestamp: i64,
    gops: Gops,
}

impl Cache {
    #[must_use]
    pub fn new(gop_num: usize) -> Self {
        Self {
            metadata: None,
            metadata_timestamp: 0,
            video_seq_header: None,
            video_timestamp: 0,
            audio_seq_header: None,
            audio_timestamp: 0,
            gops: Gops::new(gop_num),
        }
    }

    pub fn save_metadata(&mut self, data: BytesMut, timestamp: i64) {
        self.metadata = Some(data);
        self.metadata_timestamp = timestamp;
    }

    pub fn save_video_seq_header(&mut self, data: BytesMut, timestamp: i64) {
        self.video_seq_header = Some(data);
        self.video_timestamp = timestamp;
    }

    pub fn save_audio_seq_header(&mut self, data: BytesMut, timestamp: i64) {
        self.audio_seq_header = Some(data);
        self.audio_timestamp = timestamp;
    }

    pub fn save_frame_data(&mut self, data: FrameData, is_key_frame: bool) {
        self.gops.save_frame_data(data, is_key_frame);
    }

    /// All data that should be replayed to a freshly-subscribed consumer,
    /// in the order it should be sent: metadata, then sequence headers,
    /// then the buffered GOPs.
    #[must_use]
    pub fn get_prior_data(&self) -> Vec<FrameData> {
        let mut out = Vec::new();

        if let Some(metadata) = &self.metadata {
            out.push(FrameData::MetaData {
                timestamp: self.metadata_timestamp,
                data: metadata.clone(),
            });
        }
        if let Some(header) = &self.audio_seq_header {
            out.push(FrameData::Audio {
                timestamp: self.audio_timestamp,
                data: header.clone(),
            });
        }
        if let Some(header) = &self.video_seq_header {
            out.push(FrameData::Video {
                timestamp: self.video_timestamp,
                data: header.clone(),
            });
        }

        if self.gops.setted() {
            for gop in self.gops.get_gops() {
                out.extend(gop.get_frame_data());
            }
        }

        out
    }
}

/// `TStreamHandler` implementation backing RTMP publishers: shares the same
/// `Cache` the publish session writes into, so `StreamsHub` can ask it to
/// replay prior data to a subscriber without reaching into session internals.
pub struct RtmpStreamHandler {
    cache: Mutex<Cache>,
}

impl RtmpStreamHandler {
    #[must_use]
    pub fn new(gop_num: usize) -> Self {
        Self {
            cache: Mutex::new(Cache::new(gop_num)),
        }
    }

    pub async fn save_metadata(&self, data: BytesMut, timestamp: i64) {
        self.cache.lock().await.save_metadata(data, timestamp);
    }

    pub async fn save_video_seq_header(&self, data: BytesMut, timestamp: i64) {
        self.cache.lock().await.save_video_seq_header(data, timestamp);
    }

    pub async fn save_audio_seq_header(&self, data: BytesMut, timestamp: i64) {
        self.cache.lock().await.save_audio_seq_header(data, timestamp);
    }

    pub async fn save_frame_data(&self, data: FrameData, is_key_frame: bool) {
        self.cache.lock().await.save_frame_data(data, is_key_frame);
    }
}

#[async_trait]
impl TStreamHandler for RtmpStreamHandler {
    async fn send_prior_data(
        &self,
        sender: DataSender,
        sub_type: SubscribeType,
    ) -> Result<(), StreamHubError> {
        let frame_sender = match sender {
            DataSender::Frame { sender } => sender,
            DataSender::Packet { .. } => {
                return Err(StreamHubErrorValue::NotCorrectDataSenderType.into());
            }
        };

        let prior_data = self.cache.lock().await.get_prior_data();
        for frame in prior_data {
            if frame_sender.send(frame).await.is_err() {
                tracing::debug!("send_prior_data: subscriber ({sub_type:?}) channel closed");
                return Err(StreamHubErrorValue::SubscriberClosed.into());
            }
        }

        Ok(())
    }
}
