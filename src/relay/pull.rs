use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::oneshot;

use crate::flv::define::{aac_packet_type, avc_packet_type, frame_type, AvcCodecId, SoundFormat};
use crate::rtmp::cache::RtmpStreamHandler;
use crate::rtmp::config::RtmpConfig;
use crate::rtmp::session::client_session::ClientSession;
use crate::streamhub::define::{
    FrameData, FrameDataSender, NotifyInfo, PubDataType, PublishType, PublisherInfo,
    StreamHubEvent, StreamHubEventSender,
};
use crate::streamhub::stream::StreamIdentifier;
use crate::streamhub::utils::Uuid;

use super::backoff::RetryPolicy;
use super::config::parse_rtmp_url;
use super::errors::RelayError;

/// Pulls a remote RTMP stream into the local hub under `identifier`. Meant
/// to be spawned once a local `play` misses the hub on a vhost configured
/// as an edge: a miss there almost always means "this vhost doesn't
/// originate the stream, it only relays it", so it's worth the upstream
/// connection rather than failing the player outright.
pub struct EdgePuller {
    event_producer: StreamHubEventSender,
    identifier: StreamIdentifier,
    upstream_addr: String,
    upstream_app: String,
    upstream_stream: String,
    retry: RetryPolicy,
    gop_num: usize,
}

impl EdgePuller {
    pub fn new(
        event_producer: StreamHubEventSender,
        identifier: StreamIdentifier,
        upstream_url: &str,
        retry: RetryPolicy,
        gop_num: usize,
    ) -> Result<Self, RelayError> {
        let (upstream_addr, upstream_app, upstream_stream) =
            parse_rtmp_url(upstream_url).ok_or_else(|| RelayError::InvalidUrl(upstream_url.to_string()))?;

        Ok(Self {
            event_producer,
            identifier,
            upstream_addr,
            upstream_app,
            upstream_stream,
            retry,
            gop_num,
        })
    }

    /// Connects upstream (retrying per `RetryPolicy`), publishes into the
    /// local hub, then forwards frames until the upstream disconnects. Only
    /// the initial connect/play handshake is retried; once playing, a
    /// dropped connection ends the pull rather than resuming mid-stream,
    /// matching how `ServerSession::handle_publish`'s disconnect ends a
    /// local publish rather than resuming it.
    pub async fn run(self) -> Result<(), RelayError> {
        let config = Arc::new(RtmpConfig::default());
        let addr = self.upstream_addr.clone();
        let app = self.upstream_app.clone();
        let stream_name = self.upstream_stream.clone();

        let mut client = self
            .retry
            .run(move || {
                let addr = addr.clone();
                let app = app.clone();
                let stream_name = stream_name.clone();
                let config = Arc::clone(&config);
                async move {
                    let tc_url = format!("rtmp://{addr}/{app}");
                    let mut client = ClientSession::connect(&addr, &app, &tc_url, &config).await?;
                    client.create_stream().await?;
                    client.play(&stream_name).await?;
                    Ok(client)
                }
            })
            .await?;

        let stream_handler = Arc::new(RtmpStreamHandler::new(self.gop_num));
        let (app_name, stream_name) = match &self.identifier {
            StreamIdentifier::Rtmp { app_name, stream_name, .. } => (app_name.clone(), stream_name.clone()),
        };

        let publisher_info = PublisherInfo {
            id: Uuid::new(),
            pub_type: PublishType::RtmpRelay,
            pub_data_type: PubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("rtmp://{}/{app_name}/{stream_name}", self.upstream_addr),
                remote_addr: self.upstream_addr.clone(),
            },
        };

        let (result_sender, result_receiver) = oneshot::channel();
        self.event_producer
            .send(StreamHubEvent::Publish {
                identifier: self.identifier.clone(),
                info: publisher_info,
                result_sender,
                stream_handler: stream_handler.clone(),
            })
            .await
            .map_err(|_| RelayError::ChannelClosed)?;

        let (frame_sender, _packet_sender, _statistic_sender) = result_receiver
            .await
            .map_err(|_| RelayError::ChannelClosed)?
            .map_err(RelayError::from)?;
        let frame_sender = frame_sender.ok_or(RelayError::EmptyStream)?;

        let result = Self::forward_loop(&mut client, &stream_handler, &frame_sender).await;

        let _ = self
            .event_producer
            .send(StreamHubEvent::UnPublish { identifier: self.identifier })
            .await;

        result
    }

    async fn forward_loop(
        client: &mut ClientSession,
        stream_handler: &Arc<RtmpStreamHandler>,
        frame_sender: &FrameDataSender,
    ) -> Result<(), RelayError> {
        loop {
            match client.recv_frame().await? {
                Some(frame) => {
                    cache_frame(stream_handler, &frame).await;
                    if frame_sender.send(frame).await.is_err() {
                        return Ok(());
                    }
                }
                None => return Ok(()),
            }
        }
    }
}

/// Mirrors `ServerSession::handle_audio`/`handle_video`'s sequence-header
/// and gop-cache bookkeeping, so late subscribers of an edge-pulled stream
/// still get an instant key frame instead of waiting for the next one.
async fn cache_frame(handler: &Arc<RtmpStreamHandler>, frame: &FrameData) {
    match frame {
        FrameData::MetaData { timestamp, data } => {
            handler.save_metadata(data.clone(), *timestamp).await;
        }
        FrameData::Audio { timestamp, data } => cache_audio(handler, *timestamp, data).await,
        FrameData::Video { timestamp, data } => cache_video(handler, *timestamp, data).await,
        FrameData::MediaInfo { .. } => {}
    }
}

async fn cache_audio(handler: &Arc<RtmpStreamHandler>, timestamp: i64, data: &BytesMut) {
    if data.len() < 2 {
        return;
    }
    let sound_format = (data[0] >> 4) & 0x0F;
    let is_aac = sound_format == SoundFormat::AAC as u8;
    if is_aac && data[1] == aac_packet_type::AAC_SEQHDR {
        handler.save_audio_seq_header(data.clone(), timestamp).await;
    } else {
        handler.save_frame_data(FrameData::Audio { timestamp, data: data.clone() }, false).await;
    }
}

async fn cache_video(handler: &Arc<RtmpStreamHandler>, timestamp: i64, data: &BytesMut) {
    if data.len() < 2 {
        return;
    }
    let frame_kind = (data[0] >> 4) & 0x0F;
    let codec_id = data[0] & 0x0F;
    let is_avc = codec_id == AvcCodecId::H264 as u8 || codec_id == AvcCodecId::Hevc as u8;
    let is_key_frame = frame_kind == frame_type::KEY_FRAME;
    if is_avc && data[1] == avc_packet_type::AVC_SEQHDR {
        handler.save_video_seq_header(data.clone(), timestamp).await;
    } else {
        handler.save_frame_data(FrameData::Video { timestamp, data: data.clone() }, is_key_frame).await;
    }
}
