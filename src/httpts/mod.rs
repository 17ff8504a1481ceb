// HTTP-TS session: subscribes to StreamHub and sends MPEG-TS data over a bounded channel.
//
// Mirrors `httpflv`'s shape but muxes FLV tags into 188-byte TS packets
// inline, rather than re-wrapping them as FLV. The HTTP routing layer lives
// in the downstream crate.

use bytes::BytesMut;
use crate::flv::{
    define::{frame_type, FlvData},
    demuxer::{FlvAudioTagDemuxer, FlvVideoTagDemuxer},
};
use crate::mpegts::{
    define::{epsi_stream_type, MPEG_FLAG_IDR_FRAME},
    ts::TsMuxer,
};
use crate::streamhub::{
    define::{
        FrameData, FrameDataReceiver, NotifyInfo, StreamHubEvent, StreamHubEventSender,
        SubDataType, SubscribeType, SubscriberInfo,
    },
    stream::StreamIdentifier,
    utils::Uuid,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

pub mod static_file;

/// Capacity for the HTTP response channel (bounded to prevent OOM with slow clients).
pub const TS_RESPONSE_CHANNEL_CAPACITY: usize = 512;

/// HTTP-TS session (per-client connection). Each TS packet batch produced by
/// the muxer is flushed to the response channel as soon as it's written, so
/// the client sees a steady trickle of 188-byte-aligned chunks rather than
/// waiting for a segment boundary the way the HLS segmenter does.
pub struct HttpTsSession {
    pub app_name: String,
    pub stream_name: String,
    event_producer: StreamHubEventSender,
    data_receiver: Option<FrameDataReceiver>,
    response_producer: mpsc::Sender<Result<bytes::Bytes, std::io::Error>>,
    subscriber_id: Uuid,

    ts_muxer: TsMuxer,
    video_pid: u16,
    audio_pid: u16,
    video_demuxer: FlvVideoTagDemuxer,
    audio_demuxer: FlvAudioTagDemuxer,
    has_sent_psi: bool,
}

impl HttpTsSession {
    #[must_use]
    pub fn new(
        app_name: String,
        stream_name: String,
        event_producer: StreamHubEventSender,
        response_producer: mpsc::Sender<Result<bytes::Bytes, std::io::Error>>,
    ) -> Self {
        let subscriber_id = Uuid::new();

        let mut ts_muxer = TsMuxer::new();
        // add_stream cannot fail for these two well-known codec ids.
        let audio_pid = ts_muxer
            .add_stream(epsi_stream_type::PSI_STREAM_AAC, BytesMut::new())
            .expect("adding AAC track to a fresh TsMuxer");
        let video_pid = ts_muxer
            .add_stream(epsi_stream_type::PSI_STREAM_H264, BytesMut::new())
            .expect("adding H264 track to a fresh TsMuxer");

        Self {
            app_name,
            stream_name,
            event_producer,
            data_receiver: None,
            response_producer,
            subscriber_id,
            ts_muxer,
            video_pid,
            audio_pid,
            video_demuxer: FlvVideoTagDemuxer::new(),
            audio_demuxer: FlvAudioTagDemuxer::new(),
            has_sent_psi: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.subscribe_from_stream_hub().await?;
        self.send_media_stream().await?;
        Ok(())
    }

    async fn send_media_stream(&mut self) -> anyhow::Result<()> {
        let mut data_receiver = self.data_receiver.take().ok_or_else(|| {
            anyhow::anyhow!("send_media_stream called before subscribe_from_stream_hub")
        })?;

        const RECV_TIMEOUT_SECS: u64 = crate::httpflv::DEFAULT_HTTP_IDLE_TIMEOUT_SECS;

        loop {
            match tokio::time::timeout(
                std::time::Duration::from_secs(RECV_TIMEOUT_SECS),
                data_receiver.recv(),
            )
            .await
            {
                Ok(Some(data)) => {
                    let flv_data = match data {
                        FrameData::Audio { timestamp, data } => FlvData::Audio { timestamp, data },
                        FrameData::Video { timestamp, data } => FlvData::Video { timestamp, data },
                        _ => continue,
                    };
                    if let Err(e) = self.write_ts_packet(flv_data) {
                        error!("Failed to mux TS packet: {}", e);
                    }
                }
                Ok(None) => {
                    info!("Stream channel closed");
                    break;
                }
                Err(_timeout) => {
                    info!("Stream timeout (no data for {}s)", RECV_TIMEOUT_SECS);
                    break;
                }
            }
        }

        self.unsubscribe_from_stream_hub().await?;
        Ok(())
    }

    fn write_ts_packet(&mut self, flv_data: FlvData) -> anyhow::Result<()> {
        let (pid, pts, dts, flags, payload) = match flv_data {
            FlvData::Video { timestamp, data } => {
                let video_data = self
                    .video_demuxer
                    .demux(timestamp, data)
                    .map_err(|e| anyhow::anyhow!("video demux error: {e:?}"))?;
                let video_data = match video_data {
                    Some(d) => d,
                    None => return Ok(()),
                };
                let flags = if video_data.frame_type == frame_type::KEY_FRAME {
                    MPEG_FLAG_IDR_FRAME
                } else {
                    0
                };
                let mut payload = BytesMut::new();
                payload.extend_from_slice(&video_data.data);
                (self.video_pid, video_data.pts, video_data.dts, flags, payload)
            }
            FlvData::Audio { timestamp, data } => {
                let audio_data = self
                    .audio_demuxer
                    .demux(timestamp, data)
                    .map_err(|e| anyhow::anyhow!("audio demux error: {e:?}"))?;
                if !audio_data.has_data {
                    return Ok(());
                }
                let mut payload = BytesMut::new();
                payload.extend_from_slice(&audio_data.data);
                (self.audio_pid, audio_data.pts, audio_data.dts, 0, payload)
            }
            _ => return Ok(()),
        };

        self.ts_muxer
            .write(pid, pts * 90, dts * 90, flags, payload)
            .map_err(|e| anyhow::anyhow!("TS mux error: {e:?}"))?;
        self.has_sent_psi = true;

        self.flush_response_data()?;
        Ok(())
    }

    fn flush_response_data(&mut self) -> anyhow::Result<()> {
        let data = self.ts_muxer.get_data();
        if data.is_empty() {
            return Ok(());
        }
        let bytes = bytes::Bytes::from(data.to_vec());
        self.ts_muxer.reset();

        match self.response_producer.try_send(Ok(bytes)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(stream = %self.stream_name, "TS response channel full, dropping packet batch (slow client)");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                return Err(anyhow::anyhow!("Response channel closed"));
            }
        }

        Ok(())
    }

    async fn subscribe_from_stream_hub(&mut self) -> anyhow::Result<()> {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2HttpTs,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("/{}/{}.ts", self.app_name, self.stream_name),
                remote_addr: String::new(),
            },
        };

        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());

        let (event_result_sender, event_result_receiver) = oneshot::channel();

        let subscribe_event = StreamHubEvent::Subscribe {
            identifier,
            info: sub_info,
            result_sender: event_result_sender,
        };

        self.event_producer
            .try_send(subscribe_event)
            .map_err(|_| anyhow::anyhow!("Failed to send subscribe event"))?;

        let result = event_result_receiver
            .await
            .map_err(|e| anyhow::anyhow!("Event result channel error: {e}"))?
            .map_err(|e| anyhow::anyhow!("Subscribe failed: {e:?}"))?;
        self.data_receiver = Some(
            result
                .0
                .frame_receiver
                .ok_or_else(|| anyhow::anyhow!("No frame receiver"))?,
        );

        info!(
            subscriber_id = %self.subscriber_id,
            stream = %self.stream_name,
            "Subscribed to StreamHub"
        );

        Ok(())
    }

    async fn unsubscribe_from_stream_hub(&mut self) -> anyhow::Result<()> {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2HttpTs,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("/{}/{}.ts", self.app_name, self.stream_name),
                remote_addr: String::new(),
            },
        };

        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());

        let unsubscribe_event = StreamHubEvent::UnSubscribe {
            identifier,
            info: sub_info,
        };

        if let Err(e) = self.event_producer.try_send(unsubscribe_event) {
            warn!("Failed to send unsubscribe event: {}", e);
        }

        info!(
            subscriber_id = %self.subscriber_id,
            stream = %self.stream_name,
            "Unsubscribed from StreamHub"
        );

        Ok(())
    }
}

/// `.aac` passthrough session: writes ADTS-framed AAC frames straight to the
/// client with no TS framing (spec §4.G names `.aac`/`.mp3` as sibling
/// paths to `.flv`/`.ts`). MP3 has no decode/passthrough path anywhere in
/// this crate, so it isn't offered here; callers should reject an `.mp3`
/// request with 406 before ever constructing this session.
pub struct AacPassthroughSession {
    pub app_name: String,
    pub stream_name: String,
    event_producer: StreamHubEventSender,
    data_receiver: Option<FrameDataReceiver>,
    response_producer: mpsc::Sender<Result<bytes::Bytes, std::io::Error>>,
    subscriber_id: Uuid,
    audio_demuxer: FlvAudioTagDemuxer,
}

impl AacPassthroughSession {
    #[must_use]
    pub fn new(
        app_name: String,
        stream_name: String,
        event_producer: StreamHubEventSender,
        response_producer: mpsc::Sender<Result<bytes::Bytes, std::io::Error>>,
    ) -> Self {
        Self {
            app_name,
            stream_name,
            event_producer,
            data_receiver: None,
            response_producer,
            subscriber_id: Uuid::new(),
            audio_demuxer: FlvAudioTagDemuxer::new(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.subscribe().await?;
        self.send_audio_stream().await?;
        Ok(())
    }

    async fn send_audio_stream(&mut self) -> anyhow::Result<()> {
        let mut data_receiver = self
            .data_receiver
            .take()
            .ok_or_else(|| anyhow::anyhow!("send_audio_stream called before subscribe"))?;

        const RECV_TIMEOUT_SECS: u64 = crate::httpflv::DEFAULT_HTTP_IDLE_TIMEOUT_SECS;

        loop {
            match tokio::time::timeout(
                std::time::Duration::from_secs(RECV_TIMEOUT_SECS),
                data_receiver.recv(),
            )
            .await
            {
                Ok(Some(FrameData::Audio { timestamp, data })) => {
                    let audio_data = match self.audio_demuxer.demux(timestamp, data) {
                        Ok(d) => d,
                        Err(e) => {
                            error!("AAC demux error: {:?}", e);
                            continue;
                        }
                    };
                    if !audio_data.has_data {
                        continue;
                    }
                    let bytes = bytes::Bytes::from(audio_data.data.to_vec());
                    if self.response_producer.try_send(Ok(bytes)).is_err() {
                        warn!(stream = %self.stream_name, "AAC response channel full or closed");
                    }
                }
                Ok(Some(_)) => continue,
                Ok(None) => {
                    info!("Stream channel closed");
                    break;
                }
                Err(_timeout) => {
                    info!("Stream timeout (no data for {}s)", RECV_TIMEOUT_SECS);
                    break;
                }
            }
        }

        self.unsubscribe().await?;
        Ok(())
    }

    async fn subscribe(&mut self) -> anyhow::Result<()> {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2HttpTs,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("/{}/{}.aac", self.app_name, self.stream_name),
                remote_addr: String::new(),
            },
        };
        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());
        let (event_result_sender, event_result_receiver) = oneshot::channel();

        self.event_producer
            .try_send(StreamHubEvent::Subscribe {
                identifier,
                info: sub_info,
                result_sender: event_result_sender,
            })
            .map_err(|_| anyhow::anyhow!("Failed to send subscribe event"))?;

        let result = event_result_receiver
            .await
            .map_err(|e| anyhow::anyhow!("Event result channel error: {e}"))?
            .map_err(|e| anyhow::anyhow!("Subscribe failed: {e:?}"))?;
        self.data_receiver = Some(
            result
                .0
                .frame_receiver
                .ok_or_else(|| anyhow::anyhow!("No frame receiver"))?,
        );

        Ok(())
    }

    async fn unsubscribe(&mut self) -> anyhow::Result<()> {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2HttpTs,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("/{}/{}.aac", self.app_name, self.stream_name),
                remote_addr: String::new(),
            },
        };
        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());
        if let Err(e) = self.event_producer.try_send(StreamHubEvent::UnSubscribe {
            identifier,
            info: sub_info,
        }) {
            warn!("Failed to send unsubscribe event: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_ts_session_creation() {
        let (event_sender, _) = tokio::sync::mpsc::channel(64);
        let (response_tx, _response_rx) = mpsc::channel(TS_RESPONSE_CHANNEL_CAPACITY);

        let session = HttpTsSession::new(
            "live".to_string(),
            "room123/media456".to_string(),
            event_sender,
            response_tx,
        );

        assert_eq!(session.app_name, "live");
        assert_eq!(session.stream_name, "room123/media456");
        assert!(!session.has_sent_psi);
    }
}
