use std::collections::HashMap;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::bytesio::bytesio::BytesIO;
use crate::bytesio::bytesio_errors::BytesIOErrorValue;
use crate::rtmp::atc::AtcCorrector;
use crate::flv::amf0::amf0_writer::Amf0Writer;
use crate::flv::amf0::Amf0Value;
use crate::flv::define::{aac_packet_type, avc_packet_type, frame_type, AvcCodecId, SoundFormat};
use crate::rtmp::auth::AuthCallback;
use crate::rtmp::cache::RtmpStreamHandler;
use crate::rtmp::chunk::errors::UnpackErrorValue;
use crate::rtmp::chunk::unpacketizer::UnpackResult;
use crate::rtmp::config::RtmpConfig;
use crate::rtmp::handshake::ServerHandshake;
use crate::rtmp::messages::{MessageParser, RtmpMessageData};
use crate::rtmp::netconnection::NetConnectionWriter;
use crate::rtmp::netstream::{code, NetStreamWriter, StatusLevel};
use crate::rtmp::protocol_control_messages::ProtocolControlMessagesWriter;
use crate::rtmp::user_control_messages::{UserControlEvent, UserControlMessageWriter};
use crate::streamhub::define::{
    DataReceiver, FrameData, FrameDataReceiver, FrameDataSender, NotifyInfo, PubDataType,
    PublishType, PublisherInfo, StreamHubEvent, StreamHubEventSender, SubDataType, SubscribeType,
    SubscriberInfo,
};
use crate::streamhub::stream::{StreamIdentifier, DEFAULT_VHOST};
use crate::streamhub::utils::Uuid;

use super::common::{chunk_stream_id, Common, SessionType};
use super::errors::{SessionError, SessionErrorValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientRole {
    Unknown,
    Publisher,
    Player,
}

/// Splits a `publish`/`play` stream key (e.g. `"room1?vhost=a&token=b"`) into
/// its bare name, the raw query string, and the parsed query params.
fn split_stream_key(raw: &str) -> (String, Option<String>, HashMap<String, String>) {
    match raw.split_once('?') {
        Some((name, query)) => {
            let mut params = HashMap::new();
            for pair in query.split('&') {
                if let Some((k, v)) = pair.split_once('=') {
                    params.insert(k.to_string(), v.to_string());
                } else if !pair.is_empty() {
                    params.insert(pair.to_string(), String::new());
                }
            }
            (name.to_string(), Some(query.to_string()), params)
        }
        None => (raw.to_string(), None, HashMap::new()),
    }
}

fn resolve_vhost(params: &HashMap<String, String>) -> String {
    params
        .get("vhost")
        .or_else(|| params.get("domain"))
        .cloned()
        .unwrap_or_else(|| DEFAULT_VHOST.to_string())
}

/// Drives one inbound RTMP TCP connection end to end: handshake, `connect`/
/// `createStream`, then either `publish` (ingest, forwarding frames into the
/// hub) or `play` (egest, relaying frames from the hub back to the client).
pub struct ServerSession {
    pub common: Common,
    pub app_name: String,
    pub stream_name: String,
    vhost: String,
    query: Option<String>,
    event_producer: StreamHubEventSender,
    config: RtmpConfig,
    auth: Option<Arc<dyn AuthCallback>>,
    object_encoding: f64,
    role: ClientRole,
    remote_addr: String,
    subscriber_id: Uuid,
    stream_handler: Option<Arc<RtmpStreamHandler>>,
    frame_sender: Option<FrameDataSender>,
    /// Rebases a publisher's wire timestamps onto a contiguous virtual
    /// timeline (spec §4.D). Only meaningful while `role == Publisher`;
    /// a player's incoming timestamps (if any) are never forwarded.
    atc: AtcCorrector,
    ended: bool,
    /// Per-vhost edge/forward configuration, keyed by vhost name. Consulted
    /// on a `play` miss to decide whether to spawn an `EdgePuller` instead
    /// of rejecting outright.
    relay_configs: HashMap<String, Arc<RelayConfig>>,
}

impl ServerSession {
    #[must_use]
    pub fn new(
        stream: TcpStream,
        event_producer: StreamHubEventSender,
        gop_num: usize,
        auth: Option<Arc<dyn AuthCallback>>,
    ) -> Self {
        let config = RtmpConfig {
            gop_num,
            ..RtmpConfig::default()
        };
        Self::with_config(stream, event_producer, config, auth)
    }

    #[must_use]
    pub fn with_config(
        stream: TcpStream,
        event_producer: StreamHubEventSender,
        config: RtmpConfig,
        auth: Option<Arc<dyn AuthCallback>>,
    ) -> Self {
        let remote_addr = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default();
        let io = BytesIO::new(stream, config.read_timeout, config.write_timeout);

        Self {
            common: Common::new(io, SessionType::Server),
            app_name: String::new(),
            stream_name: String::new(),
            vhost: DEFAULT_VHOST.to_string(),
            query: None,
            event_producer,
            config,
            auth,
            object_encoding: 0.0,
            role: ClientRole::Unknown,
            remote_addr,
            subscriber_id: Uuid::new(),
            stream_handler: None,
            frame_sender: None,
            atc: AtcCorrector::default(),
            ended: false,
        }
    }

    fn identifier(&self) -> StreamIdentifier {
        StreamIdentifier::rtmp_with_vhost(
            self.vhost.clone(),
            self.app_name.clone(),
            self.stream_name.clone(),
        )
    }

    pub async fn run(&mut self) -> Result<(), SessionError> {
        ServerHandshake::handshake(&mut self.common.io).await?;

        while !self.ended {
            if !self.read_and_dispatch_once().await? {
                break;
            }
        }

        self.on_session_end().await;
        Ok(())
    }

    /// Reads one burst of socket data and dispatches every chunk it yields.
    /// Returns `Ok(false)` once the peer has closed the connection.
    async fn read_and_dispatch_once(&mut self) -> Result<bool, SessionError> {
        let data = match self.common.io.read().await {
            Ok(data) => data,
            Err(err) => {
                if matches!(err.value, BytesIOErrorValue::EmptyStream) {
                    return Ok(false);
                }
                return Err(err.into());
            }
        };
        self.common.unpacketizer.extend_data(&data)?;

        loop {
            match self.common.unpacketizer.read_chunks() {
                Ok(UnpackResult::Chunks(chunks)) => {
                    for chunk in chunks {
                        self.handle_chunk(chunk).await?;
                        if self.ended {
                            return Ok(false);
                        }
                    }
                }
                Ok(_) => break,
                Err(err) => {
                    if matches!(err.value, UnpackErrorValue::EmptyChunks) {
                        break;
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(true)
    }

    async fn handle_chunk(&mut self, chunk: crate::rtmp::chunk::ChunkInfo) -> Result<(), SessionError> {
        let msg_type_id = chunk.message_header.msg_type_id;
        let timestamp = chunk.message_header.timestamp;
        let message = MessageParser::parse(msg_type_id, timestamp, chunk.payload)?;

        match message {
            RtmpMessageData::SetChunkSize(size) => {
                self.common.unpacketizer.update_max_chunk_size(size as usize);
            }
            RtmpMessageData::WindowAckSize(_)
            | RtmpMessageData::Acknowledgement { .. }
            | RtmpMessageData::AbortMessage { .. }
            | RtmpMessageData::SetPeerBandwidth { .. } => {}
            RtmpMessageData::UserControl(event) => self.handle_user_control(event).await?,
            RtmpMessageData::AmfCommand { values, .. } => self.handle_command(values).await?,
            RtmpMessageData::AmfData { values, timestamp } => {
                self.handle_data(values, timestamp).await?;
            }
            RtmpMessageData::Audio { timestamp, data } => self.handle_audio(timestamp, data).await?,
            RtmpMessageData::Video { timestamp, data } => self.handle_video(timestamp, data).await?,
            RtmpMessageData::Unknown { type_id } => {
                tracing::trace!("ignoring unknown rtmp message type {type_id}");
            }
        }

        Ok(())
    }

    async fn handle_user_control(&mut self, event: UserControlEvent) -> Result<(), SessionError> {
        if let UserControlEvent::PingRequest { timestamp } = event {
            let (msg_type_id, payload) = UserControlMessageWriter::write_ping_response(timestamp)?;
            self.common.send_control_message(msg_type_id, &payload).await?;
        }
        Ok(())
    }

    async fn handle_command(&mut self, values: Vec<Amf0Value>) -> Result<(), SessionError> {
        let mut iter = values.into_iter();
        let command_name = match iter.next() {
            Some(Amf0Value::Utf8String(name)) => name,
            _ => return Ok(()),
        };
        let transaction_id = match iter.next() {
            Some(Amf0Value::Number(n)) => n,
            _ => 0.0,
        };
        let command_object = iter.next();
        let rest: Vec<Amf0Value> = iter.collect();

        match command_name.as_str() {
            "connect" => self.handle_connect(transaction_id, command_object).await,
            "createStream" => self.handle_create_stream(transaction_id).await,
            "publish" => self.handle_publish(rest).await,
            "play" => self.handle_play(rest).await,
            "deleteStream" | "closeStream" => {
                self.ended = true;
                Ok(())
            }
            "FCPublish" | "FCUnpublish" | "releaseStream" | "pause" => Ok(()),
            other => {
                tracing::debug!("unhandled rtmp command: {other}");
                Ok(())
            }
        }
    }

    async fn handle_connect(
        &mut self,
        transaction_id: f64,
        command_object: Option<Amf0Value>,
    ) -> Result<(), SessionError> {
        if let Some(Amf0Value::Object(obj)) = command_object {
            if let Some(Amf0Value::Utf8String(app)) = obj.get("app") {
                self.app_name = app.clone();
            }
            if let Some(Amf0Value::Number(encoding)) = obj.get("objectEncoding") {
                self.object_encoding = *encoding;
            }
        }

        let (msg_type_id, payload) =
            ProtocolControlMessagesWriter::write_window_ack_size(self.config.window_ack_size)?;
        self.common.send_control_message(msg_type_id, &payload).await?;

        let (msg_type_id, payload) = ProtocolControlMessagesWriter::write_set_peer_bandwidth(
            self.config.peer_bandwidth,
            self.config.peer_bandwidth_limit_type,
        )?;
        self.common.send_control_message(msg_type_id, &payload).await?;

        let (msg_type_id, payload) =
            ProtocolControlMessagesWriter::write_set_chunk_size(self.config.chunk_size)?;
        self.common.send_control_message(msg_type_id, &payload).await?;
        self.common
            .packetizer
            .update_max_chunk_size(self.config.chunk_size as usize);

        let (msg_type_id, payload) =
            NetConnectionWriter::write_connect_success(transaction_id, self.object_encoding)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, 0, &payload)
            .await
    }

    async fn handle_create_stream(&mut self, transaction_id: f64) -> Result<(), SessionError> {
        self.common.stream_id = 1;
        let (msg_type_id, payload) =
            NetConnectionWriter::write_create_stream_success(transaction_id, f64::from(self.common.stream_id))?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, 0, &payload)
            .await
    }

    async fn handle_publish(&mut self, rest: Vec<Amf0Value>) -> Result<(), SessionError> {
        let raw_name = match rest.first() {
            Some(Amf0Value::Utf8String(name)) => name.clone(),
            _ => return self.reject_publish("missing stream name").await,
        };
        if self.app_name.is_empty() {
            return self.reject_publish("missing app name").await;
        }

        let (stream_name, query, params) = split_stream_key(&raw_name);
        self.stream_name = stream_name.clone();
        self.query = query.clone();
        self.vhost = resolve_vhost(&params);
        self.role = ClientRole::Publisher;

        if let Some(auth) = &self.auth {
            if let Err(err) = auth
                .on_publish(&self.app_name, &stream_name, query.as_deref())
                .await
            {
                tracing::warn!(app = %self.app_name, stream = %stream_name, "publish rejected: {err}");
                return self.reject_publish("authorization failed").await;
            }
        }

        let stream_handler = Arc::new(RtmpStreamHandler::new(self.config.gop_num));
        self.stream_handler = Some(stream_handler.clone());

        let publisher_info = PublisherInfo {
            id: self.subscriber_id,
            pub_type: PublishType::RtmpPush,
            pub_data_type: PubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("rtmp://{}/{}/{}", self.remote_addr, self.app_name, stream_name),
                remote_addr: self.remote_addr.clone(),
            },
        };

        let (result_sender, result_receiver) = oneshot::channel();
        self.event_producer
            .send(StreamHubEvent::Publish {
                identifier: self.identifier(),
                info: publisher_info,
                result_sender,
                stream_handler,
            })
            .await
            .map_err(|_| SessionError {
                value: SessionErrorValue::StreamHubEventSendErr,
            })?;

        match result_receiver.await? {
            Ok((frame_sender, _packet_sender, _statistic_sender)) => {
                self.frame_sender = frame_sender;
            }
            Err(_) => return self.reject_publish("stream already published").await,
        }

        let (msg_type_id, payload) =
            NetStreamWriter::write_on_status(StatusLevel::Status, code::PUBLISH_START, "Publish started.")?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await
    }

    async fn reject_publish(&mut self, reason: &str) -> Result<(), SessionError> {
        let (msg_type_id, payload) =
            NetStreamWriter::write_on_status(StatusLevel::Error, code::PUBLISH_BAD_NAME, reason)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await?;
        self.ended = true;
        Ok(())
    }

    async fn handle_play(&mut self, rest: Vec<Amf0Value>) -> Result<(), SessionError> {
        let raw_name = match rest.first() {
            Some(Amf0Value::Utf8String(name)) => name.clone(),
            _ => return self.reject_play("missing stream name").await,
        };
        if self.app_name.is_empty() {
            return self.reject_play("missing app name").await;
        }

        let (stream_name, query, params) = split_stream_key(&raw_name);
        self.stream_name = stream_name.clone();
        self.query = query.clone();
        self.vhost = resolve_vhost(&params);
        self.role = ClientRole::Player;

        if let Some(auth) = &self.auth {
            if let Err(err) = auth.on_play(&self.app_name, &stream_name, query.as_deref()).await {
                tracing::warn!(app = %self.app_name, stream = %stream_name, "play rejected: {err}");
                return self.reject_play("authorization failed").await;
            }
        }

        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpPull,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo {
                request_url: format!("rtmp://{}/{}/{}", self.remote_addr, self.app_name, stream_name),
                remote_addr: self.remote_addr.clone(),
            },
        };

        let (result_sender, result_receiver) = oneshot::channel();
        self.event_producer
            .send(StreamHubEvent::Subscribe {
                identifier: self.identifier(),
                info: sub_info,
                result_sender,
            })
            .await
            .map_err(|_| SessionError {
                value: SessionErrorValue::StreamHubEventSendErr,
            })?;

        let data_receiver: DataReceiver = match result_receiver.await? {
            Ok((receiver, _statistic_sender)) => receiver,
            Err(_) => return self.reject_play_not_found().await,
        };
        let frame_receiver = data_receiver.frame_receiver.ok_or(SessionError {
            value: SessionErrorValue::NoneFrameDataReceiver,
        })?;

        let (msg_type_id, payload) = UserControlMessageWriter::write_stream_begin(self.common.stream_id)?;
        self.common.send_control_message(msg_type_id, &payload).await?;

        let (msg_type_id, payload) =
            NetStreamWriter::write_on_status(StatusLevel::Status, code::PLAY_RESET, "Playing and resetting stream.")?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await?;

        let (msg_type_id, payload) =
            NetStreamWriter::write_on_status(StatusLevel::Status, code::PLAY_START, "Started playing stream.")?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await?;

        self.stream_frames_to_client(frame_receiver).await
    }

    async fn reject_play(&mut self, reason: &str) -> Result<(), SessionError> {
        let (msg_type_id, payload) = NetStreamWriter::write_on_status(StatusLevel::Error, code::PLAY_FAILED, reason)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await?;
        self.ended = true;
        Ok(())
    }

    async fn reject_play_not_found(&mut self) -> Result<(), SessionError> {
        let (msg_type_id, payload) = NetStreamWriter::write_on_status(
            StatusLevel::Error,
            code::PLAY_STREAM_NOT_FOUND,
            "Stream not found.",
        )?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await?;
        self.ended = true;
        Ok(())
    }

    /// Relays frames from the hub to the client while still servicing
    /// whatever the client sends back (pings, `closeStream`, ...).
    async fn stream_frames_to_client(&mut self, mut frame_receiver: FrameDataReceiver) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                frame = frame_receiver.recv() => {
                    match frame {
                        Some(frame) => self.send_frame_to_client(frame).await?,
                        None => break,
                    }
                }
                result = self.read_and_dispatch_once() => {
                    if !result? || self.ended {
                        break;
                    }
                }
            }
        }

        self.ended = true;
        Ok(())
    }

    async fn send_frame_to_client(&mut self, frame: FrameData) -> Result<(), SessionError> {
        let (chunk_stream_id, msg_type_id, timestamp, data) = match frame {
            FrameData::Audio { timestamp, data } => {
                (chunk_stream_id::AUDIO, crate::rtmp::messages::define::msg_type_id::AUDIO, timestamp, data)
            }
            FrameData::Video { timestamp, data } => {
                (chunk_stream_id::VIDEO, crate::rtmp::messages::define::msg_type_id::VIDEO, timestamp, data)
            }
            FrameData::MetaData { timestamp, data } => {
                (chunk_stream_id::COMMAND, crate::rtmp::messages::define::msg_type_id::AMF0_DATA, timestamp, data)
            }
            FrameData::MediaInfo { .. } => return Ok(()),
        };

        // The RTMP chunk timestamp field is 32-bit on the wire; truncating
        // the 64-bit virtual timestamp back down here is the same kind of
        // wraparound the wire format itself already defines, not a loss of
        // the correction applied upstream.
        self.common
            .send_chunk(chunk_stream_id, timestamp as u32, msg_type_id, self.common.stream_id, &data)
            .await
    }

    /// Applies ATC correction and, if this call triggered a rebase (spec.md
    /// §4.D), notifies the hub so HLS/DASH segmenters can flag
    /// `EXT-X-DISCONTINUITY` (spec.md §4.E). Best-effort: a dropped
    /// notification only costs a missed discontinuity marker, not the
    /// stream itself, so the send result isn't propagated as a session error.
    async fn correct_timestamp(&mut self, raw: u32) -> i64 {
        let (corrected, rebased) = self.atc.correct_detecting_rebase(raw);
        if rebased {
            let _ = self
                .event_producer
                .send(StreamHubEvent::Discontinuity {
                    identifier: self.identifier(),
                })
                .await;
        }
        corrected
    }

    async fn handle_data(&mut self, values: Vec<Amf0Value>, timestamp: u32) -> Result<(), SessionError> {
        let timestamp = self.correct_timestamp(timestamp).await;
        let mut writer = Amf0Writer::new();
        for value in &values {
            writer.write_any(value)?;
        }
        let data = writer.extract_current_bytes();

        if let Some(handler) = &self.stream_handler {
            handler.save_metadata(data.clone(), timestamp).await;
        }

        self.forward_frame(FrameData::MetaData { timestamp, data }).await
    }

    async fn handle_audio(&mut self, timestamp: u32, data: BytesMut) -> Result<(), SessionError> {
        let timestamp = self.correct_timestamp(timestamp).await;
        if data.len() >= 2 {
            let sound_format = (data[0] >> 4) & 0x0F;
            let is_aac = sound_format == SoundFormat::AAC as u8;
            let is_seq_header = is_aac && data[1] == aac_packet_type::AAC_SEQHDR;

            if let Some(handler) = &self.stream_handler {
                if is_seq_header {
                    handler.save_audio_seq_header(data.clone(), timestamp).await;
                } else {
                    handler
                        .save_frame_data(FrameData::Audio { timestamp, data: data.clone() }, false)
                        .await;
                }
            }
        }

        self.forward_frame(FrameData::Audio { timestamp, data }).await
    }

    async fn handle_video(&mut self, timestamp: u32, data: BytesMut) -> Result<(), SessionError> {
        let timestamp = self.correct_timestamp(timestamp).await;
        if data.len() >= 2 {
            let frame_kind = (data[0] >> 4) & 0x0F;
            let codec_id = data[0] & 0x0F;
            let is_avc = codec_id == AvcCodecId::H264 as u8 || codec_id == AvcCodecId::Hevc as u8;
            let is_seq_header = is_avc && data[1] == avc_packet_type::AVC_SEQHDR;
            let is_key_frame = frame_kind == frame_type::KEY_FRAME;

            if let Some(handler) = &self.stream_handler {
                if is_seq_header {
                    handler.save_video_seq_header(data.clone(), timestamp).await;
                } else {
                    handler
                        .save_frame_data(FrameData::Video { timestamp, data: data.clone() }, is_key_frame)
                        .await;
                }
            }
        }

        self.forward_frame(FrameData::Video { timestamp, data }).await
    }

    async fn forward_frame(&mut self, frame: FrameData) -> Result<(), SessionError> {
        if let Some(sender) = &self.frame_sender {
            if sender.send(frame).await.is_err() {
                return Err(SessionError {
                    value: SessionErrorValue::SendFrameDataErr,
                });
            }
        }
        Ok(())
    }

    async fn on_session_end(&mut self) {
        match self.role {
            ClientRole::Publisher => {
                let _ = self
                    .event_producer
                    .send(StreamHubEvent::UnPublish {
                        identifier: self.identifier(),
                    })
                    .await;
                if let Some(auth) = &self.auth {
                    auth.on_unpublish(&self.app_name, &self.stream_name, self.query.as_deref())
                        .await;
                }
            }
            ClientRole::Player => {
                let sub_info = SubscriberInfo {
                    id: self.subscriber_id,
                    sub_type: SubscribeType::RtmpPull,
                    sub_data_type: SubDataType::Frame,
                    notify_info: NotifyInfo {
                        request_url: format!(
                            "rtmp://{}/{}/{}",
                            self.remote_addr, self.app_name, self.stream_name
                        ),
                        remote_addr: self.remote_addr.clone(),
                    },
                };
                let _ = self
                    .event_producer
                    .send(StreamHubEvent::UnSubscribe {
                        identifier: self.identifier(),
                        info: sub_info,
                    })
                    .await;
                if let Some(auth) = &self.auth {
                    auth.on_unplay(&self.app_name, &self.stream_name, self.query.as_deref())
                        .await;
                }
            }
            ClientRole::Unknown => {}
        }

        self.common.unpacketizer.clear_cached_headers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_stream_key_with_query() {
        let (name, query, params) = split_stream_key("room1?vhost=a&token=b");
        assert_eq!(name, "room1");
        assert_eq!(query.as_deref(), Some("vhost=a&token=b"));
        assert_eq!(params.get("vhost"), Some(&"a".to_string()));
        assert_eq!(params.get("token"), Some(&"b".to_string()));
    }

    #[test]
    fn splits_stream_key_without_query() {
        let (name, query, params) = split_stream_key("room1");
        assert_eq!(name, "room1");
        assert_eq!(query, None);
        assert!(params.is_empty());
    }

    #[test]
    fn resolves_vhost_fallback() {
        let mut params = HashMap::new();
        assert_eq!(resolve_vhost(&params), DEFAULT_VHOST);
        params.insert("domain".to_string(), "b.example".to_string());
        assert_eq!(resolve_vhost(&params), "b.example");
        params.insert("vhost".to_string(), "a.example".to_string());
        assert_eq!(resolve_vhost(&params), "a.example");
    }
}
