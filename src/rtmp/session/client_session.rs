use std::time::Duration;

use bytes::BytesMut;
use tokio::net::TcpStream;

use crate::bytesio::bytesio::BytesIO;
use crate::bytesio::bytesio_errors::BytesIOErrorValue;
use crate::flv::amf0::Amf0Value;
use crate::rtmp::chunk::unpacketizer::UnpackResult;
use crate::rtmp::config::RtmpConfig;
use crate::rtmp::handshake::ClientHandshake;
use crate::rtmp::messages::{MessageParser, RtmpMessageData};
use crate::rtmp::netconnection::NetConnectionWriter;
use crate::rtmp::netstream::NetStreamWriter;
use crate::rtmp::protocol_control_messages::ProtocolControlMessagesWriter;
use crate::rtmp::user_control_messages::UserControlEvent;
use crate::streamhub::define::FrameData;

use super::chunk::errors::UnpackErrorValue;
use super::common::{chunk_stream_id, Common, SessionType};
use super::errors::{SessionError, SessionErrorValue};

/// Outbound RTMP session: the `relay` module's half of the protocol,
/// mirroring `ServerSession`'s chunk-stream plumbing but driving the client
/// side of handshake/`connect`/`createStream` against an upstream server.
///
/// One `ClientSession` is either a puller (`play`, feeding frames to
/// `relay::pull::EdgePuller`) or a pusher (`publish`, fed frames by
/// `relay::push::Forwarder`) — never both.
pub struct ClientSession {
    common: Common,
    app_name: String,
    next_transaction_id: f64,
}

impl ClientSession {
    /// Opens the TCP connection, performs the handshake, and completes
    /// `connect`. `addr` is the upstream's `host:port`; `app_name` and
    /// `tc_url` populate the `connect` command object the way a real RTMP
    /// client would.
    pub async fn connect(addr: &str, app_name: &str, tc_url: &str, config: &RtmpConfig) -> Result<Self, SessionError> {
        let stream = tokio::time::timeout(Duration::from_secs(10), TcpStream::connect(addr))
            .await
            .map_err(|_| SessionError { value: SessionErrorValue::Timeout })?
            .map_err(|e| SessionError {
                value: SessionErrorValue::BytesIOError(crate::bytesio::bytesio_errors::BytesIOError {
                    value: BytesIOErrorValue::IOError(e),
                }),
            })?;

        let io = BytesIO::new(stream, config.read_timeout, config.write_timeout);
        let mut session = Self {
            common: Common::new(io, SessionType::Client),
            app_name: app_name.to_string(),
            next_transaction_id: 1.0,
        };

        ClientHandshake::handshake(&mut session.common.io).await?;

        let transaction_id = session.next_transaction_id();
        let (msg_type_id, payload) = NetConnectionWriter::write_connect(transaction_id, app_name, tc_url)?;
        session
            .common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, 0, &payload)
            .await?;
        session.await_command("_result").await?;

        Ok(session)
    }

    fn next_transaction_id(&mut self) -> f64 {
        let id = self.next_transaction_id;
        self.next_transaction_id += 1.0;
        id
    }

    /// Sends `createStream` and waits for its `_result`, recording the
    /// server-assigned message stream id.
    pub async fn create_stream(&mut self) -> Result<(), SessionError> {
        let transaction_id = self.next_transaction_id();
        let (msg_type_id, payload) = NetConnectionWriter::write_create_stream(transaction_id)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, 0, &payload)
            .await?;

        let values = self.await_command("_result").await?;
        if let Some(Amf0Value::Number(stream_id)) = values.get(2) {
            self.common.stream_id = *stream_id as u32;
        }
        Ok(())
    }

    /// Sends `play`, leaving the session ready for `recv_frame`.
    pub async fn play(&mut self, stream_name: &str) -> Result<(), SessionError> {
        let transaction_id = self.next_transaction_id();
        let (msg_type_id, payload) = NetStreamWriter::write_play(transaction_id, stream_name)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await
    }

    /// Sends `publish`, leaving the session ready for `send_frame`.
    pub async fn publish(&mut self, stream_name: &str) -> Result<(), SessionError> {
        let transaction_id = self.next_transaction_id();
        let (msg_type_id, payload) = NetStreamWriter::write_publish(transaction_id, stream_name)?;
        self.common
            .send_chunk(chunk_stream_id::COMMAND, 0, msg_type_id, self.common.stream_id, &payload)
            .await
    }

    /// Reads chunks off the wire until a full command message named `name`
    /// is parsed, servicing chunk-size/ping control messages along the way.
    /// Returns that command's AMF value list.
    async fn await_command(&mut self, name: &str) -> Result<Vec<Amf0Value>, SessionError> {
        loop {
            if let Some(values) = self.read_one_command()? {
                if let Some(Amf0Value::Utf8String(command_name)) = values.first() {
                    if command_name == name || command_name == "onStatus" {
                        return Ok(values);
                    }
                }
                continue;
            }

            let data = self.common.io.read().await?;
            self.common.unpacketizer.extend_data(&data)?;
        }
    }

    /// Drains whatever whole chunks are already buffered, returning the
    /// first command message's AMF values if one completed.
    fn read_one_command(&mut self) -> Result<Option<Vec<Amf0Value>>, SessionError> {
        loop {
            match self.common.unpacketizer.read_chunks() {
                Ok(UnpackResult::Chunks(chunks)) => {
                    for chunk in chunks {
                        let msg_type_id = chunk.message_header.msg_type_id;
                        let timestamp = chunk.message_header.timestamp;
                        match MessageParser::parse(msg_type_id, timestamp, chunk.payload)? {
                            RtmpMessageData::SetChunkSize(size) => {
                                self.common.unpacketizer.update_max_chunk_size(size as usize);
                            }
                            RtmpMessageData::AmfCommand { values, .. } => return Ok(Some(values)),
                            _ => {}
                        }
                    }
                }
                Ok(_) => return Ok(None),
                Err(err) => {
                    if matches!(err.value, UnpackErrorValue::EmptyChunks) {
                        return Ok(None);
                    }
                    return Err(err.into());
                }
            }
        }
    }

    /// Reads off the wire until the next audio/video/metadata message,
    /// returning it as a hub-ready `FrameData`. Used by `EdgePuller` once
    /// `play` has been acknowledged.
    pub async fn recv_frame(&mut self) -> Result<Option<FrameData>, SessionError> {
        loop {
            if let Some(frame) = self.next_buffered_frame().await? {
                return Ok(Some(frame));
            }

            let data = match self.common.io.read().await {
                Ok(data) => data,
                Err(err) => {
                    if matches!(err.value, BytesIOErrorValue::EmptyStream) {
                        return Ok(None);
                    }
                    return Err(err.into());
                }
            };
            self.common.unpacketizer.extend_data(&data)?;
        }
    }

    async fn next_buffered_frame(&mut self) -> Result<Option<FrameData>, SessionError> {
        loop {
            match self.common.unpacketizer.read_chunks() {
                Ok(UnpackResult::Chunks(chunks)) => {
                    for chunk in chunks {
                        let msg_type_id = chunk.message_header.msg_type_id;
                        let timestamp = chunk.message_header.timestamp;
                        match MessageParser::parse(msg_type_id, timestamp, chunk.payload)? {
                            RtmpMessageData::Audio { timestamp, data } => {
                                return Ok(Some(FrameData::Audio { timestamp: i64::from(timestamp), data }))
                            }
                            RtmpMessageData::Video { timestamp, data } => {
                                return Ok(Some(FrameData::Video { timestamp: i64::from(timestamp), data }))
                            }
                            RtmpMessageData::AmfData { values, timestamp } => {
                                let mut writer = crate::flv::amf0::amf0_writer::Amf0Writer::new();
                                for value in &values {
                                    writer.write_any(value)?;
                                }
                                return Ok(Some(FrameData::MetaData { timestamp: i64::from(timestamp), data: writer.extract_current_bytes() }));
                            }
                            RtmpMessageData::SetChunkSize(size) => {
                                self.common.unpacketizer.update_max_chunk_size(size as usize);
                            }
                            RtmpMessageData::UserControl(UserControlEvent::PingRequest { timestamp }) => {
                                let (msg_type_id, payload) =
                                    crate::rtmp::user_control_messages::UserControlMessageWriter::write_ping_response(timestamp)?;
                                self.common.send_control_message(msg_type_id, &payload).await?;
                            }
                            _ => {}
                        }
                    }
                }
                Ok(_) => return Ok(None),
                Err(err) => {
                    if matches!(err.value, UnpackErrorValue::EmptyChunks) {
                        return Ok(None);
                    }
                    return Err(err.into());
                }
            }
        }
    }

    /// Writes one frame out as an RTMP chunk. Used by `Forwarder` once
    /// `publish` has been acknowledged.
    pub async fn send_frame(&mut self, frame: FrameData) -> Result<(), SessionError> {
        let (chunk_stream_id, msg_type_id, timestamp, data): (u32, u8, i64, BytesMut) = match frame {
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

        // Truncate the 64-bit virtual timestamp back to the wire's 32-bit
        // chunk timestamp field, same as `ServerSession::send_frame_to_client`.
        self.common
            .send_chunk(chunk_stream_id, timestamp as u32, msg_type_id, self.common.stream_id, &data)
            .await
    }

    /// Advertises our own preferred chunk size right after `connect`,
    /// mirroring what `ServerSession::handle_connect` sends a publisher.
    pub async fn set_chunk_size(&mut self, chunk_size: u32) -> Result<(), SessionError> {
        let (msg_type_id, payload) = ProtocolControlMessagesWriter::write_set_chunk_size(chunk_size)?;
        self.common.send_control_message(msg_type_id, &payload).await?;
        self.common.packetizer.update_max_chunk_size(chunk_size as usize);
        Ok(())
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}
