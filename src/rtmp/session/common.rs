use std::fmt;

use bytes::BytesMut;

use crate::bytesio::bytesio::BytesIO;
use crate::rtmp::chunk::packetizer::ChunkPacketizer;
use crate::rtmp::chunk::unpacketizer::ChunkUnpacketizer;

use super::errors::SessionError;

/// Which side of the handshake a session plays: controls whether it drives
/// `ServerHandshake` or `ClientHandshake`, and who assigns the message
/// stream id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Server,
    Client,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Chunk stream id conventions used for the message kinds a session sends.
pub mod chunk_stream_id {
    pub const COMMAND: u32 = 3;
    pub const AUDIO: u32 = 4;
    pub const VIDEO: u32 = 5;
}

/// Chunk-stream plumbing shared by `ServerSession` and `ClientSession`:
/// owns the socket, the packetizer/unpacketizer pair, and the negotiated
/// message stream id.
pub struct Common {
    pub io: BytesIO,
    pub packetizer: ChunkPacketizer,
    pub unpacketizer: ChunkUnpacketizer,
    pub session_type: SessionType,
    pub stream_id: u32,
}

impl Common {
    #[must_use]
    pub fn new(io: BytesIO, session_type: SessionType) -> Self {
        Self {
            io,
            packetizer: ChunkPacketizer::new(),
            unpacketizer: ChunkUnpacketizer::new(),
            session_type,
            stream_id: 0,
        }
    }

    /// Flushes whatever the packetizer has queued to the socket.
    pub async fn flush(&mut self) -> Result<(), SessionError> {
        let data = self.packetizer.extract_current_bytes();
        if data.is_empty() {
            return Ok(());
        }
        self.io.write(&data).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Packetizes and flushes a message on the reserved control chunk
    /// stream (protocol control and user control messages).
    pub async fn send_control_message(
        &mut self,
        msg_type_id: u8,
        payload: &BytesMut,
    ) -> Result<(), SessionError> {
        self.packetizer
            .write_control_message(msg_type_id, payload)?;
        self.flush().await
    }

    /// Packetizes and flushes a message on an arbitrary chunk stream,
    /// stamped with the given timestamp and message stream id.
    pub async fn send_chunk(
        &mut self,
        chunk_stream_id: u32,
        timestamp: u32,
        msg_type_id: u8,
        msg_stream_id: u32,
        payload: &BytesMut,
    ) -> Result<(), SessionError> {
        self.packetizer
            .write_chunk(chunk_stream_id, timestamp, msg_type_id, msg_stream_id, payload)?;
        self.flush().await
    }
}
