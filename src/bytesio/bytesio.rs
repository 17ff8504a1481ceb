use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::bytesio_errors::{BytesIOError, BytesIOErrorValue};

/// Thin async I/O wrapper around a `TcpStream` with an idle read timeout.
/// This is the only place raw socket reads/writes happen; everything above
/// it deals in `BytesMut`/`BytesReader`.
pub struct BytesIO {
    stream: TcpStream,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl BytesIO {
    #[must_use]
    pub fn new(stream: TcpStream, read_timeout: Duration, write_timeout: Duration) -> Self {
        let _ = stream.set_nodelay(true);
        Self {
            stream,
            read_timeout,
            write_timeout,
        }
    }

    pub async fn read(&mut self) -> Result<BytesMut, BytesIOError> {
        let mut buf = [0_u8; 4096];
        let n = tokio::time::timeout(self.read_timeout, self.stream.read(&mut buf))
            .await
            .map_err(|e| BytesIOErrorValue::TimeoutError(e))?
            .map_err(BytesIOErrorValue::IOError)?;

        if n == 0 {
            return Err(BytesIOErrorValue::EmptyStream.into());
        }
        Ok(BytesMut::from(&buf[..n]))
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), BytesIOError> {
        tokio::time::timeout(self.write_timeout, self.stream.write_all(data))
            .await
            .map_err(|e| BytesIOErrorValue::TimeoutError(e))?
            .map_err(BytesIOErrorValue::IOError)?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), BytesIOError> {
        self.stream.flush().await.map_err(BytesIOErrorValue::IOError)?;
        Ok(())
    }

    #[must_use]
    pub fn peer_addr(&self) -> Option<std::net::SocketAddr> {
        self.stream.peer_addr().ok()
    }
}
