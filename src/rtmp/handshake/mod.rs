pub mod define;
pub mod digest;
pub mod errors;

use crate::bytesio::bytesio::BytesIO;
use bytes::BytesMut;
use define::{Schema, DIGEST_LENGTH, FMS_KEY, FP_KEY, KEY_SUFFIX, RTMP_HANDSHAKE_SIZE, RTMP_VERSION};
use errors::{HandshakeError, HandshakeErrorValue};
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Server-side RTMP handshake (spec §5.2): reads `C0`/`C1`, replies with
/// `S0`/`S1`/`S2`, then consumes `C2`. Auto-detects whether the client is
/// doing the plain random handshake or the HMAC "digest" handshake schema 0
/// or 1, and replies in kind.
pub struct ServerHandshake;

impl ServerHandshake {
    /// Drives the full handshake over a raw socket. Must run before any
    /// chunk-stream data is read from `io`.
    pub async fn handshake(io: &mut BytesIO) -> Result<(), HandshakeError> {
        let mut buf = BytesMut::new();
        while buf.len() < 1 + RTMP_HANDSHAKE_SIZE {
            let chunk = io.read().await?;
            buf.extend_from_slice(&chunk);
        }

        let c0 = buf[0];
        if c0 != RTMP_VERSION {
            return Err(HandshakeErrorValue::S0VersionNotCorrect.into());
        }
        let c1 = buf[1..1 + RTMP_HANDSHAKE_SIZE].to_vec();
        let leftover = buf.split_off(1 + RTMP_HANDSHAKE_SIZE);

        let full_server_key: Vec<u8> = FMS_KEY.iter().chain(KEY_SUFFIX.iter()).copied().collect();

        let detected_schema = [Schema::Schema0, Schema::Schema1]
            .into_iter()
            .find_map(|schema| match digest::verify_packet_digest(&c1, schema, FP_KEY) {
                Ok((_, true)) => Some(schema),
                _ => None,
            });

        let (s0, s1, s2) = match detected_schema {
            Some(schema) => Self::build_complex_response(&c1, schema, &full_server_key)?,
            None => Self::build_simple_response(&c1),
        };

        io.write(&[s0]).await?;
        io.write(&s1).await?;
        io.write(&s2).await?;
        io.flush().await?;

        // Consume C2; we don't need its contents beyond draining it off the wire.
        let mut remaining = RTMP_HANDSHAKE_SIZE.saturating_sub(leftover.len());
        while remaining > 0 {
            let chunk = io.read().await?;
            remaining = remaining.saturating_sub(chunk.len());
        }

        Ok(())
    }

    fn build_simple_response(c1: &[u8]) -> (u8, Vec<u8>, Vec<u8>) {
        let s1 = random_handshake_packet();
        // S2 simple handshake is conventionally an echo of C1.
        let s2 = c1.to_vec();
        (RTMP_VERSION, s1, s2)
    }

    fn build_complex_response(
        c1: &[u8],
        schema: Schema,
        full_server_key: &[u8],
    ) -> Result<(u8, Vec<u8>, Vec<u8>), HandshakeError> {
        let mut s1 = random_handshake_packet();
        let digest_pos = schema.digest_block_offset() + 4;
        let server_digest = digest::compute_packet_digest(&s1, schema, FMS_KEY)?;
        s1[digest_pos..digest_pos + DIGEST_LENGTH].copy_from_slice(&server_digest);

        // S2: random payload whose trailing 32 bytes are an HMAC of the
        // leading bytes, keyed by HMAC(full_server_key, client's C1 digest).
        let (client_digest_pos, _) = digest::verify_packet_digest(c1, schema, FP_KEY)?;
        let client_digest = &c1[client_digest_pos..client_digest_pos + DIGEST_LENGTH];
        let s2_key = digest::hmac_sha256(full_server_key, client_digest)?;

        let mut s2 = random_handshake_packet();
        let sign_pos = RTMP_HANDSHAKE_SIZE - DIGEST_LENGTH;
        let signature = digest::hmac_sha256(&s2_key, &s2[..sign_pos])?;
        s2[sign_pos..].copy_from_slice(&signature);

        Ok((RTMP_VERSION, s1, s2))
    }
}

/// Client-side RTMP handshake: writes `C0`/`C1`, reads `S0`/`S1`/`S2`, then
/// replies with `C2`. Used by `relay`'s outbound sessions (pulling from or
/// pushing to an upstream RTMP server). Always does the plain handshake —
/// the digest handshake exists to let Flash clients prove they're genuine
/// Flash Player builds, a check this crate has no reason to perform or
/// satisfy when acting as a client against another RTMP server.
pub struct ClientHandshake;

impl ClientHandshake {
    pub async fn handshake(io: &mut BytesIO) -> Result<(), HandshakeError> {
        let c1 = random_handshake_packet();

        io.write(&[RTMP_VERSION]).await?;
        io.write(&c1).await?;
        io.flush().await?;

        let mut buf = BytesMut::new();
        while buf.len() < 1 + 2 * RTMP_HANDSHAKE_SIZE {
            let chunk = io.read().await?;
            buf.extend_from_slice(&chunk);
        }

        let s0 = buf[0];
        if s0 != RTMP_VERSION {
            return Err(HandshakeErrorValue::S0VersionNotCorrect.into());
        }
        let s1 = buf[1..1 + RTMP_HANDSHAKE_SIZE].to_vec();

        // C2 conventionally echoes S1 back.
        io.write(&s1).await?;
        io.flush().await?;

        Ok(())
    }
}

fn random_handshake_packet() -> Vec<u8> {
    let mut packet = vec![0u8; RTMP_HANDSHAKE_SIZE];
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    packet[0..4].copy_from_slice(&time.to_be_bytes());
    packet[4..8].copy_from_slice(&[0, 0, 0, 1]);
    rand::thread_rng().fill(&mut packet[8..]);
    packet
}
