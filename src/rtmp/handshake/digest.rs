use super::define::{Schema, DIGEST_LENGTH};
use super::errors::{DigestError, DigestErrorValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; DIGEST_LENGTH], DigestError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| DigestErrorValue::HmacInitError)?;
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; DIGEST_LENGTH];
    out.copy_from_slice(&result);
    Ok(out)
}

/// Offset (within the 764-byte digest block) of the 4-byte field that
/// encodes where the embedded digest itself begins.
const fn digest_block_offset_field(schema_offset: usize) -> usize {
    schema_offset
}

/// Computes where inside a 764-byte digest block (at `block_offset` within
/// the full handshake packet) the 32-byte digest starts, from the offset
/// field's value mod 728 (764 - 4 - 32).
fn digest_start(packet: &[u8], block_offset: usize) -> Result<usize, DigestError> {
    let field = digest_block_offset_field(0);
    let offset_bytes = packet
        .get(block_offset + field..block_offset + field + 4)
        .ok_or(DigestErrorValue::DigestLengthNotCorrect)?;
    let sum = u32::from(offset_bytes[0])
        + u32::from(offset_bytes[1])
        + u32::from(offset_bytes[2])
        + u32::from(offset_bytes[3]);
    let offset = (sum % 728) as usize;
    Ok(block_offset + 4 + offset)
}

/// Computes the HMAC-SHA256 digest for a C1/S1-shaped 1536-byte handshake
/// packet under the given `schema`, with the embedded digest bytes zeroed
/// out of the hashed message per the spec's digest handshake algorithm.
pub fn compute_packet_digest(
    packet: &[u8],
    schema: Schema,
    key: &[u8],
) -> Result<[u8; DIGEST_LENGTH], DigestError> {
    let digest_pos = digest_start(packet, schema.digest_block_offset())?;
    if digest_pos + DIGEST_LENGTH > packet.len() {
        return Err(DigestErrorValue::DigestLengthNotCorrect.into());
    }

    let mut message = Vec::with_capacity(packet.len() - DIGEST_LENGTH);
    message.extend_from_slice(&packet[..digest_pos]);
    message.extend_from_slice(&packet[digest_pos + DIGEST_LENGTH..]);

    hmac_sha256(key, &message)
}

/// Tries to validate `packet` (a `C1`) against `schema` using `client_key`;
/// returns the digest position and whether it matched.
pub fn verify_packet_digest(
    packet: &[u8],
    schema: Schema,
    client_key: &[u8],
) -> Result<(usize, bool), DigestError> {
    let digest_pos = digest_start(packet, schema.digest_block_offset())?;
    if digest_pos + DIGEST_LENGTH > packet.len() {
        return Err(DigestErrorValue::DigestLengthNotCorrect.into());
    }
    let expected = compute_packet_digest(packet, schema, client_key)?;
    let matches = packet[digest_pos..digest_pos + DIGEST_LENGTH] == expected;
    Ok((digest_pos, matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_is_deterministic() {
        let a = hmac_sha256(b"key", b"message").unwrap();
        let b = hmac_sha256(b"key", b"message").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_messages_differ() {
        let a = hmac_sha256(b"key", b"message-a").unwrap();
        let b = hmac_sha256(b"key", b"message-b").unwrap();
        assert_ne!(a, b);
    }
}
