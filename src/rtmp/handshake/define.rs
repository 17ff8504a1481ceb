/// RTMP handshake packet size: `C1`/`S1`/`C2`/`S2` are each exactly this many
/// bytes (spec §5.2).
pub const RTMP_HANDSHAKE_SIZE: usize = 1536;

/// `C0`/`S0` version byte value this implementation speaks.
pub const RTMP_VERSION: u8 = 3;

/// Length of the HMAC-SHA256 digest embedded in the complex-handshake
/// digest block.
pub const DIGEST_LENGTH: usize = 32;

/// Byte length of the digest block's key field (complex handshake).
pub const KEY_LENGTH: usize = 128;

/// Partial client key used to validate/sign `C1`/`C2` digests: the literal
/// prefix of Adobe's well-known Flash Player key, without the 32 bytes of
/// shared constant key material appended for the full key.
pub const FP_KEY: &[u8] = b"Genuine Adobe Flash Player 001";

/// Partial server key used to sign `S1`, analogous to [`FP_KEY`].
pub const FMS_KEY: &[u8] = b"Genuine Adobe Flash Media Server 001";

/// Shared constant suffix appended to [`FP_KEY`]/[`FMS_KEY`] to form the
/// full 62/68-byte keys used for `S2`'s HMAC (spec's digest handshake,
/// widely documented in third-party RTMP implementations).
pub const KEY_SUFFIX: [u8; 32] = [
    0xf0, 0xee, 0xc2, 0x4a, 0x80, 0x68, 0xbe, 0xe8, 0x2e, 0x00, 0xd0, 0xd1, 0x02, 0x9e, 0x7e, 0x57,
    0x6e, 0xec, 0x5d, 0x2d, 0x29, 0x80, 0x6f, 0xab, 0x93, 0xb8, 0xe6, 0x36, 0xcf, 0xeb, 0x31, 0xae,
];

/// Handshake digest layout (spec's C1/S1 "digest handshake" extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `time | version | key-block | digest-block`
    Schema0,
    /// `time | version | digest-block | key-block`
    Schema1,
}

impl Schema {
    #[must_use]
    pub const fn digest_block_offset(self) -> usize {
        match self {
            Self::Schema0 => 8 + 764,
            Self::Schema1 => 8,
        }
    }
}
