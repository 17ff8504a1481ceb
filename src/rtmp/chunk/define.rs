/// Negotiated chunk size before any `SetChunkSize` control message (RTMP
/// spec §5.4.1 default).
pub const INIT_CHUNK_SIZE: u32 = 128;

/// Upper bound accepted from a peer's `SetChunkSize`; values above this are
/// rejected rather than trusted, since chunk size also sizes our read buffer.
pub const MAX_CHUNK_SIZE: u32 = 0x00FF_FFFF;

/// Basic header format byte, cs id 2 is reserved for low-level protocol
/// control messages per the RTMP spec.
pub const CONTROL_CHUNK_STREAM_ID: u32 = 2;
