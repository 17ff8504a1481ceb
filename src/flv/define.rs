use bytes::BytesMut;
use serde::Serialize;

/// FLV tag type byte (first byte of the tag header).
pub mod tag_type {
    pub const AUDIO: u8 = 8;
    pub const VIDEO: u8 = 9;
    pub const SCRIPT: u8 = 18;
}

/// High nibble of the video tag's first byte (`FrameType`).
pub mod frame_type {
    pub const KEY_FRAME: u8 = 1;
    pub const INTER_FRAME: u8 = 2;
    pub const DISPOSABLE_INTER_FRAME: u8 = 3;
    pub const GENERATED_KEY_FRAME: u8 = 4;
    pub const VIDEO_INFO_OR_COMMAND_FRAME: u8 = 5;
}

/// First byte of an AVC video tag's payload (`AVCPacketType`).
pub mod avc_packet_type {
    pub const AVC_SEQHDR: u8 = 0;
    pub const AVC_NALU: u8 = 1;
    pub const AVC_END_OF_SEQUENCE: u8 = 2;
}

/// First byte of an AAC audio tag's payload (`AACPacketType`).
pub mod aac_packet_type {
    pub const AAC_SEQHDR: u8 = 0;
    pub const AAC_RAW: u8 = 1;
}

/// Low nibble of the video tag's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum AvcCodecId {
    Unknown = 0,
    SorensonH263 = 2,
    ScreenVideo = 3,
    Vp6 = 4,
    Vp6WithAlpha = 5,
    ScreenVideoV2 = 6,
    H264 = 7,
    Hevc = 12,
}

impl Default for AvcCodecId {
    fn default() -> Self {
        Self::Unknown
    }
}

/// High nibble of the audio tag's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum SoundFormat {
    LinearPcmPlatformEndian = 0,
    AdPcm = 1,
    Mp3 = 2,
    LinearPcmLittleEndian = 3,
    Nellymoser16kHzMono = 4,
    Nellymoser8kHzMono = 5,
    Nellymoser = 6,
    G711ALawLogarithmicPcm = 7,
    G711MuLawLogarithmicPcm = 8,
    Reserved = 9,
    AAC = 10,
    Speex = 11,
    Mp3_8kHz = 14,
    DeviceSpecificSound = 15,
}

impl Default for SoundFormat {
    fn default() -> Self {
        Self::Reserved
    }
}

/// `AVCDecoderConfigurationRecord.AVCProfileIndication`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum AvcProfile {
    Unknown = 0,
    Baseline = 66,
    Main = 77,
    Extended = 88,
    High = 100,
    High10 = 110,
    High422 = 122,
    High444 = 244,
}

impl Default for AvcProfile {
    fn default() -> Self {
        Self::Unknown
    }
}

/// `AVCDecoderConfigurationRecord.AVCLevelIndication`, stored as the raw
/// `level_idc * 10` value (e.g. level 3.1 == 31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct AvcLevel(pub u32);

/// `AudioSpecificConfig.audioObjectType`, the MPEG-4 Audio Object Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum AacProfile {
    Unknown = 0,
    Main = 1,
    LowComplexity = 2,
    Ssr = 3,
    LongTermPrediction = 4,
    HeAac = 5,
}

impl Default for AacProfile {
    fn default() -> Self {
        Self::Unknown
    }
}

/// A demuxed FLV media tag, stripped of container framing but still
/// carrying the raw tag-type-specific payload for downstream processing.
///
/// `timestamp` carries the full 64-bit virtual timeline (same value as
/// `FrameData`'s) when built from a hub frame; when read straight off an
/// actual FLV byte stream it's the tag's 32-bit wire timestamp widened to
/// fit the same field. Writers (`FlvMuxer`) truncate it back to the wire's
/// 24-bit-plus-extension timestamp at serialization time.
#[derive(Debug, Clone)]
pub enum FlvData {
    Audio { timestamp: i64, data: BytesMut },
    Video { timestamp: i64, data: BytesMut },
}
