pub mod amf0_reader;
pub mod amf0_writer;
pub mod errors;

use indexmap::IndexMap;

/// An AMF0 value (ISO/IEC unofficial "AMF 0" spec, used by RTMP command
/// messages and the FLV `onMetaData` script tag).
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    Utf8String(String),
    Object(IndexMap<String, Amf0Value>),
    Null,
    Undefined,
    EcmaArray(IndexMap<String, Amf0Value>),
    StrictArray(Vec<Amf0Value>),
    Date { timestamp: f64, timezone: i16 },
}

pub mod amf0_markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIE_CLIP: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
}
