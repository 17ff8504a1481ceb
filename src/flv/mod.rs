pub mod amf0;
pub mod define;
pub mod demuxer;
pub mod errors;
pub mod flv_tag_header;
pub mod mpeg4_aac;
pub mod mpeg4_avc;
pub mod muxer;

use crate::bytesio::bytes_reader::BytesReader;
use errors::FlvDemuxerError;

/// Types that can be parsed out of a positioned `BytesReader`, used for the
/// fixed-layout FLV tag headers (`AudioTagHeader`/`VideoTagHeader`).
pub trait Unmarshal<T> {
    fn unmarshal(reader: &mut BytesReader) -> Result<T, FlvDemuxerError>;
}
