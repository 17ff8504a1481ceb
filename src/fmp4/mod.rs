//! Fragmented MP4 (ISO BMFF) writer used by DASH segmenting (spec §4.F).
//!
//! Mirrors `mpegts::ts::TsMuxer`'s mux-only shape: this module never needs to
//! parse fMP4 back, so there is no reader side. Video and audio are kept as
//! separate representations (track 1 / track 2) each with their own init
//! segment and a stream of media segments, which is the conventional DASH
//! layout and keeps `moof`/`trun` simple (one track per fragment).

pub mod boxes;
pub mod errors;

use bytes::BytesMut;

pub use boxes::TrunSample;
use errors::Fmp4Error;

/// Track id conventions used throughout the DASH module: never 0, video
/// first so a single-track player defaults to it.
pub const VIDEO_TRACK_ID: u32 = 1;
pub const AUDIO_TRACK_ID: u32 = 2;

/// Timescale for both tracks. RTMP timestamps already arrive in
/// milliseconds, so using 1000 lets segment/sample durations pass through
/// unmodified instead of needing a rescale step.
pub const TIMESCALE: u32 = 1000;

/// Builds the one-time initialization segment for the video representation:
/// `ftyp` + `moov` with a single `avc1` (or `hvc1`, if `is_hevc`) track.
pub fn build_video_init_segment(width: u32, height: u32, avc_decoder_config: &[u8], is_hevc: bool) -> Result<BytesMut, Fmp4Error> {
    let sample_entry_box = if is_hevc {
        let hvcc = boxes::hvcc(avc_decoder_config)?;
        boxes::hvc1(width as u16, height as u16, &hvcc)?
    } else {
        let avcc = boxes::avcc(avc_decoder_config)?;
        boxes::avc1(width as u16, height as u16, &avcc)?
    };
    let stbl_box = boxes::stbl(&sample_entry_box)?;
    let trak_box = boxes::trak(VIDEO_TRACK_ID, TIMESCALE, width, height, true, stbl_box)?;
    let mvex_box = boxes::mvex(&[VIDEO_TRACK_ID])?;
    let moov_box = boxes::write_container_box(b"moov", &[boxes::mvhd(TIMESCALE, VIDEO_TRACK_ID + 1)?, trak_box, mvex_box])?;

    let mut out = BytesMut::new();
    out.extend_from_slice(&boxes::ftyp()?);
    out.extend_from_slice(&moov_box);
    Ok(out)
}

/// Builds the one-time initialization segment for the audio representation:
/// `ftyp` + `moov` with a single `mp4a` track.
pub fn build_audio_init_segment(channels: u16, sample_rate: u32, audio_specific_config: &[u8]) -> Result<BytesMut, Fmp4Error> {
    let esds_box = boxes::esds(audio_specific_config)?;
    let sample_entry_box = boxes::mp4a(channels, sample_rate, &esds_box)?;
    let stbl_box = boxes::stbl(&sample_entry_box)?;
    let trak_box = boxes::trak(AUDIO_TRACK_ID, TIMESCALE, 0, 0, false, stbl_box)?;
    let mvex_box = boxes::mvex(&[AUDIO_TRACK_ID])?;
    let moov_box = boxes::write_container_box(b"moov", &[boxes::mvhd(TIMESCALE, AUDIO_TRACK_ID + 1)?, trak_box, mvex_box])?;

    let mut out = BytesMut::new();
    out.extend_from_slice(&boxes::ftyp()?);
    out.extend_from_slice(&moov_box);
    Ok(out)
}

/// Builds one standalone media segment: `styp` + `sidx` + `moof` + `mdat`.
///
/// `samples` and `payload` must agree: `payload` is every sample's raw
/// bytes concatenated in order, `samples[i].size` is the i-th sample's byte
/// length within `payload`.
pub fn build_media_segment(
    track_id: u32,
    is_video: bool,
    sequence_number: u32,
    base_media_decode_time: u64,
    samples: &[TrunSample],
    payload: &[u8],
) -> Result<BytesMut, Fmp4Error> {
    let duration: u32 = samples.iter().map(|s| s.duration).sum();
    let moof_box = boxes::moof(sequence_number, track_id, base_media_decode_time, samples, is_video)?;
    let mdat_box = boxes::mdat(payload)?;
    let sidx_box = boxes::sidx(track_id, TIMESCALE, base_media_decode_time, duration, (moof_box.len() + mdat_box.len()) as u32);

    let mut out = BytesMut::new();
    out.extend_from_slice(&boxes::styp()?);
    out.extend_from_slice(&sidx_box?);
    out.extend_from_slice(&moof_box);
    out.extend_from_slice(&mdat_box);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_len_matches(buf: &[u8]) -> bool {
        let declared = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        declared == buf.len()
    }

    #[test]
    fn ftyp_length_is_self_consistent() {
        let ftyp = boxes::ftyp().unwrap();
        assert!(box_len_matches(&ftyp));
        assert_eq!(&ftyp[4..8], b"ftyp");
    }

    #[test]
    fn video_init_segment_contains_ftyp_and_moov() {
        let avc_decoder_config = [
            0x01, 0x42, 0x00, 0x1e, 0xff, 0xe1, 0x00, 0x04, 0x67, 0x42, 0x00, 0x1e, 0x01, 0x00, 0x04, 0x68, 0xce, 0x3c, 0x80,
        ];
        let seg = build_video_init_segment(1920, 1080, &avc_decoder_config, false).unwrap();
        assert_eq!(&seg[4..8], b"ftyp");
        let ftyp_len = u32::from_be_bytes([seg[0], seg[1], seg[2], seg[3]]) as usize;
        assert_eq!(&seg[ftyp_len + 4..ftyp_len + 8], b"moov");
        let moov_len = u32::from_be_bytes(seg[ftyp_len..ftyp_len + 4].try_into().unwrap());
        assert_eq!(ftyp_len + moov_len as usize, seg.len());
    }

    #[test]
    fn audio_init_segment_contains_ftyp_and_moov() {
        let asc = [0x12, 0x10]; // AAC-LC, 44.1kHz, stereo
        let seg = build_audio_init_segment(2, 44_100, &asc).unwrap();
        assert_eq!(&seg[4..8], b"ftyp");
    }

    #[test]
    fn media_segment_moof_and_mdat_sizes_are_consistent() {
        let samples = vec![
            TrunSample { duration: 33, size: 100, cts_offset: 0, is_keyframe: true },
            TrunSample { duration: 33, size: 80, cts_offset: 1, is_keyframe: false },
        ];
        let payload = vec![0u8; 180];
        let seg = build_media_segment(VIDEO_TRACK_ID, true, 1, 0, &samples, &payload).unwrap();

        // styp
        assert_eq!(&seg[4..8], b"styp");
        let styp_len = u32::from_be_bytes(seg[0..4].try_into().unwrap()) as usize;
        let mut offset = styp_len;

        // sidx
        assert_eq!(&seg[offset + 4..offset + 8], b"sidx");
        let sidx_len = u32::from_be_bytes(seg[offset..offset + 4].try_into().unwrap()) as usize;
        offset += sidx_len;

        // moof
        assert_eq!(&seg[offset + 4..offset + 8], b"moof");
        let moof_len = u32::from_be_bytes(seg[offset..offset + 4].try_into().unwrap()) as usize;
        offset += moof_len;

        // mdat holds exactly our payload plus an 8-byte header.
        assert_eq!(&seg[offset + 4..offset + 8], b"mdat");
        let mdat_len = u32::from_be_bytes(seg[offset..offset + 4].try_into().unwrap()) as usize;
        assert_eq!(mdat_len, payload.len() + 8);
        offset += mdat_len;

        assert_eq!(offset, seg.len());
    }
}
