// Pure ISO/IEC 14496-12 ("ISO BMFF") box writers. Mux-only: the segmenter
// never needs to parse fMP4 back, mirroring mpegts::ts::TsMuxer's
// mux-only asymmetry (spec §4.B).

use byteorder::BigEndian;
use bytes::BytesMut;

use crate::bytesio::bytes_writer::BytesWriter;

use super::errors::Fmp4Error;

/// Wraps `body` in a standard 32-bit-length box: `[size: u32][type: 4 bytes][body]`.
pub fn write_box(box_type: &[u8; 4], body: &[u8]) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    let size = 8 + body.len() as u32;
    w.write_u32::<BigEndian>(size)?;
    w.write(box_type)?;
    w.write(body)?;
    Ok(w.extract_current_bytes())
}

/// Concatenates already-built child boxes and wraps them in a parent box.
pub fn write_container_box(box_type: &[u8; 4], children: &[BytesMut]) -> Result<BytesMut, Fmp4Error> {
    let mut body = BytesMut::new();
    for child in children {
        body.extend_from_slice(child);
    }
    write_box(box_type, &body)
}

/// `ftyp` — always the first box in both the init segment and any standalone file.
pub fn ftyp() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write(b"isom")?; // major_brand
    w.write_u32::<BigEndian>(0x200)?; // minor_version
    w.write(b"isom")?;
    w.write(b"iso6")?;
    w.write(b"dash")?;
    write_box(b"ftyp", &w.extract_current_bytes())
}

/// `styp` — segment-type box, leads every standalone media segment (spec §4.B).
pub fn styp() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write(b"msdh")?;
    w.write_u32::<BigEndian>(0)?;
    w.write(b"msdh")?;
    w.write(b"msix")?;
    write_box(b"styp", &w.extract_current_bytes())
}

/// `mvhd` inside `moov`. `timescale` is in units/second (we use 1000, i.e. ms).
pub fn mvhd(timescale: u32, next_track_id: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?; // version
    w.write_u24::<BigEndian>(0)?; // flags
    w.write_u32::<BigEndian>(0)?; // creation_time
    w.write_u32::<BigEndian>(0)?; // modification_time
    w.write_u32::<BigEndian>(timescale)?;
    w.write_u32::<BigEndian>(0)?; // duration (unknown for live/dynamic)
    w.write_u32::<BigEndian>(0x0001_0000)?; // rate 1.0
    w.write_u16::<BigEndian>(0x0100)?; // volume 1.0
    w.write_u16::<BigEndian>(0)?; // reserved
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    // unity matrix
    for v in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        w.write_u32::<BigEndian>(v)?;
    }
    for _ in 0..6 {
        w.write_u32::<BigEndian>(0)?; // pre_defined
    }
    w.write_u32::<BigEndian>(next_track_id)?;
    write_box(b"mvhd", &w.extract_current_bytes())
}

pub struct TrackKind {
    pub is_video: bool,
}

/// `tkhd` — track header. `width`/`height` are ignored (fixed-point 0) for audio.
pub fn tkhd(track_id: u32, width: u32, height: u32, kind: &TrackKind) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0x000007)?; // flags: enabled | in_movie | in_preview
    w.write_u32::<BigEndian>(0)?; // creation_time
    w.write_u32::<BigEndian>(0)?; // modification_time
    w.write_u32::<BigEndian>(track_id)?;
    w.write_u32::<BigEndian>(0)?; // reserved
    w.write_u32::<BigEndian>(0)?; // duration
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?; // reserved x2
    w.write_u16::<BigEndian>(0)?; // layer
    w.write_u16::<BigEndian>(0)?; // alternate_group
    w.write_u16::<BigEndian>(if kind.is_video { 0 } else { 0x0100 })?; // volume
    w.write_u16::<BigEndian>(0)?; // reserved
    for v in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        w.write_u32::<BigEndian>(v)?;
    }
    w.write_u32::<BigEndian>(width << 16)?;
    w.write_u32::<BigEndian>(height << 16)?;
    write_box(b"tkhd", &w.extract_current_bytes())
}

/// `mdhd` — media header, inside `mdia`.
pub fn mdhd(timescale: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(timescale)?;
    w.write_u32::<BigEndian>(0)?; // duration
    w.write_u16::<BigEndian>(0x55c4)?; // language "und"
    w.write_u16::<BigEndian>(0)?;
    write_box(b"mdhd", &w.extract_current_bytes())
}

/// `hdlr` — declares the track's media type ("vide"/"soun").
pub fn hdlr(is_video: bool) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?; // pre_defined
    w.write(if is_video { b"vide" } else { b"soun" })?;
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    let name = if is_video { b"VideoHandler\0".as_slice() } else { b"SoundHandler\0".as_slice() };
    w.write(name)?;
    write_box(b"hdlr", &w.extract_current_bytes())
}

pub fn vmhd() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(1)?; // flags
    w.write_u16::<BigEndian>(0)?; // graphicsmode
    for _ in 0..3 {
        w.write_u16::<BigEndian>(0)?; // opcolor
    }
    write_box(b"vmhd", &w.extract_current_bytes())
}

pub fn smhd() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u16::<BigEndian>(0)?; // balance
    w.write_u16::<BigEndian>(0)?; // reserved
    write_box(b"smhd", &w.extract_current_bytes())
}

/// `dref`+`dinf` — a single self-contained ("this file") data reference.
pub fn dinf() -> Result<BytesMut, Fmp4Error> {
    let mut url = BytesWriter::new();
    url.write_u8(0)?;
    url.write_u24::<BigEndian>(1)?; // flags: media data is in this file
    let url_box = write_box(b"url ", &url.extract_current_bytes())?;

    let mut dref = BytesWriter::new();
    dref.write_u8(0)?;
    dref.write_u24::<BigEndian>(0)?;
    dref.write_u32::<BigEndian>(1)?; // entry_count
    dref.write(&url_box)?;
    let dref_box = write_box(b"dref", &dref.extract_current_bytes())?;

    write_container_box(b"dinf", &[dref_box])
}

/// `avcC` — verbatim `AVCDecoderConfigurationRecord` as handed to us from
/// the RTMP video sequence header (no re-encoding needed, it's already in
/// the exact on-wire shape this box wants).
pub fn avcc(avc_decoder_config: &[u8]) -> Result<BytesMut, Fmp4Error> {
    write_box(b"avcC", avc_decoder_config)
}

/// `hvcC` — same idea for HEVC.
pub fn hvcc(hevc_decoder_config: &[u8]) -> Result<BytesMut, Fmp4Error> {
    write_box(b"hvcC", hevc_decoder_config)
}

/// A visual sample entry (ISO 14496-12 §8.5.2) wrapping a codec config box
/// (`avcC` for `avc1`, `hvcC` for `hvc1`).
fn visual_sample_entry(box_type: &[u8; 4], width: u16, height: u16, codec_config_box: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u32::<BigEndian>(0)?; // reserved[6]
    w.write_u16::<BigEndian>(0)?;
    w.write_u16::<BigEndian>(1)?; // data_reference_index
    w.write_u16::<BigEndian>(0)?; // pre_defined
    w.write_u16::<BigEndian>(0)?; // reserved
    for _ in 0..3 {
        w.write_u32::<BigEndian>(0)?; // pre_defined
    }
    w.write_u16::<BigEndian>(width)?;
    w.write_u16::<BigEndian>(height)?;
    w.write_u32::<BigEndian>(0x0048_0000)?; // horizresolution 72dpi
    w.write_u32::<BigEndian>(0x0048_0000)?; // vertresolution 72dpi
    w.write_u32::<BigEndian>(0)?; // reserved
    w.write_u16::<BigEndian>(1)?; // frame_count
    for _ in 0..32 {
        w.write_u8(0)?; // compressorname (pascal string, blank)
    }
    w.write_u16::<BigEndian>(0x0018)?; // depth
    w.write_u16::<BigEndian>(0xffff)?; // pre_defined
    w.write(codec_config_box)?;
    write_box(box_type, &w.extract_current_bytes())
}

/// `avc1` sample entry wrapping `avcC`.
pub fn avc1(width: u16, height: u16, avcc_box: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    visual_sample_entry(b"avc1", width, height, avcc_box)
}

/// `hvc1` sample entry wrapping `hvcC`.
pub fn hvc1(width: u16, height: u16, hvcc_box: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    visual_sample_entry(b"hvc1", width, height, hvcc_box)
}

/// `esds` — MPEG-4 ES descriptor wrapping the raw `AudioSpecificConfig` from
/// the RTMP AAC sequence header.
pub fn esds(audio_specific_config: &[u8]) -> Result<BytesMut, Fmp4Error> {
    let mut dsi = BytesWriter::new();
    dsi.write_u8(0x05)?; // DecSpecificInfoTag
    dsi.write_u8(audio_specific_config.len() as u8)?;
    dsi.write(audio_specific_config)?;
    let dsi = dsi.extract_current_bytes();

    let mut dec_config = BytesWriter::new();
    dec_config.write_u8(0x04)?; // DecoderConfigDescrTag
    dec_config.write_u8((13 + dsi.len()) as u8)?;
    dec_config.write_u8(0x40)?; // objectTypeIndication: AAC
    dec_config.write_u8(0x15)?; // streamType: audio, upStream=0, reserved=1
    dec_config.write_u24::<BigEndian>(0)?; // bufferSizeDB
    dec_config.write_u32::<BigEndian>(0)?; // maxBitrate
    dec_config.write_u32::<BigEndian>(0)?; // avgBitrate
    dec_config.write(&dsi)?;
    let dec_config = dec_config.extract_current_bytes();

    let mut sl_config = BytesWriter::new();
    sl_config.write_u8(0x06)?; // SLConfigDescrTag
    sl_config.write_u8(1)?;
    sl_config.write_u8(0x02)?; // predefined
    let sl_config = sl_config.extract_current_bytes();

    let mut es = BytesWriter::new();
    es.write_u8(0x03)?; // ESDescrTag
    es.write_u8((3 + dec_config.len() + sl_config.len()) as u8)?;
    es.write_u16::<BigEndian>(0)?; // ES_ID
    es.write_u8(0)?; // flags
    es.write(&dec_config)?;
    es.write(&sl_config)?;

    let mut body = BytesWriter::new();
    body.write_u8(0)?; // version
    body.write_u24::<BigEndian>(0)?; // flags
    body.write(&es.extract_current_bytes())?;
    write_box(b"esds", &body.extract_current_bytes())
}

/// `mp4a` sample entry wrapping `esds`.
pub fn mp4a(channels: u16, sample_rate: u32, esds_box: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u32::<BigEndian>(0)?; // reserved[6]
    w.write_u16::<BigEndian>(0)?;
    w.write_u16::<BigEndian>(1)?; // data_reference_index
    w.write_u32::<BigEndian>(0)?; // reserved
    w.write_u32::<BigEndian>(0)?;
    w.write_u16::<BigEndian>(channels)?;
    w.write_u16::<BigEndian>(16)?; // samplesize
    w.write_u16::<BigEndian>(0)?; // pre_defined
    w.write_u16::<BigEndian>(0)?; // reserved
    w.write_u32::<BigEndian>(sample_rate << 16)?;
    w.write(esds_box)?;
    write_box(b"mp4a", &w.extract_current_bytes())
}

/// `stsd` wrapping a single sample entry (video XOR audio per track, as is
/// conventional and as spec §4.F requires: two separate tracks).
pub fn stsd(sample_entry: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(1)?; // entry_count
    w.write(sample_entry)?;
    write_box(b"stsd", &w.extract_current_bytes())
}

/// Empty `stts`/`stsc`/`stsz`/`stco` — required present-but-empty tables for
/// a fragmented track (actual sample tables live in `moof`/`trun`).
pub fn empty_stts() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    write_box(b"stts", &w.extract_current_bytes())
}

pub fn empty_stsc() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    write_box(b"stsc", &w.extract_current_bytes())
}

pub fn empty_stsz() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?; // sample_size
    w.write_u32::<BigEndian>(0)?; // sample_count
    write_box(b"stsz", &w.extract_current_bytes())
}

pub fn empty_stco() -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(0)?;
    write_box(b"stco", &w.extract_current_bytes())
}

/// `stbl` for a fragmented track: the sample-description plus the four
/// mandatory-but-empty sample tables.
pub fn stbl(sample_entry: &BytesMut) -> Result<BytesMut, Fmp4Error> {
    let stsd_box = stsd(sample_entry)?;
    write_container_box(
        b"stbl",
        &[stsd_box, empty_stts()?, empty_stsc()?, empty_stsz()?, empty_stco()?],
    )
}

/// `minf` (media information) for a track.
pub fn minf(is_video: bool, stbl_box: BytesMut) -> Result<BytesMut, Fmp4Error> {
    let media_header = if is_video { vmhd()? } else { smhd()? };
    write_container_box(b"minf", &[media_header, dinf()?, stbl_box])
}

/// `mdia` = `mdhd` + `hdlr` + `minf`.
pub fn mdia(timescale: u32, is_video: bool, stbl_box: BytesMut) -> Result<BytesMut, Fmp4Error> {
    write_container_box(b"mdia", &[mdhd(timescale)?, hdlr(is_video)?, minf(is_video, stbl_box)?])
}

/// `trak` = `tkhd` + `mdia`.
pub fn trak(
    track_id: u32,
    timescale: u32,
    width: u32,
    height: u32,
    is_video: bool,
    stbl_box: BytesMut,
) -> Result<BytesMut, Fmp4Error> {
    let kind = TrackKind { is_video };
    write_container_box(
        b"trak",
        &[tkhd(track_id, width, height, &kind)?, mdia(timescale, is_video, stbl_box)?],
    )
}

/// `trex` — per-track default sample flags, inside `mvex`.
pub fn trex(track_id: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(track_id)?;
    w.write_u32::<BigEndian>(1)?; // default_sample_description_index
    w.write_u32::<BigEndian>(0)?; // default_sample_duration
    w.write_u32::<BigEndian>(0)?; // default_sample_size
    w.write_u32::<BigEndian>(0)?; // default_sample_flags
    write_box(b"trex", &w.extract_current_bytes())
}

/// `mvex` — declares the movie is fragmented.
pub fn mvex(track_ids: &[u32]) -> Result<BytesMut, Fmp4Error> {
    let mut children = Vec::with_capacity(track_ids.len());
    for id in track_ids {
        children.push(trex(*id)?);
    }
    write_container_box(b"mvex", &children)
}

/// `mfhd` — movie fragment header, first box in every `moof`.
pub fn mfhd(sequence_number: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(sequence_number)?;
    write_box(b"mfhd", &w.extract_current_bytes())
}

/// `tfhd` — track fragment header. `default_sample_flags` distinguishes
/// keyframes (video) so players can seek within the segment.
pub fn tfhd(track_id: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(0x02_0000)?; // flags: default-base-is-moof
    w.write_u32::<BigEndian>(track_id)?;
    write_box(b"tfhd", &w.extract_current_bytes())
}

/// `tfdt` — track fragment decode time, the segment's base media decode time.
pub fn tfdt(base_media_decode_time: u64) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(1)?; // version 1: 64-bit base_media_decode_time
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>((base_media_decode_time >> 32) as u32)?;
    w.write_u32::<BigEndian>(base_media_decode_time as u32)?;
    write_box(b"tfdt", &w.extract_current_bytes())
}

/// One fragment sample: duration/size are per-sample to allow for B-frames
/// and ragged audio frame sizes; `is_keyframe` sets the no-sync-sample flag
/// correctly for video so clients can identify sync points.
pub struct TrunSample {
    pub duration: u32,
    pub size: u32,
    pub cts_offset: i32,
    pub is_keyframe: bool,
}

/// `trun` — track fragment run: one entry per sample in this fragment.
/// `data_offset` is patched by the caller once `moof` length is known
/// (data-offset-present flag is set; offset is relative to the start of the
/// enclosing `moof`).
pub fn trun(samples: &[TrunSample], data_offset: i32, is_video: bool) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    // flags: data-offset-present | sample-duration-present |
    // sample-size-present | sample-flags-present | sample-composition-time-offsets-present
    let flags: u32 = if is_video { 0x00_0701 } else { 0x00_0301 };
    w.write_u8(0)?;
    w.write_u24::<BigEndian>(flags)?;
    w.write_u32::<BigEndian>(samples.len() as u32)?;
    w.write_u32::<BigEndian>(data_offset as u32)?;
    for sample in samples {
        w.write_u32::<BigEndian>(sample.duration)?;
        w.write_u32::<BigEndian>(sample.size)?;
        if is_video {
            let flags = if sample.is_keyframe { 0x0200_0000 } else { 0x0101_0000 };
            w.write_u32::<BigEndian>(flags)?;
            w.write_u32::<BigEndian>(sample.cts_offset as u32)?;
        }
    }
    write_box(b"trun", &w.extract_current_bytes())
}

/// `traf` = `tfhd` + `tfdt` + `trun`.
pub fn traf(
    track_id: u32,
    base_media_decode_time: u64,
    samples: &[TrunSample],
    moof_header_len: usize,
    is_video: bool,
) -> Result<BytesMut, Fmp4Error> {
    let tfhd_box = tfhd(track_id)?;
    let tfdt_box = tfdt(base_media_decode_time)?;
    // data_offset = moof size (not yet known until trun is sized) + mdat header (8 bytes).
    // We size trun first with a placeholder offset, then patch once moof's final
    // length is known by the caller (moof()).
    let placeholder = trun(samples, 0, is_video)?;
    let traf_len = 8 + tfhd_box.len() + tfdt_box.len() + placeholder.len();
    let data_offset = (moof_header_len + traf_len + 8) as i32; // + mdat header
    let trun_box = trun(samples, data_offset, is_video)?;
    write_container_box(b"traf", &[tfhd_box, tfdt_box, trun_box])
}

/// `moof` = `mfhd` + one `traf` per track present in this fragment.
pub fn moof(
    sequence_number: u32,
    track_id: u32,
    base_media_decode_time: u64,
    samples: &[TrunSample],
    is_video: bool,
) -> Result<BytesMut, Fmp4Error> {
    let mfhd_box = mfhd(sequence_number)?;
    // moof "header" length as seen by traf's data_offset math: mfhd + moof's own box header.
    let moof_header_len = 8 + mfhd_box.len();
    let traf_box = traf(track_id, base_media_decode_time, samples, moof_header_len, is_video)?;
    write_container_box(b"moof", &[mfhd_box, traf_box])
}

/// `mdat` wrapping the concatenated raw sample payloads for this fragment.
pub fn mdat(payload: &[u8]) -> Result<BytesMut, Fmp4Error> {
    write_box(b"mdat", payload)
}

/// `sidx` — segment index, used by DASH players to seek within a
/// multi-segment representation without downloading the MPD's full
/// `SegmentTimeline` resolution.
pub fn sidx(track_id: u32, timescale: u32, earliest_presentation_time: u64, duration: u32, referenced_size: u32) -> Result<BytesMut, Fmp4Error> {
    let mut w = BytesWriter::new();
    w.write_u8(1)?; // version 1: 64-bit times
    w.write_u24::<BigEndian>(0)?;
    w.write_u32::<BigEndian>(track_id)?;
    w.write_u32::<BigEndian>(timescale)?;
    w.write_u32::<BigEndian>((earliest_presentation_time >> 32) as u32)?;
    w.write_u32::<BigEndian>(earliest_presentation_time as u32)?;
    w.write_u32::<BigEndian>(0)?; // first_offset hi
    w.write_u32::<BigEndian>(0)?; // first_offset lo
    w.write_u16::<BigEndian>(0)?; // reserved
    w.write_u16::<BigEndian>(1)?; // reference_count
    w.write_u32::<BigEndian>(referenced_size & 0x7fff_ffff)?; // reference_type(0)=movie
    w.write_u32::<BigEndian>(duration)?;
    w.write_u32::<BigEndian>(0x9000_0000)?; // starts_with_sap=1, sap_type=0
    write_box(b"sidx", &w.extract_current_bytes())
}
