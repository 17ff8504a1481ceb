// DASH remuxer: directly parallel to `hls::remuxer::CustomHlsRemuxer`, but
// demuxes FLV into two independently-segmented fMP4 representations
// (video track 1, audio track 2) instead of one muxed MPEG-TS stream.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dash::errors::DashRemuxerError;
use crate::fmp4::{self, TrunSample, AUDIO_TRACK_ID, VIDEO_TRACK_ID};
use crate::flv::{
    define::{frame_type, FlvData},
    demuxer::{FlvAudioTagDemuxer, FlvVideoTagDemuxer},
};
use crate::hls::config::HlsConfig;
use crate::hls::segment_manager::SegmentManager;
use crate::storage::HlsStorage;
use crate::streamhub::{
    define::{
        BroadcastEvent, BroadcastEventReceiver, FrameData, FrameDataReceiver, NotifyInfo,
        StreamHubEvent, StreamHubEventSender, SubDataType, SubscribeType, SubscriberInfo,
    },
    stream::StreamIdentifier,
    utils::Uuid,
};
use tokio_util::sync::CancellationToken;

/// One emitted fMP4 media segment for a single track.
#[derive(Debug, Clone)]
pub struct DashSegmentInfo {
    pub sequence: u64,
    pub start_dts_ms: i64,
    pub duration_ms: i64,
    /// Filename per spec.md: `video-<start_dts_ms>.m4s` / `audio-<start_dts_ms>.m4s`.
    pub m4s_name: String,
    pub storage_key: String,
    pub created_at: Instant,
}

pub type DashStreamRegistry = Arc<DashMap<String, Arc<parking_lot::RwLock<DashStreamProcessorState>>>>;

/// Shared state read by the HTTP server to build the manifest and look up
/// segment storage keys.
pub struct DashStreamProcessorState {
    pub app_name: String,
    pub stream_name: String,
    pub video_init: Option<Bytes>,
    pub audio_init: Option<Bytes>,
    pub video_codec: String,
    pub audio_codec: String,
    pub video_segments: VecDeque<DashSegmentInfo>,
    pub audio_segments: VecDeque<DashSegmentInfo>,
    /// Stamped from the first media message this processor observes (spec.md
    /// §9 Open Question: first-media-message semantics, not publish start).
    pub availability_start_time: Option<DateTime<Utc>>,
    pub is_ended: bool,
    /// Set by the broadcast-event dispatcher when the publisher's `AtcCorrector`
    /// rebases the timeline (spec.md §4.D); consumed by `StreamProcessor` on the
    /// next frame to force a segment cut at the new `t`, making the rebase
    /// visible in the `SegmentTimeline` rather than only implicit in its jump.
    pub discontinuity_requested: bool,
}

impl DashStreamProcessorState {
    #[must_use]
    pub const fn new(app_name: String, stream_name: String) -> Self {
        Self {
            app_name,
            stream_name,
            video_init: None,
            audio_init: None,
            video_codec: String::new(),
            audio_codec: String::new(),
            video_segments: VecDeque::new(),
            audio_segments: VecDeque::new(),
            availability_start_time: None,
            is_ended: false,
            discontinuity_requested: false,
        }
    }
}

pub struct DashRemuxer {
    client_event_consumer: BroadcastEventReceiver,
    event_producer: StreamHubEventSender,
    segment_manager: Arc<SegmentManager>,
    stream_registry: DashStreamRegistry,
    cancel_token: CancellationToken,
    handler_tasks: tokio::task::JoinSet<()>,
    config: HlsConfig,
}

impl DashRemuxer {
    #[must_use]
    pub fn new(
        consumer: BroadcastEventReceiver,
        event_producer: StreamHubEventSender,
        segment_manager: Arc<SegmentManager>,
        stream_registry: DashStreamRegistry,
        cancel_token: CancellationToken,
    ) -> Self {
        Self::with_config(consumer, event_producer, segment_manager, stream_registry, cancel_token, HlsConfig::default())
    }

    #[must_use]
    pub fn with_config(
        consumer: BroadcastEventReceiver,
        event_producer: StreamHubEventSender,
        segment_manager: Arc<SegmentManager>,
        stream_registry: DashStreamRegistry,
        cancel_token: CancellationToken,
        config: HlsConfig,
    ) -> Self {
        Self {
            client_event_consumer: consumer,
            event_producer,
            segment_manager,
            stream_registry,
            cancel_token,
            handler_tasks: tokio::task::JoinSet::new(),
            config,
        }
    }

    pub async fn run(&mut self) -> Result<(), DashRemuxerError> {
        tracing::info!("DASH remuxer started");

        loop {
            let val = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    tracing::info!("DASH remuxer cancelled (shutdown), draining {} handler tasks", self.handler_tasks.len());
                    self.handler_tasks.abort_all();
                    while self.handler_tasks.join_next().await.is_some() {}
                    return Ok(());
                }
                Some(result) = self.handler_tasks.join_next(), if !self.handler_tasks.is_empty() => {
                    if let Err(e) = result {
                        if !e.is_cancelled() {
                            tracing::error!("DASH stream handler task panicked: {}", e);
                        }
                    }
                    continue;
                }
                result = self.client_event_consumer.recv() => {
                    match result {
                        Ok(event) => event,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("DASH remuxer lagged behind by {n} broadcast events");
                            continue;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            return Err(DashRemuxerError::ReceiveError(
                                tokio::sync::broadcast::error::RecvError::Closed,
                            ));
                        }
                    }
                }
            };

            match val {
                BroadcastEvent::Publish { identifier } => {
                    if let StreamIdentifier::Rtmp { app_name, stream_name, .. } = identifier {
                        tracing::info!("DASH remuxer: new stream {}/{}", app_name, stream_name);
                        let handler = StreamHandler::new(
                            app_name,
                            stream_name,
                            self.event_producer.clone(),
                            Arc::clone(&self.segment_manager),
                            self.stream_registry.clone(),
                            self.config,
                        );
                        self.handler_tasks.spawn(async move {
                            if let Err(e) = handler.run().await {
                                tracing::error!("DASH stream handler error: {}", e);
                            }
                        });
                    }
                }
                BroadcastEvent::UnPublish { .. } => {
                    tracing::trace!("DASH remuxer: stream unpublished");
                }
                BroadcastEvent::Discontinuity { identifier } => {
                    if let StreamIdentifier::Rtmp { app_name, stream_name, .. } = identifier {
                        let registry_key = format!("{app_name}/{stream_name}");
                        if let Some(state) = self.stream_registry.get(&registry_key) {
                            state.write().discontinuity_requested = true;
                            tracing::info!(
                                "DASH remuxer: ATC rebase on {}, forcing segment cut",
                                registry_key
                            );
                        }
                    }
                }
            }
        }
    }
}

struct StreamHandler {
    app_name: String,
    stream_name: String,
    event_producer: StreamHubEventSender,
    segment_manager: Arc<SegmentManager>,
    stream_registry: DashStreamRegistry,
    data_consumer: FrameDataReceiver,
    subscriber_id: Uuid,
    config: HlsConfig,
}

impl StreamHandler {
    fn new(
        app_name: String,
        stream_name: String,
        event_producer: StreamHubEventSender,
        segment_manager: Arc<SegmentManager>,
        stream_registry: DashStreamRegistry,
        config: HlsConfig,
    ) -> Self {
        let (_, data_consumer) = crate::streamhub::consumer_queue::channel(crate::streamhub::define::FRAME_DATA_CHANNEL_CAPACITY);
        Self {
            app_name,
            stream_name,
            event_producer,
            segment_manager,
            stream_registry,
            data_consumer,
            subscriber_id: Uuid::new(),
            config,
        }
    }

    async fn run(mut self) -> Result<(), DashRemuxerError> {
        self.subscribe().await?;

        let registry_key = format!("{}/{}", self.app_name, self.stream_name);
        let state = Arc::new(parking_lot::RwLock::new(DashStreamProcessorState::new(
            self.app_name.clone(),
            self.stream_name.clone(),
        )));
        self.stream_registry.insert(registry_key.clone(), state.clone());

        let mut processor = StreamProcessor::new(&self.app_name, &self.stream_name, Arc::clone(&self.segment_manager), state, self.config);
        processor.process_stream(&mut self.data_consumer).await?;

        self.unsubscribe();

        tokio::time::sleep(Duration::from_secs(60)).await;
        self.stream_registry.remove(&registry_key);
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<(), DashRemuxerError> {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2Dash,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo { request_url: String::new(), remote_addr: String::new() },
        };
        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());
        let (result_sender, result_receiver) = tokio::sync::oneshot::channel();

        self.event_producer
            .try_send(StreamHubEvent::Subscribe { identifier, info: sub_info, result_sender })
            .map_err(|_| DashRemuxerError::StreamHubEventSendError)?;

        let receiver = result_receiver
            .await
            .map_err(|_| DashRemuxerError::SubscribeError)??
            .0
            .frame_receiver
            .ok_or(DashRemuxerError::NoFrameReceiver)?;

        self.data_consumer = receiver;
        tracing::info!("DASH: subscribed to {}/{}", self.app_name, self.stream_name);
        Ok(())
    }

    fn unsubscribe(&self) {
        let sub_info = SubscriberInfo {
            id: self.subscriber_id,
            sub_type: SubscribeType::RtmpRemux2Dash,
            sub_data_type: SubDataType::Frame,
            notify_info: NotifyInfo { request_url: String::new(), remote_addr: String::new() },
        };
        let identifier = StreamIdentifier::rtmp(self.app_name.clone(), self.stream_name.clone());
        if let Err(e) = self.event_producer.try_send(StreamHubEvent::UnSubscribe { identifier, info: sub_info }) {
            tracing::error!("DASH unsubscribe error: {}", e);
        }
    }
}

/// Write to storage with the same retry shape `hls::remuxer::write_with_retry` uses.
async fn write_with_retry(storage: &Arc<dyn HlsStorage>, key: &str, data: Bytes) -> std::io::Result<()> {
    use backon::{BackoffBuilder, ExponentialBuilder};

    let backoff = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
        .build();

    let mut last_err = None;
    for delay in std::iter::once(Duration::ZERO).chain(backoff) {
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        match storage.write(key, data.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!("DASH storage write failed: {} - retrying in {:?}", e, delay);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| std::io::Error::other("Retry exhausted")))
}

/// Accumulates samples for one track between segment cuts.
#[derive(Default)]
struct TrackBuffer {
    samples: Vec<TrunSample>,
    payload: BytesMut,
    start_dts_ms: i64,
}

impl TrackBuffer {
    fn push(&mut self, dts: i64, duration: u32, data: &[u8], is_keyframe: bool) {
        if self.samples.is_empty() {
            self.start_dts_ms = dts;
        }
        self.samples.push(TrunSample { duration, size: data.len() as u32, cts_offset: 0, is_keyframe });
        self.payload.extend_from_slice(data);
    }

    fn duration_ms(&self) -> i64 {
        self.samples.iter().map(|s| i64::from(s.duration)).sum()
    }

    fn take(&mut self) -> (Vec<TrunSample>, BytesMut, i64) {
        (std::mem::take(&mut self.samples), std::mem::take(&mut self.payload), self.start_dts_ms)
    }
}

struct StreamProcessor {
    app_name: String,
    stream_name: String,
    segment_manager: Arc<SegmentManager>,
    state: Arc<parking_lot::RwLock<DashStreamProcessorState>>,
    config: HlsConfig,

    video_demuxer: FlvVideoTagDemuxer,
    audio_demuxer: FlvAudioTagDemuxer,

    video_buf: TrackBuffer,
    audio_buf: TrackBuffer,
    video_sequence_no: u64,
    audio_sequence_no: u64,

    last_video_dts: i64,
    last_audio_dts: i64,
    last_dts: i64,

    video_init_written: bool,
    audio_init_written: bool,
    last_video_seq_header: Option<BytesMut>,

    /// Set from `DashStreamProcessorState::discontinuity_requested` on an ATC
    /// rebase; each track clears its own copy once it forces a cut at the new
    /// corrected timestamp.
    pending_video_discontinuity: bool,
    pending_audio_discontinuity: bool,
}

impl StreamProcessor {
    fn new(
        app_name: &str,
        stream_name: &str,
        segment_manager: Arc<SegmentManager>,
        state: Arc<parking_lot::RwLock<DashStreamProcessorState>>,
        config: HlsConfig,
    ) -> Self {
        Self {
            app_name: app_name.to_string(),
            stream_name: stream_name.to_string(),
            segment_manager,
            state,
            config,
            video_demuxer: FlvVideoTagDemuxer::new(),
            audio_demuxer: FlvAudioTagDemuxer::new(),
            video_buf: TrackBuffer::default(),
            audio_buf: TrackBuffer::default(),
            video_sequence_no: 0,
            audio_sequence_no: 0,
            last_video_dts: 0,
            last_audio_dts: 0,
            last_dts: 0,
            video_init_written: false,
            audio_init_written: false,
            last_video_seq_header: None,
            pending_video_discontinuity: false,
            pending_audio_discontinuity: false,
        }
    }

    fn storage_key(&self, name: &str) -> String {
        format!("{}-{}-{}", self.app_name, self.stream_name.replace(':', "-"), name)
    }

    async fn process_stream(&mut self, data_consumer: &mut FrameDataReceiver) -> Result<(), DashRemuxerError> {
        const RECV_TIMEOUT_MS: u64 = 5000;

        loop {
            match tokio::time::timeout(Duration::from_millis(RECV_TIMEOUT_MS), data_consumer.recv()).await {
                Ok(Some(frame_data)) => {
                    let flv_data = match frame_data {
                        FrameData::Audio { timestamp, data } => FlvData::Audio { timestamp, data },
                        FrameData::Video { timestamp, data } => FlvData::Video { timestamp, data },
                        _ => continue,
                    };
                    self.process_flv_data(flv_data).await?;
                }
                Ok(None) => {
                    tracing::info!("DASH stream channel closed: {}/{}", self.app_name, self.stream_name);
                    break;
                }
                Err(_timeout) => {
                    tracing::info!("DASH stream timeout: {}/{}", self.app_name, self.stream_name);
                    break;
                }
            }
        }

        self.flush_remaining().await?;
        let mut state = self.state.write();
        state.is_ended = true;
        Ok(())
    }

    fn stamp_availability_start_time(&self) {
        let mut state = self.state.write();
        if state.availability_start_time.is_none() {
            state.availability_start_time = Some(Utc::now());
        }
    }

    async fn process_flv_data(&mut self, flv_data: FlvData) -> Result<(), DashRemuxerError> {
        {
            let mut state = self.state.write();
            if std::mem::take(&mut state.discontinuity_requested) {
                self.pending_video_discontinuity = true;
                self.pending_audio_discontinuity = true;
            }
        }

        match flv_data {
            FlvData::Video { timestamp, data } => {
                let video_data = match self
                    .video_demuxer
                    .demux(timestamp, data)
                    .map_err(|e| DashRemuxerError::DemuxError(format!("video: {e:?}")))?
                {
                    Some(d) => d,
                    None => {
                        // May have just been a sequence header; rebuild the
                        // init segment if its contents changed.
                        self.maybe_rebuild_video_init();
                        return Ok(());
                    }
                };

                if !self.video_init_written {
                    self.write_video_init().await?;
                }

                self.stamp_availability_start_time();

                let is_keyframe = video_data.frame_type == frame_type::KEY_FRAME;
                let duration = if self.video_buf.samples.is_empty() { 0 } else { (video_data.dts - self.last_video_dts).max(0) as u32 };

                let should_cut = !self.video_buf.samples.is_empty()
                    && is_keyframe
                    && (self.pending_video_discontinuity
                        || self.video_buf.duration_ms() + i64::from(duration) >= self.config.fragment_ms);
                if should_cut {
                    self.pending_video_discontinuity = false;
                    self.cut_video_segment(video_data.dts).await?;
                }

                self.video_buf.push(video_data.dts, duration, &video_data.data, is_keyframe);
                self.last_video_dts = video_data.dts;
                self.last_dts = video_data.dts;
                Ok(())
            }
            FlvData::Audio { timestamp, data } => {
                let audio_data = self
                    .audio_demuxer
                    .demux(timestamp, data)
                    .map_err(|e| DashRemuxerError::DemuxError(format!("audio: {e:?}")))?;

                if !audio_data.has_data {
                    self.maybe_write_audio_init();
                    return Ok(());
                }

                if !self.audio_init_written {
                    self.write_audio_init().await?;
                }

                self.stamp_availability_start_time();

                let duration = if self.audio_buf.samples.is_empty() { 0 } else { (audio_data.dts - self.last_audio_dts).max(0) as u32 };

                let should_cut = !self.audio_buf.samples.is_empty()
                    && (self.pending_audio_discontinuity
                        || self.audio_buf.duration_ms() + i64::from(duration) >= self.config.fragment_ms);
                if should_cut {
                    self.pending_audio_discontinuity = false;
                    self.cut_audio_segment(audio_data.dts).await?;
                }

                self.audio_buf.push(audio_data.dts, duration, &audio_data.data, false);
                self.last_audio_dts = audio_data.dts;
                self.last_dts = audio_data.dts;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn maybe_rebuild_video_init(&mut self) {
        let processor = self.video_demuxer.avc_processor();
        if processor.sps.is_empty() {
            return;
        }
        let mut current = BytesMut::new();
        for sps in &processor.sps {
            current.extend_from_slice(sps);
        }
        for pps in &processor.pps {
            current.extend_from_slice(pps);
        }
        if self.last_video_seq_header.as_ref() != Some(&current) {
            self.last_video_seq_header = Some(current);
            self.video_init_written = false;
        }
    }

    async fn write_video_init(&mut self) -> Result<(), DashRemuxerError> {
        let processor = self.video_demuxer.avc_processor();
        let Some(avcc) = processor.build_decoder_configuration_record() else {
            return Ok(()); // no sequence header parsed yet
        };
        let Some(info) = processor.sps_info.as_ref() else { return Ok(()) };

        let init = fmp4::build_video_init_segment(info.width, info.height, &avcc, false)?;
        let codec = format!("avc1.{:02x}{:02x}{:02x}", info.profile_idc, 0u8, info.level_idc);

        let storage = self.segment_manager.storage().clone();
        let key = self.storage_key("init-video.mp4");
        write_with_retry(&storage, &key, init.clone().freeze())
            .await
            .map_err(|e| DashRemuxerError::StorageError(e.to_string()))?;

        {
            let mut state = self.state.write();
            state.video_init = Some(init.freeze());
            state.video_codec = codec;
        }
        self.video_init_written = true;
        Ok(())
    }

    fn maybe_write_audio_init(&mut self) {
        // AAC sequence headers carry no frame payload; init segment is
        // (re)built lazily the next time `process_flv_data` sees one land
        // via `write_audio_init`, mirroring the video path's pattern.
    }

    async fn write_audio_init(&mut self) -> Result<(), DashRemuxerError> {
        let processor = self.audio_demuxer.aac_processor();
        let Some(sample_rate) = processor.sample_rate() else { return Ok(()) };
        let channels = processor.channels();
        let asc = processor.audio_specific_config();

        let init = fmp4::build_audio_init_segment(channels, sample_rate, &asc)?;
        let codec = format!("mp4a.40.{}", processor.object_type());

        let storage = self.segment_manager.storage().clone();
        let key = self.storage_key("init-audio.mp4");
        write_with_retry(&storage, &key, init.clone().freeze())
            .await
            .map_err(|e| DashRemuxerError::StorageError(e.to_string()))?;

        {
            let mut state = self.state.write();
            state.audio_init = Some(init.freeze());
            state.audio_codec = codec;
        }
        self.audio_init_written = true;
        Ok(())
    }

    async fn cut_video_segment(&mut self, _current_dts: i64) -> Result<(), DashRemuxerError> {
        let (samples, payload, start_dts_ms) = self.video_buf.take();
        if samples.is_empty() {
            return Ok(());
        }
        let duration_ms: i64 = samples.iter().map(|s| i64::from(s.duration)).sum();
        let seg = fmp4::build_media_segment(VIDEO_TRACK_ID, true, self.video_sequence_no as u32, start_dts_ms as u64, &samples, &payload)?;

        let m4s_name = format!("video-{start_dts_ms}.m4s");
        let storage_key = self.storage_key(&m4s_name);
        let storage = self.segment_manager.storage().clone();
        write_with_retry(&storage, &storage_key, seg.freeze())
            .await
            .map_err(|e| DashRemuxerError::StorageError(e.to_string()))?;

        let mut state = self.state.write();
        state.video_segments.push_back(DashSegmentInfo {
            sequence: self.video_sequence_no,
            start_dts_ms,
            duration_ms,
            m4s_name,
            storage_key,
            created_at: Instant::now(),
        });
        if state.video_segments.len() > self.config.window_size {
            state.video_segments.pop_front();
        }
        self.video_sequence_no += 1;
        Ok(())
    }

    async fn cut_audio_segment(&mut self, _current_dts: i64) -> Result<(), DashRemuxerError> {
        let (samples, payload, start_dts_ms) = self.audio_buf.take();
        if samples.is_empty() {
            return Ok(());
        }
        let duration_ms: i64 = samples.iter().map(|s| i64::from(s.duration)).sum();
        let seg = fmp4::build_media_segment(AUDIO_TRACK_ID, false, self.audio_sequence_no as u32, start_dts_ms as u64, &samples, &payload)?;

        let m4s_name = format!("audio-{start_dts_ms}.m4s");
        let storage_key = self.storage_key(&m4s_name);
        let storage = self.segment_manager.storage().clone();
        write_with_retry(&storage, &storage_key, seg.freeze())
            .await
            .map_err(|e| DashRemuxerError::StorageError(e.to_string()))?;

        let mut state = self.state.write();
        state.audio_segments.push_back(DashSegmentInfo {
            sequence: self.audio_sequence_no,
            start_dts_ms,
            duration_ms,
            m4s_name,
            storage_key,
            created_at: Instant::now(),
        });
        if state.audio_segments.len() > self.config.window_size {
            state.audio_segments.pop_front();
        }
        self.audio_sequence_no += 1;
        Ok(())
    }

    async fn flush_remaining(&mut self) -> Result<(), DashRemuxerError> {
        if !self.video_buf.samples.is_empty() {
            self.cut_video_segment(self.last_video_dts).await?;
        }
        if !self.audio_buf.samples.is_empty() {
            self.cut_audio_segment(self.last_audio_dts).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_buffer_accumulates_duration() {
        let mut buf = TrackBuffer::default();
        buf.push(0, 0, b"a", true);
        buf.push(33, 33, b"bb", false);
        assert_eq!(buf.duration_ms(), 33);
        let (samples, payload, start) = buf.take();
        assert_eq!(samples.len(), 2);
        assert_eq!(payload.len(), 3);
        assert_eq!(start, 0);
    }

    #[test]
    fn dash_stream_processor_state_starts_empty() {
        let state = DashStreamProcessorState::new("app".into(), "stream".into());
        assert!(state.video_segments.is_empty());
        assert!(state.audio_segments.is_empty());
        assert!(!state.is_ended);
    }
}
