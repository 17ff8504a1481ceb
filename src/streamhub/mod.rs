use define::{
    FrameDataReceiver, PacketDataReceiver, PacketDataSender, StatisticData,
    StatisticDataReceiver, StatisticDataSender,
};
use crate::flv::define::aac_packet_type;

use define::PacketData;

pub mod consumer_queue;
pub mod define;
pub mod errors;
pub mod statistics;
pub mod stream;
pub mod utils;

use {
    define::{
        BroadcastEvent, BroadcastEventSender, DataReceiver, DataSender,
        FrameData, FrameDataSender, StreamHubEvent, StreamHubEventReceiver,
        StreamHubEventSender, SubscriberInfo, TStreamHandler, TransceiverEvent,
        TransceiverEventReceiver, TransceiverEventSender,
    },
    errors::{StreamHubError, StreamHubErrorValue},
    std::collections::HashMap,
    std::sync::Arc,
    std::sync::atomic::{AtomicU64, Ordering},
    stream::StreamIdentifier,
    tokio::sync::{broadcast, mpsc, Mutex},
    utils::Uuid,
};

/// Tracks per-subscriber frame drop counts for diagnostics.
struct SubscriberDropCounter {
    sender: FrameDataSender,
    drop_count: Arc<AtomicU64>,
}

/// Tracks per-subscriber packet drop counts for diagnostics.
struct PacketSubscriberDropCounter {
    sender: PacketDataSender,
    drop_count: Arc<AtomicU64>,
}

use statistics::StatisticsStream;

//Receive audio data/video data/meta data/media info from a publisher and send to players/subscribers
//Receive statistic information from a publisher and send to api callers.
pub struct StreamDataTransceiver {
    //used for receiving Audio/Video data from publishers
    data_receiver: DataReceiver,
    //used for receiving event
    event_receiver: TransceiverEventReceiver,
    //used for sending audio/video frame data to players/subscribers (with drop counters)
    id_to_frame_sender: Arc<Mutex<HashMap<Uuid, SubscriberDropCounter>>>,
    //used for sending audio/video packet data to players/subscribers (with drop counters)
    id_to_packet_sender: Arc<Mutex<HashMap<Uuid, PacketSubscriberDropCounter>>>,
    //publisher and subscribers use this sender to submit statistical data
    statistic_data_sender: StatisticDataSender,
    //used for receiving statistical data from publishers and subscribers
    statistic_data_receiver: StatisticDataReceiver,
    //The publisher and subscribers's statistics data of a stream need to be aggregated and sent to the caller as needed.
    statistic_data: Arc<Mutex<StatisticsStream>>,
    //a hander implement by protocols, such as rtmp, webrtc, http-flv, hls
    stream_handler: Arc<dyn TStreamHandler>,
}

/// How often to log per-subscriber drop warnings (every N drops).
const DROP_LOG_INTERVAL: u64 = 100;

impl StreamDataTransceiver {
    fn new(
        data_receiver: DataReceiver,
        event_receiver: TransceiverEventReceiver,
        identifier: StreamIdentifier,
        h: Arc<dyn TStreamHandler>,
    ) -> Self {
        let (statistic_data_sender, statistic_data_receiver) = mpsc::channel(define::STATISTIC_DATA_CHANNEL_CAPACITY);
        Self {
            data_receiver,
            event_receiver,
            statistic_data_sender,
            statistic_data_receiver,
            id_to_frame_sender: Arc::new(Mutex::new(HashMap::new())),
            id_to_packet_sender: Arc::new(Mutex::new(HashMap::new())),
            stream_handler: h,
            statistic_data: Arc::new(Mutex::new(StatisticsStream::new(identifier))),
        }
    }

    /// Snapshot the frame senders map and fan out to all subscribers without holding the lock.
    /// Collects closed/failed subscriber IDs and removes them in a separate lock acquisition.
    /// Drop counters are snapshotted as Arc<AtomicU64> so no lock is needed during fan-out.
    ///
    /// `try_send` on `FrameDataSender` already applies the keyframe-aligned
    /// drop spec.md §4.D Fan-out mandates before reporting `Full` (see
    /// `consumer_queue`), so a `Full` here means even that didn't make
    /// room — counted for diagnostics, not treated as a hard error.
    fn fan_out_frame(
        snapshot: &[(Uuid, FrameDataSender, Arc<AtomicU64>)],
        data: FrameData,
    ) -> Vec<Uuid> {
        let mut closed_ids = Vec::new();
        for (id, sender, drop_count) in snapshot {
            match sender.try_send(data.clone()) {
                Ok(()) => {}
                Err(consumer_queue::TrySendError::Full(_)) => {
                    let prev = drop_count.fetch_add(1, Ordering::Relaxed);
                    if (prev + 1) % DROP_LOG_INTERVAL == 0 {
                        tracing::warn!(
                            "Subscriber {} dropped {} frames due to backpressure",
                            id, prev + 1
                        );
                    }
                }
                Err(consumer_queue::TrySendError::Closed(_)) => {
                    closed_ids.push(*id);
                }
            }
        }
        closed_ids
    }

    /// Snapshot the packet senders map and fan out to all subscribers without holding the lock.
    /// Drop counters are snapshotted as Arc<AtomicU64> so no lock is needed during fan-out.
    fn fan_out_packet(
        snapshot: &[(Uuid, PacketDataSender, Arc<AtomicU64>)],
        data: PacketData,
    ) -> Vec<Uuid> {
        let mut closed_ids = Vec::new();
        for (id, sender, drop_count) in snapshot {
            match sender.try_send(data.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let prev = drop_count.fetch_add(1, Ordering::Relaxed);
                    if (prev + 1) % DROP_LOG_INTERVAL == 0 {
                        tracing::warn!(
                            "Packet subscriber {} dropped {} packets due to backpressure",
                            id, prev + 1
                        );
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed_ids.push(*id);
                }
            }
        }
        closed_ids
    }

    /// Snapshot senders and drop counters (Arc<AtomicU64>) under lock, then fan out lock-free.
    async fn receive_frame_data(
        data: Option<FrameData>,
        frame_senders: &Arc<Mutex<HashMap<Uuid, SubscriberDropCounter>>>,
    ) {
        if let Some(val) = data {
            // Snapshot senders AND drop counters under lock, then release immediately.
            // Drop counters are Arc<AtomicU64>, so cloning the Arc is cheap and allows
            // lock-free atomic increments during fan-out.
            let snapshot: Vec<(Uuid, FrameDataSender, Arc<AtomicU64>)> = {
                let guard = frame_senders.lock().await;
                guard
                    .iter()
                    .map(|(id, sc)| (*id, sc.sender.clone(), Arc::clone(&sc.drop_count)))
                    .collect()
            };

            if snapshot.is_empty() {
                return;
            }

            // Fan out to all subscribers without holding any lock
            let closed_ids = Self::fan_out_frame(&snapshot, val);

            // Remove closed subscribers
            if !closed_ids.is_empty() {
                let mut guard = frame_senders.lock().await;
                for id in closed_ids {
                    guard.remove(&id);
                    tracing::debug!("Removed closed frame subscriber: {}", id);
                }
            }
        }
    }

    async fn receive_frame_data_loop(
        mut exit: broadcast::Receiver<()>,
        mut receiver: FrameDataReceiver,
        frame_senders: Arc<Mutex<HashMap<Uuid, SubscriberDropCounter>>>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    data = receiver.recv() => {
                       Self::receive_frame_data(data, &frame_senders).await;
                    }
                    _ = exit.recv()=>{
                        break;
                    }
                }
            }
        });
    }

    /// Snapshot senders and drop counters (Arc<AtomicU64>) under lock, then fan out lock-free.
    async fn receive_packet_data(
        data: Option<PacketData>,
        packet_senders: &Arc<Mutex<HashMap<Uuid, PacketSubscriberDropCounter>>>,
    ) {
        if let Some(val) = data {
            let snapshot: Vec<(Uuid, PacketDataSender, Arc<AtomicU64>)> = {
                let guard = packet_senders.lock().await;
                guard
                    .iter()
                    .map(|(id, sc)| (*id, sc.sender.clone(), Arc::clone(&sc.drop_count)))
                    .collect()
            };

            if snapshot.is_empty() {
                return;
            }

            let closed_ids = Self::fan_out_packet(&snapshot, val);

            if !closed_ids.is_empty() {
                let mut guard = packet_senders.lock().await;
                for id in closed_ids {
                    guard.remove(&id);
                    tracing::debug!("Removed closed packet subscriber: {}", id);
                }
            }
        }
    }

    async fn receive_packet_data_loop(
        mut exit: broadcast::Receiver<()>,
        mut receiver: PacketDataReceiver,
        packet_senders: Arc<Mutex<HashMap<Uuid, PacketSubscriberDropCounter>>>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    data = receiver.recv() => {
                       Self::receive_packet_data(data, &packet_senders).await;
                    }
                    _ = exit.recv()=>{
                        break;
                    }
                }
            }
        });
    }

    async fn receive_statistics_data(
        data: Option<StatisticData>,
        statistics_data: &Arc<Mutex<StatisticsStream>>,
    ) {
        if let Some(val) = data {
            match val {
                StatisticData::Audio {
                    uuid,
                    data_size,
                    aac_packet_type,
                    duration: _,
                } => {
                    let mut guard = statistics_data.lock().await;
                    if let Some(uid) = uuid {
                        if let Some(sub) = guard.subscribers.get_mut(&uid) {
                            sub.send_bytes += data_size;
                        }
                        guard.total_send_bytes += data_size;
                    } else {
                        match aac_packet_type {
                            aac_packet_type::AAC_RAW => {
                                guard.publisher.audio.recv_bytes += data_size;
                            }
                            aac_packet_type::AAC_SEQHDR => {}
                            _ => {}
                        }
                        guard.total_recv_bytes += data_size;
                    }
                }
                StatisticData::Video {
                    uuid,
                    data_size,
                    frame_count,
                    is_key_frame,
                    duration: _,
                } => {
                    let mut guard = statistics_data.lock().await;
                    if let Some(uid) = uuid {
                        if let Some(sub) = guard.subscribers.get_mut(&uid) {
                            sub.send_bytes += data_size;
                            sub.total_send_bytes += data_size;
                        }
                        guard.total_send_bytes += data_size;
                    } else {
                        guard.total_recv_bytes += data_size;
                        guard.publisher.video.recv_bytes += data_size;
                        guard.publisher.video.recv_frame_count += frame_count;
                        guard.publisher.recv_bytes += data_size;
                        if let Some(is_key) = is_key_frame {
                            if is_key {
                                guard.publisher.video.gop =
                                    guard.publisher.video.recv_frame_count_for_gop;
                                guard.publisher.video.recv_frame_count_for_gop = 1;
                            } else {
                                guard.publisher.video.recv_frame_count_for_gop += frame_count;
                            }
                        }
                    }
                }
                StatisticData::AudioCodec {
                    sound_format,
                    profile,
                    samplerate,
                    channels,
                } => {
                    let audio_codec_data = &mut statistics_data.lock().await.publisher.audio;
                    audio_codec_data.sound_format = sound_format;
                    audio_codec_data.profile = profile;
                    audio_codec_data.samplerate = samplerate;
                    audio_codec_data.channels = channels;
                }
                StatisticData::VideoCodec {
                    codec,
                    profile,
                    level,
                    width,
                    height,
                } => {
                    let video_codec_data = &mut statistics_data.lock().await.publisher.video;
                    video_codec_data.codec = codec;
                    video_codec_data.profile = profile;
                    video_codec_data.level = level;
                    video_codec_data.width = width;
                    video_codec_data.height = height;
                }
                StatisticData::Publisher {
                    id,
                    remote_addr,
                    start_time,
                } => {
                    let publisher = &mut statistics_data.lock().await.publisher;
                    publisher.id = id;
                    publisher.remote_address = remote_addr;

                    publisher.start_time = start_time;
                }
                StatisticData::Subscriber {
                    id,
                    remote_addr,
                    sub_type,
                    start_time,
                } => {
                    let subscriber = &mut statistics_data.lock().await.subscribers;
                    let sub = statistics::StatisticSubscriber {
                        id,
                        remote_address: remote_addr,
                        sub_type,
                        start_time,
                        send_bitrate: 0,
                        send_bytes: 0,
                        total_send_bytes: 0,
                    };
                    subscriber.insert(id, sub);
                }
            }
        }
    }

    async fn receive_statistics_data_loop(
        mut exit_receive: broadcast::Receiver<()>,
        exit_caclulate: broadcast::Receiver<()>,
        mut receiver: StatisticDataReceiver,
        statistics_data: Arc<Mutex<StatisticsStream>>,
    ) {
        let mut statistic_calculate =
            statistics::StatisticsCalculate::new(statistics_data.clone(), exit_caclulate);
        tokio::spawn(async move { statistic_calculate.start().await });

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    data = receiver.recv()  =>
                    {
                        Self::receive_statistics_data(data, &statistics_data).await;
                    }
                    _ = exit_receive.recv()=>{
                        break;
                    }
                }
            }
        });
    }

    async fn receive_event_loop(
        stream_handler: Arc<dyn TStreamHandler>,
        exit: broadcast::Sender<()>,
        mut receiver: TransceiverEventReceiver,
        packet_senders: Arc<Mutex<HashMap<Uuid, PacketSubscriberDropCounter>>>,
        frame_senders: Arc<Mutex<HashMap<Uuid, SubscriberDropCounter>>>,
        statistic_sender: StatisticDataSender,
        statistics_data: Arc<Mutex<StatisticsStream>>,
    ) {
        tokio::spawn(async move {
            loop {
                if let Some(val) = receiver.recv().await {
                    match val {
                        TransceiverEvent::Subscribe {
                            sender,
                            info,
                            result_sender,
                        } => {
                            if let Err(err) = stream_handler
                                .send_prior_data(sender.clone(), info.sub_type)
                                .await
                            {
                                tracing::error!("receive_event_loop send_prior_data err: {err}");
                                break;
                            }
                            match sender {
                                DataSender::Frame {
                                    sender: frame_sender,
                                } => {
                                    frame_senders.lock().await.insert(info.id, SubscriberDropCounter {
                                        sender: frame_sender,
                                        drop_count: Arc::new(AtomicU64::new(0)),
                                    });
                                }
                                DataSender::Packet {
                                    sender: packet_sender,
                                } => {
                                    packet_senders.lock().await.insert(info.id, PacketSubscriberDropCounter {
                                        sender: packet_sender,
                                        drop_count: Arc::new(AtomicU64::new(0)),
                                    });
                                }
                            }

                            if let Err(err) = result_sender.send(statistic_sender.clone()) {
                                tracing::error!(
                                    "receive_event_loop:send statistic send err :{err:?} "
                                );
                            }

                            let mut statistics_data = statistics_data.lock().await;
                            statistics_data.subscriber_count += 1;
                        }
                        TransceiverEvent::UnSubscribe { info } => {
                            frame_senders.lock().await.remove(&info.id);
                            packet_senders.lock().await.remove(&info.id);
                            let mut statistics_data = statistics_data.lock().await;
                            let subscribers = &mut statistics_data.subscribers;
                            subscribers.remove(&info.id);

                            statistics_data.subscriber_count = statistics_data.subscriber_count.saturating_sub(1);
                        }
                        TransceiverEvent::UnPublish {} => {
                            if let Err(err) = exit.send(()) {
                                tracing::error!("TransmitterEvent::UnPublish send error: {err}");
                            }
                            break;
                        }
                    }
                }
            }
        });
    }

    pub async fn run(self) -> Result<(), StreamHubError> {
        let (tx, _) = broadcast::channel::<()>(1);

        if let Some(receiver) = self.data_receiver.frame_receiver {
            Self::receive_frame_data_loop(
                tx.subscribe(),
                receiver,
                self.id_to_frame_sender.clone(),
            )
            .await;
        }

        if let Some(receiver) = self.data_receiver.packet_receiver {
            Self::receive_packet_data_loop(
                tx.subscribe(),
                receiver,
                self.id_to_packet_sender.clone(),
            )
            .await;
        }

        Self::receive_statistics_data_loop(
            tx.subscribe(),
            tx.subscribe(),
            self.statistic_data_receiver,
            self.statistic_data.clone(),
        )
        .await;

        Self::receive_event_loop(
            self.stream_handler,
            tx,
            self.event_receiver,
            self.id_to_packet_sender,
            self.id_to_frame_sender,
            self.statistic_data_sender,
            self.statistic_data.clone(),
        )
        .await;

        Ok(())
    }

    #[must_use] 
    pub fn get_statistics_data_sender(&self) -> StatisticDataSender {
        self.statistic_data_sender.clone()
    }
}

pub struct StreamsHub {
    //stream identifier to transceiver event sender
    streams: HashMap<StreamIdentifier, TransceiverEventSender>,
    //event is consumed in Stream hub, produced from other protocol sessions
    hub_event_receiver: StreamHubEventReceiver,
    //event is produced from other protocol sessions
    hub_event_sender: StreamHubEventSender,
    //broadcast publish/unpublish events to subscribers (HLS remuxer, publisher manager, etc.)
    client_event_sender: BroadcastEventSender,
}

impl StreamsHub {
    #[must_use] 
    pub fn new(
        event_producer: StreamHubEventSender,
        event_consumer: StreamHubEventReceiver,
        ) -> Self {
        let (client_producer, _) = broadcast::channel(1000);

        Self {
            streams: HashMap::new(),
            hub_event_receiver: event_consumer,
            hub_event_sender: event_producer,
            client_event_sender: client_producer,
        }
    }
    pub async fn run(&mut self) {
        self.event_loop().await;
        // H-3: If we reach here, all event senders were dropped — the hub is broken.
        tracing::error!(
            "StreamHub event_loop exited: all event senders dropped. \
             The streaming infrastructure is no longer functional."
        );
    }

    pub fn get_hub_event_sender(&mut self) -> StreamHubEventSender {
        self.hub_event_sender.clone()
    }

    pub fn get_client_event_consumer(&mut self) -> define::BroadcastEventReceiver {
        self.client_event_sender.subscribe()
    }

    pub async fn event_loop(&mut self) {
        while let Some(event) = self.hub_event_receiver.recv().await {
            match event {
                StreamHubEvent::Publish {
                    identifier,
                    info,
                    result_sender,
                    stream_handler,
                } => {
                    let (frame_sender, packet_sender, receiver) = match info.pub_data_type {
                        define::PubDataType::Frame => {
                            let (sender_chan, receiver_chan) = consumer_queue::channel(define::FRAME_DATA_CHANNEL_CAPACITY);
                            (
                                Some(sender_chan),
                                None,
                                DataReceiver {
                                    frame_receiver: Some(receiver_chan),
                                    packet_receiver: None,
                                },
                            )
                        }
                        define::PubDataType::Packet => {
                            let (sender_chan, receiver_chan) = mpsc::channel(define::PACKET_DATA_CHANNEL_CAPACITY);
                            (
                                None,
                                Some(sender_chan),
                                DataReceiver {
                                    frame_receiver: None,
                                    packet_receiver: Some(receiver_chan),
                                },
                            )
                        }
                        define::PubDataType::Both => {
                            let (sender_frame_chan, receiver_frame_chan) =
                                consumer_queue::channel(define::FRAME_DATA_CHANNEL_CAPACITY);
                            let (sender_packet_chan, receiver_packet_chan) =
                                mpsc::channel(define::PACKET_DATA_CHANNEL_CAPACITY);

                            (
                                Some(sender_frame_chan),
                                Some(sender_packet_chan),
                                DataReceiver {
                                    frame_receiver: Some(receiver_frame_chan),
                                    packet_receiver: Some(receiver_packet_chan),
                                },
                            )
                        }
                    };

                    let result = match self
                        .publish(identifier.clone(), receiver, stream_handler)
                        .await
                    {
                        Ok(statistic_data_sender) => {
                            Ok((frame_sender, packet_sender, Some(statistic_data_sender)))
                        }
                        Err(err) => {
                            tracing::error!("event_loop Publish err: {err}");
                            Err(err)
                        }
                    };

                    if result_sender.send(result).is_err() {
                        tracing::error!("event_loop Subscribe error: The receiver dropped.");
                    }
                }

                StreamHubEvent::UnPublish {
                    identifier,
                } => {
                    if let Err(err) = self.unpublish(&identifier) {
                        tracing::error!(
                            "event_loop Unpublish err: {err} with identifier: {identifier}"
                        );
                    }
                }
                StreamHubEvent::Subscribe {
                    identifier,
                    info,
                    result_sender,
                } => {
                    let info_clone = info.clone();

                    //new chan for Frame/Packet sender and receiver
                    let (sender, receiver) = match info.sub_data_type {
                        define::SubDataType::Frame => {
                            let (sender_chan, receiver_chan) = consumer_queue::channel(define::FRAME_DATA_CHANNEL_CAPACITY);
                            (
                                DataSender::Frame {
                                    sender: sender_chan,
                                },
                                DataReceiver {
                                    frame_receiver: Some(receiver_chan),
                                    packet_receiver: None,
                                },
                            )
                        }
                        define::SubDataType::Packet => {
                            let (sender_chan, receiver_chan) = mpsc::channel(define::PACKET_DATA_CHANNEL_CAPACITY);
                            (
                                DataSender::Packet {
                                    sender: sender_chan,
                                },
                                DataReceiver {
                                    frame_receiver: None,
                                    packet_receiver: Some(receiver_chan),
                                },
                            )
                        }
                    };

                    let rv = match self.subscribe(&identifier, info_clone, sender).await {
                        Ok(statistic_data_sender) => {
                            Ok((receiver, Some(statistic_data_sender)))
                        }
                        Err(err) => {
                            tracing::error!("event_loop Subscribe error: {err}");
                            Err(err)
                        }
                    };

                    if result_sender.send(rv).is_err() {
                        tracing::error!("event_loop Subscribe error: The receiver dropped.");
                    }
                }
                StreamHubEvent::UnSubscribe { identifier, info } => {
                    let _ = self.unsubscribe(&identifier, info);
                }
                StreamHubEvent::Discontinuity { identifier } => {
                    let client_event = BroadcastEvent::Discontinuity { identifier };
                    if let Err(err) = self.client_event_sender.send(client_event) {
                        tracing::debug!("broadcast Discontinuity event: no receivers ({err})");
                    }
                }
            }
        }
    }

    //player subscribe a stream
    pub async fn subscribe(
        &mut self,
        identifer: &StreamIdentifier,
        sub_info: SubscriberInfo,
        sender: DataSender,
    ) -> Result<StatisticDataSender, StreamHubError> {
        if let Some(event_sender) = self.streams.get_mut(identifer) {
            let (result_sender, result_receiver) = tokio::sync::oneshot::channel();
            let event = TransceiverEvent::Subscribe {
                sender,
                info: sub_info,
                result_sender,
            };
            tracing::info!("subscribe:  stream identifier: {identifer}");
            event_sender.send(event).await.map_err(|_| StreamHubError {
                value: StreamHubErrorValue::SendError,
            })?;

            return Ok(result_receiver.await?);
        }

        Err(StreamHubError {
            value: StreamHubErrorValue::NoAppOrStreamName,
        })
    }

    pub fn unsubscribe(
        &mut self,
        identifer: &StreamIdentifier,
        sub_info: SubscriberInfo,
    ) -> Result<(), StreamHubError> {
        if let Some(producer) = self.streams.get_mut(identifer) {
            tracing::info!("unsubscribe....:{identifer}");
            let event = TransceiverEvent::UnSubscribe { info: sub_info };
            producer.try_send(event).map_err(|_| StreamHubError {
                value: StreamHubErrorValue::SendError,
            })?;
        } else {
            tracing::info!("unsubscribe None....:{identifer}");
            return Err(StreamHubError {
                value: StreamHubErrorValue::NoAppName,
            });
        }

        Ok(())
    }

    //publish a stream
    pub async fn publish(
        &mut self,
        identifier: StreamIdentifier,
        receiver: DataReceiver,
        handler: Arc<dyn TStreamHandler>,
    ) -> Result<StatisticDataSender, StreamHubError> {
        if self.streams.contains_key(&identifier) {
            return Err(StreamHubError {
                value: StreamHubErrorValue::Exists,
            });
        }

        let (event_sender, event_receiver) = mpsc::channel(define::TRANSCEIVER_EVENT_CHANNEL_CAPACITY);
        let transceiver =
            StreamDataTransceiver::new(receiver, event_receiver, identifier.clone(), handler);

        let statistic_data_sender = transceiver.get_statistics_data_sender();
        let identifier_clone = identifier.clone();

        tokio::spawn(async move {
            if let Err(err) = transceiver.run().await {
                tracing::error!("transceiver run error, idetifier: {identifier_clone}, error: {err}");
            } else {
                tracing::info!("transceiver run finished, idetifier: {identifier_clone}");
            }
        });

        self.streams.insert(identifier.clone(), event_sender);

        // Always broadcast publish event to listeners (HLS remuxer, publisher manager, etc.)
        let client_event = BroadcastEvent::Publish { identifier };
        if let Err(err) = self.client_event_sender.send(client_event) {
            tracing::debug!("broadcast Publish event: no receivers ({err})");
        }

        Ok(statistic_data_sender)
    }

    fn unpublish(&mut self, identifier: &StreamIdentifier) -> Result<(), StreamHubError> {
        match self.streams.get_mut(identifier) {
            Some(producer) => {
                let event = TransceiverEvent::UnPublish {};
                producer.try_send(event).map_err(|_| StreamHubError {
                    value: StreamHubErrorValue::SendError,
                })?;
                self.streams.remove(identifier);
                tracing::info!("unpublish remove stream, stream identifier: {identifier}");

                // Broadcast unpublish event to listeners
                let client_event = BroadcastEvent::UnPublish {
                    identifier: identifier.clone(),
                };
                if let Err(err) = self.client_event_sender.send(client_event) {
                    tracing::debug!("broadcast UnPublish event: no receivers ({err})");
                }
            }
            None => {
                return Err(StreamHubError {
                    value: StreamHubErrorValue::NoAppName,
                });
            }
        }

        Ok(())
    }
}
