use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

use crate::rtmp::config::RtmpConfig;
use crate::rtmp::session::client_session::ClientSession;
use crate::streamhub::define::{
    BroadcastEvent, BroadcastEventReceiver, NotifyInfo, StreamHubEvent, StreamHubEventSender,
    SubDataType, SubscribeType, SubscriberInfo,
};
use crate::streamhub::stream::StreamIdentifier;
use crate::streamhub::utils::Uuid;

use super::backoff::RetryPolicy;
use super::config::parse_rtmp_url;
use super::errors::RelayError;

/// Pushes every local publish out to a fixed set of peers. Subscribes to
/// the hub once per peer, same as any other consumer (`SubscribeType::RtmpRelay`),
/// so peer failures never affect local playback or other peers.
pub struct Forwarder {
    event_producer: StreamHubEventSender,
    client_events: BroadcastEventReceiver,
    targets: Vec<String>,
    retry: RetryPolicy,
}

impl Forwarder {
    #[must_use]
    pub fn new(
        event_producer: StreamHubEventSender,
        client_events: BroadcastEventReceiver,
        targets: Vec<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self { event_producer, client_events, targets, retry }
    }

    /// Watches the hub's broadcast channel for publishes and spawns one
    /// push task per configured peer for each. Runs until the broadcast
    /// channel closes (the hub shut down).
    pub async fn run(mut self) {
        loop {
            match self.client_events.recv().await {
                Ok(BroadcastEvent::Publish { identifier }) => {
                    for target in self.targets.clone() {
                        let event_producer = self.event_producer.clone();
                        let identifier = identifier.clone();
                        let retry = self.retry.clone();
                        tokio::spawn(async move {
                            if let Err(err) = push_to_peer(event_producer, identifier.clone(), &target, retry).await {
                                tracing::warn!("relay push to {target} for {identifier:?} failed: {err}");
                            }
                        });
                    }
                }
                Ok(BroadcastEvent::UnPublish { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("relay forwarder lagged behind the hub broadcast by {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

async fn push_to_peer(
    event_producer: StreamHubEventSender,
    identifier: StreamIdentifier,
    target: &str,
    retry: RetryPolicy,
) -> Result<(), RelayError> {
    let (addr, app, stream_name) = parse_rtmp_url(target).ok_or_else(|| RelayError::InvalidUrl(target.to_string()))?;

    let sub_info = SubscriberInfo {
        id: Uuid::new(),
        sub_type: SubscribeType::RtmpRelay,
        sub_data_type: SubDataType::Frame,
        notify_info: NotifyInfo {
            request_url: format!("rtmp://{addr}/{app}/{stream_name}"),
            remote_addr: addr.clone(),
        },
    };

    let (result_sender, result_receiver) = oneshot::channel();
    event_producer
        .send(StreamHubEvent::Subscribe { identifier: identifier.clone(), info: sub_info.clone(), result_sender })
        .await
        .map_err(|_| RelayError::ChannelClosed)?;

    let data_receiver = result_receiver
        .await
        .map_err(|_| RelayError::ChannelClosed)?
        .map_err(RelayError::from)?
        .0;
    let mut frame_receiver = data_receiver.frame_receiver.ok_or(RelayError::EmptyStream)?;

    let config = Arc::new(RtmpConfig::default());
    let connect_addr = addr.clone();
    let connect_app = app.clone();
    let connect_stream = stream_name.clone();
    let client = retry
        .run(move || {
            let addr = connect_addr.clone();
            let app = connect_app.clone();
            let stream_name = connect_stream.clone();
            let config = Arc::clone(&config);
            async move {
                let tc_url = format!("rtmp://{addr}/{app}");
                let mut client = ClientSession::connect(&addr, &app, &tc_url, &config).await?;
                client.create_stream().await?;
                client.publish(&stream_name).await?;
                Ok(client)
            }
        })
        .await;

    let result = match client {
        Ok(ref mut client) => loop {
            match frame_receiver.recv().await {
                Some(frame) => {
                    if let Err(err) = client.send_frame(frame).await {
                        break Err(RelayError::from(err));
                    }
                }
                None => break Ok(()),
            }
        },
        Err(err) => Err(err),
    };

    let _ = event_producer
        .send(StreamHubEvent::UnSubscribe { identifier, info: sub_info })
        .await;

    result
}
