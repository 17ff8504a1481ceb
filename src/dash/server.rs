// DASH HTTP server, the fMP4/MPD counterpart to `hls::server::HlsServer`.
//
// Architecture:
// 1. DASH HTTP server - serves manifest.mpd, init segments and .m4s media
//    segments from the shared `HlsStorage` backend
// 2. DASH remuxer - demuxes FLV into fMP4 video/audio representations

use crate::dash::{
    mpd::Mpd,
    remuxer::{DashRemuxer, DashStreamRegistry},
    segment_manager::SegmentManager,
};
use crate::hls::config::HlsConfig;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::streamhub::StreamsHub;

pub struct DashServer {
    port: usize,
    stream_hub: Arc<Mutex<StreamsHub>>,
    segment_manager: Arc<SegmentManager>,
    stream_registry: DashStreamRegistry,
    shutdown_token: CancellationToken,
    config: HlsConfig,
}

impl DashServer {
    #[must_use]
    pub fn new(
        address: String,
        stream_hub: Arc<Mutex<StreamsHub>>,
        segment_manager: Arc<SegmentManager>,
        stream_registry: DashStreamRegistry,
    ) -> Self {
        Self::with_config(address, stream_hub, segment_manager, stream_registry, HlsConfig::default())
    }

    #[must_use]
    pub fn with_config(
        address: String,
        stream_hub: Arc<Mutex<StreamsHub>>,
        segment_manager: Arc<SegmentManager>,
        stream_registry: DashStreamRegistry,
        config: HlsConfig,
    ) -> Self {
        let port = address.rsplit_once(':').and_then(|(_, p)| p.parse().ok()).unwrap_or(8082);

        Self {
            port,
            stream_hub,
            segment_manager,
            stream_registry,
            shutdown_token: CancellationToken::new(),
            config,
        }
    }

    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("DASH server starting on http://0.0.0.0:{}", self.port);

        let shutdown_token = self.shutdown_token.clone();

        let port = self.port;
        let segment_manager_clone = Arc::clone(&self.segment_manager);
        let stream_registry_clone = self.stream_registry.clone();
        let http_shutdown = shutdown_token.clone();
        let config = self.config;
        tokio::spawn(async move {
            if let Err(e) = start_http_server(port, segment_manager_clone, stream_registry_clone, http_shutdown, config).await {
                tracing::error!("DASH HTTP server error: {}", e);
            }
        });

        let stream_hub_clone = Arc::clone(&self.stream_hub);
        let segment_manager_clone = Arc::clone(&self.segment_manager);
        let stream_registry_clone = self.stream_registry;
        let remuxer_shutdown = shutdown_token.clone();
        tokio::spawn(async move {
            let (client_event_consumer, hub_event_sender) = {
                let mut hub = stream_hub_clone.lock().await;
                (hub.get_client_event_consumer(), hub.get_hub_event_sender())
            };

            let mut remuxer = DashRemuxer::with_config(
                client_event_consumer,
                hub_event_sender,
                segment_manager_clone,
                stream_registry_clone,
                remuxer_shutdown,
                config,
            );

            if let Err(e) = remuxer.run().await {
                tracing::error!("DASH remuxer error: {}", e);
            }
        });

        tracing::info!("DASH server started successfully");
        Ok(())
    }
}

#[derive(Clone)]
struct DashServerState {
    segment_manager: Arc<SegmentManager>,
    stream_registry: DashStreamRegistry,
    window_size: usize,
}

async fn start_http_server(
    port: usize,
    segment_manager: Arc<SegmentManager>,
    stream_registry: DashStreamRegistry,
    shutdown_token: CancellationToken,
    config: HlsConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = DashServerState { segment_manager, stream_registry, window_size: config.window_size };

    let app = Router::new()
        .route("/dash/:app/:stream/manifest.mpd", axum::routing::get(serve_manifest))
        .route("/dash/:app/:stream/:segment", axum::routing::get(serve_segment))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("DASH HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;

    tracing::info!("DASH HTTP server shut down gracefully");
    Ok(())
}

async fn serve_manifest(Path((app, stream)): Path<(String, String)>, State(state): State<DashServerState>) -> Response {
    let registry_key = format!("{app}/{stream}");

    let Some(stream_state) = state.stream_registry.get(&registry_key) else {
        tracing::warn!("DASH stream not found: {}", registry_key);
        return (StatusCode::NOT_FOUND, "Stream not found or ended").into_response();
    };

    let state_lock = stream_state.read();
    let app_clone = app.clone();
    let stream_clone = stream.clone();
    let app_init = app.clone();
    let stream_init = stream.clone();

    let mpd = Mpd::generate(
        &state_lock,
        state.window_size,
        move |is_video| {
            let name = if is_video { "init-video.mp4" } else { "init-audio.mp4" };
            format!("/dash/{app_init}/{stream_init}/{name}")
        },
        move |_is_video, segment_name| format!("/dash/{app_clone}/{stream_clone}/{segment_name}"),
    );

    match mpd {
        Some(body) => (
            StatusCode::OK,
            [("Content-Type", "application/dash+xml"), ("Cache-Control", "no-cache")],
            body,
        )
            .into_response(),
        None => (StatusCode::NO_CONTENT, "Manifest not ready").into_response(),
    }
}

async fn serve_segment(
    Path((app, stream, segment_filename)): Path<(String, String, String)>,
    State(state): State<DashServerState>,
) -> Response {
    let storage_key = format!("{app}-{}-{segment_filename}", stream.replace(':', "-"));

    let content_type = if segment_filename.ends_with(".mp4") || segment_filename.ends_with(".m4s") {
        "video/mp4"
    } else {
        "application/octet-stream"
    };

    match state.segment_manager.storage().read(&storage_key).await {
        Ok(data) => (
            StatusCode::OK,
            [("Content-Type", content_type), ("Cache-Control", "public, max-age=90")],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("DASH segment not found: {} - {}", storage_key, e);
            (StatusCode::NOT_FOUND, "Segment not found").into_response()
        }
    }
}
