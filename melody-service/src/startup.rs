//! Application startup and lifecycle management.

use crate::config::MelodyConfig;
use crate::handlers::{
    callback::suno_callback,
    health::{health_check, home},
    metrics::metrics,
    music::{generate_music, get_music},
};
use crate::services::metrics::init_metrics;
use crate::services::providers::suno::SunoProvider;
use crate::services::providers::MusicProvider;
use crate::services::{MokaResultStore, RelayService, ResultStore};
use axum::{
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MelodyConfig>,
    pub relay: RelayService,
}

impl AppState {
    /// Wire the relay around `provider` with a fresh result store.
    pub fn new(config: MelodyConfig, provider: Arc<dyn MusicProvider>) -> Self {
        let store: Arc<dyn ResultStore> = Arc::new(MokaResultStore::new(&config.store));
        let relay = RelayService::new(&config, provider, store);
        Self {
            config: Arc::new(config),
            relay,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/generate_music", post(generate_music))
        .route("/callback", post(suno_callback))
        .route("/music/:task_id", get(get_music))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.cors.allowed_origins))
        .with_state(state)
}

/// `*` anywhere in the list opens CORS to every origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against the real Suno API.
    pub async fn build(config: MelodyConfig) -> Result<Self, AppError> {
        let provider: Arc<dyn MusicProvider> = Arc::new(SunoProvider::new(&config)?);
        tracing::info!(
            base_url = %config.suno.base_url,
            model = %config.suno.model,
            mode = %config.delivery.mode,
            "Initialized Suno provider"
        );

        Self::build_with_provider(config, provider).await
    }

    /// Build the application around any provider.
    pub async fn build_with_provider(
        config: MelodyConfig,
        provider: Arc<dyn MusicProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        // port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Melody service listening on port {}", port);

        let router = build_router(AppState::new(config, provider));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
