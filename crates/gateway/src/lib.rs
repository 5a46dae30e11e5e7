//! HTTP API gateway for RelayDesk.
//!
//! Exposes a health check and the v1 API, one endpoint group per
//! assistant, with explicit travel-planner sessions.
//!
//! Built on Axum; every request runs its pipeline to completion before the
//! response is written.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use relaydesk_agent::{Assistants, CompletionClient, SessionStore};
use relaydesk_config::AppConfig;
use relaydesk_core::error::Error;
use relaydesk_core::event::EventBus;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub client: CompletionClient,
    pub assistants: Assistants,
    pub sessions: SessionStore,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire the assistants around an already-built completion client.
    pub fn new(config: AppConfig, client: CompletionClient) -> Result<Self, Error> {
        let assistants = Assistants::from_config(&config)?;
        let sessions = SessionStore::new(config.gateway.max_sessions);
        Ok(Self {
            config,
            client,
            assistants,
            sessions,
            start_time: chrono::Utc::now(),
        })
    }
}

/// Build the full router: health check, the v1 API, and the HTTP layers.
///
/// Layers applied:
/// - Request body size limit from `[gateway] max_body_bytes`
/// - CORS for local front-ends only
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.gateway.max_body_bytes;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            is_local_origin(origin.as_bytes())
        }))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn is_local_origin(origin: &[u8]) -> bool {
    [
        b"http://localhost".as_slice(),
        b"http://127.0.0.1".as_slice(),
    ]
    .iter()
    .any(|prefix| {
        origin.starts_with(prefix)
            && matches!(origin.get(prefix.len()), None | Some(b':'))
    })
}

/// Start the gateway HTTP server.
///
/// Refuses to start without an API key: the completion client is built
/// before the listener is bound.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let event_bus = Arc::new(EventBus::default());
    let client = CompletionClient::from_config(&config)?.with_event_bus(event_bus.clone());
    spawn_event_logger(&event_bus);

    info!(
        provider = client.provider_name(),
        model = client.model(),
        "Completion client ready"
    );

    let state = Arc::new(GatewayState::new(config, client)?);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting with v1 API");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log agent activity from the event bus at debug level.
fn spawn_event_logger(event_bus: &Arc<EventBus>) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match rx.recv().await {
                Ok(event) => tracing::debug!(event = ?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
