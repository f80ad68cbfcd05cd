//! musicmash-server library
//!
//! Visual playlist builder backend: signs the user in with Spotify, proxies
//! their top tracks, and keeps the node/edge workflow they arrange on the
//! canvas, saved to SQLite.

use axum::Router;
use chrono::{DateTime, Utc};
use musicmash_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod api;
pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod spotify;
pub mod workflow;

pub use crate::config::ServiceConfig;
pub use crate::error::{ApiError, ApiResult};

use crate::auth::oauth::PendingLogins;
use crate::auth::{SessionStore, TokenRefresher};
use crate::editor::Editor;
use crate::spotify::SpotifyClient;
use crate::workflow::{load_or_initial, DebouncedSaver, SnapshotStore, SqliteSnapshotStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub sessions: SessionStore,
    pub pending_logins: PendingLogins,
    pub refresher: Arc<TokenRefresher>,
    pub spotify: Arc<SpotifyClient>,
    pub editor: Arc<Editor>,
    pub event_bus: EventBus,
    /// Cancelled when the server begins shutting down; ends open SSE streams
    pub shutdown: CancellationToken,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire up the service: load the saved workflow and start its saver
    ///
    /// Must run inside a tokio runtime.
    pub async fn build(
        config: ServiceConfig,
        db: SqlitePool,
        event_bus: EventBus,
    ) -> musicmash_common::Result<Self> {
        let http = spotify::build_http_client()
            .map_err(|e| musicmash_common::Error::Internal(format!("HTTP client: {}", e)))?;

        let store: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(db));
        let graph = load_or_initial(store.as_ref(), &config.workspace, config.placement).await;
        let saver = DebouncedSaver::spawn(
            store,
            config.workspace.clone(),
            config.save_delay,
            event_bus.clone(),
        );

        Ok(Self {
            refresher: Arc::new(TokenRefresher::new(
                http.clone(),
                config.token_url.clone(),
                config.credentials.clone(),
            )),
            spotify: Arc::new(SpotifyClient::new(http, config.api_base_url.clone())),
            editor: Arc::new(Editor::new(graph, saver, event_bus.clone())),
            sessions: SessionStore::new(),
            pending_logins: PendingLogins::new(),
            config: Arc::new(config),
            event_bus,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/auth/login", get(api::login))
        .route("/auth/callback", get(api::callback))
        .route("/auth/logout", post(api::logout))
        .route("/api/session", get(api::session_status))
        .route("/api/spotify/top-tracks", get(api::top_tracks))
        .route("/api/workflow", get(api::get_workflow))
        .route("/api/workflow/commands", post(api::post_command))
        .route("/api/workflow/export", get(api::export_workflow))
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
