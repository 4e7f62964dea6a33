//! Web server setup and shared state

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::chat::{BotInfo, Chatbot};
use crate::config::Config;
use crate::error::{MembotError, Result};

use super::handlers;

/// Builds a fresh session
pub type ChatbotFactory = Arc<dyn Fn() -> Result<Chatbot> + Send + Sync>;

const DEFAULT_MAX_SESSIONS: usize = 1000;
const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

struct Session {
    bot: Arc<Chatbot>,
    last_active: Instant,
}

/// Shared application state for all handlers
pub struct AppState {
    /// Static assistant description, served without touching any session
    pub info: BotInfo,
    sessions: DashMap<Uuid, Session>,
    factory: ChatbotFactory,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl AppState {
    pub fn new(info: BotInfo, factory: ChatbotFactory) -> Self {
        Self {
            info,
            sessions: DashMap::new(),
            factory,
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout: DEFAULT_SESSION_IDLE,
        }
    }

    /// Bound the number of live sessions and how long they may sit unused
    pub fn with_limits(mut self, max_sessions: usize, idle_timeout: Duration) -> Self {
        self.max_sessions = max_sessions;
        self.idle_timeout = idle_timeout;
        self
    }

    /// State whose sessions talk to the configured API
    pub fn from_config(config: &Config) -> Result<Self> {
        // Fail at startup rather than on the first session
        let first = Chatbot::from_config(config)?;
        let max_sessions = config.server.max_sessions;
        let idle_timeout = Duration::from_secs(config.server.session_idle_secs);
        let config = config.clone();
        Ok(Self::new(
            first.describe(),
            Arc::new(move || Chatbot::from_config(&config)),
        )
        .with_limits(max_sessions, idle_timeout))
    }

    /// Create and register a new session.
    ///
    /// Idle sessions are dropped first; fails with
    /// [`MembotError::SessionLimit`] when the table is still full.
    pub fn create_session(&self) -> Result<Uuid> {
        if self.sessions.len() >= self.max_sessions {
            self.prune_idle();
        }
        let active = self.sessions.len();
        if active >= self.max_sessions {
            tracing::warn!("Refusing new session, {active} already active");
            return Err(MembotError::SessionLimit(active));
        }

        let chatbot = (self.factory)()?;
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Session {
                bot: Arc::new(chatbot),
                last_active: Instant::now(),
            },
        );
        tracing::info!("Created session {id} ({} active)", self.sessions.len());
        Ok(id)
    }

    /// Look up a session and mark it as used
    pub fn session(&self, id: &Uuid) -> Option<Arc<Chatbot>> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_active = Instant::now();
            entry.bot.clone()
        })
    }

    pub fn remove_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Removed session {id}");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions unused for longer than the idle timeout.
    ///
    /// A session with a chat in flight is never dropped. Returns how many
    /// were removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            session.bot.is_processing() || session.last_active.elapsed() < self.idle_timeout
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!("Expired {removed} idle sessions ({} active)", self.sessions.len());
        }
        removed
    }

    fn sweep_interval(&self) -> Duration {
        (self.idle_timeout / 4).max(MIN_SWEEP_INTERVAL)
    }
}

/// The web server
pub struct WebServer {
    listen_addr: String,
    request_timeout: Duration,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: &Config, state: Arc<AppState>) -> Self {
        Self {
            listen_addr: config.server.listen_addr.clone(),
            request_timeout: config.request_timeout(),
            state,
        }
    }

    /// Start the server and run until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let addr: SocketAddr = self
            .listen_addr
            .parse()
            .map_err(|e| MembotError::Config(format!("Invalid listen address: {e}")))?;

        let app = create_router(self.state.clone()).layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            self.request_timeout,
        ));

        tracing::info!("Starting web server on {addr}");
        tracing::info!("Serving {} ({})", self.state.info.name, self.state.info.model);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| MembotError::Server(format!("Failed to bind to {addr}: {e}")))?;

        let sweeper = spawn_session_sweeper(self.state.clone());

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| MembotError::Server(format!("Server error: {e}")));
        sweeper.abort();
        served?;

        tracing::info!("Web server shut down gracefully");
        Ok(())
    }
}

/// Periodically expire idle sessions
fn spawn_session_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            state.prune_idle();
        }
    })
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        .route("/api/sessions", post(handlers::create_session_handler))
        .route(
            "/api/sessions/{id}",
            axum::routing::delete(handlers::delete_session_handler),
        )
        .route("/api/sessions/{id}/chat", post(handlers::chat_handler))
        .route("/api/sessions/{id}/stats", get(handlers::stats_handler))
        .route("/api/sessions/{id}/history", get(handlers::history_handler))
        .route("/api/sessions/{id}/clear", post(handlers::clear_handler))
        .route("/api/sessions/{id}/export", get(handlers::export_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
