//! Axum server bootstrap - the composition root.
//!
//! The event queue, the broadcaster, the supervisor and both listeners are
//! wired together here and nowhere else.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use mcsm_core::{ArtifactSource, Settings, SettingsError, load_definitions, save_definitions};
use mcsm_runtime::{
    Broadcaster, BroadcasterConfig, EventQueue, NegotiatingListener, ObserverRegistry,
    PistonArtifactSource, Supervisor, SupervisorConfig,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::routes::{create_router, ws_router};
use crate::state::AppState;

/// CORS configuration for the HTTP API.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub settings: Settings,
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cors: CorsConfig::default(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    pub settings: Settings,
    /// Lifecycle of every registered server.
    pub supervisor: Arc<Supervisor>,
    /// Producer side of the broadcast pipeline.
    pub events: EventQueue,
    /// Connected SSE and WebSocket observers.
    pub observers: Arc<ObserverRegistry>,
    /// Where setup fetches server jars from.
    pub artifacts: Arc<dyn ArtifactSource>,
    ws_port: OnceLock<u16>,
    setup_running: AtomicBool,
}

impl AxumContext {
    /// Port the WebSocket transport ended up on, if it is up.
    pub fn ws_port(&self) -> Option<u16> {
        self.ws_port.get().copied()
    }

    /// Write the current definitions back to `servers_file`.
    pub fn persist_definitions(&self) -> Result<(), SettingsError> {
        save_definitions(&self.settings.servers_file, &self.supervisor.definitions())
    }

    /// Claim the single setup slot. `None` when a setup is already running.
    pub fn begin_setup(self: &Arc<Self>) -> Option<SetupSlot> {
        self.setup_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(SetupSlot {
            ctx: Arc::clone(self),
        })
    }
}

/// Held for the duration of a setup; dropping it (also by unwinding) frees
/// the slot.
pub struct SetupSlot {
    ctx: AppState,
}

impl Drop for SetupSlot {
    fn drop(&mut self) {
        self.ctx.setup_running.store(false, Ordering::Release);
    }
}

/// Bootstrap with the Mojang piston-meta artifact source.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    bootstrap_with(config, Arc::new(PistonArtifactSource::new())).await
}

/// Bootstrap with an explicit artifact source.
///
/// Must run inside a tokio runtime: the broadcaster task is spawned here.
pub async fn bootstrap_with(
    config: &ServerConfig,
    artifacts: Arc<dyn ArtifactSource>,
) -> Result<AxumContext> {
    let settings = config.settings.clone();
    settings.validate()?;

    // 1. Event pipeline: queue -> broadcaster -> observers
    let (events, rx) = EventQueue::new();
    let observers = Arc::new(ObserverRegistry::new(settings.observer_buffer));
    Broadcaster::new(
        Arc::clone(&observers),
        BroadcasterConfig::from_settings(&settings),
    )
    .spawn(rx);

    // 2. Supervisor, reporting console lines through the queue
    let supervisor = Arc::new(
        Supervisor::new(SupervisorConfig::from_settings(&settings))
            .with_event_sink(Arc::new(events.clone())),
    );

    // 3. Persisted definitions
    let definitions = load_definitions(&settings.servers_file)
        .with_context(|| format!("loading {}", settings.servers_file.display()))?;
    let count = definitions.len();
    for definition in definitions {
        supervisor.register(definition);
    }

    info!(
        servers_file = %settings.servers_file.display(),
        servers = count,
        java = %settings.java_path.display(),
        "Axum bootstrap complete"
    );

    Ok(AxumContext {
        settings,
        supervisor,
        events,
        observers,
        artifacts,
        ws_port: OnceLock::new(),
        setup_running: AtomicBool::new(false),
    })
}

/// Both listeners, running on background tasks.
pub struct RunningServer {
    pub http_addr: SocketAddr,
    pub state: AppState,
    http: JoinHandle<()>,
    ws: Option<JoinHandle<()>>,
}

impl RunningServer {
    pub fn ws_port(&self) -> Option<u16> {
        self.state.ws_port()
    }

    /// Stop every managed server, then both listeners.
    pub async fn shutdown(self) {
        self.state.supervisor.shutdown_all().await;
        self.http.abort();
        if let Some(ws) = self.ws {
            ws.abort();
        }
        info!("Servers stopped, listeners closed");
    }
}

/// Bind both listeners and serve them in the background.
///
/// The WebSocket transport negotiates its port; when no port in the window is
/// free the API still comes up and reports `port: null`.
pub async fn spawn_server(ctx: AxumContext, cors: &CorsConfig) -> Result<RunningServer> {
    let state: AppState = Arc::new(ctx);
    let settings = &state.settings;

    let negotiator =
        NegotiatingListener::new(&settings.host, settings.ws_port, settings.max_port_attempts);
    let ws = match negotiator.bind().await {
        Ok(listener) => {
            let port = negotiator.bound_port();
            // First and only set for this context.
            let _ = state.ws_port.set(port);
            info!(host = %settings.host, port, "WebSocket transport listening");
            let app = ws_router(Arc::clone(&state));
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    error!(error = %e, "WebSocket server error");
                }
            }))
        }
        Err(e) => {
            warn!(error = %e, "WebSocket transport unavailable, continuing with SSE only");
            None
        }
    };

    let listener = TcpListener::bind((settings.host.as_str(), settings.http_port))
        .await
        .with_context(|| format!("binding HTTP API to {}:{}", settings.host, settings.http_port))?;
    let http_addr = listener.local_addr()?;
    info!("mcsm API listening on http://{}", http_addr);

    let app = create_router(Arc::clone(&state), cors);
    let http = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "HTTP server error");
        }
    });

    Ok(RunningServer {
        http_addr,
        state,
        http,
        ws,
    })
}

/// Run until Ctrl-C, then stop every managed server.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let running = spawn_server(ctx, &config.cors).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    running.shutdown().await;
    Ok(())
}
