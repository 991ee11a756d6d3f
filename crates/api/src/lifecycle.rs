//! Service lifecycle: ordered startup, serving, and bounded shutdown.
//!
//! Startup runs strictly in order and stops at the first failure:
//!
//! 1. Check that at least one discover admin is configured.
//! 2. Connect the Redis token cache.
//! 3. Connect PostgreSQL, apply migrations, optionally seed defaults.
//! 4. Wire use cases, state and router.
//! 5. Pick this instance's port and register with service discovery.
//! 6. Bind and serve on a separate task.
//! 7. Under etcd, watch the config center for restart requests.
//!
//! Shutdown starts on SIGINT/SIGTERM or a config-center restart, drains
//! in-flight requests for at most [`SHUTDOWN_TIMEOUT`], then withdraws the
//! discovery registration.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use discover_core::context::RequestContext;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheError, RedisTokenStore};
use crate::config::{ApiConfig, AppConfig, ShareConfig};
use crate::discovery::{watcher, DiscoveryError, ServiceRegistry};
use crate::router::{build_app_router, RouterError};
use crate::state::AppState;

/// Upper bound on the drain after shutdown is requested.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("Database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Seeding default content failed: {0}")]
    Seed(#[from] discover_db::RepoError),

    #[error("Service discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Listener failed: {0}")]
    Listener(#[source] io::Error),

    #[error("Server did not drain within {0:?}")]
    DrainTimeout(Duration),
}

impl From<RouterError> for LifecycleError {
    fn from(err: RouterError) -> Self {
        LifecycleError::Configuration(err.to_string())
    }
}

/// Run the service until shutdown. `index` selects the port from
/// `api.ports`.
pub async fn start(config: AppConfig, index: usize) -> Result<(), LifecycleError> {
    validate_admins(&config.share)?;
    tracing::info!(admins = config.share.discover_admin.len(), "Discover admins configured");

    // --- Token cache ---
    let tokens = RedisTokenStore::connect(&config.redis).await?;

    // --- Database ---
    let pool = discover_db::create_pool(
        config.postgres.connect_options(),
        config.postgres.max_open_conn,
    )
    .await?;
    tracing::info!("Database connection pool created");

    discover_db::health_check(&pool).await?;
    discover_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    if config.share.seed_defaults {
        let inserted =
            discover_db::seed::seed_defaults(&pool, &RequestContext::background()).await?;
        tracing::info!(inserted, "Default content seeding finished");
    }

    // --- Wiring ---
    let config = Arc::new(config);
    let state = AppState::new(pool.clone(), Arc::clone(&config), Arc::new(tokens));
    let app = build_app_router(state, &config.api)?;

    // --- Discovery ---
    let port = resolve_port(&config.api, index)?;
    let listen_addr = listen_addr(&config.api, port)?;
    let register_addr = register_addr(&config.api, port);

    let registry = ServiceRegistry::from_config(&config.discovery).await?;
    registry.register(&register_addr).await?;

    // --- Serve ---
    let server = match TcpListener::bind(listen_addr).await {
        Ok(listener) => RunningServer::spawn(listener, app),
        Err(source) => {
            withdraw(&registry).await;
            return Err(LifecycleError::Bind {
                addr: listen_addr,
                source,
            });
        }
    };
    tracing::info!(addr = %listen_addr, registered = %register_addr, "Server listening");

    // --- Config watcher ---
    let shutdown = CancellationToken::new();
    let stop_watcher = CancellationToken::new();
    let watcher_task = registry.etcd_client().cloned().map(|client| {
        tokio::spawn(watcher::watch_config(
            client,
            shutdown.clone(),
            stop_watcher.clone(),
        ))
    });

    let outcome = run_until_shutdown(server, shutdown_signal(), shutdown, SHUTDOWN_TIMEOUT).await;

    // --- Post-shutdown cleanup ---
    stop_watcher.cancel();
    if let Some(task) = watcher_task {
        let _ = task.await;
    }
    withdraw(&registry).await;
    pool.close().await;

    match &outcome {
        Ok(()) => tracing::info!("Graceful shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Shutdown finished with error"),
    }
    outcome
}

/// At least one admin must be able to manage content.
pub fn validate_admins(share: &ShareConfig) -> Result<(), LifecycleError> {
    if share.discover_admin.iter().all(|a| a.trim().is_empty()) {
        return Err(LifecycleError::Configuration(
            "share.discoverAdmin must list at least one user id".into(),
        ));
    }
    Ok(())
}

/// `api.ports[index]`.
pub fn resolve_port(api: &ApiConfig, index: usize) -> Result<u16, LifecycleError> {
    api.api.ports.get(index).copied().ok_or_else(|| {
        LifecycleError::Configuration(format!(
            "port index {index} out of range: {} port(s) configured",
            api.api.ports.len()
        ))
    })
}

fn listen_addr(api: &ApiConfig, port: u16) -> Result<SocketAddr, LifecycleError> {
    let ip: IpAddr = api.api.listen_ip.parse().map_err(|e| {
        LifecycleError::Configuration(format!("invalid api.listenIP '{}': {e}", api.api.listen_ip))
    })?;
    Ok(SocketAddr::new(ip, port))
}

/// Address advertised to discovery; falls back to the listen address.
fn register_addr(api: &ApiConfig, port: u16) -> String {
    let ip = if api.api.register_ip.is_empty() {
        &api.api.listen_ip
    } else {
        &api.api.register_ip
    };
    format!("{ip}:{port}")
}

async fn withdraw(registry: &ServiceRegistry) {
    if let Err(e) = registry.deregister().await {
        tracing::warn!(error = %e, "Failed to withdraw discovery registration");
    }
}

/// An HTTP server running on its own task.
pub struct RunningServer {
    stop: CancellationToken,
    task: JoinHandle<()>,
    done: oneshot::Receiver<io::Result<()>>,
}

impl RunningServer {
    /// Start serving `app` on `listener`. The outcome of the serve loop is
    /// reported once through a oneshot channel.
    pub fn spawn(listener: TcpListener, app: Router) -> Self {
        let stop = CancellationToken::new();
        let (tx, done) = oneshot::channel();

        let graceful = stop.clone().cancelled_owned();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(graceful)
                .await;
            let _ = tx.send(result);
        });

        Self { stop, task, done }
    }

    /// Stop accepting connections and wait up to `timeout` for in-flight
    /// requests. On timeout the serve task is aborted.
    pub async fn drain(self, timeout: Duration) -> Result<(), LifecycleError> {
        let Self { stop, task, done } = self;
        stop.cancel();

        match tokio::time::timeout(timeout, done).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(LifecycleError::Listener(e)),
            Ok(Err(_)) => Err(LifecycleError::Listener(io::Error::other(
                "serve task ended without reporting",
            ))),
            Err(_) => {
                task.abort();
                Err(LifecycleError::DrainTimeout(timeout))
            }
        }
    }
}

/// Serve until `signal` resolves, `shutdown` is cancelled, or the listener
/// stops on its own, then drain within `timeout`.
///
/// A listener that stops by itself is returned as its outcome without
/// draining.
pub async fn run_until_shutdown<S>(
    mut server: RunningServer,
    signal: S,
    shutdown: CancellationToken,
    timeout: Duration,
) -> Result<(), LifecycleError>
where
    S: Future<Output = ()>,
{
    tokio::select! {
        () = signal => {}
        () = shutdown.cancelled() => {
            tracing::info!("Shutdown requested, starting graceful shutdown");
        }
        result = &mut server.done => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(LifecycleError::Listener(e)),
                Err(_) => Err(LifecycleError::Listener(io::Error::other(
                    "serve task ended without reporting",
                ))),
            };
        }
    }

    server.drain(timeout).await
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix). If a handler cannot
/// be installed the error is logged and that signal is never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
