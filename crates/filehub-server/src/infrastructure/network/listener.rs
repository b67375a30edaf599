//! Connection listener: binds the server socket and admits sessions.
//!
//! `FileServer` is the handle the operator console drives. `start` binds the
//! configured address and spawns the accept loop; `stop` signals the loop
//! and closes the listening socket. Sessions that are already running are
//! left alone and end on their own.
//!
//! # Admission
//!
//! Capacity is a `tokio::sync::Semaphore` with `max_clients` permits. The
//! accept loop takes a permit with `try_acquire_owned` *before* it builds a
//! session, and the permit moves into the session task. The permit is
//! released when that task ends, however it ends. When no permit is free the
//! stream is dropped at once: the refused client sees the connection close
//! without a greeting and never appears in the roster.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use filehub_core::domain::CatalogueRegistry;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::session::handle_connection;
use crate::application::ClientRegistry;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server is already running on {0}")]
    AlreadyRunning(SocketAddr),
}

/// Where to listen and how many sessions to admit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    pub bind_addr: SocketAddr,
    pub max_clients: usize,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8021),
            max_clients: 10,
        }
    }
}

/// Shared state handed to every session.
pub struct ServerContext {
    pub catalogs: Arc<CatalogueRegistry>,
    pub roster: Arc<ClientRegistry>,
    /// Longest wait for a client's next command; `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl ServerContext {
    pub fn new(catalogs: CatalogueRegistry) -> Self {
        Self {
            catalogs: Arc::new(catalogs),
            roster: Arc::new(ClientRegistry::new()),
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

struct RunningListener {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Start/stop handle around the accept loop.
pub struct FileServer {
    settings: ListenerSettings,
    context: Arc<ServerContext>,
    slots: Arc<Semaphore>,
    running: Option<RunningListener>,
}

impl FileServer {
    pub fn new(settings: ListenerSettings, context: ServerContext) -> Self {
        let slots = Arc::new(Semaphore::new(settings.max_clients));
        Self {
            settings,
            context: Arc::new(context),
            slots,
            running: None,
        }
    }

    /// Binds the listening socket and starts accepting clients.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    ///
    /// # Errors
    ///
    /// [`NetworkError::AlreadyRunning`] if the server is already listening and
    /// [`NetworkError::BindFailed`] if the address cannot be bound.
    pub async fn start(&mut self) -> Result<SocketAddr, NetworkError> {
        if let Some(running) = &self.running {
            return Err(NetworkError::AlreadyRunning(running.local_addr));
        }

        let addr = self.settings.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::BindFailed { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| NetworkError::BindFailed { addr, source })?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.slots),
            Arc::clone(&self.context),
            shutdown_rx,
        ));

        info!(
            "listening on {local_addr} (max {} clients)",
            self.settings.max_clients
        );
        self.running = Some(RunningListener {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stops accepting clients and closes the listening socket.
    ///
    /// Returns `false` if the server was not running. Live sessions keep going.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            error!("accept loop ended abnormally: {e}");
        }
        info!("stopped listening on {}", running.local_addr);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub fn roster(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.context.roster)
    }

    pub fn settings(&self) -> &ListenerSettings {
        &self.settings
    }

    /// Number of sessions that could still be admitted right now.
    pub fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Longest pause after repeated `accept` failures.
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Pause before the next `accept` after `failures` consecutive errors.
fn accept_backoff(failures: u32) -> Duration {
    let millis = 10u64.saturating_mul(1u64 << failures.min(16));
    Duration::from_millis(millis).min(MAX_ACCEPT_BACKOFF)
}

async fn accept_loop(
    listener: TcpListener,
    slots: Arc<Semaphore>,
    context: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut failures = 0u32;
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("shutdown requested; leaving accept loop");
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    failures = 0;
                    admit(stream, peer, &slots, &context);
                }
                Err(e) => {
                    // Errors like EMFILE repeat until something is released.
                    let pause = accept_backoff(failures);
                    error!("accept error: {e}; retrying in {pause:?}");
                    failures = failures.saturating_add(1);
                    tokio::time::sleep(pause).await;
                }
            },
        }
    }
}

fn admit(
    stream: TcpStream,
    peer: SocketAddr,
    slots: &Arc<Semaphore>,
    context: &Arc<ServerContext>,
) {
    match Arc::clone(slots).try_acquire_owned() {
        Ok(permit) => {
            debug!("admitting {peer}");
            let context = Arc::clone(context);
            tokio::spawn(async move {
                handle_connection(stream, peer, context, permit).await;
            });
        }
        Err(_) => {
            warn!("Too many clients. No free space left! Refusing {peer}");
            drop(stream);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
