//! `GambitServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session registry →
//! session actors.

use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{Codec, JsonCodec};
use gambit_room::{SessionConfig, SessionRegistry};
use gambit_rules::RuleEngine;
use gambit_transport::{Handshake, Transport, TransportError, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{GambitError, ServerConfig};

/// State shared by every connection task.
///
/// The registry is the only shared mutable structure. It is locked for
/// joins and departures only; moves go straight to the session actor.
pub(crate) struct ServerState<E, C> {
    pub(crate) sessions: Mutex<SessionRegistry<E>>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Gambit server.
///
/// # Example
///
/// ```rust,no_run
/// use gambit::prelude::*;
///
/// # async fn run() -> Result<(), GambitError> {
/// let server = GambitServer::builder()
///     .bind("0.0.0.0:3000")
///     .build::<Chess>()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GambitServerBuilder {
    config: ServerConfig,
}

impl GambitServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from an existing configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration shared by all sessions.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Drops peers that have not finished the WebSocket upgrade after
    /// `timeout`.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Closes connections that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Binds the listener and prepares a server whose sessions run `E`.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build<E: RuleEngine + Default>(
        self,
    ) -> Result<GambitServer<E, JsonCodec>, GambitError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr)
            .await?
            .with_handshake_timeout(self.config.handshake_timeout);

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionRegistry::new(self.config.session)),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(GambitServer { transport, state })
    }
}

impl Default for GambitServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gambit server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GambitServer<E, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<E, C>>,
}

impl GambitServer<gambit_rules::Chess, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GambitServerBuilder {
        GambitServerBuilder::new()
    }
}

impl<E, C> GambitServer<E, C>
where
    E: RuleEngine + Default,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one task per connection.
    ///
    /// Runs until the process is terminated. Accept failures are logged
    /// and do not stop the loop.
    pub async fn run(self) -> Result<(), GambitError> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops accepting once `shutdown`
    /// resolves. Connections already open keep being served by their own
    /// tasks.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), GambitError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "gambit server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    self.transport.shutdown().await?;
                    tracing::info!("gambit server stopped accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let peer = pending.peer_addr();
                            let conn = match pending.complete().await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::debug!(%peer, error = %e, "handshake failed");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(TransportError::Shutdown) => return Ok(()),
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                },
            }
        }
    }
}
