//! `DicehallServer` builder and server loop.
//!
//! This is the entry point for running a Dicehall server. It ties the
//! layers together: transport → protocol → session/room directories →
//! dispatcher, plus the background eviction sweeper.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use dicehall_dice::{DiceEngine, PrngEngine};
use dicehall_protocol::{Codec, JsonCodec};
use dicehall_room::{RoomConfig, RoomDirectory};
use dicehall_session::{SessionCodec, UserDirectory};
use dicehall_tick::{SweepConfig, SweepScheduler};
use dicehall_transport::{Transport, WebSocketTransport};

use crate::dispatcher::handle_connection;
use crate::emitter::Emitter;
use crate::DicehallError;

/// Shared server state passed to each connection handler task.
///
/// The directories are per-server instances behind mutexes — never
/// process-wide singletons — so independent servers (and tests) stay
/// isolated. One inbound event's directory mutation completes under the
/// lock before the next is admitted.
pub(crate) struct ServerState<E: DiceEngine, C: Codec> {
    pub(crate) users: Mutex<UserDirectory>,
    pub(crate) rooms: Mutex<RoomDirectory>,
    pub(crate) sessions: SessionCodec,
    pub(crate) engine: E,
    pub(crate) codec: C,
    pub(crate) emitter: Emitter,
}

/// Builder for configuring and starting a Dicehall server.
///
/// # Example
///
/// ```rust,no_run
/// use dicehall::prelude::*;
///
/// # async fn run() -> Result<(), DicehallError> {
/// let server = DicehallServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_secret("keep-this-out-of-git")
///     .build(PrngEngine)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DicehallServerBuilder {
    bind_addr: String,
    session_secret: Option<String>,
    room_config: RoomConfig,
    sweep_config: SweepConfig,
}

impl DicehallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_secret: None,
            room_config: RoomConfig::default(),
            sweep_config: SweepConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session-token secret explicitly. Without this, the
    /// secret comes from the `SESSION_KEY` environment variable.
    pub fn session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }

    /// Sets the room policy (history bound, idle TTL).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the eviction sweep schedule.
    pub fn sweep_config(mut self, config: SweepConfig) -> Self {
        self.sweep_config = config;
        self
    }

    /// Builds the server with the given dice engine.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<E: DiceEngine>(
        self,
        engine: E,
    ) -> Result<DicehallServer<E, JsonCodec>, DicehallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let sessions = match self.session_secret {
            Some(secret) => SessionCodec::new(Some(secret)),
            None => SessionCodec::from_env(),
        };

        let state = Arc::new(ServerState {
            users: Mutex::new(UserDirectory::new()),
            rooms: Mutex::new(RoomDirectory::with_config(self.room_config)),
            sessions,
            engine,
            codec: JsonCodec,
            emitter: Emitter::new(),
        });

        Ok(DicehallServer {
            transport,
            state,
            sweep_config: self.sweep_config,
        })
    }
}

impl Default for DicehallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Dicehall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DicehallServer<E: DiceEngine, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<E, C>>,
    sweep_config: SweepConfig,
}

impl DicehallServer<PrngEngine, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DicehallServerBuilder {
        DicehallServerBuilder::new()
    }
}

impl<E, C> DicehallServer<E, C>
where
    E: DiceEngine,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: the accept loop plus the background eviction
    /// sweeper. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), DicehallError> {
        // Eviction runs on its own timer, against the same directory
        // mutex as protocol dispatch. A sweep never fails halfway: the
        // directory flags everything against one instant, then deletes.
        let sweeper_state = Arc::clone(&self.state);
        let sweep_config = self.sweep_config.clone();
        tokio::spawn(async move {
            let mut scheduler = SweepScheduler::new(sweep_config);
            loop {
                let sweep = scheduler.wait_for_sweep().await;
                let evicted = sweeper_state
                    .rooms
                    .lock()
                    .await
                    .evict_idle(Utc::now());
                if !evicted.is_empty() {
                    tracing::info!(sweep, rooms = ?evicted, "evicted idle rooms");
                }
                scheduler.record_sweep_end();
            }
        });

        tracing::info!("Dicehall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
