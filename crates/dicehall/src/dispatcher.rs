//! Per-connection handling: the protocol dispatcher and connection loop.
//!
//! Each accepted connection gets its own Tokio task. The flow is:
//!   1. Register the connection's outbound channel with the emitter
//!   2. Spawn a writer task that drains that channel onto the socket
//!   3. Loop: receive frames → decode events → dispatch
//!   4. On close: room cleanup + emitter deregistration
//!
//! The [`Dispatcher`] itself holds no state of its own — it is routing
//! plus response shaping over the directories, the session codec, the
//! dice engine, and the emitter. One method per inbound event; every
//! failure is recovered here into a failure event for the requesting
//! connection only.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use dicehall_dice::DiceEngine;
use dicehall_protocol::{
    ClientEvent, Codec, Registration, RollMessage, ServerEvent,
};
use dicehall_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::error::DispatchError;
use crate::server::ServerState;

/// Routes inbound events to directory operations and outbound events.
pub(crate) struct Dispatcher<E: DiceEngine, C: Codec> {
    state: Arc<ServerState<E, C>>,
}

impl<E: DiceEngine, C: Codec> Dispatcher<E, C> {
    pub(crate) fn new(state: Arc<ServerState<E, C>>) -> Self {
        Self { state }
    }

    /// Dispatches one inbound event, emitting the failure response for
    /// its event type if the handler reports an error.
    pub(crate) async fn dispatch(
        &self,
        conn: ConnectionId,
        event: ClientEvent,
    ) {
        let emitter = &self.state.emitter;
        match event {
            ClientEvent::RegisterNew(registration) => {
                if let Err(e) =
                    self.on_register_new(conn, registration).await
                {
                    tracing::debug!(%conn, error = %e, "registration failed");
                    emitter.to(conn, ServerEvent::RegisterFailure);
                }
            }

            ClientEvent::RegisterRestore(token) => {
                if let Err(e) =
                    self.on_register_restore(conn, &token).await
                {
                    tracing::debug!(%conn, error = %e, "session restore failed");
                    emitter.to(conn, ServerEvent::RegisterRestoreFailure);
                }
            }

            ClientEvent::RoomCreate(name) => {
                if let Err(e) = self.on_room_create(conn, &name).await {
                    tracing::debug!(%conn, error = %e, "room create failed");
                    emitter.to(
                        conn,
                        ServerEvent::ClientError(
                            "Failed to create a new room. Perhaps a room \
                             with the same name already exists?"
                                .into(),
                        ),
                    );
                }
            }

            ClientEvent::RoomList => self.on_room_list(conn).await,

            ClientEvent::RoomJoin(name) => {
                if let Err(e) = self.on_room_join(conn, &name).await {
                    tracing::debug!(%conn, error = %e, "room join failed");
                    match e {
                        DispatchError::RoomNotFound(_) => {
                            emitter.to(
                                conn,
                                ServerEvent::ClientError(
                                    "Room does not exist".into(),
                                ),
                            );
                            self.on_room_list(conn).await;
                        }
                        _ => emitter.to(
                            conn,
                            ServerEvent::ClientError(
                                "Error adding user to the room".into(),
                            ),
                        ),
                    }
                }
            }

            ClientEvent::RoomLeave(name) => {
                if let Err(e) = self.on_room_leave(conn, &name).await {
                    tracing::debug!(%conn, error = %e, "room leave failed");
                    match e {
                        DispatchError::RoomNotFound(_) => {
                            emitter.to(
                                conn,
                                ServerEvent::ClientError(
                                    "Error leaving the room".into(),
                                ),
                            );
                            self.on_room_list(conn).await;
                        }
                        _ => emitter.to(
                            conn,
                            ServerEvent::ClientError(
                                "Error leaving the room".into(),
                            ),
                        ),
                    }
                }
            }

            ClientEvent::RoomRoll(expression) => {
                if let Err(e) = self.on_room_roll(conn, &expression).await {
                    tracing::debug!(%conn, error = %e, "roll failed");
                    emitter.to(
                        conn,
                        ServerEvent::ClientError(
                            "Error rolling the dice, please try again"
                                .into(),
                        ),
                    );
                }
            }

            ClientEvent::ServerPing => {
                emitter.to(conn, ServerEvent::ServerPong("pong".into()));
            }

            ClientEvent::ServerVersion => {
                emitter.to(
                    conn,
                    ServerEvent::ServerVersion(
                        env!("CARGO_PKG_VERSION").into(),
                    ),
                );
            }
        }
    }

    async fn on_register_new(
        &self,
        conn: ConnectionId,
        registration: Registration,
    ) -> Result<(), DispatchError> {
        let identity = {
            let mut users = self.state.users.lock().await;
            users
                .register(&registration, &conn.to_string())
                .ok_or(DispatchError::ValidationRejected)?
        };

        // The token goes back to the client to keep as a cookie.
        let session = self.state.sessions.serialize_identity(&identity)?;
        self.state
            .emitter
            .to(conn, ServerEvent::RegisterSuccess { session, identity });
        Ok(())
    }

    async fn on_register_restore(
        &self,
        conn: ConnectionId,
        token: &str,
    ) -> Result<(), DispatchError> {
        let identity = self.state.sessions.deserialize_identity(token)?;
        let live = self
            .state
            .users
            .lock()
            .await
            .restore_or_adopt(identity, &conn.to_string());
        self.state
            .emitter
            .to(conn, ServerEvent::RegisterRestoreSuccess(live));
        Ok(())
    }

    async fn on_room_create(
        &self,
        conn: ConnectionId,
        name: &str,
    ) -> Result<(), DispatchError> {
        let (summary, listing) = {
            let mut rooms = self.state.rooms.lock().await;
            let summary = rooms
                .create(name)
                .map(|room| room.summary())
                .ok_or(DispatchError::ValidationRejected)?;
            (summary, rooms.list())
        };

        self.state.emitter.to(conn, ServerEvent::RoomCreated(summary));
        // Everyone else learns about the new room via a fresh listing.
        self.state
            .emitter
            .broadcast_others(conn, ServerEvent::RoomList(listing));
        Ok(())
    }

    async fn on_room_list(&self, conn: ConnectionId) {
        let listing = self.state.rooms.lock().await.list();
        self.state.emitter.to(conn, ServerEvent::RoomList(listing));
    }

    async fn on_room_join(
        &self,
        conn: ConnectionId,
        name: &str,
    ) -> Result<(), DispatchError> {
        if !self.state.rooms.lock().await.contains(name) {
            return Err(DispatchError::RoomNotFound(name.to_string()));
        }

        let user = self
            .state
            .users
            .lock()
            .await
            .find_by_connection(&conn.to_string())
            .cloned()
            .ok_or(DispatchError::NotAMember)?;

        let snapshot = {
            let mut rooms = self.state.rooms.lock().await;
            if !rooms.add_member(&user, name) {
                return Err(DispatchError::RoomNotFound(name.to_string()));
            }
            rooms
                .snapshot(name)
                .ok_or_else(|| DispatchError::RoomNotFound(name.to_string()))?
        };

        // Scope the connection to the room before notifying, so the
        // requester is addressable as a member but excluded here.
        self.state.emitter.join(conn, name);
        self.state.emitter.to_room_except(
            name,
            conn,
            ServerEvent::RoomJoined(user.clone()),
        );
        self.state
            .emitter
            .to(conn, ServerEvent::RoomJoinSuccess(snapshot));

        tracing::info!(%conn, room = name, user = %user.id, "joined room");
        Ok(())
    }

    async fn on_room_leave(
        &self,
        conn: ConnectionId,
        name: &str,
    ) -> Result<(), DispatchError> {
        if !self.state.rooms.lock().await.contains(name) {
            return Err(DispatchError::RoomNotFound(name.to_string()));
        }

        let user = self
            .state
            .users
            .lock()
            .await
            .find_by_connection(&conn.to_string())
            .cloned()
            .ok_or(DispatchError::NotAMember)?;

        self.state.rooms.lock().await.remove_member(&user, name);

        self.state.emitter.to_room_except(
            name,
            conn,
            ServerEvent::RoomLeft(user.clone()),
        );
        self.state.emitter.leave(conn, name);
        self.state.emitter.to(conn, ServerEvent::RoomLeaveSuccess);

        tracing::info!(%conn, room = name, user = %user.id, "left room");
        Ok(())
    }

    async fn on_room_roll(
        &self,
        conn: ConnectionId,
        expression: &str,
    ) -> Result<(), DispatchError> {
        let room = self
            .state
            .emitter
            .room_of(conn)
            .ok_or(DispatchError::NotAMember)?;
        if !self.state.rooms.lock().await.contains(&room) {
            return Err(DispatchError::RoomNotFound(room));
        }

        // The engine call is awaited with no directory lock held. The
        // directories may be mutated by other events in the meantime, so
        // everything below re-validates rather than trusting the checks
        // above.
        let outcome = self.state.engine.roll(expression).await?;

        let user = self
            .state
            .users
            .lock()
            .await
            .find_by_connection(&conn.to_string())
            .cloned()
            .ok_or(DispatchError::NotAMember)?;

        let roll = RollMessage {
            author: user.roll_author(),
            roll_string: expression.to_string(),
            total: outcome.total,
            rolls: outcome.rolls,
            created_at: Utc::now(),
        };

        if !self.state.rooms.lock().await.post_roll(roll.clone(), &room) {
            return Err(DispatchError::RoomNotFound(room));
        }

        // The whole room hears the roll, requester included.
        self.state
            .emitter
            .to_room(&room, ServerEvent::RoomRollNew(roll));
        Ok(())
    }

    /// Transport-level disconnect: remove the identity from its rooms
    /// and notify the room it was scoped to. The identity itself stays
    /// registered — a session restore re-binds it to a new connection.
    pub(crate) async fn on_disconnect(&self, conn: ConnectionId) {
        let user = self
            .state
            .users
            .lock()
            .await
            .find_by_connection(&conn.to_string())
            .cloned();

        if let Some(user) = user {
            let removed = self
                .state
                .rooms
                .lock()
                .await
                .remove_member_from_all_rooms(&user);
            if removed {
                if let Some(room) = self.state.emitter.room_of(conn) {
                    self.state.emitter.to_room_except(
                        &room,
                        conn,
                        ServerEvent::RoomLeft(user),
                    );
                }
            }
        }

        self.state.emitter.forget(conn);
        tracing::info!(%conn, "connection closed");
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<E, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<E, C>>,
) where
    E: DiceEngine,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let dispatcher = Dispatcher::new(Arc::clone(&state));

    // Outbound path: events queue on an unbounded channel; one writer
    // task per connection drains it onto the socket.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.emitter.register(conn_id, tx);

    let writer_conn = conn.clone();
    let writer_state = Arc::clone(&state);
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match writer_state.codec.encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if writer_conn.send(&text).await.is_err() {
                break;
            }
        }
    });

    // Inbound path: decode and dispatch until the peer goes away.
    // Undecodable frames are dropped, not fatal — one broken client
    // message must not kill the connection.
    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                let event: ClientEvent = match state.codec.decode(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(
                            %conn_id, error = %e,
                            "ignoring undecodable frame"
                        );
                        continue;
                    }
                };
                dispatcher.dispatch(conn_id, event).await;
            }
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    // Cleanup drops the emitter channel, which ends the writer task.
    dispatcher.on_disconnect(conn_id).await;
    let _ = writer.await;
}
