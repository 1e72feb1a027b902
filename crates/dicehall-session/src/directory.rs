//! The user directory: registry of currently connected identities.
//!
//! This is the in-memory side of the identity layer (the session codec is
//! the portable side). It's responsible for:
//! - Admitting new registrations (uniqueness + required-field contract)
//! - Re-binding identities to new connections on reconnect
//! - Answering "who is behind this connection?"
//! - Dropping identities on explicit removal
//!
//! # Concurrency note
//!
//! `UserDirectory` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the directory is
//! owned by the server instance and accessed through a mutex at a higher
//! level, so every mutation here is atomic from the caller's perspective.

use std::collections::HashMap;

use rand::Rng;

use dicehall_protocol::{
    clamp, Identity, Registration, MAX_CONNECTION_LEN, MAX_ID_LEN,
};

/// Registry of connected identities, keyed by identity id.
///
/// One instance per server — never a process-wide singleton, so multiple
/// servers (e.g. in tests) stay isolated.
#[derive(Default)]
pub struct UserDirectory {
    users: HashMap<String, Identity>,
}

impl UserDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    /// Registers a new identity for the given connection.
    ///
    /// Returns `None` (the caller emits the failure event) when:
    /// - an identity with this id is already registered, or
    /// - the registration is missing required fields (name, both avatar
    ///   image paths, both color fields).
    ///
    /// A registration without an id gets a generated one. All fields are
    /// clamped to their bounds; the id is clamped *before* the uniqueness
    /// check so the stored key is the one that was checked.
    pub fn register(
        &mut self,
        registration: &Registration,
        connection_id: &str,
    ) -> Option<Identity> {
        let id = match &registration.id {
            Some(id) => clamp(id, MAX_ID_LEN),
            None => generate_id(),
        };

        if self.users.contains_key(&id) {
            tracing::debug!(%id, "registration rejected: id already taken");
            return None;
        }

        let defects = registration.defects();
        if !defects.is_empty() {
            tracing::debug!(?defects, "registration rejected");
            return None;
        }

        let identity =
            Identity::from_registration(&id, registration, connection_id);
        self.users.insert(identity.id.clone(), identity.clone());
        tracing::info!(id = %identity.id, name = %identity.name, "identity registered");
        Some(identity)
    }

    /// Restores a token-carried identity onto a live connection.
    ///
    /// If an identity with this id is already registered (reconnection
    /// while the old entry is still around), its connection id is updated
    /// in place. Otherwise the deserialized identity is adopted as a new
    /// live entry, bound to the presenting connection.
    ///
    /// Never rejects: a disconnect-then-reconnect cycle with a valid
    /// token always succeeds. Returns the live record.
    pub fn restore_or_adopt(
        &mut self,
        identity: Identity,
        connection_id: &str,
    ) -> Identity {
        let connection_id = clamp(connection_id, MAX_CONNECTION_LEN);
        match self.users.get_mut(&identity.id) {
            Some(existing) => {
                existing.connection_id = connection_id;
                tracing::info!(id = %existing.id, "identity reconnected");
                existing.clone()
            }
            None => {
                let mut adopted = identity;
                adopted.connection_id = connection_id;
                self.users.insert(adopted.id.clone(), adopted.clone());
                tracing::info!(id = %adopted.id, "identity restored from token");
                adopted
            }
        }
    }

    /// Finds the identity currently bound to a connection.
    ///
    /// Linear scan — the directory is keyed by identity id, and
    /// connection lookups happen once per inbound event, not per user.
    pub fn find_by_connection(
        &self,
        connection_id: &str,
    ) -> Option<&Identity> {
        self.users
            .values()
            .find(|u| u.connection_id == connection_id)
    }

    /// Re-binds an identity to a new connection. No-op if `id` is unknown.
    pub fn update_connection(&mut self, id: &str, new_connection_id: &str) {
        if let Some(user) = self.users.get_mut(id) {
            user.connection_id = clamp(new_connection_id, MAX_CONNECTION_LEN);
        }
    }

    /// Removes an identity. No-op if `id` is unknown.
    pub fn remove(&mut self, id: &str) {
        if self.users.remove(id).is_some() {
            tracing::info!(%id, "identity removed");
        }
    }

    /// Looks up an identity by id.
    pub fn get(&self, id: &str) -> Option<&Identity> {
        self.users.get(id)
    }

    /// Returns the number of registered identities.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no identities are registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Generates an opaque identity id: 16 hex characters (64 bits of
/// randomness), which exactly fills the id field bound.
fn generate_id() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
