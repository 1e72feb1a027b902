//! The room directory: creates, lists, and garbage-collects rooms.
//!
//! # Concurrency note
//!
//! Like the user directory, `RoomDirectory` is a plain single-owner
//! structure guarded by a mutex at the server level. The eviction sweep
//! runs on its own timer but goes through the same mutex, so it only ever
//! sees (and deletes) settled directory state.

use chrono::{DateTime, Utc};

use dicehall_protocol::{Identity, RollMessage, RoomSnapshot, RoomSummary};

use crate::{Room, RoomConfig};

/// Registry of all live rooms.
///
/// Rooms are stored in insertion order (which is what room listings
/// report); the room name is the logical key. With the room counts this
/// serves, linear scans beat maintaining a second index.
#[derive(Default)]
pub struct RoomDirectory {
    rooms: Vec<Room>,
    config: RoomConfig,
}

impl RoomDirectory {
    /// Creates an empty directory with default policy.
    pub fn new() -> Self {
        Self::with_config(RoomConfig::default())
    }

    /// Creates an empty directory with the given policy.
    pub fn with_config(config: RoomConfig) -> Self {
        Self {
            rooms: Vec::new(),
            config,
        }
    }

    /// Creates a room. Returns `None` if a room with this name (after
    /// clamping) already exists.
    pub fn create(&mut self, name: &str) -> Option<&Room> {
        let room = Room::new(name, Utc::now());
        if self.find(room.name()).is_some() {
            tracing::debug!(name = room.name(), "room already exists");
            return None;
        }
        tracing::info!(name = room.name(), "room created");
        self.rooms.push(room);
        self.rooms.last()
    }

    /// Lists every room as a summary, in insertion order.
    ///
    /// The order is not guaranteed stable across deletions — callers
    /// must not depend on it.
    pub fn list(&self) -> Vec<RoomSummary> {
        self.rooms.iter().map(Room::summary).collect()
    }

    /// Full view of one room, if it exists.
    pub fn snapshot(&self, room_name: &str) -> Option<RoomSnapshot> {
        self.find(room_name).map(Room::snapshot)
    }

    /// Whether a room with this name exists.
    pub fn contains(&self, room_name: &str) -> bool {
        self.find(room_name).is_some()
    }

    /// Looks up a room by name.
    pub fn get(&self, room_name: &str) -> Option<&Room> {
        self.find(room_name)
    }

    /// Adds an identity to a room. Returns `false` if the room is absent.
    ///
    /// Idempotent: re-adding an id that's already a member refreshes the
    /// stored identity rather than erroring.
    pub fn add_member(
        &mut self,
        identity: &Identity,
        room_name: &str,
    ) -> bool {
        match self.find_mut(room_name) {
            Some(room) => {
                room.insert_member(identity.clone());
                true
            }
            None => false,
        }
    }

    /// Removes an identity from a room. Returns `false` if the room is
    /// absent or the identity isn't a member.
    pub fn remove_member(
        &mut self,
        identity: &Identity,
        room_name: &str,
    ) -> bool {
        match self.find_mut(room_name) {
            Some(room) => room.remove_member(&identity.id),
            None => false,
        }
    }

    /// Removes an identity from every room it is in. Returns whether at
    /// least one removal happened.
    ///
    /// Used on disconnect cleanup: the directory doesn't track which room
    /// a connection is in (that association lives at the transport level),
    /// so the sweep covers all of them.
    pub fn remove_member_from_all_rooms(
        &mut self,
        identity: &Identity,
    ) -> bool {
        let mut removed = false;
        for room in &mut self.rooms {
            removed |= room.remove_member(&identity.id);
        }
        removed
    }

    /// Appends a roll to a room's history, trimming to the configured
    /// bound (oldest entries drop first). Returns `false` if the room is
    /// absent.
    pub fn post_roll(&mut self, roll: RollMessage, room_name: &str) -> bool {
        let cap = self.config.history_cap;
        match self.find_mut(room_name) {
            Some(room) => {
                room.push_roll(roll, cap);
                true
            }
            None => false,
        }
    }

    /// Deletes rooms judged abandoned as of `now`, returning their names.
    ///
    /// A room is flagged when either:
    /// - it has no history and was created more than the idle TTL ago, or
    /// - any single retained roll is older than the idle TTL. The check
    ///   is per-entry, not most-recent-entry: one stale roll in the
    ///   bounded history flags the room even when fresher rolls exist.
    ///
    /// Two-phase: all rooms are flagged against the same `now` first,
    /// then deleted, so a sweep can never leave the room set partially
    /// judged against different instants.
    pub fn evict_idle(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let ttl = self.config.idle_ttl;
        let flagged: Vec<String> = self
            .rooms
            .iter()
            .filter(|room| {
                if room.history().is_empty() {
                    room.created_at() + ttl < now
                } else {
                    room.history().iter().any(|m| m.created_at + ttl < now)
                }
            })
            .map(|room| room.name().to_string())
            .collect();

        if !flagged.is_empty() {
            tracing::info!(count = flagged.len(), "evicting idle rooms");
            self.rooms
                .retain(|room| !flagged.iter().any(|n| n == room.name()));
        }
        flagged
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the directory has no rooms.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn find(&self, room_name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name() == room_name)
    }

    fn find_mut(&mut self, room_name: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.name() == room_name)
    }
}
