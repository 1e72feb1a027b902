//! A single room: membership plus bounded roll history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use dicehall_protocol::{
    clamp, Identity, RollMessage, RoomSnapshot, RoomSummary,
    MAX_ROOM_NAME_LEN,
};

/// One named room.
///
/// The name is the directory key and is clamped to its bound at
/// construction — before the directory's uniqueness check ever sees it.
/// Members are keyed by identity id; history holds the most recent rolls,
/// oldest dropped first.
#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    members: HashMap<String, Identity>,
    history: Vec<RollMessage>,
    created_at: DateTime<Utc>,
}

impl Room {
    /// Creates an empty room with a clamped name.
    pub(crate) fn new(name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: clamp(name, MAX_ROOM_NAME_LEN),
            members: HashMap::new(),
            history: Vec::new(),
            created_at,
        }
    }

    /// The room's (clamped) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of identities currently joined.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether the identity with this id is a member.
    pub fn has_member(&self, identity_id: &str) -> bool {
        self.members.contains_key(identity_id)
    }

    /// The retained roll history, oldest first.
    pub fn history(&self) -> &[RollMessage] {
        &self.history
    }

    /// When the room was created. Never updated.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn insert_member(&mut self, identity: Identity) {
        self.members.insert(identity.id.clone(), identity);
    }

    pub(crate) fn remove_member(&mut self, identity_id: &str) -> bool {
        self.members.remove(identity_id).is_some()
    }

    /// Appends a roll, dropping the oldest entries past `cap`.
    pub(crate) fn push_roll(&mut self, roll: RollMessage, cap: usize) {
        self.history.push(roll);
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    /// The room-list wire shape: name plus computed member count.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.clone(),
            member_count: self.members.len(),
            created_at: self.created_at,
        }
    }

    /// The full wire view sent on join: members and retained history.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            name: self.name.clone(),
            members: self.members.values().cloned().collect(),
            history: self.history.clone(),
            created_at: self.created_at,
        }
    }
}
