//! Entity and event types for Dicehall's wire format.
//!
//! Everything here either travels on the wire as JSON or is stored in one
//! of the in-memory directories. Client-facing field names are camelCase
//! (the browser client stores identities in a cookie and reads these
//! fields directly), event names are kebab-case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::clamp;

// ---------------------------------------------------------------------------
// Field bounds
// ---------------------------------------------------------------------------

/// Maximum length of an identity id.
pub const MAX_ID_LEN: usize = 16;
/// Maximum length of an identity display name.
pub const MAX_NAME_LEN: usize = 16;
/// Maximum length of an avatar name.
pub const MAX_AVATAR_NAME_LEN: usize = 20;
/// Maximum length of avatar image paths (src and thumb).
pub const MAX_AVATAR_URL_LEN: usize = 255;
/// Maximum length of a color hex value (`#RRGGBBAA` is 9).
pub const MAX_COLOR_HEX_LEN: usize = 9;
/// Maximum length of a color name.
pub const MAX_COLOR_NAME_LEN: usize = 20;
/// Maximum length of a connection id.
pub const MAX_CONNECTION_LEN: usize = 20;
/// Maximum length of a room name.
pub const MAX_ROOM_NAME_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An identity's avatar: a display name plus full-size and thumbnail
/// image paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub name: String,
    pub src: String,
    pub thumb: String,
}

impl Avatar {
    fn normalized(&self) -> Self {
        Self {
            name: clamp(&self.name, MAX_AVATAR_NAME_LEN),
            src: clamp(&self.src, MAX_AVATAR_URL_LEN),
            thumb: clamp(&self.thumb, MAX_AVATAR_URL_LEN),
        }
    }
}

/// An identity's chat color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub hex: String,
    pub name: String,
}

impl Color {
    fn normalized(&self) -> Self {
        Self {
            hex: clamp(&self.hex, MAX_COLOR_HEX_LEN),
            name: clamp(&self.name, MAX_COLOR_NAME_LEN),
        }
    }
}

/// A registered user record, as stored in the user directory and as
/// serialized into a session token.
///
/// Every string field is clamped to its bound at construction — an
/// identity that exists is always within bounds, which in turn bounds
/// the size of the session token it serializes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique id across the user directory.
    pub id: String,
    /// Display name.
    pub name: String,
    pub avatar: Avatar,
    pub color: Color,
    /// The transport connection currently associated with this identity.
    /// Updated in place when the same identity reconnects.
    pub connection_id: String,
}

impl Identity {
    /// Builds a normalized identity from registration fields.
    ///
    /// `id` is the resolved id — either the one the client supplied or a
    /// freshly generated one; the caller decides, this constructor only
    /// enforces bounds.
    pub fn from_registration(
        id: &str,
        registration: &Registration,
        connection_id: &str,
    ) -> Self {
        Self {
            id: clamp(id, MAX_ID_LEN),
            name: clamp(&registration.name, MAX_NAME_LEN),
            avatar: registration.avatar.normalized(),
            color: registration.color.normalized(),
            connection_id: clamp(connection_id, MAX_CONNECTION_LEN),
        }
    }

    /// Snapshot of the fields a roll message carries about its author:
    /// display name, avatar thumbnail, and color hex.
    pub fn roll_author(&self) -> RollAuthor {
        RollAuthor {
            name: self.name.clone(),
            avatar: self.avatar.thumb.clone(),
            color: self.color.hex.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// The fields a client submits with `register-new`.
///
/// `id` is normally absent (the directory generates one); a client may
/// supply its own, subject to the uniqueness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub avatar: Avatar,
    pub color: Color,
}

/// A missing or empty required registration field.
///
/// This is the tagged result of the protocol-boundary contract check:
/// serde establishes field *presence*, this establishes non-emptiness of
/// the fields registration requires. The avatar display name is the one
/// field allowed to be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldDefect {
    #[error("name is empty")]
    EmptyName,
    #[error("avatar src is empty")]
    EmptyAvatarSrc,
    #[error("avatar thumb is empty")]
    EmptyAvatarThumb,
    #[error("color hex is empty")]
    EmptyColorHex,
    #[error("color name is empty")]
    EmptyColorName,
}

impl Registration {
    /// Checks the required-field contract, returning every defect found.
    pub fn defects(&self) -> Vec<FieldDefect> {
        let mut defects = Vec::new();
        if self.name.is_empty() {
            defects.push(FieldDefect::EmptyName);
        }
        if self.avatar.src.is_empty() {
            defects.push(FieldDefect::EmptyAvatarSrc);
        }
        if self.avatar.thumb.is_empty() {
            defects.push(FieldDefect::EmptyAvatarThumb);
        }
        if self.color.hex.is_empty() {
            defects.push(FieldDefect::EmptyColorHex);
        }
        if self.color.name.is_empty() {
            defects.push(FieldDefect::EmptyColorName);
        }
        defects
    }
}

// ---------------------------------------------------------------------------
// Rolls
// ---------------------------------------------------------------------------

/// The identity snapshot attached to a roll at the moment it was made.
///
/// A flat copy (name, avatar thumbnail, color hex) rather than a live
/// reference — authorship survives the author mutating their identity,
/// disconnecting, or being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollAuthor {
    pub name: String,
    pub avatar: String,
    pub color: String,
}

/// One die's outcome within a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieRoll {
    /// Position of this die in the roll, starting at 1.
    pub order: u32,
    /// Number of sides.
    pub sides: u32,
    /// The face that came up (1..=sides).
    pub result: u32,
}

/// An immutable record of one dice roll, stored in room history and
/// broadcast to room members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollMessage {
    pub author: RollAuthor,
    /// The raw dice expression as submitted, e.g. `"2d20"`.
    pub roll_string: String,
    pub total: u32,
    pub rolls: Vec<DieRoll>,
    /// Used for display and by the room eviction policy.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Rooms (wire shapes)
// ---------------------------------------------------------------------------

/// The room-list entry: what every client sees in `room-list` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub name: String,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

/// The full room view sent to a client on join: current members plus the
/// retained roll history, so late joiners see recent rolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: String,
    pub members: Vec<Identity>,
    pub history: Vec<RollMessage>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Protocol events
// ---------------------------------------------------------------------------

/// Inbound events: everything a client can ask the server to do.
///
/// Wire form is adjacently tagged JSON:
/// `{ "event": "room-join", "data": "A New Room" }`, with `data` absent
/// for events that carry no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Submit a fresh identity for registration.
    RegisterNew(Registration),
    /// Present a previously issued session token.
    RegisterRestore(String),
    /// Create a room with the given name.
    RoomCreate(String),
    /// Ask for the current room list.
    RoomList,
    /// Join the named room.
    RoomJoin(String),
    /// Leave the named room.
    RoomLeave(String),
    /// Roll dice in the current room. Payload is the dice expression.
    RoomRoll(String),
    /// Connection liveness probe.
    ServerPing,
    /// Ask which server version is running.
    ServerVersion,
}

/// Outbound events: everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Registration accepted: the portable session token plus the stored
    /// identity (with generated id and clamped fields).
    RegisterSuccess {
        session: String,
        identity: Identity,
    },
    /// Registration rejected (duplicate id or missing required fields).
    RegisterFailure,
    /// Token restored into a live identity.
    RegisterRestoreSuccess(Identity),
    /// Token could not be read; client should discard it and re-register.
    RegisterRestoreFailure,
    /// The requester's room was created.
    RoomCreated(RoomSummary),
    /// Current room directory listing.
    RoomList(Vec<RoomSummary>),
    /// The requester joined a room; payload is the full room view.
    RoomJoinSuccess(RoomSnapshot),
    /// Someone else joined the requester's room.
    RoomJoined(Identity),
    /// The requester left their room.
    RoomLeaveSuccess,
    /// Someone else left the requester's room.
    RoomLeft(Identity),
    /// A new roll was posted to the requester's room.
    RoomRollNew(RollMessage),
    /// A request failed in a way the client should surface to the user.
    ClientError(String),
    /// Liveness probe answer.
    ServerPong(String),
    /// Running server version.
    ServerVersion(String),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for entity normalization and the exact JSON event shapes.
    //!
    //! The browser client parses these events by their `event` tag and
    //! reads camelCase fields out of `data` — a shape mismatch here means
    //! the client silently drops messages.

    use super::*;

    fn sample_registration() -> Registration {
        Registration {
            id: None,
            name: "Esfir".into(),
            avatar: Avatar {
                name: "wizard".into(),
                src: "img/avatar/wizard.png".into(),
                thumb: "img/avatar/wizard_t.png".into(),
            },
            color: Color {
                hex: "#aa32cc".into(),
                name: "amethyst".into(),
            },
        }
    }

    fn sample_identity() -> Identity {
        Identity::from_registration("abc123", &sample_registration(), "conn-1")
    }

    // =====================================================================
    // Identity construction and normalization
    // =====================================================================

    #[test]
    fn test_from_registration_keeps_fields_within_bounds() {
        let identity = sample_identity();
        assert_eq!(identity.id, "abc123");
        assert_eq!(identity.name, "Esfir");
        assert_eq!(identity.connection_id, "conn-1");
    }

    #[test]
    fn test_from_registration_clamps_oversized_fields() {
        let long_path = "img/avatar/jpeg/".repeat(20);
        let registration = Registration {
            id: Some("SomeAlphaNumericID".into()),
            name: "MyNameIsSoSoSoSoLong".into(),
            avatar: Avatar {
                name: "123456789012345678901234567890".into(),
                src: long_path.clone(),
                thumb: long_path.clone(),
            },
            color: Color {
                hex: "#FF1133FF1133FF1133FF1133".into(),
                name: "123456789012345678901234567890".into(),
            },
        };

        let identity = Identity::from_registration(
            registration.id.as_deref().unwrap(),
            &registration,
            "AlsoSomeAlphaNumericID",
        );

        assert_eq!(identity.id, "SomeAlphaNumeric");
        assert_eq!(identity.name, "MyNameIsSoSoSoSo");
        assert_eq!(identity.avatar.name, "12345678901234567890");
        assert_eq!(identity.avatar.src.chars().count(), 255);
        assert_eq!(identity.avatar.thumb.chars().count(), 255);
        assert_eq!(identity.color.hex, "#FF1133FF");
        assert_eq!(identity.color.name, "12345678901234567890");
        assert_eq!(identity.connection_id, "AlsoSomeAlphaNumeric");
    }

    #[test]
    fn test_roll_author_snapshots_thumb_and_hex() {
        let identity = sample_identity();
        let author = identity.roll_author();
        assert_eq!(author.name, "Esfir");
        assert_eq!(author.avatar, "img/avatar/wizard_t.png");
        assert_eq!(author.color, "#aa32cc");
    }

    #[test]
    fn test_identity_serializes_as_camel_case() {
        let json: serde_json::Value =
            serde_json::to_value(sample_identity()).unwrap();
        assert!(json["connectionId"].is_string());
        assert!(json.get("connection_id").is_none());
    }

    #[test]
    fn test_identity_round_trip() {
        let identity = sample_identity();
        let text = serde_json::to_string(&identity).unwrap();
        let decoded: Identity = serde_json::from_str(&text).unwrap();
        assert_eq!(identity, decoded);
    }

    // =====================================================================
    // Registration defects
    // =====================================================================

    #[test]
    fn test_defects_empty_for_complete_registration() {
        assert!(sample_registration().defects().is_empty());
    }

    #[test]
    fn test_defects_reports_empty_name() {
        let mut registration = sample_registration();
        registration.name.clear();
        assert_eq!(registration.defects(), vec![FieldDefect::EmptyName]);
    }

    #[test]
    fn test_defects_reports_all_missing_fields() {
        let registration = Registration {
            id: None,
            name: String::new(),
            avatar: Avatar {
                name: String::new(),
                src: String::new(),
                thumb: String::new(),
            },
            color: Color {
                hex: String::new(),
                name: String::new(),
            },
        };
        let defects = registration.defects();
        assert_eq!(defects.len(), 5);
        assert!(defects.contains(&FieldDefect::EmptyAvatarSrc));
        assert!(defects.contains(&FieldDefect::EmptyColorHex));
    }

    #[test]
    fn test_defects_allows_empty_avatar_name() {
        // The avatar display name is cosmetic — not part of the contract.
        let mut registration = sample_registration();
        registration.avatar.name.clear();
        assert!(registration.defects().is_empty());
    }

    #[test]
    fn test_registration_deserializes_without_id() {
        let json = r##"{
            "name": "Esfir",
            "avatar": { "name": "w", "src": "a.png", "thumb": "t.png" },
            "color": { "hex": "#fff", "name": "white" }
        }"##;
        let registration: Registration = serde_json::from_str(json).unwrap();
        assert!(registration.id.is_none());
    }

    // =====================================================================
    // Client events — JSON shapes
    // =====================================================================

    #[test]
    fn test_client_event_room_join_json_format() {
        let event = ClientEvent::RoomJoin("A New Room".into());
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "room-join");
        assert_eq!(json["data"], "A New Room");
    }

    #[test]
    fn test_client_event_room_list_has_no_data() {
        let text =
            serde_json::to_string(&ClientEvent::RoomList).unwrap();
        let decoded: ClientEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, ClientEvent::RoomList);

        // And the bare tag decodes without a data member at all.
        let decoded: ClientEvent =
            serde_json::from_str(r#"{"event":"room-list"}"#).unwrap();
        assert_eq!(decoded, ClientEvent::RoomList);
    }

    #[test]
    fn test_client_event_register_new_round_trip() {
        let event = ClientEvent::RegisterNew(sample_registration());
        let text = serde_json::to_string(&event).unwrap();
        let decoded: ClientEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_client_event_register_restore_carries_token() {
        let decoded: ClientEvent = serde_json::from_str(
            r#"{"event":"register-restore","data":"deadbeef:cafe"}"#,
        )
        .unwrap();
        assert_eq!(
            decoded,
            ClientEvent::RegisterRestore("deadbeef:cafe".into())
        );
    }

    #[test]
    fn test_client_event_room_roll_round_trip() {
        let event = ClientEvent::RoomRoll("2d20".into());
        let text = serde_json::to_string(&event).unwrap();
        let decoded: ClientEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_client_event_unknown_tag_fails() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"fly-to-moon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_event_garbage_fails() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str("not json at all");
        assert!(result.is_err());
    }

    // =====================================================================
    // Server events — JSON shapes
    // =====================================================================

    #[test]
    fn test_server_event_register_success_json_format() {
        let event = ServerEvent::RegisterSuccess {
            session: "aa:bb".into(),
            identity: sample_identity(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "register-success");
        assert_eq!(json["data"]["session"], "aa:bb");
        assert_eq!(json["data"]["identity"]["name"], "Esfir");
    }

    #[test]
    fn test_server_event_register_failure_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(ServerEvent::RegisterFailure).unwrap();
        assert_eq!(json["event"], "register-failure");
    }

    #[test]
    fn test_server_event_room_list_json_format() {
        let event = ServerEvent::RoomList(vec![RoomSummary {
            name: "den".into(),
            member_count: 3,
            created_at: Utc::now(),
        }]);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "room-list");
        assert_eq!(json["data"][0]["memberCount"], 3);
    }

    #[test]
    fn test_server_event_room_roll_new_round_trip() {
        let event = ServerEvent::RoomRollNew(RollMessage {
            author: sample_identity().roll_author(),
            roll_string: "2d20".into(),
            total: 23,
            rolls: vec![
                DieRoll { order: 1, sides: 20, result: 11 },
                DieRoll { order: 2, sides: 20, result: 12 },
            ],
            created_at: Utc::now(),
        });
        let text = serde_json::to_string(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_server_event_client_error_json_format() {
        let event = ServerEvent::ClientError("Room does not exist".into());
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "client-error");
        assert_eq!(json["data"], "Room does not exist");
    }

    #[test]
    fn test_server_event_room_join_success_shape() {
        let event = ServerEvent::RoomJoinSuccess(RoomSnapshot {
            name: "den".into(),
            members: vec![sample_identity()],
            history: vec![],
            created_at: Utc::now(),
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "room-join-success");
        assert_eq!(json["data"]["members"][0]["id"], "abc123");
        assert!(json["data"]["createdAt"].is_string());
    }
}
