//! Integration tests for the room directory: creation, membership,
//! history bounds, and the idle-eviction policy.

use chrono::{Duration, Utc};

use dicehall_protocol::{
    Avatar, Color, DieRoll, Identity, Registration, RollMessage,
};
use dicehall_room::{RoomConfig, RoomDirectory};

// =========================================================================
// Helpers
// =========================================================================

fn identity(id: &str, connection: &str) -> Identity {
    let registration = Registration {
        id: Some(id.into()),
        name: format!("user-{id}"),
        avatar: Avatar {
            name: "wizard".into(),
            src: "img/avatar/wizard.png".into(),
            thumb: "img/avatar/wizard_t.png".into(),
        },
        color: Color {
            hex: "#aa32cc".into(),
            name: "amethyst".into(),
        },
    };
    Identity::from_registration(id, &registration, connection)
}

/// A roll message created at an explicit instant (eviction tests
/// construct stale history this way instead of backdating rooms).
fn roll_at(total: u32, created_at: chrono::DateTime<Utc>) -> RollMessage {
    RollMessage {
        author: identity("roller", "conn-0").roll_author(),
        roll_string: "1d20".into(),
        total,
        rolls: vec![DieRoll { order: 1, sides: 20, result: total }],
        created_at,
    }
}

fn roll(total: u32) -> RollMessage {
    roll_at(total, Utc::now())
}

// =========================================================================
// create() / list()
// =========================================================================

#[test]
fn test_create_room_stores_empty_room() {
    let mut dir = RoomDirectory::new();

    let room = dir.create("Test Room").expect("should create");

    assert_eq!(room.name(), "Test Room");
    assert_eq!(room.member_count(), 0);
    assert!(room.history().is_empty());
    assert_eq!(dir.len(), 1);
}

#[test]
fn test_create_duplicate_name_returns_none() {
    let mut dir = RoomDirectory::new();
    dir.create("den").expect("first should create");

    assert!(dir.create("den").is_none());
    assert_eq!(dir.len(), 1);
}

#[test]
fn test_create_checks_uniqueness_after_clamping() {
    // Two names that agree on their first 16 characters are the same room.
    let mut dir = RoomDirectory::new();
    dir.create("A Very Long Room Name").expect("should create");

    assert!(dir.create("A Very Long Room Title").is_none());
    assert_eq!(dir.len(), 1);
    assert!(dir.contains("A Very Long Room"));
}

#[test]
fn test_list_reports_member_counts_in_insertion_order() {
    let mut dir = RoomDirectory::new();
    dir.create("first").unwrap();
    dir.create("second").unwrap();
    dir.create("third").unwrap();

    for i in 0..5 {
        dir.add_member(&identity(&format!("a{i}"), "c"), "first");
    }
    for i in 0..2 {
        dir.add_member(&identity(&format!("b{i}"), "c"), "second");
    }
    for i in 0..10 {
        dir.add_member(&identity(&format!("c{i}"), "c"), "third");
    }

    let counts: Vec<usize> =
        dir.list().iter().map(|s| s.member_count).collect();
    assert_eq!(counts, vec![5, 2, 10]);
}

// =========================================================================
// Membership
// =========================================================================

#[test]
fn test_add_member_to_existing_room() {
    let mut dir = RoomDirectory::new();
    dir.create("Sample").unwrap();

    assert!(dir.add_member(&identity("u1", "conn-1"), "Sample"));
    assert_eq!(dir.get("Sample").unwrap().member_count(), 1);
}

#[test]
fn test_add_member_missing_room_returns_false() {
    let mut dir = RoomDirectory::new();
    assert!(!dir.add_member(&identity("u1", "conn-1"), "nowhere"));
}

#[test]
fn test_add_member_is_idempotent() {
    let mut dir = RoomDirectory::new();
    dir.create("Sample").unwrap();
    let user = identity("u1", "conn-1");

    assert!(dir.add_member(&user, "Sample"));
    assert!(dir.add_member(&user, "Sample"));
    assert_eq!(dir.get("Sample").unwrap().member_count(), 1);
}

#[test]
fn test_remove_member_works() {
    let mut dir = RoomDirectory::new();
    dir.create("room1").unwrap();
    let u1 = identity("u1", "conn-1");
    let u2 = identity("u2", "conn-2");
    dir.add_member(&u1, "room1");
    dir.add_member(&u2, "room1");

    assert!(dir.remove_member(&u1, "room1"));

    let room = dir.get("room1").unwrap();
    assert!(!room.has_member("u1"));
    assert!(room.has_member("u2"));
}

#[test]
fn test_remove_member_not_a_member_returns_false() {
    let mut dir = RoomDirectory::new();
    dir.create("room1").unwrap();

    assert!(!dir.remove_member(&identity("u1", "conn-1"), "room1"));
}

#[test]
fn test_remove_member_missing_room_returns_false() {
    let mut dir = RoomDirectory::new();
    assert!(!dir.remove_member(&identity("u1", "conn-1"), "nowhere"));
}

#[test]
fn test_join_then_leave_scenario() {
    // create "A New Room" → join → count 1 → leave → count 0.
    let mut dir = RoomDirectory::new();
    dir.create("A New Room").unwrap();
    let user = identity("u1", "conn-1");

    assert!(dir.add_member(&user, "A New Room"));
    assert_eq!(dir.get("A New Room").unwrap().member_count(), 1);

    assert!(dir.remove_member(&user, "A New Room"));
    assert_eq!(dir.get("A New Room").unwrap().member_count(), 0);
}

#[test]
fn test_remove_member_from_all_rooms() {
    let mut dir = RoomDirectory::new();
    dir.create("room1").unwrap();
    dir.create("room2").unwrap();
    let u1 = identity("u1", "conn-1");
    let u2 = identity("u2", "conn-2");
    dir.add_member(&u1, "room1");
    dir.add_member(&u2, "room1");
    dir.add_member(&u1, "room2");
    dir.add_member(&u2, "room2");

    assert!(dir.remove_member_from_all_rooms(&u1));

    assert_eq!(dir.get("room1").unwrap().member_count(), 1);
    assert_eq!(dir.get("room2").unwrap().member_count(), 1);
    assert!(!dir.get("room1").unwrap().has_member("u1"));
    assert!(!dir.get("room2").unwrap().has_member("u1"));
}

#[test]
fn test_remove_member_from_all_rooms_not_found_returns_false() {
    let mut dir = RoomDirectory::new();
    dir.create("room1").unwrap();

    assert!(!dir.remove_member_from_all_rooms(&identity("u1", "c")));
}

// =========================================================================
// Roll history
// =========================================================================

#[test]
fn test_post_roll_appends_to_history() {
    let mut dir = RoomDirectory::new();
    dir.create("den").unwrap();

    assert!(dir.post_roll(roll(12), "den"));
    assert_eq!(dir.get("den").unwrap().history().len(), 1);
}

#[test]
fn test_post_roll_missing_room_returns_false() {
    let mut dir = RoomDirectory::new();
    assert!(!dir.post_roll(roll(12), "nowhere"));
}

#[test]
fn test_post_roll_history_never_exceeds_twenty() {
    let mut dir = RoomDirectory::new();
    dir.create("den").unwrap();

    for total in 1..=30 {
        assert!(dir.post_roll(roll(total), "den"));
    }

    let history = dir.get("den").unwrap().history();
    assert_eq!(history.len(), 20);
    // Oldest dropped first: 11..=30 survive.
    assert_eq!(history.first().unwrap().total, 11);
    assert_eq!(history.last().unwrap().total, 30);
}

// =========================================================================
// evict_idle()
// =========================================================================

#[test]
fn test_evict_idle_deletes_empty_room_older_than_ttl() {
    let mut dir = RoomDirectory::new();
    dir.create("old-room").unwrap();

    let evicted = dir.evict_idle(Utc::now() + Duration::minutes(61));

    assert_eq!(evicted, vec!["old-room".to_string()]);
    assert!(dir.is_empty());
}

#[test]
fn test_evict_idle_keeps_empty_room_younger_than_ttl() {
    let mut dir = RoomDirectory::new();
    dir.create("young-room").unwrap();

    let evicted = dir.evict_idle(Utc::now() + Duration::minutes(59));

    assert!(evicted.is_empty());
    assert_eq!(dir.len(), 1);
}

#[test]
fn test_evict_idle_mixed_old_and_new_rooms() {
    let mut dir = RoomDirectory::new();
    dir.create("stale").unwrap();
    // A fresh roll shields a room regardless of its age — post one into
    // the room that must survive.
    dir.create("active").unwrap();
    dir.post_roll(roll_at(7, Utc::now() + Duration::minutes(60)), "active");

    let evicted = dir.evict_idle(Utc::now() + Duration::minutes(61));

    assert_eq!(evicted, vec!["stale".to_string()]);
    assert_eq!(dir.len(), 1);
    assert!(dir.contains("active"));
}

#[test]
fn test_evict_idle_room_with_fresh_history_survives() {
    let mut dir = RoomDirectory::new();
    dir.create("den").unwrap();
    dir.post_roll(roll_at(7, Utc::now()), "den");

    let evicted = dir.evict_idle(Utc::now() + Duration::minutes(59));

    assert!(evicted.is_empty());
    assert_eq!(dir.len(), 1);
}

#[test]
fn test_evict_idle_any_stale_entry_flags_room() {
    // The per-entry check: one stale roll evicts the room even though a
    // fresh roll exists.
    let now = Utc::now();
    let mut dir = RoomDirectory::new();
    dir.create("den").unwrap();
    dir.post_roll(roll_at(3, now - Duration::minutes(61)), "den");
    dir.post_roll(roll_at(18, now), "den");

    let evicted = dir.evict_idle(now);

    assert_eq!(evicted, vec!["den".to_string()]);
    assert!(dir.is_empty());
}

#[test]
fn test_evict_idle_flags_against_one_instant() {
    // Several rooms straddling the boundary are all judged against the
    // same `now`.
    let now = Utc::now();
    let mut dir = RoomDirectory::new();
    dir.create("a").unwrap();
    dir.create("b").unwrap();
    dir.create("c").unwrap();
    dir.post_roll(roll_at(1, now - Duration::minutes(90)), "a");
    dir.post_roll(roll_at(2, now - Duration::minutes(30)), "b");
    // "c" keeps an empty history; it was created just now.

    let evicted = dir.evict_idle(now);

    assert_eq!(evicted, vec!["a".to_string()]);
    assert_eq!(dir.len(), 2);
}

#[test]
fn test_evict_idle_respects_configured_ttl() {
    let mut dir = RoomDirectory::with_config(RoomConfig {
        idle_ttl: Duration::minutes(5),
        ..RoomConfig::default()
    });
    dir.create("den").unwrap();

    let evicted = dir.evict_idle(Utc::now() + Duration::minutes(6));

    assert_eq!(evicted, vec!["den".to_string()]);
}

// =========================================================================
// Snapshots
// =========================================================================

#[test]
fn test_snapshot_carries_members_and_history() {
    let mut dir = RoomDirectory::new();
    dir.create("den").unwrap();
    dir.add_member(&identity("u1", "conn-1"), "den");
    dir.post_roll(roll(9), "den");

    let snapshot = dir.snapshot("den").expect("room exists");

    assert_eq!(snapshot.name, "den");
    assert_eq!(snapshot.members.len(), 1);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].total, 9);
}

#[test]
fn test_snapshot_missing_room_returns_none() {
    let dir = RoomDirectory::new();
    assert!(dir.snapshot("nowhere").is_none());
}
