//! Room lifecycle management for Dicehall.
//!
//! Rooms are named, time-bounded groups of identities sharing a broadcast
//! scope and a bounded roll history. This crate owns:
//!
//! - [`Room`] — one room's membership and history
//! - [`RoomDirectory`] — the in-memory registry of all rooms
//! - [`RoomConfig`] — policy knobs (history bound, idle TTL)
//!
//! The directory enforces its invariants by construction: operations that
//! would violate uniqueness or the history bound return a negative result
//! instead of failing, so callers shape responses rather than handle
//! errors.

mod config;
mod directory;
mod room;

pub use config::RoomConfig;
pub use directory::RoomDirectory;
pub use room::Room;
