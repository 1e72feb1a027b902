//! Room directory configuration.

use chrono::Duration;

/// Policy knobs for the room directory.
///
/// One config per directory instance; the defaults match the product
/// behavior (20 retained rolls, rooms considered abandoned after an hour).
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How many rolls a room retains. Oldest entries drop first once the
    /// bound is reached.
    pub history_cap: usize,

    /// How stale a room may get before the eviction sweep flags it: a
    /// room with no history older than this, or any retained roll older
    /// than this, is deleted.
    pub idle_ttl: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            history_cap: 20,
            idle_ttl: Duration::minutes(60),
        }
    }
}
