//! # Dicehall
//!
//! Session and room coordination server for a dice-rolling chat
//! application.
//!
//! Clients connect over a WebSocket, register a lightweight identity (or
//! restore one from an encrypted session token), create or join named
//! rooms, and broadcast dice rolls to the other members. All state lives
//! in-memory in one process; abandoned rooms are garbage-collected on a
//! timer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dicehall::prelude::*;
//!
//! # async fn run() -> Result<(), DicehallError> {
//! let server = DicehallServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(PrngEngine)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod dispatcher;
mod emitter;
mod error;
mod server;

pub use error::{DicehallError, DispatchError};
pub use server::{DicehallServer, DicehallServerBuilder};

/// The common imports for running a Dicehall server.
pub mod prelude {
    pub use crate::{DicehallError, DicehallServer, DicehallServerBuilder};
    pub use dicehall_dice::{DiceEngine, DiceError, PrngEngine, RollOutcome};
    pub use dicehall_protocol::{
        Avatar, ClientEvent, Codec, Color, Identity, JsonCodec,
        Registration, RollMessage, ServerEvent,
    };
    pub use dicehall_room::RoomConfig;
    pub use dicehall_tick::SweepConfig;
}
