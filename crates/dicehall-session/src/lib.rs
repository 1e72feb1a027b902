//! Session and identity management for Dicehall.
//!
//! This crate handles who a connection *is*:
//!
//! 1. **Session tokens** ([`SessionCodec`]) — an identity encrypted into a
//!    portable string the client stores as a cookie. The server keeps no
//!    session table; the token itself is the durable record, so any server
//!    instance holding the key can restore it.
//! 2. **The user directory** ([`UserDirectory`]) — the in-memory registry
//!    of currently connected identities, keyed by identity id and
//!    searchable by connection id.
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatcher (above)  ← routes register/restore events here
//!     ↕
//! Session layer (this crate)  ← identity records and their tokens
//!     ↕
//! Protocol layer (below)  ← provides Identity, Registration shapes
//! ```

mod codec;
mod directory;
mod error;

pub use codec::SessionCodec;
pub use directory::UserDirectory;
pub use error::SessionError;
