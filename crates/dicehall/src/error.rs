//! Error types for the Dicehall server.

use dicehall_dice::DiceError;
use dicehall_protocol::ProtocolError;
use dicehall_session::SessionError;
use dicehall_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `dicehall` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DicehallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (token crypto, restore).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A dice-engine error (bad expression, engine failure).
    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Why an inbound event could not be honored.
///
/// Every variant is recovered at the protocol boundary: the dispatcher
/// catches it and emits a failure event to the requesting connection
/// only. Nothing here ever crashes the process or the directories.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Registration was rejected: duplicate id or missing required
    /// fields. The directory reports this as a plain negative result;
    /// this variant carries it to the failure response.
    #[error("registration rejected")]
    ValidationRejected,

    /// The named room does not exist (or stopped existing mid-request).
    #[error("room {0:?} not found")]
    RoomNotFound(String),

    /// No identity is resolvable from the requesting connection, or the
    /// requester is not in a room when the operation needs one.
    #[error("no identity or room membership for this connection")]
    NotAMember,

    /// The presented session token could not be decrypted or parsed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The dice engine rejected the expression or failed to roll.
    #[error(transparent)]
    Engine(#[from] DiceError),
}
