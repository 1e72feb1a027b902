//! Error types for the session layer.

/// Errors that can occur while encrypting, decrypting, or restoring
/// session tokens.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token is malformed or decryption failed: missing the `iv:ct`
    /// separator, non-hex halves, an IV of the wrong size, or a
    /// ciphertext that doesn't decrypt under the derived key (for
    /// example an IV/ciphertext pair stitched together from two
    /// different tokens). Decryption never silently returns garbage —
    /// it lands here.
    #[error("error decrypting, token is likely corrupted")]
    CorruptedSession,

    /// The token decrypted but its payload is not a valid identity, or
    /// the token could not be read at all. The client should discard the
    /// stored session and register a fresh identity.
    #[error("session token is unreadable")]
    Unreadable,
}
