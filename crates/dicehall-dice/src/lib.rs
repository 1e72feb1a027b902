//! The dice roll engine: turns an expression like `"2d20"` into a total
//! and a per-die breakdown.
//!
//! The engine is a trait so deployments can swap the computation — the
//! built-in [`PrngEngine`] rolls locally with `rand`, a test double can
//! return fixed outcomes, a themed server could add exploding dice.
//! The dispatcher only sees the [`DiceEngine`] seam.
//!
//! The call is async: the dispatcher awaits it like any other
//! collaborator, and slower implementations (an external roller service,
//! say) stall only the one roll in flight — never the directories.

#![allow(async_fn_in_trait)]

mod error;
mod roller;

pub use error::DiceError;
pub use roller::PrngEngine;

use dicehall_protocol::DieRoll;

/// The outcome of one evaluated dice expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Sum of all dice.
    pub total: u32,
    /// Individual die results in roll order.
    pub rolls: Vec<DieRoll>,
}

/// Evaluates dice expressions.
///
/// `Send + Sync + 'static` so one engine instance can be shared across
/// every connection handler task for the lifetime of the server.
pub trait DiceEngine: Send + Sync + 'static {
    /// Evaluates the given expression.
    ///
    /// # Errors
    /// Returns [`DiceError`] when the expression doesn't parse or the
    /// roll cannot be computed.
    fn roll(
        &self,
        expression: &str,
    ) -> impl std::future::Future<Output = Result<RollOutcome, DiceError>> + Send;
}
