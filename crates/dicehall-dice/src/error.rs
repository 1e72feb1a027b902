//! Error types for the dice engine.

/// Errors that can occur while evaluating a dice expression.
#[derive(Debug, thiserror::Error)]
pub enum DiceError {
    /// The expression is not of the form `NdS` (e.g. `2d20`, `d6`).
    #[error("invalid dice expression: {0:?}")]
    InvalidExpression(String),

    /// The expression asks for more dice than one roll allows.
    #[error("too many dice: {count} (max {max})")]
    TooManyDice { count: u32, max: u32 },

    /// The engine itself failed — used by implementations that delegate
    /// the computation elsewhere.
    #[error("roll engine failure: {0}")]
    Failed(String),
}
