//! The default engine: parse `NdS`, roll with the thread-local PRNG.

use rand::Rng;

use dicehall_protocol::DieRoll;

use crate::{DiceError, DiceEngine, RollOutcome};

/// Most dice a single expression may roll.
const MAX_DICE: u32 = 100;
/// Most sides a die may have.
const MAX_SIDES: u32 = 1000;

/// The built-in dice engine.
///
/// Accepts expressions of the form `NdS` — `N` dice with `S` sides,
/// where `N` is optional and defaults to 1 (`d20` == `1d20`). Case
/// insensitive, surrounding whitespace ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrngEngine;

impl DiceEngine for PrngEngine {
    async fn roll(
        &self,
        expression: &str,
    ) -> Result<RollOutcome, DiceError> {
        let (count, sides) = parse_expression(expression)?;
        let mut rng = rand::rng();

        let rolls: Vec<DieRoll> = (1..=count)
            .map(|order| DieRoll {
                order,
                sides,
                result: rng.random_range(1..=sides),
            })
            .collect();
        let total = rolls.iter().map(|r| r.result).sum();

        Ok(RollOutcome { total, rolls })
    }
}

/// Parses `NdS` into `(count, sides)`.
fn parse_expression(expression: &str) -> Result<(u32, u32), DiceError> {
    let trimmed = expression.trim();
    let (count_part, sides_part) = trimmed
        .split_once(['d', 'D'])
        .ok_or_else(|| DiceError::InvalidExpression(expression.into()))?;

    let count = if count_part.is_empty() {
        1
    } else {
        count_part
            .parse::<u32>()
            .map_err(|_| DiceError::InvalidExpression(expression.into()))?
    };
    let sides = sides_part
        .parse::<u32>()
        .map_err(|_| DiceError::InvalidExpression(expression.into()))?;

    if count == 0 || sides == 0 || sides > MAX_SIDES {
        return Err(DiceError::InvalidExpression(expression.into()));
    }
    if count > MAX_DICE {
        return Err(DiceError::TooManyDice { count, max: MAX_DICE });
    }

    Ok((count, sides))
}

// =========================================================================
// Tests
// =========================================================================
