//! Multiplicative devig: recover no-vig probabilities from a two-way quote.

use super::error::EngineError;
use super::odds::implied_probability;

/// No-vig probabilities for a two-way market. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviggedPair {
    pub prob_a: f64,
    pub prob_b: f64,
}

/// Remove bookmaker margin from a two-way quote.
///
/// Each side's implied probability is divided by the overround, so the vig is
/// distributed proportionally to probability rather than split evenly. This
/// is closed-form and numerically stable for every valid input, which is why
/// it is used over additive devigging. Only two-way markets are supported;
/// three-way (soccer with draw) and multi-way markets are out of scope.
pub fn devig_multiplicative(odds: &[f64]) -> Result<DeviggedPair, EngineError> {
    if odds.len() != 2 {
        return Err(EngineError::NotTwoWay(odds.len()));
    }
    for &price in odds {
        if price <= 1.0 {
            return Err(EngineError::InvalidOdds(price));
        }
    }

    let implied_a = implied_probability(odds[0]);
    let implied_b = implied_probability(odds[1]);
    let overround = implied_a + implied_b;

    Ok(DeviggedPair {
        prob_a: implied_a / overround,
        prob_b: implied_b / overround,
    })
}
