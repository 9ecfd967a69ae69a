//! Expected value, edge metrics, and Kelly staking.

use serde::Serialize;
use std::fmt;

use super::error::EngineError;

/// Qualitative EV banding at fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvTier {
    Excellent,
    Good,
    Marginal,
    Poor,
}

impl EvTier {
    pub fn from_ev_percent(ev_percentage: f64) -> Self {
        if ev_percentage >= 3.0 {
            EvTier::Excellent
        } else if ev_percentage >= 1.5 {
            EvTier::Good
        } else if ev_percentage >= 0.5 {
            EvTier::Marginal
        } else {
            EvTier::Poor
        }
    }
}

impl fmt::Display for EvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvTier::Excellent => "excellent",
            EvTier::Good => "good",
            EvTier::Marginal => "marginal",
            EvTier::Poor => "poor",
        };
        f.write_str(s)
    }
}

fn check_inputs(offered_odds: f64, fair_prob: f64) -> Result<(), EngineError> {
    if offered_odds <= 1.0 {
        return Err(EngineError::InvalidOdds(offered_odds));
    }
    if !(fair_prob > 0.0 && fair_prob < 1.0) {
        return Err(EngineError::InvalidProbability(fair_prob));
    }
    Ok(())
}

/// Expected value of a 1-unit stake, as a percentage.
///
/// `EV% = 100 * (p * (offered - 1) - (1 - p))` -- the expected profit per
/// unit if `fair_prob` is the true win probability. Inputs outside the
/// contract (offered <= 1.0, probability outside (0, 1)) are caller errors
/// and rejected, not coerced.
pub fn expected_value(offered_odds: f64, fair_prob: f64) -> Result<f64, EngineError> {
    check_inputs(offered_odds, fair_prob)?;
    let payout = offered_odds - 1.0;
    Ok(100.0 * (fair_prob * payout - (1.0 - fair_prob)))
}

/// Full edge breakdown for one offered price against a fair probability.
#[derive(Debug, Clone, Serialize)]
pub struct EvAnalysis {
    pub ev_percentage: f64,
    pub tier: EvTier,
    /// How far the offered price sits above fair odds, in percent.
    pub odds_edge_percentage: f64,
    /// Fair probability minus the probability implied by the offered price.
    pub probability_edge: f64,
    pub offered_odds: f64,
    pub fair_odds: f64,
    pub implied_prob_offered: f64,
    pub fair_probability: f64,
}

pub fn analyze(offered_odds: f64, fair_prob: f64) -> Result<EvAnalysis, EngineError> {
    let ev_percentage = expected_value(offered_odds, fair_prob)?;
    let fair_odds = 1.0 / fair_prob;
    Ok(EvAnalysis {
        ev_percentage,
        tier: EvTier::from_ev_percent(ev_percentage),
        odds_edge_percentage: 100.0 * (offered_odds / fair_odds - 1.0),
        probability_edge: fair_prob - 1.0 / offered_odds,
        offered_odds,
        fair_odds,
        implied_prob_offered: 1.0 / offered_odds,
        fair_probability: fair_prob,
    })
}

/// Full-Kelly bankroll fraction: `f* = (b*p - q) / b` with `b = offered - 1`.
///
/// Negative when the bet is -EV; callers decide whether to clamp. Fails on
/// zero net payout (offered exactly 1.0) where the formula is undefined.
pub fn kelly_fraction(offered_odds: f64, fair_prob: f64) -> Result<f64, EngineError> {
    if offered_odds < 1.0 {
        return Err(EngineError::InvalidOdds(offered_odds));
    }
    if !(fair_prob > 0.0 && fair_prob < 1.0) {
        return Err(EngineError::InvalidProbability(fair_prob));
    }
    let b = offered_odds - 1.0;
    if b == 0.0 {
        return Err(EngineError::ZeroNetPayout);
    }
    let q = 1.0 - fair_prob;
    Ok((b * fair_prob - q) / b)
}

/// Fractional-Kelly stake in bankroll units (e.g. 0.25 for quarter-Kelly).
/// Negative edges stake zero.
pub fn kelly_stake(
    offered_odds: f64,
    fair_prob: f64,
    bankroll: f64,
    fraction: f64,
) -> Result<f64, EngineError> {
    let f_star = kelly_fraction(offered_odds, fair_prob)?;
    Ok(f_star.max(0.0) * fraction * bankroll)
}
