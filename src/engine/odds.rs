//! Odds-format conversions shared by the consensus and prop engines.

use super::error::EngineError;

/// Implied probability of a decimal price (1/odds). Does not remove vig.
pub fn implied_probability(decimal_odds: f64) -> f64 {
    1.0 / decimal_odds
}

/// Convert decimal odds to the conventional American display string.
///
/// Decimal >= 2.0 is an underdog price: `+((decimal-1)*100)`. Anything in
/// (1.0, 2.0) is a favorite price: `-100/(decimal-1)`. Both branches truncate
/// toward zero (`as i64`), matching how books display American odds -- 1.91
/// renders as "-109", not "-110".
pub fn decimal_to_american(decimal_odds: f64) -> Result<String, EngineError> {
    if decimal_odds <= 1.0 {
        return Err(EngineError::InvalidOdds(decimal_odds));
    }
    if decimal_odds >= 2.0 {
        Ok(format!("+{}", ((decimal_odds - 1.0) * 100.0) as i64))
    } else {
        Ok(format!("{}", (-100.0 / (decimal_odds - 1.0)) as i64))
    }
}

/// Convert American odds to decimal odds.
/// +150 -> 2.50, -150 -> 1.666...
pub fn american_to_decimal(american: f64) -> f64 {
    if american > 0.0 {
        1.0 + american / 100.0
    } else {
        1.0 + 100.0 / american.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_to_american_underdog() {
        assert_eq!(decimal_to_american(2.0).unwrap(), "+100");
        assert_eq!(decimal_to_american(2.5).unwrap(), "+150");
        assert_eq!(decimal_to_american(3.75).unwrap(), "+275");
    }

    #[test]
    fn test_decimal_to_american_favorite() {
        assert_eq!(decimal_to_american(1.5).unwrap(), "-200");
        // 1.91: -100/0.91 = -109.89..., truncates toward zero
        assert_eq!(decimal_to_american(1.91).unwrap(), "-109");
    }

    #[test]
    fn test_decimal_to_american_rejects_low_odds() {
        assert_eq!(
            decimal_to_american(1.0),
            Err(EngineError::InvalidOdds(1.0))
        );
        assert_eq!(
            decimal_to_american(0.5),
            Err(EngineError::InvalidOdds(0.5))
        );
    }

    #[test]
    fn test_american_round_trip_underdogs() {
        // For decimal >= 2.0 the American value is +floor((d-1)*100), so the
        // round trip recovers d within the 1-cent truncation granularity.
        for d in [2.0, 2.05, 2.5, 3.33, 7.0] {
            let s = decimal_to_american(d).unwrap();
            let a: f64 = s.parse().unwrap();
            let back = american_to_decimal(a);
            assert!((back - d).abs() < 0.01 + 1e-9, "d={d} back={back}");
        }
    }

    #[test]
    fn test_american_to_decimal() {
        assert!((american_to_decimal(150.0) - 2.5).abs() < 1e-9);
        assert!((american_to_decimal(-200.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_implied_probability() {
        assert!((implied_probability(2.0) - 0.5).abs() < 1e-9);
        assert!((implied_probability(4.0) - 0.25).abs() < 1e-9);
    }
}
