//! Weighted consensus fair value across sportsbooks and exchanges.
//!
//! One parameterized engine covers moneyline, spread, and totals markets:
//! the market-type framing (which side is "A", what the point means) is the
//! normalizer's concern. Weights are always passed in per call -- never held
//! as mutable state -- so an evaluation can never run with another market's
//! table.

use serde::Serialize;
use std::collections::BTreeMap;

use super::devig::devig_multiplicative;
use super::error::EngineError;
use super::ev::{self, EvAnalysis};
use super::odds::decimal_to_american;

/// One book's two-sided decimal price for a binary outcome.
/// Side A is home / over / yes by convention; `point` carries the spread or
/// total line where one applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotedMarket {
    pub odds_a: f64,
    pub odds_b: f64,
    pub point: Option<f64>,
}

impl QuotedMarket {
    pub fn new(odds_a: f64, odds_b: f64) -> Self {
        Self {
            odds_a,
            odds_b,
            point: None,
        }
    }

    pub fn with_point(odds_a: f64, odds_b: f64, point: f64) -> Self {
        Self {
            odds_a,
            odds_b,
            point: Some(point),
        }
    }
}

/// An exchange-style venue quote, admitted only at or above a liquidity
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VenueQuote {
    pub market: QuotedMarket,
    pub liquidity: f64,
}

/// Liquidity-gated venues with their own weight table.
#[derive(Debug, Clone, Default)]
pub struct VenueBoard {
    pub quotes: BTreeMap<String, VenueQuote>,
    pub weights: BTreeMap<String, f64>,
    pub liquidity_threshold: f64,
}

/// Audit-only classification of a contributor. Never affects weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookClass {
    Sharp,
    Recreational,
    Hybrid,
    Exchange,
}

/// Classify a sportsbook by reputation for the contribution breakdown.
pub fn classify_book(name: &str) -> BookClass {
    match name {
        "Pinnacle" | "Circa" | "BetOnline" | "BookMaker" => BookClass::Sharp,
        "FanDuel" | "DraftKings" | "Caesars" | "BetMGM" => BookClass::Recreational,
        _ => BookClass::Hybrid,
    }
}

/// One contributor's slice of the consensus, kept for auditability.
#[derive(Debug, Clone, Serialize)]
pub struct BookContribution {
    pub probability: f64,
    pub weight: f64,
    pub odds: (f64, f64),
    pub class: BookClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
}

/// Consensus fair value for one market. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Consensus {
    pub fair_prob: f64,
    pub fair_odds_decimal: f64,
    pub fair_odds_american: String,
    pub books_used: u32,
    pub exchanges_used: u32,
    pub contributions: BTreeMap<String, BookContribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev: Option<EvAnalysis>,
}

/// Weighted average of (probability, weight) pairs. Weights need not sum to
/// 1.0 -- this normalizes by the participating total.
pub fn weighted_average(
    probs: impl IntoIterator<Item = (f64, f64)>,
) -> Result<f64, EngineError> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut any = false;
    for (prob, weight) in probs {
        weighted_sum += prob * weight;
        total_weight += weight;
        any = true;
    }
    if !any {
        return Err(EngineError::NoValidData);
    }
    if total_weight == 0.0 {
        return Err(EngineError::ZeroTotalWeight);
    }
    Ok(weighted_sum / total_weight)
}

/// Blend devigged book probabilities into one fair price for side A.
///
/// Books present in both the quote map and the weight table contribute; a
/// book whose quote fails to devig is skipped rather than failing the whole
/// computation, and shows up only as a smaller `books_used`. Venues join when
/// their liquidity clears the board's threshold and they carry a venue
/// weight. `offered_odds`, when given, also produces an EV analysis against
/// the blended fair probability in the same call.
///
/// Iteration is in key order, so identical inputs always produce
/// bit-identical results.
pub fn consensus(
    quotes: &BTreeMap<String, QuotedMarket>,
    weights: &BTreeMap<String, f64>,
    venues: Option<&VenueBoard>,
    offered_odds: Option<f64>,
) -> Result<Consensus, EngineError> {
    let mut contributions: BTreeMap<String, BookContribution> = BTreeMap::new();
    let mut books_used = 0u32;
    let mut exchanges_used = 0u32;

    for (book, quote) in quotes {
        let Some(&weight) = weights.get(book) else {
            continue;
        };
        let pair = match devig_multiplicative(&[quote.odds_a, quote.odds_b]) {
            Ok(pair) => pair,
            Err(err) => {
                tracing::debug!(book = %book, error = %err, "skipping malformed quote");
                continue;
            }
        };
        contributions.insert(
            book.clone(),
            BookContribution {
                probability: pair.prob_a,
                weight,
                odds: (quote.odds_a, quote.odds_b),
                class: classify_book(book),
                liquidity: None,
            },
        );
        books_used += 1;
    }

    if let Some(board) = venues {
        for (venue, quote) in &board.quotes {
            let Some(&weight) = board.weights.get(venue) else {
                continue;
            };
            if quote.liquidity < board.liquidity_threshold {
                tracing::debug!(venue = %venue, liquidity = quote.liquidity, "below liquidity threshold");
                continue;
            }
            let pair = match devig_multiplicative(&[quote.market.odds_a, quote.market.odds_b]) {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::debug!(venue = %venue, error = %err, "skipping malformed venue quote");
                    continue;
                }
            };
            contributions.insert(
                venue.clone(),
                BookContribution {
                    probability: pair.prob_a,
                    weight,
                    odds: (quote.market.odds_a, quote.market.odds_b),
                    class: BookClass::Exchange,
                    liquidity: Some(quote.liquidity),
                },
            );
            exchanges_used += 1;
        }
    }

    let fair_prob = weighted_average(
        contributions
            .values()
            .map(|c| (c.probability, c.weight)),
    )?;

    let fair_odds_decimal = 1.0 / fair_prob;
    let fair_odds_american = decimal_to_american(fair_odds_decimal)?;

    let ev = match offered_odds {
        Some(offered) => Some(ev::analyze(offered, fair_prob)?),
        None => None,
    };

    Ok(Consensus {
        fair_prob,
        fair_odds_decimal,
        fair_odds_american,
        books_used,
        exchanges_used,
        contributions,
        ev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(pairs: &[(&str, f64, f64)]) -> BTreeMap<String, QuotedMarket> {
        pairs
            .iter()
            .map(|(book, a, b)| (book.to_string(), QuotedMarket::new(*a, *b)))
            .collect()
    }

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(book, w)| (book.to_string(), *w))
            .collect()
    }

    #[test]
    fn test_weighted_average_two_books() {
        let fair = weighted_average([(0.55, 0.6), (0.50, 0.4)]).unwrap();
        assert!((fair - 0.53).abs() < 1e-9, "got {fair}");
    }

    #[test]
    fn test_weighted_average_normalizes_unscaled_weights() {
        // Same blend whether or not weights pre-sum to 1.0.
        let a = weighted_average([(0.55, 0.6), (0.50, 0.4)]).unwrap();
        let b = weighted_average([(0.55, 6.0), (0.50, 4.0)]).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_failures() {
        assert_eq!(
            weighted_average(std::iter::empty::<(f64, f64)>()),
            Err(EngineError::NoValidData)
        );
        assert_eq!(
            weighted_average([(0.5, 0.0), (0.6, 0.0)]),
            Err(EngineError::ZeroTotalWeight)
        );
    }

    #[test]
    fn test_consensus_symmetric_market() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91), ("Circa", 1.91, 1.91)]);
        let w = weights(&[("Pinnacle", 0.6), ("Circa", 0.4)]);
        let c = consensus(&q, &w, None, None).unwrap();
        assert!((c.fair_prob - 0.5).abs() < 1e-9);
        assert!((c.fair_odds_decimal - 2.0).abs() < 1e-9);
        assert_eq!(c.fair_odds_american, "+100");
        assert_eq!(c.books_used, 2);
        assert_eq!(c.exchanges_used, 0);
    }

    #[test]
    fn test_consensus_fair_prob_in_open_interval() {
        let q = quotes(&[("Pinnacle", 1.05, 12.0), ("Circa", 1.04, 14.0)]);
        let w = weights(&[("Pinnacle", 0.5), ("Circa", 0.5)]);
        let c = consensus(&q, &w, None, None).unwrap();
        assert!(c.fair_prob > 0.0 && c.fair_prob < 1.0);
    }

    #[test]
    fn test_consensus_skips_malformed_quote() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91), ("Circa", 0.5, 1.91)]);
        let w = weights(&[("Pinnacle", 0.6), ("Circa", 0.4)]);
        let c = consensus(&q, &w, None, None).unwrap();
        assert_eq!(c.books_used, 1);
        assert!((c.fair_prob - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_consensus_ignores_unweighted_books() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91), ("MyBookie", 1.2, 4.0)]);
        let w = weights(&[("Pinnacle", 1.0)]);
        let c = consensus(&q, &w, None, None).unwrap();
        assert_eq!(c.books_used, 1);
        assert!(!c.contributions.contains_key("MyBookie"));
    }

    #[test]
    fn test_consensus_no_valid_data() {
        let q = quotes(&[("Bovada", 1.91, 1.91)]);
        let w = weights(&[("Pinnacle", 1.0)]);
        assert_eq!(
            consensus(&q, &w, None, None).unwrap_err(),
            EngineError::NoValidData
        );
    }

    #[test]
    fn test_consensus_liquidity_gates_venues() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91)]);
        let w = weights(&[("Pinnacle", 0.8)]);
        let board = VenueBoard {
            quotes: [
                (
                    "ProphetX".to_string(),
                    VenueQuote {
                        market: QuotedMarket::new(1.93, 1.93),
                        liquidity: 1200.0,
                    },
                ),
                (
                    "NoVig".to_string(),
                    VenueQuote {
                        market: QuotedMarket::new(1.91, 1.91),
                        liquidity: 800.0,
                    },
                ),
            ]
            .into_iter()
            .collect(),
            weights: weights(&[("ProphetX", 0.1), ("NoVig", 0.1)]),
            liquidity_threshold: 1000.0,
        };
        let c = consensus(&q, &w, Some(&board), None).unwrap();
        assert_eq!(c.books_used, 1);
        assert_eq!(c.exchanges_used, 1);
        assert!(c.contributions.contains_key("ProphetX"));
        assert!(!c.contributions.contains_key("NoVig"));
        assert_eq!(
            c.contributions["ProphetX"].class,
            BookClass::Exchange
        );
    }

    #[test]
    fn test_consensus_idempotent() {
        let q = quotes(&[
            ("Pinnacle", 1.91, 1.92),
            ("Circa", 1.89, 1.95),
            ("FanDuel", 1.87, 1.97),
        ]);
        let w = weights(&[("Pinnacle", 0.5), ("Circa", 0.3), ("FanDuel", 0.2)]);
        let a = consensus(&q, &w, None, None).unwrap();
        let b = consensus(&q, &w, None, None).unwrap();
        assert_eq!(a.fair_prob.to_bits(), b.fair_prob.to_bits());
        assert_eq!(a.fair_odds_american, b.fair_odds_american);
    }

    #[test]
    fn test_consensus_with_ev_analysis() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91)]);
        let w = weights(&[("Pinnacle", 1.0)]);
        let c = consensus(&q, &w, None, Some(2.05)).unwrap();
        let ev = c.ev.expect("ev analysis requested");
        // fair_prob 0.5, offered 2.05: 100 * (0.5*1.05 - 0.5) = 2.5
        assert!((ev.ev_percentage - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_contribution_breakdown() {
        let q = quotes(&[("Pinnacle", 1.91, 1.91), ("FanDuel", 1.87, 1.97)]);
        let w = weights(&[("Pinnacle", 0.7), ("FanDuel", 0.3)]);
        let c = consensus(&q, &w, None, None).unwrap();
        let pinnacle = &c.contributions["Pinnacle"];
        assert_eq!(pinnacle.class, BookClass::Sharp);
        assert!((pinnacle.weight - 0.7).abs() < 1e-9);
        assert_eq!(pinnacle.odds, (1.91, 1.91));
        assert_eq!(c.contributions["FanDuel"].class, BookClass::Recreational);
    }
}
