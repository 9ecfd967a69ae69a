//! Player-proposition pricing.
//!
//! Structurally parallel to the main consensus engine but tuned separately:
//! prop markets have their own liquidity and sharpness profile, so a book's
//! weight here can differ sharply from its main-line weight (FanDuel's huge
//! recreational prop volume outranks Pinnacle's thin prop boards). Weights
//! are passed into every call, never stored.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::devig::devig_multiplicative;
use super::error::EngineError;
use super::ev;
use super::odds::decimal_to_american;

/// The two supported prop shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropQuote {
    /// Numeric line with two-way odds. Some books omit the line.
    OverUnder {
        over: f64,
        under: f64,
        line: Option<f64>,
    },
    /// Pure binary prop (e.g. anytime touchdown).
    YesNo { yes: f64, no: f64 },
}

impl PropQuote {
    fn two_way(&self) -> [f64; 2] {
        match *self {
            PropQuote::OverUnder { over, under, .. } => [over, under],
            PropQuote::YesNo { yes, no } => [yes, no],
        }
    }

    fn line(&self) -> Option<f64> {
        match *self {
            PropQuote::OverUnder { line, .. } => line,
            PropQuote::YesNo { .. } => None,
        }
    }

    fn shape(&self) -> PropShape {
        match self {
            PropQuote::OverUnder { .. } => PropShape::OverUnder,
            PropQuote::YesNo { .. } => PropShape::YesNo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropShape {
    OverUnder,
    YesNo,
}

/// Prop-specific weight table plus the minimum book count required before
/// any analysis is produced.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PropWeights {
    pub weights: BTreeMap<String, f64>,
    pub min_books: usize,
}

/// Static catalog entry for a known prop market type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropTypeInfo {
    pub shape: PropShape,
    pub unit: &'static str,
    pub variance: &'static str,
}

/// Known prop market types with their shape and outcome variance. Used to
/// annotate analyses; unknown types still price, just without annotation.
pub fn prop_type_info(prop_type: &str) -> Option<PropTypeInfo> {
    let info = |shape, unit, variance| PropTypeInfo {
        shape,
        unit,
        variance,
    };
    let ou = PropShape::OverUnder;
    let yn = PropShape::YesNo;
    match prop_type {
        "passing_yards" => Some(info(ou, "yards", "medium")),
        "passing_touchdowns" => Some(info(ou, "touchdowns", "high")),
        "rushing_yards" => Some(info(ou, "yards", "high")),
        "rushing_touchdowns" => Some(info(ou, "touchdowns", "high")),
        "receiving_yards" => Some(info(ou, "yards", "high")),
        "receiving_touchdowns" => Some(info(ou, "touchdowns", "very_high")),
        "receptions" => Some(info(ou, "receptions", "medium")),
        "points" => Some(info(ou, "points", "high")),
        "rebounds" => Some(info(ou, "rebounds", "medium")),
        "assists" => Some(info(ou, "assists", "medium")),
        "first_touchdown" => Some(info(yn, "boolean", "very_high")),
        "anytime_touchdown" => Some(info(yn, "boolean", "high")),
        _ => None,
    }
}

/// Source-book trust tier in the prop model, derived from its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookTier {
    Sharp,
    Recreational,
    Unweighted,
}

pub fn book_tier(weight: f64) -> BookTier {
    if weight >= 0.15 {
        BookTier::Sharp
    } else if weight > 0.0 {
        BookTier::Recreational
    } else {
        BookTier::Unweighted
    }
}

/// Consensus line across books: the weighted average of each weighted
/// contributor's line, or the unweighted median when no weighted book
/// supplies one.
pub fn consensus_line(
    quotes: &BTreeMap<String, PropQuote>,
    weights: &BTreeMap<String, f64>,
) -> Result<f64, EngineError> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (book, quote) in quotes {
        let weight = weights.get(book).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        if let Some(line) = quote.line() {
            weighted_sum += line * weight;
            total_weight += weight;
        }
    }
    if total_weight > 0.0 {
        return Ok(weighted_sum / total_weight);
    }

    // No weighted contributor carried a line: fall back to the median.
    let mut lines: Vec<f64> = quotes.values().filter_map(|q| q.line()).collect();
    if lines.is_empty() {
        return Err(EngineError::NoConsensusLine);
    }
    lines.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = lines.len() / 2;
    if lines.len() % 2 == 1 {
        Ok(lines[mid])
    } else {
        Ok((lines[mid - 1] + lines[mid]) / 2.0)
    }
}

/// Fair-value analysis of one prop market. `fair_prob` is P(over) or P(yes).
#[derive(Debug, Clone, Serialize)]
pub struct PropAnalysis {
    pub player: String,
    pub prop_type: String,
    pub shape: PropShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_line: Option<f64>,
    pub fair_prob: f64,
    pub fair_odds_decimal: f64,
    pub fair_odds_american: String,
    pub fair_opposite_odds_decimal: f64,
    pub fair_opposite_odds_american: String,
    pub books_used: u32,
    pub total_weight_used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<&'static str>,
}

/// Price a prop market with the prop-specific weight table.
///
/// Requires at least `model.min_books` books quoting before any analysis is
/// produced -- thin prop markets are noise. Zero-weight and mismatched-shape
/// books are skipped per item; a market where no weighted book survives is
/// unpriceable.
pub fn analyze_prop(
    quotes: &BTreeMap<String, PropQuote>,
    model: &PropWeights,
    player: &str,
    prop_type: &str,
) -> Result<PropAnalysis, EngineError> {
    if quotes.len() < model.min_books {
        return Err(EngineError::InsufficientBooks {
            required: model.min_books,
            available: quotes.len(),
        });
    }

    let shape = quotes
        .values()
        .next()
        .map(PropQuote::shape)
        .ok_or(EngineError::NoValidData)?;

    let consensus_line = match shape {
        PropShape::OverUnder => Some(consensus_line(quotes, &model.weights)?),
        PropShape::YesNo => None,
    };

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut books_used = 0u32;

    for (book, quote) in quotes {
        let weight = model.weights.get(book).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        if quote.shape() != shape {
            tracing::debug!(book = %book, "skipping mismatched prop shape");
            continue;
        }
        let pair = match devig_multiplicative(&quote.two_way()) {
            Ok(pair) => pair,
            Err(err) => {
                tracing::debug!(book = %book, error = %err, "skipping malformed prop quote");
                continue;
            }
        };
        weighted_sum += pair.prob_a * weight;
        total_weight += weight;
        books_used += 1;
    }

    if books_used == 0 {
        return Err(EngineError::NoValidData);
    }

    let fair_prob = weighted_sum / total_weight;
    let fair_odds_decimal = 1.0 / fair_prob;
    let fair_opposite_odds_decimal = 1.0 / (1.0 - fair_prob);

    Ok(PropAnalysis {
        player: player.to_string(),
        prop_type: prop_type.to_string(),
        shape,
        consensus_line,
        fair_prob,
        fair_odds_decimal,
        fair_odds_american: decimal_to_american(fair_odds_decimal)?,
        fair_opposite_odds_decimal,
        fair_opposite_odds_american: decimal_to_american(fair_opposite_odds_decimal)?,
        books_used,
        total_weight_used: total_weight,
        variance: prop_type_info(prop_type).map(|i| i.variance),
    })
}

/// Which side of a prop an opportunity bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropSide {
    Over,
    Under,
    Yes,
    No,
}

/// One +EV prop bet candidate.
#[derive(Debug, Clone, Serialize)]
pub struct PropOpportunity {
    pub player: String,
    pub prop_type: String,
    pub side: PropSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    pub book: String,
    pub tier: BookTier,
    pub book_weight: f64,
    pub offered_odds: f64,
    pub fair_odds: f64,
    pub fair_prob: f64,
    pub ev_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<&'static str>,
}

/// Scan every book's offered prices against the analysis and return all
/// opportunities at or above `min_ev`, best first.
///
/// Every book is scanned -- including ones the model weights at zero, since
/// those are exactly the soft prices worth betting into. Each candidate is
/// tagged with its source book's tier so callers can filter on trust.
pub fn find_opportunities(
    analysis: &PropAnalysis,
    quotes: &BTreeMap<String, PropQuote>,
    model: &PropWeights,
    min_ev: f64,
) -> Vec<PropOpportunity> {
    let mut opportunities = Vec::new();

    for (book, quote) in quotes {
        let book_weight = model.weights.get(book).copied().unwrap_or(0.0);
        let tier = book_tier(book_weight);

        let [odds_a, odds_b] = quote.two_way();
        let (side_a, side_b) = match quote.shape() {
            PropShape::OverUnder => (PropSide::Over, PropSide::Under),
            PropShape::YesNo => (PropSide::Yes, PropSide::No),
        };
        let sides = [
            (side_a, odds_a, analysis.fair_prob, analysis.fair_odds_decimal),
            (
                side_b,
                odds_b,
                1.0 - analysis.fair_prob,
                analysis.fair_opposite_odds_decimal,
            ),
        ];

        for (side, offered_odds, fair_prob, fair_odds) in sides {
            let ev_percentage = match ev::expected_value(offered_odds, fair_prob) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(book = %book, error = %err, "skipping unpriceable side");
                    continue;
                }
            };
            if ev_percentage < min_ev {
                continue;
            }
            opportunities.push(PropOpportunity {
                player: analysis.player.clone(),
                prop_type: analysis.prop_type.clone(),
                side,
                line: analysis.consensus_line,
                book: book.clone(),
                tier,
                book_weight,
                offered_odds,
                fair_odds,
                fair_prob,
                ev_percentage,
                variance: analysis.variance,
            });
        }
    }

    opportunities.sort_by(|a, b| {
        b.ev_percentage
            .partial_cmp(&a.ev_percentage)
            .unwrap_or(Ordering::Equal)
    });
    opportunities
}
