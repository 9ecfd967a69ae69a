//! Flatten raw provider events into uniform per-market book quotes.
//!
//! Outcome sides are matched by name -- home/away team for moneyline and
//! spreads, Over/Under for totals -- never by array position. Providers
//! reorder outcome arrays freely, and positional matching silently swaps
//! home and away when they do.

use std::collections::BTreeMap;

use crate::engine::consensus::QuotedMarket;
use crate::engine::weights::canonical_book_name;

use super::types::{MarketId, MarketKind, RawEvent, RawMarket};

/// One priceable market extracted from a raw event: its identity plus each
/// participating book's two-sided quote. Side A is home (moneyline,
/// spreads) or over (totals).
#[derive(Debug, Clone)]
pub struct NormalizedMarket {
    pub id: MarketId,
    pub quotes: BTreeMap<String, QuotedMarket>,
}

/// Group key for a line value: tenths of a point, so 45.5 and 45.5 from two
/// books land in the same market while 45.5 and 46.5 stay apart.
fn line_key(line: f64) -> i64 {
    (line * 10.0).round() as i64
}

fn find_price(market: &RawMarket, outcome_name: &str) -> Option<(f64, Option<f64>)> {
    market
        .outcomes
        .iter()
        .find(|o| o.name == outcome_name)
        .map(|o| (o.price, o.point))
}

/// Extract every priceable market from one event, with book display names
/// resolved to canonical identifiers.
///
/// A book missing either side of a market is skipped for that market only.
/// Spreads and totals are split by line: each distinct point value becomes
/// its own market.
pub fn game_markets(
    event: &RawEvent,
    aliases: &BTreeMap<String, String>,
) -> Vec<NormalizedMarket> {
    let mut moneyline: BTreeMap<String, QuotedMarket> = BTreeMap::new();
    let mut spreads: BTreeMap<i64, (f64, BTreeMap<String, QuotedMarket>)> = BTreeMap::new();
    let mut totals: BTreeMap<i64, (f64, BTreeMap<String, QuotedMarket>)> = BTreeMap::new();

    for book in &event.books {
        let canonical = canonical_book_name(aliases, &book.name);

        for market in &book.markets {
            match market.kind {
                MarketKind::Moneyline => {
                    let home = find_price(market, &event.home_team);
                    let away = find_price(market, &event.away_team);
                    if let (Some((home_odds, _)), Some((away_odds, _))) = (home, away) {
                        moneyline.insert(
                            canonical.clone(),
                            QuotedMarket::new(home_odds, away_odds),
                        );
                    } else {
                        tracing::debug!(
                            book = %canonical,
                            event = %event.id,
                            "moneyline outcome names did not match teams"
                        );
                    }
                }
                MarketKind::Spreads => {
                    let home = find_price(market, &event.home_team);
                    let away = find_price(market, &event.away_team);
                    if let (Some((home_odds, Some(home_point))), Some((away_odds, _))) =
                        (home, away)
                    {
                        let entry = spreads
                            .entry(line_key(home_point))
                            .or_insert_with(|| (home_point, BTreeMap::new()));
                        entry.1.insert(
                            canonical.clone(),
                            QuotedMarket::with_point(home_odds, away_odds, home_point),
                        );
                    }
                }
                MarketKind::Totals => {
                    let over = find_price(market, "Over");
                    let under = find_price(market, "Under");
                    if let (Some((over_odds, Some(point))), Some((under_odds, _))) =
                        (over, under)
                    {
                        let entry = totals
                            .entry(line_key(point))
                            .or_insert_with(|| (point, BTreeMap::new()));
                        entry.1.insert(
                            canonical.clone(),
                            QuotedMarket::with_point(over_odds, under_odds, point),
                        );
                    }
                }
            }
        }
    }

    let id = |kind: MarketKind, line: Option<f64>| MarketId {
        sport: event.sport.clone(),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        kind,
        line,
    };

    let mut markets = Vec::new();
    if !moneyline.is_empty() {
        markets.push(NormalizedMarket {
            id: id(MarketKind::Moneyline, None),
            quotes: moneyline,
        });
    }
    for (_, (line, quotes)) in spreads {
        markets.push(NormalizedMarket {
            id: id(MarketKind::Spreads, Some(line)),
            quotes,
        });
    }
    for (_, (line, quotes)) in totals {
        markets.push(NormalizedMarket {
            id: id(MarketKind::Totals, Some(line)),
            quotes,
        });
    }
    markets
}
