//! Snapshot evaluation: raw events in, EV records out.
//!
//! Per market the flow is weight policy -> devig -> consensus -> EV scan.
//! Sports are fetched concurrently; per-market evaluation is pure and
//! sequential. Record persistence is best effort -- a sink failure is logged
//! and the run continues.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::config::Config;
use crate::engine::consensus::{consensus, Consensus};
use crate::engine::ev;
use crate::engine::weights::select_weights;
use crate::feed::normalize::{game_markets, NormalizedMarket};
use crate::feed::types::{MarketKind, RawEvent};
use crate::feed::SnapshotSource;

/// One (market, book, side) evaluation at or above the EV threshold.
/// Written once per run; the persistence collaborator assigns storage keys
/// and never updates a record in place.
#[derive(Debug, Clone, Serialize)]
pub struct EvRecord {
    pub market_key: String,
    pub sport: String,
    pub market: MarketKind,
    pub home_team: String,
    pub away_team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    pub book: String,
    /// Team name for moneyline/spreads, "Over"/"Under" for totals.
    pub side: String,
    pub offered_odds: f64,
    pub fair_odds: f64,
    pub fair_prob: f64,
    pub ev_percentage: f64,
    pub positive_ev: bool,
    pub timestamp: DateTime<Utc>,
}

/// Persistence collaborator interface. Saves are best effort: callers log
/// failures and move on, they do not retry.
#[async_trait]
pub trait RecordSink: Send {
    async fn save(&mut self, records: &[EvRecord]) -> Result<()>;
}

/// Writes records as JSON lines to any writer.
pub struct JsonlSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl JsonlSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for JsonlSink<W> {
    async fn save(&mut self, records: &[EvRecord]) -> Result<()> {
        for record in records {
            serde_json::to_writer(&mut self.out, record)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Counters for one sport's evaluation pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SportSummary {
    pub events: usize,
    pub markets_priced: usize,
    pub markets_skipped: usize,
    pub records: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub sports: BTreeMap<String, SportSummary>,
    pub records: usize,
}

fn side_labels(market: &NormalizedMarket) -> (String, String) {
    match market.id.kind {
        MarketKind::Moneyline | MarketKind::Spreads => (
            market.id.home_team.clone(),
            market.id.away_team.clone(),
        ),
        MarketKind::Totals => ("Over".to_string(), "Under".to_string()),
    }
}

/// Price one market and scan every quoting book's two offered prices against
/// the consensus. Returns None when the market is unpriceable (empty weight
/// selection or no valid contributors).
pub fn evaluate_market(
    config: &Config,
    market: &NormalizedMarket,
    now: DateTime<Utc>,
) -> Option<(Consensus, Vec<EvRecord>)> {
    let weights = config.market_weights(&market.id.sport, market.id.kind)?;
    let available: Vec<String> = market.quotes.keys().cloned().collect();
    let selected = select_weights(
        weights,
        &config.books.never_use,
        &config.books.aliases,
        &available,
    );
    if selected.is_unpriceable() {
        tracing::warn!(market = %market.id.key(), "unpriceable: no usable books");
        return None;
    }

    let result = match consensus(&market.quotes, &selected.weights, None, None) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(market = %market.id.key(), error = %err, "consensus failed");
            return None;
        }
    };

    let (label_a, label_b) = side_labels(market);
    let mut records = Vec::new();

    // Scan every book present on the market, weighted or not -- soft
    // unweighted prices are exactly where the edge shows up.
    for (book, quote) in &market.quotes {
        let sides = [
            (&label_a, quote.odds_a, result.fair_prob),
            (&label_b, quote.odds_b, 1.0 - result.fair_prob),
        ];
        for (side, offered_odds, fair_prob) in sides {
            let ev_percentage = match ev::expected_value(offered_odds, fair_prob) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(book = %book, error = %err, "skipping side");
                    continue;
                }
            };
            if ev_percentage < config.ev.min_ev_percent {
                continue;
            }
            records.push(EvRecord {
                market_key: market.id.key(),
                sport: market.id.sport.clone(),
                market: market.id.kind,
                home_team: market.id.home_team.clone(),
                away_team: market.id.away_team.clone(),
                line: market.id.line,
                book: book.clone(),
                side: side.clone(),
                offered_odds,
                fair_odds: 1.0 / fair_prob,
                fair_prob,
                ev_percentage,
                positive_ev: ev_percentage > 0.0,
                timestamp: now,
            });
        }
    }

    Some((result, records))
}

/// Evaluate every market of one event.
pub fn evaluate_event(
    config: &Config,
    event: &RawEvent,
    now: DateTime<Utc>,
) -> (Vec<EvRecord>, SportSummary) {
    let mut summary = SportSummary {
        events: 1,
        ..Default::default()
    };
    let mut records = Vec::new();

    for market in game_markets(event, &config.books.aliases) {
        match evaluate_market(config, &market, now) {
            Some((_, mut market_records)) => {
                summary.markets_priced += 1;
                summary.records += market_records.len();
                records.append(&mut market_records);
            }
            None => summary.markets_skipped += 1,
        }
    }

    (records, summary)
}

/// Fetch, evaluate, and persist one snapshot across all given sports.
///
/// Fetches run concurrently; a sport whose fetch fails is logged and
/// skipped. Sink failures are logged and swallowed -- records are still
/// reported in the summary.
pub async fn run<S>(
    config: &Config,
    source: &S,
    sink: &mut dyn RecordSink,
    sports: &[String],
) -> Result<RunSummary>
where
    S: SnapshotSource + ?Sized,
{
    let fetches = join_all(sports.iter().map(|sport| source.fetch_events(sport))).await;

    let now = Utc::now();
    let mut summary = RunSummary::default();

    for (sport, fetched) in sports.iter().zip(fetches) {
        let events = match fetched {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(sport = %sport, error = %err, "odds fetch failed");
                continue;
            }
        };

        let mut sport_summary = SportSummary::default();
        let mut records = Vec::new();
        for event in &events {
            let (mut event_records, event_summary) = evaluate_event(config, event, now);
            sport_summary.events += event_summary.events;
            sport_summary.markets_priced += event_summary.markets_priced;
            sport_summary.markets_skipped += event_summary.markets_skipped;
            sport_summary.records += event_summary.records;
            records.append(&mut event_records);
        }

        if !records.is_empty() {
            if let Err(err) = sink.save(&records).await {
                tracing::warn!(sport = %sport, error = %err, "record save failed");
            }
        }

        tracing::info!(
            sport = %sport,
            events = sport_summary.events,
            priced = sport_summary.markets_priced,
            skipped = sport_summary.markets_skipped,
            records = sport_summary.records,
            "sport evaluated"
        );
        summary.records += sport_summary.records;
        summary.sports.insert(sport.clone(), sport_summary);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::{RawBook, RawMarket, RawOutcome};
    use crate::feed::FileSource;

    fn outcome(name: &str, price: f64) -> RawOutcome {
        RawOutcome {
            name: name.to_string(),
            price,
            point: None,
        }
    }

    fn moneyline_book(name: &str, home: f64, away: f64) -> RawBook {
        RawBook {
            name: name.to_string(),
            markets: vec![RawMarket {
                kind: MarketKind::Moneyline,
                outcomes: vec![outcome("Chiefs", home), outcome("Bills", away)],
            }],
        }
    }

    fn nfl_event(books: Vec<RawBook>) -> RawEvent {
        RawEvent {
            id: "evt-1".to_string(),
            sport: "americanfootball_nfl".to_string(),
            home_team: "Chiefs".to_string(),
            away_team: "Bills".to_string(),
            commence_time: "2026-01-11T18:00:00Z".to_string(),
            books,
        }
    }

    #[test]
    fn test_evaluate_event_flags_soft_price() {
        let config = Config::default();
        // Sharp books agree on a fair coin; one soft book hangs 2.15 on the
        // home side.
        let event = nfl_event(vec![
            moneyline_book("Pinnacle", 1.91, 1.91),
            moneyline_book("Circa", 1.91, 1.91),
            moneyline_book("BetOnline.ag", 1.91, 1.91),
            moneyline_book("MyBookie.ag", 2.15, 1.70),
        ]);
        let (records, summary) = evaluate_event(&config, &event, Utc::now());
        assert_eq!(summary.markets_priced, 1);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.book, "MyBookie");
        assert_eq!(record.side, "Chiefs");
        assert!((record.offered_odds - 2.15).abs() < 1e-9);
        // Primary tier: MyBookie's soft quote never moves the fair price.
        assert!((record.fair_prob - 0.5).abs() < 1e-9);
        assert!((record.ev_percentage - 7.5).abs() < 1e-9);
        assert!(record.positive_ev);
    }

    #[test]
    fn test_evaluate_event_unconfigured_sport_skips() {
        let config = Config::default();
        let mut event = nfl_event(vec![moneyline_book("Pinnacle", 1.91, 1.91)]);
        event.sport = "basketball_nba".to_string();
        let (records, summary) = evaluate_event(&config, &event, Utc::now());
        assert!(records.is_empty());
        assert_eq!(summary.markets_priced, 0);
        assert_eq!(summary.markets_skipped, 1);
    }

    #[test]
    fn test_evaluate_event_never_use_books_unpriceable() {
        let config = Config::default();
        let event = nfl_event(vec![moneyline_book("WynnBET", 1.91, 1.91)]);
        let (records, summary) = evaluate_event(&config, &event, Utc::now());
        assert!(records.is_empty());
        assert_eq!(summary.markets_skipped, 1);
    }

    #[tokio::test]
    async fn test_run_collects_records_through_sink() {
        let config = Config::default();
        let source = FileSource::from_events(vec![nfl_event(vec![
            moneyline_book("Pinnacle", 1.91, 1.91),
            moneyline_book("Circa", 1.91, 1.91),
            moneyline_book("BetOnline", 1.91, 1.91),
            moneyline_book("Bovada", 2.20, 1.66),
        ])]);

        let mut sink = JsonlSink::new(Vec::new());
        let sports = vec!["americanfootball_nfl".to_string()];
        let summary = run(&config, &source, &mut sink, &sports).await.unwrap();

        assert_eq!(summary.records, 1);
        let written = String::from_utf8(sink.out).unwrap();
        assert!(written.contains("\"book\":\"Bovada\""));
        assert!(written.contains("\"positive_ev\":true"));
    }

    #[tokio::test]
    async fn test_run_skips_unknown_sport_fetch() {
        let config = Config::default();
        let source = FileSource::from_events(vec![]);
        let mut sink = JsonlSink::new(Vec::new());
        let sports = vec!["americanfootball_nfl".to_string()];
        let summary = run(&config, &source, &mut sink, &sports).await.unwrap();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.sports["americanfootball_nfl"].events, 0);
    }
}
