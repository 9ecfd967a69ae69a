use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw snapshot types handed over by the odds-ingestion collaborator
/// (provider-agnostic). One event is one game with per-book market
/// offerings; outcome lists keep whatever order the provider used.

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: String,
    #[serde(default)]
    pub books: Vec<RawBook>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBook {
    pub name: String,
    #[serde(default)]
    pub markets: Vec<RawMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMarket {
    pub kind: MarketKind,
    #[serde(default)]
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOutcome {
    pub name: String,
    /// Decimal odds.
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Moneyline,
    Spreads,
    Totals,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Moneyline => "moneyline",
            MarketKind::Spreads => "spreads",
            MarketKind::Totals => "totals",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite market identity. Distinct lines for the same game are distinct
/// markets -- a 45.5 total and a 46.5 total price different propositions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketId {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub kind: MarketKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
}

impl MarketId {
    /// Deterministic storage key: `sport:home:away:kind[:line]`.
    pub fn key(&self) -> String {
        match self.line {
            Some(line) => format!(
                "{}:{}:{}:{}:{:.1}",
                self.sport, self.home_team, self.away_team, self.kind, line
            ),
            None => format!(
                "{}:{}:{}:{}",
                self.sport, self.home_team, self.away_team, self.kind
            ),
        }
    }
}
