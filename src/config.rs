use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::engine::props::PropWeights;
use crate::engine::weights::MarketWeights;
use crate::feed::types::MarketKind;

/// Immutable runtime configuration: weight tables, book directory, venue
/// gating, and EV thresholds. Loaded once and shared by reference -- weight
/// tables are never mutated between evaluations.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Sport key -> per-market weight tables.
    #[serde(default = "default_sports")]
    pub sports: BTreeMap<String, SportWeights>,
    #[serde(default)]
    pub books: BooksConfig,
    #[serde(default)]
    pub venues: VenueConfig,
    #[serde(default = "default_prop_weights")]
    pub props: PropWeights,
    #[serde(default)]
    pub ev: EvConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SportWeights {
    pub moneyline: MarketWeights,
    pub spreads: MarketWeights,
    pub totals: MarketWeights,
}

impl SportWeights {
    pub fn for_market(&self, kind: MarketKind) -> &MarketWeights {
        match kind {
            MarketKind::Moneyline => &self.moneyline,
            MarketKind::Spreads => &self.spreads,
            MarketKind::Totals => &self.totals,
        }
    }
}

/// Book directory: unconditional exclusions and display-name aliases.
#[derive(Debug, Deserialize, Clone)]
pub struct BooksConfig {
    /// Books excluded no matter what (stale-price feeds).
    #[serde(default = "default_never_use")]
    pub never_use: Vec<String>,
    /// Provider display name -> canonical identifier.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            never_use: default_never_use(),
            aliases: default_aliases(),
        }
    }
}

/// Exchange venues: their consensus weights and the minimum liquidity
/// required before a venue's price is trusted.
#[derive(Debug, Deserialize, Clone)]
pub struct VenueConfig {
    #[serde(default = "default_venue_weights")]
    pub weights: BTreeMap<String, f64>,
    #[serde(default = "default_liquidity_threshold")]
    pub liquidity_threshold: f64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            weights: default_venue_weights(),
            liquidity_threshold: default_liquidity_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvConfig {
    /// Records below this EV percentage are not emitted.
    #[serde(default = "default_min_ev_percent")]
    pub min_ev_percent: f64,
    /// Scaling applied to full-Kelly stakes (0.25 = quarter-Kelly).
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,
}

impl Default for EvConfig {
    fn default() -> Self {
        Self {
            min_ev_percent: default_min_ev_percent(),
            kelly_fraction: default_kelly_fraction(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sports: default_sports(),
            books: BooksConfig::default(),
            venues: VenueConfig::default(),
            props: default_prop_weights(),
            ev: EvConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Weight tables for one (sport, market-type) pair, if configured.
    pub fn market_weights(&self, sport: &str, kind: MarketKind) -> Option<&MarketWeights> {
        self.sports.get(sport).map(|s| s.for_market(kind))
    }
}

fn table(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

fn default_never_use() -> Vec<String> {
    vec!["WynnBET".to_string(), "LowVig.ag".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("BetOnline.ag", "BetOnline"),
        ("MyBookie.ag", "MyBookie"),
        ("Caesars Sportsbook", "Caesars"),
        ("BetMGM Sportsbook", "BetMGM"),
    ]
    .iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

fn default_venue_weights() -> BTreeMap<String, f64> {
    table(&[("ProphetX", 0.10), ("NoVig", 0.10)])
}

fn default_liquidity_threshold() -> f64 {
    1000.0
}

fn default_min_ev_percent() -> f64 {
    0.5
}

fn default_kelly_fraction() -> f64 {
    0.25
}

fn default_prop_weights() -> PropWeights {
    PropWeights {
        weights: table(&[
            // Top tier: sharp on props or huge recreational volume.
            ("FanDuel", 0.28),
            ("Circa", 0.22),
            // Moderate prop sharpness.
            ("Pinnacle", 0.12),
            ("Caesars", 0.12),
            ("PropBuilder", 0.10),
            // Slower to adjust prop lines.
            ("DraftKings", 0.08),
            ("BetMGM", 0.06),
            ("BetOnline", 0.02),
            // Main-line focused, no prop trust.
            ("BookMaker", 0.00),
            ("WynnBET", 0.00),
        ]),
        min_books: 3,
    }
}

/// NFL weight tables. Primary tables hold the sharp core; fallback tables
/// add softer high-volume books at reduced weight.
fn nfl_weights() -> SportWeights {
    SportWeights {
        moneyline: MarketWeights {
            primary: table(&[
                ("Pinnacle", 0.33),
                ("Circa", 0.28),
                ("BetOnline", 0.19),
                ("DraftKings", 0.09),
                ("FanDuel", 0.05),
                ("BetRivers", 0.04),
                ("Bovada", 0.02),
            ]),
            fallback: table(&[
                ("Pinnacle", 0.25),
                ("Circa", 0.22),
                ("BetOnline", 0.15),
                ("DraftKings", 0.08),
                ("FanDuel", 0.05),
                ("BetRivers", 0.04),
                ("Bovada", 0.03),
                ("BetMGM", 0.06),
                ("Caesars", 0.05),
                ("BetUS", 0.04),
                ("MyBookie", 0.03),
            ]),
            min_books: 3,
        },
        spreads: MarketWeights {
            primary: table(&[
                ("Pinnacle", 0.35),
                ("Circa", 0.30),
                ("BetOnline", 0.20),
                ("BookMaker", 0.08),
                ("DraftKings", 0.04),
                ("FanDuel", 0.03),
            ]),
            fallback: table(&[
                ("Pinnacle", 0.30),
                ("Circa", 0.25),
                ("BetOnline", 0.12),
                ("BookMaker", 0.08),
                ("DraftKings", 0.08),
                ("BetMGM", 0.07),
                ("FanDuel", 0.05),
                ("BetRivers", 0.03),
                ("Caesars", 0.02),
            ]),
            min_books: 2,
        },
        totals: MarketWeights {
            primary: table(&[
                ("Pinnacle", 0.43),
                ("Circa", 0.24),
                ("BetOnline", 0.19),
                ("DraftKings", 0.10),
                ("BetRivers", 0.04),
            ]),
            fallback: table(&[
                ("Pinnacle", 0.32),
                ("Circa", 0.18),
                ("BetOnline", 0.15),
                ("DraftKings", 0.10),
                ("BetRivers", 0.05),
                ("FanDuel", 0.08),
                ("BetMGM", 0.06),
                ("Bovada", 0.04),
                ("Caesars", 0.02),
            ]),
            min_books: 2,
        },
    }
}

fn default_sports() -> BTreeMap<String, SportWeights> {
    [("americanfootball_nfl".to_string(), nfl_weights())]
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        let nfl = &config.sports["americanfootball_nfl"];
        assert_eq!(nfl.moneyline.min_books, 3);
        assert_eq!(nfl.spreads.min_books, 2);
        assert!(config.books.never_use.contains(&"WynnBET".to_string()));
        assert_eq!(config.books.aliases["BetOnline.ag"], "BetOnline");
        assert!((config.venues.liquidity_threshold - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_defaults_match_shipped_config() {
        let config = Config::default();
        assert!(config.sports.contains_key("americanfootball_nfl"));
        assert!((config.props.weights["FanDuel"] - 0.28).abs() < 1e-9);
        assert_eq!(config.props.min_books, 3);
        assert!((config.ev.min_ev_percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_market_weights_lookup() {
        let config = Config::default();
        let totals = config
            .market_weights("americanfootball_nfl", MarketKind::Totals)
            .unwrap();
        assert!((totals.primary["Pinnacle"] - 0.43).abs() < 1e-9);
        assert!(config
            .market_weights("basketball_nba", MarketKind::Totals)
            .is_none());
    }
}
