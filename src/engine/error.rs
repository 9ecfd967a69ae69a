use thiserror::Error;

/// Failure taxonomy for the pricing engine.
///
/// The invalid-input variants reject a single call outright and are never
/// coerced. `NoValidData` means nothing usable survived filtering (the market
/// cannot be priced at all), while `InsufficientBooks` means the market is
/// technically priceable but sits below the configured confidence threshold --
/// callers are expected to treat the two differently.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid decimal odds {0} (must be > 1.0)")]
    InvalidOdds(f64),

    #[error("fair probability {0} outside (0, 1)")]
    InvalidProbability(f64),

    #[error("two-way devig requires exactly 2 odds, got {0}")]
    NotTwoWay(usize),

    #[error("participating weights sum to zero")]
    ZeroTotalWeight,

    #[error("no valid odds data after filtering")]
    NoValidData,

    #[error("need at least {required} books, got {available}")]
    InsufficientBooks { required: usize, available: usize },

    #[error("no line values available for consensus")]
    NoConsensusLine,

    #[error("kelly fraction undefined for zero net payout")]
    ZeroNetPayout,
}
