pub mod consensus;
pub mod devig;
pub mod error;
pub mod ev;
pub mod odds;
pub mod props;
pub mod weights;

pub use consensus::{Consensus, QuotedMarket, VenueBoard, VenueQuote};
pub use error::EngineError;
pub use weights::{MarketWeights, SelectedWeights, WeightTier};
