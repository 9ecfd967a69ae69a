//! Sportsbook fair-value engine: devig quoted odds, blend books into a
//! weighted consensus probability, and flag prices that beat fair value.
//! Network and storage collaborators live behind the `feed::SnapshotSource`
//! and `pipeline::RecordSink` traits; everything in `engine` is pure.
pub mod config;
pub mod engine;
pub mod feed;
pub mod pipeline;
