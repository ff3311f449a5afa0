//! Discrete weekly time model.
//!
//! A week is split into fixed chunks of [`CHUNK_MINUTES`] minutes. Every
//! lesson, availability window and grid cell is expressed in chunks, so all
//! overlap checks reduce to integer comparisons.

mod day;
mod time;

pub use day::Weekday;
pub use time::{TimeChunk, CHUNKS_PER_DAY, CHUNKS_PER_WEEK, CHUNK_MINUTES};
