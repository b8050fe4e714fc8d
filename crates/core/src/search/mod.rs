//! Federated media search.
//!
//! This module turns free text into a match pattern, queries both shards
//! concurrently and merges the results into stable, walkable pages. Saved
//! group names resolve to their membership lists instead of the pattern
//! path.

mod engine;
mod pattern;
mod types;

pub use engine::FederatedSearch;
pub use pattern::build_match_pattern;
pub use types::*;
