//! Test doubles for mediadex components.
//!
//! These are real implementations with controllable behavior, used by unit
//! tests in this crate and by the server's integration tests.

mod mock_shard;

pub use mock_shard::MockShard;
