//! Beliefs over which vocabulary word a keyword slot holds.
//!
//! This module is composed of:
//! - `dist`: the sparse log-probability distribution (`Belief`) and its constructors.
//! - `compress`: support reduction to a cumulative-mass prefix.
//! - `update`: posterior replacement once a reveal ties a clue to a slot.
//! - `telemetry`: summary metrics for logging.

mod compress;
mod dist;
mod update;
pub mod telemetry;

pub use compress::{NO_COMPRESSION, compress, compress_batch};
pub use dist::Belief;
pub use telemetry::{BatchMetrics, BeliefMetrics};
