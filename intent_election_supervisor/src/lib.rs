//! intent_election_supervisor
//!
//! Outside-world facing orchestration layer for `intent_election_core`.
//!
//! Responsibilities:
//! - sanitize upstream classifier scores into election inputs
//! - run elections for batches of utterances (parallel, order-preserving)
//! - keep per-stream outcome tallies, sharded by `stream_id`
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no election logic (lives in core)

pub mod adapter;
pub mod supervisor;

pub use adapter::{build_input_batch, BasicInputBuilder, InputBuilder, ScoreSanitizer, UtteranceEvent};

pub use supervisor::{
    ElectionAction, ElectionSupervisor, ElectionTally, RestoreStats, SupervisorSnapshot,
};
