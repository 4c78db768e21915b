//! Tagged event records produced by combat/loot/mob systems each tick and
//! drained into the next broadcast snapshot (SPEC_FULL design notes,
//! adapting the teacher's `GameEvent`/`EventQueue` split).

mod queue;
mod types;

pub use queue::EventQueue;
pub use types::{GameEvent, ReliabilityMode};
