//! Cooperative orchestration for NENO.
//!
//! A prompt is scored by the [`complexity`] analyzer. Simple prompts go to
//! the provider registry in one call; complex ones are split by the
//! [`divider`], fanned out by the [`executor`], and fused by the
//! [`combiner`]. [`orchestrator::CooperativeOrchestrator`] wires these
//! together, and [`chat::ChatService`] adds mode prompts and the plain
//! fallback path on top.

pub mod chat;
pub mod combiner;
pub mod complexity;
pub mod divider;
pub mod error;
pub mod executor;
pub mod modes;
pub mod orchestrator;
pub mod types;

#[cfg(test)]
mod testing;

pub use chat::{ChatOptions, ChatOutcome, ChatService};
pub use complexity::analyze_complexity;
pub use error::{ChatError, CooperativeError, DivisionParseError};
pub use orchestrator::CooperativeOrchestrator;
pub use types::{ComplexityAnalysis, CooperationStatus, CooperativeResult, Subtask, SubtaskResult};
