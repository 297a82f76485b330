//! Error types for the cooperative pipeline and the chat service.

use neno_providers::RegistryError;
use thiserror::Error;

/// Failure of a cooperative run.
#[derive(Debug, Error)]
pub enum CooperativeError {
    /// Every subtask failed, so there is nothing to combine.
    #[error("all {attempted} subtasks failed")]
    AllSubtasksFailed { attempted: usize },

    /// The single-call path (prompt below the threshold) failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// The divider could not read subtasks out of the model's answer.
///
/// Never leaves the divider: it always triggers the deterministic split.
#[derive(Debug, Error)]
pub enum DivisionParseError {
    #[error("no JSON array of subtasks found in division answer")]
    NoArray,

    #[error("division array contained no usable subtask")]
    Empty,
}

/// Failure of a chat request after every fallback was exhausted.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("conversation has no messages")]
    EmptyConversation,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
