//! Prompt Panel Errors

use thiserror::Error;

use super::state::StateValidationError;

/// Errors raised by the prompt panel controller.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The panel was constructed without a destination element id
    #[error("destination id is required to build the prompt panel")]
    MissingDestination,

    /// An operation needed the parameter definition before one was set
    #[error("the parameter definition has not been set")]
    DefinitionNotSet,

    #[error(transparent)]
    State(#[from] StateValidationError),

    /// The definition source failed to deliver the next definition
    #[error("failed to fetch parameter definition: {0}")]
    Fetch(anyhow::Error),

    #[error("invalid parameter definition: {0}")]
    Definition(#[from] serde_json::Error),
}

pub type PromptResult<T> = Result<T, PromptError>;
