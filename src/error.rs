//! Crate-level error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while building a problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    /// The input failed validation. Carries every detected issue.
    #[error("invalid problem: {}", join_messages(.0))]
    InvalidProblem(Vec<ValidationError>),
}

impl ProblemError {
    /// The validation errors behind this failure.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ProblemError::InvalidProblem(errors) => errors,
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
