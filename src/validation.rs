//! Input validation for job-shop problems.
//!
//! Checks the raw job lists before a problem is built. Detects:
//! - Empty jobs
//! - Non-positive durations
//! - Negative machine ids
//! - Machine ids too large to index
//! - Total duration too large for the time type
//!
//! All issues are collected so that a caller sees every problem at once.

use thiserror::Error;

/// Largest number of machines a problem may reference.
///
/// Machine ids must be below this value.
pub const MAX_MACHINES: i64 = 1 << 20;

/// Largest allowed sum of durations.
///
/// Bound arithmetic adds a duration to values up to the horizon, so the
/// horizon is kept at half the `i64` range.
pub const MAX_HORIZON: i64 = i64::MAX / 2;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A job has no operations.
    EmptyJob,
    /// An operation has a duration of zero or less.
    NonPositiveDuration,
    /// An operation references a machine id below zero.
    NegativeMachineId,
    /// An operation references a machine id of [`MAX_MACHINES`] or more.
    MachineIdTooLarge,
    /// The sum of all durations exceeds [`MAX_HORIZON`].
    HorizonOverflow,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates raw job data.
///
/// Each job is a list of `(machine_id, duration)` pairs in execution order.
///
/// Checks:
/// 1. Every job has at least one operation
/// 2. Every duration is strictly positive
/// 3. Every machine id is non-negative and below [`MAX_MACHINES`]
/// 4. The total duration (the search horizon) is at most [`MAX_HORIZON`]
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_jobs(jobs: &[Vec<(i64, i64)>]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut horizon: Option<i64> = Some(0);

    for (job_id, job) in jobs.iter().enumerate() {
        if job.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyJob,
                format!("Job {job_id} has no operations"),
            ));
        }

        for (position, &(machine_id, duration)) in job.iter().enumerate() {
            if machine_id < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeMachineId,
                    format!("Job {job_id} operation {position} references machine {machine_id}"),
                ));
            } else if machine_id >= MAX_MACHINES {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MachineIdTooLarge,
                    format!(
                        "Job {job_id} operation {position} references machine {machine_id} (limit {MAX_MACHINES})"
                    ),
                ));
            }
            if duration <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositiveDuration,
                    format!("Job {job_id} operation {position} has duration {duration}"),
                ));
            } else {
                horizon = horizon
                    .and_then(|h| h.checked_add(duration))
                    .filter(|&h| h <= MAX_HORIZON);
            }
        }
    }

    if horizon.is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::HorizonOverflow,
            format!("Sum of operation durations exceeds {MAX_HORIZON}"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
