//! Per-step outcomes
//!
//! Every pipeline step either completes or degrades to a conservative default
//! while keeping the reason. Conditions that must abort the request are plain
//! `Err(VerifierError)` values instead.

use serde::Serialize;

use crate::error::VerifierError;

/// Result of a pipeline step that is allowed to fail softly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    /// The step ran to completion
    Completed { value: T },
    /// The step could not run; `value` holds the fallback used instead
    Degraded { value: T, reason: String },
}

impl<T> StepOutcome<T> {
    pub fn completed(value: T) -> Self {
        StepOutcome::Completed { value }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        StepOutcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// Turn a fallible step into an outcome, substituting `fallback` on error
    pub fn from_result(result: Result<T, VerifierError>, fallback: T) -> Self {
        match result {
            Ok(value) => StepOutcome::completed(value),
            Err(err) => StepOutcome::degraded(fallback, err.to_string()),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            StepOutcome::Completed { value } | StepOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            StepOutcome::Completed { value } | StepOutcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StepOutcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StepOutcome::Completed { .. } => None,
            StepOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StepOutcome<U> {
        match self {
            StepOutcome::Completed { value } => StepOutcome::Completed { value: f(value) },
            StepOutcome::Degraded { value, reason } => StepOutcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
