use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::DriverError;

/// Login credentials for the application under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Base URL plus credentials. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base_url: String,
    pub credentials: Credentials,
}

impl Target {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
            },
        }
    }
}

/// Outcome of a conditional login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    /// Whether credentials were submitted at all
    pub attempted: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginOutcome {
    pub fn not_needed() -> Self {
        Self {
            attempted: false,
            success: true,
            error: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            attempted: true,
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            attempted: true,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Credentials were submitted and not accepted
    pub fn is_rejected(&self) -> bool {
        self.attempted && !self.success
    }
}

/// What the page showed after a query completed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub response_text: String,
    pub sources: Vec<String>,
    pub placeholder_visible: bool,
}

/// Result of toggling the deep-analysis control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub enabled: bool,
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A polled condition never became true
    #[error("timed out after {waited:?} waiting for {description}")]
    Timeout {
        description: String,
        waited: Duration,
        last_error: Option<String>,
    },

    /// A control the run depends on is not on the page
    #[error("required control {0} not found")]
    MissingControl(String),

    /// Credentials were rejected
    #[error("login failed: {0}")]
    AuthFailed(String),

    /// The context switch never propagated
    #[error("context switch to {expected} not confirmed (control={actual:?}, readout={readout:?})")]
    ContextMismatch {
        expected: String,
        actual: Option<String>,
        readout: Option<String>,
    },

    /// Target did not answer at all
    #[error("target {0} is unreachable")]
    Unreachable(String),

    /// An upload fixture is missing on disk
    #[error("fixture not found: {}", .0.display())]
    MissingFixture(PathBuf),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    /// Fatal errors abort the whole run; the rest abort only the enclosing scenario
    pub fn is_fatal(&self) -> bool {
        match self {
            HarnessError::MissingControl(_)
            | HarnessError::AuthFailed(_)
            | HarnessError::Unreachable(_)
            | HarnessError::Io(_)
            | HarnessError::Serialization(_) => true,
            HarnessError::Driver(err) => {
                matches!(err, DriverError::Launch(_) | DriverError::Navigation(_))
            }
            HarnessError::Timeout { .. }
            | HarnessError::ContextMismatch { .. }
            | HarnessError::MissingFixture(_) => false,
        }
    }
}
