// Core types shared by page backends

use serde::{Deserialize, Serialize};

/// Result type for page backend operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Error types for page backend operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Browser process could not be started or attached to
    #[error("Launch error: {0}")]
    Launch(String),

    /// Navigation or reload failed
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// In-page evaluation failed in a way that will not resolve by waiting
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// The DOM is not settled yet (element detached, script threw mid-render)
    #[error("Page not ready: {0}")]
    Transient(String),

    /// Screenshot capture failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Evaluation result could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DriverError {
    /// Whether a poll loop may treat this error as "condition not yet true"
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::Transient(_))
    }
}

/// Bounding rectangle of a rendered element, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl LabelRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Area shared with another rectangle (0 when disjoint)
    pub fn overlap_area(&self, other: &LabelRect) -> f64 {
        let dx = (self.right().min(other.right()) - self.left.max(other.left)).max(0.0);
        let dy = (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0);
        dx * dy
    }
}
