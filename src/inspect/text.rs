//! Response text expectations.

use serde::Serialize;

use crate::harness::QueryResponse;
use crate::model::ResponseExpectation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextCheck {
    pub pass: bool,
    pub errors: Vec<String>,
}

/// Case-insensitive substring test; an empty needle always matches
pub fn text_includes(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Evaluate every expectation; each failed condition is its own error line
pub fn check_response(response: &QueryResponse, expectation: &ResponseExpectation) -> TextCheck {
    let text = &response.response_text;
    let mut errors = Vec::new();

    if let Some(expected) = &expectation.expect_text {
        if !text_includes(text, expected) {
            errors.push(format!("response does not contain \"{}\"", expected));
        }
    }

    match (expectation.expect_sources, response.sources.len()) {
        (Some(true), 0) => errors.push("expected sources, none shown".to_string()),
        (Some(false), n) if n > 0 => errors.push(format!("expected no sources, got {}", n)),
        _ => {}
    }

    for marker in &expectation.required_markers {
        if !text_includes(text, marker) {
            errors.push(format!("response lacks marker {}", marker));
        }
    }

    for raw in &expectation.forbidden {
        if text_includes(text, raw) {
            errors.push(format!("response contains raw value {}", raw));
        }
    }

    TextCheck {
        pass: errors.is_empty(),
        errors,
    }
}
