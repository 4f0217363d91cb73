//! Computed custom property inspector.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::browser::{DriverResult, PageBackend};
use crate::inspect::color::normalize_color;
use crate::model::{Expectation, StyleModel, Theme};

/// Outcome of comparing root custom properties against the style model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssCheck {
    pub pass: bool,
    pub errors: Vec<String>,
    /// Raw values read from the page (`None` when empty or undefined)
    pub actual: BTreeMap<String, Option<String>>,
}

/// Read every property the model names for `theme` and compare.
///
/// The caller is responsible for having switched the page to `theme`.
pub fn check_css_variables<B: PageBackend + ?Sized>(
    page: &mut B,
    theme: Theme,
    model: &StyleModel,
) -> DriverResult<CssCheck> {
    let mut names = model.property_names(theme);
    for stale in model.stale_values(theme) {
        if !names.contains(&stale.property) {
            names.push(stale.property);
        }
    }
    let actual = page.computed_properties(&names)?;
    Ok(evaluate_css(theme, model, actual))
}

/// Compare already-read values; one error line per offending property
pub fn evaluate_css(
    theme: Theme,
    model: &StyleModel,
    actual: BTreeMap<String, Option<String>>,
) -> CssCheck {
    let mut errors = Vec::new();

    for (name, expectation) in model.properties(theme) {
        let value = actual.get(*name).cloned().flatten();
        let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
        match (expectation, value) {
            (_, None) => errors.push(format!("{}: CSS var {} is missing", theme, name)),
            (Expectation::Exists, Some(_)) => {}
            (Expectation::Equals(expected), Some(found)) => {
                if normalize_color(found) != normalize_color(expected) {
                    errors.push(format!(
                        "{}: {} expected={} actual={}",
                        theme, name, expected, found
                    ));
                }
            }
        }
    }

    for stale in model.stale_values(theme) {
        let found = actual.get(stale.property).cloned().flatten();
        let Some(found) = found else { continue };
        if normalize_color(&found) == normalize_color(stale.value) {
            errors.push(format!(
                "{}: STALE value detected for {}: {} (matches {})",
                theme, stale.property, found, stale.label
            ));
        }
    }

    CssCheck {
        pass: errors.is_empty(),
        errors,
        actual,
    }
}
