//! Entity palette inspector.
//!
//! The page must expose exactly one palette object. A second global with
//! equal colors but its own identity is drift waiting to happen, so the
//! alias is checked by reference, not by value.

use serde::Serialize;
use serde_json::Value;

use crate::browser::{DriverResult, Introspect};
use crate::harness::selectors::{ENTITY_PALETTE_ALIAS, ENTITY_PALETTE_GLOBAL};
use crate::inspect::color::colors_equal;
use crate::model::StyleModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteMismatch {
    #[serde(rename = "type")]
    pub category: String,
    pub expected: String,
    /// `MISSING` when the page palette lacks the category
    pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteCheck {
    pub found: bool,
    pub mismatches: Vec<PaletteMismatch>,
    /// Alias is the canonical object; `None` when no alias is defined
    pub uses_unified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Value>,
    #[serde(skip)]
    pub errors: Vec<String>,
}

impl PaletteCheck {
    pub fn pass(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compare the page palette with the canonical one and check alias identity
pub fn check_palette<P: Introspect + ?Sized>(page: &mut P, model: &StyleModel) -> DriverResult<PaletteCheck> {
    let Some(palette) = page.read_global(ENTITY_PALETTE_GLOBAL)? else {
        return Ok(PaletteCheck {
            found: false,
            mismatches: Vec::new(),
            uses_unified: None,
            palette: None,
            errors: vec![format!("{} not defined on page", ENTITY_PALETTE_GLOBAL)],
        });
    };

    let mismatches = palette_mismatches(&palette, model);
    let uses_unified = page.same_global(ENTITY_PALETTE_ALIAS, ENTITY_PALETTE_GLOBAL)?;

    let mut errors: Vec<String> = mismatches
        .iter()
        .map(|m| {
            format!(
                "Entity color mismatch: {} expected={} actual={}",
                m.category, m.expected, m.actual
            )
        })
        .collect();
    if uses_unified == Some(false) {
        errors.push(format!(
            "{} is NOT the unified {} (duplicate palette detected)",
            ENTITY_PALETTE_ALIAS, ENTITY_PALETTE_GLOBAL
        ));
    }

    Ok(PaletteCheck {
        found: true,
        mismatches,
        uses_unified,
        palette: Some(palette),
        errors,
    })
}

/// Every canonical category whose page color is missing or different
pub fn palette_mismatches(palette: &Value, model: &StyleModel) -> Vec<PaletteMismatch> {
    model
        .entity_colors()
        .iter()
        .filter_map(|(category, expected)| {
            let actual = palette
                .get(*category)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty());
            match actual {
                Some(actual) if colors_equal(actual, expected) => None,
                Some(actual) => Some(PaletteMismatch {
                    category: category.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                }),
                None => Some(PaletteMismatch {
                    category: category.to_string(),
                    expected: expected.to_string(),
                    actual: "MISSING".to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockPage;
    use crate::model::style_model;
    use serde_json::json;

    fn canonical() -> Value {
        let map: serde_json::Map<String, Value> = style_model()
            .entity_colors()
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v.to_lowercase())))
            .collect();
        Value::Object(map)
    }

    #[test]
    fn test_unified_palette_passes() {
        let mut page = MockPage::new()
            .with_global(ENTITY_PALETTE_GLOBAL, canonical())
            .with_alias(ENTITY_PALETTE_ALIAS, ENTITY_PALETTE_GLOBAL);
        let check = check_palette(&mut page, style_model()).unwrap();
        assert!(check.pass(), "{:?}", check.errors);
        assert_eq!(check.uses_unified, Some(true));
    }

    #[test]
    fn test_equal_copy_is_flagged() {
        let mut page = MockPage::new()
            .with_global(ENTITY_PALETTE_GLOBAL, canonical())
            .with_global(ENTITY_PALETTE_ALIAS, canonical());
        let check = check_palette(&mut page, style_model()).unwrap();
        assert!(check.mismatches.is_empty());
        assert!(!check.pass());
        assert!(check.errors[0].contains("duplicate palette detected"));
    }

    #[test]
    fn test_missing_and_wrong_colors() {
        let mut palette = canonical();
        palette["PERSON"] = json!("#ff0000");
        palette.as_object_mut().unwrap().remove("DATE");
        let mismatches = palette_mismatches(&palette, style_model());
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches.iter().any(|m| m.category == "DATE" && m.actual == "MISSING"));
        assert!(mismatches.iter().any(|m| m.category == "PERSON" && m.actual == "#ff0000"));
    }

    #[test]
    fn test_palette_absent() {
        let mut page = MockPage::new();
        let check = check_palette(&mut page, style_model()).unwrap();
        assert!(!check.found);
        assert_eq!(check.errors, vec!["entityTypeColors not defined on page".to_string()]);
    }
}
