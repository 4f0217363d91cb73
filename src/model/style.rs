//! Expected style model: custom properties per theme, the canonical entity
//! palette and stale values that must never come back.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::Theme;

/// Requirement on one custom property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Must normalize to this color
    Equals(String),
    /// Must be non-empty
    Exists,
}

/// A previously shipped value guarded against on one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleValue {
    /// Name recorded in the error message
    pub label: &'static str,
    pub value: &'static str,
    /// Property the stale value is checked against
    pub property: &'static str,
    pub theme: Theme,
}

#[derive(Debug, Clone)]
pub struct StyleModel {
    dark: BTreeMap<&'static str, Expectation>,
    light: BTreeMap<&'static str, Expectation>,
    entity_colors: BTreeMap<&'static str, &'static str>,
    stale: Vec<StaleValue>,
}

/// Category used for entity types the palette does not name
pub const DEFAULT_CATEGORY: &str = "DEFAULT";

fn equals(hex: &str) -> Expectation {
    Expectation::Equals(hex.to_string())
}

static MODEL: Lazy<StyleModel> = Lazy::new(|| {
    let dark = BTreeMap::from([
        ("--accent-primary", equals("#2a6a9e")),
        ("--accent-subtle", Expectation::Exists),
        ("--accent-glow", Expectation::Exists),
        ("--accent-border", Expectation::Exists),
        ("--accent-emphasis", Expectation::Exists),
        ("--graph-center-node", equals("#475569")),
        ("--graph-source-node", equals("#4a7c59")),
        ("--graph-entity-node", equals("#92754c")),
    ]);
    let light = BTreeMap::from([
        ("--graph-center-node", equals("#64748b")),
        ("--graph-source-node", equals("#6b9e7a")),
        ("--graph-entity-node", equals("#b8976a")),
    ]);
    // Okabe-Ito derived palette
    let entity_colors = BTreeMap::from([
        ("PERSON", "#0077bb"),
        ("ORGANIZATION", "#ee7733"),
        ("LOCATION", "#009988"),
        ("TECHNICAL", "#D55E00"),
        ("TECHNOLOGY", "#D55E00"),
        ("EVENT", "#CC79A7"),
        ("DOCUMENT", "#56B4E9"),
        ("DATE", "#33bbee"),
        ("REFERENCE", "#F0E442"),
        (DEFAULT_CATEGORY, "#999999"),
    ]);
    let stale = vec![
        StaleValue {
            label: "--accent-primary-dark-old",
            value: "#60a5fa",
            property: "--accent-primary",
            theme: Theme::Dark,
        },
        StaleValue {
            label: "--accent-hover-dark-old",
            value: "#93c5fd",
            property: "--accent-primary",
            theme: Theme::Dark,
        },
    ];
    StyleModel {
        dark,
        light,
        entity_colors,
        stale,
    }
});

/// The built-in expected style model
pub fn style_model() -> &'static StyleModel {
    &MODEL
}

impl StyleModel {
    /// Property expectations for a theme, sorted by property name
    pub fn properties(&self, theme: Theme) -> &BTreeMap<&'static str, Expectation> {
        match theme {
            Theme::Dark => &self.dark,
            Theme::Light => &self.light,
        }
    }

    pub fn property_names(&self, theme: Theme) -> Vec<&'static str> {
        self.properties(theme).keys().copied().collect()
    }

    /// Canonical palette keyed by upper-case entity category
    pub fn entity_colors(&self) -> &BTreeMap<&'static str, &'static str> {
        &self.entity_colors
    }

    /// Expected color for a category; unknown categories fall back to DEFAULT
    pub fn entity_color(&self, category: &str) -> &'static str {
        self.entity_colors
            .get(category.to_uppercase().as_str())
            .or_else(|| self.entity_colors.get(DEFAULT_CATEGORY))
            .copied()
            .unwrap_or("#999999")
    }

    /// Stale values checked under a theme
    pub fn stale_values(&self, theme: Theme) -> impl Iterator<Item = &StaleValue> {
        self.stale.iter().filter(move |s| s.theme == theme)
    }
}
