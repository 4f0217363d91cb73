//! Reference data the harness checks the application against.

pub mod scenarios;
pub mod style;

pub use scenarios::{
    ContextPlan, ResponseExpectation, ScenarioInput, ScenarioSet, UploadCase, UploadVerdict,
    graph_style_plans, pii_scenario, scenario_set, scenario_set_names, upload_security_cases,
};
pub use style::{Expectation, StaleValue, StyleModel, style_model};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named visual mode selected through the root `data-theme` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Dark, Theme::Light];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The other theme
    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Operating context ("sector") of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContextId {
    Enterprise,
    Government,
    Medical,
    Finance,
    Academic,
}

impl ContextId {
    pub const ALL: [ContextId; 5] = [
        ContextId::Enterprise,
        ContextId::Government,
        ContextId::Medical,
        ContextId::Finance,
        ContextId::Academic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextId::Enterprise => "ENTERPRISE",
            ContextId::Government => "GOVERNMENT",
            ContextId::Medical => "MEDICAL",
            ContextId::Finance => "FINANCE",
            ContextId::Academic => "ACADEMIC",
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        ContextId::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("unknown context '{}'", s))
    }
}

/// Graph panel tab, keyed by `data-graph-tab`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphTab {
    Query,
    Entity,
}

impl GraphTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphTab::Query => "query",
            GraphTab::Entity => "entity",
        }
    }
}

/// Entity graph scope, keyed by `data-entity-graph-mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityGraphMode {
    /// Entities of the last response
    Context,
    /// Every entity in the active context
    Sector,
}

impl EntityGraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityGraphMode::Context => "context",
            EntityGraphMode::Sector => "sector",
        }
    }
}
