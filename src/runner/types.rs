//! Types for run results.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::{ContextId, Theme};

/// Kind of assertion a check result records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    Css,
    QueryGraph,
    EntityGraph,
    EntityGraphSector,
    ThemeRestore,
    Query,
    Pii,
    /// Upload accepted or refused by file type
    Upload,
    /// External-origin requests seen by the page
    Airgap,
    /// A scenario aborted by a timeout or context mismatch
    ScenarioError,
}

/// One recorded assertion outcome.
///
/// `pass` is derived from `errors` at construction; results are never
/// mutated after the artifact store records them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    #[serde(rename = "type")]
    pub category: CheckCategory,
    pub label: String,
    pub pass: bool,
    pub errors: Vec<String>,
    #[serde(rename = "sector", skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl CheckResult {
    pub fn new(category: CheckCategory, label: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            category,
            label: label.into(),
            pass: errors.is_empty(),
            errors,
            context: None,
            theme: None,
            detail: Value::Null,
            screenshot: None,
        }
    }

    pub fn in_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    pub fn under_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Attach a serializable detail payload (`null` on serialization failure)
    pub fn with_detail<T: Serialize>(mut self, detail: &T) -> Self {
        self.detail = serde_json::to_value(detail).unwrap_or(Value::Null);
        self
    }

    pub(crate) fn with_screenshot(mut self, path: PathBuf) -> Self {
        self.screenshot = Some(path);
        self
    }

    /// Failing check standing in for a scenario that could not finish
    pub fn scenario_error(label: impl Into<String>, error: &dyn std::fmt::Display) -> Self {
        Self::new(CheckCategory::ScenarioError, label, vec![error.to_string()])
    }
}

/// Pass/fail counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(checks: &[CheckResult]) -> Self {
        let passed = checks.iter().filter(|c| c.pass).count();
        Self {
            total: checks.len(),
            passed,
            failed: checks.len() - passed,
        }
    }
}

fn rfc3339<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339())
}

fn rfc3339_opt<S: Serializer>(time: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => rfc3339(t, s),
        None => s.serialize_none(),
    }
}

/// Ordered check results plus run metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_label: String,
    #[serde(serialize_with = "rfc3339")]
    pub run_start: DateTime<Utc>,
    #[serde(serialize_with = "rfc3339_opt", skip_serializing_if = "Option::is_none")]
    pub run_end: Option<DateTime<Utc>>,
    pub base_url: String,
    pub host: String,
    /// Suite specific facts (login outcome, context options, scenario label)
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
    tests: Vec<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl RunReport {
    pub fn new(run_label: impl Into<String>, base_url: impl Into<String>) -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            run_label: run_label.into(),
            run_start: Utc::now(),
            run_end: None,
            base_url: base_url.into(),
            host,
            metadata: BTreeMap::new(),
            tests: Vec::new(),
            summary: None,
        }
    }

    /// Recorded checks in order
    pub fn tests(&self) -> &[CheckResult] {
        &self.tests
    }

    pub(crate) fn append(&mut self, check: CheckResult) {
        self.tests.push(check);
    }

    pub(crate) fn close(&mut self) -> Summary {
        let summary = Summary::of(&self.tests);
        self.run_end = Some(Utc::now());
        self.summary = Some(summary);
        summary
    }
}

/// What a finished run hands back to the process boundary
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub report_path: PathBuf,
    pub summary: Summary,
    /// Label and errors of every failing check
    pub failures: Vec<(String, Vec<String>)>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.summary.failed == 0
    }

    /// 0 only when every check passed
    pub fn exit_code(&self) -> u8 {
        if self.success() { 0 } else { 1 }
    }
}
