//! Query suites: named scenario sets of (context, query, expectation) and
//! the PII redaction retest.

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::browser::PageBackend;
use crate::harness::selectors::{AUTH_MODAL, SECTOR_SELECT};
use crate::harness::{HarnessResult, QueryResponse, Session};
use crate::inspect::{check_response, text_includes};
use crate::model::{ScenarioInput, ScenarioSet, pii_scenario};

use super::types::{CheckCategory, CheckResult, RunOutcome};
use super::{Recorder, RunnerSettings};

/// Everything observed for one scenario, kept as the check detail
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioDetail<'a> {
    query: &'a str,
    expected_text: Option<&'a str>,
    expect_sources: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    upload_status: Vec<String>,
    result: &'a QueryResponse,
}

fn run_scenario<B: PageBackend>(
    session: &mut Session<B>,
    scenario: &ScenarioInput,
) -> HarnessResult<(Vec<String>, QueryResponse)> {
    session.select_context(scenario.context)?;
    let statuses = session.upload_files(&scenario.uploads)?;
    let response = session.submit_query(&scenario.query)?;
    Ok((statuses, response))
}

fn scenario_check(
    category: CheckCategory,
    label: String,
    scenario: &ScenarioInput,
    statuses: Vec<String>,
    response: &QueryResponse,
    mut errors: Vec<String>,
) -> CheckResult {
    errors.extend(check_response(response, &scenario.expectation).errors);
    let detail = ScenarioDetail {
        query: &scenario.query,
        expected_text: scenario.expectation.expect_text.as_deref(),
        expect_sources: scenario.expectation.expect_sources,
        upload_status: statuses,
        result: response,
    };
    CheckResult::new(category, label, errors)
        .in_context(scenario.context)
        .with_detail(&detail)
}

/// One named scenario set run end to end
pub struct QuerySuite {
    settings: RunnerSettings,
    set: ScenarioSet,
}

impl QuerySuite {
    pub fn new(settings: RunnerSettings, set: ScenarioSet) -> Self {
        Self { settings, set }
    }

    /// Default report name for a scenario set
    pub fn report_name(set: &str) -> String {
        format!("results_flags_{}.json", set.to_lowercase())
    }

    pub fn run<B: PageBackend>(&self, page: B) -> HarnessResult<RunOutcome> {
        let mut session = self.settings.open_session(page)?;
        self.run_in(&mut session)
    }

    pub fn run_in<B: PageBackend>(&self, session: &mut Session<B>) -> HarnessResult<RunOutcome> {
        let mut recorder = self.settings.recorder(self.set.name, self.set.name);
        recorder.metadata("scenario", json!(self.set.name));
        recorder.metadata("scenarioLabel", json!(self.set.label));
        let result = self.run_scenarios(session, &mut recorder);
        recorder.conclude(result)
    }

    fn run_scenarios<B: PageBackend>(&self, session: &mut Session<B>, recorder: &mut Recorder) -> HarnessResult<()> {
        let login = session.require_login()?;
        recorder.metadata("login", json!(login));
        session.require_control(SECTOR_SELECT)?;
        recorder.metadata("sectorOptions", json!(session.context_options()?));

        recorder.phase(&format!("Scenario {}: {}", self.set.name, self.set.label));
        for (index, scenario) in self.set.tests.iter().enumerate() {
            let label = format!("{} #{} {}: {}", self.set.name, index + 1, scenario.context, scenario.query);
            let outcome = run_scenario(session, scenario);
            if let Some((statuses, response)) = recorder.contain(session, &label, outcome)? {
                let check = scenario_check(CheckCategory::Query, label, scenario, statuses, &response, Vec::new());
                recorder.record(session, check);
            }
        }
        Ok(())
    }
}

pub const PII_REPORT_NAME: &str = "results_pii.json";

/// Status wording of an upload refused for lack of a session
const AUTH_REJECTION_WORDS: [&str; 6] = [
    "401",
    "403",
    "unauthorized",
    "forbidden",
    "authentication required",
    "access denied",
];

fn is_auth_rejection(status: &str) -> bool {
    let status = status.to_lowercase();
    AUTH_REJECTION_WORDS.iter().any(|w| status.contains(w))
}

/// A refused upload needs a fresh login when its wording says so or the
/// app reopened the login prompt
fn upload_needs_login<B: PageBackend>(session: &mut Session<B>, statuses: &[String]) -> HarnessResult<bool> {
    if statuses.iter().any(|s| is_auth_rejection(s)) {
        return Ok(true);
    }
    if statuses.iter().all(|s| text_includes(s, "ingested")) {
        return Ok(false);
    }
    Ok(session.page_mut().is_visible(AUTH_MODAL)?)
}

/// PII redaction retest: upload after a full reload, then query
pub struct PiiSuite {
    settings: RunnerSettings,
    run_label: String,
    scenario: ScenarioInput,
}

impl PiiSuite {
    pub fn new(settings: RunnerSettings, run_label: &str, fixtures_dir: &Path) -> Self {
        Self {
            settings,
            run_label: run_label.to_string(),
            scenario: pii_scenario(run_label, fixtures_dir),
        }
    }

    /// Fixture uploaded before the query
    pub fn fixture(&self) -> Option<&PathBuf> {
        self.scenario.uploads.first()
    }

    pub fn run<B: PageBackend>(&self, page: B) -> HarnessResult<RunOutcome> {
        let mut session = self.settings.open_session(page)?;
        self.run_in(&mut session)
    }

    pub fn run_in<B: PageBackend>(&self, session: &mut Session<B>) -> HarnessResult<RunOutcome> {
        let mut recorder = self.settings.recorder(&self.run_label, "PII_retest");
        let result = self.run_retest(session, &mut recorder);
        recorder.conclude(result)
    }

    fn run_retest<B: PageBackend>(&self, session: &mut Session<B>, recorder: &mut Recorder) -> HarnessResult<()> {
        let login = session.require_login()?;
        recorder.metadata("login", json!(login));

        // The suite uploads after a full page reload
        session.reset_to_baseline()?;
        tracing::info!("post-reload auth ok");

        let label = format!("PII redaction retest ({})", self.run_label);
        recorder.phase(&label);
        let outcome = self.upload_and_query(session);
        if let Some((statuses, response)) = recorder.contain(session, &label, outcome)? {
            let errors = statuses
                .iter()
                .filter(|s| !text_includes(s, "ingested"))
                .map(|s| format!("PII upload did not succeed: {}", s))
                .collect();
            let check = scenario_check(CheckCategory::Pii, label, &self.scenario, statuses, &response, errors);
            recorder.record(session, check);
        }
        Ok(())
    }

    fn upload_and_query<B: PageBackend>(&self, session: &mut Session<B>) -> HarnessResult<(Vec<String>, QueryResponse)> {
        session.select_context(self.scenario.context)?;
        let mut statuses = session.upload_files(&self.scenario.uploads)?;
        if upload_needs_login(session, &statuses)? {
            tracing::warn!(?statuses, "upload refused, logging in again");
            session.require_login()?;
            statuses = session.upload_files(&self.scenario.uploads)?;
        }
        let response = session.submit_query(&self.scenario.query)?;
        Ok((statuses, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_rejection_wording() {
        assert!(is_auth_rejection("HTTP 401: session expired"));
        assert!(is_auth_rejection("Upload failed: Forbidden"));
        assert!(is_auth_rejection("Upload failed\nAuthentication required"));
        assert!(is_auth_rejection("Upload failed: Access denied"));
        assert!(!is_auth_rejection("Ingested pii_test_mask.txt"));
    }

    #[test]
    fn test_report_name() {
        assert_eq!(QuerySuite::report_name("CRAG_SELFRAG"), "results_flags_crag_selfrag.json");
    }
}
