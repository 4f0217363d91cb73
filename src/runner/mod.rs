//! Scenario runners: compose session, actions and inspectors into suites
//! that record one check result per assertion point.
//!
//! Error policy shared by every suite:
//! - an assertion failure is data, recorded as a failing check
//! - a scenario error (timeout, context mismatch, missing fixture) is
//!   recorded as a failing `scenario-error` check and the run moves on
//! - a fatal error (login rejected, required control missing, target
//!   unreachable) stops the run once the report has been written

pub mod console;
pub mod graph_styles;
pub mod queries;
pub mod types;
pub mod uploads;

pub use graph_styles::{GraphStyleSuite, Phase, PhaseLog};
pub use queries::{PII_REPORT_NAME, PiiSuite, QuerySuite};
pub use types::{CheckCategory, CheckResult, RunOutcome, RunReport, Summary};
pub use uploads::{UPLOADS_REPORT_NAME, UploadSecuritySuite};

use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::ArtifactStore;
use crate::browser::PageBackend;
use crate::config::{Config, SettleDelays, Timeouts};
use crate::harness::wait::DEFAULT_POLL_INTERVAL;
use crate::harness::{HarnessError, HarnessResult, Session, Target};

/// Everything a suite needs besides its own inputs
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub target: Target,
    pub report_path: PathBuf,
    pub screenshot_dir: PathBuf,
    pub annotate_screenshots: bool,
    pub timeouts: Timeouts,
    pub delays: SettleDelays,
    pub poll_interval: Duration,
}

impl RunnerSettings {
    /// Settings from the global config; `default_report` names the report
    /// when `OUTPUT_JSON` is unset
    pub fn from_config(config: &Config, default_report: &str) -> Self {
        Self {
            target: Target::new(
                config.target.base_url.clone(),
                config.target.admin_user.clone(),
                config.target.admin_pass.clone(),
            ),
            report_path: config.output.report_path(default_report),
            screenshot_dir: config.output.screenshot_dir.clone(),
            annotate_screenshots: config.output.annotate_screenshots,
            timeouts: config.timeouts,
            delays: config.delays,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Navigate a fresh page to the target
    pub fn open_session<B: PageBackend>(&self, page: B) -> HarnessResult<Session<B>> {
        Ok(
            Session::establish(page, self.target.clone(), self.timeouts, self.delays)?
                .with_poll_interval(self.poll_interval),
        )
    }

    pub(crate) fn recorder(&self, run_label: &str, prefix: &str) -> Recorder {
        let report = RunReport::new(run_label, self.target.base_url.clone());
        Recorder {
            store: ArtifactStore::new(
                self.report_path.clone(),
                self.screenshot_dir.clone(),
                prefix,
                self.annotate_screenshots,
                report,
            ),
        }
    }
}

/// Artifact store plus console echo, owned by one suite run
pub(crate) struct Recorder {
    store: ArtifactStore,
}

impl Recorder {
    pub(crate) fn phase(&self, title: &str) {
        tracing::info!(phase = title, "starting phase");
        if let Err(err) = console::phase(&mut io::stdout(), title) {
            tracing::debug!(%err, "console write failed");
        }
    }

    pub(crate) fn metadata(&mut self, key: &str, value: Value) {
        self.store.set_metadata(key, value);
    }

    /// Record a check, screenshotting the page first when it failed
    pub(crate) fn record<B: PageBackend>(&mut self, session: &mut Session<B>, check: CheckResult) -> CheckResult {
        let png = if check.pass {
            None
        } else {
            match session.page_mut().screenshot_png() {
                Ok(png) => Some(png),
                Err(err) => {
                    tracing::warn!(label = %check.label, %err, "failure screenshot not taken");
                    None
                }
            }
        };
        let check = self.store.record(check, png);
        if let Err(err) = console::check(&mut io::stdout(), &check) {
            tracing::debug!(%err, "console write failed");
        }
        check
    }

    /// Save a screenshot that belongs to no check
    pub(crate) fn capture<B: PageBackend>(&mut self, session: &mut Session<B>, label: &str) {
        match session.page_mut().screenshot_png() {
            Ok(png) => {
                self.store.capture(label, &png);
            }
            Err(err) => tracing::warn!(%label, %err, "screenshot not taken"),
        }
    }

    /// Scenario boundary: fatal errors pass through, everything else
    /// becomes a failing `scenario-error` check
    pub(crate) fn contain<B: PageBackend, T>(
        &mut self,
        session: &mut Session<B>,
        label: &str,
        result: HarnessResult<T>,
    ) -> HarnessResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(%label, %err, "scenario aborted");
                self.record(session, CheckResult::scenario_error(label, &err));
                Ok(None)
            }
        }
    }

    /// Close the report; a fatal error is stored in it before it is written
    pub(crate) fn finish(mut self, fatal: Option<&HarnessError>) -> RunOutcome {
        if let Some(err) = fatal {
            tracing::error!(%err, "run aborted");
            self.store.set_metadata("fatalError", Value::from(err.to_string()));
        }
        let outcome = self.store.finish();
        if let Err(err) = console::summary(&mut io::stdout(), &outcome) {
            tracing::debug!(%err, "console write failed");
        }
        outcome
    }

    /// Finish with the body's result: the outcome, or the fatal error
    pub(crate) fn conclude(self, result: HarnessResult<()>) -> HarnessResult<RunOutcome> {
        match result {
            Ok(()) => Ok(self.finish(None)),
            Err(err) => {
                self.finish(Some(&err));
                Err(err)
            }
        }
    }
}
