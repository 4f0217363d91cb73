//! Upload security suite: the upload control must accept a plain document
//! and refuse spoofed content and blocked file types. Ends with the air-gap
//! guard over everything the page fetched during the run.

use serde_json::json;
use std::path::Path;

use crate::browser::PageBackend;
use crate::harness::selectors::FILE_INPUT;
use crate::harness::{HarnessError, HarnessResult, Session};
use crate::inspect::{check_airgap, text_includes};
use crate::model::{ContextId, UploadCase, UploadVerdict, upload_security_cases};

use super::types::{CheckCategory, CheckResult, RunOutcome};
use super::{Recorder, RunnerSettings};

pub const UPLOADS_RUN_LABEL: &str = "UPLOAD_SECURITY";
pub const UPLOADS_REPORT_NAME: &str = "results_upload_security.json";
const SCREENSHOT_PREFIX: &str = "upload";
const AIRGAP_LABEL: &str = "Air-gap network guard";

/// Errors for a status that does not match the expected verdict
fn verdict_errors(case: &UploadCase, status: &str) -> Vec<String> {
    let wording = case.verdict.wording();
    if wording.iter().any(|w| text_includes(status, w)) {
        return Vec::new();
    }
    let expected = match case.verdict {
        UploadVerdict::Accepted => "ingestion",
        UploadVerdict::Refused => "refusal",
    };
    vec![format!("expected {} ({}), status was {:?}", expected, wording.join("/"), status)]
}

pub struct UploadSecuritySuite {
    settings: RunnerSettings,
    cases: Vec<UploadCase>,
}

impl UploadSecuritySuite {
    pub fn new(settings: RunnerSettings, fixtures_dir: &Path) -> Self {
        Self {
            settings,
            cases: upload_security_cases(fixtures_dir),
        }
    }

    pub fn cases(&self) -> &[UploadCase] {
        &self.cases
    }

    pub fn run<B: PageBackend>(&self, page: B) -> HarnessResult<RunOutcome> {
        let mut session = self.settings.open_session(page)?;
        self.run_in(&mut session)
    }

    pub fn run_in<B: PageBackend>(&self, session: &mut Session<B>) -> HarnessResult<RunOutcome> {
        let mut recorder = self.settings.recorder(UPLOADS_RUN_LABEL, SCREENSHOT_PREFIX);
        let result = self.run_cases(session, &mut recorder);
        recorder.conclude(result)
    }

    fn run_cases<B: PageBackend>(&self, session: &mut Session<B>, recorder: &mut Recorder) -> HarnessResult<()> {
        let login = session.require_login()?;
        recorder.metadata("login", json!(login));
        session.require_control(FILE_INPUT)?;

        recorder.phase("Upload type enforcement");
        for case in &self.cases {
            let uploaded = session
                .select_context(ContextId::Enterprise)
                .and_then(|()| session.upload_file(&case.file));
            if let Some(status) = recorder.contain(session, case.label, uploaded)? {
                let check = CheckResult::new(CheckCategory::Upload, case.label, verdict_errors(case, &status))
                    .in_context(ContextId::Enterprise)
                    .with_detail(&json!({
                        "file": file_name(&case.file),
                        "verdict": case.verdict,
                        "statusText": status,
                    }));
                recorder.record(session, check);
            }
        }

        recorder.phase(AIRGAP_LABEL);
        let base_url = session.target().base_url.clone();
        let guarded = check_airgap(session.page_mut(), &base_url).map_err(HarnessError::from);
        if let Some(airgap) = recorder.contain(session, AIRGAP_LABEL, guarded)? {
            if !airgap.pass {
                tracing::error!(blocked = airgap.blocked_count, "page fetched external origins");
            }
            let check = CheckResult::new(CheckCategory::Airgap, AIRGAP_LABEL, airgap.errors.clone()).with_detail(&airgap);
            recorder.record(session, check);
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_wording_satisfies_refused_cases() {
        let cases = upload_security_cases(Path::new("fixtures"));
        assert!(verdict_errors(&cases[0], "1 file ingested").is_empty());
        assert!(verdict_errors(&cases[1], "Upload failed: content does not match extension").is_empty());
        assert!(verdict_errors(&cases[2], "Unsupported file type .ps1").is_empty());
    }

    #[test]
    fn test_mismatched_status_is_reported() {
        let cases = upload_security_cases(Path::new("fixtures"));
        assert_eq!(
            verdict_errors(&cases[2], "1 file ingested"),
            vec!["expected refusal (failed/blocked/unsupported), status was \"1 file ingested\"".to_string()]
        );
        assert_eq!(
            verdict_errors(&cases[0], "Upload failed"),
            vec!["expected ingestion (ingested), status was \"Upload failed\"".to_string()]
        );
    }
}
