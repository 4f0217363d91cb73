//! Artifact store: the run report and failure screenshots.
//!
//! The report is rewritten after every recorded check so an aborted run
//! still leaves everything observed so far on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::annotate::annotate_png;
use crate::runner::types::{CheckResult, RunOutcome, RunReport};

/// Longest label fragment kept in a screenshot file name
const MAX_NAME_LEN: usize = 80;

pub struct ArtifactStore {
    report_path: PathBuf,
    screenshot_dir: PathBuf,
    prefix: String,
    annotate: bool,
    report: RunReport,
}

impl ArtifactStore {
    pub fn new(
        report_path: impl Into<PathBuf>,
        screenshot_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        annotate: bool,
        report: RunReport,
    ) -> Self {
        Self {
            report_path: report_path.into(),
            screenshot_dir: screenshot_dir.into(),
            prefix: prefix.into(),
            annotate,
            report,
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Add a run-level fact and flush
    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.report.metadata.insert(key.to_string(), value);
        self.flush();
    }

    /// Append a check, saving `png` first when the check failed
    pub fn record(&mut self, check: CheckResult, png: Option<Vec<u8>>) -> CheckResult {
        let check = match png.filter(|_| !check.pass) {
            Some(png) => match self.capture(&check.label, &png) {
                Some(path) => check.with_screenshot(path),
                None => check,
            },
            None => check,
        };

        if check.pass {
            tracing::info!(label = %check.label, "check passed");
        } else {
            tracing::warn!(label = %check.label, errors = ?check.errors, "check failed");
        }

        self.report.append(check.clone());
        self.flush();
        check
    }

    /// Write a screenshot named after `label`; `None` when it could not be saved
    pub fn capture(&self, label: &str, png: &[u8]) -> Option<PathBuf> {
        let path = self.screenshot_dir.join(screenshot_name(
            &self.prefix,
            label,
            Utc::now().timestamp_millis(),
        ));
        let bytes = if self.annotate {
            annotate_png(png, label)
        } else {
            png.to_vec()
        };
        let written = fs::create_dir_all(&self.screenshot_dir).and_then(|_| fs::write(&path, bytes));
        match written {
            Ok(()) => Some(path),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not write screenshot");
                None
            }
        }
    }

    /// Stamp the end time and summary, write the final report
    pub fn finish(mut self) -> RunOutcome {
        let summary = self.report.close();
        self.flush();
        let failures = self
            .report
            .tests()
            .iter()
            .filter(|c| !c.pass)
            .map(|c| (c.label.clone(), c.errors.clone()))
            .collect();
        RunOutcome {
            report_path: self.report_path,
            summary,
            failures,
        }
    }

    fn flush(&self) {
        let written = serde_json::to_string_pretty(&self.report)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.report_path, json)
            });
        if let Err(err) = written {
            tracing::warn!(path = %self.report_path.display(), %err, "could not write report");
        }
    }
}

/// `<prefix>_<label>_<epoch ms>.png` with the label made filesystem-safe
pub fn screenshot_name(prefix: &str, label: &str, epoch_ms: i64) -> String {
    format!("{}_{}_{}.png", prefix, sanitize_name(label), epoch_ms)
}

/// Collapse every run of characters outside `[A-Za-z0-9_-]` into one `_`
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => out.push(c),
            _ if out.ends_with('_') => {}
            _ => out.push('_'),
        }
    }
    out.chars().take(MAX_NAME_LEN).collect()
}
