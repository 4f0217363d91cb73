//! Static scenario matrices: per-context graph-style plans, named query
//! scenario sets, the PII redaction scenario and the upload-type cases.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::ContextId;

/// What a query response must (and must not) contain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseExpectation {
    /// Case-insensitive substring the response must contain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect_text: Option<String>,
    /// Sources must be present (`true`) or absent (`false`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect_sources: Option<bool>,
    /// Case-insensitive markers that must all appear
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_markers: Vec<String>,
    /// Raw values that must never appear
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbidden: Vec<String>,
}

impl ResponseExpectation {
    pub fn text(expected: &str) -> Self {
        Self {
            expect_text: Some(expected.to_string()),
            ..Self::default()
        }
    }

    pub fn sources() -> Self {
        Self {
            expect_sources: Some(true),
            ..Self::default()
        }
    }
}

/// One (context, query, expectation, uploads) tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    pub context: ContextId,
    pub query: String,
    pub expectation: ResponseExpectation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<PathBuf>,
}

impl ScenarioInput {
    pub fn new(context: ContextId, query: &str, expectation: ResponseExpectation) -> Self {
        Self {
            context,
            query: query.to_string(),
            expectation,
            uploads: Vec::new(),
        }
    }

    pub fn with_upload(mut self, path: PathBuf) -> Self {
        self.uploads.push(path);
        self
    }
}

/// Named list of query scenarios exercised under one retrieval-flag setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSet {
    pub name: &'static str,
    pub label: &'static str,
    pub tests: Vec<ScenarioInput>,
}

/// Per-context plan for the graph-style suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextPlan {
    pub context: ContextId,
    pub query: &'static str,
    /// Seed documents, relative to the test documents directory
    pub uploads: &'static [&'static str],
}

pub fn graph_style_plans() -> Vec<ContextPlan> {
    vec![
        ContextPlan {
            context: ContextId::Enterprise,
            query: "Summarize the Enterprise Compliance Audit report.",
            uploads: &["enterprise_compliance_audit.txt", "enterprise_transformation.txt"],
        },
        ContextPlan {
            context: ContextId::Government,
            query: "Summarize Operation Diamond Shield.",
            uploads: &["defense_diamond_shield.txt", "defense_cybersecurity.txt"],
        },
        ContextPlan {
            context: ContextId::Medical,
            query: "Summarize the clinical trial findings.",
            uploads: &["medical_clinical_trial.txt", "medical_patient_outcomes.txt"],
        },
        ContextPlan {
            context: ContextId::Finance,
            query: "Summarize the Q4 earnings report.",
            uploads: &["finance_earnings_q4.txt", "finance_portfolio_analysis.txt"],
        },
        ContextPlan {
            context: ContextId::Academic,
            query: "Summarize the research program goals.",
            uploads: &["academic_research_program.txt", "academic_publications_review.txt"],
        },
    ]
}

const SET_NAMES: [&str; 9] = [
    "HYDE",
    "SELFRAG",
    "AGENTIC",
    "QUCORAG",
    "CRAG",
    "HYDE_QUCORAG",
    "CRAG_SELFRAG",
    "AGENTIC_HYDE",
    "CRAG_QUCORAG",
];

pub fn scenario_set_names() -> &'static [&'static str] {
    &SET_NAMES
}

/// Look up a query scenario set by (case-insensitive) name
pub fn scenario_set(name: &str) -> Option<ScenarioSet> {
    use ContextId::*;
    use ResponseExpectation as E;

    let q = ScenarioInput::new;
    let enterprise_budget = || q(Enterprise, "What is the total program budget?", E::text("$150 Million"));
    let finance_revenue = || q(Finance, "What was total revenue for Q4 2025?", E::text("$850 Million"));
    let academic_budget = || q(Academic, "What is the total program budget?", E::text("$18.7M"));
    let naisr = || {
        q(
            Academic,
            "Summarize the NAISR-2024 program, key publications, and funding sources.",
            E::text("NAISR-2024"),
        )
    };
    let technology = || q(Enterprise, "Remember the document about technology initiatives", E::sources());

    let name = name.trim().to_uppercase();
    let (name, label, tests) = match name.as_str() {
        "HYDE" => (
            "HYDE",
            "HyDE enabled",
            vec![
                q(Enterprise, "That one report about the budget", E::sources()),
                technology(),
                q(Enterprise, "The thing with the transformation roadmap", E::text("Transformation")),
            ],
        ),
        "SELFRAG" => (
            "SELFRAG",
            "SelfRAG enabled",
            vec![enterprise_budget(), finance_revenue(), academic_budget()],
        ),
        "AGENTIC" => (
            "AGENTIC",
            "Agentic enabled",
            vec![
                q(
                    Enterprise,
                    "How does the transformation roadmap affect vendor strategy for 2026?",
                    E::text("vendor"),
                ),
                q(
                    Government,
                    "How do zero-trust measures relate to Operation Diamond Shield objectives?",
                    E::text("zero"),
                ),
            ],
        ),
        "QUCORAG" => ("QUCORAG", "QuCoRAG enabled", vec![naisr(), enterprise_budget()]),
        "CRAG" => (
            "CRAG",
            "CRAG enabled",
            vec![
                finance_revenue(),
                q(Government, "Who was the Exercise Director?", E::text("Colonel James Morrison")),
            ],
        ),
        "HYDE_QUCORAG" => ("HYDE_QUCORAG", "HyDE + QuCoRAG enabled", vec![technology(), naisr()]),
        "CRAG_SELFRAG" => (
            "CRAG_SELFRAG",
            "CRAG + SelfRAG enabled",
            vec![enterprise_budget(), finance_revenue()],
        ),
        "AGENTIC_HYDE" => (
            "AGENTIC_HYDE",
            "Agentic + HyDE enabled",
            vec![
                q(
                    Enterprise,
                    "Remember how the transformation roadmap affected vendor planning",
                    E::sources(),
                ),
                q(Government, "Remember the chain of events affecting compliance", E::sources()),
            ],
        ),
        "CRAG_QUCORAG" => (
            "CRAG_QUCORAG",
            "CRAG + QuCoRAG enabled",
            vec![finance_revenue(), academic_budget()],
        ),
        _ => return None,
    };
    Some(ScenarioSet { name, label, tests })
}

pub const PII_QUERY: &str = "List the SSN, email, phone, and address from the PII test record.";
pub const MASK_MARKER: &str = "[REDACTED-SSN]";
pub const TOKEN_MARKER: &str = "<<TOK:SSN:";
pub const RAW_SSN: &str = "123-45-6789";
pub const RAW_EMAIL: &str = "john.doe@example.com";

/// PII redaction scenario; labels containing `TOKEN` switch to tokenization
pub fn pii_scenario(run_label: &str, fixtures_dir: &Path) -> ScenarioInput {
    let tokenize = run_label.to_uppercase().contains("TOKEN");
    let (fixture, marker) = if tokenize {
        ("pii_test_tokenize.txt", TOKEN_MARKER)
    } else {
        ("pii_test_mask.txt", MASK_MARKER)
    };
    let expectation = ResponseExpectation {
        required_markers: vec![marker.to_string()],
        forbidden: vec![RAW_SSN.to_string(), RAW_EMAIL.to_string()],
        ..ResponseExpectation::default()
    };
    ScenarioInput::new(ContextId::Enterprise, PII_QUERY, expectation)
        .with_upload(fixtures_dir.join(fixture))
}

/// Outcome an upload must report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadVerdict {
    /// Status says the file was ingested
    Accepted,
    /// Status says the file failed, was blocked or is unsupported
    Refused,
}

impl UploadVerdict {
    /// Status wording that satisfies the verdict
    pub fn wording(&self) -> &'static [&'static str] {
        match self {
            UploadVerdict::Accepted => &["ingested"],
            UploadVerdict::Refused => &["failed", "blocked", "unsupported"],
        }
    }
}

/// One file pushed through the upload control with its expected verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadCase {
    pub label: &'static str,
    pub file: PathBuf,
    pub verdict: UploadVerdict,
}

/// Valid, content-spoofed and blocked-extension uploads, in run order
pub fn upload_security_cases(fixtures_dir: &Path) -> Vec<UploadCase> {
    [
        ("Valid upload", "upload_valid.txt", UploadVerdict::Accepted),
        ("Spoofed upload", "upload_spoofed.txt", UploadVerdict::Refused),
        ("Blocked upload type (.ps1)", "upload_blocked.ps1", UploadVerdict::Refused),
    ]
    .into_iter()
    .map(|(label, file, verdict)| UploadCase {
        label,
        file: fixtures_dir.join(file),
        verdict,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_named_set_resolves() {
        for name in scenario_set_names() {
            let set = scenario_set(name).unwrap();
            assert_eq!(set.name, *name);
            assert!(!set.tests.is_empty());
        }
        assert!(scenario_set("nope").is_none());
    }

    #[test]
    fn test_crag_set_contents() {
        let set = scenario_set("crag").unwrap();
        assert_eq!(set.tests[0].context, ContextId::Finance);
        assert_eq!(set.tests[0].expectation.expect_text.as_deref(), Some("$850 Million"));
        assert_eq!(
            set.tests[1].expectation.expect_text.as_deref(),
            Some("Colonel James Morrison")
        );
    }

    #[test]
    fn test_graph_plans_cover_every_context() {
        let plans = graph_style_plans();
        let contexts: Vec<_> = plans.iter().map(|p| p.context).collect();
        assert_eq!(contexts, ContextId::ALL.to_vec());
        assert!(plans.iter().all(|p| p.uploads.len() == 2));
    }

    #[test]
    fn test_pii_mask_and_token_variants() {
        let mask = pii_scenario("MASK", Path::new("fixtures"));
        assert_eq!(mask.expectation.required_markers, vec![MASK_MARKER.to_string()]);
        assert_eq!(mask.uploads, vec![PathBuf::from("fixtures/pii_test_mask.txt")]);

        let token = pii_scenario("retest_token", Path::new("fixtures"));
        assert_eq!(token.expectation.required_markers, vec![TOKEN_MARKER.to_string()]);
        assert!(token.uploads[0].ends_with("pii_test_tokenize.txt"));
        assert_eq!(token.expectation.forbidden.len(), 2);
    }

    #[test]
    fn test_upload_cases_expect_one_acceptance() {
        let cases = upload_security_cases(Path::new("fixtures"));
        let verdicts: Vec<_> = cases.iter().map(|c| c.verdict).collect();
        assert_eq!(
            verdicts,
            vec![UploadVerdict::Accepted, UploadVerdict::Refused, UploadVerdict::Refused]
        );
        assert_eq!(cases[2].file, PathBuf::from("fixtures/upload_blocked.ps1"));
    }
}
