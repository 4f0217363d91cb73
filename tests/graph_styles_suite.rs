//! End-to-end runs of the graph style suite against the scripted app

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;

use common::{FakeApp, check_labels, read_report, screenshot_files, settings};
use webui_verify::browser::{MockElement, MockPage};
use webui_verify::harness::HarnessError;
use webui_verify::harness::selectors::{QUERY_INPUT, entity_mode_button};
use webui_verify::model::{ContextId, EntityGraphMode, Theme, graph_style_plans, style_model};
use webui_verify::runner::graph_styles::REPORT_NAME;
use webui_verify::runner::{GraphStyleSuite, Phase};

fn labels(pairs: &[(&str, bool)]) -> Vec<(String, bool)> {
    pairs.iter().map(|(l, p)| (l.to_string(), *p)).collect()
}

#[test]
fn test_healthy_app_passes_every_phase() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("test_docs");
    fs::create_dir_all(&docs).unwrap();
    for plan in graph_style_plans() {
        for name in plan.uploads {
            fs::write(docs.join(name), "seed document").unwrap();
        }
    }

    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(FakeApp::default().build()).unwrap();
    let suite = GraphStyleSuite::new(settings, style_model())
        .test_docs_dir(docs.clone())
        .contexts(&[ContextId::Finance, ContextId::Medical]);

    let (outcome, phases) = suite.run_in(&mut session).unwrap();

    assert_eq!(
        phases.visited(),
        &[
            Phase::Init,
            Phase::StyleCheck,
            Phase::Seed,
            Phase::PerContextVerify,
            Phase::AggregateVerify,
            Phase::Done
        ]
    );
    assert_eq!(outcome.exit_code(), 0, "failures: {:?}", outcome.failures);
    assert_eq!(outcome.summary.total, 14);

    let report = read_report(&outcome.report_path);
    assert_eq!(
        check_labels(&report),
        labels(&[
            ("CSS variables: dark mode", true),
            ("CSS variables: light mode", true),
            ("MEDICAL query graph: dark", true),
            ("MEDICAL entity graph: dark", true),
            ("MEDICAL query graph: light", true),
            ("MEDICAL entity graph: light", true),
            ("MEDICAL theme restored", true),
            ("FINANCE query graph: dark", true),
            ("FINANCE entity graph: dark", true),
            ("FINANCE query graph: light", true),
            ("FINANCE entity graph: light", true),
            ("FINANCE theme restored", true),
            ("MEDICAL sector-wide entity graph", true),
            ("FINANCE sector-wide entity graph", true),
        ])
    );
    assert_eq!(
        report["phases"],
        json!(["INIT", "STYLE_CHECK", "SEED", "PER_CONTEXT_VERIFY", "AGGREGATE_VERIFY", "DONE"])
    );
    assert_eq!(report["runLabel"], "GRAPH_STYLES");
    assert_eq!(report["deepAnalysis"]["enabled"], true);
    assert_eq!(report["summary"], json!({ "total": 14, "passed": 14, "failed": 0 }));
    assert!(report["runEnd"].is_string());

    let dom = session.page().dom();
    assert_eq!(dom.uploads.len(), 4);
    assert_eq!(dom.theme(), "dark");
    assert_eq!(dom.theme_writes.last().map(String::as_str), Some("dark"));

    // One context screenshot each, nothing for passing checks
    let shots = screenshot_files(dir.path());
    assert_eq!(shots.len(), 2);
    assert!(shots[0].starts_with("graphstyle_FINANCE_graphs_"));
    assert!(shots[1].starts_with("graphstyle_MEDICAL_graphs_"));
}

#[test]
fn test_stale_dark_accent_fails_with_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp::default()
        .build()
        .with_property("dark", "--accent-primary", "#60A5FA");
    let outcome = GraphStyleSuite::new(settings(dir.path(), REPORT_NAME), style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Finance])
        .run(page)
        .unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.summary.failed, 1);
    let (label, errors) = &outcome.failures[0];
    assert_eq!(label, "CSS variables: dark mode");
    assert!(errors.iter().any(|e| e.contains("expected=#2a6a9e")));
    assert!(errors.iter().any(|e| e.contains("STALE value detected for --accent-primary")));

    let report = read_report(&outcome.report_path);
    let dark = &report["tests"][0];
    assert_eq!(dark["type"], "css");
    assert_eq!(dark["theme"], "dark");
    assert!(dark["screenshot"].is_string());
    assert_eq!(report["tests"][1]["pass"], true);
    assert!(report["tests"][1].get("screenshot").is_none());
    assert!(
        screenshot_files(dir.path())
            .iter()
            .any(|f| f.starts_with("graphstyle_CSS_variables_dark_mode_"))
    );
}

#[test]
fn test_copied_palette_is_flagged_everywhere_it_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        unified_palette: false,
        ..FakeApp::default()
    }
    .build();
    let outcome = GraphStyleSuite::new(settings(dir.path(), REPORT_NAME), style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Government])
        .run(page)
        .unwrap();

    let failed: Vec<&str> = outcome.failures.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(
        failed,
        vec![
            "GOVERNMENT entity graph: dark",
            "GOVERNMENT entity graph: light",
            "GOVERNMENT sector-wide entity graph",
        ]
    );
    for (_, errors) in &outcome.failures {
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicate palette detected"));
    }

    let report = read_report(&outcome.report_path);
    let sector = report["tests"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["type"] == "entity-graph-sector")
        .unwrap();
    assert_eq!(sector["detail"]["mode"], "sector");
    assert_eq!(sector["detail"]["colorCheck"]["usesUnified"], false);
}

#[test]
fn test_context_that_never_settles_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        stuck_context: Some(ContextId::Medical),
        ..FakeApp::default()
    }
    .build();
    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(page).unwrap();
    let (outcome, phases) = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Medical, ContextId::Finance])
        .run_in(&mut session)
        .unwrap();

    assert_eq!(phases.current(), Phase::Done);
    assert_eq!(outcome.exit_code(), 1);

    let report = read_report(&outcome.report_path);
    let errors: Vec<&serde_json::Value> = report["tests"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["type"] == "scenario-error")
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["label"], "MEDICAL graph verification");
    assert!(
        errors[0]["errors"][0]
            .as_str()
            .unwrap()
            .contains("context switch to MEDICAL not confirmed")
    );
    assert_eq!(errors[1]["label"], "MEDICAL sector-wide entity graph");

    // Finance still ran in full
    let finance_passed = check_labels(&report)
        .iter()
        .filter(|(l, pass)| l.starts_with("FINANCE") && *pass)
        .count();
    assert_eq!(finance_passed, 6);
    assert_eq!(session.page().dom().theme(), "dark");
}

#[test]
fn test_abort_after_theme_toggle_restores_starting_theme() {
    let dir = tempfile::tempdir().unwrap();
    let mut clicks = 0;
    let page = FakeApp::default()
        .build()
        .on_click(&entity_mode_button(EntityGraphMode::Context), move |dom| {
            clicks += 1;
            // Second visit happens under the toggled theme
            if clicks == 2 {
                dom.fail_next(1);
            }
        });
    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(page).unwrap();
    let (outcome, phases) = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Finance])
        .run_in(&mut session)
        .unwrap();

    assert_eq!(phases.current(), Phase::Done);
    let report = read_report(&outcome.report_path);
    assert_eq!(
        check_labels(&report),
        labels(&[
            ("CSS variables: dark mode", true),
            ("CSS variables: light mode", true),
            ("FINANCE query graph: dark", true),
            ("FINANCE entity graph: dark", true),
            ("FINANCE query graph: light", true),
            ("FINANCE graph verification", false),
            ("FINANCE sector-wide entity graph", true),
        ])
    );
    assert_eq!(report["tests"][5]["type"], "scenario-error");

    let dom = session.page().dom();
    assert_eq!(dom.theme_writes, vec!["dark", "light", "dark", "light", "dark"]);
    assert_eq!(dom.theme(), "dark");
}

#[test]
fn test_style_check_abort_restores_theme_before_graphs() {
    let dir = tempfile::tempdir().unwrap();
    let mut light_writes = 0;
    let page = FakeApp::default().build().on_theme("light", move |dom| {
        light_writes += 1;
        if light_writes == 1 {
            dom.fail_next(1);
        }
    });
    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(page).unwrap();
    let (outcome, _) = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Finance])
        .run_in(&mut session)
        .unwrap();

    assert_eq!(outcome.summary.failed, 1);
    let report = read_report(&outcome.report_path);
    assert_eq!(
        check_labels(&report),
        labels(&[
            ("CSS variables: dark mode", true),
            ("CSS variable verification", false),
            ("FINANCE query graph: dark", true),
            ("FINANCE entity graph: dark", true),
            ("FINANCE query graph: light", true),
            ("FINANCE entity graph: light", true),
            ("FINANCE theme restored", true),
            ("FINANCE sector-wide entity graph", true),
        ])
    );
    let restore = &report["tests"][6];
    assert_eq!(restore["detail"], json!({ "before": "dark", "after": "dark" }));
    assert_eq!(session.page().dom().theme_writes, vec!["dark", "light", "dark", "light", "dark"]);
}

#[test]
fn test_theme_restored_from_light_start() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        start_theme: Theme::Light,
        ..FakeApp::default()
    }
    .build();
    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(page).unwrap();
    let (outcome, _) = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Academic])
        .run_in(&mut session)
        .unwrap();
    assert!(outcome.success());

    let report = read_report(&outcome.report_path);
    let restore = report["tests"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["type"] == "theme-restore")
        .unwrap();
    assert_eq!(restore["detail"], json!({ "before": "light", "after": "light" }));
    assert_eq!(report["tests"][2]["label"], "ACADEMIC query graph: light");
    assert_eq!(report["tests"][4]["label"], "ACADEMIC query graph: dark");

    let writes = &session.page().dom().theme_writes;
    assert_eq!(writes.last().map(String::as_str), Some("light"));
}

#[test]
fn test_without_deep_analysis_only_query_graphs_are_checked() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        deep_analysis: false,
        ..FakeApp::default()
    }
    .build();
    let settings = settings(dir.path(), REPORT_NAME);
    let mut session = settings.open_session(page).unwrap();
    let (outcome, phases) = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Enterprise])
        .run_in(&mut session)
        .unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.summary.total, 5);
    assert!(phases.visited().contains(&Phase::AggregateVerify));
    assert!(!phases.visited().contains(&Phase::Seed));
    let report = read_report(&outcome.report_path);
    assert_eq!(report["deepAnalysis"]["enabled"], false);
}

#[test]
fn test_rejected_login_is_fatal_but_reported() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        login: Some(false),
        ..FakeApp::default()
    }
    .build();
    let settings = settings(dir.path(), REPORT_NAME);
    let report_path = settings.report_path.clone();
    let err = GraphStyleSuite::new(settings, style_model())
        .skip_seed(true)
        .run(page)
        .unwrap_err();

    assert!(matches!(err, HarnessError::AuthFailed(ref m) if m == "Invalid credentials"));
    let report = read_report(&report_path);
    assert_eq!(report["fatalError"], "login failed: Invalid credentials");
    assert_eq!(report["summary"]["total"], 0);
    assert_eq!(report["phases"], json!(["INIT"]));
}

#[test]
fn test_accepted_login_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let page = FakeApp {
        login: Some(true),
        ..FakeApp::default()
    }
    .build();
    let outcome = GraphStyleSuite::new(settings(dir.path(), REPORT_NAME), style_model())
        .skip_seed(true)
        .contexts(&[ContextId::Finance])
        .run(page)
        .unwrap();
    assert!(outcome.success());
    let report = read_report(&outcome.report_path);
    assert_eq!(report["login"], json!({ "attempted": true, "success": true }));
}

#[test]
fn test_missing_context_selector_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new().with_element(QUERY_INPUT, MockElement::new());
    let settings = settings(dir.path(), REPORT_NAME);
    let report_path = settings.report_path.clone();
    let err = GraphStyleSuite::new(settings, style_model()).run(page).unwrap_err();

    assert!(matches!(err, HarnessError::MissingControl(ref s) if s == "#sector-select"));
    let report = read_report(&report_path);
    assert!(report["fatalError"].as_str().unwrap().contains("#sector-select"));
}

#[test]
fn test_missing_seed_document_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = GraphStyleSuite::new(settings(dir.path(), REPORT_NAME), style_model())
        .test_docs_dir(dir.path().join("nowhere"))
        .contexts(&[ContextId::Finance])
        .run(FakeApp::default().build())
        .unwrap();

    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.failures[0].0, "FINANCE seed upload");
    assert!(outcome.failures[0].1[0].contains("fixture not found"));
    // CSS 2, seed error 1, per-context 5, sector-wide 1
    assert_eq!(outcome.summary.total, 9);
}
