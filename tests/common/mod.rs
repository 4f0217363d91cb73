//! A scripted stand-in for the application under test.
//!
//! `FakeApp::build` produces a `MockPage` that behaves like a healthy
//! deployment: context switches propagate to the status readout, queries
//! stream an answer, uploads report ingestion, both graphs render with the
//! expected palette. Tests flip one field to break one contract.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::time::Duration;

use webui_verify::browser::{LabelRect, MockElement, MockPage};
use webui_verify::config::{SettleDelays, Timeouts};
use webui_verify::harness::Target;
use webui_verify::harness::selectors::*;
use webui_verify::model::{ContextId, EntityGraphMode, Expectation, GraphTab, Theme, style_model};
use webui_verify::runner::RunnerSettings;

pub type Answer = fn(&str) -> String;

pub struct FakeApp {
    /// Answer text for a submitted query
    pub answer: Answer,
    /// `None`: no login prompt; `Some(accept)`: prompt that accepts or rejects
    pub login: Option<bool>,
    /// Context whose switch never reaches the status readout
    pub stuck_context: Option<ContextId>,
    /// Alias global is the canonical palette object rather than a copy
    pub unified_palette: bool,
    /// Deep-analysis toggle offered
    pub deep_analysis: bool,
    pub start_theme: Theme,
    /// Upload status texts handed out in order; the last one repeats
    pub upload_statuses: Vec<&'static str>,
}

pub fn echo_answer(query: &str) -> String {
    format!("Here is what I found about: {}", query)
}

impl Default for FakeApp {
    fn default() -> Self {
        Self {
            answer: echo_answer,
            login: None,
            stuck_context: None,
            unified_palette: true,
            deep_analysis: true,
            start_theme: Theme::Dark,
            upload_statuses: vec!["Ingested 1 file"],
        }
    }
}

impl FakeApp {
    pub fn build(self) -> MockPage {
        let page = MockPage::new()
            .with_element(QUERY_INPUT, MockElement::new())
            .with_element(GRAPH_PLACEHOLDER, MockElement::new().hidden());
        let page = self.with_login(page);
        let page = self.with_contexts(page);
        let page = self.with_chat(page);
        let page = self.with_uploads(page);
        let page = with_theme_properties(page);
        let page = with_query_graph(page);
        let page = self.with_entity_graph(page);
        let mut page = self.with_deep_analysis(page);
        page.dom_mut()
            .root_attributes
            .insert(THEME_ATTRIBUTE.to_string(), self.start_theme.as_str().to_string());
        page
    }

    fn with_login(&self, page: MockPage) -> MockPage {
        let Some(accept) = self.login else {
            return page;
        };
        page.with_element(AUTH_MODAL, MockElement::new())
            .with_element(AUTH_USERNAME, MockElement::new())
            .with_element(AUTH_PASSWORD, MockElement::new())
            .with_element(AUTH_SUBMIT, MockElement::new())
            .with_element(AUTH_ERROR, MockElement::new().hidden())
            .on_click(AUTH_SUBMIT, move |dom| {
                if accept {
                    dom.schedule(2, |dom| {
                        if let Some(modal) = dom.first_mut(AUTH_MODAL) {
                            modal.classes.push("hidden".into());
                        }
                    });
                } else if let Some(err) = dom.first_mut(AUTH_ERROR) {
                    err.hidden = false;
                    err.text = "Invalid credentials".into();
                }
            })
    }

    fn with_contexts(&self, mut page: MockPage) -> MockPage {
        for context in ContextId::ALL {
            page = page.with_element(SECTOR_OPTIONS, MockElement::text(context.as_str()));
        }
        let stuck = self.stuck_context;
        page.with_element(SECTOR_SELECT, MockElement::new().with_value("ENTERPRISE"))
            .with_element(STATS_CONTEXT, MockElement::text("ENTERPRISE"))
            .on_change(SECTOR_SELECT, move |dom| {
                let value = dom.first(SECTOR_SELECT).map(|e| e.value.clone()).unwrap_or_default();
                if stuck.map(|c| c.as_str()) == Some(value.as_str()) {
                    return;
                }
                dom.schedule(2, move |dom| dom.set_text(STATS_CONTEXT, &value));
            })
    }

    fn with_chat(&self, page: MockPage) -> MockPage {
        let answer = self.answer;
        page.with_element(SEND_BUTTON, MockElement::new())
            .on_click(SEND_BUTTON, move |dom| {
                let query = dom.first(QUERY_INPUT).map(|e| e.value.clone()).unwrap_or_default();
                let text = answer(&query);
                dom.push(LOADING_INDICATOR, MockElement::new());
                dom.schedule(2, |dom| {
                    dom.push(ASSISTANT_MESSAGE, MockElement::new());
                    dom.push(ASSISTANT_BUBBLE, MockElement::text("..."));
                });
                dom.schedule(4, move |dom| {
                    dom.remove(LOADING_INDICATOR);
                    if let Some(last) = dom.elements.get_mut(ASSISTANT_BUBBLE).and_then(|v| v.last_mut()) {
                        last.text = text;
                    }
                    dom.set(SOURCE_ITEMS, MockElement::text("source_document.txt"));
                });
            })
    }

    fn with_uploads(&self, page: MockPage) -> MockPage {
        let statuses = self.upload_statuses.clone();
        let mut served = 0;
        page.with_element(FILE_INPUT, MockElement::new())
            .with_element(UPLOAD_STATUS, MockElement::new())
            .on_files(FILE_INPUT, move |dom| {
                let status = statuses
                    .get(served)
                    .or_else(|| statuses.last())
                    .copied()
                    .unwrap_or("Ingested 1 file");
                served += 1;
                dom.schedule(2, move |dom| dom.set_text(UPLOAD_STATUS, status));
            })
    }

    fn with_entity_graph(&self, page: MockPage) -> MockPage {
        let palette = canonical_palette();
        let page = page
            .with_element(&graph_tab_button(GraphTab::Query), MockElement::new())
            .with_element(&graph_tab_button(GraphTab::Entity), MockElement::new())
            .with_element(&entity_mode_button(EntityGraphMode::Context), MockElement::new())
            .with_element(&entity_mode_button(EntityGraphMode::Sector), MockElement::new())
            .with_element(ENTITY_GRAPH_SURFACE, MockElement::new())
            .with_element(ENTITY_NODE_COUNT, MockElement::text("3 entities"))
            .with_global(ENTITY_PALETTE_GLOBAL, palette.clone())
            .with_graph_data(
                ENTITY_GRAPH_ENGINE,
                json!({
                    "nodes": [
                        { "type": "PERSON", "color": style_model().entity_color("PERSON") },
                        { "type": "organization", "color": style_model().entity_color("ORGANIZATION") },
                        { "entityType": "LOCATION", "color": style_model().entity_color("LOCATION") },
                    ]
                }),
            );
        if self.unified_palette {
            page.with_alias(ENTITY_PALETTE_ALIAS, ENTITY_PALETTE_GLOBAL)
        } else {
            page.with_global(ENTITY_PALETTE_ALIAS, palette)
        }
    }

    fn with_deep_analysis(&self, page: MockPage) -> MockPage {
        if !self.deep_analysis {
            return page;
        }
        page.with_element(DEEP_ANALYSIS_BUTTON, MockElement::new().with_attr("aria-pressed", "false"))
            .on_click(DEEP_ANALYSIS_BUTTON, |dom| {
                if let Some(btn) = dom.first_mut(DEEP_ANALYSIS_BUTTON) {
                    btn.attributes.insert("aria-pressed".into(), "true".into());
                }
            })
    }
}

pub fn canonical_palette() -> Value {
    let colors: serde_json::Map<String, Value> = style_model()
        .entity_colors()
        .iter()
        .map(|(category, color)| (category.to_string(), json!(color)))
        .collect();
    Value::Object(colors)
}

/// Every expected custom property, under both themes
fn with_theme_properties(mut page: MockPage) -> MockPage {
    for theme in Theme::ALL {
        for (name, expectation) in style_model().properties(theme) {
            let value = match expectation {
                Expectation::Equals(hex) => hex.clone(),
                Expectation::Exists => "rgba(42, 106, 158, 0.2)".to_string(),
            };
            page = page.with_property(theme.as_str(), name, &value);
        }
    }
    page
}

fn with_query_graph(page: MockPage) -> MockPage {
    let node = |category: &str| {
        MockElement::new()
            .with_class("graph-node")
            .with_class(format!("graph-node--{}", category))
    };
    page.with_element(QUERY_GRAPH_SVG, MockElement::new())
        .with_element(QUERY_GRAPH_NODES, node("query"))
        .with_element(QUERY_GRAPH_NODES, node("source"))
        .with_element(QUERY_GRAPH_NODES, node("entity"))
        .with_element(&query_node_dot("query"), MockElement::new().with_fill("rgb(71, 85, 105)"))
        .with_element(&query_node_dot("source"), MockElement::new().with_fill("rgb(74, 124, 89)"))
        .with_element(&query_node_dot("entity"), MockElement::new().with_fill("rgb(146, 117, 76)"))
        .with_element(QUERY_GRAPH_EDGES, MockElement::new())
        .with_element(QUERY_GRAPH_EDGES, MockElement::new())
        .with_element(QUERY_GRAPH_LABELS, MockElement::text("query").with_rect(LabelRect::new(10.0, 10.0, 60.0, 14.0)))
        .with_element(QUERY_GRAPH_LABELS, MockElement::text("source").with_rect(LabelRect::new(10.0, 80.0, 60.0, 14.0)))
        .with_element(QUERY_GRAPH_LABELS, MockElement::text("entity").with_rect(LabelRect::new(120.0, 40.0, 60.0, 14.0)))
        .with_element(GRAPH_LEGEND, MockElement::new())
}

/// Fast settings writing everything under `dir`
pub fn settings(dir: &Path, report: &str) -> RunnerSettings {
    RunnerSettings {
        target: Target::new("http://app.test", "admin", "secret"),
        report_path: dir.join(report),
        screenshot_dir: dir.join("screenshots"),
        annotate_screenshots: false,
        timeouts: Timeouts::uniform(Duration::from_millis(300)),
        delays: SettleDelays::none(),
        poll_interval: Duration::from_millis(5),
    }
}

pub fn read_report(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("report written");
    serde_json::from_str(&text).expect("report is JSON")
}

/// Checks in a report, as (label, pass)
pub fn check_labels(report: &Value) -> Vec<(String, bool)> {
    report["tests"]
        .as_array()
        .expect("tests array")
        .iter()
        .map(|t| {
            (
                t["label"].as_str().unwrap_or_default().to_string(),
                t["pass"].as_bool().unwrap_or(false),
            )
        })
        .collect()
}

pub fn screenshot_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir.join("screenshots")) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
