//! webui-verify - browser-driven verification of a running web UI.
//!
//! This crate provides:
//! - A page backend port (`PageBackend` + `Introspect`) with a Chrome DevTools
//!   implementation and an in-memory `MockPage` for tests
//! - A session controller, context selector and action primitives that
//!   synchronize with the asynchronous UI by bounded polling
//! - Inspectors for CSS custom properties, graph structure and palette identity
//! - Scenario runners that record every assertion into an incrementally
//!   written JSON report, with failure screenshots
//!
//! # Example
//!
//! ```rust,no_run
//! use webui_verify::browser::{ChromeBackend, ChromeBackendConfig};
//! use webui_verify::model::style_model;
//! use webui_verify::runner::{GraphStyleSuite, RunnerSettings};
//! use webui_verify::config;
//!
//! let settings = RunnerSettings::from_config(config::get(), "results_graph_styles.json");
//! let page = ChromeBackend::launch(&ChromeBackendConfig::default()).unwrap();
//! let outcome = GraphStyleSuite::new(settings, style_model()).run(page).unwrap();
//! std::process::exit(outcome.exit_code() as i32);
//! ```

pub mod annotate;
pub mod artifacts;
pub mod browser;
pub mod config;
pub mod harness;
pub mod inspect;
pub mod model;
pub mod preflight;
pub mod runner;

// Re-export the page port
pub use browser::{ChromeBackend, ChromeBackendConfig, DriverError, DriverResult, Introspect, MockPage, PageBackend};

// Re-export harness types
pub use harness::{HarnessError, HarnessResult, LoginOutcome, QueryResponse, Session, Target};

// Re-export runners and results
pub use artifacts::ArtifactStore;
pub use runner::{
    CheckCategory, CheckResult, GraphStyleSuite, PiiSuite, QuerySuite, RunOutcome, RunReport, RunnerSettings,
    UploadSecuritySuite,
};

pub use preflight::check_reachable;
