//! Configuration management with environment variable support.
//!
//! Every value the harness needs is read once from the environment with a
//! default, so a bare `webui-verify styles` works against a local instance.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BASE_URL` | Application under test | `http://localhost:8080` |
//! | `ADMIN_USER` | Login user | `admin` |
//! | `ADMIN_PASS` | Login password (falls back to `SENTINEL_ADMIN_PASSWORD`, then `SENTINEL_BOOTSTRAP_ADMIN_PASSWORD`) | `Test123!` |
//! | `OUTPUT_JSON` | Report path | per suite, e.g. `results_graph_styles.json` |
//! | `SCREENSHOT_DIR` | Screenshot directory | `./screens` |
//! | `SKIP_SEED_DOCS` | Skip the document seeding phase | `false` |
//! | `ENTITY_TAB_PAUSE_MS` | Render pause after opening the entity graph | `3000` |
//! | `TEST_DOCS_DIR` | Seed documents | `./test_docs` |
//! | `FIXTURES_DIR` | PII fixtures | `./fixtures` |
//! | `RUN_LABEL` | PII run label (`MASK` or `TOKEN...`) | `MASK` |
//! | `SCENARIO` | Query scenario set | `HYDE` |
//! | `HEADLESS` | Run the browser without a window | `true` |
//! | `ANNOTATE_SCREENSHOTS` | Draw the check label onto failure screenshots | `true` |
//!
//! # Example
//!
//! ```bash
//! BASE_URL=http://staging:8080 SKIP_SEED_DOCS=true webui-verify styles
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASS: &str = "Test123!";
pub const DEFAULT_SCREENSHOT_DIR: &str = "./screens";
pub const DEFAULT_TEST_DOCS_DIR: &str = "./test_docs";
pub const DEFAULT_FIXTURES_DIR: &str = "./fixtures";
pub const DEFAULT_RUN_LABEL: &str = "MASK";
pub const DEFAULT_SCENARIO: &str = "HYDE";

/// Pause after every upload and query so asynchronous indexing can finish (ms)
pub const DEFAULT_ACTION_DELAY_MS: u64 = 2500;
pub const DEFAULT_THEME_DELAY_MS: u64 = 300;
pub const DEFAULT_GRAPH_TAB_DELAY_MS: u64 = 500;
pub const DEFAULT_ENTITY_MODE_DELAY_MS: u64 = 400;
pub const DEFAULT_ENTITY_TAB_PAUSE_MS: u64 = 3000;
pub const DEFAULT_SEED_DELAY_MS: u64 = 5000;
pub const DEFAULT_TOGGLE_DELAY_MS: u64 = 300;

pub const DEFAULT_PAGE_READY_TIMEOUT: u64 = 120;
pub const DEFAULT_AUTH_TIMEOUT: u64 = 30;
pub const DEFAULT_CONTEXT_TIMEOUT: u64 = 15;
pub const DEFAULT_UPLOAD_TIMEOUT: u64 = 60;
pub const DEFAULT_RESPONSE_START_TIMEOUT: u64 = 300;
pub const DEFAULT_RESPONSE_COMPLETE_TIMEOUT: u64 = 420;
pub const DEFAULT_PREFLIGHT_TIMEOUT: u64 = 10;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_ADMIN_USER: &str = "ADMIN_USER";
pub const ENV_ADMIN_PASS: &str = "ADMIN_PASS";
pub const ENV_ADMIN_PASS_FALLBACKS: [&str; 2] =
    ["SENTINEL_ADMIN_PASSWORD", "SENTINEL_BOOTSTRAP_ADMIN_PASSWORD"];
pub const ENV_OUTPUT_JSON: &str = "OUTPUT_JSON";
pub const ENV_SCREENSHOT_DIR: &str = "SCREENSHOT_DIR";
pub const ENV_SKIP_SEED_DOCS: &str = "SKIP_SEED_DOCS";
pub const ENV_ENTITY_TAB_PAUSE_MS: &str = "ENTITY_TAB_PAUSE_MS";
pub const ENV_TEST_DOCS_DIR: &str = "TEST_DOCS_DIR";
pub const ENV_FIXTURES_DIR: &str = "FIXTURES_DIR";
pub const ENV_RUN_LABEL: &str = "RUN_LABEL";
pub const ENV_SCENARIO: &str = "SCENARIO";
pub const ENV_HEADLESS: &str = "HEADLESS";
pub const ENV_ANNOTATE_SCREENSHOTS: &str = "ANNOTATE_SCREENSHOTS";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSettings,
    pub output: OutputSettings,
    pub run: RunSettings,
    pub delays: SettleDelays,
    pub timeouts: Timeouts,
}

/// Where the application lives and how to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSettings {
    pub base_url: String,
    pub admin_user: String,
    pub admin_pass: String,
}

/// Report and screenshot locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Explicit report path; each suite has its own default file name
    pub output_json: Option<PathBuf>,
    pub screenshot_dir: PathBuf,
    pub annotate_screenshots: bool,
}

/// Per-run switches and inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub skip_seed: bool,
    pub test_docs_dir: PathBuf,
    pub fixtures_dir: PathBuf,
    pub run_label: String,
    pub scenario: String,
    pub headless: bool,
}

/// Fixed pauses after actions that expose no completion signal.
///
/// These are approximations and the main source of flakiness on slow hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// After uploads and queries
    pub action: Duration,
    pub theme: Duration,
    pub graph_tab: Duration,
    pub entity_mode: Duration,
    /// Extra render time for the entity graph
    pub entity_tab: Duration,
    /// After the whole seeding phase
    pub seed: Duration,
    /// After pressing a two-state button such as deep analysis
    pub toggle: Duration,
}

/// Bounded waits for the polling synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub page_ready: Duration,
    pub auth: Duration,
    pub context: Duration,
    pub upload: Duration,
    /// Until a new assistant message appears
    pub response_start: Duration,
    /// Until the loading indicator is gone
    pub response_complete: Duration,
    pub preflight: Duration,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            target: TargetSettings::from_env(),
            output: OutputSettings::from_env(),
            run: RunSettings::from_env(),
            delays: SettleDelays::from_env(),
            timeouts: Timeouts::defaults(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            target: TargetSettings::defaults(),
            output: OutputSettings::defaults(),
            run: RunSettings::defaults(),
            delays: SettleDelays::defaults(),
            timeouts: Timeouts::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl TargetSettings {
    pub fn from_env() -> Self {
        let admin_pass = env::var(ENV_ADMIN_PASS)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| {
                ENV_ADMIN_PASS_FALLBACKS
                    .iter()
                    .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
            })
            .unwrap_or_else(|| DEFAULT_ADMIN_PASS.to_string());
        Self {
            base_url: env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            admin_user: env::var(ENV_ADMIN_USER).unwrap_or_else(|_| DEFAULT_ADMIN_USER.to_string()),
            admin_pass,
        }
    }

    pub fn defaults() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_pass: DEFAULT_ADMIN_PASS.to_string(),
        }
    }
}

impl OutputSettings {
    pub fn from_env() -> Self {
        Self {
            output_json: env::var(ENV_OUTPUT_JSON).ok().map(PathBuf::from),
            screenshot_dir: env::var(ENV_SCREENSHOT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCREENSHOT_DIR)),
            annotate_screenshots: env_flag(ENV_ANNOTATE_SCREENSHOTS).unwrap_or(true),
        }
    }

    pub fn defaults() -> Self {
        Self {
            output_json: None,
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            annotate_screenshots: true,
        }
    }

    /// Explicit report path, or `default_name` in the working directory
    pub fn report_path(&self, default_name: &str) -> PathBuf {
        self.output_json
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_name))
    }
}

impl RunSettings {
    pub fn from_env() -> Self {
        Self {
            skip_seed: env_flag(ENV_SKIP_SEED_DOCS).unwrap_or(false),
            test_docs_dir: env::var(ENV_TEST_DOCS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEST_DOCS_DIR)),
            fixtures_dir: env::var(ENV_FIXTURES_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_FIXTURES_DIR)),
            run_label: env::var(ENV_RUN_LABEL).unwrap_or_else(|_| DEFAULT_RUN_LABEL.to_string()),
            scenario: env::var(ENV_SCENARIO)
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|_| DEFAULT_SCENARIO.to_string()),
            headless: env_flag(ENV_HEADLESS).unwrap_or(true),
        }
    }

    pub fn defaults() -> Self {
        Self {
            skip_seed: false,
            test_docs_dir: PathBuf::from(DEFAULT_TEST_DOCS_DIR),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            run_label: DEFAULT_RUN_LABEL.to_string(),
            scenario: DEFAULT_SCENARIO.to_string(),
            headless: true,
        }
    }
}

impl SettleDelays {
    pub fn from_env() -> Self {
        let entity_tab = env::var(ENV_ENTITY_TAB_PAUSE_MS)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_ENTITY_TAB_PAUSE_MS);
        Self {
            entity_tab: Duration::from_millis(entity_tab),
            ..Self::defaults()
        }
    }

    pub fn defaults() -> Self {
        Self {
            action: Duration::from_millis(DEFAULT_ACTION_DELAY_MS),
            theme: Duration::from_millis(DEFAULT_THEME_DELAY_MS),
            graph_tab: Duration::from_millis(DEFAULT_GRAPH_TAB_DELAY_MS),
            entity_mode: Duration::from_millis(DEFAULT_ENTITY_MODE_DELAY_MS),
            entity_tab: Duration::from_millis(DEFAULT_ENTITY_TAB_PAUSE_MS),
            seed: Duration::from_millis(DEFAULT_SEED_DELAY_MS),
            toggle: Duration::from_millis(DEFAULT_TOGGLE_DELAY_MS),
        }
    }

    /// No pauses at all (in-memory pages)
    pub fn none() -> Self {
        Self {
            action: Duration::ZERO,
            theme: Duration::ZERO,
            graph_tab: Duration::ZERO,
            entity_mode: Duration::ZERO,
            entity_tab: Duration::ZERO,
            seed: Duration::ZERO,
            toggle: Duration::ZERO,
        }
    }
}

impl Timeouts {
    pub fn defaults() -> Self {
        Self {
            page_ready: Duration::from_secs(DEFAULT_PAGE_READY_TIMEOUT),
            auth: Duration::from_secs(DEFAULT_AUTH_TIMEOUT),
            context: Duration::from_secs(DEFAULT_CONTEXT_TIMEOUT),
            upload: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT),
            response_start: Duration::from_secs(DEFAULT_RESPONSE_START_TIMEOUT),
            response_complete: Duration::from_secs(DEFAULT_RESPONSE_COMPLETE_TIMEOUT),
            preflight: Duration::from_secs(DEFAULT_PREFLIGHT_TIMEOUT),
        }
    }

    /// Same bound for every wait
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            page_ready: timeout,
            auth: timeout,
            context: timeout,
            upload: timeout,
            response_start: timeout,
            response_complete: timeout,
            preflight: timeout,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a boolean flag: true/false, 1/0, yes/no, on/off
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}
