//! DOM contract of the application under test.
//!
//! Element ids, class-name conventions and page globals the harness reads.
//! The application reacts to dispatched change events, not to raw value
//! writes, which is why every form write goes through
//! `PageBackend::set_value_and_dispatch`.

use crate::model::{EntityGraphMode, GraphTab};

// Session / auth
pub const QUERY_INPUT: &str = "#query-input";
pub const AUTH_MODAL: &str = "#auth-modal";
pub const AUTH_USERNAME: &str = "#auth-username";
pub const AUTH_PASSWORD: &str = "#auth-password";
pub const AUTH_SUBMIT: &str = "#auth-submit";
pub const AUTH_ERROR: &str = "#auth-error";
pub const LOADING_OVERLAY: &str = ".loading-overlay:not(.hidden)";

// Context
pub const SECTOR_SELECT: &str = "#sector-select";
pub const SECTOR_OPTIONS: &str = "#sector-select option";
pub const STATS_CONTEXT: &str = "#stats-context";

// Chat
pub const SEND_BUTTON: &str = "#send-btn";
pub const ASSISTANT_MESSAGE: &str = ".message.assistant";
pub const ASSISTANT_BUBBLE: &str = ".message.assistant .message-bubble";
pub const LOADING_INDICATOR: &str = ".loading-indicator";
pub const SOURCE_ITEMS: &str = "#info-sources-list .info-source-item";
pub const DEEP_ANALYSIS_BUTTON: &str = "#deep-analysis-btn";

// Upload
pub const FILE_INPUT: &str = "#file-input";
pub const UPLOAD_STATUS: &str = "#upload-status";

// Query graph (SVG)
pub const GRAPH_PLACEHOLDER: &str = "#graph-placeholder";
pub const QUERY_GRAPH_SVG: &str = "#plotly-graph svg";
pub const QUERY_GRAPH_NODES: &str = "#plotly-graph svg .graph-node";
pub const QUERY_GRAPH_EDGES: &str = "#plotly-graph svg .graph-edge";
pub const QUERY_GRAPH_LABELS: &str = "#plotly-graph svg .graph-label";
pub const GRAPH_LEGEND: &str = ".graph-legend";
pub const NODE_CLASS_PREFIX: &str = "graph-node--";

// Entity graph (canvas or SVG)
pub const ENTITY_GRAPH_SURFACE: &str = "#entity-graph canvas, #entity-graph svg";
pub const ENTITY_NODE_COUNT: &str = "#entity-node-count";

// Page globals
pub const ENTITY_PALETTE_GLOBAL: &str = "entityTypeColors";
pub const ENTITY_PALETTE_ALIAS: &str = "entityColors";
pub const ENTITY_GRAPH_ENGINE: &str = "entity2DGraph";

/// Root attribute holding the active theme
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Fill-bearing dot inside a query graph node of the given category
pub fn query_node_dot(category: &str) -> String {
    format!("#plotly-graph svg .graph-node--{} .graph-node-dot", category)
}

pub fn graph_tab_button(tab: GraphTab) -> String {
    format!(".graph-subtab[data-graph-tab=\"{}\"]", tab.as_str())
}

pub fn entity_mode_button(mode: EntityGraphMode) -> String {
    format!(
        ".entity-mode-btn[data-entity-graph-mode=\"{}\"]",
        mode.as_str()
    )
}
