//! Style and structure inspectors. They read the page and compare against
//! the expected model; none of them waits beyond an action's settle delay.

pub mod color;
pub mod css;
pub mod graph;
pub mod network;
pub mod palette;
pub mod text;

pub use color::{colors_equal, normalize_color};
pub use css::{CssCheck, check_css_variables, evaluate_css};
pub use graph::{EntityGraphCheck, QueryGraphCheck, check_entity_graph, check_query_graph};
pub use network::{AirgapCheck, check_airgap, evaluate_airgap};
pub use palette::{PaletteCheck, check_palette};
pub use text::{TextCheck, check_response, text_includes};
