//! Graph structure inspectors for the query graph (SVG) and the entity
//! graph (canvas or SVG driven by a force-graph engine).

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::browser::{DriverResult, LabelRect, PageBackend};
use crate::harness::selectors::{
    ENTITY_GRAPH_ENGINE, ENTITY_GRAPH_SURFACE, ENTITY_NODE_COUNT, GRAPH_LEGEND, NODE_CLASS_PREFIX,
    QUERY_GRAPH_EDGES, QUERY_GRAPH_LABELS, QUERY_GRAPH_NODES, QUERY_GRAPH_SVG, query_node_dot,
};
use crate::harness::{HarnessResult, Session};
use crate::harness::wait::settle;
use crate::inspect::color::{colors_equal, normalize_color};
use crate::inspect::palette::{PaletteCheck, check_palette};
use crate::model::{EntityGraphMode, GraphTab, StyleModel};

/// Fill of the palette that shipped before the current one
pub const STALE_FILL_RGB: &str = "96, 165, 250";
pub const STALE_FILL_HEX: &str = "#60a5fa";

/// A label pair overlapping by at least this share of the smaller label is severe
pub const SEVERE_OVERLAP_RATIO: f64 = 0.2;

/// Live entity nodes compared against the palette
pub const MAX_RENDERED_NODES: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryGraphDetails {
    pub query_node_fill: Option<String>,
    pub source_node_fill: Option<String>,
    pub entity_node_fill: Option<String>,
    pub label_count: usize,
    pub edge_count: usize,
    pub node_count: usize,
    pub node_types: Vec<String>,
    pub node_type_counts: BTreeMap<String, usize>,
    pub has_legend: bool,
    pub severe_label_overlaps: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryGraphCheck {
    pub pass: bool,
    pub errors: Vec<String>,
    pub details: Option<QueryGraphDetails>,
}

/// Category of a node from its `graph-node--<category>` class
pub fn node_category(classes: &[String]) -> String {
    classes
        .iter()
        .find_map(|c| c.strip_prefix(NODE_CLASS_PREFIX))
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Whether a fill carries the stale palette signature
pub fn is_stale_fill(fill: &str) -> bool {
    fill.contains(STALE_FILL_RGB) || normalize_color(fill).as_deref() == Some(STALE_FILL_HEX)
}

/// Label pairs whose overlap reaches `SEVERE_OVERLAP_RATIO` of the smaller label
pub fn severe_overlaps(rects: &[LabelRect]) -> usize {
    let mut severe = 0;
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            let shared = a.overlap_area(b);
            if shared <= 0.0 {
                continue;
            }
            let smaller = a.area().min(b.area());
            let smaller = if smaller > 0.0 { smaller } else { 1.0 };
            if shared / smaller >= SEVERE_OVERLAP_RATIO {
                severe += 1;
            }
        }
    }
    severe
}

/// Inspect the rendered query graph in the current theme
pub fn check_query_graph<B: PageBackend + ?Sized>(page: &mut B) -> DriverResult<QueryGraphCheck> {
    if !page.exists(QUERY_GRAPH_SVG)? {
        return Ok(QueryGraphCheck {
            pass: false,
            errors: vec!["Query graph SVG not rendered".to_string()],
            details: None,
        });
    }

    let node_types: Vec<String> = page
        .class_lists(QUERY_GRAPH_NODES)?
        .iter()
        .map(|classes| node_category(classes))
        .collect();
    let mut node_type_counts = BTreeMap::new();
    for category in &node_types {
        *node_type_counts.entry(category.clone()).or_insert(0) += 1;
    }

    let details = QueryGraphDetails {
        query_node_fill: page.computed_fill(&query_node_dot("query"))?,
        source_node_fill: page.computed_fill(&query_node_dot("source"))?,
        entity_node_fill: page.computed_fill(&query_node_dot("entity"))?,
        label_count: page.count(QUERY_GRAPH_LABELS)?,
        edge_count: page.count(QUERY_GRAPH_EDGES)?,
        node_count: node_types.len(),
        node_types,
        node_type_counts,
        has_legend: page.exists(GRAPH_LEGEND)?,
        severe_label_overlaps: severe_overlaps(&page.label_rects(QUERY_GRAPH_LABELS)?),
    };

    let mut errors = Vec::new();
    let fills = [
        ("Query", &details.query_node_fill),
        ("Source", &details.source_node_fill),
        ("Entity", &details.entity_node_fill),
    ];
    for (kind, fill) in fills {
        if let Some(fill) = fill.as_deref().filter(|f| is_stale_fill(f)) {
            errors.push(format!("{} node fill uses stale color: {}", kind, fill));
        }
    }
    if details.node_count == 0 {
        errors.push("No nodes in query graph".to_string());
    }
    if details.label_count == 0 {
        errors.push("No labels in query graph".to_string());
    }
    if details.severe_label_overlaps > 0 {
        errors.push(format!(
            "{} severely overlapping label pair(s) in query graph",
            details.severe_label_overlaps
        ));
    }

    Ok(QueryGraphCheck {
        pass: errors.is_empty(),
        errors,
        details: Some(details),
    })
}

/// One live node of the entity graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNode {
    #[serde(rename = "type")]
    pub category: String,
    pub color: Option<String>,
}

/// First `MAX_RENDERED_NODES` nodes of a `graphData()` result
pub fn rendered_nodes(data: &Value) -> Vec<RenderedNode> {
    let Some(nodes) = data.get("nodes").and_then(Value::as_array) else {
        return Vec::new();
    };
    nodes
        .iter()
        .take(MAX_RENDERED_NODES)
        .map(|node| {
            let category = ["type", "entityType"]
                .iter()
                .find_map(|key| node.get(*key).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .unwrap_or("UNKNOWN")
                .to_uppercase();
            let color = node
                .get("color")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            RenderedNode { category, color }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityGraphCheck {
    pub pass: bool,
    pub errors: Vec<String>,
    pub mode: EntityGraphMode,
    pub node_count: i64,
    pub has_canvas: bool,
    pub color_check: PaletteCheck,
    pub rendered_colors: Option<Vec<RenderedNode>>,
}

/// Leading integer of a counter readout (`"12 entities"` is 12)
fn parse_count(text: &str) -> Option<i64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Open the entity graph in `mode`, inspect it, then return to the query tab
pub fn check_entity_graph<B: PageBackend>(
    session: &mut Session<B>,
    mode: EntityGraphMode,
    model: &StyleModel,
) -> HarnessResult<EntityGraphCheck> {
    session.switch_graph_tab(GraphTab::Entity)?;
    session.set_entity_graph_mode(mode)?;
    settle(session.delays.entity_tab);

    let page = session.page_mut();
    let mut errors = Vec::new();

    let has_canvas = page.exists(ENTITY_GRAPH_SURFACE)?;
    let node_count = page
        .inner_text(ENTITY_NODE_COUNT)?
        .and_then(|t| parse_count(&t))
        .unwrap_or(0);
    if !has_canvas && node_count > 0 {
        errors.push("Entity graph has nodes but no canvas/svg rendered".to_string());
    }

    let color_check = check_palette(page, model)?;
    errors.extend(color_check.errors.iter().cloned());

    let rendered_colors = page.graph_data(ENTITY_GRAPH_ENGINE)?.map(|d| rendered_nodes(&d));
    for node in rendered_colors.iter().flatten() {
        let expected = model.entity_color(&node.category);
        if let Some(color) = &node.color {
            if !colors_equal(color, expected) {
                errors.push(format!(
                    "Node type={} rendered color={} expected={}",
                    node.category, color, expected
                ));
            }
        }
    }

    session.switch_graph_tab(GraphTab::Query)?;
    Ok(EntityGraphCheck {
        pass: errors.is_empty(),
        errors,
        mode,
        node_count,
        has_canvas,
        color_check,
        rendered_colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockElement, MockPage};
    use serde_json::json;

    fn svg_page() -> MockPage {
        MockPage::new()
            .with_element(QUERY_GRAPH_SVG, MockElement::new())
            .with_element(QUERY_GRAPH_NODES, MockElement::new().with_class("graph-node").with_class("graph-node--query"))
            .with_element(QUERY_GRAPH_NODES, MockElement::new().with_class("graph-node").with_class("graph-node--source"))
            .with_element(QUERY_GRAPH_NODES, MockElement::new().with_class("graph-node").with_class("graph-node--source"))
            .with_element(QUERY_GRAPH_EDGES, MockElement::new())
            .with_element(QUERY_GRAPH_LABELS, MockElement::text("Query").with_rect(LabelRect::new(0.0, 0.0, 40.0, 10.0)))
            .with_element(QUERY_GRAPH_LABELS, MockElement::text("Doc").with_rect(LabelRect::new(100.0, 0.0, 40.0, 10.0)))
            .with_element(&query_node_dot("query"), MockElement::new().with_fill("rgb(100, 116, 139)"))
            .with_element(&query_node_dot("source"), MockElement::new().with_fill("rgb(107, 158, 122)"))
    }

    #[test]
    fn test_healthy_query_graph() {
        let check = check_query_graph(&mut svg_page()).unwrap();
        assert!(check.pass, "{:?}", check.errors);
        let details = check.details.unwrap();
        assert_eq!(details.node_count, 3);
        assert_eq!(details.node_type_counts["source"], 2);
        assert_eq!(details.edge_count, 1);
        assert_eq!(details.entity_node_fill, None);
        assert!(!details.has_legend);
    }

    #[test]
    fn test_missing_svg() {
        let check = check_query_graph(&mut MockPage::new()).unwrap();
        assert_eq!(check.errors, vec!["Query graph SVG not rendered".to_string()]);
        assert!(check.details.is_none());
    }

    #[test]
    fn test_stale_fill_flagged() {
        let mut page = svg_page();
        page.dom_mut()
            .set(&query_node_dot("source"), MockElement::new().with_fill("rgb(96, 165, 250)"));
        let check = check_query_graph(&mut page).unwrap();
        assert_eq!(
            check.errors,
            vec!["Source node fill uses stale color: rgb(96, 165, 250)".to_string()]
        );
    }

    #[test]
    fn test_severe_overlap_threshold() {
        let a = LabelRect::new(0.0, 0.0, 10.0, 10.0);
        // 2x10 of 100 = 20%: severe
        let b = LabelRect::new(8.0, 0.0, 10.0, 10.0);
        // 1x10 of 100 = 10%: tolerated
        let c = LabelRect::new(9.0, 0.0, 10.0, 10.0);
        // small label fully inside a large one
        let big = LabelRect::new(0.0, 50.0, 200.0, 40.0);
        let small = LabelRect::new(10.0, 60.0, 10.0, 5.0);
        assert_eq!(severe_overlaps(&[a, b]), 1);
        assert_eq!(severe_overlaps(&[a, c]), 0);
        assert_eq!(severe_overlaps(&[a, b, c, big, small]), 3);
    }

    #[test]
    fn test_node_category() {
        assert_eq!(node_category(&["graph-node".into(), "graph-node--entity".into()]), "entity");
        assert_eq!(node_category(&["graph-node".into()]), "unknown");
    }

    #[test]
    fn test_rendered_nodes_cap_and_fallbacks() {
        let nodes: Vec<Value> = (0..25)
            .map(|i| json!({ "entityType": "person", "color": "#0077bb", "id": i }))
            .chain(std::iter::once(json!({})))
            .collect();
        let parsed = rendered_nodes(&json!({ "nodes": nodes }));
        assert_eq!(parsed.len(), 20);
        assert_eq!(parsed[0].category, "PERSON");

        let untyped = rendered_nodes(&json!({ "nodes": [{ "color": "" }] }));
        assert_eq!(untyped, vec![RenderedNode { category: "UNKNOWN".into(), color: None }]);
        assert!(rendered_nodes(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 12 entities"), Some(12));
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("n/a"), None);
    }
}
