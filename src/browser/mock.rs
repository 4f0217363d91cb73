//! In-memory page for testing the harness without a browser.
//!
//! `MockPage` keeps a tiny DOM keyed by the exact selector strings the
//! harness queries, plus scripted reactions that model an asynchronous UI:
//! - `on_change` / `on_click` / `on_files` / `on_fill` / `on_theme` run when
//!   the harness acts
//! - `MockDom::schedule` applies a mutation after N further backend calls
//! - `MockDom::fail_next` makes the next N calls fail as "not settled yet"

use image::{ImageBuffer, Rgb, RgbImage};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::PathBuf;

use super::backend::{Introspect, PageBackend};
use super::types::{DriverError, DriverResult, LabelRect};

/// One element in the mock DOM
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockElement {
    pub text: String,
    pub value: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub hidden: bool,
    pub fill: Option<String>,
    pub rect: Option<LabelRect>,
}

impl MockElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_rect(mut self, rect: LabelRect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn is_visible(&self) -> bool {
        !self.hidden && !self.classes.iter().any(|c| c == "hidden")
    }
}

type Mutation = Box<dyn FnOnce(&mut MockDom) + Send>;
type Reaction = Box<dyn FnMut(&mut MockDom) + Send>;

struct Scheduled {
    remaining: u32,
    apply: Mutation,
}

/// Mutable state behind a `MockPage`
#[derive(Default)]
pub struct MockDom {
    /// Elements by selector, in document order
    pub elements: BTreeMap<String, Vec<MockElement>>,
    /// Attributes on the root element
    pub root_attributes: BTreeMap<String, String>,
    /// Custom properties by theme name, resolved through `data-theme`
    pub theme_properties: HashMap<String, BTreeMap<String, String>>,
    /// Page globals by name
    pub globals: BTreeMap<String, Value>,
    /// Alias global -> canonical global it refers to (same object)
    pub global_aliases: BTreeMap<String, String>,
    /// `graphData()` results by accessor name
    pub graph_data: BTreeMap<String, Value>,
    /// Every URL navigated to
    pub navigations: Vec<String>,
    /// Number of reloads
    pub reloads: usize,
    /// Every selector clicked (including misses)
    pub clicks: Vec<String>,
    /// Files attached per input
    pub uploads: Vec<(String, Vec<PathBuf>)>,
    /// Every value written to `data-theme`, in order
    pub theme_writes: Vec<String>,
    /// Number of screenshots taken
    pub screenshots: usize,
    /// Resource URLs the document has fetched
    pub requests: Vec<String>,
    /// Total backend calls
    pub calls: usize,
    fail_next: u32,
    pending: Vec<Scheduled>,
}

impl MockDom {
    /// Replace all elements for a selector with one element
    pub fn set(&mut self, selector: &str, element: MockElement) {
        self.elements.insert(selector.to_string(), vec![element]);
    }

    /// Append an element under a selector
    pub fn push(&mut self, selector: &str, element: MockElement) {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }

    /// Remove every element for a selector
    pub fn remove(&mut self, selector: &str) {
        self.elements.remove(selector);
    }

    /// Mutable access to the first element for a selector
    pub fn first_mut(&mut self, selector: &str) -> Option<&mut MockElement> {
        self.elements.get_mut(selector).and_then(|v| v.first_mut())
    }

    pub fn first(&self, selector: &str) -> Option<&MockElement> {
        self.elements.get(selector).and_then(|v| v.first())
    }

    /// Set the text of the first element for a selector, creating it if needed
    pub fn set_text(&mut self, selector: &str, text: &str) {
        match self.first_mut(selector) {
            Some(el) => el.text = text.to_string(),
            None => self.set(selector, MockElement::text(text)),
        }
    }

    /// Apply `apply` after `after_calls` further backend calls
    pub fn schedule<F>(&mut self, after_calls: u32, apply: F)
    where
        F: FnOnce(&mut MockDom) + Send + 'static,
    {
        self.pending.push(Scheduled {
            remaining: after_calls,
            apply: Box::new(apply),
        });
    }

    /// Make the next `calls` backend calls fail with a transient error
    pub fn fail_next(&mut self, calls: u32) {
        self.fail_next = calls;
    }

    /// Theme currently selected on the root element
    pub fn theme(&self) -> &str {
        self.root_attributes
            .get("data-theme")
            .map(String::as_str)
            .unwrap_or("light")
    }

    fn tick(&mut self) -> DriverResult<()> {
        self.calls += 1;
        let mut due = Vec::new();
        let mut waiting = Vec::new();
        for mut item in self.pending.drain(..) {
            if item.remaining == 0 {
                due.push(item.apply);
            } else {
                item.remaining -= 1;
                waiting.push(item);
            }
        }
        self.pending = waiting;
        for apply in due {
            apply(self);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(DriverError::Transient("element is not attached".to_string()));
        }
        Ok(())
    }

    fn resolve_global(&self, name: &str) -> Option<&Value> {
        match self.global_aliases.get(name) {
            Some(canonical) => self.globals.get(canonical),
            None => self.globals.get(name),
        }
    }
}

/// In-memory `PageBackend` with scripted reactions
#[derive(Default)]
pub struct MockPage {
    dom: MockDom,
    on_change: HashMap<String, Reaction>,
    on_click: HashMap<String, Reaction>,
    on_files: HashMap<String, Reaction>,
    on_fill: HashMap<String, Reaction>,
    on_theme: HashMap<String, Reaction>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dom(&self) -> &MockDom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut MockDom {
        &mut self.dom
    }

    pub fn with_element(mut self, selector: &str, element: MockElement) -> Self {
        self.dom.push(selector, element);
        self
    }

    /// Define a custom property for a theme
    pub fn with_property(mut self, theme: &str, name: &str, value: &str) -> Self {
        self.dom
            .theme_properties
            .entry(theme.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_global(mut self, name: &str, value: Value) -> Self {
        self.dom.globals.insert(name.to_string(), value);
        self
    }

    /// Make `alias` refer to the very same object as `canonical`
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.dom
            .global_aliases
            .insert(alias.to_string(), canonical.to_string());
        self
    }

    pub fn with_graph_data(mut self, accessor: &str, data: Value) -> Self {
        self.dom.graph_data.insert(accessor.to_string(), data);
        self
    }

    pub fn on_change<F>(mut self, selector: &str, reaction: F) -> Self
    where
        F: FnMut(&mut MockDom) + Send + 'static,
    {
        self.on_change.insert(selector.to_string(), Box::new(reaction));
        self
    }

    pub fn on_click<F>(mut self, selector: &str, reaction: F) -> Self
    where
        F: FnMut(&mut MockDom) + Send + 'static,
    {
        self.on_click.insert(selector.to_string(), Box::new(reaction));
        self
    }

    pub fn on_files<F>(mut self, selector: &str, reaction: F) -> Self
    where
        F: FnMut(&mut MockDom) + Send + 'static,
    {
        self.on_files.insert(selector.to_string(), Box::new(reaction));
        self
    }

    pub fn on_fill<F>(mut self, selector: &str, reaction: F) -> Self
    where
        F: FnMut(&mut MockDom) + Send + 'static,
    {
        self.on_fill.insert(selector.to_string(), Box::new(reaction));
        self
    }

    /// Run `reaction` whenever `theme` is written to the root element
    pub fn on_theme<F>(mut self, theme: &str, reaction: F) -> Self
    where
        F: FnMut(&mut MockDom) + Send + 'static,
    {
        self.on_theme.insert(theme.to_string(), Box::new(reaction));
        self
    }

    fn react(table: &mut HashMap<String, Reaction>, dom: &mut MockDom, selector: &str) {
        if let Some(reaction) = table.get_mut(selector) {
            reaction(dom);
        }
    }
}

impl Introspect for MockPage {
    fn read_global(&mut self, name: &str) -> DriverResult<Option<Value>> {
        self.dom.tick()?;
        Ok(self.dom.resolve_global(name).cloned())
    }

    fn same_global(&mut self, a: &str, b: &str) -> DriverResult<Option<bool>> {
        self.dom.tick()?;
        if self.dom.resolve_global(a).is_none() || self.dom.resolve_global(b).is_none() {
            return Ok(None);
        }
        let canonical = |name: &str| {
            self.dom
                .global_aliases
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        };
        Ok(Some(canonical(a) == canonical(b)))
    }

    fn graph_data(&mut self, accessor: &str) -> DriverResult<Option<Value>> {
        self.dom.tick()?;
        Ok(self.dom.graph_data.get(accessor).cloned())
    }
}

impl PageBackend for MockPage {
    fn source_type(&self) -> &str {
        "mock"
    }

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.dom.tick()?;
        self.dom.navigations.push(url.to_string());
        Ok(())
    }

    fn reload(&mut self) -> DriverResult<()> {
        self.dom.tick()?;
        self.dom.reloads += 1;
        Ok(())
    }

    fn count(&mut self, selector: &str) -> DriverResult<usize> {
        self.dom.tick()?;
        Ok(self.dom.elements.get(selector).map(Vec::len).unwrap_or(0))
    }

    fn is_visible(&mut self, selector: &str) -> DriverResult<bool> {
        self.dom.tick()?;
        Ok(self
            .dom
            .first(selector)
            .map(MockElement::is_visible)
            .unwrap_or(false))
    }

    fn inner_text(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.dom.tick()?;
        Ok(self.dom.first(selector).map(|el| el.text.clone()))
    }

    fn inner_texts(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        self.dom.tick()?;
        Ok(self
            .dom
            .elements
            .get(selector)
            .map(|els| els.iter().map(|el| el.text.clone()).collect())
            .unwrap_or_default())
    }

    fn value(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.dom.tick()?;
        Ok(self.dom.first(selector).map(|el| el.value.clone()))
    }

    fn attribute(&mut self, selector: &str, name: &str) -> DriverResult<Option<String>> {
        self.dom.tick()?;
        Ok(self
            .dom
            .first(selector)
            .and_then(|el| el.attributes.get(name).cloned()))
    }

    fn class_lists(&mut self, selector: &str) -> DriverResult<Vec<Vec<String>>> {
        self.dom.tick()?;
        Ok(self
            .dom
            .elements
            .get(selector)
            .map(|els| els.iter().map(|el| el.classes.clone()).collect())
            .unwrap_or_default())
    }

    fn set_value_and_dispatch(&mut self, selector: &str, value: &str) -> DriverResult<bool> {
        self.dom.tick()?;
        match self.dom.first_mut(selector) {
            Some(el) => el.value = value.to_string(),
            None => return Ok(false),
        }
        Self::react(&mut self.on_change, &mut self.dom, selector);
        Ok(true)
    }

    fn fill(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        self.dom.tick()?;
        match self.dom.first_mut(selector) {
            Some(el) => el.value = text.to_string(),
            None => return Err(DriverError::Transient(format!("{} not attached", selector))),
        }
        Self::react(&mut self.on_fill, &mut self.dom, selector);
        Ok(())
    }

    fn clear_text(&mut self, selector: &str) -> DriverResult<()> {
        self.dom.tick()?;
        if let Some(el) = self.dom.first_mut(selector) {
            el.text.clear();
        }
        Ok(())
    }

    fn click(&mut self, selector: &str) -> DriverResult<bool> {
        self.dom.tick()?;
        self.dom.clicks.push(selector.to_string());
        if self.dom.first(selector).is_none() {
            return Ok(false);
        }
        Self::react(&mut self.on_click, &mut self.dom, selector);
        Ok(true)
    }

    fn root_attribute(&mut self, name: &str) -> DriverResult<Option<String>> {
        self.dom.tick()?;
        Ok(self.dom.root_attributes.get(name).cloned())
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) -> DriverResult<()> {
        self.dom.tick()?;
        self.dom
            .root_attributes
            .insert(name.to_string(), value.to_string());
        if name == "data-theme" {
            self.dom.theme_writes.push(value.to_string());
            Self::react(&mut self.on_theme, &mut self.dom, value);
        }
        Ok(())
    }

    fn set_input_files(&mut self, selector: &str, files: &[PathBuf]) -> DriverResult<()> {
        self.dom.tick()?;
        if self.dom.first(selector).is_none() {
            return Err(DriverError::Transient(format!("{} not attached", selector)));
        }
        self.dom
            .uploads
            .push((selector.to_string(), files.to_vec()));
        Self::react(&mut self.on_files, &mut self.dom, selector);
        Ok(())
    }

    fn computed_properties(&mut self, names: &[&str]) -> DriverResult<BTreeMap<String, Option<String>>> {
        self.dom.tick()?;
        let props = self.dom.theme_properties.get(self.dom.theme());
        Ok(names
            .iter()
            .map(|name| {
                let value = props
                    .and_then(|p| p.get(*name))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                (name.to_string(), value)
            })
            .collect())
    }

    fn computed_fill(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.dom.tick()?;
        Ok(self.dom.first(selector).and_then(|el| el.fill.clone()))
    }

    fn label_rects(&mut self, selector: &str) -> DriverResult<Vec<LabelRect>> {
        self.dom.tick()?;
        Ok(self
            .dom
            .elements
            .get(selector)
            .map(|els| {
                els.iter()
                    .filter(|el| el.is_visible())
                    .filter_map(|el| el.rect)
                    .filter(|r| r.width > 0.0 && r.height > 0.0)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn resource_urls(&mut self) -> DriverResult<Vec<String>> {
        self.dom.tick()?;
        Ok(self.dom.requests.clone())
    }

    fn screenshot_png(&mut self) -> DriverResult<Vec<u8>> {
        self.dom.tick()?;
        self.dom.screenshots += 1;
        let shade = if self.dom.theme() == "dark" { 24 } else { 232 };
        let img: RgbImage = ImageBuffer::from_pixel(64, 48, Rgb([shade, shade, shade]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| DriverError::Capture(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scheduled_mutation_applies_after_calls() {
        let mut page = MockPage::new().with_element("#status", MockElement::text("idle"));
        page.dom_mut().schedule(2, |dom| dom.set_text("#status", "done"));

        assert_eq!(page.inner_text("#status").unwrap().as_deref(), Some("idle"));
        assert_eq!(page.inner_text("#status").unwrap().as_deref(), Some("idle"));
        assert_eq!(page.inner_text("#status").unwrap().as_deref(), Some("done"));
    }

    #[test]
    fn test_change_reaction_runs_on_dispatch() {
        let mut page = MockPage::new()
            .with_element("#sector-select", MockElement::new())
            .on_change("#sector-select", |dom| dom.set_text("#stats-context", "FINANCE"));

        assert!(page.set_value_and_dispatch("#sector-select", "FINANCE").unwrap());
        assert_eq!(page.value("#sector-select").unwrap().as_deref(), Some("FINANCE"));
        assert_eq!(page.inner_text("#stats-context").unwrap().as_deref(), Some("FINANCE"));
    }

    #[test]
    fn test_missing_element_reports_false() {
        let mut page = MockPage::new();
        assert!(!page.set_value_and_dispatch("#sector-select", "FINANCE").unwrap());
        assert!(!page.click("#send-btn").unwrap());
        assert!(page.fill("#query-input", "hello").unwrap_err().is_transient());
    }

    #[test]
    fn test_properties_follow_theme_attribute() {
        let mut page = MockPage::new()
            .with_property("light", "--graph-center-node", "#64748b")
            .with_property("dark", "--graph-center-node", "#475569");

        let light = page.computed_properties(&["--graph-center-node"]).unwrap();
        assert_eq!(light["--graph-center-node"].as_deref(), Some("#64748b"));

        page.set_root_attribute("data-theme", "dark").unwrap();
        let dark = page.computed_properties(&["--graph-center-node", "--missing"]).unwrap();
        assert_eq!(dark["--graph-center-node"].as_deref(), Some("#475569"));
        assert_eq!(dark["--missing"], None);
    }

    #[test]
    fn test_alias_is_identical_but_copy_is_not() {
        let palette = json!({ "PERSON": "#0077bb" });
        let mut aliased = MockPage::new()
            .with_global("entityTypeColors", palette.clone())
            .with_alias("entityColors", "entityTypeColors");
        assert_eq!(aliased.same_global("entityColors", "entityTypeColors").unwrap(), Some(true));

        let mut copied = MockPage::new()
            .with_global("entityTypeColors", palette.clone())
            .with_global("entityColors", palette);
        assert_eq!(copied.same_global("entityColors", "entityTypeColors").unwrap(), Some(false));

        let mut absent = MockPage::new().with_global("entityTypeColors", json!({}));
        assert_eq!(absent.same_global("entityColors", "entityTypeColors").unwrap(), None);
    }

    #[test]
    fn test_fail_next_is_transient() {
        let mut page = MockPage::new();
        page.dom_mut().fail_next(1);
        assert!(page.count("#x").unwrap_err().is_transient());
        assert_eq!(page.count("#x").unwrap(), 0);
    }

    #[test]
    fn test_theme_reaction_runs_after_write() {
        let mut page = MockPage::new().on_theme("light", |dom| dom.fail_next(1));
        page.set_root_attribute("data-theme", "dark").unwrap();
        assert!(page.count("#x").is_ok());

        page.set_root_attribute("data-theme", "light").unwrap();
        assert!(page.count("#x").unwrap_err().is_transient());
        assert_eq!(page.dom().theme_writes, vec!["dark", "light"]);
    }

    #[test]
    fn test_screenshot_is_png() {
        let mut page = MockPage::new();
        let png = page.screenshot_png().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(page.dom().screenshots, 1);
    }
}
