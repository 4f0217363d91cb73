//! Page backend abstraction for driving the application under test.
//!
//! The harness never talks to a browser directly. It talks to:
//! - `PageBackend` for DOM-level reads and user-like actions
//! - `Introspect` for page-global script state (palette tables, graph data)
//!
//! `ChromeBackend` implements both over the Chrome DevTools Protocol;
//! `MockPage` (see `mock.rs`) implements them in memory for tests.

use headless_chrome::protocol::cdp::{DOM, Page};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::types::{DriverError, DriverResult, LabelRect};

/// Narrow port onto page-global script state.
///
/// Implementations decide how a global is reached; callers only name it.
pub trait Introspect {
    /// Read a page global by name, `None` when it is not defined
    fn read_global(&mut self, name: &str) -> DriverResult<Option<Value>>;

    /// Reference identity of two globals, `None` when either is undefined
    fn same_global(&mut self, a: &str, b: &str) -> DriverResult<Option<bool>>;

    /// Call `graphData()` on the named graph engine global, `None` when absent
    fn graph_data(&mut self, accessor: &str) -> DriverResult<Option<Value>>;
}

/// DOM contract the harness relies on.
///
/// Selectors are CSS selectors; "first" means the first match in document order.
pub trait PageBackend: Introspect {
    /// Source type identifier (e.g., "chrome", "mock")
    fn source_type(&self) -> &str;

    /// Navigate to a URL and wait for the navigation to commit
    fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Reload the current document
    fn reload(&mut self) -> DriverResult<()>;

    /// Number of elements matching the selector
    fn count(&mut self, selector: &str) -> DriverResult<usize>;

    /// Whether at least one element matches the selector
    fn exists(&mut self, selector: &str) -> DriverResult<bool> {
        Ok(self.count(selector)? > 0)
    }

    /// Whether the first match is rendered (present, not `.hidden`, displayed)
    fn is_visible(&mut self, selector: &str) -> DriverResult<bool>;

    /// Rendered text of the first match
    fn inner_text(&mut self, selector: &str) -> DriverResult<Option<String>>;

    /// Rendered text of every match, in document order
    fn inner_texts(&mut self, selector: &str) -> DriverResult<Vec<String>>;

    /// Form value of the first match
    fn value(&mut self, selector: &str) -> DriverResult<Option<String>>;

    /// Attribute of the first match
    fn attribute(&mut self, selector: &str, name: &str) -> DriverResult<Option<String>>;

    /// Class lists of every match, in document order
    fn class_lists(&mut self, selector: &str) -> DriverResult<Vec<Vec<String>>>;

    /// Assign a form value and dispatch a bubbling `change` event in one step.
    ///
    /// Returns `false` when no element matches.
    fn set_value_and_dispatch(&mut self, selector: &str, value: &str) -> DriverResult<bool>;

    /// Replace the text of a field and dispatch `input`, like typing into it
    fn fill(&mut self, selector: &str, text: &str) -> DriverResult<()>;

    /// Clear the text content of the first match (no-op when absent)
    fn clear_text(&mut self, selector: &str) -> DriverResult<()>;

    /// Click the first match; returns `false` when no element matches
    fn click(&mut self, selector: &str) -> DriverResult<bool>;

    /// Attribute on the root (`<html>`) element
    fn root_attribute(&mut self, name: &str) -> DriverResult<Option<String>>;

    /// Set an attribute on the root (`<html>`) element
    fn set_root_attribute(&mut self, name: &str, value: &str) -> DriverResult<()>;

    /// Attach files to a file input and let the page observe the change
    fn set_input_files(&mut self, selector: &str, files: &[PathBuf]) -> DriverResult<()>;

    /// Computed values of custom properties on the root element (`None` when empty)
    fn computed_properties(&mut self, names: &[&str]) -> DriverResult<BTreeMap<String, Option<String>>>;

    /// Computed `fill` of the first match
    fn computed_fill(&mut self, selector: &str) -> DriverResult<Option<String>>;

    /// Bounding boxes of visible, non-empty matches
    fn label_rects(&mut self, selector: &str) -> DriverResult<Vec<LabelRect>>;

    /// URLs of every resource the current document has fetched
    fn resource_urls(&mut self) -> DriverResult<Vec<String>>;

    /// PNG of the full document
    fn screenshot_png(&mut self) -> DriverResult<Vec<u8>>;
}

/// Configuration for the Chrome backend
#[derive(Debug, Clone)]
pub struct ChromeBackendConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Window size in pixels
    pub window_size: (u32, u32),
    /// How long the browser may sit idle before the connection is dropped
    pub idle_timeout: Duration,
}

impl Default for ChromeBackendConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1440, 900),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl ChromeBackendConfig {
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }
}

/// Chrome DevTools Protocol backend.
///
/// Every evaluation is wrapped so that values come back through
/// `JSON.stringify` and script exceptions surface as transient errors.
pub struct ChromeBackend {
    // Owns the browser process; dropping it closes the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeBackend {
    /// Launch a browser and open one tab
    pub fn launch(config: &ChromeBackendConfig) -> DriverResult<Self> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .idle_browser_timeout(config.idle_timeout)
            .build()
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| DriverError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Evaluate a function body (must `return` a JSON-serializable value)
    fn eval(&self, body: &str) -> DriverResult<Value> {
        let expression = format!(
            "JSON.stringify((function() {{ try {{ return {{ ok: (function() {{ {} }})() }}; }} catch (e) {{ return {{ err: String(e) }}; }} }})())",
            body
        );
        let object = self
            .tab
            .evaluate(&expression, false)
            .map_err(|e| evaluation_error(e.to_string()))?;
        let envelope = match object.value {
            Some(Value::String(json)) => serde_json::from_str::<Value>(&json)?,
            _ => return Ok(Value::Null),
        };
        if let Some(err) = envelope.get("err").and_then(Value::as_str) {
            return Err(DriverError::Transient(err.to_string()));
        }
        Ok(envelope.get("ok").cloned().unwrap_or(Value::Null))
    }

    fn eval_as<T: serde::de::DeserializeOwned>(&self, body: &str) -> DriverResult<T> {
        Ok(serde_json::from_value(self.eval(body)?)?)
    }
}

/// CDP messages for an evaluation that raced a document swap
const CONTEXT_GONE: [&str; 3] = [
    "cannot find context with specified id",
    "execution context was destroyed",
    "inspected target navigated or closed",
];

/// Classify a failed `Runtime.evaluate`; a vanished context is retried by pollers
fn evaluation_error(message: String) -> DriverError {
    let lower = message.to_lowercase();
    if CONTEXT_GONE.iter().any(|m| lower.contains(m)) {
        DriverError::Transient(message)
    } else {
        DriverError::Evaluation(message)
    }
}

/// Encode a Rust string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// Names interpolated as bare identifiers must be plain JS identifiers
fn js_ident(name: &str) -> DriverResult<&str> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false);
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        Ok(name)
    } else {
        Err(DriverError::Evaluation(format!("not a global identifier: {:?}", name)))
    }
}

impl Introspect for ChromeBackend {
    fn read_global(&mut self, name: &str) -> DriverResult<Option<Value>> {
        let name = js_ident(name)?;
        self.eval_as(&format!(
            "return (typeof {0} === 'undefined') ? null : {0};",
            name
        ))
    }

    fn same_global(&mut self, a: &str, b: &str) -> DriverResult<Option<bool>> {
        let (a, b) = (js_ident(a)?, js_ident(b)?);
        self.eval_as(&format!(
            "if (typeof {0} === 'undefined' || typeof {1} === 'undefined') return null; return {0} === {1};",
            a, b
        ))
    }

    fn graph_data(&mut self, accessor: &str) -> DriverResult<Option<Value>> {
        let accessor = js_ident(accessor)?;
        self.eval_as(&format!(
            "const g = (typeof {0} !== 'undefined') ? {0} : null; \
             if (!g || typeof g.graphData !== 'function') return null; \
             return g.graphData() || {{}};",
            accessor
        ))
    }
}

impl PageBackend for ChromeBackend {
    fn source_type(&self) -> &str {
        "chrome"
    }

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| DriverError::Navigation(e.to_string()))?
            .wait_until_navigated()
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    fn reload(&mut self) -> DriverResult<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| DriverError::Navigation(e.to_string()))?
            .wait_until_navigated()
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    fn count(&mut self, selector: &str) -> DriverResult<usize> {
        self.eval_as(&format!(
            "return document.querySelectorAll({}).length;",
            js_str(selector)
        ))
    }

    fn is_visible(&mut self, selector: &str) -> DriverResult<bool> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); \
             if (!el || el.classList.contains('hidden')) return false; \
             const style = window.getComputedStyle(el); \
             if (style.display === 'none' || style.visibility === 'hidden') return false; \
             return el.getClientRects().length > 0;",
            js_str(selector)
        ))
    }

    fn inner_text(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); return el ? (el.innerText || el.textContent || '') : null;",
            js_str(selector)
        ))
    }

    fn inner_texts(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        self.eval_as(&format!(
            "return Array.from(document.querySelectorAll({})).map(el => el.innerText || el.textContent || '');",
            js_str(selector)
        ))
    }

    fn value(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); return el ? String(el.value) : null;",
            js_str(selector)
        ))
    }

    fn attribute(&mut self, selector: &str, name: &str) -> DriverResult<Option<String>> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); return el ? el.getAttribute({}) : null;",
            js_str(selector),
            js_str(name)
        ))
    }

    fn class_lists(&mut self, selector: &str) -> DriverResult<Vec<Vec<String>>> {
        self.eval_as(&format!(
            "return Array.from(document.querySelectorAll({})).map(el => Array.from(el.classList));",
            js_str(selector)
        ))
    }

    fn set_value_and_dispatch(&mut self, selector: &str, value: &str) -> DriverResult<bool> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); \
             if (!el) return false; \
             el.value = {}; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;",
            js_str(selector),
            js_str(value)
        ))
    }

    fn fill(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        let found: bool = self.eval_as(&format!(
            "const el = document.querySelector({}); \
             if (!el) return false; \
             el.focus(); \
             el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             return true;",
            js_str(selector),
            js_str(text)
        ))?;
        if found {
            Ok(())
        } else {
            Err(DriverError::Transient(format!("{} not attached", selector)))
        }
    }

    fn clear_text(&mut self, selector: &str) -> DriverResult<()> {
        self.eval(&format!(
            "const el = document.querySelector({}); if (el) el.textContent = ''; return null;",
            js_str(selector)
        ))?;
        Ok(())
    }

    fn click(&mut self, selector: &str) -> DriverResult<bool> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); if (!el) return false; el.click(); return true;",
            js_str(selector)
        ))
    }

    fn root_attribute(&mut self, name: &str) -> DriverResult<Option<String>> {
        self.eval_as(&format!(
            "return document.documentElement.getAttribute({});",
            js_str(name)
        ))
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) -> DriverResult<()> {
        self.eval(&format!(
            "document.documentElement.setAttribute({}, {}); return null;",
            js_str(name),
            js_str(value)
        ))?;
        Ok(())
    }

    fn set_input_files(&mut self, selector: &str, files: &[PathBuf]) -> DriverResult<()> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| DriverError::Transient(format!("{}: {}", selector, e)))?;
        let files = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        self.tab
            .call_method(DOM::SetFileInputFiles {
                files,
                node_id: None,
                backend_node_id: None,
                object_id: Some(element.remote_object_id.clone()),
            })
            .map_err(|e| DriverError::Evaluation(e.to_string()))?;
        Ok(())
    }

    fn computed_properties(&mut self, names: &[&str]) -> DriverResult<BTreeMap<String, Option<String>>> {
        let names_json = serde_json::to_string(names)?;
        self.eval_as(&format!(
            "const style = getComputedStyle(document.documentElement); \
             const result = {{}}; \
             for (const v of {}) {{ const val = style.getPropertyValue(v).trim(); result[v] = val || null; }} \
             return result;",
            names_json
        ))
    }

    fn computed_fill(&mut self, selector: &str) -> DriverResult<Option<String>> {
        self.eval_as(&format!(
            "const el = document.querySelector({}); \
             if (!el) return null; \
             return window.getComputedStyle(el).fill || el.getAttribute('fill') || null;",
            js_str(selector)
        ))
    }

    fn label_rects(&mut self, selector: &str) -> DriverResult<Vec<LabelRect>> {
        self.eval_as(&format!(
            "return Array.from(document.querySelectorAll({})) \
               .filter(el => {{ const s = window.getComputedStyle(el); return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0'; }}) \
               .map(el => el.getBoundingClientRect()) \
               .filter(r => r.width > 0 && r.height > 0) \
               .map(r => ({{ left: r.left, top: r.top, width: r.width, height: r.height }}));",
            js_str(selector)
        ))
    }

    fn resource_urls(&mut self) -> DriverResult<Vec<String>> {
        // The resource timeline restarts with every navigation
        self.eval_as(
            "return [location.href].concat(performance.getEntriesByType('resource').map(e => e.name));",
        )
    }

    fn screenshot_png(&mut self) -> DriverResult<Vec<u8>> {
        let (width, height): (f64, f64) = self.eval_as(
            "const d = document.documentElement; \
             return [Math.max(d.scrollWidth, window.innerWidth), Math.max(d.scrollHeight, window.innerHeight)];",
        )?;
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width,
            height,
            scale: 1.0,
        };
        self.tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(clip),
                true,
            )
            .map_err(|e| DriverError::Capture(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str(r#".graph-subtab[data-graph-tab="entity"]"#), r#"".graph-subtab[data-graph-tab=\"entity\"]""#);
    }

    #[test]
    fn test_js_ident_accepts_globals() {
        assert!(js_ident("entityTypeColors").is_ok());
        assert!(js_ident("entity2DGraph").is_ok());
        assert!(js_ident("_private$").is_ok());
    }

    #[test]
    fn test_js_ident_rejects_expressions() {
        assert!(js_ident("window.alert(1)").is_err());
        assert!(js_ident("2DGraph").is_err());
        assert!(js_ident("").is_err());
    }

    #[test]
    fn test_document_swap_is_transient() {
        let err = evaluation_error("Method call error -32000: Cannot find context with specified id".into());
        assert!(err.is_transient());
        assert!(evaluation_error("Execution context was destroyed.".into()).is_transient());
        assert!(!evaluation_error("Uncaught SyntaxError: Unexpected token".into()).is_transient());
    }

    #[test]
    fn test_chrome_config_builder() {
        let config = ChromeBackendConfig::default().headless(false).window_size(800, 600);
        assert!(!config.headless);
        assert_eq!(config.window_size, (800, 600));
    }
}
