//! Action primitives: one user-like action plus the wait that tells the
//! harness the UI caught up.

use std::path::{Path, PathBuf};

use crate::browser::PageBackend;
use crate::harness::selectors::{
    ASSISTANT_BUBBLE, ASSISTANT_MESSAGE, AUTH_MODAL, FILE_INPUT, GRAPH_PLACEHOLDER,
    LOADING_INDICATOR, QUERY_INPUT, SEND_BUTTON, SOURCE_ITEMS, THEME_ATTRIBUTE, UPLOAD_STATUS,
    entity_mode_button, graph_tab_button,
};
use crate::harness::session::Session;
use crate::harness::types::{HarnessError, HarnessResult, QueryResponse};
use crate::harness::wait::settle;
use crate::model::{EntityGraphMode, GraphTab, Theme};

/// Status wording that ends an upload, successful or not
const UPLOAD_TERMINAL_WORDS: [&str; 6] = [
    "ingested",
    "failed",
    "blocked",
    "not allowed",
    "unsupported",
    "security",
];

fn is_upload_terminal(status: &str) -> bool {
    let status = status.to_lowercase();
    UPLOAD_TERMINAL_WORDS.iter().any(|w| status.contains(w))
}

fn trimmed_non_empty(texts: Vec<String>) -> Vec<String> {
    texts
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl<B: PageBackend> Session<B> {
    /// Upload one file and wait until the status region reports an outcome.
    ///
    /// Failure wording counts as completion; the returned status text is
    /// left for the caller to interpret.
    pub fn upload_file(&mut self, path: &Path) -> HarnessResult<String> {
        if !path.is_file() {
            return Err(HarnessError::MissingFixture(path.to_path_buf()));
        }
        tracing::info!(file = %path.display(), "uploading");

        // A status left over from the previous upload would end the wait at once
        self.page_mut().clear_text(UPLOAD_STATUS)?;
        self.page_mut().set_input_files(FILE_INPUT, &[path.to_path_buf()])?;

        let timeout = self.timeouts.upload;
        let description = format!("upload status for {}", path.display());
        self.wait_for(timeout, &description, |p| {
            Ok(p.inner_text(UPLOAD_STATUS)?
                .map(|t| is_upload_terminal(&t))
                .unwrap_or(false))
        })?;

        let status = self
            .page_mut()
            .inner_text(UPLOAD_STATUS)?
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        settle(self.delays.action);
        Ok(status)
    }

    /// Upload files one after another, returning each status
    pub fn upload_files(&mut self, paths: &[PathBuf]) -> HarnessResult<Vec<String>> {
        paths.iter().map(|p| self.upload_file(p)).collect()
    }

    /// Submit a query and wait for the complete answer.
    ///
    /// Completion needs both a new assistant message and no loading
    /// indicator: the message appears before streaming ends.
    pub fn submit_query(&mut self, query: &str) -> HarnessResult<QueryResponse> {
        if self.page_mut().is_visible(AUTH_MODAL)? {
            tracing::info!("login prompt reappeared before query");
            self.require_login()?;
        }

        let baseline = self.page_mut().count(ASSISTANT_MESSAGE)?;
        self.page_mut().fill(QUERY_INPUT, query)?;
        if !self.page_mut().click(SEND_BUTTON)? {
            return Err(HarnessError::MissingControl(SEND_BUTTON.to_string()));
        }

        let start = self.timeouts.response_start;
        self.wait_for(start, "new assistant message", |p| {
            Ok(p.count(ASSISTANT_MESSAGE)? > baseline)
        })?;
        let complete = self.timeouts.response_complete;
        self.wait_for(complete, "loading indicator to clear", |p| {
            Ok(!p.exists(LOADING_INDICATOR)?)
        })?;

        let page = self.page_mut();
        let mut messages = page.inner_texts(ASSISTANT_BUBBLE)?;
        if messages.is_empty() {
            messages = page.inner_texts(ASSISTANT_MESSAGE)?;
        }
        let response_text = messages
            .pop()
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        let sources = trimmed_non_empty(page.inner_texts(SOURCE_ITEMS)?);
        let placeholder_visible = page.is_visible(GRAPH_PLACEHOLDER)?;

        tracing::debug!(chars = response_text.len(), sources = sources.len(), "response complete");
        settle(self.delays.action);
        Ok(QueryResponse {
            response_text,
            sources,
            placeholder_visible,
        })
    }

    /// Switch theme by writing the root `data-theme` attribute.
    ///
    /// Harness shortcut: this bypasses the user-facing toggle (and whatever
    /// persistence it does), so it only proves the stylesheet reacts to the
    /// attribute.
    pub fn set_theme(&mut self, theme: Theme) -> HarnessResult<()> {
        self.page_mut().set_root_attribute(THEME_ATTRIBUTE, theme.as_str())?;
        settle(self.delays.theme);
        Ok(())
    }

    /// Theme on the root element; unset means light
    pub fn current_theme(&mut self) -> HarnessResult<Theme> {
        let raw = self.page_mut().root_attribute(THEME_ATTRIBUTE)?;
        Ok(match raw.as_deref().map(str::parse::<Theme>) {
            Some(Ok(theme)) => theme,
            Some(Err(err)) => {
                tracing::warn!(%err, "unrecognized theme attribute, assuming light");
                Theme::Light
            }
            None => Theme::Light,
        })
    }

    /// Press the graph tab button; returns `false` when the page has none
    pub fn switch_graph_tab(&mut self, tab: GraphTab) -> HarnessResult<bool> {
        let clicked = self.page_mut().click(&graph_tab_button(tab))?;
        if !clicked {
            tracing::debug!(tab = tab.as_str(), "graph tab button not found");
        }
        settle(self.delays.graph_tab);
        Ok(clicked)
    }

    /// Press the entity graph mode button; returns `false` when the page has none
    pub fn set_entity_graph_mode(&mut self, mode: EntityGraphMode) -> HarnessResult<bool> {
        let clicked = self.page_mut().click(&entity_mode_button(mode))?;
        if !clicked {
            tracing::debug!(mode = mode.as_str(), "entity mode button not found");
        }
        settle(self.delays.entity_mode);
        Ok(clicked)
    }
}
