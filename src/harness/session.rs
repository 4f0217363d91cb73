//! Session controller: one browsing session against the target, with
//! conditional login and a way back to a known baseline.

use std::time::Duration;

use crate::browser::{DriverResult, PageBackend};
use crate::config::{SettleDelays, Timeouts};
use crate::harness::selectors::{
    AUTH_ERROR, AUTH_MODAL, AUTH_PASSWORD, AUTH_SUBMIT, AUTH_USERNAME, DEEP_ANALYSIS_BUTTON,
    LOADING_OVERLAY, QUERY_INPUT,
};
use crate::harness::types::{DeepAnalysis, HarnessError, HarnessResult, LoginOutcome, Target};
use crate::harness::wait::{DEFAULT_POLL_INTERVAL, Waiter, settle};

/// Exclusive owner of the page for the length of a run
pub struct Session<B: PageBackend> {
    page: B,
    target: Target,
    pub(crate) timeouts: Timeouts,
    pub(crate) delays: SettleDelays,
    poll_interval: Duration,
}

impl<B: PageBackend> Session<B> {
    /// Navigate to the target and wait until the page is usable.
    ///
    /// "Usable" means either the query input or the login prompt is
    /// present and no loading overlay is showing.
    pub fn establish(
        page: B,
        target: Target,
        timeouts: Timeouts,
        delays: SettleDelays,
    ) -> HarnessResult<Self> {
        let mut session = Self {
            page,
            target,
            timeouts,
            delays,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        tracing::info!(url = %session.target.base_url, backend = session.page.source_type(), "opening session");
        let url = session.target.base_url.clone();
        session.page.navigate(&url)?;
        session.wait_until_ready()?;
        Ok(session)
    }

    /// Override the poll interval used by every wait in this session
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn page(&self) -> &B {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut B {
        &mut self.page
    }

    pub fn into_page(self) -> B {
        self.page
    }

    pub(crate) fn waiter(&self, timeout: Duration) -> Waiter {
        Waiter::new(timeout).poll_interval(self.poll_interval)
    }

    /// Split borrow for waits that need the page and the session settings
    pub(crate) fn wait_for<F>(&mut self, timeout: Duration, description: &str, predicate: F) -> HarnessResult<()>
    where
        F: FnMut(&mut B) -> DriverResult<bool>,
    {
        let waiter = self.waiter(timeout);
        waiter.until(&mut self.page, description, predicate)
    }

    fn wait_until_ready(&mut self) -> HarnessResult<()> {
        let timeout = self.timeouts.page_ready;
        self.wait_for(timeout, "query input or login prompt", |p| {
            let surface = p.exists(QUERY_INPUT)? || p.exists(AUTH_MODAL)?;
            Ok(surface && !p.exists(LOADING_OVERLAY)?)
        })
    }

    /// Log in when the prompt is showing.
    ///
    /// A hidden or absent prompt is a fallthrough, not a failure. Rejected
    /// credentials are reported in the outcome, never retried.
    pub fn authenticate_if_needed(&mut self) -> HarnessResult<LoginOutcome> {
        if !self.page.is_visible(AUTH_MODAL)? {
            return Ok(LoginOutcome::not_needed());
        }

        let credentials = self.target.credentials.clone();
        self.page.fill(AUTH_USERNAME, &credentials.username)?;
        self.page.fill(AUTH_PASSWORD, &credentials.password)?;
        if !self.page.click(AUTH_SUBMIT)? {
            return Err(HarnessError::MissingControl(AUTH_SUBMIT.to_string()));
        }

        let timeout = self.timeouts.auth;
        let waited = self.wait_for(timeout, "login prompt to close", |p| {
            Ok(!p.is_visible(AUTH_MODAL)? || p.is_visible(AUTH_ERROR)?)
        });
        match waited {
            Ok(()) => {}
            Err(err @ HarnessError::Timeout { .. }) => {
                return Ok(LoginOutcome::rejected(err.to_string()));
            }
            Err(err) => return Err(err),
        }

        if self.page.is_visible(AUTH_ERROR)? {
            let message = self
                .page
                .inner_text(AUTH_ERROR)?
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "login rejected".to_string());
            tracing::warn!(error = %message, "login rejected");
            return Ok(LoginOutcome::rejected(message));
        }

        tracing::info!(user = %credentials.username, "logged in");
        Ok(LoginOutcome::succeeded())
    }

    /// Like `authenticate_if_needed`, but rejected credentials are fatal
    pub fn require_login(&mut self) -> HarnessResult<LoginOutcome> {
        let outcome = self.authenticate_if_needed()?;
        if outcome.is_rejected() {
            let message = outcome.error.clone().unwrap_or_else(|| "unknown error".to_string());
            return Err(HarnessError::AuthFailed(message));
        }
        Ok(outcome)
    }

    /// Wait for a control the run cannot do without
    pub fn require_control(&mut self, selector: &str) -> HarnessResult<()> {
        let timeout = self.timeouts.context;
        let description = format!("control {}", selector);
        match self.wait_for(timeout, &description, |p| p.exists(selector)) {
            Err(HarnessError::Timeout { .. }) => Err(HarnessError::MissingControl(selector.to_string())),
            other => other,
        }
    }

    /// Reload, wait for readiness and log in again
    pub fn reset_to_baseline(&mut self) -> HarnessResult<LoginOutcome> {
        tracing::info!("resetting session to baseline");
        self.page.reload()?;
        self.wait_until_ready()?;
        self.require_login()
    }

    /// Turn on deep analysis (needed for the entity graph) when offered
    pub fn ensure_deep_analysis(&mut self) -> HarnessResult<DeepAnalysis> {
        if !self.page.is_visible(DEEP_ANALYSIS_BUTTON)? {
            return Ok(DeepAnalysis { enabled: false });
        }
        let pressed = self.page.attribute(DEEP_ANALYSIS_BUTTON, "aria-pressed")?;
        if pressed.as_deref() != Some("true") {
            self.page.click(DEEP_ANALYSIS_BUTTON)?;
            settle(self.delays.toggle);
        }
        Ok(DeepAnalysis { enabled: true })
    }
}
