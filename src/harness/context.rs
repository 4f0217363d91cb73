//! Context ("sector") selection.
//!
//! The application only reacts to a dispatched `change` event on the
//! selector, so the value write and the event are one backend call.

use crate::browser::PageBackend;
use crate::harness::selectors::{SECTOR_OPTIONS, SECTOR_SELECT, STATS_CONTEXT};
use crate::harness::session::Session;
use crate::harness::types::{HarnessError, HarnessResult};
use crate::model::ContextId;

impl<B: PageBackend> Session<B> {
    /// Switch the active context and confirm the switch propagated.
    ///
    /// Waits for the control value and, when the page shows one, the
    /// status readout. Either never matching is a `ContextMismatch`.
    pub fn select_context(&mut self, context: ContextId) -> HarnessResult<()> {
        let wanted = context.as_str();
        if !self.page_mut().set_value_and_dispatch(SECTOR_SELECT, wanted)? {
            return Err(HarnessError::MissingControl(SECTOR_SELECT.to_string()));
        }

        let timeout = self.timeouts.context;
        let description = format!("context {}", wanted);
        let waited = self.wait_for(timeout, &description, |p| {
            if p.value(SECTOR_SELECT)?.as_deref() != Some(wanted) {
                return Ok(false);
            }
            Ok(match p.inner_text(STATS_CONTEXT)? {
                Some(readout) => readout.trim() == wanted,
                None => true,
            })
        });

        match waited {
            Ok(()) => {
                tracing::debug!(context = wanted, "context selected");
                Ok(())
            }
            Err(HarnessError::Timeout { .. }) => {
                let actual = self.page_mut().value(SECTOR_SELECT).ok().flatten();
                let readout = self
                    .page_mut()
                    .inner_text(STATS_CONTEXT)
                    .ok()
                    .flatten()
                    .map(|t| t.trim().to_string());
                Err(HarnessError::ContextMismatch {
                    expected: wanted.to_string(),
                    actual,
                    readout,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Option labels offered by the context selector
    pub fn context_options(&mut self) -> HarnessResult<Vec<String>> {
        Ok(self
            .page_mut()
            .inner_texts(SECTOR_OPTIONS)?
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }
}
