//! Graph style suite: CSS custom properties per theme, then query and
//! entity graph rendering in every context under both themes.
//!
//! Phases run strictly forward:
//! `Init -> StyleCheck -> Seed -> PerContextVerify -> AggregateVerify -> Done`.
//! `Seed` is skipped when documents were loaded out of band.

use serde_json::json;
use std::fmt;
use std::path::PathBuf;

use crate::browser::PageBackend;
use crate::harness::selectors::SECTOR_SELECT;
use crate::harness::wait::settle;
use crate::harness::{HarnessResult, Session};
use crate::inspect::{check_css_variables, check_entity_graph, check_query_graph};
use crate::model::{ContextId, ContextPlan, EntityGraphMode, StyleModel, Theme, graph_style_plans};

use super::types::{CheckCategory, CheckResult, RunOutcome};
use super::{Recorder, RunnerSettings};

pub const RUN_LABEL: &str = "GRAPH_STYLES";
pub const REPORT_NAME: &str = "results_graph_styles.json";
const SCREENSHOT_PREFIX: &str = "graphstyle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Init,
    StyleCheck,
    Seed,
    PerContextVerify,
    AggregateVerify,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "INIT",
            Phase::StyleCheck => "STYLE_CHECK",
            Phase::Seed => "SEED",
            Phase::PerContextVerify => "PER_CONTEXT_VERIFY",
            Phase::AggregateVerify => "AGGREGATE_VERIFY",
            Phase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Phases entered so far, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseLog {
    visited: Vec<Phase>,
}

impl PhaseLog {
    fn new() -> Self {
        Self { visited: vec![Phase::Init] }
    }

    pub fn current(&self) -> Phase {
        self.visited.last().copied().unwrap_or(Phase::Init)
    }

    pub fn visited(&self) -> &[Phase] {
        &self.visited
    }

    fn advance(&mut self, next: Phase) {
        let current = self.current();
        assert!(next > current, "phase {} cannot follow {}", next, current);
        tracing::debug!(from = %current, to = %next, "phase transition");
        self.visited.push(next);
    }
}

pub struct GraphStyleSuite<'m> {
    settings: RunnerSettings,
    model: &'m StyleModel,
    plans: Vec<ContextPlan>,
    skip_seed: bool,
    test_docs_dir: PathBuf,
}

impl<'m> GraphStyleSuite<'m> {
    pub fn new(settings: RunnerSettings, model: &'m StyleModel) -> Self {
        Self {
            settings,
            model,
            plans: graph_style_plans(),
            skip_seed: false,
            test_docs_dir: PathBuf::from("test_docs"),
        }
    }

    pub fn skip_seed(mut self, skip: bool) -> Self {
        self.skip_seed = skip;
        self
    }

    pub fn test_docs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_docs_dir = dir.into();
        self
    }

    /// Restrict the run to some contexts (default: all, in enum order)
    pub fn contexts(mut self, contexts: &[ContextId]) -> Self {
        self.plans.retain(|p| contexts.contains(&p.context));
        self
    }

    /// Open a session on `page` and run every phase
    pub fn run<B: PageBackend>(&self, page: B) -> HarnessResult<RunOutcome> {
        let mut session = self.settings.open_session(page)?;
        self.run_in(&mut session).map(|(outcome, _)| outcome)
    }

    /// Run every phase in an established session
    pub fn run_in<B: PageBackend>(&self, session: &mut Session<B>) -> HarnessResult<(RunOutcome, PhaseLog)> {
        let mut recorder = self.settings.recorder(RUN_LABEL, SCREENSHOT_PREFIX);
        let mut phases = PhaseLog::new();
        let result = self.run_phases(session, &mut recorder, &mut phases);
        recorder.metadata(
            "phases",
            json!(phases.visited().iter().map(ToString::to_string).collect::<Vec<_>>()),
        );
        recorder.conclude(result).map(|outcome| (outcome, phases))
    }

    fn run_phases<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        phases: &mut PhaseLog,
    ) -> HarnessResult<()> {
        let login = session.require_login()?;
        recorder.metadata("login", json!(login));
        session.require_control(SECTOR_SELECT)?;
        let deep = session.ensure_deep_analysis()?;
        recorder.metadata("deepAnalysis", json!(deep));

        phases.advance(Phase::StyleCheck);
        recorder.phase("Phase 1: CSS Variable Verification");
        let styles = self.check_styles(session, recorder);
        recorder.contain(session, "CSS variable verification", styles)?;

        if self.skip_seed {
            recorder.phase("Phase 2: Skipping seed");
        } else {
            phases.advance(Phase::Seed);
            recorder.phase("Phase 2: Seeding Documents");
            self.seed(session, recorder)?;
        }

        phases.advance(Phase::PerContextVerify);
        recorder.phase("Phase 3: Per-Context Graph Style Verification");
        for plan in &self.plans {
            tracing::info!(context = %plan.context, "verifying context");
            let verified = self.verify_context_restoring(session, recorder, plan, deep.enabled);
            let label = format!("{} graph verification", plan.context);
            recorder.contain(session, &label, verified)?;
        }

        phases.advance(Phase::AggregateVerify);
        if deep.enabled {
            recorder.phase("Phase 4: Context-wide Entity Graph");
            for plan in &self.plans {
                let checked = self.verify_context_wide(session, recorder, plan.context);
                let label = format!("{} sector-wide entity graph", plan.context);
                recorder.contain(session, &label, checked)?;
            }
        } else {
            recorder.phase("Phase 4: Skipping context-wide entity graph (deep analysis unavailable)");
        }

        phases.advance(Phase::Done);
        Ok(())
    }

    fn check_styles<B: PageBackend>(&self, session: &mut Session<B>, recorder: &mut Recorder) -> HarnessResult<()> {
        let original = session.current_theme()?;
        let checked = Theme::ALL
            .into_iter()
            .try_for_each(|theme| self.check_theme_styles(session, recorder, theme));
        let restored = session.set_theme(original);
        checked.and(restored)
    }

    fn check_theme_styles<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        theme: Theme,
    ) -> HarnessResult<()> {
        session.set_theme(theme)?;
        let css = check_css_variables(session.page_mut(), theme, self.model)?;
        let check = CheckResult::new(CheckCategory::Css, format!("CSS variables: {} mode", theme), css.errors.clone())
            .under_theme(theme)
            .with_detail(&css);
        recorder.record(session, check);
        Ok(())
    }

    fn seed<B: PageBackend>(&self, session: &mut Session<B>, recorder: &mut Recorder) -> HarnessResult<()> {
        for plan in &self.plans {
            let label = format!("{} seed upload", plan.context);
            let seeded = self.seed_context(session, plan);
            recorder.contain(session, &label, seeded)?;
        }
        settle(session.delays.seed);
        Ok(())
    }

    fn seed_context<B: PageBackend>(&self, session: &mut Session<B>, plan: &ContextPlan) -> HarnessResult<()> {
        session.select_context(plan.context)?;
        for name in plan.uploads {
            let status = session.upload_file(&self.test_docs_dir.join(name))?;
            tracing::info!(context = %plan.context, file = *name, %status, "seeded");
        }
        Ok(())
    }

    /// Verify one context; an abort puts the starting theme back
    fn verify_context_restoring<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        plan: &ContextPlan,
        deep_analysis: bool,
    ) -> HarnessResult<()> {
        let before = session.current_theme()?;
        let verified = self.verify_context(session, recorder, plan, before, deep_analysis);
        if verified.is_err() {
            if let Err(err) = session.set_theme(before) {
                tracing::warn!(context = %plan.context, %err, "theme not restored after abort");
            }
        }
        verified
    }

    fn verify_context<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        plan: &ContextPlan,
        before: Theme,
        deep_analysis: bool,
    ) -> HarnessResult<()> {
        let context = plan.context;
        session.select_context(context)?;
        session.submit_query(plan.query)?;

        self.inspect_graphs(session, recorder, context, before, deep_analysis)?;
        let other = before.toggled();
        session.set_theme(other)?;
        self.inspect_graphs(session, recorder, context, other, deep_analysis)?;

        session.set_theme(before)?;
        let after = session.current_theme()?;
        let errors = if after == before {
            Vec::new()
        } else {
            vec![format!("theme after {} is {}, was {} before", context, after, before)]
        };
        let check = CheckResult::new(CheckCategory::ThemeRestore, format!("{} theme restored", context), errors)
            .in_context(context)
            .under_theme(before)
            .with_detail(&json!({ "before": before, "after": after }));
        recorder.record(session, check);

        recorder.capture(session, &format!("{}_graphs", context));
        Ok(())
    }

    fn inspect_graphs<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        context: ContextId,
        theme: Theme,
        deep_analysis: bool,
    ) -> HarnessResult<()> {
        let query_graph = check_query_graph(session.page_mut())?;
        let check = CheckResult::new(
            CheckCategory::QueryGraph,
            format!("{} query graph: {}", context, theme),
            query_graph.errors.clone(),
        )
        .in_context(context)
        .under_theme(theme)
        .with_detail(&query_graph);
        recorder.record(session, check);

        if deep_analysis {
            let entity_graph = check_entity_graph(session, EntityGraphMode::Context, self.model)?;
            let check = CheckResult::new(
                CheckCategory::EntityGraph,
                format!("{} entity graph: {}", context, theme),
                entity_graph.errors.clone(),
            )
            .in_context(context)
            .under_theme(theme)
            .with_detail(&entity_graph);
            recorder.record(session, check);
        }
        Ok(())
    }

    fn verify_context_wide<B: PageBackend>(
        &self,
        session: &mut Session<B>,
        recorder: &mut Recorder,
        context: ContextId,
    ) -> HarnessResult<()> {
        session.select_context(context)?;
        let entity_graph = check_entity_graph(session, EntityGraphMode::Sector, self.model)?;
        let check = CheckResult::new(
            CheckCategory::EntityGraphSector,
            format!("{} sector-wide entity graph", context),
            entity_graph.errors.clone(),
        )
        .in_context(context)
        .with_detail(&entity_graph);
        recorder.record(session, check);
        Ok(())
    }
}
