// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequential execution of stages with best-effort teardown.

use crate::context::ScenarioContext;
use crate::error::Result;
use futures::future::BoxFuture;
use std::fmt;
use tracing::{error, info, info_span, warn, Instrument};

/// Body of a step. Borrows the context for the duration of the step.
pub type StepFn = for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<()>>;

/// One named action of a stage
#[derive(Clone)]
pub struct Step {
    pub name: &'static str,
    /// Teardown steps run even after an earlier step of the stage failed
    pub clean: bool,
    run: StepFn,
}

impl Step {
    pub fn new(name: &'static str, run: StepFn) -> Self {
        Self {
            name,
            clean: false,
            run,
        }
    }

    pub fn clean(name: &'static str, run: StepFn) -> Self {
        Self {
            name,
            clean: true,
            run,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("clean", &self.clean)
            .finish()
    }
}

/// An ordered group of steps sharing one stash
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self { name, steps }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Failed(String),
    /// Not run, because an earlier step of the stage failed or only teardown was requested
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub stage: &'static str,
    pub step: &'static str,
    pub status: StepStatus,
}

/// Outcome of every step of a run, in execution order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    fn count(&self, wanted: fn(&StepStatus) -> bool) -> usize {
        self.steps.iter().filter(|s| wanted(&s.status)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Passed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Skipped))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failures().count(),
            self.skipped()
        )
    }
}

/// Run stages in order.
///
/// Within a stage, the first failing step skips the remaining regular steps.
/// Clean steps always run. A failure never stops later stages. With
/// `clean_only`, every regular step is skipped.
pub async fn run(ctx: &mut ScenarioContext, stages: &[Stage], clean_only: bool) -> RunReport {
    let mut report = RunReport::default();

    for stage in stages {
        ctx.reset();
        let span = info_span!("stage", stage = stage.name);
        run_stage(ctx, stage, clean_only, &mut report)
            .instrument(span)
            .await;
    }

    if report.is_success() {
        info!(%report, "Run finished");
    } else {
        for failure in report.failures() {
            error!(stage = failure.stage, step = failure.step, "Step failed");
        }
        error!(%report, "Run finished with failures");
    }
    report
}

async fn run_stage(
    ctx: &mut ScenarioContext,
    stage: &Stage,
    clean_only: bool,
    report: &mut RunReport,
) {
    let mut failed = false;

    for step in &stage.steps {
        let status = if !step.clean && (failed || clean_only) {
            StepStatus::Skipped
        } else {
            info!(step = step.name, "Running step");
            match (step.run)(ctx).await {
                Ok(()) => StepStatus::Passed,
                Err(e) => {
                    warn!(step = step.name, error = %e, "Step failed");
                    failed = true;
                    StepStatus::Failed(e.to_string())
                }
            }
        };

        report.steps.push(StepReport {
            stage: stage.name,
            step: step.name,
            status,
        });
    }
}
