use crate::core::invoker::ScriptInvoker;
use crate::core::resolver::resolve;
use crate::domain::model::{InvocationParams, InvocationState, RunReport};
use crate::domain::ports::{Prerequisite, ProjectSource, ScriptLoader};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Arguments of one `run` invocation, already parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub project: String,
    pub param: String,
    pub working_directory: String,
    pub topology: String,
    pub dry_run: bool,
}

pub struct RunEngine<P: Prerequisite, S: ProjectSource, L: ScriptLoader> {
    prerequisite: P,
    source: S,
    invoker: ScriptInvoker<L>,
    monitor: SystemMonitor,
}

impl<P: Prerequisite, S: ProjectSource, L: ScriptLoader> RunEngine<P, S, L> {
    pub fn new(prerequisite: P, source: S, loader: L) -> Self {
        Self::new_with_monitoring(prerequisite, source, loader, false)
    }

    pub fn new_with_monitoring(prerequisite: P, source: S, loader: L, monitor: bool) -> Self {
        Self {
            prerequisite,
            source,
            invoker: ScriptInvoker::new(loader),
            monitor: SystemMonitor::new(monitor),
        }
    }

    /// Tool check, then resolution, then the userscript. Any failure is final.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut state = InvocationState::AwaitingResolution;
        tracing::debug!(?state, project = %request.project, "Starting run");

        let outcome = self.execute(request, &mut state).await;

        let next = if outcome.is_ok() {
            InvocationState::Succeeded
        } else {
            InvocationState::Failed
        };
        transition(&mut state, next);

        if self.monitor.is_enabled() {
            self.monitor.log_final_stats();
        }

        let params = outcome?;
        Ok(RunReport {
            project_name: request.project.clone(),
            state,
            params: Some(params),
            started_at,
            finished_at: Utc::now(),
            dry_run: request.dry_run,
        })
    }

    async fn execute(
        &self,
        request: &RunRequest,
        state: &mut InvocationState,
    ) -> Result<InvocationParams> {
        self.prerequisite.check()?;

        tracing::info!("📁 Loading project list from: {}", self.source.describe());
        let projects = self.source.load()?;
        tracing::debug!("Loaded {} projects", projects.len());

        let record = resolve(&projects, &request.project)?;
        tracing::info!("🔎 Resolved project {} at {}", record.name, record.path);

        let params = InvocationParams::new(
            record,
            &request.param,
            &request.working_directory,
            &request.topology,
        );

        if request.dry_run {
            tracing::info!("🔍 DRY RUN MODE - userscript will not be loaded");
            return Ok(params);
        }

        transition(state, InvocationState::Invoking);
        if self.monitor.is_enabled() {
            self.monitor.log_stats("Before userscript");
        }

        self.invoker.invoke_with(params.clone()).await?;

        if self.monitor.is_enabled() {
            self.monitor.log_stats("After userscript");
        }
        Ok(params)
    }
}

fn transition(state: &mut InvocationState, next: InvocationState) {
    if state.is_terminal() {
        return;
    }
    tracing::debug!(from = ?*state, to = ?next, "Invocation state change");
    *state = next;
}
