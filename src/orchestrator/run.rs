//! Single-flight controller for agent runs.

use crate::model::{AgentKind, RunOutcome, RunRequest};
use crate::remote::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SubmitRejected {
    #[error("input is empty")]
    EmptyInput,
    #[error("a run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunState {
    Idle,
    Running(RunRequest),
}

pub(crate) struct RunController {
    state: RunState,
    outcome: Option<RunOutcome>,
}

impl Default for RunController {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            outcome: None,
        }
    }
}

impl RunController {
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the run trigger should be enabled for `input`.
    pub fn can_submit(&self, input: &str) -> bool {
        !self.is_running() && !input.trim().is_empty()
    }

    /// Enter `Running` with a snapshot of the current selection.
    /// The returned request is what must be sent; later UI edits cannot alter it.
    pub fn submit(&mut self, agent: AgentKind, input: &str) -> Result<RunRequest, SubmitRejected> {
        if self.is_running() {
            return Err(SubmitRejected::AlreadyRunning);
        }
        if input.trim().is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }
        let req = RunRequest {
            agent,
            input: input.to_string(),
        };
        self.state = RunState::Running(req.clone());
        Ok(req)
    }

    /// Settle the in-flight run. Returns false if nothing was running.
    pub fn finish(&mut self, result: Result<String, RemoteError>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.outcome = Some(match result {
            Ok(output) => RunOutcome::Ok(output),
            Err(e) => RunOutcome::Err(format!("Error: {e}")),
        });
        self.state = RunState::Idle;
        true
    }
}
