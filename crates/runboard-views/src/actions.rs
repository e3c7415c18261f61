//! User actions: trigger an execution, retry a failed step.
//!
//! Action failures are scoped to the action. They never touch the state of the view
//! the action was started from.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use runboard_api_client::{ApiError, WorkflowApi};
use runboard_core::models::{ExecuteWorkflowRequest, StepExecution};
use runboard_core::ValidationError;
use serde_json::{Map, Value};

use crate::controller::ViewHandle;
use crate::route::Route;
use crate::source::ExecutionSource;

/// Initial content of the trigger-input buffer.
pub const DEFAULT_TRIGGER_INPUT: &str = "{\n  \"key\": \"value\"\n}";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Validate the free-text trigger input. An empty buffer means `{}`.
pub fn parse_trigger_input(buffer: &str) -> Result<Map<String, Value>, ValidationError> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(e) => Err(ValidationError::InvalidJson(e.to_string())),
    }
}

/// Start an execution of `workflow_id` and return the view to navigate to.
///
/// Invalid input is rejected before any network call.
pub async fn trigger_execution(
    api: &dyn WorkflowApi,
    workflow_id: &str,
    buffer: &str,
) -> Result<Route, ActionError> {
    let trigger_input = parse_trigger_input(buffer)?;

    let request = ExecuteWorkflowRequest {
        trigger_input: Some(trigger_input),
    };
    let response = api.execute_workflow(workflow_id, &request).await?;

    tracing::info!(
        workflow_id = %workflow_id,
        execution_id = %response.execution_id,
        status = %response.status,
        "Workflow execution started"
    );

    Ok(Route::ExecutionDetail(response.execution_id))
}

/// Local UI state of one step's retry action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRetryState {
    pub retrying: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Retry accepted; the execution view was asked to refresh.
    Refreshed,
    /// The step is not FAILED; nothing was sent.
    NotRetryable,
    /// A retry of this step is already in flight; nothing was sent.
    AlreadyRetrying,
    /// The view is showing another execution; nothing was sent.
    WrongView,
}

/// Retry flow for the steps of one execution.
///
/// Busy flags and errors are tracked per step, so retrying one step leaves the
/// others interactive.
pub struct StepRetryDispatcher {
    api: Arc<dyn WorkflowApi>,
    execution_id: String,
    steps: Mutex<HashMap<String, StepRetryState>>,
}

impl StepRetryDispatcher {
    pub fn new(api: Arc<dyn WorkflowApi>, execution_id: impl Into<String>) -> Self {
        Self {
            api,
            execution_id: execution_id.into(),
            steps: Mutex::new(HashMap::new()),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    fn steps(&self) -> MutexGuard<'_, HashMap<String, StepRetryState>> {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, step_execution_id: &str) -> StepRetryState {
        self.steps()
            .get(step_execution_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the retry control for `step` is enabled.
    pub fn can_retry(&self, step: &StepExecution) -> bool {
        step.is_retryable() && !self.state(&step.id).retrying
    }

    /// Retry a FAILED step and, on success, refresh the execution view.
    ///
    /// On failure the error is recorded for that step only and returned; the step
    /// stays retryable.
    pub async fn retry(
        &self,
        step: &StepExecution,
        view: &ViewHandle<ExecutionSource>,
    ) -> Result<RetryOutcome, ApiError> {
        if !step.is_retryable() {
            tracing::debug!(step_execution_id = %step.id, status = %step.status, "Step is not retryable");
            return Ok(RetryOutcome::NotRetryable);
        }

        let source = view.source();
        if source.execution_id() != self.execution_id {
            tracing::warn!(
                execution_id = %self.execution_id,
                view_execution_id = %source.execution_id(),
                "Retry dispatched against a view of another execution"
            );
            return Ok(RetryOutcome::WrongView);
        }

        {
            let mut steps = self.steps();
            let entry = steps.entry(step.id.clone()).or_default();
            if entry.retrying {
                return Ok(RetryOutcome::AlreadyRetrying);
            }
            entry.retrying = true;
            entry.error = None;
        }

        let result = self.api.retry_step(&self.execution_id, &step.id).await;

        let mut steps = self.steps();
        let entry = steps.entry(step.id.clone()).or_default();
        entry.retrying = false;

        match result {
            Ok(()) => {
                drop(steps);
                tracing::info!(
                    execution_id = %self.execution_id,
                    step_execution_id = %step.id,
                    "Step retry accepted"
                );
                view.refresh();
                Ok(RetryOutcome::Refreshed)
            }
            Err(e) => {
                tracing::warn!(
                    execution_id = %self.execution_id,
                    step_execution_id = %step.id,
                    error = %e,
                    "Step retry failed"
                );
                entry.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_buffer_is_empty_object() {
        assert_eq!(parse_trigger_input("").unwrap(), Map::new());
        assert_eq!(parse_trigger_input("  \n\t ").unwrap(), Map::new());
    }

    #[test]
    fn default_template_is_valid() {
        let input = parse_trigger_input(DEFAULT_TRIGGER_INPUT).unwrap();
        assert_eq!(input["key"], json!("value"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_trigger_input("{bad json"),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert_eq!(parse_trigger_input("[1, 2]"), Err(ValidationError::NotAnObject));
        assert_eq!(parse_trigger_input("42"), Err(ValidationError::NotAnObject));
    }
}
