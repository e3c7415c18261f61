//! Workflow execution snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ErrorType, ExecutionStatus};

/// One run of a workflow (GET /api/executions/{id})
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
    /// Set once the execution reached a terminal status
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub step_executions: Vec<StepExecution>,
}

impl WorkflowExecution {
    pub fn duration_ms(&self) -> Option<i64> {
        duration_ms(Some(self.started_at), self.finished_at)
    }

    pub fn step(&self, step_execution_id: &str) -> Option<&StepExecution> {
        self.step_executions
            .iter()
            .find(|s| s.id == step_execution_id)
    }
}

/// Runtime record of one step within an execution.
///
/// A manual retry updates this record in place: same `id`, new status and error,
/// incremented `retry_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecution {
    pub id: String,
    pub step_id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_retry: bool,
    #[serde(default)]
    pub retry_count: i64,
}

impl StepExecution {
    pub fn duration_ms(&self) -> Option<i64> {
        duration_ms(self.started_at, self.finished_at)
    }

    /// Only FAILED steps expose a manual retry.
    pub fn is_retryable(&self) -> bool {
        self.status.is_failed()
    }

    pub fn visible_output(&self) -> Option<&Map<String, Value>> {
        self.output.as_ref().filter(|o| !o.is_empty())
    }
}

/// `finished_at - started_at` in whole milliseconds, when both are known.
pub fn duration_ms(
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
) -> Option<i64> {
    match (started_at, finished_at) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
        _ => None,
    }
}

/// Render a millisecond duration as seconds with two decimals (e.g. `2.50s`).
pub fn format_duration_ms(ms: i64) -> String {
    format!("{:.2}s", ms as f64 / 1000.0)
}
